use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person, optionally associated with any number of projects.
/// The association is soft: ids of deleted projects are pruned, and a
/// contact never owns a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Israeli format, 05X-XXXXXXX.
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
            project_ids: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn in_project(&self, project_id: Uuid) -> bool {
        self.project_ids.contains(&project_id)
    }
}
