use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical task status. The app historically carried two parallel
/// three-value vocabularies plus a separate `completed` boolean; everything
/// now funnels through this enum, and "completed" is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "InProgress",
            Self::Done => "Done",
        }
    }

    /// Hebrew UI label, as the original forms display it.
    pub fn as_hebrew(&self) -> &'static str {
        match self {
            Self::Todo => "לביצוע",
            Self::InProgress => "בתהליך",
            Self::Done => "הושלמה",
        }
    }

    /// Single conversion point for every entity boundary. Accepts the
    /// canonical labels, the legacy English vocabulary and both Hebrew
    /// vocabularies that coexisted in older data.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Todo" | "todo" | "לביצוע" => Some(Self::Todo),
            "InProgress" | "in_progress" | "in-progress" | "בתהליך" => Some(Self::InProgress),
            "Done" | "done" | "הושלמה" | "הושלם" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn as_hebrew(&self) -> &'static str {
        match self {
            Self::Low => "נמוכה",
            Self::Medium => "בינונית",
            Self::High => "גבוהה",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "Low" | "low" | "נמוכה" => Some(Self::Low),
            "Medium" | "medium" | "בינונית" => Some(Self::Medium),
            "High" | "high" | "גבוהה" => Some(Self::High),
            _ => None,
        }
    }
}

/// A task inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Sort key — larger means newer. Assigned by the store on insert.
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    pub fn new(project_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            order: 0,
            tags: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_done()
    }
}

/// A standalone personal task, not linked to any project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalTask {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

impl PersonalTask {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into().trim().to_string(),
            completed: false,
            priority,
            created_at: chrono::Local::now().naive_local(),
            completed_at: None,
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.completed_at = if self.completed {
            Some(chrono::Local::now().naive_local())
        } else {
            None
        };
    }
}
