use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::core::contact::Contact;
use crate::core::project::{Client as ProjectClient, Project, ProjectStatus};
use crate::core::task::{Priority, Task, TaskStatus};
use crate::core::time_entry::TimeEntry;
use crate::store::Snapshot;

/// Row shape of the hosted `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Uuid,
    pub user_id: String,
    /// Hosted schema calls the project name `title`.
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub folder_path: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: Uuid,
    pub user_id: String,
    pub project_id: Uuid,
    pub title: String,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRow {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntryRow {
    pub id: Uuid,
    pub user_id: String,
    pub task_id: Uuid,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    pub duration_minutes: i64,
}

/// All four remote tables fetched in one pull.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub projects: Vec<ProjectRow>,
    pub tasks: Vec<TaskRow>,
    pub contacts: Vec<ContactRow>,
    pub time_entries: Vec<TimeEntryRow>,
}

/// Per-row CRUD against the hosted backend. Rows in every table are
/// scoped by the authenticated user id; status and priority labels are
/// converted at this boundary and nowhere else.
pub struct RemoteClient {
    base_url: String,
    api_key: String,
    user_id: String,
    http: Client,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, String> {
        let http = Client::builder()
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            user_id: config.user_id.clone(),
            http,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, String> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(&[("user_id", format!("eq.{}", self.user_id))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| format!("GET {} failed: {}", table, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("GET {} returned {}", table, status));
        }
        resp.json::<Vec<T>>()
            .await
            .map_err(|e| format!("Failed to parse {} rows: {}", table, e))
    }

    async fn upsert_row<T: Serialize>(&self, table: &str, row: &T) -> Result<(), String> {
        let resp = self
            .http
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await
            .map_err(|e| format!("POST {} failed: {}", table, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("POST {} returned {}", table, status));
        }
        Ok(())
    }

    async fn delete_row(&self, table: &str, id: Uuid) -> Result<(), String> {
        let resp = self
            .http
            .delete(self.table_url(table))
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", self.user_id)),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| format!("DELETE {} failed: {}", table, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("DELETE {} returned {}", table, status));
        }
        Ok(())
    }

    /// Latest `updated_at` watermark across the user's project rows, used
    /// by the change watcher. Missing column values count as no change.
    pub async fn latest_update(&self, table: &str) -> Result<Option<String>, String> {
        #[derive(Deserialize)]
        struct UpdatedAt {
            #[serde(default)]
            updated_at: Option<String>,
        }

        let resp = self
            .http
            .get(self.table_url(table))
            .query(&[
                ("user_id", format!("eq.{}", self.user_id)),
                ("select", "updated_at".to_string()),
                ("order", "updated_at.desc".to_string()),
                ("limit", "1".to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| format!("GET {} watermark failed: {}", table, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("GET {} watermark returned {}", table, status));
        }
        let rows: Vec<UpdatedAt> = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse watermark: {}", e))?;
        Ok(rows.into_iter().next().and_then(|r| r.updated_at))
    }

    pub async fn fetch_all(&self) -> Result<RemoteSnapshot, String> {
        Ok(RemoteSnapshot {
            projects: self.fetch_rows("projects").await?,
            tasks: self.fetch_rows("tasks").await?,
            contacts: self.fetch_rows("contacts").await?,
            time_entries: self.fetch_rows("time_entries").await?,
        })
    }

    pub async fn upsert_project(&self, project: &Project) -> Result<(), String> {
        self.upsert_row("projects", &project_to_row(project, &self.user_id))
            .await
    }

    pub async fn upsert_task(&self, task: &Task) -> Result<(), String> {
        self.upsert_row("tasks", &task_to_row(task, &self.user_id))
            .await
    }

    pub async fn upsert_contact(&self, contact: &Contact) -> Result<(), String> {
        self.upsert_row("contacts", &contact_to_row(contact, &self.user_id))
            .await
    }

    pub async fn upsert_time_entry(&self, entry: &TimeEntry) -> Result<(), String> {
        self.upsert_row("time_entries", &time_entry_to_row(entry, &self.user_id))
            .await
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), String> {
        self.delete_row("projects", id).await
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), String> {
        self.delete_row("tasks", id).await
    }

    pub async fn delete_contact(&self, id: Uuid) -> Result<(), String> {
        self.delete_row("contacts", id).await
    }

    pub async fn delete_time_entry(&self, id: Uuid) -> Result<(), String> {
        self.delete_row("time_entries", id).await
    }
}

pub fn project_to_row(project: &Project, user_id: &str) -> ProjectRow {
    ProjectRow {
        id: project.id,
        user_id: user_id.to_string(),
        title: project.name.clone(),
        description: Some(project.description.clone()),
        status: project.status.as_label().to_string(),
        priority: project.priority.as_label().to_string(),
        start_date: project.start_date,
        end_date: project.due_date,
        folder_path: project.folder_path.clone(),
        client_name: project.client.as_ref().map(|c| c.name.clone()),
        client_email: project.client.as_ref().and_then(|c| c.email.clone()),
        client_phone: project.client.as_ref().and_then(|c| c.phone.clone()),
        updated_at: Some(project.updated_at),
    }
}

pub fn row_to_project(row: &ProjectRow) -> Project {
    let mut project = Project::new(row.title.clone());
    project.id = row.id;
    project.description = row.description.clone().unwrap_or_default();
    project.status = ProjectStatus::from_label(&row.status).unwrap_or(ProjectStatus::Planning);
    project.priority = Priority::from_label(&row.priority).unwrap_or(Priority::Medium);
    project.start_date = row.start_date;
    project.due_date = row.end_date;
    project.folder_path = row.folder_path.clone();
    if let Some(ref name) = row.client_name {
        project.client = Some(ProjectClient {
            name: name.clone(),
            email: row.client_email.clone(),
            phone: row.client_phone.clone(),
            ..ProjectClient::default()
        });
    }
    if let Some(updated_at) = row.updated_at {
        project.updated_at = updated_at;
    }
    project
}

pub fn task_to_row(task: &Task, user_id: &str) -> TaskRow {
    TaskRow {
        id: task.id,
        user_id: user_id.to_string(),
        project_id: task.project_id,
        title: task.title.clone(),
        status: task.status.as_label().to_string(),
        priority: task.priority.as_label().to_string(),
        due_date: task.due_date,
        completed_at: task
            .is_completed()
            .then(|| chrono::Local::now().naive_local()),
        sort_order: task.order,
    }
}

pub fn row_to_task(row: &TaskRow) -> Task {
    let mut task = Task::new(row.project_id, row.title.clone());
    task.id = row.id;
    task.status = TaskStatus::from_label(&row.status).unwrap_or(TaskStatus::Todo);
    task.priority = Priority::from_label(&row.priority).unwrap_or(Priority::Medium);
    task.due_date = row.due_date;
    task.order = row.sort_order;
    task
}

pub fn contact_to_row(contact: &Contact, user_id: &str) -> ContactRow {
    ContactRow {
        id: contact.id,
        user_id: user_id.to_string(),
        name: contact.name.clone(),
        email: contact.email.clone(),
        phone: contact.phone.clone(),
        project_ids: contact.project_ids.clone(),
    }
}

pub fn row_to_contact(row: &ContactRow) -> Contact {
    let mut contact = Contact::new(row.name.clone());
    contact.id = row.id;
    contact.email = row.email.clone();
    contact.phone = row.phone.clone();
    contact.project_ids = row.project_ids.clone();
    contact
}

pub fn time_entry_to_row(entry: &TimeEntry, user_id: &str) -> TimeEntryRow {
    TimeEntryRow {
        id: entry.id,
        user_id: user_id.to_string(),
        task_id: entry.task_id,
        start_time: entry.start_time,
        end_time: entry.end_time,
        duration_minutes: entry.duration_minutes,
    }
}

pub fn row_to_time_entry(row: &TimeEntryRow) -> TimeEntry {
    let mut entry = TimeEntry::new(row.task_id, row.start_time, row.end_time);
    entry.id = row.id;
    entry.duration_minutes = row.duration_minutes.max(1);
    entry
}

/// Convert a full remote snapshot into local collections.
pub fn remote_to_snapshot(remote: &RemoteSnapshot) -> Snapshot {
    Snapshot {
        projects: remote.projects.iter().map(row_to_project).collect(),
        tasks: remote.tasks.iter().map(row_to_task).collect(),
        contacts: remote.contacts.iter().map(row_to_contact).collect(),
        time_entries: remote.time_entries.iter().map(row_to_time_entry).collect(),
        personal_tasks: Vec::new(),
        tags: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_row_round_trip_keeps_fields() {
        let mut project = Project::new("Alpha");
        project.description = "redesign".into();
        project.status = ProjectStatus::Active;
        project.folder_path = Some("/projects/alpha".into());
        project.client = Some(ProjectClient {
            name: "Dana".into(),
            email: Some("dana@example.com".into()),
            ..ProjectClient::default()
        });

        let row = project_to_row(&project, "user-1");
        assert_eq!(row.title, "Alpha");
        assert_eq!(row.user_id, "user-1");
        assert_eq!(row.status, "Active");

        let back = row_to_project(&row);
        assert_eq!(back.id, project.id);
        assert_eq!(back.name, "Alpha");
        assert_eq!(back.status, ProjectStatus::Active);
        assert_eq!(back.client.unwrap().email.as_deref(), Some("dana@example.com"));
    }

    #[test]
    fn task_status_converts_at_the_boundary_only() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            user_id: "user-1".into(),
            project_id: Uuid::new_v4(),
            title: "Legacy".into(),
            // Legacy Hebrew vocabulary coming back from an old row.
            status: "הושלם".into(),
            priority: "גבוהה".into(),
            due_date: None,
            completed_at: None,
            sort_order: 3,
        };
        let task = row_to_task(&row);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.order, 3);
    }

    #[test]
    fn unknown_status_falls_back_to_todo() {
        let row = TaskRow {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            project_id: Uuid::new_v4(),
            title: "x".into(),
            status: "???".into(),
            priority: "???".into(),
            due_date: None,
            completed_at: None,
            sort_order: 0,
        };
        let task = row_to_task(&row);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[test]
    fn time_entry_row_enforces_minimum_duration() {
        let row = TimeEntryRow {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            task_id: Uuid::new_v4(),
            start_time: chrono::Local::now().naive_local(),
            end_time: None,
            duration_minutes: 0,
        };
        assert_eq!(row_to_time_entry(&row).duration_minutes, 1);
    }
}
