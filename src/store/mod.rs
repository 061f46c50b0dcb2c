pub mod persist;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::contact::Contact;
use crate::core::project::{Client, Payment, Project, ProjectStatus, Reminder};
use crate::core::tag::Tag;
use crate::core::task::{PersonalTask, Priority, Task, TaskStatus};
use crate::core::time_entry::TimeEntry;

pub use persist::{JsonFilePersister, NoopPersister, Persister, StoreError};

/// Serializable image of every collection — the unit of persistence.
/// Field names match the original persistence document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    pub contacts: Vec<Contact>,
    pub time_entries: Vec<TimeEntry>,
    pub personal_tasks: Vec<PersonalTask>,
    pub tags: Vec<Tag>,
}

/// Partial update for a project. `None` fields are left untouched, so a
/// patch can set an optional field but never clear it back to `None`;
/// clearing takes a whole-snapshot `replace`.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub folder_path: Option<String>,
    pub client: Option<Client>,
    pub payment: Option<Payment>,
    pub tags: Option<Vec<String>>,
    pub reminders: Option<Vec<Reminder>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub order: Option<i64>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub project_ids: Option<Vec<Uuid>>,
    pub tags: Option<Vec<String>>,
}

/// Aggregate counts shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
}

/// Single source of truth for all collections.
///
/// Every mutation runs the same pipeline: change the in-memory state, log,
/// then hand the whole snapshot to the persister. Persistence failures are
/// logged and surfaced nowhere else; in-memory state is never rolled back.
pub struct Store {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    contacts: Vec<Contact>,
    time_entries: Vec<TimeEntry>,
    personal_tasks: Vec<PersonalTask>,
    tags: Vec<Tag>,
    persister: Box<dyn Persister>,
}

impl Store {
    pub fn new(persister: Box<dyn Persister>) -> Self {
        Self {
            projects: Vec::new(),
            tasks: Vec::new(),
            contacts: Vec::new(),
            time_entries: Vec::new(),
            personal_tasks: Vec::new(),
            tags: Vec::new(),
            persister,
        }
    }

    /// A store with no durable medium.
    pub fn in_memory() -> Self {
        Self::new(Box::new(NoopPersister))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            projects: self.projects.clone(),
            tasks: self.tasks.clone(),
            contacts: self.contacts.clone(),
            time_entries: self.time_entries.clone(),
            personal_tasks: self.personal_tasks.clone(),
            tags: self.tags.clone(),
        }
    }

    fn persist(&self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.persister.persist(&snapshot) {
            log::error!("Persist ({}) failed: {}", self.persister.describe(), e);
        }
    }

    // --- projects ---

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn add_project(&mut self, project: Project) -> Uuid {
        let id = project.id;
        log::debug!("Adding project: {}", project.name);
        self.projects.push(project);
        self.persist();
        id
    }

    /// Shallow-merge a patch into the project. Unknown id is a silent no-op.
    pub fn update_project(&mut self, id: Uuid, patch: ProjectPatch) -> bool {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        if let Some(priority) = patch.priority {
            project.priority = priority;
        }
        if let Some(start_date) = patch.start_date {
            project.start_date = start_date;
        }
        if let Some(due_date) = patch.due_date {
            project.due_date = Some(due_date);
        }
        if let Some(folder_path) = patch.folder_path {
            project.folder_path = Some(folder_path);
        }
        if let Some(client) = patch.client {
            project.client = Some(client);
        }
        if let Some(payment) = patch.payment {
            project.payment = Some(payment);
        }
        if let Some(tags) = patch.tags {
            project.tags = tags;
        }
        if let Some(reminders) = patch.reminders {
            project.reminders = reminders;
        }
        project.updated_at = chrono::Local::now().naive_local();
        self.persist();
        true
    }

    /// Remove a project, its tasks, the time entries of those tasks, and
    /// the project's id from every contact's membership list.
    pub fn delete_project(&mut self, id: Uuid) {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        if self.projects.len() == before {
            return;
        }

        let task_ids: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        self.tasks.retain(|t| t.project_id != id);
        self.time_entries.retain(|e| !task_ids.contains(&e.task_id));
        for contact in &mut self.contacts {
            contact.project_ids.retain(|pid| *pid != id);
        }

        log::info!("Deleted project {} with {} tasks", id, task_ids.len());
        self.persist();
    }

    pub fn project_by_id(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    // --- tasks ---

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn add_task(&mut self, mut task: Task) -> Uuid {
        if task.order == 0 {
            task.order = self.tasks.iter().map(|t| t.order).max().unwrap_or(0) + 1;
        }
        let id = task.id;
        log::debug!("Adding task: {}", task.title);
        self.tasks.push(task);
        self.persist();
        id
    }

    pub fn update_task(&mut self, id: Uuid, patch: TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(order) = patch.order {
            task.order = order;
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        self.persist();
        true
    }

    /// Remove a task and all its time entries.
    pub fn delete_task(&mut self, id: Uuid) {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return;
        }
        self.time_entries.retain(|e| e.task_id != id);
        self.persist();
    }

    /// Flip a task between Done and Todo. The derived completed flag is
    /// restored by a second toggle.
    pub fn toggle_task(&mut self, id: Uuid) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.status = if task.status.is_done() {
            TaskStatus::Todo
        } else {
            TaskStatus::Done
        };
        self.persist();
        true
    }

    /// Tasks of a project, in insertion order. Callers sort by priority or
    /// by `order` as they see fit.
    pub fn tasks_by_project(&self, project_id: Uuid) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .collect()
    }

    // --- contacts ---

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn add_contact(&mut self, contact: Contact) -> Uuid {
        let id = contact.id;
        log::debug!("Adding contact: {}", contact.name);
        self.contacts.push(contact);
        self.persist();
        id
    }

    pub fn update_contact(&mut self, id: Uuid, patch: ContactPatch) -> bool {
        let Some(contact) = self.contacts.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if let Some(name) = patch.name {
            contact.name = name;
        }
        if let Some(email) = patch.email {
            contact.email = Some(email);
        }
        if let Some(phone) = patch.phone {
            contact.phone = Some(phone);
        }
        if let Some(project_ids) = patch.project_ids {
            contact.project_ids = project_ids;
        }
        if let Some(tags) = patch.tags {
            contact.tags = tags;
        }
        self.persist();
        true
    }

    pub fn delete_contact(&mut self, id: Uuid) {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.id != id);
        if self.contacts.len() != before {
            self.persist();
        }
    }

    pub fn contacts_by_project(&self, project_id: Uuid) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| c.in_project(project_id))
            .collect()
    }

    // --- time entries ---

    pub fn time_entries(&self) -> &[TimeEntry] {
        &self.time_entries
    }

    pub fn add_time_entry(&mut self, entry: TimeEntry) -> Uuid {
        let id = entry.id;
        self.time_entries.push(entry);
        self.persist();
        id
    }

    pub fn delete_time_entry(&mut self, id: Uuid) {
        let before = self.time_entries.len();
        self.time_entries.retain(|e| e.id != id);
        if self.time_entries.len() != before {
            self.persist();
        }
    }

    pub fn time_entries_by_task(&self, task_id: Uuid) -> Vec<&TimeEntry> {
        self.time_entries
            .iter()
            .filter(|e| e.task_id == task_id)
            .collect()
    }

    /// Total logged minutes for one task.
    pub fn task_total_minutes(&self, task_id: Uuid) -> i64 {
        self.time_entries
            .iter()
            .filter(|e| e.task_id == task_id)
            .map(|e| e.duration_minutes)
            .sum()
    }

    // --- personal tasks ---

    pub fn personal_tasks(&self) -> &[PersonalTask] {
        &self.personal_tasks
    }

    /// Personal tasks are prepended — newest first, as the quick-add list
    /// displays them.
    pub fn add_personal_task(&mut self, task: PersonalTask) -> Uuid {
        let id = task.id;
        self.personal_tasks.insert(0, task);
        self.persist();
        id
    }

    pub fn toggle_personal_task(&mut self, id: Uuid) -> bool {
        let Some(task) = self.personal_tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.toggle();
        self.persist();
        true
    }

    pub fn update_personal_task(&mut self, id: Uuid, title: Option<String>, priority: Option<Priority>) -> bool {
        let Some(task) = self.personal_tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        self.persist();
        true
    }

    pub fn delete_personal_task(&mut self, id: Uuid) {
        let before = self.personal_tasks.len();
        self.personal_tasks.retain(|t| t.id != id);
        if self.personal_tasks.len() != before {
            self.persist();
        }
    }

    pub fn clear_completed_personal(&mut self) {
        self.personal_tasks.retain(|t| !t.completed);
        self.persist();
    }

    // --- tags ---

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn add_tag(&mut self, tag: Tag) -> Uuid {
        let id = tag.id;
        log::debug!("Adding tag: {}", tag.name);
        self.tags.push(tag);
        self.persist();
        id
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Rename a tag and rewrite its label on every entity carrying it.
    pub fn rename_tag(&mut self, id: Uuid, new_name: impl Into<String>) -> bool {
        let new_name = new_name.into();
        let Some(tag) = self.tags.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        let old_name = std::mem::replace(&mut tag.name, new_name.clone());

        let rewrite = |labels: &mut Vec<String>| {
            for label in labels.iter_mut() {
                if *label == old_name {
                    *label = new_name.clone();
                }
            }
        };
        for project in &mut self.projects {
            rewrite(&mut project.tags);
        }
        for task in &mut self.tasks {
            rewrite(&mut task.tags);
        }
        for contact in &mut self.contacts {
            rewrite(&mut contact.tags);
        }
        self.persist();
        true
    }

    /// Remove a tag and strip its label from every entity carrying it.
    pub fn delete_tag(&mut self, id: Uuid) {
        let Some(pos) = self.tags.iter().position(|t| t.id == id) else {
            return;
        };
        let name = self.tags.remove(pos).name;
        for project in &mut self.projects {
            project.tags.retain(|t| *t != name);
        }
        for task in &mut self.tasks {
            task.tags.retain(|t| *t != name);
        }
        for contact in &mut self.contacts {
            contact.tags.retain(|t| *t != name);
        }
        self.persist();
    }

    // --- derived views ---

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_projects: self.projects.len(),
            active_projects: self
                .projects
                .iter()
                .filter(|p| p.status.is_active())
                .count(),
            active_tasks: self.tasks.iter().filter(|t| !t.is_completed()).count(),
            completed_tasks: self.tasks.iter().filter(|t| t.is_completed()).count(),
        }
    }

    // --- snapshot import/export ---

    pub fn export_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Replace every collection from a JSON snapshot. Order and field
    /// values are restored exactly.
    pub fn seed_from_json(&mut self, json: &str) -> Result<(), StoreError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.replace(snapshot);
        Ok(())
    }

    pub fn replace(&mut self, snapshot: Snapshot) {
        self.projects = snapshot.projects;
        self.tasks = snapshot.tasks;
        self.contacts = snapshot.contacts;
        self.time_entries = snapshot.time_entries;
        self.personal_tasks = snapshot.personal_tasks;
        self.tags = snapshot.tags;
        self.persist();
    }

    /// Explicit whole-snapshot save to a file, independent from the
    /// auto-persister. The two media are not reconciled.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), StoreError> {
        persist::save_snapshot(&self.snapshot(), path)
    }

    pub fn load_from_file(&mut self, path: &std::path::Path) -> Result<(), StoreError> {
        let snapshot = persist::load_snapshot(path)?;
        self.replace(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn delete_project_cascades_tasks_and_time_entries() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        let other_id = store.add_project(Project::new("Beta"));

        let task_id = store.add_task(Task::new(project_id, "Design"));
        let other_task = store.add_task(Task::new(other_id, "Build"));
        store.add_time_entry(TimeEntry::new(task_id, at(10, 0), Some(at(11, 0))));
        store.add_time_entry(TimeEntry::new(other_task, at(12, 0), Some(at(13, 0))));

        store.delete_project(project_id);

        assert!(store.tasks().iter().all(|t| t.project_id != project_id));
        let live_ids: Vec<Uuid> = store.tasks().iter().map(|t| t.id).collect();
        assert!(
            store
                .time_entries()
                .iter()
                .all(|e| live_ids.contains(&e.task_id))
        );
        assert_eq!(store.time_entries().len(), 1);
    }

    #[test]
    fn delete_project_prunes_contact_membership() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        let kept_id = store.add_project(Project::new("Beta"));

        let mut contact = Contact::new("Dana");
        contact.project_ids = vec![project_id, kept_id];
        let contact_id = store.add_contact(contact);

        store.delete_project(project_id);

        let contact = store.contacts().iter().find(|c| c.id == contact_id).unwrap();
        assert_eq!(contact.project_ids, vec![kept_id]);
    }

    #[test]
    fn delete_task_removes_its_time_entries() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        let task_id = store.add_task(Task::new(project_id, "Design"));
        store.add_time_entry(TimeEntry::new(task_id, at(9, 0), Some(at(9, 30))));

        store.delete_task(task_id);

        assert!(store.tasks().is_empty());
        assert!(store.time_entries().is_empty());
    }

    #[test]
    fn update_with_unknown_id_is_a_no_op() {
        let mut store = Store::in_memory();
        store.add_project(Project::new("Alpha"));
        let before = store.snapshot();

        let found = store.update_project(
            Uuid::new_v4(),
            ProjectPatch {
                name: Some("Renamed".into()),
                ..ProjectPatch::default()
            },
        );

        assert!(!found);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut store = Store::in_memory();
        let mut project = Project::new("Alpha");
        project.description = "original".into();
        let id = store.add_project(project);

        store.update_project(
            id,
            ProjectPatch {
                status: Some(ProjectStatus::Active),
                ..ProjectPatch::default()
            },
        );

        let project = store.project_by_id(id).unwrap();
        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.description, "original");
        assert_eq!(project.name, "Alpha");
    }

    #[test]
    fn json_export_round_trips_exactly() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        let task_id = store.add_task(Task::new(project_id, "Design"));
        store.add_time_entry(TimeEntry::new(task_id, at(8, 0), Some(at(8, 45))));
        let mut contact = Contact::new("Dana");
        contact.project_ids = vec![project_id];
        store.add_contact(contact);
        store.add_personal_task(PersonalTask::new("Errand", Priority::Low));
        store.add_tag(Tag::new("urgent", "#ff0000"));

        let original = store.snapshot();
        let json = store.export_json().unwrap();

        let mut restored = Store::in_memory();
        restored.seed_from_json(&json).unwrap();
        assert_eq!(restored.snapshot(), original);
    }

    #[test]
    fn patch_sets_but_never_clears_optional_fields() {
        let mut store = Store::in_memory();
        let mut project = Project::new("Alpha");
        project.folder_path = Some("/projects/alpha".into());
        let id = store.add_project(project);

        store.update_project(
            id,
            ProjectPatch {
                due_date: Some(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()),
                ..ProjectPatch::default()
            },
        );
        store.update_project(id, ProjectPatch::default());

        let project = store.project_by_id(id).unwrap();
        assert_eq!(project.folder_path.as_deref(), Some("/projects/alpha"));
        assert!(project.due_date.is_some());
    }

    #[test]
    fn delete_tag_strips_label_from_entities() {
        let mut store = Store::in_memory();
        let tag_id = store.add_tag(Tag::new("urgent", "#ff0000"));

        let mut project = Project::new("Alpha");
        project.tags = vec!["urgent".into(), "client".into()];
        let project_id = store.add_project(project);

        let mut task = Task::new(project_id, "Design");
        task.tags = vec!["urgent".into()];
        store.add_task(task);

        store.delete_tag(tag_id);

        assert!(store.tags().is_empty());
        assert_eq!(store.project_by_id(project_id).unwrap().tags, vec!["client"]);
        assert!(store.tasks()[0].tags.is_empty());
    }

    #[test]
    fn rename_tag_rewrites_entity_labels() {
        let mut store = Store::in_memory();
        let tag_id = store.add_tag(Tag::new("urgent", "#ff0000"));

        let mut project = Project::new("Alpha");
        project.tags = vec!["urgent".into()];
        let project_id = store.add_project(project);

        assert!(store.rename_tag(tag_id, "דחוף"));
        assert!(store.tag_by_name("דחוף").is_some());
        assert_eq!(store.project_by_id(project_id).unwrap().tags, vec!["דחוף"]);
    }

    #[test]
    fn toggle_task_twice_restores_completed_state() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        let task_id = store.add_task(Task::new(project_id, "Design"));

        let before = store.tasks()[0].is_completed();
        store.toggle_task(task_id);
        assert_ne!(store.tasks()[0].is_completed(), before);
        store.toggle_task(task_id);
        assert_eq!(store.tasks()[0].is_completed(), before);
    }

    #[test]
    fn scenario_project_lifecycle() {
        let mut store = Store::in_memory();
        let mut project = Project::new("Alpha");
        project.status = ProjectStatus::Planning;
        let project_id = store.add_project(project);

        let task_id = store.add_task(Task::new(project_id, "Design"));

        let tasks = store.tasks_by_project(project_id);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task_id);

        store.delete_project(project_id);
        assert!(store.tasks_by_project(project_id).is_empty());
    }

    #[test]
    fn add_task_assigns_increasing_order() {
        let mut store = Store::in_memory();
        let project_id = store.add_project(Project::new("Alpha"));
        store.add_task(Task::new(project_id, "First"));
        store.add_task(Task::new(project_id, "Second"));

        let orders: Vec<i64> = store.tasks().iter().map(|t| t.order).collect();
        assert!(orders[1] > orders[0]);
    }

    #[test]
    fn referential_integrity_is_not_validated_on_add() {
        let mut store = Store::in_memory();
        // Task pointing at a project that does not exist is accepted.
        let orphan = Task::new(Uuid::new_v4(), "Orphan");
        store.add_task(orphan.clone());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn clear_completed_personal_keeps_open_tasks() {
        let mut store = Store::in_memory();
        let open = store.add_personal_task(PersonalTask::new("Open", Priority::Medium));
        let done = store.add_personal_task(PersonalTask::new("Done", Priority::Medium));
        store.toggle_personal_task(done);

        store.clear_completed_personal();

        assert_eq!(store.personal_tasks().len(), 1);
        assert_eq!(store.personal_tasks()[0].id, open);
    }

    #[test]
    fn personal_tasks_are_newest_first() {
        let mut store = Store::in_memory();
        store.add_personal_task(PersonalTask::new("First", Priority::Medium));
        store.add_personal_task(PersonalTask::new("Second", Priority::Medium));
        assert_eq!(store.personal_tasks()[0].title, "Second");
    }

    #[test]
    fn stats_count_active_and_completed() {
        let mut store = Store::in_memory();
        let mut project = Project::new("Alpha");
        project.status = ProjectStatus::Active;
        let project_id = store.add_project(project);
        store.add_project(Project::new("Beta"));

        let t1 = store.add_task(Task::new(project_id, "One"));
        store.add_task(Task::new(project_id, "Two"));
        store.toggle_task(t1);

        let stats = store.stats();
        assert_eq!(stats.total_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.active_tasks, 1);
        assert_eq!(stats.completed_tasks, 1);
    }
}
