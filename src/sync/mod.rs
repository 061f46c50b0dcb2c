//! Remote synchronization against the hosted backend. Push is per-row
//! upserts of the local snapshot; pull replaces local collections with
//! the remote rows. A change watcher polls an `updated_at` watermark and
//! only flags that a refresh is due; it never mutates local data itself.

pub mod remote;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::store::Snapshot;
use remote::{remote_to_snapshot, RemoteClient};

/// Default interval between watermark polls.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Error(String),
    LastSynced(String),
}

impl SyncStatus {
    pub fn as_hebrew(&self) -> String {
        match self {
            Self::Idle => "ממתין".to_string(),
            Self::Syncing => "מסנכרן...".to_string(),
            Self::Error(e) => format!("שגיאת סנכרון: {}", e),
            Self::LastSynced(when) => format!("סונכרן לאחרונה: {}", when),
        }
    }
}

/// Outcome of a push pass. Individual row failures are collected rather
/// than aborting the pass, so one bad row cannot block the rest.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub pushed: usize,
    pub pulled: usize,
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Sync facade owning the remote client. Constructed explicitly from the
/// remote section of the config; callers hold one per session.
pub struct SyncService {
    client: RemoteClient,
    status: SyncStatus,
}

impl SyncService {
    pub fn new(config: &RemoteConfig) -> Result<Self, String> {
        Ok(Self {
            client: RemoteClient::new(config)?,
            status: SyncStatus::Idle,
        })
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    /// Upsert every local row to the remote tables. Rows keep their ids,
    /// so re-pushing is idempotent on the backend.
    pub async fn push_all(&mut self, snapshot: &Snapshot) -> SyncResult {
        self.status = SyncStatus::Syncing;
        let mut result = SyncResult::default();

        for project in &snapshot.projects {
            match self.client.upsert_project(project).await {
                Ok(()) => result.pushed += 1,
                Err(e) => result.errors.push(e),
            }
        }
        for task in &snapshot.tasks {
            match self.client.upsert_task(task).await {
                Ok(()) => result.pushed += 1,
                Err(e) => result.errors.push(e),
            }
        }
        for contact in &snapshot.contacts {
            match self.client.upsert_contact(contact).await {
                Ok(()) => result.pushed += 1,
                Err(e) => result.errors.push(e),
            }
        }
        for entry in &snapshot.time_entries {
            match self.client.upsert_time_entry(entry).await {
                Ok(()) => result.pushed += 1,
                Err(e) => result.errors.push(e),
            }
        }

        self.finish(&result);
        result
    }

    /// Fetch every remote table and return the rows as a local snapshot.
    /// The caller decides whether to replace its collections with it.
    pub async fn pull(&mut self) -> Result<Snapshot, String> {
        self.status = SyncStatus::Syncing;
        match self.client.fetch_all().await {
            Ok(remote) => {
                let snapshot = remote_to_snapshot(&remote);
                let pulled = snapshot.projects.len()
                    + snapshot.tasks.len()
                    + snapshot.contacts.len()
                    + snapshot.time_entries.len();
                log::info!("Pulled {} rows from remote", pulled);
                self.status = SyncStatus::LastSynced(now_label());
                Ok(snapshot)
            }
            Err(e) => {
                log::error!("Pull failed: {}", e);
                self.status = SyncStatus::Error(e.clone());
                Err(e)
            }
        }
    }

    fn finish(&mut self, result: &SyncResult) {
        if result.errors.is_empty() {
            log::info!("Pushed {} rows to remote", result.pushed);
            self.status = SyncStatus::LastSynced(now_label());
        } else {
            log::warn!(
                "Push finished with {} errors ({} rows pushed)",
                result.errors.len(),
                result.pushed
            );
            self.status = SyncStatus::Error(format!("{} rows failed", result.errors.len()));
        }
    }
}

/// Watches the remote `projects` table for changes made elsewhere. On a
/// watermark change it only raises the refresh flag; the owner of the
/// store decides when to actually pull.
pub struct ChangeWatcher {
    last_seen: Option<String>,
    needs_refresh: AtomicBool,
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeWatcher {
    pub fn new() -> Self {
        Self {
            last_seen: None,
            needs_refresh: AtomicBool::new(false),
        }
    }

    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh.load(Ordering::Relaxed)
    }

    /// Clear the flag after the owner has pulled.
    pub fn acknowledge(&self) {
        self.needs_refresh.store(false, Ordering::Relaxed);
    }

    /// One poll step. Errors are logged and treated as "no change" so a
    /// flaky connection does not trigger spurious refreshes.
    pub async fn poll(&mut self, client: &RemoteClient) {
        match client.latest_update("projects").await {
            Ok(watermark) => self.observe(watermark),
            Err(e) => log::debug!("Watermark poll failed: {}", e),
        }
    }

    fn observe(&mut self, watermark: Option<String>) {
        if watermark.is_none() {
            return;
        }
        match &self.last_seen {
            Some(seen) if *seen == *watermark.as_ref().unwrap() => {}
            Some(_) => {
                log::info!("Remote data changed, refresh needed");
                self.needs_refresh.store(true, Ordering::Relaxed);
                self.last_seen = watermark;
            }
            None => {
                // First observation establishes the baseline.
                self.last_seen = watermark;
            }
        }
    }
}

fn now_label() -> String {
    chrono::Local::now().format("%d.%m.%Y %H:%M").to_string()
}
