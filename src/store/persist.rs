use std::path::{Path, PathBuf};

use super::Snapshot;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence step of the mutation pipeline: mutate, notify, persist.
/// Implementations receive the whole snapshot on every mutation; failures
/// are logged by the store and never propagated to the mutator.
pub trait Persister {
    fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    fn describe(&self) -> &'static str {
        "persister"
    }
}

/// Used when no durable medium is active (tests, transient sessions).
pub struct NoopPersister;

impl Persister for NoopPersister {
    fn persist(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Ok(())
    }

    fn describe(&self) -> &'static str {
        "noop"
    }
}

/// Mirrors the full store to a JSON file on every mutation.
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persister for JsonFilePersister {
    fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        save_snapshot(snapshot, &self.path)
    }

    fn describe(&self) -> &'static str {
        "json-file"
    }
}

/// Write a snapshot to a JSON file, creating parent directories as needed.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;

    #[test]
    fn snapshot_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("misrad-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("store.json");

        let snapshot = Snapshot {
            projects: vec![Project::new("Alpha")],
            ..Snapshot::default()
        };

        save_snapshot(&snapshot, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("misrad-test-does-not-exist.json");
        assert!(load_snapshot(&path).is_err());
    }
}
