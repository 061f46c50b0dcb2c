use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CONFIG_VERSION: u64 = 1;

/// Default port the desktop companion helper listens on.
pub const DEFAULT_COMPANION_PORT: u16 = 7777;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("misrad")
}

/// Settings for the hosted relational backend. Rows in every table are
/// scoped by `user_id`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MisradConfig {
    pub data_directory: PathBuf,
    pub companion_port: u16,
    /// Whether a native shell is hosting the app (enables OS-level actions).
    pub native_shell: bool,
    pub remote: Option<RemoteConfig>,
    pub debug_logging: bool,
}

impl Default for MisradConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            companion_port: DEFAULT_COMPANION_PORT,
            native_shell: false,
            remote: None,
            debug_logging: false,
        }
    }
}

impl MisradConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_directory.join("store.json")
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("misrad")
            .join("config.json")
    }

    /// Load the config file, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, raw)
    }

    /// Ensure the data directory and an empty store file exist.
    pub fn ensure_files(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)?;

        let store_path = self.store_path();
        if !store_path.exists() {
            let empty = r#"{
  "projects": [],
  "tasks": [],
  "contacts": [],
  "timeEntries": [],
  "personalTasks": [],
  "tags": []
}
"#;
            std::fs::write(&store_path, empty)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_misrad_data_dir() {
        let config = MisradConfig::default();
        assert!(config.data_directory.ends_with("misrad"));
        assert_eq!(config.companion_port, DEFAULT_COMPANION_PORT);
        assert!(config.remote.is_none());
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = MisradConfig::default();
        config.remote = Some(RemoteConfig {
            base_url: "https://example.supabase.co".into(),
            api_key: "key".into(),
            user_id: "user-1".into(),
        });
        let raw = serde_json::to_string(&config).unwrap();
        let parsed: MisradConfig = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, config);
    }
}
