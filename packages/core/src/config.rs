//! Application configuration
//!
//! Every path defaults to a location under `~/.unfold/`; each can be
//! overridden from the environment:
//!
//! | Variable               | Field               |
//! |------------------------|---------------------|
//! | `UNFOLD_DB_PATH`       | `database_path`     |
//! | `UNFOLD_DATA_DIR`      | `data_dir`          |
//! | `UNFOLD_SETTINGS_PATH` | `settings_path`     |
//! | `UNFOLD_EXPORT_DIR`    | `export_dir`        |
//! | `UNFOLD_AUTOSAVE_MS`   | `autosave_delay_ms` |

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// Attachments live under `images/` here
    pub data_dir: PathBuf,
    pub settings_path: PathBuf,
    pub export_dir: PathBuf,
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_MS
}

impl AppConfig {
    /// All paths under `root`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            database_path: root.join("unfold.db"),
            data_dir: root.to_path_buf(),
            settings_path: root.join("settings.json"),
            export_dir: root.join("exports"),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
        }
    }

    /// Defaults under `~/.unfold/`, then environment overrides
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".unfold");
        let mut config = Self::with_root(root);

        if let Some(path) = lookup("UNFOLD_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("UNFOLD_DATA_DIR") {
            config.data_dir = PathBuf::from(path);
        }
        if let Some(path) = lookup("UNFOLD_SETTINGS_PATH") {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("UNFOLD_EXPORT_DIR") {
            config.export_dir = PathBuf::from(path);
        }
        if let Some(ms) = lookup("UNFOLD_AUTOSAVE_MS") {
            match ms.trim().parse() {
                Ok(ms) => config.autosave_delay_ms = ms,
                Err(_) => tracing::warn!(
                    "Ignoring invalid UNFOLD_AUTOSAVE_MS '{}', using {}ms",
                    ms,
                    config.autosave_delay_ms
                ),
            }
        }
        config
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_with_root_layout() {
        let config = AppConfig::with_root("/tmp/u");
        assert_eq!(config.database_path, PathBuf::from("/tmp/u/unfold.db"));
        assert_eq!(config.images_dir(), PathBuf::from("/tmp/u/images"));
        assert_eq!(config.autosave_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("UNFOLD_DB_PATH", "/data/notes.db"),
            ("UNFOLD_AUTOSAVE_MS", "250"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.database_path, PathBuf::from("/data/notes.db"));
        assert_eq!(config.autosave_delay_ms, 250);
        assert!(config.settings_path.ends_with(".unfold/settings.json"));
    }

    #[test]
    fn test_invalid_delay_keeps_default() {
        let config = AppConfig::from_lookup(|k| (k == "UNFOLD_AUTOSAVE_MS").then(|| "soon".to_string()));
        assert_eq!(config.autosave_delay_ms, DEFAULT_AUTOSAVE_DELAY_MS);
    }
}
