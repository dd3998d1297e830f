//! Settings store
//!
//! A JSON object on disk mapping fixed keys (`layout`, `keybindings`,
//! `workspace`) to whole-object blobs. Missing files and missing keys read as
//! defaults; writes replace the file atomically (temp file, then rename).

use crate::models::{Keybindings, Layout, LayoutPatch, WorkspacePrefs, KEYBINDINGS_KEY, LAYOUT_KEY, WORKSPACE_KEY};
use crate::services::error::PreferencesError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

pub struct SettingsStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_all(&self) -> Result<Map<String, Value>, PreferencesError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let contents = fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    "Settings file {} is not a JSON object, using defaults",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }

    async fn save_all(&self, settings: &Map<String, Value>) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let serialized = serde_json::to_string_pretty(settings)
            .map_err(|e| PreferencesError::serialization("*", e))?;

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_file = PathBuf::from(temp_name);

        // Atomic write: write to temp file, then rename
        fs::write(&temp_file, serialized).await?;
        fs::rename(&temp_file, &self.path).await?;

        Ok(())
    }

    /// Read the blob stored under `key`
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PreferencesError> {
        let settings = self.load_all().await?;
        settings
            .get(key)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| PreferencesError::serialization(key, e))
    }

    pub async fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, PreferencesError> {
        Ok(self.get(key).await?.unwrap_or_default())
    }

    /// Replace the blob stored under `key`
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PreferencesError> {
        let value = serde_json::to_value(value).map_err(|e| PreferencesError::serialization(key, e))?;

        let _guard = self.write_lock.lock().await;
        let mut settings = self.load_all().await?;
        settings.insert(key.to_string(), value);
        self.save_all(&settings).await?;

        tracing::debug!("Saved setting '{}'", key);
        Ok(())
    }

    /// Read-modify-write the blob under `key` while holding the write lock
    ///
    /// A missing key starts from `T::default()`. Returns the stored value.
    pub async fn update<T, F>(&self, key: &str, f: F) -> Result<T, PreferencesError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock().await;
        let mut settings = self.load_all().await?;

        let mut value: T = settings
            .get(key)
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| PreferencesError::serialization(key, e))?
            .unwrap_or_default();
        f(&mut value);

        let stored = serde_json::to_value(&value).map_err(|e| PreferencesError::serialization(key, e))?;
        settings.insert(key.to_string(), stored);
        self.save_all(&settings).await?;

        tracing::debug!("Updated setting '{}'", key);
        Ok(value)
    }

    pub async fn layout(&self) -> Result<Layout, PreferencesError> {
        self.get_or_default(LAYOUT_KEY).await
    }

    /// Merge a partial layout over the stored one and persist the result
    pub async fn update_layout(&self, patch: LayoutPatch) -> Result<Layout, PreferencesError> {
        self.update(LAYOUT_KEY, |layout: &mut Layout| {
            *layout = std::mem::take(layout).merge(patch);
        })
        .await
    }

    pub async fn keybindings(&self) -> Result<Keybindings, PreferencesError> {
        self.get_or_default(KEYBINDINGS_KEY).await
    }

    pub async fn set_keybindings(&self, keybindings: &Keybindings) -> Result<(), PreferencesError> {
        self.set(KEYBINDINGS_KEY, keybindings).await
    }

    pub async fn workspace(&self) -> Result<WorkspacePrefs, PreferencesError> {
        self.get_or_default(WORKSPACE_KEY).await
    }

    pub async fn set_workspace(&self, prefs: &WorkspacePrefs) -> Result<(), PreferencesError> {
        self.set(WORKSPACE_KEY, prefs).await
    }

    pub async fn update_workspace<F>(&self, f: F) -> Result<WorkspacePrefs, PreferencesError>
    where
        F: FnOnce(&mut WorkspacePrefs),
    {
        self.update(WORKSPACE_KEY, f).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SidebarPosition;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("settings.json"));

        assert_eq!(store.layout().await.unwrap(), Layout::default());
        assert_eq!(store.keybindings().await.unwrap().toggle_sidebar, "Mod-b");
        assert!(store.workspace().await.unwrap().active_space_id.is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent_blobs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(&path);

        store
            .update_layout(LayoutPatch {
                sidebar_position: Some(SidebarPosition::Right),
            })
            .await
            .unwrap();
        let mut prefs = WorkspacePrefs::default();
        prefs.active_space_id = Some("s1".to_string());
        store.set_workspace(&prefs).await.unwrap();

        // a fresh store sees both keys
        let reopened = SettingsStore::new(&path);
        assert_eq!(
            reopened.layout().await.unwrap().sidebar_position,
            SidebarPosition::Right
        );
        assert_eq!(reopened.workspace().await.unwrap(), prefs);
        assert!(!temp_dir.path().join("nested").join("settings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_both_changes() {
        let temp_dir = TempDir::new().unwrap();
        let store = SettingsStore::new(temp_dir.path().join("settings.json"));

        for i in 0..10 {
            let space = format!("s{}", i);
            let (opened, activated) = tokio::join!(
                store.update_workspace(|prefs| {
                    prefs.last_opened.insert(space.clone(), format!("n{}", i));
                }),
                store.update_workspace(|prefs| prefs.active_space_id = Some(space.clone())),
            );
            opened.unwrap();
            activated.unwrap();
        }

        let prefs = store.workspace().await.unwrap();
        assert_eq!(prefs.last_opened.len(), 10);
        assert_eq!(prefs.last_opened.get("s3").map(String::as_str), Some("n3"));
        assert_eq!(prefs.active_space_id.as_deref(), Some("s9"));
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(&path);
        assert_eq!(store.layout().await.unwrap(), Layout::default());
    }
}
