//! Workspace Service - Node Tree Store Business Logic
//!
//! Owns the in-memory view of every space (a [`NodeTree`] per space) and keeps
//! it consistent with the persistent [`NodeStore`].
//!
//! # Architecture
//!
//! - **Optimistic updates**: name, content, open and pin changes are applied in
//!   memory first; if the write fails, only the fields that write touched are
//!   put back and the error is returned
//! - **Wholesale reloads**: deletes reload the space from the store so cascades are
//!   reflected exactly
//! - **Lifecycle**: `Uninitialized -> Loading -> Ready`; the first run creates the
//!   default space "mine"
//! - **Durable navigation**: active space and last-opened page per space live in the
//!   settings store
//!
//! # Examples
//!
//! ```rust,no_run
//! use unfold_core::db::{DatabaseService, LibsqlStore};
//! use unfold_core::services::WorkspaceService;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./unfold.db")).await?);
//!     let workspace = WorkspaceService::new(Arc::new(LibsqlStore::new(db)), None);
//!     workspace.initialize().await?;
//!
//!     if let Some(id) = workspace.add_node(None).await? {
//!         workspace
//!             .update_node_content(&id, r#"{"type":"doc","content":[]}"#)
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::db::NodeStore;
use crate::models::{
    derive_name, Node, NodeTree, NodeUpdate, Space, TreeItem, WorkspacePrefs, DEFAULT_SPACE_ID,
    DEFAULT_SPACE_NAME, NEW_SPACE_NAME,
};
use crate::services::autosave::ContentSink;
use crate::services::error::WorkspaceError;
use crate::services::preferences::SettingsStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceStatus {
    Uninitialized,
    Loading,
    Ready,
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkspaceStatus::Uninitialized => "uninitialized",
            WorkspaceStatus::Loading => "loading",
            WorkspaceStatus::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// A space with its page forest
#[derive(Debug, Clone)]
pub struct LoadedSpace {
    pub space: Space,
    pub tree: NodeTree,
}

impl LoadedSpace {
    pub fn file_tree(&self) -> Vec<TreeItem> {
        self.tree.items()
    }

    pub fn pinned_nodes(&self) -> Vec<Node> {
        self.tree.pinned().into_iter().cloned().collect()
    }
}

#[derive(Debug)]
struct WorkspaceState {
    status: WorkspaceStatus,
    spaces: Vec<LoadedSpace>,
    active_space_id: Option<String>,
}

impl WorkspaceState {
    fn space(&self, id: &str) -> Option<&LoadedSpace> {
        self.spaces.iter().find(|s| s.space.id == id)
    }

    fn space_mut(&mut self, id: &str) -> Option<&mut LoadedSpace> {
        self.spaces.iter_mut().find(|s| s.space.id == id)
    }

    fn active(&self) -> Option<&LoadedSpace> {
        self.active_space_id
            .as_deref()
            .and_then(|id| self.space(id))
    }

    fn space_of_node(&self, node_id: &str) -> Option<&LoadedSpace> {
        self.spaces.iter().find(|s| s.tree.contains(node_id))
    }

    fn space_of_node_mut(&mut self, node_id: &str) -> Option<&mut LoadedSpace> {
        self.spaces.iter_mut().find(|s| s.tree.contains(node_id))
    }
}

/// Pick the space to activate on startup
///
/// Priority: `preferred` if it still exists, then the space named "mine",
/// then the first space.
pub fn resolve_initial_space_id(spaces: &[Space], preferred: Option<&str>) -> Option<String> {
    preferred
        .and_then(|id| spaces.iter().find(|s| s.id == id))
        .or_else(|| spaces.iter().find(|s| s.name == DEFAULT_SPACE_NAME))
        .or_else(|| spaces.first())
        .map(|s| s.id.clone())
}

pub struct WorkspaceService {
    store: Arc<dyn NodeStore>,
    settings: Option<Arc<SettingsStore>>,
    state: RwLock<WorkspaceState>,
}

impl WorkspaceService {
    /// Create an uninitialized service; call [`initialize`](Self::initialize) before use
    ///
    /// Without a settings store, the active space and last-opened pages are
    /// kept in memory only.
    pub fn new(store: Arc<dyn NodeStore>, settings: Option<Arc<SettingsStore>>) -> Self {
        Self {
            store,
            settings,
            state: RwLock::new(WorkspaceState {
                status: WorkspaceStatus::Uninitialized,
                spaces: Vec::new(),
                active_space_id: None,
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    pub async fn status(&self) -> WorkspaceStatus {
        self.state.read().await.status
    }

    async fn load_prefs(&self) -> Result<WorkspacePrefs, WorkspaceError> {
        match &self.settings {
            Some(settings) => Ok(settings.workspace().await?),
            None => Ok(WorkspacePrefs::default()),
        }
    }

    async fn update_prefs<F>(&self, f: F) -> Result<(), WorkspaceError>
    where
        F: FnOnce(&mut WorkspacePrefs),
    {
        if let Some(settings) = &self.settings {
            settings.update_workspace(f).await?;
        }
        Ok(())
    }

    /// Load every space and its pages, creating the default space on first run
    pub async fn initialize(&self) -> Result<(), WorkspaceError> {
        self.state.write().await.status = WorkspaceStatus::Loading;

        match self.load_all().await {
            Ok((spaces, active_space_id)) => {
                let mut state = self.state.write().await;
                state.spaces = spaces;
                state.active_space_id = active_space_id;
                state.status = WorkspaceStatus::Ready;
                tracing::info!(
                    "Workspace ready: {} space(s), active {:?}",
                    state.spaces.len(),
                    state.active_space_id
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load workspace: {}", e);
                self.state.write().await.status = WorkspaceStatus::Uninitialized;
                Err(e)
            }
        }
    }

    async fn load_all(&self) -> Result<(Vec<LoadedSpace>, Option<String>), WorkspaceError> {
        let mut spaces = self.store.list_spaces().await?;
        if spaces.is_empty() {
            tracing::info!("No spaces found, creating default space '{}'", DEFAULT_SPACE_NAME);
            let space = Space::new_with_id(
                DEFAULT_SPACE_ID.to_string(),
                DEFAULT_SPACE_NAME.to_string(),
                0,
            );
            spaces.push(self.store.create_space(space).await?);
        }

        let mut loaded = Vec::with_capacity(spaces.len());
        for space in spaces {
            let rows = self.store.list_nodes(&space.id).await?;
            loaded.push(LoadedSpace {
                tree: NodeTree::build(rows),
                space,
            });
        }

        let prefs = self.load_prefs().await?;
        let plain: Vec<Space> = loaded.iter().map(|s| s.space.clone()).collect();
        let active = resolve_initial_space_id(&plain, prefs.active_space_id.as_deref());

        Ok((loaded, active))
    }

    async fn ensure_ready(&self) -> Result<(), WorkspaceError> {
        let status = self.status().await;
        if status == WorkspaceStatus::Ready {
            Ok(())
        } else {
            Err(WorkspaceError::NotReady(status.to_string()))
        }
    }

    /// Re-read one space's pages from the store
    pub async fn reload_space(&self, space_id: &str) -> Result<(), WorkspaceError> {
        let rows = self.store.list_nodes(space_id).await?;
        let tree = NodeTree::build(rows);

        let mut state = self.state.write().await;
        if let Some(space) = state.space_mut(space_id) {
            space.tree = tree;
        }
        Ok(())
    }

    //
    // READS
    //

    pub async fn spaces(&self) -> Vec<Space> {
        let state = self.state.read().await;
        state.spaces.iter().map(|s| s.space.clone()).collect()
    }

    pub async fn active_space_id(&self) -> Option<String> {
        self.state.read().await.active_space_id.clone()
    }

    pub async fn active_space(&self) -> Option<LoadedSpace> {
        self.state.read().await.active().cloned()
    }

    /// Nested page tree of the active space
    pub async fn file_tree(&self) -> Vec<TreeItem> {
        let state = self.state.read().await;
        state.active().map(LoadedSpace::file_tree).unwrap_or_default()
    }

    /// Pinned pages of the active space
    pub async fn pinned_nodes(&self) -> Vec<Node> {
        let state = self.state.read().await;
        state.active().map(LoadedSpace::pinned_nodes).unwrap_or_default()
    }

    pub async fn is_node_pinned(&self, id: &str) -> bool {
        self.get_node(id).await.is_some_and(|n| n.is_pinned)
    }

    pub async fn get_node(&self, id: &str) -> Option<Node> {
        let state = self.state.read().await;
        state
            .space_of_node(id)
            .and_then(|s| s.tree.get(id))
            .cloned()
    }

    /// Nodes from the space root to `id`, inclusive; empty when unknown
    pub async fn get_node_path(&self, id: &str) -> Vec<Node> {
        let state = self.state.read().await;
        state
            .space_of_node(id)
            .map(|s| s.tree.path(id))
            .unwrap_or_default()
    }

    /// Visible node right before `id` with closed folders collapsed
    pub async fn get_previous_visible_node(&self, id: &str) -> Option<String> {
        let state = self.state.read().await;
        state.space_of_node(id)?.tree.previous_visible(id)
    }

    /// First page with content (else first leaf) of the active space
    pub async fn first_file_id(&self) -> Option<String> {
        let state = self.state.read().await;
        state.active()?.tree.first_file_id()
    }

    //
    // NODE WRITES
    //

    /// Create an empty page under `parent_id` (top level for `None`) in the active space
    ///
    /// Returns `None` when the parent is unknown. The parent is opened so the
    /// new page is visible.
    pub async fn add_node(&self, parent_id: Option<&str>) -> Result<Option<String>, WorkspaceError> {
        self.ensure_ready().await?;

        let (node, parent_was_open) = {
            let mut state = self.state.write().await;
            let Some(space_id) = state.active_space_id.clone() else {
                return Ok(None);
            };
            let Some(space) = state.space_mut(&space_id) else {
                return Ok(None);
            };
            if let Some(parent) = parent_id {
                if !space.tree.contains(parent) {
                    tracing::debug!("add_node: unknown parent {}", parent);
                    return Ok(None);
                }
            }

            let node = Node::new(space_id, parent_id.map(str::to_string), 0);
            space.tree.insert(node.clone());
            let parent_was_open = parent_id.and_then(|parent| space.tree.get(parent).map(|p| p.is_open));
            if let Some(parent) = parent_id {
                space.tree.update(parent, |p| p.is_open = true);
            }
            (node, parent_was_open)
        };

        let created = match self.store.create_node(node.clone()).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!("Failed to create node: {:#}", e);
                let mut state = self.state.write().await;
                if let Some(space) = state.space_mut(&node.space_id) {
                    space.tree.remove_subtree(&node.id);
                    if let (Some(parent), Some(false)) = (parent_id, parent_was_open) {
                        space.tree.update(parent, |p| p.is_open = false);
                    }
                }
                return Err(e.into());
            }
        };

        let id = created.id.clone();
        {
            let mut state = self.state.write().await;
            if let Some(space) = state.space_mut(&created.space_id) {
                space.tree.update(&id, |n| *n = created);
            }
        }
        tracing::debug!("Created node {}", id);

        // the page row stands either way; only the parent's open flag is undone
        if let (Some(parent), Some(false)) = (parent_id, parent_was_open) {
            if let Err(e) = self
                .store
                .update_node(parent, NodeUpdate::new().with_open(true))
                .await
            {
                tracing::error!("Created node {} but failed to open parent {}: {:#}", id, parent, e);
                let mut state = self.state.write().await;
                if let Some(space) = state.space_of_node_mut(parent) {
                    space.tree.update(parent, |p| p.is_open = false);
                }
                return Err(e.into());
            }
        }
        Ok(Some(id))
    }

    /// Apply `update` in memory, persist it, and roll back on failure
    ///
    /// Unknown ids are a no-op.
    async fn patch_node(&self, id: &str, update: NodeUpdate) -> Result<(), WorkspaceError> {
        let rollback = {
            let mut state = self.state.write().await;
            let Some(space) = state.space_of_node_mut(id) else {
                tracing::debug!("Ignoring update of unknown node {}", id);
                return Ok(());
            };
            let Some(previous) = space.tree.get(id).cloned() else {
                return Ok(());
            };
            space.tree.update(id, |n| update.apply_to(n));
            update.rollback_from(&previous)
        };

        match self.store.update_node(id, update).await {
            Ok(found) => {
                if !found {
                    tracing::warn!("Node {} vanished from the store during update", id);
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to update node {}: {:#}", id, e);
                let mut state = self.state.write().await;
                if let Some(space) = state.space_of_node_mut(id) {
                    space.tree.update(id, |n| rollback.apply_to(n));
                }
                Err(e.into())
            }
        }
    }

    /// Persist new content and the name derived from it in one write
    pub async fn update_node_content(&self, id: &str, content: &str) -> Result<(), WorkspaceError> {
        let name = derive_name(content);
        self.patch_node(id, NodeUpdate::new().with_content(content).with_name(name))
            .await
    }

    /// Explicit rename; a blank name is stored as empty
    pub async fn rename_node(&self, id: &str, name: &str) -> Result<(), WorkspaceError> {
        self.patch_node(id, NodeUpdate::new().with_name(name.trim()))
            .await
    }

    /// Flip a node's open flag
    pub async fn toggle_folder(&self, id: &str) -> Result<(), WorkspaceError> {
        let Some(node) = self.get_node(id).await else {
            return Ok(());
        };
        self.patch_node(id, NodeUpdate::new().with_open(!node.is_open))
            .await
    }

    /// Flip a node's pinned flag
    pub async fn toggle_pin(&self, id: &str) -> Result<(), WorkspaceError> {
        let Some(node) = self.get_node(id).await else {
            return Ok(());
        };
        self.patch_node(id, NodeUpdate::new().with_pinned(!node.is_pinned))
            .await
    }

    /// Delete a node and its descendants, then reload the space
    pub async fn delete_node(&self, id: &str) -> Result<(), WorkspaceError> {
        let found = {
            let state = self.state.read().await;
            let found = state.space_of_node(id).map(|s| {
                let ids: Vec<String> = s
                    .tree
                    .flatten_branch(id)
                    .into_iter()
                    .map(|(n, _)| n.id.clone())
                    .collect();
                (s.space.id.clone(), ids)
            });
            found
        };
        let Some((space_id, removed_ids)) = found else {
            return Ok(());
        };

        if let Err(e) = self.store.delete_node(id).await {
            tracing::error!("Failed to delete node {}: {:#}", id, e);
            return Err(e.into());
        }
        tracing::debug!("Deleted node {} with {} descendant(s)", id, removed_ids.len() - 1);

        self.reload_space(&space_id).await?;

        let last = self.last_opened(&space_id).await?;
        if last.is_some_and(|last| removed_ids.contains(&last)) {
            self.update_prefs(|prefs| {
                prefs.last_opened.remove(&space_id);
            })
            .await?;
        }
        Ok(())
    }

    //
    // SPACES
    //

    /// Create a space and make it active; a blank name becomes "new Space"
    pub async fn create_space(&self, name: Option<&str>) -> Result<Space, WorkspaceError> {
        self.ensure_ready().await?;

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(NEW_SPACE_NAME)
            .to_string();

        let (space, previous_active) = {
            let mut state = self.state.write().await;
            let space = Space::new(name, state.spaces.len() as i64);
            state.spaces.push(LoadedSpace {
                space: space.clone(),
                tree: NodeTree::new(),
            });
            let previous = state.active_space_id.replace(space.id.clone());
            (space, previous)
        };

        match self.store.create_space(space.clone()).await {
            Ok(stored) => {
                {
                    let mut state = self.state.write().await;
                    if let Some(slot) = state.space_mut(&stored.id) {
                        slot.space = stored.clone();
                    }
                }
                let id = stored.id.clone();
                self.update_prefs(|prefs| prefs.active_space_id = Some(id))
                    .await?;
                tracing::info!("Created space {} '{}'", stored.id, stored.name);
                Ok(stored)
            }
            Err(e) => {
                tracing::error!("Failed to create space: {:#}", e);
                let mut state = self.state.write().await;
                state.spaces.retain(|s| s.space.id != space.id);
                state.active_space_id = previous_active;
                Err(e.into())
            }
        }
    }

    /// Rename a space; blank names are refused silently
    pub async fn rename_space(&self, id: &str, name: &str) -> Result<(), WorkspaceError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let previous_name = {
            let mut state = self.state.write().await;
            let Some(space) = state.space_mut(id) else {
                return Ok(());
            };
            std::mem::replace(&mut space.space.name, name.to_string())
        };

        if let Err(e) = self.store.rename_space(id, name).await {
            tracing::error!("Failed to rename space {}: {:#}", id, e);
            if let Some(space) = self.state.write().await.space_mut(id) {
                space.space.name = previous_name;
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Delete a space and its pages
    ///
    /// Refused (returns `false`) for unknown ids and for the last remaining space.
    pub async fn delete_space(&self, id: &str) -> Result<bool, WorkspaceError> {
        {
            let state = self.state.read().await;
            if state.spaces.len() <= 1 || state.space(id).is_none() {
                tracing::debug!("Refusing to delete space {}", id);
                return Ok(false);
            }
        }

        if let Err(e) = self.store.delete_space(id).await {
            tracing::error!("Failed to delete space {}: {:#}", id, e);
            return Err(e.into());
        }

        let active = {
            let mut state = self.state.write().await;
            state.spaces.retain(|s| s.space.id != id);
            if state.active_space_id.as_deref() == Some(id) {
                state.active_space_id = state.spaces.first().map(|s| s.space.id.clone());
            }
            state.active_space_id.clone()
        };

        self.update_prefs(|prefs| {
            prefs.last_opened.remove(id);
            prefs.active_space_id = active;
        })
        .await?;

        tracing::info!("Deleted space {}", id);
        Ok(true)
    }

    /// Activate a space; unknown ids fall back to the first space
    pub async fn set_active_space(&self, id: &str) -> Result<Option<String>, WorkspaceError> {
        let active = {
            let mut state = self.state.write().await;
            let active = if state.space(id).is_some() {
                Some(id.to_string())
            } else {
                state.spaces.first().map(|s| s.space.id.clone())
            };
            state.active_space_id = active.clone();
            active
        };

        let persisted = active.clone();
        self.update_prefs(|prefs| prefs.active_space_id = persisted)
            .await?;
        Ok(active)
    }

    //
    // LAST OPENED
    //

    pub async fn last_opened(&self, space_id: &str) -> Result<Option<String>, WorkspaceError> {
        let prefs = self.load_prefs().await?;
        Ok(prefs.last_opened.get(space_id).cloned())
    }

    pub async fn set_last_opened(&self, space_id: &str, node_id: &str) -> Result<(), WorkspaceError> {
        self.update_prefs(|prefs| {
            prefs
                .last_opened
                .insert(space_id.to_string(), node_id.to_string());
        })
        .await
    }
}

#[async_trait]
impl ContentSink for WorkspaceService {
    async fn save_content(&self, node_id: &str, content: &str) -> anyhow::Result<()> {
        self.update_node_content(node_id, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, LibsqlStore};
    use tempfile::TempDir;

    async fn create_test_service() -> (WorkspaceService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
        let settings = Arc::new(SettingsStore::new(temp_dir.path().join("settings.json")));
        let service = WorkspaceService::new(Arc::new(LibsqlStore::new(db)), Some(settings));
        (service, temp_dir)
    }

    async fn open_service(db_path: &std::path::Path, settings_path: &std::path::Path) -> WorkspaceService {
        let db = Arc::new(DatabaseService::new(db_path.to_path_buf()).await.unwrap());
        let settings = Arc::new(SettingsStore::new(settings_path));
        let service = WorkspaceService::new(Arc::new(LibsqlStore::new(db)), Some(settings));
        service.initialize().await.unwrap();
        service
    }

    fn space(id: &str, name: &str) -> Space {
        Space::new_with_id(id.to_string(), name.to_string(), 0)
    }

    #[test]
    fn test_resolve_initial_space_priority() {
        let spaces = vec![space("a", "work"), space("b", "mine"), space("c", "misc")];

        assert_eq!(resolve_initial_space_id(&spaces, Some("c")).as_deref(), Some("c"));
        assert_eq!(resolve_initial_space_id(&spaces, Some("gone")).as_deref(), Some("b"));
        assert_eq!(resolve_initial_space_id(&spaces[..1], None).as_deref(), Some("a"));
        assert_eq!(resolve_initial_space_id(&[], None), None);
    }

    #[tokio::test]
    async fn test_first_run_creates_default_space() {
        let (service, _temp_dir) = create_test_service().await;
        assert_eq!(service.status().await, WorkspaceStatus::Uninitialized);

        service.initialize().await.unwrap();

        assert_eq!(service.status().await, WorkspaceStatus::Ready);
        let spaces = service.spaces().await;
        assert_eq!(spaces.len(), 1);
        assert_eq!(spaces[0].name, DEFAULT_SPACE_NAME);
        assert_eq!(service.active_space_id().await.as_deref(), Some(DEFAULT_SPACE_ID));
    }

    #[tokio::test]
    async fn test_writes_require_ready() {
        let (service, _temp_dir) = create_test_service().await;
        assert!(matches!(
            service.add_node(None).await,
            Err(WorkspaceError::NotReady(_))
        ));
    }

    #[tokio::test]
    async fn test_add_child_opens_parent() {
        let (service, _temp_dir) = create_test_service().await;
        service.initialize().await.unwrap();

        let parent = service.add_node(None).await.unwrap().unwrap();
        let child = service.add_node(Some(&parent)).await.unwrap().unwrap();

        assert!(service.get_node(&parent).await.unwrap().is_open);
        let path: Vec<String> = service
            .get_node_path(&child)
            .await
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(path, vec![parent.clone(), child]);

        assert_eq!(service.add_node(Some("missing")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rename_keeps_empty_name() {
        let (service, _temp_dir) = create_test_service().await;
        service.initialize().await.unwrap();
        let id = service.add_node(None).await.unwrap().unwrap();

        service.rename_node(&id, "   ").await.unwrap();
        assert_eq!(service.get_node(&id).await.unwrap().name, "");

        let stored = service.store().get_node(&id).await.unwrap().unwrap();
        assert_eq!(stored.name, "");
    }

    #[tokio::test]
    async fn test_toggle_flags() {
        let (service, _temp_dir) = create_test_service().await;
        service.initialize().await.unwrap();
        let id = service.add_node(None).await.unwrap().unwrap();

        service.toggle_pin(&id).await.unwrap();
        assert!(service.is_node_pinned(&id).await);
        assert_eq!(service.pinned_nodes().await.len(), 1);

        service.toggle_folder(&id).await.unwrap();
        service.toggle_folder(&id).await.unwrap();
        assert!(!service.get_node(&id).await.unwrap().is_open);

        // unknown ids are no-ops
        service.toggle_pin("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_space_lifecycle() {
        let (service, _temp_dir) = create_test_service().await;
        service.initialize().await.unwrap();

        // last space cannot be deleted
        assert!(!service.delete_space(DEFAULT_SPACE_ID).await.unwrap());

        let work = service.create_space(Some("  ")).await.unwrap();
        assert_eq!(work.name, NEW_SPACE_NAME);
        assert_eq!(work.sort_order, 1);
        assert_eq!(service.active_space_id().await, Some(work.id.clone()));

        service.rename_space(&work.id, "").await.unwrap();
        service.rename_space(&work.id, "work").await.unwrap();
        assert_eq!(service.active_space().await.unwrap().space.name, "work");

        let page = service.add_node(None).await.unwrap().unwrap();
        service.set_last_opened(&work.id, &page).await.unwrap();

        assert!(service.delete_space(&work.id).await.unwrap());
        assert_eq!(service.active_space_id().await.as_deref(), Some(DEFAULT_SPACE_ID));
        assert_eq!(service.last_opened(&work.id).await.unwrap(), None);
        assert!(service.store().get_node(&page).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_space_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let settings_path = temp_dir.path().join("settings.json");

        let first = open_service(&db_path, &settings_path).await;
        let other = first.create_space(Some("other")).await.unwrap();
        drop(first);

        let second = open_service(&db_path, &settings_path).await;
        assert_eq!(second.active_space_id().await, Some(other.id.clone()));

        assert_eq!(
            second.set_active_space("missing").await.unwrap().as_deref(),
            Some(DEFAULT_SPACE_ID)
        );
    }
}
