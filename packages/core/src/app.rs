//! Application Controller
//!
//! Wires the services together and owns the one [`EditorSession`] that may be
//! open at a time. Navigation always closes the previous session first, so its
//! pending content is written before the next page loads.
//!
//! # Examples
//!
//! ```rust,no_run
//! use unfold_core::app::{AppController, ExportOptions};
//! use unfold_core::config::AppConfig;
//! use unfold_core::export::PrintScope;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = AppController::open(AppConfig::from_env()).await?;
//!     app.restore_last_page().await?;
//!     app.export(PrintScope::Space, ExportOptions::default()).await?;
//!     app.shutdown().await
//! }
//! ```

use crate::config::AppConfig;
use crate::db::{DatabaseService, LibsqlStore, NodeStore};
use crate::editor::EditorSession;
use crate::export::{
    collect_printable, page_title, save_export, ExportPayload, ExportTheme, ExportWorker,
    PageRenderer, PlainTextRenderer, PrintScope, Typography,
};
use crate::services::{AttachmentService, ContentSink, SettingsStore, WorkspaceService};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub theme: ExportTheme,
    pub typography: Typography,
}

pub struct AppController {
    config: AppConfig,
    workspace: Arc<WorkspaceService>,
    settings: Arc<SettingsStore>,
    attachments: AttachmentService,
    exporter: ExportWorker,
    session: Option<EditorSession>,
}

impl AppController {
    /// Open the database and settings named by `config`, exporting as plain text
    pub async fn open(config: AppConfig) -> Result<Self> {
        Self::open_with_renderer(config, Box::new(PlainTextRenderer)).await
    }

    pub async fn open_with_renderer(
        config: AppConfig,
        renderer: Box<dyn PageRenderer>,
    ) -> Result<Self> {
        let db = DatabaseService::new(config.database_path.clone())
            .await
            .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
        let store: Arc<dyn NodeStore> = Arc::new(LibsqlStore::new(Arc::new(db)));
        let settings = Arc::new(SettingsStore::new(config.settings_path.clone()));

        let workspace = Arc::new(WorkspaceService::new(store.clone(), Some(settings.clone())));
        workspace
            .initialize()
            .await
            .context("Failed to load workspace")?;

        let attachments = AttachmentService::new(store, config.images_dir());
        let exporter = ExportWorker::spawn(renderer).context("Failed to start export worker")?;

        tracing::info!("Opened Unfold data at {}", config.database_path.display());
        Ok(Self {
            config,
            workspace,
            settings,
            attachments,
            exporter,
            session: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Arc<WorkspaceService> {
        &self.workspace
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub fn attachments(&self) -> &AttachmentService {
        &self.attachments
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        self.session.as_mut()
    }

    /// Show `node_id` in the editor
    ///
    /// Returns false if the page does not exist; the current page then stays open.
    pub async fn open_page(&mut self, node_id: &str) -> Result<bool> {
        if self.session.as_ref().is_some_and(|s| s.node_id() == node_id) {
            return Ok(true);
        }
        let Some(node) = self.workspace.get_node(node_id).await else {
            tracing::debug!("open_page: unknown node {}", node_id);
            return Ok(false);
        };

        self.close_page().await?;

        let sink: Arc<dyn ContentSink> = self.workspace.clone();
        self.session = Some(EditorSession::open(
            &node,
            sink,
            self.config.autosave_delay(),
        ));
        self.workspace
            .set_last_opened(&node.space_id, &node.id)
            .await?;
        tracing::debug!("Opened page {}", node.id);
        Ok(true)
    }

    /// Flush and tear down the current session
    pub async fn close_page(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            let node_id = session.node_id().to_string();
            session
                .close()
                .await
                .with_context(|| format!("Failed to save page {node_id} on close"))?;
        }
        Ok(())
    }

    /// Reopen the last page of the active space, else its first file
    pub async fn restore_last_page(&mut self) -> Result<Option<String>> {
        let Some(space_id) = self.workspace.active_space_id().await else {
            return Ok(None);
        };

        let mut target = None;
        if let Some(last) = self.workspace.last_opened(&space_id).await? {
            if self.workspace.get_node(&last).await.is_some() {
                target = Some(last);
            }
        }
        if target.is_none() {
            target = self.workspace.first_file_id().await;
        }

        match target {
            Some(id) if self.open_page(&id).await? => Ok(Some(id)),
            _ => Ok(None),
        }
    }

    /// Switch spaces, closing the current page first
    pub async fn set_active_space(&mut self, space_id: &str) -> Result<Option<String>> {
        self.close_page().await?;
        let active = self.workspace.set_active_space(space_id).await?;
        self.restore_last_page().await?;
        Ok(active)
    }

    /// Delete a page and its descendants, closing the editor if it shows one of them
    pub async fn delete_node(&mut self, node_id: &str) -> Result<()> {
        if let Some(session) = &self.session {
            let path = self.workspace.get_node_path(session.node_id()).await;
            if path.iter().any(|n| n.id == node_id) {
                self.close_page().await?;
            }
        }
        self.workspace.delete_node(node_id).await?;
        Ok(())
    }

    /// Render `scope` relative to the open page and save it to the export directory
    ///
    /// Returns `None` when the selection is empty.
    pub async fn export(&self, scope: PrintScope, options: ExportOptions) -> Result<Option<PathBuf>> {
        if let Some(session) = &self.session {
            session.flush().await?;
        }

        let Some(space) = self.workspace.active_space().await else {
            return Ok(None);
        };
        let current = self.session.as_ref().map(|s| s.node_id());
        let nodes = collect_printable(&space.tree, current, scope);
        if nodes.is_empty() {
            tracing::debug!("Nothing to export for {:?}", scope);
            return Ok(None);
        }

        let title = match scope {
            PrintScope::Space => page_title(&space.space.name),
            PrintScope::Current | PrintScope::Branch => nodes[0].name.clone(),
        };
        let payload = ExportPayload::build(&title, &nodes, options.theme, options.typography);
        let bytes = self.exporter.render(payload).await?;
        let path = save_export(
            &self.config.export_dir,
            &title,
            self.exporter.file_extension(),
            &bytes,
        )
        .await?;
        Ok(Some(path))
    }

    /// Close the open page and stop the export worker
    pub async fn shutdown(mut self) -> Result<()> {
        self.close_page().await?;
        self.exporter.shutdown();
        Ok(())
    }
}
