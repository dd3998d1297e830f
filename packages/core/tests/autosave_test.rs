//! Integration tests for autosave through the application controller
//!
//! Tests cover:
//! - Debounce coalescing into a single store write
//! - Flush on navigation and on close
//! - Reopening the last page after a restart

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use unfold_core::app::AppController;
use unfold_core::config::AppConfig;
use unfold_core::models::{Document, DocumentNode};
use unfold_core::services::{
    AutosaveReconciler, ContentSink, ManualClock, WorkspaceService, DEFAULT_AUTOSAVE_DELAY,
};

/// Counts writes before handing them to the workspace
struct CountingSink {
    inner: Arc<WorkspaceService>,
    writes: AtomicUsize,
}

#[async_trait]
impl ContentSink for CountingSink {
    async fn save_content(&self, node_id: &str, content: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.save_content(node_id, content).await
    }
}

async fn create_test_app() -> Result<(AppController, TempDir)> {
    let temp_dir = TempDir::new()?;
    let app = AppController::open(AppConfig::with_root(temp_dir.path())).await?;
    Ok((app, temp_dir))
}

fn type_paragraph(app: &mut AppController, text: &str) -> Result<()> {
    let session = app.session_mut().expect("a page is open");
    session.edit(|doc| {
        doc.push_block(DocumentNode::paragraph(text));
        Ok(())
    })?;
    Ok(())
}

#[tokio::test]
async fn test_burst_of_edits_is_one_write() -> Result<()> {
    let (app, _temp_dir) = create_test_app().await?;
    let workspace = app.workspace().clone();
    let id = workspace.add_node(None).await?.unwrap();

    let sink = Arc::new(CountingSink {
        inner: workspace.clone(),
        writes: AtomicUsize::new(0),
    });
    let clock = ManualClock::new();
    let mut reconciler =
        AutosaveReconciler::new(id.clone(), sink.clone(), DEFAULT_AUTOSAVE_DELAY, Arc::new(clock.clone()));
    reconciler.mark_loaded("");

    let mut doc = Document::empty();
    for word in ["Draft", "Draft two", "Final title"] {
        doc.set_content(vec![DocumentNode::paragraph(word)]);
        reconciler.on_change(doc.to_json());
        clock.advance(Duration::from_millis(100));
        assert!(!reconciler.poll().await?);
    }
    clock.advance(DEFAULT_AUTOSAVE_DELAY);
    assert!(reconciler.poll().await?);

    assert_eq!(sink.writes.load(Ordering::SeqCst), 1);
    assert_eq!(workspace.get_node(&id).await.unwrap().name, "Final title");
    Ok(())
}

#[tokio::test]
async fn test_navigation_flushes_pending_edit() -> Result<()> {
    let (mut app, _temp_dir) = create_test_app().await?;
    let first = app.workspace().add_node(None).await?.unwrap();
    let second = app.workspace().add_node(None).await?.unwrap();

    assert!(app.open_page(&first).await?);
    type_paragraph(&mut app, "Hello world")?;

    // well inside the debounce window
    assert!(app.open_page(&second).await?);
    assert_eq!(app.session().unwrap().node_id(), second);

    let saved = app.workspace().get_node(&first).await.unwrap();
    assert_eq!(saved.name, "Hello world");
    assert_eq!(Document::load(&saved.content).plain_text(), "Hello world");
    Ok(())
}

#[tokio::test]
async fn test_close_page_flushes() -> Result<()> {
    let (mut app, _temp_dir) = create_test_app().await?;
    let id = app.workspace().add_node(None).await?.unwrap();

    app.open_page(&id).await?;
    type_paragraph(&mut app, "Unmount me")?;
    app.close_page().await?;

    assert!(app.session().is_none());
    assert_eq!(app.workspace().get_node(&id).await.unwrap().name, "Unmount me");
    Ok(())
}

#[tokio::test]
async fn test_unknown_page_keeps_current_session() -> Result<()> {
    let (mut app, _temp_dir) = create_test_app().await?;
    let id = app.workspace().add_node(None).await?.unwrap();

    app.open_page(&id).await?;
    assert!(!app.open_page("missing").await?);
    assert_eq!(app.session().unwrap().node_id(), id);
    Ok(())
}

#[tokio::test]
async fn test_last_page_restored_after_restart() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = AppConfig::with_root(temp_dir.path());

    let id = {
        let mut app = AppController::open(config.clone()).await?;
        let _other = app.workspace().add_node(None).await?.unwrap();
        let id = app.workspace().add_node(None).await?.unwrap();
        app.open_page(&id).await?;
        type_paragraph(&mut app, "Remember me")?;
        app.shutdown().await?;
        id
    };

    let mut app = AppController::open(config).await?;
    assert_eq!(app.restore_last_page().await?, Some(id.clone()));

    let session = app.session().unwrap();
    assert_eq!(session.document().plain_text(), "Remember me");
    app.shutdown().await
}

#[tokio::test]
async fn test_deleting_open_page_closes_session() -> Result<()> {
    let (mut app, _temp_dir) = create_test_app().await?;
    let parent = app.workspace().add_node(None).await?.unwrap();
    let child = app.workspace().add_node(Some(&parent)).await?.unwrap();

    app.open_page(&child).await?;
    app.delete_node(&parent).await?;

    assert!(app.session().is_none());
    assert!(app.workspace().get_node(&child).await.is_none());
    assert_eq!(app.workspace().last_opened(&app.workspace().active_space_id().await.unwrap()).await?, None);
    Ok(())
}
