//! Autosave Reconciler
//!
//! Bridges frequent editor changes to the node store without a write per
//! keystroke.
//!
//! # Architecture
//!
//! - **Debounced**: changes land in a single-slot [`Debouncer`]; only the latest content is written
//! - **Load gate**: changes are ignored until the loaded content has been applied (`mark_loaded`)
//! - **No-op suppression**: content equal to the last saved value is never written
//! - **Flush on transition**: `flush`/`close` write whatever is pending, and dropping an
//!   [`AutosaveWorker`] flushes too
//! - **Retry on failure**: content whose write failed goes back into the slot, so the
//!   next deadline, flush or close tries it again
//!
//! The reconciler writes through [`ContentSink`], implemented by the workspace
//! service, which persists the content and its derived name in one write.

use crate::services::debounce::{Clock, Debouncer, TokioClock};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Default debounce window after the last change
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(500);

/// Destination of autosave writes
#[async_trait]
pub trait ContentSink: Send + Sync {
    async fn save_content(&self, node_id: &str, content: &str) -> Result<()>;
}

pub struct AutosaveReconciler {
    node_id: String,
    sink: Arc<dyn ContentSink>,
    debouncer: Debouncer<String>,
    last_saved: Option<String>,
    loaded: bool,
}

impl AutosaveReconciler {
    pub fn new(
        node_id: impl Into<String>,
        sink: Arc<dyn ContentSink>,
        delay: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            sink,
            debouncer: Debouncer::new(delay, clock),
            last_saved: None,
            loaded: false,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn last_saved(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn deadline(&self) -> Option<std::time::Instant> {
        self.debouncer.deadline()
    }

    /// Record the content the editor was loaded with; enables change tracking
    pub fn mark_loaded(&mut self, content: impl Into<String>) {
        self.last_saved = Some(content.into());
        self.loaded = true;
    }

    /// Queue the latest serialized content
    pub fn on_change(&mut self, content: String) {
        if !self.loaded {
            tracing::debug!("Ignoring change for {} before content is loaded", self.node_id);
            return;
        }
        self.debouncer.schedule(content);
    }

    /// Write the pending content if the debounce window has elapsed
    ///
    /// Returns whether a write reached the sink.
    pub async fn poll(&mut self) -> Result<bool> {
        match self.debouncer.poll() {
            Some(content) => self.write(content).await,
            None => Ok(false),
        }
    }

    /// Write the pending content now, if any
    pub async fn flush(&mut self) -> Result<bool> {
        match self.debouncer.flush() {
            Some(content) => self.write(content).await,
            None => Ok(false),
        }
    }

    /// Drop the pending content without writing it
    pub fn cancel(&mut self) -> bool {
        self.debouncer.cancel()
    }

    async fn write(&mut self, content: String) -> Result<bool> {
        if self.last_saved.as_deref() == Some(content.as_str()) {
            tracing::debug!("Skipping autosave for {}: content unchanged", self.node_id);
            return Ok(false);
        }

        match self.sink.save_content(&self.node_id, &content).await {
            Ok(()) => {
                tracing::debug!("Autosaved {} ({} bytes)", self.node_id, content.len());
                self.last_saved = Some(content);
                Ok(true)
            }
            Err(e) => {
                tracing::error!("Autosave of {} failed: {:#}", self.node_id, e);
                if !self.debouncer.is_pending() {
                    self.debouncer.schedule(content);
                }
                Err(e)
            }
        }
    }
}

enum AutosaveCommand {
    Change(String),
    Flush(oneshot::Sender<Result<bool>>),
    Close(oneshot::Sender<Result<bool>>),
}

/// Background task owning one reconciler
///
/// The task sleeps until the pending deadline and writes then. Dropping the
/// handle closes the channel; the task flushes pending content and exits.
pub struct AutosaveWorker {
    node_id: String,
    tx: mpsc::UnboundedSender<AutosaveCommand>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveWorker {
    /// Spawn a worker for `node_id` whose reconciler is already loaded with `loaded_content`
    pub fn spawn(
        node_id: impl Into<String>,
        loaded_content: impl Into<String>,
        sink: Arc<dyn ContentSink>,
        delay: Duration,
    ) -> Self {
        let node_id = node_id.into();
        let mut reconciler =
            AutosaveReconciler::new(node_id.clone(), sink, delay, Arc::new(TokioClock));
        reconciler.mark_loaded(loaded_content);
        Self::from_reconciler(reconciler)
    }

    /// Spawn a worker around an existing reconciler
    ///
    /// The reconciler's clock must follow tokio time (see [`TokioClock`]).
    pub fn from_reconciler(reconciler: AutosaveReconciler) -> Self {
        let node_id = reconciler.node_id().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(reconciler, rx));
        Self {
            node_id,
            tx,
            handle: Some(handle),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Report new serialized content
    pub fn notify(&self, content: impl Into<String>) {
        if self.tx.send(AutosaveCommand::Change(content.into())).is_err() {
            tracing::warn!("Autosave worker for {} has stopped; change dropped", self.node_id);
        }
    }

    /// Write pending content now
    pub async fn flush(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Flush(reply))
            .map_err(|_| anyhow::anyhow!("autosave worker for {} has stopped", self.node_id))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("autosave worker for {} has stopped", self.node_id))?
    }

    /// Flush pending content and stop the worker
    pub async fn close(mut self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(AutosaveCommand::Close(reply))
            .map_err(|_| anyhow::anyhow!("autosave worker for {} has stopped", self.node_id))?;
        let result = rx
            .await
            .map_err(|_| anyhow::anyhow!("autosave worker for {} has stopped", self.node_id))?;

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("Autosave worker for {} panicked: {}", self.node_id, e);
            }
        }
        result
    }
}

async fn run_worker(
    mut reconciler: AutosaveReconciler,
    mut rx: mpsc::UnboundedReceiver<AutosaveCommand>,
) {
    loop {
        let deadline = reconciler.deadline();
        let wake_at = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(tokio::time::Instant::now);

        tokio::select! {
            command = rx.recv() => match command {
                Some(AutosaveCommand::Change(content)) => reconciler.on_change(content),
                Some(AutosaveCommand::Flush(reply)) => {
                    let _ = reply.send(reconciler.flush().await);
                }
                Some(AutosaveCommand::Close(reply)) => {
                    let _ = reply.send(reconciler.flush().await);
                    break;
                }
                None => {
                    // handle dropped without close
                    if let Err(e) = reconciler.flush().await {
                        tracing::error!("Final autosave of {} failed: {:#}", reconciler.node_id(), e);
                    }
                    break;
                }
            },
            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                // failed content stays pending and is retried at the next deadline
                let _ = reconciler.poll().await;
            }
        }
    }
    tracing::debug!("Autosave worker for {} stopped", reconciler.node_id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::debounce::ManualClock;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ContentSink for RecordingSink {
        async fn save_content(&self, node_id: &str, content: &str) -> Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push((node_id.to_string(), content.to_string()));
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ContentSink for FailingSink {
        async fn save_content(&self, _node_id: &str, _content: &str) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    /// Fails its first write, then records like [`RecordingSink`]
    #[derive(Default)]
    struct FlakySink {
        failed_once: std::sync::atomic::AtomicBool,
        inner: RecordingSink,
    }

    #[async_trait]
    impl ContentSink for FlakySink {
        async fn save_content(&self, node_id: &str, content: &str) -> Result<()> {
            if !self
                .failed_once
                .swap(true, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(anyhow::anyhow!("database is locked"));
            }
            self.inner.save_content(node_id, content).await
        }
    }

    fn reconciler(sink: Arc<dyn ContentSink>) -> (AutosaveReconciler, ManualClock) {
        let clock = ManualClock::new();
        let reconciler =
            AutosaveReconciler::new("n1", sink, DEFAULT_AUTOSAVE_DELAY, Arc::new(clock.clone()));
        (reconciler, clock)
    }

    #[tokio::test]
    async fn test_changes_before_load_are_ignored() {
        let sink = Arc::new(RecordingSink::default());
        let (mut reconciler, _clock) = reconciler(sink.clone());

        reconciler.on_change("early".to_string());
        assert!(!reconciler.is_pending());
        assert!(!reconciler.flush().await.unwrap());
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_burst_produces_single_write() {
        let sink = Arc::new(RecordingSink::default());
        let (mut reconciler, clock) = reconciler(sink.clone());
        reconciler.mark_loaded("v0");

        for i in 1..=10 {
            reconciler.on_change(format!("v{}", i));
            clock.advance(Duration::from_millis(40));
            assert!(!reconciler.poll().await.unwrap());
        }
        clock.advance(DEFAULT_AUTOSAVE_DELAY);
        assert!(reconciler.poll().await.unwrap());

        let writes = sink.writes.lock().unwrap();
        assert_eq!(*writes, vec![("n1".to_string(), "v10".to_string())]);
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_written() {
        let sink = Arc::new(RecordingSink::default());
        let (mut reconciler, _clock) = reconciler(sink.clone());
        reconciler.mark_loaded("same");

        reconciler.on_change("same".to_string());
        assert!(!reconciler.flush().await.unwrap());

        reconciler.on_change("new".to_string());
        assert!(reconciler.flush().await.unwrap());
        reconciler.on_change("new".to_string());
        assert!(!reconciler.flush().await.unwrap());

        assert_eq!(sink.writes.lock().unwrap().len(), 1);
        assert_eq!(reconciler.last_saved(), Some("new"));
    }

    #[tokio::test]
    async fn test_failed_write_propagates_and_keeps_last_saved() {
        let (mut reconciler, _clock) = reconciler(Arc::new(FailingSink));
        reconciler.mark_loaded("old");

        reconciler.on_change("new".to_string());
        assert!(reconciler.flush().await.is_err());
        assert_eq!(reconciler.last_saved(), Some("old"));
        assert!(reconciler.is_pending());
    }

    #[tokio::test]
    async fn test_failed_write_is_retried_on_flush() {
        let sink = Arc::new(FlakySink::default());
        let (mut reconciler, _clock) = reconciler(sink.clone());
        reconciler.mark_loaded("old");

        reconciler.on_change("new".to_string());
        assert!(reconciler.flush().await.is_err());
        assert!(reconciler.flush().await.unwrap());

        assert_eq!(
            *sink.inner.writes.lock().unwrap(),
            vec![("n1".to_string(), "new".to_string())]
        );
        assert_eq!(reconciler.last_saved(), Some("new"));
    }

    #[tokio::test]
    async fn test_newer_change_wins_over_failed_content() {
        let sink = Arc::new(FlakySink::default());
        let (mut reconciler, clock) = reconciler(sink.clone());
        reconciler.mark_loaded("old");

        reconciler.on_change("first".to_string());
        clock.advance(DEFAULT_AUTOSAVE_DELAY);
        assert!(reconciler.poll().await.is_err());

        reconciler.on_change("second".to_string());
        assert!(reconciler.flush().await.unwrap());
        assert_eq!(
            *sink.inner.writes.lock().unwrap(),
            vec![("n1".to_string(), "second".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_writes_after_delay() {
        let sink = Arc::new(RecordingSink::default());
        let worker = AutosaveWorker::spawn("n1", "", sink.clone(), DEFAULT_AUTOSAVE_DELAY);

        worker.notify("a");
        worker.notify("ab");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(sink.writes.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            *sink.writes.lock().unwrap(),
            vec![("n1".to_string(), "ab".to_string())]
        );
        worker.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_close_flushes_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let worker = AutosaveWorker::spawn("n1", "", sink.clone(), DEFAULT_AUTOSAVE_DELAY);

        worker.notify("last words");
        assert!(worker.close().await.unwrap());
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_close_saves_content_after_failed_timed_write() {
        let sink = Arc::new(FlakySink::default());
        let worker = AutosaveWorker::spawn("n1", "", sink.clone(), DEFAULT_AUTOSAVE_DELAY);

        worker.notify("edited");
        // the timed write fires and fails
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(sink.inner.writes.lock().unwrap().is_empty());

        assert!(worker.close().await.unwrap());
        assert_eq!(
            *sink.inner.writes.lock().unwrap(),
            vec![("n1".to_string(), "edited".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_close_reports_persistent_failure() {
        let worker = AutosaveWorker::spawn("n1", "", Arc::new(FailingSink), DEFAULT_AUTOSAVE_DELAY);

        worker.notify("edited");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(worker.close().await.is_err());
    }
}
