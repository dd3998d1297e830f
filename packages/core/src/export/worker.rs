//! Export Worker
//!
//! Rendering runs on a dedicated OS thread so a heavy export never stalls the
//! async runtime. The boundary is message passing only: each job carries its
//! payload by value and receives exactly one reply.
//!
//! # Architecture
//!
//! - **One thread, one queue**: jobs are rendered in arrival order
//! - **Single reply**: every job is answered once through a oneshot channel
//! - **No cancellation**: a submitted job always runs to completion; a caller
//!   that stops waiting only discards the reply
//! - **Panic isolation**: a renderer panic fails that job, the thread keeps serving

use super::error::ExportError;
use super::printable::ExportPayload;
use super::renderer::PageRenderer;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

struct ExportJob {
    payload: ExportPayload,
    reply: oneshot::Sender<Result<Vec<u8>, ExportError>>,
}

pub struct ExportWorker {
    tx: Option<mpsc::UnboundedSender<ExportJob>>,
    handle: Option<JoinHandle<()>>,
    file_extension: &'static str,
}

impl ExportWorker {
    /// Start the worker thread with `renderer`
    pub fn spawn(renderer: Box<dyn PageRenderer>) -> Result<Self, ExportError> {
        let file_extension = renderer.file_extension();
        let (tx, mut rx) = mpsc::unbounded_channel::<ExportJob>();

        let handle = std::thread::Builder::new()
            .name("unfold-export".to_string())
            .spawn(move || {
                tracing::debug!("Export worker started");
                while let Some(job) = rx.blocking_recv() {
                    let pages = job.payload.pages.len();
                    let result = catch_unwind(AssertUnwindSafe(|| renderer.render(&job.payload)))
                        .unwrap_or_else(|_| Err(ExportError::render("renderer panicked")));

                    match &result {
                        Ok(bytes) => {
                            tracing::info!("Rendered export of {} page(s), {} bytes", pages, bytes.len())
                        }
                        Err(e) => tracing::error!("Export render failed: {}", e),
                    }
                    if job.reply.send(result).is_err() {
                        tracing::debug!("Export caller went away before the reply");
                    }
                }
                tracing::debug!("Export worker stopped");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            file_extension,
        })
    }

    pub fn file_extension(&self) -> &'static str {
        self.file_extension
    }

    /// Submit a job and wait for its bytes
    pub async fn render(&self, payload: ExportPayload) -> Result<Vec<u8>, ExportError> {
        let tx = self.tx.as_ref().ok_or(ExportError::WorkerGone)?;
        let (reply, rx) = oneshot::channel();
        tx.send(ExportJob { payload, reply })
            .map_err(|_| ExportError::WorkerGone)?;
        rx.await.map_err(|_| ExportError::WorkerGone)?
    }

    /// Finish queued jobs and join the thread
    pub fn shutdown(mut self) {
        self.stop(true);
    }

    fn stop(&mut self, join: bool) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if join && handle.join().is_err() {
                tracing::error!("Export worker thread panicked");
            }
        }
    }
}

impl Drop for ExportWorker {
    fn drop(&mut self) {
        // the thread drains its queue and exits on its own
        self.stop(false);
    }
}
