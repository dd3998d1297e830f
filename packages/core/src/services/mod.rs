//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `WorkspaceService` - Spaces and page trees, optimistic updates with rollback
//! - `AutosaveReconciler` / `AutosaveWorker` - Debounced, coalesced content writes
//! - `Debouncer` - Explicit debounce state machine over an injectable clock
//! - `SettingsStore` - Whole-object preference blobs in a JSON file
//! - `AttachmentService` - Image uploads and their metadata
//!
//! Services coordinate between the database layer and application logic,
//! implementing business rules on top of the `NodeStore` trait.

pub mod attachment_service;
pub mod autosave;
pub mod debounce;
pub mod error;
pub mod preferences;
pub mod workspace_service;

pub use attachment_service::{AttachmentService, UploadedAttachment};
pub use autosave::{AutosaveReconciler, AutosaveWorker, ContentSink, DEFAULT_AUTOSAVE_DELAY};
pub use debounce::{Clock, DebounceState, Debouncer, ManualClock, SystemClock, TokioClock};
pub use error::{AttachmentError, PreferencesError, WorkspaceError};
pub use preferences::SettingsStore;
pub use workspace_service::{
    resolve_initial_space_id, LoadedSpace, WorkspaceService, WorkspaceStatus,
};
