//! Service Layer Error Types
//!
//! Errors surfaced by the workspace, preferences and attachment services.
//! Not-found conditions are mostly modelled as `Option`/no-op results rather
//! than errors; these types cover failures the caller must see.

use thiserror::Error;

/// Workspace (node tree store) operation errors
#[derive(Error, Debug)]
pub enum WorkspaceError {
    /// The persistence write or read failed; optimistic state was restored
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),

    #[error("Preferences operation failed: {0}")]
    Preferences(#[from] PreferencesError),

    /// An operation that needs loaded spaces ran before `initialize`
    #[error("Workspace is not ready (status: {0})")]
    NotReady(String),
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize setting '{key}': {source}")]
    Serialization {
        key: String,
        source: serde_json::Error,
    },
}

impl PreferencesError {
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }
}

/// Attachment upload/lookup errors
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("Failed to write attachment file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to record attachment: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("Attachment not found: {id}")]
    NotFound { id: String },
}
