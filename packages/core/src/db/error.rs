//! Database Error Types
//!
//! Errors for opening the store, creating its schema and running statements.
//! Query-level semantics (not found, rollback) belong to the service layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish database connection
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    #[error("Permission denied for database path: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to create parent directory for database: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },
}

impl DatabaseError {
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn permission_denied(path: PathBuf) -> Self {
        Self::PermissionDenied { path }
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }
}
