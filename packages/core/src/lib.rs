//! Unfold Core
//!
//! Document editing and persistence model for the Unfold note app: the
//! block-structured document, in-document search and replace over document
//! positions, the page tree store, debounced autosave, and export extraction.
//!
//! # Architecture
//!
//! - **Positions, not offsets**: every text location is an offset into the
//!   document's flattened token stream, so search results map straight onto
//!   editor selections
//! - **Content-derived names**: saving a page also renames it after its first
//!   non-blank block
//! - **Optimistic tree**: page edits apply in memory first and roll back if the
//!   write fails; deletes reload from the store
//! - **libsql**: embedded SQLite-compatible database behind the `NodeStore` trait
//! - **Off-runtime export**: rendering happens on a dedicated worker thread
//!
//! # Modules
//!
//! - [`models`] - Documents, nodes, spaces, the page tree, preference blobs
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Workspace, autosave, settings and attachment services
//! - [`editor`] - Search engine and the editor session
//! - [`export`] - Block extraction, rendering worker and export files
//! - [`config`] - Paths and timings, overridable from the environment
//! - [`app`] - Controller tying the services to the open page

pub mod app;
pub mod config;
pub mod db;
pub mod editor;
pub mod export;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use models::*;
pub use services::*;
