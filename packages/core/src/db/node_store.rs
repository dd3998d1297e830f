//! NodeStore Trait - Persistence Abstraction
//!
//! The `NodeStore` trait sits between the workspace service (business logic,
//! optimistic in-memory state) and the database implementation. Services only
//! see this trait, which keeps them testable against fault-injecting stores.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every method is async; callers treat each as a suspension point
//! 2. **Ownership Semantics**: methods take owned values where they store them
//! 3. **Error Handling**: `anyhow::Result` with `.context(..)`; services map into typed errors
//! 4. **Not-found is not an error**: reads return `Option`, writes report rows affected
//!
//! # Examples
//!
//! ```rust,no_run
//! use unfold_core::db::{DatabaseService, LibsqlStore, NodeStore};
//! use unfold_core::models::{Node, Space};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./unfold.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(LibsqlStore::new(db));
//!
//!     let space = store.create_space(Space::new("notes".to_string(), 0)).await?;
//!     let page = store.create_node(Node::new(space.id.clone(), None, 0)).await?;
//!     println!("created {}", page.id);
//!     Ok(())
//! }
//! ```

use crate::models::{Attachment, Node, NodeUpdate, Space};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for spaces, pages and attachment metadata
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be shared behind
/// `Arc<dyn NodeStore>` across tasks.
#[async_trait]
pub trait NodeStore: Send + Sync {
    //
    // SPACES
    //

    /// All spaces in creation order
    async fn list_spaces(&self) -> Result<Vec<Space>>;

    async fn get_space(&self, id: &str) -> Result<Option<Space>>;

    /// Insert a space and return it as stored
    async fn create_space(&self, space: Space) -> Result<Space>;

    /// Returns false when the space does not exist
    async fn rename_space(&self, id: &str, name: &str) -> Result<bool>;

    /// Delete a space and all of its pages
    async fn delete_space(&self, id: &str) -> Result<()>;

    //
    // NODES
    //

    /// Every page of a space, unordered
    async fn list_nodes(&self, space_id: &str) -> Result<Vec<Node>>;

    async fn get_node(&self, id: &str) -> Result<Option<Node>>;

    /// Insert a page, assigning the next `sort_order` among its siblings
    async fn create_node(&self, node: Node) -> Result<Node>;

    /// Apply a partial update; returns false when the node does not exist
    async fn update_node(&self, id: &str, update: NodeUpdate) -> Result<bool>;

    /// Delete a page and all of its descendants
    async fn delete_node(&self, id: &str) -> Result<()>;

    //
    // ATTACHMENTS
    //

    async fn create_attachment(&self, attachment: Attachment) -> Result<Attachment>;

    async fn get_attachment(&self, id: &str) -> Result<Option<Attachment>>;

    /// Returns false when no row was removed
    async fn delete_attachment(&self, id: &str) -> Result<bool>;
}
