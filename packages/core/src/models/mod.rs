//! Data Models
//!
//! This module contains the core data structures used throughout Unfold:
//!
//! - `Document` - Block-structured rich-text content with position accounting
//! - `Node` / `Space` - Rows of the node tree store
//! - `NodeTree` - Arena view of one space's page forest
//! - Preference blobs persisted in the settings file

mod document;
mod node;
mod settings;
mod tree;

pub use document::{
    derive_name, Document, DocumentError, DocumentNode, DocumentVariant, Mark, NodeAttrs,
    NodeKind, DEFAULT_PAGE_NAME, MAX_DERIVED_NAME_CHARS,
};
pub use node::{
    Attachment, Node, NodeUpdate, Space, DEFAULT_SPACE_ID, DEFAULT_SPACE_NAME, NEW_SPACE_NAME,
};
pub use settings::{
    Keybindings, Layout, LayoutPatch, SidebarPosition, WorkspacePrefs, KEYBINDINGS_KEY,
    LAYOUT_KEY, WORKSPACE_KEY,
};
pub use tree::{NodeTree, TreeItem};
