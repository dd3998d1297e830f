//! Node Tree Store Entities
//!
//! Persisted rows of the tree store: spaces, the page nodes inside them and
//! attachment metadata.
//!
//! # Architecture
//!
//! - **Forest per space**: `parent_id = None` marks a top-level page of its space
//! - **Display order**: siblings sort by name; `sort_order` only records creation order
//! - **Whole-content writes**: `content` is always replaced, never patched
//!
//! # Examples
//!
//! ```rust
//! use unfold_core::models::{Node, DEFAULT_PAGE_NAME};
//!
//! let page = Node::new("mine".to_string(), None, 0);
//! assert_eq!(page.name, DEFAULT_PAGE_NAME);
//! assert!(page.content.is_empty());
//! ```

use crate::models::document::DEFAULT_PAGE_NAME;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id and name of the space created on first run
pub const DEFAULT_SPACE_ID: &str = "mine";
pub const DEFAULT_SPACE_NAME: &str = "mine";

/// Name used when a space is created without one
pub const NEW_SPACE_NAME: &str = "new Space";

/// A top-level named workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: String,
    pub name: String,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    pub fn new(name: String, sort_order: i64) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), name, sort_order)
    }

    pub fn new_with_id(id: String, name: String, sort_order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A page inside a space, possibly with child pages
///
/// `content` holds the serialized document; an empty string means the page
/// has never been written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub space_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_open: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Fresh page with the placeholder name and empty content
    pub fn new(space_id: String, parent_id: Option<String>, sort_order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            space_id,
            parent_id,
            name: DEFAULT_PAGE_NAME.to_string(),
            content: String::new(),
            is_open: false,
            is_pinned: false,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// Key siblings are displayed by
    pub(crate) fn sibling_key(&self) -> (String, i64, &str) {
        (self.name.to_lowercase(), self.sort_order, self.id.as_str())
    }
}

/// Partial update of a node row
///
/// Only provided fields are written; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_open(mut self, is_open: bool) -> Self {
        self.is_open = Some(is_open);
        self
    }

    pub fn with_pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = Some(is_pinned);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.content.is_none()
            && self.is_open.is_none()
            && self.is_pinned.is_none()
    }

    /// The update that puts back `previous`'s values for the fields this one sets
    pub fn rollback_from(&self, previous: &Node) -> NodeUpdate {
        NodeUpdate {
            name: self.name.as_ref().map(|_| previous.name.clone()),
            content: self.content.as_ref().map(|_| previous.content.clone()),
            is_open: self.is_open.map(|_| previous.is_open),
            is_pinned: self.is_pinned.map(|_| previous.is_pinned),
        }
    }

    /// Apply to an in-memory copy of the row
    pub fn apply_to(&self, node: &mut Node) {
        if let Some(name) = &self.name {
            node.name = name.clone();
        }
        if let Some(content) = &self.content {
            node.content = content.clone();
        }
        if let Some(is_open) = self.is_open {
            node.is_open = is_open;
        }
        if let Some(is_pinned) = self.is_pinned {
            node.is_pinned = is_pinned;
        }
        node.updated_at = Utc::now();
    }
}

/// Metadata of an uploaded image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub note_id: Option<String>,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub size: i64,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
