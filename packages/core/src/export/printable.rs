//! Page selection and the render payload
//!
//! An export covers the current page, the current page with its descendants,
//! or a whole space. Pages are flattened depth-first in sibling order; each
//! one becomes an [`ExportPage`] of blocks.

use super::blocks::{extract_content_blocks, ExportBlock};
use crate::models::{Node, NodeTree, DEFAULT_PAGE_NAME};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintScope {
    Current,
    Branch,
    Space,
}

/// A page chosen for export with its depth below the selection root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintableNode {
    pub id: String,
    pub name: String,
    pub content: String,
    pub depth: usize,
}

impl PrintableNode {
    fn from_node(node: &Node, depth: usize) -> Self {
        Self {
            id: node.id.clone(),
            name: page_title(&node.name),
            content: node.content.clone(),
            depth,
        }
    }
}

/// Display title for a page; blank names print as the default page name
pub fn page_title(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_PAGE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pages covered by `scope`
///
/// `Current` and `Branch` need a node id that exists in `tree`; otherwise the
/// selection is empty.
pub fn collect_printable(
    tree: &NodeTree,
    node_id: Option<&str>,
    scope: PrintScope,
) -> Vec<PrintableNode> {
    match scope {
        PrintScope::Space => tree
            .flatten()
            .into_iter()
            .map(|(node, depth)| PrintableNode::from_node(node, depth))
            .collect(),
        PrintScope::Current => node_id
            .and_then(|id| tree.get(id))
            .map(|node| vec![PrintableNode::from_node(node, 0)])
            .unwrap_or_default(),
        PrintScope::Branch => node_id
            .map(|id| {
                tree.flatten_branch(id)
                    .into_iter()
                    .map(|(node, depth)| PrintableNode::from_node(node, depth))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_string(),
            font_size: 11.0,
            line_height: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPage {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub blocks: Vec<ExportBlock>,
}

/// Request sent to a page renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub title: String,
    pub theme: ExportTheme,
    pub typography: Typography,
    pub pages: Vec<ExportPage>,
}

impl ExportPayload {
    pub fn build(
        title: impl Into<String>,
        nodes: &[PrintableNode],
        theme: ExportTheme,
        typography: Typography,
    ) -> Self {
        let pages = nodes
            .iter()
            .map(|node| ExportPage {
                id: node.id.clone(),
                title: node.name.clone(),
                depth: node.depth,
                blocks: extract_content_blocks(&node.content),
            })
            .collect();
        Self {
            title: title.into(),
            theme,
            typography,
            pages,
        }
    }
}
