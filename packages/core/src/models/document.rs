//! Document Model
//!
//! Block-structured rich-text documents as persisted in the `content` column
//! of a page. The persisted form is the editor's JSON tree:
//!
//! ```json
//! {"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Hi"}]}]}
//! ```
//!
//! # Positions
//!
//! Positions are offsets into the flattened token stream of the tree:
//!
//! - a text node contributes one position per character
//! - leaf nodes (`image`, `horizontalRule`, `hardBreak`) contribute 1
//! - every other node contributes an open and a close token (2) plus its content
//!
//! The root `doc` node has no tokens of its own, so its content starts at 0
//! and [`Document::content_size`] is the document length. Any mutation shifts
//! every position after the mutation point, which is why consumers such as
//! the search engine recompute instead of patching offsets.
//!
//! # Examples
//!
//! ```rust
//! use unfold_core::models::{Document, DocumentNode};
//!
//! let doc = Document::from_blocks(vec![DocumentNode::paragraph("Hello")]);
//! assert_eq!(doc.content_size(), 7);
//! assert_eq!(doc.text_between(1, 6), "Hello");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder name for pages whose content yields no text
pub const DEFAULT_PAGE_NAME: &str = "new page";

/// Maximum number of characters kept when deriving a page name from content
pub const MAX_DERIVED_NAME_CHARS: usize = 50;

/// Errors raised while parsing or mutating a document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Failed to parse document: {0}")]
    Parse(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),

    #[error("Invalid heading level: {0}")]
    InvalidHeadingLevel(u64),

    #[error("Text node is missing its text")]
    MissingText,

    #[error("Range {from}..{to} does not lie within a single text node")]
    InvalidRange { from: usize, to: usize },

    #[error("Invalid title document: {0}")]
    InvalidTitle(String),
}

/// Inline formatting carried by text nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link {
        href: String,
        target: Option<String>,
    },
    /// Persisted as the editor's `textStyle` mark
    TextColor {
        color: Option<String>,
    },
    Highlight {
        color: Option<String>,
    },
}

impl Mark {
    pub fn type_name(&self) -> &'static str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Strike => "strike",
            Mark::Code => "code",
            Mark::Link { .. } => "link",
            Mark::TextColor { .. } => "textStyle",
            Mark::Highlight { .. } => "highlight",
        }
    }
}

/// Node type, a closed set handled exhaustively by every consumer
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Doc,
    Paragraph,
    Heading { level: u8 },
    BulletList,
    OrderedList { start: u32 },
    ListItem,
    TaskList,
    TaskItem { checked: bool },
    Blockquote,
    CodeBlock,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Image,
    HorizontalRule,
    HardBreak,
    Text { text: String, marks: Vec<Mark> },
}

impl NodeKind {
    /// Name used in the persisted JSON `type` field
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList { .. } => "orderedList",
            NodeKind::ListItem => "listItem",
            NodeKind::TaskList => "taskList",
            NodeKind::TaskItem { .. } => "taskItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock => "codeBlock",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableCell => "tableCell",
            NodeKind::TableHeader => "tableHeader",
            NodeKind::Image => "image",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::HardBreak => "hardBreak",
            NodeKind::Text { .. } => "text",
        }
    }

    /// Atom nodes that occupy exactly one position
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Image | NodeKind::HorizontalRule | NodeKind::HardBreak
        )
    }

    /// Nodes whose children are inline content
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading { .. } | NodeKind::CodeBlock
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }
}

/// Typed node attributes
///
/// Attributes the core does not interpret (`colspan`, `rowspan`, editor-only
/// flags) are kept in `extra` so a load/save round trip is lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeAttrs {
    fn is_empty(&self) -> bool {
        *self == NodeAttrs::default()
    }
}

/// One node of the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct DocumentNode {
    pub kind: NodeKind,
    pub attrs: NodeAttrs,
    pub content: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(kind: NodeKind, content: Vec<DocumentNode>) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
            content,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::styled_text(text, Vec::new())
    }

    pub fn styled_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self::new(
            NodeKind::Text {
                text: text.into(),
                marks,
            },
            Vec::new(),
        )
    }

    /// Paragraph holding a single unmarked text node (empty text yields an empty paragraph)
    pub fn paragraph(text: &str) -> Self {
        Self::new(NodeKind::Paragraph, inline(text))
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Self::new(NodeKind::Heading { level }, inline(text))
    }

    pub fn with_attrs(mut self, attrs: NodeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// Number of positions this node occupies
    pub fn node_size(&self) -> usize {
        match &self.kind {
            NodeKind::Text { text, .. } => text.chars().count(),
            kind if kind.is_leaf() => 1,
            _ => 2 + self.content_size(),
        }
    }

    pub fn content_size(&self) -> usize {
        self.content.iter().map(DocumentNode::node_size).sum()
    }

    /// Own text for text nodes, otherwise the concatenated text of the children
    pub fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text { text, .. } => text.clone(),
            _ => self.content.iter().map(DocumentNode::text_content).collect(),
        }
    }
}

fn inline(text: &str) -> Vec<DocumentNode> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![DocumentNode::text(text)]
    }
}

/// Which shape a document must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentVariant {
    /// Exactly one level-1 heading holding inline text
    Title,
    /// Any forest of block nodes
    Content,
}

/// A whole document: the content forest under an implicit `doc` root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: DocumentNode,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    pub fn empty() -> Self {
        Self::from_blocks(Vec::new())
    }

    pub fn from_blocks(blocks: Vec<DocumentNode>) -> Self {
        Self {
            root: DocumentNode::new(NodeKind::Doc, blocks),
        }
    }

    /// Title document with a single level-1 heading
    pub fn title(text: &str) -> Self {
        Self::from_blocks(vec![DocumentNode::heading(1, text)])
    }

    /// Strict parse of the persisted JSON form
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let root: DocumentNode =
            serde_json::from_str(raw).map_err(|e| DocumentError::Parse(e.to_string()))?;
        if root.kind != NodeKind::Doc {
            return Err(DocumentError::Parse(format!(
                "expected a 'doc' root, found '{}'",
                root.kind.type_name()
            )));
        }
        Ok(Self { root })
    }

    /// Fail-soft load: blank or malformed content becomes an empty document
    pub fn load(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::empty();
        }
        match Self::parse(raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Treating unparseable document content as empty: {}", e);
                Self::empty()
            }
        }
    }

    /// Canonical persisted form
    pub fn to_json(&self) -> String {
        // Serializing a tree of strings, maps and numbers cannot fail
        serde_json::to_string(&self.root).unwrap_or_default()
    }

    pub fn blocks(&self) -> &[DocumentNode] {
        &self.root.content
    }

    pub fn root(&self) -> &DocumentNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.content.is_empty()
    }

    /// Document length in positions
    pub fn content_size(&self) -> usize {
        self.root.content_size()
    }

    /// Total text content, no separators between blocks
    pub fn plain_text(&self) -> String {
        self.root.text_content()
    }

    pub fn validate(&self, variant: DocumentVariant) -> Result<(), DocumentError> {
        match variant {
            DocumentVariant::Content => Ok(()),
            DocumentVariant::Title => {
                let [heading] = self.root.content.as_slice() else {
                    return Err(DocumentError::InvalidTitle(format!(
                        "expected exactly one block, found {}",
                        self.root.content.len()
                    )));
                };
                if heading.kind != (NodeKind::Heading { level: 1 }) {
                    return Err(DocumentError::InvalidTitle(format!(
                        "expected a level-1 heading, found '{}'",
                        heading.kind.type_name()
                    )));
                }
                if heading.content.iter().any(|child| !child.kind.is_text()) {
                    return Err(DocumentError::InvalidTitle(
                        "title heading may only hold text".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Visit every node below the root in document order with its start position
    pub fn descendants<F>(&self, mut visit: F)
    where
        F: FnMut(&DocumentNode, usize),
    {
        walk(&self.root.content, 0, &mut visit);
    }

    /// Text of all text nodes overlapping `from..to`, clipped to the range
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        self.descendants(|node, pos| {
            if let NodeKind::Text { text, .. } = &node.kind {
                let end = pos + node.node_size();
                if end <= from || pos >= to {
                    return;
                }
                let start = from.saturating_sub(pos);
                let stop = to.min(end) - pos;
                out.extend(text.chars().skip(start).take(stop - start));
            }
        });
        out
    }

    /// Replace `from..to` with `text`.
    ///
    /// The range must lie within one text node, or be an empty range inside an
    /// empty text block. Adjacent text nodes with identical marks are merged
    /// afterwards and empty text nodes dropped.
    pub fn replace_text(&mut self, from: usize, to: usize, text: &str) -> Result<(), DocumentError> {
        if from > to || to > self.content_size() {
            return Err(DocumentError::InvalidRange { from, to });
        }
        if replace_in(&mut self.root.content, 0, from, to, text) {
            Ok(())
        } else {
            Err(DocumentError::InvalidRange { from, to })
        }
    }

    pub fn push_block(&mut self, block: DocumentNode) {
        self.root.content.push(block);
    }

    pub fn set_content(&mut self, blocks: Vec<DocumentNode>) {
        self.root.content = blocks;
    }
}

fn walk<F>(nodes: &[DocumentNode], start: usize, visit: &mut F)
where
    F: FnMut(&DocumentNode, usize),
{
    let mut pos = start;
    for node in nodes {
        visit(node, pos);
        if !node.kind.is_text() && !node.kind.is_leaf() {
            walk(&node.content, pos + 1, visit);
        }
        pos += node.node_size();
    }
}

fn replace_in(
    nodes: &mut Vec<DocumentNode>,
    start: usize,
    from: usize,
    to: usize,
    replacement: &str,
) -> bool {
    let mut pos = start;
    let mut replaced = false;

    for node in nodes.iter_mut() {
        let end = pos + node.node_size();
        if let NodeKind::Text { text, .. } = &mut node.kind {
            if from >= pos && to <= end {
                splice_chars(text, from - pos, to - pos, replacement);
                replaced = true;
                break;
            }
        } else if !node.kind.is_leaf() && from > pos && to < end {
            if node.content.is_empty() && from == to && node.kind.is_textblock() {
                if !replacement.is_empty() {
                    node.content.push(DocumentNode::text(replacement));
                }
                return true;
            }
            return replace_in(&mut node.content, pos + 1, from, to, replacement);
        }
        pos = end;
    }

    if replaced {
        normalize_inline(nodes);
    }
    replaced
}

fn splice_chars(text: &mut String, from: usize, to: usize, replacement: &str) {
    let start = char_to_byte(text, from);
    let end = char_to_byte(text, to);
    text.replace_range(start..end, replacement);
}

fn char_to_byte(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Drop empty text nodes and merge adjacent text siblings with equal marks
fn normalize_inline(nodes: &mut Vec<DocumentNode>) {
    let mut merged: Vec<DocumentNode> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        if let NodeKind::Text { text, .. } = &node.kind {
            if text.is_empty() {
                continue;
            }
        }
        if let (
            Some(NodeKind::Text {
                text: prev_text,
                marks: prev_marks,
            }),
            NodeKind::Text { text, marks },
        ) = (merged.last_mut().map(|prev| &mut prev.kind), &node.kind)
        {
            if prev_marks == marks {
                prev_text.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }
    *nodes = merged;
}

/// Derive a page's display name from its serialized content.
///
/// Walks the top-level blocks in order and returns the first non-blank
/// extracted text, trimmed and truncated to [`MAX_DERIVED_NAME_CHARS`].
/// Empty, unparseable or text-free content yields [`DEFAULT_PAGE_NAME`].
pub fn derive_name(content: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return DEFAULT_PAGE_NAME.to_string();
    };

    let blocks = value.get("content").and_then(Value::as_array);
    for block in blocks.into_iter().flatten() {
        let text = extract_text(block);
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.chars().take(MAX_DERIVED_NAME_CHARS).collect();
        }
    }

    DEFAULT_PAGE_NAME.to_string()
}

fn extract_text(node: &Value) -> String {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        if !text.is_empty() {
            return text.to_string();
        }
    }
    node.get("content")
        .and_then(Value::as_array)
        .map(|children| children.iter().map(extract_text).collect())
        .unwrap_or_default()
}

//
// PERSISTED JSON SHAPE
//

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Vec<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marks: Option<Vec<RawMark>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMark {
    #[serde(rename = "type")]
    mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attrs: Option<Map<String, Value>>,
}

fn string_attr(attrs: &Map<String, Value>, key: &str) -> Option<String> {
    attrs.get(key).and_then(Value::as_str).map(str::to_string)
}

impl TryFrom<RawMark> for Mark {
    type Error = DocumentError;

    fn try_from(raw: RawMark) -> Result<Self, Self::Error> {
        let attrs = raw.attrs.unwrap_or_default();
        let mark = match raw.mark_type.as_str() {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "strike" => Mark::Strike,
            "code" => Mark::Code,
            "link" => Mark::Link {
                href: string_attr(&attrs, "href").unwrap_or_default(),
                target: string_attr(&attrs, "target"),
            },
            "textStyle" => Mark::TextColor {
                color: string_attr(&attrs, "color"),
            },
            "highlight" => Mark::Highlight {
                color: string_attr(&attrs, "color"),
            },
            other => return Err(DocumentError::UnknownMarkType(other.to_string())),
        };
        Ok(mark)
    }
}

impl From<&Mark> for RawMark {
    fn from(mark: &Mark) -> Self {
        let mut attrs = Map::new();
        match mark {
            Mark::Link { href, target } => {
                attrs.insert("href".to_string(), Value::String(href.clone()));
                if let Some(target) = target {
                    attrs.insert("target".to_string(), Value::String(target.clone()));
                }
            }
            Mark::TextColor { color } | Mark::Highlight { color } => {
                if let Some(color) = color {
                    attrs.insert("color".to_string(), Value::String(color.clone()));
                }
            }
            _ => {}
        }
        RawMark {
            mark_type: mark.type_name().to_string(),
            attrs: (!attrs.is_empty()).then_some(attrs),
        }
    }
}

impl TryFrom<RawNode> for DocumentNode {
    type Error = DocumentError;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let mut attrs = raw.attrs.unwrap_or_default();

        let kind = match raw.node_type.as_str() {
            "doc" => NodeKind::Doc,
            "paragraph" => NodeKind::Paragraph,
            "heading" => {
                let level = attrs.remove("level").and_then(|v| v.as_u64()).unwrap_or(1);
                if !(1..=6).contains(&level) {
                    return Err(DocumentError::InvalidHeadingLevel(level));
                }
                NodeKind::Heading { level: level as u8 }
            }
            "bulletList" => NodeKind::BulletList,
            "orderedList" => {
                let start = attrs.remove("start").and_then(|v| v.as_u64()).unwrap_or(1);
                NodeKind::OrderedList {
                    start: u32::try_from(start).unwrap_or(1),
                }
            }
            "listItem" => NodeKind::ListItem,
            "taskList" => NodeKind::TaskList,
            "taskItem" => NodeKind::TaskItem {
                checked: attrs
                    .remove("checked")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            },
            "blockquote" => NodeKind::Blockquote,
            "codeBlock" => NodeKind::CodeBlock,
            "table" => NodeKind::Table,
            "tableRow" => NodeKind::TableRow,
            "tableCell" => NodeKind::TableCell,
            "tableHeader" => NodeKind::TableHeader,
            "image" => NodeKind::Image,
            "horizontalRule" => NodeKind::HorizontalRule,
            "hardBreak" => NodeKind::HardBreak,
            "text" => NodeKind::Text {
                text: raw.text.ok_or(DocumentError::MissingText)?,
                marks: raw
                    .marks
                    .unwrap_or_default()
                    .into_iter()
                    .map(Mark::try_from)
                    .collect::<Result<_, _>>()?,
            },
            other => return Err(DocumentError::UnknownNodeType(other.to_string())),
        };

        let attrs: NodeAttrs = serde_json::from_value(Value::Object(attrs))
            .map_err(|e| DocumentError::Parse(e.to_string()))?;

        let content = raw
            .content
            .unwrap_or_default()
            .into_iter()
            .map(DocumentNode::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DocumentNode {
            kind,
            attrs,
            content,
        })
    }
}

impl From<DocumentNode> for RawNode {
    fn from(node: DocumentNode) -> Self {
        let mut attrs = if node.attrs.is_empty() {
            Map::new()
        } else {
            match serde_json::to_value(&node.attrs) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            }
        };

        let (text, marks) = match &node.kind {
            NodeKind::Heading { level } => {
                attrs.insert("level".to_string(), Value::from(*level));
                (None, None)
            }
            NodeKind::OrderedList { start } => {
                attrs.insert("start".to_string(), Value::from(*start));
                (None, None)
            }
            NodeKind::TaskItem { checked } => {
                attrs.insert("checked".to_string(), Value::Bool(*checked));
                (None, None)
            }
            NodeKind::Text { text, marks } => (
                Some(text.clone()),
                (!marks.is_empty()).then(|| marks.iter().map(RawMark::from).collect()),
            ),
            _ => (None, None),
        };

        RawNode {
            node_type: node.kind.type_name().to_string(),
            attrs: (!attrs.is_empty()).then_some(attrs),
            content: (!node.content.is_empty())
                .then(|| node.content.into_iter().map(RawNode::from).collect()),
            text,
            marks,
        }
    }
}
