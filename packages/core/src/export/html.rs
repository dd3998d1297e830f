//! Document to HTML rendering
//!
//! Produces the same element structure the editor shows, so the block walk in
//! [`super::blocks`] sees what the user saw. Styling is not reproduced.

use crate::models::{Document, DocumentNode, Mark, NodeKind};
use crate::utils::markdown_to_html;
use serde_json::Value;

/// Render a document to editor-shaped HTML
pub fn render_html(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        render_node(block, &mut out);
    }
    out
}

/// Persisted page content in whichever form it was stored
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    /// Structured editor JSON
    Document(Document),
    /// Markdown or plain text written before structured content
    Legacy(String),
}

impl ContentSource {
    pub fn detect(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(_)) => ContentSource::Document(Document::load(raw)),
            Ok(Value::String(text)) => ContentSource::Legacy(text),
            _ => ContentSource::Legacy(raw.to_string()),
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            ContentSource::Document(doc) => render_html(doc),
            ContentSource::Legacy(text) => markdown_to_html(text),
        }
    }
}

/// HTML for raw persisted content; blank content renders to nothing
pub fn content_to_html(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    ContentSource::detect(raw).to_html()
}

fn render_children(node: &DocumentNode, out: &mut String) {
    for child in &node.content {
        render_node(child, out);
    }
}

fn wrap(tag: &str, node: &DocumentNode, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    push_align(node, out);
    out.push('>');
    render_children(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_align(node: &DocumentNode, out: &mut String) {
    if let Some(align) = node.attrs.text_align.as_deref() {
        if align != "left" {
            push_attr(out, "style", &format!("text-align: {align}"));
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

fn attr_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn render_node(node: &DocumentNode, out: &mut String) {
    match &node.kind {
        NodeKind::Doc => render_children(node, out),
        NodeKind::Paragraph => wrap("p", node, out),
        NodeKind::Heading { level } => {
            let tag = format!("h{}", (*level).clamp(1, 6));
            wrap(&tag, node, out);
        }
        NodeKind::BulletList => wrap("ul", node, out),
        NodeKind::OrderedList { start } => {
            out.push_str("<ol");
            if *start != 1 {
                push_attr(out, "start", &start.to_string());
            }
            out.push('>');
            render_children(node, out);
            out.push_str("</ol>");
        }
        NodeKind::ListItem => wrap("li", node, out),
        NodeKind::TaskList => {
            out.push_str("<ul data-type=\"taskList\">");
            render_children(node, out);
            out.push_str("</ul>");
        }
        NodeKind::TaskItem { checked } => {
            out.push_str("<li data-type=\"taskItem\"");
            push_attr(out, "data-checked", if *checked { "true" } else { "false" });
            out.push_str("><label><input type=\"checkbox\"");
            if *checked {
                out.push_str(" checked=\"checked\"");
            }
            out.push_str("><span></span></label><div>");
            render_children(node, out);
            out.push_str("</div></li>");
        }
        NodeKind::Blockquote => wrap("blockquote", node, out),
        NodeKind::CodeBlock => {
            out.push_str("<pre><code");
            if let Some(language) = node.attrs.language.as_deref() {
                push_attr(out, "class", &format!("language-{language}"));
            }
            out.push('>');
            render_children(node, out);
            out.push_str("</code></pre>");
        }
        NodeKind::Table => {
            out.push_str("<table><tbody>");
            render_children(node, out);
            out.push_str("</tbody></table>");
        }
        NodeKind::TableRow => wrap("tr", node, out),
        NodeKind::TableCell => render_cell("td", node, out),
        NodeKind::TableHeader => render_cell("th", node, out),
        NodeKind::Image => {
            out.push_str("<img");
            if let Some(src) = node.attrs.src.as_deref() {
                push_attr(out, "src", src);
            }
            if let Some(alt) = node.attrs.alt.as_deref() {
                push_attr(out, "alt", alt);
            }
            if let Some(title) = node.attrs.title.as_deref() {
                push_attr(out, "title", title);
            }
            if let Some(width) = node.attrs.width.as_ref().and_then(attr_text) {
                push_attr(out, "width", &width);
            }
            if let Some(height) = node.attrs.height.as_ref().and_then(attr_text) {
                push_attr(out, "height", &height);
            }
            if let Some(id) = node.attrs.attachment_id.as_deref() {
                push_attr(out, "data-attachment-id", id);
            }
            out.push('>');
        }
        NodeKind::HorizontalRule => out.push_str("<hr>"),
        NodeKind::HardBreak => out.push_str("<br>"),
        NodeKind::Text { text, marks } => render_text(text, marks, out),
    }
}

fn render_cell(tag: &str, node: &DocumentNode, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for span in ["colspan", "rowspan"] {
        if let Some(value) = node.attrs.extra.get(span).and_then(attr_text) {
            if value != "1" {
                push_attr(out, span, &value);
            }
        }
    }
    out.push('>');
    render_children(node, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn render_text(text: &str, marks: &[Mark], out: &mut String) {
    let mut closers = Vec::with_capacity(marks.len());
    for mark in marks {
        match mark {
            Mark::Bold => open_simple(out, &mut closers, "<strong>", "</strong>"),
            Mark::Italic => open_simple(out, &mut closers, "<em>", "</em>"),
            Mark::Underline => open_simple(out, &mut closers, "<u>", "</u>"),
            Mark::Strike => open_simple(out, &mut closers, "<s>", "</s>"),
            Mark::Code => open_simple(out, &mut closers, "<code>", "</code>"),
            Mark::Link { href, target } => {
                out.push_str("<a");
                push_attr(out, "href", href);
                if let Some(target) = target {
                    push_attr(out, "target", target);
                }
                out.push('>');
                closers.push("</a>");
            }
            Mark::TextColor { color } => {
                out.push_str("<span");
                if let Some(color) = color {
                    push_attr(out, "style", &format!("color: {color}"));
                }
                out.push('>');
                closers.push("</span>");
            }
            Mark::Highlight { color } => {
                out.push_str("<mark");
                if let Some(color) = color {
                    push_attr(out, "data-color", color);
                }
                out.push('>');
                closers.push("</mark>");
            }
        }
    }
    out.push_str(&escape_html(text));
    for closer in closers.iter().rev() {
        out.push_str(closer);
    }
}

fn open_simple(
    out: &mut String,
    closers: &mut Vec<&'static str>,
    open: &'static str,
    close: &'static str,
) {
    out.push_str(open);
    closers.push(close);
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeAttrs;

    #[test]
    fn test_paragraph_with_marks() {
        let doc = Document::from_blocks(vec![DocumentNode::new(
            NodeKind::Paragraph,
            vec![
                DocumentNode::text("a < b "),
                DocumentNode::styled_text("bold", vec![Mark::Bold, Mark::Italic]),
            ],
        )]);
        assert_eq!(
            render_html(&doc),
            "<p>a &lt; b <strong><em>bold</em></strong></p>"
        );
    }

    #[test]
    fn test_task_list_structure() {
        let doc = Document::from_blocks(vec![DocumentNode::new(
            NodeKind::TaskList,
            vec![DocumentNode::new(
                NodeKind::TaskItem { checked: true },
                vec![DocumentNode::paragraph("done")],
            )],
        )]);
        let html = render_html(&doc);
        assert!(html.starts_with("<ul data-type=\"taskList\"><li data-type=\"taskItem\" data-checked=\"true\">"));
        assert!(html.contains("<input type=\"checkbox\" checked=\"checked\">"));
        assert!(html.contains("<div><p>done</p></div>"));
    }

    #[test]
    fn test_code_block_language_class() {
        let attrs = NodeAttrs {
            language: Some("rust".to_string()),
            ..Default::default()
        };
        let doc = Document::from_blocks(vec![DocumentNode::new(
            NodeKind::CodeBlock,
            vec![DocumentNode::text("fn main() {}\n")],
        )
        .with_attrs(attrs)]);
        assert_eq!(
            render_html(&doc),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_content_to_html_sources() {
        assert_eq!(content_to_html("   "), "");
        assert_eq!(content_to_html("\"# Legacy\""), "<h1>Legacy</h1>\n");
        assert_eq!(content_to_html("plain words"), "<p>plain words</p>\n");

        let raw = r#"{"type":"doc","content":[{"type":"heading","attrs":{"level":2},"content":[{"type":"text","text":"Hi"}]}]}"#;
        assert_eq!(content_to_html(raw), "<h2>Hi</h2>");
    }

    #[test]
    fn test_unparseable_object_renders_empty() {
        assert_eq!(content_to_html(r#"{"type":"nope"}"#), "");
    }
}
