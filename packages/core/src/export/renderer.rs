//! Page renderers
//!
//! A [`PageRenderer`] turns an [`ExportPayload`] into file bytes. The PDF
//! engine of the desktop shell plugs in here; two renderers ship with the
//! core: readable plain text and the raw JSON payload.

use super::blocks::ExportBlock;
use super::error::ExportError;
use super::printable::ExportPayload;
use std::fmt::Write as _;

/// Converts a payload into the bytes of one export file
///
/// Renderers run on the export worker thread, never on the async runtime.
pub trait PageRenderer: Send {
    fn render(&self, payload: &ExportPayload) -> Result<Vec<u8>, ExportError>;

    /// File extension without the dot
    fn file_extension(&self) -> &'static str;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl PageRenderer for PlainTextRenderer {
    fn render(&self, payload: &ExportPayload) -> Result<Vec<u8>, ExportError> {
        let mut out = String::new();
        for (i, page) in payload.pages.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n");
            }
            let indent = "  ".repeat(page.depth);
            push_line(&mut out, &indent, &page.title)?;
            push_line(&mut out, &indent, &"=".repeat(page.title.chars().count()))?;

            for block in &page.blocks {
                out.push('\n');
                render_block(&mut out, &indent, block)?;
            }
        }
        Ok(out.into_bytes())
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

fn push_line(out: &mut String, indent: &str, text: &str) -> Result<(), ExportError> {
    writeln!(out, "{indent}{text}").map_err(|e| ExportError::render(e.to_string()))
}

fn render_block(out: &mut String, indent: &str, block: &ExportBlock) -> Result<(), ExportError> {
    match block {
        ExportBlock::Heading { level, text } => {
            let hashes = "#".repeat(usize::from(*level));
            push_line(out, indent, &format!("{hashes} {text}"))
        }
        ExportBlock::Paragraph { text } => push_line(out, indent, text),
        ExportBlock::List { ordered, items } => {
            for (n, item) in items.iter().enumerate() {
                let bullet = if *ordered {
                    format!("{}.", n + 1)
                } else {
                    "-".to_string()
                };
                push_line(out, indent, &format!("{bullet} {item}"))?;
            }
            Ok(())
        }
        ExportBlock::TaskList { items } => {
            for item in items {
                let mark = if item.checked { "[x]" } else { "[ ]" };
                push_line(out, indent, &format!("{mark} {}", item.text))?;
            }
            Ok(())
        }
        ExportBlock::Code { text } => {
            for line in text.lines() {
                push_line(out, indent, &format!("    {line}"))?;
            }
            Ok(())
        }
        ExportBlock::Quote { text } => push_line(out, indent, &format!("> {text}")),
        ExportBlock::Table { rows } => {
            for row in rows {
                push_line(out, indent, &format!("| {} |", row.join(" | ")))?;
            }
            Ok(())
        }
        ExportBlock::HorizontalRule => push_line(out, indent, "----"),
    }
}

/// Emits the payload itself, for renderers living outside the process
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPayloadRenderer;

impl PageRenderer for JsonPayloadRenderer {
    fn render(&self, payload: &ExportPayload) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec_pretty(payload)?)
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}
