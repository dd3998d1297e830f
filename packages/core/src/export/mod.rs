//! Export Extraction Pipeline
//!
//! Turns page content into typed blocks and hands them to a renderer off the
//! async runtime.
//!
//! # Architecture
//!
//! 1. Raw content is detected as editor JSON or legacy Markdown/plain text
//! 2. Both become HTML with the editor's element structure (`html`)
//! 3. Top-level elements are classified into [`ExportBlock`]s (`blocks`)
//! 4. Selected pages become an [`ExportPayload`] (`printable`)
//! 5. The [`ExportWorker`] renders the payload on its own thread
//! 6. The bytes are written under a sanitized file name (`file`)

mod blocks;
mod error;
mod file;
mod html;
mod printable;
mod renderer;
mod worker;

pub use blocks::{extract_blocks, extract_content_blocks, ExportBlock, TaskItem};
pub use error::ExportError;
pub use file::{sanitize_filename, save_export, DEFAULT_EXPORT_NAME, MAX_FILENAME_CHARS};
pub use html::{content_to_html, render_html, ContentSource};
pub use printable::{
    collect_printable, page_title, ExportPage, ExportPayload, ExportTheme, PrintScope,
    PrintableNode, Typography,
};
pub use renderer::{JsonPayloadRenderer, PageRenderer, PlainTextRenderer};
pub use worker::ExportWorker;
