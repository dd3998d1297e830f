//! Markdown rendering for legacy page content
//!
//! Pages written before content was stored as a document tree hold plain text
//! or Markdown. Export renders those through CommonMark (plus tables, task
//! lists and strikethrough) so they go through the same HTML walk as
//! documents.

use pulldown_cmark::{html, Options, Parser};

/// Render Markdown (or plain text) to HTML
///
/// # Examples
///
/// ```
/// use unfold_core::utils::markdown_to_html;
///
/// assert_eq!(markdown_to_html("# Hello"), "<h1>Hello</h1>\n");
/// ```
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
