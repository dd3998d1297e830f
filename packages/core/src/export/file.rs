//! Writing export files

use super::error::ExportError;
use crate::utils::{normalize_whitespace, truncate_chars};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const MAX_FILENAME_CHARS: usize = 120;
pub const DEFAULT_EXPORT_NAME: &str = "unfold export";

/// Characters no supported filesystem accepts in a file name
static ILLEGAL_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]+"#).unwrap());

/// Make a page title usable as a file name
///
/// # Examples
///
/// ```
/// use unfold_core::export::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Q3: plans/ideas?"), "Q3 plans ideas");
/// assert_eq!(sanitize_filename(" ?? "), "unfold export");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let replaced = ILLEGAL_FILENAME_RE.replace_all(name, " ");
    let collapsed = normalize_whitespace(&replaced);
    let capped = truncate_chars(&collapsed, MAX_FILENAME_CHARS);
    let trimmed = capped.trim();
    if trimmed.is_empty() {
        DEFAULT_EXPORT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write `bytes` to `<dir>/<sanitized name>.<extension>`, replacing any previous file
///
/// The bytes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a partial file.
pub async fn save_export(
    dir: &Path,
    suggested_name: &str,
    extension: &str,
    bytes: &[u8],
) -> Result<PathBuf, ExportError> {
    tokio::fs::create_dir_all(dir).await?;

    let stem = sanitize_filename(suggested_name);
    let file_name = if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    };
    let target = dir.join(&file_name);
    let temp = dir.join(format!(".{file_name}.tmp"));

    tokio::fs::write(&temp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&temp, &target).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }

    tracing::info!("Saved export to {}", target.display());
    Ok(target)
}
