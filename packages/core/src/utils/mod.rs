//! Utility functions for Unfold Core
//!
//! This module provides common utility functions used across the codebase.

mod markdown;
mod text;

pub use markdown::markdown_to_html;
pub use text::{normalize_whitespace, truncate_chars};
