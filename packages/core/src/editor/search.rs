//! Position-Stable Search Engine
//!
//! Finds every occurrence of a plain-text query inside the text nodes of a
//! [`Document`] and exposes them as position ranges.
//!
//! # Architecture
//!
//! - **Full recompute**: results are rebuilt from scratch whenever the query, the
//!   case mode or the document changes; offsets are never patched
//! - **Per text node**: a match never spans two text nodes (e.g. across a mark boundary)
//! - **Non-overlapping**: scanning resumes after the end of each match
//! - **Replace all in reverse**: substitutions run from the last match to the first
//!   on a working copy, so earlier offsets stay valid, and commit as one batch
//!
//! # Examples
//!
//! ```rust
//! use unfold_core::editor::SearchEngine;
//! use unfold_core::models::{Document, DocumentNode};
//!
//! let mut doc = Document::from_blocks(vec![DocumentNode::paragraph("The cat sat on the mat.")]);
//! let mut search = SearchEngine::new();
//! search.set_query(&doc, "at", false);
//! assert_eq!(search.results().len(), 3);
//!
//! search.replace_all(&mut doc, "og").unwrap();
//! assert_eq!(doc.plain_text(), "The cog sog on the mog.");
//! ```

use crate::models::{Document, DocumentError, NodeKind};
use serde::Serialize;

/// One occurrence of the query, `from < to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub from: usize,
    pub to: usize,
}

/// Highlight for one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub current: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    query: String,
    case_sensitive: bool,
    replace_term: String,
    results: Vec<SearchMatch>,
    /// `None` while the query is empty; `Some(0)` for a query with no hits
    result_index: Option<usize>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn results(&self) -> &[SearchMatch] {
        &self.results
    }

    pub fn result_index(&self) -> Option<usize> {
        self.result_index
    }

    pub fn replace_term(&self) -> &str {
        &self.replace_term
    }

    pub fn set_replace_term(&mut self, term: impl Into<String>) {
        self.replace_term = term.into();
    }

    /// Set the query and rescan; the cursor moves to the first match
    pub fn set_query(&mut self, doc: &Document, query: &str, case_sensitive: bool) {
        self.query = query.to_string();
        self.case_sensitive = case_sensitive;
        self.results = find_matches(doc, &self.query, case_sensitive);
        self.result_index = if self.query.is_empty() { None } else { Some(0) };
    }

    /// Switch case mode; always rescans an active query
    pub fn set_case_sensitive(&mut self, doc: &Document, case_sensitive: bool) {
        let query = std::mem::take(&mut self.query);
        self.set_query(doc, &query, case_sensitive);
    }

    /// Rescan after the document changed, keeping the cursor where possible
    pub fn refresh(&mut self, doc: &Document) {
        self.results = find_matches(doc, &self.query, self.case_sensitive);
        if let Some(index) = self.result_index {
            if index >= self.results.len() {
                self.result_index = Some(0);
            }
        }
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.result_index = None;
    }

    pub fn next(&mut self) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let index = self.result_index.unwrap_or(0);
        self.result_index = Some((index + 1) % len);
    }

    pub fn previous(&mut self) {
        let len = self.results.len();
        if len == 0 {
            return;
        }
        let index = self.result_index.unwrap_or(0);
        self.result_index = Some((index + len - 1) % len);
    }

    /// Range of the current match for the caller to select and scroll to
    pub fn select_current(&self) -> Option<SearchMatch> {
        self.result_index.and_then(|i| self.results.get(i)).copied()
    }

    /// Highlights for every match, flagging the current one
    pub fn decorations(&self) -> Vec<Decoration> {
        if self.query.is_empty() {
            return Vec::new();
        }
        self.results
            .iter()
            .enumerate()
            .map(|(i, m)| Decoration {
                from: m.from,
                to: m.to,
                current: Some(i) == self.result_index,
            })
            .collect()
    }

    /// Replace the current match, then rescan the mutated document
    ///
    /// Returns false when there is no current match.
    pub fn replace_current(&mut self, doc: &mut Document, text: &str) -> Result<bool, DocumentError> {
        let Some(current) = self.select_current() else {
            return Ok(false);
        };
        doc.replace_text(current.from, current.to, text)?;

        let query = std::mem::take(&mut self.query);
        self.set_query(doc, &query, self.case_sensitive);
        Ok(true)
    }

    /// Replace every match in one batch, last to first, then clear the query
    ///
    /// On error the document is left untouched. Returns the number of replacements.
    pub fn replace_all(&mut self, doc: &mut Document, text: &str) -> Result<usize, DocumentError> {
        let mut working = doc.clone();
        let mut ranges = self.results.clone();
        ranges.sort_by(|a, b| b.from.cmp(&a.from));

        for range in &ranges {
            working.replace_text(range.from, range.to, text)?;
        }

        *doc = working;
        self.clear();
        Ok(ranges.len())
    }
}

fn fold_char(c: char, case_sensitive: bool) -> char {
    if case_sensitive {
        return c;
    }
    // keep a 1:1 char mapping so offsets stay aligned with positions
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// All non-overlapping occurrences of `query` in document order
pub fn find_matches(doc: &Document, query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle: Vec<char> = query.chars().map(|c| fold_char(c, case_sensitive)).collect();

    let mut results = Vec::new();
    doc.descendants(|node, pos| {
        let NodeKind::Text { text, .. } = &node.kind else {
            return;
        };
        let haystack: Vec<char> = text.chars().map(|c| fold_char(c, case_sensitive)).collect();
        if haystack.len() < needle.len() {
            return;
        }

        let mut i = 0;
        while i + needle.len() <= haystack.len() {
            if haystack[i..i + needle.len()] == needle[..] {
                results.push(SearchMatch {
                    from: pos + i,
                    to: pos + i + needle.len(),
                });
                i += needle.len();
            } else {
                i += 1;
            }
        }
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentNode, Mark};

    fn doc(text: &str) -> Document {
        Document::from_blocks(vec![DocumentNode::paragraph(text)])
    }

    #[test]
    fn test_positions_include_open_tokens() {
        let doc = doc("The cat sat on the mat.");
        let mut search = SearchEngine::new();
        search.set_query(&doc, "at", false);

        // text starts at 1, inside the paragraph's open token
        assert_eq!(
            search.results(),
            &[
                SearchMatch { from: 6, to: 8 },
                SearchMatch { from: 10, to: 12 },
                SearchMatch { from: 21, to: 23 },
            ]
        );
        assert_eq!(search.result_index(), Some(0));
        for m in search.results() {
            assert_eq!(doc.text_between(m.from, m.to), "at");
        }
    }

    #[test]
    fn test_case_sensitivity_rescans() {
        let doc = doc("At bat, at last");
        let mut search = SearchEngine::new();
        search.set_query(&doc, "at", true);
        assert_eq!(search.results().len(), 2);

        search.set_case_sensitive(&doc, false);
        assert_eq!(search.results().len(), 3);
        assert!(!search.case_sensitive());
    }

    #[test]
    fn test_empty_query_and_no_hits() {
        let doc = doc("hello");
        let mut search = SearchEngine::new();

        search.set_query(&doc, "", false);
        assert!(search.results().is_empty());
        assert_eq!(search.result_index(), None);
        assert!(search.decorations().is_empty());

        search.set_query(&doc, "hello world", false);
        assert!(search.results().is_empty());
        assert_eq!(search.result_index(), Some(0));
        assert_eq!(search.select_current(), None);

        // navigation on empty results is a no-op
        search.next();
        search.previous();
        assert_eq!(search.result_index(), Some(0));
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let doc = doc("aaaa");
        let results = find_matches(&doc, "aa", true);
        assert_eq!(
            results,
            vec![SearchMatch { from: 1, to: 3 }, SearchMatch { from: 3, to: 5 }]
        );
    }

    #[test]
    fn test_matches_stay_inside_text_nodes() {
        let doc = Document::from_blocks(vec![DocumentNode::new(
            NodeKind::Paragraph,
            vec![
                DocumentNode::text("c"),
                DocumentNode::styled_text("at", vec![Mark::Bold]),
            ],
        )]);
        assert!(find_matches(&doc, "cat", false).is_empty());
        assert_eq!(find_matches(&doc, "at", false).len(), 1);
    }

    #[test]
    fn test_navigation_wraps() {
        let doc = doc("x x x x");
        let mut search = SearchEngine::new();
        search.set_query(&doc, "x", false);
        let start = search.result_index();

        for _ in 0..search.results().len() {
            search.next();
        }
        assert_eq!(search.result_index(), start);

        search.previous();
        assert_eq!(search.result_index(), Some(3));
        let decorations = search.decorations();
        assert_eq!(decorations.iter().filter(|d| d.current).count(), 1);
        assert!(decorations[3].current);
    }

    #[test]
    fn test_replace_current_rescans() {
        let mut doc = doc("one two one");
        let mut search = SearchEngine::new();
        search.set_query(&doc, "one", false);
        search.next();

        assert!(search.replace_current(&mut doc, "three").unwrap());
        assert_eq!(doc.plain_text(), "one two three");
        assert_eq!(search.results(), &[SearchMatch { from: 1, to: 4 }]);
        assert_eq!(search.result_index(), Some(0));
    }

    #[test]
    fn test_replace_all_across_blocks() {
        let mut doc = Document::from_blocks(vec![
            DocumentNode::heading(1, "Cat facts"),
            DocumentNode::paragraph("the cat and the other cat"),
        ]);
        let mut search = SearchEngine::new();
        search.set_query(&doc, "cat", false);
        assert_eq!(search.results().len(), 3);

        let replaced = search.replace_all(&mut doc, "dog").unwrap();
        assert_eq!(replaced, 3);
        assert_eq!(doc.plain_text(), "dog factsthe dog and the other dog");
        assert_eq!(search.query(), "");

        search.set_query(&doc, "cat", false);
        assert!(search.results().is_empty());
    }

    #[test]
    fn test_case_folding_keeps_offsets_aligned() {
        let doc = doc("STRASSE straße Ünïcode");
        let results = find_matches(&doc, "üNÏ", false);
        assert_eq!(results.len(), 1);
        assert_eq!(doc.text_between(results[0].from, results[0].to), "Ünï");
    }

    #[test]
    fn test_refresh_clamps_cursor() {
        let mut doc = doc("ab ab ab");
        let mut search = SearchEngine::new();
        search.set_query(&doc, "ab", true);
        search.previous();
        assert_eq!(search.result_index(), Some(2));

        doc.replace_text(7, 9, "").unwrap();
        search.refresh(&doc);
        assert_eq!(search.results().len(), 2);
        assert_eq!(search.result_index(), Some(0));
    }
}
