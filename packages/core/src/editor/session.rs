//! Editor Session
//!
//! The explicit context object for the page currently shown in the editor. It
//! owns the loaded [`Document`], its search state, the selection, focus, and the
//! autosave worker for that page. Its lifetime is the lifetime of the view:
//! navigating away closes it, which flushes pending content.

use super::search::{Decoration, SearchEngine, SearchMatch};
use crate::models::{Document, DocumentError, Node};
use crate::services::{AutosaveWorker, ContentSink};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Selected position range; `from == to` is a caret
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

impl Selection {
    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

impl From<SearchMatch> for Selection {
    fn from(m: SearchMatch) -> Self {
        Self {
            from: m.from,
            to: m.to,
        }
    }
}

pub struct EditorSession {
    node_id: String,
    document: Document,
    search: SearchEngine,
    selection: Selection,
    focused: bool,
    autosave: Option<AutosaveWorker>,
}

impl EditorSession {
    /// Load `node` and start autosaving its edits into `sink`
    ///
    /// Must be called inside a tokio runtime.
    pub fn open(node: &Node, sink: Arc<dyn ContentSink>, delay: Duration) -> Self {
        let autosave = AutosaveWorker::spawn(node.id.clone(), node.content.clone(), sink, delay);
        Self {
            autosave: Some(autosave),
            ..Self::detached(node.id.clone(), Document::load(&node.content))
        }
    }

    /// Session without persistence, e.g. for previews
    pub fn detached(node_id: impl Into<String>, document: Document) -> Self {
        Self {
            node_id: node_id.into(),
            document,
            search: SearchEngine::new(),
            selection: Selection::default(),
            focused: false,
            autosave: None,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn is_autosaving(&self) -> bool {
        self.autosave.is_some()
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Set the selection, clamped to the document
    pub fn set_selection(&mut self, from: usize, to: usize) {
        let size = self.document.content_size();
        let (from, to) = if from <= to { (from, to) } else { (to, from) };
        self.selection = Selection {
            from: from.min(size),
            to: to.min(size),
        };
    }

    pub fn current_selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_text(&self) -> String {
        self.document
            .text_between(self.selection.from, self.selection.to)
    }

    /// Apply a mutation atomically, then rescan search and schedule a save
    ///
    /// If `mutate` fails the document is left as it was.
    pub fn edit<F, R>(&mut self, mutate: F) -> Result<R, DocumentError>
    where
        F: FnOnce(&mut Document) -> Result<R, DocumentError>,
    {
        let mut working = self.document.clone();
        let out = mutate(&mut working)?;
        self.commit(working);
        Ok(out)
    }

    pub fn replace_text(&mut self, from: usize, to: usize, text: &str) -> Result<(), DocumentError> {
        self.edit(|doc| doc.replace_text(from, to, text))
    }

    fn commit(&mut self, document: Document) {
        if document == self.document {
            return;
        }
        self.document = document;
        self.search.refresh(&self.document);
        self.set_selection(self.selection.from, self.selection.to);
        self.notify_autosave();
    }

    fn notify_autosave(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify(self.document.to_json());
        }
    }

    pub fn set_query(&mut self, query: &str, case_sensitive: bool) {
        self.search.set_query(&self.document, query, case_sensitive);
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.search.set_case_sensitive(&self.document, case_sensitive);
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn set_replace_term(&mut self, term: impl Into<String>) {
        self.search.set_replace_term(term);
    }

    pub fn next_match(&mut self) {
        self.search.next();
    }

    pub fn previous_match(&mut self) {
        self.search.previous();
    }

    pub fn decorations(&self) -> Vec<Decoration> {
        self.search.decorations()
    }

    /// Select the current match and return it for scrolling into view
    pub fn select_current_match(&mut self) -> Option<SearchMatch> {
        let current = self.search.select_current()?;
        self.selection = current.into();
        Some(current)
    }

    pub fn replace_current(&mut self, text: &str) -> Result<bool, DocumentError> {
        let replaced = self.search.replace_current(&mut self.document, text)?;
        if replaced {
            self.set_selection(self.selection.from, self.selection.to);
            self.notify_autosave();
        }
        Ok(replaced)
    }

    pub fn replace_all(&mut self, text: &str) -> Result<usize, DocumentError> {
        let count = self.search.replace_all(&mut self.document, text)?;
        if count > 0 {
            self.set_selection(self.selection.from, self.selection.to);
            self.notify_autosave();
        }
        Ok(count)
    }

    /// Write pending content now
    pub async fn flush(&self) -> anyhow::Result<bool> {
        match &self.autosave {
            Some(autosave) => autosave.flush().await,
            None => Ok(false),
        }
    }

    /// Flush pending content and stop autosaving
    pub async fn close(mut self) -> anyhow::Result<bool> {
        match self.autosave.take() {
            Some(autosave) => autosave.close().await,
            None => Ok(false),
        }
    }
}
