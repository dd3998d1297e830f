//! In-memory page forest of one space.
//!
//! Nodes live in an arena keyed by id with a separate parent-id index, so no
//! node ever holds a live reference to another. Rows whose parent chain does
//! not end at the space root (missing parent or a cycle) are dropped when the
//! tree is built.

use crate::models::node::Node;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Nested view of a node and its children, in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeItem>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted rows, dropping orphaned and cyclic rows
    pub fn build(rows: Vec<Node>) -> Self {
        let by_id: HashMap<String, Node> = rows.into_iter().map(|n| (n.id.clone(), n)).collect();

        let reachable: Vec<String> = by_id
            .keys()
            .filter(|id| Self::terminates_at_root(&by_id, id))
            .cloned()
            .collect();

        let mut tree = Self::new();
        let mut by_id = by_id;
        for id in &reachable {
            if let Some(node) = by_id.remove(id) {
                tree.nodes.insert(node.id.clone(), node);
            }
        }
        // whatever is left is orphaned or part of a cycle
        for id in by_id.keys() {
            tracing::warn!("Dropping node {} whose parent chain does not reach the root", id);
        }

        let ids: Vec<String> = tree.nodes.keys().cloned().collect();
        for id in ids {
            let parent = tree.nodes.get(&id).and_then(|n| n.parent_id.clone());
            match parent {
                Some(parent_id) => tree.children.entry(parent_id).or_default().push(id),
                None => tree.roots.push(id),
            }
        }

        tree.sort_siblings(None);
        let parents: Vec<String> = tree.children.keys().cloned().collect();
        for parent in parents {
            tree.sort_siblings(Some(&parent));
        }
        tree
    }

    fn terminates_at_root(by_id: &HashMap<String, Node>, id: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = id;
        loop {
            if !seen.insert(current) {
                return false;
            }
            let Some(node) = by_id.get(current) else {
                return false;
            };
            match node.parent_id.as_deref() {
                None => return true,
                Some(parent) => current = parent,
            }
        }
    }

    fn siblings_mut(&mut self, parent: Option<&str>) -> &mut Vec<String> {
        match parent {
            None => &mut self.roots,
            Some(parent) => self.children.entry(parent.to_string()).or_default(),
        }
    }

    fn sort_siblings(&mut self, parent: Option<&str>) {
        let mut ids = std::mem::take(self.siblings_mut(parent));
        let nodes = &self.nodes;
        ids.sort_by(|a, b| match (nodes.get(a), nodes.get(b)) {
            (Some(a), Some(b)) => a.sibling_key().cmp(&b.sibling_key()),
            _ => std::cmp::Ordering::Equal,
        });
        *self.siblings_mut(parent) = ids;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Children of `parent` (top-level pages for `None`) in display order
    pub fn children(&self, parent: Option<&str>) -> Vec<&Node> {
        let ids = match parent {
            None => Some(&self.roots),
            Some(parent) => self.children.get(parent),
        };
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }

    /// Insert a node under its parent, keeping sibling order.
    ///
    /// Returns false when the parent is not part of the tree or the id is taken.
    pub fn insert(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        if let Some(parent) = node.parent_id.as_deref() {
            if !self.nodes.contains_key(parent) {
                return false;
            }
        }
        let parent = node.parent_id.clone();
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.siblings_mut(parent.as_deref()).push(id);
        self.sort_siblings(parent.as_deref());
        true
    }

    /// Mutate a node in place; sibling order is refreshed afterwards
    pub fn update<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Node),
    {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        f(node);
        let parent = node.parent_id.clone();
        self.sort_siblings(parent.as_deref());
        true
    }

    /// Remove a node and all of its descendants, returning the removed rows
    pub fn remove_subtree(&mut self, id: &str) -> Vec<Node> {
        let Some(parent) = self.nodes.get(id).map(|n| n.parent_id.clone()) else {
            return Vec::new();
        };
        self.siblings_mut(parent.as_deref()).retain(|sibling| sibling != id);

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(children) = self.children.remove(&current) {
                stack.extend(children);
            }
            if let Some(node) = self.nodes.remove(&current) {
                removed.push(node);
            }
        }
        removed
    }

    /// Nodes from the space root down to `id`, inclusive; empty when unknown
    pub fn path(&self, id: &str) -> Vec<Node> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id);
        while let Some(node) = current {
            path.push(node.clone());
            current = node.parent_id.as_deref().and_then(|p| self.nodes.get(p));
        }
        path.reverse();
        path
    }

    /// Depth-first walk of the whole forest with depths
    pub fn flatten(&self) -> Vec<(&Node, usize)> {
        let mut out = Vec::new();
        for root in self.children(None) {
            self.walk(root, 0, &mut out, &|_| true);
        }
        out
    }

    /// Depth-first walk of the subtree rooted at `id`, `id` at depth 0
    pub fn flatten_branch(&self, id: &str) -> Vec<(&Node, usize)> {
        let mut out = Vec::new();
        if let Some(node) = self.nodes.get(id) {
            self.walk(node, 0, &mut out, &|_| true);
        }
        out
    }

    /// Nodes a reader can see: closed nodes hide their descendants
    pub fn flatten_visible(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        for root in self.children(None) {
            self.walk(root, 0, &mut out, &|node: &Node| node.is_open);
        }
        out.into_iter().map(|(node, _)| node).collect()
    }

    fn walk<'a>(
        &'a self,
        node: &'a Node,
        depth: usize,
        out: &mut Vec<(&'a Node, usize)>,
        descend: &dyn Fn(&Node) -> bool,
    ) {
        out.push((node, depth));
        if descend(node) {
            for child in self.children(Some(&node.id)) {
                self.walk(child, depth + 1, out, descend);
            }
        }
    }

    /// Id of the visible node right before `id`, if any
    pub fn previous_visible(&self, id: &str) -> Option<String> {
        let visible = self.flatten_visible();
        let index = visible.iter().position(|node| node.id == id)?;
        index
            .checked_sub(1)
            .and_then(|prev| visible.get(prev))
            .map(|node| node.id.clone())
    }

    /// Pinned nodes in tree order
    pub fn pinned(&self) -> Vec<&Node> {
        self.flatten()
            .into_iter()
            .map(|(node, _)| node)
            .filter(|node| node.is_pinned)
            .collect()
    }

    /// First node with content, else the first leaf, depth-first
    pub fn first_file_id(&self) -> Option<String> {
        let all = self.flatten();
        all.iter()
            .find(|(node, _)| node.has_content())
            .or_else(|| all.iter().find(|(node, _)| !self.has_children(&node.id)))
            .map(|(node, _)| node.id.clone())
    }

    /// Nested view of the forest
    pub fn items(&self) -> Vec<TreeItem> {
        self.children(None)
            .into_iter()
            .map(|node| self.item(node))
            .collect()
    }

    fn item(&self, node: &Node) -> TreeItem {
        TreeItem {
            node: node.clone(),
            children: self
                .children(Some(&node.id))
                .into_iter()
                .map(|child| self.item(child))
                .collect(),
        }
    }
}
