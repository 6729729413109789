use std::collections::{HashMap, HashSet};
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Data payload for tree nodes: identity plus position in the input list.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Knowledge node id
    pub id: String,
    /// Position of the node in the generated list
    pub order: usize,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of the resolved parent, None for roots
    pub parent: Option<Index>,
    /// Indices of direct children, in input order
    pub children: Vec<Index>,
}

/// Arena-based forest for one generated graph.
///
/// Each node id occurs once. Roots are kept in input order and all
/// traversals guard against revisiting a node, so malformed parent chains
/// terminate.
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    roots: Vec<Index>,
    ids: HashMap<String, Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a detached node. Returns `None` if the id is already present.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_node(&mut self, data: NodeData) -> Option<Index> {
        if self.ids.contains_key(&data.id) {
            return None;
        }
        let id = data.id.clone();
        let idx = self.arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        self.ids.insert(id, idx);
        Some(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    pub(crate) fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, id: &str) -> Option<Index> {
        self.ids.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Root ids in input order.
    pub fn roots(&self) -> Vec<&str> {
        self.roots.iter().filter_map(|&i| self.id_at(i)).collect()
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.index_of(id)
            .and_then(|i| self.get_node(i))
            .is_some_and(|n| n.parent.is_none())
    }

    /// Direct children of `id`, in input order.
    pub fn children(&self, id: &str) -> Vec<&str> {
        self.index_of(id)
            .and_then(|i| self.get_node(i))
            .map(|n| n.children.iter().filter_map(|&c| self.id_at(c)).collect())
            .unwrap_or_default()
    }

    /// Resolved parent of `id`; `None` for roots and unknown ids.
    pub fn parent(&self, id: &str) -> Option<&str> {
        let node = self.get_node(self.index_of(id)?)?;
        node.parent.and_then(|p| self.id_at(p))
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.index_of(id);
        seen.extend(current);
        while let Some(parent) = current.and_then(|i| self.get_node(i)).and_then(|n| n.parent) {
            if !seen.insert(parent) {
                break;
            }
            if let Some(pid) = self.id_at(parent) {
                result.push(pid);
            }
            current = Some(parent);
        }
        result
    }

    /// All transitive descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: &str) -> Vec<&str> {
        let Some(start) = self.index_of(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::from([start]);
        let mut result = Vec::new();
        let mut stack: Vec<Index> = self.child_indices(start).into_iter().rev().collect();
        while let Some(idx) = stack.pop() {
            if !seen.insert(idx) {
                continue;
            }
            if let Some(node) = self.get_node(idx) {
                result.push(node.data.id.as_str());
                stack.extend(node.children.iter().rev());
            }
        }
        result
    }

    /// Depth of `id` below its root (roots are depth 0).
    pub fn depth(&self, id: &str) -> usize {
        self.ancestors(id).len()
    }

    /// Pre-order traversal over the whole forest, roots in input order.
    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, |_| true)
    }

    /// Pre-order traversal that does not descend below nodes rejected by `descend`.
    pub fn iter_pruned<F>(&self, descend: F) -> TreeIterator<'_>
    where
        F: Fn(&str) -> bool + 'static,
    {
        TreeIterator::new(self, descend)
    }

    /// Leaves below `id` when only nodes accepted by `descend` are opened.
    ///
    /// A childless node, or one that is not descended into, counts as one leaf.
    pub fn leaf_count<F>(&self, id: &str, descend: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let Some(start) = self.index_of(id) else {
            return 0;
        };
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        let mut count = 0;
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            match self.get_node(current) {
                Some(node) if node.children.is_empty() || !descend(&node.data.id) => count += 1,
                Some(node) => stack.extend(node.children.iter()),
                None => {}
            }
        }
        count
    }

    fn child_indices(&self, idx: Index) -> Vec<Index> {
        self.get_node(idx).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn id_at(&self, idx: Index) -> Option<&str> {
        self.arena.get(idx).map(|n| n.data.id.as_str())
    }
}

/// Pre-order iterator yielding `(index, node, depth)`.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, usize)>,
    seen: HashSet<Index>,
    descend: Box<dyn Fn(&str) -> bool>,
}

impl<'a> TreeIterator<'a> {
    fn new<F>(arena: &'a TreeArena, descend: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        let stack = arena.roots.iter().rev().map(|&r| (r, 0)).collect();
        Self {
            arena,
            stack,
            seen: HashSet::new(),
            descend: Box::new(descend),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            if !self.seen.insert(idx) {
                continue;
            }
            if let Some(node) = self.arena.get_node(idx) {
                if (self.descend)(&node.data.id) {
                    // Push children in reverse order for left-to-right traversal
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, depth + 1));
                    }
                }
                return Some((idx, node, depth));
            }
        }
        None
    }
}
