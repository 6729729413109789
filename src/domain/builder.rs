//! Tree builder: derives the parent/child hierarchy from a flat node list.

use tracing::{debug, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::KnowledgeNode;

/// Constructs the hierarchy of one generated graph.
///
/// Two linear passes: the first registers every id, the second resolves
/// parent pointers by lookup. A node is a root when it has no `parent_id` or
/// when the declared parent is not part of the list. Children keep input
/// order. Duplicate ids after the first occurrence are ignored.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, nodes: &[KnowledgeNode]) -> TreeArena {
        let mut tree = TreeArena::new();

        let mut inserted = Vec::with_capacity(nodes.len());
        for (order, node) in nodes.iter().enumerate() {
            match tree.insert_node(NodeData {
                id: node.id.clone(),
                order,
            }) {
                Some(idx) => inserted.push((idx, node)),
                None => warn!("duplicate node id ignored: {}", node.id),
            }
        }

        for (idx, node) in inserted {
            match node.parent_id.as_deref().and_then(|p| tree.index_of(p)) {
                Some(parent) => tree.attach(idx, parent),
                None => {
                    if let Some(p) = &node.parent_id {
                        debug!("orphan {} promoted to root (missing parent {})", node.id, p);
                    }
                    tree.push_root(idx);
                }
            }
        }

        debug!("build: {} nodes, {} roots", tree.len(), tree.roots().len());
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_keep_input_order() {
        let nodes = vec![
            KnowledgeNode::new("r", "Root"),
            KnowledgeNode::new("c2", "Second").with_parent("r"),
            KnowledgeNode::new("c1", "First").with_parent("r"),
        ];
        let tree = TreeBuilder::new().build(&nodes);
        assert_eq!(tree.children("r"), vec!["c2", "c1"]);
    }

    #[test]
    fn test_parent_declared_after_child_resolves() {
        let nodes = vec![
            KnowledgeNode::new("c", "Child").with_parent("r"),
            KnowledgeNode::new("r", "Root"),
        ];
        let tree = TreeBuilder::new().build(&nodes);
        assert_eq!(tree.roots(), vec!["r"]);
        assert_eq!(tree.parent("c"), Some("r"));
    }
}
