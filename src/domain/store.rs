//! Node store: canonical mapping of node identity to progress.

use std::collections::HashMap;

use tracing::debug;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{KnowledgeNode, NodeStatus, Stars};

/// Ordered set of the nodes of one generated level.
///
/// Input order is preserved and drives the flat unlock sequence. Statuses
/// only move forward and stars are written by [`NodeStore::complete`] alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStore {
    nodes: Vec<KnowledgeNode>,
    index: HashMap<String, usize>,
}

impl NodeStore {
    /// Build a store, rejecting duplicate ids.
    pub fn new(nodes: Vec<KnowledgeNode>) -> DomainResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (pos, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), pos).is_some() {
                return Err(DomainError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self { nodes, index })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeNode> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All nodes in input order.
    pub fn nodes(&self) -> &[KnowledgeNode] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeNode> {
        self.nodes.iter()
    }

    pub fn status(&self, id: &str) -> DomainResult<NodeStatus> {
        self.get(id)
            .map(|n| n.status)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))
    }

    /// Leaf nodes in input order.
    pub fn leaves(&self) -> impl Iterator<Item = &KnowledgeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    /// Move a node from `Locked` to `Available`.
    pub fn unlock(&mut self, id: &str) -> DomainResult<()> {
        let node = self.expect_status(id, NodeStatus::Locked)?;
        node.status = NodeStatus::Available;
        debug!("unlock: {}", id);
        Ok(())
    }

    /// Move a node from `Available` to `Completed`, recording its stars.
    pub fn complete(&mut self, id: &str, stars: Stars) -> DomainResult<()> {
        let node = self.expect_status(id, NodeStatus::Available)?;
        node.status = NodeStatus::Completed;
        node.stars = stars;
        debug!("complete: {} with {} stars", id, stars.value());
        Ok(())
    }

    /// Mark organisational scaffolding as completed without a quiz.
    ///
    /// Allowed from `Locked` or `Available`; the node earns no stars.
    pub(crate) fn complete_scaffolding(&mut self, id: &str) -> DomainResult<()> {
        let node = self.node_mut(id)?;
        if !node.status.can_advance_to(NodeStatus::Completed) {
            return Err(DomainError::InvalidState {
                id: id.to_string(),
                status: node.status,
                expected: NodeStatus::Available,
            });
        }
        node.status = NodeStatus::Completed;
        node.stars = Stars::ZERO;
        Ok(())
    }

    /// Reset every node to `Locked` with no stars. Only used when seeding a fresh level.
    pub(crate) fn lock_all(&mut self) {
        for node in &mut self.nodes {
            node.status = NodeStatus::Locked;
            node.stars = Stars::ZERO;
        }
    }

    pub(crate) fn force_available(&mut self, id: &str) -> DomainResult<()> {
        let node = self.node_mut(id)?;
        if node.status.can_advance_to(NodeStatus::Available) {
            node.status = NodeStatus::Available;
        }
        Ok(())
    }

    /// Number of nodes in the given status.
    pub fn count(&self, status: NodeStatus) -> usize {
        self.nodes.iter().filter(|n| n.status == status).count()
    }

    /// Sum of stars over all completed nodes.
    pub fn total_stars(&self) -> u32 {
        self.nodes.iter().map(|n| u32::from(n.stars.value())).sum()
    }

    fn node_mut(&mut self, id: &str) -> DomainResult<&mut KnowledgeNode> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        Ok(&mut self.nodes[pos])
    }

    fn expect_status(&mut self, id: &str, expected: NodeStatus) -> DomainResult<&mut KnowledgeNode> {
        let node = self.node_mut(id)?;
        if node.status != expected {
            return Err(DomainError::InvalidState {
                id: id.to_string(),
                status: node.status,
                expected,
            });
        }
        Ok(node)
    }
}
