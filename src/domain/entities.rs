//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of answer options every quiz question carries.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Highest star rating a completed node can earn.
pub const MAX_STARS: u8 = 3;

/// Progress state of a knowledge node.
///
/// Transitions only move forward: `Locked -> Available -> Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Locked,
    Available,
    Completed,
}

impl NodeStatus {
    /// Whether moving from `self` to `next` is a forward step.
    pub fn can_advance_to(self, next: NodeStatus) -> bool {
        next > self
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Locked => "locked",
            NodeStatus::Available => "available",
            NodeStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Hierarchy role in typed graphs. Only leaves are quiz targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Branch,
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Root => "root",
            NodeKind::Branch => "branch",
            NodeKind::Leaf => "leaf",
        };
        write!(f, "{s}")
    }
}

/// Star rating in `0..=3`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stars(u8);

impl Stars {
    pub const ZERO: Stars = Stars(0);

    /// Rating for a quiz result: `ceil(correct / total * 3)` clamped to `0..=3`.
    ///
    /// Returns `None` for an empty quiz.
    pub fn from_score(correct: u32, total: u32) -> Option<Stars> {
        if total == 0 {
            return None;
        }
        let scaled = (u64::from(correct) * u64::from(MAX_STARS)).div_ceil(u64::from(total));
        Some(Stars(scaled.min(u64::from(MAX_STARS)) as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Stars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = usize::from(self.0);
        let empty = usize::from(MAX_STARS) - filled;
        write!(f, "{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

/// One unit of learnable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeNode {
    pub id: String,
    pub label: String,
    pub description: String,
    pub status: NodeStatus,
    pub stars: Stars,
    /// Declared parent; unresolvable parents are promoted to roots by the tree builder
    pub parent_id: Option<String>,
    /// Present only in typed (hub/branch/leaf) graphs
    pub kind: Option<NodeKind>,
    /// Generation stage the node belongs to
    pub level: u32,
    /// Carried as data only, never consulted when unlocking
    pub dependencies: Vec<String>,
}

impl KnowledgeNode {
    /// A locked, untyped node without parent. Mostly useful for tests and fixtures.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            status: NodeStatus::Locked,
            stars: Stars::ZERO,
            parent_id: None,
            kind: None,
            level: 1,
            dependencies: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == Some(NodeKind::Leaf)
    }
}

/// A generated multiple-choice question. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }
}
