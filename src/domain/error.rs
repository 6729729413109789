//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeStatus;

/// Domain errors represent state machine and data invariant violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("node {id} is {status}, expected {expected}")]
    InvalidState {
        id: String,
        status: NodeStatus,
        expected: NodeStatus,
    },

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("quiz for node {id} has {total} questions")]
    InvalidQuizSize { id: String, total: u32 },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
