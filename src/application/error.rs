//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, NodeStatus};

/// Generation output was empty, malformed, or violated the expected shape.
///
/// Nothing is committed when this happens; the caller shows the message and
/// the user may retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("generation failed: {message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Generation(#[from] GenerationError),

    #[error("busy: {0}")]
    Busy(String),

    #[error("node {id} cannot be played while {status}")]
    NodeNotPlayable { id: String, status: NodeStatus },

    #[error("no level loaded")]
    NoLevel,

    #[error("no quiz in progress")]
    NoQuiz,

    #[error("level {level} is not complete yet")]
    LevelIncomplete { level: u32 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
