//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod prompts;
pub mod services;
pub mod validation;

pub use error::{ApplicationError, ApplicationResult, GenerationError};
pub use error_ext::ResultExt;
