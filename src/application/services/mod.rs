//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (LlmClient) but are themselves
//! concrete structs, not traits.

mod content;
mod quiz;
mod session;

pub use content::ContentService;
pub use quiz::{AnswerFeedback, QuizRun};
pub use session::{LearningSession, Level, PhaseObserver, QuizReport, SessionPhase};
