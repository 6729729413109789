//! quizmap: learn a topic by quiz on a generated knowledge map.
//!
//! Layers, innermost first: `domain` (node store, tree builder, unlock
//! engine, view state, layout and connector geometry), `application`
//! (validation of generated content, learning session), `infrastructure`
//! (model client, preference store, terminal selectors) and `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
