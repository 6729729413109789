//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::PathBuf;

use crate::application::prompts::Prompt;
use crate::application::{ApplicationResult, GenerationError};
use crate::config::{RawSettings, Settings};

/// Remote language model: one prompt in, raw text out.
pub trait LlmClient: Send + Sync {
    /// Failures of any kind (network, HTTP status, empty body) are generation failures.
    fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError>;
}

/// Persistent storage for the user's configuration (model provider, endpoint,
/// key, model, temperature and quiz/view preferences).
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences, `None` when nothing was saved yet.
    fn load(&self) -> ApplicationResult<Option<RawSettings>>;

    fn save(&self, settings: &Settings) -> ApplicationResult<()>;

    /// Where the preferences live, for display.
    fn location(&self) -> Option<PathBuf>;
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Actual value (e.g., node id)
    pub value: String,
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String>;
}

/// Line-oriented user input.
pub trait Prompter: Send + Sync {
    /// Show `prompt` and read one line. Returns None at end of input.
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector;

impl Selector for SkimSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some("50%"))
            .multi(false)
            .build()
            .map_err(|e| format!("failed to build skim options: {e}"))?;

        let item_reader = SkimItemReader::default();
        let items_arc = item_reader.of_bufread(Cursor::new(input));

        match Skim::run_with(&options, Some(items_arc)) {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => Ok(out.selected_items.first().and_then(|selected| {
                let display = selected.output().to_string();
                items.iter().find(|i| i.display == display).cloned()
            })),
            None => Ok(None),
        }
    }
}

/// Reads answers and commands from stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        use colored::Colorize;
        use std::io::{BufRead, Write};

        print!("{} ", prompt.cyan());
        io::stdout().flush()?;
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
