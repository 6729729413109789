//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{ContentService, LearningSession};
use crate::config::Settings;
use crate::domain::LayoutStyle;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::llm::ChatCompletionsClient;
use crate::infrastructure::preferences::TomlPreferenceStore;
use crate::infrastructure::traits::{
    LlmClient, PreferenceStore, Prompter, Selector, SkimSelector, StdinPrompter,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Where settings are persisted
    pub preferences: Arc<dyn PreferenceStore>,

    /// Content generation backend
    pub llm: Arc<dyn LlmClient>,

    /// Fuzzy node picker
    pub selector: Arc<dyn Selector>,

    /// Line input for quiz answers and session commands
    pub prompter: Arc<dyn Prompter>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Settings are read once from the preference store at the XDG location.
    pub fn new() -> InfraResult<Self> {
        let preferences: Arc<dyn PreferenceStore> =
            Arc::new(TomlPreferenceStore::default_location()?);
        let settings = Settings::load(preferences.as_ref())?;
        let llm = Arc::new(ChatCompletionsClient::new(&settings.llm)?);
        Ok(Self::with_deps(
            settings,
            preferences,
            llm,
            Arc::new(SkimSelector),
            Arc::new(StdinPrompter),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        preferences: Arc<dyn PreferenceStore>,
        llm: Arc<dyn LlmClient>,
        selector: Arc<dyn Selector>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            preferences,
            llm,
            selector,
            prompter,
        }
    }

    pub fn content_service(&self) -> ContentService {
        ContentService::new(self.llm.clone(), self.settings.quiz.question_count)
    }

    /// Fresh session; `layout` overrides the configured layout style.
    pub fn session(&self, layout: Option<LayoutStyle>) -> LearningSession {
        let view = &self.settings.view;
        LearningSession::new(
            self.content_service(),
            layout.unwrap_or(view.layout),
            Duration::from_millis(view.debounce_ms),
        )
        .with_viewport(f64::from(view.viewport_width), f64::from(view.viewport_height))
    }
}
