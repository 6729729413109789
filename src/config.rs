//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Preference file: `$XDG_CONFIG_HOME/quizmap/quizmap.toml`
//! 3. Environment variables: `QUIZMAP__SECTION__KEY`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::LayoutStyle;
use crate::infrastructure::traits::PreferenceStore;

pub const TEMPERATURE_MAX: f32 = 2.0;

/// Model provider. All speak the OpenAI-compatible chat completions API and
/// differ in their default endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    DeepSeek,
    Groq,
    Ollama,
    Custom,
}

impl Provider {
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Provider::OpenAi => Some("https://api.openai.com/v1"),
            Provider::DeepSeek => Some("https://api.deepseek.com/v1"),
            Provider::Groq => Some("https://api.groq.com/openai/v1"),
            Provider::Ollama => Some("http://localhost:11434/v1"),
            Provider::Custom => None,
        }
    }

    /// Local providers run without a key.
    pub fn requires_key(self) -> bool {
        !matches!(self, Provider::Ollama | Provider::Custom)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Provider::OpenAi => "openai",
            Provider::DeepSeek => "deepseek",
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
            Provider::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Provider {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "deepseek" => Ok(Provider::DeepSeek),
            "groq" => Ok(Provider::Groq),
            "ollama" => Ok(Provider::Ollama),
            "custom" => Ok(Provider::Custom),
            other => Err(ApplicationError::Config {
                message: format!("unknown provider: {other}"),
            }),
        }
    }
}

/// Model configuration persisted across sessions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Endpoint base URL without trailing slash.
    pub fn endpoint(&self) -> Result<String, ApplicationError> {
        self.base_url
            .as_deref()
            .or_else(|| self.provider.default_base_url())
            .map(|u| u.trim_end_matches('/').to_string())
            .ok_or_else(|| ApplicationError::Config {
                message: format!("provider {} needs llm.base_url", self.provider),
            })
    }
}

/// Quiz settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuizConfig {
    /// Questions requested per quiz
    pub question_count: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self { question_count: 5 }
    }
}

/// Map rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    pub layout: LayoutStyle,
    /// Quiet period before connectors are recomputed
    pub debounce_ms: u64,
    /// Screen size a new level is centred in
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            layout: LayoutStyle::default(),
            debounce_ms: 100,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// Raw model config for intermediate parsing (None means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLlmConfig {
    pub provider: Option<Provider>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
}

/// Raw settings as stored in the preference file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub llm: RawLlmConfig,
    pub quiz: Option<QuizConfig>,
    pub view: Option<ViewConfig>,
}

/// Unified configuration for quizmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmConfig,
    pub quiz: QuizConfig,
    pub view: ViewConfig,
}

/// Get the XDG config directory for quizmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "quizmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the preference file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("quizmap.toml"))
}

impl Settings {
    /// Load settings with layered precedence from a preference store.
    pub fn load(store: &dyn PreferenceStore) -> Result<Self, ApplicationError> {
        let raw = store.load()?;
        Self::load_from(raw)
    }

    /// Defaults overlaid with the stored preferences only, as they are edited and saved.
    pub fn from_stored(raw: Option<RawSettings>) -> Self {
        match raw {
            Some(raw) => Self::default().merge_with(raw),
            None => Self::default(),
        }
    }

    /// Defaults, then `raw` (if any), then environment overrides.
    pub fn load_from(raw: Option<RawSettings>) -> Result<Self, ApplicationError> {
        let mut current = Self::apply_env_overrides(Self::from_stored(raw))?;
        current.expand_values();
        current.validate()?;
        Ok(current)
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(self, overlay: RawSettings) -> Self {
        let llm = LlmConfig {
            provider: overlay.llm.provider.unwrap_or(self.llm.provider),
            base_url: overlay.llm.base_url.or(self.llm.base_url),
            api_key: overlay.llm.api_key.or(self.llm.api_key),
            model: overlay.llm.model.unwrap_or(self.llm.model),
            temperature: overlay.llm.temperature.unwrap_or(self.llm.temperature),
            timeout_secs: overlay.llm.timeout_secs.unwrap_or(self.llm.timeout_secs),
        };
        Self {
            llm,
            quiz: overlay.quiz.unwrap_or(self.quiz),
            view: overlay.view.unwrap_or(self.view),
        }
    }

    /// Apply QUIZMAP__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("QUIZMAP").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("llm.provider") {
            settings.llm.provider = val.parse()?;
        }
        if let Ok(val) = config.get_string("llm.base_url") {
            settings.llm.base_url = Some(val);
        }
        if let Ok(val) = config.get_string("llm.api_key") {
            settings.llm.api_key = Some(val);
        }
        if let Ok(val) = config.get_string("llm.model") {
            settings.llm.model = val;
        }
        if let Ok(val) = config.get_float("llm.temperature") {
            settings.llm.temperature = val as f32;
        }
        if let Ok(val) = config.get_int("llm.timeout_secs") {
            settings.llm.timeout_secs = u64::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("invalid llm.timeout_secs: {val}"),
            })?;
        }
        if let Ok(val) = config.get_int("quiz.question_count") {
            settings.quiz.question_count =
                usize::try_from(val).map_err(|_| ApplicationError::Config {
                    message: format!("invalid quiz.question_count: {val}"),
                })?;
        }
        if let Ok(val) = config.get_string("view.layout") {
            settings.view.layout = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        Ok(settings)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in endpoint and key, so a key can be
    /// referenced as `"$OPENAI_API_KEY"`.
    fn expand_values(&mut self) {
        self.llm.base_url = self.llm.base_url.take().map(|u| expand(&u));
        self.llm.api_key = self.llm.api_key.take().map(|k| expand(&k));
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(0.0..=TEMPERATURE_MAX).contains(&self.llm.temperature) {
            return Err(ApplicationError::Config {
                message: format!(
                    "llm.temperature must be within 0..={TEMPERATURE_MAX}, got {}",
                    self.llm.temperature
                ),
            });
        }
        if self.quiz.question_count == 0 {
            return Err(ApplicationError::Config {
                message: "quiz.question_count must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Change one setting by dotted key. Invalid values leave the settings unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ApplicationError> {
        let mut next = self.clone();
        next.apply(key, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ApplicationError> {
        let invalid = |what: &str| ApplicationError::Config {
            message: format!("invalid value for {key}: {value} ({what})"),
        };
        let optional = |v: &str| (!v.is_empty()).then(|| v.to_string());
        match key {
            "llm.provider" => self.llm.provider = value.parse()?,
            "llm.base_url" => self.llm.base_url = optional(value),
            "llm.api_key" => self.llm.api_key = optional(value),
            "llm.model" if !value.trim().is_empty() => self.llm.model = value.to_string(),
            "llm.model" => return Err(invalid("empty")),
            "llm.temperature" => {
                self.llm.temperature = value.parse().map_err(|_| invalid("not a number"))?
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value.parse().map_err(|_| invalid("not an integer"))?
            }
            "quiz.question_count" => {
                self.quiz.question_count = value.parse().map_err(|_| invalid("not an integer"))?
            }
            "view.layout" => self.view.layout = value.parse().map_err(|e: String| invalid(&e))?,
            "view.debounce_ms" => {
                self.view.debounce_ms = value.parse().map_err(|_| invalid("not an integer"))?
            }
            "view.viewport_width" => {
                self.view.viewport_width = value.parse().map_err(|_| invalid("not an integer"))?
            }
            "view.viewport_height" => {
                self.view.viewport_height = value.parse().map_err(|_| invalid("not an integer"))?
            }
            _ => {
                return Err(ApplicationError::Config {
                    message: format!("unknown setting: {key}"),
                })
            }
        }
        Ok(())
    }

    /// Show the effective configuration as TOML, with the key masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.llm.api_key.is_some() {
            shown.llm.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# quizmap configuration
#
# Locations (by precedence, lowest to highest):
#   File: ~/.config/quizmap/quizmap.toml
#   Env:  QUIZMAP__<SECTION>__<KEY>, e.g. QUIZMAP__LLM__API_KEY

[llm]
# openai | deepseek | groq | ollama | custom
# provider = "openai"

# Endpoint override (required for provider = "custom")
# base_url = "http://localhost:8080/v1"

# API key, literal or "$ENV_VAR"
# api_key = "$OPENAI_API_KEY"

# model = "gpt-4o-mini"
# temperature = 0.7
# timeout_secs = 60

[quiz]
# question_count = 5

[view]
# indented | radial
# layout = "indented"
# debounce_ms = 100
# viewport_width = 1280
# viewport_height = 800
"#
        .to_string()
    }
}

fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
