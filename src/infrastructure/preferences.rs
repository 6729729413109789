//! TOML-file preference store.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, ResultExt};
use crate::config::{global_config_path, RawSettings, Settings};
use crate::infrastructure::traits::PreferenceStore;

/// Preferences persisted as TOML at a fixed path.
#[derive(Debug, Clone)]
pub struct TomlPreferenceStore {
    path: PathBuf,
}

impl TomlPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the XDG config location.
    pub fn default_location() -> ApplicationResult<Self> {
        global_config_path()
            .map(Self::new)
            .ok_or_else(|| ApplicationError::Config {
                message: "cannot determine config directory".to_string(),
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn load(&self) -> ApplicationResult<Option<RawSettings>> {
        if !self.path.exists() {
            debug!("no preferences at {}", self.path.display());
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&self.path).with_path_context("read preferences", &self.path)?;
        let raw = toml::from_str(&content).map_err(|e| ApplicationError::Config {
            message: format!("parse {}: {}", self.path.display(), e),
        })?;
        Ok(Some(raw))
    }

    fn save(&self, settings: &Settings) -> ApplicationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_path_context("create config dir", parent)?;
            }
        }
        let content = toml::to_string_pretty(settings).map_err(|e| ApplicationError::Config {
            message: format!("serialize preferences: {e}"),
        })?;
        std::fs::write(&self.path, content).with_path_context("write preferences", &self.path)?;
        debug!("saved preferences to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}
