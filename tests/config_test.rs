//! Integration tests for Settings with the TOML preference store.
//!
//! Precedence (lowest to highest): compiled defaults, preference file,
//! QUIZMAP__SECTION__KEY environment variables.
//!
//! Note: These tests use temp directories only, the real XDG location is
//! never touched.

use std::fs;

use tempfile::TempDir;

use quizmap::application::ApplicationError;
use quizmap::cli::args::ConfigCommands;
use quizmap::cli::commands::run_config;
use quizmap::config::{Provider, Settings};
use quizmap::domain::LayoutStyle;
use quizmap::infrastructure::preferences::TomlPreferenceStore;
use quizmap::infrastructure::traits::PreferenceStore;

fn store(dir: &TempDir) -> TomlPreferenceStore {
    TomlPreferenceStore::new(dir.path().join("nested").join("quizmap.toml"))
}

#[test]
fn given_no_preference_file_when_loading_then_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    // Act
    let raw = store.load().unwrap();
    let settings = Settings::load(&store).unwrap();

    // Assert
    assert!(raw.is_none());
    assert_eq!(settings.quiz.question_count, 5);
    assert_eq!(settings.view.debounce_ms, 100);
    assert_eq!((settings.view.viewport_width, settings.view.viewport_height), (1280, 800));
}

#[test]
fn given_saved_settings_when_loading_then_round_trip() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let mut settings = Settings::default();
    settings.set("llm.provider", "groq").unwrap();
    settings.set("llm.temperature", "0.2").unwrap();
    settings.set("quiz.question_count", "8").unwrap();
    settings.set("view.viewport_width", "1920").unwrap();
    assert!(settings.set("view.viewport_height", "tall").is_err());

    // Act
    store.save(&settings).unwrap();
    let loaded = Settings::from_stored(store.load().unwrap());

    // Assert
    assert!(store.path().exists());
    assert_eq!(loaded.llm.provider, Provider::Groq);
    assert!((loaded.llm.temperature - 0.2).abs() < 1e-6);
    assert_eq!(loaded.quiz.question_count, 8);
    assert_eq!(loaded.view.viewport_width, 1920);
    assert_eq!(loaded.view.viewport_height, 800);
}

#[test]
fn given_partial_file_when_loading_then_missing_keys_default() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quizmap.toml");
    fs::write(
        &path,
        r#"
[llm]
provider = "ollama"
timeout_secs = 5
"#,
    )
    .unwrap();
    let store = TomlPreferenceStore::new(&path);

    // Act
    let settings = Settings::load(&store).unwrap();

    // Assert
    assert_eq!(settings.llm.provider, Provider::Ollama);
    assert_eq!(settings.llm.timeout_secs, 5);
    assert_eq!(settings.quiz.question_count, 5);
    assert_eq!(
        settings.llm.endpoint().unwrap(),
        "http://localhost:11434/v1"
    );
}

#[test]
fn given_malformed_file_when_loading_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quizmap.toml");
    fs::write(&path, "[llm\nprovider = ").unwrap();
    let store = TomlPreferenceStore::new(&path);

    // Act
    let result = Settings::load(&store);

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_out_of_range_temperature_in_file_when_loading_then_rejected() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quizmap.toml");
    fs::write(&path, "[llm]\ntemperature = 2.5\n").unwrap();
    let store = TomlPreferenceStore::new(&path);

    // Act
    let result = Settings::load(&store);

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_config_set_command_when_value_invalid_then_file_unchanged() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    run_config(
        &store,
        &ConfigCommands::Set {
            key: "llm.model".into(),
            value: "llama3".into(),
        },
    )
    .unwrap();
    let before = fs::read_to_string(store.path()).unwrap();

    // Act
    let result = run_config(
        &store,
        &ConfigCommands::Set {
            key: "quiz.question_count".into(),
            value: "0".into(),
        },
    );

    // Assert
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    assert!(before.contains("llama3"));
}

#[test]
fn given_env_override_when_loading_then_env_wins_but_is_not_persisted() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let mut saved = Settings::default();
    saved.set("view.layout", "indented").unwrap();
    store.save(&saved).unwrap();
    std::env::set_var("QUIZMAP__VIEW__LAYOUT", "radial");

    // Act
    let effective = Settings::load(&store).unwrap();
    let stored = Settings::from_stored(store.load().unwrap());
    std::env::remove_var("QUIZMAP__VIEW__LAYOUT");

    // Assert
    assert_eq!(effective.view.layout, LayoutStyle::Radial);
    assert_eq!(stored.view.layout, LayoutStyle::Indented);
}
