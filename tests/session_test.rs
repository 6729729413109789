//! Tests for LearningSession with a scripted content generator

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use quizmap::application::prompts::Prompt;
use quizmap::application::services::{ContentService, LearningSession, SessionPhase};
use quizmap::application::{ApplicationError, GenerationError};
use quizmap::domain::{Layout, LayoutStyle, NodeStatus, Point, ViewState};
use quizmap::infrastructure::traits::LlmClient;
use quizmap::util::testing;

/// Mock model that replays scripted responses and records prompts
#[derive(Default)]
struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    fn push(&self, response: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
    }

    fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(GenerationError::new(message)));
    }

    fn last_prompt(&self) -> Prompt {
        self.prompts.lock().unwrap().last().cloned().unwrap()
    }
}

impl LlmClient for ScriptedLlm {
    fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::new("no scripted response")))
    }
}

const LEVEL_ONE: &str = r#"[
  {"id": "r", "label": "Rust", "description": "d", "type": "root"},
  {"id": "b", "label": "Ownership", "description": "d", "parentId": "r", "type": "branch"},
  {"id": "l1", "label": "Moves", "description": "d", "parentId": "b", "type": "leaf"},
  {"id": "l2", "label": "Borrowing", "description": "d", "parentId": "b", "type": "leaf"}
]"#;

const LEVEL_TWO: &str = r#"[
  {"id": "r2", "label": "Rust 2", "description": "d", "type": "root"},
  {"id": "x", "label": "Lifetimes", "description": "d", "parentId": "r2", "type": "leaf"}
]"#;

fn quiz(correct: &[usize]) -> String {
    let items: Vec<String> = correct
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                r#"{{"id": "q{i}", "text": "Q{i}", "options": ["a", "b", "c", "d"], "correctIndex": {c}, "explanation": "e{i}"}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn session(llm: &Arc<ScriptedLlm>) -> LearningSession {
    testing::init_test_setup();
    let content = ContentService::new(llm.clone(), 2);
    LearningSession::new(content, LayoutStyle::Indented, Duration::from_millis(100))
}

fn status(session: &LearningSession, id: &str) -> NodeStatus {
    session.level().unwrap().store.status(id).unwrap()
}

fn play(session: &mut LearningSession, llm: &ScriptedLlm, id: &str, answers: &[usize]) {
    llm.push(&quiz(&[0, 1]));
    llm.push("Nice work.");
    session.begin_quiz(id).unwrap();
    for (i, a) in answers.iter().enumerate() {
        session.answer(i, *a).unwrap();
    }
}

#[test]
fn given_topic_when_starting_then_level_one_is_seeded() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);

    // Act
    session.start("  Rust ").unwrap();

    // Assert
    assert_eq!(session.topic(), "Rust");
    assert_eq!(session.level().unwrap().number, 1);
    assert_eq!(status(&session, "b"), NodeStatus::Completed);
    assert_eq!(status(&session, "l1"), NodeStatus::Available);
    assert_eq!(status(&session, "l2"), NodeStatus::Locked);
    let available: Vec<&str> = session.available_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(available, vec!["l1"]);
    assert!(llm.last_prompt().user.contains("\"Rust\""));
}

#[test]
fn given_generation_failure_when_starting_then_previous_map_kept() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    session.toggle_collapse("b").unwrap();
    llm.push("not json at all");

    // Act
    let result = session.start("Go");

    // Assert
    assert!(matches!(result, Err(ApplicationError::Generation(_))));
    assert_eq!(session.topic(), "Rust");
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.view().is_collapsed("b"));
    assert_eq!(session.level().unwrap().store.len(), 4);
}

#[test]
fn given_locked_node_when_opening_quiz_then_rejected_without_generation() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    let calls = llm.prompts.lock().unwrap().len();

    // Act
    let locked = session.begin_quiz("l2").map(|_| ());
    let scaffolding = session.begin_quiz("b").map(|_| ());

    // Assert
    assert!(matches!(
        locked,
        Err(ApplicationError::NodeNotPlayable {
            status: NodeStatus::Locked,
            ..
        })
    ));
    assert!(matches!(
        scaffolding,
        Err(ApplicationError::NodeNotPlayable {
            status: NodeStatus::Completed,
            ..
        })
    ));
    assert_eq!(llm.prompts.lock().unwrap().len(), calls);
}

#[test]
fn given_quiz_in_progress_when_starting_other_work_then_busy() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    llm.push(&quiz(&[0, 1]));
    session.begin_quiz("l1").unwrap();

    // Act
    let restart = session.start("Go");
    let second = session.begin_quiz("l1").map(|_| ());

    // Assert
    assert_eq!(session.phase(), SessionPhase::InQuiz);
    assert!(matches!(restart, Err(ApplicationError::Busy(_))));
    assert!(matches!(second, Err(ApplicationError::Busy(_))));
}

#[test]
fn given_answered_quiz_when_finishing_then_node_completed_and_next_leaf_unlocked() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    play(&mut session, &llm, "l1", &[0, 3]);

    // Act
    let report = session.finish_quiz().unwrap();

    // Assert
    assert_eq!((report.correct, report.total), (1, 2));
    assert_eq!(report.outcome.stars.value(), 2);
    assert_eq!(report.outcome.unlocked.as_deref(), Some("l2"));
    assert!(!report.outcome.level_complete);
    assert_eq!(report.summary.as_deref(), Some("Nice work."));
    assert_eq!(status(&session, "l1"), NodeStatus::Completed);
    assert_eq!(status(&session, "l2"), NodeStatus::Available);
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(session.quiz().is_none());
}

#[test]
fn given_summary_failure_when_finishing_then_completion_still_recorded() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    llm.push(&quiz(&[0, 1]));
    session.begin_quiz("l1").unwrap();
    session.answer(0, 0).unwrap();
    session.answer(1, 1).unwrap();
    llm.push_failure("timeout");

    // Act
    let report = session.finish_quiz().unwrap();

    // Assert
    assert_eq!(report.summary, None);
    assert_eq!(report.outcome.stars.value(), 3);
    assert_eq!(status(&session, "l1"), NodeStatus::Completed);
}

#[test]
fn given_abandoned_quiz_when_returning_then_node_still_available() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    llm.push(&quiz(&[0, 1]));
    session.begin_quiz("l1").unwrap();

    // Act
    session.abandon_quiz().unwrap();

    // Assert
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert_eq!(status(&session, "l1"), NodeStatus::Available);
    assert!(matches!(session.finish_quiz(), Err(ApplicationError::NoQuiz)));
}

#[test]
fn given_incomplete_level_when_advancing_then_rejected() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();

    // Act
    let result = session.advance_level();

    // Assert
    assert!(matches!(result, Err(ApplicationError::LevelIncomplete { level: 1 })));
}

#[test]
fn given_completed_level_when_advancing_then_next_level_replaces_map_with_context() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    play(&mut session, &llm, "l1", &[0, 1]);
    session.finish_quiz().unwrap();
    play(&mut session, &llm, "l2", &[0, 1]);
    let report = session.finish_quiz().unwrap();
    assert!(report.outcome.level_complete);
    session.toggle_collapse("b").unwrap();
    llm.push(LEVEL_TWO);

    // Act
    session.advance_level().unwrap();

    // Assert
    let level = session.level().unwrap();
    assert_eq!(level.number, 2);
    assert_eq!(level.store.len(), 2);
    assert_eq!(status(&session, "x"), NodeStatus::Available);
    assert!(session.view().collapsed().is_empty());
    let prompt = llm.last_prompt().user;
    assert!(prompt.contains("stage 2"));
    assert!(prompt.contains("Moves, Borrowing"));
}

#[test]
fn given_view_change_when_polling_then_connectors_recomputed_once_after_delay() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm);
    session.start("Rust").unwrap();
    let now = Instant::now();

    // Act
    let settled = session.poll_connectors(now + Duration::from_secs(1)).map(<[_]>::len);
    let again = session.poll_connectors(now + Duration::from_secs(2)).is_some();
    session.toggle_collapse("b").unwrap();
    let early = session.poll_connectors(Instant::now()).is_some();
    let collapsed = session
        .poll_connectors(Instant::now() + Duration::from_secs(1))
        .map(<[_]>::len);

    // Assert
    assert_eq!(settled, Some(3));
    assert!(!again);
    assert!(!early);
    assert_eq!(collapsed, Some(1));
    assert_eq!(session.cached_connectors().len(), 1);
}

#[test]
fn given_empty_topic_when_starting_then_invalid_input() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    let mut session = session(&llm);

    // Act
    let result = session.start("   ");

    // Assert
    assert!(matches!(result, Err(ApplicationError::InvalidInput(_))));
    assert!(llm.prompts.lock().unwrap().is_empty());
}

#[test]
fn given_phase_observer_when_generating_then_loading_brackets_every_request() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    llm.push(&quiz(&[0, 1]));
    llm.push_failure("model offline");
    let mut session = session(&llm);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    session.on_phase_change(move |phase| sink.lock().unwrap().push(phase));

    // Act
    session.start("Rust").unwrap();
    session.begin_quiz("l1").unwrap();
    session.abandon_quiz().unwrap();
    let failed = session.start("Go");

    // Assert
    assert!(failed.is_err());
    use SessionPhase::{Idle, InQuiz, Loading};
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Loading, Idle, Loading, Idle, InQuiz, Idle, Loading, Idle]
    );
    assert_eq!(session.phase(), Idle);
}

#[test]
fn given_installed_level_when_resetting_view_then_pan_returns_to_centred_offset() {
    // Arrange
    let llm = Arc::new(ScriptedLlm::default());
    llm.push(LEVEL_ONE);
    let mut session = session(&llm).with_viewport(1000.0, 600.0);
    session.start("Rust").unwrap();
    let level = session.level().unwrap();
    let expected = Layout::compute(LayoutStyle::Indented, &level.tree, &ViewState::default())
        .centring_offset(1000.0, 600.0);
    let centred = session.view().pan();

    // Act
    session.pan_by(40.0, -25.0);
    session.zoom_in();
    session.reset_view();

    // Assert
    assert_eq!(centred, expected);
    assert_ne!(centred, Point::ORIGIN);
    assert_eq!(session.view().pan(), expected);
    assert_eq!(session.view().zoom(), 1.0);
}
