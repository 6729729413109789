//! Learning session service
//!
//! Owns the node store, hierarchy and view state of one browsing session and
//! drives generation, quizzes and unlocking.

use std::time::{Duration, Instant};

use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::application::services::content::ContentService;
use crate::application::services::quiz::{AnswerFeedback, QuizRun};
use crate::application::{ApplicationError, ApplicationResult, GenerationError};
use crate::domain::{
    compute_connectors, CompletionOutcome, Connector, Debounce, DomainError, KnowledgeNode,
    Layout, LayoutStyle, NodeStatus, NodeStore, Point, ScreenProjection, TreeArena, TreeBuilder,
    UnlockEngine, UnlockPolicy, ViewState, DEFAULT_VIEWPORT,
};

/// What the session is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    /// A generation request is in flight
    Loading,
    InQuiz,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading => write!(f, "loading"),
            SessionPhase::InQuiz => write!(f, "in quiz"),
        }
    }
}

/// Called with every phase the session enters.
pub type PhaseObserver = Box<dyn FnMut(SessionPhase) + Send>;

/// One generated level and its derived hierarchy.
#[derive(Debug)]
pub struct Level {
    pub number: u32,
    pub store: NodeStore,
    pub tree: TreeArena,
    pub engine: UnlockEngine,
}

impl Level {
    fn from_nodes(number: u32, nodes: Vec<KnowledgeNode>) -> ApplicationResult<Self> {
        let mut store = NodeStore::new(nodes)?;
        let engine = UnlockEngine::for_store(&store);
        engine.seed(&mut store)?;
        let tree = TreeBuilder::new().build(store.nodes());
        Ok(Self {
            number,
            store,
            tree,
            engine,
        })
    }

    pub fn policy(&self) -> UnlockPolicy {
        self.engine.policy()
    }

    pub fn is_complete(&self) -> bool {
        self.engine.is_level_complete(&self.store)
    }

    /// Labels of completed quiz targets, in input order.
    pub fn mastered_labels(&self) -> Vec<&str> {
        let sequence = self.engine.sequence(&self.store);
        sequence
            .iter()
            .filter_map(|id| self.store.get(id))
            .filter(|n| n.status == NodeStatus::Completed)
            .map(|n| n.label.as_str())
            .collect()
    }
}

/// Result of a finished quiz.
#[derive(Debug, Clone)]
pub struct QuizReport {
    pub node_id: String,
    pub correct: u32,
    pub total: u32,
    pub outcome: CompletionOutcome,
    /// Feedback text; `None` when the summary request failed
    pub summary: Option<String>,
}

/// One topic explored level by level.
pub struct LearningSession {
    content: ContentService,
    topic: String,
    phase: SessionPhase,
    phase_observer: Option<PhaseObserver>,
    level: Option<Level>,
    quiz: Option<QuizRun>,
    view: ViewState,
    layout_style: LayoutStyle,
    viewport: (f64, f64),
    debounce: Debounce,
    connectors: Vec<Connector>,
}

impl LearningSession {
    pub fn new(content: ContentService, layout_style: LayoutStyle, debounce: Duration) -> Self {
        Self {
            content,
            topic: String::new(),
            phase: SessionPhase::Idle,
            phase_observer: None,
            level: None,
            quiz: None,
            view: ViewState::default(),
            layout_style,
            viewport: DEFAULT_VIEWPORT,
            debounce: Debounce::new(debounce),
            connectors: Vec::new(),
        }
    }

    /// Screen size used to centre every newly installed level.
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    /// Report phase changes, e.g. to show progress while content is generated.
    pub fn on_phase_change(&mut self, observer: impl FnMut(SessionPhase) + Send + 'static) {
        self.phase_observer = Some(Box::new(observer));
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn quiz(&self) -> Option<&QuizRun> {
        self.quiz.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn layout_style(&self) -> LayoutStyle {
        self.layout_style
    }

    pub fn set_layout_style(&mut self, style: LayoutStyle) {
        self.layout_style = style;
        self.invalidate();
    }

    /// Generate level 1 of `topic`, replacing any previous map.
    #[instrument(level = "debug", skip(self))]
    pub fn start(&mut self, topic: &str) -> ApplicationResult<()> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ApplicationError::InvalidInput("topic is empty".to_string()));
        }
        self.ensure_idle("start a topic")?;
        let nodes = self.generate(|content| content.generate_graph(topic, 1, ""))?;
        self.install(topic.to_string(), Level::from_nodes(1, nodes)?);
        Ok(())
    }

    /// Generate the next level once every quiz target of the current one is completed.
    #[instrument(level = "debug", skip(self))]
    pub fn advance_level(&mut self) -> ApplicationResult<()> {
        self.ensure_idle("generate the next level")?;
        let level = self.level.as_ref().ok_or(ApplicationError::NoLevel)?;
        if !level.is_complete() {
            return Err(ApplicationError::LevelIncomplete {
                level: level.number,
            });
        }
        let next = level.number + 1;
        let context = level.mastered_labels().iter().join(", ");
        let topic = self.topic.clone();
        let nodes = self.generate(|content| content.generate_graph(&topic, next, &context))?;
        self.install(topic, Level::from_nodes(next, nodes)?);
        Ok(())
    }

    /// Open the quiz of an available node.
    #[instrument(level = "debug", skip(self))]
    pub fn begin_quiz(&mut self, node_id: &str) -> ApplicationResult<&QuizRun> {
        self.ensure_idle("open a quiz")?;
        let level = self.level.as_ref().ok_or(ApplicationError::NoLevel)?;
        let node = level
            .store
            .get(node_id)
            .ok_or_else(|| DomainError::UnknownNode(node_id.to_string()))?
            .clone();
        if node.status != NodeStatus::Available {
            return Err(ApplicationError::NodeNotPlayable {
                id: node.id,
                status: node.status,
            });
        }
        let topic = self.topic.clone();
        let questions = self.generate(|content| content.generate_quiz(&node, &topic))?;
        debug!("begin_quiz: {} questions for {}", questions.len(), node.id);
        self.set_phase(SessionPhase::InQuiz);
        Ok(self.quiz.insert(QuizRun::new(node.id, questions)))
    }

    pub fn answer(&mut self, question: usize, choice: usize) -> ApplicationResult<AnswerFeedback> {
        self.quiz
            .as_mut()
            .ok_or(ApplicationError::NoQuiz)?
            .answer(question, choice)
    }

    /// Leave the current quiz without scoring it.
    pub fn abandon_quiz(&mut self) -> ApplicationResult<()> {
        let quiz = self.quiz.take().ok_or(ApplicationError::NoQuiz)?;
        debug!("abandon_quiz: {}", quiz.node_id());
        self.set_phase(SessionPhase::Idle);
        Ok(())
    }

    /// Score the current quiz, complete its node and fetch a summary.
    #[instrument(level = "debug", skip(self))]
    pub fn finish_quiz(&mut self) -> ApplicationResult<QuizReport> {
        let quiz = self.quiz.as_ref().ok_or(ApplicationError::NoQuiz)?;
        let level = self.level.as_mut().ok_or(ApplicationError::NoLevel)?;
        let (node_id, correct, total) =
            (quiz.node_id().to_string(), quiz.correct_count(), quiz.total());
        if !quiz.is_finished() {
            debug!("finish_quiz: unanswered questions of {} count as wrong", node_id);
        }

        let outcome = level
            .engine
            .complete_node(&mut level.store, &node_id, correct, total)?;
        let label = level
            .store
            .get(&node_id)
            .map(|n| n.label.clone())
            .unwrap_or_default();
        self.quiz = None;
        self.set_phase(SessionPhase::Idle);
        self.invalidate();
        info!("completed {} with {} ({}/{})", node_id, outcome.stars, correct, total);

        let summary = match self.content.generate_summary(correct, total, &label) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("summary for {} unavailable: {}", node_id, e);
                None
            }
        };
        Ok(QuizReport {
            node_id,
            correct,
            total,
            outcome,
            summary,
        })
    }

    /// Nodes that can be played right now.
    pub fn available_nodes(&self) -> Vec<&KnowledgeNode> {
        self.level
            .iter()
            .flat_map(|l| l.store.iter())
            .filter(|n| n.status == NodeStatus::Available)
            .collect()
    }

    pub fn toggle_collapse(&mut self, id: &str) -> ApplicationResult<bool> {
        let level = self.level.as_ref().ok_or(ApplicationError::NoLevel)?;
        if !level.tree.contains(id) {
            return Err(DomainError::UnknownNode(id.to_string()).into());
        }
        let collapsed = self.view.toggle_collapse(id);
        self.invalidate();
        Ok(collapsed)
    }

    pub fn expand_all(&mut self) {
        self.view.expand_all();
        self.invalidate();
    }

    pub fn collapse_all(&mut self) {
        if let Some(level) = &self.level {
            self.view.collapse_all(level.store.iter().map(|n| n.id.clone()));
            self.invalidate();
        }
    }

    pub fn adjust_zoom(&mut self, delta: f64) -> f64 {
        let zoom = self.view.adjust_zoom(delta);
        self.invalidate();
        zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        let zoom = self.view.zoom_in();
        self.invalidate();
        zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        let zoom = self.view.zoom_out();
        self.invalidate();
        zoom
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.pan_by(dx, dy);
    }

    pub fn begin_drag(&mut self, pointer: Point) {
        self.view.begin_drag(pointer);
    }

    pub fn drag_to(&mut self, pointer: Point) {
        self.view.drag_to(pointer);
    }

    pub fn end_drag(&mut self) {
        self.view.end_drag();
    }

    pub fn reset_view(&mut self) {
        self.view.reset_view();
        self.invalidate();
    }

    /// Layout of the rendered part of the current level.
    pub fn layout(&self) -> Option<Layout> {
        self.level
            .as_ref()
            .map(|l| Layout::compute(self.layout_style, &l.tree, &self.view))
    }

    /// Connectors measured against the current layout.
    pub fn connectors(&self) -> Vec<Connector> {
        let Some(level) = &self.level else {
            return Vec::new();
        };
        let layout = Layout::compute(self.layout_style, &level.tree, &self.view);
        let projection = ScreenProjection::new(&layout, &self.view);
        compute_connectors(&level.store, &level.tree, &self.view, &projection)
    }

    /// Recompute connectors once the settle delay has passed since the last change.
    ///
    /// Returns the fresh connectors when a recomputation happened.
    pub fn poll_connectors(&mut self, now: Instant) -> Option<&[Connector]> {
        if !self.debounce.fire(now) {
            return None;
        }
        self.connectors = self.connectors();
        Some(&self.connectors)
    }

    /// Connectors from the last recomputation.
    pub fn cached_connectors(&self) -> &[Connector] {
        &self.connectors
    }

    fn ensure_idle(&self, action: &str) -> ApplicationResult<()> {
        match self.phase {
            SessionPhase::InQuiz => Err(ApplicationError::Busy(format!(
                "cannot {action} during a quiz"
            ))),
            // A request in flight holds `&mut self`, so callers never observe `Loading` here.
            SessionPhase::Idle | SessionPhase::Loading => Ok(()),
        }
    }

    fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
        if let Some(observer) = self.phase_observer.as_mut() {
            observer(phase);
        }
    }

    /// Run one generation request in the loading phase. Nothing else changes on failure.
    ///
    /// The `&mut self` borrow spans the whole request, which keeps generations exclusive.
    fn generate<T>(
        &mut self,
        request: impl FnOnce(&ContentService) -> Result<T, GenerationError>,
    ) -> ApplicationResult<T> {
        self.set_phase(SessionPhase::Loading);
        let result = request(&self.content);
        self.set_phase(SessionPhase::Idle);
        Ok(result?)
    }

    fn install(&mut self, topic: String, level: Level) {
        info!(
            "level {} of '{}': {} nodes, policy {}",
            level.number,
            topic,
            level.store.len(),
            level.policy()
        );
        let (width, height) = self.viewport;
        let centre = Layout::compute(self.layout_style, &level.tree, &ViewState::default())
            .centring_offset(width, height);
        debug!("install: centring at {:.0},{:.0}", centre.x, centre.y);
        self.topic = topic;
        self.level = Some(level);
        self.quiz = None;
        self.view = ViewState::new(centre);
        self.connectors.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.debounce.invalidate(Instant::now());
    }
}
