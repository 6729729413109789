//! Content generation service
//!
//! Turns prompts into validated knowledge maps, quizzes and summaries.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::application::prompts::{graph_prompt, quiz_prompt, summary_prompt};
use crate::application::validation::{parse_graph, parse_quiz, parse_summary};
use crate::application::GenerationError;
use crate::domain::{KnowledgeNode, QuizQuestion};
use crate::infrastructure::traits::LlmClient;

/// Service wrapping the model client with prompt building and output validation.
pub struct ContentService {
    llm: Arc<dyn LlmClient>,
    question_count: usize,
}

impl ContentService {
    pub fn new(llm: Arc<dyn LlmClient>, question_count: usize) -> Self {
        Self {
            llm,
            question_count: question_count.max(1),
        }
    }

    /// Generate the nodes of one level.
    ///
    /// `context` lists labels the learner already mastered; empty for level 1.
    #[instrument(level = "debug", skip(self, context))]
    pub fn generate_graph(
        &self,
        topic: &str,
        level: u32,
        context: &str,
    ) -> Result<Vec<KnowledgeNode>, GenerationError> {
        let raw = self.llm.complete(&graph_prompt(topic, level, context))?;
        let nodes = parse_graph(&raw, level).inspect_err(|e| warn!("rejected map: {}", e))?;
        debug!("generate_graph: {} nodes", nodes.len());
        Ok(nodes)
    }

    /// Generate the questions for one node.
    #[instrument(level = "debug", skip(self, node), fields(node = %node.id))]
    pub fn generate_quiz(
        &self,
        node: &KnowledgeNode,
        topic: &str,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let raw = self
            .llm
            .complete(&quiz_prompt(node, topic, self.question_count))?;
        let questions = parse_quiz(&raw).inspect_err(|e| warn!("rejected quiz: {}", e))?;
        if questions.len() != self.question_count {
            debug!(
                "generate_quiz: asked for {}, got {}",
                self.question_count,
                questions.len()
            );
        }
        Ok(questions)
    }

    pub fn generate_summary(
        &self,
        correct: u32,
        total: u32,
        label: &str,
    ) -> Result<String, GenerationError> {
        let raw = self.llm.complete(&summary_prompt(correct, total, label))?;
        parse_summary(&raw)
    }
}
