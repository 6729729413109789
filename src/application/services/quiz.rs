//! One quiz attempt on a node.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::QuizQuestion;

/// Feedback for a single answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_index: usize,
    pub explanation: String,
}

/// Questions and answers of one attempt. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct QuizRun {
    node_id: String,
    questions: Vec<QuizQuestion>,
    answers: Vec<Option<usize>>,
}

impl QuizRun {
    pub fn new(node_id: impl Into<String>, questions: Vec<QuizQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            node_id: node_id.into(),
            questions,
            answers,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Record the chosen option. Each question is answered once.
    pub fn answer(&mut self, question: usize, choice: usize) -> ApplicationResult<AnswerFeedback> {
        let q = self.questions.get(question).ok_or_else(|| {
            ApplicationError::InvalidInput(format!("no question {}", question + 1))
        })?;
        if choice >= q.options.len() {
            return Err(ApplicationError::InvalidInput(format!(
                "option {} out of range 1..={}",
                choice + 1,
                q.options.len()
            )));
        }
        if self.answers[question].is_some() {
            return Err(ApplicationError::InvalidInput(format!(
                "question {} already answered",
                question + 1
            )));
        }
        self.answers[question] = Some(choice);
        Ok(AnswerFeedback {
            correct: q.is_correct(choice),
            correct_index: q.correct_index,
            explanation: q.explanation.clone(),
        })
    }

    /// First unanswered question.
    pub fn next_unanswered(&self) -> Option<usize> {
        self.answers.iter().position(Option::is_none)
    }

    pub fn is_finished(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    /// Correct answers so far; unanswered questions count as wrong.
    pub fn correct_count(&self) -> u32 {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| a.is_some_and(|c| q.is_correct(c)))
            .count() as u32
    }

    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
}
