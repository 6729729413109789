//! Prompt builders for the content generation requests.

use crate::domain::{KnowledgeNode, QUIZ_OPTION_COUNT};

pub const SYSTEM_PROMPT: &str = "You are a patient tutor who designs structured learning maps \
and fair multiple-choice quizzes. Answer with JSON only when JSON is requested.";

/// A system/user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    fn new(user: String) -> Self {
        Self {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

/// Knowledge map request. `context` lists what the learner already mastered.
pub fn graph_prompt(topic: &str, level: u32, context: &str) -> Prompt {
    let context = if context.trim().is_empty() {
        "The learner is starting from scratch.".to_string()
    } else {
        format!("The learner already mastered: {context}. Go one step deeper.")
    };
    Prompt::new(format!(
        "Build stage {level} of a knowledge map for the topic \"{topic}\". {context}\n\
         Return a JSON array of nodes. Each node has: \"id\" (unique string), \"label\", \
         \"description\" (one sentence), \"parentId\" (id of the parent node or null), \
         \"type\" (\"root\", \"branch\" or \"leaf\"), \"level\" ({level}) and \"dependencies\" \
         (array of node ids). Use exactly one root, 2 to 4 branches under it and 2 to 3 leaves \
         under each branch. List nodes so that leaves appear in learning order."
    ))
}

/// Quiz request for one node.
pub fn quiz_prompt(node: &KnowledgeNode, topic: &str, question_count: usize) -> Prompt {
    Prompt::new(format!(
        "Write {question_count} multiple-choice questions about \"{label}\" ({description}) \
         within the topic \"{topic}\".\n\
         Return a JSON array. Each question has: \"id\" (unique string), \"text\", \"options\" \
         (exactly {QUIZ_OPTION_COUNT} strings), \"correctIndex\" (0-based index of the right \
         option) and \"explanation\" (why the answer is right).",
        label = node.label,
        description = node.description,
    ))
}

/// Short feedback after a quiz.
pub fn summary_prompt(correct: u32, total: u32, label: &str) -> Prompt {
    Prompt::new(format!(
        "The learner answered {correct} of {total} questions about \"{label}\" correctly. \
         Write two or three encouraging sentences of feedback in plain text, naming what to \
         review if anything was missed."
    ))
}
