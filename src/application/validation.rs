//! Schema validation of generated content.
//!
//! Model output is parsed into raw records and checked before anything is
//! committed. Violations become [`GenerationError`]; nothing is coerced.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::application::GenerationError;
use crate::domain::{KnowledgeNode, NodeKind, NodeStatus, QuizQuestion, Stars, QUIZ_OPTION_COUNT};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: String,
    label: String,
    description: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<NodeKind>,
    #[serde(default)]
    level: Option<u32>,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: String,
    #[serde(alias = "question")]
    text: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("valid fence regex"))
}

/// JSON payload inside model text: the first fenced block, else the trimmed text.
pub fn extract_payload(text: &str) -> &str {
    fence_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_else(|| text.trim())
}

fn parse_list<T>(text: &str, what: &str) -> Result<Vec<T>, GenerationError>
where
    T: for<'de> Deserialize<'de>,
{
    let payload = extract_payload(text);
    if payload.is_empty() {
        return Err(GenerationError::new(format!("empty {what} response")));
    }
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| GenerationError::new(format!("{what} response is not JSON: {e}")))?;
    if !value.is_array() {
        return Err(GenerationError::new(format!("{what} response is not a list")));
    }
    let items: Vec<T> = serde_json::from_value(value)
        .map_err(|e| GenerationError::new(format!("malformed {what} record: {e}")))?;
    if items.is_empty() {
        return Err(GenerationError::new(format!("{what} list is empty")));
    }
    Ok(items)
}

/// Validate a generated graph. Returned nodes are locked with no stars; `level`
/// fills in records that do not name one.
pub fn parse_graph(text: &str, level: u32) -> Result<Vec<KnowledgeNode>, GenerationError> {
    let raw: Vec<RawNode> = parse_list(text, "graph")?;

    let mut seen = HashSet::with_capacity(raw.len());
    for node in &raw {
        if node.id.trim().is_empty() {
            return Err(GenerationError::new("node with empty id"));
        }
        if node.label.trim().is_empty() {
            return Err(GenerationError::new(format!("node {} has an empty label", node.id)));
        }
        if !seen.insert(node.id.as_str()) {
            return Err(GenerationError::new(format!("duplicate node id {}", node.id)));
        }
    }

    let parents: HashMap<&str, Option<&str>> = raw
        .iter()
        .map(|n| (n.id.as_str(), n.parent_id.as_deref()))
        .collect();
    for node in &raw {
        if let Some(parent) = node.parent_id.as_deref() {
            if !parents.contains_key(parent) {
                return Err(GenerationError::new(format!(
                    "node {} references unknown parent {}",
                    node.id, parent
                )));
            }
        }
        if reaches_cycle(&node.id, &parents) {
            return Err(GenerationError::new(format!("parent chain of {} is cyclic", node.id)));
        }
    }

    if raw.iter().any(|n| n.kind.is_some()) {
        check_typed(&raw)?;
    }

    debug!("parse_graph: {} nodes accepted", raw.len());
    Ok(raw
        .into_iter()
        .map(|n| KnowledgeNode {
            id: n.id,
            label: n.label,
            description: n.description,
            status: NodeStatus::Locked,
            stars: Stars::ZERO,
            parent_id: n.parent_id,
            kind: n.kind,
            level: n.level.unwrap_or(level),
            dependencies: n.dependencies,
        })
        .collect())
}

fn reaches_cycle(start: &str, parents: &HashMap<&str, Option<&str>>) -> bool {
    let mut current = start;
    for _ in 0..parents.len() {
        match parents.get(current).copied().flatten() {
            Some(parent) if parent == start => return true,
            Some(parent) => current = parent,
            None => return false,
        }
    }
    // A chain longer than the node count must revisit a node
    true
}

fn check_typed(raw: &[RawNode]) -> Result<(), GenerationError> {
    if let Some(untyped) = raw.iter().find(|n| n.kind.is_none()) {
        return Err(GenerationError::new(format!(
            "typed graph contains untyped node {}",
            untyped.id
        )));
    }
    let roots: Vec<&RawNode> = raw.iter().filter(|n| n.kind == Some(NodeKind::Root)).collect();
    match roots.as_slice() {
        [root] if root.parent_id.is_some() => {
            return Err(GenerationError::new(format!("root {} has a parent", root.id)))
        }
        [_] => {}
        other => {
            return Err(GenerationError::new(format!(
                "typed graph needs exactly one root, found {}",
                other.len()
            )))
        }
    }
    if let Some(orphan) = raw
        .iter()
        .find(|n| n.kind != Some(NodeKind::Root) && n.parent_id.is_none())
    {
        return Err(GenerationError::new(format!("node {} has no parent", orphan.id)));
    }
    if !raw.iter().any(|n| n.kind == Some(NodeKind::Leaf)) {
        return Err(GenerationError::new("typed graph has no leaf nodes"));
    }
    Ok(())
}

/// Validate a generated quiz.
pub fn parse_quiz(text: &str) -> Result<Vec<QuizQuestion>, GenerationError> {
    let raw: Vec<RawQuestion> = parse_list(text, "quiz")?;

    let mut seen = HashSet::with_capacity(raw.len());
    for q in &raw {
        if q.text.trim().is_empty() {
            return Err(GenerationError::new(format!("question {} has no text", q.id)));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(GenerationError::new(format!("duplicate question id {}", q.id)));
        }
        if q.options.len() != QUIZ_OPTION_COUNT {
            return Err(GenerationError::new(format!(
                "question {} has {} options, expected {}",
                q.id,
                q.options.len(),
                QUIZ_OPTION_COUNT
            )));
        }
        if q.correct_index >= q.options.len() {
            return Err(GenerationError::new(format!(
                "question {} has correctIndex {} out of range",
                q.id, q.correct_index
            )));
        }
    }

    Ok(raw
        .into_iter()
        .map(|q| QuizQuestion {
            id: q.id,
            text: q.text,
            options: q.options,
            correct_index: q.correct_index,
            explanation: q.explanation,
        })
        .collect())
}

/// Validate a generated summary.
pub fn parse_summary(text: &str) -> Result<String, GenerationError> {
    let summary = text.trim();
    if summary.is_empty() {
        return Err(GenerationError::new("empty summary response"));
    }
    Ok(summary.to_string())
}
