//! Unlock engine: status transitions driven by quiz completion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{KnowledgeNode, NodeKind, NodeStatus, NodeStore, Stars};

/// Ordering used to pick the node unlocked after a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnlockPolicy {
    /// All nodes form one sequence in input order.
    FlatSequence,
    /// Only `leaf` nodes form the sequence; roots and branches are scaffolding.
    TypedLeaf,
}

impl UnlockPolicy {
    /// Typed-leaf as soon as any node carries a hierarchy role.
    pub fn infer(nodes: &[KnowledgeNode]) -> Self {
        if nodes.iter().any(|n| n.kind.is_some()) {
            UnlockPolicy::TypedLeaf
        } else {
            UnlockPolicy::FlatSequence
        }
    }
}

impl fmt::Display for UnlockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnlockPolicy::FlatSequence => write!(f, "flat-sequence"),
            UnlockPolicy::TypedLeaf => write!(f, "typed-leaf"),
        }
    }
}

impl FromStr for UnlockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat-sequence" | "flat" => Ok(UnlockPolicy::FlatSequence),
            "typed-leaf" | "typed" => Ok(UnlockPolicy::TypedLeaf),
            other => Err(format!("unknown unlock policy: {other}")),
        }
    }
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub stars: Stars,
    /// Node that moved from `Locked` to `Available`, if any
    pub unlocked: Option<String>,
    /// Every node of the sequence is completed; advisory only
    pub level_complete: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct UnlockEngine {
    policy: UnlockPolicy,
}

impl UnlockEngine {
    pub fn new(policy: UnlockPolicy) -> Self {
        Self { policy }
    }

    /// Engine whose policy matches the shape of `store`.
    pub fn for_store(store: &NodeStore) -> Self {
        Self::new(UnlockPolicy::infer(store.nodes()))
    }

    pub fn policy(&self) -> UnlockPolicy {
        self.policy
    }

    /// Initialise a freshly generated level.
    ///
    /// Flat: the first node is available, everything else locked.
    /// Typed: roots and branches are completed scaffolding, the first leaf
    /// is available and the remaining leaves are locked.
    #[instrument(level = "debug", skip(self, store))]
    pub fn seed(&self, store: &mut NodeStore) -> DomainResult<()> {
        store.lock_all();
        let scaffolding: Vec<String> = match self.policy {
            UnlockPolicy::FlatSequence => Vec::new(),
            UnlockPolicy::TypedLeaf => store
                .iter()
                .filter(|n| matches!(n.kind, Some(NodeKind::Root) | Some(NodeKind::Branch)))
                .map(|n| n.id.clone())
                .collect(),
        };
        for id in &scaffolding {
            store.complete_scaffolding(id)?;
        }
        if let Some(first) = self.sequence(store).first().cloned() {
            store.force_available(&first)?;
        }
        debug!(
            "seed: policy={} scaffolding={} available={}",
            self.policy,
            scaffolding.len(),
            store.count(NodeStatus::Available)
        );
        Ok(())
    }

    /// Complete an available node with a quiz result.
    ///
    /// Fails without touching the store when the node is unknown, not
    /// `Available`, or the quiz was empty.
    #[instrument(level = "debug", skip(self, store))]
    pub fn complete_node(
        &self,
        store: &mut NodeStore,
        id: &str,
        correct: u32,
        total: u32,
    ) -> DomainResult<CompletionOutcome> {
        let status = store.status(id)?;
        if status != NodeStatus::Available {
            return Err(DomainError::InvalidState {
                id: id.to_string(),
                status,
                expected: NodeStatus::Available,
            });
        }
        let stars = Stars::from_score(correct, total).ok_or_else(|| DomainError::InvalidQuizSize {
            id: id.to_string(),
            total,
        })?;

        store.complete(id, stars)?;

        let sequence = self.sequence(store);
        let unlocked = match sequence.iter().position(|s| s == id) {
            Some(pos) => match sequence.get(pos + 1) {
                Some(next) if store.status(next)? == NodeStatus::Locked => {
                    store.unlock(next)?;
                    Some(next.clone())
                }
                _ => None,
            },
            None => None,
        };

        let level_complete = self.is_level_complete(store);
        if level_complete {
            info!("level complete after {}", id);
        }
        Ok(CompletionOutcome {
            stars,
            unlocked,
            level_complete,
        })
    }

    /// Every node of the unlock sequence is completed.
    pub fn is_level_complete(&self, store: &NodeStore) -> bool {
        let sequence = self.sequence(store);
        !sequence.is_empty()
            && sequence
                .iter()
                .all(|id| store.get(id).is_some_and(|n| n.status == NodeStatus::Completed))
    }

    /// Ids forming the unlock sequence under the current policy, in input order.
    pub fn sequence(&self, store: &NodeStore) -> Vec<String> {
        match self.policy {
            UnlockPolicy::FlatSequence => store.iter().map(|n| n.id.clone()).collect(),
            UnlockPolicy::TypedLeaf => store.leaves().map(|n| n.id.clone()).collect(),
        }
    }
}
