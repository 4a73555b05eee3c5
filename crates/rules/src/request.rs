use docrules_core::{DocumentReference, RuleId};
use serde::{Deserialize, Serialize};

/// Where a rule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Synchronously, inside the triggering session.
    Inline,
    /// Deferred to the background job scheduler.
    Background,
}

/// One attempt to run one rule on one document.
///
/// Built fresh per dispatch; only the background form outlives the call (as
/// a job payload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleExecutionRequest {
    pub rule_id: RuleId,
    pub document: DocumentReference,
    pub mode: ExecutionMode,
}

impl RuleExecutionRequest {
    pub fn inline(rule_id: RuleId, document: DocumentReference) -> Self {
        Self {
            rule_id,
            document,
            mode: ExecutionMode::Inline,
        }
    }

    pub fn background(rule_id: RuleId, document: DocumentReference) -> Self {
        Self {
            rule_id,
            document,
            mode: ExecutionMode::Background,
        }
    }
}
