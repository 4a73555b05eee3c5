use core::fmt;

use docrules_core::JobId;
use serde::Serialize;

/// Why a rule did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The identifier did not resolve in the registry.
    RuleNotFound,
    /// The rule declined the document.
    NotApplicable,
}

/// Outcome of one rule identifier for one document.
///
/// Outcomes are recorded, never raised: a failing rule is a `Failed` value at
/// the dispatch or job boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Skipped { reason: SkipReason },
    Succeeded,
    /// Handed to the background scheduler. The final outcome only shows up in
    /// the job's log lines.
    Scheduled { job_id: JobId },
    Failed { error: String },
}

impl RuleOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RuleOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RuleOutcome::Skipped { .. })
    }
}
