//! Core job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use docrules_core::JobId;

/// Job kind/type for routing to the appropriate handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Deferred document rule execution.
    DocumentRule,
    /// Generic/custom job
    Custom { kind: String },
}

impl JobKind {
    pub const DOCUMENT_RULE: &'static str = "docrules.document_rule";

    pub fn custom(kind: impl Into<String>) -> Self {
        Self::Custom { kind: kind.into() }
    }

    pub fn type_name(&self) -> &str {
        match self {
            JobKind::DocumentRule => Self::DOCUMENT_RULE,
            JobKind::Custom { kind } => kind,
        }
    }
}

/// Job execution status.
///
/// `Pending -> Running -> Completed`. `Failed` is only reached when no
/// handler exists for the job kind or a handler reports failure; there are
/// no retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, waiting to be picked up
    Pending,
    /// Currently being executed
    Running,
    /// Handler returned
    Completed,
    /// No handler, or the handler reported failure
    Failed { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed { .. })
    }
}

/// What a caller hands to the scheduler: a display name, a routing kind and a
/// flat JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub kind: JobKind,
    pub payload: serde_json::Value,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, kind: JobKind, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind,
            payload,
        }
    }
}

/// A background job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,
    /// Human-readable name, for logs
    pub name: String,
    /// Job kind for routing
    pub kind: JobKind,
    /// JSON payload
    pub payload: serde_json::Value,
    /// Current status
    pub status: JobStatus,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// When the job was last updated
    pub updated_at: DateTime<Utc>,
    /// When the handler was invoked
    pub started_at: Option<DateTime<Utc>>,
    /// Handler duration, once terminal
    pub duration_ms: Option<u64>,
}

impl Job {
    /// Create a pending job from a spec.
    pub fn new(spec: JobSpec) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            name: spec.name,
            kind: spec.kind,
            payload: spec.payload,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            duration_ms: None,
        }
    }

    /// Mark job as running.
    pub fn mark_running(&mut self) {
        let now = Utc::now();
        self.status = JobStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Mark job as completed.
    pub fn mark_completed(&mut self) {
        self.finish(JobStatus::Completed);
    }

    /// Mark job as failed.
    pub fn mark_failed(&mut self, error: String) {
        self.finish(JobStatus::Failed { error });
    }

    fn finish(&mut self, status: JobStatus) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        self.duration_ms = self
            .started_at
            .map(|started| (now - started).num_milliseconds().max(0) as u64);
    }
}

/// Result of job execution.
#[derive(Debug, PartialEq, Eq)]
pub enum JobResult {
    /// Job completed
    Success,
    /// Job failed with an error
    Failure(String),
}
