//! Background execution of document rules.
//!
//! A rule flagged to run in the background is turned into a job whose payload
//! carries only what is needed to find the work again:
//!
//! ```text
//! { "ruleId": "createPDF", "documentId": "<uuid>", "workspace": "default" }
//! ```
//!
//! By the time a worker picks the job up, the triggering session is gone. The
//! job therefore opens its own system session in the payload's workspace,
//! re-resolves the document by id and runs the same
//! resolve -> applicability -> execute path as inline dispatch.
//!
//! From the scheduler's point of view a document rule job always completes.
//! Resolution failures, rule failures and save failures show up in the log
//! only.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docrules_core::{
    ContentRepository, DocumentHandle, DocumentId, RuleId, Session, WorkspaceName,
};
use docrules_rules::{ExecutionMode, RuleExecutionRequest, RuleOutcome, RuleRegistry, execute_rule};

use super::executor::JobExecutor;
use super::scheduler::{BackgroundScheduler, SchedulerError};
use super::store::JobStore;
use super::types::{Job, JobId, JobKind, JobResult, JobSpec};

/// Job payload of a deferred rule execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleJobPayload {
    pub rule_id: RuleId,
    pub document_id: DocumentId,
    #[serde(default)]
    pub workspace: WorkspaceName,
}

impl RuleJobPayload {
    pub fn from_request(request: &RuleExecutionRequest) -> Self {
        Self {
            rule_id: request.rule_id.clone(),
            document_id: request.document.document_id,
            workspace: request.document.workspace.clone(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("rule {0} was not requested as a background job")]
    NotBackground(RuleId),
    #[error("job payload could not be encoded: {0}")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Bridge between rule dispatch and the background scheduler.
pub struct DocumentRuleJob {
    registry: Arc<dyn RuleRegistry>,
    repository: Arc<dyn ContentRepository>,
    scheduler: Arc<dyn BackgroundScheduler>,
    default_workspace: WorkspaceName,
}

impl DocumentRuleJob {
    pub const DEFAULT_WORKSPACE: &'static str = "default";

    pub fn new(
        registry: Arc<dyn RuleRegistry>,
        repository: Arc<dyn ContentRepository>,
        scheduler: Arc<dyn BackgroundScheduler>,
    ) -> Self {
        Self {
            registry,
            repository,
            scheduler,
            default_workspace: WorkspaceName::new(Self::DEFAULT_WORKSPACE),
        }
    }

    /// Workspace used when a payload carries none.
    pub fn with_default_workspace(mut self, workspace: WorkspaceName) -> Self {
        self.default_workspace = workspace;
        self
    }

    /// Hand a background request to the scheduler. Returns once the job is
    /// queued.
    pub fn submit(
        &self,
        request: &RuleExecutionRequest,
        document_name: &str,
    ) -> Result<JobId, BridgeError> {
        if request.mode != ExecutionMode::Background {
            return Err(BridgeError::NotBackground(request.rule_id.clone()));
        }

        let payload = RuleJobPayload::from_request(request).to_json()?;
        let spec = JobSpec::new(
            format!("Document rule {} for {}", request.rule_id, document_name),
            JobKind::DocumentRule,
            payload,
        );
        Ok(self.scheduler.schedule_job_now(spec)?)
    }

    /// Run a deferred request in a fresh system session.
    ///
    /// Never fails: every problem is logged and reported as
    /// [`RuleOutcome::Failed`].
    pub fn resume(&self, payload: &RuleJobPayload) -> RuleOutcome {
        let workspace = if payload.workspace.is_empty() {
            &self.default_workspace
        } else {
            &payload.workspace
        };
        let rule_id = &payload.rule_id;
        let timer = Instant::now();

        let session = match self.repository.system_session(workspace) {
            Ok(session) => session,
            Err(e) => {
                error!(
                    rule_id = %rule_id,
                    workspace = %workspace,
                    error = %e,
                    "unable to open system session for document rule job"
                );
                return RuleOutcome::failed(e);
            }
        };

        let outcome = run_in_session(&*self.registry, session.as_ref(), payload);
        debug!(
            rule_id = %rule_id,
            document_id = %payload.document_id,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            outcome = ?outcome,
            "document rule job finished"
        );
        outcome
    }

    /// Executor entry point. Always reports success to the scheduler.
    pub fn handle(&self, job: &Job) -> JobResult {
        match RuleJobPayload::from_json(&job.payload) {
            Ok(payload) => {
                self.resume(&payload);
            }
            Err(e) => {
                error!(
                    job_id = %job.id,
                    job = %job.name,
                    error = %e,
                    "malformed document rule job payload"
                );
            }
        }
        JobResult::Success
    }

    /// Install this bridge as the executor's handler for document rule jobs.
    pub fn register<S: JobStore + 'static>(self: &Arc<Self>, executor: &mut JobExecutor<S>) {
        let bridge = Arc::clone(self);
        executor.register_handler(JobKind::DOCUMENT_RULE, move |job| bridge.handle(job));
    }
}

fn run_in_session(
    registry: &dyn RuleRegistry,
    session: &dyn Session,
    payload: &RuleJobPayload,
) -> RuleOutcome {
    let rule_id = &payload.rule_id;

    let document = match DocumentHandle::load(session, payload.document_id) {
        Ok(document) => document,
        Err(e) => {
            error!(
                rule_id = %rule_id,
                document_id = %payload.document_id,
                error = %e,
                "unable to resolve document for rule job"
            );
            return RuleOutcome::failed(e);
        }
    };

    let outcome = match execute_rule(registry, &document, rule_id) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(
                rule_id = %rule_id,
                document = %document.path(),
                error = %e,
                "error executing rule on the document node"
            );
            return RuleOutcome::failed(e);
        }
    };

    if let Err(e) = session.save() {
        error!(
            rule_id = %rule_id,
            document = %document.path(),
            error = %e,
            "unable to save session after document rule job"
        );
        return RuleOutcome::failed(e);
    }

    outcome
}

impl core::fmt::Debug for DocumentRuleJob {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DocumentRuleJob")
            .field("default_workspace", &self.default_workspace)
            .finish_non_exhaustive()
    }
}
