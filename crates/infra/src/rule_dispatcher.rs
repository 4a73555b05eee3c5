//! Document rule dispatch (trigger-level orchestration).
//!
//! The upstream trigger ("a document was added") calls
//! [`RuleDispatcher::execute_rules`] with the new document. The dispatcher
//! reads which rules the parent folder enables and, per rule, either runs it
//! inline or defers it to a background job:
//!
//! ```text
//! execute_rules(document)
//!   ↓
//! 1. Load parent folder, collect rule ids from its marker mixins
//!   ↓
//! 2. For each rule id (independently)
//!      ├─ j:<id>AsBackgroundJob = true  → bridge.submit(request)   (returns at once)
//!      └─ otherwise                     → resolve → applicable? → execute (caller's session)
//!   ↓
//! 3. Record one outcome per rule id
//! ```
//!
//! Rule ids are a set; no order between them is promised. A failure while
//! handling one id is logged and recorded, and the next id is handled as if
//! nothing happened. Only loading the parent folder can fail the whole call.
//!
//! The dispatcher never saves the document's session; inline rules write into
//! the caller's unit of work.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use docrules_core::{DocumentHandle, DocumentReference, RepositoryResult, RuleId};
use docrules_rules::{
    ExecutionMode, RuleExecutionRequest, RuleOutcome, RuleRegistry, execute_rule,
};

use crate::config::DispatchConfig;
use crate::jobs::DocumentRuleJob;

/// What happened to one configured rule id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDispatch {
    pub rule_id: RuleId,
    pub mode: ExecutionMode,
    pub outcome: RuleOutcome,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Result of one `execute_rules` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub document: DocumentReference,
    pub rules: Vec<RuleDispatch>,
}

impl DispatchReport {
    fn empty(document: DocumentReference) -> Self {
        Self {
            document,
            rules: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, rule_id: &str) -> Option<&RuleDispatch> {
        self.rules.iter().find(|r| r.rule_id.as_str() == rule_id)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleDispatch> {
        self.rules.iter().filter(|r| r.outcome.is_failed())
    }
}

/// Dispatches the rules configured on a document's parent folder.
pub struct RuleDispatcher {
    registry: Arc<dyn RuleRegistry>,
    bridge: Arc<DocumentRuleJob>,
    config: DispatchConfig,
}

impl RuleDispatcher {
    pub fn new(registry: Arc<dyn RuleRegistry>, bridge: Arc<DocumentRuleJob>) -> Self {
        Self {
            registry,
            bridge,
            config: DispatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Execute the document rules defined on the parent folder.
    ///
    /// Returns `Err` only when the parent folder cannot be read. Per-rule
    /// problems (unknown id, unreadable flag, failed submission, failed rule)
    /// are logged and show up as outcomes in the report.
    pub fn execute_rules(&self, document: &DocumentHandle<'_>) -> RepositoryResult<DispatchReport> {
        let folder = document.parent()?;
        let rule_ids = configured_rule_ids(&folder, &self.config.marker_type);
        let path = document.path();

        if rule_ids.is_empty() {
            info!(
                folder = %folder.path(),
                document = %path,
                "no document rules are defined on the parent folder; skipping"
            );
            return Ok(DispatchReport::empty(document.reference()));
        }

        let mut report = DispatchReport::empty(document.reference());
        for rule_id in rule_ids {
            let timer = Instant::now();
            let (mode, outcome) = self.dispatch_one(document, &folder, &rule_id);
            let elapsed = timer.elapsed();

            match (&mode, &outcome) {
                (ExecutionMode::Background, RuleOutcome::Scheduled { job_id }) => debug!(
                    rule_id = %rule_id,
                    document = %path,
                    job_id = %job_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "document rule scheduled as a background job"
                ),
                _ => debug!(
                    rule_id = %rule_id,
                    document = %path,
                    outcome = ?outcome,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "document rule executed"
                ),
            }

            report.rules.push(RuleDispatch {
                rule_id,
                mode,
                outcome,
                elapsed,
            });
        }

        Ok(report)
    }

    fn dispatch_one(
        &self,
        document: &DocumentHandle<'_>,
        folder: &DocumentHandle<'_>,
        rule_id: &RuleId,
    ) -> (ExecutionMode, RuleOutcome) {
        let background = match self.runs_in_background(folder, rule_id) {
            Ok(background) => background,
            Err(e) => {
                warn!(
                    rule_id = %rule_id,
                    document = %document.path(),
                    error = %e,
                    "error executing document rule"
                );
                return (ExecutionMode::Inline, RuleOutcome::failed(e));
            }
        };

        if background {
            let request = RuleExecutionRequest::background(rule_id.clone(), document.reference());
            let outcome = match self.bridge.submit(&request, document.name()) {
                Ok(job_id) => RuleOutcome::Scheduled { job_id },
                Err(e) => {
                    warn!(
                        rule_id = %rule_id,
                        document = %document.path(),
                        error = %e,
                        "error scheduling document rule"
                    );
                    RuleOutcome::failed(e)
                }
            };
            return (ExecutionMode::Background, outcome);
        }

        let outcome = match execute_rule(&*self.registry, document, rule_id) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    rule_id = %rule_id,
                    document = %document.path(),
                    error = %e,
                    "error executing document rule"
                );
                RuleOutcome::failed(e)
            }
        };
        (ExecutionMode::Inline, outcome)
    }

    fn runs_in_background(
        &self,
        folder: &DocumentHandle<'_>,
        rule_id: &RuleId,
    ) -> RepositoryResult<bool> {
        let flag = self.config.background_flag(rule_id);
        match folder.property(&flag) {
            Some(value) => value.to_bool(&flag),
            None => Ok(false),
        }
    }
}

impl core::fmt::Debug for RuleDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuleDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Rule ids enabled on a folder: the names of its mixins extending
/// `marker_type` (the marker itself excluded), without namespace prefix.
pub fn configured_rule_ids(folder: &DocumentHandle<'_>, marker_type: &str) -> BTreeSet<RuleId> {
    if !folder.is_node_type(marker_type) {
        return BTreeSet::new();
    }

    folder
        .mixins()
        .iter()
        .filter(|m| m.name() != marker_type && m.is_node_type(marker_type))
        .filter_map(|m| {
            let local = m.name().split_once(':').map_or(m.name(), |(_, local)| local);
            (!local.is_empty()).then(|| RuleId::new(local))
        })
        .collect()
}
