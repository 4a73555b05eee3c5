//! Background job system.
//!
//! ## Design
//!
//! - Jobs are typed by [`JobKind`] and carry a JSON payload
//! - Scheduling only enqueues; executor workers pick jobs up later
//! - No retry and no dead-letter queue: a job ends `Completed` or `Failed`
//! - Visibility into job status through the store
//!
//! ## Components
//!
//! - `Job`: core job abstraction with payload and lifecycle timestamps
//! - `JobStore`: persistence for jobs (in-memory here)
//! - `BackgroundScheduler`: "run this as soon as possible" entry point
//! - `JobExecutor`: runs jobs with registered handlers
//! - `DocumentRuleJob`: bridge between rule dispatch and the scheduler

pub mod document_rule;
pub mod executor;
pub mod scheduler;
pub mod store;
pub mod types;

pub use document_rule::{BridgeError, DocumentRuleJob, RuleJobPayload};
pub use executor::{ExecutorStats, JobExecutor, JobExecutorConfig, JobExecutorHandle};
pub use scheduler::{BackgroundScheduler, QueueScheduler, SchedulerError};
pub use store::{InMemoryJobStore, JobStats, JobStore, JobStoreError};
pub use types::{Job, JobId, JobKind, JobResult, JobSpec, JobStatus};
