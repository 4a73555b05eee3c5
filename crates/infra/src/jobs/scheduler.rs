//! Scheduler boundary.

use std::sync::Arc;

use tracing::debug;

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobId, JobSpec};

/// Accepts jobs for execution as soon as a worker is free.
///
/// `schedule_job_now` must not wait for the job to run.
pub trait BackgroundScheduler: Send + Sync {
    fn schedule_job_now(&self, spec: JobSpec) -> Result<JobId, SchedulerError>;
}

impl<B> BackgroundScheduler for Arc<B>
where
    B: BackgroundScheduler + ?Sized,
{
    fn schedule_job_now(&self, spec: JobSpec) -> Result<JobId, SchedulerError> {
        (**self).schedule_job_now(spec)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulerError {
    #[error("job store rejected job: {0}")]
    Store(#[from] JobStoreError),
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Scheduler that enqueues into a [`JobStore`]; a [`super::JobExecutor`]
/// polling the same store runs the jobs.
#[derive(Debug, Clone)]
pub struct QueueScheduler<S: JobStore> {
    store: S,
}

impl<S: JobStore> QueueScheduler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: JobStore> BackgroundScheduler for QueueScheduler<S> {
    fn schedule_job_now(&self, spec: JobSpec) -> Result<JobId, SchedulerError> {
        let job = Job::new(spec);
        let job_id = self.store.enqueue(job)?;
        debug!(job_id = %job_id, "job enqueued");
        Ok(job_id)
    }
}
