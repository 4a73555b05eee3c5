//! Job executor: polls a store and runs jobs with registered handlers.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobKind, JobResult};

/// Job handler function type.
pub type JobHandler = Box<dyn Fn(&Job) -> JobResult + Send + Sync>;

/// Job executor configuration.
#[derive(Debug, Clone)]
pub struct JobExecutorConfig {
    /// How often an idle worker polls for new jobs
    pub poll_interval: Duration,
    /// Number of worker threads
    pub workers: usize,
    /// Name for logging and thread names
    pub name: String,
}

impl Default for JobExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            workers: 2,
            name: "docrules-jobs".to_string(),
        }
    }
}

impl JobExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct JobExecutorHandle {
    shutdown: Vec<mpsc::Sender<()>>,
    joins: Vec<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl JobExecutorHandle {
    /// Request graceful shutdown; workers finish their current job first.
    pub fn shutdown(self) {
        for tx in &self.shutdown {
            let _ = tx.send(());
        }
        for join in self.joins {
            let _ = join.join();
        }
    }

    /// Get current executor statistics.
    pub fn stats(&self) -> ExecutorStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Executor runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub current_running: usize,
}

/// Background job executor.
///
/// Polls a job store for pending jobs and executes them with registered
/// handlers. A job ends `Completed` or, when no handler matches or the handler
/// reports failure or panics, `Failed`. Nothing is retried.
pub struct JobExecutor<S: JobStore> {
    store: S,
    handlers: HashMap<String, JobHandler>,
}

impl<S: JobStore + 'static> JobExecutor<S> {
    /// Create a new executor with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            handlers: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a handler for a job kind.
    ///
    /// `kind_pattern` is an exact type name, a category (`"docrules.*"`) or
    /// `"*"`.
    pub fn register_handler<F>(&mut self, kind_pattern: impl Into<String>, handler: F)
    where
        F: Fn(&Job) -> JobResult + Send + Sync + 'static,
    {
        self.handlers.insert(kind_pattern.into(), Box::new(handler));
    }

    /// Get the handler for a job kind.
    fn get_handler(&self, kind: &JobKind) -> Option<&JobHandler> {
        // Try exact match first
        let type_name = kind.type_name();
        if let Some(h) = self.handlers.get(type_name) {
            return Some(h);
        }

        // Try category match (e.g., "docrules.*" matches "docrules.document_rule")
        for (pattern, handler) in &self.handlers {
            if let Some(prefix) = pattern.strip_suffix(".*") {
                if type_name.starts_with(prefix) {
                    return Some(handler);
                }
            }
        }

        // Try wildcard
        self.handlers.get("*")
    }

    /// Spawn `config.workers` polling threads (at least one).
    pub fn spawn(self, config: JobExecutorConfig) -> std::io::Result<JobExecutorHandle>
    where
        S: Send,
    {
        let executor = Arc::new(self);
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let mut handle = JobExecutorHandle {
            shutdown: Vec::new(),
            joins: Vec::new(),
            stats: stats.clone(),
        };

        for worker in 0..config.workers.max(1) {
            let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
            let executor = executor.clone();
            let stats = stats.clone();
            let cfg = config.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.name, worker))
                .spawn(move || executor_loop(&executor, &cfg, shutdown_rx, &stats));

            match spawned {
                Ok(join) => {
                    handle.shutdown.push(shutdown_tx);
                    handle.joins.push(join);
                }
                Err(e) => {
                    handle.shutdown();
                    return Err(e);
                }
            }
        }

        Ok(handle)
    }

    /// Execute a single claimed job (for testing or synchronous use).
    pub fn execute_one(&self, job: &mut Job) -> Result<(), String> {
        let Some(handler) = self.get_handler(&job.kind) else {
            let error = format!("no handler for job kind: {:?}", job.kind);
            warn!(job_id = %job.id, error = %error, "no handler for job");
            job.mark_failed(error.clone());
            self.store.update(job).map_err(|e| e.to_string())?;
            return Err(error);
        };

        let result = catch_unwind(AssertUnwindSafe(|| handler(&*job))).unwrap_or_else(|payload| {
            let error = format!("job handler panicked: {}", panic_message(payload.as_ref()));
            error!(job_id = %job.id, job = %job.name, error = %error, "job handler panicked");
            JobResult::Failure(error)
        });

        match result {
            JobResult::Success => {
                job.mark_completed();
                self.store.update(job).map_err(|e| e.to_string())?;
                debug!(job_id = %job.id, job = %job.name, "job completed");
                Ok(())
            }
            JobResult::Failure(error) => {
                job.mark_failed(error.clone());
                self.store.update(job).map_err(|e| e.to_string())?;
                Err(error)
            }
        }
    }

    /// Claim and execute pending jobs on the calling thread until none are
    /// left. Returns how many jobs ran.
    pub fn run_pending(&self) -> Result<usize, JobStoreError> {
        let mut ran = 0;
        while let Some(mut job) = self.store.claim_next()? {
            if let Err(e) = self.execute_one(&mut job) {
                debug!(job_id = %job.id, error = %e, status = ?job.status, "job execution failed");
            }
            ran += 1;
        }
        Ok(ran)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn executor_loop<S: JobStore + 'static>(
    executor: &JobExecutor<S>,
    config: &JobExecutorConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: &Mutex<ExecutorStats>,
) {
    info!(executor = %config.name, "job executor worker started");
    let started = Instant::now();

    loop {
        // Check for shutdown
        match shutdown_rx.try_recv() {
            Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
            Err(mpsc::TryRecvError::Empty) => {}
        }

        match executor.store.claim_next() {
            Ok(Some(mut job)) => {
                debug!(
                    executor = %config.name,
                    job_id = %job.id,
                    kind = ?job.kind,
                    "claimed job"
                );

                stats
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .current_running += 1;

                let result = executor.execute_one(&mut job);

                {
                    let mut s = stats.lock().unwrap_or_else(PoisonError::into_inner);
                    s.current_running = s.current_running.saturating_sub(1);
                    s.jobs_processed += 1;
                    match result {
                        Ok(()) => s.jobs_succeeded += 1,
                        Err(_) => s.jobs_failed += 1,
                    }
                }

                if let Err(e) = result {
                    debug!(
                        executor = %config.name,
                        job_id = %job.id,
                        error = %e,
                        status = ?job.status,
                        "job execution failed"
                    );
                }
            }
            Ok(None) => {
                // No jobs available, sleep
                thread::sleep(config.poll_interval);
            }
            Err(e) => {
                error!(executor = %config.name, error = ?e, "failed to claim job");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(
        executor = %config.name,
        uptime_secs = started.elapsed().as_secs(),
        "job executor worker stopped"
    );
}
