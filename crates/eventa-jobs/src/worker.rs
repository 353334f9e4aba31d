//! Polling moderation worker.
//!
//! Claims up to `max_concurrent_jobs` at a time and processes them
//! concurrently, sleeping only when the queue is empty. Worker lifecycle
//! and per-job outcomes are broadcast as [`WorkerEvent`]s; a
//! [`WorkerHandle`] shuts the loop down gracefully.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use eventa_core::defaults::{JOB_MAX_CONCURRENT, JOB_POLL_INTERVAL_MS, WORKER_EVENT_CAPACITY};
use eventa_core::models::ModerationJob;
use eventa_core::traits::ModerationJobRepository;
use eventa_core::Result;

use crate::handler::{JobContext, JobHandler, JobResult};

/// Configuration for the moderation worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Polling interval in milliseconds when the queue is empty.
    pub poll_interval_ms: u64,
    /// Maximum number of concurrently processed jobs.
    pub max_concurrent_jobs: usize,
    /// Whether job processing is enabled.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: JOB_POLL_INTERVAL_MS,
            max_concurrent_jobs: JOB_MAX_CONCURRENT,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `JOB_MAX_CONCURRENT` | `2` | Max concurrent jobs |
    /// | `JOB_POLL_INTERVAL_MS` | `2000` | Polling interval when queue is empty |
    pub fn from_env() -> Self {
        let enabled = std::env::var("WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_concurrent_jobs = std::env::var("JOB_MAX_CONCURRENT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(JOB_MAX_CONCURRENT)
            .max(1);

        let poll_interval_ms = std::env::var("JOB_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(JOB_POLL_INTERVAL_MS);

        Self {
            poll_interval_ms,
            max_concurrent_jobs,
            enabled,
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set maximum concurrent jobs.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Enable or disable job processing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// A job was claimed and started.
    JobStarted { job_id: Uuid, event_id: Uuid },
    /// A job completed successfully.
    JobCompleted { job_id: Uuid },
    /// A job failed (it may still be retried by the queue).
    JobFailed { job_id: Uuid, error: String },
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
}

/// Handle for controlling a running worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<WorkerEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx.send(()).await.map_err(|_| {
            eventa_core::Error::Internal("Failed to send shutdown signal".to_string())
        })?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }
}

/// Moderation worker processing jobs from the queue.
pub struct ModerationWorker {
    jobs: Arc<dyn ModerationJobRepository>,
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl ModerationWorker {
    /// Create a new worker.
    pub fn new(
        jobs: Arc<dyn ModerationJobRepository>,
        handler: Arc<dyn JobHandler>,
        config: WorkerConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(WORKER_EVENT_CAPACITY);
        Self {
            jobs,
            handler,
            config,
            event_tx,
        }
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    /// Worker loop: claim a batch, process concurrently, sleep only when
    /// the queue is empty.
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!(
                subsystem = "jobs",
                component = "worker",
                "Moderation worker is disabled, not starting"
            );
            return;
        }

        info!(
            subsystem = "jobs",
            component = "worker",
            op = "start",
            poll_interval_ms = self.config.poll_interval_ms,
            max_concurrent = self.config.max_concurrent_jobs,
            "Moderation worker started"
        );
        let _ = self.event_tx.send(WorkerEvent::WorkerStarted);

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if shutdown_rx.try_recv().is_ok() {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    "Moderation worker received shutdown signal"
                );
                break;
            }

            let mut tasks = tokio::task::JoinSet::new();
            let mut claimed = 0;
            for _ in 0..self.config.max_concurrent_jobs {
                match self.claim_job().await {
                    Some(job) => {
                        claimed += 1;
                        let jobs = self.jobs.clone();
                        let handler = self.handler.clone();
                        let event_tx = self.event_tx.clone();
                        tasks.spawn(async move {
                            execute_job(jobs, handler, event_tx, job).await;
                        });
                    }
                    None => break,
                }
            }

            if claimed == 0 {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(
                            subsystem = "jobs",
                            component = "worker",
                            "Moderation worker received shutdown signal"
                        );
                        break;
                    }
                    _ = sleep(poll_interval) => {}
                }
            } else {
                debug!(
                    subsystem = "jobs",
                    component = "worker",
                    claimed,
                    "Processing concurrent job batch"
                );
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        error!(
                            subsystem = "jobs",
                            component = "worker",
                            error = ?e,
                            "Job task panicked"
                        );
                    }
                }
                // Immediately try to claim more
            }
        }

        let _ = self.event_tx.send(WorkerEvent::WorkerStopped);
        info!(
            subsystem = "jobs",
            component = "worker",
            "Moderation worker stopped"
        );
    }

    async fn claim_job(&self) -> Option<ModerationJob> {
        match self.jobs.claim_next().await {
            Ok(job) => job,
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    op = "claim_next",
                    error = %e,
                    "Failed to claim job"
                );
                None
            }
        }
    }
}

/// Execute one claimed job and record the outcome.
async fn execute_job(
    jobs: Arc<dyn ModerationJobRepository>,
    handler: Arc<dyn JobHandler>,
    event_tx: broadcast::Sender<WorkerEvent>,
    job: ModerationJob,
) {
    let start = Instant::now();
    let job_id = job.id;
    let event_id = job.event_id;

    info!(
        subsystem = "jobs",
        component = "worker",
        op = "execute",
        job_id = %job_id,
        event_id = %event_id,
        "Processing moderation job"
    );
    let _ = event_tx.send(WorkerEvent::JobStarted { job_id, event_id });

    let result = handler.execute(JobContext::new(job)).await;

    match result {
        JobResult::Success => {
            if let Err(e) = jobs.complete(job_id).await {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = %job_id,
                    error = %e,
                    "Failed to mark job as completed"
                );
            } else {
                info!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = %job_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job completed"
                );
                let _ = event_tx.send(WorkerEvent::JobCompleted { job_id });
            }
        }
        JobResult::Failed(error) | JobResult::Retry(error) => {
            if let Err(e) = jobs.fail(job_id, &error).await {
                error!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = %job_id,
                    error = %e,
                    "Failed to record job failure"
                );
            } else {
                warn!(
                    subsystem = "jobs",
                    component = "worker",
                    job_id = %job_id,
                    error = %error,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job failed"
                );
                let _ = event_tx.send(WorkerEvent::JobFailed { job_id, error });
            }
        }
    }
}
