//! Job handler seam for the worker.

use async_trait::async_trait;
use uuid::Uuid;

use eventa_core::models::ModerationJob;

/// Context provided to job handlers.
pub struct JobContext {
    /// The claimed job being processed.
    pub job: ModerationJob,
}

impl JobContext {
    /// Create a new job context.
    pub fn new(job: ModerationJob) -> Self {
        Self { job }
    }

    /// The event this job reviews.
    pub fn event_id(&self) -> Uuid {
        self.job.event_id
    }
}

/// Result of job execution.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully.
    Success,
    /// Job failed permanently with an error message.
    Failed(String),
    /// Transient failure; the queue re-runs the job until its attempts
    /// are exhausted.
    Retry(String),
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Execute the job.
    async fn execute(&self, ctx: JobContext) -> JobResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use eventa_core::models::JobStatus;

    struct NoOpHandler;

    #[async_trait]
    impl JobHandler for NoOpHandler {
        async fn execute(&self, _ctx: JobContext) -> JobResult {
            JobResult::Success
        }
    }

    fn job() -> ModerationJob {
        ModerationJob {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            status: JobStatus::Running,
            attempts: 0,
            max_attempts: 3,
            last_error: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_context_exposes_event_id() {
        let job = job();
        let event_id = job.event_id;
        let ctx = JobContext::new(job);
        assert_eq!(ctx.event_id(), event_id);
    }

    #[tokio::test]
    async fn test_noop_handler_succeeds() {
        let result = NoOpHandler.execute(JobContext::new(job())).await;
        assert!(matches!(result, JobResult::Success));
    }

    #[test]
    fn test_job_result_variants() {
        assert!(matches!(JobResult::Success, JobResult::Success));
        assert!(matches!(
            JobResult::Failed("boom".to_string()),
            JobResult::Failed(_)
        ));
        assert!(matches!(
            JobResult::Retry("later".to_string()),
            JobResult::Retry(_)
        ));
    }
}
