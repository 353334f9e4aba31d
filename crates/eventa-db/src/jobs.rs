//! Moderation job queue.
//!
//! Event submissions and edits queue an AI content review here instead of
//! firing an unawaited background call. The worker in `eventa-jobs` claims
//! jobs with `FOR UPDATE SKIP LOCKED` so multiple workers never process the
//! same review twice.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use eventa_core::defaults::JOB_MAX_RETRIES;
use eventa_core::models::{JobStatus, ModerationJob};
use eventa_core::traits::ModerationJobRepository;
use eventa_core::{Error, Result};

/// PostgreSQL moderation job queue.
#[derive(Clone)]
pub struct PgModerationJobRepository {
    pool: Pool<Postgres>,
}

impl PgModerationJobRepository {
    /// Create a new job repository over the given pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_job_row(row: PgRow) -> ModerationJob {
        let status: String = row.get("status");
        ModerationJob {
            id: row.get("id"),
            event_id: row.get("event_id"),
            status: match status.as_str() {
                "running" => JobStatus::Running,
                "completed" => JobStatus::Completed,
                "failed" => JobStatus::Failed,
                _ => JobStatus::Pending,
            },
            attempts: row.get("attempts"),
            max_attempts: row.get("max_attempts"),
            last_error: row.get("last_error"),
            created_at: row.get("created_at"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        }
    }

    /// Number of jobs waiting to be claimed.
    pub async fn pending_count(&self) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM moderation_jobs WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count.0)
    }
}

#[async_trait]
impl ModerationJobRepository for PgModerationJobRepository {
    async fn queue(&self, event_id: Uuid) -> Result<Option<Uuid>> {
        let job_id = Uuid::now_v7();
        let now = Utc::now();

        // Atomic check-and-insert: a pending or running review for the same
        // event makes a second one redundant, and concurrent submissions
        // must not race past the check.
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO moderation_jobs (id, event_id, status, attempts, max_attempts, created_at) \
             SELECT $1, $2, 'pending', 0, $3, $4 \
             WHERE NOT EXISTS (\
                 SELECT 1 FROM moderation_jobs \
                 WHERE event_id = $2 AND status IN ('pending', 'running')\
             ) \
             RETURNING id",
        )
        .bind(job_id)
        .bind(event_id)
        .bind(JOB_MAX_RETRIES)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if let Some(id) = result {
            debug!(
                subsystem = "db",
                component = "jobs",
                op = "queue",
                job_id = %id,
                event_id = %event_id,
                "Queued moderation job"
            );
        }
        Ok(result)
    }

    async fn claim_next(&self) -> Result<Option<ModerationJob>> {
        let now = Utc::now();

        let row = sqlx::query(
            "UPDATE moderation_jobs \
             SET status = 'running', started_at = $1 \
             WHERE id = (\
                 SELECT id FROM moderation_jobs \
                 WHERE status = 'pending' \
                 ORDER BY created_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED\
             ) \
             RETURNING id, event_id, status, attempts, max_attempts, last_error, \
                       created_at, started_at, completed_at",
        )
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_job_row))
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE moderation_jobs SET status = 'completed', completed_at = $1 WHERE id = $2",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (attempts, max_attempts): (i32, i32) =
            sqlx::query_as("SELECT attempts, max_attempts FROM moderation_jobs WHERE id = $1")
                .bind(job_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        if attempts < max_attempts {
            // Re-queue with an incremented attempt count.
            sqlx::query(
                "UPDATE moderation_jobs \
                 SET status = 'pending', attempts = $1, last_error = $2, started_at = NULL \
                 WHERE id = $3",
            )
            .bind(attempts + 1)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        } else {
            sqlx::query(
                "UPDATE moderation_jobs \
                 SET status = 'failed', completed_at = $1, last_error = $2 \
                 WHERE id = $3",
            )
            .bind(now)
            .bind(error)
            .bind(job_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
