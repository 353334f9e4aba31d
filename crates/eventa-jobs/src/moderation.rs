//! The moderation job handler.
//!
//! Claims a queued event review, calls the AI moderation backend, and
//! applies the verdict: confident approvals publish the event, rejections
//! record the rejection, and low-confidence approvals are parked for a
//! human (NeedsReview). Backend errors retry through the queue.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use eventa_core::defaults::MODERATION_MIN_CONFIDENCE;
use eventa_core::models::ModerationStatus;
use eventa_core::traits::{EventRepository, ModerationBackend};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Handler that reviews one event per job.
pub struct ModerationHandler {
    events: Arc<dyn EventRepository>,
    backend: Arc<dyn ModerationBackend>,
}

impl ModerationHandler {
    /// Create a handler over the event repository and moderation backend.
    pub fn new(events: Arc<dyn EventRepository>, backend: Arc<dyn ModerationBackend>) -> Self {
        Self { events, backend }
    }
}

#[async_trait]
impl JobHandler for ModerationHandler {
    async fn execute(&self, ctx: JobContext) -> JobResult {
        let event_id = ctx.event_id();

        let event = match self.events.get(event_id).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                // The event was deleted while the job was queued.
                return JobResult::Failed(format!("event {} no longer exists", event_id));
            }
            Err(error) => return JobResult::Retry(format!("event lookup failed: {}", error)),
        };

        let verdict = match self.backend.review(&event).await {
            Ok(verdict) => verdict,
            Err(error) => return JobResult::Retry(format!("moderation backend: {}", error)),
        };

        let status = match verdict.status {
            ModerationStatus::Approved if verdict.confidence < MODERATION_MIN_CONFIDENCE => {
                warn!(
                    subsystem = "jobs",
                    component = "moderation",
                    event_id = %event_id,
                    confidence = verdict.confidence,
                    "Low-confidence approval downgraded to needs_review"
                );
                ModerationStatus::NeedsReview
            }
            status => status,
        };

        if let Err(error) = self.events.set_moderation(event_id, status).await {
            return JobResult::Retry(format!("recording verdict failed: {}", error));
        }

        // A confident approval makes the event publicly visible.
        if status == ModerationStatus::Approved {
            if let Err(error) = self.events.publish(event_id).await {
                return JobResult::Retry(format!("publish failed: {}", error));
            }
        }

        info!(
            subsystem = "jobs",
            component = "moderation",
            op = "review",
            event_id = %event_id,
            moderation = status.as_str(),
            confidence = verdict.confidence,
            "Applied moderation verdict"
        );
        JobResult::Success
    }
}
