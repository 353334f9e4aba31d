//! Trait seams between the Eventa crates.
//!
//! These traits decouple the search pipeline from its collaborators: the
//! datastore, the embedding/LLM backends, the external providers, and the
//! moderation job queue. Implementations live in `eventa-db`,
//! `eventa-intent`, and `eventa-gateway`; tests substitute their own.

use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use crate::error::Result;
use crate::language::Lang;
use crate::models::{
    Event, EventCategory, ModerationJob, ModerationVerdict, ProviderParams, RawIntent,
    RawProviderEvent,
};
use crate::temporal::DateRange;

/// A fully derived internal search plan: the output of intent extraction
/// and normalization, ready for the datastore query builder.
#[derive(Debug, Clone, Default)]
pub struct SearchPlan {
    /// Normalized (lowercased) free text.
    pub text: String,
    /// Accent-folded projection of the text.
    pub folded: String,
    /// Detected query language.
    pub lang: Lang,
    /// Synonyms contributed by category keyword expansion.
    pub synonyms: Vec<String>,
    /// Canonical category filters.
    pub categories: Vec<EventCategory>,
    pub city: Option<String>,
    /// Expected country, used for same-named-city disambiguation.
    pub country: Option<String>,
    pub venue: Option<String>,
    /// Derived date window (already tolerance-expanded).
    pub date_range: Option<DateRange>,
    /// Requested time of day ("HH:MM"), informational for re-scoring.
    pub time: Option<String>,
    /// Whether the query was judged event-intent.
    pub event_intent: bool,
    /// Caller location for proximity scoring, when shared.
    pub user_location: Option<(f64, f64)>,
    /// Maximum candidates to fetch.
    pub limit: i64,
}

impl SearchPlan {
    /// Whether any explicit entity filters (city, venue, category) were
    /// extracted. Drives the second rung of the fallback ladder.
    pub fn has_entity_filters(&self) -> bool {
        self.city.is_some() || self.venue.is_some() || !self.categories.is_empty()
    }
}

/// Event persistence interface used by the submission and moderation flows.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a submitted event as Draft/Pending. Returns the new id.
    async fn insert(&self, req: &crate::models::CreateEventRequest) -> Result<Uuid>;

    /// Update an event from a new submission payload. Resets moderation to
    /// Pending; the caller re-queues a review.
    async fn update(&self, id: Uuid, req: &crate::models::CreateEventRequest) -> Result<()>;

    /// Fetch an event regardless of visibility.
    async fn get(&self, id: Uuid) -> Result<Option<Event>>;

    /// Fetch an event only if it satisfies the public-visibility invariant.
    async fn get_public(&self, id: Uuid) -> Result<Option<Event>>;

    /// Record a moderation verdict.
    async fn set_moderation(&self, id: Uuid, status: crate::models::ModerationStatus)
        -> Result<()>;

    /// Transition an event to Published.
    async fn publish(&self, id: Uuid) -> Result<()>;
}

/// Datastore search interface over the events table.
#[async_trait]
pub trait EventSearchRepository: Send + Sync {
    /// Execute the plan with full filters (hybrid ranking when an embedding
    /// is supplied, lexical-only otherwise).
    async fn search(&self, plan: &SearchPlan, embedding: Option<&Vector>) -> Result<Vec<Event>>;

    /// Fallback rung 1: same plan without the date filter, keeping a
    /// future-events-only floor.
    async fn search_without_dates(
        &self,
        plan: &SearchPlan,
        embedding: Option<&Vector>,
    ) -> Result<Vec<Event>>;

    /// Fallback rung 2: entity filters only, free-text constraint dropped.
    async fn search_entities_only(&self, plan: &SearchPlan) -> Result<Vec<Event>>;
}

/// Embedding generation for semantic search.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a search query. Failure degrades the caller to lexical-only.
    async fn embed_query(&self, text: &str) -> Result<Vector>;
}

/// LLM intent-extraction collaborator.
#[async_trait]
pub trait IntentBackend: Send + Sync {
    /// Extract intent and entities from free text, replying in `ui_lang`.
    async fn extract(&self, text: &str, ui_lang: Lang) -> Result<RawIntent>;
}

/// AI content moderation collaborator.
#[async_trait]
pub trait ModerationBackend: Send + Sync {
    /// Review an event for content-policy compliance.
    async fn review(&self, event: &Event) -> Result<ModerationVerdict>;
}

/// A whitelisted external event search provider.
#[async_trait]
pub trait ExternalProvider: Send + Sync {
    /// Provider name, used for rate-limit/circuit keying and result tagging.
    fn name(&self) -> &str;

    /// Fetch raw event-like records for the given parameters.
    async fn fetch(&self, params: &ProviderParams) -> Result<Vec<RawProviderEvent>>;
}

/// Moderation job queue.
#[async_trait]
pub trait ModerationJobRepository: Send + Sync {
    /// Queue a review for an event. Deduplicates against an already-pending
    /// job for the same event.
    async fn queue(&self, event_id: Uuid) -> Result<Option<Uuid>>;

    /// Claim the next pending job, marking it running.
    async fn claim_next(&self) -> Result<Option<ModerationJob>>;

    /// Mark a job completed.
    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Record a failure; the job is re-queued until its attempts are
    /// exhausted.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_entity_filters() {
        let mut plan = SearchPlan::default();
        assert!(!plan.has_entity_filters());

        plan.city = Some("Melbourne".to_string());
        assert!(plan.has_entity_filters());

        let plan = SearchPlan {
            categories: vec![EventCategory::Markets],
            ..Default::default()
        };
        assert!(plan.has_entity_filters());
    }
}
