//! Core data models for Eventa.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::temporal::DateRange;

// =============================================================================
// EVENT
// =============================================================================

/// Publication status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Archived,
}

impl EventStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Archived => "archived",
        }
    }

    /// Parse from the database representation. Unknown values map to Draft.
    pub fn from_str_or_draft(s: &str) -> Self {
        match s {
            "published" => EventStatus::Published,
            "archived" => EventStatus::Archived,
            _ => EventStatus::Draft,
        }
    }
}

/// Moderation status of an event. Edits reset this to Pending and re-queue
/// an AI review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
    NeedsReview,
}

impl ModerationStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::NeedsReview => "needs_review",
        }
    }

    /// Parse from the database representation. Unknown values map to Pending.
    pub fn from_str_or_pending(s: &str) -> Self {
        match s {
            "approved" => ModerationStatus::Approved,
            "rejected" => ModerationStatus::Rejected,
            "needs_review" => ModerationStatus::NeedsReview,
            _ => ModerationStatus::Pending,
        }
    }
}

/// Canonical event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    MusicNightlife,
    ArtsCulture,
    FoodDrink,
    SportsFitness,
    Community,
    FamilyKids,
    BusinessTech,
    Markets,
    Other,
}

impl EventCategory {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::MusicNightlife => "music_nightlife",
            EventCategory::ArtsCulture => "arts_culture",
            EventCategory::FoodDrink => "food_drink",
            EventCategory::SportsFitness => "sports_fitness",
            EventCategory::Community => "community",
            EventCategory::FamilyKids => "family_kids",
            EventCategory::BusinessTech => "business_tech",
            EventCategory::Markets => "markets",
            EventCategory::Other => "other",
        }
    }

    /// Parse from the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "music_nightlife" => Some(EventCategory::MusicNightlife),
            "arts_culture" => Some(EventCategory::ArtsCulture),
            "food_drink" => Some(EventCategory::FoodDrink),
            "sports_fitness" => Some(EventCategory::SportsFitness),
            "community" => Some(EventCategory::Community),
            "family_kids" => Some(EventCategory::FamilyKids),
            "business_tech" => Some(EventCategory::BusinessTech),
            "markets" => Some(EventCategory::Markets),
            "other" => Some(EventCategory::Other),
            _ => None,
        }
    }
}

/// Ticket pricing for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Price {
    /// Free entry flag.
    pub free: bool,
    /// Price in the platform currency, when known and not free.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// A community event as persisted by the datastore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// IANA timezone the event was submitted in.
    pub timezone: String,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub categories: Vec<EventCategory>,
    pub price: Price,
    pub status: EventStatus,
    pub moderation: ModerationStatus,
    /// Plain search projection (title + description + venue + city).
    #[serde(skip_serializing)]
    pub search_text: String,
    /// Accent-folded search projection for matching differently-accented input.
    #[serde(skip_serializing)]
    pub search_text_folded: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// The public-visibility invariant: an event is shown to the public only
    /// when it is published AND its moderation review approved it.
    pub fn is_publicly_visible(&self) -> bool {
        self.status == EventStatus::Published && self.moderation == ModerationStatus::Approved
    }
}

/// Request payload for creating or updating an event through the
/// submission flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub categories: Vec<EventCategory>,
    #[serde(default)]
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_timezone() -> String {
    crate::defaults::REFERENCE_TZ.name().to_string()
}

// =============================================================================
// SEARCH QUERY
// =============================================================================

/// Entities extracted from a free-text query, either by the LLM intent
/// backend or by the heuristic fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryEntities {
    #[serde(default)]
    pub title: Option<String>,
    /// Free-form event type/category phrase ("jazz", "food market").
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    /// Natural-language date phrase ("this weekend", "domani").
    #[serde(default)]
    pub date_phrase: Option<String>,
    /// Explicit ISO date, when the extractor produced one.
    #[serde(default)]
    pub date_iso: Option<String>,
    /// Time-of-day phrase ("8pm").
    #[serde(default)]
    pub time: Option<String>,
}

/// A fully resolved, request-scoped search query. Never persisted.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Raw query text as typed by the user.
    pub raw: String,
    /// Detected UI language.
    pub lang: crate::language::Lang,
    /// Extracted entities.
    pub entities: QueryEntities,
    /// Derived date range, when a date phrase or ISO date resolved.
    pub date_range: Option<DateRange>,
    /// Derived canonical categories.
    pub categories: Vec<EventCategory>,
}

// =============================================================================
// SEARCH RESULT
// =============================================================================

/// Which pipeline produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Internal,
    External,
}

/// A single ranked search result. Created fresh per request, scored,
/// sorted, returned; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub source: ResultSource,
    /// Internal event id; None for external results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Great-circle distance from the caller's location, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub categories: Vec<EventCategory>,
    #[serde(default)]
    pub price_free: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Relevance score assigned by the ranking passes.
    pub score: f64,
    /// Normalized title used only during cross-source deduplication.
    #[serde(skip)]
    pub normalized_title: String,
}

impl SearchResult {
    /// Calendar date of the result start in the platform reference
    /// timezone, when a start is known. A midnight-anchored local start
    /// must land on the same calendar date as an evening start of the
    /// same day, so UTC dates are the wrong key here.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.starts_at
            .map(|dt| dt.with_timezone(&crate::defaults::REFERENCE_TZ).date_naive())
    }
}

// =============================================================================
// PROVIDER OUTCOMES
// =============================================================================

/// Terminal error classification for a single external provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderErrorCode {
    RateLimited,
    CircuitOpen,
    Timeout,
    ConnectError,
}

/// Per-provider outcome for a gateway fan-out, aggregated into the
/// response envelope for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCallResult {
    pub provider: String,
    /// Items that passed schema validation and the safety filter.
    pub accepted: usize,
    /// Items dropped because required fields were missing or malformed.
    pub dropped_schema: usize,
    /// Items dropped by the content safety filter.
    pub dropped_safety: usize,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderErrorCode>,
}

/// Normalized parameter set passed to every external provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderParams {
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// ISO date the search is anchored on, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// A raw, unvalidated event-like record returned by an external provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProviderEvent {
    #[serde(default)]
    pub title: Option<String>,
    /// ISO date string (YYYY-MM-DD).
    #[serde(default)]
    pub date: Option<String>,
    /// Optional time-of-day string.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price_free: Option<bool>,
    #[serde(default)]
    pub image_url: Option<String>,
}

// =============================================================================
// INTENT EXTRACTION
// =============================================================================

/// What the user is trying to do, as judged by the intent extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Search,
    Create,
    #[default]
    Unclear,
}

/// Structured output of the LLM intent collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIntent {
    #[serde(default)]
    pub intent: IntentKind,
    #[serde(default)]
    pub confidence: f32,
    /// Language detected by the extractor (ISO 639-1), when reported.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub entities: QueryEntities,
    /// Natural-language paraphrase in the target UI language.
    #[serde(default)]
    pub reply: Option<String>,
}

// =============================================================================
// MODERATION
// =============================================================================

/// Verdict of an AI content review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub status: ModerationStatus,
    pub confidence: f32,
    #[serde(default)]
    pub reasons: Vec<String>,
}

// =============================================================================
// MODERATION JOB QUEUE
// =============================================================================

/// State of a queued moderation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// A queued background moderation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationJob {
    pub id: Uuid,
    pub event_id: Uuid,
    pub status: JobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event(status: EventStatus, moderation: ModerationStatus) -> Event {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        Event {
            id: Uuid::new_v4(),
            title: "Canal Jazz Night".to_string(),
            description: "Live jazz by the canal".to_string(),
            starts_at: now,
            ends_at: None,
            timezone: "Europe/Brussels".to_string(),
            venue_name: Some("Canal Club".to_string()),
            address: Some("Quai des Péniches 1".to_string()),
            city: Some("Brussels".to_string()),
            country: Some("Belgium".to_string()),
            lat: Some(50.86),
            lng: Some(4.35),
            categories: vec![EventCategory::MusicNightlife],
            price: Price::default(),
            status,
            moderation,
            search_text: String::new(),
            search_text_folded: String::new(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_visibility_requires_published_and_approved() {
        let visible = sample_event(EventStatus::Published, ModerationStatus::Approved);
        assert!(visible.is_publicly_visible());

        let pending = sample_event(EventStatus::Published, ModerationStatus::Pending);
        assert!(!pending.is_publicly_visible());

        let draft = sample_event(EventStatus::Draft, ModerationStatus::Approved);
        assert!(!draft.is_publicly_visible());

        let rejected = sample_event(EventStatus::Published, ModerationStatus::Rejected);
        assert!(!rejected.is_publicly_visible());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Archived,
        ] {
            assert_eq!(EventStatus::from_str_or_draft(status.as_str()), status);
        }
        assert_eq!(
            EventStatus::from_str_or_draft("garbage"),
            EventStatus::Draft
        );
    }

    #[test]
    fn test_moderation_round_trip() {
        for m in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Rejected,
            ModerationStatus::NeedsReview,
        ] {
            assert_eq!(ModerationStatus::from_str_or_pending(m.as_str()), m);
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            EventCategory::parse("music_nightlife"),
            Some(EventCategory::MusicNightlife)
        );
        assert_eq!(EventCategory::parse("nope"), None);
    }

    #[test]
    fn test_provider_error_code_wire_format() {
        let json = serde_json::to_string(&ProviderErrorCode::CircuitOpen).unwrap();
        assert_eq!(json, "\"CIRCUIT_OPEN\"");
        let json = serde_json::to_string(&ProviderErrorCode::RateLimited).unwrap();
        assert_eq!(json, "\"RATE_LIMITED\"");
    }

    #[test]
    fn test_raw_intent_deserializes_with_missing_fields() {
        let raw: RawIntent = serde_json::from_str(r#"{"intent":"search"}"#).unwrap();
        assert_eq!(raw.intent, IntentKind::Search);
        assert_eq!(raw.entities, QueryEntities::default());
    }

    #[test]
    fn test_search_result_start_date() {
        let result = SearchResult {
            source: ResultSource::External,
            id: None,
            title: "Test".to_string(),
            starts_at: Some(Utc.with_ymd_and_hms(2026, 7, 4, 18, 0, 0).unwrap()),
            ends_at: None,
            venue: None,
            address: None,
            city: None,
            country: None,
            lat: None,
            lng: None,
            url: None,
            snippet: None,
            distance_km: None,
            categories: vec![],
            price_free: false,
            image_url: None,
            score: 0.0,
            normalized_title: String::new(),
        };
        assert_eq!(
            result.start_date(),
            Some(NaiveDate::from_ymd_opt(2026, 7, 4).unwrap())
        );
    }
}
