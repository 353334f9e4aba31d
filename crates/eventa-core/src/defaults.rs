//! Centralized default constants for the Eventa system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining their
//! own magic numbers.
//!
//! The scoring weights and penalty magnitudes were chosen empirically;
//! they are constants here (rather than scattered literals) so retuning
//! is a one-file change.

// =============================================================================
// REFERENCE TIMEZONE
// =============================================================================

/// The platform home timezone. All "now"-relative date computations
/// ("today", "this weekend") are anchored here regardless of caller locale,
/// so relative phrases resolve deterministically.
pub const REFERENCE_TZ: chrono_tz::Tz = chrono_tz::Europe::Brussels;

// =============================================================================
// HYBRID SEARCH
// =============================================================================

/// Weight of the lexical (full-text) rank in the hybrid score.
pub const HYBRID_LEXICAL_WEIGHT: f32 = 0.4;

/// Weight of the semantic (cosine similarity) rank in the hybrid score.
pub const HYBRID_SEMANTIC_WEIGHT: f32 = 0.6;

/// Tolerance window added on both ends of a derived date range, so events
/// just outside the requested window are not pruned before re-scoring.
pub const DATE_TOLERANCE_HOURS: i64 = 12;

/// Default duration assumed for a single explicit date (whole day).
pub const DEFAULT_EVENT_WINDOW_HOURS: i64 = 24;

/// Candidate fetch limit for the internal search before re-scoring.
pub const INTERNAL_CANDIDATE_LIMIT: i64 = 100;

/// Radius applied when the caller shares a location but names no city
/// ("near me" searches).
pub const NEARBY_RADIUS_KM: f64 = 100.0;

// =============================================================================
// SECONDARY RE-SCORING
// =============================================================================

/// Title contains the full normalized query phrase.
pub const RESCORE_TITLE_PHRASE: f64 = 30.0;

/// Title contains every query term (any order).
pub const RESCORE_TITLE_ALL_TERMS: f64 = 20.0;

/// Multiplier applied to the title partial-match ratio.
pub const RESCORE_TITLE_PARTIAL_SCALE: f64 = 15.0;

/// Exact category match.
pub const RESCORE_CATEGORY_EXACT: f64 = 15.0;

/// Partial category match.
pub const RESCORE_CATEGORY_PARTIAL: f64 = 7.0;

/// Multiplier applied to the description match ratio.
pub const RESCORE_DESCRIPTION_SCALE: f64 = 10.0;

/// Exact city match.
pub const RESCORE_CITY_EXACT: f64 = 10.0;

/// Partial city match.
pub const RESCORE_CITY_PARTIAL: f64 = 5.0;

/// Bonus for an event starting inside the requested date window.
pub const RESCORE_IN_WINDOW: f64 = 25.0;

/// Penalty per day outside the requested window.
pub const RESCORE_PER_DAY_OUTSIDE: f64 = 2.0;

/// Cap on the days-outside penalty, so distant events are demoted but
/// never eliminated.
pub const RESCORE_OUTSIDE_CAP: f64 = 20.0;

// =============================================================================
// DEDUPLICATION
// =============================================================================

/// Maximum title edit distance for a same-date duplicate.
pub const DEDUP_TITLE_DISTANCE: usize = 2;

/// Looser title edit distance permitted when the venue/city also matches.
pub const DEDUP_TITLE_DISTANCE_VENUE: usize = 5;

// =============================================================================
// EVENT-INTENT RANKING
// =============================================================================

/// Penalty for aggregator/directory pages.
pub const RANK_AGGREGATOR_PENALTY: f64 = -5.0;

/// Penalty for a clear country mismatch against the target country.
pub const RANK_COUNTRY_MISMATCH_PENALTY: f64 = -6.0;

/// Penalty for a bare venue homepage with no specific date.
pub const RANK_VENUE_HOMEPAGE_PENALTY: f64 = -3.0;

/// Boost for a result with both a venue/address and a specific date.
pub const RANK_VENUE_AND_DATE_BOOST: f64 = 5.0;

/// Boost for a city match against the target city.
pub const RANK_CITY_MATCH_BOOST: f64 = 4.0;

/// Boost for a start time within the upcoming window on a time-intent query.
pub const RANK_UPCOMING_BOOST: f64 = 3.0;

/// Days ahead counted as "upcoming" for the time-window boost.
pub const RANK_UPCOMING_WINDOW_DAYS: i64 = 30;

// =============================================================================
// EXTERNAL PROVIDER GATEWAY
// =============================================================================

/// Hard per-provider call timeout in milliseconds.
pub const PROVIDER_TIMEOUT_MS: u64 = 1500;

/// Sliding-window length for per-provider rate limiting, in seconds.
pub const PROVIDER_RATE_WINDOW_SECS: u64 = 60;

/// Maximum calls per provider within the sliding window.
pub const PROVIDER_RATE_MAX_CALLS: usize = 10;

/// Consecutive failures before a provider's circuit opens.
pub const CIRCUIT_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open circuit permits a trial call, in seconds.
pub const CIRCUIT_COOLDOWN_SECS: u64 = 30;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for search responses.
pub const PAGE_LIMIT_SEARCH: i64 = 20;

/// Default page size for standard list endpoints.
pub const PAGE_LIMIT: i64 = 50;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default global rate limit: max requests per period.
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default global rate limit: period in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default LLM endpoint for intent extraction and moderation.
pub const LLM_URL: &str = "http://127.0.0.1:11434";

/// Default intent/moderation model name.
pub const LLM_MODEL: &str = "llama3.1:8b";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension.
pub const EMBED_DIMENSION: usize = 768;

/// Timeout for intent extraction requests in seconds.
pub const INTENT_TIMEOUT_SECS: u64 = 20;

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 10;

/// Minimum extraction confidence below which a moderation verdict is
/// downgraded to NeedsReview.
pub const MODERATION_MIN_CONFIDENCE: f32 = 0.7;

// =============================================================================
// JOB PROCESSING
// =============================================================================

/// Default maximum retry count for failed moderation jobs.
pub const JOB_MAX_RETRIES: i32 = 3;

/// Default job worker poll interval in milliseconds.
pub const JOB_POLL_INTERVAL_MS: u64 = 2_000;

/// Default maximum concurrent jobs per worker.
pub const JOB_MAX_CONCURRENT: usize = 2;

/// Default worker event broadcast channel capacity.
pub const WORKER_EVENT_CAPACITY: usize = 64;
