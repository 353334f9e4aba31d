//! Structured logging schema and field name constants for Eventa.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (search hits, provider rows) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "db", "gateway", "intent", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "hybrid_search", "dedup", "circuit_breaker", "pool", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "fetch_all", "extract", "claim_next"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Event UUID being operated on.
pub const EVENT_ID: &str = "event_id";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// External provider name.
pub const PROVIDER: &str = "provider";

/// Search query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of internal results before merge.
pub const INTERNAL_COUNT: &str = "internal_count";

/// Number of external results before merge.
pub const EXTERNAL_COUNT: &str = "external_count";

/// Number of external results dropped as duplicates of internal ones.
pub const DEDUPED_COUNT: &str = "deduped_count";

/// Number of provider items dropped by schema validation.
pub const DROPPED_SCHEMA: &str = "dropped_schema";

/// Number of provider items dropped by the safety filter.
pub const DROPPED_SAFETY: &str = "dropped_safety";

// ─── Search-specific fields ────────────────────────────────────────────────

/// Lexical weight used in hybrid search.
pub const LEXICAL_WEIGHT: &str = "lexical_weight";

/// Semantic weight used in hybrid search.
pub const SEMANTIC_WEIGHT: &str = "semantic_weight";

/// Which rung of the fallback ladder produced the results (0 = none).
pub const FALLBACK_RUNG: &str = "fallback_rung";

/// Detected query language code.
pub const LANG: &str = "lang";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Machine-readable error code attached to a degraded response.
pub const ERROR_CODE: &str = "error_code";
