//! The search response envelope.
//!
//! Error codes are short machine-readable strings distinct from the
//! human-readable `message`; partial degradation keeps the surviving
//! result set and explains what is missing.

use serde::{Deserialize, Serialize};

use eventa_core::models::{ProviderCallResult, SearchResult};
use eventa_core::ErrorCode;

/// Per-side error codes for the two search legs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<ErrorCode>,
}

/// Merge and provider statistics for observability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// External candidates dropped as duplicates of internal events.
    pub deduped: usize,
    /// Per-provider call outcomes.
    pub external_stats: Vec<ProviderCallResult>,
}

/// The `/api/search` response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub count: usize,
    pub internal_count: usize,
    pub external_count: usize,
    pub latency_ms: u64,
    /// Request-level combined error code (empty query, total failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Human-readable advisory, set on degraded responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub errors: SearchErrors,
    pub stats: SearchStats,
}

impl SearchResponse {
    /// An empty response carrying a request-level error code.
    pub fn empty_with_code(code: ErrorCode, message: &str, latency_ms: u64) -> Self {
        Self {
            results: Vec::new(),
            count: 0,
            internal_count: 0,
            external_count: 0,
            latency_ms,
            code: Some(code),
            message: Some(message.to_string()),
            errors: SearchErrors::default(),
            stats: SearchStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_envelope_carries_code() {
        let envelope = SearchResponse::empty_with_code(
            ErrorCode::EmptyQuery,
            "Please enter a search query.",
            3,
        );
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["code"], "ERR_EMPTY_QUERY");
        assert_eq!(json["count"], 0);
        assert!(json.get("errors").is_some());
    }

    #[test]
    fn test_clean_envelope_omits_optional_fields() {
        let envelope = SearchResponse {
            results: Vec::new(),
            count: 0,
            internal_count: 0,
            external_count: 0,
            latency_ms: 12,
            code: None,
            message: None,
            errors: SearchErrors::default(),
            stats: SearchStats::default(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("code").is_none());
        assert!(json.get("message").is_none());
        assert!(json["errors"].get("internal").is_none());
    }
}
