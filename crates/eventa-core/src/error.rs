//! Error types for Eventa.

use thiserror::Error;

/// Result type alias using Eventa's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Eventa operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(uuid::Uuid),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Intent extraction / LLM call failed
    #[error("Intent error: {0}")]
    Intent(String),

    /// Content moderation failed
    #[error("Moderation error: {0}")]
    Moderation(String),

    /// Search operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// External provider call failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider rejected by the sliding-window rate limiter
    #[error("Provider rate limited: {0}")]
    RateLimited(String),

    /// Provider rejected by an open circuit breaker
    #[error("Provider circuit open: {0}")]
    CircuitOpen(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

/// Short machine-readable error codes surfaced in the search response
/// envelope, distinct from the human-readable `message` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    /// Datastore unreachable or query failed
    #[serde(rename = "ERR_DB_CONNECT")]
    DbConnect,
    /// Internal search failed for a non-datastore reason
    #[serde(rename = "ERR_SEARCH_FAILED")]
    SearchFailed,
    /// External provider exceeded its per-call timeout
    #[serde(rename = "ERR_EXT_TIMEOUT")]
    ExtTimeout,
    /// External provider connection failed
    #[serde(rename = "ERR_EXT_CONNECT")]
    ExtConnect,
    /// Provider rejected by the sliding-window rate limiter
    #[serde(rename = "RATE_LIMITED")]
    RateLimited,
    /// Provider rejected by an open circuit breaker
    #[serde(rename = "CIRCUIT_OPEN")]
    CircuitOpen,
    /// Query was empty after trimming
    #[serde(rename = "ERR_EMPTY_QUERY")]
    EmptyQuery,
    /// Both internal and external search failed
    #[serde(rename = "ERR_SEARCH_UNAVAILABLE")]
    SearchUnavailable,
}

impl ErrorCode {
    /// The wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DbConnect => "ERR_DB_CONNECT",
            ErrorCode::SearchFailed => "ERR_SEARCH_FAILED",
            ErrorCode::ExtTimeout => "ERR_EXT_TIMEOUT",
            ErrorCode::ExtConnect => "ERR_EXT_CONNECT",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::EmptyQuery => "ERR_EMPTY_QUERY",
            ErrorCode::SearchUnavailable => "ERR_SEARCH_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_event_not_found() {
        let id = Uuid::nil();
        let err = Error::EventNotFound(id);
        assert_eq!(err.to_string(), format!("Event not found: {}", id));
    }

    #[test]
    fn test_error_display_search() {
        let err = Error::Search("index unavailable".to_string());
        assert_eq!(err.to_string(), "Search error: index unavailable");
    }

    #[test]
    fn test_error_display_provider() {
        let err = Error::Provider("connection refused".to_string());
        assert_eq!(err.to_string(), "Provider error: connection refused");
    }

    #[test]
    fn test_error_display_rate_limited() {
        let err = Error::RateLimited("ticketswap".to_string());
        assert_eq!(err.to_string(), "Provider rate limited: ticketswap");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_code_wire_format() {
        assert_eq!(ErrorCode::DbConnect.as_str(), "ERR_DB_CONNECT");
        assert_eq!(ErrorCode::ExtTimeout.as_str(), "ERR_EXT_TIMEOUT");
        assert_eq!(ErrorCode::RateLimited.as_str(), "RATE_LIMITED");
        assert_eq!(ErrorCode::CircuitOpen.as_str(), "CIRCUIT_OPEN");
        assert_eq!(ErrorCode::EmptyQuery.as_str(), "ERR_EMPTY_QUERY");
    }

    #[test]
    fn test_error_code_serde_roundtrip() {
        let json = serde_json::to_string(&ErrorCode::CircuitOpen).unwrap();
        assert_eq!(json, "\"CIRCUIT_OPEN\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::CircuitOpen);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
