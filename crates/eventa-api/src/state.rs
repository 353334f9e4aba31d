//! Shared application state.

use std::sync::Arc;

use governor::RateLimiter;

use eventa_db::Database;

use crate::handlers::SearchDeps;

/// Global rate limiter type (direct quota, not keyed per client).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database context (events, search, moderation queue).
    pub db: Database,
    /// Search pipeline collaborators behind trait seams.
    pub deps: Arc<SearchDeps>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}
