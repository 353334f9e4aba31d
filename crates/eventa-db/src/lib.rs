//! # eventa-db
//!
//! PostgreSQL datastore layer for Eventa.
//!
//! This crate provides:
//! - Connection pool management
//! - The event repository (submission, moderation, visibility-guarded reads)
//! - Hybrid full-text + vector search over the events table
//! - A typed filter/query builder with positional parameter binding
//! - The moderation job queue

pub mod events;
pub mod filters;
pub mod jobs;
pub mod pool;
pub mod search;

// Re-export core types
pub use eventa_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use events::PgEventRepository;
pub use filters::{EventQueryBuilder, FilterPredicate, QueryParam};
pub use jobs::PgModerationJobRepository;
pub use pool::{create_pool, PoolConfig};
pub use search::PgEventSearch;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Event repository for the submission and moderation flows.
    pub events: PgEventRepository,
    /// Hybrid search over published events.
    pub search: PgEventSearch,
    /// Moderation job queue.
    pub jobs: PgModerationJobRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            events: PgEventRepository::new(pool.clone()),
            search: PgEventSearch::new(pool.clone()),
            jobs: PgModerationJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_sale"), "50\\% off\\_sale");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
