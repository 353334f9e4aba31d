//! Hybrid full-text + vector search over published events.
//!
//! The ranking expression weights lexical `ts_rank` against cosine
//! similarity on the stored embedding when a query embedding is available,
//! and degrades to lexical-only otherwise. Results are coarsely ranked
//! here; the in-process re-scoring pass in `eventa-search` does the final
//! ordering.
//!
//! Empty result sets walk a fallback ladder: first the date filter is
//! dropped (keeping a future-events floor), then the free-text constraint
//! is dropped in favor of entity filters alone.

use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres};
use tracing::debug;

use async_trait::async_trait;
use eventa_core::defaults::{HYBRID_LEXICAL_WEIGHT, HYBRID_SEMANTIC_WEIGHT, NEARBY_RADIUS_KM};
use eventa_core::language::fold_accents;
use eventa_core::models::Event;
use eventa_core::traits::{EventSearchRepository, SearchPlan};
use eventa_core::{Error, Result};

use crate::events::{PgEventRepository, EVENT_COLUMNS};
use crate::filters::{bind_params, EventQueryBuilder, FilterPredicate};

/// Hybrid search provider over the events table.
#[derive(Clone)]
pub struct PgEventSearch {
    pool: Pool<Postgres>,
}

impl PgEventSearch {
    /// Create a new search provider over the given pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Execute a built query: score expression + WHERE fragment + ordering.
    async fn run(
        &self,
        plan: &SearchPlan,
        embedding: Option<&Vector>,
        predicates: Vec<FilterPredicate>,
        order_by_start: bool,
    ) -> Result<Vec<Event>> {
        let has_text = !plan.folded.is_empty();
        // Every parameter in the prepared statement must be referenced, so
        // the text ($1) and embedding ($2) binds exist only when the score
        // expression uses them.
        let use_embedding = has_text && embedding.is_some();
        let base_binds = usize::from(has_text) + usize::from(use_embedding);

        let score_expr = if use_embedding {
            format!(
                "({lex} * ts_rank(to_tsvector('simple', e.search_text_folded), \
                 websearch_to_tsquery('simple', $1), 32) \
                 + {sem} * COALESCE(1 - (e.embedding <=> $2), 0))",
                lex = HYBRID_LEXICAL_WEIGHT,
                sem = HYBRID_SEMANTIC_WEIGHT,
            )
        } else if has_text {
            "ts_rank(to_tsvector('simple', e.search_text_folded), \
                 websearch_to_tsquery('simple', $1), 32)"
                .to_string()
        } else {
            // No text: constant rank, ordering falls to start time.
            "0".to_string()
        };

        let mut builder = EventQueryBuilder::new(base_binds);
        for predicate in predicates {
            builder = builder.push(predicate);
        }
        let (where_sql, params) = builder.build();

        let limit_idx = base_binds + params.len() + 1;
        let order = if order_by_start || !has_text {
            "e.starts_at ASC".to_string()
        } else {
            "rank DESC, e.starts_at ASC".to_string()
        };

        let sql = format!(
            "SELECT {columns}, {score} AS rank FROM events e \
             WHERE {where_sql} ORDER BY {order} LIMIT ${limit_idx}",
            columns = EVENT_COLUMNS,
            score = score_expr,
        );

        let mut query = sqlx::query(&sql);
        if has_text {
            query = query.bind(&plan.folded);
        }
        if use_embedding {
            if let Some(vector) = embedding {
                query = query.bind(vector);
            }
        }
        query = bind_params(query, &params);
        query = query.bind(plan.limit);

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let events: Vec<Event> = rows
            .iter()
            .map(PgEventRepository::parse_event_row)
            .collect();

        Ok(filter_city_country(events, plan))
    }

    /// The entity predicates shared by every rung: category, city, venue,
    /// and the nearby-radius filter for located queries without a city.
    fn entity_predicates(plan: &SearchPlan) -> Vec<FilterPredicate> {
        let mut predicates = Vec::new();
        if !plan.categories.is_empty() {
            predicates.push(FilterPredicate::Categories(plan.categories.clone()));
        }
        if let Some(city) = &plan.city {
            predicates.push(FilterPredicate::City(city.clone()));
        }
        if let Some(venue) = &plan.venue {
            predicates.push(FilterPredicate::VenueOrAddress(venue.clone()));
        }
        if plan.city.is_none() {
            if let Some((lat, lng)) = plan.user_location {
                predicates.push(FilterPredicate::GeoWithin {
                    lat,
                    lng,
                    radius_km: NEARBY_RADIUS_KM,
                });
            }
        }
        predicates
    }
}

/// Same-named-city disambiguation.
///
/// When the plan names an expected country, events whose stored country
/// clearly differs are excluded; events with no country recorded are kept.
fn filter_city_country(events: Vec<Event>, plan: &SearchPlan) -> Vec<Event> {
    let Some(expected) = &plan.country else {
        return events;
    };
    let expected = fold_accents(&expected.to_lowercase());

    let before = events.len();
    let filtered: Vec<Event> = events
        .into_iter()
        .filter(|event| match &event.country {
            Some(country) => fold_accents(&country.to_lowercase()) == expected,
            None => true,
        })
        .collect();

    if filtered.len() < before {
        debug!(
            subsystem = "db",
            component = "hybrid_search",
            op = "country_disambiguation",
            dropped = before - filtered.len(),
            "Excluded same-named-city matches in the wrong country"
        );
    }
    filtered
}

#[async_trait]
impl EventSearchRepository for PgEventSearch {
    async fn search(&self, plan: &SearchPlan, embedding: Option<&Vector>) -> Result<Vec<Event>> {
        let mut predicates = Self::entity_predicates(plan);
        if let Some(range) = &plan.date_range {
            predicates.push(FilterPredicate::DateRange(*range));
        }
        if !plan.folded.is_empty() {
            predicates.push(FilterPredicate::TextMatch(plan.folded.clone()));
        }

        self.run(plan, embedding, predicates, false).await
    }

    async fn search_without_dates(
        &self,
        plan: &SearchPlan,
        embedding: Option<&Vector>,
    ) -> Result<Vec<Event>> {
        let mut predicates = Self::entity_predicates(plan);
        predicates.push(FilterPredicate::FutureOnly(Utc::now()));
        if !plan.folded.is_empty() {
            predicates.push(FilterPredicate::TextMatch(plan.folded.clone()));
        }

        self.run(plan, embedding, predicates, false).await
    }

    async fn search_entities_only(&self, plan: &SearchPlan) -> Result<Vec<Event>> {
        let mut predicates = Self::entity_predicates(plan);
        predicates.push(FilterPredicate::FutureOnly(Utc::now()));

        self.run(plan, None, predicates, true).await
    }
}
