//! Typed filter predicates and the event query builder.
//!
//! Search filters are modeled as a tagged union so the SQL generation
//! pattern-matches exhaustively instead of duck-typing filter shapes at
//! runtime. The builder emits WHERE clause fragments with positional
//! parameter binds; the public-visibility invariant is injected into every
//! query unconditionally.

use chrono::{DateTime, Utc};

use eventa_core::models::EventCategory;
use eventa_core::temporal::DateRange;

use crate::escape_like;

/// Type-safe parameter binding for generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter.
    String(String),
    /// Array of strings (category membership).
    StringArray(Vec<String>),
    /// Timestamp parameter.
    Timestamp(DateTime<Utc>),
    /// Double-precision float parameter.
    Float(f64),
}

/// A single search filter predicate.
#[derive(Debug, Clone)]
pub enum FilterPredicate {
    /// Event start falls inside the (already tolerance-expanded) window.
    DateRange(DateRange),
    /// Event start is at or after the floor. Used by the first fallback
    /// rung when the date filter is dropped.
    FutureOnly(DateTime<Utc>),
    /// Event carries at least one of these categories.
    Categories(Vec<EventCategory>),
    /// City substring match against city and address columns.
    City(String),
    /// Venue substring match against venue and address columns.
    VenueOrAddress(String),
    /// Free-text match against the folded search projection.
    TextMatch(String),
    /// Great-circle distance from a caller location within a radius.
    GeoWithin { lat: f64, lng: f64, radius_km: f64 },
}

/// WHERE clause always present: the public-visibility invariant.
const VISIBILITY_CLAUSE: &str = "e.status = 'published' AND e.moderation = 'approved'";

/// Generates SQL WHERE clause fragments for event search filters.
///
/// The builder converts a list of [`FilterPredicate`]s into parameterized
/// WHERE clauses. Parameter numbering starts after `param_offset`, so the
/// fragment composes with parameters the caller has already bound.
pub struct EventQueryBuilder {
    predicates: Vec<FilterPredicate>,
    param_offset: usize,
}

impl EventQueryBuilder {
    /// Create a new builder.
    ///
    /// `param_offset` is the number of parameters already present in the
    /// enclosing query.
    pub fn new(param_offset: usize) -> Self {
        Self {
            predicates: Vec::new(),
            param_offset,
        }
    }

    /// Add a predicate.
    pub fn push(mut self, predicate: FilterPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a predicate when present.
    pub fn push_opt(self, predicate: Option<FilterPredicate>) -> Self {
        match predicate {
            Some(p) => self.push(p),
            None => self,
        }
    }

    /// Build the WHERE clause fragment and its parameters.
    ///
    /// The visibility invariant is always the first clause; remaining
    /// clauses join with AND in predicate order.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses = vec![VISIBILITY_CLAUSE.to_string()];
        let mut params = Vec::new();
        let mut param_idx = self.param_offset;

        for predicate in &self.predicates {
            match predicate {
                FilterPredicate::DateRange(range) => {
                    clauses.push(format!(
                        "e.starts_at >= ${} AND e.starts_at <= ${}",
                        param_idx + 1,
                        param_idx + 2
                    ));
                    params.push(QueryParam::Timestamp(range.gte));
                    params.push(QueryParam::Timestamp(range.lte));
                    param_idx += 2;
                }
                FilterPredicate::FutureOnly(floor) => {
                    param_idx += 1;
                    clauses.push(format!("e.starts_at >= ${}", param_idx));
                    params.push(QueryParam::Timestamp(*floor));
                }
                FilterPredicate::Categories(categories) => {
                    param_idx += 1;
                    clauses.push(format!("e.categories && ${}::text[]", param_idx));
                    params.push(QueryParam::StringArray(
                        categories.iter().map(|c| c.as_str().to_string()).collect(),
                    ));
                }
                FilterPredicate::City(city) => {
                    param_idx += 1;
                    clauses.push(format!(
                        "(e.city ILIKE ${idx} ESCAPE '\\' OR e.address ILIKE ${idx} ESCAPE '\\')",
                        idx = param_idx
                    ));
                    params.push(QueryParam::String(like_pattern(city)));
                }
                FilterPredicate::VenueOrAddress(venue) => {
                    param_idx += 1;
                    clauses.push(format!(
                        "(e.venue_name ILIKE ${idx} ESCAPE '\\' OR e.address ILIKE ${idx} ESCAPE '\\')",
                        idx = param_idx
                    ));
                    params.push(QueryParam::String(like_pattern(venue)));
                }
                FilterPredicate::TextMatch(folded) => {
                    clauses.push(format!(
                        "(to_tsvector('simple', e.search_text_folded) @@ websearch_to_tsquery('simple', ${}) \
                         OR e.search_text_folded ILIKE ${} ESCAPE '\\')",
                        param_idx + 1,
                        param_idx + 2
                    ));
                    params.push(QueryParam::String(folded.clone()));
                    params.push(QueryParam::String(like_pattern(folded)));
                    param_idx += 2;
                }
                FilterPredicate::GeoWithin {
                    lat,
                    lng,
                    radius_km,
                } => {
                    // Haversine on bound lat/lng; postgres permits reusing
                    // a positional parameter.
                    let lat_p = param_idx + 1;
                    let lng_p = param_idx + 2;
                    let radius_p = param_idx + 3;
                    clauses.push(format!(
                        "(e.lat IS NOT NULL AND e.lng IS NOT NULL AND \
                         2 * 6371 * asin(sqrt(\
                         power(sin(radians(e.lat - ${lat})/2), 2) + \
                         cos(radians(${lat})) * cos(radians(e.lat)) * \
                         power(sin(radians(e.lng - ${lng})/2), 2)\
                         )) <= ${radius})",
                        lat = lat_p,
                        lng = lng_p,
                        radius = radius_p
                    ));
                    params.push(QueryParam::Float(*lat));
                    params.push(QueryParam::Float(*lng));
                    params.push(QueryParam::Float(*radius_km));
                    param_idx += 3;
                }
            }
        }

        (clauses.join(" AND "), params)
    }
}

/// Wrap escaped user input in ILIKE wildcards.
fn like_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

/// Bind built parameters onto a sqlx query in order.
pub fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    params: &'q [QueryParam],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    for param in params {
        query = match param {
            QueryParam::String(s) => query.bind(s),
            QueryParam::StringArray(a) => query.bind(a),
            QueryParam::Timestamp(t) => query.bind(t),
            QueryParam::Float(f) => query.bind(f),
        };
    }
    query
}
