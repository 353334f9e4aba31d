//! The `/api/search` pipeline.
//!
//! Flow: empty-query guard → intent extraction (LLM, with a heuristic
//! fallback) → internal hybrid search and external provider fan-out
//! dispatched concurrently and settled independently → cross-source
//! dedup/merge → conditional event-intent ranking → response envelope.
//!
//! Neither leg failing aborts the request: a failed leg contributes a
//! typed error code and an advisory message while the surviving results
//! are still returned.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use pgvector::Vector;
use tracing::{debug, info, warn};

use eventa_core::defaults::{INTERNAL_CANDIDATE_LIMIT, PAGE_LIMIT, PAGE_LIMIT_SEARCH};
use eventa_core::language::{detect_language, Lang};
use eventa_core::models::SearchResult;
use eventa_core::traits::{EmbeddingBackend, EventSearchRepository, IntentBackend, SearchPlan};
use eventa_core::ErrorCode;
use eventa_gateway::ProviderGateway;
use eventa_intent::extract::{
    build_search_plan, heuristic_intent, provider_params, refine_intent,
};
use eventa_search::rescore::{rescore_events, to_result};
use eventa_search::{deduplicate, rank_event_results};
use serde::Deserialize;

use crate::envelope::{SearchErrors, SearchResponse, SearchStats};
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `/api/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// UI language code; detected from the query when absent.
    #[serde(default)]
    pub lang: Option<String>,
    /// Expected country for same-named-city disambiguation and ranking.
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Collaborators for one search request, behind trait seams so tests
/// substitute their own.
pub struct SearchDeps {
    pub search: Arc<dyn EventSearchRepository>,
    pub embeddings: Arc<dyn EmbeddingBackend>,
    pub intent: Arc<dyn IntentBackend>,
    pub gateway: Arc<ProviderGateway>,
}

/// `POST /api/search`
pub async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    Ok(Json(run_search_pipeline(&state.deps, request).await))
}

/// Execute the full pipeline for one request.
pub async fn run_search_pipeline(deps: &SearchDeps, request: SearchRequest) -> SearchResponse {
    let start = Instant::now();

    let query = request.query.trim().to_string();
    if query.is_empty() {
        return SearchResponse::empty_with_code(
            ErrorCode::EmptyQuery,
            "Please enter a search query.",
            start.elapsed().as_millis() as u64,
        );
    }

    let ui_lang = request
        .lang
        .as_deref()
        .map(Lang::from_code)
        .unwrap_or_else(|| detect_language(&query));

    // Intent extraction, degrading to the deterministic heuristic.
    let raw = match deps.intent.extract(&query, ui_lang).await {
        Ok(raw) => raw,
        Err(error) => {
            warn!(
                subsystem = "api",
                component = "search",
                op = "extract",
                error = %error,
                "Intent backend unavailable, using heuristic extraction"
            );
            heuristic_intent(&query)
        }
    };
    let refined = refine_intent(raw, &query, ui_lang);

    let user_location = request.lat.zip(request.lng);
    let plan = build_search_plan(
        &query,
        &refined,
        request.country.clone(),
        user_location,
        INTERNAL_CANDIDATE_LIMIT,
    );
    let params = provider_params(&plan, &refined.entities);

    // Embedding failure degrades hybrid ranking to lexical-only.
    let embedding = match deps.embeddings.embed_query(&plan.folded).await {
        Ok(vector) => Some(vector),
        Err(error) => {
            warn!(
                subsystem = "api",
                component = "search",
                op = "embed_query",
                error = %error,
                "Embedding unavailable, degrading to lexical-only ranking"
            );
            None
        }
    };

    // Internal and external legs run concurrently and settle independently.
    let (internal_outcome, external_outcome) = tokio::join!(
        run_internal_search(deps.search.as_ref(), &plan, embedding.as_ref()),
        deps.gateway.fetch_all(&params),
    );

    let (internal_results, internal_error) = match internal_outcome {
        Ok(results) => (results, None),
        Err(code) => (Vec::new(), Some(code)),
    };
    let external_error = external_outcome.combined_error();
    let external_degraded = external_outcome.partially_degraded();

    let outcome = deduplicate(internal_results, external_outcome.results);
    let deduped = outcome.dropped;
    let internal_count = outcome.internal.len();
    let external_count = outcome.external.len();
    let merged = outcome.merge();

    let mut results = rank_event_results(
        merged,
        &query,
        plan.city.as_deref(),
        plan.country.as_deref(),
    );

    let limit = request
        .limit
        .unwrap_or(PAGE_LIMIT_SEARCH)
        .clamp(1, PAGE_LIMIT) as usize;
    results.truncate(limit);

    let (code, message) = degradation_message(
        internal_error,
        external_error,
        external_degraded,
        deps.gateway.provider_count(),
    );

    let latency_ms = start.elapsed().as_millis() as u64;
    info!(
        subsystem = "api",
        component = "search",
        op = "pipeline",
        query = %query,
        lang = refined.lang.code(),
        result_count = results.len(),
        internal_count,
        external_count,
        deduped_count = deduped,
        duration_ms = latency_ms,
        "Search pipeline completed"
    );

    SearchResponse {
        count: results.len(),
        results,
        internal_count,
        external_count,
        latency_ms,
        code,
        message,
        errors: SearchErrors {
            internal: internal_error,
            external: external_error,
        },
        stats: SearchStats {
            deduped,
            external_stats: external_outcome.stats,
        },
    }
}

/// Internal search with the empty-result fallback ladder.
///
/// Rung 0 runs the full plan; rung 1 drops the date filter but keeps a
/// future-events floor; rung 2 drops the free-text constraint and retries
/// on entity filters alone (only when explicit entities were extracted).
async fn run_internal_search(
    repo: &dyn EventSearchRepository,
    plan: &SearchPlan,
    embedding: Option<&Vector>,
) -> Result<Vec<SearchResult>, ErrorCode> {
    let events = match repo.search(plan, embedding).await {
        Ok(events) => events,
        Err(error) => {
            warn!(
                subsystem = "api",
                component = "search",
                op = "internal",
                error = %error,
                "Internal search failed"
            );
            return Err(ErrorCode::DbConnect);
        }
    };

    let (events, rung) = if !events.is_empty() {
        (events, 0)
    } else if plan.date_range.is_some() {
        match repo.search_without_dates(plan, embedding).await {
            Ok(retry) if !retry.is_empty() => (retry, 1),
            Ok(_) if plan.has_entity_filters() => match repo.search_entities_only(plan).await {
                Ok(entity_hits) => (entity_hits, 2),
                Err(_) => (Vec::new(), 2),
            },
            Ok(_) => (Vec::new(), 1),
            Err(_) => (Vec::new(), 1),
        }
    } else if plan.has_entity_filters() {
        match repo.search_entities_only(plan).await {
            Ok(entity_hits) => (entity_hits, 2),
            Err(_) => (Vec::new(), 2),
        }
    } else {
        (events, 0)
    };

    if rung > 0 {
        debug!(
            subsystem = "api",
            component = "search",
            op = "internal",
            fallback_rung = rung,
            result_count = events.len(),
            "Fallback ladder produced results"
        );
    }

    let scored = rescore_events(events, plan);
    Ok(scored
        .iter()
        .map(|s| to_result(s, plan.user_location))
        .collect())
}

/// Request-level code and advisory message per degradation state.
fn degradation_message(
    internal_error: Option<ErrorCode>,
    external_error: Option<ErrorCode>,
    external_degraded: bool,
    provider_count: usize,
) -> (Option<ErrorCode>, Option<String>) {
    match (internal_error, external_error) {
        (Some(_), Some(_)) => (
            Some(ErrorCode::SearchUnavailable),
            Some("Search is temporarily unavailable. Please try again in a moment.".to_string()),
        ),
        (Some(_), None) => (
            None,
            Some("Local listings are temporarily unavailable — showing web results.".to_string()),
        ),
        (None, Some(_)) if provider_count > 0 => (
            None,
            Some("Web sources are temporarily unavailable — showing local listings.".to_string()),
        ),
        (None, _) if external_degraded => (
            None,
            Some("Some web sources were unavailable — showing what we have.".to_string()),
        ),
        _ => (None, None),
    }
}
