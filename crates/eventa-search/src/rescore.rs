//! Secondary re-scoring of internal search candidates.
//!
//! The datastore query already filtered and coarsely ranked candidates;
//! this pass re-orders them with the signals the SQL expression cannot
//! see: phrase-level title matches, category agreement, description and
//! city ratios, and proximity to the requested date window.

use eventa_core::defaults::{
    RESCORE_CATEGORY_EXACT, RESCORE_CATEGORY_PARTIAL, RESCORE_CITY_EXACT, RESCORE_CITY_PARTIAL,
    RESCORE_DESCRIPTION_SCALE, RESCORE_IN_WINDOW, RESCORE_OUTSIDE_CAP, RESCORE_PER_DAY_OUTSIDE,
    RESCORE_TITLE_ALL_TERMS, RESCORE_TITLE_PHRASE, RESCORE_TITLE_PARTIAL_SCALE,
};
use eventa_core::language::fold_accents;
use eventa_core::{haversine_km, Event, ResultSource, SearchPlan, SearchResult};

use crate::fuzzy::{normalize_title, partial_ratio};

/// An internal candidate with its re-scored relevance.
#[derive(Debug, Clone)]
pub struct ScoredEvent {
    pub event: Event,
    pub score: f64,
}

/// Re-rank fetched internal candidates by the weighted signal sum.
/// Ties break by ascending start time.
pub fn rescore_events(events: Vec<Event>, plan: &SearchPlan) -> Vec<ScoredEvent> {
    let mut scored: Vec<ScoredEvent> = events
        .into_iter()
        .map(|event| {
            let score = score_event(&event, plan);
            ScoredEvent { event, score }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.event.starts_at.cmp(&b.event.starts_at))
    });

    scored
}

/// Weighted relevance of one event against the plan.
fn score_event(event: &Event, plan: &SearchPlan) -> f64 {
    let mut score = 0.0;

    let title = fold_accents(&event.title.to_lowercase());
    let query = &plan.folded;

    // Title: exact phrase > all terms > partial ratio
    if !query.is_empty() {
        let terms: Vec<&str> = query.split_whitespace().collect();
        if title.contains(query.as_str()) {
            score += RESCORE_TITLE_PHRASE;
        } else if !terms.is_empty() && terms.iter().all(|t| title.contains(t)) {
            score += RESCORE_TITLE_ALL_TERMS;
        } else {
            score += partial_ratio(query, &title) * RESCORE_TITLE_PARTIAL_SCALE;
        }
    }

    // Category: exact enum match > keyword appearing in the category name
    if !plan.categories.is_empty() {
        if plan.categories.iter().any(|c| event.categories.contains(c)) {
            score += RESCORE_CATEGORY_EXACT;
        } else if event.categories.iter().any(|c| {
            plan.synonyms
                .iter()
                .any(|syn| c.as_str().contains(&syn.to_lowercase()))
        }) {
            score += RESCORE_CATEGORY_PARTIAL;
        }
    }

    // Description ratio
    if !query.is_empty() && !event.description.is_empty() {
        let description = fold_accents(&event.description.to_lowercase());
        score += partial_ratio(query, &description) * RESCORE_DESCRIPTION_SCALE;
    }

    // City: exact > partial
    if let (Some(target), Some(city)) = (&plan.city, &event.city) {
        let target = fold_accents(&target.to_lowercase());
        let city = fold_accents(&city.to_lowercase());
        if city == target {
            score += RESCORE_CITY_EXACT;
        } else if city.contains(&target) || target.contains(&city) {
            score += RESCORE_CITY_PARTIAL;
        }
    }

    // Date proximity: bonus inside the window, graduated capped penalty
    // outside so distant events are demoted but never eliminated
    if let Some(range) = &plan.date_range {
        if range.contains(event.starts_at) {
            score += RESCORE_IN_WINDOW;
        } else {
            let days = range.days_outside(event.starts_at) as f64;
            score -= (days * RESCORE_PER_DAY_OUTSIDE).min(RESCORE_OUTSIDE_CAP);
        }
    }

    score
}

/// Convert a scored internal event into the response-shaped result.
pub fn to_result(scored: &ScoredEvent, user_location: Option<(f64, f64)>) -> SearchResult {
    let event = &scored.event;
    let distance_km = match (user_location, event.lat, event.lng) {
        (Some((ulat, ulng)), Some(lat), Some(lng)) => Some(haversine_km(ulat, ulng, lat, lng)),
        _ => None,
    };

    SearchResult {
        source: ResultSource::Internal,
        id: Some(event.id),
        title: event.title.clone(),
        starts_at: Some(event.starts_at),
        ends_at: event.ends_at,
        venue: event.venue_name.clone(),
        address: event.address.clone(),
        city: event.city.clone(),
        country: event.country.clone(),
        lat: event.lat,
        lng: event.lng,
        url: None,
        snippet: Some(snippet(&event.description)),
        distance_km,
        categories: event.categories.clone(),
        price_free: event.price.free,
        image_url: event.image_url.clone(),
        score: scored.score,
        normalized_title: normalize_title(&event.title),
    }
}

/// First 200 characters of the description, on a char boundary.
fn snippet(description: &str) -> String {
    description.chars().take(200).collect()
}
