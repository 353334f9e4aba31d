//! In-process ranking pipeline test: re-score internal candidates, drop
//! external duplicates, merge internal-first, then apply event-intent
//! ranking to the merged list.

use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use eventa_core::models::{
    Event, EventCategory, EventStatus, ModerationStatus, Price, ResultSource, SearchResult,
};
use eventa_core::temporal::DateRange;
use eventa_core::SearchPlan;
use eventa_search::fuzzy::normalize_title;
use eventa_search::rescore::{rescore_events, to_result};
use eventa_search::{deduplicate, rank_event_results};

// 2026-06-13 is a Saturday; the weekend window spans it and the Sunday.
fn weekend_range() -> DateRange {
    DateRange::for_dates(
        NaiveDate::from_ymd_opt(2026, 6, 13).unwrap(),
        NaiveDate::from_ymd_opt(2026, 6, 14).unwrap(),
    )
}

fn internal_event(title: &str, day: u32) -> Event {
    let starts = Utc.with_ymd_and_hms(2026, 6, day, 18, 0, 0).unwrap();
    Event {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{} in Melbourne", title),
        starts_at: starts,
        ends_at: None,
        timezone: "Australia/Melbourne".to_string(),
        venue_name: Some("Corner Hotel".to_string()),
        address: None,
        city: Some("Melbourne".to_string()),
        country: Some("Australia".to_string()),
        lat: None,
        lng: None,
        categories: vec![EventCategory::MusicNightlife],
        price: Price::default(),
        status: EventStatus::Published,
        moderation: ModerationStatus::Approved,
        search_text: String::new(),
        search_text_folded: String::new(),
        image_url: None,
        created_at: starts,
        updated_at: starts,
    }
}

fn external_result(title: &str, day: u32, venue: Option<&str>) -> SearchResult {
    SearchResult {
        source: ResultSource::External,
        id: None,
        title: title.to_string(),
        starts_at: Some(Utc.with_ymd_and_hms(2026, 6, day, 10, 0, 0).unwrap()),
        ends_at: None,
        venue: venue.map(String::from),
        address: None,
        city: Some("Melbourne".to_string()),
        country: Some("Australia".to_string()),
        lat: None,
        lng: None,
        url: Some("https://example.com/event".to_string()),
        snippet: Some("Live set, doors 8pm".to_string()),
        distance_km: None,
        categories: vec![],
        price_free: false,
        image_url: None,
        score: 0.0,
        normalized_title: normalize_title(title),
    }
}

fn weekend_plan() -> SearchPlan {
    SearchPlan {
        text: "melbourne this weekend jazz".to_string(),
        folded: "melbourne this weekend jazz".to_string(),
        categories: vec![EventCategory::MusicNightlife],
        city: Some("Melbourne".to_string()),
        country: Some("Australia".to_string()),
        date_range: Some(weekend_range().with_tolerance()),
        event_intent: true,
        limit: 20,
        ..Default::default()
    }
}

#[test]
fn weekend_query_ranks_in_window_events_and_drops_duplicates() {
    let plan = weekend_plan();

    // Saturday and Sunday candidates plus one two weeks out
    let candidates = vec![
        internal_event("Late Jam Session", 27),
        internal_event("Jazz at the Corner", 13),
        internal_event("Sunday Jazz Brunch", 14),
    ];

    let scored = rescore_events(candidates, &plan);
    // In-window events outrank the distant one
    assert_eq!(scored[2].event.title, "Late Jam Session");
    assert!(scored[0].score > scored[2].score);

    let internal: Vec<SearchResult> = scored.iter().map(|s| to_result(s, None)).collect();

    let external = vec![
        // Same date, near-identical title: a duplicate of the internal hit
        external_result("Jazz at the Corne", 13, Some("Corner Hotel")),
        external_result("Harbour Jazz Cruise", 13, None),
    ];

    let outcome = deduplicate(internal, external);
    assert_eq!(outcome.internal.len(), 3);
    assert_eq!(outcome.dropped, 1);
    assert_eq!(outcome.external.len(), 1);
    assert_eq!(outcome.external[0].title, "Harbour Jazz Cruise");

    let merged = outcome.merge();
    assert_eq!(merged[0].source, ResultSource::Internal);

    let ranked = rank_event_results(
        merged,
        "melbourne this weekend jazz",
        Some("melbourne"),
        Some("australia"),
    );
    assert_eq!(ranked.len(), 4);
    // In-window internal events keep their re-score lead; the distant
    // internal event trails them, and the external cruise (which entered
    // the merge unscored) lands last.
    assert!(ranked[0].source == ResultSource::Internal);
    assert_ne!(ranked[0].title, "Late Jam Session");
    assert_ne!(ranked[1].title, "Late Jam Session");
    assert_eq!(ranked[2].title, "Late Jam Session");
    assert_eq!(ranked[3].title, "Harbour Jazz Cruise");
}

#[test]
fn non_event_query_bypasses_scoring_entirely() {
    let internal: Vec<SearchResult> = rescore_events(
        vec![
            internal_event("Jazz at the Corner", 14),
            internal_event("Sunday Jazz Brunch", 13),
        ],
        &weekend_plan(),
    )
    .iter()
    .map(|s| to_result(s, None))
    .collect();

    let ranked = rank_event_results(internal, "opening hours", None, None);
    // Ascending start time, scores untouched
    assert_eq!(ranked[0].title, "Sunday Jazz Brunch");
    assert_eq!(ranked[1].title, "Jazz at the Corner");
}

#[test]
fn dedup_then_merge_is_stable_across_runs() {
    let build_internal = || {
        rescore_events(vec![internal_event("Jazz at the Corner", 13)], &weekend_plan())
            .iter()
            .map(|s| to_result(s, None))
            .collect::<Vec<_>>()
    };
    let build_external = || {
        vec![
            external_result("Harbour Jazz Cruise", 13, None),
            external_result("Jazz at the Corner", 13, Some("Corner Hotel")),
        ]
    };

    let first: Vec<String> = deduplicate(build_internal(), build_external())
        .merge()
        .iter()
        .map(|r| r.title.clone())
        .collect();
    let second: Vec<String> = deduplicate(build_internal(), build_external())
        .merge()
        .iter()
        .map(|r| r.title.clone())
        .collect();

    assert_eq!(first, second);
}
