//! Event-intent classification and ranking of merged results.
//!
//! A query that mentions a time window, an activity, or travel phrasing is
//! asking about dated/located happenings; for those, merged results get a
//! secondary scoring pass that demotes aggregator pages and bare venue
//! homepages and boosts concrete, nearby, soon-upcoming events. Queries
//! without event intent skip scoring and sort by start time.

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use eventa_core::defaults::{
    RANK_AGGREGATOR_PENALTY, RANK_CITY_MATCH_BOOST, RANK_COUNTRY_MISMATCH_PENALTY,
    RANK_UPCOMING_BOOST, RANK_UPCOMING_WINDOW_DAYS, RANK_VENUE_AND_DATE_BOOST,
    RANK_VENUE_HOMEPAGE_PENALTY,
};
use eventa_core::language::fold_accents;
use eventa_core::SearchResult;

static TIME_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(today|tonight|tomorrow|this\ weekend|next\ weekend|this\ week|next\ week|
           next\ month|
           (?:this|next)\ (?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)|
           on\ (?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)|
           in\ \d+\ (?:days?|weeks?))\b
        |\b\d{4}-\d{2}-\d{2}\b",
    )
    .expect("valid time phrase regex")
});

static ACTIVITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(music|concert|gig|festival|market|show|exhibition|theatre|theater|
           museum|cinema|film|party|club|dj|jazz|comedy|workshop|meetup|
           conference|parade|fair|tasting|brunch|events?|happening)\b",
    )
    .expect("valid activity regex")
});

static TRAVEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(near me|nearby|while i'?m in|during my (trip|stay|visit)|things to do)\b")
        .expect("valid travel regex")
});

static AGGREGATOR_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        what'?s\ on|browse\ events|best\ events\ in|top\ \d+\ events|
        events\ calendar|event\ listings|upcoming\ events\ in|guide\ to",
    )
    .expect("valid aggregator regex")
});

static AGGREGATOR_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        eventbrite\.[a-z.]+/d/|allevents\.in|timeout\.com|tripadvisor\.|
        visit[a-z]+\.(?:com|be|org)/(?:events|whats-on)|10times\.com",
    )
    .expect("valid aggregator url regex")
});

static VENUE_HOMEPAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(contact us|about us|opening hours|our venue|book the venue)\b")
        .expect("valid venue homepage regex")
});

/// Whether a query is asking about dated/located happenings.
pub fn is_event_intent_query(text: &str) -> bool {
    let lowered = text.to_lowercase();
    TIME_PHRASE_RE.is_match(&lowered)
        || ACTIVITY_RE.is_match(&lowered)
        || TRAVEL_RE.is_match(&lowered)
}

/// Rank merged results for an event-intent query.
///
/// Non-event-intent queries bypass scoring and sort by ascending start
/// time (results with no start sort last).
pub fn rank_event_results(
    mut results: Vec<SearchResult>,
    query: &str,
    target_city: Option<&str>,
    target_country: Option<&str>,
) -> Vec<SearchResult> {
    if !is_event_intent_query(query) {
        sort_by_start(&mut results);
        return results;
    }

    let lowered = query.to_lowercase();
    let time_intent = TIME_PHRASE_RE.is_match(&lowered);
    let folded_city = target_city.map(|c| fold_accents(&c.to_lowercase()));
    let folded_country = target_country.map(|c| fold_accents(&c.to_lowercase()));

    for result in results.iter_mut() {
        result.score += score_result(result, time_intent, &folded_city, &folded_country);
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| match (a.starts_at, b.starts_at) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });

    results
}

fn score_result(
    result: &SearchResult,
    time_intent: bool,
    target_city: &Option<String>,
    target_country: &Option<String>,
) -> f64 {
    let mut score = 0.0;

    let text = format!(
        "{} {}",
        result.title.to_lowercase(),
        result.snippet.as_deref().unwrap_or("").to_lowercase()
    );

    if looks_like_aggregator(&text, result.url.as_deref()) {
        score += RANK_AGGREGATOR_PENALTY;
    }

    // Clear country mismatch against an explicit target
    if let (Some(target), Some(country)) = (target_country, &result.country) {
        let country = fold_accents(&country.to_lowercase());
        if !country.is_empty() && country != *target {
            score += RANK_COUNTRY_MISMATCH_PENALTY;
        }
    }

    if looks_like_venue_homepage(&text, result) {
        score += RANK_VENUE_HOMEPAGE_PENALTY;
    }

    let has_venue = result.venue.is_some() || result.address.is_some();
    if has_venue && result.starts_at.is_some() {
        score += RANK_VENUE_AND_DATE_BOOST;
    }

    if let (Some(target), Some(city)) = (target_city, &result.city) {
        if fold_accents(&city.to_lowercase()) == *target {
            score += RANK_CITY_MATCH_BOOST;
        }
    }

    if time_intent {
        if let Some(starts) = result.starts_at {
            let now = Utc::now();
            if starts > now && starts <= now + Duration::days(RANK_UPCOMING_WINDOW_DAYS) {
                score += RANK_UPCOMING_BOOST;
            }
        }
    }

    score
}

fn looks_like_aggregator(text: &str, url: Option<&str>) -> bool {
    if AGGREGATOR_TEXT_RE.is_match(text) {
        return true;
    }
    url.map(|u| AGGREGATOR_URL_RE.is_match(&u.to_lowercase()))
        .unwrap_or(false)
}

/// A bare venue homepage: generic contact/about phrasing with no specific
/// date signal.
fn looks_like_venue_homepage(text: &str, result: &SearchResult) -> bool {
    result.starts_at.is_none() && VENUE_HOMEPAGE_RE.is_match(text)
}

fn sort_by_start(results: &mut [SearchResult]) {
    results.sort_by(|a, b| match (a.starts_at, b.starts_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use eventa_core::ResultSource;

    fn result(title: &str, snippet: &str) -> SearchResult {
        SearchResult {
            source: ResultSource::External,
            id: None,
            title: title.to_string(),
            starts_at: Some(Utc::now() + Duration::days(3)),
            ends_at: None,
            venue: Some("Some Hall".to_string()),
            address: Some("1 Main St".to_string()),
            city: Some("Melbourne".to_string()),
            country: Some("Australia".to_string()),
            lat: None,
            lng: None,
            url: Some("https://example.com/event".to_string()),
            snippet: Some(snippet.to_string()),
            distance_km: None,
            categories: vec![],
            price_free: false,
            image_url: None,
            score: 0.0,
            normalized_title: String::new(),
        }
    }

    #[test]
    fn test_event_intent_classification() {
        assert!(is_event_intent_query("jazz this weekend"));
        assert!(is_event_intent_query("what can I do near me"));
        assert!(is_event_intent_query("concerts in melbourne"));
        assert!(is_event_intent_query("markets on saturday"));
        assert!(is_event_intent_query("anything on 2026-07-04"));
        assert!(!is_event_intent_query("contact support"));
        assert!(!is_event_intent_query("reset my password"));
    }

    #[test]
    fn test_venue_plus_date_beats_bare_homepage() {
        let concrete = result("Jazz at Some Hall", "Doors 8pm, live quartet");
        let mut homepage = result("Some Hall", "Contact us — about us — opening hours");
        homepage.starts_at = None;

        let ranked = rank_event_results(
            vec![homepage, concrete],
            "jazz this weekend",
            None,
            None,
        );
        assert_eq!(ranked[0].title, "Jazz at Some Hall");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_aggregator_is_demoted() {
        let concrete = result("Jazz at Some Hall", "Doors 8pm");
        let aggregator = result(
            "Best events in Melbourne",
            "Browse events happening this weekend",
        );

        let ranked = rank_event_results(
            vec![aggregator, concrete],
            "jazz this weekend",
            None,
            None,
        );
        assert_eq!(ranked[0].title, "Jazz at Some Hall");
    }

    #[test]
    fn test_aggregator_url_pattern() {
        let mut listing = result("Jazz nights", "All the jazz");
        listing.url = Some("https://www.eventbrite.com.au/d/australia--melbourne/jazz/".into());
        let concrete = result("Jazz at Some Hall", "Doors 8pm");

        let ranked = rank_event_results(vec![listing, concrete], "jazz tonight", None, None);
        assert_eq!(ranked[0].title, "Jazz at Some Hall");
    }

    #[test]
    fn test_country_mismatch_penalty() {
        let local = result("Jazz at Some Hall", "Doors 8pm");
        let mut foreign = result("Jazz at Other Hall", "Doors 8pm");
        foreign.country = Some("Austria".to_string());

        let ranked = rank_event_results(
            vec![foreign, local],
            "jazz this weekend",
            None,
            Some("australia"),
        );
        assert_eq!(ranked[0].title, "Jazz at Some Hall");
    }

    #[test]
    fn test_city_match_boost() {
        let here = result("Jazz A", "Live set");
        let mut there = result("Jazz B", "Live set");
        there.city = Some("Sydney".to_string());

        let ranked = rank_event_results(
            vec![there, here],
            "jazz this weekend",
            Some("melbourne"),
            None,
        );
        assert_eq!(ranked[0].title, "Jazz A");
    }

    #[test]
    fn test_non_event_intent_sorts_by_start_time() {
        let mut early = result("A", "x");
        early.starts_at = Some(Utc::now() + Duration::days(1));
        early.score = -100.0;
        let mut late = result("B", "x");
        late.starts_at = Some(Utc::now() + Duration::days(10));
        late.score = 100.0;

        let ranked = rank_event_results(vec![late, early], "contact support", None, None);
        assert_eq!(ranked[0].title, "A");
        // Scores untouched on the bypass path
        assert_eq!(ranked[0].score, -100.0);
    }

    #[test]
    fn test_upcoming_boost_requires_time_intent() {
        let soon = result("Jazz Soon", "Live set");
        let mut distant = result("Jazz Later", "Live set");
        distant.starts_at = Some(Utc::now() + Duration::days(90));

        let ranked = rank_event_results(
            vec![distant, soon],
            "jazz this weekend",
            None,
            None,
        );
        assert_eq!(ranked[0].title, "Jazz Soon");
    }
}
