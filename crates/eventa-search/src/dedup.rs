//! Cross-source result deduplication and merge.
//!
//! External providers frequently surface the same events the internal
//! catalogue already has. An external candidate is dropped when it lands on
//! the same date as an internal event and its title is a close fuzzy match
//! (a looser threshold applies when the venue/city corroborates). Internal
//! events are always preserved; the merge is internal-first and
//! deterministic for a given pair of inputs.

use tracing::debug;

use eventa_core::defaults::{DEDUP_TITLE_DISTANCE, DEDUP_TITLE_DISTANCE_VENUE};
use eventa_core::SearchResult;

use crate::fuzzy::{levenshtein, normalize_title};

/// Outcome of a deduplication pass.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Internal results, unchanged in content and length.
    pub internal: Vec<SearchResult>,
    /// External results that survived deduplication.
    pub external: Vec<SearchResult>,
    /// How many external candidates were dropped as duplicates.
    pub dropped: usize,
}

impl DedupOutcome {
    /// Merge internal-first into a single presentation list.
    pub fn merge(self) -> Vec<SearchResult> {
        let mut merged = self.internal;
        merged.extend(self.external);
        merged
    }
}

/// Drop external candidates that duplicate internal events.
pub fn deduplicate(internal: Vec<SearchResult>, external: Vec<SearchResult>) -> DedupOutcome {
    let internal_keys: Vec<(Option<chrono::NaiveDate>, String, Option<String>)> = internal
        .iter()
        .map(|result| {
            (
                result.start_date(),
                result.normalized_title.clone(),
                venue_key(result),
            )
        })
        .collect();

    let total = external.len();
    let surviving: Vec<SearchResult> = external
        .into_iter()
        .filter(|candidate| !is_duplicate(candidate, &internal_keys))
        .collect();
    let dropped = total - surviving.len();

    if dropped > 0 {
        debug!(
            subsystem = "search",
            component = "dedup",
            deduped_count = dropped,
            "Dropped external duplicates of internal events"
        );
    }

    DedupOutcome {
        internal,
        external: surviving,
        dropped,
    }
}

fn is_duplicate(
    candidate: &SearchResult,
    internal_keys: &[(Option<chrono::NaiveDate>, String, Option<String>)],
) -> bool {
    let Some(candidate_date) = candidate.start_date() else {
        return false;
    };
    let candidate_title = if candidate.normalized_title.is_empty() {
        normalize_title(&candidate.title)
    } else {
        candidate.normalized_title.clone()
    };
    let candidate_venue = venue_key(candidate);

    for (date, title, venue) in internal_keys {
        if *date != Some(candidate_date) {
            continue;
        }
        let distance = levenshtein(&candidate_title, title);
        if distance <= DEDUP_TITLE_DISTANCE {
            return true;
        }
        // Venue corroboration permits a looser title threshold
        if distance <= DEDUP_TITLE_DISTANCE_VENUE {
            if let (Some(a), Some(b)) = (&candidate_venue, venue) {
                if a == b {
                    return true;
                }
            }
        }
    }

    false
}

/// Normalized venue-or-city key used for corroborated matches.
fn venue_key(result: &SearchResult) -> Option<String> {
    result
        .venue
        .as_deref()
        .or(result.city.as_deref())
        .map(normalize_title)
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use eventa_core::ResultSource;

    fn result(
        source: ResultSource,
        title: &str,
        day: u32,
        venue: Option<&str>,
    ) -> SearchResult {
        SearchResult {
            source,
            id: None,
            title: title.to_string(),
            starts_at: Some(Utc.with_ymd_and_hms(2026, 12, day, 17, 0, 0).unwrap()),
            ends_at: None,
            venue: venue.map(String::from),
            address: None,
            city: Some("Brussels".to_string()),
            country: None,
            lat: None,
            lng: None,
            url: None,
            snippet: None,
            distance_km: None,
            categories: vec![],
            price_free: false,
            image_url: None,
            score: 0.0,
            normalized_title: normalize_title(title),
        }
    }

    #[test]
    fn test_internal_set_is_always_preserved() {
        let internal = vec![
            result(ResultSource::Internal, "Brussels Xmas Market", 12, None),
            result(ResultSource::Internal, "Canal Jazz Night", 12, None),
        ];
        let external = vec![
            result(ResultSource::External, "Brussels Xmas Market", 12, None),
            result(ResultSource::External, "Totally Different Expo", 12, None),
        ];

        let outcome = deduplicate(internal.clone(), external);
        assert_eq!(outcome.internal.len(), internal.len());
    }

    #[test]
    fn test_same_date_close_title_is_dropped() {
        let internal = vec![result(
            ResultSource::Internal,
            "Brussels Xmas Market",
            12,
            None,
        )];
        // "Christmas" canonicalizes to "xmas", so the distance is 0
        let external = vec![result(
            ResultSource::External,
            "Brussels Christmas Market",
            12,
            None,
        )];

        let outcome = deduplicate(internal, external);
        assert_eq!(outcome.external.len(), 0);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_different_date_survives() {
        let internal = vec![result(
            ResultSource::Internal,
            "Brussels Xmas Market",
            12,
            None,
        )];
        let external = vec![result(
            ResultSource::External,
            "Brussels Xmas Market",
            13,
            None,
        )];

        let outcome = deduplicate(internal, external);
        assert_eq!(outcome.external.len(), 1);
        assert_eq!(outcome.dropped, 0);
    }

    #[test]
    fn test_venue_corroboration_loosens_threshold() {
        let internal = vec![result(
            ResultSource::Internal,
            "Winter Lights Show",
            12,
            Some("Grand Place"),
        )];
        // Title distance > 2 but <= 5; same venue on the same date
        let external = vec![result(
            ResultSource::External,
            "Winter Lights Gala Show",
            12,
            Some("Grand Place"),
        )];
        let distance = levenshtein(
            &normalize_title("Winter Lights Show"),
            &normalize_title("Winter Lights Gala Show"),
        );
        assert!(distance > 2 && distance <= 5, "distance {}", distance);

        let outcome = deduplicate(internal, external);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_loose_title_without_venue_match_survives() {
        let internal = vec![result(
            ResultSource::Internal,
            "Winter Lights Show",
            12,
            Some("Grand Place"),
        )];
        let external = vec![result(
            ResultSource::External,
            "Winter Lights Gala Show",
            12,
            Some("Atomium"),
        )];

        let outcome = deduplicate(internal, external);
        assert_eq!(outcome.dropped, 0);
    }

    #[test]
    fn test_external_without_date_survives() {
        let internal = vec![result(
            ResultSource::Internal,
            "Brussels Xmas Market",
            12,
            None,
        )];
        let mut dateless = result(ResultSource::External, "Brussels Xmas Market", 12, None);
        dateless.starts_at = None;

        let outcome = deduplicate(internal, vec![dateless]);
        assert_eq!(outcome.external.len(), 1);
    }

    #[test]
    fn test_merge_is_internal_first_and_deterministic() {
        let internal = vec![result(ResultSource::Internal, "A", 12, None)];
        let external = vec![result(ResultSource::External, "B", 12, None)];

        let once = deduplicate(internal.clone(), external.clone()).merge();
        let twice = deduplicate(internal, external).merge();

        assert_eq!(once.len(), 2);
        assert_eq!(once[0].source, ResultSource::Internal);
        assert_eq!(once[1].source, ResultSource::External);
        let titles: Vec<&str> = once.iter().map(|r| r.title.as_str()).collect();
        let titles2: Vec<&str> = twice.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, titles2);
    }
}
