//! Raw provider result validation and normalization.
//!
//! Each raw item must pass schema validation (required fields present and
//! well-typed) and a content safety filter before it is normalized to the
//! common [`SearchResult`] shape. Failures are counted separately per
//! provider rather than silently discarded.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use eventa_core::defaults::REFERENCE_TZ;
use eventa_core::models::{EventCategory, RawProviderEvent, ResultSource, SearchResult};
use eventa_core::phrase::parse_time;

/// Why a raw provider item was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Required fields missing or malformed.
    Schema,
    /// Content safety filter match.
    Safety,
}

/// Terms that fail the content policy outright. Matched on lowercased
/// title + description.
const SAFETY_BLOCKLIST: &[&str] = &[
    "escort",
    "xxx",
    "adult only party",
    "firearms sale",
    "gun show",
    "betting tips",
    "casino bonus",
    "crypto giveaway",
    "pyramid scheme",
];

/// Validate a raw item against the schema and the safety filter.
pub fn validate_event(raw: &RawProviderEvent) -> Result<(), DropReason> {
    let title = raw.title.as_deref().unwrap_or("").trim();
    if title.is_empty() {
        return Err(DropReason::Schema);
    }

    let Some(date) = raw.date.as_deref() else {
        return Err(DropReason::Schema);
    };
    if NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").is_err() {
        return Err(DropReason::Schema);
    }

    // Time is optional, but a present one must be parseable.
    if let Some(time) = raw.time.as_deref() {
        if !time.trim().is_empty() && parse_time(time).is_none() {
            return Err(DropReason::Schema);
        }
    }

    if let Some(url) = raw.url.as_deref() {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DropReason::Schema);
        }
    }

    match (raw.lat, raw.lng) {
        (Some(lat), Some(lng)) => {
            if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
                return Err(DropReason::Schema);
            }
        }
        (None, None) => {}
        // One coordinate without the other is malformed
        _ => return Err(DropReason::Schema),
    }

    let text = format!(
        "{} {}",
        title.to_lowercase(),
        raw.description.as_deref().unwrap_or("").to_lowercase()
    );
    if SAFETY_BLOCKLIST.iter().any(|term| text.contains(term)) {
        return Err(DropReason::Safety);
    }

    Ok(())
}

/// Normalize a validated raw item to the common result shape.
///
/// The start timestamp composes the provider date with its optional time in
/// the platform reference timezone, defaulting to start-of-day when the
/// time is absent. Call only after [`validate_event`] has accepted the item.
pub fn normalize_event(provider: &str, raw: &RawProviderEvent) -> SearchResult {
    let date = raw
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());

    let time = raw
        .time
        .as_deref()
        .and_then(parse_time)
        .and_then(|hhmm| NaiveTime::parse_from_str(&hhmm, "%H:%M").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is valid"));

    let starts_at = REFERENCE_TZ
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(time)));

    let categories = raw
        .category
        .as_deref()
        .and_then(|c| EventCategory::parse(&c.trim().to_lowercase()))
        .map(|c| vec![c])
        .unwrap_or_default();

    // Snippet-less items get a provider attribution so presentation can
    // still name the source.
    let snippet = raw
        .description
        .clone()
        .or_else(|| Some(format!("via {}", provider)));

    SearchResult {
        source: ResultSource::External,
        id: None,
        title: raw.title.clone().unwrap_or_default(),
        starts_at: Some(starts_at),
        ends_at: None,
        venue: raw.venue.clone(),
        address: raw.address.clone(),
        city: raw.city.clone(),
        country: raw.country.clone(),
        lat: raw.lat,
        lng: raw.lng,
        url: raw.url.clone(),
        snippet,
        distance_km: None,
        categories,
        price_free: raw.price_free.unwrap_or(false),
        image_url: raw.image_url.clone(),
        score: 0.0,
        // Left empty; the dedup pass computes it lazily.
        normalized_title: String::new(),
    }
}
