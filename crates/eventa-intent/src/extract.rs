//! Deterministic post-processing around the LLM extractor.
//!
//! The LLM produces loosely structured entities; everything after that is
//! owned here and is fully deterministic: extracted dates are validated and
//! repaired against the canonical phrase parser, time conflicts are
//! surfaced, missing fields are computed for the create flow, and the
//! internal search plan is derived. When the LLM is unreachable, a
//! heuristic extractor produces a best-effort entity set from the raw text.

use chrono::NaiveDate;
use tracing::debug;

use eventa_core::language::{detect_language, normalize_query, Lang};
use eventa_core::models::{IntentKind, ProviderParams, QueryEntities, RawIntent};
use eventa_core::phrase::{
    detect_time_conflicts, is_past_date_time, is_weekend_phrase, parse_date_phrase_at, parse_time,
    reference_today,
};
use eventa_core::temporal::DateRange;
use eventa_core::traits::SearchPlan;
use eventa_search::is_event_intent_query;

/// Fully post-processed intent, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct RefinedIntent {
    pub intent: IntentKind,
    pub confidence: f32,
    /// Language the extractor reported, falling back to server-side
    /// detection.
    pub lang: Lang,
    /// Entities after date/time validation and repair.
    pub entities: QueryEntities,
    /// Natural-language paraphrase in the UI language, when provided.
    pub reply: Option<String>,
    /// Distinct parseable time-of-day mentions when more than one was
    /// found (ambiguous input).
    pub time_conflicts: Option<Vec<String>>,
    /// Required fields absent from a create-intent submission.
    pub missing_fields: Vec<&'static str>,
    /// The extracted date+time lies in the past (reference timezone).
    pub past_start: bool,
}

/// Validate and repair extracted entities against the canonical parsers.
///
/// A malformed `date_iso` is dropped and re-derived from the date phrase;
/// a missing one is filled in the same way. Times are normalized to
/// zero-padded 24-hour form or dropped.
pub fn repair_entities(mut entities: QueryEntities, today: NaiveDate) -> QueryEntities {
    let iso_valid = entities
        .date_iso
        .as_deref()
        .map(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").is_ok())
        .unwrap_or(false);

    if !iso_valid {
        entities.date_iso = entities
            .date_phrase
            .as_deref()
            .and_then(|phrase| parse_date_phrase_at(phrase, today))
            .map(|date| date.to_string());
    }

    entities.time = entities.time.as_deref().and_then(parse_time);
    entities
}

/// Derive the raw (un-expanded) date window from repaired entities.
///
/// Weekend phrases span Saturday through Sunday; everything else covers a
/// single calendar day.
pub fn derive_date_range(entities: &QueryEntities) -> Option<DateRange> {
    derive_date_range_at(entities, reference_today())
}

/// Like [`derive_date_range`], with an explicit reference date.
pub fn derive_date_range_at(entities: &QueryEntities, today: NaiveDate) -> Option<DateRange> {
    let date = entities
        .date_iso
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
        .or_else(|| {
            entities
                .date_phrase
                .as_deref()
                .and_then(|phrase| parse_date_phrase_at(phrase, today))
        })?;

    let weekend = entities
        .date_phrase
        .as_deref()
        .map(is_weekend_phrase)
        .unwrap_or(false);

    Some(if weekend {
        DateRange::for_dates(date, date + chrono::Duration::days(1))
    } else {
        DateRange::for_date(date)
    })
}

/// Required fields absent from a create-intent submission.
fn missing_create_fields(entities: &QueryEntities) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if entities.title.is_none() {
        missing.push("title");
    }
    if entities.date_iso.is_none() {
        missing.push("date");
    }
    if entities.time.is_none() {
        missing.push("time");
    }
    if entities.city.is_none() && entities.venue.is_none() {
        missing.push("location");
    }
    missing
}

/// Post-process a raw extraction into a [`RefinedIntent`].
pub fn refine_intent(raw: RawIntent, text: &str, ui_lang: Lang) -> RefinedIntent {
    refine_intent_at(raw, text, ui_lang, reference_today())
}

/// Like [`refine_intent`], with an explicit reference date.
pub fn refine_intent_at(
    raw: RawIntent,
    text: &str,
    ui_lang: Lang,
    today: NaiveDate,
) -> RefinedIntent {
    let lang = raw
        .language
        .as_deref()
        .map(Lang::from_code)
        .unwrap_or(ui_lang);

    let entities = repair_entities(raw.entities, today);

    let past_start = match (&entities.date_iso, &entities.time) {
        (Some(iso), Some(time)) => NaiveDate::parse_from_str(iso, "%Y-%m-%d")
            .map(|date| is_past_date_time(date, time))
            .unwrap_or(false),
        _ => false,
    };

    let missing_fields = if raw.intent == IntentKind::Create {
        missing_create_fields(&entities)
    } else {
        Vec::new()
    };

    RefinedIntent {
        intent: raw.intent,
        confidence: raw.confidence,
        lang,
        entities,
        reply: raw.reply,
        time_conflicts: detect_time_conflicts(text),
        missing_fields,
        past_start,
    }
}

/// Heuristic extraction used when the LLM backend is unavailable.
///
/// Runs candidate unigrams and bigrams through the canonical phrase and
/// time parsers instead of re-implementing them, and picks up a city from
/// "in <Name>" phrasing.
pub fn heuristic_intent(text: &str) -> RawIntent {
    heuristic_intent_at(text, reference_today())
}

/// Like [`heuristic_intent`], with an explicit reference date.
pub fn heuristic_intent_at(text: &str, today: NaiveDate) -> RawIntent {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let mut date_phrase = None;
    for window in tokens.windows(2) {
        let candidate = window.join(" ");
        if parse_date_phrase_at(&candidate, today).is_some() {
            date_phrase = Some(candidate);
            break;
        }
    }
    if date_phrase.is_none() {
        date_phrase = tokens
            .iter()
            .find(|t| parse_date_phrase_at(t, today).is_some())
            .map(|t| t.to_string());
    }

    let time = tokens
        .windows(2)
        .map(|w| w.join(" "))
        .chain(tokens.iter().map(|t| t.to_string()))
        // Bare small numbers are more likely counts than times
        .filter(|c| c.contains(':') || c.contains("am") || c.contains("pm"))
        .find_map(|c| parse_time(&c));

    // "in <Name>" on the original casing picks up a city
    let city = text.split_whitespace().collect::<Vec<_>>().windows(2).find_map(|w| {
        let first = w[0].to_lowercase();
        let second = w[1].trim_matches(|c: char| !c.is_alphanumeric());
        if (first == "in" || first == "à" || first == "en" || first == "a")
            && second.chars().next().map(char::is_uppercase).unwrap_or(false)
        {
            Some(second.to_string())
        } else {
            None
        }
    });

    debug!(
        subsystem = "intent",
        component = "heuristic",
        op = "extract",
        has_date = date_phrase.is_some(),
        has_city = city.is_some(),
        "Heuristic entity extraction"
    );

    RawIntent {
        intent: IntentKind::Search,
        confidence: 0.25,
        language: Some(detect_language(text).code().to_string()),
        entities: QueryEntities {
            date_phrase,
            time,
            city,
            ..Default::default()
        },
        reply: None,
    }
}

/// Derive the internal search plan from refined entities.
pub fn build_search_plan(
    text: &str,
    refined: &RefinedIntent,
    country: Option<String>,
    user_location: Option<(f64, f64)>,
    limit: i64,
) -> SearchPlan {
    build_search_plan_at(text, refined, country, user_location, limit, reference_today())
}

/// Like [`build_search_plan`], with an explicit reference date.
pub fn build_search_plan_at(
    text: &str,
    refined: &RefinedIntent,
    country: Option<String>,
    user_location: Option<(f64, f64)>,
    limit: i64,
    today: NaiveDate,
) -> SearchPlan {
    let normalized = normalize_query(text, refined.lang);

    // Category signals from the full query plus the extracted event type.
    let mut categories = normalized.categories.clone();
    let mut synonyms = normalized.synonyms.clone();
    if let Some(event_type) = refined.entities.event_type.as_deref() {
        let expanded = normalize_query(event_type, refined.lang);
        for category in expanded.categories {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        for synonym in expanded.synonyms {
            if !synonyms.contains(&synonym) {
                synonyms.push(synonym);
            }
        }
    }

    let date_range = derive_date_range_at(&refined.entities, today).map(DateRange::with_tolerance);

    SearchPlan {
        text: normalized.normalized,
        folded: normalized.folded,
        lang: refined.lang,
        synonyms,
        categories,
        city: refined.entities.city.clone(),
        country,
        venue: refined.entities.venue.clone(),
        date_range,
        time: refined.entities.time.clone(),
        event_intent: is_event_intent_query(text),
        user_location,
        limit,
    }
}

/// Normalized parameter set for the external provider fan-out.
pub fn provider_params(plan: &SearchPlan, entities: &QueryEntities) -> ProviderParams {
    let keywords: Vec<String> = plan
        .folded
        .split_whitespace()
        .take(8)
        .map(String::from)
        .collect();

    let date = entities
        .date_iso
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

    ProviderParams {
        keywords,
        category: plan.categories.first().copied(),
        city: plan.city.clone(),
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use eventa_core::models::EventCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-06-13 is a Saturday
    fn saturday() -> NaiveDate {
        date(2026, 6, 13)
    }

    #[test]
    fn test_repair_drops_malformed_iso_and_rederives() {
        let entities = QueryEntities {
            date_iso: Some("13/06/2026".to_string()),
            date_phrase: Some("tomorrow".to_string()),
            ..Default::default()
        };
        let repaired = repair_entities(entities, saturday());
        assert_eq!(repaired.date_iso.as_deref(), Some("2026-06-14"));
    }

    #[test]
    fn test_repair_fills_missing_iso_from_phrase() {
        let entities = QueryEntities {
            date_phrase: Some("domani".to_string()),
            ..Default::default()
        };
        let repaired = repair_entities(entities, saturday());
        assert_eq!(repaired.date_iso.as_deref(), Some("2026-06-14"));
    }

    #[test]
    fn test_repair_normalizes_time() {
        let entities = QueryEntities {
            time: Some("8pm".to_string()),
            ..Default::default()
        };
        let repaired = repair_entities(entities, saturday());
        assert_eq!(repaired.time.as_deref(), Some("20:00"));

        let entities = QueryEntities {
            time: Some("25:00".to_string()),
            ..Default::default()
        };
        let repaired = repair_entities(entities, saturday());
        assert!(repaired.time.is_none());
    }

    #[test]
    fn test_weekend_phrase_spans_saturday_and_sunday() {
        let entities = QueryEntities {
            date_phrase: Some("this weekend".to_string()),
            date_iso: Some("2026-06-13".to_string()),
            ..Default::default()
        };
        let range = derive_date_range_at(&entities, saturday()).unwrap();

        let saturday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 13, 18, 0, 0).unwrap();
        let sunday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 14, 18, 0, 0).unwrap();
        let monday = chrono::Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap();
        assert!(range.contains(saturday_evening));
        assert!(range.contains(sunday_evening));
        assert!(!range.contains(monday));
    }

    #[test]
    fn test_single_date_covers_one_day() {
        let entities = QueryEntities {
            date_iso: Some("2026-06-14".to_string()),
            ..Default::default()
        };
        let range = derive_date_range_at(&entities, saturday()).unwrap();
        let sunday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 14, 18, 0, 0).unwrap();
        let monday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 15, 18, 0, 0).unwrap();
        assert!(range.contains(sunday_evening));
        assert!(!range.contains(monday_evening));
    }

    #[test]
    fn test_refine_computes_missing_create_fields() {
        let raw = RawIntent {
            intent: IntentKind::Create,
            entities: QueryEntities {
                title: Some("Jazz Night".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let refined = refine_intent_at(raw, "host a jazz night", Lang::En, saturday());
        assert_eq!(refined.missing_fields, vec!["date", "time", "location"]);
    }

    #[test]
    fn test_refine_search_intent_has_no_missing_fields() {
        let raw = RawIntent {
            intent: IntentKind::Search,
            ..Default::default()
        };
        let refined = refine_intent_at(raw, "jazz tonight", Lang::En, saturday());
        assert!(refined.missing_fields.is_empty());
    }

    #[test]
    fn test_refine_surfaces_time_conflicts() {
        let raw = RawIntent::default();
        let refined = refine_intent_at(
            raw,
            "dinner at 7pm then the show at 9pm",
            Lang::En,
            saturday(),
        );
        let conflicts = refined.time_conflicts.unwrap();
        assert!(conflicts.contains(&"19:00".to_string()));
        assert!(conflicts.contains(&"21:00".to_string()));
    }

    #[test]
    fn test_refine_prefers_extractor_language() {
        let raw = RawIntent {
            language: Some("it".to_string()),
            ..Default::default()
        };
        let refined = refine_intent_at(raw, "concerti domani", Lang::En, saturday());
        assert_eq!(refined.lang, Lang::It);
    }

    #[test]
    fn test_heuristic_finds_bigram_date_phrase() {
        let raw = heuristic_intent_at("jazz this weekend in Melbourne", saturday());
        assert_eq!(raw.entities.date_phrase.as_deref(), Some("this weekend"));
        assert_eq!(raw.entities.city.as_deref(), Some("Melbourne"));
        assert_eq!(raw.intent, IntentKind::Search);
    }

    #[test]
    fn test_heuristic_finds_time() {
        let raw = heuristic_intent_at("concert tomorrow at 8:30 pm", saturday());
        assert_eq!(raw.entities.date_phrase.as_deref(), Some("tomorrow"));
        assert_eq!(raw.entities.time.as_deref(), Some("20:30"));
    }

    #[test]
    fn test_heuristic_ignores_bare_numbers_as_times() {
        let raw = heuristic_intent_at("top 5 markets today", saturday());
        assert!(raw.entities.time.is_none());
    }

    #[test]
    fn test_plan_derivation_end_to_end() {
        // The "Melbourne this weekend jazz" scenario on a Saturday
        let raw = RawIntent {
            intent: IntentKind::Search,
            confidence: 0.9,
            language: Some("en".to_string()),
            entities: QueryEntities {
                event_type: Some("jazz".to_string()),
                city: Some("Melbourne".to_string()),
                date_phrase: Some("this weekend".to_string()),
                ..Default::default()
            },
            reply: None,
        };
        let refined = refine_intent_at(raw, "Melbourne this weekend jazz", Lang::En, saturday());
        let plan = build_search_plan_at(
            "Melbourne this weekend jazz",
            &refined,
            Some("Australia".to_string()),
            None,
            20,
            saturday(),
        );

        assert!(plan.event_intent);
        assert_eq!(plan.city.as_deref(), Some("Melbourne"));
        assert!(plan.categories.contains(&EventCategory::MusicNightlife));

        let range = plan.date_range.unwrap();
        // Tolerance-expanded window still spans Saturday and Sunday
        let saturday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 13, 18, 0, 0).unwrap();
        let sunday_evening = chrono::Utc.with_ymd_and_hms(2026, 6, 14, 18, 0, 0).unwrap();
        assert!(range.contains(saturday_evening));
        assert!(range.contains(sunday_evening));
    }

    #[test]
    fn test_provider_params_derivation() {
        let raw = RawIntent {
            entities: QueryEntities {
                city: Some("Melbourne".to_string()),
                date_iso: Some("2026-06-13".to_string()),
                event_type: Some("jazz".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let refined = refine_intent_at(raw, "jazz this weekend", Lang::En, saturday());
        let plan = build_search_plan_at("jazz this weekend", &refined, None, None, 20, saturday());
        let params = provider_params(&plan, &refined.entities);

        assert!(params.keywords.contains(&"jazz".to_string()));
        assert_eq!(params.category, Some(EventCategory::MusicNightlife));
        assert_eq!(params.date, Some(date(2026, 6, 13)));
    }
}
