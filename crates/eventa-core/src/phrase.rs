//! Natural-language date and time phrase parsing.
//!
//! Converts phrases like "this weekend", "next friday", "domani" or "8pm"
//! into calendar values anchored in the platform reference timezone
//! ([`crate::defaults::REFERENCE_TZ`]). All "now"-relative computation uses
//! the reference zone regardless of caller locale, so the same phrase
//! resolves identically for every user at a given instant.
//!
//! Multilingual input (Italian, Greek, Spanish, French) is translated
//! token-for-token into English via an exact-match dictionary before
//! parsing; untranslatable tokens pass through unchanged and typically fail
//! to parse.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults::REFERENCE_TZ;

static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{1,2}))?\s*(am|pm)?\b").expect("valid time regex")
});

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid iso date regex"));

/// Weekday name → index on the 0=Sunday..6=Saturday convention.
fn weekday_index(name: &str) -> Option<u32> {
    match name {
        "sunday" => Some(0),
        "monday" => Some(1),
        "tuesday" => Some(2),
        "wednesday" => Some(3),
        "thursday" => Some(4),
        "friday" => Some(5),
        "saturday" => Some(6),
        _ => None,
    }
}

/// Month name → 1-based month number.
fn month_number(name: &str) -> Option<u32> {
    match name {
        "january" => Some(1),
        "february" => Some(2),
        "march" => Some(3),
        "april" => Some(4),
        "may" => Some(5),
        "june" => Some(6),
        "july" => Some(7),
        "august" => Some(8),
        "september" => Some(9),
        "october" => Some(10),
        "november" => Some(11),
        "december" => Some(12),
        _ => None,
    }
}

/// Exact-match dictionary entry: foreign token → English token.
fn translate_token(token: &str) -> &str {
    match token {
        // Italian
        "oggi" => "today",
        "domani" => "tomorrow",
        "questo" | "questa" => "this",
        "prossimo" | "prossima" => "next",
        "weekend" => "weekend",
        "mese" => "month",
        "lunedì" | "lunedi" => "monday",
        "martedì" | "martedi" => "tuesday",
        "mercoledì" | "mercoledi" => "wednesday",
        "giovedì" | "giovedi" => "thursday",
        "venerdì" | "venerdi" => "friday",
        "sabato" => "saturday",
        "domenica" => "sunday",
        "gennaio" => "january",
        "febbraio" => "february",
        "marzo" => "march",
        "aprile" => "april",
        "maggio" => "may",
        "giugno" => "june",
        "luglio" => "july",
        "agosto" => "august",
        "settembre" => "september",
        "ottobre" => "october",
        "novembre" => "november",
        "dicembre" => "december",
        // Spanish
        "hoy" => "today",
        "mañana" | "manana" => "tomorrow",
        "este" | "esta" => "this",
        "próximo" | "proximo" | "próxima" | "proxima" => "next",
        "mes" => "month",
        "lunes" => "monday",
        "martes" => "tuesday",
        "miércoles" | "miercoles" => "wednesday",
        "jueves" => "thursday",
        "viernes" => "friday",
        "sábado" | "sabado" => "saturday",
        "domingo" => "sunday",
        "enero" => "january",
        "febrero" => "february",
        "abril" => "april",
        "mayo" => "may",
        "junio" => "june",
        "julio" => "july",
        "septiembre" => "september",
        "octubre" => "october",
        "noviembre" => "november",
        "diciembre" => "december",
        // French
        "aujourd'hui" => "today",
        "demain" => "tomorrow",
        "ce" | "cette" => "this",
        "prochain" | "prochaine" => "next",
        "mois" => "month",
        "lundi" => "monday",
        "mardi" => "tuesday",
        "mercredi" => "wednesday",
        "jeudi" => "thursday",
        "vendredi" => "friday",
        "samedi" => "saturday",
        "dimanche" => "sunday",
        "janvier" => "january",
        "février" | "fevrier" => "february",
        "mars" => "march",
        "avril" => "april",
        "mai" => "may",
        "juin" => "june",
        "juillet" => "july",
        "août" | "aout" => "august",
        "septembre" => "september",
        "octobre" => "october",
        "novembre" => "november",
        "décembre" | "decembre" => "december",
        // Greek
        "σήμερα" => "today",
        "αύριο" => "tomorrow",
        "αυτό" | "αυτή" => "this",
        "επόμενο" | "επόμενη" => "next",
        "σαββατοκύριακο" => "weekend",
        "μήνας" | "μήνα" => "month",
        "δευτέρα" => "monday",
        "τρίτη" => "tuesday",
        "τετάρτη" => "wednesday",
        "πέμπτη" => "thursday",
        "παρασκευή" => "friday",
        "σάββατο" => "saturday",
        "κυριακή" => "sunday",
        other => other,
    }
}

/// Translate a whole phrase token-for-token into English.
fn translate_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(translate_token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Current date in the reference timezone.
pub fn reference_today() -> NaiveDate {
    Utc::now().with_timezone(&REFERENCE_TZ).date_naive()
}

/// Parse a natural-language date phrase into a calendar date.
///
/// Recognized phrases: `today`, `tomorrow`, `this <weekday>`,
/// `next <weekday>`, `this weekend`, `next month`, explicit `YYYY-MM-DD`,
/// and `<month name> [year]`. Returns `None` for anything else.
pub fn parse_date_phrase(phrase: &str) -> Option<NaiveDate> {
    parse_date_phrase_at(phrase, reference_today())
}

/// Like [`parse_date_phrase`], with an explicit reference date so tests and
/// replayed requests are deterministic.
pub fn parse_date_phrase_at(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
    let normalized = translate_phrase(phrase.trim().to_lowercase().as_str());
    let text = normalized.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    match text {
        "today" | "tonight" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "this weekend" | "weekend" => return Some(upcoming_saturday(today)),
        "next month" => {
            let (y, m) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            return NaiveDate::from_ymd_opt(y, m, 1);
        }
        _ => {}
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        ["this", day] if weekday_index(day).is_some() => {
            let target = weekday_index(day).expect("checked above");
            let offset = (target + 7 - today_weekday_index(today)) % 7;
            Some(today + Duration::days(i64::from(offset)))
        }
        ["next", day] if weekday_index(day).is_some() => {
            let target = weekday_index(day).expect("checked above");
            let mut offset = (target + 7 - today_weekday_index(today)) % 7;
            // "next X" never resolves to the reference date itself
            if offset == 0 {
                offset = 7;
            }
            Some(today + Duration::days(i64::from(offset)))
        }
        [month] if month_number(month).is_some() => {
            let m = month_number(month).expect("checked above");
            // Month already past this year → assume next year
            let year = if m < today.month() {
                today.year() + 1
            } else {
                today.year()
            };
            NaiveDate::from_ymd_opt(year, m, 1)
        }
        [month, year] if month_number(month).is_some() => {
            let m = month_number(month).expect("checked above");
            let y: i32 = year.parse().ok()?;
            NaiveDate::from_ymd_opt(y, m, 1)
        }
        _ => None,
    }
}

/// Weekday index of `date` on the 0=Sunday..6=Saturday convention.
fn today_weekday_index(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Whether a phrase refers to the weekend, in any supported language.
/// Weekend phrases resolve to a Saturday-through-Sunday window downstream.
pub fn is_weekend_phrase(phrase: &str) -> bool {
    translate_phrase(phrase.trim().to_lowercase().as_str())
        .split_whitespace()
        .any(|token| token == "weekend")
}

/// The Saturday "this weekend" refers to.
///
/// Always the upcoming Saturday: a Saturday resolves to itself, while a
/// Sunday rolls forward to the NEXT Saturday rather than looking back one
/// day. The Sunday behavior is intentional and regression-tested.
fn upcoming_saturday(today: NaiveDate) -> NaiveDate {
    let offset = (6 + 7 - today_weekday_index(today)) % 7;
    today + Duration::days(i64::from(offset))
}

/// Parse a time-of-day phrase into a zero-padded `"HH:MM"` string.
///
/// Accepts 12-hour (`8pm`, `8:30 pm`) and 24-hour (`20:00`) forms.
/// Rejects hour > 12 (or hour 0) with an am/pm suffix, hour > 23 without
/// one, minute > 59, and non-numeric fragments — returns `None` rather
/// than panicking.
pub fn parse_time(phrase: &str) -> Option<String> {
    let text = phrase.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let caps = TIME_RE.captures(&text)?;
    // The whole phrase must be the time, not merely contain one
    let m = caps.get(0)?;
    if m.start() != 0 || m.end() != text.len() {
        return None;
    }

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(min) => {
            // Reject single-digit minutes ("8:3pm") as malformed
            if min.as_str().len() != 2 {
                return None;
            }
            min.as_str().parse().ok()?
        }
        None => 0,
    };
    if minute > 59 {
        return None;
    }

    let hour24 = match caps.get(3).map(|s| s.as_str()) {
        Some("am") => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 {
                0
            } else {
                hour
            }
        }
        Some("pm") => {
            if hour == 0 || hour > 12 {
                return None;
            }
            if hour == 12 {
                12
            } else {
                hour + 12
            }
        }
        _ => {
            // Bare 24h form requires an explicit minute part ("20:00")
            caps.get(2)?;
            if hour > 23 {
                return None;
            }
            hour
        }
    };

    Some(format!("{:02}:{:02}", hour24, minute))
}

/// Whether the given date plus 24h time string lies in the past, judged in
/// the reference timezone.
///
/// Wall-clock times inside a spring-forward gap resolve by rolling forward
/// an hour; ambiguous fall-back times take the earliest instant. Either way
/// a single consistent instant is compared.
pub fn is_past_date_time(date: NaiveDate, time: &str) -> bool {
    let Some(parsed) = parse_time(time) else {
        return false;
    };
    let Ok(naive_time) = NaiveTime::parse_from_str(&parsed, "%H:%M") else {
        return false;
    };
    let naive = date.and_time(naive_time);

    let instant = match REFERENCE_TZ.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match REFERENCE_TZ.from_local_datetime(&shifted).earliest() {
                Some(dt) => dt,
                None => return false,
            }
        }
    };

    instant < Utc::now().with_timezone(&REFERENCE_TZ)
}

/// Scan free text for distinct parseable time-of-day mentions.
///
/// Returns the distinct set when more than one is found (signalling
/// ambiguous input), else `None`.
pub fn detect_time_conflicts(text: &str) -> Option<Vec<String>> {
    let lowered = text.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for caps in TIME_RE.captures_iter(&lowered) {
        let fragment = caps.get(0).map(|m| m.as_str().trim())?;
        // Bare numbers without a colon or suffix are not time mentions
        if caps.get(2).is_none() && caps.get(3).is_none() {
            continue;
        }
        if let Some(parsed) = parse_time(fragment) {
            if !found.contains(&parsed) {
                found.push(parsed);
            }
        }
    }

    if found.len() > 1 {
        Some(found)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-06-15 is a Monday
    const MONDAY: (i32, u32, u32) = (2026, 6, 15);

    fn monday() -> NaiveDate {
        date(MONDAY.0, MONDAY.1, MONDAY.2)
    }

    #[test]
    fn test_today_and_tomorrow() {
        assert_eq!(parse_date_phrase_at("today", monday()), Some(monday()));
        assert_eq!(
            parse_date_phrase_at("tomorrow", monday()),
            Some(date(2026, 6, 16))
        );
    }

    #[test]
    fn test_explicit_iso_date() {
        assert_eq!(
            parse_date_phrase_at("2026-12-24", monday()),
            Some(date(2026, 12, 24))
        );
        assert_eq!(parse_date_phrase_at("2026-13-01", monday()), None);
    }

    #[test]
    fn test_this_weekday_can_be_today() {
        assert_eq!(parse_date_phrase_at("this monday", monday()), Some(monday()));
        assert_eq!(
            parse_date_phrase_at("this friday", monday()),
            Some(date(2026, 6, 19))
        );
    }

    #[test]
    fn test_next_weekday_never_returns_reference_date() {
        // For every weekday, "next <w>" from every reference date is
        // strictly in the future.
        let names = [
            "sunday",
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
        ];
        for offset in 0..7 {
            let today = monday() + Duration::days(offset);
            for name in names {
                let phrase = format!("next {}", name);
                let resolved = parse_date_phrase_at(&phrase, today).unwrap();
                assert!(
                    resolved > today,
                    "next {} from {} resolved to {}",
                    name,
                    today,
                    resolved
                );
                assert!(resolved - today <= Duration::days(7));
            }
        }
    }

    #[test]
    fn test_next_same_weekday_rolls_a_full_week() {
        // Monday + "next monday" = one week out, not today
        assert_eq!(
            parse_date_phrase_at("next monday", monday()),
            Some(date(2026, 6, 22))
        );
    }

    #[test]
    fn test_this_weekend_on_a_weekday() {
        // Monday 2026-06-15 → Saturday 2026-06-20
        assert_eq!(
            parse_date_phrase_at("this weekend", monday()),
            Some(date(2026, 6, 20))
        );
    }

    #[test]
    fn test_this_weekend_on_saturday_is_today() {
        let saturday = date(2026, 6, 20);
        assert_eq!(
            parse_date_phrase_at("this weekend", saturday),
            Some(saturday)
        );
    }

    #[test]
    fn test_this_weekend_on_sunday_rolls_to_next_saturday() {
        // Deliberate quirk: Sunday does not look back to yesterday's
        // Saturday, it rolls forward to the next one.
        let sunday = date(2026, 6, 21);
        assert_eq!(
            parse_date_phrase_at("this weekend", sunday),
            Some(date(2026, 6, 27))
        );
    }

    #[test]
    fn test_this_weekend_on_sunday_across_dst_transitions() {
        // Spring-forward Sunday (Brussels, 2026-03-29) and fall-back
        // Sunday (2026-10-25) behave identically to any other Sunday.
        let spring_sunday = date(2026, 3, 29);
        assert_eq!(
            parse_date_phrase_at("this weekend", spring_sunday),
            Some(date(2026, 4, 4))
        );
        let fall_sunday = date(2026, 10, 25);
        assert_eq!(
            parse_date_phrase_at("this weekend", fall_sunday),
            Some(date(2026, 10, 31))
        );
    }

    #[test]
    fn test_next_month() {
        assert_eq!(
            parse_date_phrase_at("next month", monday()),
            Some(date(2026, 7, 1))
        );
        assert_eq!(
            parse_date_phrase_at("next month", date(2026, 12, 3)),
            Some(date(2027, 1, 1))
        );
    }

    #[test]
    fn test_month_name_already_past_assumes_next_year() {
        // Reference is June; "march" has passed
        assert_eq!(
            parse_date_phrase_at("march", monday()),
            Some(date(2027, 3, 1))
        );
        // "october" is still ahead
        assert_eq!(
            parse_date_phrase_at("october", monday()),
            Some(date(2026, 10, 1))
        );
        // Explicit year wins
        assert_eq!(
            parse_date_phrase_at("march 2026", monday()),
            Some(date(2026, 3, 1))
        );
    }

    #[test]
    fn test_multilingual_translation() {
        assert_eq!(parse_date_phrase_at("domani", monday()), Some(date(2026, 6, 16)));
        assert_eq!(parse_date_phrase_at("hoy", monday()), Some(monday()));
        assert_eq!(
            parse_date_phrase_at("ce samedi", monday()),
            Some(date(2026, 6, 20))
        );
        assert_eq!(
            parse_date_phrase_at("questo weekend", monday()),
            Some(date(2026, 6, 20))
        );
        assert_eq!(parse_date_phrase_at("σήμερα", monday()), Some(monday()));
        assert_eq!(
            parse_date_phrase_at("prossimo venerdì", monday()),
            Some(date(2026, 6, 19))
        );
    }

    #[test]
    fn test_unparseable_phrases_return_none() {
        assert_eq!(parse_date_phrase_at("whenever", monday()), None);
        assert_eq!(parse_date_phrase_at("", monday()), None);
        assert_eq!(parse_date_phrase_at("next blursday", monday()), None);
    }

    #[test]
    fn test_parse_time_12h() {
        assert_eq!(parse_time("8pm"), Some("20:00".to_string()));
        assert_eq!(parse_time("8:30 pm"), Some("20:30".to_string()));
        assert_eq!(parse_time("8:30am"), Some("08:30".to_string()));
        assert_eq!(parse_time("12am"), Some("00:00".to_string()));
        assert_eq!(parse_time("12pm"), Some("12:00".to_string()));
    }

    #[test]
    fn test_parse_time_24h() {
        assert_eq!(parse_time("20:00"), Some("20:00".to_string()));
        assert_eq!(parse_time("09:05"), Some("09:05".to_string()));
        assert_eq!(parse_time("23:59"), Some("23:59".to_string()));
    }

    #[test]
    fn test_parse_time_rejects_invalid() {
        // hour > 12 with suffix
        assert_eq!(parse_time("13pm"), None);
        assert_eq!(parse_time("23pm"), None);
        // hour 0 with suffix
        assert_eq!(parse_time("0am"), None);
        // hour > 23 bare
        assert_eq!(parse_time("24:00"), None);
        // minute > 59
        assert_eq!(parse_time("8:75pm"), None);
        assert_eq!(parse_time("20:60"), None);
        // non-numeric / malformed
        assert_eq!(parse_time("eightpm"), None);
        assert_eq!(parse_time("-8pm"), None);
        assert_eq!(parse_time(""), None);
        // bare hour without colon or suffix is ambiguous
        assert_eq!(parse_time("20"), None);
    }

    #[test]
    fn test_parse_time_idempotent_on_valid_24h() {
        for input in ["00:00", "08:30", "12:00", "20:00", "23:59"] {
            let once = parse_time(input).unwrap();
            let twice = parse_time(&once).unwrap();
            assert_eq!(once, twice);
            assert_eq!(once, input);
        }
    }

    #[test]
    fn test_is_past_date_time() {
        assert!(is_past_date_time(date(2000, 1, 1), "12:00"));
        assert!(!is_past_date_time(date(2100, 1, 1), "12:00"));
    }

    #[test]
    fn test_is_past_inside_spring_forward_gap() {
        // 02:30 does not exist on 2026-03-29 in Brussels; the call must
        // still resolve to a single instant without panicking.
        let _ = is_past_date_time(date(2026, 3, 29), "02:30");
    }

    #[test]
    fn test_detect_time_conflicts() {
        assert_eq!(
            detect_time_conflicts("doors at 7pm, show at 8:30pm"),
            Some(vec!["19:00".to_string(), "20:30".to_string()])
        );
        assert_eq!(detect_time_conflicts("starts at 8pm"), None);
        assert_eq!(detect_time_conflicts("no times here"), None);
        // Repeated identical mentions are not a conflict
        assert_eq!(detect_time_conflicts("8pm doors, 8pm start"), None);
    }
}
