//! Query language detection and normalization.
//!
//! Detection combines stopword-frequency scoring (for text long enough to
//! carry a signal) with script-class heuristics (Greek text is identified
//! directly from its script), falling back to the platform default. It
//! never fails: every input gets a best-effort language code.
//!
//! Normalization lowercases the query, produces an accent-folded
//! projection for matching against differently-accented stored text, and
//! expands recognized category keywords into canonical categories plus
//! human-readable synonyms.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_script::{Script, UnicodeScript};

use crate::models::EventCategory;

/// Supported UI languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Fr,
    Es,
    It,
    El,
}

impl Lang {
    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Fr => "fr",
            Lang::Es => "es",
            Lang::It => "it",
            Lang::El => "el",
        }
    }

    /// Parse an ISO 639-1 code, mapping unknown codes to the default.
    pub fn from_code(code: &str) -> Self {
        match code {
            "fr" => Lang::Fr,
            "es" => Lang::Es,
            "it" => Lang::It,
            "el" => Lang::El,
            _ => Lang::En,
        }
    }
}

/// Minimum text length for stopword-frequency detection to be attempted.
const MIN_STATISTICAL_LEN: usize = 10;

const EN_STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "what", "where", "when", "near", "tonight",
    "weekend", "today", "tomorrow",
];
const FR_STOPWORDS: &[&str] = &[
    "le", "la", "les", "des", "et", "pour", "avec", "ce", "cette", "où", "quoi", "demain",
    "aujourd'hui", "soir",
];
const ES_STOPWORDS: &[&str] = &[
    "el", "los", "las", "y", "para", "con", "este", "esta", "dónde", "qué", "mañana", "hoy",
    "noche", "cerca",
];
const IT_STOPWORDS: &[&str] = &[
    "il", "lo", "gli", "le", "e", "per", "con", "questo", "questa", "dove", "cosa", "domani",
    "oggi", "stasera", "vicino",
];

/// Detect the language of a query. Never fails.
pub fn detect_language(text: &str) -> Lang {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Lang::En;
    }

    // Script heuristic first: Greek script identifies Greek directly,
    // regardless of length.
    if has_greek_script(trimmed) {
        return Lang::El;
    }

    if trimmed.chars().count() >= MIN_STATISTICAL_LEN {
        let lowered = trimmed.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .collect();

        let scores = [
            (Lang::En, stopword_hits(&tokens, EN_STOPWORDS)),
            (Lang::Fr, stopword_hits(&tokens, FR_STOPWORDS)),
            (Lang::Es, stopword_hits(&tokens, ES_STOPWORDS)),
            (Lang::It, stopword_hits(&tokens, IT_STOPWORDS)),
        ];

        if let Some((lang, best)) = scores.iter().max_by_key(|(_, score)| *score) {
            if *best > 0 {
                return *lang;
            }
        }
    }

    Lang::En
}

fn stopword_hits(tokens: &[&str], stopwords: &[&str]) -> usize {
    tokens.iter().filter(|t| stopwords.contains(*t)).count()
}

fn has_greek_script(text: &str) -> bool {
    text.chars().any(|c| c.script() == Script::Greek)
}

/// Strip diacritics by compatibility decomposition, dropping combining
/// marks. "Café" → "Cafe", "Düsseldorf" → "Dusseldorf".
pub fn fold_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// A normalized query with category expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    /// Lowercased original.
    pub normalized: String,
    /// Lowercased, accent-folded projection.
    pub folded: String,
    /// Human-readable synonyms contributed by category keywords.
    pub synonyms: Vec<String>,
    /// Canonical categories the query maps onto.
    pub categories: Vec<EventCategory>,
}

/// Category keyword table: keyword → (category, synonyms).
///
/// Keywords are matched on the accent-folded query, so "concierto" and
/// "concerto" both land on the folded forms below.
fn category_for_keyword(keyword: &str) -> Option<(EventCategory, &'static [&'static str])> {
    match keyword {
        "jazz" => Some((EventCategory::MusicNightlife, &["Jazz", "Music"])),
        "music" | "musique" | "musica" => Some((EventCategory::MusicNightlife, &["Music"])),
        "concert" | "concierto" | "concerto" | "gig" => {
            Some((EventCategory::MusicNightlife, &["Concert", "Live Music"]))
        }
        "dj" | "club" | "clubbing" | "nightlife" => {
            Some((EventCategory::MusicNightlife, &["Nightlife"]))
        }
        "festival" => Some((EventCategory::MusicNightlife, &["Festival"])),
        "market" | "mercato" | "mercado" | "marche" => {
            Some((EventCategory::Markets, &["Market"]))
        }
        "theatre" | "theater" | "teatro" => Some((EventCategory::ArtsCulture, &["Theatre"])),
        "exhibition" | "museum" | "museo" | "musee" | "gallery" | "art" => {
            Some((EventCategory::ArtsCulture, &["Exhibition", "Art"]))
        }
        "cinema" | "film" | "movie" => Some((EventCategory::ArtsCulture, &["Cinema"])),
        "food" | "dinner" | "brunch" | "tasting" | "cena" => {
            Some((EventCategory::FoodDrink, &["Food"]))
        }
        "wine" | "beer" | "vino" | "biere" | "cerveza" => {
            Some((EventCategory::FoodDrink, &["Drinks"]))
        }
        "run" | "running" | "yoga" | "fitness" | "match" | "marathon" => {
            Some((EventCategory::SportsFitness, &["Sports"]))
        }
        "kids" | "family" | "famiglia" | "familia" | "famille" => {
            Some((EventCategory::FamilyKids, &["Family", "Kids"]))
        }
        "tech" | "startup" | "conference" | "meetup" | "hackathon" => {
            Some((EventCategory::BusinessTech, &["Tech", "Networking"]))
        }
        "volunteer" | "community" | "neighborhood" | "neighbourhood" => {
            Some((EventCategory::Community, &["Community"]))
        }
        _ => None,
    }
}

/// Normalize a query for matching and expand category keywords.
///
/// The `lang` parameter is accepted for parity with the detection step;
/// keyword matching operates on the folded text, so it is currently
/// language-independent.
pub fn normalize_query(text: &str, _lang: Lang) -> NormalizedQuery {
    let normalized = text.trim().to_lowercase();
    let folded = fold_accents(&normalized);

    let mut synonyms: Vec<String> = Vec::new();
    let mut categories: Vec<EventCategory> = Vec::new();

    for token in folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if let Some((category, syns)) = category_for_keyword(token) {
            if !categories.contains(&category) {
                categories.push(category);
            }
            for syn in syns {
                if !synonyms.iter().any(|s| s == syn) {
                    synonyms.push((*syn).to_string());
                }
            }
        }
    }

    NormalizedQuery {
        normalized,
        folded,
        synonyms,
        categories,
    }
}
