//! # eventa-core
//!
//! Core types, traits, and abstractions for the Eventa community events
//! platform.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other Eventa crates depend on: the event and search-result
//! models, the error taxonomy, the date/time phrase parser, language
//! detection and query normalization, and the tunable constants shared by
//! the search pipeline.

pub mod defaults;
pub mod error;
pub mod geo;
pub mod language;
pub mod logging;
pub mod models;
pub mod phrase;
pub mod temporal;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, ErrorCode, Result};
pub use geo::haversine_km;
pub use language::{detect_language, normalize_query, Lang, NormalizedQuery};
pub use models::*;
pub use phrase::{
    detect_time_conflicts, is_past_date_time, is_weekend_phrase, parse_date_phrase, parse_time,
};
pub use temporal::DateRange;
pub use traits::*;
