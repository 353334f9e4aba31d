//! # eventa-search
//!
//! In-process ranking library for the Eventa search pipeline:
//!
//! - Fuzzy string matching (edit distance, partial ratios) used by
//!   cross-source deduplication
//! - The secondary re-scoring pass over internal candidates
//! - Cross-source result deduplication and merge
//! - Event-intent classification and ranking of merged results

pub mod dedup;
pub mod fuzzy;
pub mod intent_rank;
pub mod rescore;

pub use dedup::{deduplicate, DedupOutcome};
pub use fuzzy::{levenshtein, normalize_title, partial_ratio, similarity_ratio};
pub use intent_rank::{is_event_intent_query, rank_event_results};
pub use rescore::rescore_events;
