//! # eventa-intent
//!
//! Intent extraction for the Eventa search and submission flows.
//!
//! Natural-language understanding is delegated to an LLM backend behind the
//! [`eventa_core::traits::IntentBackend`] seam; this crate owns the
//! deterministic post-processing around it: validating and repairing
//! extracted dates, detecting time conflicts, computing missing-field
//! lists for the create flow, and deriving the internal search plan.

pub mod backend;
pub mod extract;
pub mod mock;

pub use backend::LlmBackend;
pub use extract::{
    build_search_plan, derive_date_range, heuristic_intent, provider_params, refine_intent,
    RefinedIntent,
};
