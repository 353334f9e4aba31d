//! HTTP request handlers.

pub mod events;
pub mod search;

pub use events::{create_event, get_event, update_event};
pub use search::{run_search_pipeline, search, SearchDeps, SearchRequest};
