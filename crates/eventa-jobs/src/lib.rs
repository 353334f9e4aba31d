//! # eventa-jobs
//!
//! Background job processing for Eventa.
//!
//! AI moderation runs as queued work with its own retry and failure
//! observability, decoupled from the request/response cycle: submissions
//! queue a job, the polling worker claims it, the handler calls the
//! moderation backend and applies the verdict.

pub mod handler;
pub mod moderation;
pub mod worker;

pub use handler::{JobContext, JobHandler, JobResult};
pub use moderation::ModerationHandler;
pub use worker::{ModerationWorker, WorkerConfig, WorkerEvent, WorkerHandle};
