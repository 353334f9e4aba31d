//! # eventa-gateway
//!
//! External provider fan-out for the Eventa search pipeline.
//!
//! Whitelisted providers are queried concurrently; each call is
//! independently rate-limited (sliding window), circuit-broken, and bounded
//! by a hard timeout. Raw results pass schema validation and a content
//! safety filter before normalization, and per-provider outcomes are
//! aggregated for observability. Partial failures never fail the overall
//! gateway call.

pub mod breaker;
pub mod gateway;
pub mod http;
pub mod limiter;
pub mod provider;

pub use breaker::{CircuitBreaker, CircuitDecision};
pub use gateway::{GatewayConfig, GatewayOutcome, GatewayState, ProviderGateway};
pub use http::HttpProvider;
pub use limiter::SlidingWindowLimiter;
pub use provider::{normalize_event, validate_event, DropReason};
