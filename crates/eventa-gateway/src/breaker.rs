//! Per-provider circuit breaking.
//!
//! After a threshold of consecutive failures a provider's circuit opens and
//! calls are rejected immediately for a cooldown period. When the cooldown
//! elapses, a single trial call is permitted; its outcome either closes the
//! circuit or re-opens it for another cooldown.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// What the breaker decided for a call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitDecision {
    /// Circuit closed, call freely.
    Allow,
    /// Cooldown elapsed; this is the single half-open trial call.
    AllowTrial,
    /// Circuit open (or a trial is already in flight); do not call.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Entry {
    failures: u32,
    state: State,
    opened_at: Option<Instant>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            failures: 0,
            state: State::Closed,
            opened_at: None,
        }
    }
}

/// Consecutive-failure circuit breaker keyed by provider name.
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `threshold` consecutive failures
    /// and stays open for `cooldown`.
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold,
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether a call to `provider` may proceed.
    pub fn check(&self, provider: &str) -> CircuitDecision {
        let mut entries = self.entries.lock().expect("breaker mutex poisoned");
        let entry = entries.entry(provider.to_string()).or_default();

        match entry.state {
            State::Closed => CircuitDecision::Allow,
            State::HalfOpen => CircuitDecision::Reject,
            State::Open => {
                let elapsed = entry
                    .opened_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if elapsed {
                    entry.state = State::HalfOpen;
                    CircuitDecision::AllowTrial
                } else {
                    CircuitDecision::Reject
                }
            }
        }
    }

    /// Record a successful call: the circuit closes and the failure count
    /// resets.
    pub fn record_success(&self, provider: &str) {
        let mut entries = self.entries.lock().expect("breaker mutex poisoned");
        let entry = entries.entry(provider.to_string()).or_default();
        entry.failures = 0;
        entry.state = State::Closed;
        entry.opened_at = None;
    }

    /// Record a failed call. Reaching the threshold (or failing the
    /// half-open trial) opens the circuit and starts a fresh cooldown.
    pub fn record_failure(&self, provider: &str) {
        let mut entries = self.entries.lock().expect("breaker mutex poisoned");
        let entry = entries.entry(provider.to_string()).or_default();
        entry.failures = entry.failures.saturating_add(1);

        if entry.state == State::HalfOpen || entry.failures >= self.threshold {
            entry.state = State::Open;
            entry.opened_at = Some(Instant::now());
        }
    }

    /// Consecutive failures currently recorded for `provider`.
    pub fn failure_count(&self, provider: &str) -> u32 {
        let entries = self.entries.lock().expect("breaker mutex poisoned");
        entries.get(provider).map(|e| e.failures).unwrap_or(0)
    }
}
