//! Per-provider sliding-window rate limiting.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window call limiter keyed by provider name.
///
/// Counters are coarse liveness signals, not correctness-critical state;
/// a plain mutex around the per-provider queues is sufficient and keeps
/// updates from corrupting the window.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_calls: usize,
    calls: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter permitting `max_calls` per provider within `window`.
    pub fn new(window: Duration, max_calls: usize) -> Self {
        Self {
            window,
            max_calls,
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Record a call attempt for `provider` if the window permits one.
    ///
    /// Returns `false` without recording when the provider has already been
    /// called `max_calls` times in the trailing window.
    pub fn try_acquire(&self, provider: &str) -> bool {
        let now = Instant::now();
        let mut calls = self.calls.lock().expect("limiter mutex poisoned");
        let timestamps = calls.entry(provider.to_string()).or_default();

        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_calls {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    /// Calls currently recorded in the trailing window for `provider`.
    pub fn current_count(&self, provider: &str) -> usize {
        let now = Instant::now();
        let calls = self.calls.lock().expect("limiter mutex poisoned");
        calls
            .get(provider)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) <= self.window)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_calls() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 3);
        assert!(limiter.try_acquire("songkick"));
        assert!(limiter.try_acquire("songkick"));
        assert!(limiter.try_acquire("songkick"));
        assert!(!limiter.try_acquire("songkick"));
    }

    #[test]
    fn test_providers_are_limited_independently() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 1);
        assert!(limiter.try_acquire("songkick"));
        assert!(!limiter.try_acquire("songkick"));
        assert!(limiter.try_acquire("ticketfeed"));
    }

    #[test]
    fn test_window_expiry_frees_capacity() {
        let limiter = SlidingWindowLimiter::new(Duration::from_millis(30), 1);
        assert!(limiter.try_acquire("songkick"));
        assert!(!limiter.try_acquire("songkick"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.try_acquire("songkick"));
    }

    #[test]
    fn test_rejected_attempt_is_not_recorded() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(60), 2);
        assert!(limiter.try_acquire("songkick"));
        assert!(limiter.try_acquire("songkick"));
        assert!(!limiter.try_acquire("songkick"));
        assert_eq!(limiter.current_count("songkick"), 2);
    }
}
