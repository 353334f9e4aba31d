//! Concurrent provider fan-out.
//!
//! All configured providers are queried concurrently and settled
//! independently; a provider that is rate-limited, circuit-open, timed out,
//! or unreachable contributes a typed per-provider outcome instead of
//! failing the aggregate call.
//!
//! Rate-limiter and circuit-breaker state lives in an explicit
//! [`GatewayState`] container owned by the gateway instance rather than an
//! ambient module-level singleton, so tests inject fresh state per case.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tracing::{debug, warn};

use eventa_core::defaults::{
    CIRCUIT_COOLDOWN_SECS, CIRCUIT_FAILURE_THRESHOLD, PROVIDER_RATE_MAX_CALLS,
    PROVIDER_RATE_WINDOW_SECS, PROVIDER_TIMEOUT_MS,
};
use eventa_core::models::{ProviderCallResult, ProviderErrorCode, ProviderParams, SearchResult};
use eventa_core::traits::ExternalProvider;
use eventa_core::ErrorCode;

use crate::breaker::{CircuitBreaker, CircuitDecision};
use crate::limiter::SlidingWindowLimiter;
use crate::provider::{normalize_event, validate_event, DropReason};

/// Gateway tunables, sourced from `defaults` with env overrides.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Hard per-provider call timeout.
    pub call_timeout: Duration,
    /// Sliding rate-limit window length.
    pub rate_window: Duration,
    /// Maximum calls per provider inside the window.
    pub rate_max_calls: usize,
    /// Consecutive failures before a circuit opens.
    pub failure_threshold: u32,
    /// Cooldown before an open circuit permits a trial call.
    pub cooldown: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_millis(PROVIDER_TIMEOUT_MS),
            rate_window: Duration::from_secs(PROVIDER_RATE_WINDOW_SECS),
            rate_max_calls: PROVIDER_RATE_MAX_CALLS,
            failure_threshold: CIRCUIT_FAILURE_THRESHOLD,
            cooldown: Duration::from_secs(CIRCUIT_COOLDOWN_SECS),
        }
    }
}

impl GatewayConfig {
    /// Read overrides from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PROVIDER_TIMEOUT_MS` | 1500 |
    /// | `PROVIDER_RATE_MAX_CALLS` | 10 |
    /// | `CIRCUIT_COOLDOWN_SECS` | 30 |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("PROVIDER_TIMEOUT_MS") {
            config.call_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_parse::<usize>("PROVIDER_RATE_MAX_CALLS") {
            config.rate_max_calls = n.max(1);
        }
        if let Some(secs) = env_parse::<u64>("CIRCUIT_COOLDOWN_SECS") {
            config.cooldown = Duration::from_secs(secs);
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

/// Shared mutable gateway state: the rate limiter and the circuit breaker.
pub struct GatewayState {
    limiter: SlidingWindowLimiter,
    breaker: CircuitBreaker,
}

impl GatewayState {
    /// Create fresh state from config.
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            limiter: SlidingWindowLimiter::new(config.rate_window, config.rate_max_calls),
            breaker: CircuitBreaker::new(config.failure_threshold, config.cooldown),
        }
    }
}

/// Aggregated outcome of one fan-out.
#[derive(Debug, Clone)]
pub struct GatewayOutcome {
    /// Accepted, normalized results across all providers.
    pub results: Vec<SearchResult>,
    /// Per-provider call outcomes for the response envelope.
    pub stats: Vec<ProviderCallResult>,
}

impl GatewayOutcome {
    /// A combined error code when every provider failed, `None` while at
    /// least one provider delivered.
    pub fn combined_error(&self) -> Option<ErrorCode> {
        if self.stats.is_empty() {
            return None;
        }
        if self.stats.iter().any(|s| s.error.is_none()) {
            return None;
        }
        // Timeouts are the most actionable signal, then hard connect
        // failures; local rejections (rate limit, open circuit) last.
        let errors: Vec<ProviderErrorCode> =
            self.stats.iter().filter_map(|s| s.error).collect();
        for preferred in [
            ProviderErrorCode::Timeout,
            ProviderErrorCode::ConnectError,
            ProviderErrorCode::RateLimited,
            ProviderErrorCode::CircuitOpen,
        ] {
            if errors.contains(&preferred) {
                return Some(match preferred {
                    ProviderErrorCode::Timeout => ErrorCode::ExtTimeout,
                    ProviderErrorCode::ConnectError => ErrorCode::ExtConnect,
                    ProviderErrorCode::RateLimited => ErrorCode::RateLimited,
                    ProviderErrorCode::CircuitOpen => ErrorCode::CircuitOpen,
                });
            }
        }
        None
    }

    /// Whether any provider failed while another delivered.
    pub fn partially_degraded(&self) -> bool {
        let failed = self.stats.iter().filter(|s| s.error.is_some()).count();
        failed > 0 && failed < self.stats.len()
    }
}

/// The external provider gateway.
pub struct ProviderGateway {
    providers: Vec<Arc<dyn ExternalProvider>>,
    state: Arc<GatewayState>,
    config: GatewayConfig,
}

impl ProviderGateway {
    /// Create a gateway over a provider whitelist with fresh state.
    pub fn new(providers: Vec<Arc<dyn ExternalProvider>>, config: GatewayConfig) -> Self {
        let state = Arc::new(GatewayState::new(&config));
        Self::with_state(providers, config, state)
    }

    /// Create a gateway with caller-supplied state.
    pub fn with_state(
        providers: Vec<Arc<dyn ExternalProvider>>,
        config: GatewayConfig,
        state: Arc<GatewayState>,
    ) -> Self {
        Self {
            providers,
            state,
            config,
        }
    }

    /// Number of configured providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Query every configured provider concurrently and settle all.
    pub async fn fetch_all(&self, params: &ProviderParams) -> GatewayOutcome {
        let calls = self
            .providers
            .iter()
            .map(|provider| self.fetch_from_provider(provider.clone(), params));
        let outcomes = join_all(calls).await;

        let mut results = Vec::new();
        let mut stats = Vec::with_capacity(outcomes.len());
        for (items, stat) in outcomes {
            results.extend(items);
            stats.push(stat);
        }

        debug!(
            subsystem = "gateway",
            component = "fan_out",
            op = "fetch_all",
            result_count = results.len(),
            provider_count = stats.len(),
            "External fan-out settled"
        );

        GatewayOutcome { results, stats }
    }

    /// One provider call: rate limit, circuit check, bounded live call,
    /// validation, and normalization.
    async fn fetch_from_provider(
        &self,
        provider: Arc<dyn ExternalProvider>,
        params: &ProviderParams,
    ) -> (Vec<SearchResult>, ProviderCallResult) {
        let name = provider.name().to_string();
        let start = Instant::now();

        let terminal = |error: ProviderErrorCode, start: Instant| ProviderCallResult {
            provider: name.clone(),
            accepted: 0,
            dropped_schema: 0,
            dropped_safety: 0,
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(error),
        };

        if !self.state.limiter.try_acquire(&name) {
            debug!(
                subsystem = "gateway",
                component = "rate_limiter",
                provider = %name,
                "Provider call rejected by sliding-window limit"
            );
            return (Vec::new(), terminal(ProviderErrorCode::RateLimited, start));
        }

        match self.state.breaker.check(&name) {
            CircuitDecision::Reject => {
                debug!(
                    subsystem = "gateway",
                    component = "circuit_breaker",
                    provider = %name,
                    "Provider call rejected by open circuit"
                );
                return (Vec::new(), terminal(ProviderErrorCode::CircuitOpen, start));
            }
            CircuitDecision::AllowTrial => {
                debug!(
                    subsystem = "gateway",
                    component = "circuit_breaker",
                    provider = %name,
                    "Cooldown elapsed, permitting trial call"
                );
            }
            CircuitDecision::Allow => {}
        }

        let call = tokio::time::timeout(self.config.call_timeout, provider.fetch(params));
        match call.await {
            Err(_elapsed) => {
                self.state.breaker.record_failure(&name);
                warn!(
                    subsystem = "gateway",
                    component = "fan_out",
                    provider = %name,
                    timeout_ms = self.config.call_timeout.as_millis() as u64,
                    "Provider call exceeded timeout"
                );
                (Vec::new(), terminal(ProviderErrorCode::Timeout, start))
            }
            Ok(Err(error)) => {
                self.state.breaker.record_failure(&name);
                warn!(
                    subsystem = "gateway",
                    component = "fan_out",
                    provider = %name,
                    error = %error,
                    "Provider call failed"
                );
                (Vec::new(), terminal(ProviderErrorCode::ConnectError, start))
            }
            Ok(Ok(raw_items)) => {
                self.state.breaker.record_success(&name);

                let mut accepted = Vec::new();
                let mut dropped_schema = 0;
                let mut dropped_safety = 0;
                for raw in &raw_items {
                    match validate_event(raw) {
                        Ok(()) => accepted.push(normalize_event(&name, raw)),
                        Err(DropReason::Schema) => dropped_schema += 1,
                        Err(DropReason::Safety) => dropped_safety += 1,
                    }
                }

                let stat = ProviderCallResult {
                    provider: name,
                    accepted: accepted.len(),
                    dropped_schema,
                    dropped_safety,
                    latency_ms: start.elapsed().as_millis() as u64,
                    error: None,
                };
                (accepted, stat)
            }
        }
    }
}
