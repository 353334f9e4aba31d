//! HTTP-backed external provider.
//!
//! Providers are configured as a whitelist of `name=url` pairs; each is
//! queried with the normalized parameter set and returns raw event-like
//! records. Provider identity is opaque; it keys the rate limiter and the
//! circuit breaker and tags results, nothing more.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use eventa_core::defaults::PROVIDER_TIMEOUT_MS;
use eventa_core::models::{ProviderParams, RawProviderEvent};
use eventa_core::traits::ExternalProvider;
use eventa_core::{Error, Result};

/// Response body accepted from a provider: either a bare array or an
/// `{ "events": [...] }` wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProviderResponse {
    Wrapped { events: Vec<RawProviderEvent> },
    Bare(Vec<RawProviderEvent>),
}

/// An external search provider reached over HTTP.
pub struct HttpProvider {
    name: String,
    endpoint: String,
    client: Client,
}

impl HttpProvider {
    /// Create a provider for a whitelisted endpoint.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        // The gateway enforces the hard per-call timeout; the client-level
        // timeout is a slightly wider safety net.
        let client = Client::builder()
            .timeout(Duration::from_millis(PROVIDER_TIMEOUT_MS * 2))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Parse the provider whitelist from `EXTERNAL_PROVIDERS`.
    ///
    /// Format: comma-separated `name=url` pairs, e.g.
    /// `songkick=https://api.example.com/search,ticketfeed=https://feed.example.org/q`.
    /// Malformed entries are skipped with a warning.
    pub fn from_env() -> Vec<HttpProvider> {
        let raw = std::env::var("EXTERNAL_PROVIDERS").unwrap_or_default();
        let providers: Vec<HttpProvider> = raw
            .split(',')
            .filter_map(|pair| {
                let pair = pair.trim();
                if pair.is_empty() {
                    return None;
                }
                match pair.split_once('=') {
                    Some((name, url)) if !name.is_empty() && url.starts_with("http") => {
                        Some(HttpProvider::new(name.trim(), url.trim()))
                    }
                    _ => {
                        warn!(
                            subsystem = "gateway",
                            component = "http_provider",
                            entry = pair,
                            "Skipping malformed provider whitelist entry"
                        );
                        None
                    }
                }
            })
            .collect();

        info!(
            subsystem = "gateway",
            component = "http_provider",
            provider_count = providers.len(),
            "Configured external providers"
        );
        providers
    }
}

#[async_trait]
impl ExternalProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, params: &ProviderParams) -> Result<Vec<RawProviderEvent>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "{} returned HTTP {}",
                self.name,
                response.status()
            )));
        }

        let body: ProviderResponse = response.json().await?;
        Ok(match body {
            ProviderResponse::Wrapped { events } => events,
            ProviderResponse::Bare(events) => events,
        })
    }
}
