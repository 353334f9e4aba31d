//! Integration tests for the HTTP provider against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventa_core::models::{EventCategory, ProviderParams};
use eventa_core::traits::ExternalProvider;
use eventa_gateway::{GatewayConfig, HttpProvider, ProviderGateway};

fn params() -> ProviderParams {
    ProviderParams {
        keywords: vec!["jazz".to_string()],
        category: Some(EventCategory::MusicNightlife),
        city: Some("Melbourne".to_string()),
        date: chrono::NaiveDate::from_ymd_opt(2026, 7, 4),
    }
}

#[tokio::test]
async fn provider_posts_params_and_parses_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(serde_json::json!({
            "keywords": ["jazz"],
            "city": "Melbourne",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "events": [
                {"title": "Jazz at the Corner", "date": "2026-07-04", "time": "8pm",
                 "venue": "Corner Hotel", "city": "Melbourne"},
                {"title": "Late Jam", "date": "2026-07-05"}
            ]
        })))
        .mount(&server)
        .await;

    let provider = HttpProvider::new("songkick", format!("{}/search", server.uri()));
    let events = provider.fetch(&params()).await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title.as_deref(), Some("Jazz at the Corner"));
    assert_eq!(events[0].venue.as_deref(), Some("Corner Hotel"));
}

#[tokio::test]
async fn provider_error_status_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = HttpProvider::new("songkick", server.uri());
    let result = provider.fetch(&params()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn gateway_times_out_slow_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"events": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = Arc::new(HttpProvider::new("songkick", server.uri()));
    let config = GatewayConfig {
        call_timeout: Duration::from_millis(100),
        ..Default::default()
    };
    let gateway = ProviderGateway::new(vec![provider], config);

    let outcome = gateway.fetch_all(&params()).await;
    assert_eq!(
        outcome.stats[0].error,
        Some(eventa_core::models::ProviderErrorCode::Timeout)
    );
}

#[tokio::test]
async fn gateway_validates_and_normalizes_accepted_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "events": [
                {"title": "Jazz at the Corner", "date": "2026-07-04"},
                {"title": "", "date": "2026-07-04"},
                {"title": "No date at all"}
            ]
        })))
        .mount(&server)
        .await;

    let provider = Arc::new(HttpProvider::new("songkick", server.uri()));
    let gateway = ProviderGateway::new(vec![provider], GatewayConfig::default());

    let outcome = gateway.fetch_all(&params()).await;
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.stats[0].accepted, 1);
    assert_eq!(outcome.stats[0].dropped_schema, 2);
    assert!(outcome.results[0].starts_at.is_some());
}
