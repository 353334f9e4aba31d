//! Mock inference backends for deterministic testing.
//!
//! Each mock either replays a scripted value or fails on demand, and logs
//! the inputs it was called with so tests can assert on call behavior.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pgvector::Vector;
use uuid::Uuid;

use eventa_core::language::Lang;
use eventa_core::models::{
    Event, EventCategory, EventStatus, ModerationStatus, ModerationVerdict, Price, RawIntent,
};
use eventa_core::traits::{EmbeddingBackend, IntentBackend, ModerationBackend};
use eventa_core::{Error, Result};

/// A publishable sample event for tests.
pub fn sample_event() -> Event {
    let now = Utc.with_ymd_and_hms(2026, 6, 13, 18, 0, 0).unwrap();
    Event {
        id: Uuid::new_v4(),
        title: "Canal Jazz Night".to_string(),
        description: "Live jazz by the canal".to_string(),
        starts_at: now,
        ends_at: None,
        timezone: "Europe/Brussels".to_string(),
        venue_name: Some("Canal Club".to_string()),
        address: Some("Quai des Péniches 1".to_string()),
        city: Some("Brussels".to_string()),
        country: Some("Belgium".to_string()),
        lat: Some(50.86),
        lng: Some(4.35),
        categories: vec![EventCategory::MusicNightlife],
        price: Price::default(),
        status: EventStatus::Draft,
        moderation: ModerationStatus::Pending,
        search_text: String::new(),
        search_text_folded: String::new(),
        image_url: None,
        created_at: now,
        updated_at: now,
    }
}

/// Scripted intent backend.
#[derive(Clone)]
pub struct MockIntentBackend {
    response: Arc<Mutex<Option<RawIntent>>>,
    fail: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockIntentBackend {
    /// Replay a fixed extraction result.
    pub fn returning(raw: RawIntent) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(raw))),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every call.
    pub fn failing() -> Self {
        Self {
            response: Arc::new(Mutex::new(None)),
            fail: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Texts the backend was called with.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock mutex poisoned").clone()
    }
}

#[async_trait]
impl IntentBackend for MockIntentBackend {
    async fn extract(&self, text: &str, _ui_lang: Lang) -> Result<RawIntent> {
        self.calls
            .lock()
            .expect("mock mutex poisoned")
            .push(text.to_string());
        if self.fail {
            return Err(Error::Intent("mock intent failure".to_string()));
        }
        Ok(self
            .response
            .lock()
            .expect("mock mutex poisoned")
            .clone()
            .unwrap_or_default())
    }
}

/// Scripted moderation backend.
#[derive(Clone)]
pub struct MockModerationBackend {
    verdict: Option<ModerationVerdict>,
    calls: Arc<Mutex<Vec<Uuid>>>,
}

impl MockModerationBackend {
    /// Replay a fixed verdict.
    pub fn returning(status: ModerationStatus, confidence: f32) -> Self {
        Self {
            verdict: Some(ModerationVerdict {
                status,
                confidence,
                reasons: Vec::new(),
            }),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every review.
    pub fn failing() -> Self {
        Self {
            verdict: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Event ids the backend reviewed.
    pub fn reviewed(&self) -> Vec<Uuid> {
        self.calls.lock().expect("mock mutex poisoned").clone()
    }
}

#[async_trait]
impl ModerationBackend for MockModerationBackend {
    async fn review(&self, event: &Event) -> Result<ModerationVerdict> {
        self.calls
            .lock()
            .expect("mock mutex poisoned")
            .push(event.id);
        self.verdict
            .clone()
            .ok_or_else(|| Error::Moderation("mock moderation failure".to_string()))
    }
}

/// Deterministic embedding backend: the vector is derived from the input
/// bytes, so the same text always embeds identically.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    fail: bool,
}

impl MockEmbeddingBackend {
    /// Create a working mock with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
        }
    }

    /// Fail every embedding call.
    pub fn failing() -> Self {
        Self {
            dimension: 0,
            fail: true,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_query(&self, text: &str) -> Result<Vector> {
        if self.fail {
            return Err(Error::Embedding("mock embedding failure".to_string()));
        }
        let seed: u32 = text.bytes().map(u32::from).sum();
        let values: Vec<f32> = (0..self.dimension)
            .map(|i| ((seed.wrapping_add(i as u32) % 1000) as f32) / 1000.0)
            .collect();
        Ok(Vector::from(values))
    }
}
