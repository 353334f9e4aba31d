//! LLM inference backend over HTTP.
//!
//! One backend instance serves the three inference seams: query intent
//! extraction, content moderation review, and query embedding. The server
//! speaks the Ollama-style API (`/api/chat` with JSON-formatted responses,
//! `/api/embeddings` for vectors).

use std::time::Duration;

use async_trait::async_trait;
use pgvector::Vector;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use eventa_core::defaults::{
    EMBED_DIMENSION, EMBED_MODEL, EMBED_TIMEOUT_SECS, INTENT_TIMEOUT_SECS, LLM_MODEL, LLM_URL,
};
use eventa_core::language::Lang;
use eventa_core::models::{Event, ModerationStatus, ModerationVerdict, RawIntent};
use eventa_core::traits::{EmbeddingBackend, IntentBackend, ModerationBackend};
use eventa_core::{Error, Result};

/// Chat message for the LLM API.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Moderation payload the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct ModerationPayload {
    status: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    reasons: Vec<String>,
}

/// LLM backend for intent extraction, moderation, and embeddings.
pub struct LlmBackend {
    client: Client,
    base_url: String,
    model: String,
    embed_model: String,
    dimension: usize,
    intent_timeout: Duration,
    embed_timeout: Duration,
}

impl LlmBackend {
    /// Create a backend with default settings.
    pub fn new() -> Self {
        Self::with_config(
            LLM_URL.to_string(),
            LLM_MODEL.to_string(),
            EMBED_MODEL.to_string(),
            EMBED_DIMENSION,
        )
    }

    /// Create a backend with custom configuration.
    pub fn with_config(
        base_url: String,
        model: String,
        embed_model: String,
        dimension: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(INTENT_TIMEOUT_SECS * 2))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "intent",
            component = "llm_backend",
            url = %base_url,
            model = %model,
            embed_model = %embed_model,
            "Initializing LLM backend"
        );

        Self {
            client,
            base_url,
            model,
            embed_model,
            dimension,
            intent_timeout: Duration::from_secs(INTENT_TIMEOUT_SECS),
            embed_timeout: Duration::from_secs(EMBED_TIMEOUT_SECS),
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LLM_URL` | `http://127.0.0.1:11434` |
    /// | `LLM_MODEL` | `llama3.1:8b` |
    /// | `EMBED_MODEL` | `nomic-embed-text` |
    /// | `EMBED_DIMENSION` | `768` |
    pub fn from_env() -> Self {
        let base_url = std::env::var("LLM_URL").unwrap_or_else(|_| LLM_URL.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| LLM_MODEL.to_string());
        let embed_model =
            std::env::var("EMBED_MODEL").unwrap_or_else(|_| EMBED_MODEL.to_string());
        let dimension = std::env::var("EMBED_DIMENSION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(EMBED_DIMENSION);

        Self::with_config(base_url, model, embed_model, dimension)
    }

    /// Issue a JSON-formatted chat call and return the raw content string.
    async fn chat_json(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(self.intent_timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Intent(format!(
                "LLM returned HTTP {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.message.content)
    }
}

impl Default for LlmBackend {
    fn default() -> Self {
        Self::new()
    }
}

const INTENT_SYSTEM_PROMPT: &str = "You extract structured search/create intent from a community \
events query. Respond with a single JSON object: {\"intent\": \"search\"|\"create\"|\"unclear\", \
\"confidence\": 0.0-1.0, \"language\": ISO 639-1 code, \"entities\": {\"title\": string|null, \
\"event_type\": string|null, \"city\": string|null, \"venue\": string|null, \"date_phrase\": \
string|null, \"date_iso\": \"YYYY-MM-DD\"|null, \"time\": string|null}, \"reply\": a one-sentence \
paraphrase of the request in the target language}. Use null for anything not present in the text.";

const MODERATION_SYSTEM_PROMPT: &str = "You review community event listings for content policy \
compliance (no adult services, weapons sales, gambling promotion, scams, hate, or spam). Respond \
with a single JSON object: {\"status\": \"approved\"|\"rejected\"|\"needs_review\", \
\"confidence\": 0.0-1.0, \"reasons\": [strings]}.";

#[async_trait]
impl IntentBackend for LlmBackend {
    async fn extract(&self, text: &str, ui_lang: Lang) -> Result<RawIntent> {
        let user = format!("Target language: {}\nQuery: {}", ui_lang.code(), text);
        let content = self.chat_json(INTENT_SYSTEM_PROMPT, &user).await?;

        let raw: RawIntent = serde_json::from_str(&content).map_err(|e| {
            warn!(
                subsystem = "intent",
                component = "llm_backend",
                op = "extract",
                error = %e,
                "LLM intent payload failed to parse"
            );
            Error::Intent(format!("unparseable intent payload: {}", e))
        })?;

        debug!(
            subsystem = "intent",
            component = "llm_backend",
            op = "extract",
            intent = ?raw.intent,
            confidence = raw.confidence,
            "Extracted intent"
        );
        Ok(raw)
    }
}

#[async_trait]
impl ModerationBackend for LlmBackend {
    async fn review(&self, event: &Event) -> Result<ModerationVerdict> {
        let user = format!(
            "Title: {}\nDescription: {}\nVenue: {}\nCity: {}",
            event.title,
            event.description,
            event.venue_name.as_deref().unwrap_or("-"),
            event.city.as_deref().unwrap_or("-"),
        );
        let content = self.chat_json(MODERATION_SYSTEM_PROMPT, &user).await?;

        let payload: ModerationPayload = serde_json::from_str(&content)
            .map_err(|e| Error::Moderation(format!("unparseable moderation payload: {}", e)))?;

        let status = match payload.status.as_str() {
            "approved" => ModerationStatus::Approved,
            "rejected" => ModerationStatus::Rejected,
            // Anything else the model invents goes to a human
            _ => ModerationStatus::NeedsReview,
        };

        Ok(ModerationVerdict {
            status,
            confidence: payload.confidence,
            reasons: payload.reasons,
        })
    }
}

#[async_trait]
impl EmbeddingBackend for LlmBackend {
    async fn embed_query(&self, text: &str) -> Result<Vector> {
        let request = EmbeddingRequest {
            model: &self.embed_model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .timeout(self.embed_timeout)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Embedding(format!(
                "embedding server returned HTTP {}",
                response.status()
            )));
        }

        let body: EmbeddingResponse = response.json().await?;
        if body.embedding.len() != self.dimension {
            return Err(Error::Embedding(format!(
                "expected dimension {}, got {}",
                self.dimension,
                body.embedding.len()
            )));
        }

        Ok(Vector::from(body.embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(url: &str) -> LlmBackend {
        LlmBackend::with_config(url.to_string(), "test-model".into(), "test-embed".into(), 4)
    }

    #[tokio::test]
    async fn test_extract_parses_chat_payload() {
        let server = MockServer::start().await;
        let content = r#"{"intent":"search","confidence":0.9,"language":"en","entities":{"city":"Melbourne","date_phrase":"this weekend"},"reply":"Looking for events in Melbourne this weekend."}"#;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": content}
            })))
            .mount(&server)
            .await;

        let raw = backend(&server.uri())
            .extract("jazz in melbourne this weekend", Lang::En)
            .await
            .unwrap();
        assert_eq!(raw.entities.city.as_deref(), Some("Melbourne"));
        assert_eq!(raw.confidence, 0.9);
    }

    #[tokio::test]
    async fn test_extract_rejects_non_json_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "sorry, I can't do that"}
            })))
            .mount(&server)
            .await;

        let result = backend(&server.uri()).extract("anything", Lang::En).await;
        assert!(matches!(result, Err(Error::Intent(_))));
    }

    #[tokio::test]
    async fn test_review_maps_unknown_status_to_needs_review() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant",
                            "content": r#"{"status":"maybe","confidence":0.4}"#}
            })))
            .mount(&server)
            .await;

        let event = crate::mock::sample_event();
        let verdict = backend(&server.uri()).review(&event).await.unwrap();
        assert_eq!(verdict.status, ModerationStatus::NeedsReview);
    }

    #[tokio::test]
    async fn test_embed_validates_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        // Backend expects dimension 4; server returns 3
        let result = backend(&server.uri()).embed_query("jazz").await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_embed_returns_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3, 0.4]
            })))
            .mount(&server)
            .await;

        let vector = backend(&server.uri()).embed_query("jazz").await.unwrap();
        assert_eq!(vector.as_slice().len(), 4);
    }
}
