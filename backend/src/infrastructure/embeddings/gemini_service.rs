/// Gemini embedding client for query-time embedding generation
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::application::services::{EmbeddingError, EmbeddingProvider, EmbeddingResult};
use crate::domain::value_objects::EmbeddingVector;

/// Configuration for the Gemini embedding endpoint
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingConfig {
    /// API key; requests fail with a terminal error when unset
    pub api_key: Option<String>,
    /// Model resource name
    pub model: String,
    /// Embedding task type sent with every request
    pub task_type: String,
    pub base_url: String,
    /// Expected vector length (768 for text-embedding-004)
    pub dimension_count: usize,
}

impl Default for GeminiEmbeddingConfig {
    fn default() -> Self {
        GeminiEmbeddingConfig {
            api_key: None,
            model: "models/text-embedding-004".to_string(),
            task_type: "SEMANTIC_SIMILARITY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            dimension_count: 768,
        }
    }
}

/// Embedding provider backed by the Gemini `embedContent` API
pub struct GeminiEmbeddingClient {
    client: Client,
    config: GeminiEmbeddingConfig,
}

impl GeminiEmbeddingClient {
    pub fn new(config: GeminiEmbeddingConfig) -> Self {
        info!(
            "Initializing Gemini embedding client with model: {}",
            config.model
        );
        GeminiEmbeddingClient {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeminiEmbeddingConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:embedContent",
            self.config.base_url.trim_end_matches('/'),
            model_resource(&self.config.model)
        )
    }

    fn request_body<'a>(&'a self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: model_resource(&self.config.model),
            content: Content {
                parts: vec![Part { text }],
            },
            task_type: &self.config.task_type,
        }
    }

    fn into_vector(&self, response: EmbedContentResponse) -> EmbeddingResult<EmbeddingVector> {
        let values = response.embedding.values;
        if values.len() != self.config.dimension_count {
            return Err(EmbeddingError::InvalidResponse(format!(
                "Expected {} dimensions, got {}",
                self.config.dimension_count,
                values.len()
            )));
        }
        EmbeddingVector::new(values)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingClient {
    async fn embed(&self, text: &str) -> EmbeddingResult<EmbeddingVector> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EmbeddingError::Terminal("Gemini API key is not configured".to_string()))?;

        debug!("Requesting Gemini embedding (length: {})", text.len());

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &error_text));
        }

        let body: EmbedContentResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.without_url().to_string()))?;

        self.into_vector(body)
    }
}

/// Accept both "text-embedding-004" and "models/text-embedding-004"
fn model_resource(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

// The request URL carries the API key, so it is stripped before the error is surfaced
fn classify_transport_error(error: reqwest::Error) -> EmbeddingError {
    let error = error.without_url();
    if error.is_builder() {
        EmbeddingError::Terminal(error.to_string())
    } else {
        EmbeddingError::Transient(error.to_string())
    }
}

/// Rate limiting and server errors are worth retrying; anything else is not
fn classify_status(status: StatusCode, body: &str) -> EmbeddingError {
    let message = format!("Gemini API error ({}): {}", status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        EmbeddingError::Transient(message)
    } else {
        EmbeddingError::Terminal(message)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}
