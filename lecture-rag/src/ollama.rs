//! Ollama embedding and chat backends.
//!
//! This module is only available when the `ollama` feature is enabled.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

/// Base URL used when `OLLAMA_HOST` is not set.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

const PROVIDER: &str = "Ollama";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The Ollama base URL from `OLLAMA_HOST`, or [`DEFAULT_OLLAMA_HOST`].
///
/// A host without a scheme (`gpu-box:11434`) is treated as plain HTTP.
pub fn host_from_env() -> String {
    match std::env::var("OLLAMA_HOST") {
        Ok(host) if !host.trim().is_empty() => normalize_host(host.trim()),
        _ => DEFAULT_OLLAMA_HOST.to_string(),
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
        RagError::ConfigError(format!("failed to build HTTP client: {e}"))
    })
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

/// An [`EmbeddingProvider`] backed by a local Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use lecture_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("nomic-embed-text")?;
/// let embedding = provider.embed("stochastic gradient descent").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model` at the host given by `OLLAMA_HOST`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            base_url: host_from_env(),
            model: model.into(),
        })
    }

    /// Use a different server.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_host(base_url.as_ref());
        self
    }

    /// Set the client-level timeout for each HTTP request.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn failure(message: String) -> RagError {
        RagError::EmbeddingError { provider: PROVIDER.into(), message }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding text");

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&EmbeddingRequest { model: &self.model, prompt: text })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(Self::failure(message));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;

        if body.embedding.is_empty() {
            return Err(Self::failure("API returned an empty embedding".into()));
        }
        Ok(body.embedding)
    }
}

/// A [`TextGenerator`] backed by Ollama's non-streaming chat endpoint.
pub struct OllamaTextGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaTextGenerator {
    /// Create a generator for `model` at the host given by `OLLAMA_HOST`.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client(DEFAULT_REQUEST_TIMEOUT)?,
            base_url: host_from_env(),
            model: model.into(),
        })
    }

    /// Use a different server.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = normalize_host(base_url.as_ref());
        self
    }

    /// Set the client-level timeout for each HTTP request.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn failure(message: String) -> RagError {
        RagError::GenerationError { provider: PROVIDER.into(), message }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[async_trait]
impl TextGenerator for OllamaTextGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, system_instruction: &str, user_message: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, "chat request");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system_instruction },
                ChatMessage { role: "user", content: user_message },
            ],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(Self::failure(message));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;
        Ok(body.message.content)
    }
}
