//! Configuration for corpus indexing and retrieval.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::index::MAX_TOP_K;

/// Default embedding model, shared by indexing and query embedding.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Default generation model used by the query translator.
pub const DEFAULT_GENERATION_MODEL: &str = "gemma3:4b";

/// Configuration parameters for indexing and retrieval.
///
/// Chunk sizes are measured in whitespace-delimited words.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Number of words per chunk.
    pub chunk_size: usize,
    /// Number of words shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of nearest chunks to retrieve per query.
    pub top_k: usize,
    /// Embedding model name. Queries must use the model the index was built with.
    pub embedding_model: String,
    /// Generation model name used for query translation.
    pub generation_model: String,
    /// Upper bound for a single embedding call, in seconds.
    pub embed_timeout_secs: u64,
    /// Number of embedding calls allowed in flight during indexing.
    pub embed_concurrency: usize,
    /// Language queries are rewritten into before embedding. `None` disables translation.
    pub query_language: Option<String>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 250,
            chunk_overlap: 50,
            top_k: 4,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            embed_timeout_secs: 60,
            embed_concurrency: 1,
            query_language: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Per-call embedding timeout.
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0` or `top_k > MAX_TOP_K`
    /// - `embed_concurrency == 0`
    /// - `embed_timeout_secs == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.top_k > MAX_TOP_K {
            return Err(RagError::ConfigError(format!(
                "top_k ({}) must be at most {MAX_TOP_K}",
                self.top_k
            )));
        }
        if self.embed_concurrency == 0 {
            return Err(RagError::ConfigError(
                "embed_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.embed_timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "embed_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of words per chunk.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the number of words shared by consecutive chunks.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of nearest chunks to retrieve.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedding model name.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the generation model name.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Set the per-call embedding timeout.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout_secs = timeout.as_secs();
        self
    }

    /// Set how many embedding calls may run concurrently during indexing.
    pub fn embed_concurrency(mut self, workers: usize) -> Self {
        self.config.embed_concurrency = workers;
        self
    }

    /// Enable query translation into the given language.
    pub fn query_language(mut self, language: impl Into<String>) -> Self {
        self.config.query_language = Some(language.into());
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.embed_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn overlap_equal_to_size_is_rejected() {
        let err = RagConfig::builder().chunk_size(10).chunk_overlap(10).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn zero_concurrency_and_timeout_are_rejected() {
        assert!(RagConfig::builder().embed_concurrency(0).build().is_err());
        assert!(RagConfig::builder().embed_timeout(Duration::from_millis(10)).build().is_err());
    }

    #[test]
    fn top_k_above_maximum_is_rejected() {
        let err = RagConfig::builder().top_k(usize::MAX).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
        assert!(RagConfig::builder().top_k(MAX_TOP_K + 1).build().is_err());
        assert_eq!(RagConfig::builder().top_k(MAX_TOP_K).build().unwrap().top_k, MAX_TOP_K);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: RagConfig =
            serde_json::from_str(r#"{"chunk_size": 120, "query_language": "English"}"#).unwrap();
        assert_eq!(config.chunk_size, 120);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.query_language.as_deref(), Some("English"));
    }
}
