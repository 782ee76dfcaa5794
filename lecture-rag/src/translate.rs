//! Query normalization before embedding.
//!
//! Embedding quality is best when the query and the corpus share a language.
//! A [`QueryTranslator`] rewrites the query into the corpus language; it is a
//! recall optimization only, so every failure falls back to the original
//! query.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{RagError, Result};
use crate::generation::TextGenerator;

/// Rewrites a query before it is embedded.
#[async_trait]
pub trait QueryTranslator: Send + Sync {
    /// Return the query to embed. Never fails; on any problem the original
    /// query is returned.
    async fn normalize(&self, query: &str) -> String;
}

/// Leaves queries untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl QueryTranslator for PassthroughTranslator {
    async fn normalize(&self, query: &str) -> String {
        query.to_string()
    }
}

/// Translates queries with a [`TextGenerator`].
///
/// # Example
///
/// ```rust,ignore
/// use lecture_rag::{LlmQueryTranslator, QueryTranslator};
///
/// let translator = LlmQueryTranslator::new(Arc::new(generator), "English");
/// let query = translator.normalize("ética em IA generativa").await;
/// ```
pub struct LlmQueryTranslator {
    generator: Arc<dyn TextGenerator>,
    target_language: String,
}

impl LlmQueryTranslator {
    pub fn new(generator: Arc<dyn TextGenerator>, target_language: impl Into<String>) -> Self {
        Self { generator, target_language: target_language.into() }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// The fixed instruction sent with every translation request.
    pub fn instruction(&self) -> String {
        format!(
            "Translate the user's text into {}. Preserve technical terminology exactly. \
             Output only the translation, with no quotes, notes or explanations.",
            self.target_language
        )
    }

    /// Translate `query`, surfacing failures instead of falling back.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::TranslationError`] if the generator fails or
    /// returns only whitespace.
    pub async fn translate(&self, query: &str) -> Result<String> {
        let output = self
            .generator
            .generate(&self.instruction(), query)
            .await
            .map_err(|e| RagError::TranslationError(e.to_string()))?;
        let translated = output.trim();
        if translated.is_empty() {
            return Err(RagError::TranslationError(format!(
                "{} returned an empty translation",
                self.generator.name()
            )));
        }
        Ok(translated.to_string())
    }
}

#[async_trait]
impl QueryTranslator for LlmQueryTranslator {
    async fn normalize(&self, query: &str) -> String {
        match self.translate(query).await {
            Ok(translated) => {
                debug!(
                    original = query,
                    translated = %translated,
                    language = %self.target_language,
                    "translated query"
                );
                translated
            }
            Err(e) => {
                warn!(error = %e, "query translation failed; using untranslated query");
                query.to_string()
            }
        }
    }
}
