//! Query-time orchestration: translate → embed → search → join → rank.
//!
//! # Example
//!
//! ```rust,ignore
//! use lecture_rag::{RagConfig, Retriever};
//!
//! let retriever = Retriever::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .build()?;
//!
//! let results = retriever.retrieve("attention mechanisms", &corpus).await?;
//! for r in &results {
//!     println!("{} {} #{} ({:.3})", r.rank, r.doc_name, r.chunk_id, r.distance);
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::RagConfig;
use crate::corpus::CorpusIndex;
use crate::document::{Chunk, RetrievalResult};
use crate::embedding::{EmbeddingProvider, embed_with_timeout};
use crate::error::{RagError, Result};
use crate::generation::TextGenerator;
use crate::index::{FlatL2Index, Neighbor};
use crate::translate::{LlmQueryTranslator, QueryTranslator};

/// Retrieves ranked, source-attributed chunks for a natural-language query.
///
/// Construct one via [`Retriever::builder()`].
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    translator: Option<Arc<dyn QueryTranslator>>,
    embed_timeout: Duration,
    top_k: usize,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Default number of results per query.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Retrieve the configured number of nearest chunks from `corpus`.
    pub async fn retrieve(
        &self,
        query: &str,
        corpus: &CorpusIndex,
    ) -> Result<Vec<RetrievalResult>> {
        self.retrieve_from(query, corpus.index(), corpus.chunks(), self.top_k).await
    }

    /// Retrieve `top_k` nearest chunks from `corpus`.
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        corpus: &CorpusIndex,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        self.retrieve_from(query, corpus.index(), corpus.chunks(), top_k).await
    }

    /// Retrieve from an index and a chunk list that are joined by position.
    ///
    /// Search positions outside `chunks` are logged and skipped, so an index
    /// and chunk list saved at different times cannot cause a panic. An empty
    /// result is a valid outcome meaning "no relevant context". A `top_k`
    /// larger than the index is clamped to the index size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the query cannot be embedded
    /// and [`RagError::VectorIndexError`] if its dimension does not match
    /// the index.
    pub async fn retrieve_from(
        &self,
        query: &str,
        index: &FlatL2Index,
        chunks: &[Chunk],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        if top_k == 0 || query.trim().is_empty() {
            debug!(top_k, "nothing to retrieve");
            return Ok(Vec::new());
        }

        let normalized = match &self.translator {
            Some(translator) => translator.normalize(query).await,
            None => query.to_string(),
        };

        let query_embedding = embed_with_timeout(
            self.embedding_provider.as_ref(),
            &normalized,
            self.embed_timeout,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;

        let neighbors = index.search(&query_embedding, top_k.min(index.len())).map_err(|e| {
            error!(error = %e, "index search failed");
            e
        })?;

        let results = rank_neighbors(&neighbors, chunks);
        info!(requested = top_k, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}

/// Join search neighbors with their chunks and assign dense ranks.
///
/// Padding entries are dropped silently. Positions beyond `chunks` are
/// dropped with a warning. Ranks count only the entries kept.
pub fn rank_neighbors(neighbors: &[Neighbor], chunks: &[Chunk]) -> Vec<RetrievalResult> {
    neighbors
        .iter()
        .filter_map(|neighbor| {
            let position = neighbor.position?;
            match chunks.get(position) {
                Some(chunk) => Some((chunk, neighbor.distance)),
                None => {
                    warn!(
                        position,
                        record_count = chunks.len(),
                        "search position outside stored chunks; skipped"
                    );
                    None
                }
            }
        })
        .enumerate()
        .map(|(rank, (chunk, distance))| RetrievalResult {
            text: chunk.text.clone(),
            doc_name: chunk.metadata.doc_name.clone(),
            chunk_id: chunk.metadata.chunk_id,
            rank,
            distance,
        })
        .collect()
}

/// Builder for constructing a [`Retriever`].
///
/// Only the embedding provider is required. A query translator is used when
/// set explicitly, or when the config names a `query_language` and a text
/// generator is supplied.
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    translator: Option<Arc<dyn QueryTranslator>>,
    text_generator: Option<Arc<dyn TextGenerator>>,
}

impl RetrieverBuilder {
    /// Set the configuration (defaults to [`RagConfig::default`]).
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider. Must match the one the corpus was built with.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set a query translator explicitly.
    pub fn translator(mut self, translator: Arc<dyn QueryTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Set the text generator used to translate into `config.query_language`.
    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Build the [`Retriever`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider is missing,
    /// the config is invalid, or a `query_language` is configured without a
    /// translator or text generator.
    pub fn build(self) -> Result<Retriever> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;

        let translator = match (self.translator, self.text_generator, &config.query_language) {
            (Some(translator), _, _) => Some(translator),
            (None, Some(generator), Some(language)) => {
                Some(Arc::new(LlmQueryTranslator::new(generator, language.clone()))
                    as Arc<dyn QueryTranslator>)
            }
            (None, None, Some(language)) => {
                return Err(RagError::ConfigError(format!(
                    "query_language '{language}' requires a text generator"
                )));
            }
            (None, _, None) => None,
        };

        Ok(Retriever {
            embedding_provider,
            translator,
            embed_timeout: config.embed_timeout(),
            top_k: config.top_k,
        })
    }
}
