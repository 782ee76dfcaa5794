//! Corpus indexing orchestrator.
//!
//! The [`CorpusIndexer`] runs a full rebuild: chunk every document, embed
//! every chunk (dropping failures), build the vector index, and optionally
//! persist and publish the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use lecture_rag::{CorpusIndexer, IndexStore, RagConfig};
//!
//! let indexer = CorpusIndexer::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .build()?;
//!
//! let (corpus, report) = indexer.rebuild(&documents, &IndexStore::new("index")).await?;
//! println!("{} embedded, {} failed", report.chunks_embedded, report.chunks_failed());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::{Chunker, WordWindowChunker, build_corpus_chunks};
use crate::config::RagConfig;
use crate::corpus::{CorpusHandle, CorpusIndex};
use crate::document::Document;
use crate::embedding::{EmbedOptions, EmbeddingFailure, EmbeddingProvider, embed_corpus};
use crate::error::{RagError, Result};
use crate::store::IndexStore;

/// Outcome of an indexing run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexingReport {
    /// Number of documents submitted.
    pub documents: usize,
    /// Documents that produced no chunks (no text).
    pub empty_documents: usize,
    /// Chunks produced by the chunker.
    pub chunks_total: usize,
    /// Chunks that were embedded and indexed.
    pub chunks_embedded: usize,
    /// Chunks dropped because their embedding failed.
    pub failures: Vec<EmbeddingFailure>,
    /// Dimension of the indexed vectors.
    pub dimensions: usize,
}

impl IndexingReport {
    pub fn chunks_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Builds a [`CorpusIndex`] from documents. Construct one via
/// [`CorpusIndexer::builder()`].
pub struct CorpusIndexer {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
}

impl CorpusIndexer {
    /// Create a new [`CorpusIndexerBuilder`].
    pub fn builder() -> CorpusIndexerBuilder {
        CorpusIndexerBuilder::default()
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Chunk, embed and index `documents` in memory.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if two documents share a name and
    /// [`RagError::EmptyEmbedding`] if no chunk could be embedded.
    pub async fn index_documents(
        &self,
        documents: &[Document],
    ) -> Result<(CorpusIndex, IndexingReport)> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = documents.iter().find(|d| !seen.insert(d.name.as_str())) {
            return Err(RagError::ConfigError(format!(
                "document name '{}' appears more than once",
                duplicate.name
            )));
        }

        let chunks = build_corpus_chunks(documents, self.chunker.as_ref());
        let chunks_total = chunks.len();
        let with_chunks: HashSet<&str> =
            chunks.iter().map(|c| c.metadata.doc_name.as_str()).collect();
        let empty_documents = documents.len() - with_chunks.len();
        info!(documents = documents.len(), empty_documents, chunks_total, "chunked corpus");

        let options = EmbedOptions {
            timeout: self.config.embed_timeout(),
            concurrency: self.config.embed_concurrency,
        };
        let embedded = embed_corpus(self.embedding_provider.as_ref(), chunks, options)
            .await
            .map_err(|e| {
                error!(error = %e, "indexing aborted");
                e
            })?;

        let failures = embedded.failures.clone();
        let corpus = CorpusIndex::from_embedded(self.config.embedding_model.clone(), embedded)?;
        let report = IndexingReport {
            documents: documents.len(),
            empty_documents,
            chunks_total,
            chunks_embedded: corpus.len(),
            failures,
            dimensions: corpus.index().dimensions(),
        };

        info!(
            chunks_embedded = report.chunks_embedded,
            chunks_failed = report.chunks_failed(),
            dimensions = report.dimensions,
            "indexed corpus"
        );
        Ok((corpus, report))
    }

    /// Index `documents` and save the result to `store`, replacing the
    /// previous bundle only once the new one is complete.
    pub async fn rebuild(
        &self,
        documents: &[Document],
        store: &IndexStore,
    ) -> Result<(CorpusIndex, IndexingReport)> {
        let (corpus, report) = self.index_documents(documents).await?;
        store.save(&corpus)?;
        Ok((corpus, report))
    }

    /// Rebuild, save, and publish the new corpus through `handle`.
    pub async fn refresh(
        &self,
        documents: &[Document],
        store: &IndexStore,
        handle: &CorpusHandle,
    ) -> Result<IndexingReport> {
        let (corpus, report) = self.rebuild(documents, store).await?;
        handle.replace(corpus).await;
        Ok(report)
    }
}

/// Builder for constructing a [`CorpusIndexer`].
///
/// The chunker defaults to a [`WordWindowChunker`] using the config's chunk
/// size and overlap.
#[derive(Default)]
pub struct CorpusIndexerBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl CorpusIndexerBuilder {
    /// Set the configuration (defaults to [`RagConfig::default`]).
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`CorpusIndexer`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the embedding provider is missing
    /// or the config is invalid.
    pub fn build(self) -> Result<CorpusIndexer> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(WordWindowChunker::from_config(&config)?),
        };

        Ok(CorpusIndexer { config, embedding_provider, chunker })
    }
}
