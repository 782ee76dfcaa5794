//! Embedding provider trait and corpus-wide embedding.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::document::{Chunk, ChunkMetadata};
use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend (Ollama, a test fake,
/// …) behind a unified async interface. Every vector produced for one
/// corpus must have the same dimension.
///
/// # Example
///
/// ```rust,ignore
/// use lecture_rag::EmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("nomic-embed-text")?;
/// let embedding = provider.embed("gradient descent").await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend name used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Options for [`embed_corpus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    /// Upper bound for each embedding call.
    pub timeout: Duration,
    /// Number of calls kept in flight. `1` embeds strictly one at a time.
    pub concurrency: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(60), concurrency: 1 }
    }
}

/// A chunk that was dropped because its embedding call failed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingFailure {
    /// Global position of the chunk in the input list.
    pub position: usize,
    /// Provenance of the dropped chunk.
    pub metadata: ChunkMetadata,
    /// Why the call failed.
    pub message: String,
}

/// The surviving chunks of a corpus and their vectors.
///
/// `vectors[i]` is the embedding of `chunks[i]`; both have the same length.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCorpus {
    pub vectors: Vec<Vec<f32>>,
    pub chunks: Vec<Chunk>,
    pub failures: Vec<EmbeddingFailure>,
}

impl EmbeddedCorpus {
    /// Dimension shared by every vector.
    pub fn dimensions(&self) -> usize {
        self.vectors.first().map_or(0, Vec::len)
    }
}

/// Embed a single text, failing with [`RagError::EmbeddingError`] when the
/// call does not finish within `timeout`.
pub async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    text: &str,
    timeout: Duration,
) -> Result<Vec<f32>> {
    match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(Ok(vector)) if vector.is_empty() => Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: "service returned an empty vector".to_string(),
        }),
        Ok(result) => result,
        Err(_) => Err(RagError::EmbeddingError {
            provider: provider.name().to_string(),
            message: format!("timed out after {timeout:?}"),
        }),
    }
}

/// Embed every chunk, dropping the ones whose call fails.
///
/// Failed chunks are logged with their document and position and recorded in
/// [`EmbeddedCorpus::failures`]; the rest of the batch carries on. A vector
/// whose dimension differs from the first successful one is treated as a
/// failure as well. Output order follows input order regardless of
/// `options.concurrency`.
///
/// # Errors
///
/// Returns [`RagError::EmptyEmbedding`] if no chunk could be embedded.
pub async fn embed_corpus(
    provider: &dyn EmbeddingProvider,
    chunks: Vec<Chunk>,
    options: EmbedOptions,
) -> Result<EmbeddedCorpus> {
    let total = chunks.len();
    let timeout = options.timeout;

    let outcomes: Vec<(usize, Chunk, Result<Vec<f32>>)> =
        stream::iter(chunks.into_iter().enumerate())
            .map(move |(position, chunk)| async move {
                debug!(
                    provider = provider.name(),
                    doc_name = %chunk.metadata.doc_name,
                    chunk_id = chunk.metadata.chunk_id,
                    position,
                    total,
                    "embedding chunk"
                );
                let outcome = embed_with_timeout(provider, &chunk.text, timeout).await;
                (position, chunk, outcome)
            })
            .buffered(options.concurrency.max(1))
            .collect()
            .await;

    let mut corpus = EmbeddedCorpus::default();
    let mut dimensions: Option<usize> = None;

    for (position, chunk, outcome) in outcomes {
        let outcome = outcome.and_then(|vector| match dimensions {
            Some(expected) if expected != vector.len() => Err(RagError::EmbeddingError {
                provider: provider.name().to_string(),
                message: format!("expected {expected} dimensions, got {}", vector.len()),
            }),
            _ => Ok(vector),
        });

        match outcome {
            Ok(vector) => {
                dimensions.get_or_insert(vector.len());
                corpus.vectors.push(vector);
                corpus.chunks.push(chunk);
            }
            Err(e) => {
                warn!(
                    position,
                    doc_name = %chunk.metadata.doc_name,
                    chunk_id = chunk.metadata.chunk_id,
                    error = %e,
                    "embedding failed; chunk dropped"
                );
                corpus.failures.push(EmbeddingFailure {
                    position,
                    metadata: chunk.metadata,
                    message: e.to_string(),
                });
            }
        }
    }

    if corpus.vectors.is_empty() {
        return Err(RagError::EmptyEmbedding { attempted: total });
    }

    info!(
        provider = provider.name(),
        embedded = corpus.vectors.len(),
        failed = corpus.failures.len(),
        dimensions = corpus.dimensions(),
        "embedded corpus"
    );

    Ok(corpus)
}
