//! The unit of indexing and persistence: a vector index plus its chunks.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::document::{Chunk, ChunkMetadata};
use crate::embedding::EmbeddedCorpus;
use crate::error::{RagError, Result};
use crate::index::FlatL2Index;

/// A built corpus: `index.vector(i)` is the embedding of `chunks()[i]`.
///
/// Text and metadata live in the same [`Chunk`] record, so the only
/// positional join left is between the vector index and the chunk list, and
/// it is checked on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusIndex {
    embedding_model: String,
    index: FlatL2Index,
    chunks: Vec<Chunk>,
}

impl CorpusIndex {
    /// Pair an index with its chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorIndexError`] if the index does not hold
    /// exactly one vector per chunk.
    pub fn new(
        embedding_model: impl Into<String>,
        index: FlatL2Index,
        chunks: Vec<Chunk>,
    ) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(RagError::VectorIndexError(format!(
                "index holds {} vectors but {} chunks were supplied",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { embedding_model: embedding_model.into(), index, chunks })
    }

    /// Build the index over the surviving chunks of an embedding run.
    pub fn from_embedded(
        embedding_model: impl Into<String>,
        embedded: EmbeddedCorpus,
    ) -> Result<Self> {
        let index = FlatL2Index::build(&embedded.vectors)?;
        Self::new(embedding_model, index, embedded.chunks)
    }

    /// Model the vectors were produced with.
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Chunk texts in position order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.text.as_str())
    }

    /// Chunk metadata in position order.
    pub fn metadata(&self) -> impl Iterator<Item = &ChunkMetadata> {
        self.chunks.iter().map(|c| &c.metadata)
    }
}

/// Shared, swappable reference to the corpus currently being served.
///
/// Rebuilding never mutates a published [`CorpusIndex`]; a new one is built
/// and swapped in with [`CorpusHandle::replace`]. Readers keep the snapshot
/// they obtained from [`CorpusHandle::current`] until they drop it.
#[derive(Debug, Clone, Default)]
pub struct CorpusHandle {
    inner: Arc<RwLock<Option<Arc<CorpusIndex>>>>,
}

impl CorpusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle already serving `corpus`.
    pub fn with_corpus(corpus: CorpusIndex) -> Self {
        Self { inner: Arc::new(RwLock::new(Some(Arc::new(corpus)))) }
    }

    /// Snapshot of the corpus being served, if any.
    pub async fn current(&self) -> Option<Arc<CorpusIndex>> {
        self.inner.read().await.clone()
    }

    /// Publish `corpus`, returning the one it replaces.
    pub async fn replace(&self, corpus: CorpusIndex) -> Option<Arc<CorpusIndex>> {
        self.inner.write().await.replace(Arc::new(corpus))
    }

    /// Stop serving any corpus.
    pub async fn clear(&self) -> Option<Arc<CorpusIndex>> {
        self.inner.write().await.take()
    }
}
