//! Data types for documents, chunks, and retrieval results.

use serde::{Deserialize, Serialize};

/// A source document: a name unique within the corpus and its extracted text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Identifier of the document, usually its file name (e.g. `intro.pdf`).
    pub name: String,
    /// The raw extracted text.
    pub text: String,
}

impl Document {
    /// Create a document from a name and its text.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// Provenance of a chunk: which document it came from and where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkMetadata {
    /// Name of the originating [`Document`].
    pub doc_name: String,
    /// 0-based, contiguous sequence number of the chunk within its document.
    pub chunk_id: usize,
}

impl ChunkMetadata {
    pub fn new(doc_name: impl Into<String>, chunk_id: usize) -> Self {
        Self { doc_name: doc_name.into(), chunk_id }
    }
}

/// A window of a document's text together with its provenance.
///
/// A chunk's position in the corpus-wide chunk list is its join key into the
/// vector index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text, trimmed of surrounding whitespace.
    pub text: String,
    /// Where the chunk came from.
    pub metadata: ChunkMetadata,
}

/// A chunk returned by retrieval, with its rank and distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// The chunk text.
    pub text: String,
    /// Name of the originating document.
    pub doc_name: String,
    /// Position of the chunk within its document.
    pub chunk_id: usize,
    /// 0-based rank in the returned list, dense and ascending by distance.
    pub rank: usize,
    /// Squared Euclidean distance between query and chunk embeddings.
    pub distance: f32,
}
