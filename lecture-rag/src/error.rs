//! Error types for the `lecture-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing a corpus or retrieving from it.
///
/// Per-item embedding failures during bulk indexing and out-of-range search
/// positions are not represented here: the former are collected as
/// [`EmbeddingFailure`](crate::embedding::EmbeddingFailure) records and the
/// latter are logged and skipped.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration, such as a chunk overlap that is not smaller
    /// than the chunk size.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An embedding call failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Every chunk in a batch failed to embed, so no index can be built.
    #[error("no embeddings were produced ({attempted} chunk(s) attempted); check the embedding service and model")]
    EmptyEmbedding {
        /// How many chunks were submitted.
        attempted: usize,
    },

    /// Query normalization failed. The translator recovers from this locally.
    #[error("Translation error: {0}")]
    TranslationError(String),

    /// A generative text call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The text generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Persisted index artifacts are missing, incomplete or inconsistent.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The vector index rejected its input.
    #[error("Vector index error: {0}")]
    VectorIndexError(String),

    /// Filesystem failure in the index store or document loader.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON artifact could not be encoded or decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Binary vector artifact could not be encoded or decoded.
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
