//! # lecture-rag
//!
//! Retrieval core for grounding lesson-plan and homework generation in a
//! personal collection of lecture documents.
//!
//! ## Overview
//!
//! Indexing turns documents into word-window [`Chunk`]s, embeds each chunk
//! through an [`EmbeddingProvider`], and stores the vectors in a
//! [`FlatL2Index`] alongside the chunks in a [`CorpusIndex`]. An
//! [`IndexStore`] persists the bundle to a directory.
//!
//! At query time a [`Retriever`] optionally translates the query into the
//! corpus language, embeds it, searches the index, and returns ranked
//! [`RetrievalResult`]s carrying the source document and chunk number.
//! [`format_context`] renders them as source-attributed prompt context.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lecture_rag::{
//!     CorpusIndexer, IndexStore, PlainTextExtractor, RagConfig, Retriever, load_documents,
//! };
//! use lecture_rag::ollama::OllamaEmbeddingProvider;
//!
//! let config = RagConfig::default();
//! let embedder = Arc::new(OllamaEmbeddingProvider::new(&config.embedding_model)?);
//!
//! let documents = load_documents("lectures", &PlainTextExtractor)?;
//! let indexer = CorpusIndexer::builder()
//!     .config(config.clone())
//!     .embedding_provider(embedder.clone())
//!     .build()?;
//! let (corpus, _report) = indexer.rebuild(&documents, &IndexStore::new("index")).await?;
//!
//! let retriever = Retriever::builder().config(config).embedding_provider(embedder).build()?;
//! let results = retriever.retrieve("What is overfitting?", &corpus).await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | What it enables                                   |
//! |----------|---------------------------------------------------|
//! | `ollama` | [`OllamaEmbeddingProvider`](ollama::OllamaEmbeddingProvider) and [`OllamaTextGenerator`](ollama::OllamaTextGenerator) |

pub mod chunking;
pub mod config;
pub mod context;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod indexer;
pub mod loader;
pub mod retriever;
pub mod store;
pub mod translate;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use chunking::{Chunker, WordWindowChunker, build_corpus_chunks, chunk_text};
pub use config::{
    DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL, RagConfig, RagConfigBuilder,
};
pub use context::{ContextPassage, DEFAULT_SOURCE_NAME, format_context, unique_sources};
pub use corpus::{CorpusHandle, CorpusIndex};
pub use document::{Chunk, ChunkMetadata, Document, RetrievalResult};
pub use embedding::{
    EmbedOptions, EmbeddedCorpus, EmbeddingFailure, EmbeddingProvider, embed_corpus,
    embed_with_timeout,
};
pub use error::{RagError, Result};
pub use generation::TextGenerator;
pub use index::{FlatL2Index, MAX_TOP_K, Neighbor, squared_l2};
pub use indexer::{CorpusIndexer, CorpusIndexerBuilder, IndexingReport};
pub use loader::{PlainTextExtractor, TextExtractor, load_documents};
pub use retriever::{Retriever, RetrieverBuilder, rank_neighbors};
pub use store::{IndexStore, StoreManifest};
pub use translate::{LlmQueryTranslator, PassthroughTranslator, QueryTranslator};
