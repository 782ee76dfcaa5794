//! Document chunking.
//!
//! Chunks are fixed-size windows of whitespace-delimited words. A window of
//! `chunk_size` words slides forward by `chunk_size - chunk_overlap` words, so
//! consecutive chunks share `chunk_overlap` words. Words are re-joined with a
//! single space, which means line breaks and runs of whitespace inside a
//! chunk are collapsed.

use std::ops::Range;

use tracing::debug;

use crate::config::RagConfig;
use crate::document::{Chunk, ChunkMetadata, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks with `chunk_id`s `0, 1, 2, …`.
    ///
    /// Returns an empty `Vec` if the document has no text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into overlapping windows of words.
///
/// # Example
///
/// ```rust
/// use lecture_rag::WordWindowChunker;
///
/// let chunker = WordWindowChunker::new(3, 1).unwrap();
/// let chunks = chunker.split("one two three four five");
/// assert_eq!(chunks, vec!["one two three", "three four five", "five"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WordWindowChunker {
    /// Create a new `WordWindowChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`, since the window would never advance.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the chunk parameters of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Word ranges covered by each window over a text of `word_count` words.
    ///
    /// Windows start at `0, step, 2 * step, …` and stop once the start
    /// reaches `word_count`; the last window is clipped to `word_count`.
    pub fn windows(&self, word_count: usize) -> impl Iterator<Item = Range<usize>> + '_ {
        let step = self.chunk_size - self.chunk_overlap;
        (0..word_count)
            .step_by(step)
            .map(move |start| start..(start + self.chunk_size).min(word_count))
    }

    /// Split raw text into chunk strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.windows(words.len())
            .map(|range| words[range].join(" "))
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

impl Chunker for WordWindowChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk {
                text,
                metadata: ChunkMetadata::new(document.name.clone(), chunk_id),
            })
            .collect()
    }
}

/// Split `text` into windows of `size` words overlapping by `overlap` words.
///
/// # Errors
///
/// Returns [`RagError::ConfigError`] if `overlap >= size` or `size == 0`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(WordWindowChunker::new(size, overlap)?.split(text))
}

/// Chunk every document in input order and concatenate the results.
///
/// The index of a chunk in the returned `Vec` is its global position, the
/// join key used by the vector index and the stored chunk arrays.
pub fn build_corpus_chunks(documents: &[Document], chunker: &dyn Chunker) -> Vec<Chunk> {
    let mut corpus = Vec::new();
    for document in documents {
        let chunks = chunker.chunk(document);
        debug!(doc_name = %document.name, chunk_count = chunks.len(), "chunked document");
        corpus.extend(chunks);
    }
    corpus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_step_by_size_minus_overlap() {
        let chunker = WordWindowChunker::new(4, 1).unwrap();
        let windows: Vec<_> = chunker.windows(10).collect();
        assert_eq!(windows, vec![0..4, 3..7, 6..10, 9..10]);
    }

    #[test]
    fn whitespace_only_text_has_no_chunks() {
        let chunker = WordWindowChunker::new(5, 2).unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split(" \n\t  ").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunker = WordWindowChunker::new(250, 50).unwrap();
        assert_eq!(chunker.split("  a  short\n text "), vec!["a short text"]);
    }

    #[test]
    fn overlap_not_smaller_than_size_is_a_config_error() {
        assert!(matches!(chunk_text("a b c", 3, 3), Err(RagError::ConfigError(_))));
        assert!(matches!(chunk_text("a b c", 3, 7), Err(RagError::ConfigError(_))));
        assert!(matches!(chunk_text("a b c", 0, 0), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn corpus_chunks_keep_document_order_and_local_ids() {
        let chunker = WordWindowChunker::new(2, 0).unwrap();
        let documents = vec![
            Document::new("a.pdf", "one two three"),
            Document::new("empty.pdf", "   "),
            Document::new("b.pdf", "four"),
        ];
        let chunks = build_corpus_chunks(&documents, &chunker);
        let metadata: Vec<_> = chunks.iter().map(|c| c.metadata.clone()).collect();
        assert_eq!(
            metadata,
            vec![
                ChunkMetadata::new("a.pdf", 0),
                ChunkMetadata::new("a.pdf", 1),
                ChunkMetadata::new("b.pdf", 0),
            ]
        );
        assert_eq!(chunks[1].text, "three");
    }
}
