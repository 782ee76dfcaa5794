//! Exact nearest-neighbor index over chunk embeddings.
//!
//! [`FlatL2Index`] stores every vector in one contiguous row-major buffer and
//! answers queries with an exhaustive scan by squared Euclidean distance. No
//! normalization is applied, so the scale of the embedding model affects
//! ranking. This is intended for corpora of hundreds to low thousands of
//! chunks.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Largest `top_k` a single search may request.
///
/// Search output always holds exactly `top_k` entries, so this bounds the
/// allocation made for padding.
pub const MAX_TOP_K: usize = 10_000;

/// One entry of a search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Build-time position of the matched vector, or `None` when the search
    /// asked for more neighbors than the index holds.
    pub position: Option<usize>,
    /// Squared Euclidean distance to the query; `f32::INFINITY` for padding.
    pub distance: f32,
}

impl Neighbor {
    /// Placeholder emitted for each requested neighbor beyond the index size.
    pub const MISSING: Neighbor = Neighbor { position: None, distance: f32::INFINITY };
}

/// A flat (brute-force) index using squared L2 distance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl FlatL2Index {
    /// Create an index with no vectors.
    pub fn empty(dimensions: usize) -> Self {
        Self { dimensions, data: Vec::new() }
    }

    /// Build an index from `N` vectors of the same dimension `D`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorIndexError`] if `vectors` is empty, the
    /// vectors have zero dimensions, or their lengths differ.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let dimensions = vectors.first().map(Vec::len).ok_or_else(|| {
            RagError::VectorIndexError("cannot build an index from zero vectors".to_string())
        })?;
        if dimensions == 0 {
            return Err(RagError::VectorIndexError("vectors must not be empty".to_string()));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RagError::VectorIndexError(format!(
                    "vector {position} has {} dimensions, expected {dimensions}",
                    vector.len()
                )));
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimensions, data })
    }

    /// Dimension `D` of every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        if self.dimensions == 0 { 0 } else { self.data.len() / self.dimensions }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The vector stored at `position`.
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimensions)?;
        let end = start.checked_add(self.dimensions)?;
        self.data.get(start..end)
    }

    /// Check that the flat buffer holds a whole number of vectors.
    ///
    /// Only needed for indexes that did not come from [`FlatL2Index::build`],
    /// such as ones read back from disk.
    pub fn check_layout(&self) -> Result<()> {
        if self.dimensions == 0 && !self.data.is_empty() {
            return Err(RagError::VectorIndexError(
                "zero-dimensional index holds data".to_string(),
            ));
        }
        if self.dimensions != 0 && self.data.len() % self.dimensions != 0 {
            return Err(RagError::VectorIndexError(format!(
                "buffer of {} values is not a multiple of dimension {}",
                self.data.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    /// Find the `top_k` nearest vectors to `query`.
    ///
    /// Returns exactly `top_k` entries ordered by ascending distance, ties
    /// broken by ascending position. When `top_k` exceeds the number of stored
    /// vectors the tail is filled with [`Neighbor::MISSING`], which callers must
    /// skip.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorIndexError`] if the query dimension differs
    /// from the index dimension or `top_k` exceeds [`MAX_TOP_K`].
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(RagError::VectorIndexError(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }
        if top_k > MAX_TOP_K {
            return Err(RagError::VectorIndexError(format!(
                "top_k {top_k} exceeds the maximum of {MAX_TOP_K}"
            )));
        }
        if self.is_empty() {
            return Ok(vec![Neighbor::MISSING; top_k]);
        }

        let mut scored: Vec<Neighbor> = self
            .data
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position: Some(position),
                distance: squared_l2(vector, query),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance.total_cmp(&b.distance).then_with(|| match (a.position, b.position) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => Ordering::Equal,
            })
        });
        scored.truncate(top_k);
        scored.resize(top_k, Neighbor::MISSING);

        Ok(scored)
    }
}
