//! Vector index abstraction and the exact in-memory implementation.
//!
//! Similarity is cosine similarity, computed as a dot product over L2-normalized vectors
//! (normalized once on insert and once per query). Results are ordered by descending score with
//! ties broken by ascending chunk index, so repeated searches return identical rankings.

pub mod flat;

use crate::processing::DocumentId;
use async_trait::async_trait;
use thiserror::Error;

pub use flat::FlatIndex;

/// Errors returned by vector index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Vector length differs from the index dimension.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was built with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
    /// Search returned a chunk the document does not contain.
    #[error("Index entry {chunk_index} does not belong to document {document_id}")]
    UnknownChunk {
        /// Document that was searched.
        document_id: DocumentId,
        /// Chunk index reported by the index.
        chunk_index: usize,
    },
}

/// A chunk reference ranked by similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredChunk {
    /// Sequence index of the chunk within its document.
    pub chunk_index: usize,
    /// Cosine similarity to the query in `[-1, 1]`.
    pub score: f32,
}

/// Storage and nearest-neighbour search over chunk embeddings, partitioned by document.
///
/// A search for one document never returns entries of another. Implementations may be exact or
/// approximate; [`FlatIndex`] is exact.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the vector for one chunk.
    async fn add(
        &self,
        document_id: DocumentId,
        chunk_index: usize,
        vector: Vec<f32>,
    ) -> Result<(), IndexError>;

    /// Insert every chunk vector of a document, or none of them if any is invalid.
    async fn add_document(
        &self,
        document_id: DocumentId,
        vectors: Vec<(usize, Vec<f32>)>,
    ) -> Result<(), IndexError>;

    /// Return up to `k` chunks of `document_id` most similar to `query`, best first.
    async fn search(
        &self,
        document_id: DocumentId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Number of entries stored for `document_id`.
    async fn len(&self, document_id: DocumentId) -> usize;
}
