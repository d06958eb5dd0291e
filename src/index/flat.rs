//! Exact brute-force index over per-document partitions keyed by chunk index.

use super::{IndexError, ScoredChunk, VectorIndex};
use crate::processing::DocumentId;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Normalized vectors of one document, keyed by chunk index.
type Partition = HashMap<usize, Vec<f32>>;

/// Exact brute-force index keeping one partition of normalized vectors per document.
///
/// Insertion is amortized O(1); search scans the requested partition only.
pub struct FlatIndex {
    dimension: usize,
    partitions: RwLock<HashMap<DocumentId, Partition>>,
}

impl FlatIndex {
    /// Create an empty index accepting vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Dimension every stored vector must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Descending score, then ascending chunk index.
fn rank_order(left: &ScoredChunk, right: &ScoredChunk) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| left.chunk_index.cmp(&right.chunk_index))
}

#[async_trait]
impl VectorIndex for FlatIndex {
    async fn add(
        &self,
        document_id: DocumentId,
        chunk_index: usize,
        vector: Vec<f32>,
    ) -> Result<(), IndexError> {
        self.check_dimension(&vector)?;
        let vector = normalize(vector);
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(document_id)
            .or_default()
            .insert(chunk_index, vector);
        Ok(())
    }

    async fn add_document(
        &self,
        document_id: DocumentId,
        vectors: Vec<(usize, Vec<f32>)>,
    ) -> Result<(), IndexError> {
        for (_, vector) in &vectors {
            self.check_dimension(vector)?;
        }
        let entries: Vec<(usize, Vec<f32>)> = vectors
            .into_iter()
            .map(|(chunk_index, vector)| (chunk_index, normalize(vector)))
            .collect();

        let mut partitions = self.partitions.write().await;
        let partition = partitions.entry(document_id).or_default();
        partition.extend(entries);
        tracing::debug!(
            document_id,
            entries = partition.len(),
            "Indexed document vectors"
        );
        Ok(())
    }

    async fn search(
        &self,
        document_id: DocumentId,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let query = normalize(query.to_vec());

        let partitions = self.partitions.read().await;
        let Some(partition) = partitions.get(&document_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = partition
            .iter()
            .map(|(&chunk_index, vector)| {
                let score = dot(&query, vector);
                ScoredChunk {
                    chunk_index,
                    score: if score.is_nan() { 0.0 } else { score },
                }
            })
            .collect();
        scored.sort_by(rank_order);
        scored.truncate(k);
        Ok(scored)
    }

    async fn len(&self, document_id: DocumentId) -> usize {
        self.partitions
            .read()
            .await
            .get(&document_id)
            .map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(results: &[ScoredChunk]) -> Vec<usize> {
        results.iter().map(|hit| hit.chunk_index).collect()
    }

    #[tokio::test]
    async fn ranks_by_cosine_similarity() {
        let index = FlatIndex::new(2);
        index
            .add_document(
                1,
                vec![(0, vec![0.0, 1.0]), (1, vec![1.0, 0.0]), (2, vec![1.0, 1.0])],
            )
            .await
            .unwrap();

        let results = index.search(1, &[3.0, 0.5], 3).await.unwrap();
        assert_eq!(indices(&results), vec![1, 2, 0]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn ties_break_by_ascending_chunk_index() {
        let index = FlatIndex::new(2);
        index.add(7, 2, vec![1.0, 0.0]).await.unwrap();
        index.add(7, 0, vec![2.0, 0.0]).await.unwrap();
        index.add(7, 1, vec![0.5, 0.0]).await.unwrap();

        let first = index.search(7, &[1.0, 0.0], 3).await.unwrap();
        let second = index.search(7, &[1.0, 0.0], 3).await.unwrap();
        assert_eq!(indices(&first), vec![0, 1, 2]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn never_returns_chunks_of_other_documents() {
        let index = FlatIndex::new(2);
        index.add_document(1, vec![(0, vec![1.0, 0.0])]).await.unwrap();
        index
            .add_document(2, vec![(0, vec![1.0, 0.0]), (1, vec![0.9, 0.1])])
            .await
            .unwrap();

        let results = index.search(1, &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(indices(&results), vec![0]);
        assert!(index.search(3, &[1.0, 0.0], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn k_beyond_partition_returns_everything_once() {
        let index = FlatIndex::new(3);
        index
            .add_document(
                4,
                (0..5).map(|i| (i, vec![i as f32, 1.0, 0.0])).collect(),
            )
            .await
            .unwrap();

        let results = index.search(4, &[0.0, 1.0, 0.0], 50).await.unwrap();
        let mut seen = indices(&results);
        assert_eq!(seen.len(), 5);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(index.search(4, &[0.0, 1.0, 0.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_mismatched_dimensions_without_partial_writes() {
        let index = FlatIndex::new(2);
        let error = index
            .add_document(9, vec![(0, vec![1.0, 0.0]), (1, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
        assert_eq!(index.len(9).await, 0);

        let error = index.search(9, &[1.0], 1).await.unwrap_err();
        assert!(matches!(error, IndexError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn re_adding_a_chunk_replaces_its_vector() {
        let index = FlatIndex::new(2);
        index
            .add_document(5, vec![(0, vec![1.0, 0.0]), (1, vec![0.0, 1.0])])
            .await
            .unwrap();
        index.add(5, 0, vec![0.0, 3.0]).await.unwrap();
        index
            .add_document(5, vec![(1, vec![2.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(index.len(5).await, 2);
        let results = index.search(5, &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(indices(&results), vec![1, 0]);
        assert!((results[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn large_batches_index_every_chunk() {
        let index = FlatIndex::new(4);
        let count = 50_000;
        index
            .add_document(
                1,
                (0..count)
                    .map(|i| (i, vec![1.0, i as f32, 0.0, 0.5]))
                    .collect(),
            )
            .await
            .unwrap();

        assert_eq!(index.len(1).await, count);
        let results = index.search(1, &[1.0, 0.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(indices(&results), vec![0, 1]);
    }

    #[tokio::test]
    async fn zero_vectors_score_zero() {
        let index = FlatIndex::new(2);
        index.add(1, 0, vec![0.0, 0.0]).await.unwrap();
        let results = index.search(1, &[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].score, 0.0);
    }
}
