//! Query-time retrieval: embed the question, rank one document's chunks, resolve them.

use super::store::DocumentStore;
use super::types::{DocumentId, ProcessingError, RetrievedChunk};
use crate::embedding::EmbeddingClient;
use crate::index::{IndexError, VectorIndex};
use std::sync::Arc;

/// Resolves a natural-language query into the best matching chunks of a document.
///
/// Must share its embedding client with the ingestion path so queries and chunks live in the
/// same vector space.
pub struct Retriever {
    store: Arc<DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedding_client: Arc<dyn EmbeddingClient>,
}

impl Retriever {
    /// Build a retriever over the given store, index, and embedding client.
    pub fn new(
        store: Arc<DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedding_client: Arc<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            store,
            index,
            embedding_client,
        }
    }

    /// Return up to `k` chunks of `document_id` ranked by similarity to `query`, best first.
    pub async fn retrieve(
        &self,
        document_id: DocumentId,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, ProcessingError> {
        if query.trim().is_empty() {
            return Err(ProcessingError::InvalidRequest(
                "query must not be empty".into(),
            ));
        }

        let stored = self.store.get(document_id).await?;
        let document = stored.document();
        if document.chunks.is_empty() {
            return Err(ProcessingError::EmptyIndex(document_id));
        }

        let vector = self.embedding_client.embed(query).await?;
        let hits = self.index.search(document_id, &vector, k).await?;
        if hits.is_empty() && k > 0 {
            return Err(ProcessingError::EmptyIndex(document_id));
        }

        let retrieved = hits
            .into_iter()
            .enumerate()
            .map(|(rank, hit)| {
                document
                    .chunks
                    .get(hit.chunk_index)
                    .map(|chunk| RetrievedChunk {
                        chunk: chunk.clone(),
                        score: hit.score,
                        rank,
                    })
                    .ok_or(IndexError::UnknownChunk {
                        document_id,
                        chunk_index: hit.chunk_index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            document_id,
            k,
            returned = retrieved.len(),
            top_score = retrieved.first().map(|hit| hit.score),
            "Retrieved chunks"
        );

        Ok(retrieved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingClient;
    use crate::index::FlatIndex;
    use crate::processing::testing::register_document;
    use crate::processing::types::ErrorKind;

    async fn fixture() -> (Retriever, DocumentId) {
        let store = Arc::new(DocumentStore::new());
        let index: Arc<dyn VectorIndex> = Arc::new(FlatIndex::new(64));
        let embedding = Arc::new(HashingEmbeddingClient::new(64));
        let id = register_document(
            &store,
            &index,
            embedding.as_ref(),
            &[
                "Otters eat clams and sea urchins.",
                "Glaciers carve deep valleys slowly.",
                "Volcanoes erupt molten rock and ash.",
            ],
        )
        .await;
        (Retriever::new(store, index, embedding), id)
    }

    #[tokio::test]
    async fn ranks_follow_result_order() {
        let (retriever, id) = fixture().await;
        let hits = retriever
            .retrieve(id, "What do otters eat? clams", 3)
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.index, 0);
        let ranks: Vec<usize> = hits.iter().map(|hit| hit.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
        assert!(hits.windows(2).all(|pair| pair[0].score >= pair[1].score));
    }

    #[tokio::test]
    async fn unknown_documents_and_blank_queries_fail() {
        let (retriever, _) = fixture().await;
        let error = retriever.retrieve(42, "anything", 2).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DocumentNotFound);

        let error = retriever.retrieve(1, "  ", 2).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidRequest);
    }
}
