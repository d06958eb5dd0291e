//! Answer composition: run question answering per retrieved chunk and keep the best candidate.

use super::retriever::Retriever;
use super::types::{ComposedAnswer, DocumentId, ProcessingError};
use crate::qa::{QaCandidate, QuestionAnsweringClient};
use futures_util::{StreamExt, stream};
use std::sync::Arc;

/// Tunables for [`AnswerComposer`].
#[derive(Debug, Clone, Copy)]
pub struct AnswerSettings {
    /// Chunks retrieved per question.
    pub top_k: usize,
    /// Answers below this confidence are flagged as low confidence.
    pub min_confidence: f32,
    /// Concurrent question answering calls per request.
    pub concurrency: usize,
}

/// Feeds retrieved chunks to the question answering capability and merges the candidates.
pub struct AnswerComposer {
    retriever: Arc<Retriever>,
    qa_client: Arc<dyn QuestionAnsweringClient>,
    settings: AnswerSettings,
}

impl AnswerComposer {
    /// Build a composer on top of `retriever` and `qa_client`.
    pub fn new(
        retriever: Arc<Retriever>,
        qa_client: Arc<dyn QuestionAnsweringClient>,
        settings: AnswerSettings,
    ) -> Self {
        Self {
            retriever,
            qa_client,
            settings,
        }
    }

    /// Answer `question` from the content of `document_id`.
    ///
    /// Each retrieved chunk is answered independently; the highest confidence wins and exact
    /// ties go to the better-ranked chunk. All retrieved chunks are returned as context.
    pub async fn answer(
        &self,
        document_id: DocumentId,
        question: &str,
    ) -> Result<ComposedAnswer, ProcessingError> {
        let supporting_chunks = self
            .retriever
            .retrieve(document_id, question, self.settings.top_k)
            .await?;
        if supporting_chunks.is_empty() {
            return Err(ProcessingError::NoContext(document_id));
        }

        let qa_client = &self.qa_client;
        let requests: Vec<_> = supporting_chunks
            .iter()
            .map(|retrieved| qa_client.answer(question, &retrieved.chunk.text))
            .collect();
        let outcomes: Vec<_> = stream::iter(requests)
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut best: Option<(usize, QaCandidate)> = None;
        let mut last_error = None;

        for (rank, outcome) in outcomes.into_iter().enumerate() {
            let candidate = match outcome {
                Ok(candidate) => candidate,
                Err(error) => {
                    tracing::warn!(
                        document_id,
                        chunk = supporting_chunks[rank].chunk.index,
                        error = %error,
                        "Question answering failed for chunk"
                    );
                    last_error = Some(error);
                    continue;
                }
            };
            let Some(candidate) = sanitize_candidate(candidate) else {
                continue;
            };
            // strictly greater keeps the earlier rank on ties
            if best
                .as_ref()
                .is_none_or(|(_, current)| candidate.confidence > current.confidence)
            {
                best = Some((rank, candidate));
            }
        }

        let Some((rank, winner)) = best else {
            let reason = match last_error {
                Some(error) => format!("question answering failed for every chunk: {error}"),
                None => "no chunk produced an answer".to_string(),
            };
            return Err(ProcessingError::AnswerUnavailable(reason));
        };

        let low_confidence = winner.confidence < self.settings.min_confidence;
        let source_chunk = supporting_chunks[rank].chunk.index;
        tracing::info!(
            document_id,
            source_chunk,
            rank,
            confidence = winner.confidence,
            low_confidence,
            candidates = supporting_chunks.len(),
            "Answer composed"
        );

        Ok(ComposedAnswer {
            answer: winner.answer,
            confidence: winner.confidence,
            low_confidence,
            source_chunk,
            supporting_chunks,
        })
    }
}

/// Drop blank answers and clamp confidence into `[0, 1]` (NaN counts as 0).
fn sanitize_candidate(candidate: QaCandidate) -> Option<QaCandidate> {
    let answer = candidate.answer.trim();
    if answer.is_empty() {
        return None;
    }
    let confidence = if candidate.confidence.is_nan() {
        0.0
    } else {
        candidate.confidence.clamp(0.0, 1.0)
    };
    Some(QaCandidate {
        answer: answer.to_string(),
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingClient;
    use crate::index::{FlatIndex, VectorIndex};
    use crate::processing::store::DocumentStore;
    use crate::processing::testing::{ScriptedQa, register_document};

    const SETTINGS: AnswerSettings = AnswerSettings {
        top_k: 5,
        min_confidence: 0.5,
        concurrency: 2,
    };

    async fn composer_with(qa: ScriptedQa, chunks: &[&str]) -> (AnswerComposer, DocumentId) {
        let store = Arc::new(DocumentStore::new());
        let index: Arc<dyn VectorIndex> = Arc::new(FlatIndex::new(32));
        let embedding = Arc::new(HashingEmbeddingClient::new(32));
        let id = register_document(&store, &index, embedding.as_ref(), chunks).await;
        let retriever = Arc::new(Retriever::new(store, index, embedding));
        (AnswerComposer::new(retriever, Arc::new(qa), SETTINGS), id)
    }

    #[tokio::test]
    async fn highest_confidence_wins_and_context_is_complete() {
        let qa = ScriptedQa::new()
            .respond("apples are red", "red", 0.3)
            .respond("bananas are yellow", "yellow", 0.9)
            .respond("grapes are purple", "purple", 0.6);
        let (composer, id) = composer_with(
            qa,
            &["apples are red", "bananas are yellow", "grapes are purple"],
        )
        .await;

        let answer = composer.answer(id, "what colour are fruits").await.unwrap();
        assert_eq!(answer.answer, "yellow");
        assert_eq!(answer.source_chunk, 1);
        assert!(!answer.low_confidence);
        assert_eq!(answer.supporting_chunks.len(), 3);
    }

    #[tokio::test]
    async fn ties_prefer_better_retrieval_rank() {
        let qa = ScriptedQa::new()
            .respond("kiwi kiwi kiwi", "from first", 0.7)
            .respond("kiwi and mango", "from second", 0.7);
        let (composer, id) = composer_with(qa, &["kiwi and mango", "kiwi kiwi kiwi"]).await;

        let answer = composer.answer(id, "kiwi").await.unwrap();
        let top_ranked = &answer.supporting_chunks[0].chunk.text;
        let expected = if top_ranked == "kiwi kiwi kiwi" {
            "from first"
        } else {
            "from second"
        };
        assert_eq!(answer.answer, expected);
    }

    #[tokio::test]
    async fn low_confidence_is_flagged_not_hidden() {
        let qa = ScriptedQa::new().respond("only chunk", "maybe", 0.2);
        let (composer, id) = composer_with(qa, &["only chunk"]).await;

        let answer = composer.answer(id, "anything").await.unwrap();
        assert_eq!(answer.answer, "maybe");
        assert!(answer.low_confidence);
    }

    #[tokio::test]
    async fn out_of_range_confidence_is_clamped() {
        let qa = ScriptedQa::new().respond("only chunk", "sure", 7.5);
        let (composer, id) = composer_with(qa, &["only chunk"]).await;

        let answer = composer.answer(id, "anything").await.unwrap();
        assert_eq!(answer.confidence, 1.0);
    }

    #[tokio::test]
    async fn partial_failures_are_tolerated() {
        let qa = ScriptedQa::new()
            .fail("broken chunk")
            .respond("healthy chunk", "fine", 0.8);
        let (composer, id) = composer_with(qa, &["broken chunk", "healthy chunk"]).await;

        let answer = composer.answer(id, "chunk").await.unwrap();
        assert_eq!(answer.answer, "fine");
        assert_eq!(answer.supporting_chunks.len(), 2);
    }

    #[tokio::test]
    async fn all_failures_yield_answer_unavailable() {
        let qa = ScriptedQa::new().fail("broken one").fail("broken two");
        let (composer, id) = composer_with(qa, &["broken one", "broken two"]).await;

        let error = composer.answer(id, "anything").await.unwrap_err();
        assert!(matches!(error, ProcessingError::AnswerUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_documents_are_not_found() {
        let (composer, _) = composer_with(ScriptedQa::new(), &["text"]).await;
        let error = composer.answer(999, "anything").await.unwrap_err();
        assert!(matches!(error, ProcessingError::DocumentNotFound(999)));
    }
}
