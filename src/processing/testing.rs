//! Capability fakes shared by the processing unit tests.

use super::store::DocumentStore;
use super::types::{Chunk, Document, DocumentId};
use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::index::VectorIndex;
use crate::qa::{QaCandidate, QaClientError, QuestionAnsweringClient};
use crate::summarization::{SummarizationClient, SummarizationClientError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Register `chunks` as a document, bypassing chunking.
pub(crate) async fn register_document(
    store: &DocumentStore,
    index: &Arc<dyn VectorIndex>,
    embedding: &dyn EmbeddingClient,
    chunks: &[&str],
) -> DocumentId {
    let id = store.allocate_id();
    let mut offset = 0;
    let mut records = Vec::new();
    for (position, text) in chunks.iter().enumerate() {
        let length = text.chars().count();
        records.push(Chunk {
            document_id: id,
            index: position,
            span: offset..offset + length,
            text: (*text).to_string(),
            embedding: embedding.embed(text).await.unwrap(),
        });
        offset += length;
    }
    index
        .add_document(
            id,
            records
                .iter()
                .map(|chunk| (chunk.index, chunk.embedding.clone()))
                .collect(),
        )
        .await
        .unwrap();
    store
        .insert(Document {
            id,
            filename: format!("doc-{id}.txt"),
            text: chunks.concat(),
            char_length: offset,
            chunks: records,
            created_at: "2026-01-01T00:00:00Z".into(),
            content_hash: "hash".into(),
        })
        .await;
    id
}

/// QA fake answering from a table keyed by context.
#[derive(Default)]
pub(crate) struct ScriptedQa {
    responses: HashMap<String, Option<QaCandidate>>,
}

impl ScriptedQa {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, context: &str, answer: &str, confidence: f32) -> Self {
        self.responses.insert(
            context.to_string(),
            Some(QaCandidate {
                answer: answer.to_string(),
                confidence,
            }),
        );
        self
    }

    pub(crate) fn fail(mut self, context: &str) -> Self {
        self.responses.insert(context.to_string(), None);
        self
    }
}

#[async_trait]
impl QuestionAnsweringClient for ScriptedQa {
    async fn answer(&self, _question: &str, context: &str) -> Result<QaCandidate, QaClientError> {
        match self.responses.get(context) {
            Some(Some(candidate)) => Ok(candidate.clone()),
            Some(None) => Err(QaClientError::GenerationFailed("scripted failure".into())),
            None => Ok(QaCandidate {
                answer: String::new(),
                confidence: 0.0,
            }),
        }
    }
}

/// Summarizer spy recording every input.
pub(crate) struct CountingSummarizer {
    keep_chars: Option<usize>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl CountingSummarizer {
    /// Echo the input unchanged.
    pub(crate) fn identity() -> Self {
        Self::with_limit(None)
    }

    /// Keep the first `chars` characters of the input.
    pub(crate) fn truncating(chars: usize) -> Self {
        Self::with_limit(Some(chars))
    }

    fn with_limit(keep_chars: Option<usize>) -> Self {
        Self {
            keep_chars,
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SummarizationClient for CountingSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().unwrap().push(text.to_string());
        Ok(match self.keep_chars {
            Some(limit) => text.chars().take(limit).collect(),
            None => text.to_string(),
        })
    }
}

/// Summarizer that always fails.
pub(crate) struct FailingSummarizer;

#[async_trait]
impl SummarizationClient for FailingSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizationClientError> {
        Err(SummarizationClientError::GenerationFailed(
            "summarizer offline".into(),
        ))
    }
}

/// Embedder that fails once `fail_after` calls have succeeded.
pub(crate) struct FlakyEmbedder {
    inner: crate::embedding::HashingEmbeddingClient,
    fail_after: usize,
    calls: AtomicUsize,
}

impl FlakyEmbedder {
    pub(crate) fn new(dimension: usize, fail_after: usize) -> Self {
        Self {
            inner: crate::embedding::HashingEmbeddingClient::new(dimension),
            fail_after,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingClient for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingClientError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_after {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding backend dropped".into(),
            ));
        }
        self.inner.embed(text).await
    }
}
