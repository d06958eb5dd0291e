//! Document service coordinating extraction, chunking, embedding, retrieval, and summarization.

use crate::{
    config::{Config, ConfigError},
    embedding::{EmbeddingClient, build_embedding_client},
    extract::{DocumentExtractor, SourceFormat, TextExtractor},
    index::{FlatIndex, VectorIndex},
    metrics::{DocumentMetrics, MetricsSnapshot},
    processing::{
        answer::{AnswerComposer, AnswerSettings},
        chunking::chunk_text,
        retriever::Retriever,
        sanitize::{
            compute_content_hash, current_timestamp_rfc3339, normalize_text, sanitize_filename,
        },
        store::DocumentStore,
        summarize::{SummaryOrchestrator, SummarySettings},
        types::{Chunk, ComposedAnswer, Document, DocumentId, DocumentMetadata, ProcessingError},
    },
    qa::{QuestionAnsweringClient, build_qa_client},
    summarization::{SummarizationClient, build_summarization_client},
};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

/// Capability implementations the service delegates to.
#[derive(Clone)]
pub struct Capabilities {
    /// Produces chunk and query embeddings.
    pub embedding: Arc<dyn EmbeddingClient>,
    /// Condenses text that fits the single-pass limit.
    pub summarization: Arc<dyn SummarizationClient>,
    /// Extracts answers from one chunk of context.
    pub question_answering: Arc<dyn QuestionAnsweringClient>,
    /// Turns uploaded bytes into text.
    pub extractor: Arc<dyn TextExtractor>,
}

impl Capabilities {
    /// Build the providers selected by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ProcessingError> {
        Ok(Self {
            embedding: build_embedding_client(config)?,
            summarization: build_summarization_client(config)?,
            question_answering: build_qa_client(config)?,
            extractor: Arc::new(DocumentExtractor::new()),
        })
    }
}

/// Owns the document registry and vector index and runs every pipeline operation.
///
/// Both the HTTP surface and the MCP tools share one instance through an `Arc`. Instances are
/// fully independent of each other, so tests can build as many as they need.
pub struct DocumentService {
    config: Config,
    store: Arc<DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedding_client: Arc<dyn EmbeddingClient>,
    extractor: Arc<dyn TextExtractor>,
    composer: AnswerComposer,
    summarizer: SummaryOrchestrator,
    metrics: Arc<DocumentMetrics>,
}

/// Abstraction over the document pipeline used by external surfaces (HTTP, MCP).
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Register raw text as a new document.
    async fn create_document(
        &self,
        filename: String,
        text: String,
    ) -> Result<DocumentMetadata, ProcessingError>;

    /// Extract text from an uploaded file and register it.
    async fn upload_document(
        &self,
        filename: Option<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<DocumentMetadata, ProcessingError>;

    /// Metadata for one document.
    async fn get_document(&self, id: DocumentId) -> Result<DocumentMetadata, ProcessingError>;

    /// Metadata for every document in ascending identifier order.
    async fn list_documents(&self) -> Vec<DocumentMetadata>;

    /// Documents whose filename contains `fragment`, case-insensitively.
    async fn find_documents(&self, fragment: &str) -> Vec<DocumentMetadata>;

    /// Chunk texts of a document in reading order.
    async fn get_chunks(&self, id: DocumentId) -> Result<Vec<String>, ProcessingError>;

    /// Summary of a document, computed once and cached.
    async fn get_summary(&self, id: DocumentId) -> Result<String, ProcessingError>;

    /// Answer a question from a document's content.
    async fn query(
        &self,
        id: DocumentId,
        question: &str,
    ) -> Result<ComposedAnswer, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

fn dimension_mismatch(expected: usize, actual: usize) -> ProcessingError {
    ConfigError::Invalid(format!(
        "EMBEDDING_DIMENSION is {expected} but the embedding provider returns {actual} components"
    ))
    .into()
}

impl DocumentService {
    /// Build a service with the providers selected by `config`.
    pub fn new(config: &Config) -> Result<Self, ProcessingError> {
        config.validate()?;
        tracing::info!(
            embedding_provider = ?config.embedding_provider,
            summarization_provider = ?config.summarization_provider,
            qa_provider = ?config.qa_provider,
            "Initializing capability providers"
        );
        let capabilities = Capabilities::from_config(config)?;
        Self::with_capabilities(config.clone(), capabilities)
    }

    /// Build a service around explicit capability implementations.
    pub fn with_capabilities(
        config: Config,
        capabilities: Capabilities,
    ) -> Result<Self, ProcessingError> {
        config.validate()?;
        let store = Arc::new(DocumentStore::new());
        let index: Arc<dyn VectorIndex> = Arc::new(FlatIndex::new(config.embedding_dimension));
        let retriever = Arc::new(Retriever::new(
            store.clone(),
            index.clone(),
            capabilities.embedding.clone(),
        ));
        let composer = AnswerComposer::new(
            retriever,
            capabilities.question_answering,
            AnswerSettings {
                top_k: config.retrieval_top_k,
                min_confidence: config.answer_min_confidence,
                concurrency: config.capability_concurrency,
            },
        );
        let summarizer = SummaryOrchestrator::new(
            capabilities.summarization,
            SummarySettings {
                input_limit: config.summary_input_limit,
                chunk_chars: config.summary_chunk_chars,
                max_depth: config.summary_max_depth,
                concurrency: config.capability_concurrency,
            },
        );

        Ok(Self {
            config,
            store,
            index,
            embedding_client: capabilities.embedding,
            extractor: capabilities.extractor,
            composer,
            summarizer,
            metrics: Arc::new(DocumentMetrics::new()),
        })
    }

    /// Build the configured service and check its embedding provider before serving requests.
    pub async fn initialize(config: &Config) -> Result<Self, ProcessingError> {
        let service = Self::new(config)?;
        service.verify_embedding_dimension().await?;
        Ok(service)
    }

    /// Embed a sample text and compare its length with `EMBEDDING_DIMENSION`.
    ///
    /// A mismatch is a `ConfigError`; an unreachable provider surfaces as `CapabilityError`.
    pub async fn verify_embedding_dimension(&self) -> Result<(), ProcessingError> {
        let sample = self.embedding_client.embed("dimension check").await?;
        let expected = self.config.embedding_dimension;
        if sample.len() != expected {
            tracing::error!(
                expected,
                actual = sample.len(),
                "Embedding provider disagrees with EMBEDDING_DIMENSION"
            );
            return Err(dimension_mismatch(expected, sample.len()));
        }
        tracing::debug!(dimension = expected, "Embedding dimension verified");
        Ok(())
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of registered documents.
    pub async fn document_count(&self) -> usize {
        self.store.len().await
    }

    /// Normalize, chunk, embed, and register a document.
    ///
    /// Creation is all-or-nothing: the identifier is reserved only once every chunk has been
    /// embedded, and the index accepts the whole batch or nothing.
    pub async fn create_document(
        &self,
        filename: String,
        text: String,
    ) -> Result<DocumentMetadata, ProcessingError> {
        let filename = sanitize_filename(Some(filename));
        let text = normalize_text(&text);
        if text.is_empty() {
            tracing::info!(filename = %filename, "Rejected empty document");
            return Err(ProcessingError::EmptyDocument);
        }
        let char_length = text.chars().count();
        tracing::info!(filename = %filename, chars = char_length, "Processing document");

        let pieces = chunk_text(
            &text,
            self.config.chunk_max_chars,
            self.config.chunk_overlap_chars,
        )?;
        tracing::debug!(
            chunks = pieces.len(),
            max_chars = self.config.chunk_max_chars,
            overlap = self.config.chunk_overlap_chars,
            "Chunked document"
        );

        let embedding_client = &self.embedding_client;
        let requests: Vec<_> = pieces
            .iter()
            .map(|piece| embedding_client.embed(&piece.text))
            .collect();
        let embeddings: Vec<Vec<f32>> = stream::iter(requests)
            .buffered(self.config.capability_concurrency)
            .try_collect()
            .await?;
        debug_assert_eq!(pieces.len(), embeddings.len());
        let expected = self.config.embedding_dimension;
        if let Some(vector) = embeddings.iter().find(|vector| vector.len() != expected) {
            return Err(dimension_mismatch(expected, vector.len()));
        }

        let id = self.store.allocate_id();
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .zip(embeddings)
            .map(|(piece, embedding)| Chunk {
                document_id: id,
                index: piece.index,
                span: piece.span,
                text: piece.text,
                embedding,
            })
            .collect();

        self.index
            .add_document(
                id,
                chunks
                    .iter()
                    .map(|chunk| (chunk.index, chunk.embedding.clone()))
                    .collect(),
            )
            .await?;

        let chunk_count = chunks.len();
        let content_hash = compute_content_hash(&text);
        let stored = self
            .store
            .insert(Document {
                id,
                filename,
                text,
                char_length,
                chunks,
                created_at: current_timestamp_rfc3339(),
                content_hash,
            })
            .await;

        self.metrics.record_document(chunk_count as u64);
        let metadata = stored.metadata();
        tracing::info!(
            doc_id = id,
            filename = %metadata.filename,
            chunks = chunk_count,
            chars = char_length,
            "Document indexed"
        );
        Ok(metadata)
    }

    /// Detect the upload format, extract its text, and register it.
    pub async fn upload_document(
        &self,
        filename: Option<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<DocumentMetadata, ProcessingError> {
        let filename = sanitize_filename(filename);
        let format = SourceFormat::detect(&filename, content_type.as_deref())?;
        tracing::debug!(
            filename = %filename,
            format = ?format,
            bytes = bytes.len(),
            "Extracting upload"
        );
        let text = self.extractor.extract(bytes, format).await?;
        self.create_document(filename, text).await
    }

    /// Metadata for one document.
    pub async fn get_document(&self, id: DocumentId) -> Result<DocumentMetadata, ProcessingError> {
        Ok(self.store.get(id).await?.metadata())
    }

    /// Metadata for every document in ascending identifier order.
    pub async fn list_documents(&self) -> Vec<DocumentMetadata> {
        self.store
            .list()
            .await
            .iter()
            .map(|stored| stored.metadata())
            .collect()
    }

    /// Documents whose filename contains `fragment`.
    pub async fn find_documents(&self, fragment: &str) -> Vec<DocumentMetadata> {
        self.store
            .find_by_filename(fragment)
            .await
            .iter()
            .map(|stored| stored.metadata())
            .collect()
    }

    /// Chunk texts in reading order.
    pub async fn get_chunks(&self, id: DocumentId) -> Result<Vec<String>, ProcessingError> {
        let stored = self.store.get(id).await?;
        Ok(stored
            .document()
            .chunks
            .iter()
            .map(|chunk| chunk.text.clone())
            .collect())
    }

    /// Summary of a document; the first successful computation is cached for later calls.
    pub async fn get_summary(&self, id: DocumentId) -> Result<String, ProcessingError> {
        let stored = self.store.get(id).await?;
        let text = stored.document().text.as_str();
        let summarizer = &self.summarizer;
        let (summary, cache_hit) = stored
            .summary_or_compute(|| summarizer.summarize(text))
            .await?;
        self.metrics.record_summary(cache_hit);
        tracing::info!(doc_id = id, cache_hit, chars = summary.chars().count(), "Summary ready");
        Ok(summary)
    }

    /// Answer a question from a document's content.
    pub async fn query(
        &self,
        id: DocumentId,
        question: &str,
    ) -> Result<ComposedAnswer, ProcessingError> {
        let answer = self.composer.answer(id, question).await?;
        self.metrics.record_answer(answer.low_confidence);
        Ok(answer)
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn create_document(
        &self,
        filename: String,
        text: String,
    ) -> Result<DocumentMetadata, ProcessingError> {
        DocumentService::create_document(self, filename, text).await
    }

    async fn upload_document(
        &self,
        filename: Option<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<DocumentMetadata, ProcessingError> {
        DocumentService::upload_document(self, filename, bytes, content_type).await
    }

    async fn get_document(&self, id: DocumentId) -> Result<DocumentMetadata, ProcessingError> {
        DocumentService::get_document(self, id).await
    }

    async fn list_documents(&self) -> Vec<DocumentMetadata> {
        DocumentService::list_documents(self).await
    }

    async fn find_documents(&self, fragment: &str) -> Vec<DocumentMetadata> {
        DocumentService::find_documents(self, fragment).await
    }

    async fn get_chunks(&self, id: DocumentId) -> Result<Vec<String>, ProcessingError> {
        DocumentService::get_chunks(self, id).await
    }

    async fn get_summary(&self, id: DocumentId) -> Result<String, ProcessingError> {
        DocumentService::get_summary(self, id).await
    }

    async fn query(
        &self,
        id: DocumentId,
        question: &str,
    ) -> Result<ComposedAnswer, ProcessingError> {
        DocumentService::query(self, id, question).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}
