//! Core data types and error definitions for the document pipeline.

use crate::{
    config::ConfigError, embedding::EmbeddingClientError, extract::ExtractionError,
    index::IndexError, qa::QaClientError, summarization::SummarizationClientError,
};
use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

/// Identifier assigned to a registered document. Never reused.
pub type DocumentId = u64;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunking configured an impossible size budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// Overlap would stop the chunker from advancing.
    #[error("chunk overlap ({overlap}) must be smaller than the chunk size ({max_chars})")]
    OverlapTooLarge {
        /// Requested overlap in characters.
        overlap: usize,
        /// Requested maximum chunk size in characters.
        max_chars: usize,
    },
}

/// Errors emitted by the document pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Configuration rejected at startup.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Chunking parameters are unusable.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Vector index rejected an operation.
    #[error("Vector index error: {0}")]
    Index(#[from] IndexError),
    /// Text extraction failed or the format is not supported.
    #[error("Failed to extract text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Extraction produced no text.
    #[error("Document contains no extractable text")]
    EmptyDocument,
    /// Caller supplied an unusable argument.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// No document is registered under the identifier.
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),
    /// A registered document has nothing indexed.
    #[error("Document {0} has no indexed chunks")]
    EmptyIndex(DocumentId),
    /// Retrieval produced no context to answer from.
    #[error("No context retrieved for document {0}")]
    NoContext(DocumentId),
    /// The question answering capability produced no usable candidate.
    #[error("No answer available: {0}")]
    AnswerUnavailable(String),
    /// Map-reduce summarization did not converge within the depth bound.
    #[error("Summary still {chars} characters after {depth} reduce passes")]
    SummaryTooLarge {
        /// Reduce passes performed.
        depth: usize,
        /// Character length of the text that still did not fit.
        chars: usize,
    },
    /// Embedding provider failed.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Summarization provider failed.
    #[error("Failed to summarize: {0}")]
    Summarization(#[from] SummarizationClientError),
    /// Question answering provider failed.
    #[error("Failed to answer question: {0}")]
    QuestionAnswering(#[from] QaClientError),
}

/// Stable classification of [`ProcessingError`] used by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid chunking, index, or provider configuration.
    ConfigError,
    /// Zero-length extracted text.
    EmptyDocument,
    /// Unknown document identifier.
    DocumentNotFound,
    /// Internal invariant violation: a document without indexed chunks.
    EmptyIndex,
    /// Retrieval produced nothing.
    NoContext,
    /// Question answering produced nothing usable.
    AnswerUnavailable,
    /// Summarization recursion bound exceeded.
    SummaryTooLarge,
    /// A capability provider failed or timed out.
    CapabilityError,
    /// Upload format is not supported.
    UnsupportedFormat,
    /// Upload could not be decoded.
    ExtractionError,
    /// Caller supplied an unusable argument.
    InvalidRequest,
}

impl ErrorKind {
    /// Snake-case label matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "config_error",
            Self::EmptyDocument => "empty_document",
            Self::DocumentNotFound => "document_not_found",
            Self::EmptyIndex => "empty_index",
            Self::NoContext => "no_context",
            Self::AnswerUnavailable => "answer_unavailable",
            Self::SummaryTooLarge => "summary_too_large",
            Self::CapabilityError => "capability_error",
            Self::UnsupportedFormat => "unsupported_format",
            Self::ExtractionError => "extraction_error",
            Self::InvalidRequest => "invalid_request",
        }
    }

    /// Whether the failure is attributable to the caller's input.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::EmptyDocument
                | Self::DocumentNotFound
                | Self::UnsupportedFormat
                | Self::ExtractionError
                | Self::InvalidRequest
        )
    }
}

impl ProcessingError {
    /// Classify the error for transports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::Chunking(_) => ErrorKind::ConfigError,
            Self::Index(IndexError::DimensionMismatch { .. }) => ErrorKind::ConfigError,
            Self::Index(IndexError::UnknownChunk { .. }) => ErrorKind::EmptyIndex,
            Self::Extraction(ExtractionError::UnsupportedFormat(_)) => {
                ErrorKind::UnsupportedFormat
            }
            Self::Extraction(_) => ErrorKind::ExtractionError,
            Self::EmptyDocument => ErrorKind::EmptyDocument,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            Self::EmptyIndex(_) => ErrorKind::EmptyIndex,
            Self::NoContext(_) => ErrorKind::NoContext,
            Self::AnswerUnavailable(_) => ErrorKind::AnswerUnavailable,
            Self::SummaryTooLarge { .. } => ErrorKind::SummaryTooLarge,
            Self::Embedding(_) | Self::Summarization(_) | Self::QuestionAnswering(_) => {
                ErrorKind::CapabilityError
            }
        }
    }
}

/// Retrievable slice of a document with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Owning document.
    pub document_id: DocumentId,
    /// Zero-based position in reading order.
    pub index: usize,
    /// Character offsets `[start, end)` into the document text.
    pub span: Range<usize>,
    /// Chunk contents.
    pub text: String,
    /// Embedding computed once at registration.
    pub embedding: Vec<f32>,
}

/// A registered document. Immutable once created.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Original filename supplied by the uploader.
    pub filename: String,
    /// Normalized document text.
    pub text: String,
    /// Length of `text` in characters.
    pub char_length: usize,
    /// Chunks in reading order.
    pub chunks: Vec<Chunk>,
    /// Registration time (RFC 3339).
    pub created_at: String,
    /// SHA-256 of `text`, hex encoded.
    pub content_hash: String,
}

/// Caller-facing description of a registered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// Unique identifier.
    pub doc_id: DocumentId,
    /// Original filename.
    pub filename: String,
    /// Length of the normalized text in characters.
    pub text_length: usize,
    /// Number of chunks produced.
    pub num_chunks: usize,
    /// Registration time (RFC 3339).
    pub created_at: String,
    /// SHA-256 of the normalized text.
    pub content_hash: String,
    /// Whether a summary has already been computed and cached.
    pub has_summary: bool,
}

/// Chunk returned by retrieval with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    /// Retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query.
    pub score: f32,
    /// Zero-based position in the retrieval result, best first.
    pub rank: usize,
}

/// Result of answering a question against one document.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedAnswer {
    /// Winning answer text.
    pub answer: String,
    /// Confidence of the winning answer in `[0, 1]`.
    pub confidence: f32,
    /// Set when the confidence fell below the configured minimum.
    pub low_confidence: bool,
    /// Index of the chunk the answer was extracted from.
    pub source_chunk: usize,
    /// Every retrieved chunk, best first.
    pub supporting_chunks: Vec<RetrievedChunk>,
}
