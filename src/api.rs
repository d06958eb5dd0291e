//! HTTP surface for SmartDoc.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /upload` – Multipart upload (`file` field) of a PDF or text file; extracts, chunks,
//!   embeds, and registers it.
//! - `POST /documents` – Register raw text supplied as JSON (`filename`, `text`).
//! - `GET /documents` – List registered documents, optionally filtered by `?filename=`.
//! - `GET /document/:doc_id` – Document metadata.
//! - `GET /document/:doc_id/summary` – Cached summary of the document.
//! - `POST /document/:doc_id/query` – Answer a question (`query`) from the document.
//! - `GET /document/:doc_id/chunks` – Chunk texts in reading order.
//! - `GET /metrics` – Pipeline counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Errors are returned as `{ "error": kind, "message": text }` with a status derived from the
//! error kind. The HTTP surface shares the same pipeline with the MCP server, so behavior is
//! identical across interfaces.

use crate::metrics::MetricsSnapshot;
use crate::processing::{
    ComposedAnswer, DocumentApi, DocumentId, DocumentMetadata, ErrorKind, ProcessingError,
};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{FromRequestParts, Multipart, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the document API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route(
            "/documents",
            get(list_documents::<S>).post(create_document::<S>),
        )
        .route("/document/:doc_id", get(get_document::<S>))
        .route("/document/:doc_id/summary", get(get_summary::<S>))
        .route("/document/:doc_id/query", post(query_document::<S>))
        .route("/document/:doc_id/chunks", get(get_chunks::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Accept a multipart upload and register the extracted text.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<DocumentMetadata>, AppError>
where
    S: DocumentApi,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ProcessingError::InvalidRequest(format!("malformed upload: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ProcessingError::InvalidRequest(format!("malformed upload: {err}")))?;

        let metadata = service
            .upload_document(filename, bytes.to_vec(), content_type)
            .await?;
        tracing::info!(
            doc_id = metadata.doc_id,
            filename = %metadata.filename,
            chunks = metadata.num_chunks,
            "Upload request completed"
        );
        return Ok(Json(metadata));
    }

    Err(ProcessingError::InvalidRequest("multipart field `file` is required".into()).into())
}

/// Request body for the `POST /documents` endpoint.
#[derive(Deserialize)]
struct CreateDocumentRequest {
    /// Display name for the document.
    #[serde(default)]
    filename: Option<String>,
    /// Raw document contents.
    text: String,
}

/// Register raw text as a document.
async fn create_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentMetadata>, AppError>
where
    S: DocumentApi,
{
    let filename = request.filename.unwrap_or_default();
    let metadata = service.create_document(filename, request.text).await?;
    Ok(Json(metadata))
}

/// Query string accepted by `GET /documents`.
#[derive(Deserialize)]
struct ListDocumentsQuery {
    #[serde(default)]
    filename: Option<String>,
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentMetadata>,
}

/// List registered documents, optionally filtered by filename.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Json<DocumentsResponse>
where
    S: DocumentApi,
{
    let documents = match query.filename.as_deref().map(str::trim) {
        Some(fragment) if !fragment.is_empty() => service.find_documents(fragment).await,
        _ => service.list_documents().await,
    };
    Json(DocumentsResponse { documents })
}

async fn get_document<S>(
    State(service): State<Arc<S>>,
    DocumentPath(doc_id): DocumentPath,
) -> Result<Json<DocumentMetadata>, AppError>
where
    S: DocumentApi,
{
    Ok(Json(service.get_document(doc_id).await?))
}

/// Response body for `GET /document/:doc_id/summary`.
#[derive(Serialize)]
struct SummaryResponse {
    doc_id: DocumentId,
    summary: String,
}

async fn get_summary<S>(
    State(service): State<Arc<S>>,
    DocumentPath(doc_id): DocumentPath,
) -> Result<Json<SummaryResponse>, AppError>
where
    S: DocumentApi,
{
    let summary = service.get_summary(doc_id).await?;
    Ok(Json(SummaryResponse { doc_id, summary }))
}

/// Request body for `POST /document/:doc_id/query`.
#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

/// One retrieved chunk returned alongside an answer.
#[derive(Serialize)]
struct ContextChunk {
    chunk_index: usize,
    rank: usize,
    score: f32,
    text: String,
}

/// Response body for `POST /document/:doc_id/query`.
#[derive(Serialize)]
struct QueryResponse {
    doc_id: DocumentId,
    query: String,
    answer: String,
    confidence: f32,
    low_confidence: bool,
    source_chunk: usize,
    context: Vec<ContextChunk>,
}

impl QueryResponse {
    fn new(doc_id: DocumentId, query: String, answer: ComposedAnswer) -> Self {
        Self {
            doc_id,
            query,
            answer: answer.answer,
            confidence: answer.confidence,
            low_confidence: answer.low_confidence,
            source_chunk: answer.source_chunk,
            context: answer
                .supporting_chunks
                .into_iter()
                .map(|retrieved| ContextChunk {
                    chunk_index: retrieved.chunk.index,
                    rank: retrieved.rank,
                    score: retrieved.score,
                    text: retrieved.chunk.text,
                })
                .collect(),
        }
    }
}

async fn query_document<S>(
    State(service): State<Arc<S>>,
    DocumentPath(doc_id): DocumentPath,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError>
where
    S: DocumentApi,
{
    let answer = service.query(doc_id, &request.query).await?;
    tracing::info!(
        doc_id,
        confidence = answer.confidence,
        low_confidence = answer.low_confidence,
        "Query request completed"
    );
    Ok(Json(QueryResponse::new(doc_id, request.query, answer)))
}

/// Response body for `GET /document/:doc_id/chunks`.
#[derive(Serialize)]
struct ChunksResponse {
    doc_id: DocumentId,
    num_chunks: usize,
    chunks: Vec<String>,
}

async fn get_chunks<S>(
    State(service): State<Arc<S>>,
    DocumentPath(doc_id): DocumentPath,
) -> Result<Json<ChunksResponse>, AppError>
where
    S: DocumentApi,
{
    let chunks = service.get_chunks(doc_id).await?;
    Ok(Json(ChunksResponse {
        doc_id,
        num_chunks: chunks.len(),
        chunks,
    }))
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a PDF or text file as multipart field `file`. Returns the document metadata including its doc_id.",
                request_example: None,
            },
            CommandDescriptor {
                name: "create_document",
                method: "POST",
                path: "/documents",
                description: "Register raw text as a document. Returns the document metadata.",
                request_example: Some(json!({
                    "filename": "notes.txt",
                    "text": "Document contents"
                })),
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/documents",
                description: "List registered documents; `?filename=` filters by a case-insensitive substring.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_document",
                method: "GET",
                path: "/document/:doc_id",
                description: "Return metadata for one document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize",
                method: "GET",
                path: "/document/:doc_id/summary",
                description: "Summarize the document. The first summary is cached and reused.",
                request_example: None,
            },
            CommandDescriptor {
                name: "query",
                method: "POST",
                path: "/document/:doc_id/query",
                description: "Answer a question from the document. Returns the answer, its confidence, and the retrieved context.",
                request_example: Some(json!({ "query": "Who wrote the report?" })),
            },
            CommandDescriptor {
                name: "chunks",
                method: "GET",
                path: "/document/:doc_id/chunks",
                description: "Return the document's chunks in reading order.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

/// HTTP status for each error kind.
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::DocumentNotFound => StatusCode::NOT_FOUND,
        ErrorKind::EmptyDocument | ErrorKind::ExtractionError | ErrorKind::InvalidRequest => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorKind::SummaryTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ErrorKind::NoContext => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::CapabilityError | ErrorKind::AnswerUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::ConfigError | ErrorKind::EmptyIndex => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `:doc_id` path segment; malformed identifiers are reported as `invalid_request`.
struct DocumentPath(DocumentId);

#[async_trait]
impl<S> FromRequestParts<S> for DocumentPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(doc_id) = Path::<DocumentId>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ProcessingError::InvalidRequest(format!(
                    "Invalid document id: {}",
                    rejection.body_text()
                ))
            })?;
        Ok(Self(doc_id))
    }
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, kind = kind.as_str(), "Request failed");
        }
        let body = json!({
            "error": kind.as_str(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
