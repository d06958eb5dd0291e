//! Handlers for document registration and inspection tools.

use std::{path::Path, sync::Arc};

use crate::{
    mcp::format::document_payload,
    processing::{DocumentId, DocumentService},
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{map_processing_error, parse_arguments};

/// Request payload for the `upload-document` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadDocumentRequest {
    #[serde(default)]
    pub(crate) text: Option<String>,
    #[serde(default)]
    pub(crate) path: Option<String>,
    #[serde(default)]
    pub(crate) filename: Option<String>,
    #[serde(default)]
    pub(crate) content_type: Option<String>,
}

/// Request payload for tools addressing one document.
#[derive(Debug, Deserialize)]
pub(crate) struct DocumentIdRequest {
    pub(crate) doc_id: DocumentId,
}

/// Request payload for the `list-documents` tool.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListDocumentsRequest {
    #[serde(default)]
    pub(crate) filename: Option<String>,
}

/// Handle the `upload-document` tool from inline text or a local file.
pub(crate) async fn handle_upload(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: UploadDocumentRequest = parse_arguments(arguments)?;

    let metadata = match (args.text, args.path) {
        (Some(text), None) => {
            let filename = args.filename.unwrap_or_default();
            documents
                .create_document(filename, text)
                .await
                .map_err(map_processing_error)?
        }
        (None, Some(path)) => {
            let bytes = tokio::fs::read(&path).await.map_err(|err| {
                McpError::invalid_params(
                    format!("Failed to read `{path}`: {err}"),
                    Some(json!({ "kind": "invalid_request" })),
                )
            })?;
            let filename = args.filename.or_else(|| {
                Path::new(&path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            });
            documents
                .upload_document(filename, bytes, args.content_type)
                .await
                .map_err(map_processing_error)?
        }
        _ => {
            return Err(McpError::invalid_params(
                "Provide exactly one of `text` or `path`",
                None,
            ));
        }
    };

    tracing::info!(
        doc_id = metadata.doc_id,
        chunks = metadata.num_chunks,
        "MCP upload completed"
    );
    let mut payload = document_payload(&metadata);
    payload["status"] = Value::String("ok".into());
    Ok(CallToolResult::structured(payload))
}

/// Handle the `list-documents` tool.
pub(crate) async fn handle_list_documents(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: ListDocumentsRequest = parse_arguments(arguments)?;
    let listing = match args.filename.as_deref().map(str::trim) {
        Some(fragment) if !fragment.is_empty() => documents.find_documents(fragment).await,
        _ => documents.list_documents().await,
    };
    let items: Vec<Value> = listing.iter().map(document_payload).collect();
    Ok(CallToolResult::structured(json!({
        "documents": items,
        "count": listing.len(),
    })))
}

/// Handle the `get-document` tool.
pub(crate) async fn handle_get_document(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: DocumentIdRequest = parse_arguments(arguments)?;
    let metadata = documents
        .get_document(args.doc_id)
        .await
        .map_err(map_processing_error)?;
    Ok(CallToolResult::structured(document_payload(&metadata)))
}

/// Handle the `get-chunks` tool.
pub(crate) async fn handle_get_chunks(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: DocumentIdRequest = parse_arguments(arguments)?;
    let chunks = documents
        .get_chunks(args.doc_id)
        .await
        .map_err(map_processing_error)?;
    Ok(CallToolResult::structured(json!({
        "docId": args.doc_id,
        "numChunks": chunks.len(),
        "chunks": chunks,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use rmcp::model::ErrorCode;

    fn service() -> Arc<DocumentService> {
        Arc::new(DocumentService::new(&Config::default()).unwrap())
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    #[tokio::test]
    async fn uploads_inline_text_and_lists_it() {
        let documents = service();
        let result = handle_upload(
            &documents,
            args(json!({ "text": "Tides follow the moon.", "filename": "tides.txt" })),
        )
        .await
        .unwrap();
        let payload = result.structured_content.unwrap();
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["docId"], 1);
        assert_eq!(payload["numChunks"], 1);

        let listing = handle_list_documents(&documents, args(json!({ "filename": "TIDES" })))
            .await
            .unwrap()
            .structured_content
            .unwrap();
        assert_eq!(listing["count"], 1);
        assert_eq!(listing["documents"][0]["filename"], "tides.txt");
    }

    #[tokio::test]
    async fn uploads_local_files() {
        let path = std::env::temp_dir().join(format!("smartdoc-mcp-{}.md", std::process::id()));
        tokio::fs::write(&path, "# Heading\n\nBody text.").await.unwrap();

        let documents = service();
        let payload = handle_upload(
            &documents,
            args(json!({ "path": path.to_string_lossy() })),
        )
        .await
        .unwrap()
        .structured_content
        .unwrap();
        tokio::fs::remove_file(&path).await.ok();

        assert!(payload["filename"].as_str().unwrap().ends_with(".md"));
        let chunks = handle_get_chunks(&documents, args(json!({ "doc_id": 1 })))
            .await
            .unwrap()
            .structured_content
            .unwrap();
        assert_eq!(chunks["chunks"], json!(["# Heading\n\nBody text."]));
    }

    #[tokio::test]
    async fn rejects_ambiguous_uploads() {
        let error = handle_upload(&service(), args(json!({ "text": "a", "path": "/tmp/a" })))
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn empty_text_is_a_client_error() {
        let documents = service();
        let error = handle_upload(&documents, args(json!({ "text": "   " })))
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(error.data, Some(json!({ "kind": "empty_document" })));
        assert!(documents.list_documents().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_document_is_reported() {
        let error = handle_get_document(&service(), args(json!({ "doc_id": 999 })))
            .await
            .unwrap_err();
        assert_eq!(error.data, Some(json!({ "kind": "document_not_found" })));
    }
}
