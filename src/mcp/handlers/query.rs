//! Handler for the `query-document` tool.

use std::sync::Arc;

use crate::{mcp::format::answer_payload, processing::DocumentService};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde::Deserialize;

use super::{map_processing_error, parse_arguments};

/// Request payload for the `query-document` tool.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryDocumentRequest {
    pub(crate) doc_id: u64,
    pub(crate) query: String,
}

/// Handle the `query-document` tool by answering from one document's chunks.
pub(crate) async fn handle_query(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: QueryDocumentRequest = parse_arguments(arguments)?;
    let answer = documents
        .query(args.doc_id, &args.query)
        .await
        .map_err(map_processing_error)?;
    tracing::debug!(
        doc_id = args.doc_id,
        confidence = answer.confidence,
        context = answer.supporting_chunks.len(),
        "MCP query answered"
    );
    Ok(CallToolResult::structured(answer_payload(
        args.doc_id,
        &args.query,
        &answer,
    )))
}
