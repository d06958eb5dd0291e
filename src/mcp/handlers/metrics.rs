//! Handler for the metrics tool.

use std::sync::Arc;

use crate::processing::DocumentService;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde_json::json;

/// Handle the `metrics` tool, returning the current pipeline counters.
pub(crate) async fn handle_metrics(
    documents: &Arc<DocumentService>,
) -> Result<CallToolResult, McpError> {
    let snapshot = documents.metrics_snapshot();
    Ok(CallToolResult::structured(json!({
        "documentsIndexed": snapshot.documents_indexed,
        "chunksIndexed": snapshot.chunks_indexed,
        "queriesAnswered": snapshot.queries_answered,
        "lowConfidenceAnswers": snapshot.low_confidence_answers,
        "summariesGenerated": snapshot.summaries_generated,
        "summaryCacheHits": snapshot.summary_cache_hits,
    })))
}
