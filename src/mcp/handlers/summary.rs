//! Handler for the `summarize-document` tool.

use std::sync::Arc;

use crate::processing::DocumentService;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};
use serde_json::json;

use super::{documents::DocumentIdRequest, map_processing_error, parse_arguments};

/// Handle the `summarize-document` tool, reusing the cached summary when present.
pub(crate) async fn handle_summarize(
    documents: &Arc<DocumentService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let args: DocumentIdRequest = parse_arguments(arguments)?;
    let summary = documents
        .get_summary(args.doc_id)
        .await
        .map_err(map_processing_error)?;
    Ok(CallToolResult::structured(json!({
        "docId": args.doc_id,
        "summary": summary,
        "wordCount": summary.split_whitespace().count(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn summary_is_cached_between_calls() {
        let documents = Arc::new(DocumentService::new(&Config::default()).unwrap());
        documents
            .create_document(
                "story.txt".into(),
                "A fox crossed the river. It found a warm den. Winter passed quietly.".into(),
            )
            .await
            .unwrap();
        let arguments = json!({ "doc_id": 1 }).as_object().cloned();

        let first = handle_summarize(&documents, arguments.clone())
            .await
            .unwrap()
            .structured_content
            .unwrap();
        let second = handle_summarize(&documents, arguments)
            .await
            .unwrap()
            .structured_content
            .unwrap();

        assert_eq!(first, second);
        let snapshot = documents.metrics_snapshot();
        assert_eq!(snapshot.summaries_generated, 1);
        assert_eq!(snapshot.summary_cache_hits, 1);
    }
}
