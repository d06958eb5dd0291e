//! MCP server bootstrap and request dispatch.

use std::{borrow::Cow, sync::Arc};

use crate::{
    mcp::{
        format::{SettingsSnapshot, health_payload, json_resource_contents, serialize_json},
        handlers::{
            documents::{
                handle_get_chunks, handle_get_document, handle_list_documents, handle_upload,
            },
            metrics::handle_metrics,
            query::handle_query,
            summary::handle_summarize,
        },
        registry, schemas,
    },
    processing::DocumentService,
};
use rmcp::{
    ErrorData as McpError,
    handler::server::ServerHandler,
    model::{
        AnnotateAble, CallToolRequestParam, CallToolResult, JsonObject, ListResourcesResult,
        ListToolsResult, RawResource, ReadResourceRequestParam, ReadResourceResult, Resource,
        ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
    },
};

const HEALTH_URI: &str = "mcp://health";
const SETTINGS_URI: &str = "mcp://settings";
const USAGE_URI: &str = "mcp://usage";

/// MCP server implementation exposing SmartDoc operations.
#[derive(Clone)]
pub struct SmartDocMcpServer {
    documents: Arc<DocumentService>,
    registry: Arc<registry::Registry>,
}

impl SmartDocMcpServer {
    /// Create a new MCP server on top of the supplied document service.
    pub fn new(documents: Arc<DocumentService>) -> Self {
        let mut registry = registry::Registry::new();

        registry.register_resource(
            resource(SETTINGS_URI, "settings", "Chunking, retrieval, and summary tunables"),
            resource_settings,
        );
        registry.register_resource(
            resource(
                HEALTH_URI,
                "health",
                "Configured capability providers and registered document count",
            ),
            resource_health,
        );
        registry.register_resource(
            resource(
                USAGE_URI,
                "usage",
                "Recommended tool flow: upload-document → query-document / summarize-document.",
            ),
            resource_usage,
        );

        registry.register_tool(
            tool(
                "upload-document",
                "Upload Document",
                "Register a document from inline text or a local PDF/text file; returns its doc_id.",
                schemas::upload_document_input_schema(),
                ToolAnnotations::with_title("Upload Document")
                    .destructive(false)
                    .idempotent(false)
                    .open_world(false),
            ),
            tool_upload,
        );
        registry.register_tool(
            tool(
                "list-documents",
                "List Documents",
                "See which documents are registered, optionally filtered by filename.",
                schemas::list_documents_input_schema(),
                read_only("List Documents"),
            ),
            tool_list_documents,
        );
        registry.register_tool(
            tool(
                "get-document",
                "Document Info",
                "Return metadata (length, chunk count, summary state) for one document.",
                schemas::document_id_input_schema(),
                read_only("Document Info"),
            ),
            tool_get_document,
        );
        registry.register_tool(
            tool(
                "get-chunks",
                "Document Chunks",
                "Return the document's chunks in reading order.",
                schemas::document_id_input_schema(),
                read_only("Document Chunks"),
            ),
            tool_get_chunks,
        );
        registry.register_tool(
            tool(
                "summarize-document",
                "Summarize Document",
                "Summarize a whole document; the first summary is cached and reused.",
                schemas::document_id_input_schema(),
                read_only("Summarize Document"),
            ),
            tool_summarize,
        );
        registry.register_tool(
            tool(
                "query-document",
                "Ask Document",
                "Answer a question using only one document; returns the answer, confidence, and cited chunks.",
                schemas::query_input_schema(),
                read_only("Ask Document"),
            ),
            tool_query,
        );
        registry.register_tool(
            tool(
                "metrics",
                "Metrics Snapshot",
                "Check documents, chunks, queries, and summaries processed so far.",
                schemas::empty_object_schema(),
                read_only("Metrics Snapshot"),
            ),
            tool_metrics,
        );

        Self {
            documents,
            registry: Arc::new(registry),
        }
    }
}

fn tool(
    name: &'static str,
    title: &str,
    description: &'static str,
    input_schema: JsonObject,
    annotations: ToolAnnotations,
) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        title: Some(title.to_string()),
        description: Some(Cow::Borrowed(description)),
        input_schema: Arc::new(input_schema),
        output_schema: None,
        annotations: Some(annotations),
        icons: None,
    }
}

fn read_only(title: &str) -> ToolAnnotations {
    ToolAnnotations::with_title(title)
        .read_only(true)
        .idempotent(true)
        .open_world(false)
}

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.into());
    raw.mime_type = Some(super::format::APPLICATION_JSON.into());
    raw.no_annotation()
}

fn resource_settings(
    server: &SmartDocMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let documents = server.documents.clone();
    Box::pin(async move {
        let payload = SettingsSnapshot::from_config(documents.config());
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                SETTINGS_URI,
                serialize_json(&payload, SETTINGS_URI),
            )],
        })
    })
}

fn resource_health(
    server: &SmartDocMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    let documents = server.documents.clone();
    Box::pin(async move {
        let count = documents.document_count().await;
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                HEALTH_URI,
                health_payload(documents.config(), count),
            )],
        })
    })
}

fn resource_usage(
    _server: &SmartDocMcpServer,
    _request: ReadResourceRequestParam,
) -> registry::ResourceFuture {
    Box::pin(async move {
        let usage = serde_json::json!({
            "title": "SmartDoc MCP Usage",
            "policy": [
                "Do not paste long documents into prompts; register them with `upload-document`.",
                "Answers come from a single document; pass its doc_id explicitly.",
                "Treat `lowConfidence: true` answers as hints and check the cited context.",
                "Summaries are cached per document; repeated calls are cheap.",
            ],
            "flows": [
                {
                    "name": "Ask",
                    "steps": [
                        "upload-document({ text | path, filename? })",
                        "query-document({ doc_id, query })"
                    ]
                },
                {
                    "name": "Digest",
                    "steps": [
                        "list-documents({ filename? })",
                        "summarize-document({ doc_id })"
                    ]
                }
            ]
        });
        Ok(ReadResourceResult {
            contents: vec![json_resource_contents(
                USAGE_URI,
                serialize_json(&usage, USAGE_URI),
            )],
        })
    })
}

fn tool_upload(server: &SmartDocMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_upload(&documents, request.arguments).await })
}

fn tool_list_documents(
    server: &SmartDocMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_list_documents(&documents, request.arguments).await })
}

fn tool_get_document(
    server: &SmartDocMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_get_document(&documents, request.arguments).await })
}

fn tool_get_chunks(
    server: &SmartDocMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_get_chunks(&documents, request.arguments).await })
}

fn tool_summarize(
    server: &SmartDocMcpServer,
    request: CallToolRequestParam,
) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_summarize(&documents, request.arguments).await })
}

fn tool_query(server: &SmartDocMcpServer, request: CallToolRequestParam) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_query(&documents, request.arguments).await })
}

fn tool_metrics(
    server: &SmartDocMcpServer,
    _request: CallToolRequestParam,
) -> registry::ToolFuture {
    let documents = server.documents.clone();
    Box::pin(async move { handle_metrics(&documents).await })
}

impl ServerHandler for SmartDocMcpServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = rmcp::model::Implementation::from_build_env();
        implementation.name = "smartdoc".to_string();
        implementation.title = Some("SmartDoc MCP".to_string());
        implementation.version = env!("CARGO_PKG_VERSION").to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info: implementation,
            instructions: Some(
                "Use this server to register documents, answer questions from a single document with cited context, and produce cached whole-document summaries.".into(),
            ),
            ..ServerInfo::default()
        }
    }

    fn list_resources(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        let resources = self.registry.resource_descriptors();
        std::future::ready(Ok(ListResourcesResult::with_all_items(resources)))
    }

    fn list_tools(
        &self,
        _request: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        let tools = self.registry.tool_descriptors();
        std::future::ready(Ok(ListToolsResult::with_all_items(tools)))
    }

    #[allow(clippy::manual_async_fn)]
    fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.resource(request.uri.as_str()) {
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown resource URI: {}", request.uri),
                None,
            ))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            if let Some(handler) = self.registry.tool(request.name.as_ref()) {
                tracing::debug!(tool = %request.name, "Dispatching MCP tool");
                return handler(self, request).await;
            }

            Err(McpError::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            ))
        }
    }
}
