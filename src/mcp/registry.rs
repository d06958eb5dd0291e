//! Ordered registry of MCP tools and resources with their dispatch functions.

use std::{future::Future, pin::Pin};

use rmcp::ErrorData as McpError;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ReadResourceRequestParam, ReadResourceResult,
    Resource, Tool,
};

use super::server::SmartDocMcpServer;

pub type ResourceFuture =
    Pin<Box<dyn Future<Output = Result<ReadResourceResult, McpError>> + Send>>;
pub type ToolFuture = Pin<Box<dyn Future<Output = Result<CallToolResult, McpError>> + Send>>;

pub type ResourceHandler = fn(&SmartDocMcpServer, ReadResourceRequestParam) -> ResourceFuture;
pub type ToolHandler = fn(&SmartDocMcpServer, CallToolRequestParam) -> ToolFuture;

/// Descriptors paired with handlers, listed in registration order.
#[derive(Default)]
pub struct Registry {
    resources: Vec<(Resource, ResourceHandler)>,
    tools: Vec<(Tool, ToolHandler)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_resource(&mut self, resource: Resource, handler: ResourceHandler) {
        self.resources.push((resource, handler));
    }

    pub fn register_tool(&mut self, tool: Tool, handler: ToolHandler) {
        self.tools.push((tool, handler));
    }

    pub fn resource(&self, uri: &str) -> Option<ResourceHandler> {
        self.resources
            .iter()
            .find(|(resource, _)| resource.raw.uri == uri)
            .map(|(_, handler)| *handler)
    }

    pub fn tool(&self, name: &str) -> Option<ToolHandler> {
        self.tools
            .iter()
            .find(|(tool, _)| tool.name == name)
            .map(|(_, handler)| *handler)
    }

    pub fn resource_descriptors(&self) -> Vec<Resource> {
        self.resources
            .iter()
            .map(|(resource, _)| resource.clone())
            .collect()
    }

    pub fn tool_descriptors(&self) -> Vec<Tool> {
        self.tools.iter().map(|(tool, _)| tool.clone()).collect()
    }
}
