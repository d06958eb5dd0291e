//! Model Context Protocol (MCP) integration for SmartDoc.
//!
//! This module wires the document pipeline into an MCP server so editors and agent hosts can
//! register documents, ask questions, and request summaries over stdio. The surface area
//! consists of:
//!
//! - Tools: `upload-document`, `list-documents`, `get-document`, `get-chunks`,
//!   `summarize-document`, `query-document`, and `metrics`.
//! - Resources: `mcp://settings`, `mcp://health`, and `mcp://usage`.
//!
//! Pipeline failures keep their error kind in the MCP error data (`{"kind": ...}`).

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::SmartDocMcpServer;
