#![deny(missing_docs)]

//! Core library for the SmartDoc document question answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Text extraction from uploaded files.
pub mod extract;
/// Per-document vector index.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server implementation.
pub mod mcp;
/// Pipeline metrics helpers.
pub mod metrics;
/// Document processing pipeline.
pub mod processing;
/// Question answering client abstraction and adapters.
pub mod qa;
/// Summarization client abstraction and adapters.
pub mod summarization;
