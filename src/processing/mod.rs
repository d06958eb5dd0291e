//! Document pipeline: normalization, chunking, embedding, retrieval, answering, summarization.

pub mod answer;
pub mod chunking;
pub mod retriever;
pub mod sanitize;
mod service;
pub mod store;
pub mod summarize;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

pub use service::{Capabilities, DocumentApi, DocumentService};
pub use types::{
    Chunk, ChunkingError, ComposedAnswer, Document, DocumentId, DocumentMetadata, ErrorKind,
    ProcessingError, RetrievedChunk,
};
