//! In-memory document registry.

use super::types::{Document, DocumentId, DocumentMetadata, ProcessingError};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{OnceCell, RwLock};

/// A registered document plus its lazily computed summary.
#[derive(Debug)]
pub struct StoredDocument {
    document: Document,
    summary: OnceCell<String>,
}

impl StoredDocument {
    fn new(document: Document) -> Self {
        Self {
            document,
            summary: OnceCell::new(),
        }
    }

    /// The immutable document record.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The cached summary, if one has been computed.
    pub fn cached_summary(&self) -> Option<&str> {
        self.summary.get().map(String::as_str)
    }

    /// Return the cached summary or compute it with `compute`.
    ///
    /// Concurrent callers wait on the same computation. A failed or abandoned computation
    /// leaves the cache empty. The flag is `true` when the value came from the cache.
    pub async fn summary_or_compute<F, Fut>(
        &self,
        compute: F,
    ) -> Result<(String, bool), ProcessingError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ProcessingError>>,
    {
        if let Some(summary) = self.summary.get() {
            return Ok((summary.clone(), true));
        }
        let mut computed = false;
        let summary = self
            .summary
            .get_or_try_init(|| {
                computed = true;
                compute()
            })
            .await?;
        Ok((summary.clone(), !computed))
    }

    /// Caller-facing metadata.
    pub fn metadata(&self) -> DocumentMetadata {
        let document = &self.document;
        DocumentMetadata {
            doc_id: document.id,
            filename: document.filename.clone(),
            text_length: document.char_length,
            num_chunks: document.chunks.len(),
            created_at: document.created_at.clone(),
            content_hash: document.content_hash.clone(),
            has_summary: self.summary.initialized(),
        }
    }
}

/// Registry mapping document identifiers to documents.
///
/// Identifiers are handed out monotonically starting at 1 and are never reused, including
/// those reserved by creations that later failed.
pub struct DocumentStore {
    next_id: AtomicU64,
    documents: RwLock<BTreeMap<DocumentId, Arc<StoredDocument>>>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Reserve the next identifier.
    pub fn allocate_id(&self) -> DocumentId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a fully indexed document.
    pub async fn insert(&self, document: Document) -> Arc<StoredDocument> {
        let id = document.id;
        let stored = Arc::new(StoredDocument::new(document));
        self.documents.write().await.insert(id, stored.clone());
        stored
    }

    /// Look up a document, failing with `DocumentNotFound` for unknown identifiers.
    pub async fn get(&self, id: DocumentId) -> Result<Arc<StoredDocument>, ProcessingError> {
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(ProcessingError::DocumentNotFound(id))
    }

    /// All documents in ascending identifier order.
    pub async fn list(&self) -> Vec<Arc<StoredDocument>> {
        self.documents.read().await.values().cloned().collect()
    }

    /// Documents whose filename contains `fragment`, case-insensitively.
    pub async fn find_by_filename(&self, fragment: &str) -> Vec<Arc<StoredDocument>> {
        let needle = fragment.trim().to_lowercase();
        self.documents
            .read()
            .await
            .values()
            .filter(|stored| stored.document.filename.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Number of registered documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether no document is registered.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}
