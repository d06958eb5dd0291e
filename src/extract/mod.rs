//! Text extraction from uploaded bytes.
//!
//! Supports UTF-8 plain text and PDF. PDF parsing is CPU bound and runs on the blocking pool.

use async_trait::async_trait;
use thiserror::Error;

const TEXT_EXTENSIONS: [&str; 5] = ["txt", "text", "md", "markdown", "log"];

/// Errors raised while turning uploaded bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The declared type or filename extension is not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    /// The payload could not be decoded.
    #[error("{0}")]
    Failed(String),
}

/// Formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// UTF-8 encoded text.
    PlainText,
    /// Portable Document Format.
    Pdf,
}

impl SourceFormat {
    /// Resolve the format from the declared content type, falling back to the filename extension.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self, ExtractionError> {
        let mime = content_type
            .map(|value| {
                value
                    .split(';')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .to_ascii_lowercase()
            })
            .unwrap_or_default();

        if mime == "application/pdf" {
            return Ok(Self::Pdf);
        }
        if mime.starts_with("text/") {
            return Ok(Self::PlainText);
        }

        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            Ok(Self::Pdf)
        } else if TEXT_EXTENSIONS.contains(&extension.as_str()) {
            Ok(Self::PlainText)
        } else {
            let declared = if mime.is_empty() {
                format!("'{filename}'")
            } else {
                format!("'{filename}' ({mime})")
            };
            Err(ExtractionError::UnsupportedFormat(declared))
        }
    }
}

/// Interface implemented by text extractors.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from `bytes` interpreted as `format`.
    async fn extract(&self, bytes: Vec<u8>, format: SourceFormat)
    -> Result<String, ExtractionError>;
}

/// Default extractor handling plain text and PDF.
#[derive(Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Create a new extractor.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(
        &self,
        bytes: Vec<u8>,
        format: SourceFormat,
    ) -> Result<String, ExtractionError> {
        match format {
            SourceFormat::PlainText => String::from_utf8(bytes).map_err(|error| {
                ExtractionError::Failed(format!("Text file reading error: {error}"))
            }),
            SourceFormat::Pdf => {
                let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
                    .await
                    .map_err(|error| ExtractionError::Failed(format!("Task join error: {error}")))?
                    .map_err(|error| {
                        ExtractionError::Failed(format!("PDF processing error: {error}"))
                    })?;
                tracing::debug!(chars = text.chars().count(), "Extracted PDF text");
                Ok(text)
            }
        }
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|error| error.to_string())
}
