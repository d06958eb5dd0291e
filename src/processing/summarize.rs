//! Map-reduce summarization for texts larger than the capability's input limit.

use super::chunking::chunk_text;
use super::types::ProcessingError;
use crate::summarization::SummarizationClient;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

/// Bounds for [`SummaryOrchestrator`].
#[derive(Debug, Clone, Copy)]
pub struct SummarySettings {
    /// Largest text, in characters, summarized in a single call.
    pub input_limit: usize,
    /// Piece size used when splitting oversized text.
    pub chunk_chars: usize,
    /// Maximum number of reduce passes.
    pub max_depth: usize,
    /// Concurrent partial summaries per pass.
    pub concurrency: usize,
}

/// Drives the summarization capability over arbitrarily long text.
pub struct SummaryOrchestrator {
    client: Arc<dyn SummarizationClient>,
    settings: SummarySettings,
}

impl SummaryOrchestrator {
    /// Wrap `client` with the given bounds.
    pub fn new(client: Arc<dyn SummarizationClient>, settings: SummarySettings) -> Self {
        Self { client, settings }
    }

    /// Summarize `text`, reducing it pass by pass until it fits the input limit.
    ///
    /// Each pass splits the current text into non-overlapping pieces, summarizes them, and joins
    /// the partial summaries with a single space in their original order. After `max_depth`
    /// passes the text must fit, otherwise `SummaryTooLarge` is returned.
    pub async fn summarize(&self, text: &str) -> Result<String, ProcessingError> {
        let SummarySettings {
            input_limit,
            chunk_chars,
            max_depth,
            concurrency,
        } = self.settings;

        let mut current = text.to_string();
        let mut depth = 0usize;

        loop {
            let chars = current.chars().count();
            if chars <= input_limit {
                tracing::debug!(depth, chars, "Summarizing in a single pass");
                let summary = self.client.summarize(&current).await?;
                return Ok(summary.trim().to_string());
            }
            if depth >= max_depth {
                tracing::warn!(depth, chars, input_limit, "Summary did not converge");
                return Err(ProcessingError::SummaryTooLarge { depth, chars });
            }

            let pieces = chunk_text(&current, chunk_chars, 0)?;
            let client = &self.client;
            let requests: Vec<_> = pieces
                .iter()
                .map(|piece| client.summarize(&piece.text))
                .collect();
            let partials: Vec<String> = stream::iter(requests)
                .buffered(concurrency.max(1))
                .try_collect()
                .await?;

            current = partials
                .iter()
                .map(|partial| partial.trim())
                .filter(|partial| !partial.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            depth += 1;
            tracing::debug!(
                depth,
                pieces = pieces.len(),
                reduced_chars = current.chars().count(),
                "Completed reduce pass"
            );
        }
    }
}
