//! Summarization capability: trait plus extractive and Ollama-backed adapters.
//!
//! The orchestrator in [`crate::processing::summarize`] decides how much text each call receives;
//! providers only ever see input that fits the configured single-pass limit. The Ollama-backed
//! client issues HTTP requests directly to the runtime, mirroring the embedding adapter.

use crate::config::{Config, SummarizationProvider};
use crate::processing::sanitize::{split_sentences, truncate_words};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while attempting summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Condense `text` into a shorter summary.
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError>;
}

/// Deterministic extractive summarizer keeping leading sentences within a word budget.
pub struct LeadSentenceSummarizer {
    max_words: usize,
}

impl LeadSentenceSummarizer {
    /// Create a summarizer emitting at most `max_words` words.
    pub const fn new(max_words: usize) -> Self {
        Self { max_words }
    }
}

#[async_trait]
impl SummarizationClient for LeadSentenceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError> {
        let mut selected: Vec<&str> = Vec::new();
        let mut used_words = 0usize;

        for sentence in split_sentences(text) {
            let words = sentence.split_whitespace().count();
            if words == 0 {
                continue;
            }
            if !selected.is_empty() && used_words + words > self.max_words {
                break;
            }
            selected.push(sentence);
            used_words += words;
        }

        let summary = selected.join(" ");
        Ok(truncate_words(&summary, self.max_words))
    }
}

/// Summarization client backed by a local Ollama runtime (`/api/generate`).
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
    max_words: usize,
}

impl OllamaSummarizationClient {
    /// Build a client for `model` served at `base_url`.
    pub fn new(
        base_url: String,
        model: String,
        max_words: usize,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("smartdoc/summary")
            .build()
            .map_err(|error| SummarizationClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model,
            max_words,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "System: You write concise, factual summaries. Avoid speculation. Return at most {} words as a single paragraph.\n\nSummarize the following text:\n{}",
            self.max_words, text
        )
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(&self, text: &str) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": self.prompt(text),
            "stream": false,
            "options": {
                // Lower temperature for deterministic summaries.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

/// Build the summarization client selected by the configuration.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    Ok(match config.summarization_provider {
        SummarizationProvider::Extractive => {
            Arc::new(LeadSentenceSummarizer::new(config.summarization_max_words))
        }
        SummarizationProvider::Ollama => Arc::new(OllamaSummarizationClient::new(
            config.ollama_url.clone(),
            config.summarization_model.clone(),
            config.summarization_max_words,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn lead_sentences_fit_word_budget() {
        let summarizer = LeadSentenceSummarizer::new(8);
        let summary = summarizer
            .summarize("Rust is fast. Rust is safe. Rust has a helpful compiler. It also has cargo.")
            .await
            .unwrap();
        assert_eq!(summary, "Rust is fast. Rust is safe.");
    }

    #[tokio::test]
    async fn lead_sentence_truncates_single_long_sentence() {
        let summarizer = LeadSentenceSummarizer::new(3);
        let summary = summarizer
            .summarize("one two three four five six")
            .await
            .unwrap();
        assert_eq!(summary, "one two three");
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client =
            OllamaSummarizationClient::new(server.base_url(), "llama".into(), 100).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": " Summary text ",
                    "done": true
                }));
            })
            .await;

        let summary = client.summarize("Long text").await.expect("summary");

        mock.assert();
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client =
            OllamaSummarizationClient::new(server.base_url(), "llama".into(), 100).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client.summarize("Long text").await.expect_err("error response");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(ref message) if message.contains("500"))
        );
    }
}
