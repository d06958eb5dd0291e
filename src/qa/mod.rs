//! Question answering capability: trait plus lexical and Ollama-backed adapters.

use crate::config::{Config, QaProvider};
use crate::embedding::tokenize;
use crate::processing::sanitize::split_sentences;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "did", "do", "does", "for", "from", "how",
    "in", "is", "it", "of", "on", "or", "that", "the", "this", "to", "was", "were", "what", "when",
    "where", "which", "who", "whom", "why", "with",
];

/// Errors surfaced by question answering providers.
#[derive(Debug, Error)]
pub enum QaClientError {
    /// Provider was unreachable.
    #[error("Question answering provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to answer question: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Answer span proposed by a provider for one context.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QaCandidate {
    /// Extracted answer text.
    pub answer: String,
    /// Provider certainty in `[0, 1]`.
    pub confidence: f32,
}

/// Interface implemented by question answering providers.
#[async_trait]
pub trait QuestionAnsweringClient: Send + Sync {
    /// Answer `question` using only `context`.
    async fn answer(&self, question: &str, context: &str) -> Result<QaCandidate, QaClientError>;
}

/// Extractive answerer returning the context sentence sharing the most question terms.
///
/// Confidence is the fraction of distinct question terms found in the chosen sentence.
#[derive(Default)]
pub struct LexicalQaClient;

impl LexicalQaClient {
    /// Create a lexical answerer.
    pub const fn new() -> Self {
        Self
    }
}

fn question_terms(question: &str) -> HashSet<String> {
    let all: HashSet<String> = tokenize(question).collect();
    let content: HashSet<String> = all
        .iter()
        .filter(|term| !STOPWORDS.contains(&term.as_str()))
        .cloned()
        .collect();
    if content.is_empty() { all } else { content }
}

#[async_trait]
impl QuestionAnsweringClient for LexicalQaClient {
    async fn answer(&self, question: &str, context: &str) -> Result<QaCandidate, QaClientError> {
        let terms = question_terms(question);
        let mut best: Option<(&str, usize)> = None;

        for sentence in split_sentences(context) {
            let sentence_terms: HashSet<String> = tokenize(sentence).collect();
            let hits = terms.intersection(&sentence_terms).count();
            // strictly greater keeps the earliest sentence on ties
            if best.is_none_or(|(_, best_hits)| hits > best_hits) {
                best = Some((sentence, hits));
            }
        }

        let Some((sentence, hits)) = best else {
            return Ok(QaCandidate {
                answer: String::new(),
                confidence: 0.0,
            });
        };

        let confidence = if terms.is_empty() {
            0.0
        } else {
            hits as f32 / terms.len() as f32
        };

        Ok(QaCandidate {
            answer: sentence.to_string(),
            confidence,
        })
    }
}

/// Question answering client backed by a local Ollama runtime (`/api/generate`, JSON mode).
pub struct OllamaQaClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaQaClient {
    /// Build a client for `model` served at `base_url`.
    pub fn new(base_url: String, model: String) -> Result<Self, QaClientError> {
        let http = Client::builder()
            .user_agent("smartdoc/qa")
            .build()
            .map_err(|error| QaClientError::ProviderUnavailable(error.to_string()))?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

fn build_qa_prompt(question: &str, context: &str) -> String {
    format!(
        "System: Answer the question using only the context. Quote the shortest span that answers it. \
Reply with a JSON object {{\"answer\": string, \"confidence\": number between 0 and 1}}. \
Use an empty answer and confidence 0 when the context does not contain the answer.\n\n\
Context:\n{context}\n\nQuestion: {question}"
    )
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl QuestionAnsweringClient for OllamaQaClient {
    async fn answer(&self, question: &str, context: &str) -> Result<QaCandidate, QaClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": build_qa_prompt(question, context),
            "stream": false,
            "format": "json",
            "options": {
                "temperature": 0.0,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                QaClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(QaClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            QaClientError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(QaClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        let candidate: QaCandidate = serde_json::from_str(body.response.trim()).map_err(|error| {
            QaClientError::InvalidResponse(format!("answer is not the expected JSON: {error}"))
        })?;

        Ok(QaCandidate {
            answer: candidate.answer.trim().to_string(),
            confidence: candidate.confidence,
        })
    }
}

/// Build the question answering client selected by the configuration.
pub fn build_qa_client(config: &Config) -> Result<Arc<dyn QuestionAnsweringClient>, QaClientError> {
    Ok(match config.qa_provider {
        QaProvider::Lexical => Arc::new(LexicalQaClient::new()),
        QaProvider::Ollama => Arc::new(OllamaQaClient::new(
            config.ollama_url.clone(),
            config.qa_model.clone(),
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn lexical_client_picks_sentence_with_most_terms() {
        let client = LexicalQaClient::new();
        let candidate = client
            .answer(
                "Who maintained the lighthouse?",
                "The harbor froze in winter. Agnes maintained the lighthouse for thirty years. Ships rarely came.",
            )
            .await
            .unwrap();

        assert_eq!(candidate.answer, "Agnes maintained the lighthouse for thirty years.");
        assert!((candidate.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn lexical_client_reports_zero_confidence_without_overlap() {
        let client = LexicalQaClient::new();
        let candidate = client
            .answer("Who won the derby?", "Bread rises with yeast. Ovens bake it.")
            .await
            .unwrap();

        assert_eq!(candidate.answer, "Bread rises with yeast.");
        assert_eq!(candidate.confidence, 0.0);
    }

    #[tokio::test]
    async fn lexical_client_handles_empty_context() {
        let candidate = LexicalQaClient::new().answer("Why?", "").await.unwrap();
        assert!(candidate.answer.is_empty());
        assert_eq!(candidate.confidence, 0.0);
    }

    #[tokio::test]
    async fn ollama_client_parses_json_answer() {
        let server = MockServer::start_async().await;
        let client = OllamaQaClient::new(server.base_url(), "llama".into()).expect("client");

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .json_body_partial(r#"{"format":"json"}"#);
                then.status(200).json_body(json!({
                    "response": "{\"answer\": \" Agnes \", \"confidence\": 0.82}",
                    "done": true
                }));
            })
            .await;

        let candidate = client
            .answer("Who maintained the lighthouse?", "Agnes did.")
            .await
            .expect("candidate");

        mock.assert();
        assert_eq!(candidate.answer, "Agnes");
        assert!((candidate.confidence - 0.82).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ollama_client_rejects_non_json_answer() {
        let server = MockServer::start_async().await;
        let client = OllamaQaClient::new(server.base_url(), "llama".into()).expect("client");

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(200).json_body(json!({
                    "response": "Agnes, probably.",
                    "done": true
                }));
            })
            .await;

        let error = client.answer("Who?", "Agnes did.").await.expect_err("error");
        assert!(matches!(error, QaClientError::InvalidResponse(_)));
    }
}
