//! Formatting helpers shared across MCP handlers and resources.

use crate::{
    config::{Config, EmbeddingProvider, QaProvider, SummarizationProvider},
    processing::{ComposedAnswer, DocumentMetadata},
};
use rmcp::model::ResourceContents;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Build the health payload summarizing configured providers and registry size.
pub(crate) fn health_payload(config: &Config, documents: usize) -> String {
    let uses_ollama = config.embedding_provider == EmbeddingProvider::Ollama
        || config.summarization_provider == SummarizationProvider::Ollama
        || config.qa_provider == QaProvider::Ollama;

    let mut payload = json!({
        "status": "ok",
        "documents": documents,
        "embedding": {
            "provider": embedding_provider_label(config.embedding_provider),
            "model": config.embedding_model,
            "dimension": config.embedding_dimension,
        },
        "summarization": {
            "provider": summarization_provider_label(config.summarization_provider),
            "model": config.summarization_model,
        },
        "questionAnswering": {
            "provider": qa_provider_label(config.qa_provider),
            "model": config.qa_model,
        },
    });
    if uses_ollama {
        payload["ollamaUrl"] = Value::String(config.ollama_url.clone());
    }

    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

fn embedding_provider_label(provider: EmbeddingProvider) -> &'static str {
    match provider {
        EmbeddingProvider::Hashing => "hashing",
        EmbeddingProvider::Ollama => "ollama",
    }
}

fn summarization_provider_label(provider: SummarizationProvider) -> &'static str {
    match provider {
        SummarizationProvider::Extractive => "extractive",
        SummarizationProvider::Ollama => "ollama",
    }
}

fn qa_provider_label(provider: QaProvider) -> &'static str {
    match provider {
        QaProvider::Lexical => "lexical",
        QaProvider::Ollama => "ollama",
    }
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context_uri: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(uri = context_uri, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}

/// Top-level settings snapshot describing pipeline tunables.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SettingsSnapshot {
    /// Chunking parameters.
    pub(crate) chunking: ChunkingSettingsSnapshot,
    /// Retrieval and answering parameters.
    pub(crate) retrieval: RetrievalSettingsSnapshot,
    /// Map-reduce summarization bounds.
    pub(crate) summary: SummarySettingsSnapshot,
}

/// Chunking parameters in characters.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct ChunkingSettingsSnapshot {
    /// Maximum chunk length.
    pub(crate) max_chars: usize,
    /// Characters shared by consecutive chunks.
    pub(crate) overlap_chars: usize,
}

/// Retrieval and answering parameters.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct RetrievalSettingsSnapshot {
    /// Chunks retrieved per question.
    pub(crate) top_k: usize,
    /// Answers below this confidence are flagged.
    pub(crate) min_confidence: f32,
}

/// Summarization bounds.
#[derive(Debug, Serialize, JsonSchema)]
pub(crate) struct SummarySettingsSnapshot {
    /// Largest text summarized in one call.
    pub(crate) input_limit: usize,
    /// Piece size for reduce passes.
    pub(crate) chunk_chars: usize,
    /// Maximum reduce passes.
    pub(crate) max_depth: usize,
}

impl SettingsSnapshot {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            chunking: ChunkingSettingsSnapshot {
                max_chars: config.chunk_max_chars,
                overlap_chars: config.chunk_overlap_chars,
            },
            retrieval: RetrievalSettingsSnapshot {
                top_k: config.retrieval_top_k,
                min_confidence: config.answer_min_confidence,
            },
            summary: SummarySettingsSnapshot {
                input_limit: config.summary_input_limit,
                chunk_chars: config.summary_chunk_chars,
                max_depth: config.summary_max_depth,
            },
        }
    }
}

/// Camel-cased document description used in tool responses.
pub(crate) fn document_payload(metadata: &DocumentMetadata) -> Value {
    json!({
        "docId": metadata.doc_id,
        "filename": metadata.filename,
        "textLength": metadata.text_length,
        "numChunks": metadata.num_chunks,
        "createdAt": metadata.created_at,
        "contentHash": metadata.content_hash,
        "hasSummary": metadata.has_summary,
    })
}

/// Structured answer plus a prompt-ready context string citing chunk indices.
pub(crate) fn answer_payload(doc_id: u64, query: &str, answer: &ComposedAnswer) -> Value {
    let context: Vec<Value> = answer
        .supporting_chunks
        .iter()
        .map(|retrieved| {
            json!({
                "chunkIndex": retrieved.chunk.index,
                "rank": retrieved.rank,
                "score": retrieved.score,
                "text": retrieved.chunk.text,
            })
        })
        .collect();
    let cited = answer
        .supporting_chunks
        .iter()
        .map(|retrieved| format!("{} [{}]", retrieved.chunk.text.trim(), retrieved.chunk.index))
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "docId": doc_id,
        "query": query,
        "answer": answer.answer,
        "confidence": answer.confidence,
        "lowConfidence": answer.low_confidence,
        "sourceChunk": answer.source_chunk,
        "context": context,
        "contextText": cited,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{Chunk, RetrievedChunk};

    #[test]
    fn health_payload_reports_providers() {
        let config = Config {
            qa_provider: QaProvider::Ollama,
            ..Config::default()
        };
        let body = health_payload(&config, 3);

        let value: Value = serde_json::from_str(&body).expect("health payload must be valid JSON");
        assert_eq!(value["documents"], 3);
        assert_eq!(value["embedding"]["provider"], "hashing");
        assert_eq!(value["embedding"]["dimension"], 384);
        assert_eq!(value["questionAnswering"]["provider"], "ollama");
        assert_eq!(value["ollamaUrl"], config.ollama_url.as_str());
    }

    #[test]
    fn health_payload_omits_ollama_when_unused() {
        let body = health_payload(&Config::default(), 0);
        let value: Value = serde_json::from_str(&body).unwrap();
        assert!(value.get("ollamaUrl").is_none());
    }

    #[test]
    fn answer_payload_cites_chunks() {
        let chunk = |index: usize, rank: usize, text: &str| RetrievedChunk {
            chunk: Chunk {
                document_id: 1,
                index,
                span: 0..text.chars().count(),
                text: text.into(),
                embedding: Vec::new(),
            },
            score: 0.5,
            rank,
        };
        let answer = ComposedAnswer {
            answer: "forty two".into(),
            confidence: 0.8,
            low_confidence: false,
            source_chunk: 3,
            supporting_chunks: vec![
                chunk(3, 0, "The answer is forty two."),
                chunk(0, 1, "Intro."),
            ],
        };

        let payload = answer_payload(1, "what is it?", &answer);
        assert_eq!(payload["sourceChunk"], 3);
        assert_eq!(payload["context"].as_array().unwrap().len(), 2);
        assert_eq!(payload["context"][1]["rank"], 1);
        assert_eq!(
            payload["contextText"],
            "The answer is forty two. [3]\nIntro. [0]"
        );
    }
}
