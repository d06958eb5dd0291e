use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors encountered while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// Values parsed individually but are inconsistent with each other.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime configuration for the SmartDoc server.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Backend used for abstractive summaries.
    pub summarization_provider: SummarizationProvider,
    /// Model identifier handed to the summarization provider.
    pub summarization_model: String,
    /// Word budget requested from the summarization provider per call.
    pub summarization_max_words: usize,
    /// Backend used to extract answers from retrieved context.
    pub qa_provider: QaProvider,
    /// Model identifier handed to the question answering provider.
    pub qa_model: String,
    /// Base URL of the Ollama runtime shared by the Ollama-backed providers.
    pub ollama_url: String,
    /// Maximum number of characters in a chunk.
    pub chunk_max_chars: usize,
    /// Characters of trailing context repeated at the start of the next chunk.
    pub chunk_overlap_chars: usize,
    /// Number of chunks retrieved per question.
    pub retrieval_top_k: usize,
    /// Answers scoring below this confidence are flagged as low confidence.
    pub answer_min_confidence: f32,
    /// Largest text (in characters) the summarizer accepts in a single pass.
    pub summary_input_limit: usize,
    /// Piece size used when splitting oversized text for map-reduce summarization.
    pub summary_chunk_chars: usize,
    /// Maximum number of reduce passes before giving up with `SummaryTooLarge`.
    pub summary_max_depth: usize,
    /// Upper bound on concurrent capability calls issued by a single request.
    pub capability_concurrency: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported embedding backends for the processing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic in-process hashing embeddings.
    Hashing,
    /// Local Ollama runtime.
    Ollama,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Deterministic lead-sentence extraction.
    Extractive,
    /// Local Ollama runtime.
    Ollama,
}

/// Supported question answering backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaProvider {
    /// Deterministic sentence selection by term overlap.
    Lexical,
    /// Local Ollama runtime.
    Ollama,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_provider: EmbeddingProvider::Hashing,
            embedding_model: "all-minilm".into(),
            embedding_dimension: 384,
            summarization_provider: SummarizationProvider::Extractive,
            summarization_model: "llama3.2".into(),
            summarization_max_words: 150,
            qa_provider: QaProvider::Lexical,
            qa_model: "llama3.2".into(),
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            chunk_max_chars: 500,
            chunk_overlap_chars: 50,
            retrieval_top_k: 5,
            answer_min_confidence: 0.1,
            summary_input_limit: 1000,
            summary_chunk_chars: 800,
            summary_max_depth: 3,
            capability_concurrency: 4,
            server_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    ///
    /// Every variable is optional; unset or blank values fall back to [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            embedding_provider: parse_env("EMBEDDING_PROVIDER")?
                .unwrap_or(defaults.embedding_provider),
            embedding_model: load_env_optional("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            embedding_dimension: parse_env("EMBEDDING_DIMENSION")?
                .unwrap_or(defaults.embedding_dimension),
            summarization_provider: parse_env("SUMMARIZATION_PROVIDER")?
                .unwrap_or(defaults.summarization_provider),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or(defaults.summarization_model),
            summarization_max_words: parse_env("SUMMARIZATION_MAX_WORDS")?
                .unwrap_or(defaults.summarization_max_words),
            qa_provider: parse_env("QA_PROVIDER")?.unwrap_or(defaults.qa_provider),
            qa_model: load_env_optional("QA_MODEL").unwrap_or(defaults.qa_model),
            ollama_url: load_env_optional("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            chunk_max_chars: parse_env("CHUNK_MAX_CHARS")?.unwrap_or(defaults.chunk_max_chars),
            chunk_overlap_chars: parse_env("CHUNK_OVERLAP_CHARS")?
                .unwrap_or(defaults.chunk_overlap_chars),
            retrieval_top_k: parse_env("RETRIEVAL_TOP_K")?.unwrap_or(defaults.retrieval_top_k),
            answer_min_confidence: parse_env("ANSWER_MIN_CONFIDENCE")?
                .unwrap_or(defaults.answer_min_confidence),
            summary_input_limit: parse_env("SUMMARY_INPUT_LIMIT")?
                .unwrap_or(defaults.summary_input_limit),
            summary_chunk_chars: parse_env("SUMMARY_CHUNK_CHARS")?
                .unwrap_or(defaults.summary_chunk_chars),
            summary_max_depth: parse_env("SUMMARY_MAX_DEPTH")?
                .unwrap_or(defaults.summary_max_depth),
            capability_concurrency: parse_env("CAPABILITY_CONCURRENCY")?
                .unwrap_or(defaults.capability_concurrency),
            server_port: parse_env("SERVER_PORT")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_max_chars == 0 {
            return Err(ConfigError::Invalid(
                "CHUNK_MAX_CHARS must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap_chars >= self.chunk_max_chars {
            return Err(ConfigError::Invalid(format!(
                "CHUNK_OVERLAP_CHARS ({}) must be smaller than CHUNK_MAX_CHARS ({})",
                self.chunk_overlap_chars, self.chunk_max_chars
            )));
        }
        if self.embedding_dimension == 0 {
            return Err(ConfigError::Invalid(
                "EMBEDDING_DIMENSION must be greater than zero".into(),
            ));
        }
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::Invalid(
                "RETRIEVAL_TOP_K must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.answer_min_confidence) {
            return Err(ConfigError::Invalid(
                "ANSWER_MIN_CONFIDENCE must lie within [0, 1]".into(),
            ));
        }
        if self.summary_chunk_chars == 0 || self.summary_chunk_chars > self.summary_input_limit {
            return Err(ConfigError::Invalid(format!(
                "SUMMARY_CHUNK_CHARS ({}) must be within 1..={} (SUMMARY_INPUT_LIMIT)",
                self.summary_chunk_chars, self.summary_input_limit
            )));
        }
        if self.capability_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "CAPABILITY_CONCURRENCY must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "extractive" | "none" => Ok(Self::Extractive),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl FromStr for QaProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lexical" => Ok(Self::Lexical),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start by the binaries.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        embedding_provider = ?config.embedding_provider,
        embedding_model = %config.embedding_model,
        summarization_provider = ?config.summarization_provider,
        qa_provider = ?config.qa_provider,
        chunk_max_chars = config.chunk_max_chars,
        chunk_overlap_chars = config.chunk_overlap_chars,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
