use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Maximum characters per chunk.
pub const CHUNK_SIZE: usize = 250;

/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 50;

/// Form fields answered per language-model call.
pub const BATCH_SIZE: usize = 4;

/// Chunks retrieved when answering one field at a time.
pub const SINGLE_FIELD_TOP_K: usize = 4;

/// Chunks retrieved for a whole batch; wider to cover several topics.
pub const BATCHED_TOP_K: usize = 8;

/// Pause before every batch after the first.
pub const BATCH_DELAY: Duration = Duration::from_secs(10);

pub const MAX_OUTPUT_TOKENS: u32 = 512;

/// Concurrent embedding calls while building the index.
pub const EMBEDDING_CONCURRENCY: usize = 8;

/// What the model is told to answer when the context has nothing.
pub const UNKNOWN_ANSWER: &str = "NA";

pub const DEFAULT_CORPUS_DIR: &str = "info";
pub const DEFAULT_PORT: u16 = 5055;

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: String,
    pub embedding_model: String,
    pub api_url: String,
    pub temperature: f32,
}

impl ProviderConfig {
    pub fn from_env(provider: &str) -> Self {
        let prefix = provider.to_uppercase();

        let model = env::var(format!("{}_MODEL", prefix))
            .unwrap_or_else(|_| match provider {
                "gemini" => "gemini-pro".to_string(),
                "openai" => "gpt-4-turbo-preview".to_string(),
                _ => String::new()
            });

        let embedding_model = env::var(format!("{}_EMBEDDING_MODEL", prefix))
            .unwrap_or_else(|_| match provider {
                "gemini" => "text-embedding-004".to_string(),
                "openai" => "text-embedding-3-small".to_string(),
                _ => String::new()
            });

        // Base URL; endpoints append their own path
        let api_url = env::var(format!("{}_API_URL", prefix))
            .unwrap_or_else(|_| match provider {
                "gemini" => "https://generativelanguage.googleapis.com/v1beta".to_string(),
                "openai" => "https://api.openai.com/v1".to_string(),
                _ => String::new()
            });

        // Form answers should be reproducible, so default to greedy decoding
        let temperature = env::var(format!("{}_TEMPERATURE", prefix))
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0.0);

        Self {
            model,
            embedding_model,
            api_url,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Gemini,
    OpenAI,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    Gemini,
    OpenAI,
    /// Offline hashing embedder, no API key required.
    Local,
}

/// How prompts are built for the language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMode {
    /// One question per call.
    Single,
    /// Every field of a batch in one call.
    #[default]
    Batched,
}

/// When the embedding index is (re)built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Rebuilt from the corpus for every request.
    #[default]
    PerRequest,
    /// Built on first use and kept until the process exits.
    Cached,
}

impl FromStr for LlmBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(anyhow!("Unknown LLM provider: {}", other)),
        }
    }
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "local" => Ok(Self::Local),
            other => Err(anyhow!("Unknown embedding provider: {}", other)),
        }
    }
}

impl FromStr for AnswerMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "batched" | "batch" => Ok(Self::Batched),
            other => Err(anyhow!("Unknown answer mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutofillConfig {
    pub llm_backend: LlmBackend,
    pub embedding_backend: EmbeddingBackend,
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub corpus_dir: PathBuf,
    pub answer_mode: AnswerMode,
    pub index_policy: IndexPolicy,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub max_output_tokens: u32,
    /// Answer recorded for a field when generation or parsing fails.
    pub fallback_answer: String,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            llm_backend: LlmBackend::Gemini,
            embedding_backend: EmbeddingBackend::Gemini,
            google_api_key: None,
            openai_api_key: None,
            corpus_dir: PathBuf::from(DEFAULT_CORPUS_DIR),
            answer_mode: AnswerMode::default(),
            index_policy: IndexPolicy::default(),
            batch_size: BATCH_SIZE,
            batch_delay: BATCH_DELAY,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            fallback_answer: String::new(),
        }
    }
}

impl AutofillConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(provider) = env::var("LLM_PROVIDER") {
            config.llm_backend = provider.parse()?;
        }
        if let Ok(provider) = env::var("EMBEDDING_PROVIDER") {
            config.embedding_backend = provider.parse()?;
        }
        config.google_api_key = env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty());
        config.openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(config)
    }

    pub fn google_api_key(&self) -> Result<&str> {
        self.google_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("GOOGLE_API_KEY environment variable not set"))
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENAI_API_KEY environment variable not set"))
    }

    /// Chunks fetched per retrieval for the configured answer mode.
    pub fn top_k(&self) -> usize {
        match self.answer_mode {
            AnswerMode::Single => SINGLE_FIELD_TOP_K,
            AnswerMode::Batched => BATCHED_TOP_K,
        }
    }
}
