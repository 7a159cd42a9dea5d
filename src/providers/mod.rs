pub mod gemini;
pub mod local;
pub mod openai;
pub mod traits;

use std::sync::Arc;
use anyhow::Result;

use crate::config::{AutofillConfig, EmbeddingBackend, LlmBackend, ProviderConfig};
use gemini::gemini::GeminiProvider;
use local::HashingEmbedder;
use openai::openai::OpenAIProvider;
use traits::{CompletionProvider, EmbeddingProvider};

/// Construct the configured language-model client.
pub fn create_completion_provider(config: &AutofillConfig) -> Result<Arc<dyn CompletionProvider>> {
    let provider: Arc<dyn CompletionProvider> = match config.llm_backend {
        LlmBackend::Gemini => Arc::new(GeminiProvider::new(
            config.google_api_key()?.to_string(),
            &ProviderConfig::from_env("gemini"),
        )),
        LlmBackend::OpenAI => Arc::new(OpenAIProvider::new(
            config.openai_api_key()?.to_string(),
            &ProviderConfig::from_env("openai"),
        )),
    };
    log::info!("Using completion model {}", provider.get_model_info());
    Ok(provider)
}

/// Construct the configured embedding client.
pub fn create_embedding_provider(config: &AutofillConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Gemini => Arc::new(GeminiProvider::new(
            config.google_api_key()?.to_string(),
            &ProviderConfig::from_env("gemini"),
        )),
        EmbeddingBackend::OpenAI => Arc::new(OpenAIProvider::new(
            config.openai_api_key()?.to_string(),
            &ProviderConfig::from_env("openai"),
        )),
        EmbeddingBackend::Local => Arc::new(HashingEmbedder::default()),
    };
    log::info!("Using embedding model {}", provider.get_model_info());
    Ok(provider)
}
