use async_trait::async_trait;
use anyhow::Result;

/// A text-completion backend: one formatted prompt in, one string out.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    fn get_model_info(&self) -> String;
}

/// Maps text to a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;

    fn get_model_info(&self) -> String;
}
