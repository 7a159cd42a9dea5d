use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::config::EMBEDDING_CONCURRENCY;
use crate::error::AutofillError;
use crate::providers::traits::EmbeddingProvider;

#[derive(Clone)]
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    concurrency: usize,
}

impl EmbeddingGenerator {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            concurrency: EMBEDDING_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AutofillError> {
        self.provider
            .generate_embedding(text)
            .await
            .map_err(|e| AutofillError::Embedding(e.to_string()))
    }

    /// Embed every text, returning vectors in input order. The first failure
    /// aborts the whole batch.
    pub async fn generate_batch_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, AutofillError> {
        stream::iter(texts)
            .map(|text| self.generate_embedding(text))
            .buffered(self.concurrency)
            .boxed()
            .try_collect()
            .await
    }
}
