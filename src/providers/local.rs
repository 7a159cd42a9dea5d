use anyhow::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::providers::traits::EmbeddingProvider;

pub const DEFAULT_DIMENSIONS: usize = 256;

/// Offline bag-of-words embedder using the hashing trick.
///
/// Each lower-cased alphanumeric token is hashed into a bucket and the
/// resulting counts are L2-normalised, so identical texts embed to identical
/// vectors and texts sharing words score higher under cosine similarity. It
/// carries no semantics beyond word overlap.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    fn get_model_info(&self) -> String {
        format!("local-hashing-{}", self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::cosine_similarity;

    #[tokio::test]
    async fn test_embedding_is_deterministic_and_sized() {
        let embedder = HashingEmbedder::default();
        let a = embedder.generate_embedding("Full legal name").await.unwrap();
        let b = embedder.generate_embedding("full LEGAL name").await.unwrap();
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("phone number");
        let related = embedder.embed("Her phone number is 555 0199");
        let unrelated = embedder.embed("The office closes at noon");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert_eq!(embedder.embed("  ...  "), vec![0.0; 8]);
    }
}
