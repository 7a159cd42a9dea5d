use log::info;
use serde::Serialize;

use crate::database::VectorIndex;
use crate::document::Chunk;
use crate::error::AutofillError;
use crate::llm::embeddings::EmbeddingGenerator;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f32,
    pub source: String,
    pub page: usize,
}

/// Retriever over an in-memory index of corpus chunks.
pub struct SemanticSearch {
    index: VectorIndex,
    embeddings: EmbeddingGenerator,
}

impl SemanticSearch {
    /// Embed every chunk and index it. Any embedding failure aborts the build.
    pub async fn build(
        chunks: Vec<Chunk>,
        embeddings: EmbeddingGenerator,
    ) -> Result<Self, AutofillError> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embeddings.generate_batch_embeddings(&texts).await?;
        let index = VectorIndex::from_embeddings(chunks, vectors)?;

        info!("Indexed {} chunks", index.len());
        Ok(Self { index, embeddings })
    }

    /// The `k` chunks most similar to `query`, best first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>, AutofillError> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embeddings.generate_embedding(query).await?;
        let results = self.index.search(&query_embedding, k)?;

        Ok(results
            .into_iter()
            .map(|scored| SearchResult {
                text: scored.chunk.text,
                score: scored.score,
                source: scored.chunk.source.display().to_string(),
                page: scored.chunk.page,
            })
            .collect())
    }

    /// Retrieved passages joined into a prompt context block.
    pub fn format_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
