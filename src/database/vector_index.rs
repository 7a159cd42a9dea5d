use thiserror::Error;

use crate::document::Chunk;

#[derive(Error, Debug, PartialEq)]
pub enum VectorIndexError {
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Empty embedding for chunk {0}")]
    EmptyEmbedding(usize),
    #[error("Got {embeddings} embeddings for {chunks} chunks")]
    CountMismatch { chunks: usize, embeddings: usize },
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Exact nearest-neighbour index over chunk embeddings, ranked by cosine
/// similarity. Lives only in memory.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    dimensions: Option<usize>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from chunks and their embeddings, paired by position.
    pub fn from_embeddings(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, VectorIndexError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorIndexError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }

        let mut index = Self::new();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.insert(chunk, embedding)?;
        }
        Ok(index)
    }

    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<(), VectorIndexError> {
        if embedding.is_empty() {
            return Err(VectorIndexError::EmptyEmbedding(self.entries.len()));
        }
        match self.dimensions {
            Some(expected) if expected != embedding.len() => {
                return Err(VectorIndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            None => self.dimensions = Some(embedding.len()),
            _ => {}
        }

        self.entries.push(IndexedChunk { chunk, embedding });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` most similar chunks, best first. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, VectorIndexError> {
        if let Some(expected) = self.dimensions {
            if expected != query.len() {
                return Err(VectorIndexError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, entry)| ScoredChunk {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let score = dot / (norm_a * norm_b);
    // A NaN from a bad vector ranks as unrelated
    if score.is_nan() {
        0.0
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: PathBuf::from("info/test.pdf"),
            page: 1,
            chunk_index: 0,
        }
    }

    fn sample_index() -> VectorIndex {
        VectorIndex::from_embeddings(
            vec![chunk("north"), chunk("east"), chunk("north-east")],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1], 3).unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["north", "north-east", "east"]);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_never_exceeds_k_or_len() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 3);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
        assert!(VectorIndex::new().search(&[1.0], 4).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_mismatched_dimensions() {
        let mut index = sample_index();
        assert_eq!(
            index.insert(chunk("up"), vec![0.0, 0.0, 1.0]),
            Err(VectorIndexError::DimensionMismatch { expected: 2, actual: 3 })
        );
        assert!(index.search(&[1.0], 1).is_err());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_nan_embedding_ranks_last() {
        let mut index = sample_index();
        index.insert(chunk("broken"), vec![f32::NAN, 1.0]).unwrap();
        let results = index.search(&[1.0, 0.0], 4).unwrap();
        let texts: Vec<_> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts[0], "north");
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.score.is_nan()));
        assert_eq!(cosine_similarity(&[f32::NAN], &[1.0]), 0.0);
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let result = VectorIndex::from_embeddings(vec![chunk("a")], vec![]);
        assert!(matches!(result, Err(VectorIndexError::CountMismatch { .. })));
    }
}
