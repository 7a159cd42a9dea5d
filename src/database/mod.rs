pub mod vector_index;

pub use vector_index::{cosine_similarity, ScoredChunk, VectorIndex, VectorIndexError};
