pub mod embeddings;
pub mod semantic_search;

pub use embeddings::EmbeddingGenerator;
pub use semantic_search::{SearchResult, SemanticSearch};
