mod chunker;
mod loader;

use std::path::PathBuf;

pub use chunker::TextChunker;
pub use loader::CorpusLoader;

/// One page of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub source: PathBuf,
    /// 1-based page number within the source file.
    pub page: usize,
}

/// A bounded, non-empty slice of a document used as the unit of retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source: PathBuf,
    pub page: usize,
    /// Position of this chunk within its page.
    pub chunk_index: usize,
}
