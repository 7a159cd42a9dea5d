use std::path::PathBuf;
use thiserror::Error;

use crate::database::VectorIndexError;

#[derive(Error, Debug)]
pub enum AutofillError {
    #[error("Corpus unavailable at {path}: {source}")]
    CorpusUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Embedding error: {0}")]
    Embedding(String),
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("Response had {found} answers for {expected} questions")]
    ResponseParseMismatch { expected: usize, found: usize },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AutofillError {
    /// Errors that abort the whole request rather than a single field.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CorpusUnavailable { .. } | Self::Embedding(_) | Self::Index(_)
        )
    }
}
