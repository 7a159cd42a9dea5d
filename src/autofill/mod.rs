//! Retrieval-augmented form filling.
//!
//! A [`FormFiller`] owns the corpus location, the embedding client and a
//! [`BatchOrchestrator`]. For each request it loads and chunks the corpus,
//! builds an embedding index, then answers the fields batch by batch.

pub mod answer;
pub mod models;
pub mod orchestrator;
pub mod pacing;
pub mod prompt;

use std::sync::Arc;

use log::info;
use tokio::sync::OnceCell;

use crate::config::{AutofillConfig, IndexPolicy};
use crate::document::{CorpusLoader, TextChunker};
use crate::error::AutofillError;
use crate::llm::{EmbeddingGenerator, SemanticSearch};
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};

pub use answer::{create_strategy, AnswerSettings, AnswerStrategy, BatchedStrategy, SingleFieldStrategy};
pub use models::{parse_form_fields, responses_to_map, FieldDescriptor, StructuredResponse};
pub use orchestrator::{partition, BatchOrchestrator};
pub use pacing::{FixedDelayPacer, NoDelay, Pacer};

pub struct FormFiller {
    loader: CorpusLoader,
    chunker: TextChunker,
    embeddings: EmbeddingGenerator,
    orchestrator: BatchOrchestrator,
    index_policy: IndexPolicy,
    cached_index: OnceCell<Arc<SemanticSearch>>,
}

impl FormFiller {
    pub fn new(
        loader: CorpusLoader,
        chunker: TextChunker,
        embeddings: EmbeddingGenerator,
        orchestrator: BatchOrchestrator,
        index_policy: IndexPolicy,
    ) -> Self {
        Self {
            loader,
            chunker,
            embeddings,
            orchestrator,
            index_policy,
            cached_index: OnceCell::new(),
        }
    }

    /// Wire a filler from configuration with the given model clients and pacer.
    pub fn from_config(
        config: &AutofillConfig,
        completion: Arc<dyn CompletionProvider>,
        embedding: Arc<dyn EmbeddingProvider>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        let strategy = create_strategy(config.answer_mode, completion, AnswerSettings::from(config));
        Self::new(
            CorpusLoader::new(&config.corpus_dir),
            TextChunker::default(),
            EmbeddingGenerator::new(embedding),
            BatchOrchestrator::new(strategy, pacer, config.batch_size),
            config.index_policy,
        )
    }

    /// Answer every field, in input order.
    ///
    /// An empty field list returns immediately without touching the corpus.
    pub async fn fill_form(
        &self,
        fields: &[FieldDescriptor],
    ) -> Result<Vec<StructuredResponse>, AutofillError> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let retriever = self.retriever().await?;
        self.orchestrator.run(&retriever, fields).await
    }

    async fn retriever(&self) -> Result<Arc<SemanticSearch>, AutofillError> {
        match self.index_policy {
            IndexPolicy::PerRequest => self.build_index().await.map(Arc::new),
            IndexPolicy::Cached => self
                .cached_index
                .get_or_try_init(|| async { self.build_index().await.map(Arc::new) })
                .await
                .cloned(),
        }
    }

    async fn build_index(&self) -> Result<SemanticSearch, AutofillError> {
        let documents = self.loader.load().await?;
        let chunks = self.chunker.split_documents(&documents);
        info!(
            "Split {} pages from {} into {} chunks",
            documents.len(),
            self.loader.dir().display(),
            chunks.len()
        );
        SemanticSearch::build(chunks, self.embeddings.clone()).await
    }
}
