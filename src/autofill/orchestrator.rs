use std::sync::Arc;

use log::info;

use super::answer::AnswerStrategy;
use super::models::{FieldDescriptor, StructuredResponse};
use super::pacing::Pacer;
use crate::error::AutofillError;
use crate::llm::SemanticSearch;

/// Contiguous batches of at most `batch_size` fields, in input order.
pub fn partition(fields: &[FieldDescriptor], batch_size: usize) -> std::slice::Chunks<'_, FieldDescriptor> {
    fields.chunks(batch_size.max(1))
}

/// Runs batches one after another, pacing between them.
pub struct BatchOrchestrator {
    strategy: Arc<dyn AnswerStrategy>,
    pacer: Arc<dyn Pacer>,
    batch_size: usize,
}

impl BatchOrchestrator {
    pub fn new(strategy: Arc<dyn AnswerStrategy>, pacer: Arc<dyn Pacer>, batch_size: usize) -> Self {
        Self {
            strategy,
            pacer,
            batch_size: batch_size.max(1),
        }
    }

    /// One structured response per field, in input order.
    pub async fn run(
        &self,
        retriever: &SemanticSearch,
        fields: &[FieldDescriptor],
    ) -> Result<Vec<StructuredResponse>, AutofillError> {
        let total = (fields.len() + self.batch_size - 1) / self.batch_size;
        let mut responses = Vec::with_capacity(fields.len());

        for (i, batch) in partition(fields, self.batch_size).enumerate() {
            if i > 0 {
                self.pacer.wait().await;
            }
            info!(
                "Answering batch {}/{} ({} fields, {} strategy)",
                i + 1,
                total,
                batch.len(),
                self.strategy.name()
            );
            responses.extend(self.strategy.answer_batch(retriever, batch).await?);
        }

        Ok(responses)
    }
}
