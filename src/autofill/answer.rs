use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use super::models::{FieldDescriptor, StructuredResponse};
use super::prompt::{batch_prompt, batch_query, parse_batch_response, single_field_prompt};
use crate::config::{AnswerMode, AutofillConfig};
use crate::error::AutofillError;
use crate::llm::SemanticSearch;
use crate::providers::traits::CompletionProvider;

/// Turns one batch of fields into answers.
///
/// Generation and parse failures are absorbed into the fallback answer. Only
/// retrieval failures, which mean the index is unusable, are returned.
#[async_trait]
pub trait AnswerStrategy: Send + Sync {
    async fn answer_batch(
        &self,
        retriever: &SemanticSearch,
        batch: &[FieldDescriptor],
    ) -> Result<Vec<StructuredResponse>, AutofillError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub max_output_tokens: u32,
    pub fallback_answer: String,
}

impl From<&AutofillConfig> for AnswerSettings {
    fn from(config: &AutofillConfig) -> Self {
        Self {
            top_k: config.top_k(),
            max_output_tokens: config.max_output_tokens,
            fallback_answer: config.fallback_answer.clone(),
        }
    }
}

pub fn create_strategy(
    mode: AnswerMode,
    provider: Arc<dyn CompletionProvider>,
    settings: AnswerSettings,
) -> Arc<dyn AnswerStrategy> {
    match mode {
        AnswerMode::Single => Arc::new(SingleFieldStrategy::new(provider, settings)),
        AnswerMode::Batched => Arc::new(BatchedStrategy::new(provider, settings)),
    }
}

/// One retrieval and one model call per field.
pub struct SingleFieldStrategy {
    provider: Arc<dyn CompletionProvider>,
    settings: AnswerSettings,
}

impl SingleFieldStrategy {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: AnswerSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl AnswerStrategy for SingleFieldStrategy {
    async fn answer_batch(
        &self,
        retriever: &SemanticSearch,
        batch: &[FieldDescriptor],
    ) -> Result<Vec<StructuredResponse>, AutofillError> {
        let mut responses = Vec::with_capacity(batch.len());

        for field in batch {
            let context = if field.label.trim().is_empty() {
                String::new()
            } else {
                let results = retriever.search(&field.label, self.settings.top_k).await?;
                SemanticSearch::format_context(&results)
            };
            let prompt = single_field_prompt(&context, field);

            let answer = match self.provider.complete(&prompt, self.settings.max_output_tokens).await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    let err = AutofillError::Generation(e.to_string());
                    warn!("Field {} falls back: {}", field.id, err);
                    self.settings.fallback_answer.clone()
                }
            };
            responses.push(StructuredResponse::new(field, answer));
        }

        Ok(responses)
    }

    fn name(&self) -> &'static str {
        "single"
    }
}

/// One shared retrieval and one model call for the whole batch.
pub struct BatchedStrategy {
    provider: Arc<dyn CompletionProvider>,
    settings: AnswerSettings,
}

impl BatchedStrategy {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: AnswerSettings) -> Self {
        Self { provider, settings }
    }

    fn fallback_all(&self, batch: &[FieldDescriptor]) -> Vec<StructuredResponse> {
        batch
            .iter()
            .map(|field| StructuredResponse::new(field, self.settings.fallback_answer.clone()))
            .collect()
    }
}

#[async_trait]
impl AnswerStrategy for BatchedStrategy {
    async fn answer_batch(
        &self,
        retriever: &SemanticSearch,
        batch: &[FieldDescriptor],
    ) -> Result<Vec<StructuredResponse>, AutofillError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let query = batch_query(batch);
        let context = if query.is_empty() {
            String::new()
        } else {
            let results = retriever.search(&query, self.settings.top_k).await?;
            SemanticSearch::format_context(&results)
        };

        let prompt = batch_prompt(&context, batch);
        let text = match self.provider.complete(&prompt, self.settings.max_output_tokens).await {
            Ok(text) => text,
            Err(e) => {
                let err = AutofillError::Generation(e.to_string());
                warn!("Batch of {} fields falls back: {}", batch.len(), err);
                return Ok(self.fallback_all(batch));
            }
        };

        let parsed = parse_batch_response(&text, batch);
        if let Some(err) = parsed.mismatch() {
            warn!("{}; unanswered fields fall back", err);
        }

        Ok(batch
            .iter()
            .zip(parsed.answers)
            .map(|(field, answer)| {
                StructuredResponse::new(
                    field,
                    answer.unwrap_or_else(|| self.settings.fallback_answer.clone()),
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "batched"
    }
}
