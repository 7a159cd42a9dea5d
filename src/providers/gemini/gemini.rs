use async_trait::async_trait;
use anyhow::{Result, anyhow};
use crate::config::ProviderConfig;
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    model: String,
    embedding_model: String,
    api_url: String,
    temperature: f32,
}

impl GeminiProvider {
    pub fn new(api_key: String, config: &ProviderConfig) -> Self {
        Self {
            api_key,
            client: Client::new(),
            model: config.model.clone(),
            embedding_model: config.embedding_model.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        }
    }

    async fn post(&self, model: &str, method: &str, body: Value) -> Result<Value> {
        let url = format!("{}/models/{}:{}", self.api_url, model, method);
        let response = self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("API request failed: Status {}, Body: {}", status, error_text));
        }

        let response_json: Value = response.json().await?;
        if let Some(error) = response_json.get("error") {
            return Err(anyhow!("API returned error: {}", error));
        }
        Ok(response_json)
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let response_json = self.post(&self.model, "generateContent", json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": max_tokens
            }
        })).await?;

        // Concatenate every text part of the first candidate
        let parts = response_json["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| anyhow!("Invalid response format: {}", response_json))?;

        Ok(parts
            .iter()
            .filter_map(|part| part["text"].as_str())
            .collect::<Vec<_>>()
            .join(""))
    }

    fn get_model_info(&self) -> String {
        self.model.clone()
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiProvider {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let response_json = self.post(&self.embedding_model, "embedContent", json!({
            "model": format!("models/{}", self.embedding_model),
            "content": {
                "parts": [{ "text": text }]
            }
        })).await?;

        parse_embedding(&response_json)
    }

    fn get_model_info(&self) -> String {
        self.embedding_model.clone()
    }
}

fn parse_embedding(response_json: &Value) -> Result<Vec<f32>> {
    let values = response_json["embedding"]["values"]
        .as_array()
        .ok_or_else(|| anyhow!("No embedding returned from Gemini"))?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow!("Non-numeric embedding value: {}", v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embedding() {
        let body = json!({ "embedding": { "values": [0.5, -1.0, 2] } });
        assert_eq!(parse_embedding(&body).unwrap(), vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn test_parse_embedding_rejects_bad_shape() {
        assert!(parse_embedding(&json!({ "embedding": {} })).is_err());
        assert!(parse_embedding(&json!({ "embedding": { "values": ["x"] } })).is_err());
    }

    #[test]
    fn test_new_uses_config() {
        let config = ProviderConfig {
            model: "gemini-pro".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            api_url: "http://localhost:9999/v1beta/".to_string(),
            temperature: 0.0,
        };
        let provider = GeminiProvider::new("key".to_string(), &config);
        assert_eq!(CompletionProvider::get_model_info(&provider), "gemini-pro");
        assert_eq!(EmbeddingProvider::get_model_info(&provider), "text-embedding-004");
        assert_eq!(provider.api_url, "http://localhost:9999/v1beta");
    }
}
