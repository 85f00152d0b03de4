//! Text embeddings through the OpenAI embeddings endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::models::LlmProvider;

use super::PaperError;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const BATCH_SIZE: usize = 64;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PaperError>;

    fn model(&self) -> &str;
}

pub struct OpenAiEmbedder {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new() -> Result<Self, PaperError> {
        let http = reqwest::Client::builder()
            .user_agent("llm-toolbox/1.0")
            .timeout(std::time::Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: LlmProvider::OpenAI.default_base_url().to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn embed_batch(&self, api_key: &str, batch: &[String]) -> Result<Vec<Vec<f32>>, PaperError> {
        let response = self
            .http
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({ "model": self.model, "input": batch }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaperError::Embedding(format!("status {}: {}", status, body)));
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != batch.len() {
            return Err(PaperError::Embedding(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PaperError> {
        let var = LlmProvider::OpenAI.env_var();
        let api_key =
            std::env::var(var).map_err(|_| PaperError::Embedding(format!("{} is not set", var)))?;

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(&api_key, batch).await?);
        }
        tracing::debug!(inputs = texts.len(), model = %self.model, "Embedded texts");
        Ok(vectors)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_reordered_by_index() {
        let raw = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.25]);
    }

    #[test]
    fn test_base_url_trimmed() {
        let embedder = OpenAiEmbedder::new().unwrap().with_base_url("http://localhost:8080/v1/");
        assert_eq!(embedder.base_url, "http://localhost:8080/v1");
        assert_eq!(embedder.model(), DEFAULT_EMBEDDING_MODEL);
    }
}
