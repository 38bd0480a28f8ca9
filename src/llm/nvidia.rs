//! Client for NVIDIA-hosted models behind the OpenAI-compatible API.
//!
//! One client serves both capabilities: `/embeddings` for the retrieval
//! model and `/chat/completions` for the answering model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use super::provider::{Embedder, Generator};
use super::types::{
    ChatMessage, ChatRequest, ChatResponse, EmbeddingData, EmbeddingRequest, EmbeddingResponse,
    ErrorResponse, InputType,
};
use crate::core::config::NvidiaSettings;
use crate::rag::RagError;

#[derive(Clone)]
pub struct NvidiaClient {
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f64,
    max_tokens: u32,
    truncate: String,
    client: Client,
}

impl NvidiaClient {
    /// Builds a client from settings.
    ///
    /// Fails with [`RagError::Configuration`] when no credential is configured.
    pub fn from_settings(settings: &NvidiaSettings) -> Result<Self, RagError> {
        let api_key = settings.api_key().ok_or_else(|| {
            RagError::Configuration("NVIDIA_API_KEY environment variable is missing!".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            truncate: settings.embedding_truncate.clone(),
            client,
        })
    }

    async fn embed(
        &self,
        inputs: &[String],
        input_type: InputType,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        debug!(
            model = %self.embedding_model,
            batch_size = inputs.len(),
            ?input_type,
            "requesting embeddings"
        );

        let body = EmbeddingRequest {
            model: &self.embedding_model,
            input: inputs,
            input_type,
            truncate: &self.truncate,
            encoding_format: "float",
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                RagError::Upstream(format!("embedding request failed: {e}"))
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!(%status, "embedding API error");
            return Err(RagError::Upstream(format!(
                "embedding API returned {status}: {}",
                error_detail(status, &text)
            )));
        }

        let payload: EmbeddingResponse = res.json().await.map_err(|e| {
            RagError::Upstream(format!("failed to parse embedding response: {e}"))
        })?;

        order_embeddings(payload.data, inputs.len())
    }
}

#[async_trait]
impl Embedder for NvidiaClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let inputs = [text.to_string()];
        let mut vectors = self.embed(&inputs, InputType::Query).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Upstream("embedding API returned no vectors".to_string()))
    }

    async fn embed_passages(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.embed(texts, InputType::Passage).await
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}

#[async_trait]
impl Generator for NvidiaClient {
    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &self.chat_model,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "chat completion request failed");
                RagError::Upstream(format!("chat completion request failed: {e}"))
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            error!(%status, "chat completion API error");
            return Err(RagError::Upstream(format!(
                "chat completion API returned {status}: {}",
                error_detail(status, &text)
            )));
        }

        let payload: ChatResponse = res.json().await.map_err(|e| {
            RagError::Upstream(format!("failed to parse chat completion response: {e}"))
        })?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| RagError::Upstream("chat completion returned no choices".to_string()))
    }
}

/// Restores input order (the API may return `data` out of order) and checks
/// that every input got exactly one vector.
fn order_embeddings(
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    if data.len() != expected {
        return Err(RagError::Upstream(format!(
            "embedding API returned {} vectors for {} inputs",
            data.len(),
            expected
        )));
    }

    if data.iter().any(|item| item.index.is_some()) {
        data.sort_by_key(|item| item.index);
        let complete = data
            .iter()
            .enumerate()
            .all(|(position, item)| item.index == Some(position));
        if !complete {
            let indices: Vec<Option<usize>> = data.iter().map(|item| item.index).collect();
            return Err(RagError::Upstream(format!(
                "embedding API returned indices {indices:?}, expected each of 0..{expected} once"
            )));
        }
    }

    Ok(data.into_iter().map(|item| item.embedding).collect())
}

fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        return parsed.error.into_message();
    }
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string();
    }
    body.trim().to_string()
}
