use async_trait::async_trait;

use crate::rag::RagError;

/// Turns text into vectors for the index.
///
/// Questions and indexed passages are embedded separately because asymmetric
/// retrieval models encode them differently.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// embed a user question
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// embed document passages, one vector per input in input order
    async fn embed_passages(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// identifier recorded alongside a persisted index
    fn model_name(&self) -> &str;
}

/// Produces a completion for a fully rendered prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}
