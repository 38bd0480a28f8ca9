//! Question answering over a loaded index.
//!
//! [`QueryPipeline::query`] runs embed → search → prompt → generate and
//! pairs the answer with citations built from the retrieved chunks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::citations::{collect_citations, Citation};
use super::error::RagError;
use super::index::VectorIndex;
use super::prompt::{build_context, PromptTemplate};
use crate::llm::{Embedder, Generator};

/// Number of chunks retrieved per question.
pub const SIMILARITY_TOP_K: usize = 5;

/// Answer returned when retrieval finds nothing to answer from.
pub const EMPTY_RESPONSE: &str = "Empty Response";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Citation>,
}

pub struct QueryPipeline {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    template: PromptTemplate,
    top_k: usize,
}

impl QueryPipeline {
    /// Binds the pipeline to an index with the regulatory QA template and
    /// top-k of [`SIMILARITY_TOP_K`].
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            index,
            embedder,
            generator,
            template: PromptTemplate::default(),
            top_k: SIMILARITY_TOP_K,
        }
    }

    pub fn indexed_chunks(&self) -> usize {
        self.index.len()
    }

    pub async fn query(&self, question: &str) -> Result<QueryResult, RagError> {
        if question.trim().is_empty() {
            return Err(RagError::EmptyInput);
        }

        // 1. Embed the question
        let query_embedding = self.embedder.embed_query(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            upstream("query embedding failed", e)
        })?;

        // 2. Retrieve the closest chunks
        let nodes = self
            .index
            .similarity_search(&query_embedding, self.top_k)
            .await
            .map_err(|e| {
                error!(error = %e, "similarity search failed");
                upstream("retrieval failed", e)
            })?;

        for node in &nodes {
            debug!(
                score = node.score,
                condition = node.chunk.metadata_str("condition_name").unwrap_or_default(),
                "retrieved chunk"
            );
        }

        if nodes.is_empty() {
            info!("query retrieved no chunks");
            return Ok(QueryResult {
                answer: EMPTY_RESPONSE.to_string(),
                sources: Vec::new(),
            });
        }

        // 3. Generate from the retrieved context
        let prompt = self.template.render(&build_context(&nodes), question);
        let answer = self.generator.complete(&prompt).await.map_err(|e| {
            error!(error = %e, "generation failed");
            upstream("generation failed", e)
        })?;

        // 4. Cite
        let sources = collect_citations(&nodes);
        info!(
            retrieved = nodes.len(),
            sources = sources.len(),
            "query completed"
        );

        Ok(QueryResult {
            answer: answer.trim().to_string(),
            sources,
        })
    }
}

/// Collapses any collaborator failure into a single upstream failure.
fn upstream(stage: &str, err: RagError) -> RagError {
    match err {
        RagError::Upstream(message) => RagError::Upstream(message),
        other => RagError::Upstream(format!("{stage}: {other}")),
    }
}
