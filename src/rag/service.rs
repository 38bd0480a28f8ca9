use std::sync::Arc;

use super::error::RagError;
use super::pipeline::{QueryPipeline, QueryResult};

/// Process-wide handle to the query pipeline.
///
/// Holds nothing when index initialization failed at startup; every query
/// then fails with [`RagError::NotReady`] while the rest of the service
/// keeps answering.
#[derive(Clone, Default)]
pub struct RagService {
    pipeline: Option<Arc<QueryPipeline>>,
}

impl RagService {
    pub fn ready(pipeline: QueryPipeline) -> Self {
        Self {
            pipeline: Some(Arc::new(pipeline)),
        }
    }

    pub fn not_ready() -> Self {
        Self { pipeline: None }
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn indexed_chunks(&self) -> usize {
        self.pipeline
            .as_ref()
            .map(|pipeline| pipeline.indexed_chunks())
            .unwrap_or(0)
    }

    pub async fn query(&self, question: &str) -> Result<QueryResult, RagError> {
        let pipeline = self.pipeline.as_ref().ok_or(RagError::NotReady)?;
        pipeline.query(question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uninitialized_service_reports_not_ready() {
        let service = RagService::not_ready();
        assert!(!service.is_ready());
        assert_eq!(service.indexed_chunks(), 0);

        let err = service.query("What is Condition 5?").await.unwrap_err();
        assert!(matches!(err, RagError::NotReady));
    }
}
