//! Index lifecycle: load the persisted index or build it once from the dataset.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::document::{DatasetRecord, DocumentChunk, MetadataMode};
use super::error::RagError;
use super::index::{IndexEntry, PersistedIndex};
use super::pipeline::QueryPipeline;
use crate::core::config::{AppConfig, IndexSettings};
use crate::llm::{Embedder, Generator, NvidiaClient};

pub struct IndexManager {
    settings: IndexSettings,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
}

impl IndexManager {
    pub fn new(
        settings: IndexSettings,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            settings,
            embedder,
            generator,
        }
    }

    /// Wires the NVIDIA-hosted models from configuration.
    ///
    /// Fails with [`RagError::Configuration`] when the credential is absent,
    /// before anything touches the index.
    pub fn from_config(config: &AppConfig) -> Result<Self, RagError> {
        let client = Arc::new(NvidiaClient::from_settings(&config.nvidia)?);
        Ok(Self::new(config.index.clone(), client.clone(), client))
    }

    /// Loads the persisted index when present, otherwise builds and persists
    /// it from the dataset, then returns a query pipeline bound to it.
    pub async fn load_or_create_index(&self) -> Result<QueryPipeline, RagError> {
        let persist_dir = &self.settings.persist_dir;

        let index = if PersistedIndex::exists(persist_dir) {
            info!(path = %persist_dir.display(), "Loading existing index from storage");
            let index = PersistedIndex::load(persist_dir).await?;
            let recorded = &index.info().embedding_model;
            if recorded != self.embedder.model_name() {
                warn!(
                    recorded = %recorded,
                    configured = %self.embedder.model_name(),
                    "index was built with a different embedding model; delete the storage directory to rebuild"
                );
            }
            index
        } else {
            info!(
                dataset = %self.settings.dataset_path.display(),
                model = %self.embedder.model_name(),
                "Creating new index"
            );
            let index = self.build_index().await?;
            index.persist(persist_dir).await?;
            index
        };

        info!(
            chunks = index.info().entry_count,
            dimensions = index.info().dimensions,
            "index ready"
        );

        Ok(QueryPipeline::new(
            Arc::new(index),
            self.embedder.clone(),
            self.generator.clone(),
        ))
    }

    async fn build_index(&self) -> Result<PersistedIndex, RagError> {
        let chunks = read_dataset(&self.settings.dataset_path).await?;
        if chunks.is_empty() {
            warn!(
                dataset = %self.settings.dataset_path.display(),
                "dataset has no records; building an empty index"
            );
        }

        let batch_size = self.settings.embed_batch_size.max(1);
        let mut entries = Vec::with_capacity(chunks.len());

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch
                .iter()
                .map(|chunk| chunk.content_for(MetadataMode::Embed))
                .collect();

            let embeddings = self.embedder.embed_passages(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::Upstream(format!(
                    "embedding batch {} returned {} vectors for {} chunks",
                    batch_no,
                    embeddings.len(),
                    batch.len()
                )));
            }

            entries.extend(
                batch
                    .iter()
                    .cloned()
                    .zip(embeddings)
                    .map(|(chunk, embedding)| IndexEntry::new(chunk, embedding)),
            );
        }

        PersistedIndex::from_entries(entries, self.embedder.model_name())
    }
}

/// Reads the JSON dataset: an array of `{full_chunk_text, metadata}` records.
pub async fn read_dataset(path: &Path) -> Result<Vec<DocumentChunk>, RagError> {
    if !path.is_file() {
        return Err(RagError::MissingDataset(path.to_path_buf()));
    }

    let invalid = |message: String| RagError::InvalidDataset {
        path: path.display().to_string(),
        message,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    let records: Vec<DatasetRecord> =
        serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;

    Ok(records.into_iter().map(DocumentChunk::from).collect())
}
