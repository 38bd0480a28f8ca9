use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::AppConfig;
use crate::rag::{IndexManager, RagService};

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub rag: RagService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds the state, initializing the index eagerly.
    ///
    /// Index failures are logged and leave the service degraded: the
    /// process keeps serving and `/chat` answers with a not-ready error.
    pub async fn initialize(config: AppConfig) -> Arc<Self> {
        let rag = match Self::init_rag(&config).await {
            Ok(rag) => rag,
            Err(err) => {
                tracing::error!(error = %err, "Failed to initialize index");
                RagService::not_ready()
            }
        };

        Self::with_rag(config, rag)
    }

    pub fn with_rag(config: AppConfig, rag: RagService) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            rag,
            started_at: Utc::now(),
        })
    }

    async fn init_rag(config: &AppConfig) -> Result<RagService, crate::rag::RagError> {
        let manager = IndexManager::from_config(config)?;
        let pipeline = manager.load_or_create_index().await?;
        Ok(RagService::ready(pipeline))
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_credential_degrades_instead_of_failing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.nvidia.api_key = None;
        config.index.persist_dir = dir.path().join("storage");
        config.index.dataset_path = dir.path().join("dataset.json");

        let state = AppState::initialize(config).await;
        assert!(!state.rag.is_ready());
        assert!(state.uptime_secs() >= 0);
    }
}
