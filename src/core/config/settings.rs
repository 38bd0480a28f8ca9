//! Typed view of the merged configuration.
//!
//! Every field has a default so that an absent `config.yml` still yields a
//! runnable service; only the NVIDIA credential has no usable default.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub nvidia: NvidiaSettings,
    pub index: IndexSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NvidiaSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub embedding_truncate: String,
    pub request_timeout_secs: u64,
}

impl Default for NvidiaSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://integrate.api.nvidia.com/v1".to_string(),
            chat_model: "microsoft/phi-4-mini-instruct".to_string(),
            embedding_model: "nvidia/nv-embedqa-e5-v5".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            embedding_truncate: "END".to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl NvidiaSettings {
    /// The credential, ignoring blank values.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub persist_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub embed_batch_size: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("storage"),
            dataset_path: PathBuf::from("lccp_rag_dataset.json"),
            embed_batch_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: PathBuf,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}
