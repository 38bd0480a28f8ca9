//! Error types for index lifecycle and query execution.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// A required setting (the model credential) is absent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No persisted index and no dataset to build one from.
    #[error("{} not found. Please ensure the JSON dataset is present.", .0.display())]
    MissingDataset(PathBuf),

    /// The dataset exists but cannot be read or parsed.
    #[error("Invalid dataset {path}: {message}")]
    InvalidDataset {
        /// Dataset file location.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// The persisted index could not be written or read back.
    #[error("Index storage error: {0}")]
    Storage(String),

    #[error("Index not loaded. The query pipeline has not been initialized.")]
    NotReady,

    #[error("Question cannot be empty")]
    EmptyInput,

    /// Embedding, retrieval or generation failed.
    #[error("{0}")]
    Upstream(String),
}

impl RagError {
    pub fn storage<E: std::fmt::Display>(err: E) -> Self {
        RagError::Storage(err.to_string())
    }
}
