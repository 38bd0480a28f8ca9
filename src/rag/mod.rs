//! Retrieval-augmented answering over the LCCP dataset.
//!
//! [`IndexManager`] loads or builds the persisted vector index once at
//! startup and hands back a [`QueryPipeline`]; [`RagService`] is the shared
//! handle the HTTP layer queries.

pub mod citations;
pub mod document;
pub mod error;
pub mod index;
pub mod manager;
pub mod pipeline;
pub mod prompt;
pub mod service;
pub mod similarity;

pub use citations::Citation;
pub use error::RagError;
pub use manager::IndexManager;
pub use pipeline::{QueryPipeline, QueryResult};
pub use service::RagService;
