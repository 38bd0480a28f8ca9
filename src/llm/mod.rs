pub mod nvidia;
pub mod provider;
pub mod types;

pub use nvidia::NvidiaClient;
pub use provider::{Embedder, Generator};
