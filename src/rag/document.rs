//! Dataset records and the chunks built from them.
//!
//! A chunk carries all of its metadata for citation, but each consumer
//! sees a different slice of it: the embedding model skips link lists and
//! identifiers, the answering model additionally skips the `part` label.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CONDITION_NAME: &str = "condition_name";
pub const PART: &str = "part";
pub const SUBSECTION: &str = "subsection";
pub const RELATED_LINKS: &str = "related_links";
pub const CONDITION_ID: &str = "condition_id";
pub const SECTION: &str = "section";

/// Metadata keys left out of the embedding input.
pub const EMBED_EXCLUDED_KEYS: [&str; 3] = [RELATED_LINKS, CONDITION_ID, SECTION];

/// Metadata keys left out of the prompt context.
pub const LLM_EXCLUDED_KEYS: [&str; 4] = [RELATED_LINKS, CONDITION_ID, PART, SECTION];

/// One entry of the raw dataset file.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetRecord {
    pub full_chunk_text: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Which downstream consumer a chunk is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataMode {
    Embed,
    Llm,
}

impl MetadataMode {
    fn excluded_keys(self) -> &'static [&'static str] {
        match self {
            MetadataMode::Embed => &EMBED_EXCLUDED_KEYS,
            MetadataMode::Llm => &LLM_EXCLUDED_KEYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub full_text: String,
    pub metadata: Map<String, Value>,
}

impl From<DatasetRecord> for DocumentChunk {
    fn from(record: DatasetRecord) -> Self {
        Self {
            full_text: record.full_chunk_text,
            metadata: record.metadata,
        }
    }
}

impl DocumentChunk {
    /// Renders the chunk as `key: value` lines followed by a blank line and
    /// the chunk text, skipping the keys excluded for `mode`.
    pub fn content_for(&self, mode: MetadataMode) -> String {
        let excluded = mode.excluded_keys();
        let metadata_str = self
            .metadata
            .iter()
            .filter(|(key, _)| !excluded.contains(&key.as_str()))
            .map(|(key, value)| format!("{}: {}", key, render_value(value)))
            .collect::<Vec<_>>()
            .join("\n");

        if metadata_str.is_empty() {
            self.full_text.clone()
        } else {
            format!("{}\n\n{}", metadata_str, self.full_text)
        }
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// `related_links` as strings; empty when absent or not a list.
    pub fn related_links(&self) -> Vec<String> {
        self.metadata
            .get(RELATED_LINKS)
            .and_then(Value::as_array)
            .map(|links| {
                links
                    .iter()
                    .map(|link| match link {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
