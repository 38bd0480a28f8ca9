//! Vector index: the search seam and its SQLite-persisted implementation.
//!
//! The persisted form is a single `index.db` file. Loading pulls every
//! entry into memory once; the loaded index is immutable and searched by
//! brute-force cosine ranking, so concurrent readers need no locking.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::document::DocumentChunk;
use super::error::RagError;
use super::similarity::top_k_by_cosine;

pub const INDEX_FILE_NAME: &str = "index.db";
const PARTIAL_SUFFIX: &str = "partial";

/// A chunk returned by a similarity search with its relevance score.
#[derive(Debug, Clone)]
pub struct RetrievedNode {
    pub chunk: DocumentChunk,
    /// Cosine similarity (higher = more relevant).
    pub score: f32,
}

/// Read-only similarity search over an index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns at most `top_k` chunks ordered by descending relevance.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedNode>, RagError>;

    /// Number of indexed chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An embedded chunk as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk: DocumentChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chunk,
            embedding,
        }
    }
}

/// Build-time facts recorded next to the entries.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub embedding_model: String,
    pub dimensions: usize,
    pub entry_count: usize,
    pub created_at: String,
}

#[derive(Debug)]
pub struct PersistedIndex {
    entries: Vec<IndexEntry>,
    info: IndexInfo,
}

impl PersistedIndex {
    /// Location of the index file inside `persist_dir`.
    pub fn location(persist_dir: &Path) -> PathBuf {
        persist_dir.join(INDEX_FILE_NAME)
    }

    pub fn exists(persist_dir: &Path) -> bool {
        Self::location(persist_dir).is_file()
    }

    /// Assembles an index from already embedded entries.
    ///
    /// All embeddings must share one non-zero dimensionality.
    pub fn from_entries(
        entries: Vec<IndexEntry>,
        embedding_model: &str,
    ) -> Result<Self, RagError> {
        let dimensions = entries.first().map(|e| e.embedding.len()).unwrap_or(0);
        if let Some(bad) = entries
            .iter()
            .position(|e| e.embedding.is_empty() || e.embedding.len() != dimensions)
        {
            return Err(RagError::Upstream(format!(
                "embedding for chunk {} has {} dimensions, expected {}",
                bad,
                entries[bad].embedding.len(),
                dimensions
            )));
        }

        let info = IndexInfo {
            embedding_model: embedding_model.to_string(),
            dimensions,
            entry_count: entries.len(),
            created_at: Utc::now().to_rfc3339(),
        };
        Ok(Self { entries, info })
    }

    pub fn info(&self) -> &IndexInfo {
        &self.info
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Writes the index to `persist_dir`.
    ///
    /// The database is written under a temporary name and renamed into
    /// place once complete, so an interrupted build leaves no `index.db`.
    pub async fn persist(&self, persist_dir: &Path) -> Result<(), RagError> {
        tokio::fs::create_dir_all(persist_dir)
            .await
            .map_err(RagError::storage)?;

        let final_path = Self::location(persist_dir);
        let partial_path = final_path.with_extension(format!("db.{PARTIAL_SUFFIX}"));
        if partial_path.exists() {
            tokio::fs::remove_file(&partial_path)
                .await
                .map_err(RagError::storage)?;
        }

        let pool = open_pool(&partial_path, true).await?;
        let written = self.write_all(&pool).await;
        pool.close().await;
        written?;

        tokio::fs::rename(&partial_path, &final_path)
            .await
            .map_err(RagError::storage)?;

        info!(
            path = %final_path.display(),
            entries = self.entries.len(),
            "index persisted"
        );
        Ok(())
    }

    async fn write_all(&self, pool: &SqlitePool) -> Result<(), RagError> {
        init_schema(pool).await?;

        let mut tx = pool.begin().await.map_err(RagError::storage)?;

        for (position, entry) in self.entries.iter().enumerate() {
            let metadata_str =
                serde_json::to_string(&entry.chunk.metadata).map_err(RagError::storage)?;

            sqlx::query(
                "INSERT INTO entries (id, position, text, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&entry.id)
            .bind(position as i64)
            .bind(&entry.chunk.full_text)
            .bind(&metadata_str)
            .bind(serialize_embedding(&entry.embedding))
            .execute(&mut *tx)
            .await
            .map_err(RagError::storage)?;
        }

        let meta = [
            ("embedding_model", self.info.embedding_model.clone()),
            ("dimensions", self.info.dimensions.to_string()),
            ("entry_count", self.info.entry_count.to_string()),
            ("created_at", self.info.created_at.clone()),
        ];
        for (key, value) in meta {
            sqlx::query("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(RagError::storage)?;
        }

        tx.commit().await.map_err(RagError::storage)?;
        Ok(())
    }

    /// Reads a previously persisted index back into memory.
    pub async fn load(persist_dir: &Path) -> Result<Self, RagError> {
        let path = Self::location(persist_dir);
        if !path.is_file() {
            return Err(RagError::Storage(format!(
                "no index found at {}",
                path.display()
            )));
        }

        let pool = open_pool(&path, false).await?;
        let loaded = read_all(&pool).await;
        pool.close().await;
        let (entries, info) = loaded?;

        if entries.len() != info.entry_count {
            return Err(RagError::Storage(format!(
                "index at {} holds {} entries but recorded {}",
                path.display(),
                entries.len(),
                info.entry_count
            )));
        }

        debug!(path = %path.display(), entries = entries.len(), "index loaded");
        Ok(Self { entries, info })
    }
}

#[async_trait]
impl VectorIndex for PersistedIndex {
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedNode>, RagError> {
        if !self.entries.is_empty() && query_embedding.len() != self.info.dimensions {
            return Err(RagError::Upstream(format!(
                "query embedding has {} dimensions but the index was built with {}",
                query_embedding.len(),
                self.info.dimensions
            )));
        }

        let ranked = top_k_by_cosine(
            query_embedding,
            self.entries.iter().map(|e| e.embedding.as_slice()),
            top_k,
        );

        Ok(ranked
            .into_iter()
            .map(|(idx, score)| RetrievedNode {
                chunk: self.entries[idx].chunk.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

async fn open_pool(path: &Path, create: bool) -> Result<SqlitePool, RagError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .read_only(!create);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(RagError::storage)
}

async fn init_schema(pool: &SqlitePool) -> Result<(), RagError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            metadata TEXT NOT NULL DEFAULT '{}',
            embedding BLOB NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(RagError::storage)?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(RagError::storage)?;

    Ok(())
}

async fn read_all(pool: &SqlitePool) -> Result<(Vec<IndexEntry>, IndexInfo), RagError> {
    let rows = sqlx::query(
        "SELECT id, text, metadata, embedding FROM entries ORDER BY position ASC",
    )
    .fetch_all(pool)
    .await
    .map_err(RagError::storage)?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in &rows {
        let metadata_str: String = row.try_get("metadata").map_err(RagError::storage)?;
        let metadata = match serde_json::from_str::<Value>(&metadata_str) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let embedding_bytes: Vec<u8> = row.try_get("embedding").map_err(RagError::storage)?;

        entries.push(IndexEntry {
            id: row.try_get("id").map_err(RagError::storage)?,
            chunk: DocumentChunk {
                full_text: row.try_get("text").map_err(RagError::storage)?,
                metadata,
            },
            embedding: deserialize_embedding(&embedding_bytes),
        });
    }

    let meta_rows = sqlx::query("SELECT key, value FROM meta")
        .fetch_all(pool)
        .await
        .map_err(RagError::storage)?;

    let mut meta = Map::new();
    for row in &meta_rows {
        let key: String = row.try_get("key").map_err(RagError::storage)?;
        let value: String = row.try_get("value").map_err(RagError::storage)?;
        meta.insert(key, Value::String(value));
    }

    let text = |key: &str| -> Result<String, RagError> {
        meta.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RagError::Storage(format!("index metadata is missing '{key}'")))
    };
    let number = |key: &str| -> Result<usize, RagError> {
        text(key)?
            .parse::<usize>()
            .map_err(|e| RagError::Storage(format!("index metadata '{key}' is invalid: {e}")))
    };

    let info = IndexInfo {
        embedding_model: text("embedding_model")?,
        dimensions: number("dimensions")?,
        entry_count: number("entry_count")?,
        created_at: text("created_at")?,
    };

    Ok((entries, info))
}

fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
