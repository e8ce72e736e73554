//! Generation log.
//!
//! After each successful generation the pipeline records what was rendered:
//! a snapshot of the content, the billed character count and a timestamp.
//! One record exists per scope (chapter, or block within a chapter) and is
//! replaced on re-generation, so the log answers "what does the current
//! artifact contain", not "what happened historically".

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use xxhash_rust::xxh3::xxh3_128;

/// Errors that can occur during generation log operations.
#[derive(Error, Debug)]
pub enum LogError {
    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for generation log operations.
pub type Result<T> = std::result::Result<T, LogError>;

/// Record of the latest generation for one scope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRecord {
    pub project_id: String,
    pub studio_id: String,
    pub chapter_id: String,
    /// Set for block-scoped generations, absent for chapter scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    /// Snapshot of the content that was rendered.
    pub content: serde_json::Value,
    /// Characters billed for this generation.
    pub character_count: u64,
    /// When the generation was recorded, as a unix timestamp.
    pub recorded_at_unix: u64,
}

/// Current time as a unix timestamp in seconds.
///
/// A clock before the epoch reads as 0 rather than panicking; the record
/// timestamp is informational only.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn record_key(studio_id: &str, chapter_id: &str, block_id: Option<&str>) -> String {
    match block_id {
        Some(block_id) => format!("{studio_id}/{chapter_id}/{block_id}"),
        None => format!("{studio_id}/{chapter_id}"),
    }
}

/// Interface for generation record persistence.
#[async_trait]
pub trait GenerationLogStore: Send + Sync {
    /// Stores a record, replacing any previous record for the same scope.
    async fn upsert(&self, record: GenerationRecord) -> Result<()>;

    /// Retrieves the record for a scope.
    async fn get(
        &self,
        studio_id: &str,
        chapter_id: &str,
        block_id: Option<&str>,
    ) -> Result<Option<GenerationRecord>>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Memory-based generation log.
#[derive(Default)]
pub struct MemoryGenerationLog {
    records: RwLock<HashMap<String, GenerationRecord>>,
}

impl MemoryGenerationLog {
    /// Creates an empty memory log.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GenerationLogStore for MemoryGenerationLog {
    async fn upsert(&self, record: GenerationRecord) -> Result<()> {
        let key = record_key(
            &record.studio_id,
            &record.chapter_id,
            record.block_id.as_deref(),
        );
        self.records.write().insert(key, record);
        Ok(())
    }

    async fn get(
        &self,
        studio_id: &str,
        chapter_id: &str,
        block_id: Option<&str>,
    ) -> Result<Option<GenerationRecord>> {
        let key = record_key(studio_id, chapter_id, block_id);
        Ok(self.records.read().get(&key).cloned())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based generation log with one JSON file per scope.
pub struct FilesystemGenerationLog {
    base_path: PathBuf,
}

impl FilesystemGenerationLog {
    /// Creates a filesystem log rooted at `base_path`.
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn record_path(&self, key: &str) -> PathBuf {
        let hash = format!("{:032x}", xxh3_128(key.as_bytes()));
        self.base_path.join(format!("{hash}.json"))
    }
}

#[async_trait]
impl GenerationLogStore for FilesystemGenerationLog {
    async fn upsert(&self, record: GenerationRecord) -> Result<()> {
        let key = record_key(
            &record.studio_id,
            &record.chapter_id,
            record.block_id.as_deref(),
        );
        let path = self.record_path(&key);
        let data = serde_json::to_vec(&record)?;

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }

    async fn get(
        &self,
        studio_id: &str,
        chapter_id: &str,
        block_id: Option<&str>,
    ) -> Result<Option<GenerationRecord>> {
        let key = record_key(studio_id, chapter_id, block_id);
        match fs::read(self.record_path(&key)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
