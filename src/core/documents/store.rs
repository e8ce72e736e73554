//! Document store for studios and chapters.
//!
//! Studios and chapter lists are persisted as whole JSON documents: reads
//! return the full document and writes replace it. Two backends are
//! provided, an in-memory store for tests and single-process deployments,
//! and a filesystem store with atomic writes.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use xxhash_rust::xxh3::xxh3_128;

use super::model::{Chapter, Studio};

/// Errors that can occur during document store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for document store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Interface for studio and chapter persistence.
///
/// Chapter order within a studio is document order and must survive
/// round-trips through the store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Retrieves a studio by id.
    async fn studio(&self, studio_id: &str) -> Result<Option<Studio>>;

    /// Stores a studio, replacing any existing document with the same id.
    async fn put_studio(&self, studio: &Studio) -> Result<()>;

    /// Retrieves a single chapter of a studio.
    async fn chapter(&self, studio_id: &str, chapter_id: &str) -> Result<Option<Chapter>>;

    /// Stores a chapter. An existing chapter with the same id is replaced
    /// in place; a new chapter is appended at the end.
    async fn put_chapter(&self, studio_id: &str, chapter: &Chapter) -> Result<()>;

    /// Retrieves all chapters of a studio in document order.
    async fn chapters(&self, studio_id: &str) -> Result<Vec<Chapter>>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

/// Memory-based document store.
#[derive(Default)]
pub struct MemoryDocumentStore {
    studios: RwLock<HashMap<String, Studio>>,
    chapters: RwLock<HashMap<String, Vec<Chapter>>>,
}

impl MemoryDocumentStore {
    /// Creates an empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn studio(&self, studio_id: &str) -> Result<Option<Studio>> {
        Ok(self.studios.read().get(studio_id).cloned())
    }

    async fn put_studio(&self, studio: &Studio) -> Result<()> {
        self.studios
            .write()
            .insert(studio.id.clone(), studio.clone());
        Ok(())
    }

    async fn chapter(&self, studio_id: &str, chapter_id: &str) -> Result<Option<Chapter>> {
        Ok(self
            .chapters
            .read()
            .get(studio_id)
            .and_then(|list| list.iter().find(|c| c.id == chapter_id).cloned()))
    }

    async fn put_chapter(&self, studio_id: &str, chapter: &Chapter) -> Result<()> {
        let mut chapters = self.chapters.write();
        let list = chapters.entry(studio_id.to_string()).or_default();
        match list.iter_mut().find(|c| c.id == chapter.id) {
            Some(existing) => *existing = chapter.clone(),
            None => list.push(chapter.clone()),
        }
        Ok(())
    }

    async fn chapters(&self, studio_id: &str) -> Result<Vec<Chapter>> {
        Ok(self
            .chapters
            .read()
            .get(studio_id)
            .cloned()
            .unwrap_or_default())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based document store.
///
/// Each studio maps to two JSON files under the base path, one for the
/// studio document and one for its chapter list. File names are derived
/// from the studio id with xxh3, so ids never reach the filesystem raw.
pub struct FilesystemDocumentStore {
    base_path: PathBuf,
}

impl FilesystemDocumentStore {
    /// Creates a filesystem store rooted at `base_path`.
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_path.join("studios")).await?;
        fs::create_dir_all(base_path.join("chapters")).await?;
        Ok(Self { base_path })
    }

    fn studio_path(&self, studio_id: &str) -> PathBuf {
        let hash = format!("{:032x}", xxh3_128(studio_id.as_bytes()));
        self.base_path.join("studios").join(format!("{hash}.json"))
    }

    fn chapters_path(&self, studio_id: &str) -> PathBuf {
        let hash = format!("{:032x}", xxh3_128(studio_id.as_bytes()));
        self.base_path.join("chapters").join(format!("{hash}.json"))
    }

    async fn read_chapters(&self, studio_id: &str) -> Result<Vec<Chapter>> {
        match fs::read(self.chapters_path(studio_id)).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_json(&self, path: PathBuf, data: Vec<u8>) -> Result<()> {
        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FilesystemDocumentStore {
    async fn studio(&self, studio_id: &str) -> Result<Option<Studio>> {
        match fs::read(self.studio_path(studio_id)).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_studio(&self, studio: &Studio) -> Result<()> {
        let data = serde_json::to_vec(studio)?;
        self.write_json(self.studio_path(&studio.id), data).await
    }

    async fn chapter(&self, studio_id: &str, chapter_id: &str) -> Result<Option<Chapter>> {
        let chapters = self.read_chapters(studio_id).await?;
        Ok(chapters.into_iter().find(|c| c.id == chapter_id))
    }

    async fn put_chapter(&self, studio_id: &str, chapter: &Chapter) -> Result<()> {
        let mut chapters = self.read_chapters(studio_id).await?;
        match chapters.iter_mut().find(|c| c.id == chapter.id) {
            Some(existing) => *existing = chapter.clone(),
            None => chapters.push(chapter.clone()),
        }
        let data = serde_json::to_vec(&chapters)?;
        self.write_json(self.chapters_path(studio_id), data).await
    }

    async fn chapters(&self, studio_id: &str) -> Result<Vec<Chapter>> {
        self.read_chapters(studio_id).await
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::model::{Block, BlockKind, Node};
    use tempfile::TempDir;

    fn chapter(id: &str, title: &str) -> Chapter {
        Chapter {
            id: id.to_string(),
            title: title.to_string(),
            blocks: vec![Block {
                block_id: format!("{id}-b1"),
                sub_type: BlockKind::Paragraph,
                nodes: vec![Node::TtsNode {
                    text: "some narration".to_string(),
                    voice_id: "v1".to_string(),
                }],
            }],
        }
    }

    fn studio(id: &str) -> Studio {
        Studio {
            id: id.to_string(),
            project_id: format!("{id}-project"),
            name: "Test Book".to_string(),
            cast: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_studio_round_trip() {
        let store = MemoryDocumentStore::new();
        assert!(store.studio("s1").await.unwrap().is_none());

        store.put_studio(&studio("s1")).await.unwrap();
        let loaded = store.studio("s1").await.unwrap().unwrap();
        assert_eq!(loaded.project_id, "s1-project");
    }

    #[tokio::test]
    async fn test_memory_store_preserves_chapter_order() {
        let store = MemoryDocumentStore::new();
        store.put_chapter("s1", &chapter("c1", "One")).await.unwrap();
        store.put_chapter("s1", &chapter("c2", "Two")).await.unwrap();
        store.put_chapter("s1", &chapter("c3", "Three")).await.unwrap();

        // Replacing a middle chapter keeps its position.
        let mut updated = chapter("c2", "Two, revised");
        updated.blocks.clear();
        store.put_chapter("s1", &updated).await.unwrap();

        let chapters = store.chapters("s1").await.unwrap();
        let ids: Vec<&str> = chapters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert_eq!(chapters[1].title, "Two, revised");
        assert!(chapters[1].blocks.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_unknown_studio() {
        let store = MemoryDocumentStore::new();
        assert!(store.chapter("nope", "c1").await.unwrap().is_none());
        assert!(store.chapters("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filesystem_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemDocumentStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        store.put_studio(&studio("s1")).await.unwrap();
        store.put_chapter("s1", &chapter("c1", "One")).await.unwrap();
        store.put_chapter("s1", &chapter("c2", "Two")).await.unwrap();

        let loaded = store.studio("s1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Test Book");

        let second = store.chapter("s1", "c2").await.unwrap().unwrap();
        assert_eq!(second.title, "Two");

        let chapters = store.chapters("s1").await.unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].id, "c1");
    }

    #[tokio::test]
    async fn test_filesystem_store_missing_documents() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemDocumentStore::new(temp_dir.path().to_path_buf())
            .await
            .unwrap();

        assert!(store.studio("ghost").await.unwrap().is_none());
        assert!(store.chapters("ghost").await.unwrap().is_empty());
    }
}
