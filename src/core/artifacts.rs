//! Artifact storage for generated audio.
//!
//! Finished audio is written under a deterministic logical path, one slot
//! per scope: `{studio}/blocks/{block}`, `{studio}/chapters/{chapter}` and
//! `{studio}/complete_audiobook/{studio}`. Re-generating a scope overwrites
//! the slot in place, but every upload is assigned a fresh artifact id so
//! callers can tell generations apart.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Errors that can occur during artifact operations.
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// I/O error occurred during filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact path is not usable.
    #[error("Invalid artifact path: {0}")]
    InvalidPath(String),
}

/// Result type for artifact operations.
pub type Result<T> = std::result::Result<T, ArtifactError>;

/// A stored artifact reference returned from an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Fresh identifier for this upload.
    pub artifact_id: String,
    /// Stable URL derived from the logical path.
    pub url: String,
}

/// Interface for artifact persistence.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores audio bytes at a logical path, overwriting any previous
    /// content, and returns the artifact reference.
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<StoredArtifact>;

    /// Retrieves the bytes stored at a logical path.
    async fn fetch(&self, path: &str) -> Result<Option<Bytes>>;

    /// Returns the backend type as a string identifier.
    fn backend_type(&self) -> &str;
}

fn validate_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ArtifactError::InvalidPath("path is empty".to_string()));
    }
    if path.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(ArtifactError::InvalidPath(format!(
            "path contains unusable segment: {path}"
        )));
    }
    Ok(())
}

fn artifact_url(public_base_url: &str, path: &str) -> String {
    format!("{}/{}", public_base_url.trim_end_matches('/'), path)
}

/// Memory-based artifact store.
pub struct MemoryArtifactStore {
    public_base_url: String,
    objects: RwLock<HashMap<String, Bytes>>,
}

impl MemoryArtifactStore {
    /// Creates an empty memory store serving URLs under `public_base_url`.
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            public_base_url: public_base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<StoredArtifact> {
        validate_path(path)?;
        debug!(path = %path, size = data.len(), content_type = %content_type, "storing artifact");
        self.objects.write().insert(path.to_string(), data);
        Ok(StoredArtifact {
            artifact_id: Uuid::new_v4().to_string(),
            url: artifact_url(&self.public_base_url, path),
        })
    }

    async fn fetch(&self, path: &str) -> Result<Option<Bytes>> {
        Ok(self.objects.read().get(path).cloned())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }
}

/// Filesystem-based artifact store.
///
/// Logical paths map directly to files under the base directory, so the
/// layout on disk mirrors the artifact naming scheme and can be served
/// statically.
pub struct FilesystemArtifactStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl FilesystemArtifactStore {
    /// Creates a filesystem store rooted at `base_path`.
    pub async fn new(base_path: PathBuf, public_base_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }

    fn file_path(&self, path: &str) -> PathBuf {
        let mut file_path = self.base_path.clone();
        for segment in path.split('/') {
            file_path.push(segment);
        }
        file_path
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifactStore {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<StoredArtifact> {
        validate_path(path)?;
        let file_path = self.file_path(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!(path = %path, size = data.len(), content_type = %content_type, "storing artifact");

        // Atomic write using temp file
        let temp_path = file_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &file_path).await?;

        Ok(StoredArtifact {
            artifact_id: Uuid::new_v4().to_string(),
            url: artifact_url(&self.public_base_url, path),
        })
    }

    async fn fetch(&self, path: &str) -> Result<Option<Bytes>> {
        validate_path(path)?;
        match fs::read(self.file_path(path)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_type(&self) -> &str {
        "filesystem"
    }
}
