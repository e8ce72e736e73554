//! Base types for speech synthesis providers.
//!
//! Defines the error type, voice settings, snapshot metadata and the
//! [`SynthesisProvider`] trait the generation pipeline is written against.
//! The trait covers two synthesis paths: direct per-node synthesis used for
//! single blocks, and the project-based conversion flow (convert, list
//! snapshots, stream a snapshot) used for chapters and complete audiobooks.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::documents::Block;

/// Synthesis-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Provider returned {status}: {message}")]
    ProviderError { status: u16, message: String },
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        SynthesisError::NetworkError(e.to_string())
    }
}

/// Result type for synthesis operations
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Provider-side voice rendering settings.
///
/// All fields are optional; unset fields are omitted on the wire so the
/// provider keeps its own defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VoiceSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_speaker_boost: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

/// Metadata for one conversion snapshot held by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotInfo {
    /// Snapshot identifier used for streaming.
    pub id: String,
    /// Optional display name assigned by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation time as a unix timestamp.
    pub created_at_unix: i64,
}

/// Picks the most recently created snapshot.
pub fn latest_snapshot(snapshots: &[SnapshotInfo]) -> Option<&SnapshotInfo> {
    snapshots.iter().max_by_key(|s| s.created_at_unix)
}

/// Base trait for speech synthesis providers
#[async_trait]
pub trait SynthesisProvider: Send + Sync {
    /// Returns the provider name.
    fn name(&self) -> &str;

    /// Synthesizes a single piece of text with one voice and returns the
    /// encoded audio.
    async fn synthesize(&self, voice_id: &str, text: &str) -> SynthesisResult<Bytes>;

    /// Starts a conversion of one chapter on the provider side.
    async fn convert_chapter(&self, project_id: &str, chapter_id: &str) -> SynthesisResult<()>;

    /// Starts a conversion of the whole project.
    async fn convert_project(&self, project_id: &str) -> SynthesisResult<()>;

    /// Lists conversion snapshots available for a chapter.
    async fn chapter_snapshots(
        &self,
        project_id: &str,
        chapter_id: &str,
    ) -> SynthesisResult<Vec<SnapshotInfo>>;

    /// Lists conversion snapshots available for the whole project.
    async fn project_snapshots(&self, project_id: &str) -> SynthesisResult<Vec<SnapshotInfo>>;

    /// Streams the audio of one chapter snapshot.
    async fn stream_chapter_snapshot(
        &self,
        project_id: &str,
        chapter_id: &str,
        snapshot_id: &str,
    ) -> SynthesisResult<Bytes>;

    /// Streams the audio of one project snapshot.
    async fn stream_project_snapshot(
        &self,
        project_id: &str,
        snapshot_id: &str,
    ) -> SynthesisResult<Bytes>;

    /// Fetches the current settings of a voice.
    async fn voice_settings(&self, voice_id: &str) -> SynthesisResult<VoiceSettings>;

    /// Replaces the settings of a voice.
    async fn update_voice_settings(
        &self,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SynthesisResult<()>;

    /// Replaces the content of a chapter on the provider side with the
    /// given blocks.
    async fn update_chapter_content(
        &self,
        project_id: &str,
        chapter_id: &str,
        blocks: &[Block],
    ) -> SynthesisResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_settings_omits_unset_fields() {
        let settings = VoiceSettings {
            stability: Some(0.5),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"stability":0.5}"#);
    }

    #[test]
    fn test_voice_settings_full_round_trip() {
        let settings = VoiceSettings {
            stability: Some(0.4),
            similarity_boost: Some(0.9),
            style: Some(0.1),
            use_speaker_boost: Some(true),
            speed: Some(1.2),
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: VoiceSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_latest_snapshot_by_creation_time() {
        let snapshots = vec![
            SnapshotInfo {
                id: "old".to_string(),
                name: None,
                created_at_unix: 100,
            },
            SnapshotInfo {
                id: "new".to_string(),
                name: Some("final".to_string()),
                created_at_unix: 300,
            },
            SnapshotInfo {
                id: "mid".to_string(),
                name: None,
                created_at_unix: 200,
            },
        ];
        assert_eq!(latest_snapshot(&snapshots).unwrap().id, "new");
    }

    #[test]
    fn test_latest_snapshot_empty() {
        assert!(latest_snapshot(&[]).is_none());
    }
}
