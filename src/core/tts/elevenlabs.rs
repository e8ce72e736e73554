use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::base::{
    SnapshotInfo, SynthesisError, SynthesisProvider, SynthesisResult, VoiceSettings,
};
use crate::core::documents::Block;

pub const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

/// Configuration for the ElevenLabs synthesis provider
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// API key for the provider
    pub api_key: String,
    /// Base URL, overridable for tests
    pub base_url: String,
    /// Model used for direct text-to-speech requests
    pub model_id: String,
    /// Output format for direct text-to-speech requests
    pub output_format: String,
    /// Request timeout. Synthesis responses can take a while.
    pub request_timeout: Duration,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: ELEVENLABS_BASE_URL.to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// ElevenLabs synthesis provider implementation using the ElevenLabs HTTP REST API.
///
/// Direct synthesis goes through the text-to-speech endpoint. Chapter and
/// project audio go through the studio endpoints: start a conversion, list
/// the resulting snapshots, stream one snapshot's audio.
pub struct ElevenLabsSynthesis {
    config: ElevenLabsConfig,
    client: reqwest::Client,
}

impl ElevenLabsSynthesis {
    /// Create a new ElevenLabs synthesis instance
    pub fn new(config: ElevenLabsConfig) -> SynthesisResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    fn require_api_key(&self) -> SynthesisResult<()> {
        if self.config.api_key.is_empty() {
            return Err(SynthesisError::InvalidConfiguration(
                "API key is required for ElevenLabs".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the direct text-to-speech request with URL, headers and body
    fn synthesize_request(&self, voice_id: &str, text: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/text-to-speech/{voice_id}?output_format={}",
            self.config.base_url, self.config.output_format
        );

        let body = json!({
            "text": text,
            "model_id": self.config.model_id,
        });

        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "audio/mpeg")
            .json(&body)
    }

    fn convert_chapter_request(&self, project_id: &str, chapter_id: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/chapters/{chapter_id}/convert",
            self.config.base_url
        );
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
    }

    fn convert_project_request(&self, project_id: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/convert",
            self.config.base_url
        );
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
    }

    fn chapter_snapshots_request(
        &self,
        project_id: &str,
        chapter_id: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/chapters/{chapter_id}/snapshots",
            self.config.base_url
        );
        self.client
            .get(url)
            .header("xi-api-key", &self.config.api_key)
    }

    fn project_snapshots_request(&self, project_id: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/snapshots",
            self.config.base_url
        );
        self.client
            .get(url)
            .header("xi-api-key", &self.config.api_key)
    }

    fn stream_chapter_snapshot_request(
        &self,
        project_id: &str,
        chapter_id: &str,
        snapshot_id: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/chapters/{chapter_id}/snapshots/{snapshot_id}/stream",
            self.config.base_url
        );
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({}))
    }

    fn stream_project_snapshot_request(
        &self,
        project_id: &str,
        snapshot_id: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/snapshots/{snapshot_id}/stream",
            self.config.base_url
        );
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({}))
    }

    fn voice_settings_request(&self, voice_id: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/voices/{voice_id}/settings", self.config.base_url);
        self.client
            .get(url)
            .header("xi-api-key", &self.config.api_key)
    }

    fn update_voice_settings_request(
        &self,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/voices/{voice_id}/settings/edit",
            self.config.base_url
        );
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(settings)
    }

    fn update_chapter_content_request(
        &self,
        project_id: &str,
        chapter_id: &str,
        blocks: &[Block],
    ) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/v1/studio/projects/{project_id}/chapters/{chapter_id}",
            self.config.base_url
        );
        let body = json!({ "content": { "blocks": blocks } });
        self.client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
    }

    async fn check_status(response: reqwest::Response) -> SynthesisResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SynthesisError::ProviderError {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_audio(&self, request: reqwest::RequestBuilder) -> SynthesisResult<Bytes> {
        let response = Self::check_status(request.send().await?).await?;
        Ok(response.bytes().await?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> SynthesisResult<T> {
        let response = Self::check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_ok(&self, request: reqwest::RequestBuilder) -> SynthesisResult<()> {
        Self::check_status(request.send().await?).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ChapterSnapshotsResponse {
    snapshots: Vec<ChapterSnapshotEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterSnapshotEntry {
    chapter_snapshot_id: String,
    #[serde(default)]
    name: Option<String>,
    created_at_unix: i64,
}

#[derive(Debug, Deserialize)]
struct ProjectSnapshotsResponse {
    snapshots: Vec<ProjectSnapshotEntry>,
}

#[derive(Debug, Deserialize)]
struct ProjectSnapshotEntry {
    project_snapshot_id: String,
    #[serde(default)]
    name: Option<String>,
    created_at_unix: i64,
}

#[async_trait]
impl SynthesisProvider for ElevenLabsSynthesis {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    async fn synthesize(&self, voice_id: &str, text: &str) -> SynthesisResult<Bytes> {
        self.require_api_key()?;
        debug!(voice = %voice_id, characters = text.chars().count(), "sending synthesis request");
        self.send_audio(self.synthesize_request(voice_id, text)).await
    }

    async fn convert_chapter(&self, project_id: &str, chapter_id: &str) -> SynthesisResult<()> {
        self.require_api_key()?;
        debug!(project = %project_id, chapter = %chapter_id, "starting chapter conversion");
        self.send_ok(self.convert_chapter_request(project_id, chapter_id))
            .await
    }

    async fn convert_project(&self, project_id: &str) -> SynthesisResult<()> {
        self.require_api_key()?;
        debug!(project = %project_id, "starting project conversion");
        self.send_ok(self.convert_project_request(project_id)).await
    }

    async fn chapter_snapshots(
        &self,
        project_id: &str,
        chapter_id: &str,
    ) -> SynthesisResult<Vec<SnapshotInfo>> {
        self.require_api_key()?;
        let response: ChapterSnapshotsResponse = self
            .send_json(self.chapter_snapshots_request(project_id, chapter_id))
            .await?;
        Ok(response
            .snapshots
            .into_iter()
            .map(|s| SnapshotInfo {
                id: s.chapter_snapshot_id,
                name: s.name,
                created_at_unix: s.created_at_unix,
            })
            .collect())
    }

    async fn project_snapshots(&self, project_id: &str) -> SynthesisResult<Vec<SnapshotInfo>> {
        self.require_api_key()?;
        let response: ProjectSnapshotsResponse = self
            .send_json(self.project_snapshots_request(project_id))
            .await?;
        Ok(response
            .snapshots
            .into_iter()
            .map(|s| SnapshotInfo {
                id: s.project_snapshot_id,
                name: s.name,
                created_at_unix: s.created_at_unix,
            })
            .collect())
    }

    async fn stream_chapter_snapshot(
        &self,
        project_id: &str,
        chapter_id: &str,
        snapshot_id: &str,
    ) -> SynthesisResult<Bytes> {
        self.require_api_key()?;
        debug!(project = %project_id, chapter = %chapter_id, snapshot = %snapshot_id, "streaming chapter snapshot");
        self.send_audio(self.stream_chapter_snapshot_request(project_id, chapter_id, snapshot_id))
            .await
    }

    async fn stream_project_snapshot(
        &self,
        project_id: &str,
        snapshot_id: &str,
    ) -> SynthesisResult<Bytes> {
        self.require_api_key()?;
        debug!(project = %project_id, snapshot = %snapshot_id, "streaming project snapshot");
        self.send_audio(self.stream_project_snapshot_request(project_id, snapshot_id))
            .await
    }

    async fn voice_settings(&self, voice_id: &str) -> SynthesisResult<VoiceSettings> {
        self.require_api_key()?;
        self.send_json(self.voice_settings_request(voice_id)).await
    }

    async fn update_voice_settings(
        &self,
        voice_id: &str,
        settings: &VoiceSettings,
    ) -> SynthesisResult<()> {
        self.require_api_key()?;
        debug!(voice = %voice_id, "updating voice settings");
        self.send_ok(self.update_voice_settings_request(voice_id, settings))
            .await
    }

    async fn update_chapter_content(
        &self,
        project_id: &str,
        chapter_id: &str,
        blocks: &[Block],
    ) -> SynthesisResult<()> {
        self.require_api_key()?;
        debug!(project = %project_id, chapter = %chapter_id, blocks = blocks.len(), "updating chapter content");
        self.send_ok(self.update_chapter_content_request(project_id, chapter_id, blocks))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::documents::{BlockKind, Node};

    fn provider() -> ElevenLabsSynthesis {
        ElevenLabsSynthesis::new(ElevenLabsConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_synthesize_request_building() {
        let request = provider()
            .synthesize_request("test_voice_id", "Test text")
            .build()
            .unwrap();

        let url = request.url().to_string();
        assert!(url.starts_with("https://api.elevenlabs.io/v1/text-to-speech/test_voice_id"));
        assert!(url.contains("output_format=mp3_44100_128"));

        let headers = request.headers();
        assert_eq!(headers.get("xi-api-key").unwrap(), "test_key");
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert_eq!(headers.get("accept").unwrap(), "audio/mpeg");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(body_json["text"], "Test text");
        assert_eq!(body_json["model_id"], "eleven_multilingual_v2");
    }

    #[tokio::test]
    async fn test_conversion_request_urls() {
        let p = provider();

        let convert = p.convert_chapter_request("proj", "chap").build().unwrap();
        assert_eq!(
            convert.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/chapters/chap/convert"
        );

        let convert_all = p.convert_project_request("proj").build().unwrap();
        assert_eq!(
            convert_all.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/convert"
        );

        let snapshots = p.chapter_snapshots_request("proj", "chap").build().unwrap();
        assert_eq!(snapshots.method(), reqwest::Method::GET);
        assert_eq!(
            snapshots.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/chapters/chap/snapshots"
        );

        let stream = p
            .stream_chapter_snapshot_request("proj", "chap", "snap")
            .build()
            .unwrap();
        assert_eq!(
            stream.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/chapters/chap/snapshots/snap/stream"
        );
        assert_eq!(stream.headers().get("accept").unwrap(), "audio/mpeg");

        let stream_all = p
            .stream_project_snapshot_request("proj", "snap")
            .build()
            .unwrap();
        assert_eq!(
            stream_all.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/snapshots/snap/stream"
        );
    }

    #[tokio::test]
    async fn test_voice_settings_requests() {
        let p = provider();

        let get = p.voice_settings_request("voice-1").build().unwrap();
        assert_eq!(get.method(), reqwest::Method::GET);
        assert_eq!(
            get.url().as_str(),
            "https://api.elevenlabs.io/v1/voices/voice-1/settings"
        );

        let settings = VoiceSettings {
            stability: Some(0.3),
            ..Default::default()
        };
        let edit = p
            .update_voice_settings_request("voice-1", &settings)
            .build()
            .unwrap();
        assert_eq!(
            edit.url().as_str(),
            "https://api.elevenlabs.io/v1/voices/voice-1/settings/edit"
        );
        let body = edit.body().and_then(|b| b.as_bytes()).unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(body_json["stability"], 0.3);
    }

    #[tokio::test]
    async fn test_update_chapter_content_body() {
        let blocks = vec![Block {
            block_id: "b1".to_string(),
            sub_type: BlockKind::Paragraph,
            nodes: vec![Node::TtsNode {
                text: "line one".to_string(),
                voice_id: "voice-a".to_string(),
            }],
        }];

        let request = provider()
            .update_chapter_content_request("proj", "chap", &blocks)
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.elevenlabs.io/v1/studio/projects/proj/chapters/chap"
        );

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let body_json: serde_json::Value = serde_json::from_slice(body).unwrap();
        let node = &body_json["content"]["blocks"][0]["nodes"][0];
        assert_eq!(node["type"], "tts_node");
        assert_eq!(node["text"], "line one");
        assert_eq!(node["voice_id"], "voice-a");
        assert_eq!(body_json["content"]["blocks"][0]["sub_type"], "paragraph");
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected_before_sending() {
        let p = ElevenLabsSynthesis::new(ElevenLabsConfig::default()).unwrap();
        let result = p.synthesize("voice-1", "Hello").await;
        assert!(matches!(
            result,
            Err(SynthesisError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let p = ElevenLabsSynthesis::new(ElevenLabsConfig {
            api_key: "test_key".to_string(),
            base_url: "http://localhost:9999".to_string(),
            ..Default::default()
        })
        .unwrap();

        let request = p.project_snapshots_request("proj").build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://localhost:9999/v1/studio/projects/proj/snapshots"
        );
    }

    #[test]
    fn test_snapshot_response_parsing() {
        let raw = r#"{
            "snapshots": [
                {"chapter_snapshot_id": "cs1", "project_id": "p1", "chapter_id": "c1", "created_at_unix": 1700000000, "name": "v1"},
                {"chapter_snapshot_id": "cs2", "project_id": "p1", "chapter_id": "c1", "created_at_unix": 1700000500}
            ]
        }"#;
        let parsed: ChapterSnapshotsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.snapshots.len(), 2);
        assert_eq!(parsed.snapshots[0].chapter_snapshot_id, "cs1");
        assert_eq!(parsed.snapshots[1].name, None);
        assert_eq!(parsed.snapshots[1].created_at_unix, 1700000500);
    }
}
