//! Generation pipeline orchestration.
//!
//! Every generation follows the same sequence regardless of scope: load
//! the content, estimate its cost, check the principal's credits, run
//! synthesis, persist the artifact, then record the generation and deduct
//! credits. The last two steps are deliberately best-effort: once audio is
//! persisted the caller gets a success, and a bookkeeping failure is
//! logged instead of surfaced.
//!
//! Blocks are synthesized directly, one provider call per node, and the
//! segments are concatenated. Chapters and complete audiobooks go through
//! the provider's conversion flow: start a conversion, poll for a
//! snapshot, stream the newest snapshot's audio. A caller that already
//! holds a snapshot id skips conversion and streams it directly.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::core::artifacts::{ArtifactError, ArtifactStore};
use crate::core::assembly;
use crate::core::cost::{self, CostError, CostEstimate};
use crate::core::documents::{Chapter, DocumentStore, StoreError, Studio};
use crate::core::generation::log::{GenerationLogStore, GenerationRecord, unix_now};
use crate::core::ledger::{LedgerError, LedgerStore};
use crate::core::tts::{SynthesisError, SynthesisProvider, latest_snapshot};

/// Content type of all generated audio artifacts.
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// Errors that can occur in the generation pipeline.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The request or the content it refers to is not synthesizable.
    #[error("{0}")]
    Validation(String),

    /// A referenced studio, chapter or block does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The principal cannot afford the generation.
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: u64, available: i64 },

    /// The synthesis provider failed or returned unusable audio.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// Conversion finished starting but no snapshot appeared in time.
    #[error("conversion snapshot not ready for {0}")]
    SnapshotPending(String),

    /// The artifact could not be persisted.
    #[error("artifact persistence failed: {0}")]
    Persistence(String),

    /// The document store failed.
    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    /// The credit ledger failed outside of a missing allocation.
    #[error("credit ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<CostError> for GenerationError {
    fn from(e: CostError) -> Self {
        GenerationError::Validation(e.to_string())
    }
}

impl From<SynthesisError> for GenerationError {
    fn from(e: SynthesisError) -> Self {
        GenerationError::Synthesis(e.to_string())
    }
}

impl From<ArtifactError> for GenerationError {
    fn from(e: ArtifactError) -> Self {
        GenerationError::Persistence(e.to_string())
    }
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// How long to wait for a conversion snapshot to appear.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPolicy {
    /// Number of times the snapshot list is polled.
    pub poll_attempts: u32,
    /// Delay between polls.
    pub poll_delay: Duration,
}

impl Default for SnapshotPolicy {
    fn default() -> Self {
        Self {
            poll_attempts: 5,
            poll_delay: Duration::from_secs(2),
        }
    }
}

/// The result of a completed generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationOutcome {
    /// Identifier of the stored artifact.
    pub artifact_id: String,
    /// URL where the artifact can be fetched.
    pub artifact_url: String,
    /// Credits deducted for this generation.
    pub credits_charged: u64,
    /// Characters billed for this generation.
    pub character_count: u64,
}

/// Runs the generation pipeline across its backing stores.
pub struct GenerationOrchestrator {
    documents: Arc<dyn DocumentStore>,
    ledger: Arc<dyn LedgerStore>,
    synthesis: Arc<dyn SynthesisProvider>,
    artifacts: Arc<dyn ArtifactStore>,
    generation_log: Arc<dyn GenerationLogStore>,
    snapshot_policy: SnapshotPolicy,
}

impl GenerationOrchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        ledger: Arc<dyn LedgerStore>,
        synthesis: Arc<dyn SynthesisProvider>,
        artifacts: Arc<dyn ArtifactStore>,
        generation_log: Arc<dyn GenerationLogStore>,
        snapshot_policy: SnapshotPolicy,
    ) -> Self {
        Self {
            documents,
            ledger,
            synthesis,
            artifacts,
            generation_log,
            snapshot_policy,
        }
    }

    /// Generates audio for a single block.
    pub async fn generate_block(
        &self,
        principal_id: &str,
        studio_id: &str,
        chapter_id: &str,
        block_id: &str,
    ) -> Result<GenerationOutcome> {
        let studio = self.load_studio(studio_id).await?;
        let chapter = self.load_chapter(studio_id, chapter_id).await?;
        let block = chapter
            .blocks
            .iter()
            .find(|b| b.block_id == block_id)
            .ok_or_else(|| GenerationError::NotFound(format!("block {block_id}")))?;

        for (index, node) in block.nodes.iter().enumerate() {
            if node.text().is_empty() {
                return Err(GenerationError::Validation(format!(
                    "node {index} of block {block_id} has no text"
                )));
            }
        }

        let estimate = cost::estimate_block(block)?;
        self.ensure_credits(principal_id, &estimate).await?;

        info!(
            studio = %studio_id,
            chapter = %chapter_id,
            block = %block_id,
            characters = estimate.character_count,
            credits = estimate.credit_cost,
            "generating block audio"
        );

        let mut segments = Vec::with_capacity(block.nodes.len());
        for (index, node) in block.nodes.iter().enumerate() {
            let audio = self
                .synthesis
                .synthesize(node.voice_id(), node.text())
                .await
                .map_err(|e| GenerationError::Synthesis(format!("node {index}: {e}")))?;
            segments.push(audio);
        }
        let audio = assembly::concat_segments(&segments)
            .map_err(|e| GenerationError::Synthesis(e.to_string()))?;

        let path = format!("{studio_id}/blocks/{block_id}");
        let stored = self.artifacts.upload(&path, audio, AUDIO_CONTENT_TYPE).await?;

        self.record_generation(GenerationRecord {
            project_id: studio.project_id.clone(),
            studio_id: studio_id.to_string(),
            chapter_id: chapter_id.to_string(),
            block_id: Some(block_id.to_string()),
            content: serde_json::to_value(block).unwrap_or(serde_json::Value::Null),
            character_count: estimate.character_count,
            recorded_at_unix: unix_now(),
        })
        .await;
        self.settle_credits(principal_id, estimate.credit_cost).await;

        Ok(GenerationOutcome {
            artifact_id: stored.artifact_id,
            artifact_url: stored.url,
            credits_charged: estimate.credit_cost,
            character_count: estimate.character_count,
        })
    }

    /// Generates audio for a whole chapter.
    ///
    /// With a `snapshot_id` the caller's snapshot is streamed directly;
    /// otherwise a new conversion is started and its snapshot streamed.
    pub async fn generate_chapter(
        &self,
        principal_id: &str,
        studio_id: &str,
        chapter_id: &str,
        snapshot_id: Option<&str>,
    ) -> Result<GenerationOutcome> {
        let studio = self.load_studio(studio_id).await?;
        let chapter = self.load_chapter(studio_id, chapter_id).await?;

        let estimate = cost::estimate_chapter(&chapter);
        self.ensure_credits(principal_id, &estimate).await?;

        info!(
            studio = %studio_id,
            chapter = %chapter_id,
            characters = estimate.character_count,
            credits = estimate.credit_cost,
            "generating chapter audio"
        );

        let audio = match snapshot_id {
            Some(snapshot_id) => {
                self.synthesis
                    .stream_chapter_snapshot(&studio.project_id, chapter_id, snapshot_id)
                    .await?
            }
            None => {
                self.synthesis
                    .convert_chapter(&studio.project_id, chapter_id)
                    .await?;
                let snapshot = self
                    .await_chapter_snapshot(&studio.project_id, chapter_id)
                    .await?;
                self.synthesis
                    .stream_chapter_snapshot(&studio.project_id, chapter_id, &snapshot)
                    .await?
            }
        };
        Self::reject_empty_audio(&audio)?;

        let path = format!("{studio_id}/chapters/{chapter_id}");
        let stored = self.artifacts.upload(&path, audio, AUDIO_CONTENT_TYPE).await?;

        self.record_generation(GenerationRecord {
            project_id: studio.project_id.clone(),
            studio_id: studio_id.to_string(),
            chapter_id: chapter_id.to_string(),
            block_id: None,
            content: serde_json::to_value(&chapter.blocks).unwrap_or(serde_json::Value::Null),
            character_count: estimate.character_count,
            recorded_at_unix: unix_now(),
        })
        .await;
        self.settle_credits(principal_id, estimate.credit_cost).await;

        Ok(GenerationOutcome {
            artifact_id: stored.artifact_id,
            artifact_url: stored.url,
            credits_charged: estimate.credit_cost,
            character_count: estimate.character_count,
        })
    }

    /// Generates the complete audiobook for a studio.
    pub async fn generate_project(
        &self,
        principal_id: &str,
        studio_id: &str,
        snapshot_id: Option<&str>,
    ) -> Result<GenerationOutcome> {
        let studio = self.load_studio(studio_id).await?;
        let chapters = self.documents.chapters(studio_id).await?;

        let estimate = cost::estimate_project(&chapters);
        self.ensure_credits(principal_id, &estimate).await?;

        info!(
            studio = %studio_id,
            chapters = chapters.len(),
            characters = estimate.character_count,
            credits = estimate.credit_cost,
            "generating complete audiobook"
        );

        let audio = match snapshot_id {
            Some(snapshot_id) => {
                self.synthesis
                    .stream_project_snapshot(&studio.project_id, snapshot_id)
                    .await?
            }
            None => {
                self.synthesis.convert_project(&studio.project_id).await?;
                let snapshot = self.await_project_snapshot(&studio.project_id).await?;
                self.synthesis
                    .stream_project_snapshot(&studio.project_id, &snapshot)
                    .await?
            }
        };
        Self::reject_empty_audio(&audio)?;

        let path = format!("{studio_id}/complete_audiobook/{studio_id}");
        let stored = self.artifacts.upload(&path, audio, AUDIO_CONTENT_TYPE).await?;

        // One record per chapter, so chapter-level lookups reflect the
        // content that went into the full book.
        for chapter in &chapters {
            self.record_generation(GenerationRecord {
                project_id: studio.project_id.clone(),
                studio_id: studio_id.to_string(),
                chapter_id: chapter.id.clone(),
                block_id: None,
                content: serde_json::to_value(&chapter.blocks).unwrap_or(serde_json::Value::Null),
                character_count: cost::estimate_chapter(chapter).character_count,
                recorded_at_unix: unix_now(),
            })
            .await;
        }
        self.settle_credits(principal_id, estimate.credit_cost).await;

        Ok(GenerationOutcome {
            artifact_id: stored.artifact_id,
            artifact_url: stored.url,
            credits_charged: estimate.credit_cost,
            character_count: estimate.character_count,
        })
    }

    async fn load_studio(&self, studio_id: &str) -> Result<Studio> {
        self.documents
            .studio(studio_id)
            .await?
            .ok_or_else(|| GenerationError::NotFound(format!("studio {studio_id}")))
    }

    async fn load_chapter(&self, studio_id: &str, chapter_id: &str) -> Result<Chapter> {
        self.documents
            .chapter(studio_id, chapter_id)
            .await?
            .ok_or_else(|| GenerationError::NotFound(format!("chapter {chapter_id}")))
    }

    async fn ensure_credits(&self, principal_id: &str, estimate: &CostEstimate) -> Result<()> {
        let available = self
            .ledger
            .available_credits(principal_id)
            .await
            .map_err(GenerationError::Ledger)?;
        if (available as i128) < (estimate.credit_cost as i128) {
            return Err(GenerationError::InsufficientCredits {
                required: estimate.credit_cost,
                available,
            });
        }
        Ok(())
    }

    fn reject_empty_audio(audio: &Bytes) -> Result<()> {
        if audio.is_empty() {
            return Err(GenerationError::Synthesis(
                "provider returned empty audio".to_string(),
            ));
        }
        Ok(())
    }

    async fn await_chapter_snapshot(&self, project_id: &str, chapter_id: &str) -> Result<String> {
        for attempt in 0..self.snapshot_policy.poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.snapshot_policy.poll_delay).await;
            }
            let snapshots = self
                .synthesis
                .chapter_snapshots(project_id, chapter_id)
                .await?;
            if let Some(snapshot) = latest_snapshot(&snapshots) {
                return Ok(snapshot.id.clone());
            }
        }
        Err(GenerationError::SnapshotPending(format!(
            "chapter {chapter_id}"
        )))
    }

    async fn await_project_snapshot(&self, project_id: &str) -> Result<String> {
        for attempt in 0..self.snapshot_policy.poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.snapshot_policy.poll_delay).await;
            }
            let snapshots = self.synthesis.project_snapshots(project_id).await?;
            if let Some(snapshot) = latest_snapshot(&snapshots) {
                return Ok(snapshot.id.clone());
            }
        }
        Err(GenerationError::SnapshotPending(format!(
            "project {project_id}"
        )))
    }

    async fn record_generation(&self, record: GenerationRecord) {
        if let Err(e) = self.generation_log.upsert(record).await {
            warn!(error = %e, "failed to record generation");
        }
    }

    /// Deducts credits after a successful generation. The artifact is
    /// already persisted at this point, so a ledger failure is logged and
    /// the generation still counts as a success.
    async fn settle_credits(&self, principal_id: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        match self.ledger.debit(principal_id, amount).await {
            Ok(balance) => info!(
                principal = %principal_id,
                credits = amount,
                available = balance.credits_available,
                "credits deducted"
            ),
            Err(e) => error!(
                principal = %principal_id,
                credits = amount,
                error = %e,
                "failed to deduct credits after generation"
            ),
        }
    }
}
