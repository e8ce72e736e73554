use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::artifacts::{ArtifactStore, FilesystemArtifactStore, MemoryArtifactStore};
use crate::core::cast::CastVoiceCoordinator;
use crate::core::documents::{DocumentStore, FilesystemDocumentStore, MemoryDocumentStore};
use crate::core::generation::{
    FilesystemGenerationLog, GenerationLogStore, GenerationOrchestrator, MemoryGenerationLog,
    SnapshotPolicy,
};
use crate::core::ledger::{FilesystemLedgerStore, LedgerStore, MemoryLedgerStore};
use crate::core::tts::{ElevenLabsConfig, ElevenLabsSynthesis, SynthesisProvider};

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Studio and chapter documents
    pub documents: Arc<dyn DocumentStore>,
    /// Per-principal credit balances
    pub ledger: Arc<dyn LedgerStore>,
    /// Record of the content behind each generated artifact
    pub generation_log: Arc<dyn GenerationLogStore>,
    /// The generation pipeline
    pub orchestrator: Arc<GenerationOrchestrator>,
    /// Cast roster operations
    pub cast: Arc<CastVoiceCoordinator>,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// Stores are filesystem-backed when `data_path`/`artifacts_path` are
    /// configured and in-memory otherwise. The synthesis provider is always
    /// ElevenLabs; a missing API key only fails once a provider call is made,
    /// so a server without a key can still serve reads and cast edits.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, Box<dyn std::error::Error>> {
        let synthesis: Arc<dyn SynthesisProvider> =
            Arc::new(ElevenLabsSynthesis::new(ElevenLabsConfig {
                api_key: config.elevenlabs_api_key.clone().unwrap_or_default(),
                base_url: config.elevenlabs_base_url.clone(),
                model_id: config.elevenlabs_model_id.clone(),
                request_timeout: config.request_timeout(),
                ..Default::default()
            })?);

        let documents: Arc<dyn DocumentStore> = match &config.data_path {
            Some(path) => Arc::new(FilesystemDocumentStore::new(path.join("documents")).await?),
            None => Arc::new(MemoryDocumentStore::new()),
        };

        let ledger: Arc<dyn LedgerStore> = match &config.data_path {
            Some(path) => Arc::new(FilesystemLedgerStore::new(path.join("ledger")).await?),
            None => Arc::new(MemoryLedgerStore::new()),
        };

        let generation_log: Arc<dyn GenerationLogStore> = match &config.data_path {
            Some(path) => {
                Arc::new(FilesystemGenerationLog::new(path.join("generation_log")).await?)
            }
            None => Arc::new(MemoryGenerationLog::new()),
        };

        let artifacts: Arc<dyn ArtifactStore> = match &config.artifacts_path {
            Some(path) => Arc::new(
                FilesystemArtifactStore::new(path.clone(), config.artifacts_public_url.clone())
                    .await?,
            ),
            None => Arc::new(MemoryArtifactStore::new(config.artifacts_public_url.clone())),
        };

        tracing::info!(
            documents = documents.backend_type(),
            ledger = ledger.backend_type(),
            artifacts = %config.artifacts_public_url,
            "storage backends initialized"
        );

        let snapshot_policy = SnapshotPolicy {
            poll_attempts: config.snapshot_poll_attempts,
            poll_delay: config.snapshot_poll_delay(),
        };

        let orchestrator = Arc::new(GenerationOrchestrator::new(
            documents.clone(),
            ledger.clone(),
            synthesis.clone(),
            artifacts.clone(),
            generation_log.clone(),
            snapshot_policy,
        ));

        let cast = Arc::new(CastVoiceCoordinator::new(
            documents.clone(),
            synthesis.clone(),
        ));

        Ok(Arc::new(Self {
            config,
            documents,
            ledger,
            generation_log,
            orchestrator,
            cast,
        }))
    }
}
