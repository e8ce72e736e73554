pub mod artifacts;
pub mod assembly;
pub mod cast;
pub mod cost;
pub mod documents;
pub mod generation;
pub mod ledger;
pub mod tts;

// Re-export commonly used types for convenience
pub use artifacts::{
    ArtifactError, ArtifactStore, FilesystemArtifactStore, MemoryArtifactStore, StoredArtifact,
};
pub use assembly::{AssemblyError, concat_segments};
pub use cast::{CastError, CastMemberDraft, CastMemberUpdate, CastVoiceCoordinator, RosterState};
pub use cost::{CHARS_PER_CREDIT, CostEstimate, credits_for};
pub use documents::{
    Block, BlockKind, CastMember, Chapter, DocumentStore, FilesystemDocumentStore,
    MemoryDocumentStore, Node, StoreError, Studio,
};
pub use generation::{
    AUDIO_CONTENT_TYPE, FilesystemGenerationLog, GenerationError, GenerationLogStore,
    GenerationOrchestrator, GenerationOutcome, GenerationRecord, MemoryGenerationLog,
    SnapshotPolicy,
};
pub use ledger::{
    CreditBalance, FilesystemLedgerStore, LedgerError, LedgerStore, MemoryLedgerStore,
};
pub use tts::{
    ElevenLabsConfig, ElevenLabsSynthesis, SnapshotInfo, SynthesisError, SynthesisProvider,
    SynthesisResult, VoiceSettings,
};
