//! Audio generation: the pipeline and its record log.

pub mod log;
pub mod orchestrator;

pub use log::{
    FilesystemGenerationLog, GenerationLogStore, GenerationRecord, MemoryGenerationLog,
};
pub use orchestrator::{
    AUDIO_CONTENT_TYPE, GenerationError, GenerationOrchestrator, GenerationOutcome,
    SnapshotPolicy,
};
