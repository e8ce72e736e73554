mod base;
pub mod elevenlabs;

pub use base::{
    SnapshotInfo, SynthesisError, SynthesisProvider, SynthesisResult, VoiceSettings,
    latest_snapshot,
};
pub use elevenlabs::{ELEVENLABS_BASE_URL, ElevenLabsConfig, ElevenLabsSynthesis};
