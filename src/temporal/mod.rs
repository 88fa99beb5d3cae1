//! Media-time side: transcript parsing and playback synchronization

pub mod engine;
pub mod transcript;

pub use engine::{
    CaptionSink, ChunkChange, DEFAULT_SYNC_THROTTLE, MediaTarget, SEEK_END_EPSILON, SeekOutcome,
    TemporalSyncEngine,
};
pub use transcript::{Cue, TranscriptOrigin, select_transcript};
