//! Playback-time to transcript-chunk synchronization

use std::time::{Duration, Instant};

use log::{debug, warn};

use super::transcript;
use crate::error::SyncError;
use crate::timing::Throttle;
use crate::types::{ChunkId, TranscriptChunk};

/// Minimum spacing between "chunk changed" notifications
pub const DEFAULT_SYNC_THROTTLE: Duration = Duration::from_millis(300);

/// Seeks past the end land this far before it, in seconds
pub const SEEK_END_EPSILON: f64 = 0.05;

/// The media element being controlled
pub trait MediaTarget {
    fn set_current_time(&mut self, seconds: f64);
}

/// Where caption text is written
pub trait CaptionSink {
    fn write_caption(&mut self, text: &str);
}

/// The active transcript chunk changed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkChange {
    pub chunk_id: Option<ChunkId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeekOutcome {
    /// Sent to the media target at this time
    Applied(f64),
    /// Held until the duration is known
    Deferred(f64),
    Ignored,
}

#[derive(Debug)]
pub struct TemporalSyncEngine {
    chunks: Vec<TranscriptChunk>,
    notified: Option<ChunkId>,
    /// Change held back by the throttle, delivered on the trailing edge
    pending: Option<Option<ChunkId>>,
    throttle: Throttle,
    last_caption: Option<String>,
    duration: Option<f64>,
    deferred_seek: Option<f64>,
    disposed: bool,
}

impl TemporalSyncEngine {
    pub fn new(chunks: Vec<TranscriptChunk>) -> Self {
        Self::with_throttle(chunks, DEFAULT_SYNC_THROTTLE)
    }

    pub fn with_throttle(chunks: Vec<TranscriptChunk>, interval: Duration) -> Self {
        Self {
            chunks: transcript::normalize(chunks),
            notified: None,
            pending: None,
            throttle: Throttle::new(interval),
            last_caption: None,
            duration: None,
            deferred_seek: None,
            disposed: false,
        }
    }

    /// Swap in a new transcript. Duration and any deferred seek belong to the
    /// media element, not the transcript, and are kept.
    pub fn set_transcript(&mut self, chunks: Vec<TranscriptChunk>) {
        if self.disposed {
            return;
        }
        self.chunks = transcript::normalize(chunks);
        self.notified = None;
        self.pending = None;
        self.last_caption = None;
        self.throttle.reset();
    }

    pub fn chunks(&self) -> &[TranscriptChunk] {
        &self.chunks
    }

    /// Last chunk id handed out as a change
    pub fn current(&self) -> Option<&ChunkId> {
        self.notified.as_ref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// First chunk whose `[start, end)` contains `time`
    pub fn resolve(&self, time: f64) -> Option<&TranscriptChunk> {
        if !time.is_finite() {
            return None;
        }
        self.chunks
            .iter()
            .take_while(|c| c.start_time <= time)
            .find(|c| c.contains(time))
    }

    /// Feed the current playback time. Returns a change only when the resolved
    /// chunk differs from the last one reported and the throttle allows it.
    pub fn on_time_update(&mut self, time: f64, now: Instant) -> Option<ChunkChange> {
        if self.disposed {
            return None;
        }
        let resolved = self.resolve(time).map(|c| c.chunk_id.clone());
        if resolved == self.notified {
            self.pending = None;
            return None;
        }
        if self.throttle.try_fire(now) {
            self.pending = None;
            self.notified = resolved.clone();
            Some(ChunkChange { chunk_id: resolved })
        } else {
            self.pending = Some(resolved);
            None
        }
    }

    /// Deliver a change the throttle held back, once the interval allows it
    pub fn poll(&mut self, now: Instant) -> Option<ChunkChange> {
        if self.disposed || self.pending.is_none() || !self.throttle.is_ready(now) {
            return None;
        }
        let resolved = self.pending.take()?;
        if resolved == self.notified {
            return None;
        }
        self.throttle.try_fire(now);
        self.notified = resolved.clone();
        Some(ChunkChange { chunk_id: resolved })
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When `poll` can deliver the held-back change
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.disposed || self.pending.is_none() {
            return None;
        }
        self.throttle.next_ready()
    }

    /// Write the caption for `time`, skipping the write when the text is the
    /// same as last time. Returns whether a write happened.
    pub fn update_caption(&mut self, time: f64, sink: &mut dyn CaptionSink) -> bool {
        if self.disposed {
            return false;
        }
        let text = self.resolve(time).map_or("", |c| c.text.as_str());
        if self.last_caption.as_deref() == Some(text) {
            return false;
        }
        sink.write_caption(text);
        self.last_caption = Some(text.to_string());
        true
    }

    pub fn seek(&mut self, time: f64, media: &mut dyn MediaTarget) -> SeekOutcome {
        if self.disposed {
            return SeekOutcome::Ignored;
        }
        let time = if time.is_finite() && time >= 0.0 {
            time
        } else {
            warn!(
                "{}, clamping to 0",
                SyncError::invalid(format!("seek time {time}"))
            );
            0.0
        };
        let Some(duration) = self.duration else {
            debug!("Duration unknown, deferring seek to {time}");
            self.deferred_seek = Some(time);
            return SeekOutcome::Deferred(time);
        };
        let target = if time >= duration {
            (duration - SEEK_END_EPSILON).max(0.0)
        } else {
            time
        };
        media.set_current_time(target);
        SeekOutcome::Applied(target)
    }

    /// Media metadata arrived. Re-issues a deferred seek exactly once.
    pub fn on_duration_known(
        &mut self,
        duration: f64,
        media: &mut dyn MediaTarget,
    ) -> Option<SeekOutcome> {
        if self.disposed {
            return None;
        }
        if !duration.is_finite() || duration <= 0.0 {
            warn!("Ignoring unusable media duration {duration}");
            return None;
        }
        self.duration = Some(duration);
        let deferred = self.deferred_seek.take()?;
        Some(self.seek(deferred, media))
    }

    /// Drop pending work; later calls do nothing
    pub fn teardown(&mut self) {
        self.disposed = true;
        self.pending = None;
        self.deferred_seek = None;
        self.throttle.reset();
    }
}
