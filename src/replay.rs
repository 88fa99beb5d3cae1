//! Scripted sessions against a fixture, used by the `replay` command
//!
//! A script is a JSON array of steps such as
//! `{"op": "overlay_click", "chunk": "c3"}`. Timed steps carry `at_ms`, an
//! offset from the start of the session, so debounce and throttle behaviour
//! replays deterministically.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::backend::FixtureBackend;
use crate::content::MemoryContent;
use crate::fixture::DocumentFixture;
use crate::navigation::{HistoryHost, MemoryHistory, NavigationOrchestrator, SyncConfig, SyncSnapshot};
use crate::overlay::{FixedSurface, OverlayKey};
use crate::temporal::{CaptionSink, MediaTarget, TranscriptOrigin};
use crate::types::{ChunkId, Dimensions};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    GoToPage {
        page: usize,
    },
    NextPage,
    PrevPage,
    OpenChunk {
        chunk: ChunkId,
    },
    Back,
    Forward,
    Resize {
        width: f64,
        height: f64,
    },
    OverlayEnter {
        chunk: ChunkId,
        #[serde(default)]
        at_ms: u64,
    },
    OverlayLeave {
        chunk: ChunkId,
        #[serde(default)]
        at_ms: u64,
    },
    OverlayPointer {
        x: f64,
        y: f64,
        #[serde(default)]
        at_ms: u64,
    },
    OverlayClick {
        chunk: ChunkId,
    },
    OverlayKey {
        key: OverlayKey,
    },
    ContentEnter {
        chunk: ChunkId,
    },
    ContentLeave {
        chunk: ChunkId,
    },
    ContentClick {
        chunk: ChunkId,
    },
    MediaTime {
        time: f64,
        #[serde(default)]
        at_ms: u64,
    },
    MediaDuration {
        duration: f64,
    },
    Seek {
        time: f64,
    },
    Tick {
        at_ms: u64,
    },
    Destroy,
}

impl Step {
    pub fn parse_script(json: &str) -> Result<Vec<Step>> {
        serde_json::from_str(json).context("Failed to parse replay script")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReplayOptions {
    /// Initial URL query
    pub query: String,
    pub surface: Dimensions,
    pub config: SyncConfig,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            surface: Dimensions::new(1000.0, 1000.0),
            config: SyncConfig::default(),
        }
    }
}

#[derive(Debug, Default)]
struct MediaLog {
    seeks: Vec<f64>,
}

impl MediaTarget for MediaLog {
    fn set_current_time(&mut self, seconds: f64) {
        self.seeks.push(seconds);
    }
}

#[derive(Debug, Default)]
struct CaptionLog {
    lines: Vec<String>,
}

impl CaptionSink for CaptionLog {
    fn write_caption(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

/// What a replay leaves behind
#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub snapshot: SyncSnapshot,
    pub url: String,
    pub history: Vec<String>,
    pub transcript: TranscriptOrigin,
    pub seeks: Vec<f64>,
    pub captions: Vec<String>,
    pub content_writes: usize,
}

pub struct ReplaySession {
    sync: NavigationOrchestrator,
    history: MemoryHistory,
    content: MemoryContent,
    surface: FixedSurface,
    media: MediaLog,
    captions: CaptionLog,
    transcript: TranscriptOrigin,
    start: Instant,
}

impl ReplaySession {
    pub fn new(fixture: DocumentFixture, options: ReplayOptions) -> Result<Self> {
        let history = MemoryHistory::new(&options.query);
        let content = MemoryContent::with_chunks(fixture.chunks.iter().map(|c| c.chunk_id.clone()));
        let surface = FixedSurface::new(options.surface, true);
        let cues = fixture.cues.clone();
        let markers = fixture.markers.clone();

        let mut sync = NavigationOrchestrator::new(
            fixture.document_id.clone(),
            fixture.total_pages,
            options.config,
            Box::new(FixtureBackend::new(fixture)),
            Box::new(history.clone()),
            Box::new(content.clone()),
        )
        .context("Failed to set up replay session")?;

        sync.attach_surface(&surface);
        sync.init();
        sync.pump();
        let transcript = sync.load_transcript(cues.as_deref(), markers.as_deref());

        Ok(Self {
            sync,
            history,
            content,
            surface,
            media: MediaLog::default(),
            captions: CaptionLog::default(),
            transcript,
            start: Instant::now(),
        })
    }

    pub fn orchestrator(&self) -> &NavigationOrchestrator {
        &self.sync
    }

    fn at(&self, ms: u64) -> Instant {
        self.start + Duration::from_millis(ms)
    }

    fn content_node(&self, chunk: &ChunkId) -> Option<usize> {
        let node = self.content.node_of(chunk);
        if node.is_none() {
            warn!("Replay: chunk {chunk} is not in the content");
        }
        node
    }

    pub fn run(&mut self, step: &Step) {
        debug!("Replay step {step:?}");
        match step {
            Step::GoToPage { page } => self.sync.go_to_page(*page),
            Step::NextPage => self.sync.next_page(),
            Step::PrevPage => self.sync.prev_page(),
            Step::OpenChunk { chunk } => self.sync.open_chunk(chunk),
            Step::Back => {
                if let Some(query) = self.history.back() {
                    self.sync.on_history_pop(&query);
                }
            }
            Step::Forward => {
                if let Some(query) = self.history.forward() {
                    self.sync.on_history_pop(&query);
                }
            }
            Step::Resize { width, height } => {
                let dims = Dimensions::new(*width, *height);
                self.surface.resize(dims);
                if self.sync.on_surface_resized(dims) {
                    self.sync.on_animation_frame();
                }
            }
            Step::OverlayEnter { chunk, at_ms } => {
                self.sync.overlay_pointer_enter(chunk, self.at(*at_ms))
            }
            Step::OverlayLeave { chunk, at_ms } => {
                self.sync.overlay_pointer_leave(chunk, self.at(*at_ms))
            }
            Step::OverlayPointer { x, y, at_ms } => {
                self.sync.overlay_pointer_at(*x, *y, self.at(*at_ms))
            }
            Step::OverlayClick { chunk } => self.sync.overlay_click(chunk),
            Step::OverlayKey { key } => self.sync.overlay_key(*key),
            Step::ContentEnter { chunk } => {
                if let Some(node) = self.content_node(chunk) {
                    self.sync.content_pointer_enter(node);
                }
            }
            Step::ContentLeave { chunk } => {
                if let Some(node) = self.content_node(chunk) {
                    self.sync.content_pointer_leave(node, None);
                }
            }
            Step::ContentClick { chunk } => {
                if let Some(node) = self.content_node(chunk) {
                    self.sync.content_click(node);
                }
            }
            Step::MediaTime { time, at_ms } => {
                self.sync.on_media_time(*time, self.at(*at_ms));
                self.sync.update_caption(*time, &mut self.captions);
            }
            Step::MediaDuration { duration } => {
                self.sync.on_media_duration(*duration, &mut self.media);
            }
            Step::Seek { time } => {
                self.sync.seek(*time, &mut self.media);
            }
            Step::Tick { at_ms } => self.sync.tick(self.at(*at_ms)),
            Step::Destroy => self.sync.destroy(),
        }
        self.sync.pump();
    }

    pub fn report(&self) -> ReplayReport {
        ReplayReport {
            snapshot: self.sync.snapshot(),
            url: self.history.current_query(),
            history: self.history.entries(),
            transcript: self.transcript,
            seeks: self.media.seeks.clone(),
            captions: self.captions.lines.clone(),
            content_writes: self.content.write_count(),
        }
    }
}

/// Run `steps` against `fixture` and report the final state
pub fn replay(fixture: DocumentFixture, options: ReplayOptions, steps: &[Step]) -> Result<ReplayReport> {
    let mut session = ReplaySession::new(fixture, options)?;
    for step in steps {
        session.run(step);
    }
    Ok(session.report())
}
