//! The mediator for one document view
//!
//! The orchestrator owns the overlay for the live page, the text-content
//! highlighter, the transcript engine, the structure cache and the navigation
//! state. Surfaces never talk to each other; each input is turned into a
//! command on the shared [`HighlightState`] and the resulting effects are
//! pushed to the other surfaces.
//!
//! Fetches are fire-and-forget: requests go to the [`DocumentBackend`] tagged
//! with a [`RequestId`], replies are drained in [`NavigationOrchestrator::pump`],
//! and a structure reply only becomes an overlay when its page is still the
//! live page.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use log::{debug, info, warn};
use serde::Serialize;

use super::cache::{CachedStructure, StructureCache};
use super::history::HistoryHost;
use super::request::{FetchKind, FetchRequest, FetchResponse, RequestId};
use super::state::{HighlightCommand, HighlightEffect, HighlightState, Origin};
use super::url_state::{self, NavigationState};
use crate::backend::DocumentBackend;
use crate::content::{
    ChunkHighlighter, ContentEvent, ContentHost, DEFAULT_CHUNK_ATTRIBUTE, HoverSubscription, NodeId,
};
use crate::error::{FetchError, SyncError};
use crate::overlay::{
    DimensionTracker, OverlayConfig, OverlayEvent, OverlayKey, RenderSurface, StructureOverlay,
    TransformOptions,
};
use crate::settings::Settings;
use crate::temporal::{
    CaptionSink, ChunkChange, Cue, DEFAULT_SYNC_THROTTLE, MediaTarget, SeekOutcome,
    TemporalSyncEngine, TranscriptOrigin, select_transcript,
};
use crate::types::{ChunkId, ChunkLocation, DisplayedDimensions, ElementType, PageStructure, ScaledBox};

/// Engine configuration, usually built from [`Settings`]
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    pub overlay: OverlayConfig,
    pub sync_throttle: Duration,
    pub cache_pages: usize,
    pub chunk_attribute: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            overlay: OverlayConfig::default(),
            sync_throttle: DEFAULT_SYNC_THROTTLE,
            cache_pages: super::cache::DEFAULT_CACHE_PAGES,
            chunk_attribute: DEFAULT_CHUNK_ATTRIBUTE.to_string(),
        }
    }
}

impl SyncConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            overlay: OverlayConfig {
                transform: TransformOptions {
                    min_size: settings.min_box_size,
                    enforce_minimum: settings.enforce_minimum,
                    clamp_to_bounds: settings.clamp_to_bounds,
                },
                hover_debounce: Duration::from_millis(settings.hover_debounce_ms),
            },
            sync_throttle: Duration::from_millis(settings.sync_throttle_ms),
            cache_pages: settings.structure_cache_pages,
            chunk_attribute: settings.chunk_attribute.clone(),
        }
    }
}

/// State of the overlay for the live page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayStatus {
    /// Nothing requested yet
    Idle,
    /// Waiting for the structure fetch
    Loading,
    Ready,
    /// No structure for this page; the overlay is off until the page changes
    Unavailable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChunkIntent {
    /// Chunk named in the URL at start-up
    DeepLink,
    /// User asked to open a chunk
    Open,
}

#[derive(Debug)]
enum PendingRequest {
    Structure {
        page: usize,
    },
    ChunkLookup {
        chunk_id: ChunkId,
        intent: ChunkIntent,
        /// Navigation generation the lookup belongs to
        epoch: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    /// Pager action: push, drop `chunk`
    Pager,
    /// Chunk-driven: keep `chunk`, push or replace
    Chunk { push: bool },
    /// Back/forward: never writes history
    History,
    /// Start-up: canonicalize the URL in place
    Restore,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UrlWrite {
    Push,
    Replace,
}

/// One overlay region in a [`SyncSnapshot`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RegionSnapshot {
    pub chunk_id: ChunkId,
    pub element_type: ElementType,
    pub rect: ScaledBox,
    pub hovered: bool,
    pub active: bool,
    pub focused: bool,
}

/// Serializable view of everything observable about the orchestrator
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncSnapshot {
    pub document_id: String,
    pub total_pages: usize,
    pub navigation: NavigationState,
    pub highlight: HighlightState,
    pub overlay_status: OverlayStatus,
    pub regions: Vec<RegionSnapshot>,
    pub display: Option<DisplayedDimensions>,
    pub content_active: Option<ChunkId>,
    pub content_hovered: Option<ChunkId>,
    pub transcript_chunk: Option<ChunkId>,
    pub cached_pages: Vec<usize>,
    pub pending_requests: usize,
    pub destroyed: bool,
}

pub struct NavigationOrchestrator {
    config: SyncConfig,
    document_id: String,
    total_pages: usize,
    backend: Box<dyn DocumentBackend>,
    history: Box<dyn HistoryHost>,
    highlighter: ChunkHighlighter,
    tracker: DimensionTracker,
    display: Option<DisplayedDimensions>,
    image_ready: bool,
    overlay: Option<StructureOverlay>,
    overlay_status: OverlayStatus,
    /// Region under the pointer when driven through `overlay_pointer_at`
    pointer_region: Option<ChunkId>,
    temporal: TemporalSyncEngine,
    cache: StructureCache,
    nav: NavigationState,
    highlight: HighlightState,
    reply_tx: Sender<FetchResponse>,
    reply_rx: Receiver<FetchResponse>,
    pending: HashMap<RequestId, PendingRequest>,
    next_request_id: u64,
    epoch: u64,
    initialized: bool,
    destroyed: bool,
}

impl NavigationOrchestrator {
    /// Wire up a view. Fails if the document has no pages or the content
    /// container is missing.
    pub fn new(
        document_id: impl Into<String>,
        total_pages: usize,
        config: SyncConfig,
        backend: Box<dyn DocumentBackend>,
        history: Box<dyn HistoryHost>,
        content: Box<dyn ContentHost>,
    ) -> Result<Self, SyncError> {
        let document_id = document_id.into();
        if total_pages == 0 {
            return Err(SyncError::wiring(format!(
                "document {document_id} has no pages"
            )));
        }
        let highlighter = ChunkHighlighter::new(content, config.chunk_attribute.clone())?;
        let (reply_tx, reply_rx) = flume::unbounded();

        Ok(Self {
            cache: StructureCache::new(config.cache_pages),
            temporal: TemporalSyncEngine::with_throttle(Vec::new(), config.sync_throttle),
            config,
            document_id,
            total_pages,
            backend,
            history,
            highlighter,
            tracker: DimensionTracker::new(),
            display: None,
            image_ready: true,
            overlay: None,
            overlay_status: OverlayStatus::Idle,
            pointer_region: None,
            nav: NavigationState::new(1),
            highlight: HighlightState::default(),
            reply_tx,
            reply_rx,
            pending: HashMap::new(),
            next_request_id: 0,
            epoch: 0,
            initialized: false,
            destroyed: false,
        })
    }

    // ---- accessors ----

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page(&self) -> usize {
        self.nav.page
    }

    pub fn chunk_id(&self) -> Option<&ChunkId> {
        self.nav.chunk_id.as_ref()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.nav
    }

    pub fn highlight(&self) -> &HighlightState {
        &self.highlight
    }

    pub fn overlay(&self) -> Option<&StructureOverlay> {
        self.overlay.as_ref()
    }

    pub fn overlay_status(&self) -> OverlayStatus {
        self.overlay_status
    }

    pub fn content(&self) -> &ChunkHighlighter {
        &self.highlighter
    }

    pub fn temporal(&self) -> &TemporalSyncEngine {
        &self.temporal
    }

    pub fn display_dimensions(&self) -> Option<DisplayedDimensions> {
        self.display
    }

    pub fn cached_pages(&self) -> Vec<usize> {
        let mut pages = self.cache.pages();
        pages.sort_unstable();
        pages
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Earliest instant at which `tick` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.destroyed {
            return None;
        }
        let hover = self.overlay.as_ref().and_then(StructureOverlay::next_deadline);
        let playback = self.temporal.next_deadline();
        match (hover, playback) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---- lifecycle ----

    /// Restore navigation state from the URL. A chunk in the URL is looked up
    /// and, once resolved, decides the page and the highlight.
    pub fn init(&mut self) {
        if self.destroyed || self.initialized {
            return;
        }
        self.initialized = true;

        let query = url_state::parse_query(&self.history.current_query());
        let page = query.page.map_or(1, |p| self.clamp_page(p));
        info!(
            "Opening document {} at page {page}{}",
            self.document_id,
            query
                .chunk_id
                .as_ref()
                .map(|c| format!(", chunk {c}"))
                .unwrap_or_default()
        );

        self.nav = NavigationState {
            page,
            chunk_id: query.chunk_id.clone(),
        };
        self.navigate(page, Transition::Restore);

        if let Some(chunk_id) = query.chunk_id {
            self.request_chunk(chunk_id, ChunkIntent::DeepLink);
        }
    }

    /// Replace the document being viewed. Cached structure and in-flight
    /// requests for the old document are dropped.
    pub fn switch_document(
        &mut self,
        document_id: impl Into<String>,
        total_pages: usize,
    ) -> Result<(), SyncError> {
        if self.destroyed {
            return Ok(());
        }
        let document_id = document_id.into();
        if total_pages == 0 {
            return Err(SyncError::wiring(format!(
                "document {document_id} has no pages"
            )));
        }
        info!("Switching to document {document_id} ({total_pages} pages)");

        self.begin_intent();
        self.teardown_overlay();
        self.cache.invalidate_all();
        self.pending.clear();
        self.dispatch(HighlightCommand::Deactivate {
            origin: Origin::Navigation,
        });
        self.dispatch(HighlightCommand::Hover {
            origin: Origin::Navigation,
            chunk_id: None,
        });
        self.temporal.teardown();
        self.temporal = TemporalSyncEngine::with_throttle(Vec::new(), self.config.sync_throttle);

        self.document_id = document_id;
        self.total_pages = total_pages;
        self.initialized = true;
        self.nav = NavigationState::new(1);
        self.navigate(1, Transition::Pager);
        Ok(())
    }

    /// Release everything. Every later call is a no-op.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        info!("Destroying view of document {}", self.document_id);
        self.destroyed = true;
        self.teardown_overlay();
        self.tracker.detach();
        self.highlighter.detach();
        self.temporal.teardown();
        self.cache.invalidate_all();
        self.pending.clear();
        let dropped = self.reply_rx.drain().count();
        if dropped > 0 {
            debug!("Dropped {dropped} undelivered fetch replies");
        }
    }

    // ---- navigation ----

    /// Pager navigation. Pushes a history entry and drops `chunk` from the URL.
    pub fn go_to_page(&mut self, page: usize) {
        if self.destroyed {
            return;
        }
        let page = self.clamp_page(page);
        if page == self.nav.page && self.overlay_status != OverlayStatus::Idle {
            return;
        }
        self.begin_intent();
        self.nav.chunk_id = None;
        self.navigate(page, Transition::Pager);
    }

    pub fn next_page(&mut self) {
        if self.nav.page < self.total_pages {
            self.go_to_page(self.nav.page + 1);
        }
    }

    pub fn prev_page(&mut self) {
        if self.nav.page > 1 {
            self.go_to_page(self.nav.page - 1);
        }
    }

    /// User-driven chunk open: look up its page, go there (pushing history),
    /// then highlight and scroll to it.
    pub fn open_chunk(&mut self, chunk_id: &ChunkId) {
        if self.destroyed {
            return;
        }
        self.begin_intent();
        self.request_chunk(chunk_id.clone(), ChunkIntent::Open);
    }

    /// Back/forward landed on `query`. Never writes history.
    pub fn on_history_pop(&mut self, query: &str) {
        if self.destroyed {
            return;
        }
        self.begin_intent();
        let parsed = url_state::parse_query(query);
        let page = parsed.page.map_or(1, |p| self.clamp_page(p));
        debug!("History pop to page {page}");

        self.nav.chunk_id = parsed.chunk_id.clone();
        self.navigate(page, Transition::History);
        if let Some(chunk_id) = parsed.chunk_id {
            self.dispatch(HighlightCommand::Activate {
                origin: Origin::DeepLink,
                chunk_id,
            });
        }
    }

    fn begin_intent(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn clamp_page(&self, page: usize) -> usize {
        if page == 0 {
            warn!("{}, using 1", SyncError::invalid("page 0"));
            1
        } else if page > self.total_pages {
            warn!(
                "Page {page} is past the end of document {} ({} pages)",
                self.document_id, self.total_pages
            );
            self.total_pages
        } else {
            page
        }
    }

    fn navigate(&mut self, page: usize, transition: Transition) {
        let page_changed = page != self.nav.page || self.overlay_status == OverlayStatus::Idle;
        if page_changed {
            self.teardown_overlay();
            self.dispatch(HighlightCommand::Hover {
                origin: Origin::Navigation,
                chunk_id: None,
            });
            self.nav.page = page;
            self.load_structure(page);
        }

        match transition {
            Transition::Pager => {
                self.nav.chunk_id = None;
                self.write_url(UrlWrite::Push);
            }
            Transition::Chunk { push: true } => self.write_url(UrlWrite::Push),
            Transition::Chunk { push: false } | Transition::Restore => {
                self.write_url(UrlWrite::Replace)
            }
            Transition::History => {}
        }
    }

    fn write_url(&mut self, mode: UrlWrite) {
        let current = self.history.current_query();
        let query = url_state::update_query(&current, &self.nav);
        if query == current {
            return;
        }
        match mode {
            UrlWrite::Push => self.history.push_state(&query),
            UrlWrite::Replace => self.history.replace_state(&query),
        }
    }

    fn teardown_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            debug!("Tearing down overlay for page {}", overlay.page_number());
            overlay.teardown();
        }
        self.pointer_region = None;
        self.overlay_status = OverlayStatus::Idle;
    }

    fn load_structure(&mut self, page: usize) {
        if let Some(entry) = self.cache.get(page) {
            self.install_overlay(page, entry);
            return;
        }
        self.overlay_status = OverlayStatus::Loading;
        let in_flight = self
            .pending
            .values()
            .any(|p| matches!(p, PendingRequest::Structure { page: q } if *q == page));
        if !in_flight {
            self.submit(FetchKind::Structure { page }, PendingRequest::Structure { page });
        }
    }

    fn install_overlay(&mut self, page: usize, entry: CachedStructure) {
        let structure = match entry {
            CachedStructure::Present(s) if !s.is_empty() => s,
            _ => {
                warn!("{}, overlay disabled", SyncError::MissingStructure { page });
                self.overlay_status = OverlayStatus::Unavailable;
                return;
            }
        };
        let mut overlay = StructureOverlay::new(structure, self.config.overlay);
        if let Some(dims) = self.display {
            overlay.set_display_dimensions(dims);
        }
        overlay.set_image_ready(self.image_ready);
        overlay.set_active(self.highlight.active.as_ref());
        overlay.set_hovered(self.highlight.hovered.as_ref());
        debug!("Overlay ready for page {page}");
        self.overlay = Some(overlay);
        self.overlay_status = OverlayStatus::Ready;
    }

    // ---- fetches ----

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }

    fn submit(&mut self, kind: FetchKind, pending: PendingRequest) -> RequestId {
        let id = self.next_id();
        self.pending.insert(id, pending);
        let request = FetchRequest {
            id,
            document_id: self.document_id.clone(),
            kind,
        };
        self.backend.submit(request, self.reply_tx.clone());
        id
    }

    fn request_chunk(&mut self, chunk_id: ChunkId, intent: ChunkIntent) {
        let epoch = self.epoch;
        self.submit(
            FetchKind::ChunkLookup {
                chunk_id: chunk_id.clone(),
            },
            PendingRequest::ChunkLookup {
                chunk_id,
                intent,
                epoch,
            },
        );
    }

    /// Handle every fetch reply that has arrived. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while !self.destroyed {
            let Ok(response) = self.reply_rx.try_recv() else {
                break;
            };
            handled += 1;
            self.handle_response(response);
        }
        handled
    }

    fn handle_response(&mut self, response: FetchResponse) {
        let Some(pending) = self.pending.remove(&response.id()) else {
            debug!("Dropping reply to retired request {:?}", response.id());
            return;
        };
        match (pending, response) {
            (PendingRequest::Structure { page }, FetchResponse::Structure { result, .. }) => {
                self.on_structure(page, result)
            }
            (
                PendingRequest::ChunkLookup {
                    chunk_id,
                    intent,
                    epoch,
                },
                FetchResponse::ChunkLookup { result, .. },
            ) => self.on_chunk_located(chunk_id, intent, epoch, result),
            (pending, response) => {
                warn!("Reply {:?} does not match request {pending:?}", response.id())
            }
        }
    }

    fn on_structure(&mut self, page: usize, result: Result<Option<PageStructure>, FetchError>) {
        let entry = match result {
            Ok(structure) => Some(self.cache.insert(page, structure)),
            Err(e) => {
                warn!("Structure fetch for page {page} failed: {e}");
                None
            }
        };
        if page != self.nav.page || self.overlay_status != OverlayStatus::Loading {
            debug!(
                "Discarding structure for page {page}, live page is {}",
                self.nav.page
            );
            return;
        }
        match entry {
            Some(entry) => self.install_overlay(page, entry),
            None => self.overlay_status = OverlayStatus::Unavailable,
        }
    }

    fn on_chunk_located(
        &mut self,
        chunk_id: ChunkId,
        intent: ChunkIntent,
        epoch: u64,
        result: Result<Option<ChunkLocation>, FetchError>,
    ) {
        if epoch != self.epoch {
            debug!("Discarding lookup for chunk {chunk_id}, navigation moved on");
            return;
        }
        let location = match result {
            Ok(Some(location)) if (1..=self.total_pages).contains(&location.page) => location,
            Ok(Some(location)) => {
                warn!(
                    "Chunk {chunk_id} reported on page {} outside 1..={}",
                    location.page, self.total_pages
                );
                self.on_chunk_missing(intent);
                return;
            }
            Ok(None) => {
                warn!(
                    "{} in document {}",
                    SyncError::ChunkNotFound(chunk_id),
                    self.document_id
                );
                self.on_chunk_missing(intent);
                return;
            }
            Err(e) => {
                warn!("Lookup of chunk {chunk_id} failed: {e}");
                self.on_chunk_missing(intent);
                return;
            }
        };

        self.nav.chunk_id = Some(chunk_id.clone());
        let (transition, origin) = match intent {
            ChunkIntent::DeepLink => (Transition::Chunk { push: false }, Origin::DeepLink),
            ChunkIntent::Open => (Transition::Chunk { push: true }, Origin::Navigation),
        };
        self.navigate(location.page, transition);
        self.dispatch(HighlightCommand::Activate { origin, chunk_id });
    }

    fn on_chunk_missing(&mut self, intent: ChunkIntent) {
        if intent == ChunkIntent::DeepLink && self.nav.chunk_id.take().is_some() {
            self.write_url(UrlWrite::Replace);
        }
    }

    // ---- mediation ----

    fn dispatch(&mut self, cmd: HighlightCommand) {
        for effect in self.highlight.apply(cmd) {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: HighlightEffect) {
        match effect {
            HighlightEffect::OverlayHover(id) => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.set_hovered(id.as_ref());
                }
            }
            HighlightEffect::OverlayActive(id) => {
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.set_active(id.as_ref());
                }
            }
            HighlightEffect::ContentHover(id) => self.highlighter.set_hovered(id.as_ref()),
            HighlightEffect::ContentActive(id) => self.highlighter.set_active(id.as_ref()),
            HighlightEffect::ContentScroll(id) => {
                self.highlighter.scroll_to_chunk(&id);
            }
            HighlightEffect::ReplaceChunkInUrl(id) => {
                self.nav.chunk_id = id;
                self.write_url(UrlWrite::Replace);
            }
        }
    }

    fn route_overlay(&mut self, event: Option<OverlayEvent>) {
        let Some(event) = event else {
            return;
        };
        let cmd = match event {
            OverlayEvent::Hovered(chunk_id) => HighlightCommand::Hover {
                origin: Origin::Overlay,
                chunk_id,
            },
            OverlayEvent::Activated { chunk_id, bbox } => {
                debug!("Overlay activated {chunk_id} at {bbox:?}");
                HighlightCommand::Activate {
                    origin: Origin::Overlay,
                    chunk_id,
                }
            }
            OverlayEvent::Deactivated(_) => HighlightCommand::Deactivate {
                origin: Origin::Overlay,
            },
        };
        self.dispatch(cmd);
    }

    fn route_content(&mut self, event: Option<ContentEvent>) {
        let cmd = match event {
            Some(ContentEvent::Hovered(chunk_id)) => HighlightCommand::Hover {
                origin: Origin::Content,
                chunk_id,
            },
            Some(ContentEvent::Activated(chunk_id)) => HighlightCommand::Activate {
                origin: Origin::Content,
                chunk_id,
            },
            None => return,
        };
        self.dispatch(cmd);
    }

    fn route_temporal(&mut self, change: Option<ChunkChange>) {
        let cmd = match change {
            Some(ChunkChange {
                chunk_id: Some(chunk_id),
            }) => HighlightCommand::Activate {
                origin: Origin::Temporal,
                chunk_id,
            },
            Some(ChunkChange { chunk_id: None }) => HighlightCommand::Deactivate {
                origin: Origin::Temporal,
            },
            None => return,
        };
        self.dispatch(cmd);
    }

    /// Fire due timers: the overlay hover debounce and the trailing transcript
    /// notification.
    pub fn tick(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        let event = self.overlay.as_mut().and_then(|o| o.poll(now));
        self.route_overlay(event);
        let change = self.temporal.poll(now);
        self.route_temporal(change);
    }

    // ---- overlay input ----

    pub fn overlay_pointer_enter(&mut self, chunk_id: &ChunkId, now: Instant) {
        if self.destroyed {
            return;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.pointer_enter(chunk_id, now);
        }
    }

    pub fn overlay_pointer_leave(&mut self, chunk_id: &ChunkId, now: Instant) {
        if self.destroyed {
            return;
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.pointer_leave(chunk_id, now);
        }
    }

    /// Pointer moved to a display point; enter/leave are derived from hit
    /// testing for shells without per-region listeners.
    pub fn overlay_pointer_at(&mut self, x: f64, y: f64, now: Instant) {
        if self.destroyed {
            return;
        }
        let Some(overlay) = self.overlay.as_mut() else {
            return;
        };
        let target = overlay.hit_test(x, y).cloned();
        if target == self.pointer_region {
            return;
        }
        if let Some(old) = self.pointer_region.take() {
            overlay.pointer_leave(&old, now);
        }
        if let Some(new) = &target {
            overlay.pointer_enter(new, now);
        }
        self.pointer_region = target;
    }

    pub fn overlay_click(&mut self, chunk_id: &ChunkId) {
        if self.destroyed {
            return;
        }
        let event = self.overlay.as_mut().and_then(|o| o.click(chunk_id));
        self.route_overlay(event);
    }

    pub fn overlay_key(&mut self, key: OverlayKey) {
        if self.destroyed {
            return;
        }
        let event = self.overlay.as_mut().and_then(|o| o.key(key));
        self.route_overlay(event);
    }

    // ---- content input ----

    pub fn content_pointer_enter(&mut self, target: NodeId) {
        if self.destroyed {
            return;
        }
        let event = self.highlighter.on_pointer_enter(target);
        self.route_content(event);
    }

    pub fn content_pointer_leave(&mut self, target: NodeId, related: Option<NodeId>) {
        if self.destroyed {
            return;
        }
        let event = self.highlighter.on_pointer_leave(target, related);
        self.route_content(event);
    }

    pub fn content_click(&mut self, target: NodeId) {
        if self.destroyed {
            return;
        }
        let event = self.highlighter.on_click(target);
        self.route_content(event);
    }

    pub fn subscribe_content_hover<F>(&mut self, callback: F) -> Option<HoverSubscription>
    where
        F: FnMut(Option<&ChunkId>) + 'static,
    {
        if self.destroyed {
            return None;
        }
        Some(self.highlighter.subscribe_hover(callback))
    }

    // ---- rendering surface ----

    pub fn attach_surface(&mut self, surface: &dyn RenderSurface) {
        if self.destroyed {
            return;
        }
        let dims = self.tracker.attach(surface);
        self.apply_dimensions(dims);
    }

    /// Native resize observation fired. Returns true when the shell should
    /// request an animation frame.
    pub fn on_surface_resized(&mut self, dims: DisplayedDimensions) -> bool {
        if self.destroyed {
            return false;
        }
        self.tracker.on_resize_observed(dims)
    }

    pub fn on_window_resize(&mut self, surface: &dyn RenderSurface) -> bool {
        if self.destroyed {
            return false;
        }
        self.tracker.on_window_resize(surface)
    }

    pub fn on_animation_frame(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(dims) = self.tracker.on_animation_frame() {
            self.apply_dimensions(dims);
        }
    }

    /// Whether the page image is currently shown
    pub fn set_page_image_ready(&mut self, ready: bool) {
        if self.destroyed {
            return;
        }
        self.image_ready = ready;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_image_ready(ready);
        }
    }

    fn apply_dimensions(&mut self, dims: DisplayedDimensions) {
        self.display = Some(dims);
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_display_dimensions(dims);
        }
    }

    // ---- media ----

    /// Pick the transcript for the current document (cues preferred over text
    /// markers) and start following it.
    pub fn load_transcript(&mut self, cues: Option<&[Cue]>, markers: Option<&str>) -> TranscriptOrigin {
        if self.destroyed {
            return TranscriptOrigin::None;
        }
        let (origin, chunks) = select_transcript(cues, markers);
        info!(
            "Loaded {} transcript chunks from {origin:?} for document {}",
            chunks.len(),
            self.document_id
        );
        self.temporal.set_transcript(chunks);
        origin
    }

    pub fn on_media_time(&mut self, time: f64, now: Instant) {
        if self.destroyed {
            return;
        }
        let change = self.temporal.on_time_update(time, now);
        self.route_temporal(change);
    }

    pub fn update_caption(&mut self, time: f64, sink: &mut dyn CaptionSink) -> bool {
        if self.destroyed {
            return false;
        }
        self.temporal.update_caption(time, sink)
    }

    pub fn seek(&mut self, time: f64, media: &mut dyn MediaTarget) -> SeekOutcome {
        if self.destroyed {
            return SeekOutcome::Ignored;
        }
        self.temporal.seek(time, media)
    }

    pub fn on_media_duration(&mut self, duration: f64, media: &mut dyn MediaTarget) -> Option<SeekOutcome> {
        if self.destroyed {
            return None;
        }
        self.temporal.on_duration_known(duration, media)
    }

    // ---- observation ----

    pub fn snapshot(&self) -> SyncSnapshot {
        let regions = self
            .overlay
            .as_ref()
            .map(|overlay| {
                overlay
                    .regions()
                    .into_iter()
                    .map(|r| RegionSnapshot {
                        chunk_id: r.chunk_id.clone(),
                        element_type: r.element_type,
                        rect: r.rect,
                        hovered: r.state.hovered,
                        active: r.state.active,
                        focused: r.state.focused,
                    })
                    .collect()
            })
            .unwrap_or_default();

        SyncSnapshot {
            document_id: self.document_id.clone(),
            total_pages: self.total_pages,
            navigation: self.nav.clone(),
            highlight: self.highlight.clone(),
            overlay_status: self.overlay_status,
            regions,
            display: self.display,
            content_active: self.highlighter.active().cloned(),
            content_hovered: self.highlighter.hovered().cloned(),
            transcript_chunk: self.temporal.current().cloned(),
            cached_pages: self.cached_pages(),
            pending_requests: self.pending.len(),
            destroyed: self.destroyed,
        }
    }
}

impl std::fmt::Debug for NavigationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationOrchestrator")
            .field("document_id", &self.document_id)
            .field("nav", &self.nav)
            .field("highlight", &self.highlight)
            .field("overlay_status", &self.overlay_status)
            .field("pending", &self.pending.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
