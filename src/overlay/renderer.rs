//! Interactive structure regions drawn over a page image
//!
//! One `StructureOverlay` exists per displayed page. It owns the per-element
//! hover/active/focus state machine and its hover debounce; it never talks to
//! the content side directly. Pointer and keyboard input come in through the
//! methods below and user-visible changes come out as [`OverlayEvent`]s for the
//! orchestrator to mediate. State pushed from the orchestrator
//! (`set_active`, `set_hovered`) changes visuals only and emits nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::focus::{self, Direction};
use super::transform::{TransformOptions, transform_elements};
use crate::timing::Debouncer;
use crate::types::{BBox, ChunkId, DisplayedDimensions, ElementType, PageStructure, ScaledBox};

/// Default hover debounce window
pub const DEFAULT_HOVER_DEBOUNCE: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayConfig {
    pub transform: TransformOptions,
    pub hover_debounce: Duration,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            transform: TransformOptions::default(),
            hover_debounce: DEFAULT_HOVER_DEBOUNCE,
        }
    }
}

/// Keys the overlay reacts to while it has keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKey {
    Enter,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

/// Notifications for the orchestrator
#[derive(Clone, Debug, PartialEq)]
pub enum OverlayEvent {
    /// Debounced pointer hover settled on this chunk (or on nothing)
    Hovered(Option<ChunkId>),
    /// A region was activated by click, Enter or Space
    Activated { chunk_id: ChunkId, bbox: BBox },
    /// Escape cleared the active region
    Deactivated(ChunkId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RegionState {
    pub hovered: bool,
    pub active: bool,
    pub focused: bool,
}

/// A region ready to be drawn
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayRegion<'a> {
    pub chunk_id: &'a ChunkId,
    pub element_type: ElementType,
    pub rect: ScaledBox,
    pub state: RegionState,
}

pub struct StructureOverlay {
    structure: Arc<PageStructure>,
    config: OverlayConfig,
    display: Option<DisplayedDimensions>,
    image_ready: bool,
    boxes: Vec<ScaledBox>,
    /// Element centres in top-left-origin source space, for focus movement
    centers: Vec<(f64, f64)>,
    order: Vec<usize>,
    hovered: Option<usize>,
    active: Option<usize>,
    focused: Option<usize>,
    hover: Debouncer<Option<usize>>,
    torn_down: bool,
}

impl StructureOverlay {
    pub fn new(structure: Arc<PageStructure>, config: OverlayConfig) -> Self {
        let height = structure.source_dimensions.height;
        let centers: Vec<(f64, f64)> = structure
            .elements
            .iter()
            .map(|e| {
                let (cx, cy) = e.bbox.center();
                (cx, height - cy)
            })
            .collect();
        let order = focus::reading_order(&centers);

        Self {
            structure,
            hover: Debouncer::new(config.hover_debounce),
            config,
            display: None,
            image_ready: true,
            boxes: Vec::new(),
            centers,
            order,
            hovered: None,
            active: None,
            focused: None,
            torn_down: false,
        }
    }

    pub fn page_number(&self) -> usize {
        self.structure.page_number
    }

    pub fn structure(&self) -> &Arc<PageStructure> {
        &self.structure
    }

    pub fn set_display_dimensions(&mut self, dims: DisplayedDimensions) {
        if self.display == Some(dims) {
            return;
        }
        self.display = Some(dims);
        self.recompute();
    }

    /// Page image availability; without an image no region is rendered
    pub fn set_image_ready(&mut self, ready: bool) {
        self.image_ready = ready;
    }

    fn recompute(&mut self) {
        self.boxes = match self.display {
            Some(display) => transform_elements(
                &self.structure.elements,
                self.structure.source_dimensions,
                display,
                &self.config.transform,
            ),
            None => Vec::new(),
        };
    }

    /// Whether any region is currently interactive
    pub fn is_rendered(&self) -> bool {
        !self.torn_down && self.image_ready && !self.boxes.is_empty()
    }

    pub fn regions(&self) -> Vec<OverlayRegion<'_>> {
        if !self.is_rendered() {
            return Vec::new();
        }
        self.structure
            .elements
            .iter()
            .zip(&self.boxes)
            .enumerate()
            .filter(|(_, (_, rect))| !rect.is_empty())
            .map(|(idx, (element, rect))| OverlayRegion {
                chunk_id: &element.chunk_id,
                element_type: element.element_type,
                rect: *rect,
                state: self.state_of(idx),
            })
            .collect()
    }

    fn state_of(&self, idx: usize) -> RegionState {
        RegionState {
            hovered: self.hovered == Some(idx),
            active: self.active == Some(idx),
            focused: self.focused == Some(idx),
        }
    }

    pub fn region_state(&self, chunk_id: &ChunkId) -> Option<RegionState> {
        self.index_of(chunk_id).map(|idx| self.state_of(idx))
    }

    pub fn contains(&self, chunk_id: &ChunkId) -> bool {
        self.index_of(chunk_id).is_some()
    }

    fn index_of(&self, chunk_id: &ChunkId) -> Option<usize> {
        self.structure
            .elements
            .iter()
            .position(|e| &e.chunk_id == chunk_id)
    }

    fn chunk_at(&self, idx: usize) -> Option<&ChunkId> {
        self.structure.elements.get(idx).map(|e| &e.chunk_id)
    }

    pub fn active(&self) -> Option<&ChunkId> {
        self.active.and_then(|i| self.chunk_at(i))
    }

    pub fn hovered(&self) -> Option<&ChunkId> {
        self.hovered.and_then(|i| self.chunk_at(i))
    }

    pub fn focused(&self) -> Option<&ChunkId> {
        self.focused.and_then(|i| self.chunk_at(i))
    }

    /// Smallest rendered region under a display-space point
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&ChunkId> {
        if !self.is_rendered() {
            return None;
        }
        self.boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_empty() && b.contains(x, y))
            .min_by(|a, b| a.1.area().total_cmp(&b.1.area()))
            .and_then(|(idx, _)| self.chunk_at(idx))
    }

    pub fn pointer_enter(&mut self, chunk_id: &ChunkId, now: Instant) {
        if !self.is_rendered() {
            return;
        }
        if let Some(idx) = self.index_of(chunk_id) {
            self.hover.schedule(Some(idx), now);
        }
    }

    pub fn pointer_leave(&mut self, chunk_id: &ChunkId, now: Instant) {
        if !self.is_rendered() {
            return;
        }
        let Some(idx) = self.index_of(chunk_id) else {
            return;
        };
        // A leave only clears the target it belongs to; a late leave from the
        // previous element must not cancel an enter on its neighbour.
        let target = match self.hover.pending() {
            Some(pending) => *pending,
            None => self.hovered,
        };
        if target == Some(idx) {
            self.hover.schedule(None, now);
        }
    }

    /// Release the debounced hover once its window has closed
    pub fn poll(&mut self, now: Instant) -> Option<OverlayEvent> {
        if self.torn_down {
            return None;
        }
        let target = self.hover.poll(now)?;
        self.hovered = target;
        let chunk = target.and_then(|i| self.chunk_at(i)).cloned();
        debug!("Overlay hover settled on {chunk:?}");
        Some(OverlayEvent::Hovered(chunk))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.hover.deadline()
    }

    pub fn click(&mut self, chunk_id: &ChunkId) -> Option<OverlayEvent> {
        if !self.is_rendered() {
            return None;
        }
        match self.index_of(chunk_id) {
            Some(idx) => self.activate(idx),
            None => {
                warn!("Click on unknown overlay region {chunk_id}");
                None
            }
        }
    }

    pub fn key(&mut self, key: OverlayKey) -> Option<OverlayEvent> {
        if !self.is_rendered() {
            return None;
        }
        match key {
            OverlayKey::Enter | OverlayKey::Space => self.focused.and_then(|i| self.activate(i)),
            OverlayKey::Escape => {
                let idx = self.active.take()?;
                self.chunk_at(idx).cloned().map(OverlayEvent::Deactivated)
            }
            OverlayKey::Home => {
                self.focused = self.order.iter().copied().find(|&idx| self.focusable(idx));
                None
            }
            OverlayKey::End => {
                self.focused = self.order.iter().copied().rfind(|&idx| self.focusable(idx));
                None
            }
            OverlayKey::Up => self.move_focus(Direction::Up),
            OverlayKey::Down => self.move_focus(Direction::Down),
            OverlayKey::Left => self.move_focus(Direction::Left),
            OverlayKey::Right => self.move_focus(Direction::Right),
        }
    }

    fn move_focus(&mut self, direction: Direction) -> Option<OverlayEvent> {
        self.focused = match self.focused {
            None => self.order.iter().copied().find(|&idx| self.focusable(idx)),
            Some(current) => {
                focus::nearest_in_direction(&self.centers, current, direction, |idx| {
                    self.focusable(idx)
                })
                .or(Some(current))
            }
        };
        None
    }

    /// Regions with no on-screen extent are not drawn, so focus skips them
    fn focusable(&self, idx: usize) -> bool {
        self.boxes.get(idx).is_some_and(|b| !b.is_empty())
    }

    fn activate(&mut self, idx: usize) -> Option<OverlayEvent> {
        let element = self.structure.elements.get(idx)?;
        self.active = Some(idx);
        self.focused = Some(idx);
        Some(OverlayEvent::Activated {
            chunk_id: element.chunk_id.clone(),
            bbox: element.bbox,
        })
    }

    /// Mirror an activation that originated elsewhere; emits nothing
    pub fn set_active(&mut self, chunk_id: Option<&ChunkId>) {
        self.active = chunk_id.and_then(|id| self.index_of(id));
    }

    /// Mirror a hover that originated elsewhere; emits nothing
    pub fn set_hovered(&mut self, chunk_id: Option<&ChunkId>) {
        self.hovered = chunk_id.and_then(|id| self.index_of(id));
    }

    /// Cancel timers and stop reacting to input
    pub fn teardown(&mut self) {
        self.hover.cancel();
        self.hovered = None;
        self.focused = None;
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl std::fmt::Debug for StructureOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureOverlay")
            .field("page", &self.structure.page_number)
            .field("elements", &self.structure.elements.len())
            .field("display", &self.display)
            .field("hovered", &self.hovered)
            .field("active", &self.active)
            .field("focused", &self.focused)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dimensions, StructureElement};

    const MS: Duration = Duration::from_millis(1);

    fn element(id: &str, left: f64, bottom: f64, right: f64, top: f64) -> StructureElement {
        StructureElement {
            chunk_id: id.into(),
            element_type: ElementType::Text,
            bbox: BBox::new(left, bottom, right, top),
            confidence: None,
        }
    }

    // Page 100x100: "a" top-left, "b" top-right, "c" wide block below
    fn overlay() -> StructureOverlay {
        let structure = PageStructure {
            page_number: 1,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements: vec![
                element("c", 0.0, 10.0, 80.0, 40.0),
                element("b", 60.0, 60.0, 90.0, 90.0),
                element("a", 10.0, 60.0, 40.0, 90.0),
            ],
        };
        let mut o = StructureOverlay::new(Arc::new(structure), OverlayConfig::default());
        o.set_display_dimensions(Dimensions::new(200.0, 200.0));
        o
    }

    fn id(s: &str) -> ChunkId {
        ChunkId::from(s)
    }

    #[test]
    fn regions_are_scaled_and_complete() {
        let o = overlay();
        let regions = o.regions();
        assert_eq!(regions.len(), 3);
        let a = regions.iter().find(|r| r.chunk_id.as_str() == "a").unwrap();
        assert_eq!(a.rect, ScaledBox { x: 20.0, y: 20.0, width: 60.0, height: 60.0 });
    }

    #[test]
    fn no_display_or_no_image_renders_nothing() {
        let structure = Arc::new(PageStructure {
            page_number: 1,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements: vec![element("a", 0.0, 0.0, 10.0, 10.0)],
        });
        let mut o = StructureOverlay::new(structure, OverlayConfig::default());
        assert!(o.regions().is_empty());

        o.set_display_dimensions(Dimensions::new(0.0, 0.0));
        assert!(o.regions().is_empty());

        o.set_display_dimensions(Dimensions::new(50.0, 50.0));
        assert_eq!(o.regions().len(), 1);

        o.set_image_ready(false);
        assert!(o.regions().is_empty());
        assert_eq!(o.click(&id("a")), None);
    }

    #[test]
    fn activation_is_exclusive() {
        let mut o = overlay();
        let first = o.click(&id("a"));
        assert!(matches!(first, Some(OverlayEvent::Activated { ref chunk_id, .. }) if chunk_id.as_str() == "a"));

        o.click(&id("b"));
        let active: Vec<_> = o
            .regions()
            .into_iter()
            .filter(|r| r.state.active)
            .map(|r| r.chunk_id.clone())
            .collect();
        assert_eq!(active, vec![id("b")]);
        assert!(!o.region_state(&id("a")).unwrap().active);
    }

    #[test]
    fn activation_carries_source_bbox() {
        let mut o = overlay();
        assert_eq!(
            o.click(&id("c")),
            Some(OverlayEvent::Activated {
                chunk_id: id("c"),
                bbox: BBox::new(0.0, 10.0, 80.0, 40.0),
            })
        );
    }

    #[test]
    fn rapid_toggles_yield_one_hover_with_final_target() {
        let mut o = overlay();
        let t0 = Instant::now();

        for i in 0..5u32 {
            let target = if i % 2 == 0 { id("a") } else { id("b") };
            o.pointer_enter(&target, t0 + (2 * i) * MS);
            o.pointer_leave(&target, t0 + (2 * i + 1) * MS);
        }
        o.pointer_enter(&id("b"), t0 + 10 * MS);

        let mut events = Vec::new();
        for step in 0..=100u32 {
            if let Some(e) = o.poll(t0 + step * MS) {
                events.push(e);
            }
        }
        assert_eq!(events, vec![OverlayEvent::Hovered(Some(id("b")))]);
        assert!(o.region_state(&id("b")).unwrap().hovered);
    }

    #[test]
    fn hover_waits_for_debounce_window() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.pointer_enter(&id("a"), t0);
        assert_eq!(o.poll(t0 + 49 * MS), None);
        assert_eq!(o.poll(t0 + 50 * MS), Some(OverlayEvent::Hovered(Some(id("a")))));

        o.pointer_leave(&id("a"), t0 + 100 * MS);
        assert_eq!(o.poll(t0 + 160 * MS), Some(OverlayEvent::Hovered(None)));
        assert!(o.hovered().is_none());
    }

    #[test]
    fn late_leave_from_previous_element_is_ignored() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.pointer_enter(&id("a"), t0);
        o.pointer_enter(&id("b"), t0 + MS);
        o.pointer_leave(&id("a"), t0 + 2 * MS);
        assert_eq!(o.poll(t0 + 100 * MS), Some(OverlayEvent::Hovered(Some(id("b")))));
    }

    #[test]
    fn keyboard_moves_in_reading_order_and_activates() {
        let mut o = overlay();

        o.key(OverlayKey::Home);
        assert_eq!(o.focused(), Some(&id("a")));
        o.key(OverlayKey::Right);
        assert_eq!(o.focused(), Some(&id("b")));
        o.key(OverlayKey::Down);
        assert_eq!(o.focused(), Some(&id("c")));
        o.key(OverlayKey::End);
        assert_eq!(o.focused(), Some(&id("c")));
        o.key(OverlayKey::Up);
        assert_eq!(o.focused(), Some(&id("a")));

        let ev = o.key(OverlayKey::Enter);
        assert!(matches!(ev, Some(OverlayEvent::Activated { .. })));
        assert_eq!(o.active(), Some(&id("a")));

        assert_eq!(o.key(OverlayKey::Escape), Some(OverlayEvent::Deactivated(id("a"))));
        assert_eq!(o.active(), None);
        assert_eq!(o.key(OverlayKey::Escape), None);
    }

    #[test]
    fn focus_skips_regions_with_no_extent() {
        // "z" is a zero-width sliver above and just right of "a"
        let structure = PageStructure {
            page_number: 1,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements: vec![
                element("a", 10.0, 60.0, 40.0, 90.0),
                element("b", 60.0, 60.0, 90.0, 90.0),
                element("z", 50.0, 80.0, 50.0, 80.0),
            ],
        };
        let config = OverlayConfig {
            transform: TransformOptions {
                enforce_minimum: false,
                ..TransformOptions::default()
            },
            ..OverlayConfig::default()
        };
        let mut o = StructureOverlay::new(Arc::new(structure), config);
        o.set_display_dimensions(Dimensions::new(200.0, 200.0));
        assert_eq!(o.regions().len(), 2);

        o.key(OverlayKey::Home);
        assert_eq!(o.focused(), Some(&id("a")));
        o.key(OverlayKey::Right);
        assert_eq!(o.focused(), Some(&id("b")));
        o.key(OverlayKey::Left);
        assert_eq!(o.focused(), Some(&id("a")));
        o.key(OverlayKey::Up);
        assert_eq!(o.focused(), Some(&id("a")));
    }

    #[test]
    fn first_arrow_focuses_first_region() {
        let mut o = overlay();
        assert_eq!(o.key(OverlayKey::Down), None);
        assert_eq!(o.focused(), Some(&id("a")));
    }

    #[test]
    fn pushed_state_emits_nothing() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.set_active(Some(&id("c")));
        o.set_hovered(Some(&id("b")));
        assert_eq!(o.poll(t0 + 500 * MS), None);
        assert_eq!(o.active(), Some(&id("c")));
        assert_eq!(o.hovered(), Some(&id("b")));
    }

    #[test]
    fn hit_test_prefers_smallest_region() {
        let structure = Arc::new(PageStructure {
            page_number: 1,
            source_dimensions: Dimensions::new(100.0, 100.0),
            elements: vec![
                element("outer", 0.0, 0.0, 100.0, 100.0),
                element("inner", 40.0, 40.0, 60.0, 60.0),
            ],
        });
        let mut o = StructureOverlay::new(structure, OverlayConfig::default());
        o.set_display_dimensions(Dimensions::new(100.0, 100.0));
        assert_eq!(o.hit_test(50.0, 50.0), Some(&id("inner")));
        assert_eq!(o.hit_test(5.0, 5.0), Some(&id("outer")));
        assert_eq!(o.hit_test(500.0, 5.0), None);
    }

    #[test]
    fn teardown_cancels_pending_hover() {
        let mut o = overlay();
        let t0 = Instant::now();
        o.pointer_enter(&id("a"), t0);
        o.teardown();
        assert_eq!(o.poll(t0 + 100 * MS), None);
        assert!(o.regions().is_empty());
    }
}
