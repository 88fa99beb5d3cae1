//! Responsive tracking of the rendered page surface size

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

use crate::timing::FrameCoalescer;
use crate::types::DisplayedDimensions;

/// The element the page image is drawn into
pub trait RenderSurface {
    /// Current laid-out size; zero when nothing is rendered yet
    fn measure(&self) -> DisplayedDimensions;

    /// Whether the host can deliver per-element resize notifications
    fn supports_resize_observer(&self) -> bool;
}

/// How size changes reach the tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationMode {
    /// Native per-element resize observer
    ResizeObserver,
    /// Window resize events followed by re-measuring the surface
    WindowResize,
}

/// A surface whose size is set by hand, for replays and tests
#[derive(Debug)]
pub struct FixedSurface {
    size: Cell<DisplayedDimensions>,
    observer: bool,
}

impl FixedSurface {
    pub fn new(size: DisplayedDimensions, observer: bool) -> Self {
        Self {
            size: Cell::new(size),
            observer,
        }
    }

    pub fn resize(&self, size: DisplayedDimensions) {
        self.size.set(size);
    }
}

impl RenderSurface for FixedSurface {
    fn measure(&self) -> DisplayedDimensions {
        self.size.get()
    }

    fn supports_resize_observer(&self) -> bool {
        self.observer
    }
}

static FALLBACK_LOGGED: AtomicBool = AtomicBool::new(false);

/// Produces a stream of displayed dimensions, at most one per repaint frame.
#[derive(Debug, Default)]
pub struct DimensionTracker {
    mode: Option<ObservationMode>,
    frame: FrameCoalescer<DisplayedDimensions>,
    last_emitted: Option<DisplayedDimensions>,
}

impl DimensionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `surface`, returning the immediate measurement so the
    /// first overlay paint is already scaled.
    pub fn attach(&mut self, surface: &dyn RenderSurface) -> DisplayedDimensions {
        let mode = if surface.supports_resize_observer() {
            ObservationMode::ResizeObserver
        } else {
            if !FALLBACK_LOGGED.swap(true, Ordering::Relaxed) {
                warn!("Resize observation unavailable, falling back to window resize polling");
            }
            ObservationMode::WindowResize
        };
        self.mode = Some(mode);
        self.frame.cancel();

        let dims = surface.measure();
        debug!(
            "Dimension tracker attached ({mode:?}): {}x{}",
            dims.width, dims.height
        );
        self.last_emitted = Some(dims);
        dims
    }

    pub fn mode(&self) -> Option<ObservationMode> {
        self.mode
    }

    pub fn is_attached(&self) -> bool {
        self.mode.is_some()
    }

    /// Native observer callback. Returns true if a frame should be requested.
    pub fn on_resize_observed(&mut self, dims: DisplayedDimensions) -> bool {
        if self.mode != Some(ObservationMode::ResizeObserver) {
            return false;
        }
        self.frame.push(dims)
    }

    /// Window resize callback for the fallback path. Returns true if a frame
    /// should be requested.
    pub fn on_window_resize(&mut self, surface: &dyn RenderSurface) -> bool {
        if self.mode != Some(ObservationMode::WindowResize) {
            return false;
        }
        self.frame.push(surface.measure())
    }

    /// Repaint frame: emit the most recent measurement, if it changed
    pub fn on_animation_frame(&mut self) -> Option<DisplayedDimensions> {
        let dims = self.frame.flush()?;
        if self.last_emitted == Some(dims) {
            return None;
        }
        self.last_emitted = Some(dims);
        Some(dims)
    }

    pub fn has_pending_frame(&self) -> bool {
        self.frame.has_pending()
    }

    /// Release the observation; later callbacks are ignored
    pub fn detach(&mut self) {
        if self.mode.take().is_some() {
            debug!("Dimension tracker detached");
        }
        self.frame.cancel();
        self.last_emitted = None;
    }
}
