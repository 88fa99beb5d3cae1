//! Page-image structure overlay: transform, size tracking, interactive regions

pub mod dimensions;
pub mod focus;
pub mod renderer;
pub mod transform;

pub use dimensions::{DimensionTracker, FixedSurface, ObservationMode, RenderSurface};
pub use focus::Direction;
pub use renderer::{
    DEFAULT_HOVER_DEBOUNCE, OverlayConfig, OverlayEvent, OverlayKey, OverlayRegion, RegionState,
    StructureOverlay,
};
pub use transform::{TransformOptions, transform, transform_elements};
