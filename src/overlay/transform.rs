//! Source-space to display-space box transform
//!
//! Source space has a bottom-left origin (PDF points); display space has a
//! top-left origin in pixels. Scaling is independent per axis so a page image
//! stretched to a non-native aspect ratio still lines up.

use crate::types::{BBox, Dimensions, ScaledBox, StructureElement};

/// Policy knobs for [`transform`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformOptions {
    /// Smallest on-screen extent, in display pixels
    pub min_size: f64,
    pub enforce_minimum: bool,
    pub clamp_to_bounds: bool,
}

impl TransformOptions {
    pub const DEFAULT_MIN_SIZE: f64 = 8.0;
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            min_size: Self::DEFAULT_MIN_SIZE,
            enforce_minimum: true,
            clamp_to_bounds: true,
        }
    }
}

/// Map `bbox` from source space into display space.
///
/// Never panics. Non-finite input yields [`ScaledBox::EMPTY`]; an inverted
/// box collapses to zero extent before minimum-size enforcement. Callers are
/// expected to check both dimension sets with [`Dimensions::is_valid`] first
/// (see [`transform_elements`]).
pub fn transform(
    bbox: &BBox,
    source: Dimensions,
    display: Dimensions,
    options: &TransformOptions,
) -> ScaledBox {
    if !source.is_valid() || !display.is_valid() || !bbox.is_finite() {
        return ScaledBox::EMPTY;
    }

    let scale_x = display.width / source.width;
    let scale_y = display.height / source.height;

    let mut x = bbox.left * scale_x;
    let mut y = display.height - bbox.top * scale_y;
    let mut width = ((bbox.right - bbox.left) * scale_x).max(0.0);
    let mut height = ((bbox.top - bbox.bottom) * scale_y).max(0.0);

    if options.enforce_minimum && options.min_size.is_finite() && options.min_size > 0.0 {
        (x, width) = expand_axis(x, width, options.min_size);
        (y, height) = expand_axis(y, height, options.min_size);
    }

    if options.clamp_to_bounds {
        (x, width) = clip_axis(x, width, display.width);
        (y, height) = clip_axis(y, height, display.height);
    }

    ScaledBox {
        x,
        y,
        width,
        height,
    }
}

/// Transform every element of a page, or nothing if either dimension set is
/// unusable. Output order matches input order.
pub fn transform_elements(
    elements: &[StructureElement],
    source: Dimensions,
    display: Dimensions,
    options: &TransformOptions,
) -> Vec<ScaledBox> {
    if !source.is_valid() || !display.is_valid() {
        return Vec::new();
    }
    elements
        .iter()
        .map(|e| transform(&e.bbox, source, display, options))
        .collect()
}

fn expand_axis(start: f64, extent: f64, min: f64) -> (f64, f64) {
    if extent >= min {
        return (start, extent);
    }
    let center = start + extent / 2.0;
    (center - min / 2.0, min)
}

fn clip_axis(start: f64, extent: f64, limit: f64) -> (f64, f64) {
    let lo = start.clamp(0.0, limit);
    let hi = (start + extent).clamp(0.0, limit);
    (lo, (hi - lo).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn plain() -> TransformOptions {
        TransformOptions {
            min_size: 0.0,
            enforce_minimum: false,
            clamp_to_bounds: false,
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPS, "{a} != {b}");
    }

    #[test]
    fn doubling_display_doubles_extents() {
        let source = Dimensions::new(612.0, 792.0);
        let display = Dimensions::new(1224.0, 1584.0);
        let bbox = BBox::new(72.0, 100.0, 300.0, 250.5);

        let b = transform(&bbox, source, display, &plain());

        assert_close(b.width, 2.0 * (300.0 - 72.0));
        assert_close(b.height, 2.0 * (250.5 - 100.0));
        assert_close(b.x, 144.0);
    }

    #[test]
    fn top_edge_maps_to_zero_and_bottom_edge_to_display_height() {
        let source = Dimensions::new(600.0, 800.0);
        let display = Dimensions::new(300.0, 500.0);

        let top = transform(&BBox::new(0.0, 700.0, 100.0, 800.0), source, display, &plain());
        assert_close(top.y, 0.0);

        let bottom = transform(&BBox::new(0.0, 0.0, 100.0, 40.0), source, display, &plain());
        assert_close(bottom.y + bottom.height, 500.0);
    }

    #[test]
    fn non_uniform_scaling_applies_per_axis() {
        let source = Dimensions::new(100.0, 100.0);
        let display = Dimensions::new(300.0, 50.0);

        let b = transform(&BBox::new(10.0, 10.0, 20.0, 30.0), source, display, &plain());
        assert_close(b.x, 30.0);
        assert_close(b.width, 30.0);
        assert_close(b.height, 10.0);
        assert_close(b.y, 50.0 - 15.0);
    }

    #[test]
    fn thin_box_expands_to_min_size_around_midpoint() {
        let source = Dimensions::new(100.0, 100.0);
        let display = Dimensions::new(100.0, 100.0);
        let options = TransformOptions {
            min_size: 10.0,
            enforce_minimum: true,
            clamp_to_bounds: true,
        };

        // 2 wide, 1 tall, centred at (51, 49.5) in display space
        let b = transform(&BBox::new(50.0, 50.0, 52.0, 51.0), source, display, &options);
        assert_close(b.width, 10.0);
        assert_close(b.height, 10.0);
        assert_close(b.x + b.width / 2.0, 51.0);
        assert_close(b.y + b.height / 2.0, 49.5);
    }

    #[test]
    fn expanded_box_is_clipped_at_display_edges() {
        let source = Dimensions::new(100.0, 100.0);
        let display = Dimensions::new(100.0, 100.0);
        let options = TransformOptions {
            min_size: 10.0,
            enforce_minimum: true,
            clamp_to_bounds: true,
        };

        // Touching the left and top edges
        let b = transform(&BBox::new(0.0, 99.0, 1.0, 100.0), source, display, &options);
        assert_close(b.x, 0.0);
        assert_close(b.y, 0.0);
        assert_close(b.width, 5.5);
        assert_close(b.height, 5.5);

        // Touching the right and bottom edges
        let b = transform(&BBox::new(99.0, 0.0, 100.0, 1.0), source, display, &options);
        assert_close(b.x + b.width, 100.0);
        assert_close(b.y + b.height, 100.0);
    }

    #[test]
    fn large_boxes_are_untouched_by_minimum() {
        let source = Dimensions::new(100.0, 100.0);
        let display = Dimensions::new(200.0, 200.0);
        let b = transform(
            &BBox::new(10.0, 10.0, 60.0, 60.0),
            source,
            display,
            &TransformOptions::default(),
        );
        assert_close(b.width, 100.0);
        assert_close(b.height, 100.0);
    }

    #[test]
    fn invalid_geometry_degrades_without_panicking() {
        let ok = Dimensions::new(100.0, 100.0);
        let opts = TransformOptions::default();

        assert_eq!(
            transform(&BBox::new(0.0, 0.0, 1.0, 1.0), Dimensions::new(0.0, 100.0), ok, &opts),
            ScaledBox::EMPTY
        );
        assert_eq!(
            transform(&BBox::new(0.0, 0.0, 1.0, 1.0), ok, Dimensions::new(100.0, -1.0), &opts),
            ScaledBox::EMPTY
        );
        assert_eq!(
            transform(&BBox::new(f64::NAN, 0.0, 1.0, 1.0), ok, ok, &opts),
            ScaledBox::EMPTY
        );

        let inverted = transform(&BBox::new(50.0, 50.0, 40.0, 40.0), ok, ok, &plain());
        assert_eq!(inverted.width, 0.0);
        assert_eq!(inverted.height, 0.0);
    }

    #[test]
    fn transform_elements_is_empty_for_zero_area_display() {
        let elements = vec![StructureElement {
            chunk_id: "a".into(),
            element_type: crate::types::ElementType::Text,
            bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
            confidence: None,
        }];
        let out = transform_elements(
            &elements,
            Dimensions::new(100.0, 100.0),
            Dimensions::new(0.0, 0.0),
            &TransformOptions::default(),
        );
        assert!(out.is_empty());
    }
}
