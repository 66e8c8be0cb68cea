//! Viewport transform
//!
//! Uniform scaling between source-image pixel coordinates and display
//! coordinates. The scale is computed once when a page image is opened and
//! stays fixed for the whole editing session; it only ever shrinks the image
//! to fit the display bounds, never upscales.

use crate::annotation::Shape;
use crate::geometry::DisplayBox;

/// Session-fixed mapping between source and display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    scale: f64,
}

impl ViewportTransform {
    /// Compute the scale for a source image of the given pixel size shown
    /// within the given display bounds: `min(max_w / w, max_h / h, 1.0)`.
    pub fn new(source_width: u32, source_height: u32, max_width: f64, max_height: f64) -> Self {
        let scale = (max_width / source_width as f64)
            .min(max_height / source_height as f64)
            .min(1.0);
        Self { scale }
    }

    /// Build a transform from a known scale factor
    pub fn from_scale(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Source-space coordinate to display space
    pub fn to_display(&self, v: f64) -> f64 {
        v * self.scale
    }

    /// Display-space coordinate back to source space
    pub fn to_source(&self, v: f64) -> f64 {
        v / self.scale
    }

    /// A shape's bounding box in display coordinates
    pub fn shape_box(&self, shape: &Shape) -> DisplayBox {
        let (x1, y1, x2, y2) = shape.source_bounds();
        DisplayBox::new(
            self.to_display(x1),
            self.to_display(y1),
            self.to_display(x2),
            self.to_display(y2),
        )
    }

    /// Display size of the full source image
    pub fn display_size(&self, source_width: u32, source_height: u32) -> (f64, f64) {
        (
            self.to_display(source_width as f64),
            self.to_display(source_height as f64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_wide_image() {
        // 1000x500 page into 500x500 bounds shrinks by the width ratio
        let vt = ViewportTransform::new(1000, 500, 500.0, 500.0);
        assert!((vt.scale() - 0.5).abs() < 1e-9);
        assert!((vt.to_source(100.0) - 200.0).abs() < 1e-9);
        assert!((vt.to_display(200.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_upscales() {
        let vt = ViewportTransform::new(200, 100, 1200.0, 800.0);
        assert!((vt.scale() - 1.0).abs() < 1e-9);
        assert!((vt.to_display(50.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let vt = ViewportTransform::new(3000, 2000, 1200.0, 800.0);
        for p in [0.0, 1.0, 17.5, 123.456, 2999.0] {
            let back = vt.to_source(vt.to_display(p));
            assert!((back - p).abs() < 1e-9, "round trip drifted for {p}");
        }
    }

    #[test]
    fn test_shape_box_maps_center_extents() {
        let vt = ViewportTransform::from_scale(0.5);
        let shape = Shape::new(120.0, 70.0, 200.0, 100.0);
        let b = vt.shape_box(&shape);
        assert!((b.x1 - 10.0).abs() < 1e-9);
        assert!((b.y1 - 10.0).abs() < 1e-9);
        assert!((b.x2 - 110.0).abs() < 1e-9);
        assert!((b.y2 - 60.0).abs() < 1e-9);
    }
}
