//! Scene rendering glue
//!
//! Builds the display-space draw list for the current annotation graph
//! against a small draw-primitive trait, keeping the editing core free of
//! any concrete UI toolkit. The host window supplies the surface.

use crate::annotation::AnnotationStore;
use crate::editor::{visible_arrow_segments, InteractionController};
use crate::transform::ViewportTransform;

/// An RGBA color for draw primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Plain detected boxes
    pub const GREEN: Color = Color::rgb(0, 170, 0);
    /// Boxes whose detector class is arrow-like
    pub const RED: Color = Color::rgb(220, 40, 40);
    /// Arrow edges, previews and pending-source highlights
    pub const BLUE: Color = Color::rgb(40, 90, 255);
}

/// Draw primitives supplied by the host UI. All coordinates are display
/// space; rectangle corners may arrive unordered.
pub trait DrawSurface {
    fn draw_rectangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color);
    fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Color);
}

/// Outline color for a shape label: arrow-class detections draw red,
/// everything else green.
pub fn label_color(label: &str) -> Color {
    if label.contains("arrow") {
        Color::RED
    } else {
        Color::GREEN
    }
}

/// Emit the full scene: undeleted shapes with their labels, drawable arrows
/// between shape centers, then the live interaction overlays (rubber band,
/// pending arrow source).
pub fn render_scene(
    surface: &mut dyn DrawSurface,
    store: &AnnotationStore,
    transform: &ViewportTransform,
    controller: &InteractionController,
) {
    for shape in store.shapes().iter().filter(|s| !s.deleted) {
        let b = transform.shape_box(shape);
        let color = label_color(&shape.label);
        surface.draw_rectangle(b.x1, b.y1, b.x2, b.y2, color);
        surface.draw_text(b.x1 + 5.0, b.y1 + 15.0, &shape.label, color);
    }

    for (_, [x1, y1, x2, y2]) in visible_arrow_segments(store, transform) {
        surface.draw_line(x1, y1, x2, y2, Color::BLUE);
    }

    if let Some(band) = controller.rubber_band() {
        surface.draw_rectangle(
            band.start_x,
            band.start_y,
            band.current_x,
            band.current_y,
            Color::BLUE,
        );
    }

    if let Some(index) = controller.pending_arrow_from() {
        if let Some(shape) = store.shape(index) {
            let b = transform.shape_box(shape);
            surface.draw_rectangle(b.x1, b.y1, b.x2, b.y2, Color::BLUE);
        }
    }
}
