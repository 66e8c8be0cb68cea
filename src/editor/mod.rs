//! Mode-based interaction state machine
//!
//! Consumes display-space pointer events, hit-tests them against the current
//! shapes and arrows, and mutates the annotation store through the viewport
//! transform. Holds no UI types: the host window feeds events in and asks
//! for redraws when a handler reports a change.
//!
//! Exactly one editing tool is active at a time. Selecting a tool drops all
//! pending sub-state of the others (a half-placed box, a chosen arrow
//! source), so a mode switch is also the only way to cancel an in-progress
//! gesture.

use tracing::debug;

use crate::annotation::{AnnotationStore, Shape};
use crate::geometry::{self, Corner};
use crate::transform::ViewportTransform;

/// Default pixel distance within which a click selects an arrow segment
pub const DEFAULT_ARROW_HIT_THRESHOLD: f64 = 10.0;

/// A pointer event in display coordinates.
///
/// `Down` is a press; `Drag` is a movement sample while the button is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
}

/// The editing tools a user can pick from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    AddBox,
    ResizeBox,
    RemoveBox,
    AddArrow,
    RemoveArrow,
}

impl Tool {
    /// Toolbar label for this tool
    pub fn name(&self) -> &'static str {
        match self {
            Tool::AddBox => "Add Box",
            Tool::ResizeBox => "Resize Box",
            Tool::RemoveBox => "Remove Shape",
            Tool::AddArrow => "Add Arrow",
            Tool::RemoveArrow => "Remove Arrow",
        }
    }

    pub const ALL: [Tool; 5] = [
        Tool::AddBox,
        Tool::ResizeBox,
        Tool::RemoveBox,
        Tool::AddArrow,
        Tool::RemoveArrow,
    ];
}

/// Live rubber-band preview while a box is being placed, display space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RubberBand {
    pub start_x: f64,
    pub start_y: f64,
    pub current_x: f64,
    pub current_y: f64,
}

/// A shape grabbed for resizing: which shape, which corner, and the live
/// display-space corner bounds `[x1, y1, x2, y2]` being dragged. The bounds
/// are deliberately left unnormalized so dragging a corner across its
/// opposite mirrors the box instead of pinning it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeSelection {
    pub index: usize,
    pub corner: Corner,
    coords: [f64; 4],
}

/// The single active editing mode, carrying only the pending state relevant
/// to that mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Idle,
    AddBox { pending: Option<RubberBand> },
    ResizeBox { selection: Option<ResizeSelection> },
    RemoveBox,
    AddArrow { pending_from: Option<usize> },
    RemoveArrow,
}

/// Finite state machine over editing modes.
#[derive(Debug, Clone)]
pub struct InteractionController {
    mode: Mode,
    arrow_hit_threshold: f64,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_ARROW_HIT_THRESHOLD)
    }

    pub fn with_threshold(arrow_hit_threshold: f64) -> Self {
        Self {
            mode: Mode::Idle,
            arrow_hit_threshold,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// The tool currently driving pointer interpretation, if any
    pub fn active_tool(&self) -> Option<Tool> {
        match self.mode {
            Mode::Idle => None,
            Mode::AddBox { .. } => Some(Tool::AddBox),
            Mode::ResizeBox { .. } => Some(Tool::ResizeBox),
            Mode::RemoveBox => Some(Tool::RemoveBox),
            Mode::AddArrow { .. } => Some(Tool::AddArrow),
            Mode::RemoveArrow => Some(Tool::RemoveArrow),
        }
    }

    /// Activate a tool, discarding any pending state of the previous one.
    pub fn select_tool(&mut self, tool: Tool) {
        debug!(?tool, "switching editing tool");
        self.mode = match tool {
            Tool::AddBox => Mode::AddBox { pending: None },
            Tool::ResizeBox => Mode::ResizeBox { selection: None },
            Tool::RemoveBox => Mode::RemoveBox,
            Tool::AddArrow => Mode::AddArrow { pending_from: None },
            Tool::RemoveArrow => Mode::RemoveArrow,
        };
    }

    /// Drop back to the idle mode, discarding pending state
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
    }

    /// The live add-box preview rectangle, if one is being placed
    pub fn rubber_band(&self) -> Option<RubberBand> {
        match &self.mode {
            Mode::AddBox { pending } => *pending,
            _ => None,
        }
    }

    /// The shape chosen as an arrow source, awaiting its target
    pub fn pending_arrow_from(&self) -> Option<usize> {
        match &self.mode {
            Mode::AddArrow { pending_from } => *pending_from,
            _ => None,
        }
    }

    /// Feed one pointer event through the active mode's handler.
    ///
    /// Returns true when the annotation graph or a visible preview changed,
    /// i.e. the host should redraw and recompute the visible-shape count.
    pub fn handle_event(
        &mut self,
        event: PointerEvent,
        store: &mut AnnotationStore,
        transform: &ViewportTransform,
    ) -> bool {
        match event {
            PointerEvent::Down { x, y } => self.on_pointer_down(x, y, store, transform),
            PointerEvent::Drag { x, y } => self.on_pointer_drag(x, y, store, transform),
        }
    }

    fn on_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        store: &mut AnnotationStore,
        transform: &ViewportTransform,
    ) -> bool {
        let threshold = self.arrow_hit_threshold;
        match &mut self.mode {
            Mode::Idle => false,

            Mode::AddBox { pending } => match pending.take() {
                None => {
                    *pending = Some(RubberBand {
                        start_x: x,
                        start_y: y,
                        current_x: x,
                        current_y: y,
                    });
                    true
                }
                Some(band) => {
                    let x1 = band.start_x.min(x);
                    let y1 = band.start_y.min(y);
                    let x2 = band.start_x.max(x);
                    let y2 = band.start_y.max(y);
                    let shape = Shape::new(
                        transform.to_source((x1 + x2) / 2.0),
                        transform.to_source((y1 + y2) / 2.0),
                        transform.to_source(x2 - x1),
                        transform.to_source(y2 - y1),
                    );
                    store.add_shape(shape);
                    // the tool stays active for the next box
                    true
                }
            },

            Mode::ResizeBox { selection } => {
                if let Some(index) = hit_shape(store, transform, x, y) {
                    if let Some(shape) = store.shape(index) {
                        let b = transform.shape_box(shape);
                        *selection = Some(ResizeSelection {
                            index,
                            corner: b.nearest_corner(x, y),
                            coords: [b.x1, b.y1, b.x2, b.y2],
                        });
                    }
                }
                // selecting alone mutates nothing
                false
            }

            Mode::RemoveBox => match hit_shape(store, transform, x, y) {
                Some(index) => store.soft_delete(index),
                None => false,
            },

            Mode::AddArrow { pending_from } => match hit_shape(store, transform, x, y) {
                Some(index) => match pending_from.take() {
                    None => {
                        *pending_from = Some(index);
                        true
                    }
                    Some(from) => {
                        store.add_arrow(from, index);
                        true
                    }
                },
                None => false,
            },

            Mode::RemoveArrow => {
                let hit = visible_arrow_segments(store, transform)
                    .into_iter()
                    .find(|(_, [x1, y1, x2, y2])| {
                        geometry::segment_distance(x, y, *x1, *y1, *x2, *y2) < threshold
                    });
                match hit {
                    Some((index, _)) => store.remove_arrow(index).is_some(),
                    None => false,
                }
            }
        }
    }

    fn on_pointer_drag(
        &mut self,
        x: f64,
        y: f64,
        store: &mut AnnotationStore,
        transform: &ViewportTransform,
    ) -> bool {
        match &mut self.mode {
            Mode::AddBox {
                pending: Some(band),
            } => {
                band.current_x = x;
                band.current_y = y;
                true
            }

            Mode::ResizeBox {
                selection: Some(sel),
            } => {
                match sel.corner {
                    Corner::TopLeft => {
                        sel.coords[0] = x;
                        sel.coords[1] = y;
                    }
                    Corner::TopRight => {
                        sel.coords[2] = x;
                        sel.coords[1] = y;
                    }
                    Corner::BottomRight => {
                        sel.coords[2] = x;
                        sel.coords[3] = y;
                    }
                    Corner::BottomLeft => {
                        sel.coords[0] = x;
                        sel.coords[3] = y;
                    }
                }
                let [x1, y1, x2, y2] = sel.coords;
                // write back immediately, no batching until drag end
                store.set_shape_bounds(
                    sel.index,
                    transform.to_source((x1 + x2) / 2.0),
                    transform.to_source((y1 + y2) / 2.0),
                    transform.to_source((x2 - x1).abs()),
                    transform.to_source((y2 - y1).abs()),
                )
            }

            _ => false,
        }
    }
}

/// First shape in store order whose display box contains the point.
/// Deleted shapes are transparent to hits.
pub fn hit_shape(
    store: &AnnotationStore,
    transform: &ViewportTransform,
    x: f64,
    y: f64,
) -> Option<usize> {
    store
        .shapes()
        .iter()
        .enumerate()
        .find(|(_, shape)| !shape.deleted && transform.shape_box(shape).contains(x, y))
        .map(|(index, _)| index)
}

/// Display-space segments for every arrow that can currently be drawn:
/// both endpoint indices in range and neither endpoint deleted. Arrows with
/// stale references are silently skipped, never an error.
pub fn visible_arrow_segments(
    store: &AnnotationStore,
    transform: &ViewportTransform,
) -> Vec<(usize, [f64; 4])> {
    let shapes = store.shapes();
    store
        .arrows()
        .iter()
        .enumerate()
        .filter_map(|(index, arrow)| {
            let from = shapes.get(arrow.from)?;
            let to = shapes.get(arrow.to)?;
            if from.deleted || to.deleted {
                return None;
            }
            Some((
                index,
                [
                    transform.to_display(from.x),
                    transform.to_display(from.y),
                    transform.to_display(to.x),
                    transform.to_display(to.y),
                ],
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationDocument, Arrow};

    fn store_with_shapes(shapes: Vec<Shape>) -> AnnotationStore {
        let doc = AnnotationDocument {
            extra: serde_json::Map::new(),
            predictions: shapes,
            arrows: Vec::new(),
        };
        AnnotationStore::from_document(doc, "page.json")
    }

    /// Six 40x20 boxes centered at x = 0, 100, ..., 500, all on y = 50
    fn row_of_six() -> AnnotationStore {
        store_with_shapes(
            (0..6)
                .map(|i| Shape::new(100.0 * i as f64, 50.0, 40.0, 20.0))
                .collect(),
        )
    }

    #[test]
    fn test_add_box_two_clicks_converts_to_source_space() {
        let mut controller = InteractionController::new();
        let transform = ViewportTransform::from_scale(0.5);
        let mut store = store_with_shapes(Vec::new());
        controller.select_tool(Tool::AddBox);

        assert!(controller.handle_event(
            PointerEvent::Down { x: 10.0, y: 10.0 },
            &mut store,
            &transform
        ));
        assert!(controller.rubber_band().is_some());
        assert!(controller.handle_event(
            PointerEvent::Down { x: 110.0, y: 60.0 },
            &mut store,
            &transform
        ));

        assert_eq!(store.shapes().len(), 1);
        let shape = &store.shapes()[0];
        assert!((shape.x - 120.0).abs() < 1e-9);
        assert!((shape.y - 70.0).abs() < 1e-9);
        assert!((shape.width - 200.0).abs() < 1e-9);
        assert!((shape.height - 100.0).abs() < 1e-9);
        assert!(shape.label.is_empty());
        // preview is gone, tool stays armed for the next box
        assert!(controller.rubber_band().is_none());
        assert_eq!(controller.active_tool(), Some(Tool::AddBox));
    }

    #[test]
    fn test_add_box_reversed_drag_normalizes_corners() {
        let mut controller = InteractionController::new();
        let transform = ViewportTransform::from_scale(1.0);
        let mut store = store_with_shapes(Vec::new());
        controller.select_tool(Tool::AddBox);

        controller.handle_event(PointerEvent::Down { x: 110.0, y: 60.0 }, &mut store, &transform);
        controller.handle_event(PointerEvent::Down { x: 10.0, y: 10.0 }, &mut store, &transform);

        let shape = &store.shapes()[0];
        assert!((shape.width - 100.0).abs() < 1e-9);
        assert!((shape.height - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_updates_rubber_band_without_mutating_store() {
        let mut controller = InteractionController::new();
        let transform = ViewportTransform::from_scale(1.0);
        let mut store = store_with_shapes(Vec::new());
        controller.select_tool(Tool::AddBox);

        controller.handle_event(PointerEvent::Down { x: 5.0, y: 5.0 }, &mut store, &transform);
        assert!(controller.handle_event(
            PointerEvent::Drag { x: 42.0, y: 17.0 },
            &mut store,
            &transform
        ));

        let band = controller.rubber_band().unwrap();
        assert!((band.current_x - 42.0).abs() < 1e-9);
        assert!((band.current_y - 17.0).abs() < 1e-9);
        assert!(store.shapes().is_empty());
    }

    #[test]
    fn test_tool_switch_discards_pending_state() {
        let mut controller = InteractionController::new();
        let transform = ViewportTransform::from_scale(1.0);
        let mut store = row_of_six();

        controller.select_tool(Tool::AddBox);
        controller.handle_event(PointerEvent::Down { x: 5.0, y: 5.0 }, &mut store, &transform);
        assert!(controller.rubber_band().is_some());

        controller.select_tool(Tool::AddArrow);
        assert!(controller.rubber_band().is_none());
        controller.handle_event(PointerEvent::Down { x: 100.0, y: 50.0 }, &mut store, &transform);
        assert_eq!(controller.pending_arrow_from(), Some(1));

        controller.select_tool(Tool::AddBox);
        assert!(controller.pending_arrow_from().is_none());
    }

    #[test]
    fn test_resize_selects_first_shape_in_store_order() {
        // two overlapping boxes; the click lands inside both
        let mut store = store_with_shapes(vec![
            Shape::new(50.0, 50.0, 60.0, 60.0),
            Shape::new(60.0, 50.0, 60.0, 60.0),
        ]);
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::ResizeBox);

        controller.handle_event(PointerEvent::Down { x: 55.0, y: 50.0 }, &mut store, &transform);
        match controller.mode() {
            Mode::ResizeBox {
                selection: Some(sel),
            } => assert_eq!(sel.index, 0),
            other => panic!("expected a resize selection, got {other:?}"),
        }
    }

    #[test]
    fn test_resize_picks_nearest_corner_and_writes_back_live() {
        // box with display corners (80,40)-(120,60)
        let mut store = store_with_shapes(vec![Shape::new(100.0, 50.0, 40.0, 20.0)]);
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::ResizeBox);

        // click near the bottom-right corner
        controller.handle_event(PointerEvent::Down { x: 118.0, y: 58.0 }, &mut store, &transform);
        match controller.mode() {
            Mode::ResizeBox {
                selection: Some(sel),
            } => assert_eq!(sel.corner, Corner::BottomRight),
            other => panic!("expected a resize selection, got {other:?}"),
        }

        // drag the corner outward; the shape updates on every sample
        assert!(controller.handle_event(
            PointerEvent::Drag { x: 160.0, y: 80.0 },
            &mut store,
            &transform
        ));
        let shape = store.shape(0).unwrap();
        assert!((shape.width - 80.0).abs() < 1e-9);
        assert!((shape.height - 40.0).abs() < 1e-9);
        assert!((shape.x - 120.0).abs() < 1e-9);
        assert!((shape.y - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_drag_across_opposite_corner_mirrors() {
        let mut store = store_with_shapes(vec![Shape::new(100.0, 50.0, 40.0, 20.0)]);
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::ResizeBox);

        // grab bottom-right, drag it past the top-left corner
        controller.handle_event(PointerEvent::Down { x: 118.0, y: 58.0 }, &mut store, &transform);
        controller.handle_event(PointerEvent::Drag { x: 60.0, y: 20.0 }, &mut store, &transform);

        let shape = store.shape(0).unwrap();
        // width/height come from absolute differences, never negative
        assert!((shape.width - 20.0).abs() < 1e-9);
        assert!((shape.height - 20.0).abs() < 1e-9);
        assert!((shape.x - 70.0).abs() < 1e-9);
        assert!((shape.y - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_box_soft_deletes_on_hit() {
        let mut store = row_of_six();
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::RemoveBox);

        assert!(controller.handle_event(
            PointerEvent::Down { x: 300.0, y: 50.0 },
            &mut store,
            &transform
        ));
        assert_eq!(store.shapes().len(), 6);
        assert!(store.shapes()[3].deleted);
        assert_eq!(store.visible_count(), 5);

        // a click on empty canvas is absorbed
        assert!(!controller.handle_event(
            PointerEvent::Down { x: 300.0, y: 400.0 },
            &mut store,
            &transform
        ));
    }

    #[test]
    fn test_deleted_shapes_are_transparent_to_hits() {
        let mut store = row_of_six();
        store.soft_delete(2);
        let transform = ViewportTransform::from_scale(1.0);
        assert_eq!(hit_shape(&store, &transform, 200.0, 50.0), None);
        assert_eq!(hit_shape(&store, &transform, 100.0, 50.0), Some(1));
    }

    #[test]
    fn test_arrow_lifecycle() {
        let mut store = row_of_six();
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::AddArrow);

        // first click picks the source, second the target
        controller.handle_event(PointerEvent::Down { x: 200.0, y: 50.0 }, &mut store, &transform);
        assert_eq!(controller.pending_arrow_from(), Some(2));
        controller.handle_event(PointerEvent::Down { x: 500.0, y: 50.0 }, &mut store, &transform);
        assert_eq!(store.arrows(), &[Arrow { from: 2, to: 5 }]);
        assert!(controller.pending_arrow_from().is_none());

        // a click near the segment midpoint removes exactly that arrow
        controller.select_tool(Tool::RemoveArrow);
        assert!(controller.handle_event(
            PointerEvent::Down { x: 350.0, y: 58.0 },
            &mut store,
            &transform
        ));
        assert!(store.arrows().is_empty());
    }

    #[test]
    fn test_remove_arrow_respects_threshold() {
        let mut store = row_of_six();
        store.add_arrow(0, 5);
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::RemoveArrow);

        // 12 px off the segment: outside the default 10 px threshold
        assert!(!controller.handle_event(
            PointerEvent::Down { x: 250.0, y: 62.0 },
            &mut store,
            &transform
        ));
        assert_eq!(store.arrows().len(), 1);
    }

    #[test]
    fn test_self_loop_arrow_is_accepted() {
        let mut store = row_of_six();
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::AddArrow);

        controller.handle_event(PointerEvent::Down { x: 100.0, y: 50.0 }, &mut store, &transform);
        controller.handle_event(PointerEvent::Down { x: 100.0, y: 50.0 }, &mut store, &transform);
        assert_eq!(store.arrows(), &[Arrow { from: 1, to: 1 }]);
    }

    #[test]
    fn test_dangling_arrow_is_skipped_everywhere() {
        let mut store = store_with_shapes(
            (0..5)
                .map(|i| Shape::new(100.0 * i as f64, 50.0, 40.0, 20.0))
                .collect(),
        );
        store.add_arrow(2, 7);
        let transform = ViewportTransform::from_scale(1.0);

        assert!(visible_arrow_segments(&store, &transform).is_empty());

        // remove-arrow clicks pass straight through the stale arrow
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::RemoveArrow);
        assert!(!controller.handle_event(
            PointerEvent::Down { x: 200.0, y: 50.0 },
            &mut store,
            &transform
        ));
        assert_eq!(store.arrows().len(), 1);
    }

    #[test]
    fn test_arrow_to_deleted_shape_is_skipped() {
        let mut store = row_of_six();
        store.add_arrow(1, 4);
        store.soft_delete(4);
        let transform = ViewportTransform::from_scale(1.0);
        assert!(visible_arrow_segments(&store, &transform).is_empty());
    }

    #[test]
    fn test_remove_arrow_takes_first_match_in_store_order() {
        // two coincident arrows; the click can only remove the earlier one
        let mut store = row_of_six();
        store.add_arrow(0, 3);
        store.add_arrow(0, 3);
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        controller.select_tool(Tool::RemoveArrow);

        controller.handle_event(PointerEvent::Down { x: 150.0, y: 50.0 }, &mut store, &transform);
        assert_eq!(store.arrows().len(), 1);
    }

    #[test]
    fn test_idle_mode_absorbs_events() {
        let mut store = row_of_six();
        let transform = ViewportTransform::from_scale(1.0);
        let mut controller = InteractionController::new();
        assert!(!controller.handle_event(
            PointerEvent::Down { x: 100.0, y: 50.0 },
            &mut store,
            &transform
        ));
        assert_eq!(store.visible_count(), 6);
    }
}
