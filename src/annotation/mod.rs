//! Annotation data model
//!
//! Shapes and arrows over a scanned document page, in source-image pixel
//! coordinates. The JSON layout follows the upstream detector: shapes live in
//! a `predictions` array with center-based coordinates, arrows in an `arrows`
//! array of shape-index pairs. Unknown fields are carried through untouched so
//! a round trip never loses detector metadata.

pub mod store;

pub use store::{AnnotationError, AnnotationStore};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A rectangular shape detection over the source image.
///
/// `(x, y)` is the CENTER of the box, `width`/`height` its full extents,
/// all in source-image pixels. Zero-size shapes are legal and render as
/// degenerate rectangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Detector class label; empty for boxes added by hand
    #[serde(rename = "class", default)]
    pub label: String,
    /// Soft-delete marker. Deleted shapes keep their slot so arrow indices
    /// referencing other shapes stay valid; they are filtered out on save.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    /// Text recognized by the downstream OCR stage, if it ran already
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    /// Any other per-prediction fields from the detector (confidence,
    /// detection ids, ...), preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shape {
    /// Create a new shape with an empty label
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            label: String::new(),
            deleted: false,
            ocr_text: None,
            extra: Map::new(),
        }
    }

    /// Corner bounds `(x1, y1, x2, y2)` in source-image pixels
    pub fn source_bounds(&self) -> (f64, f64, f64, f64) {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        (self.x - hw, self.y - hh, self.x + hw, self.y + hh)
    }
}

/// A directed edge between two shapes, by index into the shape sequence.
///
/// Indices are not validated eagerly: an arrow whose endpoint is out of range
/// or deleted is simply skipped wherever it would be rendered or hit-tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    pub from: usize,
    pub to: usize,
}

/// The full annotation document for one page.
///
/// Top-level keys other than `predictions` and `arrows` are opaque detector
/// metadata and survive load/save unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub predictions: Vec<Shape>,
    #[serde(default)]
    pub arrows: Vec<Arrow>,
}
