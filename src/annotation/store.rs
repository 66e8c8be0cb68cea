//! Annotation store: load/edit/save lifecycle
//!
//! Owns the annotation document for one editing session. Mutations keep the
//! shape sequence index-stable (deletion is a tombstone, not a removal) so
//! arrows referencing other shapes never shift. The document is written back
//! only on explicit save, to a derived output path that never overwrites the
//! loaded file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::{AnnotationDocument, Arrow, Shape};

pub type Result<T> = std::result::Result<T, AnnotationError>;

/// Errors surfaced by the annotation load/save lifecycle.
///
/// Editing itself never fails: bad clicks and stale arrow indices are
/// absorbed by the controller, not raised.
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("annotation file not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed annotation document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write annotation document {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Derive the output path for an edited document: `_edited` inserted before
/// the extension (`page_3.json` -> `page_3_edited.json`).
pub fn edited_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => input.with_file_name(format!("{stem}_edited.{ext}")),
        None => input.with_file_name(format!("{stem}_edited")),
    }
}

/// Owner of the annotation graph for one editing session.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    doc: AnnotationDocument,
    source_path: PathBuf,
}

impl AnnotationStore {
    /// Load a detector document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|_| AnnotationError::NotFound {
            path: path.to_path_buf(),
        })?;
        let doc: AnnotationDocument =
            serde_json::from_str(&raw).map_err(|source| AnnotationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            shapes = doc.predictions.len(),
            arrows = doc.arrows.len(),
            "loaded annotation document from {}",
            path.display()
        );
        Ok(Self {
            doc,
            source_path: path.to_path_buf(),
        })
    }

    /// Build a store around an already-parsed document.
    pub fn from_document(doc: AnnotationDocument, source_path: impl Into<PathBuf>) -> Self {
        Self {
            doc,
            source_path: source_path.into(),
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.doc.predictions
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.doc.arrows
    }

    pub fn shape(&self, index: usize) -> Option<&Shape> {
        self.doc.predictions.get(index)
    }

    /// Number of shapes not marked deleted
    pub fn visible_count(&self) -> usize {
        self.doc.predictions.iter().filter(|s| !s.deleted).count()
    }

    /// Append a shape, returning its index
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        let index = self.doc.predictions.len();
        debug!(index, "added shape");
        self.doc.predictions.push(shape);
        index
    }

    /// Mark a shape deleted, keeping its slot so arrow indices stay valid.
    /// Returns false for an out-of-range index.
    pub fn soft_delete(&mut self, index: usize) -> bool {
        match self.doc.predictions.get_mut(index) {
            Some(shape) => {
                shape.deleted = true;
                debug!(index, "soft-deleted shape");
                true
            }
            None => false,
        }
    }

    /// Overwrite a shape's center and extents in source coordinates.
    /// Returns false for an out-of-range index.
    pub fn set_shape_bounds(&mut self, index: usize, x: f64, y: f64, width: f64, height: f64) -> bool {
        match self.doc.predictions.get_mut(index) {
            Some(shape) => {
                shape.x = x;
                shape.y = y;
                shape.width = width;
                shape.height = height;
                true
            }
            None => false,
        }
    }

    /// Append an arrow. Endpoints are not validated; self-loops and
    /// duplicates are accepted.
    pub fn add_arrow(&mut self, from: usize, to: usize) {
        debug!(from, to, "added arrow");
        self.doc.arrows.push(Arrow { from, to });
    }

    /// Physically remove an arrow by its position in the arrow sequence.
    pub fn remove_arrow(&mut self, index: usize) -> Option<Arrow> {
        if index < self.doc.arrows.len() {
            debug!(index, "removed arrow");
            Some(self.doc.arrows.remove(index))
        } else {
            None
        }
    }

    /// The derived path a save will write to
    pub fn output_path(&self) -> PathBuf {
        edited_path(&self.source_path)
    }

    /// Write the edited document to the derived output path.
    ///
    /// Deleted shapes are compacted out of `predictions`; every other
    /// top-level key of the loaded document is written back unchanged. The
    /// body goes to a temporary file first and is renamed into place, so an
    /// interrupted save cannot corrupt a previous output.
    pub fn save(&self) -> Result<PathBuf> {
        let out = self.output_path();
        let doc = AnnotationDocument {
            extra: self.doc.extra.clone(),
            predictions: self
                .doc
                .predictions
                .iter()
                .filter(|s| !s.deleted)
                .cloned()
                .collect(),
            arrows: self.doc.arrows.clone(),
        };
        let body = serde_json::to_string_pretty(&doc).map_err(|e| AnnotationError::Write {
            path: out.clone(),
            source: io::Error::other(e),
        })?;

        let tmp = out.with_extension("tmp");
        fs::write(&tmp, body).map_err(|source| AnnotationError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &out).map_err(|source| AnnotationError::Write {
            path: out.clone(),
            source,
        })?;

        info!(
            shapes = doc.predictions.len(),
            arrows = doc.arrows.len(),
            "saved edited document to {}",
            out.display()
        );
        Ok(out)
    }
}
