//! flowedit - Annotation editor for scanned document shape detections
//!
//! Opens a detector-produced annotation document next to its page image and
//! lets a reviewer correct boxes and author arrows between them before the
//! graph is handed to the OCR stage. Edits are saved to a sibling `_edited`
//! file, never over the input.

mod annotation;
mod config;
mod editor;
mod geometry;
mod render;
mod transform;
mod viewer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::annotation::AnnotationStore;
use crate::editor::InteractionController;
use crate::transform::ViewportTransform;
use crate::viewer::ViewerApp;

/// flowedit - correct shape detections and arrow links on a scanned page
#[derive(Parser, Debug)]
#[command(name = "flowedit")]
#[command(about = "Interactive editor for detector-proposed boxes and arrows on scanned documents")]
struct Args {
    /// Detection JSON document to edit
    annotations: PathBuf,

    /// Page image the detections were made on
    image: PathBuf,

    /// Configuration file (TOML); defaults to the per-user config location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the maximum display width
    #[arg(long)]
    max_width: Option<u32>,

    /// Override the maximum display height
    #[arg(long)]
    max_height: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = config::load_or_default(args.config.as_deref())
        .context("Failed to load editor configuration")?;
    if let Some(w) = args.max_width {
        config.display.max_width = w;
    }
    if let Some(h) = args.max_height {
        config.display.max_height = h;
    }

    let store = AnnotationStore::load(&args.annotations)
        .with_context(|| format!("Failed to open annotations {}", args.annotations.display()))?;

    let page = image::open(&args.image)
        .with_context(|| format!("Failed to open page image {}", args.image.display()))?
        .to_rgba8();
    let (width, height) = page.dimensions();

    let transform = ViewportTransform::new(
        width,
        height,
        config.display.max_width as f64,
        config.display.max_height as f64,
    );
    info!(
        width,
        height,
        scale = transform.scale(),
        "opened page image {}",
        args.image.display()
    );

    let controller = InteractionController::with_threshold(config.interaction.arrow_hit_threshold);
    let app = ViewerApp::new(store, controller, transform, page);
    viewer::run(app)
}
