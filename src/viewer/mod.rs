//! Viewer window
//!
//! Thin egui adapter around the editing core: shows the page image, owns the
//! toolbar and shape-count label, maps pointer input to display-space events
//! for the controller and implements the draw-primitive surface over the
//! egui painter. All editing behavior lives in the core modules.

use anyhow::Result;
use eframe::egui;
use tracing::error;

use crate::annotation::AnnotationStore;
use crate::editor::{InteractionController, PointerEvent, Tool};
use crate::render::{render_scene, Color, DrawSurface};
use crate::transform::ViewportTransform;

/// Extra window height reserved for the toolbar row
const TOOLBAR_HEIGHT: f32 = 40.0;

/// The editor window state
pub struct ViewerApp {
    store: AnnotationStore,
    controller: InteractionController,
    transform: ViewportTransform,
    page_pixels: Vec<u8>,
    page_size: (u32, u32),
    texture: Option<egui::TextureHandle>,
    visible_count: usize,
    status: Option<String>,
}

impl ViewerApp {
    /// Build the window state around a loaded document and its decoded page
    /// raster. The raster is supplied once; the transform is already fixed
    /// for the session.
    pub fn new(
        store: AnnotationStore,
        controller: InteractionController,
        transform: ViewportTransform,
        page: image::RgbaImage,
    ) -> Self {
        let page_size = page.dimensions();
        let visible_count = store.visible_count();
        Self {
            store,
            controller,
            transform,
            page_pixels: page.into_raw(),
            page_size,
            texture: None,
            visible_count,
            status: None,
        }
    }

    /// Initial window size: the scaled page plus the toolbar
    pub fn window_size(&self) -> (f32, f32) {
        let (w, h) = self
            .transform
            .display_size(self.page_size.0, self.page_size.1);
        (w as f32, h as f32 + TOOLBAR_HEIGHT)
    }

    fn on_save(&mut self) {
        match self.store.save() {
            Ok(path) => {
                self.status = Some(format!("Saved {}", path.display()));
            }
            Err(err) => {
                error!("Save failed: {err}");
                self.status = Some(format!("Save failed: {err}"));
            }
        }
    }

    fn page_texture(&mut self, ctx: &egui::Context) -> egui::TextureId {
        let texture = self.texture.get_or_insert_with(|| {
            let (w, h) = self.page_size;
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [w as usize, h as usize],
                &self.page_pixels,
            );
            ctx.load_texture("page", image, egui::TextureOptions::LINEAR)
        });
        texture.id()
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ESC drops the active tool and any half-finished gesture
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.controller.reset();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Save JSON").clicked() {
                    self.on_save();
                }
                ui.separator();
                for tool in Tool::ALL {
                    let active = self.controller.active_tool() == Some(tool);
                    if ui.selectable_label(active, tool.name()).clicked() {
                        self.controller.select_tool(tool);
                    }
                }
                ui.separator();
                ui.label(format!("Shapes: {}", self.visible_count));
                if let Some(status) = &self.status {
                    ui.label(egui::RichText::new(status).weak());
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let texture_id = self.page_texture(ui.ctx());
            let (w, h) = self
                .transform
                .display_size(self.page_size.0, self.page_size.1);
            let desired = egui::vec2(w as f32, h as f32);
            let (rect, response) =
                ui.allocate_exact_size(desired, egui::Sense::click_and_drag());
            let painter = ui.painter_at(rect);

            painter.image(
                texture_id,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            if let Some(pos) = response.interact_pointer_pos() {
                let x = (pos.x - rect.min.x) as f64;
                let y = (pos.y - rect.min.y) as f64;
                let event = if response.drag_started() {
                    Some(PointerEvent::Down { x, y })
                } else if response.dragged() {
                    Some(PointerEvent::Drag { x, y })
                } else {
                    None
                };
                if let Some(event) = event {
                    if self
                        .controller
                        .handle_event(event, &mut self.store, &self.transform)
                    {
                        self.visible_count = self.store.visible_count();
                    }
                }
            }

            let mut surface = PainterSurface {
                painter: &painter,
                origin: rect.min,
            };
            render_scene(&mut surface, &self.store, &self.transform, &self.controller);
        });
    }
}

/// Draw-primitive surface backed by an egui painter, offset to the image
/// rect's origin.
struct PainterSurface<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
}

impl PainterSurface<'_> {
    fn pos(&self, x: f64, y: f64) -> egui::Pos2 {
        egui::pos2(self.origin.x + x as f32, self.origin.y + y as f32)
    }
}

fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

impl DrawSurface for PainterSurface<'_> {
    fn draw_rectangle(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color) {
        let rect = egui::Rect::from_two_pos(self.pos(x1, y1), self.pos(x2, y2));
        self.painter.rect_stroke(
            rect,
            egui::Rounding::ZERO,
            egui::Stroke::new(2.0, to_color32(color)),
        );
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, color: Color) {
        self.painter.line_segment(
            [self.pos(x1, y1), self.pos(x2, y2)],
            egui::Stroke::new(2.0, to_color32(color)),
        );
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str, color: Color) {
        self.painter.text(
            self.pos(x, y),
            egui::Align2::LEFT_TOP,
            text,
            egui::FontId::proportional(14.0),
            to_color32(color),
        );
    }
}

/// Open the viewer window and run it to completion
pub fn run(app: ViewerApp) -> Result<()> {
    let (w, h) = app.window_size();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([w, h]),
        ..Default::default()
    };
    eframe::run_native(
        "flowedit",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("viewer window failed: {e}"))
}
