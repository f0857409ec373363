//! Desktop host for the backdrop effects, built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the viewport, the frame
//! scheduler and both effects, and implements [`eframe::App`] to drive them
//! once per repaint and show their surfaces as textures.

use backdrop_core::{
    BackdropConfig, CursorFollower, FrameScheduler, GrainOverlay, ParticleField, PixelSurface,
    Surface, Viewport, ViewportSize, error::ConfigResult,
};
use eframe::App;
use glam::Vec2;
use tracing::info;

/// Main application state for the backdrop viewer.
///
/// [`Viewer`] glues together:
/// - The effects: [`ParticleField`] and [`GrainOverlay`], each rendering
///   into its own [`PixelSurface`].
/// - The shared [`Viewport`] and [`FrameScheduler`] they are bound to.
/// - A [`CursorFollower`] drawn on top.
///
/// The typical per-frame update is:
/// 1. Resize the viewport if the central panel changed size.
/// 2. Unless paused, tick the scheduler so both effects draw one frame.
/// 3. Upload the surfaces as textures and paint them, grain over field.
/// 4. Ease and draw the cursor follower.
///
/// ### Fields
/// - `cfg` - Configuration the effects were built from; used on restart.
/// - `viewport` - Live drawable size, in points.
/// - `scheduler` - Frame queue ticked once per repaint.
/// - `field` / `grain` - The running effects.
/// - `cursor` - Ambient cursor follower.
///
/// - `field_texture` / `grain_texture` - GPU copies of the surfaces.
/// - `uploaded_regenerations` - Grain regeneration count last uploaded.
///
/// - `paused` - Whether scheduler ticks are suspended.
/// - `last_dt` - Frame delta used for the cursor ease (display only).
pub struct Viewer {
    cfg: BackdropConfig,
    viewport: Viewport,
    scheduler: FrameScheduler,
    field: ParticleField<PixelSurface>,
    grain: GrainOverlay<PixelSurface>,
    cursor: CursorFollower,

    field_texture: Option<egui::TextureHandle>,
    grain_texture: Option<egui::TextureHandle>,
    uploaded_regenerations: Option<u64>,

    paused: bool,
    last_dt: f32,
}

impl Viewer {
    /// Builds both effects from `cfg` and starts them on an empty viewport.
    /// The first repaint sizes the viewport to the window.
    pub fn new(cfg: BackdropConfig) -> ConfigResult<Self> {
        let (field, grain) = match cfg.seed {
            Some(seed) => (
                ParticleField::seeded(cfg.particles.clone(), seed)?,
                GrainOverlay::seeded(cfg.grain.clone(), seed.wrapping_add(1))?,
            ),
            None => (
                ParticleField::new(cfg.particles.clone())?,
                GrainOverlay::new(cfg.grain.clone())?,
            ),
        };

        let mut viewer = Self {
            viewport: Viewport::new(ViewportSize::default()),
            scheduler: FrameScheduler::new(),
            cursor: CursorFollower::new(cfg.cursor.clone()),
            cfg,
            field,
            grain,
            field_texture: None,
            grain_texture: None,
            uploaded_regenerations: None,
            paused: false,
            last_dt: 0.0,
        };
        viewer.restart();
        Ok(viewer)
    }

    /// Restarts both effects on fresh surfaces at the current viewport size.
    fn restart(&mut self) {
        let size = self.viewport.size();
        self.field
            .start(PixelSurface::new(size), &self.viewport, &self.scheduler);
        self.grain
            .start(PixelSurface::new(size), &self.viewport, &self.scheduler);
        self.uploaded_regenerations = None;
        info!(
            width = size.width,
            height = size.height,
            population = self.cfg.particles.population,
            "backdrop started"
        );
    }

    /// Stops both effects. Their last frames stay on screen.
    fn stop(&mut self) {
        self.field.stop();
        self.grain.stop();
    }

    fn is_running(&self) -> bool {
        self.field.is_running() || self.grain.is_running()
    }

    /// Applies `size` to the viewport and, unless paused, runs one frame.
    ///
    /// ### Returns
    /// The number of scheduler callbacks that ran.
    fn advance(&mut self, size: ViewportSize) -> usize {
        if size != self.viewport.size() {
            self.viewport.resize(size);
        }
        if self.paused {
            return 0;
        }
        self.scheduler.tick()
    }

    /// Copies the field surface to its texture. Zero-area surfaces are
    /// skipped since egui cannot allocate them.
    fn upload_field(&mut self, ctx: &egui::Context) {
        let Some(image) = self.field.with_surface(color_image).flatten() else {
            return;
        };
        upload(ctx, &mut self.field_texture, "particle_field", image);
    }

    /// Copies the grain surface only when a new tile was blitted or the
    /// texture is missing.
    fn upload_grain(&mut self, ctx: &egui::Context) {
        let regenerations = self.grain.regenerations();
        if self.grain_texture.is_some() && self.uploaded_regenerations == Some(regenerations) {
            return;
        }
        let Some(image) = self.grain.with_surface(color_image).flatten() else {
            return;
        };
        upload(ctx, &mut self.grain_texture, "grain_overlay", image);
        self.uploaded_regenerations = Some(regenerations);
    }

    /// Builds the top panel UI (pause and restart controls).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.paused { "▶ Run" } else { "⏸ Pause" })
                    .clicked()
                {
                    self.paused = !self.paused;
                }

                if ui.button("Restart").clicked() {
                    self.restart();
                }

                if ui
                    .add_enabled(self.is_running(), egui::Button::new("Stop"))
                    .clicked()
                {
                    self.stop();
                }
            });
        });
    }

    /// Builds the bottom status bar (viewport, frame, pull and grain counters).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt = {:.3} s", self.last_dt));
                ui.separator();
                let size = self.viewport.size();
                ui.label(format!("viewport = {}x{}", size.width, size.height));
                ui.label(format!("frames = {}", self.field.frames_drawn()));
                ui.label(format!("particles = {}", self.field.particles().len()));
                let pull = self.field.pull_stats();
                ui.label(format!(
                    "pulled = {} (mean {:.2} px/frame)",
                    pull.pulled, pull.mean_impulse
                ));
                ui.label(format!("grain tiles = {}", self.grain.regenerations()));
            });
        });
    }

    /// Builds the central panel: drives the effects and paints them.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
                let rect = response.rect;
                let painter = ui.painter_at(rect);

                self.advance(viewport_size_for(rect));
                self.upload_field(ctx);
                self.upload_grain(ctx);

                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                if let Some(tex) = &self.field_texture {
                    painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
                }
                if let Some(tex) = &self.grain_texture {
                    painter.image(tex.id(), rect, uv, grain_tint(self.cfg.grain.opacity));
                }

                // Cursor follower.
                self.last_dt = ctx.input(|i| i.stable_dt);
                match response.hover_pos() {
                    Some(p) => self.cursor.set_target(Vec2::new(p.x, p.y)),
                    None => self.cursor.clear_target(),
                }
                self.cursor.advance(self.last_dt);
                if self.cursor.is_visible() {
                    let c = self.cursor.position();
                    painter.circle(
                        egui::pos2(c.x, c.y),
                        self.cursor.diameter() / 2.0,
                        egui::Color32::from_white_alpha(200),
                        egui::Stroke::new(1.0, egui::Color32::BLACK),
                    );
                }

                if !self.paused {
                    ctx.request_repaint();
                }
            });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_central_panel(ctx);
    }
}

/// Whole-point size of `rect`, clamped at zero.
fn viewport_size_for(rect: egui::Rect) -> ViewportSize {
    ViewportSize::new(
        rect.width().max(0.0).floor() as u32,
        rect.height().max(0.0).floor() as u32,
    )
}

/// Tint that scales a premultiplied texture to `opacity`.
fn grain_tint(opacity: f32) -> egui::Color32 {
    egui::Color32::from_white_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn color_image(surface: &PixelSurface) -> Option<egui::ColorImage> {
    let size = surface.size();
    if size.is_empty() {
        return None;
    }
    Some(egui::ColorImage::from_rgba_unmultiplied(
        [size.width as usize, size.height as usize],
        surface.as_rgba(),
    ))
}

fn upload(
    ctx: &egui::Context,
    slot: &mut Option<egui::TextureHandle>,
    name: &str,
    image: egui::ColorImage,
) {
    match slot {
        Some(tex) => tex.set(image, egui::TextureOptions::LINEAR),
        None => *slot = Some(ctx.load_texture(name, image, egui::TextureOptions::LINEAR)),
    }
}
