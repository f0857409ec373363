//! Film-grain overlay.
//!
//! Generating per-pixel noise for the whole viewport every frame is
//! expensive, so the overlay randomizes one small square tile every
//! `refresh_interval` frames and repeats it across the surface. Frames in
//! between draw nothing and the previous pattern holds.

use std::{cell::RefCell, rc::Rc};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::{
    config::GrainConfig,
    error::{ConfigResult, SurfaceResult},
    frame_loop::{FrameLoop, FrameStep},
    scheduler::Scheduler,
    surface::{ImageData, Surface},
    viewport::Viewport,
};

/// Square block of random-luminance pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrainTile {
    image: ImageData,
}

impl GrainTile {
    /// Allocates a transparent tile of `size x size` pixels.
    pub fn blank(size: u32) -> Self {
        Self {
            image: ImageData::new(size, size),
        }
    }

    pub fn generate(size: u32, alpha: u8, rng: &mut impl Rng) -> Self {
        let mut tile = Self::blank(size);
        tile.regenerate(alpha, rng);
        tile
    }

    /// Overwrites every pixel: luminance uniform in `[0, 255)` copied to
    /// R, G and B, alpha fixed.
    pub fn regenerate(&mut self, alpha: u8, rng: &mut impl Rng) {
        for px in self.image.data_mut().chunks_exact_mut(4) {
            let v: u8 = rng.random_range(0..255);
            px[0] = v;
            px[1] = v;
            px[2] = v;
            px[3] = alpha;
        }
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &ImageData {
        &self.image
    }
}

/// Tile origins covering `[0, width) x [0, height)` at the given stride.
///
/// Origins start at zero and stop at the first one past the far edge, so
/// the last row and column may hang off the surface and get clipped.
pub fn tile_origins(width: u32, height: u32, stride: (f32, f32)) -> Vec<(i32, i32)> {
    let (sx, sy) = stride;
    if !(sx > 0.0 && sy > 0.0) {
        return Vec::new();
    }
    let (w, h) = (width as f32, height as f32);
    let mut origins = Vec::new();
    let mut x = 0.0f32;
    while x < w {
        let mut y = 0.0f32;
        while y < h {
            origins.push((x.floor() as i32, y.floor() as i32));
            y += sy;
        }
        x += sx;
    }
    origins
}

struct GrainState<R> {
    cfg: GrainConfig,
    rng: R,
    tile: GrainTile,
    frame_count: u64,
    regenerations: u64,
}

impl<S: Surface, R: Rng> FrameStep<S> for GrainState<R> {
    fn frame(&mut self, surface: &mut S) -> SurfaceResult<()> {
        self.frame_count += 1;
        if self.frame_count % u64::from(self.cfg.refresh_interval) != 0 {
            return Ok(());
        }
        let size = surface.size();
        if size.is_empty() {
            return Ok(());
        }

        surface.clear()?;
        self.tile.regenerate(self.cfg.alpha, &mut self.rng);
        for (x, y) in tile_origins(size.width, size.height, self.cfg.stride()) {
            surface.put_image(self.tile.image(), x, y)?;
        }

        self.regenerations += 1;
        debug!(
            frame = self.frame_count,
            regenerations = self.regenerations,
            "regenerated grain tile"
        );
        Ok(())
    }
}

/// Grain overlay effect bound to one surface at a time.
pub struct GrainOverlay<S: Surface + 'static, R: Rng + 'static = StdRng> {
    state: Rc<RefCell<GrainState<R>>>,
    frame_loop: Option<FrameLoop<S, GrainState<R>>>,
}

impl<S: Surface + 'static> GrainOverlay<S, StdRng> {
    pub fn new(cfg: GrainConfig) -> ConfigResult<Self> {
        Self::with_rng(cfg, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(cfg: GrainConfig, seed: u64) -> ConfigResult<Self> {
        Self::with_rng(cfg, StdRng::seed_from_u64(seed))
    }
}

impl<S: Surface + 'static, R: Rng + 'static> GrainOverlay<S, R> {
    pub fn with_rng(cfg: GrainConfig, rng: R) -> ConfigResult<Self> {
        cfg.validate()?;
        let state = GrainState {
            tile: GrainTile::blank(cfg.tile_size),
            cfg,
            rng,
            frame_count: 0,
            regenerations: 0,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            frame_loop: None,
        })
    }

    /// Starts the overlay on `surface`, restarting the frame counter.
    pub fn start<Sch>(&mut self, surface: S, viewport: &Viewport, scheduler: &Sch)
    where
        Sch: Scheduler + Clone + 'static,
    {
        self.stop();
        self.state.borrow_mut().frame_count = 0;

        self.frame_loop = Some(FrameLoop::start(
            "grain_overlay",
            surface,
            Rc::clone(&self.state),
            viewport,
            Rc::new(scheduler.clone()),
        ));
    }

    pub fn stop(&mut self) {
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoop::is_running)
    }

    pub fn config(&self) -> GrainConfig {
        self.state.borrow().cfg.clone()
    }

    /// Frames seen since the last start, drawn or not.
    pub fn frame_count(&self) -> u64 {
        self.state.borrow().frame_count
    }

    /// Total number of tile regenerations.
    pub fn regenerations(&self) -> u64 {
        self.state.borrow().regenerations
    }

    /// Copy of the most recently generated tile, if any.
    pub fn last_tile(&self) -> Option<GrainTile> {
        let state = self.state.borrow();
        (state.regenerations > 0).then(|| state.tile.clone())
    }

    pub fn with_surface<T>(&self, f: impl FnOnce(&S) -> T) -> Option<T> {
        self.frame_loop.as_ref().map(|l| f(&*l.surface().borrow()))
    }

    pub fn with_surface_mut<T>(&self, f: impl FnOnce(&mut S) -> T) -> Option<T> {
        self.frame_loop
            .as_ref()
            .map(|l| f(&mut *l.surface().borrow_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        raster::PixelSurface,
        recording::{DrawCommand, RecordingSurface},
        scheduler::FrameScheduler,
        viewport::ViewportSize,
    };

    #[test]
    fn tile_pixels_are_grey_with_fixed_alpha() {
        let mut rng = StdRng::seed_from_u64(9);
        let tile = GrainTile::generate(16, 15, &mut rng);

        assert_eq!(tile.size(), 16);
        assert_eq!(tile.image().data().len(), 16 * 16 * 4);
        for px in tile.image().data().chunks_exact(4) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
            assert!(px[0] < 255);
            assert_eq!(px[3], 15);
        }
    }

    #[test]
    fn origins_cover_viewport_with_clipped_edges() {
        let origins = tile_origins(600, 300, (250.0, 250.0));
        assert_eq!(
            origins,
            vec![(0, 0), (0, 250), (250, 0), (250, 250), (500, 0), (500, 250)]
        );
    }

    #[test]
    fn scaled_stride_leaves_gaps_between_tiles() {
        let origins = tile_origins(500, 100, (200.0, 200.0));
        assert_eq!(origins, vec![(0, 0), (200, 0), (400, 0)]);
        assert!(tile_origins(100, 100, (0.0, 1.0)).is_empty());
    }

    #[test]
    fn regeneration_happens_only_on_interval_frames() {
        let viewport = Viewport::new(ViewportSize::new(300, 200));
        let sched = FrameScheduler::new();
        let cfg = GrainConfig {
            tile_size: 100,
            refresh_interval: 3,
            ..GrainConfig::default()
        };
        let mut fx: GrainOverlay<RecordingSurface> = GrainOverlay::seeded(cfg, 1).unwrap();
        fx.start(RecordingSurface::default(), &viewport, &sched);
        fx.with_surface_mut(|s| s.take_commands());

        sched.tick();
        sched.tick();
        assert_eq!(fx.with_surface(|s| s.commands().len()), Some(0));
        assert!(fx.last_tile().is_none());

        sched.tick();
        let cmds = fx.with_surface_mut(|s| s.take_commands()).unwrap();
        assert_eq!(cmds[0], DrawCommand::Clear);
        // 3 columns x 2 rows of 100px tiles.
        assert_eq!(cmds.len(), 1 + 6);
        assert!(cmds[1..].iter().all(|c| matches!(
            c,
            DrawCommand::PutImage {
                width: 100,
                height: 100,
                ..
            }
        )));
        assert_eq!(fx.regenerations(), 1);
        assert_eq!(fx.frame_count(), 3);
    }

    #[test]
    fn raster_overlay_is_tiled_copy_of_one_tile() {
        let viewport = Viewport::new(ViewportSize::new(8, 4));
        let sched = FrameScheduler::new();
        let cfg = GrainConfig {
            tile_size: 4,
            refresh_interval: 1,
            ..GrainConfig::default()
        };
        let mut fx: GrainOverlay<PixelSurface> = GrainOverlay::seeded(cfg, 2).unwrap();
        fx.start(PixelSurface::new(ViewportSize::default()), &viewport, &sched);

        sched.tick();

        let tile = fx.last_tile().unwrap();
        fx.with_surface(|s| {
            for y in 0..4 {
                for x in 0..8 {
                    let i = ((y * 4 + x % 4) * 4) as usize;
                    let expected = &tile.image().data()[i..i + 4];
                    assert_eq!(&s.pixel(x, y).unwrap()[..], expected);
                }
            }
        })
        .unwrap();
    }

    #[test]
    fn restart_resets_frame_counter() {
        let viewport = Viewport::new(ViewportSize::new(10, 10));
        let sched = FrameScheduler::new();
        let mut fx: GrainOverlay<RecordingSurface> =
            GrainOverlay::seeded(GrainConfig::default(), 3).unwrap();

        fx.start(RecordingSurface::default(), &viewport, &sched);
        sched.tick();
        sched.tick();
        assert_eq!(fx.frame_count(), 2);

        fx.start(RecordingSurface::default(), &viewport, &sched);
        assert_eq!(fx.frame_count(), 0);
        assert_eq!(viewport.listener_count(), 1);
    }

    #[test]
    fn zero_tile_size_is_rejected() {
        let cfg = GrainConfig {
            tile_size: 0,
            ..GrainConfig::default()
        };
        assert!(GrainOverlay::<RecordingSurface>::new(cfg).is_err());
    }
}
