//! The "black hole" particle field.
//!
//! A fixed population of particles drifts toward the viewport center.
//! Every frame paints the background (fading trail or hard clear), the
//! occluding disc at the attractor, then the particles after one physics
//! step.

use std::{cell::RefCell, rc::Rc};

use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, trace};

use crate::{
    config::{ParticleConfig, TrailMode},
    error::{ConfigResult, SurfaceResult},
    frame_loop::{FrameLoop, FrameStep},
    particle::{Particle, ParticleSet},
    phases,
    proximity::{ProximityBuffer, PullStats},
    scheduler::Scheduler,
    surface::{GradientStop, Rgba, Surface},
    types::ParticleId,
    viewport::{Viewport, ViewportSize},
};

struct FieldState<R> {
    cfg: ParticleConfig,
    particles: ParticleSet,
    acc: ProximityBuffer,
    rng: R,
    frames_drawn: u64,
    last_attractor: Option<Vec2>,
    last_respawned: Vec<ParticleId>,
    /// Set when started on an empty viewport; the population is rolled on
    /// the first frame that has area.
    needs_spawn: bool,
}

impl<R: Rng> FieldState<R> {
    fn spawn_population(&mut self, size: ViewportSize) {
        self.particles = ParticleSet::random_in_viewport(self.cfg.population, size, &mut self.rng);
        self.needs_spawn = size.is_empty();
    }

    fn paint_background<S: Surface>(&self, surface: &mut S) -> SurfaceResult<()> {
        match self.cfg.trail {
            TrailMode::Fade { alpha } => surface.fill(self.cfg.background.with_alpha(alpha)),
            TrailMode::Clear => {
                surface.clear()?;
                surface.fill(self.cfg.background.with_alpha(1.0))
            }
        }
    }
}

impl<S: Surface, R: Rng> FrameStep<S> for FieldState<R> {
    fn frame(&mut self, surface: &mut S) -> SurfaceResult<()> {
        let size = surface.size();
        if size.is_empty() {
            return Ok(());
        }
        if self.needs_spawn {
            self.spawn_population(size);
            debug!(
                width = size.width,
                height = size.height,
                "spawned deferred particle population"
            );
        }
        let attractor = size.center();
        self.last_attractor = Some(attractor);

        self.paint_background(surface)?;
        surface.fill_radial_gradient(
            attractor,
            self.cfg.disc_radius,
            &[
                GradientStop::new(0.0, Rgba::BLACK),
                GradientStop::new(1.0, Rgba::TRANSPARENT),
            ],
        )?;

        phases::attraction_phase(&mut self.particles, attractor, &self.cfg, &mut self.acc);
        phases::integration_phase(&mut self.particles);
        self.last_respawned =
            phases::respawn_phase(&mut self.particles, &self.acc, size, &self.cfg, &mut self.rng);
        if !self.last_respawned.is_empty() {
            trace!(count = self.last_respawned.len(), "respawned particles");
        }

        for p in &self.particles.particles {
            surface.fill_circle(p.pos, p.radius, self.cfg.particle_color.with_alpha(p.opacity))?;
        }

        self.frames_drawn += 1;
        Ok(())
    }
}

/// Particle field effect bound to one surface at a time.
///
/// ### Lifecycle
/// - [`ParticleField::start`] takes ownership of a surface, sizes it to the
///   viewport, spawns the population and requests the first frame.
/// - Each scheduler tick advances physics once and redraws.
/// - [`ParticleField::stop`] cancels the pending frame and the resize
///   listener. The surface stays available through
///   [`ParticleField::with_surface`] until the next `start`.
pub struct ParticleField<S: Surface + 'static, R: Rng + 'static = StdRng> {
    state: Rc<RefCell<FieldState<R>>>,
    frame_loop: Option<FrameLoop<S, FieldState<R>>>,
}

impl<S: Surface + 'static> ParticleField<S, StdRng> {
    /// Creates a field seeded from the thread-local OS-backed generator.
    pub fn new(cfg: ParticleConfig) -> ConfigResult<Self> {
        Self::with_rng(cfg, StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(cfg: ParticleConfig, seed: u64) -> ConfigResult<Self> {
        Self::with_rng(cfg, StdRng::seed_from_u64(seed))
    }
}

impl<S: Surface + 'static, R: Rng + 'static> ParticleField<S, R> {
    pub fn with_rng(cfg: ParticleConfig, rng: R) -> ConfigResult<Self> {
        cfg.validate()?;
        let state = FieldState {
            acc: ProximityBuffer::with_len(cfg.population),
            particles: ParticleSet::default(),
            cfg,
            rng,
            frames_drawn: 0,
            last_attractor: None,
            last_respawned: Vec::new(),
            needs_spawn: false,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            frame_loop: None,
        })
    }

    /// Starts drawing on `surface`. A running field is stopped first.
    pub fn start<Sch>(&mut self, surface: S, viewport: &Viewport, scheduler: &Sch)
    where
        Sch: Scheduler + Clone + 'static,
    {
        self.stop();

        {
            let mut state = self.state.borrow_mut();
            state.spawn_population(viewport.size());
            state.last_attractor = None;
            state.last_respawned.clear();
        }

        self.frame_loop = Some(FrameLoop::start(
            "particle_field",
            surface,
            Rc::clone(&self.state),
            viewport,
            Rc::new(scheduler.clone()),
        ));
    }

    /// Stops the loop. Safe to call when not running.
    pub fn stop(&mut self) {
        if let Some(frame_loop) = &self.frame_loop {
            frame_loop.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoop::is_running)
    }

    pub fn config(&self) -> ParticleConfig {
        self.state.borrow().cfg.clone()
    }

    /// Number of frames that completed a full step and draw.
    pub fn frames_drawn(&self) -> u64 {
        self.state.borrow().frames_drawn
    }

    /// Attractor used by the most recent drawn frame.
    pub fn last_attractor(&self) -> Option<Vec2> {
        self.state.borrow().last_attractor
    }

    /// Ids respawned by the most recent drawn frame.
    pub fn last_respawned(&self) -> Vec<ParticleId> {
        self.state.borrow().last_respawned.clone()
    }

    /// Pull applied by the most recent drawn frame.
    pub fn pull_stats(&self) -> PullStats {
        self.state.borrow().acc.pull_stats()
    }

    pub fn particles(&self) -> Vec<Particle> {
        self.state.borrow().particles.particles.clone()
    }

    /// Replaces the population, e.g. to place particles deliberately.
    /// Cancels a pending deferred spawn.
    pub fn set_particles(&mut self, particles: Vec<Particle>) {
        let mut state = self.state.borrow_mut();
        state.particles = ParticleSet::from_parts(particles);
        state.needs_spawn = false;
    }

    /// Runs `f` against the bound surface. `None` before the first start.
    pub fn with_surface<T>(&self, f: impl FnOnce(&S) -> T) -> Option<T> {
        self.frame_loop.as_ref().map(|l| f(&*l.surface().borrow()))
    }

    pub fn with_surface_mut<T>(&self, f: impl FnOnce(&mut S) -> T) -> Option<T> {
        self.frame_loop
            .as_ref()
            .map(|l| f(&mut *l.surface().borrow_mut()))
    }
}
