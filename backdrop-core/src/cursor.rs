//! Ambient cursor follower: a small disc that eases toward the pointer.
//!
//! Purely presentational; it consumes pointer positions but never claims
//! input. The host draws it, typically with a difference blend so it
//! stays visible over both light and dark content.

use glam::Vec2;

use crate::config::CursorConfig;

#[derive(Clone, Debug)]
pub struct CursorFollower {
    cfg: CursorConfig,
    target: Option<Vec2>,
    position: Vec2,
}

impl CursorFollower {
    pub fn new(cfg: CursorConfig) -> Self {
        Self {
            cfg,
            target: None,
            position: Vec2::ZERO,
        }
    }

    /// Points the follower at `pos`. The first target is adopted directly
    /// so the disc does not sweep in from the origin.
    pub fn set_target(&mut self, pos: Vec2) {
        if self.target.is_none() {
            self.position = pos;
        }
        self.target = Some(pos);
    }

    /// Pointer left the surface.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    /// Moves toward the target by an exponential ease over `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let Some(target) = self.target else {
            return;
        };
        let tau = self.cfg.transition_secs;
        if tau <= 0.0 || !dt.is_finite() {
            self.position = target;
            return;
        }
        let k = 1.0 - (-dt.max(0.0) / tau).exp();
        self.position += (target - self.position) * k;
    }

    /// Center of the disc.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Top-left corner of the disc's bounding square.
    pub fn top_left(&self) -> Vec2 {
        self.position - Vec2::splat(self.cfg.diameter / 2.0)
    }

    pub fn diameter(&self) -> f32 {
        self.cfg.diameter
    }

    /// `true` when enabled and a pointer position is known.
    pub fn is_visible(&self) -> bool {
        self.cfg.enabled && self.target.is_some()
    }
}
