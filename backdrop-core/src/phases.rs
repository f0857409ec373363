//! Per-frame simulation phases for the particle field.
//!
//! The update for one frame looks like:
//! 1. [`attraction_phase`]: each particle measures its distance to the
//!    attractor, recorded in a [`ProximityBuffer`], and far particles get
//!    pulled toward it.
//! 2. [`integration_phase`]: positions advance by one frame of velocity.
//! 3. [`respawn_phase`]: particles that were captured by the attractor or
//!    left the viewport are re-rolled at a random position.

use glam::Vec2;
use rand::Rng;

use crate::{
    config::ParticleConfig, particle::ParticleSet, proximity::ProximityBuffer,
    types::ParticleId, viewport::ViewportSize,
};

/// Pulls every particle toward `attractor`.
///
/// For each particle:
///
/// 1. Computes `d = attractor - pos` and `dist = |d|`.
/// 2. If `dist > cfg.impulse_min_distance` (and `dist` is non-zero), adds
///    `d * (cfg.pull_strength / dist)` to the velocity. The scalar
///    coefficient grows as the particle closes in.
/// 3. Records `dist`, the coefficient, and the applied impulse in `acc`.
///
/// The buffer is resized (and cleared) to the particle count at the start
/// of this phase via [`ProximityBuffer::ensure_len`].
///
/// ### Parameters
/// - `particles` - Particle population; velocities are updated in place.
/// - `attractor` - Pull target, normally the viewport center.
/// - `cfg` - Supplies `pull_strength` and `impulse_min_distance`.
/// - `acc` - Scratch buffer receiving per-particle measurements.
pub fn attraction_phase(
    particles: &mut ParticleSet,
    attractor: Vec2,
    cfg: &ParticleConfig,
    acc: &mut ProximityBuffer,
) {
    acc.ensure_len(particles.len());

    for (id, p) in particles.particles.iter_mut().enumerate() {
        let d = attractor - p.pos;
        let dist = d.length();

        // A particle sitting exactly on the attractor has no direction.
        if dist > cfg.impulse_min_distance && dist > 0.0 {
            let force = cfg.pull_strength / dist;
            let impulse = d * force;
            p.vel += impulse;
            acc.record(id, dist, force, impulse);
        } else {
            acc.record(id, dist, 0.0, Vec2::ZERO);
        }
    }
}

/// Advances each particle by its velocity: `pos += vel`.
pub fn integration_phase(particles: &mut ParticleSet) {
    for p in &mut particles.particles {
        p.pos += p.vel;
    }
}

/// Respawns captured and escaped particles.
///
/// A particle is respawned when either:
///
/// - its pre-move distance recorded in `acc` is strictly below
///   `cfg.capture_radius`, or
/// - its post-move position lies outside `[0, width) x [0, height)`.
///
/// Respawning re-rolls position (uniform over the viewport) and velocity
/// (uniform in `[-1, 1)` per axis). Radius and opacity are kept.
///
/// ### Parameters
/// - `particles` - Particle population to check.
/// - `acc` - Measurements from this frame's [`attraction_phase`].
/// - `size` - Current viewport size.
/// - `cfg` - Supplies `capture_radius`.
/// - `rng` - Random source for the new positions and velocities.
///
/// ### Returns
/// The ids of respawned particles, in ascending order.
pub fn respawn_phase(
    particles: &mut ParticleSet,
    acc: &ProximityBuffer,
    size: ViewportSize,
    cfg: &ParticleConfig,
    rng: &mut impl Rng,
) -> Vec<ParticleId> {
    let mut respawned = Vec::new();

    for (id, p) in particles.particles.iter_mut().enumerate() {
        let captured = acc.distance(id) < cfg.capture_radius;
        if captured || !size.contains(p.pos) {
            p.respawn(size, rng);
            respawned.push(id);
        }
    }
    respawned
}
