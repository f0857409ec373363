use glam::Vec2;
use rand::Rng;

use crate::viewport::ViewportSize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Drawn radius in pixels, in `[1, 3)`. Never changes after spawn.
    pub radius: f32,
    /// Fill alpha, in `[0.2, 1)`. Never changes after spawn.
    pub opacity: f32,
}

#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
    pub particles: Vec<Particle>,
}

/// Uniform position over `[0, width) x [0, height)`.
///
/// An empty viewport has no interior; the origin is returned so the caller
/// never samples an empty range.
pub fn random_position(size: ViewportSize, rng: &mut impl Rng) -> Vec2 {
    if size.is_empty() {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.random_range(0.0..size.width as f32),
        rng.random_range(0.0..size.height as f32),
    )
}

/// Independent uniform components in `[-1, 1)`.
pub fn random_velocity(rng: &mut impl Rng) -> Vec2 {
    Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
}

impl Particle {
    pub fn spawn(size: ViewportSize, rng: &mut impl Rng) -> Self {
        Self {
            pos: random_position(size, rng),
            vel: random_velocity(rng),
            radius: rng.random_range(1.0..3.0),
            opacity: rng.random_range(0.2..1.0),
        }
    }

    /// Re-rolls position and velocity in place; `radius` and `opacity`
    /// are kept.
    pub fn respawn(&mut self, size: ViewportSize, rng: &mut impl Rng) {
        self.pos = random_position(size, rng);
        self.vel = random_velocity(rng);
    }
}

impl ParticleSet {
    pub fn from_parts(particles: Vec<Particle>) -> Self {
        Self { particles }
    }

    pub fn random_in_viewport(count: usize, size: ViewportSize, rng: &mut impl Rng) -> Self {
        let particles = (0..count).map(|_| Particle::spawn(size, rng)).collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn spawned_particles_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let size = ViewportSize::new(320, 200);
        let set = ParticleSet::random_in_viewport(500, size, &mut rng);

        assert_eq!(set.len(), 500);
        for p in &set.particles {
            assert!(size.contains(p.pos), "out of bounds: {:?}", p.pos);
            assert!((-1.0..1.0).contains(&p.vel.x) && (-1.0..1.0).contains(&p.vel.y));
            assert!((1.0..3.0).contains(&p.radius));
            assert!((0.2..1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn respawn_keeps_radius_and_opacity() {
        let mut rng = StdRng::seed_from_u64(3);
        let size = ViewportSize::new(100, 100);
        let mut p = Particle {
            pos: Vec2::new(-5.0, -5.0),
            vel: Vec2::new(9.0, 9.0),
            radius: 2.5,
            opacity: 0.4,
        };

        p.respawn(size, &mut rng);

        assert!(size.contains(p.pos));
        assert!(p.vel.x.abs() <= 1.0 && p.vel.y.abs() <= 1.0);
        assert_eq!(p.radius, 2.5);
        assert_eq!(p.opacity, 0.4);
    }

    #[test]
    fn empty_viewport_spawns_at_origin_without_panicking() {
        let mut rng = StdRng::seed_from_u64(0);
        let set = ParticleSet::random_in_viewport(4, ViewportSize::new(0, 0), &mut rng);
        assert!(set.particles.iter().all(|p| p.pos == Vec2::ZERO));
    }
}
