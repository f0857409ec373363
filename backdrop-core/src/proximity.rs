use crate::types::ParticleId;
use glam::Vec2;

/// Per-frame scratch buffer recording each particle's relation to the
/// attractor.
///
/// For each `ParticleId`, this buffer stores:
///
/// - The distance to the attractor measured **before** the particle moved.
/// - The pull coefficient `pull_strength / distance` (zero when no pull
///   was applied).
/// - The velocity change that was actually applied.
///
/// The respawn test uses the pre-move distance, so it has to be captured
/// before integration changes the positions. The coefficient and impulse
/// are diagnostics, summarized by [`ProximityBuffer::pull_stats`] for the
/// host's status display.
///
/// Internally, `dist[i]`, `force[i]` and `impulse[i]` correspond to
/// particle `i`.
/// Per-frame pull summary.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PullStats {
    /// Particles that received an impulse.
    pub pulled: usize,
    /// Mean impulse magnitude over the pulled particles.
    pub mean_impulse: f32,
}

#[derive(Debug)]
pub struct ProximityBuffer {
    /// Pre-move distance to the attractor for each particle.
    dist: Vec<f32>,
    /// Scalar pull coefficient for each particle.
    force: Vec<f32>,
    /// Velocity change applied this frame for each particle.
    impulse: Vec<Vec2>,
}

impl ProximityBuffer {
    /// Creates a new [`ProximityBuffer`] with the given length.
    ///
    /// Distances start at `f32::INFINITY` so an untouched slot never
    /// counts as captured; forces and impulses start at zero.
    ///
    /// ### Parameters
    /// - `len` - Number of particles this buffer can hold.
    ///
    /// ### Returns
    /// A new [`ProximityBuffer`] of length `len`.
    pub fn with_len(len: usize) -> Self {
        Self {
            dist: vec![f32::INFINITY; len],
            force: vec![0.0; len],
            impulse: vec![Vec2::ZERO; len],
        }
    }

    /// Ensures that the internal storage has exactly the given length and
    /// resets every entry, even if the length was already correct.
    ///
    /// ### Parameters
    /// - `len` - Desired length of the internal buffers.
    pub fn ensure_len(&mut self, len: usize) {
        if self.dist.len() != len {
            self.dist.resize(len, f32::INFINITY);
            self.force.resize(len, 0.0);
            self.impulse.resize(len, Vec2::ZERO);
        }
        self.clear();
    }

    /// Resets all entries without changing the length.
    pub fn clear(&mut self) {
        self.dist.fill(f32::INFINITY);
        self.force.fill(0.0);
        self.impulse.fill(Vec2::ZERO);
    }

    /// Stores this frame's measurements for one particle.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds.
    #[inline]
    pub fn record(&mut self, id: ParticleId, dist: f32, force: f32, impulse: Vec2) {
        self.dist[id] = dist;
        self.force[id] = force;
        self.impulse[id] = impulse;
    }

    #[inline]
    pub fn distance(&self, id: ParticleId) -> f32 {
        self.dist[id]
    }

    #[inline]
    pub fn force(&self, id: ParticleId) -> f32 {
        self.force[id]
    }

    #[inline]
    pub fn impulse(&self, id: ParticleId) -> Vec2 {
        self.impulse[id]
    }

    pub fn len(&self) -> usize {
        self.dist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dist.is_empty()
    }

    /// Summarizes the pull applied this frame.
    pub fn pull_stats(&self) -> PullStats {
        let mut pulled = 0;
        let mut total = 0.0;
        for (&force, impulse) in self.force.iter().zip(&self.impulse) {
            if force > 0.0 {
                pulled += 1;
                total += impulse.length();
            }
        }
        PullStats {
            pulled,
            mean_impulse: if pulled == 0 { 0.0 } else { total / pulled as f32 },
        }
    }

    /// Returns an iterator over the particles whose pre-move distance is
    /// strictly below `capture_radius`.
    pub fn captured_indices(&self, capture_radius: f32) -> impl Iterator<Item = ParticleId> + '_ {
        self.dist
            .iter()
            .enumerate()
            .filter_map(move |(i, &d)| (d < capture_radius).then_some(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_len_initializes_untouched_state() {
        let buf = ProximityBuffer::with_len(4);

        assert_eq!(buf.len(), 4);
        for id in 0..4 {
            assert_eq!(buf.distance(id), f32::INFINITY);
            assert_eq!(buf.force(id), 0.0);
            assert_eq!(buf.impulse(id), Vec2::ZERO);
        }
        assert_eq!(buf.captured_indices(30.0).count(), 0);
    }

    #[test]
    fn ensure_len_resizes_and_clears() {
        let mut buf = ProximityBuffer::with_len(2);
        buf.record(1, 10.0, 0.05, Vec2::new(0.5, 0.0));

        buf.ensure_len(2);
        assert_eq!(buf.distance(1), f32::INFINITY);
        assert_eq!(buf.impulse(1), Vec2::ZERO);

        buf.ensure_len(5);
        assert_eq!(buf.len(), 5);
        assert!(!buf.is_empty());
    }

    #[test]
    fn pull_stats_ignore_unpulled_particles() {
        let mut buf = ProximityBuffer::with_len(3);
        assert_eq!(buf.pull_stats(), PullStats::default());

        buf.record(0, 100.0, 0.005, Vec2::new(0.5, 0.0));
        buf.record(1, 40.0, 0.0, Vec2::ZERO);
        buf.record(2, 80.0, 0.00625, Vec2::new(0.0, -0.5));

        let stats = buf.pull_stats();
        assert_eq!(stats.pulled, 2);
        assert!((stats.mean_impulse - 0.5).abs() < 1e-6);
    }

    #[test]
    fn captured_indices_uses_strict_bound() {
        let mut buf = ProximityBuffer::with_len(3);
        buf.record(0, 29.0, 0.0, Vec2::ZERO);
        buf.record(1, 30.0, 0.0, Vec2::ZERO);
        buf.record(2, 31.0, 0.0, Vec2::ZERO);

        let captured: Vec<_> = buf.captured_indices(30.0).collect();
        assert_eq!(captured, vec![0]);
    }
}
