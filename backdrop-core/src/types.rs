/// Identifier for a particle in a [`crate::particle::ParticleSet`].
///
/// This is an index into `ParticleSet::particles`. Respawning a particle
/// reuses its slot, so an id stays valid for the lifetime of the set.
pub type ParticleId = usize;
