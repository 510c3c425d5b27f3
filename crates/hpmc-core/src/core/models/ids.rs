/// Index of a particle type in the type table of a [`ParticleStore`](super::particle::ParticleStore).
pub type TypeId = usize;

/// Stable particle identifier, independent of storage order.
pub type Tag = u32;
