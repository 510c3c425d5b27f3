//! # Models Module
//!
//! Data structures describing the simulation state consumed by the engine.
//!
//! - [`sim_box`] - Orthorhombic periodic box in two or three dimensions
//! - [`particle`] - Particle records and the [`ParticleStore`](particle::ParticleStore)
//! - [`builder`] - Lattice initializers for fresh configurations
//! - [`ids`] - Index aliases shared across the crate
//!
//! The integrator takes ownership of the particle store while attached and mutates it only when a
//! trial move is accepted; detaching hands it back.

pub mod builder;
pub mod ids;
pub mod particle;
pub mod sim_box;
