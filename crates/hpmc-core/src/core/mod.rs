//! # Core Module
//!
//! Stateless building blocks of the HPMC engine.
//!
//! - **Particle Representation** ([`models`]) - Periodic box, particle records and the particle store
//! - **Geometry** ([`shapes`]) - The closed set of shape kinds, bounding-volume hierarchies and overlap predicates
//! - **Parameters** ([`params`]) - Per-type shape/move/depletant parameters and the overlap matrix
//! - **File I/O** ([`io`]) - CSV snapshots of particle configurations
//! - **Utilities** ([`utils`]) - Quaternion and random-sampling helpers
//!
//! Nothing in this layer keeps run state; the [`crate::engine`] layer owns everything that
//! changes while sweeps are running.

pub mod io;
pub mod models;
pub mod params;
pub mod shapes;
pub mod utils;
