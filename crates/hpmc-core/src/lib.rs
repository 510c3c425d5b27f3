//! # HPMC Core Library
//!
//! A hard-particle Monte Carlo (HPMC) integration engine: it samples configurations of rigid,
//! impenetrable shapes under an excluded-volume constraint, optionally mediated by implicit
//! depletants that reproduce many-body entropic forces without simulating them explicitly.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless particle models (`ParticleStore`, `SimBox`), the closed
//!   family of shape kinds with their overlap predicates, per-type parameters and the overlap
//!   matrix, and snapshot I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful sampler. It owns the cell list and its
//!   checkerboard coloring, the trial-move kernel, the implicit-depletant sampler, move counters,
//!   and the execution backends that run one color of cells at a time.
//!
//! - **[`workflows`]: The Public API.** The run controller that drives a sequence of sweeps with
//!   timing, progress reporting and cancellation between sweeps.

pub mod core;
pub mod engine;
pub mod workflows;
