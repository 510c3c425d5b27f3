//! # Engine Module
//!
//! The stateful sampler. [`integrator::HpmcIntegrator`] owns the attached particle store and
//! drives sweeps of trial moves over it.
//!
//! ## Sweep Structure
//!
//! A sweep is `nselect` passes. Before each pass the [`cell_list`] is rebuilt if accumulated
//! motion could let two cells of one color interact. Each pass then walks the checkerboard
//! colors in a fixed order; the [`backend`] runs all cells of a color (serially or on the rayon
//! pool), each through the per-cell [`kernel`], and the integrator commits the staged moves
//! before the next color starts.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Seed, rebuild policy and backend choice
//! - **Trial Moves** ([`kernel`], [`depletants`]) - Move proposal, hard-overlap rejection and
//!   implicit-depletant rejection
//! - **Hooks** ([`external`], [`comm`]) - Patch energies, external fields and domain exchange
//! - **Statistics** ([`counters`]) - Accept/reject tallies and throughput
//! - **Checkpoints** ([`state`]) - Name-keyed parameter snapshots
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Random numbers for each trial are drawn from a stream keyed by seed, timestep, pass and
//! particle tag, so results do not depend on the backend or the thread count.

pub mod backend;
pub mod cell_list;
pub mod comm;
pub mod config;
pub(crate) mod context;
pub mod counters;
pub mod depletants;
pub mod error;
pub mod external;
pub mod integrator;
pub mod kernel;
pub mod progress;
pub mod state;
pub mod tasks;
pub(crate) mod utils;
