//! # Workflows Module
//!
//! Entry points that drive an attached [`HpmcIntegrator`](crate::engine::integrator::HpmcIntegrator)
//! through a complete run.
//!
//! - **Run Controller** ([`run`]) - A fixed number of sweeps with timing, progress reporting,
//!   optional counter reset and cancellation between sweeps.

pub mod run;
