//! Read-only tasks run against the current configuration outside of sweeps.

pub mod overlaps;
