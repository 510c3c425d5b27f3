//! Reading and writing particle configurations.

pub mod snapshot;
