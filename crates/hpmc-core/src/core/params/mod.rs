//! Per-type parameters consumed by the sampler.
//!
//! - [`store::ParameterStore`] holds shape records, move sizes, depletant fugacities and the
//!   shared move settings.
//! - [`overlap_matrix::OverlapMatrix`] is the symmetric enable/disable filter over type pairs.

pub mod overlap_matrix;
pub mod store;

pub use overlap_matrix::OverlapMatrix;
pub use store::{ParamError, ParameterStore, TypeParameters};
