use crate::core::models::ids::TypeId;
use crate::core::params::ParamError;
use crate::core::shapes::ShapeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Particle type '{type_name}' is not configured: {reason}")]
    Configuration { type_name: String, reason: String },

    #[error("Invalid parameter: {0}")]
    Parameter(#[from] ParamError),

    #[error("Invalid shape: {0}")]
    Shape(#[from] ShapeError),

    #[error("Depletant type {type_id} cannot be sampled: {reason}")]
    Depletant { type_id: TypeId, reason: String },

    #[error("The integrator is not attached to a particle store")]
    Detached,

    #[error("Domain exchange failed: {0}")]
    Communication(String),

    #[error("Invalid integrator state: {0}")]
    State(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
