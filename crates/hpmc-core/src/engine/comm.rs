use super::error::EngineError;
use crate::core::models::particle::ParticleStore;

/// Domain-decomposition seam, called once per sweep before the first pass.
///
/// An implementation migrates particles that left the local domain and refreshes ghost copies
/// within `ghost_width` of its boundaries. It returns `true` when the store was modified, which
/// forces a cell-list rebuild.
pub trait Communicator: Send {
    fn name(&self) -> &'static str;

    fn exchange(&mut self, store: &mut ParticleStore, ghost_width: f64)
    -> Result<bool, EngineError>;
}

/// Single-domain run: the whole box is local and there is nothing to exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDomain;

impl Communicator for LocalDomain {
    fn name(&self) -> &'static str {
        "local"
    }

    fn exchange(
        &mut self,
        _store: &mut ParticleStore,
        _ghost_width: f64,
    ) -> Result<bool, EngineError> {
        Ok(false)
    }
}
