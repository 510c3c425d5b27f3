use super::progress::ProgressReporter;
use crate::core::models::particle::ParticleStore;
use crate::core::params::ParameterStore;
use crate::core::params::overlap_matrix::InteractionTable;

/// Borrowed view handed to read-only tasks such as the overlap scan.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub store: &'a ParticleStore,
    pub params: &'a ParameterStore,
    pub interactions: &'a InteractionTable,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        store: &'a ParticleStore,
        params: &'a ParameterStore,
        interactions: &'a InteractionTable,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            store,
            params,
            interactions,
            reporter,
        }
    }
}
