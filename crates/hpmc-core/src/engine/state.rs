//! Serializable checkpoint of the integrator's parameters.
//!
//! Types are keyed by name, so a state captured in one run can be restored into a store whose
//! type ids are ordered differently. Names with no matching type are skipped.

use super::error::EngineError;
use crate::core::models::particle::ParticleStore;
use crate::core::params::{OverlapMatrix, ParameterStore};
use crate::core::shapes::ShapeSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeState {
    pub d: f64,
    pub a: f64,
    #[serde(default)]
    pub fugacity: f64,
    #[serde(default)]
    pub ignore_statistics: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapEntry {
    pub a: String,
    pub b: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorState {
    pub timestep: u64,
    pub move_ratio: f64,
    pub nselect: u32,
    pub quermass: bool,
    pub sweep_radius: f64,
    pub types: BTreeMap<String, TypeState>,
    #[serde(default)]
    pub overlap_checks: Vec<OverlapEntry>,
}

impl IntegratorState {
    pub fn capture(
        store: &ParticleStore,
        params: &ParameterStore,
        matrix: &OverlapMatrix,
        timestep: u64,
    ) -> Self {
        let types = store
            .type_names()
            .iter()
            .enumerate()
            .map(|(id, name)| {
                let state = TypeState {
                    d: params.d(id),
                    a: params.a(id),
                    fugacity: params.fugacity(id),
                    ignore_statistics: params.ignore_statistics(id),
                    shape: params.shape_spec(id).cloned(),
                };
                (name.clone(), state)
            })
            .collect();

        let overlap_checks = matrix
            .entries()
            .into_iter()
            .filter_map(|((a, b), enabled)| {
                Some(OverlapEntry {
                    a: store.type_name(a)?.to_string(),
                    b: store.type_name(b)?.to_string(),
                    enabled,
                })
            })
            .collect();

        Self {
            timestep,
            move_ratio: params.move_ratio(),
            nselect: params.nselect(),
            quermass: params.quermass(),
            sweep_radius: params.sweep_radius(),
            types,
            overlap_checks,
        }
    }

    /// Writes this state into `params` and `matrix`. Nothing is modified unless every record
    /// validates.
    pub fn apply(
        &self,
        store: &ParticleStore,
        params: &mut ParameterStore,
        matrix: &mut OverlapMatrix,
    ) -> Result<(), EngineError> {
        let mut next_params = params.clone();
        let mut next_matrix = matrix.clone();
        next_params.ensure_types(store.num_types());

        next_params.set_move_ratio(self.move_ratio)?;
        next_params.set_nselect(self.nselect)?;
        next_params.set_quermass(self.quermass);
        next_params.set_sweep_radius(self.sweep_radius)?;

        for (name, state) in &self.types {
            let Some(id) = store.type_id(name) else {
                debug!(type_name = %name, "Skipping saved parameters for unknown type.");
                continue;
            };
            next_params.set_d(id, state.d)?;
            next_params.set_a(id, state.a)?;
            next_params.set_fugacity(id, state.fugacity)?;
            next_params.set_ignore_statistics(id, state.ignore_statistics);
            match &state.shape {
                Some(spec) => next_params.set_shape(id, spec.clone())?,
                None => next_params.clear_shape(id),
            }
        }

        for entry in &self.overlap_checks {
            match (store.type_id(&entry.a), store.type_id(&entry.b)) {
                (Some(a), Some(b)) => next_matrix.set(a, b, entry.enabled),
                _ => debug!(
                    a = %entry.a,
                    b = %entry.b,
                    "Skipping saved overlap entry for unknown type."
                ),
            }
        }

        *params = next_params;
        *matrix = next_matrix;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::State(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::State(e.to_string()))
    }
}
