//! Per-cell trial-move kernel.
//!
//! A [`SweepKernel`] is a read-only view of everything one color of one pass needs. Running a
//! cell never touches the particle store: accepted moves are staged in the cell's own
//! [`CellOutcome`], and later trials in the same cell see them through that overlay. The
//! integrator commits all outcomes of a color before the next color starts.

use super::cell_list::CellList;
use super::counters::MoveCounters;
use super::depletants::{DepletantPlan, DepletantSpecies, Placement, vetoes_move};
use super::external::{ExternalField, PatchEnergy};
use super::utils::sampling::{Stream, small_rotation, trial_rng, uniform_in_ball};
use crate::core::models::ids::TypeId;
use crate::core::models::particle::ParticleStore;
use crate::core::params::ParameterStore;
use crate::core::params::overlap_matrix::InteractionTable;
use crate::core::shapes::{Shape, test_overlap};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::Rng;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseUpdate {
    pub index: usize,
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

/// Accepted moves and tallies from one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellOutcome {
    pub cell: usize,
    pub updates: Vec<PoseUpdate>,
    pub counters: MoveCounters,
    /// Largest accepted displacement, used to bound cell-list drift.
    pub max_displacement: f64,
}

impl CellOutcome {
    fn staged(&self, index: usize) -> Option<&PoseUpdate> {
        self.updates.iter().find(|u| u.index == index)
    }
}

#[derive(Clone, Copy)]
pub struct SweepKernel<'a> {
    pub(crate) store: &'a ParticleStore,
    pub(crate) params: &'a ParameterStore,
    pub(crate) interactions: &'a InteractionTable,
    pub(crate) cells: &'a CellList,
    /// Periodic image offsets within the interaction range; just the zero vector in large boxes.
    pub(crate) images: &'a [Vector3<f64>],
    pub(crate) depletants: &'a DepletantPlan,
    pub(crate) patch: Option<&'a dyn PatchEnergy>,
    pub(crate) field: Option<&'a dyn ExternalField>,
    pub(crate) seed: u64,
    pub(crate) timestep: u64,
    pub(crate) pass: u32,
}

impl<'a> SweepKernel<'a> {
    /// Offers one trial move to every particle binned in `cell`, in bin order.
    pub fn run_cell(&self, cell: usize) -> CellOutcome {
        let mut outcome = CellOutcome {
            cell,
            ..Default::default()
        };
        for &index in self.cells.members(cell) {
            self.trial(index, cell, &mut outcome);
        }
        outcome
    }

    fn pose(&self, index: usize, outcome: &CellOutcome) -> (Point3<f64>, UnitQuaternion<f64>) {
        match outcome.staged(index) {
            Some(update) => (update.position, update.orientation),
            None => {
                let record = &self.store.particles()[index];
                (record.position, record.rotation())
            }
        }
    }

    fn trial(&self, index: usize, cell: usize, outcome: &mut CellOutcome) {
        let record = &self.store.particles()[index];
        let type_id = record.type_id;
        let Some(params) = self.params.get(type_id) else {
            return;
        };
        let Some(shape) = params.shape.as_ref().map(|s| &s.shape) else {
            return;
        };

        let sim_box = self.store.sim_box();
        let planar = sim_box.is_2d();
        let mut rng = trial_rng(self.seed, self.timestep, self.pass, record.tag, Stream::Move);
        let translate = rng.r#gen::<f64>() < self.params.move_ratio();

        let old_position = record.position;
        let old_orientation = record.rotation();
        let (new_position, new_orientation, displacement) = if translate {
            let step = uniform_in_ball(&mut rng, params.d, planar);
            (sim_box.wrap(&(old_position + step)), old_orientation, step.norm())
        } else if shape.is_orientable() {
            let rotation = small_rotation(&mut rng, params.a, planar);
            let q = rotation * old_orientation;
            (old_position, q, 0.0)
        } else {
            (old_position, old_orientation, 0.0)
        };

        let mut accepted = !self.overlaps_neighbors(
            index,
            type_id,
            shape,
            &new_position,
            &new_orientation,
            cell,
            outcome,
        );

        if accepted && !self.depletants.is_empty() {
            accepted = !self.depletants_veto(
                index,
                type_id,
                shape,
                (&old_position, &old_orientation),
                (&new_position, &new_orientation),
                cell,
                outcome,
            );
        }

        if accepted && (self.patch.is_some() || self.field.is_some()) {
            let delta = self.energy_change(
                index,
                type_id,
                (&old_position, &old_orientation),
                (&new_position, &new_orientation),
                cell,
                outcome,
            );
            accepted = delta <= 0.0 || rng.r#gen::<f64>() < (-delta).exp();
        }

        trace!(tag = record.tag, translate, accepted, "Trial move.");
        if !params.ignore_statistics {
            outcome.counters.record(translate, accepted);
        }
        if accepted {
            outcome.updates.push(PoseUpdate {
                index,
                position: new_position,
                orientation: new_orientation,
            });
            outcome.max_displacement = outcome.max_displacement.max(displacement);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn overlaps_neighbors(
        &self,
        index: usize,
        type_id: TypeId,
        shape: &Shape,
        position: &Point3<f64>,
        orientation: &UnitQuaternion<f64>,
        cell: usize,
        outcome: &mut CellOutcome,
    ) -> bool {
        let sim_box = self.store.sim_box();
        let radius = shape.circumsphere_radius();
        let mut checks = 0;
        let mut found = false;

        'neighbors: for j in self.cells.neighbors(cell) {
            if j == index {
                continue;
            }
            let other_type = self.store.particles()[j].type_id;
            if !self.interactions.enabled(type_id, other_type) {
                continue;
            }
            let Some(other_shape) = self.params.shape(other_type) else {
                continue;
            };
            let (other_position, other_orientation) = self.pose(j, outcome);
            let base = sim_box.min_image(&(other_position - position));
            let reach = radius + other_shape.circumsphere_radius();
            for image in self.images {
                let r_ij = base + image;
                if r_ij.norm_squared() > reach * reach {
                    continue;
                }
                checks += 1;
                if test_overlap(shape, other_shape, &r_ij, orientation, &other_orientation) {
                    found = true;
                    break 'neighbors;
                }
            }
        }

        if !found && self.images.len() > 1 && self.interactions.enabled(type_id, type_id) {
            for image in self.images.iter().filter(|v| **v != Vector3::zeros()) {
                if image.norm() > 2.0 * radius {
                    continue;
                }
                checks += 1;
                if test_overlap(shape, shape, image, orientation, orientation) {
                    found = true;
                    break;
                }
            }
        }

        outcome.counters.overlap_checks += checks;
        found
    }

    #[allow(clippy::too_many_arguments)]
    fn depletants_veto(
        &self,
        index: usize,
        type_id: TypeId,
        shape: &Shape,
        old: (&Point3<f64>, &UnitQuaternion<f64>),
        new: (&Point3<f64>, &UnitQuaternion<f64>),
        cell: usize,
        outcome: &CellOutcome,
    ) -> bool {
        let record = &self.store.particles()[index];
        let mut rng = trial_rng(
            self.seed,
            self.timestep,
            self.pass,
            record.tag,
            Stream::Depletant,
        );
        let sim_box = self.store.sim_box();
        let old = Placement {
            position: old.0,
            orientation: old.1,
        };
        let new = Placement {
            position: new.0,
            orientation: new.1,
        };

        self.depletants.species().iter().any(|species| {
            if !self.interactions.enabled(species.type_id, type_id) {
                return false;
            }
            let (insertion, other) = if species.fugacity > 0.0 {
                (new, old)
            } else {
                (old, new)
            };
            vetoes_move(
                species,
                type_id,
                shape,
                insertion,
                other,
                sim_box,
                &mut rng,
                |position, orientation| {
                    self.depletant_blocked(index, species, position, orientation, cell, outcome)
                },
            )
        })
    }

    /// Whether a depletant at this pose overlaps any particle other than `index`.
    fn depletant_blocked(
        &self,
        index: usize,
        species: &DepletantSpecies,
        position: &Point3<f64>,
        orientation: &UnitQuaternion<f64>,
        cell: usize,
        outcome: &CellOutcome,
    ) -> bool {
        let sim_box = self.store.sim_box();
        let radius = species.radius();
        self.cells.neighbors(cell).any(|j| {
            if j == index {
                return false;
            }
            let other_type = self.store.particles()[j].type_id;
            if !self.interactions.enabled(species.type_id, other_type) {
                return false;
            }
            let Some(other_shape) = self.params.shape(other_type) else {
                return false;
            };
            let (other_position, other_orientation) = self.pose(j, outcome);
            let base = sim_box.min_image(&(other_position - position));
            let reach = radius + other_shape.circumsphere_radius();
            self.images.iter().any(|image| {
                let r = base + image;
                r.norm_squared() <= reach * reach
                    && test_overlap(&species.shape, other_shape, &r, orientation, &other_orientation)
            })
        })
    }

    fn energy_change(
        &self,
        index: usize,
        type_id: TypeId,
        old: (&Point3<f64>, &UnitQuaternion<f64>),
        new: (&Point3<f64>, &UnitQuaternion<f64>),
        cell: usize,
        outcome: &CellOutcome,
    ) -> f64 {
        let mut delta = 0.0;
        if let Some(field) = self.field {
            delta += field.energy(type_id, new.0, new.1) - field.energy(type_id, old.0, old.1);
        }
        let Some(patch) = self.patch else {
            return delta;
        };

        let sim_box = self.store.sim_box();
        let cutoff2 = patch.cutoff() * patch.cutoff();
        for j in self.cells.neighbors(cell) {
            if j == index {
                continue;
            }
            let other_type = self.store.particles()[j].type_id;
            let (other_position, other_orientation) = self.pose(j, outcome);
            for (sign, (position, orientation)) in [(1.0, new), (-1.0, old)] {
                let base = sim_box.min_image(&(other_position - position));
                for image in self.images {
                    let r_ij = base + image;
                    if r_ij.norm_squared() <= cutoff2 {
                        delta += sign
                            * patch.energy(
                                &r_ij,
                                type_id,
                                orientation,
                                other_type,
                                &other_orientation,
                            );
                    }
                }
            }
        }
        delta
    }
}
