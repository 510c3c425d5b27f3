//! Implicit depletant sampling.
//!
//! Depletants are never stored. For a trial move of particle `i` and a depletant species of
//! fugacity `f`, a Poisson number of depletants with mean `|f| * V` is scattered uniformly in
//! the insertion sphere of volume `V` around one configuration of `i` (the new one when `f > 0`,
//! the old one when `f < 0`). The move is rejected if any such depletant overlaps `i` in that
//! configuration, misses `i` in the other one, and overlaps no other particle. In quermass mode
//! the depletant is a sphere of the configured sweep radius.

use super::error::EngineError;
use super::utils::sampling::{random_orientation, uniform_in_ball};
use crate::core::models::ids::TypeId;
use crate::core::models::sim_box::SimBox;
use crate::core::params::ParameterStore;
use crate::core::shapes::convex::Sphere;
use crate::core::shapes::{Shape, test_overlap};
use nalgebra::{Point3, UnitQuaternion};
use rand::Rng;
use rand_distr::{Distribution, Poisson};
use std::f64::consts::PI;

/// Insertion sphere of one species around one colloid type.
#[derive(Debug, Clone)]
struct Insertion {
    radius: f64,
    mean: f64,
    count: Poisson<f64>,
}

#[derive(Debug, Clone)]
pub struct DepletantSpecies {
    pub type_id: TypeId,
    pub fugacity: f64,
    pub shape: Shape,
    /// Indexed by colloid type; `None` where the type has no shape or the mean count is zero.
    insertions: Vec<Option<Insertion>>,
}

impl DepletantSpecies {
    fn new(
        type_id: TypeId,
        fugacity: f64,
        shape: Shape,
        params: &ParameterStore,
        planar: bool,
    ) -> Result<Self, EngineError> {
        let insertions = (0..params.num_types())
            .map(|colloid_type| {
                let Some(colloid) = params.shape(colloid_type) else {
                    return Ok(None);
                };
                let radius = colloid.circumsphere_radius() + shape.circumsphere_radius();
                let volume = if planar {
                    PI * radius * radius
                } else {
                    4.0 / 3.0 * PI * radius.powi(3)
                };
                let mean = fugacity.abs() * volume;
                if mean == 0.0 {
                    return Ok(None);
                }
                let count = Poisson::new(mean).map_err(|e| EngineError::Depletant {
                    type_id,
                    reason: format!("mean count {mean} around type {colloid_type}: {e}"),
                })?;
                Ok(Some(Insertion {
                    radius,
                    mean,
                    count,
                }))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(Self {
            type_id,
            fugacity,
            shape,
            insertions,
        })
    }

    pub fn radius(&self) -> f64 {
        self.shape.circumsphere_radius()
    }

    /// Expected number of depletants inserted per trial move of a `colloid_type` particle.
    pub fn mean_count(&self, colloid_type: TypeId) -> f64 {
        self.insertion(colloid_type)
            .map_or(0.0, |insertion| insertion.mean)
    }

    fn insertion(&self, colloid_type: TypeId) -> Option<&Insertion> {
        self.insertions.get(colloid_type)?.as_ref()
    }
}

/// Depletant species active for one sweep, resolved from the parameter store.
#[derive(Debug, Clone, Default)]
pub struct DepletantPlan {
    species: Vec<DepletantSpecies>,
}

impl DepletantPlan {
    /// Resolves every species with non-zero fugacity. Species without a shape are skipped
    /// unless quermass mode supplies one.
    pub fn from_params(params: &ParameterStore, planar: bool) -> Result<Self, EngineError> {
        let species = params
            .depletant_types()
            .into_iter()
            .filter_map(|type_id| {
                let shape = if params.quermass() {
                    Shape::Sphere(Sphere::new(params.sweep_radius()))
                } else {
                    params.shape(type_id)?.clone()
                };
                Some(DepletantSpecies::new(
                    type_id,
                    params.fugacity(type_id),
                    shape,
                    params,
                    planar,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { species })
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn species(&self) -> &[DepletantSpecies] {
        &self.species
    }

    pub fn max_radius(&self) -> f64 {
        self.species
            .iter()
            .map(DepletantSpecies::radius)
            .fold(0.0, f64::max)
    }
}

/// One placement of the moving particle.
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub position: &'a Point3<f64>,
    pub orientation: &'a UnitQuaternion<f64>,
}

/// Samples depletants of one species around `insertion` and reports whether any of them vetoes
/// the move. `overlaps_others` tests a depletant pose against every particle except the moving one.
#[allow(clippy::too_many_arguments)]
pub fn vetoes_move(
    species: &DepletantSpecies,
    colloid_type: TypeId,
    colloid: &Shape,
    insertion: Placement<'_>,
    other: Placement<'_>,
    sim_box: &SimBox,
    rng: &mut impl Rng,
    mut overlaps_others: impl FnMut(&Point3<f64>, &UnitQuaternion<f64>) -> bool,
) -> bool {
    let Some(sphere) = species.insertion(colloid_type) else {
        return false;
    };
    let planar = sim_box.is_2d();
    let count = sphere.count.sample(rng) as u64;
    let to_other = sim_box.min_image(&(other.position - insertion.position));
    let orientable = species.shape.is_orientable();

    for _ in 0..count {
        let offset = uniform_in_ball(rng, sphere.radius, planar);
        let orientation = if orientable {
            random_orientation(rng, planar)
        } else {
            UnitQuaternion::identity()
        };

        if !test_overlap(
            &species.shape,
            colloid,
            &(-offset),
            &orientation,
            insertion.orientation,
        ) {
            continue;
        }
        if test_overlap(
            &species.shape,
            colloid,
            &(to_other - offset),
            &orientation,
            other.orientation,
        ) {
            continue;
        }
        let position = sim_box.wrap(&(insertion.position + offset));
        if overlaps_others(&position, &orientation) {
            continue;
        }
        return true;
    }
    false
}
