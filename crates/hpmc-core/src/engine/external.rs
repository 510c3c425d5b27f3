//! Energetic hooks consulted after the hard-overlap test.
//!
//! Energies are in units of kT. A move that survives the overlap test is accepted with
//! probability `min(1, exp(-ΔU))`, where ΔU sums the pair terms from a [`PatchEnergy`] over
//! every neighbor within its cutoff and the single-particle term from an [`ExternalField`].

use crate::core::models::ids::TypeId;
use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Orientation-dependent pair energy between particle centers.
pub trait PatchEnergy: Send + Sync {
    /// Center-to-center distance beyond which the energy vanishes.
    fn cutoff(&self) -> f64;

    /// Energy of particle `j` at `r_ij` relative to particle `i`.
    fn energy(
        &self,
        r_ij: &Vector3<f64>,
        type_i: TypeId,
        q_i: &UnitQuaternion<f64>,
        type_j: TypeId,
        q_j: &UnitQuaternion<f64>,
    ) -> f64;
}

pub trait ExternalField: Send + Sync {
    fn energy(
        &self,
        type_id: TypeId,
        position: &Point3<f64>,
        orientation: &UnitQuaternion<f64>,
    ) -> f64;
}

/// Isotropic attraction of depth `epsilon` out to `range`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWell {
    pub range: f64,
    pub epsilon: f64,
}

impl PatchEnergy for SquareWell {
    fn cutoff(&self) -> f64 {
        self.range
    }

    fn energy(
        &self,
        r_ij: &Vector3<f64>,
        _type_i: TypeId,
        _q_i: &UnitQuaternion<f64>,
        _type_j: TypeId,
        _q_j: &UnitQuaternion<f64>,
    ) -> f64 {
        if r_ij.norm_squared() <= self.range * self.range {
            -self.epsilon
        } else {
            0.0
        }
    }
}

/// Uniform field `U = strength * (position · direction)`, e.g. gravity along -z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearField {
    pub direction: Vector3<f64>,
    pub strength: f64,
}

impl ExternalField for LinearField {
    fn energy(
        &self,
        _type_id: TypeId,
        position: &Point3<f64>,
        _orientation: &UnitQuaternion<f64>,
    ) -> f64 {
        self.strength * position.coords.dot(&self.direction)
    }
}
