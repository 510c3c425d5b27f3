use super::ids::{Tag, TypeId};
use super::sim_box::SimBox;
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Tolerance on `|q|^2 - 1` used to flag orientations that are not unit quaternions.
pub const ORIENTATION_NORM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParticleError {
    #[error("Unknown particle type id {0}")]
    UnknownType(TypeId),
    #[error("Particle type '{0}' is already registered")]
    DuplicateType(String),
    #[error("Duplicate particle tag {0}")]
    DuplicateTag(Tag),
}

/// A single rigid particle: where it is, how it is oriented, and which type it belongs to.
///
/// The orientation is stored as a raw quaternion so that non-normalized input can be detected and
/// reported. It is never renormalized behind the caller's back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub tag: Tag,
    pub type_id: TypeId,
    pub position: Point3<f64>,
    pub orientation: Quaternion<f64>,
}

impl ParticleRecord {
    pub fn new(tag: Tag, type_id: TypeId, position: Point3<f64>) -> Self {
        Self {
            tag,
            type_id,
            position,
            orientation: Quaternion::identity(),
        }
    }

    pub fn with_orientation(mut self, orientation: Quaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn has_unit_orientation(&self) -> bool {
        is_unit_quaternion(&self.orientation)
    }

    /// Rotation represented by the stored quaternion, taken as-is.
    #[inline]
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::new_unchecked(self.orientation)
    }
}

#[inline]
pub fn is_unit_quaternion(q: &Quaternion<f64>) -> bool {
    (q.norm_squared() - 1.0).abs() <= ORIENTATION_NORM_TOLERANCE
}

/// The particle state an integrator operates on: box, type table, and particle records.
///
/// Types are registered by name and addressed by dense [`TypeId`]s in registration order.
/// Particles are stored in a flat vector; their index in that vector is stable for the lifetime of
/// the store while tags are user-facing identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleStore {
    sim_box: SimBox,
    type_names: Vec<String>,
    type_lookup: HashMap<String, TypeId>,
    particles: Vec<ParticleRecord>,
    tag_lookup: HashMap<Tag, usize>,
}

impl ParticleStore {
    pub fn new(sim_box: SimBox) -> Self {
        Self {
            sim_box,
            type_names: Vec::new(),
            type_lookup: HashMap::new(),
            particles: Vec::new(),
            tag_lookup: HashMap::new(),
        }
    }

    /// Creates a store with the given type names registered in order.
    ///
    /// # Errors
    ///
    /// Returns [`ParticleError::DuplicateType`] if a name appears twice.
    pub fn with_types<S: AsRef<str>>(
        sim_box: SimBox,
        names: &[S],
    ) -> Result<Self, ParticleError> {
        let mut store = Self::new(sim_box);
        for name in names {
            store.add_type(name.as_ref())?;
        }
        Ok(store)
    }

    pub fn add_type(&mut self, name: &str) -> Result<TypeId, ParticleError> {
        if self.type_lookup.contains_key(name) {
            return Err(ParticleError::DuplicateType(name.to_string()));
        }
        let id = self.type_names.len();
        self.type_names.push(name.to_string());
        self.type_lookup.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.type_lookup.get(name).copied()
    }

    pub fn type_name(&self, id: TypeId) -> Option<&str> {
        self.type_names.get(id).map(String::as_str)
    }

    pub fn type_names(&self) -> &[String] {
        &self.type_names
    }

    pub fn num_types(&self) -> usize {
        self.type_names.len()
    }

    /// Adds a particle at `position` (wrapped into the box) and returns its tag.
    ///
    /// Tags are assigned sequentially, one past the largest tag present.
    pub fn push(
        &mut self,
        type_id: TypeId,
        position: Point3<f64>,
        orientation: Quaternion<f64>,
    ) -> Result<Tag, ParticleError> {
        let tag = self
            .particles
            .iter()
            .map(|p| p.tag + 1)
            .max()
            .unwrap_or(0);
        self.insert(ParticleRecord {
            tag,
            type_id,
            position,
            orientation,
        })?;
        Ok(tag)
    }

    /// Inserts a fully specified record, keeping its tag.
    pub fn insert(&mut self, mut record: ParticleRecord) -> Result<(), ParticleError> {
        if record.type_id >= self.type_names.len() {
            return Err(ParticleError::UnknownType(record.type_id));
        }
        if self.tag_lookup.contains_key(&record.tag) {
            return Err(ParticleError::DuplicateTag(record.tag));
        }
        record.position = self.sim_box.wrap(&record.position);
        self.tag_lookup.insert(record.tag, self.particles.len());
        self.particles.push(record);
        Ok(())
    }

    pub fn sim_box(&self) -> &SimBox {
        &self.sim_box
    }

    pub fn particles(&self) -> &[ParticleRecord] {
        &self.particles
    }

    pub fn particle(&self, index: usize) -> Option<&ParticleRecord> {
        self.particles.get(index)
    }

    pub fn index_of_tag(&self, tag: Tag) -> Option<usize> {
        self.tag_lookup.get(&tag).copied()
    }

    pub fn by_tag(&self, tag: Tag) -> Option<&ParticleRecord> {
        self.index_of_tag(tag).map(|i| &self.particles[i])
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Commits a new pose for the particle at `index`. The position is wrapped into the box.
    ///
    /// Returns `false` if the index is out of range.
    pub fn set_pose(
        &mut self,
        index: usize,
        position: Point3<f64>,
        orientation: Quaternion<f64>,
    ) -> bool {
        let wrapped = self.sim_box.wrap(&position);
        match self.particles.get_mut(index) {
            Some(record) => {
                record.position = wrapped;
                record.orientation = orientation;
                true
            }
            None => false,
        }
    }

    /// Positions and orientations of every particle, in index order.
    pub fn poses(&self) -> Vec<(Point3<f64>, Quaternion<f64>)> {
        self.particles
            .iter()
            .map(|p| (p.position, p.orientation))
            .collect()
    }

    /// Puts back poses taken with [`poses`](Self::poses). Entries past the end of the store are
    /// ignored.
    pub fn restore_poses(&mut self, poses: &[(Point3<f64>, Quaternion<f64>)]) {
        for (record, (position, orientation)) in self.particles.iter_mut().zip(poses) {
            record.position = *position;
            record.orientation = *orientation;
        }
    }

    /// Types that have at least one particle in the store.
    pub fn active_types(&self) -> BTreeSet<TypeId> {
        self.particles.iter().map(|p| p.type_id).collect()
    }

    /// Index of the first particle whose orientation is not a unit quaternion, if any.
    pub fn first_non_unit_orientation(&self) -> Option<usize> {
        self.particles.iter().position(|p| !p.has_unit_orientation())
    }

    /// Minimum-image separation vector pointing from particle `i` to particle `j`.
    pub fn separation(&self, i: usize, j: usize) -> Vector3<f64> {
        self.sim_box
            .min_image(&(self.particles[j].position - self.particles[i].position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParticleStore {
        ParticleStore::with_types(SimBox::cubic(10.0).unwrap(), &["A", "B"]).unwrap()
    }

    #[test]
    fn types_are_registered_in_order() {
        let store = store();
        assert_eq!(store.type_id("A"), Some(0));
        assert_eq!(store.type_id("B"), Some(1));
        assert_eq!(store.type_name(1), Some("B"));
        assert_eq!(store.type_id("C"), None);
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut store = store();
        assert_eq!(
            store.add_type("A"),
            Err(ParticleError::DuplicateType("A".to_string()))
        );
    }

    #[test]
    fn push_assigns_sequential_tags_and_wraps_positions() {
        let mut store = store();
        let t0 = store
            .push(0, Point3::new(6.0, 0.0, 0.0), Quaternion::identity())
            .unwrap();
        let t1 = store
            .push(1, Point3::new(0.0, 0.0, 0.0), Quaternion::identity())
            .unwrap();
        assert_eq!((t0, t1), (0, 1));
        assert!((store.particles()[0].position.x - -4.0).abs() < 1e-12);
        assert_eq!(store.index_of_tag(1), Some(1));
    }

    #[test]
    fn push_rejects_unknown_type() {
        let mut store = store();
        let result = store.push(5, Point3::origin(), Quaternion::identity());
        assert_eq!(result, Err(ParticleError::UnknownType(5)));
    }

    #[test]
    fn insert_rejects_duplicate_tags() {
        let mut store = store();
        store.insert(ParticleRecord::new(7, 0, Point3::origin())).unwrap();
        let result = store.insert(ParticleRecord::new(7, 1, Point3::origin()));
        assert_eq!(result, Err(ParticleError::DuplicateTag(7)));
    }

    #[test]
    fn active_types_only_lists_populated_types() {
        let mut store = store();
        store.push(1, Point3::origin(), Quaternion::identity()).unwrap();
        assert_eq!(store.active_types().into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn non_unit_orientation_is_detected() {
        let mut store = store();
        store.push(0, Point3::origin(), Quaternion::identity()).unwrap();
        store
            .push(0, Point3::new(1.0, 0.0, 0.0), Quaternion::new(2.0, 0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(store.first_non_unit_orientation(), Some(1));
    }

    #[test]
    fn separation_uses_minimum_image() {
        let mut store = store();
        store
            .push(0, Point3::new(-4.5, 0.0, 0.0), Quaternion::identity())
            .unwrap();
        store
            .push(0, Point3::new(4.5, 0.0, 0.0), Quaternion::identity())
            .unwrap();
        let r = store.separation(0, 1);
        assert!((r.x - -1.0).abs() < 1e-12);
    }
}
