use crate::core::models::ids::TypeId;
use crate::core::shapes::{Shape, ShapeError, ShapeSpec};
use thiserror::Error;

pub const DEFAULT_D: f64 = 0.1;
pub const DEFAULT_A: f64 = 0.1;
pub const DEFAULT_MOVE_RATIO: f64 = 0.5;
pub const DEFAULT_NSELECT: u32 = 4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("Unknown particle type id {0}")]
    UnknownType(TypeId),
    #[error("Maximum {field} must be finite and non-negative, got {value}")]
    NegativeMoveSize { field: &'static str, value: f64 },
    #[error("move_ratio must lie in [0, 1], got {0}")]
    MoveRatioOutOfRange(f64),
    #[error("nselect must be at least 1")]
    ZeroNselect,
    #[error("Fugacity must be finite, got {0}")]
    NonFiniteFugacity(f64),
    #[error("Sweep radius must be finite and non-negative, got {0}")]
    NegativeSweepRadius(f64),
    #[error("Invalid shape for type {type_id}: {source}")]
    Shape {
        type_id: TypeId,
        #[source]
        source: ShapeError,
    },
}

/// A validated shape record together with the geometry built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeShape {
    pub spec: ShapeSpec,
    pub shape: Shape,
}

/// Everything the sampler needs to know about one particle type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameters {
    pub shape: Option<TypeShape>,
    /// Moves of this type are left out of the acceptance counters.
    pub ignore_statistics: bool,
    /// Maximum translation distance.
    pub d: f64,
    /// Maximum rotation angle in radians.
    pub a: f64,
    /// Implicit depletant fugacity; zero disables depletants of this type.
    pub fugacity: f64,
}

impl Default for TypeParameters {
    fn default() -> Self {
        Self {
            shape: None,
            ignore_statistics: false,
            d: DEFAULT_D,
            a: DEFAULT_A,
            fugacity: 0.0,
        }
    }
}

/// Per-type shape/move/depletant parameters plus the settings shared by all types.
///
/// Entries are created lazily: addressing a type id past the end grows the table with default
/// entries (no shape, `d = a = 0.1`, zero fugacity).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    types: Vec<TypeParameters>,
    move_ratio: f64,
    nselect: u32,
    quermass: bool,
    sweep_radius: f64,
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            move_ratio: DEFAULT_MOVE_RATIO,
            nselect: DEFAULT_NSELECT,
            quermass: false,
            sweep_radius: 0.0,
        }
    }
}

fn check_move_size(field: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParamError::NegativeMoveSize { field, value })
    }
}

impl ParameterStore {
    pub fn new(num_types: usize) -> Self {
        let mut store = Self::default();
        store.ensure_types(num_types);
        store
    }

    pub fn ensure_types(&mut self, num_types: usize) {
        if self.types.len() < num_types {
            self.types.resize_with(num_types, TypeParameters::default);
        }
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    pub fn get(&self, type_id: TypeId) -> Option<&TypeParameters> {
        self.types.get(type_id)
    }

    fn entry(&mut self, type_id: TypeId) -> &mut TypeParameters {
        self.ensure_types(type_id + 1);
        &mut self.types[type_id]
    }

    pub fn set_shape(&mut self, type_id: TypeId, spec: ShapeSpec) -> Result<(), ParamError> {
        let shape = spec
            .build()
            .map_err(|source| ParamError::Shape { type_id, source })?;
        self.entry(type_id).shape = Some(TypeShape { spec, shape });
        Ok(())
    }

    pub fn clear_shape(&mut self, type_id: TypeId) {
        if let Some(params) = self.types.get_mut(type_id) {
            params.shape = None;
        }
    }

    pub fn shape(&self, type_id: TypeId) -> Option<&Shape> {
        self.get(type_id)
            .and_then(|p| p.shape.as_ref())
            .map(|s| &s.shape)
    }

    pub fn shape_spec(&self, type_id: TypeId) -> Option<&ShapeSpec> {
        self.get(type_id)
            .and_then(|p| p.shape.as_ref())
            .map(|s| &s.spec)
    }

    pub fn d(&self, type_id: TypeId) -> f64 {
        self.get(type_id).map_or(DEFAULT_D, |p| p.d)
    }

    pub fn set_d(&mut self, type_id: TypeId, d: f64) -> Result<(), ParamError> {
        check_move_size("d", d)?;
        self.entry(type_id).d = d;
        Ok(())
    }

    pub fn set_d_all(&mut self, d: f64) -> Result<(), ParamError> {
        check_move_size("d", d)?;
        self.types.iter_mut().for_each(|p| p.d = d);
        Ok(())
    }

    pub fn a(&self, type_id: TypeId) -> f64 {
        self.get(type_id).map_or(DEFAULT_A, |p| p.a)
    }

    pub fn set_a(&mut self, type_id: TypeId, a: f64) -> Result<(), ParamError> {
        check_move_size("a", a)?;
        self.entry(type_id).a = a;
        Ok(())
    }

    pub fn set_a_all(&mut self, a: f64) -> Result<(), ParamError> {
        check_move_size("a", a)?;
        self.types.iter_mut().for_each(|p| p.a = a);
        Ok(())
    }

    pub fn fugacity(&self, type_id: TypeId) -> f64 {
        self.get(type_id).map_or(0.0, |p| p.fugacity)
    }

    /// Any finite value is accepted; the sign selects the insertion direction.
    pub fn set_fugacity(&mut self, type_id: TypeId, fugacity: f64) -> Result<(), ParamError> {
        if !fugacity.is_finite() {
            return Err(ParamError::NonFiniteFugacity(fugacity));
        }
        self.entry(type_id).fugacity = fugacity;
        Ok(())
    }

    pub fn ignore_statistics(&self, type_id: TypeId) -> bool {
        self.get(type_id).is_some_and(|p| p.ignore_statistics)
    }

    pub fn set_ignore_statistics(&mut self, type_id: TypeId, ignore: bool) {
        self.entry(type_id).ignore_statistics = ignore;
    }

    pub fn move_ratio(&self) -> f64 {
        self.move_ratio
    }

    pub fn set_move_ratio(&mut self, ratio: f64) -> Result<(), ParamError> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ParamError::MoveRatioOutOfRange(ratio));
        }
        self.move_ratio = ratio;
        Ok(())
    }

    pub fn nselect(&self) -> u32 {
        self.nselect
    }

    pub fn set_nselect(&mut self, nselect: u32) -> Result<(), ParamError> {
        if nselect == 0 {
            return Err(ParamError::ZeroNselect);
        }
        self.nselect = nselect;
        Ok(())
    }

    pub fn quermass(&self) -> bool {
        self.quermass
    }

    pub fn set_quermass(&mut self, quermass: bool) {
        self.quermass = quermass;
    }

    pub fn sweep_radius(&self) -> f64 {
        self.sweep_radius
    }

    pub fn set_sweep_radius(&mut self, radius: f64) -> Result<(), ParamError> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(ParamError::NegativeSweepRadius(radius));
        }
        self.sweep_radius = radius;
        Ok(())
    }

    /// Types with a non-zero fugacity, in id order.
    pub fn depletant_types(&self) -> Vec<TypeId> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, p)| p.fugacity != 0.0)
            .map(|(id, _)| id)
            .collect()
    }

    /// Largest circumsphere radius among the given types that have a shape.
    pub fn max_circumradius<I: IntoIterator<Item = TypeId>>(&self, types: I) -> f64 {
        types
            .into_iter()
            .filter_map(|t| self.shape(t))
            .map(Shape::circumsphere_radius)
            .fold(0.0, f64::max)
    }

    pub fn max_d<I: IntoIterator<Item = TypeId>>(&self, types: I) -> f64 {
        types.into_iter().map(|t| self.d(t)).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(diameter: f64) -> ShapeSpec {
        ShapeSpec::Sphere {
            diameter,
            orientable: false,
        }
    }

    #[test]
    fn entries_are_created_lazily_with_defaults() {
        let mut store = ParameterStore::new(0);
        assert_eq!(store.num_types(), 0);
        store.set_d(2, 0.3).unwrap();
        assert_eq!(store.num_types(), 3);
        assert_eq!(store.d(2), 0.3);
        assert_eq!(store.d(0), DEFAULT_D);
        assert_eq!(store.a(1), DEFAULT_A);
        assert!(store.shape(1).is_none());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut store = ParameterStore::new(1);
        assert!(matches!(
            store.set_d(0, -0.1),
            Err(ParamError::NegativeMoveSize { field: "d", .. })
        ));
        assert!(matches!(
            store.set_a(0, f64::NAN),
            Err(ParamError::NegativeMoveSize { field: "a", .. })
        ));
        assert_eq!(
            store.set_move_ratio(1.5),
            Err(ParamError::MoveRatioOutOfRange(1.5))
        );
        assert_eq!(store.set_nselect(0), Err(ParamError::ZeroNselect));
        assert_eq!(
            store.set_sweep_radius(-1.0),
            Err(ParamError::NegativeSweepRadius(-1.0))
        );
        assert!(store.set_fugacity(0, f64::INFINITY).is_err());
    }

    #[test]
    fn negative_fugacity_is_allowed() {
        let mut store = ParameterStore::new(2);
        store.set_fugacity(1, -2.5).unwrap();
        assert_eq!(store.fugacity(1), -2.5);
        assert_eq!(store.depletant_types(), vec![1]);
    }

    #[test]
    fn shape_errors_carry_type_id() {
        let mut store = ParameterStore::new(1);
        let err = store.set_shape(0, sphere(-1.0)).unwrap_err();
        assert!(matches!(err, ParamError::Shape { type_id: 0, .. }));
        assert!(store.shape(0).is_none());
    }

    #[test]
    fn set_all_applies_to_every_type() {
        let mut store = ParameterStore::new(3);
        store.set_d_all(0.25).unwrap();
        store.set_a_all(0.5).unwrap();
        assert!((0..3).all(|t| store.d(t) == 0.25 && store.a(t) == 0.5));
    }

    #[test]
    fn max_circumradius_ignores_unset_shapes() {
        let mut store = ParameterStore::new(3);
        store.set_shape(0, sphere(1.0)).unwrap();
        store.set_shape(2, sphere(3.0)).unwrap();
        assert_eq!(store.max_circumradius([0, 1]), 0.5);
        assert_eq!(store.max_circumradius(0..3), 1.5);
    }
}
