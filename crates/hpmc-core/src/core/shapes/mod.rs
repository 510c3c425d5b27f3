//! The closed family of hard shapes and their overlap predicates.
//!
//! [`ShapeSpec`] is the serializable per-type record; [`ShapeSpec::build`] turns it into a
//! [`Shape`], whose variants own immutable geometry (vertex lists, facets, constituent lists and
//! bounding-volume hierarchies). [`test_overlap`] dispatches on the pair of variants.

pub mod bvh;
pub mod convex;
pub mod faceted;
pub mod gjk;
pub mod mesh;
pub mod metadata;
pub mod overlap;
pub mod polygon;
pub mod shape;
pub mod spec;
pub mod sphinx;
pub mod union;

pub use overlap::{overlap_in_frame, test_overlap};
pub use shape::{Shape, ShapeKind};
pub use spec::{ShapeError, ShapeSpec};
