use super::convex::{ConvexPolytope, Ellipsoid, Sphere};
use super::faceted::FacetedEllipsoid;
use super::gjk::{PointSupport, SupportMap};
use super::mesh::Mesh;
use super::polygon::SimplePolygon;
use super::sphinx::Sphinx;
use super::union::ShapeUnion;
use nalgebra::Vector3;
use std::fmt;

/// Name of a shape family, without its geometric payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeKind {
    Sphere,
    ConvexPolygon,
    SimplePolygon,
    ConvexSpheropolygon,
    Polyhedron,
    ConvexPolyhedron,
    FacetedEllipsoid,
    Sphinx,
    ConvexSpheropolyhedron,
    Ellipsoid,
    SphereUnion,
    ConvexSpheropolyhedronUnion,
    FacetedEllipsoidUnion,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Sphere => "Sphere",
            ShapeKind::ConvexPolygon => "ConvexPolygon",
            ShapeKind::SimplePolygon => "SimplePolygon",
            ShapeKind::ConvexSpheropolygon => "ConvexSpheropolygon",
            ShapeKind::Polyhedron => "Polyhedron",
            ShapeKind::ConvexPolyhedron => "ConvexPolyhedron",
            ShapeKind::FacetedEllipsoid => "FacetedEllipsoid",
            ShapeKind::Sphinx => "Sphinx",
            ShapeKind::ConvexSpheropolyhedron => "ConvexSpheropolyhedron",
            ShapeKind::Ellipsoid => "Ellipsoid",
            ShapeKind::SphereUnion => "SphereUnion",
            ShapeKind::ConvexSpheropolyhedronUnion => "ConvexSpheropolyhedronUnion",
            ShapeKind::FacetedEllipsoidUnion => "FacetedEllipsoidUnion",
        }
    }

    /// Kinds that only make sense in a two-dimensional box.
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            ShapeKind::ConvexPolygon | ShapeKind::SimplePolygon | ShapeKind::ConvexSpheropolygon
        )
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed family of hard shapes. Each variant owns its immutable geometric payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    ConvexPolygon(ConvexPolytope),
    SimplePolygon(SimplePolygon),
    ConvexSpheropolygon(ConvexPolytope),
    Polyhedron(Mesh),
    ConvexPolyhedron(ConvexPolytope),
    FacetedEllipsoid(FacetedEllipsoid),
    Sphinx(Sphinx),
    ConvexSpheropolyhedron(ConvexPolytope),
    Ellipsoid(Ellipsoid),
    SphereUnion(ShapeUnion),
    ConvexSpheropolyhedronUnion(ShapeUnion),
    FacetedEllipsoidUnion(ShapeUnion),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Sphere(_) => ShapeKind::Sphere,
            Shape::ConvexPolygon(_) => ShapeKind::ConvexPolygon,
            Shape::SimplePolygon(_) => ShapeKind::SimplePolygon,
            Shape::ConvexSpheropolygon(_) => ShapeKind::ConvexSpheropolygon,
            Shape::Polyhedron(_) => ShapeKind::Polyhedron,
            Shape::ConvexPolyhedron(_) => ShapeKind::ConvexPolyhedron,
            Shape::FacetedEllipsoid(_) => ShapeKind::FacetedEllipsoid,
            Shape::Sphinx(_) => ShapeKind::Sphinx,
            Shape::ConvexSpheropolyhedron(_) => ShapeKind::ConvexSpheropolyhedron,
            Shape::Ellipsoid(_) => ShapeKind::Ellipsoid,
            Shape::SphereUnion(_) => ShapeKind::SphereUnion,
            Shape::ConvexSpheropolyhedronUnion(_) => ShapeKind::ConvexSpheropolyhedronUnion,
            Shape::FacetedEllipsoidUnion(_) => ShapeKind::FacetedEllipsoidUnion,
        }
    }

    /// Radius of the smallest origin-centered sphere enclosing the shape.
    pub fn circumsphere_radius(&self) -> f64 {
        match self {
            Shape::Sphere(s) => s.radius,
            Shape::ConvexPolygon(p)
            | Shape::ConvexSpheropolygon(p)
            | Shape::ConvexPolyhedron(p)
            | Shape::ConvexSpheropolyhedron(p) => p.circumradius(),
            Shape::SimplePolygon(p) => p.circumradius(),
            Shape::Polyhedron(m) => m.circumradius(),
            Shape::FacetedEllipsoid(f) => f.circumradius(),
            Shape::Sphinx(s) => s.circumradius(),
            Shape::Ellipsoid(e) => e.circumradius(),
            Shape::SphereUnion(u)
            | Shape::ConvexSpheropolyhedronUnion(u)
            | Shape::FacetedEllipsoidUnion(u) => u.circumradius(),
        }
    }

    /// Shapes without extent (no vertices, no members, zero radius) never overlap anything.
    pub fn is_degenerate(&self) -> bool {
        let empty = match self {
            Shape::ConvexPolygon(p)
            | Shape::ConvexSpheropolygon(p)
            | Shape::ConvexPolyhedron(p)
            | Shape::ConvexSpheropolyhedron(p) => p.vertices().is_empty(),
            Shape::SimplePolygon(p) => p.vertices().len() < 3,
            Shape::Polyhedron(m) => m.vertices().is_empty() || m.num_triangles() == 0,
            Shape::FacetedEllipsoid(f) => f.is_empty(),
            Shape::Sphinx(s) => s.positive().is_empty(),
            Shape::SphereUnion(u)
            | Shape::ConvexSpheropolyhedronUnion(u)
            | Shape::FacetedEllipsoidUnion(u) => u.members().is_empty(),
            Shape::Sphere(_) | Shape::Ellipsoid(_) => false,
        };
        empty || self.circumsphere_radius() <= 0.0
    }

    /// Whether rotation moves change anything for this shape.
    pub fn is_orientable(&self) -> bool {
        match self {
            Shape::Sphere(s) => s.orientable,
            _ => true,
        }
    }

    /// Convex view used by the GJK-based predicates, if the shape is convex.
    pub(crate) fn as_convex(&self) -> Option<ConvexRef<'_>> {
        match self {
            Shape::Sphere(s) => Some(ConvexRef::Point {
                radius: s.radius,
                point: PointSupport(Vector3::zeros()),
            }),
            Shape::ConvexPolygon(p)
            | Shape::ConvexSpheropolygon(p)
            | Shape::ConvexPolyhedron(p)
            | Shape::ConvexSpheropolyhedron(p) => Some(ConvexRef::Polytope(p)),
            Shape::Ellipsoid(e) => Some(ConvexRef::Ellipsoid(e)),
            Shape::FacetedEllipsoid(f) => Some(ConvexRef::Faceted(f)),
            _ => None,
        }
    }
}

/// Borrowed convex core plus its rounding radius.
pub(crate) enum ConvexRef<'a> {
    Point { radius: f64, point: PointSupport },
    Polytope(&'a ConvexPolytope),
    Ellipsoid(&'a Ellipsoid),
    Faceted(&'a FacetedEllipsoid),
}

impl ConvexRef<'_> {
    pub(crate) fn sweep_radius(&self) -> f64 {
        match self {
            ConvexRef::Point { radius, .. } => *radius,
            ConvexRef::Polytope(p) => p.sweep_radius(),
            ConvexRef::Ellipsoid(_) | ConvexRef::Faceted(_) => 0.0,
        }
    }
}

impl SupportMap for ConvexRef<'_> {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        match self {
            ConvexRef::Point { point, .. } => point.support(direction),
            ConvexRef::Polytope(p) => p.support(direction),
            ConvexRef::Ellipsoid(e) => e.support(direction),
            ConvexRef::Faceted(f) => f.support(direction),
        }
    }

    fn interior_point(&self) -> Vector3<f64> {
        match self {
            ConvexRef::Point { point, .. } => point.interior_point(),
            ConvexRef::Polytope(p) => p.interior_point(),
            ConvexRef::Ellipsoid(e) => e.interior_point(),
            ConvexRef::Faceted(f) => f.interior_point(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_radius_sphere_is_degenerate() {
        assert!(Shape::Sphere(Sphere::new(0.0)).is_degenerate());
        assert!(!Shape::Sphere(Sphere::new(0.5)).is_degenerate());
    }

    #[test]
    fn vertexless_polytope_is_degenerate_even_with_sweep() {
        let shape = Shape::ConvexSpheropolyhedron(ConvexPolytope::new(vec![], 0.5));
        assert!(shape.is_degenerate());
    }

    #[test]
    fn kind_names_match_variants() {
        assert_eq!(ShapeKind::FacetedEllipsoidUnion.to_string(), "FacetedEllipsoidUnion");
        assert!(ShapeKind::SimplePolygon.is_planar());
        assert!(!ShapeKind::Sphere.is_planar());
    }

    #[test]
    fn spheres_are_not_orientable_by_default() {
        let shape = Shape::Sphere(Sphere::new(0.5));
        assert!(!shape.is_orientable());
        let mut sphere = Sphere::new(0.5);
        sphere.orientable = true;
        assert!(Shape::Sphere(sphere).is_orientable());
    }
}
