use super::spec::ShapeSpec;
use serde_json::{Value, json};

/// Structured description of a type's shape for visualization and export tools.
///
/// Kinds with a common interchange form (spheres, convex polyhedra, ellipsoids, polygons, meshes,
/// sphere unions) are described with their geometry; the rest carry only their kind tag.
pub fn type_shape(spec: &ShapeSpec) -> Value {
    match spec {
        ShapeSpec::Sphere { diameter, .. } => json!({ "type": "Sphere", "diameter": diameter }),
        ShapeSpec::ConvexPolyhedron { vertices } => json!({
            "type": "ConvexPolyhedron",
            "rounding_radius": 0.0,
            "vertices": vertices,
        }),
        ShapeSpec::ConvexSpheropolyhedron {
            vertices,
            sweep_radius,
        } => json!({
            "type": "ConvexPolyhedron",
            "rounding_radius": sweep_radius,
            "vertices": vertices,
        }),
        ShapeSpec::Ellipsoid { a, b, c } => json!({ "type": "Ellipsoid", "a": a, "b": b, "c": c }),
        ShapeSpec::ConvexPolygon { vertices } | ShapeSpec::SimplePolygon { vertices } => json!({
            "type": "Polygon",
            "rounding_radius": 0.0,
            "vertices": vertices,
        }),
        ShapeSpec::ConvexSpheropolygon {
            vertices,
            sweep_radius,
        } => json!({
            "type": "Polygon",
            "rounding_radius": sweep_radius,
            "vertices": vertices,
        }),
        ShapeSpec::Polyhedron {
            vertices, faces, ..
        } => json!({ "type": "Mesh", "vertices": vertices, "indices": faces }),
        ShapeSpec::SphereUnion {
            diameters, centers, ..
        } => json!({ "type": "SphereUnion", "diameters": diameters, "centers": centers }),
        other => json!({ "type": other.kind().name() }),
    }
}
