use super::convex::{ConvexPolytope, Ellipsoid, Sphere};
use super::faceted::FacetedEllipsoid;
use super::mesh::Mesh;
use super::polygon::SimplePolygon;
use super::shape::{Shape, ShapeKind};
use super::sphinx::Sphinx;
use super::union::{DEFAULT_OVERLAP_MASK, ShapeUnion, UnionMember};
use crate::core::utils::geometry::quaternion_from_wxyz;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of constituents per BVH leaf.
pub const DEFAULT_LEAF_CAPACITY: usize = 4;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("{kind}: parameter '{field}' must be finite and non-negative, got {value}")]
    NegativeOrNonFinite {
        kind: ShapeKind,
        field: &'static str,
        value: f64,
    },
    #[error("{kind}: parameter '{field}' contains a non-finite number")]
    NonFinite {
        kind: ShapeKind,
        field: &'static str,
    },
    #[error("{kind}: '{left}' has {left_len} entries but '{right}' has {right_len}")]
    LengthMismatch {
        kind: ShapeKind,
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    },
    #[error("{kind}: face {face} references vertex {index}, but only {count} vertices exist")]
    FaceIndexOutOfRange {
        kind: ShapeKind,
        face: usize,
        index: usize,
        count: usize,
    },
    #[error("{kind}: face {face} has {len} vertices, at least 3 are required")]
    FaceTooSmall {
        kind: ShapeKind,
        face: usize,
        len: usize,
    },
    #[error("{kind}: BVH leaf capacity must be at least 1")]
    ZeroCapacity { kind: ShapeKind },
    #[error("{kind}: orientation {index} is the zero quaternion")]
    ZeroOrientation { kind: ShapeKind, index: usize },
}

fn default_capacity() -> usize {
    DEFAULT_LEAF_CAPACITY
}

/// User-facing shape parameters for one particle type.
///
/// Records are serialized with a `type` tag naming the kind, e.g.
/// `{ type = "sphere", diameter = 1.0 }`. [`ShapeSpec::build`] validates the record and produces
/// the [`Shape`] the overlap predicates operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    Sphere {
        diameter: f64,
        #[serde(default)]
        orientable: bool,
    },
    ConvexPolygon {
        vertices: Vec<[f64; 2]>,
    },
    SimplePolygon {
        vertices: Vec<[f64; 2]>,
    },
    ConvexSpheropolygon {
        vertices: Vec<[f64; 2]>,
        #[serde(default)]
        sweep_radius: f64,
    },
    Polyhedron {
        vertices: Vec<[f64; 3]>,
        faces: Vec<Vec<usize>>,
        #[serde(default)]
        sweep_radius: f64,
        #[serde(default = "default_capacity")]
        capacity: usize,
        #[serde(default)]
        origin: [f64; 3],
        #[serde(default)]
        hull_only: bool,
    },
    ConvexPolyhedron {
        vertices: Vec<[f64; 3]>,
    },
    FacetedEllipsoid {
        normals: Vec<[f64; 3]>,
        offsets: Vec<f64>,
        a: f64,
        b: f64,
        c: f64,
        #[serde(default)]
        vertices: Vec<[f64; 3]>,
        #[serde(default)]
        origin: [f64; 3],
    },
    /// A faceted ellipsoid with equal semi-axes.
    FacetedSphere {
        normals: Vec<[f64; 3]>,
        offsets: Vec<f64>,
        diameter: f64,
        #[serde(default)]
        vertices: Vec<[f64; 3]>,
        #[serde(default)]
        origin: [f64; 3],
    },
    Sphinx {
        centers: Vec<[f64; 3]>,
        diameters: Vec<f64>,
    },
    ConvexSpheropolyhedron {
        vertices: Vec<[f64; 3]>,
        #[serde(default)]
        sweep_radius: f64,
    },
    Ellipsoid {
        a: f64,
        b: f64,
        c: f64,
    },
    SphereUnion {
        diameters: Vec<f64>,
        centers: Vec<[f64; 3]>,
        #[serde(default)]
        overlap: Vec<u32>,
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
    ConvexSpheropolyhedronUnion {
        vertices: Vec<Vec<[f64; 3]>>,
        centers: Vec<[f64; 3]>,
        #[serde(default)]
        orientations: Vec<[f64; 4]>,
        #[serde(default)]
        overlap: Vec<u32>,
        #[serde(default)]
        sweep_radii: Vec<f64>,
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
    FacetedEllipsoidUnion {
        normals: Vec<Vec<[f64; 3]>>,
        offsets: Vec<Vec<f64>>,
        axes: Vec<[f64; 3]>,
        #[serde(default)]
        vertices: Vec<Vec<[f64; 3]>>,
        #[serde(default)]
        origins: Vec<[f64; 3]>,
        centers: Vec<[f64; 3]>,
        #[serde(default)]
        orientations: Vec<[f64; 4]>,
        #[serde(default)]
        overlap: Vec<u32>,
        #[serde(default = "default_capacity")]
        capacity: usize,
    },
}

impl ShapeSpec {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeSpec::Sphere { .. } => ShapeKind::Sphere,
            ShapeSpec::ConvexPolygon { .. } => ShapeKind::ConvexPolygon,
            ShapeSpec::SimplePolygon { .. } => ShapeKind::SimplePolygon,
            ShapeSpec::ConvexSpheropolygon { .. } => ShapeKind::ConvexSpheropolygon,
            ShapeSpec::Polyhedron { .. } => ShapeKind::Polyhedron,
            ShapeSpec::ConvexPolyhedron { .. } => ShapeKind::ConvexPolyhedron,
            ShapeSpec::FacetedEllipsoid { .. } | ShapeSpec::FacetedSphere { .. } => {
                ShapeKind::FacetedEllipsoid
            }
            ShapeSpec::Sphinx { .. } => ShapeKind::Sphinx,
            ShapeSpec::ConvexSpheropolyhedron { .. } => ShapeKind::ConvexSpheropolyhedron,
            ShapeSpec::Ellipsoid { .. } => ShapeKind::Ellipsoid,
            ShapeSpec::SphereUnion { .. } => ShapeKind::SphereUnion,
            ShapeSpec::ConvexSpheropolyhedronUnion { .. } => {
                ShapeKind::ConvexSpheropolyhedronUnion
            }
            ShapeSpec::FacetedEllipsoidUnion { .. } => ShapeKind::FacetedEllipsoidUnion,
        }
    }

    /// Validates the record and builds the geometric payload.
    pub fn build(&self) -> Result<Shape, ShapeError> {
        let kind = self.kind();
        let check = Checker { kind };
        match self {
            ShapeSpec::Sphere {
                diameter,
                orientable,
            } => {
                check.non_negative("diameter", *diameter)?;
                Ok(Shape::Sphere(Sphere {
                    radius: 0.5 * diameter,
                    orientable: *orientable,
                }))
            }
            ShapeSpec::ConvexPolygon { vertices } => Ok(Shape::ConvexPolygon(
                ConvexPolytope::new(check.planar("vertices", vertices)?, 0.0),
            )),
            ShapeSpec::SimplePolygon { vertices } => Ok(Shape::SimplePolygon(SimplePolygon::new(
                check.planar("vertices", vertices)?,
            ))),
            ShapeSpec::ConvexSpheropolygon {
                vertices,
                sweep_radius,
            } => {
                check.non_negative("sweep_radius", *sweep_radius)?;
                Ok(Shape::ConvexSpheropolygon(ConvexPolytope::new(
                    check.planar("vertices", vertices)?,
                    *sweep_radius,
                )))
            }
            ShapeSpec::Polyhedron {
                vertices,
                faces,
                sweep_radius,
                capacity,
                origin,
                hull_only,
            } => {
                check.non_negative("sweep_radius", *sweep_radius)?;
                check.capacity(*capacity)?;
                let vertices = check.points("vertices", vertices)?;
                for (face_index, face) in faces.iter().enumerate() {
                    if face.len() < 3 {
                        return Err(ShapeError::FaceTooSmall {
                            kind,
                            face: face_index,
                            len: face.len(),
                        });
                    }
                    if let Some(&bad) = face.iter().find(|&&i| i >= vertices.len()) {
                        return Err(ShapeError::FaceIndexOutOfRange {
                            kind,
                            face: face_index,
                            index: bad,
                            count: vertices.len(),
                        });
                    }
                }
                let origin = check.point("origin", origin)?;
                Ok(Shape::Polyhedron(Mesh::new(
                    vertices,
                    faces.clone(),
                    *sweep_radius,
                    origin,
                    *hull_only,
                    *capacity,
                )))
            }
            ShapeSpec::ConvexPolyhedron { vertices } => Ok(Shape::ConvexPolyhedron(
                ConvexPolytope::new(check.points("vertices", vertices)?, 0.0),
            )),
            ShapeSpec::FacetedEllipsoid {
                normals,
                offsets,
                a,
                b,
                c,
                vertices,
                origin,
            } => Ok(Shape::FacetedEllipsoid(check.faceted(
                normals,
                offsets,
                [*a, *b, *c],
                vertices,
                origin,
            )?)),
            ShapeSpec::FacetedSphere {
                normals,
                offsets,
                diameter,
                vertices,
                origin,
            } => {
                check.non_negative("diameter", *diameter)?;
                let r = 0.5 * diameter;
                Ok(Shape::FacetedEllipsoid(check.faceted(
                    normals,
                    offsets,
                    [r, r, r],
                    vertices,
                    origin,
                )?))
            }
            ShapeSpec::Sphinx { centers, diameters } => {
                check.same_len("centers", centers.len(), "diameters", diameters.len())?;
                let centers = check.points("centers", centers)?;
                check.finite("diameters", diameters)?;
                Ok(Shape::Sphinx(Sphinx::new(&centers, diameters)))
            }
            ShapeSpec::ConvexSpheropolyhedron {
                vertices,
                sweep_radius,
            } => {
                check.non_negative("sweep_radius", *sweep_radius)?;
                Ok(Shape::ConvexSpheropolyhedron(ConvexPolytope::new(
                    check.points("vertices", vertices)?,
                    *sweep_radius,
                )))
            }
            ShapeSpec::Ellipsoid { a, b, c } => {
                check.non_negative("a", *a)?;
                check.non_negative("b", *b)?;
                check.non_negative("c", *c)?;
                Ok(Shape::Ellipsoid(Ellipsoid::new(*a, *b, *c)))
            }
            ShapeSpec::SphereUnion {
                diameters,
                centers,
                overlap,
                capacity,
            } => {
                check.capacity(*capacity)?;
                check.same_len("diameters", diameters.len(), "centers", centers.len())?;
                let masks = check.masks(overlap, diameters.len())?;
                let centers = check.points("centers", centers)?;
                let mut members = Vec::with_capacity(diameters.len());
                for (i, &d) in diameters.iter().enumerate() {
                    check.non_negative("diameters", d)?;
                    members.push(UnionMember {
                        shape: Shape::Sphere(Sphere::new(0.5 * d)),
                        position: centers[i],
                        orientation: UnitQuaternion::identity(),
                        overlap_mask: masks[i],
                    });
                }
                Ok(Shape::SphereUnion(ShapeUnion::new(members, *capacity)))
            }
            ShapeSpec::ConvexSpheropolyhedronUnion {
                vertices,
                centers,
                orientations,
                overlap,
                sweep_radii,
                capacity,
            } => {
                check.capacity(*capacity)?;
                let n = vertices.len();
                check.same_len("vertices", n, "centers", centers.len())?;
                let orientations = check.orientations(orientations, n)?;
                let masks = check.masks(overlap, n)?;
                if !sweep_radii.is_empty() {
                    check.same_len("vertices", n, "sweep_radii", sweep_radii.len())?;
                }
                let centers = check.points("centers", centers)?;
                let mut members = Vec::with_capacity(n);
                for i in 0..n {
                    let sweep = sweep_radii.get(i).copied().unwrap_or(0.0);
                    check.non_negative("sweep_radii", sweep)?;
                    members.push(UnionMember {
                        shape: Shape::ConvexSpheropolyhedron(ConvexPolytope::new(
                            check.points("vertices", &vertices[i])?,
                            sweep,
                        )),
                        position: centers[i],
                        orientation: orientations[i],
                        overlap_mask: masks[i],
                    });
                }
                Ok(Shape::ConvexSpheropolyhedronUnion(ShapeUnion::new(
                    members, *capacity,
                )))
            }
            ShapeSpec::FacetedEllipsoidUnion {
                normals,
                offsets,
                axes,
                vertices,
                origins,
                centers,
                orientations,
                overlap,
                capacity,
            } => {
                check.capacity(*capacity)?;
                let n = axes.len();
                check.same_len("axes", n, "centers", centers.len())?;
                check.same_len("axes", n, "normals", normals.len())?;
                check.same_len("axes", n, "offsets", offsets.len())?;
                if !vertices.is_empty() {
                    check.same_len("axes", n, "vertices", vertices.len())?;
                }
                if !origins.is_empty() {
                    check.same_len("axes", n, "origins", origins.len())?;
                }
                let orientations = check.orientations(orientations, n)?;
                let masks = check.masks(overlap, n)?;
                let centers = check.points("centers", centers)?;
                let mut members = Vec::with_capacity(n);
                for i in 0..n {
                    let no_vertices = Vec::new();
                    let member = check.faceted(
                        &normals[i],
                        &offsets[i],
                        axes[i],
                        vertices.get(i).unwrap_or(&no_vertices),
                        origins.get(i).unwrap_or(&[0.0; 3]),
                    )?;
                    members.push(UnionMember {
                        shape: Shape::FacetedEllipsoid(member),
                        position: centers[i],
                        orientation: orientations[i],
                        overlap_mask: masks[i],
                    });
                }
                Ok(Shape::FacetedEllipsoidUnion(ShapeUnion::new(
                    members, *capacity,
                )))
            }
        }
    }
}

struct Checker {
    kind: ShapeKind,
}

impl Checker {
    fn non_negative(&self, field: &'static str, value: f64) -> Result<(), ShapeError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ShapeError::NegativeOrNonFinite {
                kind: self.kind,
                field,
                value,
            })
        }
    }

    fn finite(&self, field: &'static str, values: &[f64]) -> Result<(), ShapeError> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(ShapeError::NonFinite {
                kind: self.kind,
                field,
            })
        }
    }

    fn same_len(
        &self,
        left: &'static str,
        left_len: usize,
        right: &'static str,
        right_len: usize,
    ) -> Result<(), ShapeError> {
        if left_len == right_len {
            Ok(())
        } else {
            Err(ShapeError::LengthMismatch {
                kind: self.kind,
                left,
                left_len,
                right,
                right_len,
            })
        }
    }

    fn capacity(&self, capacity: usize) -> Result<(), ShapeError> {
        if capacity == 0 {
            Err(ShapeError::ZeroCapacity { kind: self.kind })
        } else {
            Ok(())
        }
    }

    fn point(&self, field: &'static str, p: &[f64; 3]) -> Result<Vector3<f64>, ShapeError> {
        self.finite(field, p)?;
        Ok(Vector3::from(*p))
    }

    fn points(
        &self,
        field: &'static str,
        points: &[[f64; 3]],
    ) -> Result<Vec<Vector3<f64>>, ShapeError> {
        points.iter().map(|p| self.point(field, p)).collect()
    }

    fn planar(
        &self,
        field: &'static str,
        points: &[[f64; 2]],
    ) -> Result<Vec<Vector3<f64>>, ShapeError> {
        points
            .iter()
            .map(|p| {
                self.finite(field, p)?;
                Ok(Vector3::new(p[0], p[1], 0.0))
            })
            .collect()
    }

    fn orientations(
        &self,
        orientations: &[[f64; 4]],
        n: usize,
    ) -> Result<Vec<UnitQuaternion<f64>>, ShapeError> {
        if orientations.is_empty() {
            return Ok(vec![UnitQuaternion::identity(); n]);
        }
        self.same_len("centers", n, "orientations", orientations.len())?;
        orientations
            .iter()
            .enumerate()
            .map(|(index, q)| {
                self.finite("orientations", q)?;
                quaternion_from_wxyz(*q).ok_or(ShapeError::ZeroOrientation {
                    kind: self.kind,
                    index,
                })
            })
            .collect()
    }

    fn masks(&self, overlap: &[u32], n: usize) -> Result<Vec<u32>, ShapeError> {
        if overlap.is_empty() {
            return Ok(vec![DEFAULT_OVERLAP_MASK; n]);
        }
        self.same_len("centers", n, "overlap", overlap.len())?;
        Ok(overlap.to_vec())
    }

    fn faceted(
        &self,
        normals: &[[f64; 3]],
        offsets: &[f64],
        axes: [f64; 3],
        vertices: &[[f64; 3]],
        origin: &[f64; 3],
    ) -> Result<FacetedEllipsoid, ShapeError> {
        self.same_len("normals", normals.len(), "offsets", offsets.len())?;
        self.non_negative("a", axes[0])?;
        self.non_negative("b", axes[1])?;
        self.non_negative("c", axes[2])?;
        self.finite("offsets", offsets)?;
        Ok(FacetedEllipsoid::new(
            Ellipsoid::new(axes[0], axes[1], axes[2]),
            self.points("normals", normals)?,
            offsets.to_vec(),
            self.point("origin", origin)?,
            &self.points("vertices", vertices)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_record_parses_from_toml() {
        let spec: ShapeSpec = toml::from_str("type = \"sphere\"\ndiameter = 1.5\n").unwrap();
        assert_eq!(
            spec,
            ShapeSpec::Sphere {
                diameter: 1.5,
                orientable: false
            }
        );
        let shape = spec.build().unwrap();
        assert_eq!(shape.circumsphere_radius(), 0.75);
    }

    #[test]
    fn polyhedron_defaults_are_filled_in() {
        let spec: ShapeSpec = serde_json::from_str(
            r#"{"type":"polyhedron","vertices":[[0,0,0],[1,0,0],[0,1,0]],"faces":[[0,1,2]]}"#,
        )
        .unwrap();
        match spec {
            ShapeSpec::Polyhedron {
                capacity,
                hull_only,
                sweep_radius,
                ..
            } => {
                assert_eq!(capacity, DEFAULT_LEAF_CAPACITY);
                assert!(!hull_only);
                assert_eq!(sweep_radius, 0.0);
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn negative_diameter_is_rejected() {
        let err = ShapeSpec::Sphere {
            diameter: -1.0,
            orientable: false,
        }
        .build()
        .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::NegativeOrNonFinite {
                field: "diameter",
                ..
            }
        ));
    }

    #[test]
    fn face_index_out_of_range_is_rejected() {
        let err = ShapeSpec::Polyhedron {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            faces: vec![vec![0, 1, 5]],
            sweep_radius: 0.0,
            capacity: 4,
            origin: [0.0; 3],
            hull_only: false,
        }
        .build()
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::FaceIndexOutOfRange {
                kind: ShapeKind::Polyhedron,
                face: 0,
                index: 5,
                count: 3
            }
        );
    }

    #[test]
    fn union_lengths_must_agree() {
        let err = ShapeSpec::SphereUnion {
            diameters: vec![1.0, 1.0],
            centers: vec![[0.0; 3]],
            overlap: vec![],
            capacity: 4,
        }
        .build()
        .unwrap_err();
        assert!(matches!(err, ShapeError::LengthMismatch { .. }));
    }

    #[test]
    fn faceted_sphere_is_a_faceted_ellipsoid() {
        let spec = ShapeSpec::FacetedSphere {
            normals: vec![[1.0, 0.0, 0.0]],
            offsets: vec![-0.25],
            diameter: 2.0,
            vertices: vec![],
            origin: [0.0; 3],
        };
        assert_eq!(spec.kind(), ShapeKind::FacetedEllipsoid);
        let shape = spec.build().unwrap();
        assert_eq!(shape.circumsphere_radius(), 1.0);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ShapeSpec::SphereUnion {
            diameters: vec![1.0],
            centers: vec![[0.0; 3]],
            overlap: vec![],
            capacity: 0,
        }
        .build()
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::ZeroCapacity {
                kind: ShapeKind::SphereUnion
            }
        );
    }
}
