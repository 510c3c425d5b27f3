use crate::core::utils::geometry::{
    RelativePose, planar, point_in_polygon2, segment_distance2,
};
use nalgebra::{Vector2, Vector3};

/// A simple (non-self-intersecting, possibly concave) polygon in the xy plane.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePolygon {
    vertices: Vec<Vector3<f64>>,
    circumradius: f64,
}

impl SimplePolygon {
    pub fn new(vertices: Vec<Vector3<f64>>) -> Self {
        let circumradius = vertices.iter().map(|v| v.norm()).fold(0.0, f64::max);
        Self {
            vertices,
            circumradius,
        }
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }
}

/// Planar outline of a two-dimensional shape: a closed polyline rounded by `sweep`.
///
/// A disk is a single point with `sweep` equal to its radius; a polygon without rounding has
/// `sweep` zero.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Outline {
    points: Vec<Vector2<f64>>,
    sweep: f64,
}

impl Outline {
    pub(crate) fn new(vertices: &[Vector3<f64>], sweep: f64) -> Self {
        Self {
            points: vertices.iter().map(planar).collect(),
            sweep,
        }
    }

    pub(crate) fn disk(radius: f64) -> Self {
        Self {
            points: vec![Vector2::zeros()],
            sweep: radius,
        }
    }

    /// The outline moved into another frame. Rotations are taken about z.
    pub(crate) fn placed(&self, pose: &RelativePose) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| planar(&pose.transform_point(&Vector3::new(p.x, p.y, 0.0))))
                .collect(),
            sweep: self.sweep,
        }
    }

    fn edges(&self) -> impl Iterator<Item = (Vector2<f64>, Vector2<f64>)> + '_ {
        let n = self.points.len();
        let count = match n {
            0 => 0,
            1 => 1,
            2 => 1,
            _ => n,
        };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

/// Closed-set overlap of two planar outlines in the same frame.
pub(crate) fn outlines_overlap(a: &Outline, b: &Outline) -> bool {
    if a.points.is_empty() || b.points.is_empty() {
        return false;
    }
    let margin = a.sweep + b.sweep;

    for (p1, p2) in a.edges() {
        for (q1, q2) in b.edges() {
            if segment_distance2(&p1, &p2, &q1, &q2) <= margin {
                return true;
            }
        }
    }

    (a.points.len() >= 3 && point_in_polygon2(&b.points[0], &a.points))
        || (b.points.len() >= 3 && point_in_polygon2(&a.points[0], &b.points))
}
