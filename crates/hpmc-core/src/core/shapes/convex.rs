use super::gjk::SupportMap;
use nalgebra::Vector3;

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub radius: f64,
    /// Whether rotation moves are meaningful for this type.
    pub orientable: bool,
}

impl Sphere {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            orientable: false,
        }
    }
}

/// Convex hull of a vertex set, optionally rounded by a sweep radius.
///
/// Covers convex polygons (vertices with `z = 0`), spheropolygons, convex polyhedra and
/// spheropolyhedra. Only the vertices are stored; the support function of a convex hull is the
/// maximum over its vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexPolytope {
    vertices: Vec<Vector3<f64>>,
    sweep_radius: f64,
    circumradius: f64,
}

impl ConvexPolytope {
    pub fn new(vertices: Vec<Vector3<f64>>, sweep_radius: f64) -> Self {
        let core = vertices.iter().map(|v| v.norm()).fold(0.0, f64::max);
        Self {
            vertices,
            sweep_radius,
            circumradius: core + sweep_radius,
        }
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn sweep_radius(&self) -> f64 {
        self.sweep_radius
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }
}

impl SupportMap for ConvexPolytope {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let mut best = Vector3::zeros();
        let mut best_dot = f64::NEG_INFINITY;
        for v in &self.vertices {
            let d = v.dot(direction);
            if d > best_dot {
                best_dot = d;
                best = *v;
            }
        }
        best
    }

    fn interior_point(&self) -> Vector3<f64> {
        if self.vertices.is_empty() {
            return Vector3::zeros();
        }
        self.vertices.iter().fold(Vector3::zeros(), |acc, v| acc + v) / self.vertices.len() as f64
    }
}

/// Solid ellipsoid with semi-axes `a`, `b`, `c` along the body x, y, z axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    pub axes: Vector3<f64>,
}

impl Ellipsoid {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self {
            axes: Vector3::new(a, b, c),
        }
    }

    pub fn circumradius(&self) -> f64 {
        self.axes.max()
    }
}

impl SupportMap for Ellipsoid {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let scaled = self.axes.component_mul(direction);
        let norm = scaled.norm();
        if norm <= f64::MIN_POSITIVE {
            return Vector3::zeros();
        }
        self.axes.component_mul(&scaled) / norm
    }
}

/// A triangle, used as the leaf primitive of mesh overlap tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle(pub [Vector3<f64>; 3]);

impl SupportMap for Triangle {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let [a, b, c] = self.0;
        let (da, db, dc) = (a.dot(direction), b.dot(direction), c.dot(direction));
        if da >= db && da >= dc {
            a
        } else if db >= dc {
            b
        } else {
            c
        }
    }

    fn interior_point(&self) -> Vector3<f64> {
        (self.0[0] + self.0[1] + self.0[2]) / 3.0
    }
}
