use super::convex::Ellipsoid;
use super::gjk::SupportMap;
use nalgebra::{Matrix3, Vector3};

const FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// An ellipsoid intersected with a set of half-spaces `n . x + b <= 0`.
///
/// The support function is evaluated in the scaled frame `x = A y`, where the ellipsoid becomes the
/// unit ball and each half-space stays a half-space. The maximum of a linear function over a ball
/// cut by planes is attained either at the unconstrained optimum, on a single plane's circle, on
/// the chord where two planes meet, or at a vertex where three planes meet. Every candidate is
/// generated and the best feasible one is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetedEllipsoid {
    ellipsoid: Ellipsoid,
    normals: Vec<Vector3<f64>>,
    offsets: Vec<f64>,
    origin: Vector3<f64>,
    interior: Vector3<f64>,
    planes: Vec<(Vector3<f64>, f64)>,
    corner_points: Vec<Vector3<f64>>,
    empty: bool,
}

impl FacetedEllipsoid {
    /// `normals` and `offsets` must have the same length. `extra_vertices` are optional known
    /// corners in the body frame; infeasible ones are dropped.
    pub fn new(
        ellipsoid: Ellipsoid,
        normals: Vec<Vector3<f64>>,
        offsets: Vec<f64>,
        origin: Vector3<f64>,
        extra_vertices: &[Vector3<f64>],
    ) -> Self {
        let axes = ellipsoid.axes;
        let planes: Vec<_> = normals
            .iter()
            .zip(&offsets)
            .map(|(n, &b)| (axes.component_mul(n), b))
            .collect();

        let mut shape = Self {
            ellipsoid,
            normals,
            offsets,
            origin,
            interior: origin,
            planes,
            corner_points: Vec::new(),
            empty: false,
        };
        shape.corner_points = shape.compute_corners(extra_vertices);
        shape.empty = shape.support_scaled(&Vector3::x()).is_none();
        shape.interior = shape.find_interior();
        shape
    }

    /// `origin` when it lies in the shape, otherwise the centroid of the six axis-aligned
    /// support points, which is inside by convexity.
    fn find_interior(&self) -> Vector3<f64> {
        let axes = self.ellipsoid.axes;
        if self.empty
            || (axes.iter().all(|&a| a > 0.0)
                && self.is_feasible(&self.origin.component_div(&axes)))
        {
            return self.origin;
        }
        let sum: Vector3<f64> = [Vector3::x(), Vector3::y(), Vector3::z()]
            .iter()
            .map(|d| self.support(d) + self.support(&-d))
            .sum();
        sum / 6.0
    }

    fn compute_corners(&self, extra_vertices: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        let mut corners = Vec::new();
        let k = self.planes.len();
        for i in 0..k {
            for j in (i + 1)..k {
                for l in (j + 1)..k {
                    let (mi, bi) = self.planes[i];
                    let (mj, bj) = self.planes[j];
                    let (ml, bl) = self.planes[l];
                    let m = Matrix3::from_rows(&[mi.transpose(), mj.transpose(), ml.transpose()]);
                    if let Some(inv) = m.try_inverse() {
                        let y = inv * Vector3::new(-bi, -bj, -bl);
                        if self.is_feasible(&y) {
                            corners.push(y);
                        }
                    }
                }
            }
        }

        let axes = self.ellipsoid.axes;
        if axes.iter().all(|&a| a > 0.0) {
            for v in extra_vertices {
                let y = v.component_div(&axes);
                if self.is_feasible(&y) {
                    corners.push(y);
                }
            }
        }
        corners
    }

    fn is_feasible(&self, y: &Vector3<f64>) -> bool {
        y.norm_squared() <= 1.0 + FEASIBILITY_TOLERANCE
            && self
                .planes
                .iter()
                .all(|(m, b)| m.dot(y) + b <= FEASIBILITY_TOLERANCE * m.norm().max(1.0))
    }

    fn support_scaled(&self, g: &Vector3<f64>) -> Option<Vector3<f64>> {
        let g_norm = g.norm();
        if g_norm > f64::MIN_POSITIVE {
            let free = g / g_norm;
            if self.is_feasible(&free) {
                return Some(free);
            }
        }

        let mut best: Option<(f64, Vector3<f64>)> = None;
        let mut consider = |y: Vector3<f64>| {
            if self.is_feasible(&y) {
                let value = g.dot(&y);
                if best.is_none_or(|(v, _)| value > v) {
                    best = Some((value, y));
                }
            }
        };

        for (m, b) in &self.planes {
            let mm = m.norm_squared();
            if mm <= f64::MIN_POSITIVE {
                continue;
            }
            let center = -m * (*b / mm);
            let cc = center.norm_squared();
            if cc > 1.0 {
                continue;
            }
            let rho = (1.0 - cc).sqrt();
            let tangential = g - m * (g.dot(m) / mm);
            let direction = if tangential.norm_squared() > 1e-24 {
                tangential.normalize()
            } else {
                any_perpendicular(m)
            };
            consider(center + direction * rho);
        }

        for i in 0..self.planes.len() {
            for j in (i + 1)..self.planes.len() {
                let (m1, b1) = self.planes[i];
                let (m2, b2) = self.planes[j];
                let u = m1.cross(&m2);
                let uu = u.norm_squared();
                if uu <= 1e-24 {
                    continue;
                }
                let (d1, d2) = (-b1, -b2);
                let m12 = m1.dot(&m2);
                let p0 = (m1 * (d1 * m2.norm_squared() - d2 * m12)
                    + m2 * (d2 * m1.norm_squared() - d1 * m12))
                    / uu;
                let pp = p0.norm_squared();
                if pp > 1.0 {
                    continue;
                }
                let half_chord = (1.0 - pp).sqrt();
                let u_hat = u / uu.sqrt();
                consider(p0 + u_hat * half_chord);
                consider(p0 - u_hat * half_chord);
            }
        }

        for corner in &self.corner_points {
            consider(*corner);
        }

        best.map(|(_, y)| y)
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    /// True if the half-spaces cut away the whole ellipsoid.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn circumradius(&self) -> f64 {
        if self.empty {
            0.0
        } else {
            self.ellipsoid.circumradius()
        }
    }
}

fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    v.cross(&helper).normalize()
}

impl SupportMap for FacetedEllipsoid {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let axes = self.ellipsoid.axes;
        let g = axes.component_mul(direction);
        match self.support_scaled(&g) {
            Some(y) => axes.component_mul(&y),
            None => Vector3::zeros(),
        }
    }

    fn interior_point(&self) -> Vector3<f64> {
        self.interior
    }
}
