//! Gilbert–Johnson–Keerthi distance test between convex support maps.
//!
//! Shapes with a rounding (sweep) radius are handled by running GJK on their cores and comparing
//! the core distance against the summed radii, so spheres are points with a margin and
//! spheropolyhedra are polytopes with a margin.

use crate::core::utils::geometry::RelativePose;
use nalgebra::Vector3;

const MAX_ITERATIONS: usize = 128;
const RELATIVE_TOLERANCE: f64 = 1e-10;
const ABSOLUTE_TOLERANCE_SQ: f64 = 1e-24;

/// A convex set described by its support function.
pub trait SupportMap {
    /// Point of the set that is farthest along `direction`, in the set's own frame.
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64>;

    /// Any point known to lie inside the set; used to seed the search.
    fn interior_point(&self) -> Vector3<f64> {
        Vector3::zeros()
    }
}

impl<S: SupportMap + ?Sized> SupportMap for &S {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        (**self).support(direction)
    }
    fn interior_point(&self) -> Vector3<f64> {
        (**self).interior_point()
    }
}

/// A support map moved into another frame by a rigid transform.
pub struct Placed<'a, S: ?Sized> {
    shape: &'a S,
    pose: RelativePose,
}

impl<'a, S: SupportMap + ?Sized> Placed<'a, S> {
    pub fn new(shape: &'a S, pose: RelativePose) -> Self {
        Self { shape, pose }
    }
}

impl<S: SupportMap + ?Sized> SupportMap for Placed<'_, S> {
    fn support(&self, direction: &Vector3<f64>) -> Vector3<f64> {
        let local = self.pose.rotation.inverse() * direction;
        self.pose.transform_point(&self.shape.support(&local))
    }
    fn interior_point(&self) -> Vector3<f64> {
        self.pose.transform_point(&self.shape.interior_point())
    }
}

/// A single point; the core of a sphere.
pub struct PointSupport(pub Vector3<f64>);

impl SupportMap for PointSupport {
    fn support(&self, _direction: &Vector3<f64>) -> Vector3<f64> {
        self.0
    }
    fn interior_point(&self) -> Vector3<f64> {
        self.0
    }
}

/// Returns `true` when the distance between `a` and `b` is at most `margin`.
///
/// The answer errs toward `true`: if the iteration fails to converge the pair is reported as
/// overlapping.
pub fn overlap<A: SupportMap, B: SupportMap>(a: &A, b: &B, margin: f64) -> bool {
    let margin_sq = margin * margin;
    let minkowski = |d: &Vector3<f64>| a.support(d) - b.support(&-d);

    let mut v = a.interior_point() - b.interior_point();
    if v.norm_squared() <= ABSOLUTE_TOLERANCE_SQ {
        v = Vector3::x();
    }
    let mut simplex = Simplex::new();
    let first = minkowski(&-v);
    simplex.push(first);
    v = first;

    for _ in 0..MAX_ITERATIONS {
        let vv = v.norm_squared();
        if vv <= ABSOLUTE_TOLERANCE_SQ {
            return true;
        }

        let w = minkowski(&-v);
        let vw = v.dot(&w);
        if vw > 0.0 && vw * vw > margin_sq * vv {
            return false;
        }

        if vv - vw <= RELATIVE_TOLERANCE * vv || simplex.contains(&w) {
            return vv <= margin_sq * (1.0 + 1e-9) + ABSOLUTE_TOLERANCE_SQ;
        }

        simplex.push(w);
        match simplex.reduce_to_closest() {
            Some(closest) => v = closest,
            None => return true,
        }
    }

    true
}

/// Up to four points of the Minkowski difference.
#[derive(Debug, Clone, Copy)]
struct Simplex {
    points: [Vector3<f64>; 4],
    len: usize,
}

impl Simplex {
    fn new() -> Self {
        Self {
            points: [Vector3::zeros(); 4],
            len: 0,
        }
    }

    fn push(&mut self, p: Vector3<f64>) {
        if self.len < 4 {
            self.points[self.len] = p;
            self.len += 1;
        }
    }

    fn contains(&self, p: &Vector3<f64>) -> bool {
        self.points[..self.len]
            .iter()
            .any(|q| (q - p).norm_squared() <= ABSOLUTE_TOLERANCE_SQ)
    }

    fn set(&mut self, pts: &[Vector3<f64>]) {
        self.len = pts.len();
        self.points[..pts.len()].copy_from_slice(pts);
    }

    /// Replaces the simplex by the smallest sub-simplex supporting the point closest to the
    /// origin and returns that point. `None` means the origin is enclosed.
    fn reduce_to_closest(&mut self) -> Option<Vector3<f64>> {
        let [a, b, c, d] = self.points;
        let (point, kept) = match self.len {
            1 => (a, Feature::vertices(&[a])),
            2 => closest_on_segment(&a, &b),
            3 => closest_on_triangle(&a, &b, &c),
            4 => match closest_on_tetrahedron(&a, &b, &c, &d) {
                Some(found) => found,
                None => return None,
            },
            _ => return None,
        };
        self.set(kept.as_slice());
        Some(point)
    }
}

#[derive(Debug, Clone, Copy)]
struct Feature {
    points: [Vector3<f64>; 3],
    len: usize,
}

impl Feature {
    fn vertices(pts: &[Vector3<f64>]) -> Self {
        let mut points = [Vector3::zeros(); 3];
        points[..pts.len()].copy_from_slice(pts);
        Self {
            points,
            len: pts.len(),
        }
    }

    fn as_slice(&self) -> &[Vector3<f64>] {
        &self.points[..self.len]
    }
}

fn closest_on_segment(a: &Vector3<f64>, b: &Vector3<f64>) -> (Vector3<f64>, Feature) {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= ABSOLUTE_TOLERANCE_SQ {
        return (*a, Feature::vertices(&[*a]));
    }
    let t = -a.dot(&ab) / len_sq;
    if t <= 0.0 {
        (*a, Feature::vertices(&[*a]))
    } else if t >= 1.0 {
        (*b, Feature::vertices(&[*b]))
    } else {
        (a + ab * t, Feature::vertices(&[*a, *b]))
    }
}

// Voronoi-region walk from Ericson, "Real-Time Collision Detection", 5.1.5, with the query point
// fixed at the origin.
fn closest_on_triangle(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    c: &Vector3<f64>,
) -> (Vector3<f64>, Feature) {
    let ab = b - a;
    let ac = c - a;
    let ap = -a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (*a, Feature::vertices(&[*a]));
    }

    let bp = -b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (*b, Feature::vertices(&[*b]));
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return (a + ab * v, Feature::vertices(&[*a, *b]));
    }

    let cp = -c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (*c, Feature::vertices(&[*c]));
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return (a + ac * w, Feature::vertices(&[*a, *c]));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return (b + (c - b) * w, Feature::vertices(&[*b, *c]));
    }

    let denom = va + vb + vc;
    if denom.abs() <= f64::EPSILON * (ab.norm_squared() + ac.norm_squared()) {
        // Collinear triangle: fall back to the closest of its edges.
        return [
            closest_on_segment(a, b),
            closest_on_segment(b, c),
            closest_on_segment(a, c),
        ]
        .into_iter()
        .min_by(|x, y| x.0.norm_squared().total_cmp(&y.0.norm_squared()))
        .unwrap_or((*a, Feature::vertices(&[*a])));
    }
    let v = vb / denom;
    let w = vc / denom;
    (a + ab * v + ac * w, Feature::vertices(&[*a, *b, *c]))
}

fn closest_on_tetrahedron(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    c: &Vector3<f64>,
    d: &Vector3<f64>,
) -> Option<(Vector3<f64>, Feature)> {
    let faces = [(a, b, c, d), (a, c, d, b), (a, d, b, c), (b, d, c, a)];
    let volume = (b - a).cross(&(c - a)).dot(&(d - a));
    let flat = volume.abs()
        <= 1e-12 * (b - a).norm() * (c - a).norm() * (d - a).norm() + ABSOLUTE_TOLERANCE_SQ;

    let mut best: Option<(Vector3<f64>, Feature)> = None;
    let mut outside_any = false;
    for (p, q, r, opposite) in faces {
        let normal = (q - p).cross(&(r - p));
        let origin_side = normal.dot(&-p);
        let opposite_side = normal.dot(&(opposite - p));
        let origin_outside = flat || origin_side * opposite_side < 0.0;
        if !origin_outside {
            continue;
        }
        outside_any = true;
        let candidate = closest_on_triangle(p, q, r);
        let better = match &best {
            Some((current, _)) => candidate.0.norm_squared() < current.norm_squared(),
            None => true,
        };
        if better {
            best = Some(candidate);
        }
    }

    if outside_any { best } else { None }
}
