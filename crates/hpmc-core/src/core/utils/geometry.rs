use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector2, Vector3};

/// Rigid transform of one body expressed in the local frame of another.
///
/// `rotation` maps vectors from the second body's frame into the first body's frame and
/// `translation` is the second body's center seen from the first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativePose {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl RelativePose {
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }

    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pose of body `b` in the frame of body `a`, given both world orientations and the world
    /// separation `r_ab = x_b - x_a`.
    pub fn between(
        r_ab: &Vector3<f64>,
        q_a: &UnitQuaternion<f64>,
        q_b: &UnitQuaternion<f64>,
    ) -> Self {
        let q_inv = q_a.inverse();
        Self {
            rotation: q_inv * q_b,
            translation: q_inv * r_ab,
        }
    }

    /// The same relationship seen from the other body.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        Self {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Maps a point given in the second body's frame into the first body's frame.
    #[inline]
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Composes `self` (b in a) with `inner` (c in b) into c in a.
    pub fn then(&self, inner: &RelativePose) -> Self {
        Self {
            rotation: self.rotation * inner.rotation,
            translation: self.transform_point(&inner.translation),
        }
    }
}

/// Treats a stored quaternion as a rotation without renormalizing it.
#[inline]
pub fn as_rotation(q: &Quaternion<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::new_unchecked(*q)
}

pub fn rotation_about_axis(axis: &Vector3<f64>, angle: f64) -> UnitQuaternion<f64> {
    match Unit::try_new(*axis, 1e-12) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, angle),
        None => UnitQuaternion::identity(),
    }
}

/// Builds a unit quaternion from `[w, x, y, z]` components, or `None` for the zero quaternion.
pub fn quaternion_from_wxyz(q: [f64; 4]) -> Option<UnitQuaternion<f64>> {
    let raw = Quaternion::new(q[0], q[1], q[2], q[3]);
    if raw.norm_squared() <= f64::EPSILON {
        return None;
    }
    Some(UnitQuaternion::from_quaternion(raw))
}

#[inline]
pub fn planar(v: &Vector3<f64>) -> Vector2<f64> {
    Vector2::new(v.x, v.y)
}

#[inline]
pub fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Distance from `p` to the segment `[a, b]`.
pub fn point_segment_distance2(p: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON * f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Whether closed segments `[p1, p2]` and `[q1, q2]` share at least one point.
pub fn segments_intersect2(
    p1: &Vector2<f64>,
    p2: &Vector2<f64>,
    q1: &Vector2<f64>,
    q2: &Vector2<f64>,
) -> bool {
    let d1 = cross2(&(q2 - q1), &(p1 - q1));
    let d2 = cross2(&(q2 - q1), &(p2 - q1));
    let d3 = cross2(&(p2 - p1), &(q1 - p1));
    let d4 = cross2(&(p2 - p1), &(q2 - p1));

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |a: &Vector2<f64>, b: &Vector2<f64>, p: &Vector2<f64>| {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    };

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

pub fn segment_distance2(
    p1: &Vector2<f64>,
    p2: &Vector2<f64>,
    q1: &Vector2<f64>,
    q2: &Vector2<f64>,
) -> f64 {
    if segments_intersect2(p1, p2, q1, q2) {
        return 0.0;
    }
    point_segment_distance2(p1, q1, q2)
        .min(point_segment_distance2(p2, q1, q2))
        .min(point_segment_distance2(q1, p1, p2))
        .min(point_segment_distance2(q2, p1, p2))
}

/// Even-odd point-in-polygon test. Points on the boundary may land on either side.
pub fn point_in_polygon2(p: &Vector2<f64>, polygon: &[Vector2<f64>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (&polygon[i], &polygon[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let x_cross = vj.x + (p.y - vj.y) * (vi.x - vj.x) / (vi.y - vj.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Möller–Trumbore ray/triangle intersection for a ray starting at `origin`.
pub fn ray_hits_triangle(
    origin: &Vector3<f64>,
    direction: &Vector3<f64>,
    tri: &[Vector3<f64>; 3],
) -> bool {
    const EPS: f64 = 1e-12;
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = direction.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < EPS {
        return false;
    }
    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(&p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return false;
    }
    let q = s.cross(&e1);
    let v = direction.dot(&q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return false;
    }
    e2.dot(&q) * inv_det > EPS
}
