use crate::core::utils::geometry::RelativePose;
use nalgebra::Vector3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub center: Vector3<f64>,
    pub radius: f64,
}

impl Ball {
    fn contains_ball(&self, other: &Ball) -> bool {
        (other.center - self.center).norm() + other.radius <= self.radius
    }

    fn placed(&self, pose: &RelativePose) -> Ball {
        Ball {
            center: pose.transform_point(&self.center),
            radius: self.radius,
        }
    }
}

/// A dimpled sphere: the union of the positive spheres with every negative sphere carved out.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphinx {
    positive: Vec<Ball>,
    negative: Vec<Ball>,
    circumradius: f64,
}

impl Sphinx {
    /// Builds the shape from signed diameters: positive entries add volume, negative ones remove it.
    pub fn new(centers: &[Vector3<f64>], diameters: &[f64]) -> Self {
        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for (center, &diameter) in centers.iter().zip(diameters) {
            let ball = Ball {
                center: *center,
                radius: 0.5 * diameter.abs(),
            };
            if diameter > 0.0 {
                positive.push(ball);
            } else if diameter < 0.0 {
                negative.push(ball);
            }
        }
        let circumradius = positive
            .iter()
            .map(|b| b.center.norm() + b.radius)
            .fold(0.0, f64::max);
        Self {
            positive,
            negative,
            circumradius,
        }
    }

    /// A plain sphere expressed as a sphinx without dimples.
    pub fn solid(radius: f64) -> Self {
        Self::new(&[Vector3::zeros()], &[2.0 * radius])
    }

    pub fn positive(&self) -> &[Ball] {
        &self.positive
    }

    pub fn negative(&self) -> &[Ball] {
        &self.negative
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }
}

/// Conservative sphinx/sphinx overlap with `b` placed by `pose` in `a`'s frame.
///
/// Two positive spheres that intersect produce overlap unless their lens is swallowed whole by a
/// single negative sphere of either particle. Lenses that are only covered by several negative
/// spheres together are still reported as overlapping.
pub(crate) fn sphinx_overlap(a: &Sphinx, b: &Sphinx, pose: &RelativePose) -> bool {
    let b_positive: Vec<Ball> = b.positive.iter().map(|s| s.placed(pose)).collect();
    let b_negative: Vec<Ball> = b.negative.iter().map(|s| s.placed(pose)).collect();

    for pa in &a.positive {
        for pb in &b_positive {
            let Some(lens) = Lens::of(pa, pb) else {
                continue;
            };
            let carved = a
                .negative
                .iter()
                .chain(b_negative.iter())
                .any(|neg| lens.is_inside(neg));
            if !carved {
                return true;
            }
        }
    }
    false
}

/// Intersection of two balls, kept as its two parents plus a bounding sphere.
struct Lens {
    first: Ball,
    second: Ball,
    bound: Ball,
}

impl Lens {
    fn of(p: &Ball, q: &Ball) -> Option<Self> {
        let axis = q.center - p.center;
        let d = axis.norm();
        if d > p.radius + q.radius {
            return None;
        }
        if d + q.radius <= p.radius {
            return Some(Self {
                first: *p,
                second: *q,
                bound: *q,
            });
        }
        if d + p.radius <= q.radius {
            return Some(Self {
                first: *p,
                second: *q,
                bound: *p,
            });
        }

        let (r1, r2) = (p.radius, q.radius);
        let e = axis / d;
        let x1 = (d * d + r1 * r1 - r2 * r2) / (2.0 * d);
        let cap_first = r1 - x1;
        let cap_second = x1 - (d - r2);
        let radial_first = (r1 * r1 - x1.max(0.0).powi(2)).max(0.0).sqrt();
        let radial_second = (r2 * r2 - (x1.min(d) - d).powi(2)).max(0.0).sqrt();
        let radial = radial_first.max(radial_second);
        let axial = cap_first.max(cap_second);
        Some(Self {
            first: *p,
            second: *q,
            bound: Ball {
                center: p.center + e * x1,
                radius: (radial * radial + axial * axial).sqrt(),
            },
        })
    }

    fn is_inside(&self, hole: &Ball) -> bool {
        hole.contains_ball(&self.bound)
            || hole.contains_ball(&self.first)
            || hole.contains_ball(&self.second)
    }
}
