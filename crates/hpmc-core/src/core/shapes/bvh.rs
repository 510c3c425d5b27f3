//! Oriented-bounding-box hierarchies over the constituents of compound and concave shapes.
//!
//! Boxes are axis-aligned in the owning shape's body frame. Once the shape is placed relative to
//! another one they become oriented boxes, and node pairs are pruned with the 15-axis separating
//! axis test.

use crate::core::utils::geometry::RelativePose;
use nalgebra::{Matrix3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vector3::repeat(f64::INFINITY),
            max: Vector3::repeat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a, I: IntoIterator<Item = &'a Vector3<f64>>>(points: I) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.min = aabb.min.inf(p);
            aabb.max = aabb.max.sup(p);
        }
        aabb
    }

    pub fn around_sphere(center: &Vector3<f64>, radius: f64) -> Self {
        Self {
            min: center - Vector3::repeat(radius),
            max: center + Vector3::repeat(radius),
        }
    }

    pub fn inflated(&self, amount: f64) -> Self {
        Self {
            min: self.min - Vector3::repeat(amount),
            max: self.max + Vector3::repeat(amount),
        }
    }

    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Vector3<f64> {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    pub fn intersects_sphere(&self, center: &Vector3<f64>, radius: f64) -> bool {
        let clamped = center.sup(&self.min).inf(&self.max);
        (clamped - center).norm_squared() <= radius * radius
    }
}

/// Separating-axis test between box `a` and box `b` placed by `pose` in `a`'s frame.
pub fn obb_overlap(a: &Aabb, b: &Aabb, pose: &RelativePose) -> bool {
    const EPS: f64 = 1e-12;
    let ea = a.half_extents();
    let eb = b.half_extents();
    let r: Matrix3<f64> = pose.rotation.to_rotation_matrix().into_inner();
    let t = pose.transform_point(&b.center()) - a.center();
    let abs_r = r.map(|x| x.abs() + EPS);

    for i in 0..3 {
        let ra = ea[i];
        let rb = eb[0] * abs_r[(i, 0)] + eb[1] * abs_r[(i, 1)] + eb[2] * abs_r[(i, 2)];
        if t[i].abs() > ra + rb {
            return false;
        }
    }

    for j in 0..3 {
        let ra = ea[0] * abs_r[(0, j)] + ea[1] * abs_r[(1, j)] + ea[2] * abs_r[(2, j)];
        let rb = eb[j];
        let proj = t[0] * r[(0, j)] + t[1] * r[(1, j)] + t[2] * r[(2, j)];
        if proj.abs() > ra + rb {
            return false;
        }
    }

    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = ea[i1] * abs_r[(i2, j)] + ea[i2] * abs_r[(i1, j)];
            let rb = eb[j1] * abs_r[(i, j2)] + eb[j2] * abs_r[(i, j1)];
            let proj = t[i2] * r[(i1, j)] - t[i1] * r[(i2, j)];
            if proj.abs() > ra + rb {
                return false;
            }
        }
    }

    true
}

#[derive(Debug, Clone, PartialEq)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Internal { left: usize, right: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// A binary bounding-volume hierarchy whose leaves hold at most `capacity` items.
#[derive(Debug, Clone, PartialEq)]
pub struct Bvh {
    nodes: Vec<Node>,
    items: Vec<usize>,
    capacity: usize,
}

impl Bvh {
    /// Builds the tree over `boxes`, one per item. A capacity of zero is treated as one.
    pub fn build(boxes: &[Aabb], capacity: usize) -> Self {
        let mut bvh = Self {
            nodes: Vec::new(),
            items: (0..boxes.len()).collect(),
            capacity: capacity.max(1),
        };
        if !boxes.is_empty() {
            bvh.build_node(boxes, 0, boxes.len());
        }
        bvh
    }

    fn build_node(&mut self, boxes: &[Aabb], start: usize, end: usize) -> usize {
        let bounds = self.items[start..end]
            .iter()
            .fold(Aabb::empty(), |acc, &i| acc.merge(&boxes[i]));
        let index = self.nodes.len();
        let count = end - start;

        if count <= self.capacity {
            self.nodes.push(Node {
                bounds,
                kind: NodeKind::Leaf { start, count },
            });
            return index;
        }

        let centroids = Aabb::from_points(
            self.items[start..end]
                .iter()
                .map(|&i| boxes[i].center())
                .collect::<Vec<_>>()
                .iter(),
        );
        let spread = centroids.max - centroids.min;
        let axis = spread.imax();
        self.items[start..end]
            .sort_by(|&x, &y| boxes[x].center()[axis].total_cmp(&boxes[y].center()[axis]));

        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { start, count },
        });
        let mid = start + count / 2;
        let left = self.build_node(boxes, start, mid);
        let right = self.build_node(boxes, mid, end);
        self.nodes[index].kind = NodeKind::Internal { left, right };
        index
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn bounds(&self) -> Option<&Aabb> {
        self.nodes.first().map(|n| &n.bounds)
    }

    /// Visits every item whose box touches the sphere; stops early and returns `true` as soon as
    /// `visit` does.
    pub fn any_in_sphere<F>(&self, center: &Vector3<f64>, radius: f64, mut visit: F) -> bool
    where
        F: FnMut(usize) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let node = &self.nodes[n];
            if !node.bounds.intersects_sphere(center, radius) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for &item in &self.items[start..start + count] {
                        if visit(item) {
                            return true;
                        }
                    }
                }
                NodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        false
    }

    /// Visits every item pair `(i, j)` whose leaves' boxes overlap, with `other` placed by `pose`
    /// in this tree's frame. Stops early and returns `true` as soon as `visit` does.
    pub fn any_pair<F>(&self, other: &Bvh, pose: &RelativePose, mut visit: F) -> bool
    where
        F: FnMut(usize, usize) -> bool,
    {
        if self.nodes.is_empty() || other.nodes.is_empty() {
            return false;
        }
        let mut stack = vec![(0usize, 0usize)];
        while let Some((na, nb)) = stack.pop() {
            let a = &self.nodes[na];
            let b = &other.nodes[nb];
            if !obb_overlap(&a.bounds, &b.bounds, pose) {
                continue;
            }
            match (&a.kind, &b.kind) {
                (
                    NodeKind::Leaf {
                        start: sa,
                        count: ca,
                    },
                    NodeKind::Leaf {
                        start: sb,
                        count: cb,
                    },
                ) => {
                    for &i in &self.items[*sa..sa + ca] {
                        for &j in &other.items[*sb..sb + cb] {
                            if visit(i, j) {
                                return true;
                            }
                        }
                    }
                }
                (NodeKind::Internal { left, right }, NodeKind::Leaf { .. }) => {
                    stack.push((*right, nb));
                    stack.push((*left, nb));
                }
                (NodeKind::Leaf { .. }, NodeKind::Internal { left, right }) => {
                    stack.push((na, *right));
                    stack.push((na, *left));
                }
                (
                    NodeKind::Internal {
                        left: la,
                        right: ra,
                    },
                    NodeKind::Internal {
                        left: lb,
                        right: rb,
                    },
                ) => {
                    // Descend into the larger box first.
                    if a.bounds.half_extents().norm_squared() >= b.bounds.half_extents().norm_squared()
                    {
                        stack.push((*ra, nb));
                        stack.push((*la, nb));
                    } else {
                        stack.push((na, *rb));
                        stack.push((na, *lb));
                    }
                }
            }
        }
        false
    }
}
