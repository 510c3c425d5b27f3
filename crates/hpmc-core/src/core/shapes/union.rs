use super::bvh::{Aabb, Bvh};
use super::shape::Shape;
use crate::core::utils::geometry::RelativePose;
use nalgebra::{UnitQuaternion, Vector3};

/// Mask value that lets a member overlap with every other member.
pub const DEFAULT_OVERLAP_MASK: u32 = 1;

/// One constituent of a compound shape, placed in the union's body frame.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionMember {
    pub shape: Shape,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    /// Members `i` and `j` of two different particles are only tested when
    /// `overlap_mask_i & overlap_mask_j != 0`.
    pub overlap_mask: u32,
}

impl UnionMember {
    pub fn pose(&self) -> RelativePose {
        RelativePose::new(self.orientation, self.position)
    }
}

/// A rigid union of constituent shapes with a bounding-volume hierarchy over the members.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeUnion {
    members: Vec<UnionMember>,
    tree: Bvh,
    circumradius: f64,
}

impl ShapeUnion {
    pub fn new(members: Vec<UnionMember>, capacity: usize) -> Self {
        let boxes: Vec<Aabb> = members
            .iter()
            .map(|m| Aabb::around_sphere(&m.position, m.shape.circumsphere_radius()))
            .collect();
        let circumradius = members
            .iter()
            .filter(|m| !m.shape.is_degenerate())
            .map(|m| m.position.norm() + m.shape.circumsphere_radius())
            .fold(0.0, f64::max);
        Self {
            tree: Bvh::build(&boxes, capacity),
            members,
            circumradius,
        }
    }

    pub fn members(&self) -> &[UnionMember] {
        &self.members
    }

    pub fn tree(&self) -> &Bvh {
        &self.tree
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shapes::convex::Sphere;

    #[test]
    fn circumradius_covers_offset_members() {
        let members = vec![
            UnionMember {
                shape: Shape::Sphere(Sphere::new(0.5)),
                position: Vector3::new(1.0, 0.0, 0.0),
                orientation: UnitQuaternion::identity(),
                overlap_mask: DEFAULT_OVERLAP_MASK,
            },
            UnionMember {
                shape: Shape::Sphere(Sphere::new(0.25)),
                position: Vector3::new(-0.5, 0.0, 0.0),
                orientation: UnitQuaternion::identity(),
                overlap_mask: DEFAULT_OVERLAP_MASK,
            },
        ];
        let union = ShapeUnion::new(members, 4);
        assert_eq!(union.circumradius(), 1.5);
        assert_eq!(union.members().len(), 2);
        assert!(!union.tree().is_empty());
    }
}
