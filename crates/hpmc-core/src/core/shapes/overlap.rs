//! Pairwise overlap predicate over the closed shape family.
//!
//! Every test is conservative: an unsupported pairing, or an iterative test that fails to
//! converge, reports an overlap rather than risk a missed one.

use super::gjk::{self, Placed, PointSupport, SupportMap};
use super::mesh::Mesh;
use super::polygon::{Outline, outlines_overlap};
use super::shape::{ConvexRef, Shape};
use super::sphinx::{Sphinx, sphinx_overlap};
use super::union::ShapeUnion;
use crate::core::utils::geometry::RelativePose;
use nalgebra::{UnitQuaternion, Vector3};
use std::borrow::Cow;

/// Tests whether shape `a` at the origin with orientation `q_a` overlaps shape `b` at `r_ab` with
/// orientation `q_b`. Touching shapes overlap.
pub fn test_overlap(
    a: &Shape,
    b: &Shape,
    r_ab: &Vector3<f64>,
    q_a: &UnitQuaternion<f64>,
    q_b: &UnitQuaternion<f64>,
) -> bool {
    overlap_in_frame(a, b, &RelativePose::between(r_ab, q_a, q_b))
}

/// Overlap of `a` (at the origin of its own frame) and `b` placed by `pose` in that frame.
pub fn overlap_in_frame(a: &Shape, b: &Shape, pose: &RelativePose) -> bool {
    if a.is_degenerate() || b.is_degenerate() {
        return false;
    }
    let reach = a.circumsphere_radius() + b.circumsphere_radius();
    if pose.translation.norm_squared() > reach * reach {
        return false;
    }
    dispatch(a, b, pose)
}

/// Routes a pair to its overlap test. Pairs with no exact test, such as a sphinx against a mesh
/// or against a spheropolyhedron union member, report an overlap once their circumspheres meet.
fn dispatch(a: &Shape, b: &Shape, pose: &RelativePose) -> bool {
    match (a, b) {
        (Shape::Sphere(sa), Shape::Sphere(sb)) => {
            let reach = sa.radius + sb.radius;
            pose.translation.norm_squared() <= reach * reach
        }

        (
            Shape::SphereUnion(ua)
            | Shape::ConvexSpheropolyhedronUnion(ua)
            | Shape::FacetedEllipsoidUnion(ua),
            Shape::SphereUnion(ub)
            | Shape::ConvexSpheropolyhedronUnion(ub)
            | Shape::FacetedEllipsoidUnion(ub),
        ) => union_union(ua, ub, pose),
        (
            Shape::SphereUnion(u)
            | Shape::ConvexSpheropolyhedronUnion(u)
            | Shape::FacetedEllipsoidUnion(u),
            other,
        ) => union_other(u, other, pose),
        (
            other,
            Shape::SphereUnion(u)
            | Shape::ConvexSpheropolyhedronUnion(u)
            | Shape::FacetedEllipsoidUnion(u),
        ) => union_other(u, other, &pose.inverse()),

        (Shape::Sphinx(_), _) | (_, Shape::Sphinx(_)) => match (as_sphinx(a), as_sphinx(b)) {
            (Some(sa), Some(sb)) => sphinx_overlap(&sa, &sb, pose),
            // No exact test.
            _ => true,
        },

        (Shape::SimplePolygon(_), _) | (_, Shape::SimplePolygon(_)) => {
            match (as_outline(a), as_outline(b)) {
                (Some(oa), Some(ob)) => outlines_overlap(&oa, &ob.placed(pose)),
                _ => true,
            }
        }

        (Shape::Polyhedron(ma), Shape::Polyhedron(mb)) => mesh_mesh(ma, mb, pose),
        (Shape::Polyhedron(m), other) => match other.as_convex() {
            Some(convex) => mesh_convex(m, &convex, other.circumsphere_radius(), pose),
            None => true,
        },
        (other, Shape::Polyhedron(m)) => match other.as_convex() {
            Some(convex) => mesh_convex(m, &convex, other.circumsphere_radius(), &pose.inverse()),
            None => true,
        },

        _ => match (a.as_convex(), b.as_convex()) {
            (Some(ca), Some(cb)) => convex_convex(&ca, &cb, pose),
            _ => true,
        },
    }
}

fn convex_convex(a: &ConvexRef<'_>, b: &ConvexRef<'_>, pose: &RelativePose) -> bool {
    // Faceted shapes are first screened with their parent ellipsoids.
    if let ConvexRef::Faceted(fa) = a {
        let base = ConvexRef::Ellipsoid(fa.ellipsoid());
        if !convex_convex(&base, b, pose) {
            return false;
        }
    }
    if let ConvexRef::Faceted(fb) = b {
        let base = ConvexRef::Ellipsoid(fb.ellipsoid());
        if !convex_convex(a, &base, pose) {
            return false;
        }
    }
    let margin = a.sweep_radius() + b.sweep_radius();
    gjk::overlap(a, &Placed::new(b, *pose), margin)
}

fn union_other(union: &ShapeUnion, other: &Shape, pose: &RelativePose) -> bool {
    let other_radius = other.circumsphere_radius();
    let members = union.members();
    union
        .tree()
        .any_in_sphere(&pose.translation, other_radius, |i| {
            let member = &members[i];
            let to_member = member.pose().inverse();
            overlap_in_frame(&member.shape, other, &to_member.then(pose))
        })
}

fn union_union(a: &ShapeUnion, b: &ShapeUnion, pose: &RelativePose) -> bool {
    let (ma, mb) = (a.members(), b.members());
    a.tree().any_pair(b.tree(), pose, |i, j| {
        let (member_a, member_b) = (&ma[i], &mb[j]);
        if member_a.overlap_mask & member_b.overlap_mask == 0 {
            return false;
        }
        let b_in_a = pose.then(&member_b.pose());
        let relative = member_a.pose().inverse().then(&b_in_a);
        overlap_in_frame(&member_a.shape, &member_b.shape, &relative)
    })
}

fn mesh_mesh(a: &Mesh, b: &Mesh, pose: &RelativePose) -> bool {
    let margin = a.sweep_radius() + b.sweep_radius();
    let surfaces_touch = a.tree().any_pair(b.tree(), pose, |i, j| {
        let tb = b.triangle(j);
        gjk::overlap(&a.triangle(i), &Placed::new(&tb, *pose), margin)
    });
    if surfaces_touch {
        return true;
    }
    if a.hull_only() && b.hull_only() {
        return false;
    }
    // One mesh may sit entirely inside the other.
    a.contains_point(&pose.transform_point(b.origin()))
        || b.contains_point(&pose.inverse().transform_point(a.origin()))
}

fn mesh_convex(
    mesh: &Mesh,
    convex: &ConvexRef<'_>,
    convex_radius: f64,
    pose: &RelativePose,
) -> bool {
    let margin = mesh.sweep_radius() + convex.sweep_radius();
    let placed = Placed::new(convex, *pose);
    let surfaces_touch = mesh
        .tree()
        .any_in_sphere(&pose.translation, convex_radius, |i| {
            gjk::overlap(&mesh.triangle(i), &placed, margin)
        });
    if surfaces_touch {
        return true;
    }
    if mesh.hull_only() {
        return false;
    }
    mesh.contains_point(&placed.interior_point())
        || gjk::overlap(&PointSupport(*mesh.origin()), &placed, margin)
}

fn as_sphinx(shape: &Shape) -> Option<Cow<'_, Sphinx>> {
    match shape {
        Shape::Sphinx(s) => Some(Cow::Borrowed(s)),
        Shape::Sphere(s) => Some(Cow::Owned(Sphinx::solid(s.radius))),
        _ => None,
    }
}

fn as_outline(shape: &Shape) -> Option<Outline> {
    match shape {
        Shape::Sphere(s) => Some(Outline::disk(s.radius)),
        Shape::SimplePolygon(p) => Some(Outline::new(p.vertices(), 0.0)),
        Shape::ConvexPolygon(p) | Shape::ConvexSpheropolygon(p) => {
            Some(Outline::new(p.vertices(), p.sweep_radius()))
        }
        _ => None,
    }
}
