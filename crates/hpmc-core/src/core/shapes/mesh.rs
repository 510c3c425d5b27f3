use super::bvh::{Aabb, Bvh};
use super::convex::Triangle;
use crate::core::utils::geometry::ray_hits_triangle;
use nalgebra::Vector3;

/// Direction used for point-in-mesh parity tests. Irrational components keep the ray away from
/// edges and vertices of axis-aligned meshes.
const PARITY_RAY: [f64; 3] = [0.577_215_664_9, 0.618_033_988_7, 0.529_177_210_9];

/// A general (possibly concave) polyhedron given as a triangulated surface mesh.
///
/// Polygonal faces are fan-triangulated when the mesh is built. Triangles are organized in a
/// bounding-volume hierarchy so pair tests only visit triangles whose boxes overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vector3<f64>>,
    faces: Vec<Vec<usize>>,
    triangles: Vec<[usize; 3]>,
    sweep_radius: f64,
    origin: Vector3<f64>,
    hull_only: bool,
    tree: Bvh,
    circumradius: f64,
}

impl Mesh {
    /// Face indices are expected to be in range; callers validate them first.
    pub fn new(
        vertices: Vec<Vector3<f64>>,
        faces: Vec<Vec<usize>>,
        sweep_radius: f64,
        origin: Vector3<f64>,
        hull_only: bool,
        capacity: usize,
    ) -> Self {
        let triangles: Vec<[usize; 3]> = faces
            .iter()
            .filter(|face| face.len() >= 3)
            .flat_map(|face| (1..face.len() - 1).map(move |k| [face[0], face[k], face[k + 1]]))
            .collect();

        let boxes: Vec<Aabb> = triangles
            .iter()
            .map(|t| Aabb::from_points(t.iter().map(|&i| &vertices[i])).inflated(sweep_radius))
            .collect();
        let tree = Bvh::build(&boxes, capacity);

        let circumradius = vertices.iter().map(|v| v.norm()).fold(0.0, f64::max) + sweep_radius;

        Self {
            vertices,
            faces,
            triangles,
            sweep_radius,
            origin,
            hull_only,
            tree,
            circumradius,
        }
    }

    pub fn vertices(&self) -> &[Vector3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn sweep_radius(&self) -> f64 {
        self.sweep_radius
    }

    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    pub fn hull_only(&self) -> bool {
        self.hull_only
    }

    pub fn tree(&self) -> &Bvh {
        &self.tree
    }

    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index];
        Triangle([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    /// Parity test: whether `point` (body frame) is enclosed by the surface.
    pub fn contains_point(&self, point: &Vector3<f64>) -> bool {
        let ray = Vector3::from(PARITY_RAY);
        let hits = (0..self.triangles.len())
            .filter(|&i| ray_hits_triangle(point, &ray, &self.triangle(i).0))
            .count();
        hits % 2 == 1
    }
}
