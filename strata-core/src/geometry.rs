/// Geometry primitives for layer meshes
use nalgebra::{Point3, Vector3};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn from_parts(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices, kept in stored winding order
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Build a triangle from bare positions, using the face normal for every vertex
    pub fn from_positions(p0: Point3<f32>, p1: Point3<f32>, p2: Point3<f32>) -> Self {
        let normal = face_normal(&p0, &p1, &p2);
        Self::new(
            Vertex::from_parts(p0, normal),
            Vertex::from_parts(p1, normal),
            Vertex::from_parts(p2, normal),
        )
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        face_normal(
            &self.vertices[0].position,
            &self.vertices[1].position,
            &self.vertices[2].position,
        )
    }

    pub fn positions(&self) -> [Point3<f32>; 3] {
        [
            self.vertices[0].position,
            self.vertices[1].position,
            self.vertices[2].position,
        ]
    }

    /// The same face with opposite winding
    pub fn flipped(&self) -> Self {
        let [a, b, c] = self.vertices;
        let flip = |v: Vertex| Vertex::from_parts(v.position, -v.normal);
        Self::new(flip(a), flip(c), flip(b))
    }
}

// Degenerate faces get a zero normal instead of NaNs.
fn face_normal(v0: &Point3<f32>, v1: &Point3<f32>, v2: &Point3<f32>) -> Vector3<f32> {
    let edge1 = *v1 - *v0;
    let edge2 = *v2 - *v0;

    edge1
        .cross(&edge2)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3::zeros)
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Axis-aligned bounding box as `(min, max)`, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut positions = self.triangles.iter().flat_map(|t| t.positions());
        let first = positions.next()?;

        Some(positions.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        }))
    }

    /// Positions flattened as `x, y, z` per vertex, three vertices per triangle
    pub fn flat_positions(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.triangles.len() * 9);
        for position in self.triangles.iter().flat_map(|t| t.positions()) {
            out.extend_from_slice(&[position.x, position.y, position.z]);
        }
        out
    }

    /// Copy of the mesh moved by `offset`
    pub fn translated(&self, offset: &Vector3<f32>) -> Self {
        let triangles = self
            .triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.vertices;
                let shift = |v: Vertex| Vertex::from_parts(v.position + *offset, v.normal);
                Triangle::new(shift(a), shift(b), shift(c))
            })
            .collect();
        Self { triangles }
    }

    /// Copy of the mesh with every face's winding reversed
    pub fn flipped(&self) -> Self {
        Self {
            triangles: self.triangles.iter().map(Triangle::flipped).collect(),
        }
    }

    /// Axis-aligned cube centered on the origin, wound outward
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        // (normal, two in-plane axes) per face; u x v == normal keeps winding outward
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ];

        for (n, u, v) in faces {
            let n = Vector3::from(n);
            let u = Vector3::from(u);
            let v = Vector3::from(v);
            let center = Point3::origin() + n * half;
            let corner = |su: f32, sv: f32| center + u * (su * half) + v * (sv * half);

            let (c00, c10, c11, c01) = (
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            );
            mesh.add_triangle(Triangle::new(
                Vertex::from_parts(c00, n),
                Vertex::from_parts(c10, n),
                Vertex::from_parts(c11, n),
            ));
            mesh.add_triangle(Triangle::new(
                Vertex::from_parts(c00, n),
                Vertex::from_parts(c11, n),
                Vertex::from_parts(c01, n),
            ));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_wound_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.triangle_count(), 12);

        for triangle in &cube.triangles {
            let computed = triangle.calculate_normal();
            let stored = triangle.vertices[0].normal;
            assert!((computed - stored).norm() < 1e-6);
        }
    }

    #[test]
    fn test_bounds() {
        assert!(Mesh::new().bounds().is_none());

        let cube = Mesh::cube(4.0).translated(&Vector3::new(10.0, 0.0, 0.0));
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Point3::new(8.0, -2.0, -2.0));
        assert_eq!(max, Point3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let p = Point3::new(1.0, 1.0, 1.0);
        let triangle = Triangle::from_positions(p, p, p);
        assert_eq!(triangle.calculate_normal(), Vector3::zeros());
    }

    #[test]
    fn test_flipped_reverses_normal() {
        let cube = Mesh::cube(1.0);
        let flipped = cube.flipped();
        for (a, b) in cube.triangles.iter().zip(&flipped.triangles) {
            assert!((a.calculate_normal() + b.calculate_normal()).norm() < 1e-6);
        }
    }

    #[test]
    fn test_flat_positions_layout() {
        let cube = Mesh::cube(1.0);
        let flat = cube.flat_positions();
        assert_eq!(flat.len(), 12 * 9);
        assert_eq!(flat[0], cube.triangles[0].vertices[0].position.x);
    }
}
