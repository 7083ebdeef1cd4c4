/// Procedural stand-in shapes for layers that have no uploaded mesh
use std::f32::consts::TAU;

use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::Serialize;

use crate::geometry::{Mesh, Triangle};

/// Range of the simulated volume given to placeholder layers, in millilitres
pub const SIMULATED_VOLUME_ML: std::ops::Range<f32> = 20.0..70.0;

const TORUS_KNOT_RADIUS: f32 = 15.0;
const TORUS_KNOT_TUBE: f32 = 4.0;
const TORUS_KNOT_TUBULAR_SEGMENTS: usize = 100;
const TORUS_KNOT_RADIAL_SEGMENTS: usize = 16;
const TORUS_KNOT_P: f32 = 2.0;
const TORUS_KNOT_Q: f32 = 3.0;

const CYLINDER_RADIUS: f32 = 15.0;
const CYLINDER_HEIGHT: f32 = 40.0;
const CYLINDER_SEGMENTS: usize = 32;

const ICOSAHEDRON_RADIUS: f32 = 20.0;
const ICOSAHEDRON_SUBDIVISIONS: u32 = 1;

/// The fixed set of placeholder solids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderShape {
    /// Upper structures
    TorusKnot,
    /// Lower structures
    Cylinder,
    /// Everything else
    Icosahedron,
}

impl PlaceholderShape {
    /// Pick a shape from name fragments; unknown names get the icosahedron
    pub fn for_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let has_any = |fragments: &[&str]| fragments.iter().any(|f| lower.contains(f));

        if has_any(&["上颌", "upper", "maxill"]) {
            PlaceholderShape::TorusKnot
        } else if has_any(&["下颌", "lower", "mandib"]) {
            PlaceholderShape::Cylinder
        } else {
            PlaceholderShape::Icosahedron
        }
    }

    /// Where the shape sits in the scene so the demo layers do not overlap
    pub fn offset(&self) -> Vector3<f32> {
        match self {
            PlaceholderShape::TorusKnot => Vector3::new(0.0, 20.0, 0.0),
            PlaceholderShape::Cylinder => Vector3::new(0.0, -20.0, 0.0),
            PlaceholderShape::Icosahedron => Vector3::zeros(),
        }
    }

    /// Build the shape's triangles, centered on its own origin
    pub fn mesh(&self) -> Mesh {
        match self {
            PlaceholderShape::TorusKnot => torus_knot(
                TORUS_KNOT_RADIUS,
                TORUS_KNOT_TUBE,
                TORUS_KNOT_TUBULAR_SEGMENTS,
                TORUS_KNOT_RADIAL_SEGMENTS,
                TORUS_KNOT_P,
                TORUS_KNOT_Q,
            ),
            PlaceholderShape::Cylinder => {
                cylinder(CYLINDER_RADIUS, CYLINDER_HEIGHT, CYLINDER_SEGMENTS)
            }
            PlaceholderShape::Icosahedron => {
                icosahedron(ICOSAHEDRON_RADIUS, ICOSAHEDRON_SUBDIVISIONS)
            }
        }
    }
}

/// A plausible volume for a layer without real geometry
pub fn simulated_volume<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(SIMULATED_VOLUME_ML)
}

fn torus_knot_curve(u: f32, p: f32, q: f32, radius: f32) -> Vector3<f32> {
    let qu_over_p = q / p * u;
    let cs = qu_over_p.cos();
    Vector3::new(
        radius * (2.0 + cs) * 0.5 * u.cos(),
        radius * (2.0 + cs) * 0.5 * u.sin(),
        radius * qu_over_p.sin() * 0.5,
    )
}

/// (p, q) torus knot swept with a circular tube
pub fn torus_knot(
    radius: f32,
    tube: f32,
    tubular_segments: usize,
    radial_segments: usize,
    p: f32,
    q: f32,
) -> Mesh {
    let ring = radial_segments + 1;
    let mut rings: Vec<Point3<f32>> = Vec::with_capacity((tubular_segments + 1) * ring);

    for i in 0..=tubular_segments {
        let u = i as f32 / tubular_segments as f32 * p * TAU;
        let p1 = torus_knot_curve(u, p, q, radius);
        let p2 = torus_knot_curve(u + 0.01, p, q, radius);

        // Frenet-like frame along the curve
        let tangent = p2 - p1;
        let binormal = tangent.cross(&(p2 + p1)).normalize();
        let normal = binormal.cross(&tangent).normalize();

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            let cx = -tube * v.cos();
            let cy = tube * v.sin();
            rings.push(Point3::from(p1 + normal * cx + binormal * cy));
        }
    }

    let mut mesh = Mesh::with_capacity(tubular_segments * radial_segments * 2);
    for j in 1..=tubular_segments {
        for i in 1..=radial_segments {
            let a = rings[ring * (j - 1) + (i - 1)];
            let b = rings[ring * j + (i - 1)];
            let c = rings[ring * j + i];
            let d = rings[ring * (j - 1) + i];
            mesh.add_triangle(Triangle::from_positions(a, b, d));
            mesh.add_triangle(Triangle::from_positions(b, c, d));
        }
    }
    mesh
}

/// Closed cylinder along the y axis, centered on the origin
pub fn cylinder(radius: f32, height: f32, segments: usize) -> Mesh {
    let half = height / 2.0;
    let rim = |k: usize, y: f32| {
        let theta = k as f32 / segments as f32 * TAU;
        Point3::new(radius * theta.cos(), y, radius * theta.sin())
    };
    let top_center = Point3::new(0.0, half, 0.0);
    let bottom_center = Point3::new(0.0, -half, 0.0);

    let mut mesh = Mesh::with_capacity(segments * 4);
    for k in 0..segments {
        let (b0, b1) = (rim(k, -half), rim(k + 1, -half));
        let (t0, t1) = (rim(k, half), rim(k + 1, half));

        mesh.add_triangle(Triangle::from_positions(b0, t1, b1));
        mesh.add_triangle(Triangle::from_positions(b0, t0, t1));
        mesh.add_triangle(Triangle::from_positions(top_center, t1, t0));
        mesh.add_triangle(Triangle::from_positions(bottom_center, b0, b1));
    }
    mesh
}

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Icosahedron projected onto a sphere, each face split in four `subdivisions` times
pub fn icosahedron(radius: f32, subdivisions: u32) -> Mesh {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let corners = [
        Vector3::new(-1.0, t, 0.0),
        Vector3::new(1.0, t, 0.0),
        Vector3::new(-1.0, -t, 0.0),
        Vector3::new(1.0, -t, 0.0),
        Vector3::new(0.0, -1.0, t),
        Vector3::new(0.0, 1.0, t),
        Vector3::new(0.0, -1.0, -t),
        Vector3::new(0.0, 1.0, -t),
        Vector3::new(t, 0.0, -1.0),
        Vector3::new(t, 0.0, 1.0),
        Vector3::new(-t, 0.0, -1.0),
        Vector3::new(-t, 0.0, 1.0),
    ]
    .map(|c| c.normalize());

    let mut faces: Vec<[Vector3<f32>; 3]> = ICOSAHEDRON_FACES
        .iter()
        .map(|&[a, b, c]| [corners[a], corners[b], corners[c]])
        .collect();

    for _ in 0..subdivisions {
        faces = faces
            .into_iter()
            .flat_map(|[a, b, c]| {
                let ab = (a + b).normalize();
                let bc = (b + c).normalize();
                let ca = (c + a).normalize();
                [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]
            })
            .collect();
    }

    Mesh::from_triangles(
        faces
            .into_iter()
            .map(|[a, b, c]| {
                Triangle::from_positions(
                    Point3::from(a * radius),
                    Point3::from(b * radius),
                    Point3::from(c * radius),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{mesh_volume_ml, signed_volume};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_shape_selection() {
        assert_eq!(PlaceholderShape::for_name("上颌导板"), PlaceholderShape::TorusKnot);
        assert_eq!(PlaceholderShape::for_name("下颌导板"), PlaceholderShape::Cylinder);
        assert_eq!(PlaceholderShape::for_name("骨骼结构"), PlaceholderShape::Icosahedron);
        assert_eq!(PlaceholderShape::for_name("Upper splint"), PlaceholderShape::TorusKnot);
        assert_eq!(PlaceholderShape::for_name("MANDIBLE"), PlaceholderShape::Cylinder);
        assert_eq!(PlaceholderShape::for_name(""), PlaceholderShape::Icosahedron);
    }

    #[test]
    fn test_selection_is_deterministic() {
        for name in ["上颌导板", "scan-01", "lower jaw"] {
            assert_eq!(
                PlaceholderShape::for_name(name),
                PlaceholderShape::for_name(name)
            );
        }
    }

    #[test]
    fn test_cylinder_volume_matches_prism() {
        let mesh = cylinder(15.0, 40.0, 32);
        assert_eq!(mesh.triangle_count(), 32 * 4);
        assert!(signed_volume(&mesh.triangles) > 0.0);

        // Regular 32-gon prism
        let base = 0.5 * 32.0 * 15.0f64.powi(2) * (std::f64::consts::TAU / 32.0).sin();
        assert_relative_eq!(
            mesh_volume_ml(&mesh) as f64,
            base * 40.0 / 1000.0,
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_icosahedron_is_closed_and_outward() {
        let mesh = icosahedron(20.0, 1);
        assert_eq!(mesh.triangle_count(), 80);
        assert!(signed_volume(&mesh.triangles) > 0.0);

        let sphere = 4.0 / 3.0 * std::f32::consts::PI * 20.0f32.powi(3) / 1000.0;
        let volume = mesh_volume_ml(&mesh);
        assert!(volume > 20.0 && volume < sphere);

        for p in mesh.triangles.iter().flat_map(|t| t.positions()) {
            assert_relative_eq!(p.coords.norm(), 20.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_torus_knot_size() {
        let mesh = PlaceholderShape::TorusKnot.mesh();
        assert_eq!(mesh.triangle_count(), 100 * 16 * 2);
        assert!(mesh.triangles.iter().all(|t| t
            .positions()
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()))));
    }

    #[test]
    fn test_simulated_volume_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = simulated_volume(&mut rng);
            assert!(SIMULATED_VOLUME_ML.contains(&v));
        }
    }
}
