/// Enclosed volume of a triangle mesh via signed tetrahedra.
///
/// Every face forms a tetrahedron with the origin; summing their signed
/// volumes yields the enclosed volume regardless of where the mesh sits.
/// The mesh must be consistently wound: faces with mixed orientation
/// subtract from each other instead of adding up. No adjacency or
/// manifoldness checks are made, so any triangle soup gives a defined result.
/// A mesh with a NaN or infinite coordinate has no measurable volume and
/// reports 0, the unset value.
use crate::geometry::{Mesh, Triangle};

/// Cubic millimetres per millilitre
pub const MM3_PER_ML: f64 = 1000.0;

/// Signed volume in the mesh's native cubic units.
///
/// Positive for outward (counter-clockwise seen from outside) winding,
/// negative for a globally reversed mesh.
pub fn signed_volume(triangles: &[Triangle]) -> f64 {
    triangles
        .iter()
        .map(|triangle| {
            let [p1, p2, p3] = triangle.positions().map(|p| p.coords.cast::<f64>());
            p1.dot(&p2.cross(&p3)) / 6.0
        })
        .sum()
}

/// Enclosed volume in millilitres, treating coordinates as millimetres
pub fn mesh_volume_ml(mesh: &Mesh) -> f32 {
    let ml = (signed_volume(&mesh.triangles).abs() / MM3_PER_ML) as f32;
    if ml.is_finite() {
        ml
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_empty_mesh_has_zero_volume() {
        assert_eq!(signed_volume(&[]), 0.0);
        assert_eq!(mesh_volume_ml(&Mesh::new()), 0.0);
    }

    #[test]
    fn test_cube_volume() {
        for edge in [1.0f32, 10.0, 25.0, 100.0] {
            let expected = (edge as f64).powi(3) / 1000.0;
            assert_relative_eq!(
                mesh_volume_ml(&Mesh::cube(edge)) as f64,
                expected,
                max_relative = 1e-5
            );
        }
    }

    #[test]
    fn test_outward_winding_is_positive() {
        assert!(signed_volume(&Mesh::cube(2.0).triangles) > 0.0);
    }

    #[test]
    fn test_translation_invariant() {
        let cube = Mesh::cube(10.0);
        let moved = cube.translated(&Vector3::new(250.0, -40.0, 1200.0));

        assert_relative_eq!(
            mesh_volume_ml(&moved),
            mesh_volume_ml(&cube),
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_triangle_order_does_not_matter() {
        let cube = Mesh::cube(10.0);
        let mut reversed = cube.clone();
        reversed.triangles.reverse();

        assert_relative_eq!(
            signed_volume(&reversed.triangles),
            signed_volume(&cube.triangles),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_reversed_winding_same_magnitude() {
        let cube = Mesh::cube(10.0);
        let flipped = cube.flipped();

        let original = signed_volume(&cube.triangles);
        let inverted = signed_volume(&flipped.triangles);
        assert_relative_eq!(inverted, -original, epsilon = 1e-9);
        assert_relative_eq!(mesh_volume_ml(&flipped), mesh_volume_ml(&cube));
    }

    #[test]
    fn test_mixed_winding_subtracts() {
        // Two disjoint cubes, the second wound inside out: volumes cancel.
        let a = Mesh::cube(10.0);
        let b = Mesh::cube(10.0)
            .translated(&Vector3::new(50.0, 0.0, 0.0))
            .flipped();
        let mut soup = a.clone();
        soup.triangles.extend(b.triangles);

        assert_relative_eq!(signed_volume(&soup.triangles), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_non_finite_coordinates_report_unset() {
        let mut mesh = Mesh::cube(10.0);
        mesh.add_triangle(Triangle::from_positions(
            Point3::new(f32::NAN, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));
        assert!(signed_volume(&mesh.triangles).is_nan());
        assert_eq!(mesh_volume_ml(&mesh), 0.0);

        let mut huge = Mesh::cube(10.0);
        huge.add_triangle(Triangle::from_positions(
            Point3::new(f32::INFINITY, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ));
        assert_eq!(mesh_volume_ml(&huge), 0.0);
    }

    #[test]
    fn test_ascii_nan_vertex_is_unset() {
        let text = "solid nan\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex nan 0 0\n\
                vertex 1 0 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            endsolid nan\n";
        let mesh = crate::stl::parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh_volume_ml(&mesh), 0.0);
    }

    #[test]
    fn test_open_surface_is_defined() {
        let mut open = Mesh::cube(10.0);
        open.triangles.truncate(7);
        let volume = mesh_volume_ml(&open);
        assert!(volume.is_finite());
        assert!(volume >= 0.0);
    }
}
