/// Perspective camera used by the software viewers
use nalgebra::{Matrix4, Point3, Vector3};

use crate::scene::CameraPose;
use crate::transform::Transform;

/// Resolved camera for one viewport
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in radians
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Perspective camera at the given pose for a viewport aspect ratio
    pub fn from_pose(pose: &CameraPose, aspect: f32) -> Self {
        Self {
            position: pose.position(),
            target: pose.target(),
            up: Vector3::y(),
            fov: pose.fov_degrees.to_radians(),
            aspect,
            near: pose.near,
            far: pose.far,
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Project a model-space point to screen space.
    ///
    /// Returns `(x, y, depth)` with depth in normalized device units, or
    /// `None` when the point is behind the camera or outside the near/far
    /// range. `x` and `y` may fall off-screen; callers clip to the viewport.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let mvp = Transform::mvp_matrix(model_matrix, &self.view_matrix(), &self.projection_matrix());
        let clip = mvp * point.to_homogeneous();

        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.z.abs() > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_pose(&CameraPose::default(), 4.0 / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_from_pose() {
        let camera = Camera::from_pose(&CameraPose::default(), 2.0);
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(camera.far, 2000.0);
        assert!((camera.fov - std::f32::consts::FRAC_PI_4).abs() < 1e-6);
        assert_eq!(camera.position, Point3::new(0.0, 50.0, 150.0));
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = Camera::default();
        let (x, y, depth) = camera
            .project_to_screen(&Point3::origin(), &Matrix4::identity(), 800, 600)
            .unwrap();
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 300.0).abs() < 1e-3);
        assert!(depth > -1.0 && depth < 1.0);
    }

    #[test]
    fn test_point_behind_camera_is_clipped() {
        let camera = Camera::default();
        let behind = Point3::new(0.0, 60.0, 300.0);
        assert!(camera
            .project_to_screen(&behind, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_off_screen_point_still_projects() {
        let camera = Camera::default();
        let (x, _, _) = camera
            .project_to_screen(&Point3::new(400.0, 0.0, 0.0), &Matrix4::identity(), 800, 600)
            .unwrap();
        assert!(x > 800.0);
    }

    #[test]
    fn test_beyond_far_plane_is_clipped() {
        let camera = Camera::default();
        let far = Point3::new(0.0, 0.0, -5000.0);
        assert!(camera
            .project_to_screen(&far, &Matrix4::identity(), 800, 600)
            .is_none());
    }

    #[test]
    fn test_nearer_point_has_smaller_depth() {
        let camera = Camera::default();
        let model = Matrix4::identity();
        let (_, _, far) = camera
            .project_to_screen(&Point3::new(0.0, 0.0, -20.0), &model, 800, 600)
            .unwrap();
        let (_, _, near) = camera
            .project_to_screen(&Point3::new(0.0, 0.0, 20.0), &model, 800, 600)
            .unwrap();
        assert!(near < far);
    }
}
