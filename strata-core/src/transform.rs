/// Orbit state and the matrices that place scene content
use nalgebra::{Matrix4, Rotation3, Vector3};

use crate::projection::Camera;
use crate::scene::CameraPose;

pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 20.0;

/// Accumulated rotate/pan/zoom gestures relative to the initial camera pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    /// Rotation about the world up axis, radians
    pub yaw: f32,
    /// Rotation about the camera's right axis, radians (unbounded)
    pub pitch: f32,
    /// Target offset in camera-plane units of the initial distance
    pub pan_x: f32,
    pub pan_y: f32,
    /// Distance multiplier; below 1 moves closer
    pub zoom: f32,
}

impl OrbitState {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch += d_pitch;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply the camera distance by `factor`, clamped to the zoom range
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 && factor.is_finite() {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for OrbitState {
    fn default() -> Self {
        Self::new()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Orbit rotation: yaw about world Y, then pitch about the rotated X axis
    pub fn orbit_rotation(orbit: &OrbitState) -> Rotation3<f32> {
        Rotation3::from_axis_angle(&Vector3::y_axis(), orbit.yaw)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), orbit.pitch)
    }

    /// Camera for a pose after applying orbit gestures.
    ///
    /// The up vector rotates with the camera, so rotation has no pole lock.
    pub fn orbit_camera(pose: &CameraPose, orbit: &OrbitState, aspect: f32) -> Camera {
        let mut camera = Camera::from_pose(pose, aspect);
        let rotation = Self::orbit_rotation(orbit);

        let base_offset = camera.position - camera.target;
        let distance = base_offset.norm();
        let offset = rotation * base_offset * orbit.zoom;
        let up = rotation * Vector3::y();

        let forward = (-offset).normalize();
        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward);
        let pan = (right * orbit.pan_x + true_up * orbit.pan_y) * distance;

        camera.target += pan;
        camera.position = camera.target + offset;
        camera.up = true_up;
        camera
    }

    /// Create a translation matrix
    pub fn translation_matrix(offset: &Vector3<f32>) -> Matrix4<f32> {
        Matrix4::new_translation(offset)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}
