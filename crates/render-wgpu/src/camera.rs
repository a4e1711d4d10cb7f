//! View and projection matrices for a [`CameraState`].

use glam::{Mat4, Vec3};
use mazeview_common::{CameraState, Projection};

pub const NEAR: f32 = 0.01;
pub const FAR: f32 = 1000.0;

pub fn view_matrix(camera: &CameraState) -> Mat4 {
    let mut target = camera.target;
    if (target - camera.position).length_squared() < f32::EPSILON {
        target = camera.position + Vec3::NEG_Z;
    }
    let up = camera.up.try_normalize().unwrap_or(Vec3::Y);
    Mat4::look_at_rh(camera.position, target, up)
}

/// Projection for a viewport of the given aspect ratio (width / height).
pub fn projection_matrix(camera: &CameraState, aspect: f32) -> Mat4 {
    let aspect = if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    };
    match camera.projection {
        Projection::Perspective => {
            Mat4::perspective_rh(camera.fovy.to_radians(), aspect, NEAR, FAR)
        }
        Projection::Orthographic => {
            let top = camera.fovy * 0.5;
            let right = top * aspect;
            Mat4::orthographic_rh(-right, right, -top, top, NEAR, FAR)
        }
    }
}

pub fn view_projection(camera: &CameraState, aspect: f32) -> Mat4 {
    projection_matrix(camera, aspect) * view_matrix(camera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn default_camera() {
        let vp = view_projection(&CameraState::default(), 1020.0 / 800.0);
        // Should produce a valid matrix (no NaN)
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn target_projects_to_screen_center() {
        let cam = CameraState {
            position: Vec3::new(1.0, 0.5, 1.0),
            target: Vec3::new(4.0, 0.5, 1.0),
            ..CameraState::default()
        };
        let clip = view_projection(&cam, 1.5) * Vec4::new(4.0, 0.5, 1.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn degenerate_camera_stays_finite() {
        let cam = CameraState {
            position: Vec3::ONE,
            target: Vec3::ONE,
            up: Vec3::ZERO,
            ..CameraState::default()
        };
        let vp = view_projection(&cam, 0.0);
        assert!(vp.is_finite());
    }

    #[test]
    fn orthographic_uses_fovy_as_height() {
        let cam = CameraState {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            fovy: 10.0,
            projection: Projection::Orthographic,
            ..CameraState::default()
        };
        let clip = view_projection(&cam, 1.0) * Vec4::new(0.0, 5.0, -1.0, 1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
    }
}
