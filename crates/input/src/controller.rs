use crate::InputFrame;
use glam::Vec3;
use mazeview_common::CameraState;
use serde::{Deserialize, Serialize};

const PITCH_LIMIT_DEGREES: f32 = 85.0;

/// Tuning for the first-person controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    /// Walking speed in world units per second.
    pub move_speed: f32,
    /// Radians of rotation per mouse count.
    pub mouse_sensitivity: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            mouse_sensitivity: 0.003,
        }
    }
}

/// First-person camera controller: walks on the ground plane at a fixed eye
/// height and looks around with the mouse.
///
/// Orientation is kept as yaw/pitch here; the camera's target is rewritten
/// from them after every update.
#[derive(Debug, Clone, Copy)]
pub struct FirstPersonController {
    yaw: f32,
    pitch: f32,
    settings: ControllerSettings,
}

impl FirstPersonController {
    /// Take the starting orientation from the camera's position and target.
    pub fn from_camera(camera: &CameraState, settings: ControllerSettings) -> Self {
        let dir = (camera.target - camera.position).normalize_or(Vec3::NEG_Z);
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        Self {
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.clamp(-1.0, 1.0).asin().clamp(-limit, limit),
            settings,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn settings(&self) -> ControllerSettings {
        self.settings
    }

    /// View direction, unit length.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    /// Walking direction: the view direction flattened onto the ground.
    pub fn planar_forward(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn right(&self) -> Vec3 {
        self.planar_forward().cross(Vec3::Y).normalize()
    }

    /// Apply one tick of input to `camera`.
    pub fn update(&mut self, camera: &mut CameraState, input: &InputFrame, dt: f32) {
        self.yaw += input.look.x * self.settings.mouse_sensitivity;
        self.pitch -= input.look.y * self.settings.mouse_sensitivity;
        let limit = PITCH_LIMIT_DEGREES.to_radians();
        self.pitch = self.pitch.clamp(-limit, limit);

        let step = self.settings.move_speed * dt;
        let delta =
            (self.planar_forward() * input.movement.y + self.right() * input.movement.x) * step;
        camera.position += delta;
        camera.target = camera.position + self.forward();
        camera.up = Vec3::Y;
    }
}
