//! Viewer camera
//!
//! The head (or desktop camera) the gaze pointer is cast from. Angles are in
//! degrees and kept in `[0, 360)`: yaw turns about +Y, positive pitch looks
//! down. Looking straight ahead is +Z.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::spatial::Ray;

/// Camera pose used for gaze picking
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
}

impl Viewer {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = wrap_degrees(yaw);
        self.pitch = wrap_degrees(pitch);
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw.to_radians(), self.pitch.to_radians(), 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    /// Ray along the view direction
    pub fn gaze_ray(&self) -> Ray {
        Ray::new(self.position, self.forward())
    }

    /// Turn about the world up axis by `speed * axis` degrees
    pub fn move_horizontal(&mut self, axis: f32, speed: f32) {
        self.yaw = wrap_degrees(self.yaw + speed * axis);
    }

    /// Tilt by `speed * axis` degrees; a positive axis looks up
    pub fn move_vertical(&mut self, axis: f32, speed: f32) {
        self.pitch = wrap_degrees(self.pitch - speed * axis);
    }

    /// Push the pitch out of the forbidden band
    ///
    /// Returns true when the pitch was changed.
    pub fn clamp_pitch(&mut self, camera: &CameraConfig) -> bool {
        let clamped = clamp_pitch(self.pitch, camera.pitch_lower_limit, camera.pitch_upper_limit);
        let changed = clamped != self.pitch;
        self.pitch = clamped;
        changed
    }
}

/// Map a pitch inside `[lower, upper]` to the nearer edge
///
/// A pitch exactly halfway goes to `upper`.
pub fn clamp_pitch(pitch: f32, lower: f32, upper: f32) -> f32 {
    if pitch < lower || pitch > upper {
        return pitch;
    }
    if upper - pitch > pitch - lower {
        lower
    } else {
        upper
    }
}

fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
