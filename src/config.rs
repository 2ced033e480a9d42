//! Engine configuration
//!
//! A plain value object built once at startup (usually deserialized from the
//! preferences file by the caller) and handed to the engine. `clamped` is
//! the single validation pass; the engine re-applies it whenever the
//! configuration changes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::engine::GrabCapabilities;
use crate::layers::LayoutTuning;

/// Smallest per-tick step a transition may use
///
/// Applied when speeds are configured as zero. A step too small to change
/// the current value in f32 snaps the channel onto its target.
pub const MIN_STEP: f32 = 1e-4;

/// Which input devices are in use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub use_leap_motion: bool,
    pub use_pitch_grab: bool,
    pub use_haptic_glove: bool,
    pub use_keyboard: bool,
    pub use_mouse: bool,
    pub use_joystick: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            use_leap_motion: true,
            use_pitch_grab: true,
            use_haptic_glove: false,
            use_keyboard: false,
            use_mouse: false,
            use_joystick: false,
        }
    }
}

/// Step sizes of the layer transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub radius_factor: f32,
    pub radius_speed: f32,
    pub alpha_factor: f32,
    pub alpha_speed: f32,
    /// Seconds of outward motion before alpha starts changing
    pub alpha_wait_time: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            radius_factor: 1.0,
            radius_speed: 0.01,
            alpha_factor: 1.0,
            alpha_speed: 0.02,
            alpha_wait_time: 0.8,
        }
    }
}

impl NavigationConfig {
    /// Radius change per fixed tick (unsigned)
    pub fn radius_step(&self) -> f32 {
        (self.radius_factor * self.radius_speed).max(MIN_STEP)
    }

    /// Alpha change per fixed tick (unsigned)
    pub fn alpha_step(&self) -> f32 {
        (self.alpha_factor * self.alpha_speed).max(MIN_STEP)
    }
}

/// Viewer rotation speeds and the forbidden pitch band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Degrees per unit of horizontal axis
    pub horizontal_speed: f32,
    /// Degrees per unit of vertical axis
    pub vertical_speed: f32,
    /// Lower edge of the forbidden pitch band (looking down)
    pub pitch_lower_limit: f32,
    /// Upper edge of the forbidden pitch band (looking up)
    pub pitch_upper_limit: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            horizontal_speed: 1.0,
            vertical_speed: 1.0,
            pitch_lower_limit: 50.0,
            pitch_upper_limit: 310.0,
        }
    }
}

/// Gaze pointer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Longest distance a gaze ray can pick an item at
    pub max_distance: f32,
    /// Distance at which zoomed items are presented
    pub close_range: f32,
    pub look_pointer_scale: Vec3,
    /// Log every pick at debug level
    pub debug_output: bool,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            max_distance: 10.0,
            close_range: 2.0,
            look_pointer_scale: Vec3::ONE,
            debug_output: false,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub input: InputConfig,
    pub navigation: NavigationConfig,
    pub camera: CameraConfig,
    pub pointer: PointerConfig,
    pub grab: GrabCapabilities,
    pub layout: LayoutTuning,
    /// Shared centre of every layer
    pub center: Vec3,
}

impl EngineConfig {
    /// Bring the configuration into a consistent state
    ///
    /// - without hand tracking there is no pitch grab and no haptic glove
    /// - without a keyboard there is no mouse
    /// - speeds, scales and distances are non-negative
    /// - the zoom close range is at least 0.1
    pub fn clamped(mut self) -> Self {
        if !self.input.use_leap_motion {
            self.input.use_pitch_grab = false;
            self.input.use_haptic_glove = false;
        }
        if !self.input.use_keyboard {
            self.input.use_mouse = false;
        }

        let nav = &mut self.navigation;
        nav.radius_factor = nav.radius_factor.max(0.0);
        nav.radius_speed = nav.radius_speed.max(0.0);
        nav.alpha_factor = nav.alpha_factor.max(0.0);
        nav.alpha_speed = nav.alpha_speed.max(0.0);
        nav.alpha_wait_time = nav.alpha_wait_time.max(0.0);

        self.camera.horizontal_speed = self.camera.horizontal_speed.max(0.0);
        self.camera.vertical_speed = self.camera.vertical_speed.max(0.0);

        self.pointer.max_distance = self.pointer.max_distance.max(0.0);
        self.pointer.close_range = self.pointer.close_range.max(0.1);
        self.pointer.look_pointer_scale = self.pointer.look_pointer_scale.max(Vec3::ZERO);

        self.layout = self.layout.clamped();
        self
    }

    /// Mouse-driven session (keyboard and mouse both on)
    pub fn mouse_input(&self) -> bool {
        self.input.use_keyboard && self.input.use_mouse
    }
}
