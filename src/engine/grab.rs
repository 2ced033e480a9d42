//! Pinch-grab manipulation of a single item
//!
//! While the user pinches, the item hangs off a transient anchor. One
//! pinching hand drives the anchor directly; two hands place it at their
//! midpoint, orient it toward the left hand and scale it by the hand
//! distance. Whenever a hand starts or stops pinching the item is re-parented
//! in the same tick so its world pose does not jump.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::layers::Item;
use crate::spatial::{look_rotation, Transform};

/// One tracked pinch point (a hand)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PinchSource {
    pub is_pinching: bool,
    /// Pinching started or stopped this tick
    pub did_change: bool,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PinchSource {
    /// A source pinching steadily at the given pose
    pub fn pinching(position: Vec3, rotation: Quat) -> Self {
        Self {
            is_pinching: true,
            did_change: false,
            position,
            rotation,
        }
    }

    /// A source that is not pinching
    pub fn idle() -> Self {
        Self::default()
    }

    /// Mark the pinch state as having flipped this tick
    pub fn changed(mut self) -> Self {
        self.did_change = true;
        self
    }
}

/// Hand state sampled for one fixed tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrabInput {
    pub left: PinchSource,
    pub right: PinchSource,
    /// A hand is touching the item's collider
    pub in_contact: bool,
}

/// Which parts of the anchor pose a grab may write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabCapabilities {
    pub allow_translation: bool,
    pub allow_rotation: bool,
    pub allow_two_hand_scale: bool,
}

impl Default for GrabCapabilities {
    fn default() -> Self {
        Self {
            allow_translation: true,
            allow_rotation: true,
            allow_two_hand_scale: true,
        }
    }
}

/// Which pinch sources the host has wired up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinchRig {
    pub left: bool,
    pub right: bool,
}

impl Default for PinchRig {
    fn default() -> Self {
        Self {
            left: true,
            right: true,
        }
    }
}

impl PinchRig {
    pub fn is_complete(&self) -> bool {
        self.left && self.right
    }
}

/// How the item is held this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabMode {
    TwoHanded,
    Left,
    Right,
    Released,
}

impl GrabMode {
    pub fn from_input(input: &GrabInput) -> Self {
        match (input.left.is_pinching, input.right.is_pinching) {
            (true, true) => GrabMode::TwoHanded,
            (true, false) => GrabMode::Left,
            (false, true) => GrabMode::Right,
            (false, false) => GrabMode::Released,
        }
    }
}

/// What a grab tick did to the item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrabOutcome {
    pub mode: GrabMode,
    /// The item left its slot on this tick
    pub pulled_out: bool,
    /// The anchor was moved without carrying the item
    pub rebased: bool,
}

/// Per-item grab state machine
#[derive(Debug, Clone, PartialEq)]
pub struct GrabController {
    capabilities: GrabCapabilities,
    enabled: bool,
    is_pinched: bool,
}

impl GrabController {
    pub fn new(capabilities: GrabCapabilities, enabled: bool) -> Self {
        Self {
            capabilities,
            enabled,
            is_pinched: false,
        }
    }

    pub fn capabilities(&self) -> &GrabCapabilities {
        &self.capabilities
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_pinched(&self) -> bool {
        self.is_pinched
    }

    /// Forget the pinch (the item went back to its slot)
    pub(crate) fn reset(&mut self) {
        self.is_pinched = false;
    }

    /// Apply one tick of hand input to `item`
    ///
    /// The caller has already checked that this item may be grabbed.
    pub fn process(&mut self, item: &mut Item, input: &GrabInput) -> GrabOutcome {
        let mode = GrabMode::from_input(input);

        if mode == GrabMode::Released {
            self.is_pinched = false;
            item.release_anchor();
            return GrabOutcome {
                mode,
                pulled_out: false,
                rebased: false,
            };
        }

        self.is_pinched = true;
        let pulled_out = item.pull_out();
        let created = item.ensure_anchor();
        let rebased = input.left.did_change || input.right.did_change || created;

        let current = item
            .anchor()
            .map(|anchor| anchor.transform)
            .unwrap_or(*item.transform());
        let pose = self.anchor_pose(mode, input, current);

        if rebased {
            item.rebase_anchor(pose);
        } else {
            item.drive_anchor(pose);
        }

        GrabOutcome {
            mode,
            pulled_out,
            rebased,
        }
    }

    /// Target anchor pose for `mode`, starting from the current anchor pose
    pub fn anchor_pose(&self, mode: GrabMode, input: &GrabInput, current: Transform) -> Transform {
        match mode {
            GrabMode::TwoHanded => self.two_handed_pose(&input.left, &input.right, current),
            GrabMode::Left => self.single_handed_pose(&input.left, current),
            GrabMode::Right => self.single_handed_pose(&input.right, current),
            GrabMode::Released => current,
        }
    }

    fn two_handed_pose(&self, left: &PinchSource, right: &PinchSource, current: Transform) -> Transform {
        let mut pose = current;

        if self.capabilities.allow_translation {
            pose.position = (left.position + right.position) * 0.5;
        }

        if self.capabilities.allow_rotation {
            let up = left.rotation.slerp(right.rotation, 0.5) * Vec3::Y;
            // Coincident hands leave the rotation alone
            if let Some(rotation) = look_rotation(left.position - pose.position, up) {
                pose.rotation = rotation;
            }
        }

        // Raw hand distance, not relative to the distance at grab time
        if self.capabilities.allow_two_hand_scale {
            pose.scale = Vec3::splat(left.position.distance(right.position));
        }

        pose
    }

    fn single_handed_pose(&self, source: &PinchSource, current: Transform) -> Transform {
        let mut pose = current;
        if self.capabilities.allow_translation {
            pose.position = source.position;
        }
        if self.capabilities.allow_rotation {
            pose.rotation = source.rotation;
        }
        pose.scale = Vec3::ONE;
        pose
    }
}
