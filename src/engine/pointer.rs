//! Pointer detection
//!
//! Tracks which item the gaze (or mouse) pointer rests on. Detection is
//! exclusive: entering a new item always reports leaving the old one first.
//! While the grab focus is held or a transition runs the detection is
//! frozen, apart from reporting that the pointer stays on the same item.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layers::{ItemId, RayHit};

/// Zoom animation driven by the external zoom subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoomState {
    #[default]
    Idle,
    ZoomingIn,
    ZoomingOut,
}

impl ZoomState {
    pub fn is_zooming(&self) -> bool {
        !matches!(self, ZoomState::Idle)
    }
}

impl fmt::Display for ZoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoomState::Idle => write!(f, "Idle"),
            ZoomState::ZoomingIn => write!(f, "ZoomingIn"),
            ZoomState::ZoomingOut => write!(f, "ZoomingOut"),
        }
    }
}

/// Shared pointer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    /// Item under the pointer
    pub detected: Option<ItemId>,
    /// Item holding the grab focus (pulled out or zoomed)
    pub focused: Option<ItemId>,
    pub zoom: ZoomState,
}

impl PointerState {
    pub fn focus_held(&self) -> bool {
        self.focused.is_some()
    }
}

/// A change reported by one detection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionEvent {
    /// The pointer entered an item
    Detected(ItemId),
    /// The pointer is still on the detected item
    Stayed(ItemId),
    /// The pointer left an item
    Undetected(ItemId),
    /// Nothing hit and nothing detected
    Idle,
}

/// Turns pointer hits into detection events
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDetector {
    max_distance: f32,
    debug_output: bool,
}

impl PointerDetector {
    pub fn new(max_distance: f32, debug_output: bool) -> Self {
        Self {
            max_distance: max_distance.max(0.0),
            debug_output,
        }
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Apply one pointer sample
    ///
    /// `hit` is the nearest item under the pointer. Hits on layers other than
    /// `active_layer` are ignored. `busy` freezes the detection (grab focus
    /// held or a transition running).
    pub fn update(
        &self,
        state: &mut PointerState,
        hit: Option<RayHit>,
        active_layer: usize,
        busy: bool,
    ) -> Vec<DetectionEvent> {
        let hit = match hit {
            Some(hit) => hit,
            None => return self.no_hit(state, busy),
        };

        if hit.layer != active_layer {
            return Vec::new();
        }

        if self.debug_output {
            log::debug!("Pointer on {} at {:.3}", hit.item, hit.distance);
        }

        match state.detected {
            Some(current) if current == hit.item => vec![DetectionEvent::Stayed(current)],
            _ if busy => Vec::new(),
            Some(current) => {
                state.detected = Some(hit.item);
                vec![
                    DetectionEvent::Undetected(current),
                    DetectionEvent::Detected(hit.item),
                ]
            }
            None => {
                state.detected = Some(hit.item);
                vec![DetectionEvent::Detected(hit.item)]
            }
        }
    }

    fn no_hit(&self, state: &mut PointerState, busy: bool) -> Vec<DetectionEvent> {
        match state.detected {
            None => vec![DetectionEvent::Idle],
            Some(_) if busy => Vec::new(),
            Some(current) => {
                state.detected = None;
                vec![DetectionEvent::Undetected(current)]
            }
        }
    }
}
