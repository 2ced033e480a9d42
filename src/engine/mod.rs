//! Interaction Engine Module
//!
//! The state machines that drive browsing:
//! - Transition scheduler: animated inward/outward layer moves
//! - Pointer detector: which item the pointer rests on
//! - Grab controller: pinch manipulation of a single item
//! - Viewer: the camera the gaze is cast from
//! - Engine: owns all of the above and runs them from host ticks

pub mod affordances;
pub mod browser;
pub mod grab;
pub mod pointer;
pub mod transition;
pub mod viewer;

pub use affordances::{AcceptLabel, Affordances, ButtonPanel, ItemCue, NavigationBounds, NoAffordances};
pub use browser::{CycleReport, Engine, FixedInput, FixedTickReport, FrameInput, NavigationRequest, PointerInput};
pub use grab::{GrabCapabilities, GrabController, GrabInput, GrabMode, GrabOutcome, PinchRig, PinchSource};
pub use pointer::{DetectionEvent, PointerDetector, PointerState, ZoomState};
pub use transition::{
    target_reached, Channel, LayerProgress, NavigationBlock, RequestOutcome, StepStatus, Transition,
    TransitionKind, TransitionScheduler,
};
pub use viewer::{clamp_pitch, Viewer};
