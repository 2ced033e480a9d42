//! The browsing engine
//!
//! Owns the layer stack and every interaction state machine and drives them
//! from two host ticks:
//! - frame tick: pointer detection and the layer counter text
//! - fixed tick: pitch clamp, grab, queued navigation input, transition step
//!
//! One cycle is a frame tick followed by a fixed tick, so detection always
//! precedes the grab which precedes the transition step.

use std::collections::HashMap;

use super::affordances::{Affordances, ItemCue, NavigationBounds};
use super::grab::{GrabController, GrabInput, GrabOutcome, PinchRig};
use super::pointer::{DetectionEvent, PointerDetector, PointerState, ZoomState};
use super::transition::{NavigationBlock, RequestOutcome, TransitionKind, TransitionScheduler};
use super::viewer::Viewer;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::{EventSink, ACCEPT, PULL_OUT, ZOOM_OUT};
use crate::layers::{Item, ItemFactory, ItemId, LayerStack, RayHit};
use crate::spatial::Ray;

/// Where the pointer comes from on a frame tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerInput {
    /// No pointer this frame; detection is left alone
    Inactive,
    /// Cast along the viewer's gaze
    #[default]
    Gaze,
    /// Cast along an arbitrary ray (mouse picking)
    Ray(Ray),
    /// The host already resolved the hit
    Hit(Option<RayHit>),
}

/// Input sampled for a frame tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub pointer: PointerInput,
}

/// Discrete navigation input queued for a fixed tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationRequest {
    /// Move one layer inward; only a strength of exactly 1.0 animates
    Inward(f32),
    /// Move one layer outward; only a strength of exactly 1.0 animates
    Outward(f32),
    CameraHorizontal(f32),
    CameraVertical(f32),
    LayerHorizontal(f32),
    LayerVertical(f32),
}

/// Input sampled for a fixed tick
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedInput {
    /// Hand state, when hand tracking is running
    pub grab: Option<GrabInput>,
    pub navigation: Vec<NavigationRequest>,
}

/// What a fixed tick did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FixedTickReport {
    pub grab: Option<GrabOutcome>,
    /// Outcomes of the inward/outward requests, in order
    pub requests: Vec<RequestOutcome>,
    /// Transition that completed on this tick
    pub completed: Option<TransitionKind>,
}

/// What a full cycle did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CycleReport {
    pub detection: Vec<DetectionEvent>,
    pub fixed: FixedTickReport,
}

/// Layer browsing engine
pub struct Engine {
    config: EngineConfig,
    stack: LayerStack,
    scheduler: TransitionScheduler,
    detector: PointerDetector,
    pointer: PointerState,
    grabs: HashMap<ItemId, GrabController>,
    grab_enabled: bool,
    viewer: Viewer,
    affordances: Box<dyn Affordances>,
    events: Box<dyn EventSink>,
    factory: Box<dyn ItemFactory>,
    status_text: String,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("stack", &self.stack)
            .field("scheduler", &self.scheduler)
            .field("pointer", &self.pointer)
            .field("grab_enabled", &self.grab_enabled)
            .field("viewer", &self.viewer)
            .field("status_text", &self.status_text)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build the engine and its layers for `content_count` items
    ///
    /// The configuration is clamped first. Pitch grab needs both pinch
    /// sources; with an incomplete rig grabbing is disabled for the session.
    ///
    /// # Errors
    /// `EmptyContent` when `content_count` is zero.
    pub fn new(
        config: EngineConfig,
        content_count: usize,
        rig: PinchRig,
        mut factory: Box<dyn ItemFactory>,
        mut affordances: Box<dyn Affordances>,
        events: Box<dyn EventSink>,
    ) -> Result<Self> {
        let config = config.clamped();
        let stack = LayerStack::from_content_count(content_count, &config.layout, config.center, factory.as_mut())?;

        let grab_enabled = config.input.use_pitch_grab && rig.is_complete();
        if config.input.use_pitch_grab && !rig.is_complete() {
            log::warn!(
                "Pitch grab enabled but the pinch rig is incomplete (left: {}, right: {}); grabbing disabled",
                rig.left,
                rig.right
            );
        }

        let detector = PointerDetector::new(config.pointer.max_distance, config.pointer.debug_output);
        let viewer = Viewer::new(config.center);
        let grabs = grab_controllers(&stack, &config, grab_enabled);
        let status_text = stack.counter_text();

        affordances.on_ready(NavigationBounds::of(&stack));
        log::info!(
            "Engine ready: {} items on {} layers, pitch grab {}",
            stack.item_count(),
            stack.len(),
            if grab_enabled { "on" } else { "off" }
        );

        Ok(Self {
            config,
            stack,
            scheduler: TransitionScheduler::new(),
            detector,
            pointer: PointerState::default(),
            grabs,
            grab_enabled,
            viewer,
            affordances,
            events,
            factory,
            status_text,
        })
    }

    /// Rebuild every layer for a new amount of content
    ///
    /// Any running transition, detection and focus are dropped.
    ///
    /// # Errors
    /// `EmptyContent` when `content_count` is zero; the engine is unchanged.
    pub fn retune(&mut self, content_count: usize) -> Result<()> {
        self.stack
            .retune(content_count, &self.config.layout, self.factory.as_mut())?;
        self.scheduler = TransitionScheduler::new();
        self.pointer = PointerState::default();
        self.grabs = grab_controllers(&self.stack, &self.config, self.grab_enabled);
        self.status_text = self.stack.counter_text();
        self.affordances.on_ready(NavigationBounds::of(&self.stack));
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    /// Layer counter shown to the user, refreshed every frame tick
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn is_transitioning(&self) -> bool {
        self.stack.is_transitioning()
    }

    pub fn grab_enabled(&self) -> bool {
        self.grab_enabled
    }

    pub fn grab_controller(&self, id: ItemId) -> Option<&GrabController> {
        self.grabs.get(&id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.stack.item(id)
    }

    pub fn navigation_bounds(&self) -> NavigationBounds {
        NavigationBounds::of(&self.stack)
    }

    // ========================================================================
    // Ticks
    // ========================================================================

    /// Run one frame tick followed by one fixed tick
    pub fn run_cycle(&mut self, dt: f32, frame: &FrameInput, fixed: &FixedInput) -> CycleReport {
        let detection = self.on_frame_tick(frame);
        let fixed = self.on_fixed_tick(dt, fixed);
        CycleReport { detection, fixed }
    }

    /// Per-frame work: pointer detection and the counter text
    pub fn on_frame_tick(&mut self, input: &FrameInput) -> Vec<DetectionEvent> {
        let max_distance = self.detector.max_distance();
        let hit = match input.pointer {
            PointerInput::Inactive => None,
            PointerInput::Gaze => self.stack.raycast(&self.viewer.gaze_ray(), max_distance),
            PointerInput::Ray(ray) => self.stack.raycast(&ray, max_distance),
            PointerInput::Hit(hit) => hit,
        };

        let detection = if input.pointer == PointerInput::Inactive {
            Vec::new()
        } else {
            let busy = self.pointer.focus_held() || self.stack.is_transitioning();
            let detection = self
                .detector
                .update(&mut self.pointer, hit, self.stack.active_index(), busy);
            for event in &detection {
                self.dispatch_detection(*event);
            }
            detection
        };

        self.status_text = self.stack.counter_text();
        detection
    }

    /// Fixed-rate work: pitch clamp, grab, navigation input, transition step
    pub fn on_fixed_tick(&mut self, dt: f32, input: &FixedInput) -> FixedTickReport {
        self.viewer.clamp_pitch(&self.config.camera);

        let grab = input.grab.as_ref().and_then(|grab| self.apply_grab(grab));

        let mut requests = Vec::new();
        for request in &input.navigation {
            if let Some(outcome) = self.apply_navigation(*request) {
                requests.push(outcome);
            }
        }

        let completed = self
            .scheduler
            .tick(&mut self.stack, dt, self.affordances.as_mut());

        FixedTickReport {
            grab,
            requests,
            completed,
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn request_inward(&mut self, strength: f32) -> RequestOutcome {
        self.request(TransitionKind::Inward, strength)
    }

    pub fn request_outward(&mut self, strength: f32) -> RequestOutcome {
        self.request(TransitionKind::Outward, strength)
    }

    fn request(&mut self, kind: TransitionKind, strength: f32) -> RequestOutcome {
        let block = self.navigation_block();
        self.scheduler.request(
            kind,
            strength,
            block,
            &mut self.stack,
            &self.config.navigation,
            self.affordances.as_mut(),
            self.events.as_mut(),
        )
    }

    fn navigation_block(&self) -> Option<NavigationBlock> {
        if self.pointer.focus_held() {
            Some(NavigationBlock::FocusHeld)
        } else if self.pointer.zoom.is_zooming() {
            Some(NavigationBlock::Zooming)
        } else if !self.stack.all_items_pinned() {
            Some(NavigationBlock::ItemPulledOut)
        } else {
            None
        }
    }

    fn apply_navigation(&mut self, request: NavigationRequest) -> Option<RequestOutcome> {
        match request {
            NavigationRequest::Inward(strength) => return Some(self.request_inward(strength)),
            NavigationRequest::Outward(strength) => return Some(self.request_outward(strength)),
            NavigationRequest::CameraHorizontal(axis) => self.move_camera_horizontal(axis),
            NavigationRequest::CameraVertical(axis) => self.move_camera_vertical(axis),
            NavigationRequest::LayerHorizontal(axis) => self.rotate_layer_horizontal(axis),
            NavigationRequest::LayerVertical(axis) => {
                if !self.rotate_layer_vertical(axis) {
                    log::debug!("Layer tilt refused at counter {}", self.stack.tilt_counter());
                }
            }
        }
        None
    }

    /// Move the camera horizontally by `axis` (scaled by the camera speed)
    pub fn move_camera_horizontal(&mut self, axis: f32) {
        self.viewer
            .move_horizontal(axis, self.config.camera.horizontal_speed);
    }

    /// Move the camera vertically by `axis` (scaled by the camera speed)
    pub fn move_camera_vertical(&mut self, axis: f32) {
        self.viewer
            .move_vertical(axis, self.config.camera.vertical_speed);
    }

    /// Spin the active layer about its vertical axis
    pub fn rotate_layer_horizontal(&mut self, axis: f32) {
        self.stack
            .rotate_active_horizontal(axis, self.config.camera.horizontal_speed);
    }

    /// Tilt the active layer; returns false at the tilt limit
    pub fn rotate_layer_vertical(&mut self, axis: f32) -> bool {
        self.stack
            .rotate_active_vertical(axis, self.config.camera.vertical_speed)
    }

    // ========================================================================
    // Detection and Grab
    // ========================================================================

    fn cue(&self, item: ItemId) -> ItemCue {
        ItemCue {
            item,
            selected: self
                .stack
                .item(item)
                .map(Item::is_selected)
                .unwrap_or(false),
            focus_held: self.pointer.focus_held(),
        }
    }

    fn dispatch_detection(&mut self, event: DetectionEvent) {
        match event {
            DetectionEvent::Detected(item) => {
                let cue = self.cue(item);
                self.affordances.on_item_detected(cue);
            }
            DetectionEvent::Undetected(item) => {
                let cue = self.cue(item);
                self.affordances.on_item_undetected(cue);
            }
            DetectionEvent::Idle => self.affordances.on_pointer_idle(),
            DetectionEvent::Stayed(_) => {}
        }
    }

    /// Run the grab controller of the detected item, if it may be grabbed
    fn apply_grab(&mut self, input: &GrabInput) -> Option<GrabOutcome> {
        if !self.grab_enabled || !input.in_contact {
            return None;
        }
        if self.stack.is_transitioning() || self.pointer.zoom == ZoomState::ZoomingOut {
            return None;
        }

        let id = self.pointer.detected?;
        if self.pointer.focused.is_some_and(|focused| focused != id) {
            return None;
        }
        if self
            .grabs
            .iter()
            .any(|(other, grab)| *other != id && grab.is_pinched())
        {
            return None;
        }

        let active_index = self.stack.active_index();
        let item = self.stack.item_mut(id)?;
        if item.layer_index() != active_index {
            return None;
        }
        let controller = self.grabs.get_mut(&id)?;
        if !controller.is_enabled() {
            return None;
        }

        let outcome = controller.process(item, input);
        if outcome.pulled_out {
            let label = item.label().to_string();
            self.pointer.focused = Some(id);
            self.events.log_event(PULL_OUT, &label);
            log::debug!("Pulled out {} ({})", id, label);
            let cue = self.cue(id);
            self.affordances.on_pull_out(cue);
        }
        Some(outcome)
    }

    // ========================================================================
    // Focus, Selection and Zoom
    // ========================================================================

    /// Toggle the selection of the focused item, or the detected one
    ///
    /// Returns the new selection state, or `None` when no item is targeted.
    pub fn accept(&mut self) -> Option<bool> {
        let id = self.pointer.focused.or(self.pointer.detected)?;
        let item = self.stack.item_mut(id)?;
        let selected = item.toggle_selected();
        let detail = format!("{}:{}", item.label(), selected);

        self.events.log_event(ACCEPT, &detail);
        let cue = self.cue(id);
        self.affordances.on_selection_changed(cue);
        Some(selected)
    }

    /// Put the focused item back into its layer slot
    ///
    /// Clears the focus and any zoom state and re-enables navigation.
    /// Returns the item that was returned.
    pub fn return_focused_item(&mut self) -> Option<ItemId> {
        let id = self.pointer.focused.take()?;
        if let Some(item) = self.stack.item_mut(id) {
            item.return_to_slot();
            let label = item.label().to_string();
            self.events.log_event(ZOOM_OUT, &label);
        }
        if let Some(grab) = self.grabs.get_mut(&id) {
            grab.reset();
        }
        self.pointer.zoom = ZoomState::Idle;

        log::debug!("Returned {} to its slot", id);
        self.affordances.on_returned(NavigationBounds::of(&self.stack));
        Some(id)
    }

    /// Record the zoom animation state reported by the zoom subsystem
    pub fn set_zoom_state(&mut self, zoom: ZoomState) {
        if self.pointer.zoom != zoom {
            log::debug!("Zoom {} -> {}", self.pointer.zoom, zoom);
        }
        self.pointer.zoom = zoom;
    }

    /// Rename an item (e.g. with its image file name) for the event log
    pub fn set_item_label(&mut self, id: ItemId, label: impl Into<String>) -> bool {
        match self.stack.item_mut(id) {
            Some(item) => {
                item.set_label(label);
                true
            }
            None => false,
        }
    }
}

fn grab_controllers(
    stack: &LayerStack,
    config: &EngineConfig,
    enabled: bool,
) -> HashMap<ItemId, GrabController> {
    stack
        .items()
        .map(|item| (item.id(), GrabController::new(config.grab, enabled)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::affordances::NoAffordances;
    use crate::engine::grab::PinchSource;
    use crate::events::{MemoryEventLog, CHANGING_LAYER};
    use crate::layers::NullItemFactory;
    use glam::{Quat, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine_with_log(count: usize) -> (Engine, Rc<RefCell<MemoryEventLog>>) {
        let log = Rc::new(RefCell::new(MemoryEventLog::new()));
        let engine = Engine::new(
            EngineConfig::default(),
            count,
            PinchRig::default(),
            Box::new(NullItemFactory),
            Box::new(NoAffordances),
            Box::new(log.clone()),
        )
        .unwrap();
        (engine, log)
    }

    fn hand_at(position: Vec3) -> FixedInput {
        FixedInput {
            grab: Some(GrabInput {
                left: PinchSource::pinching(position, Quat::IDENTITY),
                right: PinchSource::idle(),
                in_contact: true,
            }),
            navigation: Vec::new(),
        }
    }

    fn settle(engine: &mut Engine) {
        let mut ticks = 0;
        while engine.is_transitioning() {
            engine.on_fixed_tick(0.02, &FixedInput::default());
            ticks += 1;
            assert!(ticks < 10_000);
        }
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    #[test]
    fn test_new_builds_layers() {
        let (engine, _) = engine_with_log(100);
        assert_eq!(engine.stack().len(), 3);
        assert_eq!(engine.status_text(), "1/3");
        assert!(engine.grab_enabled());
    }

    #[test]
    fn test_new_rejects_empty_content() {
        let result = Engine::new(
            EngineConfig::default(),
            0,
            PinchRig::default(),
            Box::new(NullItemFactory),
            Box::new(NoAffordances),
            Box::new(MemoryEventLog::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_incomplete_rig_disables_grab() {
        let engine = Engine::new(
            EngineConfig::default(),
            39,
            PinchRig {
                left: true,
                right: false,
            },
            Box::new(NullItemFactory),
            Box::new(NoAffordances),
            Box::new(MemoryEventLog::new()),
        )
        .unwrap();
        assert!(!engine.grab_enabled());
        let any = engine.stack().items().next().unwrap().id();
        assert!(!engine.grab_controller(any).unwrap().is_enabled());
    }

    // ------------------------------------------------------------------------
    // Detection and grab
    // ------------------------------------------------------------------------

    #[test]
    fn test_gaze_detects_item_ahead() {
        let (mut engine, _) = engine_with_log(39);
        let events = engine.on_frame_tick(&FrameInput::default());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DetectionEvent::Detected(_)));
        assert!(engine.pointer().detected.is_some());
    }

    #[test]
    fn test_grab_pulls_out_and_blocks_navigation() {
        let (mut engine, log) = engine_with_log(100);
        engine.on_frame_tick(&FrameInput::default());
        let detected = engine.pointer().detected.unwrap();

        let report = engine.on_fixed_tick(0.02, &hand_at(Vec3::new(0.0, 0.0, 0.3)));
        assert!(report.grab.unwrap().pulled_out);
        assert_eq!(engine.pointer().focused, Some(detected));
        assert_eq!(log.borrow().count(PULL_OUT), 1);

        // Second grab tick does not pull out again
        engine.on_fixed_tick(0.02, &hand_at(Vec3::new(0.0, 0.1, 0.3)));
        assert_eq!(log.borrow().count(PULL_OUT), 1);

        let outcome = engine.request_inward(1.0);
        assert_eq!(outcome, RequestOutcome::Blocked(NavigationBlock::FocusHeld));
        assert!(!engine.is_transitioning());
    }

    #[test]
    fn test_return_restores_navigation() {
        let (mut engine, log) = engine_with_log(100);
        engine.on_frame_tick(&FrameInput::default());
        engine.on_fixed_tick(0.02, &hand_at(Vec3::new(0.0, 0.0, 0.3)));
        engine.on_fixed_tick(0.02, &FixedInput {
            grab: Some(GrabInput {
                in_contact: true,
                ..GrabInput::default()
            }),
            navigation: Vec::new(),
        });

        let returned = engine.return_focused_item().unwrap();
        let item = engine.item(returned).unwrap();
        assert!(item.is_pinned());
        assert_eq!(item.transform(), item.slot_transform());
        assert_eq!(log.borrow().count(ZOOM_OUT), 1);

        assert!(engine.request_inward(1.0).started());
    }

    #[test]
    fn test_no_grab_without_contact() {
        let (mut engine, _) = engine_with_log(39);
        engine.on_frame_tick(&FrameInput::default());
        let mut input = hand_at(Vec3::ZERO);
        if let Some(grab) = input.grab.as_mut() {
            grab.in_contact = false;
        }
        assert!(engine.on_fixed_tick(0.02, &input).grab.is_none());
    }

    #[test]
    fn test_no_grab_while_zooming_out() {
        let (mut engine, _) = engine_with_log(39);
        engine.on_frame_tick(&FrameInput::default());
        engine.set_zoom_state(ZoomState::ZoomingOut);
        assert!(engine
            .on_fixed_tick(0.02, &hand_at(Vec3::ZERO))
            .grab
            .is_none());
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    #[test]
    fn test_accept_toggles_detected_item() {
        let (mut engine, log) = engine_with_log(39);
        assert_eq!(engine.accept(), None);

        engine.on_frame_tick(&FrameInput::default());
        assert_eq!(engine.accept(), Some(true));
        assert_eq!(engine.accept(), Some(false));
        assert_eq!(log.borrow().count(ACCEPT), 2);
        assert!(log.borrow().details(ACCEPT)[0].ends_with(":true"));
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    #[test]
    fn test_navigation_requests_in_fixed_tick() {
        let (mut engine, log) = engine_with_log(100);
        let report = engine.on_fixed_tick(0.02, &FixedInput {
            grab: None,
            navigation: vec![NavigationRequest::Inward(1.0), NavigationRequest::Inward(1.0)],
        });
        assert_eq!(
            report.requests,
            vec![RequestOutcome::Started(TransitionKind::Inward), RequestOutcome::Busy]
        );
        settle(&mut engine);
        engine.on_frame_tick(&FrameInput {
            pointer: PointerInput::Inactive,
        });
        assert_eq!(engine.status_text(), "2/3");
        assert_eq!(log.borrow().count(CHANGING_LAYER), 1);
    }

    #[test]
    fn test_zoom_blocks_navigation() {
        let (mut engine, _) = engine_with_log(100);
        engine.set_zoom_state(ZoomState::ZoomingIn);
        assert_eq!(
            engine.request_inward(1.0),
            RequestOutcome::Blocked(NavigationBlock::Zooming)
        );
    }

    #[test]
    fn test_camera_pitch_clamped_on_fixed_tick() {
        let (mut engine, _) = engine_with_log(39);
        engine.viewer_mut().set_orientation(0.0, 80.0);
        engine.on_fixed_tick(0.02, &FixedInput::default());
        assert_eq!(engine.viewer().pitch(), 50.0);
    }

    #[test]
    fn test_retune_resets_state() {
        let (mut engine, _) = engine_with_log(100);
        engine.request_inward(1.0);
        engine.retune(20).unwrap();
        assert!(!engine.is_transitioning());
        assert_eq!(engine.stack().len(), 1);
        assert_eq!(engine.status_text(), "1/1");
        assert!(engine.retune(0).is_err());
        assert_eq!(engine.stack().item_count(), 20);
    }
}
