//! Layer Transition State Machine
//!
//! Moves the stack one layer inward or outward by animating the radius and
//! alpha of every affected layer toward its next resting state. A transition
//! is a resumable object advanced once per fixed tick; at most one runs at a
//! time.
//!
//! Inward: every active layer steps toward the resting state one depth
//! closer to the centre. The current layer collapses to `targets[0]` and
//! fades out, the others grow more opaque.
//!
//! Outward: the last collapsed layer is revealed and every listed layer
//! steps toward the resting state one depth further out. Alpha only starts
//! changing once `alpha_wait_time` seconds of ticks have passed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::affordances::{Affordances, NavigationBounds};
use crate::config::NavigationConfig;
use crate::events::{EventSink, CHANGING_LAYER};
use crate::layers::{LayerStack, RadiusAlpha};

/// Direction of a layer move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Collapse the current layer, advance to the next one
    Inward,
    /// Restore the last collapsed layer
    Outward,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Inward => write!(f, "Inward"),
            TransitionKind::Outward => write!(f, "Outward"),
        }
    }
}

/// Result of advancing a transition by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    InProgress,
    Done,
}

/// Why a navigation request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationBlock {
    /// An item holds the grab focus
    FocusHeld,
    /// A zoom animation is in flight
    Zooming,
    /// Some item on an active layer is out of its slot
    ItemPulledOut,
}

impl fmt::Display for NavigationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationBlock::FocusHeld => write!(f, "an item holds the grab focus"),
            NavigationBlock::Zooming => write!(f, "a zoom is in flight"),
            NavigationBlock::ItemPulledOut => write!(f, "an item is out of its slot"),
        }
    }
}

/// What happened to a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A transition started animating
    Started(TransitionKind),
    /// Another transition is running; nothing happened
    Busy,
    /// The axis value was not a full-strength press
    NotRequested,
    Blocked(NavigationBlock),
    /// No layer to move to in that direction
    AtBoundary,
}

impl RequestOutcome {
    pub fn started(&self) -> bool {
        matches!(self, RequestOutcome::Started(_))
    }
}

/// True when `value` has reached `target` moving with `step`
///
/// The step sign decides the comparison, so a value that overshot counts as
/// reached. A zero step is reached only on exact equality.
pub fn target_reached(step: f32, value: f32, target: f32) -> bool {
    if step > 0.0 {
        value >= target
    } else if step < 0.0 {
        value <= target
    } else {
        value == target
    }
}

/// One animated scalar (radius or alpha) of one layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub target: f32,
    /// Signed per-tick change, fixed when the transition starts
    pub step: f32,
    pub reached: bool,
}

impl Channel {
    fn new(target: f32, step: f32) -> Self {
        Self {
            target,
            step,
            reached: false,
        }
    }

    /// Next value after one step, snapped to the target once reached
    fn advance(&mut self, value: f32) -> f32 {
        if self.reached {
            return self.target;
        }
        let next = value + self.step;
        // A step below the precision of `value` would never move it
        let stalled = self.step != 0.0 && next == value;
        if stalled || target_reached(self.step, next, self.target) {
            self.reached = true;
            self.target
        } else {
            next
        }
    }
}

/// Animation state of one layer inside a transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerProgress {
    pub layer: usize,
    pub radius: Channel,
    pub alpha: Channel,
}

impl LayerProgress {
    pub fn is_done(&self) -> bool {
        self.radius.reached && self.alpha.reached
    }
}

/// A running layer move
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    kind: TransitionKind,
    progress: Vec<LayerProgress>,
    /// Seconds of motion before alpha is allowed to change
    alpha_wait: f32,
    elapsed: f32,
    ticks: u32,
}

impl Transition {
    /// Plan an inward move, or `None` when only one layer is active
    pub fn inward(stack: &LayerStack, navigation: &NavigationConfig) -> Option<Self> {
        let active = stack.active_layer_indices();
        if active.len() <= 1 {
            return None;
        }

        let radius_step = navigation.radius_step();
        let alpha_step = navigation.alpha_step();
        let progress = active
            .iter()
            .enumerate()
            .map(|(depth, &layer)| {
                let target = stack.target(depth);
                let alpha_sign = if depth == 0 { -1.0 } else { 1.0 };
                LayerProgress {
                    layer,
                    radius: Channel::new(target.radius, -radius_step),
                    alpha: Channel::new(target.alpha, alpha_sign * alpha_step),
                }
            })
            .collect();

        Some(Self {
            kind: TransitionKind::Inward,
            progress,
            alpha_wait: 0.0,
            elapsed: 0.0,
            ticks: 0,
        })
    }

    /// Plan an outward move, or `None` when no layer is collapsed
    pub fn outward(stack: &LayerStack, navigation: &NavigationConfig) -> Option<Self> {
        let hidden = stack.last_hidden_layer()?;
        let mut layers = vec![hidden];
        layers.extend(stack.active_layer_indices());

        let radius_step = navigation.radius_step();
        let alpha_step = navigation.alpha_step();
        let progress = layers
            .iter()
            .enumerate()
            .map(|(depth, &layer)| {
                let target: RadiusAlpha = stack.target(depth + 1);
                let alpha_sign = if depth == 0 { 1.0 } else { -1.0 };
                LayerProgress {
                    layer,
                    radius: Channel::new(target.radius, radius_step),
                    alpha: Channel::new(target.alpha, alpha_sign * alpha_step),
                }
            })
            .collect();

        Some(Self {
            kind: TransitionKind::Outward,
            progress,
            alpha_wait: navigation.alpha_wait_time,
            elapsed: 0.0,
            ticks: 0,
        })
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn progress(&self) -> &[LayerProgress] {
        &self.progress
    }

    /// Seconds of ticks applied so far
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Advance every listed layer by one tick of `dt` seconds
    pub fn step(&mut self, stack: &mut LayerStack, dt: f32) -> StepStatus {
        let alpha_open = self.elapsed >= self.alpha_wait;
        let center = stack.center();

        for progress in &mut self.progress {
            let layer = stack.layer_mut(progress.layer);
            let radius = progress.radius.advance(layer.radius());
            let alpha = if alpha_open {
                progress.alpha.advance(layer.alpha())
            } else {
                layer.alpha()
            };
            layer.change_visualization_configuration(center, radius, alpha);
        }

        self.elapsed += dt.max(0.0);
        self.ticks += 1;

        if self.progress.iter().all(LayerProgress::is_done) {
            StepStatus::Done
        } else {
            StepStatus::InProgress
        }
    }
}

/// Owns the running transition and applies its start and completion effects
#[derive(Debug, Clone, Default)]
pub struct TransitionScheduler {
    current: Option<Transition>,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Transition> {
        self.current.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Try to start a layer move
    ///
    /// A request while a transition runs is dropped without any callback.
    /// Every other refusal still reports `on_transition_end` so the host can
    /// re-enable its controls.
    #[allow(clippy::too_many_arguments)]
    pub fn request(
        &mut self,
        kind: TransitionKind,
        strength: f32,
        block: Option<NavigationBlock>,
        stack: &mut LayerStack,
        navigation: &NavigationConfig,
        affordances: &mut dyn Affordances,
        events: &mut dyn EventSink,
    ) -> RequestOutcome {
        if self.current.is_some() || stack.is_transitioning() {
            log::debug!("{} request ignored: transition already running", kind);
            return RequestOutcome::Busy;
        }

        if strength != 1.0 {
            affordances.on_transition_end(NavigationBounds::of(stack));
            return RequestOutcome::NotRequested;
        }

        if let Some(reason) = block {
            log::debug!("{} request refused: {}", kind, reason);
            affordances.on_transition_end(NavigationBounds::of(stack));
            return RequestOutcome::Blocked(reason);
        }

        let planned = match kind {
            TransitionKind::Inward => Transition::inward(stack, navigation),
            TransitionKind::Outward => Transition::outward(stack, navigation),
        };
        let transition = match planned {
            Some(transition) => transition,
            None => {
                log::debug!("{} request refused: no layer in that direction", kind);
                affordances.on_transition_end(NavigationBounds::of(stack));
                return RequestOutcome::AtBoundary;
            }
        };

        stack.set_transitioning(true);

        // 1-based index of the layer being entered
        let entering = match kind {
            TransitionKind::Inward => stack.active_index() + 2,
            TransitionKind::Outward => {
                if let Some(revealed) = transition.progress.first() {
                    stack.layer_mut(revealed.layer).set_visible(true);
                }
                stack.active_index()
            }
        };
        events.log_event(CHANGING_LAYER, &entering.to_string());
        affordances.on_transition_start();

        log::debug!(
            "{} transition started from layer {} over {} layers",
            kind,
            stack.active_index(),
            transition.progress.len()
        );

        self.current = Some(transition);
        RequestOutcome::Started(kind)
    }

    /// Advance the running transition by one fixed tick
    ///
    /// Returns the kind of the transition that completed on this tick.
    pub fn tick(
        &mut self,
        stack: &mut LayerStack,
        dt: f32,
        affordances: &mut dyn Affordances,
    ) -> Option<TransitionKind> {
        let status = self.current.as_mut()?.step(stack, dt);
        if status == StepStatus::InProgress {
            return None;
        }

        let transition = self.current.take()?;
        let kind = transition.kind;
        let active = stack.active_index();
        match kind {
            TransitionKind::Inward => {
                let collapsed = stack.layer_mut(active);
                collapsed.set_active(false);
                collapsed.set_visible(false);
                stack.set_active_index(active + 1);
            }
            TransitionKind::Outward => {
                let restored = active - 1;
                stack.layer_mut(restored).set_active(true);
                stack.set_active_index(restored);
            }
        }
        stack.set_transitioning(false);

        log::info!(
            "{} transition done after {} ticks, now at layer {}",
            kind,
            transition.ticks,
            stack.counter_text()
        );

        affordances.on_transition_end(NavigationBounds::of(stack));
        Some(kind)
    }
}
