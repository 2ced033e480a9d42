//! Navigation Tests
//!
//! End-to-end layer transitions driven through the engine's fixed tick.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_abs_diff_eq;
use memoria::engine::{
    Affordances, FixedInput, NavigationBounds, NavigationRequest, NoAffordances, RequestOutcome, TransitionKind,
};
use memoria::events::CHANGING_LAYER;
use memoria::layers::NullItemFactory;
use memoria::{Engine, EngineConfig, MemoryEventLog, PinchRig};

const DT: f32 = 0.02;

#[derive(Default)]
struct CallbackCounter {
    starts: usize,
    ends: usize,
}

impl Affordances for CallbackCounter {
    fn on_transition_start(&mut self) {
        self.starts += 1;
    }

    fn on_transition_end(&mut self, _bounds: NavigationBounds) {
        self.ends += 1;
    }
}

fn build(
    config: EngineConfig,
    count: usize,
) -> (Engine, Rc<RefCell<CallbackCounter>>, Rc<RefCell<MemoryEventLog>>) {
    let counter = Rc::new(RefCell::new(CallbackCounter::default()));
    let log = Rc::new(RefCell::new(MemoryEventLog::new()));
    let engine = Engine::new(
        config,
        count,
        PinchRig::default(),
        Box::new(NullItemFactory),
        Box::new(counter.clone()),
        Box::new(log.clone()),
    )
    .expect("engine builds");
    (engine, counter, log)
}

fn settle(engine: &mut Engine) -> u32 {
    let mut ticks = 0;
    while engine.is_transitioning() {
        engine.on_fixed_tick(DT, &FixedInput::default());
        ticks += 1;
        assert!(ticks < 10_000, "transition did not converge");
    }
    ticks
}

fn request(engine: &mut Engine, request: NavigationRequest) -> RequestOutcome {
    let report = engine.on_fixed_tick(
        DT,
        &FixedInput {
            grab: None,
            navigation: vec![request],
        },
    );
    report.requests[0]
}

// === Inward ===

#[test]
fn test_inward_from_three_layers() {
    let (mut engine, counter, log) = build(EngineConfig::default(), 100);

    let outcome = request(&mut engine, NavigationRequest::Inward(1.0));
    assert_eq!(outcome, RequestOutcome::Started(TransitionKind::Inward));
    settle(&mut engine);

    let stack = engine.stack();
    assert_eq!(stack.active_index(), 1);
    let collapsed = stack.layer(0);
    assert!(!collapsed.is_active());
    assert!(!collapsed.is_visible());
    assert_eq!(collapsed.alpha(), stack.target(0).alpha);
    assert!(collapsed.items().iter().all(|item| item.alpha() == 0.0));

    assert_eq!(counter.borrow().starts, 1);
    assert_eq!(counter.borrow().ends, 1);
    assert_eq!(log.borrow().details(CHANGING_LAYER), vec!["2"]);
}

#[test]
fn test_inward_until_innermost() {
    let (mut engine, counter, _) = build(EngineConfig::default(), 100);

    for _ in 0..2 {
        assert!(request(&mut engine, NavigationRequest::Inward(1.0)).started());
        settle(&mut engine);
    }
    assert_eq!(engine.stack().active_index(), 2);
    assert!(engine.stack().at_innermost());

    let outcome = request(&mut engine, NavigationRequest::Inward(1.0));
    assert_eq!(outcome, RequestOutcome::AtBoundary);
    assert_eq!(engine.stack().active_index(), 2);
    // Two completed moves plus the refused one
    assert_eq!(counter.borrow().ends, 3);
    assert_eq!(counter.borrow().starts, 2);
}

#[test]
fn test_layers_converge_without_overshoot() {
    let mut config = EngineConfig::default();
    config.navigation.radius_speed = 0.033;
    config.navigation.alpha_speed = 0.07;
    let (mut engine, _, _) = build(config, 100);

    request(&mut engine, NavigationRequest::Inward(1.0));
    while engine.is_transitioning() {
        engine.on_fixed_tick(DT, &FixedInput::default());
        let stack = engine.stack();
        assert!(stack.layer(1).radius() >= 0.45 - 1e-6);
        assert!(stack.layer(1).alpha() <= 0.7 + 1e-6);
        assert!(stack.layer(2).alpha() <= 0.4 + 1e-6);
    }

    let stack = engine.stack();
    assert_abs_diff_eq!(stack.layer(1).radius(), 0.45, epsilon = 1e-6);
    assert_abs_diff_eq!(stack.layer(2).radius(), 0.60, epsilon = 1e-6);
    assert_abs_diff_eq!(stack.layer(2).alpha(), 0.4, epsilon = 1e-6);
}

// === Outward ===

#[test]
fn test_outward_holds_alpha_until_wait_time() {
    let mut config = EngineConfig::default();
    config.navigation.alpha_wait_time = 0.2;
    let (mut engine, _, _) = build(config, 100);

    request(&mut engine, NavigationRequest::Inward(1.0));
    settle(&mut engine);

    request(&mut engine, NavigationRequest::Outward(1.0));
    assert!(engine.stack().layer(0).is_visible());

    // The request tick plus eight more stay within 0.2 s of elapsed time
    for _ in 0..8 {
        assert_eq!(engine.stack().layer(0).alpha(), 0.0);
        assert_abs_diff_eq!(engine.stack().layer(1).alpha(), 0.7, epsilon = 1e-6);
        engine.on_fixed_tick(DT, &FixedInput::default());
    }
    assert!(engine.stack().layer(0).radius() > 0.0);

    settle(&mut engine);
    let stack = engine.stack();
    assert_eq!(stack.active_index(), 0);
    assert_abs_diff_eq!(stack.layer(0).alpha(), 0.7, epsilon = 1e-6);
    assert_abs_diff_eq!(stack.layer(1).alpha(), 0.4, epsilon = 1e-6);
}

#[test]
fn test_outward_at_first_layer_refused() {
    let (mut engine, counter, log) = build(EngineConfig::default(), 100);
    let outcome = request(&mut engine, NavigationRequest::Outward(1.0));
    assert_eq!(outcome, RequestOutcome::AtBoundary);
    assert_eq!(counter.borrow().starts, 0);
    assert_eq!(counter.borrow().ends, 1);
    assert_eq!(log.borrow().count(CHANGING_LAYER), 0);
}

// === Request Gating ===

#[test]
fn test_second_request_while_transitioning_is_dropped() {
    let (mut engine, counter, log) = build(EngineConfig::default(), 100);

    request(&mut engine, NavigationRequest::Inward(1.0));
    let second = request(&mut engine, NavigationRequest::Outward(1.0));
    assert_eq!(second, RequestOutcome::Busy);
    assert_eq!(counter.borrow().ends, 0);

    settle(&mut engine);
    assert_eq!(engine.stack().active_index(), 1);
    assert_eq!(log.borrow().count(CHANGING_LAYER), 1);
    assert_eq!(counter.borrow().ends, 1);
}

#[test]
fn test_partial_axis_value_does_not_animate() {
    let (mut engine, counter, _) = build(EngineConfig::default(), 100);
    let outcome = engine.request_inward(0.6);
    assert_eq!(outcome, RequestOutcome::NotRequested);
    assert!(!engine.is_transitioning());
    assert_eq!(counter.borrow().ends, 1);
}

#[test]
fn test_single_layer_cannot_move() {
    let (mut engine, _, _) = build(EngineConfig::default(), 10);
    assert_eq!(engine.request_inward(1.0), RequestOutcome::AtBoundary);
    assert_eq!(engine.request_outward(1.0), RequestOutcome::AtBoundary);
}

#[test]
fn test_zero_speeds_still_converge() {
    let mut config = EngineConfig::default();
    config.navigation.radius_speed = 0.0;
    config.navigation.alpha_speed = 0.0;
    config.navigation.radius_factor = 0.0;
    let (mut engine, _, _) = build(config, 78);

    let outcome = engine.request_inward(1.0);
    assert!(outcome.started());
    let mut ticks = 0u32;
    while engine.is_transitioning() {
        engine.on_fixed_tick(DT, &FixedInput::default());
        ticks += 1;
        assert!(ticks < 20_000, "minimum step did not converge");
    }
    assert_eq!(engine.stack().active_index(), 1);
}

#[test]
fn test_large_radius_with_minimum_step_converges() {
    let mut config = EngineConfig::default();
    config.layout.base_radius = 3000.0;
    config.navigation.radius_speed = 0.0;
    let (mut engine, counter, _) = build(config, 78);

    assert!(engine.request_inward(1.0).started());
    settle(&mut engine);

    let stack = engine.stack();
    assert_eq!(stack.active_index(), 1);
    assert_eq!(stack.layer(0).radius(), 0.0);
    assert_eq!(stack.layer(1).radius(), stack.target(1).radius);
    assert_eq!(counter.borrow().ends, 1);
}

#[test]
fn test_headless_affordances() {
    let mut engine = Engine::new(
        EngineConfig::default(),
        50,
        PinchRig::default(),
        Box::new(NullItemFactory),
        Box::new(NoAffordances),
        Box::new(MemoryEventLog::new()),
    )
    .unwrap();
    assert!(engine.request_inward(1.0).started());
    settle(&mut engine);
    assert_eq!(engine.stack().counter_text(), "2/2");
}
