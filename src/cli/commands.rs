//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use glam::Quat;
use log::info;

use crate::config::EngineConfig;
use crate::engine::{
    ButtonPanel, Engine, FixedInput, FrameInput, GrabInput, NavigationRequest, PinchRig, PinchSource,
};
use crate::error::{MemoriaError, Result};
use crate::events::{CsvEventLog, EventSink, MemoryEventLog};
use crate::layers::{plan_layers, NullItemFactory};

/// Upper bound on fixed ticks spent waiting for one transition
const MAX_SETTLE_TICKS: u32 = 100_000;

/// Distance in front of the viewer where the simulated hand pinches
const HAND_REACH: f32 = 0.3;

/// One step of a simulation script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStep {
    Inward,
    Outward,
    Grab,
    Release,
    Accept,
}

impl FromStr for ScriptStep {
    type Err = MemoriaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inward" => Ok(ScriptStep::Inward),
            "out" | "outward" => Ok(ScriptStep::Outward),
            "grab" => Ok(ScriptStep::Grab),
            "release" => Ok(ScriptStep::Release),
            "accept" => Ok(ScriptStep::Accept),
            _ => Err(MemoriaError::InvalidScript {
                step: s.trim().to_string(),
            }),
        }
    }
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Inward => write!(f, "in"),
            ScriptStep::Outward => write!(f, "out"),
            ScriptStep::Grab => write!(f, "grab"),
            ScriptStep::Release => write!(f, "release"),
            ScriptStep::Accept => write!(f, "accept"),
        }
    }
}

/// Parse a comma-separated script such as `in,grab,release,out`
pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>> {
    script
        .split(',')
        .filter(|step| !step.trim().is_empty())
        .map(ScriptStep::from_str)
        .collect()
}

/// Read the engine configuration, or use the defaults when no path is given
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path,
        None => return Ok(EngineConfig::default()),
    };

    info!("Loading configuration: {}", path.display());
    let text = fs::read_to_string(path).map_err(|source| MemoriaError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Headless engine plus the observers a simulation reports from
pub struct Simulation {
    engine: Engine,
    panel: Rc<RefCell<ButtonPanel>>,
    log: Rc<RefCell<MemoryEventLog>>,
    dt: f32,
}

impl Simulation {
    pub fn new(config: EngineConfig, count: usize, dt: f32, csv: Option<&Path>) -> Result<Self> {
        let panel = Rc::new(RefCell::new(ButtonPanel::new(config.mouse_input())));
        let log = Rc::new(RefCell::new(MemoryEventLog::new()));

        let mut sinks: Vec<Box<dyn EventSink>> = vec![Box::new(log.clone())];
        if let Some(path) = csv {
            sinks.push(Box::new(CsvEventLog::create(path)?));
        }

        let engine = Engine::new(
            config,
            count,
            PinchRig::default(),
            Box::new(NullItemFactory),
            Box::new(panel.clone()),
            Box::new(sinks),
        )?;

        Ok(Self {
            engine,
            panel,
            log,
            dt: dt.max(f32::EPSILON),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn panel(&self) -> ButtonPanel {
        self.panel.borrow().clone()
    }

    pub fn log(&self) -> MemoryEventLog {
        self.log.borrow().clone()
    }

    /// Run one script step to completion and describe what happened
    pub fn run_step(&mut self, step: ScriptStep) -> String {
        match step {
            ScriptStep::Inward => self.navigate(step, NavigationRequest::Inward(1.0)),
            ScriptStep::Outward => self.navigate(step, NavigationRequest::Outward(1.0)),
            ScriptStep::Grab => self.grab(),
            ScriptStep::Release => self.release(),
            ScriptStep::Accept => self.accept(),
        }
    }

    fn navigate(&mut self, step: ScriptStep, request: NavigationRequest) -> String {
        self.engine.on_frame_tick(&FrameInput::default());
        let report = self.engine.on_fixed_tick(
            self.dt,
            &FixedInput {
                grab: None,
                navigation: vec![request],
            },
        );

        let mut ticks = 1;
        while self.engine.is_transitioning() && ticks < MAX_SETTLE_TICKS {
            self.engine
                .run_cycle(self.dt, &FrameInput::default(), &FixedInput::default());
            ticks += 1;
        }
        self.engine.on_frame_tick(&FrameInput::default());

        let outcome = report
            .requests
            .first()
            .map(|outcome| format!("{:?}", outcome))
            .unwrap_or_else(|| "NoRequest".to_string());
        format!(
            "{}: {} after {} ticks -> {}",
            step,
            outcome,
            ticks,
            self.engine.status_text()
        )
    }

    fn hand_input(&self, reach: f32) -> FixedInput {
        let viewer = self.engine.viewer();
        let position = viewer.position + viewer.forward() * reach;
        FixedInput {
            grab: Some(GrabInput {
                left: PinchSource::pinching(position, Quat::IDENTITY),
                right: PinchSource::idle(),
                in_contact: true,
            }),
            navigation: Vec::new(),
        }
    }

    fn grab(&mut self) -> String {
        self.engine.on_frame_tick(&FrameInput::default());
        let reach = self.hand_input(HAND_REACH);
        let first = self.engine.on_fixed_tick(self.dt, &reach);
        let pull = self.hand_input(HAND_REACH * 0.8);
        self.engine.on_fixed_tick(self.dt, &pull);

        match (first.grab, self.engine.pointer().focused) {
            (Some(outcome), Some(item)) if outcome.pulled_out => format!("grab: pulled out {}", item),
            (Some(_), Some(item)) => format!("grab: moved {}", item),
            _ => "grab: nothing to grab".to_string(),
        }
    }

    fn release(&mut self) -> String {
        let released = FixedInput {
            grab: Some(GrabInput {
                in_contact: true,
                ..GrabInput::default()
            }),
            navigation: Vec::new(),
        };
        self.engine.on_fixed_tick(self.dt, &released);

        match self.engine.return_focused_item() {
            Some(item) => format!("release: returned {}", item),
            None => "release: nothing focused".to_string(),
        }
    }

    fn accept(&mut self) -> String {
        self.engine.on_frame_tick(&FrameInput::default());
        let target = self.engine.pointer().focused.or(self.engine.pointer().detected);
        match (target, self.engine.accept()) {
            (Some(item), Some(true)) => format!("accept: marked {}", item),
            (Some(item), Some(false)) => format!("accept: unmarked {}", item),
            _ => "accept: nothing targeted".to_string(),
        }
    }
}

/// Print the planned layers for `count` items as JSON
pub fn layout(count: usize, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?.clamped();
    let plan = plan_layers(count, &config.layout);
    if plan.is_empty() {
        return Err(MemoriaError::EmptyContent);
    }

    info!("Planned {} layers for {} items", plan.len(), count);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Run a navigation script and print one line per step
pub fn simulate(
    count: usize,
    script: &str,
    dt: f32,
    events: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let steps = parse_script(script)?;
    let config = load_config(config_path)?;
    let mut simulation = Simulation::new(config, count, dt, events)?;

    println!("start: {}", simulation.engine().status_text());
    for step in steps {
        println!("{}", simulation.run_step(step));
    }

    let log = simulation.log();
    let panel = simulation.panel();
    println!("events logged: {}", log.records().len());
    println!(
        "panel: inside={} outside={} accept={} ({}) zoom_out={}",
        panel.move_inside, panel.move_outside, panel.accept, panel.accept_label, panel.zoom_out
    );
    if let Some(path) = events {
        println!("event log written to {}", path.display());
    }
    Ok(())
}

/// Print the clamped configuration as JSON
pub fn check_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let clamped = config.clone().clamped();
    if clamped != config {
        info!("Configuration adjusted while clamping");
    }
    println!("{}", serde_json::to_string_pretty(&clamped)?);
    Ok(())
}
