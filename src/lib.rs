//! Memoria - Layered Spherical Browser Engine
//!
//! Memoria arranges content items on nested concentric spherical layers.
//! The user moves inward and outward through the layers, points at items
//! with gaze or mouse, and pulls items out of their layer with one- or
//! two-handed pinch grabs.
//!
//! # Architecture
//!
//! - `layers`: the data model (items, layers, the layer stack, layout tuning)
//! - `engine`: the interaction state machines, driven by host ticks
//! - `config`: the configuration value handed to the engine
//! - `events`: fire-and-forget event logging
//! - `spatial`: transforms and rays
//!
//! The engine performs no I/O and never blocks; a host calls
//! [`Engine::on_frame_tick`] and [`Engine::on_fixed_tick`] and renders the
//! state it reads back.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod layers;
pub mod spatial;

pub use config::EngineConfig;
pub use engine::{Affordances, ButtonPanel, Engine, FixedInput, FrameInput, NavigationRequest, PinchRig};
pub use error::{MemoriaError, Result};
pub use events::{CsvEventLog, EventSink, MemoryEventLog};
pub use layers::{Item, ItemFactory, ItemId, Layer, LayerStack, LayoutTuning};
