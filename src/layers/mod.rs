//! Layer Model Module
//!
//! The data side of the browser:
//! - Items: selectable objects with a slot, selection and pinned flags
//! - Layers: concentric shells of items arranged in up to three rows
//! - LayerStack: the ordered layers plus the navigation state
//! - Tuning: derives the layer set from a content count

mod item;
mod layer;
mod stack;
mod tuning;

pub use item::{Anchor, Item, ItemFactory, ItemId, ItemSlot, ItemVisual, NullItemFactory, NullVisual};
pub use layer::{auto_angle_spacing, distribute_rows, Layer, LayerSpec, MAX_ROWS};
pub use stack::{LayerStack, RadiusAlpha, RayHit};
pub use tuning::{layer_sizes, plan_layers, LayoutTuning, DEFAULT_ITEMS_PER_LAYER, DEFAULT_ITEMS_PER_ROW};
