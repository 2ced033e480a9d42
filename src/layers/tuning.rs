//! Automatic layout tuning
//!
//! Derives the layer set from the amount of content available: full layers
//! of a fixed capacity plus one partial layer for the remainder. Inner
//! layers are smaller and more opaque; each step outward grows the radius
//! and fades the alpha.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::layer::{LayerSpec, MAX_ROWS};

/// Default number of items on a full layer
pub const DEFAULT_ITEMS_PER_LAYER: usize = 39;

/// Default number of items on a full row
pub const DEFAULT_ITEMS_PER_ROW: usize = 13;

/// Parameters for deriving layers from a content count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    pub items_per_layer: usize,
    pub items_per_row: usize,
    /// Radius of the first layer
    pub base_radius: f32,
    /// Radius added per layer
    pub radius_increment: f32,
    /// Alpha of the first layer
    pub base_alpha: f32,
    /// Alpha removed per layer (floored at 0)
    pub alpha_decrement: f32,
    pub row_height: f32,
    pub row_radius_delta: f32,
    pub item_scale: Vec3,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            items_per_layer: DEFAULT_ITEMS_PER_LAYER,
            items_per_row: DEFAULT_ITEMS_PER_ROW,
            base_radius: 0.45,
            radius_increment: 0.15,
            base_alpha: 0.7,
            alpha_decrement: 0.3,
            row_height: 0.2,
            row_radius_delta: 0.05,
            item_scale: Vec3::new(0.2, 0.2, 0.001),
        }
    }
}

impl LayoutTuning {
    /// Bring every field into its legal range
    pub fn clamped(mut self) -> Self {
        self.items_per_layer = self.items_per_layer.max(1);
        self.items_per_row = self.items_per_row.max(1);
        self.base_radius = self.base_radius.max(0.0);
        self.base_alpha = self.base_alpha.clamp(0.0, 1.0);
        self.row_height = self.row_height.max(0.0);
        self.row_radius_delta = self.row_radius_delta.max(0.0);
        self.item_scale = self.item_scale.max(Vec3::ZERO);
        self
    }

    /// Resting radius of the layer at `index`
    pub fn radius_for(&self, index: usize) -> f32 {
        (self.base_radius + self.radius_increment * index as f32).max(0.0)
    }

    /// Resting alpha of the layer at `index`
    pub fn alpha_for(&self, index: usize) -> f32 {
        (self.base_alpha - self.alpha_decrement * index as f32).clamp(0.0, 1.0)
    }

    /// Rows needed for `elements` items, clamped to 1..=3
    pub fn rows_for(&self, elements: usize) -> usize {
        let per_row = self.items_per_row.max(1);
        let rows = elements / per_row + usize::from(elements % per_row != 0);
        rows.clamp(1, MAX_ROWS)
    }
}

/// Number of items on each layer for `count` items of content
///
/// `count / per_layer` full layers, plus one partial layer when there is a
/// remainder. Zero content yields no layers.
pub fn layer_sizes(count: usize, per_layer: usize) -> Vec<usize> {
    let per_layer = per_layer.max(1);
    let full = count / per_layer;
    let extra = count % per_layer;

    let mut sizes = vec![per_layer; full];
    if extra != 0 {
        sizes.push(extra);
    }
    sizes
}

/// Layer descriptions for `count` items of content
pub fn plan_layers(count: usize, tuning: &LayoutTuning) -> Vec<LayerSpec> {
    layer_sizes(count, tuning.items_per_layer)
        .into_iter()
        .enumerate()
        .map(|(index, elements)| LayerSpec {
            element_count: elements,
            row_count: tuning.rows_for(elements),
            radius: tuning.radius_for(index),
            alpha: tuning.alpha_for(index),
            row_height: tuning.row_height,
            row_radius_delta: tuning.row_radius_delta,
            item_scale: tuning.item_scale,
            angle_spacing: None,
        })
        .collect()
}
