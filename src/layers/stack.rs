//! Layer stack
//!
//! Ordered collection of layers in browse order. Layer 0 is the first one
//! shown; each following layer rests at a larger radius. Moving inward
//! collapses the current layer into the centre and advances the active
//! index; moving outward restores the last collapsed layer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::item::{Item, ItemFactory, ItemId};
use super::layer::{Layer, LayerSpec};
use super::tuning::{plan_layers, LayoutTuning};
use crate::error::{MemoriaError, Result};
use crate::spatial::Ray;

/// Initial value of the vertical tilt counter
const TILT_COUNTER_START: i32 = 50;

/// Upper bound of the vertical tilt counter
const TILT_COUNTER_MAX: i32 = 100;

/// Radius/alpha pair a layer rests at for a given depth
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RadiusAlpha {
    pub radius: f32,
    pub alpha: f32,
}

impl RadiusAlpha {
    pub const COLLAPSED: RadiusAlpha = RadiusAlpha {
        radius: 0.0,
        alpha: 0.0,
    };

    pub fn new(radius: f32, alpha: f32) -> Self {
        Self { radius, alpha }
    }
}

/// Result of a pick against the stack
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub item: ItemId,
    /// Layer owning the item
    pub layer: usize,
    pub distance: f32,
}

/// Ordered set of layers plus the navigation state
#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<Layer>,
    center: Vec3,
    active_index: usize,
    /// `targets[0]` is the collapsed state; `targets[k + 1]` is the resting
    /// state of layer `k`
    targets: Vec<RadiusAlpha>,
    transitioning: bool,
    tilt_counter: i32,
}

impl LayerStack {
    /// Build a stack from explicit layer descriptions
    ///
    /// # Errors
    /// `EmptyContent` when `specs` is empty, `InvalidLayerSpec` when a
    /// radius or alpha is not finite.
    pub fn build(specs: Vec<LayerSpec>, center: Vec3, factory: &mut dyn ItemFactory) -> Result<Self> {
        validate_specs(&specs)?;

        let mut next_id = 0;
        let layers: Vec<Layer> = specs
            .into_iter()
            .enumerate()
            .map(|(index, spec)| Layer::build(index, spec, center, &mut next_id, factory))
            .collect();

        let mut targets = Vec::with_capacity(layers.len() + 1);
        targets.push(RadiusAlpha::COLLAPSED);
        targets.extend(
            layers
                .iter()
                .map(|layer| RadiusAlpha::new(layer.radius(), layer.alpha())),
        );

        log::info!(
            "Built layer stack: {} layers, {} items",
            layers.len(),
            next_id
        );

        Ok(Self {
            layers,
            center,
            active_index: 0,
            targets,
            transitioning: false,
            tilt_counter: TILT_COUNTER_START,
        })
    }

    /// Build a stack sized for `count` items of content
    pub fn from_content_count(
        count: usize,
        tuning: &LayoutTuning,
        center: Vec3,
        factory: &mut dyn ItemFactory,
    ) -> Result<Self> {
        Self::build(plan_layers(count, tuning), center, factory)
    }

    /// Destroy every layer and rebuild for a new content count
    ///
    /// On error the current stack is left untouched.
    pub fn retune(&mut self, count: usize, tuning: &LayoutTuning, factory: &mut dyn ItemFactory) -> Result<()> {
        let specs = plan_layers(count, tuning);
        validate_specs(&specs)?;

        for layer in self.layers.drain(..) {
            layer.destroy(factory);
        }
        *self = Self::build(specs, self.center, factory)?;
        Ok(())
    }

    // ========================================================================
    // Layer Access
    // ========================================================================

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer at `index`
    ///
    /// Panics on an out-of-range index: callers only hold indices derived
    /// from this stack.
    pub fn layer(&self, index: usize) -> &Layer {
        assert!(
            index < self.layers.len(),
            "layer index {} out of range ({} layers)",
            index,
            self.layers.len()
        );
        &self.layers[index]
    }

    pub(crate) fn layer_mut(&mut self, index: usize) -> &mut Layer {
        assert!(
            index < self.layers.len(),
            "layer index {} out of range ({} layers)",
            index,
            self.layers.len()
        );
        &mut self.layers[index]
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub(crate) fn set_active_index(&mut self, index: usize) {
        assert!(
            index < self.layers.len(),
            "active index {} out of range ({} layers)",
            index,
            self.layers.len()
        );
        self.active_index = index;
    }

    pub fn active_layer(&self) -> &Layer {
        self.layer(self.active_index)
    }

    /// Resting radius/alpha per depth
    pub fn targets(&self) -> &[RadiusAlpha] {
        &self.targets
    }

    pub fn target(&self, depth: usize) -> RadiusAlpha {
        self.targets[depth]
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub(crate) fn set_transitioning(&mut self, transitioning: bool) {
        self.transitioning = transitioning;
    }

    // ========================================================================
    // Navigation Queries
    // ========================================================================

    /// Indices of the layers not collapsed into the centre, in order
    pub fn active_layer_indices(&self) -> Vec<usize> {
        self.layers
            .iter()
            .filter(|layer| layer.is_active())
            .map(Layer::index)
            .collect()
    }

    /// The most recently collapsed layer, if any
    pub fn last_hidden_layer(&self) -> Option<usize> {
        self.layers
            .iter()
            .filter(|layer| !layer.is_active())
            .map(Layer::index)
            .last()
    }

    /// An inward move is possible (more than one active layer)
    pub fn can_move_inward(&self) -> bool {
        self.active_layer_indices().len() > 1
    }

    /// An outward move is possible (some layer is collapsed)
    pub fn can_move_outward(&self) -> bool {
        self.last_hidden_layer().is_some()
    }

    /// No further inward motion
    pub fn at_innermost(&self) -> bool {
        self.active_index + 1 == self.layers.len()
    }

    /// No further outward motion
    pub fn at_outermost(&self) -> bool {
        self.active_index == 0
    }

    /// Every item on every active layer sits in its slot
    pub fn all_items_pinned(&self) -> bool {
        self.layers
            .iter()
            .filter(|layer| layer.is_active())
            .all(Layer::all_pinned)
    }

    /// Counter text shown to the user, e.g. "2/3"
    pub fn counter_text(&self) -> String {
        format!("{}/{}", self.active_index + 1, self.layers.len())
    }

    // ========================================================================
    // Items
    // ========================================================================

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.layers.iter().flat_map(|layer| layer.items().iter())
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.layers.iter().find_map(|layer| layer.item(id))
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.layers.iter_mut().find_map(|layer| layer.item_mut(id))
    }

    pub fn item_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Nearest item hit by `ray` within `max_distance`
    ///
    /// Items are picked as spheres spanning their planar scale. Hidden
    /// layers are never hit.
    pub fn raycast(&self, ray: &Ray, max_distance: f32) -> Option<RayHit> {
        self.layers
            .iter()
            .filter(|layer| layer.is_visible())
            .flat_map(|layer| layer.items().iter())
            .filter_map(|item| {
                let t = item.transform();
                let pick_radius = 0.5 * t.scale.x.max(t.scale.y);
                ray.intersect_sphere(t.position, pick_radius)
                    .filter(|&distance| distance <= max_distance)
                    .map(|distance| RayHit {
                        item: item.id(),
                        layer: item.layer_index(),
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    // ========================================================================
    // Active Layer Orientation
    // ========================================================================

    /// Spin the active layer around its vertical axis
    pub fn rotate_active_horizontal(&mut self, axis: f32, speed: f32) {
        let index = self.active_index;
        self.layer_mut(index).rotate_local_down(speed * axis);
    }

    /// Tilt the active layer around the world right axis
    ///
    /// Full-strength moves stop once the tilt counter reaches its bounds.
    /// Returns false when the move was refused.
    pub fn rotate_active_vertical(&mut self, axis: f32, speed: f32) -> bool {
        if axis == 1.0 && self.tilt_counter >= TILT_COUNTER_MAX {
            self.tilt_counter = TILT_COUNTER_MAX;
            return false;
        }
        if axis == -1.0 && self.tilt_counter <= 0 {
            self.tilt_counter = 0;
            return false;
        }

        let index = self.active_index;
        self.layer_mut(index).rotate_world_right(speed * axis);
        // Partial axis values leave the counter unchanged
        self.tilt_counter += axis.trunc() as i32;
        true
    }

    pub fn tilt_counter(&self) -> i32 {
        self.tilt_counter
    }
}

fn validate_specs(specs: &[LayerSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(MemoriaError::EmptyContent);
    }
    if let Some((index, _)) = specs
        .iter()
        .enumerate()
        .find(|(_, spec)| !spec.radius.is_finite() || !spec.alpha.is_finite())
    {
        return Err(MemoriaError::InvalidLayerSpec {
            reason: format!("layer {} has a non-finite radius or alpha", index),
        });
    }
    Ok(())
}
