//! Items - the selectable objects placed on a layer
//!
//! An item owns its world pose, its selection and pinned flags, and the
//! transient anchor that exists while it is being grabbed. Rendering is
//! delegated to an [`ItemVisual`] capability handed over by the
//! [`ItemFactory`] when the item is created.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spatial::Transform;

/// Stable identifier of an item, unique across the whole layer stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Where an item sits in the layout when it is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSlot {
    pub id: ItemId,
    /// Index of the owning layer in the stack
    pub layer: usize,
    pub row: usize,
    /// Position within the row (0 = angle 0)
    pub angular_index: usize,
}

/// Render-side capability of an item
///
/// The engine pushes transparency and pose changes through this trait; it
/// never reads anything back.
pub trait ItemVisual: fmt::Debug {
    /// Write the render transparency (already clamped to [0, 1])
    fn set_alpha(&mut self, alpha: f32);

    /// Write the world pose
    fn set_transform(&mut self, _transform: &Transform) {}
}

/// Creates and destroys the render side of items
///
/// Only called while layers are (re)built.
pub trait ItemFactory {
    fn create_item(&mut self, slot: &ItemSlot) -> Box<dyn ItemVisual>;

    fn destroy_item(&mut self, _id: ItemId, _visual: Box<dyn ItemVisual>) {}
}

/// Visual that discards every update (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisual;

impl ItemVisual for NullVisual {
    fn set_alpha(&mut self, _alpha: f32) {}
}

/// Factory producing [`NullVisual`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct NullItemFactory;

impl ItemFactory for NullItemFactory {
    fn create_item(&mut self, _slot: &ItemSlot) -> Box<dyn ItemVisual> {
        Box::new(NullVisual)
    }
}

/// Transient parent transform used while an item is grabbed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    /// World pose of the anchor
    pub transform: Transform,
    /// Pose of the item relative to the anchor
    pub(crate) offset: Transform,
    /// The last rebase hit a degenerate pose and `offset` is stale
    pending_rebase: bool,
}

impl Anchor {
    /// Anchor placed exactly on `item_pose`, so attaching does not move the item
    pub fn at(item_pose: Transform) -> Self {
        Self {
            transform: item_pose,
            offset: Transform::IDENTITY,
            pending_rebase: false,
        }
    }

    /// Pose of the item relative to this anchor
    pub fn offset(&self) -> &Transform {
        &self.offset
    }

    /// True while the anchor waits for a non-degenerate pose to rebase on
    pub fn is_rebase_pending(&self) -> bool {
        self.pending_rebase
    }
}

/// A selectable object on a layer
#[derive(Debug)]
pub struct Item {
    slot: ItemSlot,
    label: String,
    /// Current world pose
    transform: Transform,
    /// Pose assigned by the layer layout
    slot_transform: Transform,
    alpha: f32,
    selected: bool,
    pinned: bool,
    anchor: Option<Anchor>,
    visual: Box<dyn ItemVisual>,
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.slot.id == other.slot.id
    }
}

impl Eq for Item {}

impl Item {
    pub(crate) fn new(slot: ItemSlot, visual: Box<dyn ItemVisual>) -> Self {
        Self {
            slot,
            label: format!("layer-{}/{}", slot.layer, slot.id),
            transform: Transform::IDENTITY,
            slot_transform: Transform::IDENTITY,
            alpha: 1.0,
            selected: false,
            pinned: true,
            anchor: None,
            visual,
        }
    }

    pub fn id(&self) -> ItemId {
        self.slot.id
    }

    pub fn slot(&self) -> &ItemSlot {
        &self.slot
    }

    /// Index of the owning layer
    pub fn layer_index(&self) -> usize {
        self.slot.layer
    }

    /// Human-readable identifier used in event logs (e.g. image name)
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Pose the layer layout assigns to this item
    pub fn slot_transform(&self) -> &Transform {
        &self.slot_transform
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Flip the selection flag, returning the new state
    pub fn toggle_selected(&mut self) -> bool {
        self.selected = !self.selected;
        self.selected
    }

    /// True while the item occupies its layer slot
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    // ========================================================================
    // Layout
    // ========================================================================

    /// Assign a new layout pose; a pinned item moves there immediately
    pub(crate) fn place_in_slot(&mut self, slot_transform: Transform) {
        self.slot_transform = slot_transform;
        if self.pinned {
            self.set_world_transform(slot_transform);
        }
    }

    pub(crate) fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
        self.visual.set_alpha(self.alpha);
    }

    fn set_world_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.visual.set_transform(&self.transform);
    }

    // ========================================================================
    // Grab Lifecycle
    // ========================================================================

    /// Leave the layer slot
    ///
    /// Returns true only on the call that actually unpins the item.
    pub(crate) fn pull_out(&mut self) -> bool {
        if self.pinned {
            self.pinned = false;
            true
        } else {
            false
        }
    }

    /// Drop any anchor and snap back into the layer slot
    pub(crate) fn return_to_slot(&mut self) {
        self.anchor = None;
        self.pinned = true;
        self.set_world_transform(self.slot_transform);
    }

    /// Create the anchor on the item's current pose if none exists
    ///
    /// Returns true when a new anchor was created.
    pub(crate) fn ensure_anchor(&mut self) -> bool {
        if self.anchor.is_some() {
            return false;
        }
        self.anchor = Some(Anchor::at(self.transform));
        true
    }

    /// Destroy the anchor; the item keeps its current world pose
    pub(crate) fn release_anchor(&mut self) -> Option<Anchor> {
        self.anchor.take()
    }

    /// Move the anchor and re-parent the item in the same step
    ///
    /// The item keeps its world pose and its offset is recomputed against
    /// the new anchor pose. If the anchor pose collapses space (zero scale)
    /// the anchor is left untouched and the rebase stays pending until a
    /// usable pose arrives.
    pub(crate) fn rebase_anchor(&mut self, anchor_transform: Transform) {
        let world = self.transform;
        if let Some(anchor) = self.anchor.as_mut() {
            match world.relative_to(&anchor_transform) {
                Some(offset) => {
                    anchor.transform = anchor_transform;
                    anchor.offset = offset;
                    anchor.pending_rebase = false;
                }
                None => anchor.pending_rebase = true,
            }
        }
    }

    /// Move the anchor and carry the attached item along
    ///
    /// A pending rebase is retried first; the item stays put until it
    /// succeeds.
    pub(crate) fn drive_anchor(&mut self, anchor_transform: Transform) {
        if self.anchor.map_or(false, |anchor| anchor.pending_rebase) {
            self.rebase_anchor(anchor_transform);
            return;
        }
        let world = match self.anchor.as_mut() {
            Some(anchor) => {
                anchor.transform = anchor_transform;
                anchor_transform.compose(&anchor.offset)
            }
            None => return,
        };
        self.set_world_transform(world);
    }

    pub(crate) fn into_visual(self) -> (ItemId, Box<dyn ItemVisual>) {
        (self.slot.id, self.visual)
    }
}
