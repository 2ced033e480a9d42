//! Layer - one concentric shell of items
//!
//! A layer spreads its items over up to three horizontal rows around a
//! shared centre. The middle row sits at the layer radius; the rows above and
//! below are lifted/lowered by a fixed height and pulled in by a fixed radius
//! delta so the shell reads as a sphere rather than a cylinder.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::item::{Item, ItemFactory, ItemId, ItemSlot};
use crate::spatial::{circle_point, look_rotation, Transform};

/// Largest supported number of rows per layer
pub const MAX_ROWS: usize = 3;

/// Static description of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSpec {
    /// Number of items on the layer
    pub element_count: usize,
    /// Number of rows (clamped to 1..=3)
    pub row_count: usize,
    /// Resting radius
    pub radius: f32,
    /// Resting transparency
    pub alpha: f32,
    /// Vertical distance of the outer rows from the centre
    pub row_height: f32,
    /// Radius reduction applied to the outer rows
    pub row_radius_delta: f32,
    /// Scale applied to every item
    pub item_scale: Vec3,
    /// Fixed angular spacing in degrees; `None` spreads each row over 360
    pub angle_spacing: Option<f32>,
}

impl Default for LayerSpec {
    fn default() -> Self {
        Self {
            element_count: 1,
            row_count: 1,
            radius: 1.0,
            alpha: 1.0,
            row_height: 0.4,
            row_radius_delta: 0.15,
            item_scale: Vec3::ONE,
            angle_spacing: None,
        }
    }
}

impl LayerSpec {
    /// Bring every field into its legal range
    pub fn clamped(mut self) -> Self {
        self.row_count = self.row_count.clamp(1, MAX_ROWS);
        self.radius = self.radius.max(0.0);
        self.alpha = self.alpha.clamp(0.0, 1.0);
        self.item_scale = self.item_scale.max(Vec3::ZERO);
        self.angle_spacing = self.angle_spacing.map(|s| s.clamp(0.0, 360.0));
        self
    }
}

/// Split `element_count` items over `row_count` rows
///
/// Every row gets the same share; the remainder goes to the middle row
/// (index 1), or to the only row of a single-row layer.
pub fn distribute_rows(element_count: usize, row_count: usize) -> Vec<usize> {
    let rows = row_count.clamp(1, MAX_ROWS);
    let share = element_count / rows;
    let remainder = element_count % rows;

    let mut per_row = vec![share; rows];
    let remainder_row = if rows > 1 { 1 } else { 0 };
    per_row[remainder_row] += remainder;
    per_row
}

/// Angular spacing for a row of `items` when spacing is automatic
pub fn auto_angle_spacing(items: usize) -> f32 {
    if items == 0 {
        0.0
    } else {
        360.0 / items as f32
    }
}

/// One shell of items
#[derive(Debug)]
pub struct Layer {
    index: usize,
    spec: LayerSpec,
    center: Vec3,
    radius: f32,
    alpha: f32,
    /// Part of the navigable set (not collapsed into the centre)
    active: bool,
    visible: bool,
    orientation: Quat,
    items_per_row: Vec<usize>,
    row_spacing: Vec<f32>,
    items: Vec<Item>,
}

impl Layer {
    /// Build a layer and create its items through `factory`
    ///
    /// Item ids are drawn from `next_id`, which is advanced past the last id
    /// used.
    pub(crate) fn build(
        index: usize,
        spec: LayerSpec,
        center: Vec3,
        next_id: &mut u32,
        factory: &mut dyn ItemFactory,
    ) -> Self {
        let spec = spec.clamped();
        let items_per_row = distribute_rows(spec.element_count, spec.row_count);
        let row_spacing = items_per_row
            .iter()
            .map(|&n| spec.angle_spacing.unwrap_or_else(|| auto_angle_spacing(n)))
            .collect();

        let mut items = Vec::with_capacity(spec.element_count);
        for (row, &count) in items_per_row.iter().enumerate() {
            for angular_index in 0..count {
                let slot = ItemSlot {
                    id: ItemId(*next_id),
                    layer: index,
                    row,
                    angular_index,
                };
                *next_id += 1;
                let visual = factory.create_item(&slot);
                items.push(Item::new(slot, visual));
            }
        }

        let (radius, alpha) = (spec.radius, spec.alpha);
        let mut layer = Self {
            index,
            radius,
            alpha,
            spec,
            center,
            active: true,
            visible: true,
            orientation: Quat::IDENTITY,
            items_per_row,
            row_spacing,
            items,
        };
        layer.change_visualization_configuration(center, radius, alpha);
        layer
    }

    /// Set radius and alpha and re-place every item
    ///
    /// Idempotent: the same arguments always produce the same item poses.
    /// Items that have been pulled out keep their pose but their slot is
    /// updated.
    pub fn change_visualization_configuration(&mut self, center: Vec3, radius: f32, alpha: f32) {
        self.center = center;
        self.radius = radius.max(0.0);
        self.alpha = alpha.clamp(0.0, 1.0);
        self.relayout();

        let alpha = self.alpha;
        for item in &mut self.items {
            item.set_alpha(alpha);
        }
    }

    /// Centre and radius of a row at the current layer radius
    ///
    /// Panics if `row` is out of range.
    pub fn row_geometry(&self, row: usize) -> (Vec3, f32) {
        assert!(
            row < self.items_per_row.len(),
            "row {} out of range for layer {} with {} rows",
            row,
            self.index,
            self.items_per_row.len()
        );

        if self.items_per_row.len() == 1 || row == 1 {
            return (self.center, self.radius);
        }

        let lift = (if row == 0 { Vec3::Y } else { Vec3::NEG_Y }) * self.spec.row_height;
        let radius = (self.radius - self.spec.row_radius_delta).max(0.0);
        (self.center + lift, radius)
    }

    /// Angle in degrees of the item at `angular_index` in `row`
    pub fn item_angle(&self, row: usize, angular_index: usize) -> f32 {
        angular_index as f32 * self.row_spacing[row]
    }

    fn slot_transform(&self, row: usize, angular_index: usize) -> Transform {
        let (row_center, radius) = self.row_geometry(row);
        let local = circle_point(row_center, radius, self.item_angle(row, angular_index));
        let facing = look_rotation(self.center - local, Vec3::Y).unwrap_or(Quat::IDENTITY);

        Transform {
            position: self.center + self.orientation * (local - self.center),
            rotation: (self.orientation * facing).normalize(),
            scale: self.spec.item_scale,
        }
    }

    fn relayout(&mut self) {
        let slots: Vec<Transform> = self
            .items
            .iter()
            .map(|item| item.slot())
            .map(|slot| self.slot_transform(slot.row, slot.angular_index))
            .collect();

        for (item, slot) in self.items.iter_mut().zip(slots) {
            item.place_in_slot(slot);
        }
    }

    // ========================================================================
    // Orientation
    // ========================================================================

    /// Spin around the layer's own vertical axis (degrees, positive turns
    /// toward -Y)
    pub(crate) fn rotate_local_down(&mut self, degrees: f32) {
        let spin = Quat::from_axis_angle(Vec3::NEG_Y, degrees.to_radians());
        self.orientation = (self.orientation * spin).normalize();
        self.relayout();
    }

    /// Tilt around the world +X axis (degrees)
    pub(crate) fn rotate_world_right(&mut self, degrees: f32) {
        let tilt = Quat::from_axis_angle(Vec3::X, degrees.to_radians());
        self.orientation = (tilt * self.orientation).normalize();
        self.relayout();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn index(&self) -> usize {
        self.index
    }

    /// Configured (resting) description of this layer
    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn row_count(&self) -> usize {
        self.items_per_row.len()
    }

    pub fn items_per_row(&self) -> &[usize] {
        &self.items_per_row
    }

    /// Angular spacing in degrees for each row
    pub fn row_spacing(&self) -> &[f32] {
        &self.row_spacing
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    pub fn all_pinned(&self) -> bool {
        self.items.iter().all(Item::is_pinned)
    }

    /// Hand every item back to the factory
    pub(crate) fn destroy(self, factory: &mut dyn ItemFactory) {
        for item in self.items {
            let (id, visual) = item.into_visual();
            factory.destroy_item(id, visual);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::item::NullItemFactory;
    use approx::assert_abs_diff_eq;

    fn build_layer(spec: LayerSpec) -> Layer {
        let mut next_id = 0;
        Layer::build(0, spec, Vec3::ZERO, &mut next_id, &mut NullItemFactory)
    }

    fn spec(elements: usize, rows: usize) -> LayerSpec {
        LayerSpec {
            element_count: elements,
            row_count: rows,
            radius: 1.0,
            alpha: 0.5,
            row_height: 0.2,
            row_radius_delta: 0.05,
            item_scale: Vec3::new(0.2, 0.2, 0.001),
            angle_spacing: None,
        }
    }

    // ------------------------------------------------------------------------
    // Row Distribution Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_distribute_even() {
        assert_eq!(distribute_rows(39, 3), vec![13, 13, 13]);
    }

    #[test]
    fn test_distribute_remainder_to_middle_row() {
        assert_eq!(distribute_rows(40, 3), vec![13, 14, 13]);
        assert_eq!(distribute_rows(41, 3), vec![13, 15, 13]);
        assert_eq!(distribute_rows(5, 2), vec![2, 3]);
    }

    #[test]
    fn test_distribute_single_row_takes_all() {
        assert_eq!(distribute_rows(7, 1), vec![7]);
    }

    #[test]
    fn test_distribute_clamps_row_count() {
        assert_eq!(distribute_rows(10, 0), vec![10]);
        assert_eq!(distribute_rows(12, 9).len(), 3);
    }

    #[test]
    fn test_distribute_zero_elements() {
        assert_eq!(distribute_rows(0, 3), vec![0, 0, 0]);
    }

    // ------------------------------------------------------------------------
    // Placement Tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_build_creates_items_in_row_order() {
        let layer = build_layer(spec(40, 3));
        assert_eq!(layer.len(), 40);
        assert_eq!(layer.items_per_row(), &[13, 14, 13]);
        assert_eq!(layer.items()[0].slot().row, 0);
        assert_eq!(layer.items()[13].slot().row, 1);
        assert_eq!(layer.items()[13].slot().angular_index, 0);
        assert_eq!(layer.items()[39].slot().row, 2);
    }

    #[test]
    fn test_angular_spacing_is_full_circle_over_count() {
        let layer = build_layer(spec(8, 1));
        assert_abs_diff_eq!(layer.row_spacing()[0], 45.0);
        assert_abs_diff_eq!(layer.item_angle(0, 0), 0.0);
        assert_abs_diff_eq!(layer.item_angle(0, 3), 135.0);

        let first = layer.items()[0].transform().position;
        assert_abs_diff_eq!(first.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(first.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_each_row_uses_its_own_spacing() {
        let layer = build_layer(spec(40, 3));
        assert_abs_diff_eq!(layer.row_spacing()[0], 360.0 / 13.0);
        assert_abs_diff_eq!(layer.row_spacing()[1], 360.0 / 14.0);
    }

    #[test]
    fn test_explicit_spacing_override() {
        let mut s = spec(4, 1);
        s.angle_spacing = Some(10.0);
        let layer = build_layer(s);
        assert_abs_diff_eq!(layer.item_angle(0, 2), 20.0);
    }

    #[test]
    fn test_outer_rows_offset_and_shrunk() {
        let layer = build_layer(spec(39, 3));
        let (top_center, top_radius) = layer.row_geometry(0);
        let (mid_center, mid_radius) = layer.row_geometry(1);
        let (low_center, low_radius) = layer.row_geometry(2);

        assert_abs_diff_eq!(top_center.y, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(mid_center.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(low_center.y, -0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(top_radius, 0.95, epsilon = 1e-6);
        assert_abs_diff_eq!(mid_radius, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(low_radius, 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_items_face_center() {
        let layer = build_layer(spec(6, 1));
        for item in layer.items() {
            let t = item.transform();
            let to_center = (layer.center() - t.position).normalize();
            assert_abs_diff_eq!(t.forward().dot(to_center), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_change_configuration_is_idempotent() {
        let mut layer = build_layer(spec(39, 3));
        let center = Vec3::new(0.5, 1.0, -2.0);

        layer.change_visualization_configuration(center, 0.8, 0.3);
        let first: Vec<Vec3> = layer.items().iter().map(|i| i.transform().position).collect();
        layer.change_visualization_configuration(center, 0.8, 0.3);
        let second: Vec<Vec3> = layer.items().iter().map(|i| i.transform().position).collect();

        assert_eq!(first, second);
        assert!(layer.items().iter().all(|i| i.alpha() == 0.3));
    }

    #[test]
    fn test_negative_radius_clamped() {
        let mut layer = build_layer(spec(3, 3));
        layer.change_visualization_configuration(Vec3::ZERO, -1.0, 2.0);
        assert_eq!(layer.radius(), 0.0);
        assert_eq!(layer.alpha(), 1.0);
        let (_, outer) = layer.row_geometry(0);
        assert_eq!(outer, 0.0);
    }

    #[test]
    fn test_empty_layer_is_legal() {
        let mut layer = build_layer(spec(0, 2));
        assert!(layer.is_empty());
        layer.change_visualization_configuration(Vec3::ZERO, 0.5, 0.5);
        assert_eq!(layer.radius(), 0.5);
    }

    #[test]
    fn test_rotation_keeps_items_on_shell() {
        let mut layer = build_layer(spec(13, 1));
        layer.rotate_local_down(30.0);
        layer.rotate_world_right(15.0);
        for item in layer.items() {
            let distance = (item.transform().position - layer.center()).length();
            assert_abs_diff_eq!(distance, 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_spec_clamped() {
        let s = LayerSpec {
            row_count: 7,
            radius: -2.0,
            alpha: 3.0,
            item_scale: Vec3::new(-1.0, 1.0, 1.0),
            angle_spacing: Some(500.0),
            ..LayerSpec::default()
        }
        .clamped();
        assert_eq!(s.row_count, 3);
        assert_eq!(s.radius, 0.0);
        assert_eq!(s.alpha, 1.0);
        assert_eq!(s.item_scale.x, 0.0);
        assert_eq!(s.angle_spacing, Some(360.0));
    }
}
