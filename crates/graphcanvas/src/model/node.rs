// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and node-local layout.

use crate::model::slot::{Slot, SlotKind, SlotType};
use crate::model::widget::Widget;
use crate::model::Positionable;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Height of the title band above the node body
pub const NODE_TITLE_HEIGHT: f32 = 30.0;
/// Vertical pitch of slot rows
pub const NODE_SLOT_HEIGHT: f32 = 20.0;
/// Height of a widget row
pub const NODE_WIDGET_HEIGHT: f32 = 20.0;
/// Gap between widget rows
const WIDGET_MARGIN: f32 = 4.0;
/// Horizontal inset of widgets
const WIDGET_INSET: f32 = 15.0;
/// Narrowest computed node width
const NODE_MIN_WIDTH: f32 = 100.0;
/// Narrowest collapsed node width
const NODE_COLLAPSED_MIN_WIDTH: f32 = 80.0;
/// Approximate glyph advance used for text measurement
const CHAR_WIDTH: f32 = 7.0;
/// Side of the square resize corner
pub const NODE_RESIZE_HANDLE: f32 = 15.0;
/// Slot hit box size, larger than the drawn glyph
pub const SLOT_HIT_SIZE: Vec2 = Vec2::new(30.0, 20.0);

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-node behaviour flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeFlags {
    /// Only the title band is drawn
    pub collapsed: bool,
    /// Pinned nodes cannot be moved or resized
    pub pinned: bool,
    /// Whether the resize corner is active
    pub resizable: bool,
    /// Whether the collapse toggle is shown
    pub collapsible: bool,
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self {
            collapsed: false,
            pinned: false,
            resizable: true,
            collapsible: true,
        }
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display title
    pub title: String,
    /// Top-left corner of the body (the title band sits above it)
    pub pos: [f32; 2],
    /// Body size, excluding the title band
    pub size: [f32; 2],
    /// Input slots
    pub inputs: Vec<Slot>,
    /// Output slots
    pub outputs: Vec<Slot>,
    /// In-node controls
    pub widgets: Vec<Widget>,
    /// Behaviour flags
    #[serde(default)]
    pub flags: NodeFlags,
    /// Custom color (optional)
    pub color: Option<[u8; 3]>,
    /// Selection flag, kept in sync by the selection model
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    /// Create a node with a title and type
    pub fn new(node_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            title: title.into(),
            pos: [0.0, 0.0],
            size: [NODE_MIN_WIDTH, NODE_SLOT_HEIGHT],
            inputs: Vec::new(),
            outputs: Vec::new(),
            widgets: Vec::new(),
            flags: NodeFlags::default(),
            color: None,
            selected: false,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.pos = [x, y];
        self
    }

    /// Add an input slot and grow to fit
    pub fn with_input(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.inputs.push(Slot::input(name, slot_type));
        self.fit_to_content();
        self
    }

    /// Add an output slot and grow to fit
    pub fn with_output(mut self, name: impl Into<String>, slot_type: impl Into<SlotType>) -> Self {
        self.outputs.push(Slot::output(name, slot_type));
        self.fit_to_content();
        self
    }

    /// Add a widget and grow to fit
    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self.fit_to_content();
        self
    }

    /// Set the body size, clamped to the computed minimum
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.set_size(Vec2::new(width, height));
        self
    }

    /// Minimum body size that fits the title, slots and widgets
    pub fn compute_size(&self) -> Vec2 {
        let title_width = self.title.chars().count() as f32 * CHAR_WIDTH + NODE_TITLE_HEIGHT + 10.0;
        let label_width = |slots: &[Slot]| {
            slots
                .iter()
                .map(|s| s.name.chars().count() as f32 * CHAR_WIDTH)
                .fold(0.0, f32::max)
        };
        let slots_width =
            label_width(&self.inputs) + label_width(&self.outputs) + 2.0 * NODE_SLOT_HEIGHT + 10.0;
        let width = title_width.max(slots_width).max(NODE_MIN_WIDTH);

        let rows = self.inputs.len().max(self.outputs.len()).max(1) as f32;
        let mut height = rows * NODE_SLOT_HEIGHT + 6.0;
        if !self.widgets.is_empty() {
            let widgets = self.widgets.len() as f32;
            height += WIDGET_MARGIN + widgets * (NODE_WIDGET_HEIGHT + WIDGET_MARGIN);
        }
        Vec2::new(width, height)
    }

    /// Grow the body so its content fits
    pub fn fit_to_content(&mut self) {
        let min = self.compute_size();
        self.size = [self.size[0].max(min.x), self.size[1].max(min.y)];
    }

    /// Set the body size, never smaller than [`Node::compute_size`]
    pub fn set_size(&mut self, size: Vec2) {
        let min = self.compute_size();
        self.size = [size.x.max(min.x), size.y.max(min.y)];
    }

    /// Body size
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.size[0], self.size[1])
    }

    /// Width of the title band when collapsed
    pub fn collapsed_width(&self) -> f32 {
        let title = self.title.chars().count() as f32 * CHAR_WIDTH;
        (title + NODE_TITLE_HEIGHT + 10.0).max(NODE_COLLAPSED_MIN_WIDTH)
    }

    /// Toggle the collapsed flag
    pub fn collapse(&mut self) {
        if self.flags.collapsible {
            self.flags.collapsed = !self.flags.collapsed;
        }
    }

    /// Get an input slot by index
    pub fn input(&self, index: usize) -> Option<&Slot> {
        self.inputs.get(index)
    }

    /// Get an output slot by index
    pub fn output(&self, index: usize) -> Option<&Slot> {
        self.outputs.get(index)
    }

    /// Get a slot by kind and index
    pub fn slot(&self, kind: SlotKind, index: usize) -> Option<&Slot> {
        match kind {
            SlotKind::Input => self.inputs.get(index),
            SlotKind::Output => self.outputs.get(index),
        }
    }

    /// Get a mutable slot by kind and index
    pub fn slot_mut(&mut self, kind: SlotKind, index: usize) -> Option<&mut Slot> {
        match kind {
            SlotKind::Input => self.inputs.get_mut(index),
            SlotKind::Output => self.outputs.get_mut(index),
        }
    }

    /// Graph-space anchor of a slot, where links attach
    pub fn slot_pos(&self, kind: SlotKind, index: usize) -> Pos2 {
        let [x, y] = self.pos;
        if self.flags.collapsed {
            let cy = y - NODE_TITLE_HEIGHT * 0.5;
            return match kind {
                SlotKind::Input => Pos2::new(x, cy),
                SlotKind::Output => Pos2::new(x + self.collapsed_width(), cy),
            };
        }
        let offset = NODE_SLOT_HEIGHT * 0.5;
        let sy = y + (index as f32 + 0.7) * NODE_SLOT_HEIGHT;
        match kind {
            SlotKind::Input => Pos2::new(x + offset, sy),
            SlotKind::Output => Pos2::new(x + self.size[0] + 1.0 - offset, sy),
        }
    }

    /// Hit box of a slot, centred on its anchor
    pub fn slot_hit_box(&self, kind: SlotKind, index: usize) -> Rect {
        Rect::from_center_size(self.slot_pos(kind, index), SLOT_HIT_SIZE)
    }

    /// Collapse toggle in the left of the title band
    pub fn collapse_toggle_rect(&self) -> Rect {
        let [x, y] = self.pos;
        Rect::from_min_size(Pos2::new(x, y - NODE_TITLE_HEIGHT), Vec2::splat(NODE_TITLE_HEIGHT))
    }

    /// Bottom-right resize corner
    pub fn resize_handle_rect(&self) -> Rect {
        let [x, y] = self.pos;
        let [w, h] = self.size;
        Rect::from_min_size(
            Pos2::new(x + w - NODE_RESIZE_HANDLE, y + h - NODE_RESIZE_HANDLE),
            Vec2::splat(NODE_RESIZE_HANDLE),
        )
    }

    /// Graph-space rectangle of a widget row
    pub fn widget_rect(&self, index: usize) -> Option<Rect> {
        if self.flags.collapsed || index >= self.widgets.len() {
            return None;
        }
        let [x, y] = self.pos;
        let rows = self.inputs.len().max(self.outputs.len()).max(1) as f32;
        let top = y
            + rows * NODE_SLOT_HEIGHT
            + 6.0
            + WIDGET_MARGIN
            + index as f32 * (NODE_WIDGET_HEIGHT + WIDGET_MARGIN);
        Some(Rect::from_min_size(
            Pos2::new(x + WIDGET_INSET, top),
            Vec2::new(self.size[0] - 2.0 * WIDGET_INSET, NODE_WIDGET_HEIGHT),
        ))
    }

    /// Index of the widget under `pos`
    pub fn widget_at(&self, pos: Pos2) -> Option<usize> {
        (0..self.widgets.len()).find(|&i| self.widget_rect(i).is_some_and(|r| r.contains(pos)))
    }

    /// First input slot accepting `slot_type`, free slots preferred
    pub fn find_input_slot_by_type(&self, slot_type: &SlotType) -> Option<usize> {
        Self::find_slot_by_type(&self.inputs, slot_type)
    }

    /// First output slot accepting `slot_type`, free slots preferred
    pub fn find_output_slot_by_type(&self, slot_type: &SlotType) -> Option<usize> {
        Self::find_slot_by_type(&self.outputs, slot_type)
    }

    fn find_slot_by_type(slots: &[Slot], slot_type: &SlotType) -> Option<usize> {
        let compatible = |s: &Slot| slot_type.can_connect_to(&s.slot_type);
        slots
            .iter()
            .position(|s| compatible(s) && !s.is_connected())
            .or_else(|| slots.iter().position(compatible))
    }

    /// Iterate every link id touching this node
    pub fn link_ids(&self) -> impl Iterator<Item = crate::model::LinkId> + '_ {
        self.inputs
            .iter()
            .filter_map(|s| s.link)
            .chain(self.outputs.iter().flat_map(|s| s.links.iter().copied()))
    }
}

impl Positionable for Node {
    fn pos(&self) -> Pos2 {
        Pos2::new(self.pos[0], self.pos[1])
    }

    fn set_pos(&mut self, pos: Pos2) {
        self.pos = [pos.x, pos.y];
    }

    fn bounding(&self) -> Rect {
        let [x, y] = self.pos;
        let width = if self.flags.collapsed {
            self.collapsed_width()
        } else {
            self.size[0]
        };
        let height = if self.flags.collapsed {
            NODE_TITLE_HEIGHT
        } else {
            self.size[1] + NODE_TITLE_HEIGHT
        };
        Rect::from_min_size(Pos2::new(x, y - NODE_TITLE_HEIGHT), Vec2::new(width, height))
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    fn is_pinned(&self) -> bool {
        self.flags.pinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::new("math/add", "Add")
            .with_position(100.0, 100.0)
            .with_input("a", "float")
            .with_input("b", "float")
            .with_output("sum", "float")
    }

    #[test]
    fn test_bounding_includes_title() {
        let node = sample();
        let b = node.bounding();
        assert_eq!(b.min, Pos2::new(100.0, 70.0));
        assert_eq!(b.height(), node.size[1] + NODE_TITLE_HEIGHT);
    }

    #[test]
    fn test_slot_positions_sit_on_opposite_sides() {
        let node = sample();
        let input = node.slot_pos(SlotKind::Input, 0);
        let output = node.slot_pos(SlotKind::Output, 0);
        assert!(input.x < output.x);
        assert_eq!(input.y, output.y);
        assert!(!node
            .slot_hit_box(SlotKind::Input, 0)
            .intersects(node.slot_hit_box(SlotKind::Output, 0)));
    }

    #[test]
    fn test_collapsed_slots_share_title_row() {
        let mut node = sample();
        node.collapse();
        assert!(node.flags.collapsed);
        assert_eq!(node.slot_pos(SlotKind::Input, 1).y, 100.0 - NODE_TITLE_HEIGHT * 0.5);
        assert_eq!(node.bounding().height(), NODE_TITLE_HEIGHT);
        assert!(node.widget_rect(0).is_none());
    }

    #[test]
    fn test_set_size_clamps_to_minimum() {
        let mut node = sample();
        node.set_size(Vec2::new(1.0, 1.0));
        assert_eq!(node.size(), node.compute_size());
    }

    #[test]
    fn test_widgets_are_below_slots() {
        let node = sample().with_widget(Widget::toggle("on", true));
        let rect = node.widget_rect(0).unwrap();
        assert!(rect.min.y > node.slot_pos(SlotKind::Input, 1).y);
        assert!(rect.max.y <= node.pos[1] + node.size[1]);
        assert_eq!(node.widget_at(rect.center()), Some(0));
    }

    #[test]
    fn test_find_slot_prefers_free() {
        let mut node = sample();
        node.inputs[0].link = Some(crate::model::LinkId::new());
        assert_eq!(node.find_input_slot_by_type(&SlotType::new("float")), Some(1));
        assert_eq!(node.find_input_slot_by_type(&SlotType::new("image")), None);
    }
}
