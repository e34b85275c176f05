// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph model the canvas edits: nodes, slots, links, reroutes and groups.

pub mod clipboard;
pub mod graph;
pub mod group;
pub mod history;
pub mod link;
pub mod node;
pub mod reroute;
pub mod slot;
pub mod widget;

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

pub use clipboard::{ClipboardError, ClipboardRecord, ClipboardStore, MemoryClipboard};
pub use graph::{ConnectionError, Graph, RerouteError, RerouteSplice};
pub use group::{Group, GroupId};
pub use history::{ChangeHistory, HistoryError, StateSnapshot};
pub use link::{Link, LinkId, SegmentRender};
pub use node::{Node, NodeFlags, NodeId};
pub use reroute::{Reroute, RerouteId};
pub use slot::{Slot, SlotKind, SlotShape, SlotType};
pub use widget::{Widget, WidgetKind, WidgetValue};

/// Anything that can be placed, moved and selected on the canvas
pub trait Positionable {
    /// Anchor position in graph space
    fn pos(&self) -> Pos2;

    /// Set the anchor position
    fn set_pos(&mut self, pos: Pos2);

    /// Bounding rectangle in graph space
    fn bounding(&self) -> Rect;

    /// Selection flag
    fn is_selected(&self) -> bool;

    /// Set the selection flag
    fn set_selected(&mut self, selected: bool);

    /// Pinned items ignore moves
    fn is_pinned(&self) -> bool {
        false
    }

    /// Translate by `delta`
    fn move_by(&mut self, delta: Vec2) {
        let pos = self.pos() + delta;
        self.set_pos(pos);
    }
}

/// Identifies one selectable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    /// A node
    Node(NodeId),
    /// A group
    Group(GroupId),
    /// A reroute
    Reroute(RerouteId),
}

impl From<NodeId> for ItemId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

impl From<GroupId> for ItemId {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

impl From<RerouteId> for ItemId {
    fn from(id: RerouteId) -> Self {
        Self::Reroute(id)
    }
}
