// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interaction state: the active gesture and what the pointer hovers.
//!
//! A gesture is one press-to-release cycle. The canvas owns exactly one
//! [`Gesture`] at a time and takes it out when the cycle concludes, so the
//! cleanup attached to a gesture runs once whether the cycle ends in a
//! release or a cancel.

use crate::connecting::LinkConnector;
use crate::geometry::normalized_rect;
use crate::hit_test::{HitTarget, NodePart, SegmentOwner};
use crate::model::group::GroupId;
use crate::model::link::LinkId;
use crate::model::node::NodeId;
use crate::model::reroute::RerouteId;
use crate::model::slot::SlotKind;
use crate::model::ItemId;
use crate::selection::SelectionMode;
use egui::{CursorIcon, Pos2, Rect, Vec2};

/// The gesture in progress
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Gesture {
    /// Nothing in progress
    #[default]
    Idle,
    /// Panning the view; `last` is in canvas space
    PanningCanvas {
        /// Pointer position of the previous pan step
        last: Pos2,
    },
    /// Primary press on empty canvas (or a group body); dragging pans
    PressingEmpty {
        /// Pointer position in canvas space
        last: Pos2,
        /// Group whose body was pressed
        group: Option<GroupId>,
    },
    /// Primary press on a node, not yet dragged
    PressingNode {
        /// Node pressed
        node: NodeId,
        /// Part pressed
        part: NodePart,
        /// Graph position of the press
        start: Pos2,
        /// Shift or ctrl was held: a click toggles membership
        toggle: bool,
        /// Alt was held: a drag clones the node first
        clone_on_drag: bool,
    },
    /// Moving items; a change bracket is open
    DraggingItems {
        /// Items being moved, group children included
        items: Vec<ItemId>,
        /// Graph position of the previous step
        last: Pos2,
    },
    /// Resizing a node; a change bracket is open
    ResizingNode {
        /// Node being resized
        node: NodeId,
        /// Graph position of the press
        start: Pos2,
        /// Size at the press
        start_size: Vec2,
    },
    /// Resizing a group; a change bracket is open
    ResizingGroup {
        /// Group being resized
        group: GroupId,
        /// Graph position of the press
        start: Pos2,
        /// Size at the press
        start_size: Vec2,
    },
    /// Dragging links
    Connecting {
        /// Dragged ends
        connector: LinkConnector,
        /// A change bracket was opened at the press (detached link)
        bracket_open: bool,
    },
    /// Rubber-band selection, in graph space
    Marquee {
        /// Corner at the press
        start: Pos2,
        /// Opposite corner
        current: Pos2,
        /// How the result combines with the selection
        mode: SelectionMode,
    },
    /// Press on a group header, not yet dragged
    PressingGroup {
        /// Group pressed
        group: GroupId,
        /// Graph position of the press
        start: Pos2,
        /// Shift or ctrl was held
        toggle: bool,
    },
    /// Press on a link stroke
    PressingLink {
        /// Link pressed
        link: LinkId,
        /// Segment pressed
        segment: SegmentOwner,
    },
    /// Press on a reroute, not yet dragged
    PressingReroute {
        /// Reroute pressed
        reroute: RerouteId,
        /// Graph position of the press
        start: Pos2,
    },
    /// Press on a widget
    Widget {
        /// Node owning the widget
        node: NodeId,
        /// Widget index
        widget: usize,
        /// Graph x of the previous drag step
        last_x: f32,
        /// The press became a drag; a change bracket is open
        dragged: bool,
        /// The value changed while dragging
        changed: bool,
    },
}

impl Gesture {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PanningCanvas { .. } => "panning-canvas",
            Self::PressingEmpty { .. } => "pressing-empty",
            Self::PressingNode { .. } => "pressing-node",
            Self::DraggingItems { .. } => "dragging-items",
            Self::ResizingNode { .. } => "resizing-node",
            Self::ResizingGroup { .. } => "resizing-group",
            Self::Connecting { .. } => "connecting",
            Self::Marquee { .. } => "marquee",
            Self::PressingGroup { .. } => "pressing-group",
            Self::PressingLink { .. } => "pressing-link",
            Self::PressingReroute { .. } => "pressing-reroute",
            Self::Widget { .. } => "widget",
        }
    }

    /// Whether a move beyond the click threshold should become a drag
    pub fn wants_drag(&self) -> bool {
        !matches!(self, Self::Idle | Self::PressingLink { .. })
    }

    /// Nothing in progress
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The view is being panned
    pub fn dragging_canvas(&self) -> bool {
        matches!(self, Self::PanningCanvas { .. })
    }

    /// Items are being moved
    pub fn dragging_items(&self) -> bool {
        matches!(self, Self::DraggingItems { .. })
    }

    /// A group is being resized
    pub fn resizing_group(&self) -> bool {
        matches!(self, Self::ResizingGroup { .. })
    }

    /// A node is being resized
    pub fn resizing_node(&self) -> bool {
        matches!(self, Self::ResizingNode { .. })
    }

    /// Links are being dragged
    pub fn connecting_links(&self) -> Option<&LinkConnector> {
        match self {
            Self::Connecting { connector, .. } => Some(connector),
            _ => None,
        }
    }

    /// The marquee rectangle, if one is being drawn
    pub fn dragging_rectangle(&self) -> Option<Rect> {
        match self {
            Self::Marquee { start, current, .. } => Some(normalized_rect(*start, *current)),
            _ => None,
        }
    }
}

/// What the pointer is over, as bit flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerOver(u8);

impl PointerOver {
    /// Over nothing
    pub const NONE: Self = Self(0);
    /// Over a node
    pub const NODE: Self = Self(1);
    /// Over a slot
    pub const SLOT: Self = Self(1 << 1);
    /// Over a widget
    pub const WIDGET: Self = Self(1 << 2);
    /// Over a node or group resize handle
    pub const RESIZE: Self = Self(1 << 3);
    /// Over a reroute
    pub const REROUTE: Self = Self(1 << 4);
    /// Over a link stroke
    pub const LINK: Self = Self(1 << 5);
    /// Over a group header
    pub const GROUP: Self = Self(1 << 6);

    /// Whether every flag in `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Set the flags in `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// No flags set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Where a drag would land
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropTarget {
    /// A slot the dragged links can connect to
    Slot {
        /// Node owning the slot
        node: NodeId,
        /// Slot kind
        kind: SlotKind,
        /// Slot index
        slot: usize,
    },
    /// The grid-snapped bounds the dragged node would take
    Snapped(Rect),
}

/// Hover state, refreshed on every pointer move
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverState {
    /// Raw hit result
    pub target: HitTarget,
    /// Hovered node
    pub node: Option<NodeId>,
    /// Hovered slot
    pub slot: Option<(NodeId, SlotKind, usize)>,
    /// Hovered widget
    pub widget: Option<(NodeId, usize)>,
    /// Hovered reroute
    pub reroute: Option<RerouteId>,
    /// Hovered link
    pub link: Option<LinkId>,
    /// Hovered group
    pub group: Option<GroupId>,
    /// Drop highlight while connecting or dragging
    pub drop_target: Option<DropTarget>,
    /// Bit flags of what is under the pointer
    pub pointer_over: PointerOver,
}

impl HoverState {
    /// Hover state for a hit result
    pub fn from_hit(target: HitTarget) -> Self {
        let mut hover = Self {
            target,
            ..Self::default()
        };
        match target {
            HitTarget::Empty => {}
            HitTarget::Node { node, part } => {
                hover.node = Some(node);
                hover.pointer_over.insert(PointerOver::NODE);
                match part {
                    NodePart::Resize => hover.pointer_over.insert(PointerOver::RESIZE),
                    NodePart::Input(i) => {
                        hover.slot = Some((node, SlotKind::Input, i));
                        hover.pointer_over.insert(PointerOver::SLOT);
                    }
                    NodePart::Output(i) => {
                        hover.slot = Some((node, SlotKind::Output, i));
                        hover.pointer_over.insert(PointerOver::SLOT);
                    }
                    NodePart::Widget(i) => {
                        hover.widget = Some((node, i));
                        hover.pointer_over.insert(PointerOver::WIDGET);
                    }
                    NodePart::CollapseToggle | NodePart::Body => {}
                }
            }
            HitTarget::Reroute(id) => {
                hover.reroute = Some(id);
                hover.pointer_over.insert(PointerOver::REROUTE);
            }
            HitTarget::Link { link, .. } => {
                hover.link = Some(link);
                hover.pointer_over.insert(PointerOver::LINK);
            }
            HitTarget::GroupResize(id) => {
                hover.group = Some(id);
                hover.pointer_over.insert(PointerOver::RESIZE);
            }
            HitTarget::GroupHeader(id) => {
                hover.group = Some(id);
                hover.pointer_over.insert(PointerOver::GROUP);
            }
            HitTarget::GroupBody(id) => hover.group = Some(id),
        }
        hover
    }

    /// Cursor for this hover state: resize beats node beats nothing
    pub fn cursor(&self, gesture: &Gesture) -> CursorIcon {
        if gesture.dragging_canvas() || gesture.dragging_items() {
            return CursorIcon::Grabbing;
        }
        let resizing = gesture.resizing_node() || gesture.resizing_group();
        if resizing || self.pointer_over.contains(PointerOver::RESIZE) {
            return CursorIcon::ResizeNwSe;
        }
        if gesture.connecting_links().is_some() || self.pointer_over.contains(PointerOver::SLOT) {
            return CursorIcon::Crosshair;
        }
        if self.pointer_over.contains(PointerOver::WIDGET)
            || self.pointer_over.contains(PointerOver::LINK)
        {
            return CursorIcon::PointingHand;
        }
        if self.pointer_over.contains(PointerOver::NODE)
            || self.pointer_over.contains(PointerOver::REROUTE)
            || self.pointer_over.contains(PointerOver::GROUP)
        {
            return CursorIcon::Grab;
        }
        CursorIcon::Default
    }
}
