// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications from the canvas to its host.

use crate::model::group::GroupId;
use crate::model::link::LinkId;
use crate::model::node::NodeId;
use crate::model::reroute::RerouteId;
use crate::model::slot::{SlotKind, SlotType};
use crate::model::ItemId;
use crate::pointer::PointerEvent;
use crate::settings::LinkReleaseAction;
use egui::Pos2;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// The link end being dragged when a connection is released
#[derive(Debug, Clone, PartialEq)]
pub struct DraggedLinkEnd {
    /// Node the drag started from
    pub node: NodeId,
    /// Kind of the slot the drag started from
    pub kind: SlotKind,
    /// Slot index
    pub slot: usize,
    /// Type carried by the dragged link
    pub slot_type: SlotType,
    /// Reroute the new link would continue from
    pub after_reroute: Option<RerouteId>,
}

/// Event sent to the host
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// A group was double clicked
    GroupDoubleClick {
        /// Group
        group: GroupId,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// Empty canvas was double clicked
    EmptyDoubleClick {
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// A node was double clicked
    NodeDoubleClick {
        /// Node
        node: NodeId,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// A link was dropped onto a widget that accepts its type
    ConnectingToWidget {
        /// Dragged end
        link: DraggedLinkEnd,
        /// Node owning the widget
        node: NodeId,
        /// Widget index
        widget: usize,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// A new link was dropped on empty canvas. Preventing the default stops
    /// the follow-up [`CanvasEvent::LinkReleaseMenu`].
    EmptyRelease {
        /// Dragged ends
        links: Vec<DraggedLinkEnd>,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// Default follow-up of an unhandled [`CanvasEvent::EmptyRelease`]
    LinkReleaseMenu {
        /// Configured action
        action: LinkReleaseAction,
        /// Dragged ends
        links: Vec<DraggedLinkEnd>,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// Secondary-button click
    ContextMenu {
        /// Item under the pointer
        item: Option<ItemId>,
        /// Link under the pointer
        link: Option<LinkId>,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// A link stroke was clicked
    LinkClicked {
        /// Link
        link: LinkId,
        /// Graph position
        pos: Pos2,
        /// Pointer event that triggered it
        input: PointerEvent,
    },
    /// A widget was clicked or dragged and changed value
    WidgetActivated {
        /// Node owning the widget
        node: NodeId,
        /// Widget index
        widget: usize,
    },
}

/// Whether the canvas should run its default handling after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Run the default
    #[default]
    Continue,
    /// Skip the default
    PreventDefault,
}

/// Receives canvas events
pub trait CanvasHost {
    /// Handle an event
    fn on_event(&mut self, event: &CanvasEvent) -> Propagation;
}

/// Host that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl CanvasHost for NullHost {
    fn on_event(&mut self, _event: &CanvasEvent) -> Propagation {
        Propagation::Continue
    }
}

/// Host that queues events for later polling.
///
/// Clones share one queue, so the canvas can own one handle while the
/// application drains another.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Rc<RefCell<VecDeque<CanvasEvent>>>,
    prevent: Rc<RefCell<Vec<fn(&CanvasEvent) -> bool>>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent the default handling of events matching `filter`
    pub fn prevent_default_when(&self, filter: fn(&CanvasEvent) -> bool) {
        self.prevent.borrow_mut().push(filter);
    }

    /// Take all queued events
    pub fn drain(&self) -> Vec<CanvasEvent> {
        self.events.borrow_mut().drain(..).collect()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl CanvasHost for EventQueue {
    fn on_event(&mut self, event: &CanvasEvent) -> Propagation {
        self.events.borrow_mut().push_back(event.clone());
        if self.prevent.borrow().iter().any(|f| f(event)) {
            Propagation::PreventDefault
        } else {
            Propagation::Continue
        }
    }
}
