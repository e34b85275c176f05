// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canvas: turns pointer and keyboard input into graph edits.
//!
//! Input arrives as [`PointerEvent`]s in physical surface pixels. Every press
//! is hit-tested and mapped to a [`Gesture`]; moves feed the gesture through
//! the [`PointerSession`] classifier; the release (or a cancel) takes the
//! gesture out and concludes it.
//!
//! Refused edits, such as connecting incompatible slots, leave the graph
//! untouched and are only logged at debug level.

use crate::connecting::{ConnectingLink, LinkConnector};
use crate::error::{CanvasError, Result};
use crate::events::{CanvasEvent, CanvasHost, NullHost, Propagation};
use crate::geometry::{
    contains_rect, is_point_in_rect, normalized_rect, overlap_bounding, snap_point, snap_size_up,
};
use crate::hit_test::{hit_test, HitOptions, HitTarget, NodePart, SegmentOwner};
use crate::interaction::{DropTarget, Gesture, HoverState};
use crate::model::clipboard::{self, ClipboardStore, MemoryClipboard};
use crate::model::graph::{Graph, RerouteSplice};
use crate::model::group::GroupId;
use crate::model::link::LinkId;
use crate::model::node::NodeId;
use crate::model::reroute::RerouteId;
use crate::model::slot::SlotKind;
use crate::model::widget::WidgetKind;
use crate::model::{ItemId, Positionable};
use crate::pointer::{PointerEvent, PointerRelease, PointerSession, PointerTransition};
use crate::render::FrameScheduler;
use crate::selection::{Selection, SelectionMode};
use crate::settings::{CanvasSettings, LinkReleaseAction};
use crate::transform::DragAndScale;
use egui::{CursorIcon, Key, Modifiers, PointerButton, Pos2, Rect, Vec2};
use std::mem;

/// How a cycle concluded
#[derive(Debug, Clone, Copy)]
struct Release {
    kind: PointerRelease,
    pos: Pos2,
    input: PointerEvent,
}

/// Interactive editor surface for one graph
pub struct GraphCanvas {
    pub(crate) settings: CanvasSettings,
    pub(crate) transform: DragAndScale,
    pub(crate) pointer: PointerSession,
    pub(crate) gesture: Gesture,
    pub(crate) selection: Selection,
    pub(crate) hover: HoverState,
    pub(crate) scheduler: FrameScheduler,
    host: Box<dyn CanvasHost>,
    clipboard: Box<dyn ClipboardStore>,
    last_graph_pos: Pos2,
    modifiers: Modifiers,
}

impl GraphCanvas {
    /// Create a canvas over a surface of `surface` logical pixels
    pub fn new(surface: Vec2, settings: CanvasSettings) -> Result<Self> {
        check_surface(surface)?;
        let settings = settings.sanitized();
        Ok(Self {
            transform: DragAndScale::new(surface)
                .with_limits(settings.min_scale, settings.max_scale),
            pointer: PointerSession::new((&settings).into()),
            gesture: Gesture::Idle,
            selection: Selection::new(settings.refcount_highlighted_links),
            hover: HoverState::default(),
            scheduler: FrameScheduler::new(),
            host: Box::new(NullHost),
            clipboard: Box::new(MemoryClipboard::new()),
            last_graph_pos: Pos2::ZERO,
            modifiers: Modifiers::NONE,
            settings,
        })
    }

    /// Deliver events to `host`
    pub fn with_host(mut self, host: Box<dyn CanvasHost>) -> Self {
        self.host = host;
        self
    }

    /// Use `store` for copy and paste
    pub fn with_clipboard(mut self, store: Box<dyn ClipboardStore>) -> Self {
        self.clipboard = store;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current settings
    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    /// Replace the settings
    pub fn set_settings(&mut self, settings: CanvasSettings) {
        let settings = settings.sanitized();
        self.pointer.thresholds = (&settings).into();
        self.transform.min_scale = settings.min_scale;
        self.transform.max_scale = settings.max_scale;
        self.settings = settings;
        self.scheduler.mark_all_dirty();
    }

    /// View transform
    pub fn transform(&self) -> &DragAndScale {
        &self.transform
    }

    /// Mutable view transform
    pub fn transform_mut(&mut self) -> &mut DragAndScale {
        self.scheduler.mark_all_dirty();
        &mut self.transform
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection
    pub fn selection_mut(&mut self) -> &mut Selection {
        self.scheduler.mark_dirty();
        &mut self.selection
    }

    /// Gesture in progress
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Hover state from the last pointer event
    pub fn hover(&self) -> &HoverState {
        &self.hover
    }

    /// Cursor to show
    pub fn cursor(&self) -> CursorIcon {
        self.hover.cursor(&self.gesture)
    }

    /// Graph position of the last pointer event
    pub fn last_pointer_pos(&self) -> Pos2 {
        self.last_graph_pos
    }

    /// Resize the drawing surface
    pub fn resize(&mut self, surface: Vec2) -> Result<()> {
        check_surface(surface)?;
        self.transform.resize(surface);
        self.scheduler.mark_all_dirty();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    fn to_canvas_space(&self, physical: Pos2) -> Pos2 {
        let ratio = self.settings.device_pixel_ratio;
        Pos2::new(physical.x / ratio, physical.y / ratio)
    }

    fn hit_options(&self) -> HitOptions {
        HitOptions {
            link_width: self.settings.connections_width,
        }
    }

    fn snap_active(&self, modifiers: Modifiers) -> bool {
        self.settings.always_snap_to_grid || modifiers.shift
    }

    fn emit(&mut self, event: CanvasEvent) -> Propagation {
        tracing::debug!("Canvas event: {:?}", event);
        self.host.on_event(&event)
    }

    fn locate(&mut self, event: &PointerEvent) -> (Pos2, Pos2) {
        let canvas_pos = self.to_canvas_space(event.pos);
        let pos = self.transform.to_graph(canvas_pos);
        self.last_graph_pos = pos;
        self.modifiers = event.modifiers;
        (canvas_pos, pos)
    }

    /// Handle a button press
    pub fn pointer_down(&mut self, graph: &mut Graph, event: PointerEvent) {
        let (canvas_pos, pos) = self.locate(&event);
        if self.pointer.is_down() {
            tracing::debug!("Ignoring {:?} press while another button is held", event.button);
            return;
        }
        if !self.gesture.is_idle() {
            self.pointer_cancel(graph);
        }
        self.scheduler.mark_dirty();

        match event.button {
            // Context presses never start a pointer cycle
            PointerButton::Secondary => {
                self.context_press(graph, event, pos);
                return;
            }
            PointerButton::Extra1 | PointerButton::Extra2 => return,
            PointerButton::Primary | PointerButton::Middle => {}
        }

        self.pointer.down(event);
        self.gesture = if event.button == PointerButton::Middle || self.settings.read_only {
            Gesture::PanningCanvas { last: canvas_pos }
        } else {
            let hit = hit_test(graph, pos, &self.hit_options());
            self.begin_primary(graph, hit, event.modifiers, pos, canvas_pos)
        };
        tracing::debug!("Gesture started: {}", self.gesture.name());
    }

    /// Handle pointer movement
    pub fn pointer_move(&mut self, graph: &mut Graph, event: PointerEvent) {
        let (canvas_pos, pos) = self.locate(&event);
        let transition = self.pointer.pointer_move(event, self.gesture.wants_drag());
        if transition == PointerTransition::DragStart {
            self.start_drag(graph);
            tracing::debug!("Drag started: {}", self.gesture.name());
        }
        if transition != PointerTransition::None {
            self.drag(graph, pos, canvas_pos, event.modifiers);
        }
        match &mut self.gesture {
            Gesture::Connecting { connector, .. } => {
                connector.free_end = pos;
                self.scheduler.mark_dirty();
            }
            Gesture::Marquee { current, .. } => {
                *current = pos;
                self.scheduler.mark_dirty();
            }
            _ => {}
        }
        self.update_hover(graph, pos);
    }

    /// Handle a button release
    pub fn pointer_up(&mut self, graph: &mut Graph, event: PointerEvent) {
        let (_, pos) = self.locate(&event);
        if !self.pointer.is_held(event.button) {
            tracing::debug!("Ignoring {:?} release outside its press cycle", event.button);
            self.update_hover(graph, pos);
            return;
        }
        let kind = self.pointer.up(event);
        let gesture = mem::take(&mut self.gesture);
        let release = Release {
            kind,
            pos,
            input: event,
        };
        self.finish_gesture(graph, gesture, Some(release));
        self.update_hover(graph, pos);
    }

    /// Abort the current cycle, running its cleanup
    pub fn pointer_cancel(&mut self, graph: &mut Graph) {
        let active = self.pointer.cancel();
        let gesture = mem::take(&mut self.gesture);
        if active || !gesture.is_idle() {
            self.finish_gesture(graph, gesture, None);
        }
    }

    /// The surface lost focus
    pub fn focus_lost(&mut self, graph: &mut Graph) {
        self.pointer_cancel(graph);
        self.modifiers = Modifiers::NONE;
    }

    /// Zoom around the pointer. Positive `delta` zooms in.
    pub fn wheel(&mut self, physical_pos: Pos2, delta: f32) {
        let factor = if delta > 0.0 {
            self.settings.zoom_speed
        } else if delta < 0.0 {
            1.0 / self.settings.zoom_speed
        } else {
            return;
        };
        let canvas_pos = self.to_canvas_space(physical_pos);
        self.transform.change_delta_scale(factor, canvas_pos);
        self.last_graph_pos = self.transform.to_graph(canvas_pos);
        self.scheduler.mark_all_dirty();
    }

    fn context_press(&mut self, graph: &mut Graph, input: PointerEvent, pos: Pos2) {
        let hit = hit_test(graph, pos, &self.hit_options());
        let item = match hit {
            HitTarget::Node { node, .. } => Some(ItemId::Node(node)),
            HitTarget::Reroute(id) => Some(ItemId::Reroute(id)),
            HitTarget::GroupResize(id) | HitTarget::GroupHeader(id) | HitTarget::GroupBody(id) => {
                Some(ItemId::Group(id))
            }
            HitTarget::Link { .. } | HitTarget::Empty => None,
        };
        let link = match hit {
            HitTarget::Link { link, .. } => Some(link),
            _ => None,
        };
        if let Some(item) = item {
            self.selection.select(graph, item);
        }
        self.emit(CanvasEvent::ContextMenu {
            item,
            link,
            pos,
            input,
        });
    }

    fn begin_primary(
        &mut self,
        graph: &mut Graph,
        hit: HitTarget,
        m: Modifiers,
        pos: Pos2,
        canvas_pos: Pos2,
    ) -> Gesture {
        match hit {
            HitTarget::Empty => begin_empty(m, pos, canvas_pos, None),
            HitTarget::GroupBody(group) => begin_empty(m, pos, canvas_pos, Some(group)),
            HitTarget::GroupResize(group) => {
                let Some(start_size) = graph.group(group).map(|g| g.size()) else {
                    return Gesture::Idle;
                };
                graph.before_change();
                Gesture::ResizingGroup {
                    group,
                    start: pos,
                    start_size,
                }
            }
            HitTarget::GroupHeader(group) => Gesture::PressingGroup {
                group,
                start: pos,
                toggle: m.shift || m.ctrl || m.command,
            },
            HitTarget::Node { node, part } => self.begin_node(graph, node, part, m, pos),
            HitTarget::Reroute(reroute) => self.begin_reroute(graph, reroute, m, pos),
            HitTarget::Link { link, segment } => self.begin_link(graph, link, segment, m, pos),
        }
    }

    fn begin_node(
        &mut self,
        graph: &mut Graph,
        node: NodeId,
        part: NodePart,
        m: Modifiers,
        pos: Pos2,
    ) -> Gesture {
        graph.bring_to_front(node);
        let pressing = Gesture::PressingNode {
            node,
            part,
            start: pos,
            toggle: m.shift || m.ctrl || m.command,
            clone_on_drag: m.alt,
        };
        match part {
            NodePart::Resize => {
                let Some(n) = graph.node(node).filter(|n| !n.flags.pinned) else {
                    return pressing;
                };
                let start_size = n.size();
                graph.before_change();
                Gesture::ResizingNode {
                    node,
                    start: pos,
                    start_size,
                }
            }
            NodePart::Output(slot) => {
                let links = graph
                    .node(node)
                    .and_then(|n| n.output(slot))
                    .map(|s| s.links.clone())
                    .unwrap_or_default();
                let ends: Vec<ConnectingLink> = if m.shift && !links.is_empty() {
                    links
                        .iter()
                        .filter_map(|l| ConnectingLink::from_link_target(graph, *l))
                        .collect()
                } else {
                    slot_end(graph, node, SlotKind::Output, slot)
                };
                connecting(ends, pos, false)
            }
            NodePart::Input(slot) => self.begin_input(graph, node, slot, m, pos),
            NodePart::Widget(widget) => Gesture::Widget {
                node,
                widget,
                last_x: pos.x,
                dragged: false,
                changed: false,
            },
            NodePart::CollapseToggle | NodePart::Body => pressing,
        }
    }

    fn begin_input(
        &mut self,
        graph: &mut Graph,
        node: NodeId,
        slot: usize,
        m: Modifiers,
        pos: Pos2,
    ) -> Gesture {
        let link = graph.node(node).and_then(|n| n.input(slot)).and_then(|s| s.link);
        let Some(link) = link else {
            return connecting(slot_end(graph, node, SlotKind::Input, slot), pos, false);
        };

        if self.settings.click_do_break_link_to || (m.ctrl && m.alt) {
            graph.before_change();
            graph.disconnect_input(node, slot);
            graph.after_change();
            self.selection.prune(graph);
            return Gesture::Idle;
        }

        if m.shift || self.settings.allow_reconnect_links {
            let parent = graph.link(link).and_then(|l| l.parent_id);
            let fallback = graph.link(link).and_then(|l| {
                ConnectingLink::from_slot(graph, l.origin_id, SlotKind::Output, l.origin_slot)
            });
            let Some(mut end) = ConnectingLink::from_link_origin(graph, link, parent) else {
                return Gesture::Idle;
            };
            if m.shift {
                return connecting(vec![end], pos, false);
            }
            graph.before_change();
            graph.disconnect_input(node, slot);
            if end.after_reroute.is_some_and(|r| graph.reroute(r).is_none()) {
                if let Some(fallback) = fallback {
                    end = ConnectingLink {
                        slot_type: end.slot_type,
                        ..fallback
                    };
                }
            }
            return connecting(vec![end], pos, true);
        }

        connecting(slot_end(graph, node, SlotKind::Input, slot), pos, false)
    }

    fn begin_reroute(
        &mut self,
        graph: &mut Graph,
        reroute: RerouteId,
        m: Modifiers,
        pos: Pos2,
    ) -> Gesture {
        if m.shift {
            let link = graph.reroute(reroute).and_then(|r| r.link_ids.first().copied());
            let ends = link
                .and_then(|l| ConnectingLink::from_link_origin(graph, l, Some(reroute)))
                .into_iter()
                .collect();
            return connecting(ends, pos, false);
        }
        if m.alt {
            return self.spawn_reroute(graph, pos, RerouteSplice::After(reroute));
        }
        if !self.selection.is_selected(ItemId::Reroute(reroute)) {
            self.selection.select_only(graph, ItemId::Reroute(reroute));
        }
        Gesture::PressingReroute { reroute, start: pos }
    }

    fn begin_link(
        &mut self,
        graph: &mut Graph,
        link: LinkId,
        segment: SegmentOwner,
        m: Modifiers,
        pos: Pos2,
    ) -> Gesture {
        if m.alt {
            return self.spawn_reroute(graph, pos, segment.splice());
        }
        if m.shift {
            let after = segment.start_reroute(graph);
            let ends = ConnectingLink::from_link_origin(graph, link, after).into_iter().collect();
            return connecting(ends, pos, false);
        }
        Gesture::PressingLink { link, segment }
    }

    /// Create a reroute under the pointer and start dragging it
    fn spawn_reroute(&mut self, graph: &mut Graph, pos: Pos2, splice: RerouteSplice) -> Gesture {
        graph.before_change();
        match graph.create_reroute(pos, splice) {
            Ok(id) => {
                self.selection.select_only(graph, ItemId::Reroute(id));
                Gesture::DraggingItems {
                    items: vec![ItemId::Reroute(id)],
                    last: pos,
                }
            }
            Err(e) => {
                tracing::debug!("Could not create reroute: {e}");
                graph.after_change();
                Gesture::Idle
            }
        }
    }

    fn start_drag(&mut self, graph: &mut Graph) {
        let gesture = mem::take(&mut self.gesture);
        self.gesture = match gesture {
            Gesture::PressingEmpty { last, .. } => Gesture::PanningCanvas { last },
            Gesture::PressingNode {
                node,
                start,
                clone_on_drag,
                ..
            } => {
                graph.before_change();
                let dragged = if clone_on_drag {
                    graph.clone_node(node).unwrap_or(node)
                } else {
                    node
                };
                if dragged != node || !self.selection.is_selected(ItemId::Node(node)) {
                    self.selection.select_only(graph, ItemId::Node(dragged));
                }
                self.dragging(graph, start)
            }
            Gesture::PressingGroup { group, start, .. } => {
                graph.before_change();
                if !self.selection.is_selected(ItemId::Group(group)) {
                    self.selection.select_only(graph, ItemId::Group(group));
                }
                self.dragging(graph, start)
            }
            Gesture::PressingReroute { start, .. } => {
                graph.before_change();
                self.dragging(graph, start)
            }
            Gesture::Widget { node, widget, last_x, .. } => {
                graph.before_change();
                Gesture::Widget {
                    node,
                    widget,
                    last_x,
                    dragged: true,
                    changed: false,
                }
            }
            other => other,
        };
    }

    fn dragging(&mut self, graph: &mut Graph, start: Pos2) -> Gesture {
        Gesture::DraggingItems {
            items: self.selection.selected_items(graph).into_iter().collect(),
            last: start,
        }
    }

    fn drag(&mut self, graph: &mut Graph, pos: Pos2, canvas_pos: Pos2, modifiers: Modifiers) {
        let snap = self.snap_active(modifiers);
        let grid = self.settings.grid_size;
        match &mut self.gesture {
            Gesture::PanningCanvas { last } => {
                self.transform.pan_by(canvas_pos - *last);
                *last = canvas_pos;
                self.scheduler.mark_all_dirty();
            }
            Gesture::DraggingItems { items, last } => {
                let delta = pos - *last;
                for item in items.iter() {
                    graph.move_item(*item, delta, true);
                }
                *last = pos;
            }
            Gesture::ResizingNode { node, start, start_size } => {
                let mut size = *start_size + (pos - *start);
                if snap {
                    size = snap_size_up(size, grid);
                }
                if let Some(n) = graph.node_mut(*node) {
                    n.set_size(size);
                }
            }
            Gesture::ResizingGroup { group, start, start_size } => {
                let mut size = *start_size + (pos - *start);
                if snap {
                    size = snap_size_up(size, grid);
                }
                if let Some(g) = graph.group_mut(*group) {
                    g.set_size(size);
                }
            }
            Gesture::Widget {
                node,
                widget,
                last_x,
                changed,
                ..
            } => {
                let dx = pos.x - *last_x;
                *last_x = pos.x;
                if let Some(w) = graph.node_mut(*node).and_then(|n| n.widgets.get_mut(*widget)) {
                    *changed |= w.drag(dx);
                }
            }
            _ => {}
        }
        self.scheduler.mark_dirty();
    }

    fn finish_gesture(&mut self, graph: &mut Graph, gesture: Gesture, release: Option<Release>) {
        tracing::debug!("Gesture finished: {} ({:?})", gesture.name(), release.map(|r| r.kind));
        let click = release.filter(|r| r.kind.is_click());
        let double = click.is_some_and(|r| r.kind == PointerRelease::DoubleClick);

        match gesture {
            Gesture::Idle | Gesture::PanningCanvas { .. } | Gesture::PressingReroute { .. } => {}
            Gesture::PressingEmpty { group, .. } => {
                if let Some(r) = click {
                    match (double, group) {
                        (true, Some(group)) => {
                            self.emit(CanvasEvent::GroupDoubleClick {
                                group,
                                pos: r.pos,
                                input: r.input,
                            });
                        }
                        (true, None) => {
                            self.emit(CanvasEvent::EmptyDoubleClick {
                                pos: r.pos,
                                input: r.input,
                            });
                        }
                        (false, _) => self.selection.deselect_all(graph, None),
                    }
                }
            }
            Gesture::PressingNode { node, part, toggle, .. } => {
                if let Some(r) = click {
                    self.click_node(graph, node, part, toggle, double, r);
                }
            }
            Gesture::DraggingItems { items, .. } => {
                if release.is_some_and(|r| self.snap_active(r.input.modifiers)) {
                    self.snap_items(graph, &items);
                }
                graph.after_change();
            }
            Gesture::ResizingNode { .. } | Gesture::ResizingGroup { .. } => graph.after_change(),
            Gesture::Connecting { connector, bracket_open } => {
                if let Some(r) = release {
                    self.drop_links(graph, &connector, r);
                }
                if bracket_open {
                    graph.after_change();
                }
                self.selection.prune(graph);
                self.selection.refresh_links(graph);
            }
            Gesture::Marquee { start, current, mode } => {
                if release.is_some() {
                    self.apply_marquee(graph, normalized_rect(start, current), mode);
                }
            }
            Gesture::PressingGroup { group, toggle, .. } => {
                if let Some(r) = click {
                    self.click_group(graph, group, toggle, double, r);
                }
            }
            Gesture::PressingLink { link, .. } => {
                if let Some(r) = click {
                    self.emit(CanvasEvent::LinkClicked {
                        link,
                        pos: r.pos,
                        input: r.input,
                    });
                }
            }
            Gesture::Widget {
                node,
                widget,
                dragged,
                changed,
                ..
            } => {
                if dragged {
                    graph.after_change();
                    if changed {
                        self.emit(CanvasEvent::WidgetActivated { node, widget });
                    }
                } else if let Some(r) = click {
                    self.click_widget(graph, node, widget, r.pos);
                }
            }
        }

        self.hover.drop_target = None;
        self.scheduler.mark_dirty();
    }

    fn click_node(
        &mut self,
        graph: &mut Graph,
        node: NodeId,
        part: NodePart,
        toggle: bool,
        double: bool,
        release: Release,
    ) {
        if part == NodePart::CollapseToggle {
            graph.before_change();
            if let Some(n) = graph.node_mut(node) {
                n.collapse();
            }
            graph.after_change();
            return;
        }
        if double {
            self.selection.select_only(graph, ItemId::Node(node));
            self.emit(CanvasEvent::NodeDoubleClick {
                node,
                pos: release.pos,
                input: release.input,
            });
        } else if toggle {
            self.selection.toggle(graph, ItemId::Node(node));
        } else {
            self.selection.select_only(graph, ItemId::Node(node));
        }
    }

    fn click_group(
        &mut self,
        graph: &mut Graph,
        group: GroupId,
        toggle: bool,
        double: bool,
        release: Release,
    ) {
        if double {
            self.emit(CanvasEvent::GroupDoubleClick {
                group,
                pos: release.pos,
                input: release.input,
            });
        } else if toggle {
            self.selection.toggle(graph, ItemId::Group(group));
        } else {
            self.selection.select_only(graph, ItemId::Group(group));
        }
    }

    fn click_widget(&mut self, graph: &mut Graph, node: NodeId, widget: usize, pos: Pos2) {
        let Some(rect) = graph.node(node).and_then(|n| n.widget_rect(widget)) else {
            return;
        };
        let fraction = ((pos.x - rect.min.x) / rect.width().max(1.0)).clamp(0.0, 1.0);
        graph.before_change();
        let activated = graph
            .node_mut(node)
            .and_then(|n| n.widgets.get_mut(widget))
            .is_some_and(|w| w.click(fraction) || (w.kind == WidgetKind::Button && !w.disabled));
        graph.after_change();
        if activated {
            self.emit(CanvasEvent::WidgetActivated { node, widget });
        }
    }

    fn snap_items(&self, graph: &mut Graph, items: &[ItemId]) {
        let grid = self.settings.grid_size;
        for item in items {
            if let Some(pos) = graph.item_pos(*item) {
                graph.set_item_pos(*item, snap_point(pos, grid));
            }
        }
    }

    fn drop_links(&mut self, graph: &mut Graph, connector: &LinkConnector, release: Release) {
        if connector.is_empty() {
            return;
        }
        let hit = hit_test(graph, release.pos, &self.hit_options());
        let HitTarget::Node { node, part } = hit else {
            self.release_on_empty(connector, release);
            return;
        };

        graph.before_change();
        let made = match part {
            NodePart::Input(slot) => connector.drop_on_slot(graph, node, SlotKind::Input, slot),
            NodePart::Output(slot) => connector.drop_on_slot(graph, node, SlotKind::Output, slot),
            NodePart::Widget(widget) => {
                let link_type = graph
                    .node(node)
                    .and_then(|n| n.widgets.get(widget))
                    .and_then(|w| w.link_type.clone());
                match link_type.as_ref().and_then(|t| connector.end_for_widget(t)) {
                    Some(end) => {
                        let link = end.dragged_end();
                        self.emit(CanvasEvent::ConnectingToWidget {
                            link,
                            node,
                            widget,
                            input: release.input,
                        });
                        0
                    }
                    None => connector.drop_on_node(graph, node),
                }
            }
            NodePart::CollapseToggle | NodePart::Resize | NodePart::Body => {
                connector.drop_on_node(graph, node)
            }
        };
        graph.after_change();
        tracing::debug!("Dropped {} of {} link(s) on {:?}", made, connector.links.len(), node);
    }

    fn release_on_empty(&mut self, connector: &LinkConnector, release: Release) {
        let Release { pos, input, .. } = release;
        let links = connector.dragged_ends();
        let propagation = self.emit(CanvasEvent::EmptyRelease {
            links: links.clone(),
            pos,
            input,
        });
        let action = self.settings.link_release_on_empty;
        if propagation == Propagation::Continue && action != LinkReleaseAction::Nothing {
            self.emit(CanvasEvent::LinkReleaseMenu {
                action,
                links,
                pos,
                input,
            });
        }
    }

    fn apply_marquee(&mut self, graph: &mut Graph, rect: Rect, mode: SelectionMode) {
        let mut batch: Vec<ItemId> = graph
            .nodes()
            .filter(|n| overlap_bounding(rect, n.bounding()))
            .map(|n| ItemId::Node(n.id))
            .collect();
        batch.extend(
            graph
                .groups()
                .filter(|g| contains_rect(rect, g.bounding()))
                .map(|g| ItemId::Group(g.id)),
        );
        batch.extend(
            graph
                .reroutes()
                .filter(|r| is_point_in_rect(r.pos(), rect))
                .map(|r| ItemId::Reroute(r.id)),
        );
        tracing::debug!("Marquee {:?} caught {} item(s)", rect, batch.len());
        self.selection.apply(graph, &batch, mode);
    }

    fn update_hover(&mut self, graph: &Graph, pos: Pos2) {
        let hit = hit_test(graph, pos, &self.hit_options());
        let mut hover = HoverState::from_hit(hit);
        hover.drop_target = match &self.gesture {
            Gesture::Connecting { connector, .. } => match hit {
                HitTarget::Node { node, part } => match part.slot() {
                    Some((kind, slot)) => connector
                        .is_valid_target(graph, node, kind, slot)
                        .then_some(DropTarget::Slot { node, kind, slot }),
                    None => connector
                        .best_slot_on(graph, node)
                        .map(|(kind, slot)| DropTarget::Slot { node, kind, slot }),
                },
                _ => None,
            },
            Gesture::DraggingItems { items, .. } if self.snap_active(self.modifiers) => items
                .iter()
                .find_map(|item| match item {
                    ItemId::Node(id) => graph.node(*id),
                    _ => None,
                })
                .map(|n| {
                    let snapped = snap_point(n.pos(), self.settings.grid_size);
                    DropTarget::Snapped(n.bounding().translate(snapped - n.pos()))
                }),
            _ => None,
        };
        if hover != self.hover {
            self.scheduler.mark_dirty();
        }
        self.hover = hover;
    }

    // ------------------------------------------------------------------
    // Keyboard
    // ------------------------------------------------------------------

    /// Handle a key press. Returns `true` if the key was used.
    pub fn key_down(&mut self, graph: &mut Graph, key: Key, modifiers: Modifiers) -> bool {
        self.modifiers = modifiers;
        if key == Key::Escape {
            let active = self.pointer.is_down() || !self.gesture.is_idle();
            self.pointer_cancel(graph);
            return active;
        }
        if self.pointer.is_down() {
            return false;
        }
        let command = modifiers.command || modifiers.ctrl;
        let handled = match key {
            Key::Delete | Key::Backspace => self.delete_selected(graph),
            Key::A if command => {
                self.selection.select_all(graph);
                true
            }
            Key::C if command => self.copy(graph),
            Key::V if command => self.paste(graph, modifiers.shift),
            Key::Z if command && modifiers.shift => self.redo(graph),
            Key::Z if command => self.undo(graph),
            Key::Y if command => self.redo(graph),
            _ => false,
        };
        if handled {
            self.scheduler.mark_dirty();
        }
        handled
    }

    /// Remove every selected item
    pub fn delete_selected(&mut self, graph: &mut Graph) -> bool {
        if self.settings.read_only || self.selection.is_empty() {
            return false;
        }
        let items: Vec<ItemId> = self.selection.items().iter().copied().collect();
        graph.before_change();
        for item in &items {
            graph.remove_item(*item);
        }
        graph.after_change();
        self.selection.prune(graph);
        tracing::debug!("Deleted {} item(s)", items.len());
        true
    }

    /// Copy the selection to the clipboard
    pub fn copy(&mut self, graph: &Graph) -> bool {
        let items: Vec<ItemId> = self.selection.items().iter().copied().collect();
        match clipboard::copy_to(self.clipboard.as_mut(), graph, &items) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Copy failed: {e}");
                false
            }
        }
    }

    /// Paste the clipboard at the pointer and select the pasted items
    pub fn paste(&mut self, graph: &mut Graph, keep_external_links: bool) -> bool {
        if self.settings.read_only {
            return false;
        }
        graph.before_change();
        let at = self.last_graph_pos;
        let result =
            clipboard::paste_from(self.clipboard.as_ref(), graph, at, keep_external_links);
        graph.after_change();
        match result {
            Ok(items) => {
                self.selection.apply(graph, &items, SelectionMode::Replace);
                true
            }
            Err(e) => {
                tracing::debug!("Paste failed: {e}");
                false
            }
        }
    }

    /// Undo the last change
    pub fn undo(&mut self, graph: &mut Graph) -> bool {
        if self.settings.read_only {
            return false;
        }
        match graph.undo() {
            Ok(()) => {
                self.selection.sync_from_graph(graph);
                true
            }
            Err(e) => {
                tracing::debug!("Undo unavailable: {e}");
                false
            }
        }
    }

    /// Redo the last undone change
    pub fn redo(&mut self, graph: &mut Graph) -> bool {
        if self.settings.read_only {
            return false;
        }
        match graph.redo() {
            Ok(()) => {
                self.selection.sync_from_graph(graph);
                true
            }
            Err(e) => {
                tracing::debug!("Redo unavailable: {e}");
                false
            }
        }
    }
}

fn check_surface(surface: Vec2) -> Result<()> {
    if surface.x > 0.0 && surface.y > 0.0 && surface.is_finite() {
        Ok(())
    } else {
        Err(CanvasError::InvalidSurface {
            width: surface.x,
            height: surface.y,
        })
    }
}

fn begin_empty(m: Modifiers, pos: Pos2, canvas_pos: Pos2, group: Option<GroupId>) -> Gesture {
    if m.ctrl || m.command {
        let mode = if m.shift {
            SelectionMode::Add
        } else if m.alt {
            SelectionMode::Subtract
        } else {
            SelectionMode::Replace
        };
        return Gesture::Marquee {
            start: pos,
            current: pos,
            mode,
        };
    }
    Gesture::PressingEmpty { last: canvas_pos, group }
}

fn slot_end(graph: &Graph, node: NodeId, kind: SlotKind, slot: usize) -> Vec<ConnectingLink> {
    ConnectingLink::from_slot(graph, node, kind, slot).into_iter().collect()
}

fn connecting(ends: Vec<ConnectingLink>, pos: Pos2, bracket_open: bool) -> Gesture {
    if ends.is_empty() {
        return Gesture::Idle;
    }
    Gesture::Connecting {
        connector: LinkConnector::new(ends, pos),
        bracket_open,
    }
}
