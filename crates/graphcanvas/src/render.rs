// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame production.
//!
//! Drawing is a pure function of the graph and canvas state, except for the
//! link pass, which writes each routed segment back into the render caches
//! on links and reroutes. Hit testing reads those caches, so a segment that
//! was culled or hidden this frame cannot be hovered.

use crate::canvas::GraphCanvas;
use crate::geometry::{overlap_bounding, LinkDirection};
use crate::interaction::DropTarget;
use crate::model::graph::Graph;
use crate::model::group::Group;
use crate::model::link::{LinkId, SegmentRender};
use crate::model::node::{Node, NODE_TITLE_HEIGHT};
use crate::model::reroute::{Reroute, RerouteId, REROUTE_RADIUS};
use crate::model::slot::{SlotKind, SlotShape};
use crate::model::widget::{WidgetKind, WidgetValue};
use crate::model::Positionable;
use crate::routing::{LinkRouter, RouteEnd, RoutedLink, RoutedSegment};
use crate::settings::{LinkMarkerShape, LinkRenderMode};
use crate::transform::DragAndScale;
use egui::{Color32, Pos2, Rect, Shape, Stroke, Vec2};

const GRID_MAJOR_EVERY: i64 = 5;
const MIN_GRID_SPACING: f32 = 4.0;
const MARKER_SIZE: f32 = 5.0;
const CULL_MARGIN: f32 = 20.0;

const GRID_MINOR: Color32 = Color32::from_rgba_premultiplied(24, 24, 24, 100);
const GRID_MAJOR: Color32 = Color32::from_rgba_premultiplied(47, 47, 47, 150);
const GROUP_FILL: Color32 = Color32::from_rgba_premultiplied(30, 35, 45, 60);
const NODE_BODY: Color32 = Color32::from_rgb(45, 45, 48);
const NODE_BODY_SELECTED: Color32 = Color32::from_rgb(60, 70, 90);
const NODE_TITLE: Color32 = Color32::from_rgb(70, 100, 130);
const SELECTION: Color32 = Color32::from_rgb(100, 150, 255);
const LINK: Color32 = Color32::from_rgb(155, 155, 155);
const LINK_HIGHLIGHTED: Color32 = Color32::from_rgb(230, 230, 230);
const SLOT_FREE: Color32 = Color32::from_rgb(80, 80, 100);
const SLOT_CONNECTED: Color32 = Color32::from_rgb(120, 200, 120);
const WIDGET_BG: Color32 = Color32::from_rgb(30, 30, 30);
const WIDGET_FG: Color32 = Color32::from_rgb(200, 200, 200);
const WIDGET_DISABLED: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 100);
const NODE_SHADOW: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 60);
const MARQUEE_FILL: Color32 = Color32::from_rgba_premultiplied(12, 18, 30, 30);

/// Which layers need redrawing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScheduler {
    dirty: bool,
    background_dirty: bool,
    last_frame_ms: Option<f64>,
    frame: u64,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    /// Scheduler with everything dirty
    pub fn new() -> Self {
        Self {
            dirty: true,
            background_dirty: true,
            last_frame_ms: None,
            frame: 0,
        }
    }

    /// The foreground changed
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// The view changed: both layers need drawing
    pub fn mark_all_dirty(&mut self) {
        self.dirty = true;
        self.background_dirty = true;
    }

    /// Whether anything needs drawing
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.background_dirty
    }

    /// Whether a frame should be produced at `now_ms`, given a minimum
    /// interval between frames
    pub fn should_draw(&self, now_ms: f64, interval_ms: Option<f64>) -> bool {
        if !self.is_dirty() {
            return false;
        }
        match (self.last_frame_ms, interval_ms) {
            (Some(last), Some(interval)) => now_ms - last >= interval,
            _ => true,
        }
    }

    fn finish(&mut self, now_ms: f64) -> u64 {
        self.dirty = false;
        self.background_dirty = false;
        self.last_frame_ms = Some(now_ms);
        self.frame += 1;
        self.frame
    }

    /// Number of frames produced
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// One produced frame, in canvas coordinates
#[derive(Debug, Clone)]
pub struct Frame {
    /// Shapes in paint order
    pub shapes: Vec<Shape>,
    /// Frame counter
    pub frame: u64,
    /// Graph-space area that was drawn
    pub visible_area: Rect,
    /// Number of links with at least one routed segment
    pub links_drawn: usize,
}

/// Options for a link pass
#[derive(Debug, Clone, Copy)]
pub struct LinkPass {
    /// Router to use
    pub router: LinkRouter,
    /// Area outside which segments are culled
    pub visible_area: Option<Rect>,
    /// Frame stamp written into the caches
    pub frame: u64,
}

/// Route every link and store the segments in the render caches.
///
/// A reroute shared by several links keeps whichever tangent and segment
/// was written last. Returns the links with at least one visible segment.
pub fn compute_link_paths(graph: &mut Graph, pass: LinkPass) -> Vec<LinkId> {
    let mut drawn = Vec::new();
    let link_ids: Vec<LinkId> = graph.link_ids().collect();

    for id in link_ids {
        let chain = graph.reroute_chain(id);
        let routed = route_link(graph, id, &chain, pass.router);

        let Some(routed) = routed else {
            clear_link(graph, id, &chain);
            continue;
        };

        for (reroute, tangent) in chain.iter().zip(&routed.tangents) {
            if let Some(r) = graph.reroute_mut(*reroute) {
                r.control_point = *tangent;
            }
        }

        let mut visible = false;
        for (k, segment) in routed.segments.into_iter().enumerate() {
            let keep = pass
                .visible_area
                .map_or(true, |area| {
                    overlap_bounding(area.expand(CULL_MARGIN), segment.path.control_bounds())
                });
            visible |= keep;
            let render = match chain.get(k) {
                Some(reroute) => graph.reroute_mut(*reroute).map(|r| &mut r.render),
                None => graph.link_mut(id).map(|l| &mut l.render),
            };
            if let Some(render) = render {
                if keep {
                    store(render, segment, pass.frame);
                } else {
                    render.clear();
                }
            }
        }
        if visible {
            drawn.push(id);
        }
    }
    drawn
}

fn route_link(
    graph: &Graph,
    id: LinkId,
    chain: &[RerouteId],
    router: LinkRouter,
) -> Option<RoutedLink> {
    let link = graph.link(id)?;
    let origin = graph.node(link.origin_id)?;
    let target = graph.node(link.target_id)?;
    let start = RouteEnd::new(
        origin.slot_pos(SlotKind::Output, link.origin_slot),
        slot_direction(origin, SlotKind::Output, link.origin_slot),
    );
    let end = RouteEnd::new(
        target.slot_pos(SlotKind::Input, link.target_slot),
        slot_direction(target, SlotKind::Input, link.target_slot),
    );
    let waypoints: Vec<Pos2> = chain
        .iter()
        .filter_map(|r| graph.reroute(*r))
        .map(Reroute::pos)
        .collect();
    router.route_through(start, &waypoints, end)
}

fn slot_direction(node: &Node, kind: SlotKind, index: usize) -> LinkDirection {
    node.slot(kind, index).map_or(
        match kind {
            SlotKind::Input => LinkDirection::Left,
            SlotKind::Output => LinkDirection::Right,
        },
        |s| s.direction(),
    )
}

fn clear_link(graph: &mut Graph, id: LinkId, chain: &[RerouteId]) {
    if let Some(link) = graph.link_mut(id) {
        link.render.clear();
    }
    for reroute in chain {
        if let Some(r) = graph.reroute_mut(*reroute) {
            r.render.clear();
        }
    }
}

fn store(render: &mut SegmentRender, segment: RoutedSegment, frame: u64) {
    render.centre = Some(segment.centre);
    render.centre_angle = segment.centre_angle;
    render.path = Some(segment.path);
    render.frame = frame;
}

struct Painter<'a> {
    transform: &'a DragAndScale,
    shapes: Vec<Shape>,
}

impl Painter<'_> {
    fn to_screen(&self, pos: Pos2) -> Pos2 {
        self.transform.to_canvas(pos)
    }

    fn rect(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max))
    }

    fn len(&self, value: f32) -> f32 {
        value * self.transform.scale
    }

    fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

impl GraphCanvas {
    /// Produce a frame if anything changed and the frame budget allows.
    ///
    /// Also refreshes the link render caches used by hit testing.
    pub fn draw(&mut self, graph: &mut Graph, now_ms: f64) -> Option<Frame> {
        if !self.scheduler.should_draw(now_ms, self.settings.frame_interval_ms()) {
            return None;
        }
        Some(self.draw_now(graph, now_ms))
    }

    /// Produce a frame unconditionally
    pub fn draw_now(&mut self, graph: &mut Graph, now_ms: f64) -> Frame {
        let frame = self.scheduler.finish(now_ms);
        let visible_area = self.transform.visible_area();
        let transform = self.transform;
        let mut painter = Painter {
            transform: &transform,
            shapes: Vec::new(),
        };

        self.draw_grid(&mut painter);
        for group in graph.groups() {
            draw_group(&mut painter, group);
        }

        let drawn = compute_link_paths(
            graph,
            LinkPass {
                router: LinkRouter::from_settings(&self.settings),
                visible_area: Some(visible_area),
                frame,
            },
        );
        self.draw_links(&mut painter, graph, &drawn);

        for reroute in graph.reroutes() {
            if overlap_bounding(visible_area, reroute.bounding()) {
                draw_reroute(&mut painter, reroute);
            }
        }
        for node in graph.nodes() {
            if overlap_bounding(visible_area, node.bounding()) {
                draw_node(&mut painter, node);
            }
        }

        self.draw_connecting(&mut painter, graph);
        if let Some(rect) = self.gesture.dragging_rectangle() {
            let rect = painter.rect(rect);
            painter.push(Shape::rect_filled(rect, 0.0, MARQUEE_FILL));
            painter.push(Shape::rect_stroke(rect, 0.0, Stroke::new(1.0, SELECTION)));
        }

        tracing::trace!(
            "Frame {} drew {} link(s), {} shape(s)",
            frame,
            drawn.len(),
            painter.shapes.len()
        );
        Frame {
            shapes: painter.shapes,
            frame,
            visible_area,
            links_drawn: drawn.len(),
        }
    }

    fn draw_grid(&self, painter: &mut Painter<'_>) {
        let spacing = painter.len(self.settings.grid_size);
        if spacing < MIN_GRID_SPACING {
            return;
        }
        let surface = Rect::from_min_size(Pos2::ZERO, self.transform.surface);
        let origin = painter.to_screen(Pos2::ZERO);

        let mut x = origin.x.rem_euclid(spacing);
        while x < surface.right() {
            let color = grid_color(x - origin.x, spacing);
            painter.push(Shape::line_segment(
                [Pos2::new(x, surface.top()), Pos2::new(x, surface.bottom())],
                Stroke::new(1.0, color),
            ));
            x += spacing;
        }
        let mut y = origin.y.rem_euclid(spacing);
        while y < surface.bottom() {
            let color = grid_color(y - origin.y, spacing);
            painter.push(Shape::line_segment(
                [Pos2::new(surface.left(), y), Pos2::new(surface.right(), y)],
                Stroke::new(1.0, color),
            ));
            y += spacing;
        }
    }

    fn draw_links(&self, painter: &mut Painter<'_>, graph: &Graph, drawn: &[LinkId]) {
        if self.settings.link_render_mode == LinkRenderMode::Hidden {
            return;
        }
        let moving = self.gesture.connecting_links();
        let width = painter.len(self.settings.connections_width);
        for id in drawn {
            if moving.is_some_and(|c| c.is_moving(*id)) {
                continue;
            }
            let color = if self.selection.is_link_highlighted(*id) {
                LINK_HIGHLIGHTED
            } else {
                LINK
            };
            let stroke = Stroke::new(width, color);
            let mut renders: Vec<&SegmentRender> = graph
                .reroute_chain(*id)
                .into_iter()
                .filter_map(|r| graph.reroute(r).map(|r| &r.render))
                .collect();
            renders.extend(graph.link(*id).map(|l| &l.render));

            for render in renders {
                let (Some(path), Some(centre)) = (&render.path, render.centre) else {
                    continue;
                };
                let shapes = path.to_shapes(stroke, |p| painter.to_screen(p));
                painter.shapes.extend(shapes);
                self.draw_marker(painter, centre, render.centre_angle, color);
            }
        }
    }

    fn draw_marker(&self, painter: &mut Painter<'_>, centre: Pos2, angle: f32, color: Color32) {
        let at = painter.to_screen(centre);
        let size = painter.len(MARKER_SIZE);
        match self.settings.link_marker {
            LinkMarkerShape::None => {}
            LinkMarkerShape::Circle => painter.push(Shape::circle_filled(at, size, color)),
            LinkMarkerShape::Arrow => {
                let dir = Vec2::angled(angle);
                let side = dir.rot90();
                painter.push(Shape::convex_polygon(
                    vec![
                        at + dir * size,
                        at - dir * size + side * size,
                        at - dir * size - side * size,
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
        }
    }

    fn draw_connecting(&self, painter: &mut Painter<'_>, graph: &Graph) {
        let Some(connector) = self.gesture.connecting_links() else {
            return;
        };
        let router = LinkRouter::from_settings(&self.settings);
        let router = if router.mode == LinkRenderMode::Hidden {
            LinkRouter::with_mode(LinkRenderMode::Spline)
        } else {
            router
        };
        let stroke = Stroke::new(painter.len(self.settings.connections_width), LINK_HIGHLIGHTED);
        let free_dir = connector.free_end_dir().unit();
        for end in &connector.links {
            let segment = match end.from {
                SlotKind::Output => {
                    router.route_directed(end.anchor, end.dir, connector.free_end, free_dir)
                }
                SlotKind::Input => {
                    router.route_directed(connector.free_end, free_dir, end.anchor, end.dir)
                }
            };
            if let Some(segment) = segment {
                let shapes = segment.path.to_shapes(stroke, |p| painter.to_screen(p));
                painter.shapes.extend(shapes);
            }
        }
        if let Some(DropTarget::Slot { node, kind, slot }) = self.hover.drop_target {
            if let Some(n) = graph.node(node) {
                let at = painter.to_screen(n.slot_pos(kind, slot));
                let radius = painter.len(7.0);
                painter.push(Shape::circle_stroke(at, radius, Stroke::new(2.0, SELECTION)));
            }
        }
    }
}

/// Every fifth line from the graph origin is a major line
fn grid_color(from_origin: f32, spacing: f32) -> Color32 {
    let line = (from_origin / spacing).round() as i64;
    if line.rem_euclid(GRID_MAJOR_EVERY) == 0 {
        GRID_MAJOR
    } else {
        GRID_MINOR
    }
}

fn draw_group(painter: &mut Painter<'_>, group: &Group) {
    let color = group
        .color
        .map_or(NODE_TITLE, |[r, g, b]| Color32::from_rgb(r, g, b));
    let rect = painter.rect(group.bounding());
    painter.push(Shape::rect_filled(rect, 4.0, GROUP_FILL));
    let header = painter.rect(group.header_rect());
    painter.push(Shape::rect_filled(header, 4.0, color.gamma_multiply(0.5)));
    let outline = if group.selected { SELECTION } else { color };
    painter.push(Shape::rect_stroke(rect, 4.0, Stroke::new(1.0, outline)));
}

fn draw_reroute(painter: &mut Painter<'_>, reroute: &Reroute) {
    let at = painter.to_screen(reroute.pos());
    let radius = painter.len(REROUTE_RADIUS);
    painter.push(Shape::circle_filled(at, radius, LINK));
    if reroute.selected {
        painter.push(Shape::circle_stroke(at, radius + 2.0, Stroke::new(2.0, SELECTION)));
    }
}

fn draw_node(painter: &mut Painter<'_>, node: &Node) {
    let [x, y] = node.pos;
    let title_color = node.color.map_or(NODE_TITLE, |[r, g, b]| Color32::from_rgb(r, g, b));
    let rounding = painter.len(4.0);

    if node.flags.collapsed {
        let band = Rect::from_min_size(
            Pos2::new(x, y - NODE_TITLE_HEIGHT),
            Vec2::new(node.collapsed_width(), NODE_TITLE_HEIGHT),
        );
        let band = painter.rect(band);
        painter.push(Shape::rect_filled(band, rounding, title_color));
        if node.selected {
            painter.push(Shape::rect_stroke(band, rounding, Stroke::new(2.0, SELECTION)));
        }
        return;
    }

    let body = painter.rect(Rect::from_min_size(Pos2::new(x, y), node.size()));
    let title = painter.rect(Rect::from_min_size(
        Pos2::new(x, y - NODE_TITLE_HEIGHT),
        Vec2::new(node.size[0], NODE_TITLE_HEIGHT),
    ));
    let fill = if node.selected { NODE_BODY_SELECTED } else { NODE_BODY };
    let shadow = body.translate(Vec2::splat(3.0));
    painter.push(Shape::rect_filled(shadow, rounding, NODE_SHADOW));
    painter.push(Shape::rect_filled(title, rounding, title_color));
    painter.push(Shape::rect_filled(body, rounding, fill));

    for (kind, slots) in [(SlotKind::Input, &node.inputs), (SlotKind::Output, &node.outputs)] {
        for (i, slot) in slots.iter().enumerate() {
            let at = painter.to_screen(node.slot_pos(kind, i));
            let color = if slot.is_connected() { SLOT_CONNECTED } else { SLOT_FREE };
            draw_slot(painter, at, slot.shape, slot.direction(), color);
        }
    }

    for (i, widget) in node.widgets.iter().enumerate() {
        let Some(rect) = node.widget_rect(i) else {
            continue;
        };
        let rect = painter.rect(rect);
        painter.push(Shape::rect_filled(rect, rounding, WIDGET_BG));
        match (&widget.kind, &widget.value) {
            (WidgetKind::Toggle, WidgetValue::Bool(on)) => {
                let knob = Pos2::new(rect.right() - rect.height() * 0.5, rect.center().y);
                let color = if *on { SLOT_CONNECTED } else { SLOT_FREE };
                painter.push(Shape::circle_filled(knob, rect.height() * 0.3, color));
            }
            (WidgetKind::Number { min, max, .. }, WidgetValue::Number(value)) if max > min => {
                let t = ((value - min) / (max - min)).clamp(0.0, 1.0) as f32;
                let filled =
                    Rect::from_min_size(rect.min, Vec2::new(rect.width() * t, rect.height()));
                painter.push(Shape::rect_filled(filled, rounding, WIDGET_FG.gamma_multiply(0.2)));
            }
            _ => {}
        }
        if widget.disabled {
            painter.push(Shape::rect_filled(rect, rounding, WIDGET_DISABLED));
        }
    }

    if node.selected {
        painter.push(Shape::rect_stroke(title.union(body), rounding, Stroke::new(2.0, SELECTION)));
    }
}

fn draw_slot(
    painter: &mut Painter<'_>,
    at: Pos2,
    shape: SlotShape,
    dir: LinkDirection,
    color: Color32,
) {
    let r = painter.len(4.0);
    match shape {
        SlotShape::Round => painter.push(Shape::circle_filled(at, r, color)),
        SlotShape::Box => {
            let rect = Rect::from_center_size(at, Vec2::splat(2.0 * r));
            painter.push(Shape::rect_filled(rect, 0.0, color));
        }
        SlotShape::Arrow => {
            let d = dir.unit();
            let side = d.rot90();
            painter.push(Shape::convex_polygon(
                vec![at + d * r, at - d * r + side * r, at - d * r - side * r],
                color,
                Stroke::NONE,
            ));
        }
    }
}
