// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link routing: the path, midpoint and midpoint angle of a link, in one of
//! three styles, optionally threaded through reroute waypoints.

use crate::geometry::{angle_between, bezier_point, distance, LinkDirection};
use crate::path::LinkPath;
use crate::settings::{CanvasSettings, LinkRenderMode};
use egui::{Pos2, Vec2};
use std::f32::consts::FRAC_PI_2;

/// Stub length of linear links
pub const LINEAR_STUB: f32 = 15.0;
/// Stub length of orthogonal links
pub const STRAIGHT_STUB: f32 = 10.0;
/// Vertical run below which an orthogonal link's angle stays horizontal
const STRAIGHT_ANGLE_DEAD_ZONE: f32 = 10.0;

/// A fixed endpoint of a link with its direction hint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEnd {
    /// Anchor position
    pub pos: Pos2,
    /// Direction the link leaves (or enters) the anchor
    pub dir: LinkDirection,
}

impl RouteEnd {
    /// Create an endpoint
    pub fn new(pos: Pos2, dir: LinkDirection) -> Self {
        Self { pos, dir }
    }
}

/// One routed segment
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedSegment {
    /// Stroke-able path
    pub path: LinkPath,
    /// Representative midpoint
    pub centre: Pos2,
    /// Angle of the path at the midpoint, radians
    pub centre_angle: f32,
}

/// A link routed through zero or more waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedLink {
    /// One segment per consecutive pair of points
    pub segments: Vec<RoutedSegment>,
    /// Unit tangent at each waypoint
    pub tangents: Vec<Vec2>,
}

/// Computes link geometry for a render mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkRouter {
    /// Routing style
    pub mode: LinkRenderMode,
    /// Bezier control distance as a fraction of the anchor distance
    pub spline_offset_factor: f32,
}

impl Default for LinkRouter {
    fn default() -> Self {
        Self::from_settings(&CanvasSettings::default())
    }
}

impl LinkRouter {
    /// Router using the settings' mode and offset factor
    pub fn from_settings(settings: &CanvasSettings) -> Self {
        Self {
            mode: settings.link_render_mode,
            spline_offset_factor: settings.spline_offset_factor,
        }
    }

    /// Router for a specific mode
    pub fn with_mode(mode: LinkRenderMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Route a single segment between two endpoints
    pub fn route(&self, start: RouteEnd, end: RouteEnd) -> Option<RoutedSegment> {
        self.route_directed(start.pos, start.dir.unit(), end.pos, end.dir.unit())
    }

    /// Route with explicit bezier control offsets, relative to each anchor
    pub fn route_with_controls(
        &self,
        start: Pos2,
        start_control: Vec2,
        end: Pos2,
        end_control: Vec2,
    ) -> Option<RoutedSegment> {
        if self.mode != LinkRenderMode::Spline {
            let (start_dir, end_dir) = (start_control.normalized(), end_control.normalized());
            return self.route_directed(start, start_dir, end, end_dir);
        }
        Some(spline_segment(start, start + start_control, end + end_control, end))
    }

    /// Route a segment whose ends leave along arbitrary unit directions
    pub fn route_directed(
        &self,
        start: Pos2,
        start_dir: Vec2,
        end: Pos2,
        end_dir: Vec2,
    ) -> Option<RoutedSegment> {
        match self.mode {
            LinkRenderMode::Spline => {
                let offset = distance(start, end) * self.spline_offset_factor;
                Some(spline_segment(start, start + start_dir * offset, end + end_dir * offset, end))
            }
            LinkRenderMode::Linear => Some(linear_segment(start, start_dir, end, end_dir)),
            LinkRenderMode::Straight => Some(straight_segment(start, start_dir, end, end_dir)),
            LinkRenderMode::Hidden => None,
        }
    }

    /// Route a link from `origin` through `waypoints` into `target`.
    ///
    /// Each waypoint's tangent is the direction from the point before it to
    /// the point after it; the segment leaving a waypoint starts along the
    /// tangent and the one entering it ends against it, so the curve does not
    /// kink at the waypoint.
    pub fn route_through(
        &self,
        origin: RouteEnd,
        waypoints: &[Pos2],
        target: RouteEnd,
    ) -> Option<RoutedLink> {
        if self.mode == LinkRenderMode::Hidden {
            return None;
        }
        let mut points = Vec::with_capacity(waypoints.len() + 2);
        points.push(origin.pos);
        points.extend_from_slice(waypoints);
        points.push(target.pos);

        let tangents: Vec<Vec2> = (1..points.len() - 1)
            .map(|i| {
                let t = (points[i + 1] - points[i - 1]).normalized();
                if t.is_finite() && t != Vec2::ZERO {
                    t
                } else {
                    Vec2::X
                }
            })
            .collect();

        let last = points.len() - 2;
        let mut segments = Vec::with_capacity(points.len() - 1);
        for k in 0..=last {
            let start_dir = if k == 0 { origin.dir.unit() } else { tangents[k - 1] };
            let end_dir = if k == last { target.dir.unit() } else { -tangents[k] };
            segments.extend(self.route_directed(points[k], start_dir, points[k + 1], end_dir));
        }
        Some(RoutedLink { segments, tangents })
    }
}

fn spline_segment(start: Pos2, c1: Pos2, c2: Pos2, end: Pos2) -> RoutedSegment {
    let mut path = LinkPath::new(start);
    path.cubic_to(c1, c2, end);
    let centre = bezier_point(0.5, start, c1, c2, end);
    let ahead = bezier_point(0.51, start, c1, c2, end);
    RoutedSegment {
        path,
        centre,
        centre_angle: angle_between(centre, ahead),
    }
}

fn linear_segment(start: Pos2, start_dir: Vec2, end: Pos2, end_dir: Vec2) -> RoutedSegment {
    let s1 = start + start_dir * LINEAR_STUB;
    let s2 = end + end_dir * LINEAR_STUB;
    let mut path = LinkPath::new(start);
    path.line_to(s1);
    path.line_to(s2);
    path.line_to(end);
    RoutedSegment {
        path,
        centre: s1.lerp(s2, 0.5),
        centre_angle: angle_between(s1, s2),
    }
}

fn straight_segment(start: Pos2, start_dir: Vec2, end: Pos2, end_dir: Vec2) -> RoutedSegment {
    let s1 = start + start_dir * STRAIGHT_STUB;
    let s2 = end + end_dir * STRAIGHT_STUB;
    let mid_x = (s1.x + s2.x) * 0.5;
    let mut path = LinkPath::new(start);
    path.line_to(s1);
    path.line_to(Pos2::new(mid_x, s1.y));
    path.line_to(Pos2::new(mid_x, s2.y));
    path.line_to(s2);
    path.line_to(end);

    let dy = s2.y - s1.y;
    let centre_angle = if dy > STRAIGHT_ANGLE_DEAD_ZONE {
        FRAC_PI_2
    } else if dy < -STRAIGHT_ANGLE_DEAD_ZONE {
        -FRAC_PI_2
    } else {
        0.0
    };
    RoutedSegment {
        path,
        centre: Pos2::new(mid_x, (s1.y + s2.y) * 0.5),
        centre_angle,
    }
}
