// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pure geometry helpers shared by routing, hit-testing and selection.
//!
//! Everything here works in graph space unless the name says otherwise.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Direction a link leaves or enters a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LinkDirection {
    /// No preferred direction; control points sit on the anchor
    Center,
    /// Towards negative y
    Up,
    /// Towards positive y
    Down,
    /// Towards negative x
    Left,
    /// Towards positive x
    #[default]
    Right,
}

impl LinkDirection {
    /// Unit offset for this direction (zero for [`LinkDirection::Center`])
    pub fn unit(self) -> Vec2 {
        match self {
            Self::Center => Vec2::ZERO,
            Self::Up => Vec2::new(0.0, -1.0),
            Self::Down => Vec2::new(0.0, 1.0),
            Self::Left => Vec2::new(-1.0, 0.0),
            Self::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Inclusive point-in-rectangle test.
pub fn is_point_in_rect(point: Pos2, rect: Rect) -> bool {
    point.x >= rect.min.x && point.x <= rect.max.x && point.y >= rect.min.y && point.y <= rect.max.y
}

/// Strict overlap of two bounding boxes (touching edges do not overlap).
pub fn overlap_bounding(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Whether `outer` fully contains `inner`.
pub fn contains_rect(outer: Rect, inner: Rect) -> bool {
    inner.min.x >= outer.min.x
        && inner.max.x <= outer.max.x
        && inner.min.y >= outer.min.y
        && inner.max.y <= outer.max.y
}

/// Whether the centre of `inner` lies inside `outer`.
pub fn contains_centre(outer: Rect, inner: Rect) -> bool {
    is_point_in_rect(inner.center(), outer)
}

/// Euclidean distance.
pub fn distance(a: Pos2, b: Pos2) -> f32 {
    (b - a).length()
}

/// Rectangle spanned by two arbitrary corners.
pub fn normalized_rect(a: Pos2, b: Pos2) -> Rect {
    Rect::from_two_pos(a, b)
}

/// Round a scalar to the nearest multiple of `grid`. A non-positive grid leaves it untouched.
pub fn snap_scalar(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// Round a point to the nearest grid intersection.
pub fn snap_point(point: Pos2, grid: f32) -> Pos2 {
    Pos2::new(snap_scalar(point.x, grid), snap_scalar(point.y, grid))
}

/// Round a size up to whole grid cells.
pub fn snap_size_up(size: Vec2, grid: f32) -> Vec2 {
    if grid <= 0.0 {
        return size;
    }
    Vec2::new((size.x / grid).ceil() * grid, (size.y / grid).ceil() * grid)
}

/// Evaluate a cubic bezier at `t` by direct weighted sum.
pub fn bezier_point(t: f32, p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2) -> Pos2 {
    let mt = 1.0 - t;
    let c0 = mt * mt * mt;
    let c1 = 3.0 * mt * mt * t;
    let c2 = 3.0 * mt * t * t;
    let c3 = t * t * t;

    Pos2::new(
        c0 * p0.x + c1 * p1.x + c2 * p2.x + c3 * p3.x,
        c0 * p0.y + c1 * p1.y + c2 * p2.y + c3 * p3.y,
    )
}

/// Generate evenly spaced (in `t`) points along a cubic bezier.
pub fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|i| bezier_point(i as f32 / segments as f32, p0, p1, p2, p3))
        .collect()
}

/// Squared distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment_sq(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let ap = point - a;
    let len_sq = ab.length_sq();

    if len_sq < f32::EPSILON {
        return ap.length_sq();
    }

    let t = (ap.dot(ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (point - closest).length_sq()
}

/// Bounding rectangle of a set of points, if any.
pub fn bounding_of(points: &[Pos2]) -> Option<Rect> {
    let first = *points.first()?;
    Some(
        points
            .iter()
            .skip(1)
            .fold(Rect::from_min_max(first, first), |rect, p| {
                rect.union(Rect::from_min_max(*p, *p))
            }),
    )
}

/// Angle of the vector from `from` to `to`, in radians.
pub fn angle_between(from: Pos2, to: Pos2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
