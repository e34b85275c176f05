// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stroke-able link paths.
//!
//! A [`LinkPath`] is the routing engine's output: a start point followed by
//! straight or cubic pieces. It can be turned into `egui` shapes for painting
//! and queried with a stroke-width aware point test for hovering.

use crate::geometry::{bezier_points, bounding_of, distance_to_segment_sq};
use egui::epaint::CubicBezierShape;
use egui::{Color32, Pos2, Rect, Shape, Stroke};

/// Samples per cubic piece when flattening for hit tests.
const CURVE_SAMPLES: usize = 24;

/// One piece of a path after the start point
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Straight line to the point
    LineTo(Pos2),
    /// Cubic bezier with two control points
    CubicTo(Pos2, Pos2, Pos2),
}

/// A renderable, hit-testable path in graph space
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPath {
    start: Pos2,
    commands: Vec<PathCommand>,
}

impl LinkPath {
    /// Start a new path
    pub fn new(start: Pos2) -> Self {
        Self {
            start,
            commands: Vec::new(),
        }
    }

    /// Append a straight piece
    pub fn line_to(&mut self, to: Pos2) {
        self.commands.push(PathCommand::LineTo(to));
    }

    /// Append a cubic piece
    pub fn cubic_to(&mut self, c1: Pos2, c2: Pos2, to: Pos2) {
        self.commands.push(PathCommand::CubicTo(c1, c2, to));
    }

    /// First point of the path
    pub fn start(&self) -> Pos2 {
        self.start
    }

    /// Last point of the path
    pub fn end(&self) -> Pos2 {
        match self.commands.last() {
            Some(PathCommand::LineTo(p) | PathCommand::CubicTo(_, _, p)) => *p,
            None => self.start,
        }
    }

    /// Path pieces after the start point
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Approximate the path with a polyline
    pub fn flatten(&self) -> Vec<Pos2> {
        let mut points = vec![self.start];
        let mut current = self.start;
        for command in &self.commands {
            match *command {
                PathCommand::LineTo(to) => {
                    points.push(to);
                    current = to;
                }
                PathCommand::CubicTo(c1, c2, to) => {
                    let curve = bezier_points(current, c1, c2, to, CURVE_SAMPLES);
                    points.extend(curve.into_iter().skip(1));
                    current = to;
                }
            }
        }
        points
    }

    /// Bounding box of all points including control points
    pub fn control_bounds(&self) -> Rect {
        let mut points = vec![self.start];
        for command in &self.commands {
            match *command {
                PathCommand::LineTo(p) => points.push(p),
                PathCommand::CubicTo(c1, c2, p) => points.extend([c1, c2, p]),
            }
        }
        bounding_of(&points).unwrap_or(Rect::from_min_max(self.start, self.start))
    }

    /// Shortest distance from `point` to the flattened path
    pub fn distance_to(&self, point: Pos2) -> f32 {
        let points = self.flatten();
        if points.len() == 1 {
            return (point - points[0]).length();
        }
        points
            .windows(2)
            .map(|w| distance_to_segment_sq(point, w[0], w[1]))
            .fold(f32::MAX, f32::min)
            .sqrt()
    }

    /// Whether `point` lies inside the stroke of the given width
    pub fn is_point_in_stroke(&self, point: Pos2, line_width: f32) -> bool {
        self.distance_to(point) <= line_width * 0.5
    }

    /// Paint shapes for this path, mapping graph points through `to_screen`
    pub fn to_shapes(&self, stroke: Stroke, to_screen: impl Fn(Pos2) -> Pos2) -> Vec<Shape> {
        let mut shapes = Vec::with_capacity(self.commands.len());
        let mut current = to_screen(self.start);
        let mut polyline = vec![current];

        for command in &self.commands {
            match *command {
                PathCommand::LineTo(to) => {
                    current = to_screen(to);
                    polyline.push(current);
                }
                PathCommand::CubicTo(c1, c2, to) => {
                    if polyline.len() > 1 {
                        shapes.push(Shape::line(std::mem::take(&mut polyline), stroke));
                    }
                    let to = to_screen(to);
                    shapes.push(Shape::CubicBezier(CubicBezierShape::from_points_stroke(
                        [current, to_screen(c1), to_screen(c2), to],
                        false,
                        Color32::TRANSPARENT,
                        stroke,
                    )));
                    current = to;
                    polyline = vec![current];
                }
            }
        }
        if polyline.len() > 1 {
            shapes.push(Shape::line(polyline, stroke));
        }
        shapes
    }
}
