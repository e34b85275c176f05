// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pan/zoom transform between canvas pixels and graph space.
//!
//! `canvas = (graph + offset) * scale`, with canvas coordinates relative to
//! the top-left of the drawing surface in logical pixels.

use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// View transform of a canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragAndScale {
    /// Pan offset in graph units
    pub offset: Vec2,
    /// Zoom factor
    pub scale: f32,
    /// Logical size of the drawing surface
    pub surface: Vec2,
    /// Smallest zoom factor
    pub min_scale: f32,
    /// Largest zoom factor
    pub max_scale: f32,
}

impl DragAndScale {
    /// Identity transform over a surface
    pub fn new(surface: Vec2) -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
            surface,
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }

    /// Set the zoom limits, re-clamping the current scale
    pub fn with_limits(mut self, min_scale: f32, max_scale: f32) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self.scale = self.scale.clamp(min_scale, max_scale);
        self
    }

    /// Canvas position to graph position
    pub fn to_graph(&self, canvas: Pos2) -> Pos2 {
        Pos2::new(canvas.x / self.scale, canvas.y / self.scale) - self.offset
    }

    /// Graph position to canvas position
    pub fn to_canvas(&self, graph: Pos2) -> Pos2 {
        let p = graph + self.offset;
        Pos2::new(p.x * self.scale, p.y * self.scale)
    }

    /// Graph-space rectangle currently on screen
    pub fn visible_area(&self) -> Rect {
        Rect::from_min_max(self.to_graph(Pos2::ZERO), self.to_graph(self.surface.to_pos2()))
    }

    /// Resize the drawing surface
    pub fn resize(&mut self, surface: Vec2) {
        self.surface = surface;
    }

    /// Pan by a canvas-space delta
    pub fn pan_by(&mut self, canvas_delta: Vec2) {
        self.offset += canvas_delta / self.scale;
    }

    /// Set the zoom, keeping the graph point under `zoom_center` fixed
    pub fn change_scale(&mut self, scale: f32, zoom_center: Pos2) {
        let scale = scale.clamp(self.min_scale, self.max_scale);
        if scale == self.scale {
            return;
        }
        let before = self.to_graph(zoom_center);
        self.scale = scale;
        let after = self.to_graph(zoom_center);
        self.offset += after - before;
    }

    /// Multiply the zoom by `factor` around `zoom_center`
    pub fn change_delta_scale(&mut self, factor: f32, zoom_center: Pos2) {
        self.change_scale(self.scale * factor, zoom_center);
    }

    /// Pan so `graph` sits at the centre of the surface
    pub fn center_on(&mut self, graph: Pos2) {
        let centre = self.to_graph((self.surface * 0.5).to_pos2());
        self.offset += centre - graph;
    }
}

impl Default for DragAndScale {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 600.0))
    }
}
