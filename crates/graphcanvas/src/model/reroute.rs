// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reroute waypoints that link paths are routed through.

use crate::model::link::{LinkId, SegmentRender};
use crate::model::Positionable;
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Radius of the drawn and hit-tested reroute marker
pub const REROUTE_RADIUS: f32 = 10.0;

/// Unique identifier for a reroute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RerouteId(pub Uuid);

impl RerouteId {
    /// Create a new random reroute ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RerouteId {
    fn default() -> Self {
        Self::new()
    }
}

/// A free-floating waypoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reroute {
    /// Unique reroute ID
    pub id: RerouteId,
    /// Centre position
    pub pos: [f32; 2],
    /// Predecessor waypoint; `None` means the segment comes straight from the origin
    pub parent_id: Option<RerouteId>,
    /// Links routed through this reroute
    pub link_ids: IndexSet<LinkId>,
    /// Unit tangent of the path through this reroute, computed while routing
    #[serde(skip)]
    pub control_point: Vec2,
    /// Selection flag
    #[serde(default)]
    pub selected: bool,
    /// Render cache for the segment arriving from the parent
    #[serde(skip)]
    pub render: SegmentRender,
}

impl Reroute {
    /// Create a reroute at a position
    pub fn new(pos: Pos2, parent_id: Option<RerouteId>) -> Self {
        Self {
            id: RerouteId::new(),
            pos: [pos.x, pos.y],
            parent_id,
            link_ids: IndexSet::new(),
            control_point: Vec2::X,
            selected: false,
            render: SegmentRender::default(),
        }
    }

    /// Whether `point` is inside the marker circle
    pub fn contains(&self, point: Pos2) -> bool {
        (point - self.pos()).length_sq() <= REROUTE_RADIUS * REROUTE_RADIUS
    }
}

impl Positionable for Reroute {
    fn pos(&self) -> Pos2 {
        Pos2::new(self.pos[0], self.pos[1])
    }

    fn set_pos(&mut self, pos: Pos2) {
        self.pos = [pos.x, pos.y];
    }

    fn bounding(&self) -> Rect {
        Rect::from_center_size(self.pos(), Vec2::splat(REROUTE_RADIUS * 2.0))
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}
