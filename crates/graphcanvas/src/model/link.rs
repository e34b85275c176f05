// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::model::node::NodeId;
use crate::model::reroute::RerouteId;
use crate::model::slot::SlotType;
use crate::path::LinkPath;
use egui::Pos2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame render cache of one link segment.
///
/// A missing centre means the segment was not routed this frame and must not
/// be treated as hoverable.
#[derive(Debug, Clone, Default)]
pub struct SegmentRender {
    /// Routed path
    pub path: Option<LinkPath>,
    /// Representative midpoint
    pub centre: Option<Pos2>,
    /// Tangent angle at the midpoint, radians
    pub centre_angle: f32,
    /// Frame the cache was written in
    pub frame: u64,
}

impl SegmentRender {
    /// Drop the cached path and centre
    pub fn clear(&mut self) {
        self.path = None;
        self.centre = None;
        self.centre_angle = 0.0;
    }
}

/// A link from an output slot to an input slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Source node ID
    pub origin_id: NodeId,
    /// Source output index
    pub origin_slot: usize,
    /// Target node ID
    pub target_id: NodeId,
    /// Target input index
    pub target_slot: usize,
    /// Type carried by the link
    pub link_type: SlotType,
    /// Reroute nearest the target, if the link is routed through any
    pub parent_id: Option<RerouteId>,
    /// Render cache for the last segment (last reroute or origin to target)
    #[serde(skip)]
    pub render: SegmentRender,
}

impl Link {
    /// Create a new link
    pub fn new(
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
        link_type: SlotType,
    ) -> Self {
        Self {
            id: LinkId::new(),
            origin_id,
            origin_slot,
            target_id,
            target_slot,
            link_type,
            parent_id: None,
            render: SegmentRender::default(),
        }
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.origin_id == node_id || self.target_id == node_id
    }
}
