// SPDX-License-Identifier: MIT OR Apache-2.0
//! Links being dragged by the user.
//!
//! A [`LinkConnector`] holds one anchored end per link being created or
//! moved, plus the free end that follows the pointer. Dropping resolves the
//! anchored ends against whatever is under the pointer.

use crate::events::DraggedLinkEnd;
use crate::geometry::LinkDirection;
use crate::model::graph::Graph;
use crate::model::link::LinkId;
use crate::model::node::NodeId;
use crate::model::reroute::RerouteId;
use crate::model::slot::{SlotKind, SlotType};
use crate::model::Positionable;
use egui::{Pos2, Vec2};

/// One anchored end of a dragged link
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectingLink {
    /// Node the link is anchored to
    pub node: NodeId,
    /// Slot index on the anchor node
    pub slot: usize,
    /// Kind of the anchor slot
    pub from: SlotKind,
    /// Type carried by the link
    pub slot_type: SlotType,
    /// Existing link being moved, if any
    pub moving_link: Option<LinkId>,
    /// Reroute the new link continues from
    pub after_reroute: Option<RerouteId>,
    /// Where the drawn link starts
    pub anchor: Pos2,
    /// Direction the drawn link leaves the anchor
    pub dir: Vec2,
}

impl ConnectingLink {
    /// Anchor at a node slot
    pub fn from_slot(graph: &Graph, node: NodeId, kind: SlotKind, slot: usize) -> Option<Self> {
        let n = graph.node(node)?;
        let s = n.slot(kind, slot)?;
        Some(Self {
            node,
            slot,
            from: kind,
            slot_type: s.slot_type.clone(),
            moving_link: None,
            after_reroute: None,
            anchor: n.slot_pos(kind, slot),
            dir: s.direction().unit(),
        })
    }

    /// Anchor at a link's origin, continuing after `after_reroute`
    pub fn from_link_origin(
        graph: &Graph,
        link: LinkId,
        after_reroute: Option<RerouteId>,
    ) -> Option<Self> {
        let l = graph.link(link)?;
        let mut end = Self::from_slot(graph, l.origin_id, SlotKind::Output, l.origin_slot)?;
        end.slot_type = l.link_type.clone();
        end.after_reroute = after_reroute;
        if let Some(reroute) = after_reroute.and_then(|id| graph.reroute(id)) {
            end.anchor = reroute.pos();
            end.dir = reroute.control_point;
        }
        Some(end)
    }

    /// Anchor at a link's target input, for moving the link to another output
    pub fn from_link_target(graph: &Graph, link: LinkId) -> Option<Self> {
        let l = graph.link(link)?;
        let mut end = Self::from_slot(graph, l.target_id, SlotKind::Input, l.target_slot)?;
        end.slot_type = l.link_type.clone();
        end.moving_link = Some(link);
        end.after_reroute = l.parent_id;
        Some(end)
    }

    /// Whether this end can land on the given slot
    pub fn accepts(&self, graph: &Graph, node: NodeId, kind: SlotKind, slot: usize) -> bool {
        if kind != self.from.opposite() || node == self.node {
            return false;
        }
        graph
            .node(node)
            .and_then(|n| n.slot(kind, slot))
            .is_some_and(|s| self.slot_type.can_connect_to(&s.slot_type))
    }

    /// Description handed to the host
    pub fn dragged_end(&self) -> DraggedLinkEnd {
        DraggedLinkEnd {
            node: self.node,
            kind: self.from,
            slot: self.slot,
            slot_type: self.slot_type.clone(),
            after_reroute: self.after_reroute,
        }
    }

    fn connect_to(&self, graph: &mut Graph, node: NodeId, slot: usize) -> bool {
        let result = match self.from {
            SlotKind::Output => graph.connect(self.node, self.slot, node, slot, self.after_reroute),
            SlotKind::Input => graph.connect(node, slot, self.node, self.slot, self.after_reroute),
        };
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Connection refused: {e}");
                false
            }
        }
    }
}

/// Links being dragged plus the free end
#[derive(Debug, Clone, PartialEq)]
pub struct LinkConnector {
    /// Anchored ends
    pub links: Vec<ConnectingLink>,
    /// Graph position of the free end
    pub free_end: Pos2,
}

impl LinkConnector {
    /// Start dragging the given ends
    pub fn new(links: Vec<ConnectingLink>, free_end: Pos2) -> Self {
        Self { links, free_end }
    }

    /// Whether nothing is being dragged
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Slot kind a drop must land on
    pub fn target_kind(&self) -> Option<SlotKind> {
        self.links.first().map(|l| l.from.opposite())
    }

    /// Direction the free end enters its drop point
    pub fn free_end_dir(&self) -> LinkDirection {
        match self.target_kind() {
            Some(SlotKind::Output) => LinkDirection::Right,
            _ => LinkDirection::Left,
        }
    }

    /// Whether any end can land on the slot
    pub fn is_valid_target(
        &self,
        graph: &Graph,
        node: NodeId,
        kind: SlotKind,
        slot: usize,
    ) -> bool {
        self.links.iter().any(|l| l.accepts(graph, node, kind, slot))
    }

    /// Drop on a specific slot. Returns the number of links created.
    pub fn drop_on_slot(
        &self,
        graph: &mut Graph,
        node: NodeId,
        kind: SlotKind,
        slot: usize,
    ) -> usize {
        let mut made = 0;
        for end in &self.links {
            if end.accepts(graph, node, kind, slot) && end.connect_to(graph, node, slot) {
                made += 1;
            }
        }
        made
    }

    /// Drop on a node body: every end goes to the first slot of matching type
    pub fn drop_on_node(&self, graph: &mut Graph, node: NodeId) -> usize {
        let mut made = 0;
        for end in &self.links {
            let Some(target) = graph.node(node) else {
                break;
            };
            let slot = match end.from {
                SlotKind::Output => target.find_input_slot_by_type(&end.slot_type),
                SlotKind::Input => target.find_output_slot_by_type(&end.slot_type),
            };
            match slot {
                Some(slot) if end.accepts(graph, node, end.from.opposite(), slot) => {
                    if end.connect_to(graph, node, slot) {
                        made += 1;
                    }
                }
                _ => tracing::debug!("No slot on {:?} accepts {:?}", node, end.slot_type),
            }
        }
        made
    }

    /// Slot on `node` the first end would land on if dropped on the body
    pub fn best_slot_on(&self, graph: &Graph, node: NodeId) -> Option<(SlotKind, usize)> {
        let end = self.links.first()?;
        let target = graph.node(node)?;
        let kind = end.from.opposite();
        let slot = match kind {
            SlotKind::Input => target.find_input_slot_by_type(&end.slot_type),
            SlotKind::Output => target.find_output_slot_by_type(&end.slot_type),
        }?;
        end.accepts(graph, node, kind, slot).then_some((kind, slot))
    }

    /// First end that a widget accepting `link_type` could take
    pub fn end_for_widget(&self, widget_type: &SlotType) -> Option<&ConnectingLink> {
        self.links
            .iter()
            .find(|l| l.from == SlotKind::Output && l.slot_type.can_connect_to(widget_type))
    }

    /// Descriptions of every dragged end
    pub fn dragged_ends(&self) -> Vec<DraggedLinkEnd> {
        self.links.iter().map(ConnectingLink::dragged_end).collect()
    }

    /// Whether `link` is one being moved
    pub fn is_moving(&self, link: LinkId) -> bool {
        self.links.iter().any(|l| l.moving_link == Some(link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::Node;

    fn graph() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new("conn");
        let a = graph.add_node(
            Node::new("n", "A")
                .with_output("f", "float")
                .with_output("s", "string"),
        );
        let b = graph.add_node(
            Node::new("n", "B")
                .with_position(300.0, 0.0)
                .with_input("s", "string")
                .with_input("f", "float"),
        );
        (graph, a, b)
    }

    #[test]
    fn test_drop_on_matching_slot() {
        let (mut graph, a, b) = graph();
        let end = ConnectingLink::from_slot(&graph, a, SlotKind::Output, 0).unwrap();
        let connector = LinkConnector::new(vec![end], Pos2::ZERO);
        assert!(!connector.is_valid_target(&graph, b, SlotKind::Input, 0));
        assert!(connector.is_valid_target(&graph, b, SlotKind::Input, 1));
        assert_eq!(connector.drop_on_slot(&mut graph, b, SlotKind::Input, 0), 0);
        assert_eq!(connector.drop_on_slot(&mut graph, b, SlotKind::Input, 1), 1);
        assert!(graph.node(b).unwrap().inputs[1].link.is_some());
    }

    #[test]
    fn test_drop_on_node_finds_slot_by_type() {
        let (mut graph, a, b) = graph();
        let end = ConnectingLink::from_slot(&graph, b, SlotKind::Input, 0).unwrap();
        let connector = LinkConnector::new(vec![end], Pos2::ZERO);
        assert_eq!(connector.target_kind(), Some(SlotKind::Output));
        assert_eq!(connector.drop_on_node(&mut graph, a), 1);
        let link = graph.links().next().unwrap();
        assert_eq!((link.origin_slot, link.target_slot), (1, 0));
    }

    #[test]
    fn test_moving_links_to_another_output() {
        let (mut graph, a, b) = graph();
        let c = graph.add_node(Node::new("n", "C").with_output("f", "float"));
        let link = graph.connect(a, 0, b, 1, None).unwrap();
        let end = ConnectingLink::from_link_target(&graph, link).unwrap();
        let connector = LinkConnector::new(vec![end], Pos2::ZERO);
        assert!(connector.is_moving(link));
        assert_eq!(connector.drop_on_slot(&mut graph, c, SlotKind::Output, 0), 1);
        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.links().next().unwrap().origin_id, c);
    }

    #[test]
    fn test_self_drop_is_rejected() {
        let (mut graph, a, _) = graph();
        let end = ConnectingLink::from_slot(&graph, a, SlotKind::Output, 0).unwrap();
        let connector = LinkConnector::new(vec![end], Pos2::ZERO);
        assert_eq!(connector.drop_on_node(&mut graph, a), 0);
        assert_eq!(graph.link_count(), 0);
    }
}
