// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, links, reroutes and groups.
//!
//! This is the model the canvas drives. Map order is draw order: the last
//! node in `nodes` is drawn on top and wins position lookups.

use crate::geometry::{contains_centre, contains_rect, is_point_in_rect};
use crate::model::group::{Group, GroupId};
use crate::model::history::{ChangeHistory, HistoryError, StateSnapshot};
use crate::model::link::{Link, LinkId};
use crate::model::node::{Node, NodeId};
use crate::model::reroute::{Reroute, RerouteId};
use crate::model::slot::SlotKind;
use crate::model::{ItemId, Positionable};
use egui::{Pos2, Rect, Vec2};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Extra margin around node bounds for position lookups, so slot hit boxes
/// that stick out of the body still resolve to their node
pub const NODE_HIT_MARGIN: f32 = 6.0;

/// Where a new reroute is spliced in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerouteSplice {
    /// Into the last segment of a link (between its last reroute and the target)
    OnLink(LinkId),
    /// Into the segment arriving at a reroute
    Before(RerouteId),
    /// Into every segment leaving a reroute
    After(RerouteId),
}

/// A node graph
#[derive(Debug, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, Node>,
    links: IndexMap<LinkId, Link>,
    #[serde(default)]
    reroutes: IndexMap<RerouteId, Reroute>,
    #[serde(default)]
    groups: IndexMap<GroupId, Group>,
    #[serde(skip)]
    history: ChangeHistory,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            reroutes: IndexMap::new(),
            groups: IndexMap::new(),
            history: ChangeHistory::new(),
        }
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Add a node to the graph (on top of the draw order)
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let link_ids: Vec<LinkId> = self.nodes.get(&node_id)?.link_ids().collect();
        for link_id in link_ids {
            self.disconnect_link(link_id);
        }
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// All nodes, back to front
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.nodes.values()
    }

    /// All node IDs, back to front
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Move a node to the top of the draw order
    pub fn bring_to_front(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.shift_remove(&node_id) {
            self.nodes.insert(node_id, node);
        }
    }

    /// Topmost node whose bounds (plus [`NODE_HIT_MARGIN`]) contain `pos`
    pub fn node_on_pos(&self, pos: Pos2) -> Option<NodeId> {
        self.nodes
            .values()
            .rev()
            .find(|n| is_point_in_rect(pos, n.bounding().expand(NODE_HIT_MARGIN)))
            .map(|n| n.id)
    }

    /// Duplicate a node without its links, placed on top
    pub fn clone_node(&mut self, node_id: NodeId) -> Option<NodeId> {
        let mut copy = self.nodes.get(&node_id)?.clone();
        copy.id = NodeId::new();
        copy.selected = false;
        for slot in copy.inputs.iter_mut().chain(copy.outputs.iter_mut()) {
            slot.link = None;
            slot.links.clear();
        }
        Some(self.add_node(copy))
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Connect `origin`'s output to `target`'s input, optionally after a reroute.
    ///
    /// An existing link into the target input is replaced.
    pub fn connect(
        &mut self,
        origin_id: NodeId,
        origin_slot: usize,
        target_id: NodeId,
        target_slot: usize,
        after_reroute: Option<RerouteId>,
    ) -> Result<LinkId, ConnectionError> {
        let origin = self.nodes.get(&origin_id).ok_or(ConnectionError::NodeNotFound(origin_id))?;
        let target = self.nodes.get(&target_id).ok_or(ConnectionError::NodeNotFound(target_id))?;

        let output = origin.output(origin_slot).ok_or(ConnectionError::SlotNotFound {
            node: origin_id,
            kind: SlotKind::Output,
            index: origin_slot,
        })?;
        let input = target.input(target_slot).ok_or(ConnectionError::SlotNotFound {
            node: target_id,
            kind: SlotKind::Input,
            index: target_slot,
        })?;

        if !output.can_connect(input) {
            return Err(ConnectionError::IncompatibleTypes);
        }
        if origin_id == target_id {
            return Err(ConnectionError::SelfLoop);
        }
        if let Some(reroute_id) = after_reroute {
            if !self.reroutes.contains_key(&reroute_id) {
                return Err(ConnectionError::RerouteNotFound(reroute_id));
            }
        }

        let link_type = if output.slot_type.is_wildcard() {
            input.slot_type.clone()
        } else {
            output.slot_type.clone()
        };
        let existing = input.link;

        let mut link = Link::new(origin_id, origin_slot, target_id, target_slot, link_type);
        link.parent_id = after_reroute;
        let id = link.id;

        // Claim the chain first so replacing the old link cannot orphan it
        for reroute_id in self.reroute_chain_from(after_reroute) {
            if let Some(reroute) = self.reroutes.get_mut(&reroute_id) {
                reroute.link_ids.insert(id);
            }
        }
        if let Some(old) = existing {
            self.disconnect_link(old);
        }
        if let Some(slot) =
            self.nodes.get_mut(&origin_id).and_then(|n| n.outputs.get_mut(origin_slot))
        {
            slot.links.push(id);
        }
        if let Some(slot) =
            self.nodes.get_mut(&target_id).and_then(|n| n.inputs.get_mut(target_slot))
        {
            slot.link = Some(id);
        }
        self.links.insert(id, link);
        Ok(id)
    }

    /// Remove a link, detaching it from slots and reroutes.
    ///
    /// Reroutes left without any link are removed as well.
    pub fn disconnect_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;

        if let Some(slot) = self
            .nodes
            .get_mut(&link.origin_id)
            .and_then(|n| n.outputs.get_mut(link.origin_slot))
        {
            slot.links.retain(|l| *l != link_id);
        }
        if let Some(slot) = self
            .nodes
            .get_mut(&link.target_id)
            .and_then(|n| n.inputs.get_mut(link.target_slot))
        {
            if slot.link == Some(link_id) {
                slot.link = None;
            }
        }

        let mut orphaned = Vec::new();
        for reroute_id in self.reroute_chain_from(link.parent_id) {
            if let Some(reroute) = self.reroutes.get_mut(&reroute_id) {
                reroute.link_ids.shift_remove(&link_id);
                if reroute.link_ids.is_empty() {
                    orphaned.push(reroute_id);
                }
            }
        }
        for reroute_id in orphaned {
            self.remove_reroute(reroute_id);
        }
        Some(link)
    }

    /// Disconnect whatever link feeds an input. Returns `true` if one was removed.
    pub fn disconnect_input(&mut self, node_id: NodeId, slot: usize) -> bool {
        let link = self.nodes.get(&node_id).and_then(|n| n.input(slot)).and_then(|s| s.link);
        link.and_then(|id| self.disconnect_link(id)).is_some()
    }

    /// Disconnect every link leaving an output. Returns `true` if any was removed.
    pub fn disconnect_output(&mut self, node_id: NodeId, slot: usize) -> bool {
        let links = self
            .nodes
            .get(&node_id)
            .and_then(|n| n.output(slot))
            .map(|s| s.links.clone())
            .unwrap_or_default();
        let mut removed = false;
        for id in links {
            removed |= self.disconnect_link(id).is_some();
        }
        removed
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get a mutable link by ID
    pub fn link_mut(&mut self, link_id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get all link IDs
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.keys().copied()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // ------------------------------------------------------------------
    // Reroutes
    // ------------------------------------------------------------------

    /// Get a reroute by ID
    pub fn reroute(&self, reroute_id: RerouteId) -> Option<&Reroute> {
        self.reroutes.get(&reroute_id)
    }

    /// Get a mutable reroute by ID
    pub fn reroute_mut(&mut self, reroute_id: RerouteId) -> Option<&mut Reroute> {
        self.reroutes.get_mut(&reroute_id)
    }

    /// Get all reroutes
    pub fn reroutes(&self) -> impl Iterator<Item = &Reroute> {
        self.reroutes.values()
    }

    /// Get all reroute IDs
    pub fn reroute_ids(&self) -> impl Iterator<Item = RerouteId> + '_ {
        self.reroutes.keys().copied()
    }

    /// Topmost reroute whose marker contains `pos`
    pub fn reroute_on_pos(&self, pos: Pos2) -> Option<RerouteId> {
        self.reroutes.values().rev().find(|r| r.contains(pos)).map(|r| r.id)
    }

    /// Create a reroute at `pos`, spliced into existing routing
    pub fn create_reroute(
        &mut self,
        pos: Pos2,
        splice: RerouteSplice,
    ) -> Result<RerouteId, RerouteError> {
        let reroute = match splice {
            RerouteSplice::OnLink(link_id) => {
                let link = self.links.get(&link_id).ok_or(RerouteError::LinkNotFound(link_id))?;
                let mut reroute = Reroute::new(pos, link.parent_id);
                reroute.link_ids.insert(link_id);
                let id = reroute.id;
                if let Some(link) = self.links.get_mut(&link_id) {
                    link.parent_id = Some(id);
                }
                reroute
            }
            RerouteSplice::Before(next_id) => {
                let next = self
                    .reroutes
                    .get(&next_id)
                    .ok_or(RerouteError::RerouteNotFound(next_id))?;
                let mut reroute = Reroute::new(pos, next.parent_id);
                reroute.link_ids = next.link_ids.clone();
                let id = reroute.id;
                if let Some(next) = self.reroutes.get_mut(&next_id) {
                    next.parent_id = Some(id);
                }
                reroute
            }
            RerouteSplice::After(prev_id) => {
                let prev = self
                    .reroutes
                    .get(&prev_id)
                    .ok_or(RerouteError::RerouteNotFound(prev_id))?;
                let mut reroute = Reroute::new(pos, Some(prev_id));
                reroute.link_ids = prev.link_ids.clone();
                let id = reroute.id;
                for child in self.reroutes.values_mut().filter(|r| r.parent_id == Some(prev_id)) {
                    child.parent_id = Some(id);
                }
                for link in self.links.values_mut().filter(|l| l.parent_id == Some(prev_id)) {
                    link.parent_id = Some(id);
                }
                reroute
            }
        };
        let id = reroute.id;
        self.reroutes.insert(id, reroute);
        Ok(id)
    }

    /// Insert a prepared reroute as-is. Links claim it through [`Graph::connect`].
    pub fn insert_reroute(&mut self, reroute: Reroute) -> RerouteId {
        let id = reroute.id;
        self.reroutes.insert(id, reroute);
        id
    }

    /// Remove a reroute; links and reroutes that went through it are routed
    /// to its parent instead
    pub fn remove_reroute(&mut self, reroute_id: RerouteId) -> bool {
        let Some(removed) = self.reroutes.shift_remove(&reroute_id) else {
            return false;
        };
        for child in self.reroutes.values_mut().filter(|r| r.parent_id == Some(reroute_id)) {
            child.parent_id = removed.parent_id;
        }
        for link in self.links.values_mut().filter(|l| l.parent_id == Some(reroute_id)) {
            link.parent_id = removed.parent_id;
        }
        true
    }

    /// Reroute chain of a link, ordered from the origin to the target
    pub fn reroute_chain(&self, link_id: LinkId) -> Vec<RerouteId> {
        self.link(link_id)
            .map(|l| self.reroute_chain_from(l.parent_id))
            .unwrap_or_default()
    }

    /// Walk parent pointers from `last`, returning origin-to-target order.
    ///
    /// The walk is bounded by a visited set; a cycle truncates the chain.
    pub fn reroute_chain_from(&self, last: Option<RerouteId>) -> Vec<RerouteId> {
        let mut chain = Vec::new();
        let mut visited = IndexSet::new();
        let mut current = last;
        while let Some(id) = current {
            if !visited.insert(id) {
                tracing::warn!("Reroute chain contains a cycle at {:?}", id);
                break;
            }
            let Some(reroute) = self.reroutes.get(&id) else {
                tracing::debug!("Reroute chain references missing reroute {:?}", id);
                break;
            };
            chain.push(id);
            current = reroute.parent_id;
        }
        chain.reverse();
        chain
    }

    /// Check that every reroute's parent chain terminates
    pub fn validate_reroutes(&self) -> Result<(), RerouteError> {
        for start in self.reroutes.keys() {
            let mut visited = IndexSet::new();
            let mut current = Some(*start);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(RerouteError::Cycle(id));
                }
                current = self.reroutes.get(&id).and_then(|r| r.parent_id);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Add a group (on top of other groups)
    pub fn add_group(&mut self, group: Group) -> GroupId {
        let id = group.id;
        self.groups.insert(id, group);
        id
    }

    /// Remove a group; its contents stay
    pub fn remove_group(&mut self, group_id: GroupId) -> Option<Group> {
        self.groups.shift_remove(&group_id)
    }

    /// Get a group by ID
    pub fn group(&self, group_id: GroupId) -> Option<&Group> {
        self.groups.get(&group_id)
    }

    /// Get a mutable group by ID
    pub fn group_mut(&mut self, group_id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(&group_id)
    }

    /// Get all groups, back to front
    pub fn groups(&self) -> impl DoubleEndedIterator<Item = &Group> {
        self.groups.values()
    }

    /// Topmost group whose bounds contain `pos`
    pub fn group_on_pos(&self, pos: Pos2) -> Option<GroupId> {
        self.groups
            .values()
            .rev()
            .find(|g| is_point_in_rect(pos, g.bounding()))
            .map(|g| g.id)
    }

    /// Recompute which items a group contains: nodes by centre, reroutes by
    /// position, groups fully inside
    pub fn recompute_inside(&mut self, group_id: GroupId) {
        let Some(bounds) = self.groups.get(&group_id).map(Positionable::bounding) else {
            return;
        };
        let mut children: Vec<ItemId> = self
            .nodes
            .values()
            .filter(|n| contains_centre(bounds, n.bounding()))
            .map(|n| ItemId::Node(n.id))
            .collect();
        children.extend(
            self.reroutes
                .values()
                .filter(|r| is_point_in_rect(r.pos(), bounds))
                .map(|r| ItemId::Reroute(r.id)),
        );
        children.extend(
            self.groups
                .values()
                .filter(|g| g.id != group_id && contains_rect(bounds, g.bounding()))
                .map(|g| ItemId::Group(g.id)),
        );
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.children = children;
        }
    }

    // ------------------------------------------------------------------
    // Positionable items
    // ------------------------------------------------------------------

    fn positionable(&self, item: ItemId) -> Option<&dyn Positionable> {
        match item {
            ItemId::Node(id) => self.nodes.get(&id).map(|n| n as &dyn Positionable),
            ItemId::Group(id) => self.groups.get(&id).map(|g| g as &dyn Positionable),
            ItemId::Reroute(id) => self.reroutes.get(&id).map(|r| r as &dyn Positionable),
        }
    }

    fn positionable_mut(&mut self, item: ItemId) -> Option<&mut dyn Positionable> {
        match item {
            ItemId::Node(id) => self.nodes.get_mut(&id).map(|n| n as &mut dyn Positionable),
            ItemId::Group(id) => self.groups.get_mut(&id).map(|g| g as &mut dyn Positionable),
            ItemId::Reroute(id) => self.reroutes.get_mut(&id).map(|r| r as &mut dyn Positionable),
        }
    }

    /// Whether an item still exists
    pub fn contains_item(&self, item: ItemId) -> bool {
        self.positionable(item).is_some()
    }

    /// Bounding rectangle of an item
    pub fn item_bounding(&self, item: ItemId) -> Option<Rect> {
        self.positionable(item).map(Positionable::bounding)
    }

    /// Position of an item
    pub fn item_pos(&self, item: ItemId) -> Option<Pos2> {
        self.positionable(item).map(Positionable::pos)
    }

    /// Set the position of an item
    pub fn set_item_pos(&mut self, item: ItemId, pos: Pos2) {
        if let Some(p) = self.positionable_mut(item) {
            p.set_pos(pos);
        }
    }

    /// Selection flag of an item
    pub fn is_item_selected(&self, item: ItemId) -> bool {
        self.positionable(item).is_some_and(Positionable::is_selected)
    }

    /// Set the selection flag of an item. Returns `false` if it does not exist.
    pub fn set_item_selected(&mut self, item: ItemId, selected: bool) -> bool {
        match self.positionable_mut(item) {
            Some(p) => {
                p.set_selected(selected);
                true
            }
            None => false,
        }
    }

    /// Move an item. Groups drag their children along unless `skip_children`.
    pub fn move_item(&mut self, item: ItemId, delta: Vec2, skip_children: bool) {
        if let Some(p) = self.positionable_mut(item) {
            if !p.is_pinned() {
                p.move_by(delta);
            }
        }
        if skip_children {
            return;
        }
        if let ItemId::Group(id) = item {
            let children = self.groups.get(&id).map(|g| g.children.clone()).unwrap_or_default();
            for child in children {
                self.move_item(child, delta, true);
            }
        }
    }

    /// Every item in the graph
    pub fn items(&self) -> Vec<ItemId> {
        self.nodes
            .keys()
            .map(|id| ItemId::Node(*id))
            .chain(self.groups.keys().map(|id| ItemId::Group(*id)))
            .chain(self.reroutes.keys().map(|id| ItemId::Reroute(*id)))
            .collect()
    }

    /// Remove an item of any kind
    pub fn remove_item(&mut self, item: ItemId) -> bool {
        match item {
            ItemId::Node(id) => self.remove_node(id).is_some(),
            ItemId::Group(id) => self.remove_group(id).is_some(),
            ItemId::Reroute(id) => self.remove_reroute(id),
        }
    }

    // ------------------------------------------------------------------
    // Change bracketing
    // ------------------------------------------------------------------

    /// Open a change bracket; the outermost bracket snapshots the graph
    pub fn before_change(&mut self) {
        // History is lent out so the snapshot closure can borrow the graph
        let mut history = std::mem::take(&mut self.history);
        history.open(|| StateSnapshot::from_value(&*self));
        self.history = history;
    }

    /// Close a change bracket; the outermost close records an undo step
    pub fn after_change(&mut self) {
        let mut history = std::mem::take(&mut self.history);
        history.close(|| StateSnapshot::from_value(&*self));
        self.history = history;
    }

    /// Undo history
    pub fn history(&self) -> &ChangeHistory {
        &self.history
    }

    /// Restore the state before the last recorded change
    pub fn undo(&mut self) -> Result<(), HistoryError> {
        let change = self.history.undo()?;
        self.restore(&change.before)
    }

    /// Re-apply the last undone change
    pub fn redo(&mut self) -> Result<(), HistoryError> {
        let change = self.history.redo()?;
        self.restore(&change.after)
    }

    fn restore(&mut self, snapshot: &StateSnapshot) -> Result<(), HistoryError> {
        let restored: Graph = snapshot.to_value()?;
        self.name = restored.name;
        self.nodes = restored.nodes;
        self.links = restored.links;
        self.reroutes = restored.reroutes;
        self.groups = restored.groups;
        Ok(())
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a link
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Slot not found
    #[error("{kind:?} slot {index} not found on node {node:?}")]
    SlotNotFound {
        /// Node searched
        node: NodeId,
        /// Slot kind searched
        kind: SlotKind,
        /// Missing index
        index: usize,
    },

    /// Incompatible slot types
    #[error("Incompatible slot types")]
    IncompatibleTypes,

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Reroute to route through does not exist
    #[error("Reroute not found: {0:?}")]
    RerouteNotFound(RerouteId),
}

/// Error when editing reroutes
#[derive(Debug, thiserror::Error)]
pub enum RerouteError {
    /// Link not found
    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    /// Reroute not found
    #[error("Reroute not found: {0:?}")]
    RerouteNotFound(RerouteId),

    /// Parent chain loops back on itself
    #[error("Reroute chain contains a cycle at {0:?}")]
    Cycle(RerouteId),
}
