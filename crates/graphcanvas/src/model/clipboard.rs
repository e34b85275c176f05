// SPDX-License-Identifier: MIT OR Apache-2.0
//! Copy/paste of graph fragments.
//!
//! A copied fragment is a [`ClipboardRecord`] stored as JSON under
//! [`CLIPBOARD_KEY`]. Pasting gives every item a fresh ID and offsets the
//! fragment so its top-left item lands on the paste position.

use crate::model::graph::Graph;
use crate::model::group::{Group, GroupId};
use crate::model::link::Link;
use crate::model::node::{Node, NodeId};
use crate::model::reroute::{Reroute, RerouteId};
use crate::model::{ItemId, Positionable};
use egui::Pos2;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Key the fragment is stored under
pub const CLIPBOARD_KEY: &str = "graphcanvas_clipboard";

/// Clipboard errors
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// Nothing stored under the clipboard key
    #[error("Clipboard is empty")]
    Empty,

    /// Nothing selected to copy
    #[error("Nothing to copy")]
    NothingSelected,

    /// Stored fragment is not valid JSON for a record
    #[error("Invalid clipboard contents: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored reroutes form a loop
    #[error("Clipboard reroute chain contains a cycle at {0:?}")]
    Cycle(RerouteId),
}

/// Key/value storage the clipboard blob lives in
pub trait ClipboardStore {
    /// Read a stored value
    fn get(&self, key: &str) -> Option<String>;
    /// Store a value, replacing the previous one
    fn set(&mut self, key: &str, value: String);
}

/// In-process clipboard store
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    entries: HashMap<String, String>,
}

impl MemoryClipboard {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardStore for MemoryClipboard {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// A copied graph fragment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClipboardRecord {
    /// Copied nodes
    pub nodes: Vec<Node>,
    /// Copied groups
    pub groups: Vec<Group>,
    /// Reroutes on the copied links
    pub reroutes: Vec<Reroute>,
    /// Links into the copied nodes, including ones from outside the fragment
    pub links: Vec<Link>,
}

impl ClipboardRecord {
    /// Capture `items` from `graph`
    pub fn capture(graph: &Graph, items: &[ItemId]) -> Self {
        let mut record = Self::default();
        let mut reroute_ids: IndexSet<RerouteId> = IndexSet::new();
        let mut loose_reroutes = 0;

        for item in items {
            match *item {
                ItemId::Node(id) => {
                    if let Some(node) = graph.node(id) {
                        record.nodes.push(node.clone());
                    }
                }
                ItemId::Group(id) => {
                    if let Some(group) = graph.group(id) {
                        record.groups.push(group.clone());
                    }
                }
                // Reroutes travel with the links of copied nodes
                ItemId::Reroute(_) => loose_reroutes += 1,
            }
        }
        if loose_reroutes > 0 {
            tracing::debug!(
                "Skipped {} selected reroute(s) not owned by a copied link",
                loose_reroutes
            );
        }

        let copied: IndexSet<NodeId> = record.nodes.iter().map(|n| n.id).collect();
        for link in graph.links().filter(|l| copied.contains(&l.target_id)) {
            reroute_ids.extend(graph.reroute_chain(link.id));
            record.links.push(link.clone());
        }
        record.reroutes = reroute_ids
            .into_iter()
            .filter_map(|id| graph.reroute(id).cloned())
            .collect();
        record
    }

    /// Whether the fragment holds anything pasteable
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.groups.is_empty()
    }

    /// Check that reroute parent chains inside the fragment terminate
    pub fn validate(&self) -> Result<(), ClipboardError> {
        let parents: HashMap<RerouteId, Option<RerouteId>> =
            self.reroutes.iter().map(|r| (r.id, r.parent_id)).collect();
        for reroute in &self.reroutes {
            let mut visited = IndexSet::new();
            let mut current = Some(reroute.id);
            while let Some(id) = current {
                if !visited.insert(id) {
                    return Err(ClipboardError::Cycle(id));
                }
                current = parents.get(&id).copied().flatten();
            }
        }
        Ok(())
    }

    /// Top-left position of the fragment
    fn origin(&self) -> Option<Pos2> {
        let positions = self
            .nodes
            .iter()
            .map(|n| n.bounding().min)
            .chain(self.groups.iter().map(|g| g.pos()))
            .chain(self.reroutes.iter().map(|r| r.pos()));
        positions.reduce(|a, b| a.min(b))
    }
}

/// Copy `items` into `store`. Returns the number of copied nodes and groups.
pub fn copy_to(
    store: &mut dyn ClipboardStore,
    graph: &Graph,
    items: &[ItemId],
) -> Result<usize, ClipboardError> {
    let record = ClipboardRecord::capture(graph, items);
    if record.is_empty() {
        return Err(ClipboardError::NothingSelected);
    }
    let json = serde_json::to_string(&record)?;
    store.set(CLIPBOARD_KEY, json);
    let count = record.nodes.len() + record.groups.len();
    tracing::debug!("Copied {} items to clipboard", count);
    Ok(count)
}

/// Paste the stored fragment so its top-left lands on `position`.
///
/// Links from nodes outside the fragment are recreated only when
/// `keep_external_links` is set and their origin still exists. Returns the
/// pasted items.
pub fn paste_from(
    store: &dyn ClipboardStore,
    graph: &mut Graph,
    position: Pos2,
    keep_external_links: bool,
) -> Result<Vec<ItemId>, ClipboardError> {
    let json = store.get(CLIPBOARD_KEY).ok_or(ClipboardError::Empty)?;
    let record: ClipboardRecord = serde_json::from_str(&json)?;
    if record.is_empty() {
        return Err(ClipboardError::Empty);
    }
    record.validate()?;

    let offset = record.origin().map(|o| position - o).unwrap_or_default();
    let mut pasted = Vec::new();

    let mut node_map: HashMap<NodeId, NodeId> = HashMap::new();
    for node in &record.nodes {
        let mut node = node.clone();
        let new_id = NodeId::new();
        node_map.insert(node.id, new_id);
        node.id = new_id;
        node.selected = false;
        for slot in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
            slot.link = None;
            slot.links.clear();
        }
        node.move_by(offset);
        pasted.push(ItemId::Node(graph.add_node(node)));
    }

    for group in &record.groups {
        let mut group = group.clone();
        group.id = GroupId::new();
        group.selected = false;
        group.move_by(offset);
        pasted.push(ItemId::Group(graph.add_group(group)));
    }

    let reroute_map: HashMap<RerouteId, RerouteId> =
        record.reroutes.iter().map(|r| (r.id, RerouteId::new())).collect();
    let mut new_reroutes = Vec::new();
    for reroute in &record.reroutes {
        let Some(&new_id) = reroute_map.get(&reroute.id) else {
            continue;
        };
        let parent = reroute.parent_id.and_then(|p| reroute_map.get(&p).copied());
        let mut copy = Reroute::new(reroute.pos() + offset, parent);
        copy.id = new_id;
        new_reroutes.push(new_id);
        graph.insert_reroute(copy);
    }

    for link in &record.links {
        let Some(&target) = node_map.get(&link.target_id) else {
            continue;
        };
        let origin = match node_map.get(&link.origin_id) {
            Some(&origin) => origin,
            None if keep_external_links && graph.node(link.origin_id).is_some() => link.origin_id,
            None => continue,
        };
        let after = link.parent_id.and_then(|p| reroute_map.get(&p).copied());
        if let Err(e) = graph.connect(origin, link.origin_slot, target, link.target_slot, after) {
            tracing::debug!("Skipped pasted link: {e}");
        }
    }

    for id in new_reroutes {
        if graph.reroute(id).is_some_and(|r| r.link_ids.is_empty()) {
            graph.remove_reroute(id);
        } else if graph.reroute(id).is_some() {
            pasted.push(ItemId::Reroute(id));
        }
    }

    tracing::debug!("Pasted {} items from clipboard", pasted.len());
    Ok(pasted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::RerouteSplice;

    fn chain_graph() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new("clip");
        let a = graph.add_node(
            Node::new("src", "A")
                .with_position(0.0, 0.0)
                .with_output("out", "float"),
        );
        let b = graph.add_node(
            Node::new("dst", "B")
                .with_position(300.0, 0.0)
                .with_input("in", "float"),
        );
        (graph, a, b)
    }

    #[test]
    fn test_copy_paste_remaps_ids_and_keeps_internal_links() {
        let (mut graph, a, b) = chain_graph();
        let link = graph.connect(a, 0, b, 0, None).unwrap();
        graph.create_reroute(Pos2::new(150.0, 0.0), RerouteSplice::OnLink(link)).unwrap();

        let mut store = MemoryClipboard::new();
        let copied = copy_to(&mut store, &graph, &[ItemId::Node(a), ItemId::Node(b)]).unwrap();
        assert_eq!(copied, 2);

        let pasted = paste_from(&store, &mut graph, Pos2::new(0.0, 500.0), false).unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.reroutes().count(), 2);
        assert!(pasted.iter().all(|item| *item != ItemId::Node(a) && *item != ItemId::Node(b)));

        let new_link = graph.links().find(|l| l.id != link).unwrap();
        assert_eq!(graph.reroute_chain(new_link.id).len(), 1);
    }

    #[test]
    fn test_paste_places_fragment_at_position() {
        let (mut graph, a, _) = chain_graph();
        let mut store = MemoryClipboard::new();
        copy_to(&mut store, &graph, &[ItemId::Node(a)]).unwrap();
        let pasted = paste_from(&store, &mut graph, Pos2::new(500.0, 500.0), false).unwrap();
        let ItemId::Node(id) = pasted[0] else {
            panic!("expected a node");
        };
        assert_eq!(graph.node(id).unwrap().bounding().min, Pos2::new(500.0, 500.0));
    }

    #[test]
    fn test_external_links_need_opt_in() {
        let (mut graph, a, b) = chain_graph();
        graph.connect(a, 0, b, 0, None).unwrap();
        let mut store = MemoryClipboard::new();
        copy_to(&mut store, &graph, &[ItemId::Node(b)]).unwrap();

        paste_from(&store, &mut graph, Pos2::ZERO, false).unwrap();
        assert_eq!(graph.link_count(), 1);
        paste_from(&store, &mut graph, Pos2::ZERO, true).unwrap();
        assert_eq!(graph.link_count(), 2);
        assert_eq!(graph.node(a).unwrap().outputs[0].links.len(), 2);
    }

    #[test]
    fn test_external_link_dropped_when_origin_is_gone() {
        let (mut graph, a, b) = chain_graph();
        graph.connect(a, 0, b, 0, None).unwrap();
        let mut store = MemoryClipboard::new();
        copy_to(&mut store, &graph, &[ItemId::Node(b)]).unwrap();
        graph.remove_node(a);

        let pasted = paste_from(&store, &mut graph, Pos2::new(0.0, 300.0), true).unwrap();
        assert_eq!(pasted.len(), 1);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn test_reroute_only_selection_copies_nothing() {
        let (mut graph, a, b) = chain_graph();
        let link = graph.connect(a, 0, b, 0, None).unwrap();
        let reroute = graph
            .create_reroute(Pos2::new(150.0, 0.0), RerouteSplice::OnLink(link))
            .unwrap();

        let record = ClipboardRecord::capture(&graph, &[ItemId::Reroute(reroute)]);
        assert!(record.is_empty());
        assert!(record.reroutes.is_empty());
        let mut store = MemoryClipboard::new();
        assert!(matches!(
            copy_to(&mut store, &graph, &[ItemId::Reroute(reroute)]),
            Err(ClipboardError::NothingSelected)
        ));
        assert!(store.get(CLIPBOARD_KEY).is_none());
    }

    #[test]
    fn test_cyclic_reroutes_are_rejected() {
        let mut record = ClipboardRecord {
            nodes: vec![Node::new("n", "N")],
            ..Default::default()
        };
        let mut r1 = Reroute::new(Pos2::ZERO, None);
        let mut r2 = Reroute::new(Pos2::ZERO, Some(r1.id));
        r1.parent_id = Some(r2.id);
        r2.parent_id = Some(r1.id);
        record.reroutes = vec![r1, r2];

        let mut store = MemoryClipboard::new();
        store.set(CLIPBOARD_KEY, serde_json::to_string(&record).unwrap());
        let mut graph = Graph::new("empty");
        assert!(matches!(
            paste_from(&store, &mut graph, Pos2::ZERO, false),
            Err(ClipboardError::Cycle(_))
        ));
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_empty_and_garbage_clipboard() {
        let mut store = MemoryClipboard::new();
        let mut graph = Graph::new("empty");
        assert!(matches!(
            paste_from(&store, &mut graph, Pos2::ZERO, false),
            Err(ClipboardError::Empty)
        ));
        store.set(CLIPBOARD_KEY, "not json".to_string());
        assert!(matches!(
            paste_from(&store, &mut graph, Pos2::ZERO, false),
            Err(ClipboardError::Json(_))
        ));
        assert!(matches!(copy_to(&mut store, &graph, &[]), Err(ClipboardError::NothingSelected)));
    }
}
