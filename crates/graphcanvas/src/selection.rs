// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection model.
//!
//! The set of selected items is the source of truth; each item's own
//! `selected` flag is kept equal to membership. Selecting a node also
//! highlights the links attached to it.

use crate::model::graph::Graph;
use crate::model::link::LinkId;
use crate::model::node::NodeId;
use crate::model::ItemId;
use indexmap::{IndexMap, IndexSet};

/// How a batch of items is combined with the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// The batch becomes the selection
    Replace,
    /// The batch is added
    Add,
    /// The batch is removed
    Subtract,
}

/// Current selection of a canvas
#[derive(Debug, Clone, Default)]
pub struct Selection {
    items: IndexSet<ItemId>,
    highlighted_links: IndexMap<LinkId, u32>,
    selected_nodes: IndexSet<NodeId>,
    current_node: Option<NodeId>,
    refcount_links: bool,
}

impl Selection {
    /// Create an empty selection.
    ///
    /// With `refcount_links` a link stays highlighted until every selected
    /// node touching it is deselected; without it the first deselection
    /// clears the highlight.
    pub fn new(refcount_links: bool) -> Self {
        Self {
            refcount_links,
            ..Self::default()
        }
    }

    /// Select an item. Returns `true` if the selection changed.
    pub fn select(&mut self, graph: &mut Graph, item: ItemId) -> bool {
        if self.items.contains(&item) || !graph.set_item_selected(item, true) {
            return false;
        }
        self.items.insert(item);
        if let ItemId::Node(id) = item {
            self.selected_nodes.insert(id);
            self.current_node = Some(id);
            let links: Vec<LinkId> =
                graph.node(id).map(|n| n.link_ids().collect()).unwrap_or_default();
            for link in links {
                self.highlight(link);
            }
        }
        true
    }

    /// Deselect an item. Returns `true` if the selection changed.
    pub fn deselect(&mut self, graph: &mut Graph, item: ItemId) -> bool {
        if !self.items.shift_remove(&item) {
            return false;
        }
        graph.set_item_selected(item, false);
        if let ItemId::Node(id) = item {
            self.selected_nodes.shift_remove(&id);
            if self.current_node == Some(id) {
                self.current_node = self.selected_nodes.last().copied();
            }
            let links: Vec<LinkId> =
                graph.node(id).map(|n| n.link_ids().collect()).unwrap_or_default();
            for link in links {
                self.unhighlight(link);
            }
        }
        true
    }

    /// Flip an item's membership
    pub fn toggle(&mut self, graph: &mut Graph, item: ItemId) {
        if self.is_selected(item) {
            self.deselect(graph, item);
        } else {
            self.select(graph, item);
        }
    }

    /// Deselect everything except `keep`
    pub fn deselect_all(&mut self, graph: &mut Graph, keep: Option<ItemId>) {
        let items: Vec<ItemId> = self.items.iter().copied().filter(|i| Some(*i) != keep).collect();
        for item in items {
            self.deselect(graph, item);
        }
        if keep.is_none() {
            self.highlighted_links.clear();
        }
    }

    /// Make `item` the only selected item
    pub fn select_only(&mut self, graph: &mut Graph, item: ItemId) {
        self.deselect_all(graph, Some(item));
        self.select(graph, item);
    }

    /// Select every item in the graph
    pub fn select_all(&mut self, graph: &mut Graph) {
        for item in graph.items() {
            self.select(graph, item);
        }
    }

    /// Combine a batch of items with the selection
    pub fn apply(&mut self, graph: &mut Graph, batch: &[ItemId], mode: SelectionMode) {
        match mode {
            SelectionMode::Replace => {
                let keep: IndexSet<ItemId> = batch.iter().copied().collect();
                let stale: Vec<ItemId> =
                    self.items.iter().copied().filter(|i| !keep.contains(i)).collect();
                for item in stale {
                    self.deselect(graph, item);
                }
                for item in batch {
                    self.select(graph, *item);
                }
            }
            SelectionMode::Add => {
                for item in batch {
                    self.select(graph, *item);
                }
            }
            SelectionMode::Subtract => {
                for item in batch {
                    self.deselect(graph, *item);
                }
            }
        }
    }

    fn highlight(&mut self, link: LinkId) {
        let count = self.highlighted_links.entry(link).or_insert(0);
        *count = if self.refcount_links { *count + 1 } else { 1 };
    }

    fn unhighlight(&mut self, link: LinkId) {
        if !self.refcount_links {
            self.highlighted_links.shift_remove(&link);
            return;
        }
        if let Some(count) = self.highlighted_links.get_mut(&link) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.highlighted_links.shift_remove(&link);
            }
        }
    }

    /// Drop members and highlights that no longer exist in the graph
    pub fn prune(&mut self, graph: &Graph) {
        self.items.retain(|item| graph.contains_item(*item));
        self.selected_nodes.retain(|id| graph.node(*id).is_some());
        self.highlighted_links.retain(|id, _| graph.link(*id).is_some());
        if self.current_node.is_some_and(|id| !self.selected_nodes.contains(&id)) {
            self.current_node = self.selected_nodes.last().copied();
        }
    }

    /// Highlight links that appeared after their selected endpoints were
    /// selected, such as a link just connected to a selected node
    pub fn refresh_links(&mut self, graph: &Graph) {
        for link in graph.links() {
            if self.highlighted_links.contains_key(&link.id) {
                continue;
            }
            let ends = [link.origin_id, link.target_id]
                .iter()
                .filter(|id| self.selected_nodes.contains(*id))
                .count() as u32;
            if ends > 0 {
                let count = if self.refcount_links { ends } else { 1 };
                self.highlighted_links.insert(link.id, count);
            }
        }
    }

    /// Rebuild from the items' own flags, e.g. after undo restored a snapshot
    pub fn sync_from_graph(&mut self, graph: &mut Graph) {
        let flagged: Vec<ItemId> =
            graph.items().into_iter().filter(|i| graph.is_item_selected(*i)).collect();
        self.items.clear();
        self.selected_nodes.clear();
        self.highlighted_links.clear();
        self.current_node = None;
        for item in flagged {
            self.select(graph, item);
        }
    }

    /// Whether an item is selected
    pub fn is_selected(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    /// Selected items, in selection order
    pub fn items(&self) -> &IndexSet<ItemId> {
        &self.items
    }

    /// Number of selected items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Selected nodes, in selection order
    pub fn selected_nodes(&self) -> &IndexSet<NodeId> {
        &self.selected_nodes
    }

    /// Most recently selected node
    pub fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Whether a link is drawn highlighted
    pub fn is_link_highlighted(&self, link: LinkId) -> bool {
        self.highlighted_links.contains_key(&link)
    }

    /// Highlighted links
    pub fn highlighted_links(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.highlighted_links.keys().copied()
    }

    /// Selected items plus everything inside selected groups
    pub fn selected_items(&self, graph: &mut Graph) -> IndexSet<ItemId> {
        let mut out = IndexSet::new();
        let mut stack: Vec<ItemId> = self.items.iter().copied().collect();
        while let Some(item) = stack.pop() {
            if !out.insert(item) {
                continue;
            }
            if let ItemId::Group(id) = item {
                graph.recompute_inside(id);
                if let Some(group) = graph.group(id) {
                    stack.extend(group.children.iter().copied());
                }
            }
        }
        out
    }
}
