//! RoomGraph - the authored room topology.
//!
//! The RoomGraph stores rooms and their undirected connections using
//! petgraph's StableGraph, so node indices survive the removals made by the
//! spawn pruning pass. Stable [`NodeId`]s are mapped to petgraph indices
//! through an ordered map: every traversal the layout performs walks rooms in
//! id order, which keeps seeded runs reproducible.

use std::collections::BTreeMap;

use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use super::edge::Connection;
use super::node::{NodeId, RoomKind, RoomNode, SizeCategory};
use crate::error::LayoutError;

/// Plain interchange form of a graph, as handed over by an authoring tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSpec {
    pub nodes: Vec<RoomNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// The room graph.
///
/// This struct manages:
/// - Graph topology via petgraph (undirected, no parallel edges, no loops)
/// - ID mapping between stable ids and internal indices
/// - Id allocation for rooms added without an explicit id
#[derive(Debug, Clone)]
pub struct RoomGraph {
    /// The underlying graph structure. Nodes store the full room definition.
    graph: StableGraph<RoomNode, (), Undirected>,

    /// Map from stable NodeId to petgraph NodeIndex
    node_id_to_index: BTreeMap<NodeId, NodeIndex>,

    /// Next node ID to assign
    next_node_id: u32,
}

impl RoomGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::default(),
            node_id_to_index: BTreeMap::new(),
            next_node_id: 0,
        }
    }

    /// Create a graph with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            node_id_to_index: BTreeMap::new(),
            next_node_id: 0,
        }
    }

    /// Build a graph from its interchange form, rejecting duplicate ids,
    /// duplicate connections, self-loops and dangling endpoints.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self, LayoutError> {
        let mut graph = Self::with_capacity(spec.nodes.len(), spec.connections.len());
        for node in &spec.nodes {
            graph.insert_node(*node)?;
        }
        for connection in &spec.connections {
            graph.connect(connection.a(), connection.b())?;
        }
        Ok(graph)
    }

    /// Export the graph in interchange form (nodes and connections in id order).
    pub fn to_spec(&self) -> GraphSpec {
        GraphSpec {
            nodes: self.nodes().copied().collect(),
            connections: self.connections(),
        }
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a room with a freshly allocated id.
    pub fn add_room(
        &mut self,
        kind: RoomKind,
        size: Option<SizeCategory>,
        spawn_probability: f32,
    ) -> NodeId {
        let id = NodeId(self.next_node_id);
        let mut node = RoomNode::new(id, kind).with_probability(spawn_probability);
        node.size = size;
        self.attach(node);
        id
    }

    /// Insert a room with a caller-chosen id.
    pub fn insert_node(&mut self, node: RoomNode) -> Result<NodeId, LayoutError> {
        if self.node_id_to_index.contains_key(&node.id) {
            return Err(LayoutError::DuplicateNode(node.id));
        }
        let node = node.with_probability(node.spawn_probability);
        self.attach(node);
        Ok(node.id)
    }

    fn attach(&mut self, node: RoomNode) {
        let index = self.graph.add_node(node);
        self.node_id_to_index.insert(node.id, index);
        self.next_node_id = self.next_node_id.max(node.id.0.saturating_add(1));
    }

    /// Remove a room and all of its connections.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RoomNode> {
        let index = self.node_id_to_index.remove(&id)?;
        self.graph.remove_node(index)
    }

    /// Get the number of rooms.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_id_to_index.contains_key(&id)
    }

    /// Look up a room definition.
    pub fn node(&self, id: NodeId) -> Option<&RoomNode> {
        self.node_id_to_index
            .get(&id)
            .and_then(|&index| self.graph.node_weight(index))
    }

    /// All rooms in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &RoomNode> + '_ {
        self.node_id_to_index
            .values()
            .filter_map(|&index| self.graph.node_weight(index))
    }

    /// All room ids in ascending order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.node_id_to_index.keys().copied().collect()
    }

    /// Whether any room is a start room.
    pub fn has_start(&self) -> bool {
        self.nodes().any(|node| node.kind == RoomKind::Start)
    }

    // =========================================================================
    // Connection Operations
    // =========================================================================

    /// Connect two rooms.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<Connection, LayoutError> {
        if a == b {
            return Err(LayoutError::SelfLoop(a));
        }
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if self.graph.find_edge(ia, ib).is_some() {
            return Err(LayoutError::DuplicateConnection(a, b));
        }
        self.graph.add_edge(ia, ib, ());
        Ok(Connection::new(a, b))
    }

    /// Remove the connection between two rooms.
    ///
    /// Returns true if the connection existed.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> bool {
        let (Ok(ia), Ok(ib)) = (self.index_of(a), self.index_of(b)) else {
            return false;
        };
        match self.graph.find_edge(ia, ib) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    pub fn are_connected(&self, a: NodeId, b: NodeId) -> bool {
        match (self.node_id_to_index.get(&a), self.node_id_to_index.get(&b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Get the number of connections.
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of connections touching a room (0 for unknown rooms).
    pub fn degree(&self, id: NodeId) -> usize {
        self.node_id_to_index
            .get(&id)
            .map(|&index| self.graph.edges(index).count())
            .unwrap_or(0)
    }

    /// Neighbors of a room in ascending id order.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let mut neighbors: Vec<NodeId> = self
            .node_id_to_index
            .get(&id)
            .map(|&index| {
                self.graph
                    .neighbors(index)
                    .filter_map(|n| self.graph.node_weight(n).map(|node| node.id))
                    .collect()
            })
            .unwrap_or_default();
        neighbors.sort_unstable();
        neighbors
    }

    /// All connections, sorted.
    pub fn connections(&self) -> Vec<Connection> {
        let mut connections: Vec<Connection> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let a = self.graph.node_weight(edge.source())?.id;
                let b = self.graph.node_weight(edge.target())?.id;
                Some(Connection::new(a, b))
            })
            .collect();
        connections.sort_unstable();
        connections
    }

    /// Clear all rooms and connections, resetting id allocation.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_id_to_index.clear();
        self.next_node_id = 0;
    }

    fn index_of(&self, id: NodeId) -> Result<NodeIndex, LayoutError> {
        self.node_id_to_index
            .get(&id)
            .copied()
            .ok_or(LayoutError::UnknownNode(id))
    }
}

impl Default for RoomGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> (RoomGraph, Vec<NodeId>) {
        let mut graph = RoomGraph::new();
        let ids: Vec<_> = (0..len)
            .map(|_| graph.add_room(RoomKind::Basic, None, 100.0))
            .collect();
        for pair in ids.windows(2) {
            graph.connect(pair[0], pair[1]).unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn test_add_room() {
        let mut graph = RoomGraph::new();
        let id = graph.add_room(RoomKind::Start, Some(SizeCategory::Large), 100.0);

        assert_eq!(graph.node_count(), 1);
        let node = graph.node(id).unwrap();
        assert_eq!(node.kind, RoomKind::Start);
        assert_eq!(node.size, Some(SizeCategory::Large));
        assert!(graph.has_start());
    }

    #[test]
    fn test_insert_node_rejects_duplicate_id() {
        let mut graph = RoomGraph::new();
        graph.insert_node(RoomNode::new(NodeId(5), RoomKind::Basic)).unwrap();
        let err = graph
            .insert_node(RoomNode::new(NodeId(5), RoomKind::End))
            .unwrap_err();
        assert_eq!(err, LayoutError::DuplicateNode(NodeId(5)));

        // Allocation continues past explicit ids
        let next = graph.add_room(RoomKind::Basic, None, 100.0);
        assert_eq!(next, NodeId(6));
    }

    #[test]
    fn test_connect_rejects_self_loop_and_duplicates() {
        let (mut graph, ids) = chain(2);
        assert_eq!(
            graph.connect(ids[0], ids[0]),
            Err(LayoutError::SelfLoop(ids[0]))
        );
        assert_eq!(
            graph.connect(ids[1], ids[0]),
            Err(LayoutError::DuplicateConnection(ids[1], ids[0]))
        );
        assert_eq!(
            graph.connect(ids[0], NodeId(99)),
            Err(LayoutError::UnknownNode(NodeId(99)))
        );
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_neighbors_and_degree() {
        let (graph, ids) = chain(3);
        assert_eq!(graph.neighbors(ids[1]), vec![ids[0], ids[2]]);
        assert_eq!(graph.degree(ids[1]), 2);
        assert_eq!(graph.degree(ids[0]), 1);
        assert_eq!(graph.degree(NodeId(42)), 0);
    }

    #[test]
    fn test_remove_node_drops_connections() {
        let (mut graph, ids) = chain(3);
        let removed = graph.remove_node(ids[1]);
        assert!(removed.is_some());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 0);
        assert!(!graph.are_connected(ids[0], ids[1]));
        assert!(graph.remove_node(ids[1]).is_none());
    }

    #[test]
    fn test_disconnect() {
        let (mut graph, ids) = chain(2);
        assert!(graph.disconnect(ids[1], ids[0]));
        assert!(!graph.disconnect(ids[0], ids[1]));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_spec_round_trip_preserves_order() {
        let (graph, ids) = chain(4);
        let spec = graph.to_spec();
        assert_eq!(spec.nodes.len(), 4);
        assert_eq!(spec.connections[0], Connection::new(ids[0], ids[1]));

        let rebuilt = RoomGraph::from_spec(&spec).unwrap();
        assert_eq!(rebuilt.connections(), graph.connections());
        assert_eq!(rebuilt.node_ids(), ids);
    }

    #[test]
    fn test_from_spec_rejects_dangling_connection() {
        let spec = GraphSpec {
            nodes: vec![RoomNode::new(NodeId(0), RoomKind::Start)],
            connections: vec![Connection::new(NodeId(0), NodeId(1))],
        };
        assert_eq!(
            RoomGraph::from_spec(&spec).unwrap_err(),
            LayoutError::UnknownNode(NodeId(1))
        );
    }

    #[test]
    fn test_clear() {
        let (mut graph, _) = chain(3);
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(graph.add_room(RoomKind::Start, None, 100.0), NodeId(0));
    }
}
