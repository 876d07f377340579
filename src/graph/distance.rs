//! All-pairs shortest hop counts (Floyd-Warshall).
//!
//! The table feeds the repulsion term of the relaxation as an importance
//! weight: rooms that are far apart in the graph push each other harder.
//!
//! Pairs with no path between them keep [`INFINITE_DISTANCE`], a large but
//! finite hop count: disconnected rooms push each other apart far harder
//! than any connected pair, and the repulsion term stays finite.

use std::collections::BTreeMap;

use super::engine::RoomGraph;
use super::node::NodeId;

/// Hop count of pairs with no path between them.
pub const INFINITE_DISTANCE: u32 = 999_999;

/// Immutable shortest-path table for one pruned graph.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    /// Row/column order of the matrix.
    ids: Vec<NodeId>,
    /// Map from NodeId to its row.
    slots: BTreeMap<NodeId, usize>,
    /// Row-major n*n hop counts.
    matrix: Vec<u32>,
}

impl DistanceTable {
    /// Solve all pairs for the given graph. O(N^3) in room count.
    pub fn compute(graph: &RoomGraph) -> Self {
        let ids = graph.node_ids();
        let n = ids.len();
        let slots: BTreeMap<NodeId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut matrix = vec![INFINITE_DISTANCE; n * n];
        for i in 0..n {
            matrix[i * n + i] = 0;
        }
        for connection in graph.connections() {
            if let (Some(&i), Some(&j)) = (slots.get(&connection.a()), slots.get(&connection.b())) {
                matrix[i * n + j] = 1;
                matrix[j * n + i] = 1;
            }
        }

        for k in 0..n {
            for i in 0..n {
                let ik = matrix[i * n + k];
                if ik == INFINITE_DISTANCE {
                    continue;
                }
                for j in 0..n {
                    let kj = matrix[k * n + j];
                    if kj == INFINITE_DISTANCE {
                        continue;
                    }
                    let through = ik + kj;
                    if through < matrix[i * n + j] {
                        matrix[i * n + j] = through;
                    }
                }
            }
        }

        let disconnected = matrix.iter().filter(|&&d| d == INFINITE_DISTANCE).count();
        if disconnected > 0 {
            log::debug!(
                "distance table: {} ordered pair(s) unreachable, weighted {}",
                disconnected,
                INFINITE_DISTANCE
            );
        }

        Self { ids, slots, matrix }
    }

    /// Shortest hop count between two rooms.
    ///
    /// Unreachable pairs and unknown ids yield [`INFINITE_DISTANCE`].
    pub fn distance(&self, a: NodeId, b: NodeId) -> u32 {
        match (self.slots.get(&a), self.slots.get(&b)) {
            (Some(&i), Some(&j)) => self.by_slot(i, j),
            _ => INFINITE_DISTANCE,
        }
    }

    /// Hop count by matrix slot. Slots follow ascending id order.
    #[inline]
    pub fn by_slot(&self, i: usize, j: usize) -> u32 {
        self.matrix[i * self.ids.len() + j]
    }

    /// Whether a path exists between two rooms.
    pub fn is_reachable(&self, a: NodeId, b: NodeId) -> bool {
        self.distance(a, b) < INFINITE_DISTANCE
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
