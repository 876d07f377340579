//! Spawn pruning pass.
//!
//! Optional rooms (spawn probability below 100%) with at most two
//! connections get one roll each. A failed roll removes the room; when the
//! removed room sat between exactly two distinct neighbors that were not
//! already connected, those neighbors are joined directly so the dungeon
//! stays traversable. Rooms with more than two connections are hubs and are
//! never removed.

use serde::Serialize;

use super::edge::Connection;
use super::engine::RoomGraph;
use super::node::{NodeId, RoomNode};
use crate::rng::LayoutRng;

/// Connection count above which a room is never pruned.
pub const MAX_PRUNABLE_DEGREE: usize = 2;

/// Decides whether an optional room survives.
pub trait SpawnRoll {
    fn survives(&mut self, node: &RoomNode) -> bool;
}

/// One uniform draw in [0, 100); the room is removed when the draw is at or
/// above its probability.
impl SpawnRoll for LayoutRng {
    fn survives(&mut self, node: &RoomNode) -> bool {
        self.percent() < node.spawn_probability
    }
}

impl<F> SpawnRoll for F
where
    F: FnMut(&RoomNode) -> bool,
{
    fn survives(&mut self, node: &RoomNode) -> bool {
        self(node)
    }
}

/// What the pruning pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneReport {
    /// Rooms removed, in the order they were rolled.
    pub removed: Vec<NodeId>,
    /// Bypass connections added around removed rooms.
    pub bypasses: Vec<Connection>,
    /// Optional rooms kept because they had too many connections.
    pub protected: Vec<NodeId>,
}

/// Prune with the run's RNG.
pub fn prune_spawns(graph: &mut RoomGraph, rng: &mut LayoutRng) -> PruneReport {
    prune_spawns_with(graph, rng)
}

/// Prune with an arbitrary roll source.
///
/// Rooms are visited once each in ascending id order. Connection counts are
/// read at the moment a room is visited, so an earlier removal (or bypass)
/// can change whether a later room qualifies.
pub fn prune_spawns_with<R: SpawnRoll + ?Sized>(
    graph: &mut RoomGraph,
    roll: &mut R,
) -> PruneReport {
    let mut report = PruneReport::default();

    for id in graph.node_ids() {
        let Some(node) = graph.node(id).copied() else {
            continue;
        };
        if !node.is_optional() {
            continue;
        }

        let degree = graph.degree(id);
        if degree > MAX_PRUNABLE_DEGREE {
            log::info!(
                "prune: keeping {} ({} at {}%): {} connections",
                id,
                node.kind,
                node.spawn_probability,
                degree
            );
            report.protected.push(id);
            continue;
        }

        if roll.survives(&node) {
            continue;
        }

        let neighbors = graph.neighbors(id);
        graph.remove_node(id);
        report.removed.push(id);
        log::debug!("prune: removed {} ({})", id, node.kind);

        if let [a, b] = neighbors[..] {
            if a != b && !graph.are_connected(a, b) {
                if let Ok(bypass) = graph.connect(a, b) {
                    log::debug!("prune: bypass {}", bypass);
                    report.bypasses.push(bypass);
                }
            }
        }
    }

    if !report.removed.is_empty() {
        log::info!(
            "prune: removed {} room(s), added {} bypass(es)",
            report.removed.len(),
            report.bypasses.len()
        );
    }
    report
}
