//! Room graph data structures and graph-level passes.
//!
//! This module provides the room topology using petgraph's StableGraph for
//! stable indices across pruning, the all-pairs hop-distance table used to
//! weight repulsion, and the probabilistic spawn pruning pass.

mod distance;
mod edge;
mod engine;
mod node;
mod pruning;

pub use distance::{DistanceTable, INFINITE_DISTANCE};
pub use edge::Connection;
pub use engine::{GraphSpec, RoomGraph};
pub use node::{NodeId, RoomKind, RoomNode, SizeCategory};
pub use pruning::{MAX_PRUNABLE_DEGREE, PruneReport, SpawnRoll, prune_spawns, prune_spawns_with};
