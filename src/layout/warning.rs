//! Non-fatal conditions surfaced to the caller.
//!
//! Each of these is also logged at `warn` level when it happens; the value
//! form exists so callers (and tests) can inspect them without a logger.

use std::fmt;

use serde::Serialize;

use crate::graph::{Connection, NodeId, RoomKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum LayoutWarning {
    /// The catalog had no footprint; the fallback box was used.
    MissingFootprint { node: NodeId, kind: RoomKind },
    /// Every catalog footprint for the room was unplaceable; the fallback
    /// box was used. `name` is the first rejected variant.
    InvalidFootprint {
        node: NodeId,
        kind: RoomKind,
        name: String,
        reason: String,
    },
    /// Rooms still overlap after the last allowed attempt.
    RoomOverlap {
        attempts: u32,
        pairs: Vec<(NodeId, NodeId)>,
    },
    /// A corridor cuts through a third room after all routing attempts.
    CorridorOverlap {
        connection: Connection,
        attempts: u32,
    },
    /// Force terms were dropped because they were not finite.
    NonFiniteForces { skipped: u32 },
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFootprint { node, kind } => {
                write!(f, "no footprint for {node} ({kind}); used fallback")
            }
            Self::InvalidFootprint {
                node,
                kind,
                name,
                reason,
            } => write!(
                f,
                "footprint '{name}' for {node} ({kind}) rejected: {reason}; used fallback"
            ),
            Self::RoomOverlap { attempts, pairs } => write!(
                f,
                "{} room pair(s) still overlap after {attempts} attempt(s)",
                pairs.len()
            ),
            Self::CorridorOverlap {
                connection,
                attempts,
            } => write!(
                f,
                "corridor {connection} crosses a room after {attempts} attempt(s)"
            ),
            Self::NonFiniteForces { skipped } => {
                write!(f, "{skipped} non-finite force term(s) skipped")
            }
        }
    }
}
