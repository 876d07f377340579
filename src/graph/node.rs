//! Node type and related structures.
//!
//! Nodes are the rooms of the dungeon graph. Each node has:
//! - A stable unique identifier (survives pruning of other nodes)
//! - A room kind used to look up a footprint in the catalog
//! - An optional size category narrowing that lookup
//! - A spawn probability in percent (0..=100)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier.
///
/// This ID remains valid even after other nodes are removed from the graph.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Room classifier used to resolve a footprint from the catalog.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomKind {
    /// Entry room. Every generated graph needs at least one.
    Start = 0,
    /// Ordinary room.
    Basic = 1,
    /// Guarded room, usually near the end of a branch.
    Boss = 2,
    /// Reward room, usually a dead end.
    Treasure = 3,
    /// Exit room.
    End = 4,
}

impl From<u8> for RoomKind {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Start,
            2 => Self::Boss,
            3 => Self::Treasure,
            4 => Self::End,
            _ => Self::Basic,
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Basic => "basic",
            Self::Boss => "boss",
            Self::Treasure => "treasure",
            Self::End => "end",
        };
        f.write_str(name)
    }
}

/// Optional size hint for a room.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeCategory {
    Small = 0,
    Medium = 1,
    Large = 2,
}

impl SizeCategory {
    /// Decode a wire value; anything outside 0..=2 means "no size".
    pub fn from_raw(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Small),
            1 => Some(Self::Medium),
            2 => Some(Self::Large),
            _ => None,
        }
    }
}

/// Graph-level room definition, independent of any geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomNode {
    pub id: NodeId,
    pub kind: RoomKind,
    #[serde(default)]
    pub size: Option<SizeCategory>,
    /// Spawn probability in percent. 100 means always kept.
    #[serde(default = "full_probability")]
    pub spawn_probability: f32,
}

fn full_probability() -> f32 {
    100.0
}

impl RoomNode {
    /// Create a node that always spawns.
    pub fn new(id: NodeId, kind: RoomKind) -> Self {
        Self {
            id,
            kind,
            size: None,
            spawn_probability: 100.0,
        }
    }

    /// Set the spawn probability, clamped to [0, 100].
    pub fn with_probability(mut self, probability: f32) -> Self {
        self.spawn_probability = if probability.is_nan() {
            100.0
        } else {
            probability.clamp(0.0, 100.0)
        };
        self
    }

    /// Whether the pruning pass may consider this node at all.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.spawn_probability < 100.0
    }
}
