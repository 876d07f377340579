//! Connection type.
//!
//! Connections are undirected: `Connection::new(a, b)` and
//! `Connection::new(b, a)` compare equal and hash identically, which is what
//! lets the graph reject duplicates regardless of authoring order.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Unordered pair of node ids, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(NodeId, NodeId)", into = "(NodeId, NodeId)")]
pub struct Connection {
    low: NodeId,
    high: NodeId,
}

impl Connection {
    /// Create a normalized connection.
    #[inline]
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Endpoint with the smaller id.
    #[inline]
    pub fn a(self) -> NodeId {
        self.low
    }

    /// Endpoint with the larger id.
    #[inline]
    pub fn b(self) -> NodeId {
        self.high
    }
}

impl From<(NodeId, NodeId)> for Connection {
    fn from((a, b): (NodeId, NodeId)) -> Self {
        Self::new(a, b)
    }
}

impl From<Connection> for (NodeId, NodeId) {
    fn from(c: Connection) -> Self {
        (c.low, c.high)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.low.0, self.high.0)
    }
}
