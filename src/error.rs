//! Error types for graph construction and layout generation.
//!
//! Only malformed input aborts a run. Overlap that survives the retry
//! budgets, missing catalog entries and non-finite force terms are reported
//! as [`LayoutWarning`](crate::layout::LayoutWarning)s instead.

use thiserror::Error;

use crate::graph::NodeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("room graph is empty")]
    EmptyGraph,

    #[error("room graph has no start room")]
    MissingStartRoom,

    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("{0} already exists")]
    DuplicateNode(NodeId),

    #[error("{0} cannot connect to itself")]
    SelfLoop(NodeId),

    #[error("{0} and {1} are already connected")]
    DuplicateConnection(NodeId, NodeId),

    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
}

impl LayoutError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}
