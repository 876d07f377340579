//! Spatial indexing for room overlap queries.
//!
//! This module provides an R-tree based index over room bounding boxes,
//! shared by the room overlap check and the corridor router.

mod rtree;

pub use rtree::{FootprintIndex, RoomBox};
