//! R-tree based index over room bounding boxes using the rstar crate.
//!
//! Provides O(log n) queries for:
//! - Rooms whose box intersects a query box (corridor cell tests)
//! - All overlapping room pairs (regeneration check)

use rstar::{AABB, RTree, RTreeObject};

use crate::graph::NodeId;
use crate::layout::BoundingBox;

/// A room box in the spatial index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomBox {
    /// The room identifier.
    pub id: NodeId,
    /// World-space bounds.
    pub bounds: BoundingBox,
}

impl RoomBox {
    /// Create a new RoomBox.
    pub fn new(id: NodeId, bounds: BoundingBox) -> Self {
        Self { id, bounds }
    }
}

impl RTreeObject for RoomBox {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bounds.min(), self.bounds.max())
    }
}

/// Spatial index for placed rooms.
///
/// Uses an R*-tree for candidate lookup, then confirms with a strict box
/// test, since rstar envelopes treat shared edges as intersecting.
pub struct FootprintIndex {
    tree: RTree<RoomBox>,
}

impl FootprintIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Bulk load an index from room boxes.
    pub fn from_boxes(boxes: Vec<RoomBox>) -> Self {
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Insert a room into the index.
    pub fn insert(&mut self, id: NodeId, bounds: BoundingBox) {
        self.tree.insert(RoomBox::new(id, bounds));
    }

    /// Rooms whose box strictly intersects `query`, skipping `exclude`.
    pub fn intersecting(&self, query: &BoundingBox, exclude: &[NodeId]) -> Vec<NodeId> {
        let envelope = AABB::from_corners(query.min(), query.max());
        let mut hits: Vec<NodeId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|room| !exclude.contains(&room.id) && room.bounds.intersects(query))
            .map(|room| room.id)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Whether any room other than `exclude` strictly intersects `query`.
    pub fn any_intersecting(&self, query: &BoundingBox, exclude: &[NodeId]) -> bool {
        let envelope = AABB::from_corners(query.min(), query.max());
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .any(|room| !exclude.contains(&room.id) && room.bounds.intersects(query))
    }

    /// Every unordered pair of overlapping rooms, sorted, smaller id first.
    pub fn overlapping_pairs(&self) -> Vec<(NodeId, NodeId)> {
        let mut pairs = Vec::new();
        for room in self.tree.iter() {
            for other in self.intersecting(&room.bounds, &[room.id]) {
                if room.id < other {
                    pairs.push((room.id, other));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }

    /// Clear all rooms from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Get the number of rooms in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for FootprintIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f32, cy: f32, size: f32) -> BoundingBox {
        BoundingBox::new(cx, cy, size, size)
    }

    #[test]
    fn test_intersecting_excludes() {
        let mut index = FootprintIndex::new();
        index.insert(NodeId(0), square(0.0, 0.0, 10.0));
        index.insert(NodeId(1), square(20.0, 0.0, 10.0));
        index.insert(NodeId(2), square(4.0, 4.0, 4.0));

        let query = square(3.0, 3.0, 2.0);
        assert_eq!(index.intersecting(&query, &[]), vec![NodeId(0), NodeId(2)]);
        assert_eq!(index.intersecting(&query, &[NodeId(0)]), vec![NodeId(2)]);
        assert!(!index.any_intersecting(&query, &[NodeId(0), NodeId(2)]));
    }

    #[test]
    fn test_touching_boxes_do_not_count() {
        let mut index = FootprintIndex::new();
        index.insert(NodeId(0), square(0.0, 0.0, 10.0));
        index.insert(NodeId(1), square(10.0, 0.0, 10.0));
        assert!(index.overlapping_pairs().is_empty());
    }

    #[test]
    fn test_overlapping_pairs() {
        let index = FootprintIndex::from_boxes(vec![
            RoomBox::new(NodeId(3), square(0.0, 0.0, 10.0)),
            RoomBox::new(NodeId(1), square(5.0, 0.0, 10.0)),
            RoomBox::new(NodeId(2), square(100.0, 0.0, 10.0)),
            RoomBox::new(NodeId(0), square(0.0, 5.0, 10.0)),
        ]);
        assert_eq!(
            index.overlapping_pairs(),
            vec![(NodeId(0), NodeId(1)), (NodeId(0), NodeId(3)), (NodeId(1), NodeId(3))]
        );
    }

    #[test]
    fn test_clear() {
        let mut index = FootprintIndex::new();
        index.insert(NodeId(0), square(0.0, 0.0, 1.0));
        assert_eq!(index.len(), 1);
        index.clear();
        assert!(index.is_empty());
    }
}
