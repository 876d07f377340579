//! Corridor routing between placed rooms.
//!
//! # Algorithm
//!
//! For each connection, in order:
//!
//! 1. **Anchors**: each end uses its exit anchors ranked by distance to the
//!    other room's center, or its box center when it has none.
//! 2. **Candidates**: attempts 0 and 1 take the anchors of rank 0 and 1
//!    (wrapping around the available exits) with the corridor's base shape.
//!    Later attempts fix the closest anchors and cycle the shape through
//!    direct, horizontal-first and vertical-first.
//! 3. **Test**: the centerline is widened to the corridor width, and every
//!    cell is checked against every room except the two being joined.
//! 4. **Draw**: the first clean candidate is drawn into the occupancy grid.
//!    When none is clean, the last one is drawn and a warning is raised.

use std::collections::BTreeMap;

use serde::Serialize;

use super::config::{CorridorShape, LayoutConfig};
use super::footprint::{BoundingBox, RoomFootprint};
use super::occupancy::OccupancyGrid;
use super::placement::Position;
use super::raster::{self, GridCell};
use super::warning::LayoutWarning;
use crate::graph::{Connection, NodeId};
use crate::rng::LayoutRng;
use crate::spatial::FootprintIndex;

/// Geometry of one corridor centerline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PathShape {
    Direct,
    /// Corner at `(end.x, start.y)`.
    HorizontalFirst,
    /// Corner at `(start.x, end.y)`.
    VerticalFirst,
}

/// Shapes tried, in order, once anchor variation is used up.
const SHAPE_CYCLE: [PathShape; 3] = [
    PathShape::Direct,
    PathShape::HorizontalFirst,
    PathShape::VerticalFirst,
];

/// Attempts that vary anchors before the shape cycle starts.
const ANCHOR_ATTEMPTS: u32 = 2;

impl PathShape {
    /// Centerline cells from `from` to `to`, both included.
    pub fn rasterize(self, from: GridCell, to: GridCell) -> Vec<GridCell> {
        match self {
            Self::Direct => raster::line(from, to),
            Self::HorizontalFirst => raster::polyline(from, GridCell::new(to.x, from.y), to),
            Self::VerticalFirst => raster::polyline(from, GridCell::new(from.x, to.y), to),
        }
    }

    /// Right-angle shape for the corridor at `index`, alternating sides.
    fn alternating(index: usize) -> Self {
        if index % 2 == 0 {
            Self::HorizontalFirst
        } else {
            Self::VerticalFirst
        }
    }
}

/// A routed corridor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorridorPath {
    pub connection: Connection,
    /// Cell of the anchor on `connection.a()`.
    pub from: GridCell,
    /// Cell of the anchor on `connection.b()`.
    pub to: GridCell,
    pub shape: PathShape,
    /// Centerline, `from` first.
    pub cells: Vec<GridCell>,
    /// Width in cells.
    pub width: u32,
    /// Attempts made, including the accepted one.
    pub attempts: u32,
    /// The drawn candidate still crosses a third room.
    pub overlapping: bool,
}

impl CorridorPath {
    /// Every cell covered once the centerline is widened.
    pub fn expanded_cells(&self) -> Vec<GridCell> {
        raster::expand(&self.cells, self.width)
    }
}

/// A room as the router sees it: world box center and world exit points.
#[derive(Debug, Clone)]
struct PlacedRoom {
    bounds: BoundingBox,
    center: (f32, f32),
    exits: Vec<(f32, f32)>,
}

/// Routes corridors over a fixed room placement.
pub struct CorridorRouter<'a> {
    config: &'a LayoutConfig,
    rooms: BTreeMap<NodeId, PlacedRoom>,
    index: FootprintIndex,
}

impl<'a> CorridorRouter<'a> {
    pub fn new(
        config: &'a LayoutConfig,
        positions: &BTreeMap<NodeId, Position>,
        footprints: &BTreeMap<NodeId, RoomFootprint>,
    ) -> Self {
        let mut rooms = BTreeMap::new();
        let mut index = FootprintIndex::new();
        for (&id, pos) in positions {
            let Some(footprint) = footprints.get(&id) else {
                continue;
            };
            let bounds = footprint.bounds_at(pos.x, pos.y);
            index.insert(id, bounds);
            rooms.insert(
                id,
                PlacedRoom {
                    bounds,
                    center: (bounds.center_x, bounds.center_y),
                    exits: footprint
                        .exits
                        .iter()
                        .map(|e| (pos.x + e.x, pos.y + e.y))
                        .collect(),
                },
            );
        }
        Self {
            config,
            rooms,
            index,
        }
    }

    /// Anchor points of `room`, closest to `other`'s center first. Falls back
    /// to the room's own center when it declares no exits.
    pub fn ranked_anchors(&self, room: NodeId, other: NodeId) -> Vec<(f32, f32)> {
        let (Some(r), Some(o)) = (self.rooms.get(&room), self.rooms.get(&other)) else {
            return Vec::new();
        };
        if r.exits.is_empty() {
            return vec![r.center];
        }
        let mut ranked = r.exits.clone();
        let dist = |p: &(f32, f32)| (p.0 - o.center.0).powi(2) + (p.1 - o.center.1).powi(2);
        ranked.sort_by(|a, b| dist(a).total_cmp(&dist(b)));
        ranked
    }

    /// Base shape for the corridor at `index` under the configured policy.
    pub fn base_shape(&self, index: usize, rng: &mut LayoutRng) -> PathShape {
        match self.config.corridor_shape {
            CorridorShape::Direct => PathShape::Direct,
            CorridorShape::Angled => PathShape::alternating(index),
            CorridorShape::Mixed => {
                if rng.coin() {
                    PathShape::Direct
                } else {
                    PathShape::alternating(index)
                }
            }
        }
    }

    /// Candidate for attempt `attempt` (0-based), not yet tested or drawn.
    pub fn candidate(
        &self,
        connection: Connection,
        base: PathShape,
        attempt: u32,
    ) -> Option<CorridorPath> {
        let (a, b) = (connection.a(), connection.b());
        let anchors_a = self.ranked_anchors(a, b);
        let anchors_b = self.ranked_anchors(b, a);
        if anchors_a.is_empty() || anchors_b.is_empty() {
            return None;
        }

        let (rank, shape) = if attempt < ANCHOR_ATTEMPTS {
            (attempt as usize, base)
        } else {
            (0, SHAPE_CYCLE[((attempt - ANCHOR_ATTEMPTS) as usize) % SHAPE_CYCLE.len()])
        };
        let pa = anchors_a[rank % anchors_a.len()];
        let pb = anchors_b[rank % anchors_b.len()];

        let cs = self.config.cell_size;
        let from = GridCell::from_world(pa.0, pa.1, cs);
        let to = GridCell::from_world(pb.0, pb.1, cs);
        Some(CorridorPath {
            connection,
            from,
            to,
            shape,
            cells: shape.rasterize(from, to),
            width: self.config.corridor_width,
            attempts: attempt + 1,
            overlapping: false,
        })
    }

    /// Whether any widened cell cuts a room other than the two endpoints.
    pub fn crosses_other_room(&self, path: &CorridorPath) -> bool {
        let exclude = [path.connection.a(), path.connection.b()];
        let cs = self.config.cell_size;
        path.expanded_cells()
            .iter()
            .any(|cell| self.index.any_intersecting(&cell.bounds(cs), &exclude))
    }

    /// Route one corridor without drawing it.
    pub fn route(
        &self,
        connection: Connection,
        index: usize,
        rng: &mut LayoutRng,
    ) -> Option<(CorridorPath, Option<LayoutWarning>)> {
        let base = self.base_shape(index, rng);
        let attempts = self.config.corridor_attempts();

        let mut last = None;
        for attempt in 0..attempts {
            let path = self.candidate(connection, base, attempt)?;
            if !self.crosses_other_room(&path) {
                return Some((path, None));
            }
            log::debug!("corridor {connection} attempt {} crosses a room", attempt + 1);
            last = Some(path);
        }

        let mut path = last?;
        path.overlapping = true;
        log::warn!(
            "corridor {connection} still crosses a room after {} attempt(s)",
            path.attempts
        );
        let warning = LayoutWarning::CorridorOverlap {
            connection,
            attempts: path.attempts,
        };
        Some((path, Some(warning)))
    }

    /// Stamp every room's box into `grid`.
    pub fn stamp_rooms(&self, grid: &mut OccupancyGrid) {
        for (&id, room) in &self.rooms {
            grid.stamp_room(id, &room.bounds);
        }
    }

    /// Route and draw every connection, in order.
    pub fn route_all(
        &self,
        connections: &[Connection],
        grid: &mut OccupancyGrid,
        rng: &mut LayoutRng,
    ) -> (Vec<CorridorPath>, Vec<LayoutWarning>) {
        let mut paths = Vec::with_capacity(connections.len());
        let mut warnings = Vec::new();
        for (index, &connection) in connections.iter().enumerate() {
            let Some((path, warning)) = self.route(connection, index, rng) else {
                log::warn!("corridor {connection} skipped: endpoint has no placement");
                continue;
            };
            grid.draw_corridor(&path.expanded_cells());
            warnings.extend(warning);
            paths.push(path);
        }
        log::info!("routed {} corridor(s)", paths.len());
        (paths, warnings)
    }
}
