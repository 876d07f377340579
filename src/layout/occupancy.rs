//! Shared cell grid that rooms and corridors are drawn into.
//!
//! Rooms are stamped first. Corridors fill only empty cells, so a later
//! corridor never overwrites a room or an earlier corridor.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::footprint::BoundingBox;
use super::raster::GridCell;
use crate::graph::NodeId;

/// Content of an occupied cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Room(NodeId),
    Corridor,
}

/// Sparse occupancy grid. Unlisted cells are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OccupancyGrid {
    cell_size: f32,
    cells: BTreeMap<GridCell, Cell>,
}

impl OccupancyGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: BTreeMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.cells.get(&GridCell::new(x, y)).copied()
    }

    /// Mark every cell whose center lies inside `bounds` as belonging to
    /// `room`. Overwrites whatever was there.
    pub fn stamp_room(&mut self, room: NodeId, bounds: &BoundingBox) {
        let [min_x, min_y] = bounds.min();
        let [max_x, max_y] = bounds.max();
        let cs = self.cell_size;
        let x0 = (min_x / cs - 0.5).ceil() as i32;
        let y0 = (min_y / cs - 0.5).ceil() as i32;
        let x1 = (max_x / cs - 0.5).floor() as i32;
        let y1 = (max_y / cs - 0.5).floor() as i32;
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.cells.insert(GridCell::new(x, y), Cell::Room(room));
            }
        }
    }

    /// Fill empty cells with corridor. Returns how many were written.
    pub fn draw_corridor(&mut self, cells: &[GridCell]) -> usize {
        let mut written = 0;
        for &cell in cells {
            if let Entry::Vacant(slot) = self.cells.entry(cell) {
                slot.insert(Cell::Corridor);
                written += 1;
            }
        }
        written
    }

    /// Inclusive `(min, max)` cell corners of everything drawn.
    pub fn bounds(&self) -> Option<(GridCell, GridCell)> {
        let mut keys = self.cells.keys();
        let first = *keys.next()?;
        let (mut min, mut max) = (first, first);
        for c in keys {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        Some((min, max))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCell, Cell)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, *v))
    }

    pub fn corridor_count(&self) -> usize {
        self.cells.values().filter(|c| **c == Cell::Corridor).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_room_covers_cell_centers_inside() {
        let mut grid = OccupancyGrid::new(1.0);
        grid.stamp_room(NodeId(4), &BoundingBox::new(0.0, 0.0, 4.0, 2.0));
        // x in [-2, 2] -> cells -2..=1, y in [-1, 1] -> cells -1..=0
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.cell(-2, -1), Some(Cell::Room(NodeId(4))));
        assert_eq!(grid.cell(1, 0), Some(Cell::Room(NodeId(4))));
        assert_eq!(grid.cell(2, 0), None);
        assert_eq!(grid.bounds(), Some((GridCell::new(-2, -1), GridCell::new(1, 0))));
    }

    #[test]
    fn test_corridor_never_overwrites() {
        let mut grid = OccupancyGrid::new(1.0);
        grid.stamp_room(NodeId(1), &BoundingBox::new(0.5, 0.5, 1.0, 1.0));
        let written = grid.draw_corridor(&[GridCell::new(0, 0), GridCell::new(1, 0)]);
        assert_eq!(written, 1);
        assert_eq!(grid.cell(0, 0), Some(Cell::Room(NodeId(1))));
        assert_eq!(grid.cell(1, 0), Some(Cell::Corridor));

        // Second corridor over the first
        assert_eq!(grid.draw_corridor(&[GridCell::new(1, 0)]), 0);
        assert_eq!(grid.corridor_count(), 1);
    }

    #[test]
    fn test_empty_grid_has_no_bounds() {
        let grid = OccupancyGrid::new(2.0);
        assert!(grid.is_empty());
        assert_eq!(grid.bounds(), None);
    }
}
