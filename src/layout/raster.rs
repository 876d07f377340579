//! Grid rasterization for corridors.

use serde::{Deserialize, Serialize};

use super::footprint::BoundingBox;

/// Integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing a world point.
    pub fn from_world(x: f32, y: f32, cell_size: f32) -> Self {
        Self::new((x / cell_size).floor() as i32, (y / cell_size).floor() as i32)
    }

    /// World-space box covered by this cell.
    pub fn bounds(&self, cell_size: f32) -> BoundingBox {
        BoundingBox::new(
            (self.x as f32 + 0.5) * cell_size,
            (self.y as f32 + 0.5) * cell_size,
            cell_size,
            cell_size,
        )
    }
}

/// Bresenham's line from `from` to `to`, both endpoints included.
pub fn line(from: GridCell, to: GridCell) -> Vec<GridCell> {
    let dx = (to.x - from.x).abs();
    let dy = (to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx - dy;

    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);
    let (mut x, mut y) = (from.x, from.y);
    loop {
        cells.push(GridCell::new(x, y));
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// Two straight runs through `corner`, without repeating the corner cell.
pub fn polyline(from: GridCell, corner: GridCell, to: GridCell) -> Vec<GridCell> {
    let mut cells = line(from, corner);
    cells.extend(line(corner, to).into_iter().skip(1));
    cells
}

/// Square block of `width` cells around `cell`. Even widths extend one cell
/// further toward positive x and y.
pub fn block(cell: GridCell, width: u32) -> impl Iterator<Item = GridCell> {
    let w = width.max(1) as i32;
    let lo = -((w - 1) / 2);
    let hi = lo + w - 1;
    (lo..=hi).flat_map(move |dy| (lo..=hi).map(move |dx| GridCell::new(cell.x + dx, cell.y + dy)))
}

/// Every cell of a centerline widened to `width`, deduplicated, in first-
/// seen order.
pub fn expand(centerline: &[GridCell], width: u32) -> Vec<GridCell> {
    let mut seen = std::collections::HashSet::new();
    let mut cells = Vec::new();
    for &cell in centerline {
        for c in block(cell, width) {
            if seen.insert(c) {
                cells.push(c);
            }
        }
    }
    cells
}
