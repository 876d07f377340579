//! Room placement and corridor routing.
//!
//! This module turns a pruned room graph into geometry: footprints are
//! resolved from a catalog, a spring and repulsion simulation places the
//! rooms, overlapping results are regenerated from fresh placements, and
//! corridors are rasterized between the placed rooms.

pub mod config;
pub mod corridor;
pub mod footprint;
pub mod incremental;
pub mod occupancy;
pub mod placement;
pub mod raster;
pub mod regeneration;
pub mod relaxation;
mod warning;

pub use config::{CorridorShape, LayoutConfig};
pub use corridor::{CorridorPath, CorridorRouter, PathShape};
pub use footprint::{
    BoundingBox, CatalogEntry, ExitAnchor, PrefabUsage, RoomCatalog, RoomFootprint, StaticCatalog,
    resolve_all, resolve_footprint,
};
pub use incremental::{IncrementalLayout, Phase};
pub use occupancy::{Cell, OccupancyGrid};
pub use placement::{LOCKED_Z, LayoutProblem, PlacementEntity, Position, SimulationState};
pub use raster::GridCell;
pub use regeneration::{RegenerationOutcome, regenerate};
pub use relaxation::{Relaxation, RelaxationOutcome};
pub use warning::LayoutWarning;
