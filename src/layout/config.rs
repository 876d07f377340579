//! Layout parameters.
//!
//! Every field has a default, and `#[serde(default)]` lets JavaScript hand
//! over partial objects (`{ idealGap: 30 }`) with the rest filled in.

use serde::{Deserialize, Serialize};

use super::footprint::MAX_FOOTPRINT_EXTENT;
use crate::error::LayoutError;

/// How corridors are shaped before overlap-avoidance retries kick in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorridorShape {
    /// Straight rasterized line between anchors.
    #[default]
    Direct,
    /// Two straight segments through one corner, corner side alternating
    /// per corridor.
    Angled,
    /// Direct or angled, 50/50 per corridor.
    Mixed,
}

/// Configuration for layout relaxation, regeneration and corridor routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Target edge-to-edge gap between connected rooms (default: 20).
    pub ideal_gap: f32,
    /// Spring stiffness multiplier (default: 1.0).
    pub stiffness_factor: f32,
    /// Repulsion strength multiplier (default: 1.0).
    pub repulsion_factor: f32,
    /// Per-iteration random jitter scale; 0 disables (default: 0.0).
    pub chaos_factor: f32,
    /// Iterations per run in fixed mode (default: 100).
    pub iteration_count: u32,
    /// Run to convergence instead of a fixed count (default: false).
    pub force_mode: bool,
    /// Hard cap on iterations in force mode (default: 2096).
    pub max_force_mode_iterations: u32,
    /// Total kinetic energy under which force mode stops (default: 0.01).
    pub energy_threshold: f32,
    /// Velocity retained per iteration (default: 0.9).
    pub damping: f32,
    /// Accept overlapping rooms without retrying (default: false).
    pub allow_overlap: bool,
    /// Extra layout attempts when rooms overlap (default: 3).
    pub max_room_regenerations: u32,
    /// Extra routing attempts when a corridor cuts a room (default: 3).
    pub max_corridor_regenerations: u32,
    /// Corridor width in cells (default: 2).
    pub corridor_width: u32,
    /// Corridor shape policy (default: direct).
    pub corridor_shape: CorridorShape,
    /// Scales the initial placement disc: radius = sqrt(area * factor) / 2
    /// (default: 2.0).
    pub area_placement_factor: f32,
    /// Iterations per second in incremental mode (default: 10).
    pub incremental_rate: f32,
    /// Rate of the cosmetic easing of observed positions, per second; 0
    /// snaps straight to the targets (default: 8.0).
    pub smoothing: f32,
    /// Width of the fallback footprint (default: 10).
    pub default_room_width: f32,
    /// Height of the fallback footprint (default: 10).
    pub default_room_height: f32,
    /// World units per grid cell for corridor rasterization (default: 1.0).
    pub cell_size: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            ideal_gap: 20.0,
            stiffness_factor: 1.0,
            repulsion_factor: 1.0,
            chaos_factor: 0.0,
            iteration_count: 100,
            force_mode: false,
            max_force_mode_iterations: 2096,
            energy_threshold: 0.01,
            damping: 0.9,
            allow_overlap: false,
            max_room_regenerations: 3,
            max_corridor_regenerations: 3,
            corridor_width: 2,
            corridor_shape: CorridorShape::Direct,
            area_placement_factor: 2.0,
            incremental_rate: 10.0,
            smoothing: 8.0,
            default_room_width: 10.0,
            default_room_height: 10.0,
            cell_size: 1.0,
        }
    }
}

impl LayoutConfig {
    /// Check the parameters before any geometry work starts.
    pub fn validate(&self) -> Result<(), LayoutError> {
        finite("idealGap", self.ideal_gap)?;
        non_negative("stiffnessFactor", self.stiffness_factor)?;
        non_negative("repulsionFactor", self.repulsion_factor)?;
        non_negative("chaosFactor", self.chaos_factor)?;
        non_negative("energyThreshold", self.energy_threshold)?;
        positive("areaPlacementFactor", self.area_placement_factor)?;
        positive("incrementalRate", self.incremental_rate)?;
        non_negative("smoothing", self.smoothing)?;
        room_side("defaultRoomWidth", self.default_room_width)?;
        room_side("defaultRoomHeight", self.default_room_height)?;
        positive("cellSize", self.cell_size)?;

        if !(0.0..=1.0).contains(&self.damping) {
            return Err(LayoutError::invalid("damping", "must lie in [0, 1]"));
        }
        if self.corridor_width == 0 {
            return Err(LayoutError::invalid("corridorWidth", "must be at least 1"));
        }
        if self.force_mode {
            if self.max_force_mode_iterations == 0 {
                return Err(LayoutError::invalid(
                    "maxForceModeIterations",
                    "must be at least 1 in force mode",
                ));
            }
        } else if self.iteration_count == 0 {
            return Err(LayoutError::invalid("iterationCount", "must be at least 1"));
        }
        Ok(())
    }

    /// Iteration cap for one relaxation run under the current mode.
    pub fn iteration_limit(&self) -> u32 {
        if self.force_mode {
            self.max_force_mode_iterations
        } else {
            self.iteration_count
        }
    }

    /// Total layout attempts allowed (first attempt plus regenerations).
    pub fn room_attempts(&self) -> u32 {
        if self.allow_overlap {
            1
        } else {
            self.max_room_regenerations.saturating_add(1)
        }
    }

    /// Total routing attempts allowed per corridor.
    pub fn corridor_attempts(&self) -> u32 {
        self.max_corridor_regenerations.saturating_add(1)
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), LayoutError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LayoutError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), LayoutError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(LayoutError::invalid(field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), LayoutError> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(LayoutError::invalid(field, format!("must be > 0, got {value}")));
    }
    Ok(())
}

fn room_side(field: &'static str, value: f32) -> Result<(), LayoutError> {
    positive(field, value)?;
    if value > MAX_FOOTPRINT_EXTENT {
        return Err(LayoutError::invalid(
            field,
            format!("must be <= {MAX_FOOTPRINT_EXTENT}, got {value}"),
        ));
    }
    Ok(())
}
