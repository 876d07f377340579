//! Placement entities and per-attempt simulation state.
//!
//! A [`LayoutProblem`] is everything that stays fixed across layout attempts
//! of one run: which rooms exist, their footprints, the springs between them
//! and the graph-distance weights. A [`SimulationState`] holds the mutable
//! positions and velocities of one attempt in SoA layout and is thrown away
//! on every regeneration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::{DistanceTable, NodeId, RoomGraph};
use crate::rng::LayoutRng;
use crate::spatial::{FootprintIndex, RoomBox};

use super::footprint::{BoundingBox, RoomFootprint};

/// Value the third coordinate is locked to.
pub const LOCKED_Z: f32 = 0.0;

/// Draws per room when looking for a spawn point clear of earlier rooms.
pub const SPAWN_DRAWS: u32 = 8;

/// World position of a room pivot. `z` is always [`LOCKED_Z`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    #[inline]
    pub fn planar(x: f32, y: f32) -> Self {
        Self { x, y, z: LOCKED_Z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A room bound to its footprint for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementEntity {
    pub id: NodeId,
    pub footprint: RoomFootprint,
    /// Cached `footprint.radius()`.
    pub radius: f32,
}

/// Immutable inputs shared by every attempt of one run.
#[derive(Debug, Clone)]
pub struct LayoutProblem {
    /// One entity per surviving room, ascending id order.
    entities: Vec<PlacementEntity>,
    /// Connected slot pairs, `a < b`.
    springs: Vec<(usize, usize)>,
    /// Row-major n*n graph distances as repulsion weights.
    weights: Vec<f32>,
}

impl LayoutProblem {
    /// Bind every room of `graph` to its footprint.
    ///
    /// Rooms missing from `footprints` get `fallback`; the resolver normally
    /// covers every room, so this only matters for hand-built inputs.
    pub fn new(
        graph: &RoomGraph,
        distances: &DistanceTable,
        footprints: &BTreeMap<NodeId, RoomFootprint>,
        fallback: &RoomFootprint,
    ) -> Self {
        let entities: Vec<PlacementEntity> = graph
            .node_ids()
            .into_iter()
            .map(|id| {
                let footprint = footprints.get(&id).unwrap_or(fallback).clone();
                let radius = footprint.radius();
                PlacementEntity {
                    id,
                    footprint,
                    radius,
                }
            })
            .collect();
        let slots: BTreeMap<NodeId, usize> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();

        let springs = graph
            .connections()
            .into_iter()
            .filter_map(|c| {
                let (a, b) = (*slots.get(&c.a())?, *slots.get(&c.b())?);
                Some((a.min(b), a.max(b)))
            })
            .collect();

        let n = entities.len();
        let mut weights = vec![0.0f32; n * n];
        for (i, a) in entities.iter().enumerate() {
            for (j, b) in entities.iter().enumerate() {
                weights[i * n + j] = distances.distance(a.id, b.id) as f32;
            }
        }

        Self {
            entities,
            springs,
            weights,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[PlacementEntity] {
        &self.entities
    }

    pub fn springs(&self) -> &[(usize, usize)] {
        &self.springs
    }

    /// Graph distance between two slots as a repulsion weight.
    #[inline]
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weights[i * self.entities.len() + j]
    }

    /// Sum of all footprint areas.
    pub fn total_area(&self) -> f32 {
        self.entities.iter().map(|e| e.footprint.area()).sum()
    }

    /// Radius of the initial placement disc: `sqrt(total_area * factor) / 2`.
    pub fn placement_radius(&self, area_factor: f32) -> f32 {
        (self.total_area() * area_factor).max(0.0).sqrt() * 0.5
    }

    /// Smallest distance kept between spawn points: the smallest room radius.
    pub fn spawn_spacing(&self) -> f32 {
        self.entities
            .iter()
            .map(|e| e.radius)
            .reduce(f32::min)
            .unwrap_or(0.0)
    }

    /// Fresh state with every entity at a random point of the placement disc.
    ///
    /// A room redraws, up to [`SPAWN_DRAWS`] times in total, while its point
    /// lies within [`Self::spawn_spacing`] of a room placed before it. The
    /// last draw is kept when none is clear.
    pub fn seed_state(&self, area_factor: f32, rng: &mut LayoutRng) -> SimulationState {
        let radius = self.placement_radius(area_factor);
        let spacing = self.spawn_spacing();
        let mut state = SimulationState::zeroed(self.len());
        for i in 0..self.len() {
            let mut point = rng.point_in_disc(radius);
            for _ in 1..SPAWN_DRAWS {
                let crowded = (0..i).any(|j| {
                    let dx = state.pos_x[j] - point.0;
                    let dy = state.pos_y[j] - point.1;
                    (dx * dx + dy * dy).sqrt() < spacing
                });
                if !crowded {
                    break;
                }
                point = rng.point_in_disc(radius);
            }
            state.pos_x[i] = point.0;
            state.pos_y[i] = point.1;
        }
        state
    }

    /// First two springs whose segments cross in the given state, as
    /// `((a, b), (c, d))` in spring order. Springs sharing a room never
    /// cross.
    pub fn crossing_springs(
        &self,
        state: &SimulationState,
    ) -> Option<((usize, usize), (usize, usize))> {
        let point = |i: usize| (state.pos_x[i], state.pos_y[i]);
        for (k, &(a, b)) in self.springs.iter().enumerate() {
            for &(c, d) in &self.springs[k + 1..] {
                if a == c || a == d || b == c || b == d {
                    continue;
                }
                if segments_cross(point(a), point(b), point(c), point(d)) {
                    return Some(((a, b), (c, d)));
                }
            }
        }
        None
    }

    /// World box of one entity for the given state.
    pub fn bounds(&self, state: &SimulationState, slot: usize) -> BoundingBox {
        self.entities[slot]
            .footprint
            .bounds_at(state.pos_x[slot], state.pos_y[slot])
    }

    /// Spatial index of every entity's box in the given state.
    pub fn index(&self, state: &SimulationState) -> FootprintIndex {
        let boxes = (0..self.len())
            .map(|i| RoomBox::new(self.entities[i].id, self.bounds(state, i)))
            .collect();
        FootprintIndex::from_boxes(boxes)
    }

    /// Every overlapping pair of rooms in the given state.
    pub fn overlapping_pairs(&self, state: &SimulationState) -> Vec<(NodeId, NodeId)> {
        self.index(state).overlapping_pairs()
    }

    /// Final positions keyed by room id.
    pub fn positions(&self, state: &SimulationState) -> BTreeMap<NodeId, Position> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, Position::planar(state.pos_x[i], state.pos_y[i])))
            .collect()
    }
}

/// Mutable positions, velocities and force accumulators for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub vel_x: Vec<f32>,
    pub vel_y: Vec<f32>,
    pub force_x: Vec<f32>,
    pub force_y: Vec<f32>,
}

impl SimulationState {
    /// All entities at the origin, at rest.
    pub fn zeroed(n: usize) -> Self {
        Self {
            pos_x: vec![0.0; n],
            pos_y: vec![0.0; n],
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
            force_x: vec![0.0; n],
            force_y: vec![0.0; n],
        }
    }

    /// Build a state from explicit positions (velocities zero).
    pub fn from_positions(points: &[(f32, f32)]) -> Self {
        let mut state = Self::zeroed(points.len());
        for (i, &(x, y)) in points.iter().enumerate() {
            state.pos_x[i] = x;
            state.pos_y[i] = y;
        }
        state
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    /// Exchange the positions of two entities and bring both to rest.
    pub fn swap_positions(&mut self, i: usize, j: usize) {
        self.pos_x.swap(i, j);
        self.pos_y.swap(i, j);
        for k in [i, j] {
            self.vel_x[k] = 0.0;
            self.vel_y[k] = 0.0;
        }
    }

    /// Total kinetic energy: sum of squared speeds.
    pub fn kinetic_energy(&self) -> f32 {
        self.vel_x
            .iter()
            .zip(&self.vel_y)
            .map(|(vx, vy)| vx * vx + vy * vy)
            .sum()
    }
}

/// Whether segments `p1p2` and `p3p4` properly cross. Touching or
/// collinear segments do not.
fn segments_cross(p1: (f32, f32), p2: (f32, f32), p3: (f32, f32), p4: (f32, f32)) -> bool {
    fn orient(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    }
    orient(p3, p4, p1) * orient(p3, p4, p2) < 0.0 && orient(p1, p2, p3) * orient(p1, p2, p4) < 0.0
}
