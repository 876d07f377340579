//! Spring and repulsion relaxation.
//!
//! Pulls connected rooms toward an edge-to-edge gap and pushes every pair of
//! rooms apart in proportion to their graph distance, so rooms that are far
//! apart in the graph also end up far apart on the map.
//!
//! # Algorithm
//!
//! Rooms spawn at random points of the placement disc, kept at least the
//! smallest room radius apart where a few redraws allow it.
//!
//! Per iteration:
//!
//! 0. **Uncrossing**: every [`UNTANGLE_INTERVAL`] iterations during the first
//!    half of the iteration limit, the first two crossing springs `(a, b)`
//!    and `(c, d)` are undone by exchanging the positions of `b` and `d`.
//!    Both rooms restart at rest.
//! 1. **Springs**: for every connection, `f = k * (d - (rA + rB + gap))`
//!    along the unit vector from A to B, added to A and subtracted from B.
//! 2. **Repulsion**: for every unordered pair, `f = S * graphDistance / d²`
//!    pushing the two apart. Pairs closer than [`MIN_DISTANCE`] are skipped,
//!    as are non-finite terms.
//! 3. **Integration**: `v += F`, optional jitter, `v *= damping`, `p += v`.
//!    A position that would become non-finite is left where it was and its
//!    velocity is zeroed.
//!
//! Batch runs ([`Relaxation::run`]) and the incremental driver both advance
//! through [`Relaxation::advance`], so the two produce the same numbers for the
//! same seed.

use super::config::LayoutConfig;
use super::placement::{LayoutProblem, SimulationState};
use crate::rng::LayoutRng;

/// Spring constant at `stiffness_factor = 1`.
pub const SPRING_BASE: f32 = 0.1;

/// Repulsion strength at `repulsion_factor = 1`.
pub const REPULSION_BASE: f32 = 50.0;

/// Separation below which a pair exerts no force.
pub const MIN_DISTANCE: f32 = 0.01;

/// Iterations between two checks for crossing springs.
pub const UNTANGLE_INTERVAL: u32 = 10;

/// Result of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// Total kinetic energy after integration.
    pub energy: f32,
    /// Force terms or position updates dropped as non-finite.
    pub skipped: u32,
}

/// Result of a full relaxation run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelaxationOutcome {
    pub iterations: u32,
    /// Final energy fell below the threshold.
    pub converged: bool,
    pub energy: f32,
    pub skipped: u32,
}

/// Relaxation parameters resolved from a [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Relaxation {
    pub stiffness: f32,
    pub repulsion: f32,
    pub ideal_gap: f32,
    pub chaos: f32,
    pub damping: f32,
    pub energy_threshold: f32,
    pub force_mode: bool,
    pub iteration_limit: u32,
}

impl Relaxation {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            stiffness: config.stiffness_factor * SPRING_BASE,
            repulsion: config.repulsion_factor * REPULSION_BASE,
            ideal_gap: config.ideal_gap,
            chaos: config.chaos_factor,
            damping: config.damping,
            energy_threshold: config.energy_threshold,
            force_mode: config.force_mode,
            iteration_limit: config.iteration_limit(),
        }
    }

    /// Whether a run that has done `iterations` steps ending at `energy`
    /// should stop. Fixed mode stops only at the limit.
    pub fn is_finished(&self, iterations: u32, energy: f32) -> bool {
        iterations >= self.iteration_limit || (self.force_mode && energy < self.energy_threshold)
    }

    /// Iterate until [`Self::is_finished`].
    pub fn run(
        &self,
        problem: &LayoutProblem,
        state: &mut SimulationState,
        rng: &mut LayoutRng,
    ) -> RelaxationOutcome {
        let mut outcome = RelaxationOutcome::default();
        while outcome.iterations < self.iteration_limit {
            let step = self.advance(problem, state, rng, outcome.iterations);
            outcome.iterations += 1;
            outcome.energy = step.energy;
            outcome.skipped += step.skipped;
            if self.is_finished(outcome.iterations, outcome.energy) {
                break;
            }
        }
        outcome.converged = outcome.iterations > 0 && outcome.energy < self.energy_threshold;

        if outcome.skipped > 0 {
            log::warn!(
                "relaxation skipped {} non-finite term(s) over {} iteration(s)",
                outcome.skipped,
                outcome.iterations
            );
        }
        log::debug!(
            "relaxation finished after {} iteration(s), energy {:.4}",
            outcome.iterations,
            outcome.energy
        );
        outcome
    }

    /// Whether iteration `iteration` (zero-based) starts with a check for
    /// crossing springs.
    pub fn untangles_at(&self, iteration: u32) -> bool {
        iteration > 0 && iteration % UNTANGLE_INTERVAL == 0 && iteration < self.iteration_limit / 2
    }

    /// Undo the first crossing of two springs `(a, b)` and `(c, d)` by
    /// exchanging the positions of `b` and `d`, which turns both springs into
    /// sides of the quadrilateral they spanned. Returns whether a crossing
    /// was found.
    pub fn untangle(problem: &LayoutProblem, state: &mut SimulationState) -> bool {
        let Some(((_, b), (_, d))) = problem.crossing_springs(state) else {
            return false;
        };
        state.swap_positions(b, d);
        true
    }

    /// Run iteration `iteration` (zero-based): the periodic uncrossing when
    /// due, then one [`Self::step`].
    pub fn advance(
        &self,
        problem: &LayoutProblem,
        state: &mut SimulationState,
        rng: &mut LayoutRng,
        iteration: u32,
    ) -> StepOutcome {
        if self.untangles_at(iteration) && Self::untangle(problem, state) {
            log::debug!("uncrossed two springs before iteration {iteration}");
        }
        self.step(problem, state, rng)
    }

    /// Advance the simulation by exactly one iteration of forces.
    pub fn step(
        &self,
        problem: &LayoutProblem,
        state: &mut SimulationState,
        rng: &mut LayoutRng,
    ) -> StepOutcome {
        let n = problem.len();
        let mut skipped = 0u32;

        state.force_x.iter_mut().for_each(|f| *f = 0.0);
        state.force_y.iter_mut().for_each(|f| *f = 0.0);

        // ====================================================================
        // Springs
        // ====================================================================

        let entities = problem.entities();
        for &(a, b) in problem.springs() {
            let dx = state.pos_x[b] - state.pos_x[a];
            let dy = state.pos_y[b] - state.pos_y[a];
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < MIN_DISTANCE {
                continue;
            }

            let ideal = entities[a].radius + entities[b].radius + self.ideal_gap;
            let magnitude = self.stiffness * (dist - ideal);
            let fx = dx / dist * magnitude;
            let fy = dy / dist * magnitude;
            if !fx.is_finite() || !fy.is_finite() {
                skipped += 1;
                continue;
            }

            state.force_x[a] += fx;
            state.force_y[a] += fy;
            state.force_x[b] -= fx;
            state.force_y[b] -= fy;
        }

        // ====================================================================
        // Repulsion
        // ====================================================================

        for i in 0..n {
            for j in (i + 1)..n {
                let dx = state.pos_x[j] - state.pos_x[i];
                let dy = state.pos_y[j] - state.pos_y[i];
                let dist_sq = dx * dx + dy * dy;
                let dist = dist_sq.sqrt();
                if dist < MIN_DISTANCE {
                    continue;
                }

                let magnitude = self.repulsion * problem.weight(i, j) / dist_sq;
                let fx = dx / dist * magnitude;
                let fy = dy / dist * magnitude;
                if !fx.is_finite() || !fy.is_finite() {
                    skipped += 1;
                    continue;
                }

                state.force_x[i] -= fx;
                state.force_y[i] -= fy;
                state.force_x[j] += fx;
                state.force_y[j] += fy;
            }
        }

        // ====================================================================
        // Integration
        // ====================================================================

        for i in 0..n {
            let mut vx = state.vel_x[i] + state.force_x[i];
            let mut vy = state.vel_y[i] + state.force_y[i];
            if self.chaos > 0.0 {
                let (jx, jy) = rng.jitter(self.chaos);
                vx += jx;
                vy += jy;
            }
            vx *= self.damping;
            vy *= self.damping;

            let x = state.pos_x[i] + vx;
            let y = state.pos_y[i] + vy;
            if !x.is_finite() || !y.is_finite() {
                state.vel_x[i] = 0.0;
                state.vel_y[i] = 0.0;
                skipped += 1;
                continue;
            }

            state.vel_x[i] = vx;
            state.vel_y[i] = vy;
            state.pos_x[i] = x;
            state.pos_y[i] = y;
        }

        StepOutcome {
            energy: state.kinetic_energy(),
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    #[cfg(not(target_arch = "wasm32"))]
    use proptest::prelude::*;

    use super::*;
    use crate::graph::{DistanceTable, NodeId, RoomGraph, RoomKind};
    use crate::layout::footprint::RoomFootprint;

    fn build(sizes: &[(f32, f32)], edges: &[(u32, u32)]) -> LayoutProblem {
        let mut graph = RoomGraph::new();
        let mut footprints = BTreeMap::new();
        for &(w, h) in sizes {
            let id = graph.add_room(RoomKind::Basic, None, 100.0);
            footprints.insert(id, RoomFootprint::rect("r", w, h));
        }
        for &(a, b) in edges {
            graph.connect(NodeId(a), NodeId(b)).unwrap();
        }
        let distances = DistanceTable::compute(&graph);
        LayoutProblem::new(&graph, &distances, &footprints, &RoomFootprint::rect("f", 1.0, 1.0))
    }

    fn gap(problem: &LayoutProblem, state: &SimulationState, a: usize, b: usize) -> f32 {
        let dx = state.pos_x[b] - state.pos_x[a];
        let dy = state.pos_y[b] - state.pos_y[a];
        (dx * dx + dy * dy).sqrt() - problem.entities()[a].radius - problem.entities()[b].radius
    }

    #[test]
    fn test_spring_pulls_toward_ideal_gap() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig {
            repulsion_factor: 0.0,
            iteration_count: 400,
            ..Default::default()
        });
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (100.0, 0.0)]);
        let mut rng = LayoutRng::new(1);
        relax.run(&problem, &mut state, &mut rng);

        let g = gap(&problem, &state, 0, 1);
        assert!((g - 20.0).abs() < 0.5, "gap {g} should settle near 20");
        // Symmetric forces keep the midpoint fixed
        assert!((state.pos_x[0] + state.pos_x[1] - 100.0).abs() < 1e-2);
        assert_eq!(state.pos_y, vec![0.0, 0.0]);
    }

    #[test]
    fn test_ideal_distance_scales_with_room_size() {
        let problem = build(&[(40.0, 10.0), (10.0, 30.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig {
            repulsion_factor: 0.0,
            iteration_count: 400,
            ..Default::default()
        });
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (0.0, 90.0)]);
        relax.run(&problem, &mut state, &mut LayoutRng::new(1));

        // 20 + 15 + 20
        let d = (state.pos_y[1] - state.pos_y[0]).abs();
        assert!((d - 55.0).abs() < 0.5, "center distance {d}");
    }

    #[test]
    fn test_repulsion_pushes_unconnected_rooms_apart() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[]);
        let relax = Relaxation::new(&LayoutConfig::default());
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (5.0, 0.0)]);
        relax.step(&problem, &mut state, &mut LayoutRng::new(1));
        assert!(state.pos_x[0] < 0.0);
        assert!(state.pos_x[1] > 5.0);
    }

    #[test]
    fn test_coincident_rooms_are_skipped() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig::default());
        let mut state = SimulationState::from_positions(&[(3.0, 3.0), (3.0, 3.0)]);
        let outcome = relax.step(&problem, &mut state, &mut LayoutRng::new(1));
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.energy, 0.0);
        assert_eq!(state.pos_x, vec![3.0, 3.0]);
    }

    #[test]
    fn test_non_finite_position_is_not_committed() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[]);
        let relax = Relaxation::new(&LayoutConfig::default());
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (50.0, 0.0)]);
        state.vel_x[1] = f32::INFINITY;

        let outcome = relax.step(&problem, &mut state, &mut LayoutRng::new(1));
        assert!(outcome.skipped >= 1);
        assert_eq!(state.pos_x[1], 50.0);
        assert_eq!(state.vel_x[1], 0.0);
        assert!(state.pos_x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fixed_mode_runs_exact_count() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig {
            iteration_count: 37,
            ..Default::default()
        });
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (30.0, 0.0)]);
        let outcome = relax.run(&problem, &mut state, &mut LayoutRng::new(1));
        assert_eq!(outcome.iterations, 37);
    }

    #[test]
    fn test_force_mode_stops_on_low_energy() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig {
            force_mode: true,
            repulsion_factor: 0.0,
            ..Default::default()
        });
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (60.0, 0.0)]);
        let outcome = relax.run(&problem, &mut state, &mut LayoutRng::new(1));
        assert!(outcome.converged);
        assert!(outcome.iterations < 2096);
        assert!(outcome.energy < 0.01);
    }

    #[test]
    fn test_force_mode_respects_hard_cap() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0)], &[(0, 1)]);
        let relax = Relaxation::new(&LayoutConfig {
            force_mode: true,
            max_force_mode_iterations: 5,
            energy_threshold: 0.0,
            ..Default::default()
        });
        let mut state = SimulationState::from_positions(&[(0.0, 0.0), (90.0, 0.0)]);
        let outcome = relax.run(&problem, &mut state, &mut LayoutRng::new(1));
        assert_eq!(outcome.iterations, 5);
        assert!(!outcome.converged);
    }

    #[test]
    fn test_chaos_consumes_rng_deterministically() {
        let problem = build(&[(10.0, 10.0), (10.0, 10.0), (10.0, 10.0)], &[(0, 1), (1, 2)]);
        let relax = Relaxation::new(&LayoutConfig {
            chaos_factor: 2.0,
            ..Default::default()
        });
        let start = SimulationState::from_positions(&[(0.0, 0.0), (10.0, 5.0), (20.0, -5.0)]);

        let mut a = start.clone();
        let mut b = start.clone();
        relax.run(&problem, &mut a, &mut LayoutRng::new(11));
        relax.run(&problem, &mut b, &mut LayoutRng::new(11));
        assert_eq!(a, b);

        let mut c = start;
        relax.run(&problem, &mut c, &mut LayoutRng::new(12));
        assert_ne!(a.pos_x, c.pos_x);
    }

    #[test]
    fn test_hub_does_not_diverge() {
        // Star with six leaves
        let sizes = [(10.0, 10.0); 7];
        let edges: Vec<(u32, u32)> = (1..7).map(|i| (0, i)).collect();
        let problem = build(&sizes, &edges);
        let relax = Relaxation::new(&LayoutConfig {
            iteration_count: 300,
            ..Default::default()
        });
        let mut rng = LayoutRng::new(4);
        let mut state = problem.seed_state(2.0, &mut rng);
        let outcome = relax.run(&problem, &mut state, &mut rng);

        assert_eq!(outcome.skipped, 0);
        for leaf in 1..7 {
            let g = gap(&problem, &state, 0, leaf);
            assert!(g > 0.0 && g < 40.0, "leaf {leaf} gap {g}");
        }
    }

    #[test]
    fn test_untangle_schedule() {
        let relax = Relaxation::new(&LayoutConfig::default());
        assert_eq!(relax.iteration_limit, 100);
        let due: Vec<u32> = (0..100).filter(|&i| relax.untangles_at(i)).collect();
        assert_eq!(due, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_twisted_cycle_unfolds_into_square() {
        let problem = build(&[(10.0, 10.0); 4], &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let relax = Relaxation::new(&LayoutConfig {
            force_mode: true,
            ..Default::default()
        });
        // Springs (0, 3) and (1, 2) cross.
        let mut state =
            SimulationState::from_positions(&[(0.0, 0.0), (30.0, 0.0), (0.0, 30.0), (30.0, 30.0)]);
        assert!(problem.crossing_springs(&state).is_some());
        let outcome = relax.run(&problem, &mut state, &mut LayoutRng::new(1));

        assert!(outcome.converged);
        assert_eq!(problem.crossing_springs(&state), None);
        let length = |a: usize, b: usize| {
            ((state.pos_x[b] - state.pos_x[a]).powi(2) + (state.pos_y[b] - state.pos_y[a]).powi(2))
                .sqrt()
        };
        let edges = [length(0, 1), length(1, 2), length(2, 3), length(3, 0)];
        let longest = edges.iter().copied().fold(f32::MIN, f32::max);
        let shortest = edges.iter().copied().fold(f32::MAX, f32::min);
        assert!(longest <= shortest * 1.3, "edges {edges:?}");
        assert!(length(0, 2) > longest && length(1, 3) > longest);
    }

    #[test]
    fn test_untangle_leaves_planar_state_alone() {
        let problem = build(&[(10.0, 10.0); 4], &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let square = [(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)];
        let mut state = SimulationState::from_positions(&square);
        assert!(!Relaxation::untangle(&problem, &mut state));
        assert_eq!(state, SimulationState::from_positions(&square));
    }

    #[cfg(not(target_arch = "wasm32"))]
    proptest! {
        #[test]
        fn test_relaxation_stays_finite(
            seed in any::<u64>(),
            sizes in prop::collection::vec((1.0f32..60.0, 1.0f32..60.0), 2..10),
            extra in prop::collection::vec((0u32..10, 0u32..10), 0..8),
            chaos in 0.0f32..5.0,
        ) {
            let n = sizes.len() as u32;
            let mut edges: Vec<(u32, u32)> = (1..n).map(|i| (i - 1, i)).collect();
            for (a, b) in extra {
                let (a, b) = (a % n, b % n);
                if a != b && !edges.iter().any(|&(x, y)| (x, y) == (a.min(b), a.max(b))) {
                    edges.push((a.min(b), a.max(b)));
                }
            }
            let problem = build(&sizes, &edges);
            let relax = Relaxation::new(&LayoutConfig {
                chaos_factor: chaos,
                ..Default::default()
            });
            let mut rng = LayoutRng::new(seed);
            let mut state = problem.seed_state(2.0, &mut rng);
            relax.run(&problem, &mut state, &mut rng);

            for i in 0..state.len() {
                prop_assert!(state.pos_x[i].is_finite() && state.pos_y[i].is_finite());
            }
        }
    }
}
