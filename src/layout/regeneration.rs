//! Overlap-driven regeneration.
//!
//! Wraps relaxation in a bounded retry loop: place rooms at random inside a
//! disc sized from their total area, relax, and start over from a fresh
//! placement while any two room boxes still intersect. When the budget runs
//! out the last layout is kept and a warning is raised; overlap alone never
//! fails a run.

use super::config::LayoutConfig;
use super::placement::{LayoutProblem, SimulationState};
use super::relaxation::Relaxation;
use super::warning::LayoutWarning;
use crate::graph::NodeId;
use crate::rng::LayoutRng;

/// What to do with a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// No overlap, or overlap is allowed.
    Accept,
    /// Overlap with attempts left.
    Retry(Vec<(NodeId, NodeId)>),
    /// Overlap on the last allowed attempt. Kept anyway.
    Exhausted(Vec<(NodeId, NodeId)>),
}

/// Judge attempt number `attempt` (1-based) of a run.
pub fn judge(
    problem: &LayoutProblem,
    state: &SimulationState,
    config: &LayoutConfig,
    attempt: u32,
) -> Verdict {
    if config.allow_overlap {
        return Verdict::Accept;
    }
    let pairs = problem.overlapping_pairs(state);
    if pairs.is_empty() {
        Verdict::Accept
    } else if attempt < config.room_attempts() {
        log::debug!(
            "attempt {attempt}: {} overlapping pair(s), regenerating",
            pairs.len()
        );
        Verdict::Retry(pairs)
    } else {
        Verdict::Exhausted(pairs)
    }
}

/// Warning for a layout kept with overlapping rooms.
pub(crate) fn overlap_warning(attempts: u32, pairs: Vec<(NodeId, NodeId)>) -> LayoutWarning {
    log::warn!(
        "rooms still overlap after {attempts} attempt(s): {:?}",
        pairs
    );
    LayoutWarning::RoomOverlap { attempts, pairs }
}

/// Accepted layout plus bookkeeping for the report.
#[derive(Debug, Clone)]
pub struct RegenerationOutcome {
    pub state: SimulationState,
    /// Attempts made, including the accepted one.
    pub attempts: u32,
    /// Iterations summed over every attempt.
    pub iterations: u32,
    /// Whether the accepted attempt reached the energy threshold.
    pub converged: bool,
    /// Pairs still overlapping in the accepted layout.
    pub overlapping: Vec<(NodeId, NodeId)>,
    pub warnings: Vec<LayoutWarning>,
}

/// Relax from fresh random placements until no rooms overlap or the
/// attempt budget is spent.
pub fn regenerate(
    problem: &LayoutProblem,
    config: &LayoutConfig,
    rng: &mut LayoutRng,
) -> RegenerationOutcome {
    let relaxation = Relaxation::new(config);
    let mut iterations = 0u32;
    let mut skipped = 0u32;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let mut state = problem.seed_state(config.area_placement_factor, rng);
        let run = relaxation.run(problem, &mut state, rng);
        iterations += run.iterations;
        skipped += run.skipped;

        let (overlapping, mut warnings) = match judge(problem, &state, config, attempt) {
            Verdict::Retry(_) => continue,
            Verdict::Accept => (Vec::new(), Vec::new()),
            Verdict::Exhausted(pairs) => {
                (pairs.clone(), vec![overlap_warning(attempt, pairs)])
            }
        };
        if skipped > 0 {
            warnings.push(LayoutWarning::NonFiniteForces { skipped });
        }
        log::debug!("layout accepted on attempt {attempt} after {iterations} iteration(s)");

        return RegenerationOutcome {
            state,
            attempts: attempt,
            iterations,
            converged: run.converged,
            overlapping,
            warnings,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::graph::{DistanceTable, RoomGraph, RoomKind};
    use crate::layout::footprint::RoomFootprint;

    fn pair_problem(size: f32, connected: bool) -> LayoutProblem {
        let mut graph = RoomGraph::new();
        let a = graph.add_room(RoomKind::Start, None, 100.0);
        let b = graph.add_room(RoomKind::Basic, None, 100.0);
        if connected {
            graph.connect(a, b).unwrap();
        }
        let footprints: BTreeMap<_, _> = [a, b]
            .into_iter()
            .map(|id| (id, RoomFootprint::rect("big", size, size)))
            .collect();
        let distances = DistanceTable::compute(&graph);
        LayoutProblem::new(&graph, &distances, &footprints, &RoomFootprint::rect("f", 1.0, 1.0))
    }

    /// Forces off and a tiny placement disc: the rooms can never separate.
    fn stuck_config() -> LayoutConfig {
        LayoutConfig {
            stiffness_factor: 0.0,
            repulsion_factor: 0.0,
            iteration_count: 1,
            area_placement_factor: 1e-6,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_attempt_when_budget_is_zero() {
        let problem = pair_problem(400.0, true);
        let config = LayoutConfig {
            max_room_regenerations: 0,
            ..stuck_config()
        };
        let outcome = regenerate(&problem, &config, &mut LayoutRng::new(1));

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.overlapping, vec![(NodeId(0), NodeId(1))]);
        assert_eq!(
            outcome.warnings,
            vec![LayoutWarning::RoomOverlap {
                attempts: 1,
                pairs: vec![(NodeId(0), NodeId(1))]
            }]
        );
    }

    #[test]
    fn test_retries_up_to_budget() {
        let problem = pair_problem(400.0, true);
        let config = LayoutConfig {
            max_room_regenerations: 3,
            ..stuck_config()
        };
        let outcome = regenerate(&problem, &config, &mut LayoutRng::new(1));
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_allow_overlap_accepts_first_attempt_silently() {
        let problem = pair_problem(400.0, true);
        let config = LayoutConfig {
            allow_overlap: true,
            ..stuck_config()
        };
        let outcome = regenerate(&problem, &config, &mut LayoutRng::new(1));
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.overlapping.is_empty());
    }

    #[test]
    fn test_clean_layout_is_accepted() {
        let problem = pair_problem(10.0, true);
        let outcome = regenerate(&problem, &LayoutConfig::default(), &mut LayoutRng::new(3));
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.warnings.is_empty());
        assert!(problem.overlapping_pairs(&outcome.state).is_empty());
    }

    #[test]
    fn test_judge_verdicts() {
        let problem = pair_problem(10.0, false);
        let config = LayoutConfig {
            max_room_regenerations: 1,
            ..Default::default()
        };
        let apart = SimulationState::from_positions(&[(0.0, 0.0), (50.0, 0.0)]);
        let stacked = SimulationState::from_positions(&[(0.0, 0.0), (2.0, 0.0)]);
        let pairs = vec![(NodeId(0), NodeId(1))];

        assert_eq!(judge(&problem, &apart, &config, 1), Verdict::Accept);
        assert_eq!(judge(&problem, &stacked, &config, 1), Verdict::Retry(pairs.clone()));
        assert_eq!(judge(&problem, &stacked, &config, 2), Verdict::Exhausted(pairs));
    }
}
