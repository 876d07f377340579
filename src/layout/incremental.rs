//! Tick-driven layout.
//!
//! [`IncrementalLayout`] runs the same attempts as [`regenerate`] but one
//! iteration at a time, so a host can animate the rooms settling. It is a
//! plain state machine:
//!
//! ```text
//! Idle --start--> Running --(clear / budget spent)--> Converged
//!                  |   ^
//!                  +---+ overlap: re-roll placement, next attempt
//! any --cancel--> Cancelled
//! ```
//!
//! The physics state advances exactly as in batch mode. Only the observed
//! positions, which a renderer reads, are eased toward the physics targets.
//!
//! [`regenerate`]: super::regeneration::regenerate

use std::collections::BTreeMap;

use serde::Serialize;

use super::config::LayoutConfig;
use super::placement::{LayoutProblem, Position, SimulationState};
use super::regeneration::{RegenerationOutcome, Verdict, judge, overlap_warning};
use super::relaxation::Relaxation;
use super::warning::LayoutWarning;
use crate::graph::NodeId;
use crate::rng::LayoutRng;

/// Externally visible phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Running,
    Converged,
    Cancelled,
}

#[derive(Debug, Clone)]
enum Stage {
    Idle,
    Running {
        attempt: u32,
        iteration: u32,
        sim: SimulationState,
    },
    Converged {
        attempt: u32,
        converged: bool,
        sim: SimulationState,
    },
    Cancelled,
}

/// Incremental driver over one [`LayoutProblem`].
pub struct IncrementalLayout {
    problem: LayoutProblem,
    config: LayoutConfig,
    relaxation: Relaxation,
    rng: LayoutRng,
    stage: Stage,
    /// Eased positions for display, SoA.
    observed_x: Vec<f32>,
    observed_y: Vec<f32>,
    /// Fractional iterations owed from previous ticks.
    pending: f32,
    total_iterations: u32,
    skipped: u32,
    overlapping: Vec<(NodeId, NodeId)>,
    warnings: Vec<LayoutWarning>,
}

impl IncrementalLayout {
    pub fn new(problem: LayoutProblem, config: LayoutConfig, rng: LayoutRng) -> Self {
        let relaxation = Relaxation::new(&config);
        Self {
            problem,
            config,
            relaxation,
            rng,
            stage: Stage::Idle,
            observed_x: Vec::new(),
            observed_y: Vec::new(),
            pending: 0.0,
            total_iterations: 0,
            skipped: 0,
            overlapping: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self.stage {
            Stage::Idle => Phase::Idle,
            Stage::Running { .. } => Phase::Running,
            Stage::Converged { .. } => Phase::Converged,
            Stage::Cancelled => Phase::Cancelled,
        }
    }

    pub fn problem(&self) -> &LayoutProblem {
        &self.problem
    }

    pub fn rng_mut(&mut self) -> &mut LayoutRng {
        &mut self.rng
    }

    /// Current attempt number, 1-based; 0 before the first start.
    pub fn attempt(&self) -> u32 {
        match self.stage {
            Stage::Running { attempt, .. } | Stage::Converged { attempt, .. } => attempt,
            _ => 0,
        }
    }

    // ========================================================================
    // Control
    // ========================================================================

    /// Roll a fresh placement and enter `Running`. Restarting abandons any
    /// attempt in progress.
    pub fn start(&mut self) {
        self.total_iterations = 0;
        self.skipped = 0;
        self.pending = 0.0;
        self.overlapping.clear();
        self.warnings.clear();
        self.begin_attempt(1);
        self.observed_x = self.sim().map(|s| s.pos_x.clone()).unwrap_or_default();
        self.observed_y = self.sim().map(|s| s.pos_y.clone()).unwrap_or_default();
        log::info!("incremental layout started for {} room(s)", self.problem.len());
    }

    /// Abandon the run and discard its state.
    pub fn cancel(&mut self) {
        if matches!(self.stage, Stage::Running { .. }) {
            log::info!("incremental layout cancelled on attempt {}", self.attempt());
        }
        self.stage = Stage::Cancelled;
        self.observed_x.clear();
        self.observed_y.clear();
        self.pending = 0.0;
    }

    fn begin_attempt(&mut self, attempt: u32) {
        let sim = self
            .problem
            .seed_state(self.config.area_placement_factor, &mut self.rng);
        self.stage = Stage::Running {
            attempt,
            iteration: 0,
            sim,
        };
    }

    // ========================================================================
    // Stepping
    // ========================================================================

    /// Advance one iteration. Does nothing unless `Running`.
    pub fn step(&mut self) -> Phase {
        let Stage::Running {
            attempt,
            iteration,
            sim,
        } = &mut self.stage
        else {
            return self.phase();
        };

        let outcome = self
            .relaxation
            .advance(&self.problem, sim, &mut self.rng, *iteration);
        *iteration += 1;
        self.total_iterations += 1;
        self.skipped += outcome.skipped;
        if !self.relaxation.is_finished(*iteration, outcome.energy) {
            return Phase::Running;
        }

        let attempt = *attempt;
        let converged = outcome.energy < self.relaxation.energy_threshold;
        match judge(&self.problem, sim, &self.config, attempt) {
            Verdict::Retry(_) => {
                self.begin_attempt(attempt + 1);
                return Phase::Running;
            }
            Verdict::Accept => {}
            Verdict::Exhausted(pairs) => {
                self.overlapping = pairs.clone();
                self.warnings.push(overlap_warning(attempt, pairs));
            }
        }
        if self.skipped > 0 {
            log::warn!("incremental layout skipped {} non-finite term(s)", self.skipped);
            self.warnings.push(LayoutWarning::NonFiniteForces {
                skipped: self.skipped,
            });
        }

        let sim = std::mem::replace(sim, SimulationState::zeroed(0));
        self.stage = Stage::Converged {
            attempt,
            converged,
            sim,
        };
        log::info!(
            "incremental layout settled on attempt {attempt} after {} iteration(s)",
            self.total_iterations
        );
        Phase::Converged
    }

    /// Advance by `dt` seconds of wall time: `incremental_rate` iterations
    /// per second, then ease the observed positions toward the targets.
    pub fn tick(&mut self, dt: f32) -> Phase {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if matches!(self.stage, Stage::Running { .. }) {
            self.pending += dt * self.config.incremental_rate;
            while self.pending >= 1.0 {
                self.pending -= 1.0;
                if self.step() != Phase::Running {
                    self.pending = 0.0;
                    break;
                }
            }
        }

        self.ease(dt);
        self.phase()
    }

    fn ease(&mut self, dt: f32) {
        let Some(sim) = self.sim() else {
            return;
        };
        let (tx, ty) = (sim.pos_x.clone(), sim.pos_y.clone());
        if self.config.smoothing <= 0.0 {
            self.observed_x = tx;
            self.observed_y = ty;
            return;
        }

        let alpha = 1.0 - (-self.config.smoothing * dt).exp();
        for (o, t) in self.observed_x.iter_mut().zip(tx) {
            *o += (t - *o) * alpha;
        }
        for (o, t) in self.observed_y.iter_mut().zip(ty) {
            *o += (t - *o) * alpha;
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    fn sim(&self) -> Option<&SimulationState> {
        match &self.stage {
            Stage::Running { sim, .. } | Stage::Converged { sim, .. } => Some(sim),
            _ => None,
        }
    }

    /// Physics positions of the live attempt.
    pub fn target_positions(&self) -> Option<BTreeMap<NodeId, Position>> {
        self.sim().map(|sim| self.problem.positions(sim))
    }

    /// Eased positions as `[x0, y0, x1, y1, ...]` in room id order.
    pub fn observed_positions(&self) -> Vec<f32> {
        self.observed_x
            .iter()
            .zip(&self.observed_y)
            .flat_map(|(&x, &y)| [x, y])
            .collect()
    }

    /// The accepted layout, once `Converged`.
    pub fn outcome(&self) -> Option<RegenerationOutcome> {
        let Stage::Converged {
            attempt,
            converged,
            sim,
        } = &self.stage
        else {
            return None;
        };
        Some(RegenerationOutcome {
            state: sim.clone(),
            attempts: *attempt,
            iterations: self.total_iterations,
            converged: *converged,
            overlapping: self.overlapping.clone(),
            warnings: self.warnings.clone(),
        })
    }
}
