//! End-to-end dungeon generation.
//!
//! A run validates its inputs, prunes optional rooms, resolves footprints,
//! computes graph distances, places rooms (batch or tick-driven), routes
//! corridors and finally hands the result to the injected
//! [`LayoutObserver`]. Every random draw comes from one [`LayoutRng`] seeded
//! per run, so the same seed reproduces the same dungeon in either mode.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::LayoutError;
use crate::graph::{
    Connection, DistanceTable, GraphSpec, NodeId, PruneReport, RoomGraph, prune_spawns,
};
use crate::layout::{
    CorridorPath, CorridorRouter, IncrementalLayout, LayoutConfig, LayoutProblem, LayoutWarning,
    OccupancyGrid, Phase, Position, RegenerationOutcome, RoomCatalog, RoomFootprint,
    StaticCatalog, regenerate, resolve_all,
};
use crate::rng::LayoutRng;

/// Receives every finished layout.
pub trait LayoutObserver {
    fn on_layout(&mut self, layout: &DungeonLayout);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl LayoutObserver for NoopObserver {
    fn on_layout(&mut self, _layout: &DungeonLayout) {}
}

/// Bookkeeping for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub seed: u64,
    /// Layout attempts made, including the accepted one.
    pub room_attempts: u32,
    /// Relaxation iterations over all attempts.
    pub iterations_run: u32,
    /// Whether the accepted attempt's energy fell below the threshold.
    pub converged: bool,
    pub pruned: PruneReport,
    pub warnings: Vec<LayoutWarning>,
}

/// A finished dungeon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonLayout {
    pub positions: BTreeMap<NodeId, Position>,
    pub footprints: BTreeMap<NodeId, RoomFootprint>,
    pub corridors: Vec<CorridorPath>,
    #[serde(skip)]
    pub occupancy: OccupancyGrid,
    /// The graph after pruning.
    pub graph: GraphSpec,
    pub report: LayoutReport,
}

/// Everything a run needs after the graph-level passes, minus the
/// placement problem itself.
#[derive(Debug, Clone)]
struct PreparedRun {
    seed: u64,
    graph: RoomGraph,
    pruned: PruneReport,
    footprints: BTreeMap<NodeId, RoomFootprint>,
    warnings: Vec<LayoutWarning>,
}

/// Generation pipeline with an injected catalog and observer.
pub struct DungeonGenerator {
    config: LayoutConfig,
    seed: u64,
    catalog: Box<dyn RoomCatalog>,
    observer: Box<dyn LayoutObserver>,
}

impl DungeonGenerator {
    /// Generator with an empty catalog (every room gets the fallback box).
    pub fn new(config: LayoutConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            catalog: Box::new(StaticCatalog::new()),
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_catalog(mut self, catalog: impl RoomCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn with_observer(mut self, observer: impl LayoutObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    pub fn set_catalog(&mut self, catalog: Box<dyn RoomCatalog>) {
        self.catalog = catalog;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Run the whole pipeline to completion.
    pub fn generate(&mut self, graph: &RoomGraph) -> Result<DungeonLayout, LayoutError> {
        let mut rng = LayoutRng::new(self.seed);
        let (run, problem) = self.prepare(graph, &mut rng)?;
        let outcome = regenerate(&problem, &self.config, &mut rng);
        let positions = problem.positions(&outcome.state);
        let layout = assemble(&self.config, &run, positions, outcome, &mut rng);
        self.observer.on_layout(&layout);
        Ok(layout)
    }

    // ========================================================================
    // Incremental
    // ========================================================================

    /// Prepare a tick-driven run. The returned session is `Idle`; call
    /// [`IncrementalGeneration::start`] to begin.
    pub fn begin_incremental(
        &self,
        graph: &RoomGraph,
    ) -> Result<IncrementalGeneration, LayoutError> {
        let mut rng = LayoutRng::new(self.seed);
        let (run, problem) = self.prepare(graph, &mut rng)?;
        Ok(IncrementalGeneration {
            config: self.config.clone(),
            run,
            layout: IncrementalLayout::new(problem, self.config.clone(), rng),
        })
    }

    /// Finish a converged session: route corridors and notify the observer.
    pub fn complete(&mut self, session: &mut IncrementalGeneration) -> Option<DungeonLayout> {
        let layout = session.finish()?;
        self.observer.on_layout(&layout);
        Some(layout)
    }

    fn prepare(
        &self,
        graph: &RoomGraph,
        rng: &mut LayoutRng,
    ) -> Result<(PreparedRun, LayoutProblem), LayoutError> {
        self.config.validate()?;
        if graph.is_empty() {
            return Err(LayoutError::EmptyGraph);
        }
        if !graph.has_start() {
            return Err(LayoutError::MissingStartRoom);
        }
        log::info!(
            "generating layout for {} room(s), {} connection(s), seed {}",
            graph.node_count(),
            graph.connection_count(),
            self.seed
        );

        let mut graph = graph.clone();
        let pruned = prune_spawns(&mut graph, rng);
        let (footprints, warnings) =
            resolve_all(self.catalog.as_ref(), graph.nodes(), rng, &self.config);
        let distances = DistanceTable::compute(&graph);
        let fallback = RoomFootprint::fallback(&self.config);
        let problem = LayoutProblem::new(&graph, &distances, &footprints, &fallback);

        let run = PreparedRun {
            seed: self.seed,
            graph,
            pruned,
            footprints,
            warnings,
        };
        Ok((run, problem))
    }
}

/// Route corridors over an accepted placement and collect the result.
fn assemble(
    config: &LayoutConfig,
    run: &PreparedRun,
    positions: BTreeMap<NodeId, Position>,
    outcome: RegenerationOutcome,
    rng: &mut LayoutRng,
) -> DungeonLayout {
    let router = CorridorRouter::new(config, &positions, &run.footprints);
    let mut occupancy = OccupancyGrid::new(config.cell_size);
    router.stamp_rooms(&mut occupancy);
    let connections: Vec<Connection> = run.graph.connections();
    let (corridors, corridor_warnings) = router.route_all(&connections, &mut occupancy, rng);

    let mut warnings = run.warnings.clone();
    warnings.extend(outcome.warnings);
    warnings.extend(corridor_warnings);

    log::info!(
        "layout done: {} room(s), {} corridor(s), {} attempt(s), {} warning(s)",
        positions.len(),
        corridors.len(),
        outcome.attempts,
        warnings.len()
    );

    DungeonLayout {
        positions,
        footprints: run.footprints.clone(),
        corridors,
        occupancy,
        graph: run.graph.to_spec(),
        report: LayoutReport {
            seed: run.seed,
            room_attempts: outcome.attempts,
            iterations_run: outcome.iterations,
            converged: outcome.converged,
            pruned: run.pruned.clone(),
            warnings,
        },
    }
}

/// A prepared tick-driven run.
pub struct IncrementalGeneration {
    config: LayoutConfig,
    run: PreparedRun,
    layout: IncrementalLayout,
}

impl IncrementalGeneration {
    pub fn start(&mut self) {
        self.layout.start();
    }

    pub fn step(&mut self) -> Phase {
        self.layout.step()
    }

    pub fn tick(&mut self, dt: f32) -> Phase {
        self.layout.tick(dt)
    }

    pub fn cancel(&mut self) {
        self.layout.cancel();
    }

    pub fn phase(&self) -> Phase {
        self.layout.phase()
    }

    pub fn observed_positions(&self) -> Vec<f32> {
        self.layout.observed_positions()
    }

    pub fn target_positions(&self) -> Option<BTreeMap<NodeId, Position>> {
        self.layout.target_positions()
    }

    /// Rooms in the order used by [`Self::observed_positions`].
    pub fn room_ids(&self) -> Vec<NodeId> {
        self.layout.problem().entities().iter().map(|e| e.id).collect()
    }

    /// Route corridors once `Converged`. Consumes corridor randomness, so
    /// call it once per run.
    fn finish(&mut self) -> Option<DungeonLayout> {
        let outcome = self.layout.outcome()?;
        let positions = self.layout.problem().positions(&outcome.state);
        Some(assemble(
            &self.config,
            &self.run,
            positions,
            outcome,
            self.layout.rng_mut(),
        ))
    }
}
