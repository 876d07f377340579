//! Dungeon Layout - WASM Module
//!
//! This module lays out a graph of rooms in 2D and routes corridors between
//! them. It is compiled to WebAssembly and exposes a JavaScript-friendly API
//! via wasm-bindgen; the same pipeline is usable natively as an rlib.
//!
//! # Architecture
//!
//! - `graph`: Room graph on petgraph's StableGraph, hop distances, spawn pruning
//! - `spatial`: R-tree index over room boxes for overlap queries
//! - `layout`: Footprints, relaxation, regeneration, incremental driver, corridors
//! - `generator`: The end-to-end pipeline and its observer seam

use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::prelude::*;

pub mod error;
pub mod generator;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod rng;
pub mod spatial;

use error::LayoutError;
use generator::{DungeonGenerator, DungeonLayout, IncrementalGeneration};
use graph::{GraphSpec, NodeId, RoomGraph, RoomKind, SizeCategory};
use layout::{Cell, LayoutConfig, Phase, StaticCatalog};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init_logging();
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Main entry point for dungeon layout.
///
/// Holds the room graph being authored, the generator configuration, the
/// last finished layout and at most one incremental session.
#[wasm_bindgen]
pub struct DungeonLayoutWasm {
    graph: RoomGraph,
    generator: DungeonGenerator,
    session: Option<IncrementalGeneration>,
    /// The live session still needs corridors routed once it converges.
    session_open: bool,
    last: Option<DungeonLayout>,
}

#[wasm_bindgen]
impl DungeonLayoutWasm {
    /// Create an empty graph with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32) -> Self {
        Self {
            graph: RoomGraph::new(),
            generator: DungeonGenerator::new(LayoutConfig::default(), u64::from(seed)),
            session: None,
            session_open: false,
            last: None,
        }
    }

    #[wasm_bindgen(js_name = setSeed)]
    pub fn set_seed(&mut self, seed: u32) {
        self.generator.set_seed(u64::from(seed));
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the configuration. Missing fields take their defaults.
    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: LayoutConfig = serde_wasm_bindgen::from_value(config)?;
        config.validate().map_err(to_js)?;
        self.generator.set_config(config);
        Ok(())
    }

    #[wasm_bindgen(js_name = getConfig)]
    pub fn get_config(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.generator.config())?)
    }

    /// Replace the room catalog with a list of `{ kind, size?, footprint }`
    /// entries.
    #[wasm_bindgen(js_name = setCatalog)]
    pub fn set_catalog(&mut self, catalog: JsValue) -> Result<(), JsValue> {
        let catalog: StaticCatalog = serde_wasm_bindgen::from_value(catalog)?;
        log::info!("catalog set with {} footprint(s)", catalog.len());
        self.generator.set_catalog(Box::new(catalog));
        Ok(())
    }

    // =========================================================================
    // Graph Operations
    // =========================================================================

    /// Add a room and return its id.
    ///
    /// `kind`: 0 start, 1 basic, 2 boss, 3 treasure, 4 end.
    /// `size`: 0 small, 1 medium, 2 large, anything else unsized.
    #[wasm_bindgen(js_name = addRoom)]
    pub fn add_room(&mut self, kind: u8, size: u8, probability: f32) -> u32 {
        self.graph
            .add_room(RoomKind::from(kind), SizeCategory::from_raw(size), probability)
            .raw()
    }

    /// Remove a room and its connections.
    #[wasm_bindgen(js_name = removeRoom)]
    pub fn remove_room(&mut self, id: u32) -> bool {
        self.graph.remove_node(NodeId(id)).is_some()
    }

    /// Connect two rooms.
    pub fn connect(&mut self, a: u32, b: u32) -> Result<(), JsValue> {
        self.graph
            .connect(NodeId(a), NodeId(b))
            .map(|_| ())
            .map_err(to_js)
    }

    pub fn disconnect(&mut self, a: u32, b: u32) -> bool {
        self.graph.disconnect(NodeId(a), NodeId(b))
    }

    /// Replace the whole graph with `{ nodes, connections }`.
    #[wasm_bindgen(js_name = loadGraph)]
    pub fn load_graph(&mut self, spec: JsValue) -> Result<(), JsValue> {
        let spec: GraphSpec = serde_wasm_bindgen::from_value(spec)?;
        self.graph = RoomGraph::from_spec(&spec).map_err(to_js)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = roomCount)]
    pub fn room_count(&self) -> u32 {
        self.graph.node_count() as u32
    }

    #[wasm_bindgen(js_name = connectionCount)]
    pub fn connection_count(&self) -> u32 {
        self.graph.connection_count() as u32
    }

    // =========================================================================
    // Batch Generation
    // =========================================================================

    /// Generate a layout and return it as a plain object.
    pub fn generate(&mut self) -> Result<JsValue, JsValue> {
        let layout = self.generator.generate(&self.graph).map_err(to_js)?;
        let value = serde_wasm_bindgen::to_value(&layout)?;
        self.last = Some(layout);
        Ok(value)
    }

    /// The last finished layout, or undefined.
    #[wasm_bindgen(js_name = lastLayout)]
    pub fn last_layout(&self) -> Result<JsValue, JsValue> {
        match &self.last {
            Some(layout) => Ok(serde_wasm_bindgen::to_value(layout)?),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Occupancy of a grid cell in the last layout: the room id, -2 for
    /// corridor, -1 for empty.
    #[wasm_bindgen(js_name = cellAt)]
    pub fn cell_at(&self, x: i32, y: i32) -> i64 {
        match self.last.as_ref().and_then(|l| l.occupancy.cell(x, y)) {
            Some(Cell::Room(id)) => i64::from(id.raw()),
            Some(Cell::Corridor) => -2,
            None => -1,
        }
    }

    // =========================================================================
    // Incremental Generation
    // =========================================================================

    /// Prepare and start a tick-driven run, replacing any previous one.
    #[wasm_bindgen(js_name = beginIncremental)]
    pub fn begin_incremental(&mut self) -> Result<(), JsValue> {
        let mut session = self
            .generator
            .begin_incremental(&self.graph)
            .map_err(to_js)?;
        session.start();
        self.session = Some(session);
        self.session_open = true;
        Ok(())
    }

    /// Advance the live run by `dt` seconds. Returns true once the layout
    /// is finished; the result is then available from `lastLayout`.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.tick(dt) != Phase::Converged {
            return false;
        }
        if self.session_open {
            self.last = self.generator.complete(session);
            self.session_open = false;
        }
        true
    }

    /// Abandon the live run.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cancel();
        }
        self.session_open = false;
    }

    /// Phase of the live run: "idle", "running", "converged" or "cancelled".
    pub fn phase(&self) -> String {
        let phase = self
            .session
            .as_ref()
            .map_or(Phase::Idle, IncrementalGeneration::phase);
        match phase {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Converged => "converged",
            Phase::Cancelled => "cancelled",
        }
        .to_string()
    }

    /// Eased positions of the live run as [x0, y0, x1, y1, ...], ordered as
    /// `observedRoomIds`.
    #[wasm_bindgen(js_name = observedPositions)]
    pub fn observed_positions(&self) -> Float32Array {
        let positions = self
            .session
            .as_ref()
            .map(IncrementalGeneration::observed_positions)
            .unwrap_or_default();
        Float32Array::from(&positions[..])
    }

    #[wasm_bindgen(js_name = observedRoomIds)]
    pub fn observed_room_ids(&self) -> Uint32Array {
        let ids: Vec<u32> = self
            .session
            .as_ref()
            .map(|s| s.room_ids().into_iter().map(NodeId::raw).collect())
            .unwrap_or_default();
        Uint32Array::from(&ids[..])
    }
}

impl DungeonLayoutWasm {
    /// Native access to the last layout.
    pub fn layout(&self) -> Option<&DungeonLayout> {
        self.last.as_ref()
    }

    /// Native batch generation without JS conversion.
    pub fn generate_layout(&mut self) -> Result<&DungeonLayout, LayoutError> {
        let layout = self.generator.generate(&self.graph)?;
        Ok(self.last.insert(layout))
    }
}
