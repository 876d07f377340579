//! Room footprints and the catalog that supplies them.
//!
//! A footprint is the physical extent of a room: an axis-aligned box around
//! the room's pivot plus optional exit anchors where corridors prefer to
//! attach. Footprints come from an injected [`RoomCatalog`] keyed by
//! `(RoomKind, Option<SizeCategory>)`; a run-owned [`PrefabUsage`] spreads
//! picks across the variants a key offers.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::graph::{NodeId, RoomKind, RoomNode, SizeCategory};
use crate::rng::LayoutRng;

use super::config::LayoutConfig;
use super::warning::LayoutWarning;

/// Axis-aligned box in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    #[inline]
    pub fn min(&self) -> [f32; 2] {
        [
            self.center_x - self.width * 0.5,
            self.center_y - self.height * 0.5,
        ]
    }

    #[inline]
    pub fn max(&self) -> [f32; 2] {
        [
            self.center_x + self.width * 0.5,
            self.center_y + self.height * 0.5,
        ]
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min[0] < b_max[0] && b_min[0] < a_max[0] && a_min[1] < b_max[1] && b_min[1] < a_max[1]
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// A named local point on a footprint where corridors prefer to attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitAnchor {
    #[serde(default)]
    pub name: String,
    /// Offset from the room pivot.
    pub x: f32,
    pub y: f32,
}

impl ExitAnchor {
    pub fn new(name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

/// Resolved geometry for one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFootprint {
    /// Variant name; used to avoid repeating a prefab within one run.
    #[serde(default)]
    pub name: String,
    pub width: f32,
    pub height: f32,
    /// Box center relative to the pivot.
    #[serde(default)]
    pub center_x: f32,
    #[serde(default)]
    pub center_y: f32,
    #[serde(default)]
    pub exits: Vec<ExitAnchor>,
}

impl RoomFootprint {
    /// A box centered on the pivot, without exits.
    pub fn rect(name: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            center_x: 0.0,
            center_y: 0.0,
            exits: Vec::new(),
        }
    }

    pub fn with_exit(mut self, exit: ExitAnchor) -> Self {
        self.exits.push(exit);
        self
    }

    /// The fallback used when the catalog has nothing for a room.
    pub fn fallback(config: &LayoutConfig) -> Self {
        Self::rect("default", config.default_room_width, config.default_room_height)
    }

    /// Radius used by the relaxation: half the longer side.
    #[inline]
    pub fn radius(&self) -> f32 {
        self.width.max(self.height) * 0.5
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// The bounding box with the pivot placed at `(x, y)`.
    pub fn bounds_at(&self, x: f32, y: f32) -> BoundingBox {
        BoundingBox::new(x + self.center_x, y + self.center_y, self.width, self.height)
    }

    /// Why this footprint cannot be placed, or `None` if it can.
    pub fn defect(&self) -> Option<&'static str> {
        let sides = [self.width, self.height];
        if sides.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Some("width and height must be finite and positive");
        }
        if sides.iter().any(|s| *s > MAX_FOOTPRINT_EXTENT) {
            return Some("side exceeds the maximum footprint extent");
        }
        let mut offsets = [self.center_x, self.center_y]
            .into_iter()
            .chain(self.exits.iter().flat_map(|e| [e.x, e.y]));
        if offsets.any(|v| !v.is_finite() || v.abs() > MAX_FOOTPRINT_EXTENT) {
            return Some("center and exit offsets must be finite and within the maximum extent");
        }
        None
    }
}

/// Longest accepted footprint side, in world units. Also bounds the center
/// and exit offsets.
pub const MAX_FOOTPRINT_EXTENT: f32 = 1024.0;

/// Source of candidate footprints.
pub trait RoomCatalog {
    /// All footprint variants registered for a kind and size. An empty list
    /// means "nothing registered".
    fn candidates(&self, kind: RoomKind, size: Option<SizeCategory>) -> Vec<RoomFootprint>;
}

/// One lookup-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub kind: RoomKind,
    #[serde(default)]
    pub size: Option<SizeCategory>,
    pub footprint: RoomFootprint,
}

/// Lookup-table catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a footprint variant.
    pub fn insert(&mut self, kind: RoomKind, size: Option<SizeCategory>, footprint: RoomFootprint) {
        self.entries.push(CatalogEntry {
            kind,
            size,
            footprint,
        });
    }

    pub fn with(
        mut self,
        kind: RoomKind,
        size: Option<SizeCategory>,
        footprint: RoomFootprint,
    ) -> Self {
        self.insert(kind, size, footprint);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RoomCatalog for StaticCatalog {
    fn candidates(&self, kind: RoomKind, size: Option<SizeCategory>) -> Vec<RoomFootprint> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind && entry.size == size)
            .map(|entry| entry.footprint.clone())
            .collect()
    }
}

/// Prefab variants already used in the current run, per room kind.
#[derive(Debug, Clone, Default)]
pub struct PrefabUsage {
    used: BTreeMap<RoomKind, BTreeSet<String>>,
}

impl PrefabUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_used(&self, kind: RoomKind, name: &str) -> bool {
        self.used.get(&kind).is_some_and(|names| names.contains(name))
    }

    pub fn mark(&mut self, kind: RoomKind, name: &str) {
        self.used.entry(kind).or_default().insert(name.to_string());
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}

/// Pick a footprint for one room.
///
/// Lookup order is `(kind, size)`, then `(kind, None)`, then the configured
/// fallback box (which also produces a warning). Footprints with a
/// [`RoomFootprint::defect`] are dropped before picking. Among variants, an
/// unused one is chosen uniformly; once all are used, any variant may repeat.
pub fn resolve_footprint(
    catalog: &dyn RoomCatalog,
    node: &RoomNode,
    usage: &mut PrefabUsage,
    rng: &mut LayoutRng,
    config: &LayoutConfig,
) -> (RoomFootprint, Option<LayoutWarning>) {
    let mut rejected = None;
    let mut candidates = placeable(catalog.candidates(node.kind, node.size), node, &mut rejected);
    if candidates.is_empty() && node.size.is_some() {
        candidates = placeable(catalog.candidates(node.kind, None), node, &mut rejected);
    }
    if candidates.is_empty() {
        let warning = match rejected {
            Some((name, reason)) => LayoutWarning::InvalidFootprint {
                node: node.id,
                kind: node.kind,
                name,
                reason: reason.to_string(),
            },
            None => {
                log::warn!(
                    "no footprint for {} ({}), using {}x{} fallback",
                    node.id,
                    node.kind,
                    config.default_room_width,
                    config.default_room_height
                );
                LayoutWarning::MissingFootprint {
                    node: node.id,
                    kind: node.kind,
                }
            }
        };
        return (RoomFootprint::fallback(config), Some(warning));
    }

    let fresh: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, fp)| !usage.is_used(node.kind, &fp.name))
        .map(|(i, _)| i)
        .collect();
    let pick = if fresh.is_empty() {
        rng.index(candidates.len())
    } else {
        fresh[rng.index(fresh.len())]
    };

    let footprint = candidates.swap_remove(pick);
    usage.mark(node.kind, &footprint.name);
    (footprint, None)
}

/// Drop footprints that cannot be placed, remembering the first one.
fn placeable(
    candidates: Vec<RoomFootprint>,
    node: &RoomNode,
    rejected: &mut Option<(String, &'static str)>,
) -> Vec<RoomFootprint> {
    candidates
        .into_iter()
        .filter(|fp| match fp.defect() {
            None => true,
            Some(reason) => {
                log::warn!("footprint '{}' for {} rejected: {}", fp.name, node.id, reason);
                rejected.get_or_insert_with(|| (fp.name.clone(), reason));
                false
            }
        })
        .collect()
}

/// Resolve footprints for every room in a list, in order.
pub fn resolve_all<'a>(
    catalog: &dyn RoomCatalog,
    nodes: impl IntoIterator<Item = &'a RoomNode>,
    rng: &mut LayoutRng,
    config: &LayoutConfig,
) -> (BTreeMap<NodeId, RoomFootprint>, Vec<LayoutWarning>) {
    let mut usage = PrefabUsage::new();
    let mut footprints = BTreeMap::new();
    let mut warnings = Vec::new();
    for node in nodes {
        let (footprint, warning) = resolve_footprint(catalog, node, &mut usage, rng, config);
        footprints.insert(node.id, footprint);
        warnings.extend(warning);
    }
    (footprints, warnings)
}
