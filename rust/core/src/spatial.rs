// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-level spatial index from grid cells to the nodes occupying them.
//!
//! The index is a pure derived structure: it stores nothing but id-to-cell
//! mappings and can always be rebuilt from the scene graph with
//! [`SpatialIndex::rebuild`]. Each node has at most one placement; inserting
//! a node again replaces its previous placement entirely (also when the node
//! changed level), so no stale cell survives an update.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::footprint::footprint;
use crate::graph::SceneGraph;
use crate::keys::NodeId;
use crate::types::{GridCell, GridRect};

type Occupants = SmallVec<[NodeId; 4]>;

/// Cells and level recorded for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placement {
    level: NodeId,
    /// Sorted, deduplicated.
    cells: Vec<GridCell>,
}

/// A grid-based spatial hash, one grid per level.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    levels: FxHashMap<NodeId, FxHashMap<GridCell, Occupants>>,
    placements: FxHashMap<NodeId, Placement>,
}

impl SpatialIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from the current footprint of every node in `graph`.
    pub fn rebuild(graph: &SceneGraph, cell_size: f64) -> Self {
        let mut index = Self::new();
        for (id, _) in graph.iter() {
            if let Some(level) = graph.level_of(id) {
                index.insert(level, id, footprint(graph, id, cell_size));
            }
        }
        index
    }

    /// Records `node` as occupying `cells` on `level`, replacing any previous
    /// placement. An empty cell set leaves the node unindexed.
    pub fn insert(
        &mut self,
        level: NodeId,
        node: NodeId,
        cells: impl IntoIterator<Item = GridCell>,
    ) {
        self.remove_node(node);

        let mut cells: Vec<GridCell> = cells.into_iter().collect();
        cells.sort_unstable();
        cells.dedup();
        if cells.is_empty() {
            return;
        }

        let grid = self.levels.entry(level).or_default();
        for cell in &cells {
            grid.entry(*cell).or_default().push(node);
        }
        self.placements.insert(node, Placement { level, cells });
    }

    /// Removes `node` from `level`. Returns `false` if it was not indexed there.
    pub fn remove(&mut self, level: NodeId, node: NodeId) -> bool {
        match self.placements.get(&node) {
            Some(placement) if placement.level == level => self.remove_node(node),
            _ => false,
        }
    }

    /// Removes `node` from whichever level it is indexed on.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        let Some(placement) = self.placements.remove(&node) else {
            return false;
        };
        if let Some(grid) = self.levels.get_mut(&placement.level) {
            for cell in &placement.cells {
                if let Some(occupants) = grid.get_mut(cell) {
                    occupants.retain(|n| *n != node);
                    if occupants.is_empty() {
                        grid.remove(cell);
                    }
                }
            }
            if grid.is_empty() {
                self.levels.remove(&placement.level);
            }
        }
        true
    }

    /// Nodes whose footprint covers `cell`, in no particular order.
    pub fn query_point(&self, level: NodeId, cell: GridCell) -> Vec<NodeId> {
        self.levels
            .get(&level)
            .and_then(|grid| grid.get(&cell))
            .map(|occupants| occupants.to_vec())
            .unwrap_or_default()
    }

    /// Nodes whose footprint intersects `rect`, each listed once.
    pub fn query_region(&self, level: NodeId, rect: GridRect) -> Vec<NodeId> {
        let Some(grid) = self.levels.get(&level) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut collect = |occupants: &Occupants| {
            for node in occupants {
                if seen.insert(*node) {
                    out.push(*node);
                }
            }
        };

        // Walk whichever side is smaller: the rectangle or the occupied cells.
        if rect.area() <= grid.len() as u64 {
            for cell in rect.cells() {
                if let Some(occupants) = grid.get(&cell) {
                    collect(occupants);
                }
            }
        } else {
            for (cell, occupants) in grid {
                if rect.contains(cell) {
                    collect(occupants);
                }
            }
        }
        out
    }

    /// Cells recorded for `node`.
    pub fn cells_of(&self, node: NodeId) -> Option<&[GridCell]> {
        self.placements.get(&node).map(|p| p.cells.as_slice())
    }

    /// Level `node` is indexed on.
    pub fn level_of(&self, node: NodeId) -> Option<NodeId> {
        self.placements.get(&node).map(|p| p.level)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.placements.contains_key(&node)
    }

    /// Number of indexed nodes.
    pub fn node_count(&self) -> usize {
        self.placements.len()
    }

    /// Indexed nodes that no longer exist in `graph`.
    pub fn stale_entries(&self, graph: &SceneGraph) -> Vec<NodeId> {
        self.placements
            .keys()
            .filter(|id| !graph.contains(**id))
            .copied()
            .collect()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
        self.placements.clear();
    }
}

impl PartialEq for SpatialIndex {
    /// Two indexes are equal when they record the same placements; the order
    /// of occupants inside a cell is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.placements == other.placements
    }
}
