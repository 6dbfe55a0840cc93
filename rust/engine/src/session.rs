// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The editing session: one owner for the graph and everything derived
//! from it.
//!
//! Every mutation goes through [`EditorSession`], which applies it to the
//! [`SceneGraph`], replays the resulting change journal into the spatial
//! index, prunes the overlay, and re-resolves the junctions the change
//! touched before returning. Callers therefore never observe a stale index
//! or a stale wall polygon.

use std::fmt;

use floorplan_core::{
    footprint, CellRange, Change, ChangeSet, EditorConfig, EditorOverlay, GridCell, GridRect,
    Node, NodeId, NodePatch, NodeType, Point2D, SceneGraph, SpatialIndex, SplitOutcome, WallData,
};
use floorplan_geometry::{JunctionMap, WallGeometry};
use rustc_hash::FxHashSet;
use tracing::{debug, error};

use crate::cache::{JunctionCache, LevelCache, StaleEntry};
use crate::collaborators::HistorySink;
use crate::dirty::{DirtySet, LevelJunctionKey};
use crate::error::Result;

/// What one mutation invalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Junction keys whose corners were recomputed, sorted.
    pub dirty_junctions: Vec<LevelJunctionKey>,
    /// Walls whose polygon was rebuilt and must be re-extruded.
    pub rebuilt_walls: Vec<NodeId>,
    /// Walls whose polygon no longer exists.
    pub removed_walls: Vec<NodeId>,
    /// Graph revision after the mutation.
    pub revision: u64,
}

impl MutationReport {
    /// True when nothing derived from the graph changed.
    pub fn is_empty(&self) -> bool {
        self.dirty_junctions.is_empty()
            && self.rebuilt_walls.is_empty()
            && self.removed_walls.is_empty()
    }
}

/// Editor context owning the scene graph, spatial index, overlay and
/// junction cache.
pub struct EditorSession {
    config: EditorConfig,
    graph: SceneGraph,
    index: SpatialIndex,
    overlay: EditorOverlay,
    cache: JunctionCache,
    history: Option<Box<dyn HistorySink>>,
}

impl fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorSession")
            .field("config", &self.config)
            .field("nodes", &self.graph.len())
            .field("revision", &self.graph.revision())
            .field("indexed", &self.index.node_count())
            .field("overlay", &self.overlay.len())
            .field("history", &self.history.is_some())
            .finish()
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Creates an empty session.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            graph: SceneGraph::new(),
            index: SpatialIndex::new(),
            overlay: EditorOverlay::new(),
            cache: JunctionCache::new(),
            history: None,
        }
    }

    /// Creates an empty session configured from `FLOORPLAN_*` variables.
    pub fn from_env() -> Self {
        Self::new(EditorConfig::from_env())
    }

    /// Wraps an existing graph, building the index and cache from scratch.
    pub fn with_graph(config: EditorConfig, mut graph: SceneGraph) -> Self {
        graph.drain_changes();
        let index = SpatialIndex::rebuild(&graph, config.cell_size);
        let cache = JunctionCache::build(&graph, config.snap_tolerance);
        Self {
            config,
            graph,
            index,
            overlay: EditorOverlay::new(),
            cache,
            history: None,
        }
    }

    /// Registers the collaborator notified after every effective mutation.
    pub fn set_history(&mut self, sink: impl HistorySink + 'static) {
        self.history = Some(Box::new(sink));
    }

    pub fn clear_history(&mut self) {
        self.history = None;
    }

    // --- Accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn overlay(&self) -> &EditorOverlay {
        &self.overlay
    }

    pub fn revision(&self) -> u64 {
        self.graph.revision()
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.graph.get_node(id)
    }

    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.graph.children(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.graph.parent(id)
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        self.graph.ancestors(id)
    }

    // --- Mutations ---

    pub fn add_node(&mut self, node: Node, parent: Option<NodeId>) -> Result<(NodeId, MutationReport)> {
        let result = self.graph.add_node(node, parent);
        let report = self.commit();
        Ok((result?, report))
    }

    pub fn add_node_at(
        &mut self,
        node: Node,
        parent: Option<NodeId>,
        index: usize,
    ) -> Result<(NodeId, MutationReport)> {
        let result = self.graph.add_node_at(node, parent, index);
        let report = self.commit();
        Ok((result?, report))
    }

    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> Result<MutationReport> {
        let result = self.graph.update_node(id, patch);
        let report = self.commit();
        result?;
        Ok(report)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<MutationReport> {
        let result = self.graph.delete_node(id);
        let report = self.commit();
        result?;
        Ok(report)
    }

    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<MutationReport> {
        let result = self.graph.move_node(id, new_parent);
        let report = self.commit();
        result?;
        Ok(report)
    }

    /// Adds a wall under `parent` with the configured default thickness and
    /// height.
    pub fn add_wall(
        &mut self,
        parent: NodeId,
        start: Point2D,
        end: Point2D,
    ) -> Result<(NodeId, MutationReport)> {
        let wall = WallData::new(
            start,
            end,
            self.config.default_wall_thickness,
            self.config.default_wall_height,
        );
        self.add_node(Node::new(wall), Some(parent))
    }

    /// Removes cells `range_start..=range_end` from `wall`.
    pub fn split_wall(
        &mut self,
        wall: NodeId,
        range_start: u32,
        range_end: u32,
    ) -> Result<(SplitOutcome, MutationReport)> {
        let result = self.graph.split_wall(wall, range_start, range_end);
        let report = self.commit();
        Ok((result?, report))
    }

    // --- Spatial queries ---

    /// Nodes occupying the cell under `point` on `level`.
    pub fn query_point(&self, level: NodeId, point: Point2D) -> Vec<NodeId> {
        self.query_cell(level, GridCell::containing(&point, self.config.cell_size))
    }

    pub fn query_cell(&self, level: NodeId, cell: GridCell) -> Vec<NodeId> {
        self.live(self.index.query_point(level, cell))
    }

    /// Nodes intersecting the cells spanned by two corner points.
    pub fn query_region(&self, level: NodeId, a: Point2D, b: Point2D) -> Vec<NodeId> {
        let size = self.config.cell_size;
        let rect = GridRect::from_corners(
            GridCell::containing(&a, size),
            GridCell::containing(&b, size),
        );
        self.live(self.index.query_region(level, rect))
    }

    /// Fails with [`floorplan_core::Error::IndexDesync`] on the first indexed
    /// node the graph no longer has.
    pub fn check_index(&self) -> Result<()> {
        match self.index.stale_entries(&self.graph).into_iter().min() {
            Some(id) => Err(floorplan_core::Error::IndexDesync(id).into()),
            None => Ok(()),
        }
    }

    fn live(&self, mut ids: Vec<NodeId>) -> Vec<NodeId> {
        ids.retain(|id| {
            let alive = self.graph.contains(*id);
            if !alive {
                error!(node = ?id, "spatial index returned a deleted node");
                debug_assert!(alive, "spatial index out of sync: {id:?}");
            }
            alive
        });
        ids
    }

    // --- Geometry ---

    pub fn wall_geometry(&self, wall: NodeId) -> Option<&WallGeometry> {
        self.cache.wall(wall)
    }

    pub fn level_geometry(&self, level: NodeId) -> Option<&LevelCache> {
        self.cache.level(level)
    }

    pub fn junctions(&self, level: NodeId) -> Option<&JunctionMap> {
        self.cache.junctions(level)
    }

    /// Cache entries that disagree with a from-scratch resolution.
    pub fn verify_geometry(&self) -> Vec<StaleEntry> {
        self.cache.verify(&self.graph, self.config.snap_tolerance)
    }

    // --- Interactive tools ---

    /// Adds `node` flagged as an in-progress preview.
    pub fn begin_preview(
        &mut self,
        node: Node,
        parent: Option<NodeId>,
    ) -> Result<(NodeId, MutationReport)> {
        let (id, report) = self.add_node(node, parent)?;
        self.overlay.set_preview(id, true);
        Ok((id, report))
    }

    /// Deletes `id` if it is still a preview. Returns `None` for anything
    /// else, so a cancel after commit is harmless.
    pub fn cancel_preview(&mut self, id: NodeId) -> Result<Option<MutationReport>> {
        if !self.overlay.is_preview(id) {
            return Ok(None);
        }
        self.delete_node(id).map(Some)
    }

    /// Keeps a preview as a regular node.
    pub fn commit_preview(&mut self, id: NodeId) -> Result<()> {
        self.require(id)?;
        self.overlay.set_preview(id, false);
        Ok(())
    }

    pub fn set_placement_valid(&mut self, id: NodeId, valid: Option<bool>) -> Result<()> {
        self.require(id)?;
        self.overlay.set_placement_valid(id, valid);
        Ok(())
    }

    pub fn set_delete_range(&mut self, wall: NodeId, range: Option<CellRange>) -> Result<()> {
        self.require_wall(wall)?;
        self.overlay.set_delete_range(wall, range);
        Ok(())
    }

    pub fn set_paint_range(&mut self, wall: NodeId, range: Option<CellRange>) -> Result<()> {
        self.require_wall(wall)?;
        self.overlay.set_paint_range(wall, range);
        Ok(())
    }

    /// Splits `wall` at its marked delete range and clears the mark.
    pub fn commit_delete_range(
        &mut self,
        wall: NodeId,
    ) -> Result<Option<(SplitOutcome, MutationReport)>> {
        self.require_wall(wall)?;
        let Some(range) = self.overlay.get(wall).delete_range else {
            return Ok(None);
        };
        self.overlay.set_delete_range(wall, None);
        self.split_wall(wall, range.start, range.end).map(Some)
    }

    fn require(&self, id: NodeId) -> Result<()> {
        if self.graph.contains(id) {
            Ok(())
        } else {
            Err(floorplan_core::Error::NotFound(id).into())
        }
    }

    fn require_wall(&self, id: NodeId) -> Result<()> {
        match self.graph.node_type(id) {
            Some(NodeType::Wall) => Ok(()),
            Some(_) => Err(floorplan_core::Error::WrongKind {
                node: id,
                expected: NodeType::Wall,
            }
            .into()),
            None => Err(floorplan_core::Error::NotFound(id).into()),
        }
    }

    // --- Persistence and history ---

    /// Serializes the graph. The overlay is session state and is left out.
    pub fn to_json(&self) -> Result<String> {
        Ok(self.graph.to_json()?)
    }

    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self> {
        let graph = SceneGraph::from_json(json)?;
        Ok(Self::with_graph(config, graph))
    }

    /// Parses an [`EditorConfig`]; missing fields keep their defaults.
    pub fn config_from_json(json: &str) -> Result<EditorConfig> {
        Ok(serde_json::from_str(json)?)
    }

    /// A history snapshot sharing every node with the live graph.
    pub fn snapshot(&self) -> SceneGraph {
        self.graph.snapshot()
    }

    /// Replaces the graph with `snapshot` and rebuilds everything derived
    /// from it.
    pub fn restore(&mut self, mut snapshot: SceneGraph) -> MutationReport {
        snapshot.drain_changes();
        let before: FxHashSet<NodeId> = self.cache.walls().collect();

        self.graph = snapshot;
        self.index = SpatialIndex::rebuild(&self.graph, self.config.cell_size);
        self.cache = JunctionCache::build(&self.graph, self.config.snap_tolerance);
        let stale: Vec<NodeId> = self
            .overlay
            .ids()
            .filter(|id| !self.graph.contains(*id))
            .collect();
        self.overlay.prune(stale);

        let mut rebuilt: Vec<NodeId> = self.cache.walls().collect();
        rebuilt.sort_unstable();
        let mut removed: Vec<NodeId> = before
            .into_iter()
            .filter(|w| self.cache.wall(*w).is_none())
            .collect();
        removed.sort_unstable();

        debug!(
            revision = self.graph.revision(),
            walls = rebuilt.len(),
            "restored snapshot"
        );
        MutationReport {
            dirty_junctions: Vec::new(),
            rebuilt_walls: rebuilt,
            removed_walls: removed,
            revision: self.graph.revision(),
        }
    }

    // --- Commit ---

    /// Replays pending graph changes into every derived structure.
    fn commit(&mut self) -> MutationReport {
        let changes = self.graph.drain_changes();
        let revision = self.graph.revision();
        if changes.is_empty() {
            return MutationReport {
                revision,
                ..MutationReport::default()
            };
        }

        self.resync_index(&changes);
        self.overlay.prune(changes.removed());

        let tolerance = self.config.snap_tolerance;
        let dirty = DirtySet::collect(&changes, &self.graph, tolerance);
        let refresh = self.cache.refresh(&self.graph, &dirty, tolerance);

        let report = MutationReport {
            dirty_junctions: dirty.sorted_keys(),
            rebuilt_walls: refresh.rebuilt,
            removed_walls: refresh.removed,
            revision,
        };
        debug!(
            revision,
            changes = changes.len(),
            dirty = report.dirty_junctions.len(),
            rebuilt = report.rebuilt_walls.len(),
            removed = report.removed_walls.len(),
            "committed mutation"
        );

        if let Some(history) = self.history.as_mut() {
            history.record(revision, self.graph.snapshot());
        }
        report
    }

    fn resync_index(&mut self, changes: &ChangeSet) {
        let mut touched = FxHashSet::default();
        for change in changes {
            match change {
                Change::Removed { id, .. } => {
                    self.index.remove_node(*id);
                }
                Change::Added { id } => {
                    touched.insert(*id);
                }
                Change::Updated { id, .. } => {
                    touched.insert(*id);
                    // Openings take their cells from the host wall.
                    if self.graph.node_type(*id) == Some(NodeType::Wall) {
                        touched.extend(self.graph.children(*id).unwrap_or_default());
                    }
                }
                Change::Moved { id, .. } => {
                    touched.insert(*id);
                    touched.extend(self.graph.descendants(*id));
                }
            }
        }

        let cell_size = self.config.cell_size;
        for id in touched {
            if !self.graph.contains(id) {
                continue;
            }
            match self.graph.level_of(id) {
                Some(level) => self
                    .index
                    .insert(level, id, footprint(&self.graph, id, cell_size)),
                None => {
                    self.index.remove_node(id);
                }
            }
        }
    }
}
