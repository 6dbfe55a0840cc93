// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Junction keys invalidated by a batch of scene graph changes.
//!
//! Editing one wall changes the miter corners of every wall sharing a
//! junction with it, at both of its endpoints, before and after the edit.
//! [`DirtySet::collect`] replays a [`ChangeSet`] and records exactly those
//! keys, so the junction cache can re-mitre the affected neighbours as well
//! as the edited wall.

use floorplan_core::{Change, ChangeSet, Node, NodeId, NodeType, SceneGraph, WallData};
use floorplan_geometry::JunctionKey;
use rustc_hash::{FxHashMap, FxHashSet};

/// A junction key scoped to the level it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LevelJunctionKey {
    pub level: NodeId,
    pub key: JunctionKey,
}

/// Keys and walls touched by one batch of changes.
#[derive(Debug, Clone, Default)]
pub struct DirtySet {
    pub keys: FxHashSet<LevelJunctionKey>,
    /// Walls whose own attributes, level or openings changed.
    pub changed_walls: FxHashSet<NodeId>,
    pub removed_walls: FxHashSet<NodeId>,
}

impl DirtySet {
    /// Replays `changes` against `graph`, which must already reflect them.
    pub fn collect(changes: &ChangeSet, graph: &SceneGraph, tolerance: f64) -> Self {
        let removed_levels: FxHashMap<NodeId, Option<NodeId>> = changes
            .iter()
            .filter_map(|c| match c {
                Change::Removed { id, level, .. } => Some((*id, *level)),
                _ => None,
            })
            .collect();
        let level_of = |id: NodeId| match graph.level_of(id) {
            Some(level) => Some(level),
            None => removed_levels.get(&id).copied().flatten(),
        };

        let mut dirty = DirtySet::default();
        for change in changes {
            match change {
                Change::Added { id } => dirty.touch_current(graph, *id, tolerance),
                Change::Updated { id, before } => {
                    if let Some(wall) = before.as_wall() {
                        dirty.mark_wall(level_of(*id), *id, wall, tolerance);
                    }
                    dirty.touch_current(graph, *id, tolerance);
                }
                Change::Moved {
                    id,
                    from,
                    before_level,
                } => {
                    for node in std::iter::once(*id).chain(graph.descendants(*id)) {
                        let Some(wall) = graph.get_node(node).and_then(Node::as_wall) else {
                            continue;
                        };
                        let previous = if has_level_between(graph, node, *id) {
                            graph.level_of(node)
                        } else {
                            *before_level
                        };
                        dirty.mark_wall(previous, node, wall, tolerance);
                        dirty.touch_current(graph, node, tolerance);
                    }
                    if graph.node_type(*id).is_some_and(|t| t.is_opening()) {
                        if let Some(host) = from {
                            dirty.touch_host(graph, *host, tolerance);
                        }
                        dirty.touch_current(graph, *id, tolerance);
                    }
                }
                Change::Removed { id, node, level } => {
                    if let Some(wall) = node.as_wall() {
                        dirty.mark_wall(*level, *id, wall, tolerance);
                        dirty.removed_walls.insert(*id);
                    }
                    if node.node_type().is_opening() {
                        if let Some(host) = node.parent() {
                            dirty.touch_host(graph, host, tolerance);
                        }
                    }
                }
            }
        }

        dirty.changed_walls.retain(|w| graph.contains(*w));
        dirty
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.changed_walls.is_empty() && self.removed_walls.is_empty()
    }

    /// Levels that need their junctions re-resolved.
    pub fn levels(&self) -> FxHashSet<NodeId> {
        self.keys.iter().map(|k| k.level).collect()
    }

    /// Whether either endpoint of `wall` sits on a dirty key of `level`.
    pub fn touches(&self, level: NodeId, wall: &WallData, tolerance: f64) -> bool {
        [wall.start, wall.end].iter().any(|p| {
            self.keys.contains(&LevelJunctionKey {
                level,
                key: JunctionKey::snap(&p.to_nalgebra(), tolerance),
            })
        })
    }

    /// Keys in a stable order.
    pub fn sorted_keys(&self) -> Vec<LevelJunctionKey> {
        let mut keys: Vec<LevelJunctionKey> = self.keys.iter().copied().collect();
        keys.sort_unstable();
        keys
    }

    fn mark_wall(&mut self, level: Option<NodeId>, id: NodeId, wall: &WallData, tolerance: f64) {
        let Some(level) = level else {
            return;
        };
        for p in [wall.start, wall.end] {
            self.keys.insert(LevelJunctionKey {
                level,
                key: JunctionKey::snap(&p.to_nalgebra(), tolerance),
            });
        }
        self.changed_walls.insert(id);
    }

    /// Marks `id` as it is now: a wall marks its own keys, an opening marks
    /// its host.
    fn touch_current(&mut self, graph: &SceneGraph, id: NodeId, tolerance: f64) {
        let Some(node) = graph.get_node(id) else {
            return;
        };
        if let Some(wall) = node.as_wall() {
            self.mark_wall(graph.level_of(id), id, wall, tolerance);
        } else if node.node_type().is_opening() {
            if let Some(host) = node.parent() {
                self.touch_host(graph, host, tolerance);
            }
        }
    }

    fn touch_host(&mut self, graph: &SceneGraph, host: NodeId, tolerance: f64) {
        if let Some(wall) = graph.get_node(host).and_then(Node::as_wall) {
            self.mark_wall(graph.level_of(host), host, wall, tolerance);
        }
    }
}

/// Whether a level lies on the path from `node` up to `root` (inclusive), so
/// that moving `root` did not change the level of `node`.
fn has_level_between(graph: &SceneGraph, node: NodeId, root: NodeId) -> bool {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if graph.node_type(current) == Some(NodeType::Level) {
            return true;
        }
        if current == root {
            break;
        }
        cursor = graph.parent(current);
    }
    false
}
