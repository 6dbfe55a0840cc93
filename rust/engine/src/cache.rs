// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-level cache of resolved junctions and wall geometry.

use floorplan_core::{NodeId, NodeType, SceneGraph};
use floorplan_geometry::{
    build_level_geometry, build_wall_geometry, resolve_level, JunctionMap, Resolution,
    WallGeometry,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::dirty::DirtySet;

/// Resolved state of one level.
#[derive(Debug, Clone, Default)]
pub struct LevelCache {
    pub junctions: JunctionMap,
    pub walls: FxHashMap<NodeId, WallGeometry>,
    pub degenerate: Vec<NodeId>,
}

/// Walls whose geometry a refresh replaced or dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refresh {
    pub rebuilt: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// One disagreement found by [`JunctionCache::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleEntry {
    Junctions { level: NodeId },
    Wall { level: NodeId, wall: NodeId },
}

/// Junctions and wall polygons of every level, refreshed incrementally.
#[derive(Debug, Clone, Default)]
pub struct JunctionCache {
    levels: FxHashMap<NodeId, LevelCache>,
}

impl JunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every level of `graph` from scratch.
    pub fn build(graph: &SceneGraph, tolerance: f64) -> Self {
        let levels = graph
            .levels()
            .into_iter()
            .map(|level| {
                let geometry = build_level_geometry(graph, level, tolerance);
                let cache = LevelCache {
                    junctions: geometry.junctions,
                    walls: geometry.walls.into_iter().map(|w| (w.wall, w)).collect(),
                    degenerate: geometry.degenerate,
                };
                (level, cache)
            })
            .collect();
        Self { levels }
    }

    /// Re-resolves the levels touched by `dirty` and rebuilds every wall
    /// that changed or has an endpoint on a dirty key.
    pub fn refresh(&mut self, graph: &SceneGraph, dirty: &DirtySet, tolerance: f64) -> Refresh {
        let mut rebuilt = Vec::new();
        let mut removed = Vec::new();

        for wall in &dirty.removed_walls {
            for cache in self.levels.values_mut() {
                if cache.walls.remove(wall).is_some() {
                    removed.push(*wall);
                }
            }
        }

        let mut levels: Vec<NodeId> = dirty.levels().into_iter().collect();
        levels.sort_unstable();
        for level in levels {
            if graph.node_type(level) != Some(NodeType::Level) {
                if let Some(old) = self.levels.remove(&level) {
                    removed.extend(old.walls.into_keys());
                }
                continue;
            }

            let Resolution {
                junctions,
                degenerate,
            } = resolve_level(graph, level, tolerance);
            let cache = self.levels.entry(level).or_default();

            cache.walls.retain(|wall, _| {
                let keep = graph.level_of(*wall) == Some(level);
                if !keep {
                    removed.push(*wall);
                }
                keep
            });

            for (wall, data) in graph.walls_on_level(level) {
                let stale = dirty.changed_walls.contains(&wall)
                    || dirty.touches(level, &data, tolerance)
                    || !cache.walls.contains_key(&wall);
                if !stale {
                    continue;
                }
                if degenerate.contains(&wall) {
                    if cache.walls.remove(&wall).is_some() {
                        removed.push(wall);
                    }
                    continue;
                }
                match build_wall_geometry(graph, wall, &junctions, tolerance) {
                    Ok(geometry) => {
                        cache.walls.insert(wall, geometry);
                        rebuilt.push(wall);
                    }
                    Err(err) => {
                        warn!(wall = ?wall, error = %err, "dropping wall geometry");
                        if cache.walls.remove(&wall).is_some() {
                            removed.push(wall);
                        }
                    }
                }
            }

            cache.junctions = junctions;
            cache.degenerate = degenerate;
        }

        self.levels
            .retain(|level, _| graph.node_type(*level) == Some(NodeType::Level));

        let rebuilt_set: FxHashSet<NodeId> = rebuilt.iter().copied().collect();
        removed.retain(|w| !rebuilt_set.contains(w));
        removed.sort_unstable();
        removed.dedup();
        rebuilt.sort_unstable();
        rebuilt.dedup();

        debug!(rebuilt = rebuilt.len(), removed = removed.len(), "refreshed junction cache");
        Refresh { rebuilt, removed }
    }

    pub fn level(&self, level: NodeId) -> Option<&LevelCache> {
        self.levels.get(&level)
    }

    pub fn junctions(&self, level: NodeId) -> Option<&JunctionMap> {
        self.levels.get(&level).map(|c| &c.junctions)
    }

    pub fn wall(&self, wall: NodeId) -> Option<&WallGeometry> {
        self.levels.values().find_map(|c| c.walls.get(&wall))
    }

    /// Every wall with cached geometry, in no particular order.
    pub fn walls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.levels.values().flat_map(|c| c.walls.keys().copied())
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    /// Compares the cache with a from-scratch resolution of `graph`.
    ///
    /// An empty result means the incremental path is up to date.
    pub fn verify(&self, graph: &SceneGraph, tolerance: f64) -> Vec<StaleEntry> {
        const EPSILON: f64 = 1e-9;

        let fresh = JunctionCache::build(graph, tolerance);
        let empty = LevelCache::default();
        let mut levels: Vec<NodeId> = self
            .levels
            .keys()
            .chain(fresh.levels.keys())
            .copied()
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut stale = Vec::new();
        for level in levels {
            let mine = self.levels.get(&level).unwrap_or(&empty);
            let theirs = fresh.levels.get(&level).unwrap_or(&empty);

            if !mine.junctions.approx_eq(&theirs.junctions, EPSILON) {
                stale.push(StaleEntry::Junctions { level });
            }

            let mut walls: Vec<NodeId> = mine.walls.keys().chain(theirs.walls.keys()).copied().collect();
            walls.sort_unstable();
            walls.dedup();
            for wall in walls {
                let same = match (mine.walls.get(&wall), theirs.walls.get(&wall)) {
                    (Some(a), Some(b)) => geometry_eq(a, b, EPSILON),
                    _ => false,
                };
                if !same {
                    stale.push(StaleEntry::Wall { level, wall });
                }
            }
        }
        stale
    }
}

fn geometry_eq(a: &WallGeometry, b: &WallGeometry, epsilon: f64) -> bool {
    let (pa, pb) = (&a.polygon, &b.polygon);
    a.wall == b.wall
        && a.height == b.height
        && a.openings == b.openings
        && pa.start_mitered == pb.start_mitered
        && pa.end_mitered == pb.end_mitered
        && pa.points.len() == pb.points.len()
        && pa
            .points
            .iter()
            .zip(&pb.points)
            .all(|(p, q)| (p - q).norm() <= epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_core::{Node, NodeData, NodePatch, Point2D, WallData};

    const TOL: f64 = 1e-3;

    fn wall(a: (f64, f64), b: (f64, f64)) -> Node {
        Node::new(WallData::new(
            Point2D::new(a.0, a.1),
            Point2D::new(b.0, b.1),
            0.2,
            2.5,
        ))
    }

    #[test]
    fn editing_one_wall_rebuilds_its_neighbour() {
        let mut graph = SceneGraph::new();
        let level = graph.add_node(Node::new(NodeData::level(0, 0.0)), None).unwrap();
        let a = graph.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
        let b = graph.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();
        let c = graph.add_node(wall((20.0, 0.0), (25.0, 0.0)), Some(level)).unwrap();
        graph.drain_changes();
        let mut cache = JunctionCache::build(&graph, TOL);
        assert!(cache.verify(&graph, TOL).is_empty());

        graph
            .update_node(b, &NodePatch::new().end(Point2D::new(8.0, 4.0)))
            .unwrap();
        let dirty = DirtySet::collect(&graph.drain_changes(), &graph, TOL);
        let refresh = cache.refresh(&graph, &dirty, TOL);

        assert_eq!(refresh.rebuilt, {
            let mut v = vec![a, b];
            v.sort_unstable();
            v
        });
        assert!(!refresh.rebuilt.contains(&c));
        assert!(cache.verify(&graph, TOL).is_empty());
    }

    #[test]
    fn stale_cache_is_detected() {
        let mut graph = SceneGraph::new();
        let level = graph.add_node(Node::new(NodeData::level(0, 0.0)), None).unwrap();
        graph.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
        let b = graph.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();
        let cache = JunctionCache::build(&graph, TOL);

        graph.delete_node(b).unwrap();
        let stale = cache.verify(&graph, TOL);
        assert!(stale.contains(&StaleEntry::Junctions { level }));
        assert!(stale.contains(&StaleEntry::Wall { level, wall: b }));
    }

    #[test]
    fn deleting_a_level_drops_its_walls() {
        let mut graph = SceneGraph::new();
        let level = graph.add_node(Node::new(NodeData::level(0, 0.0)), None).unwrap();
        let a = graph.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
        graph.drain_changes();
        let mut cache = JunctionCache::build(&graph, TOL);

        graph.delete_node(level).unwrap();
        let dirty = DirtySet::collect(&graph.drain_changes(), &graph, TOL);
        let refresh = cache.refresh(&graph, &dirty, TOL);
        assert_eq!(refresh.removed, vec![a]);
        assert!(cache.level(level).is_none());
        assert!(cache.wall(a).is_none());
    }
}
