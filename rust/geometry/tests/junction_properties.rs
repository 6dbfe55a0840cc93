// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property tests for the junction resolver over random wall networks on a
//! 3x3 point grid (walls join 8-neighbours, so no two walls leave a point in
//! the same direction).

use floorplan_core::{Node, NodeData, NodeId, SceneGraph};
use floorplan_geometry::{build_wall_polygon, resolve_junctions, Point2, WallSegment};
use proptest::prelude::*;
use rustc_hash::FxHashMap;

type Edge = (usize, (i32, i32), (i32, i32), f64);

fn grid_edges() -> Vec<((i32, i32), (i32, i32))> {
    let mut edges = Vec::new();
    for x in 0..3 {
        for y in 0..3 {
            for (dx, dy) in [(1, 0), (0, 1), (1, 1), (1, -1)] {
                let (nx, ny) = (x + dx, y + dy);
                if (0..3).contains(&nx) && (0..3).contains(&ny) {
                    edges.push(((x, y), (nx, ny)));
                }
            }
        }
    }
    edges
}

fn ids(n: usize) -> Vec<NodeId> {
    let mut graph = SceneGraph::new();
    (0..n)
        .map(|_| graph.add_node(Node::new(NodeData::group("wall")), None).unwrap())
        .collect()
}

/// A random subset of grid edges with random orientation and thickness.
fn network(uniform: bool) -> impl Strategy<Value = Vec<Edge>> {
    let edges = grid_edges();
    let n = edges.len();
    (
        proptest::sample::subsequence(edges, 1..=n),
        prop::collection::vec((any::<bool>(), 1u8..6), n),
    )
        .prop_map(move |(chosen, attrs)| {
            chosen
                .into_iter()
                .zip(attrs)
                .enumerate()
                .map(|(i, ((a, b), (flip, t)))| {
                    let (a, b) = if flip { (b, a) } else { (a, b) };
                    let thickness = if uniform { 0.2 } else { f64::from(t) * 0.05 };
                    (i, a, b, thickness)
                })
                .collect()
        })
}

fn segments(edges: &[Edge], ids: &[NodeId]) -> Vec<WallSegment> {
    edges
        .iter()
        .map(|&(i, a, b, thickness)| WallSegment {
            wall: ids[i],
            start: Point2::new(f64::from(a.0), f64::from(a.1)),
            end: Point2::new(f64::from(b.0), f64::from(b.1)),
            thickness,
        })
        .collect()
}

proptest! {
    #[test]
    fn resolution_ignores_insertion_order(
        (edges, shuffled) in network(false)
            .prop_flat_map(|edges| (Just(edges.clone()), Just(edges).prop_shuffle()))
    ) {
        let ids = ids(grid_edges().len());
        let forward = resolve_junctions(&segments(&edges, &ids), 1e-3).junctions;
        let permuted = resolve_junctions(&segments(&shuffled, &ids), 1e-3).junctions;
        prop_assert!(forward.approx_eq(&permuted, 1e-9));
    }

    #[test]
    fn junctions_are_points_with_two_or_more_ends(edges in network(false)) {
        let ids = ids(grid_edges().len());
        let resolution = resolve_junctions(&segments(&edges, &ids), 1e-3);

        let mut degree: FxHashMap<(i32, i32), usize> = FxHashMap::default();
        for (_, a, b, _) in &edges {
            *degree.entry(*a).or_default() += 1;
            *degree.entry(*b).or_default() += 1;
        }
        let expected = degree.values().filter(|d| **d >= 2).count();
        prop_assert_eq!(resolution.junctions.len(), expected);
        prop_assert!(resolution.degenerate.is_empty());
    }

    #[test]
    fn neighbours_share_corners(edges in network(true)) {
        let ids = ids(grid_edges().len());
        let resolution = resolve_junctions(&segments(&edges, &ids), 1e-3);

        for junction in resolution.junctions.iter() {
            for (i, end) in junction.ends.iter().enumerate() {
                for corner in [end.corner.left, end.corner.right] {
                    let shared = junction.ends.iter().enumerate().any(|(j, other)| {
                        j != i
                            && ((other.corner.left - corner).norm() < 1e-9
                                || (other.corner.right - corner).norm() < 1e-9)
                    });
                    prop_assert!(shared, "corner {:?} of {:?} is not shared", corner, end.wall);
                }
            }
        }
    }

    #[test]
    fn every_wall_gets_a_closed_outline(edges in network(false)) {
        let ids = ids(grid_edges().len());
        let segments = segments(&edges, &ids);
        let resolution = resolve_junctions(&segments, 1e-3);

        for segment in &segments {
            let polygon = build_wall_polygon(segment, &resolution.junctions, 1e-3).unwrap();
            let expected = 4 + usize::from(polygon.start_mitered) + usize::from(polygon.end_mitered);
            prop_assert_eq!(polygon.points.len(), expected);
            prop_assert!(polygon.area() > 0.0);
        }
    }
}
