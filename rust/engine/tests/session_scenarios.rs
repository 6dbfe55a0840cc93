// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end editing scenarios driven through the session.

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use floorplan_core::{
    CellRange, Node, NodeData, NodeId, NodePatch, Point2D, SpatialIndex, SplitOutcome, WallData,
};
use floorplan_engine::{EditorConfig, EditorSession};
use floorplan_geometry::{JunctionKey, Point2};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn wall(a: (f64, f64), b: (f64, f64)) -> Node {
    Node::new(WallData::new(
        Point2D::new(a.0, a.1),
        Point2D::new(b.0, b.1),
        0.2,
        2.5,
    ))
}

fn session_with_level() -> (EditorSession, NodeId) {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let (level, _) = session
        .add_node(Node::new(NodeData::level(0, 0.0)), None)
        .unwrap();
    (session, level)
}

fn assert_in_sync(session: &EditorSession) {
    let rebuilt = SpatialIndex::rebuild(session.graph(), session.config().cell_size);
    assert!(session.index() == &rebuilt, "spatial index drifted");
    assert!(session.verify_geometry().is_empty(), "junction cache drifted");
    assert!(session.check_index().is_ok());
}

#[test]
fn l_joint_shares_one_corner_pair() {
    let (mut session, level) = session_with_level();
    let (a, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    let (b, _) = session.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();

    let junctions = session.junctions(level).unwrap();
    assert_eq!(junctions.len(), 1);
    let key = JunctionKey::snap(&Point2::new(5.0, 0.0), 1e-3);
    let ca = junctions.corner(&key, a).unwrap();
    let cb = junctions.corner(&key, b).unwrap();

    assert_relative_eq!(ca.left.x, 4.9, epsilon = 1e-9);
    assert_relative_eq!(ca.left.y, 0.1, epsilon = 1e-9);
    assert_relative_eq!(ca.right.x, 5.1, epsilon = 1e-9);
    assert_relative_eq!(ca.right.y, -0.1, epsilon = 1e-9);
    assert_relative_eq!((ca.left - cb.left).norm(), 0.0, epsilon = 1e-9);
    assert_relative_eq!((ca.right - cb.right).norm(), 0.0, epsilon = 1e-9);

    let ga = session.wall_geometry(a).unwrap();
    assert!(!ga.polygon.start_mitered);
    assert!(ga.polygon.end_mitered);
    assert_in_sync(&session);
}

#[test]
fn three_way_fan_includes_the_centre_in_every_wall() {
    let (mut session, level) = session_with_level();
    let mut walls = Vec::new();
    for end in [(5.0, 0.0), (0.0, 5.0), (-5.0, 0.0)] {
        let (id, _) = session.add_node(wall((0.0, 0.0), end), Some(level)).unwrap();
        walls.push(id);
    }

    let junctions = session.junctions(level).unwrap();
    assert_eq!(junctions.len(), 1);
    let junction = junctions.iter().next().unwrap();
    assert_eq!(junction.ends.len(), 3);
    assert_relative_eq!(junction.center.coords.norm(), 0.0, epsilon = 1e-12);

    for id in walls {
        let polygon = &session.wall_geometry(id).unwrap().polygon;
        assert!(polygon.start_mitered);
        assert_eq!(polygon.points.len(), 5);
        // The junction centre is the wall's local origin.
        assert!(polygon.points.iter().any(|p| p.coords.norm() < 1e-9));
    }
}

#[test]
fn dragging_an_endpoint_re_mitres_the_neighbour() {
    let (mut session, level) = session_with_level();
    let (a, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    let (b, _) = session.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();
    let (far, _) = session.add_node(wall((10.0, 10.0), (12.0, 10.0)), Some(level)).unwrap();

    let report = session
        .update_node(b, &NodePatch::new().start(Point2D::new(6.0, 0.0)))
        .unwrap();
    let mut expected = vec![a, b];
    expected.sort_unstable();
    assert_eq!(report.rebuilt_walls, expected);
    assert!(!report.rebuilt_walls.contains(&far));
    assert!(!session.wall_geometry(a).unwrap().polygon.end_mitered);
    assert!(session.junctions(level).unwrap().is_empty());
    assert_in_sync(&session);
}

#[test]
fn split_moves_openings_onto_the_remaining_piece() {
    let (mut session, level) = session_with_level();
    let (w, _) = session.add_node(wall((0.0, 0.0), (10.0, 0.0)), Some(level)).unwrap();
    let (door, _) = session
        .add_node(Node::new(NodeData::door(8.0, 0.9)), Some(w))
        .unwrap();

    let (outcome, report) = session.split_wall(w, 3, 5).unwrap();
    let SplitOutcome::Split { first, second } = outcome else {
        panic!("expected two pieces, got {outcome:?}");
    };
    assert_eq!(first, w);

    let before = session.get_node(first).unwrap().as_wall().unwrap();
    assert_eq!((before.start, before.end), (Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0)));
    assert!(session.children(first).unwrap().is_empty());

    let after = session.get_node(second).unwrap().as_wall().unwrap();
    assert_eq!((after.start, after.end), (Point2D::new(6.0, 0.0), Point2D::new(10.0, 0.0)));
    assert_eq!(session.children(second).unwrap(), &[door]);
    let opening = session.get_node(door).unwrap().as_opening().unwrap();
    assert_relative_eq!(opening.position, 2.0);

    // The sibling sits right after the original wall.
    assert_eq!(session.children(level).unwrap(), &[first, second]);
    assert!(report.rebuilt_walls.contains(&first));
    assert!(report.rebuilt_walls.contains(&second));

    assert!(session.query_point(level, Point2D::new(4.5, 0.0)).is_empty());
    let mut hits = session.query_point(level, Point2D::new(8.5, 0.0));
    hits.sort_unstable();
    let mut expected = vec![second, door];
    expected.sort_unstable();
    assert_eq!(hits, expected);
    assert_eq!(session.wall_geometry(second).unwrap().openings.len(), 1);
    assert_in_sync(&session);
}

#[test]
fn splitting_the_whole_wall_deletes_it_with_its_children() {
    let (mut session, level) = session_with_level();
    let (w, _) = session.add_node(wall((0.0, 0.0), (10.0, 0.0)), Some(level)).unwrap();
    let (door, _) = session
        .add_node(Node::new(NodeData::door(2.0, 0.9)), Some(w))
        .unwrap();

    let (outcome, report) = session.split_wall(w, 0, 9).unwrap();
    assert_eq!(outcome, SplitOutcome::Deleted);
    assert_eq!(report.removed_walls, vec![w]);
    assert!(session.get_node(w).is_none());
    assert!(session.get_node(door).is_none());
    assert!(session
        .query_region(level, Point2D::new(-1.0, -1.0), Point2D::new(11.0, 1.0))
        .is_empty());
    assert_in_sync(&session);
}

#[test]
fn preview_can_be_cancelled_or_kept() {
    let (mut session, level) = session_with_level();

    let (draft, _) = session
        .begin_preview(wall((0.0, 0.0), (0.0, 0.0)), Some(level))
        .unwrap();
    assert!(session.overlay().is_preview(draft));
    // Zero-length while the pointer has not moved yet.
    assert!(session.wall_geometry(draft).is_none());

    session
        .update_node(draft, &NodePatch::new().end(Point2D::new(4.0, 0.0)))
        .unwrap();
    assert!(session.wall_geometry(draft).is_some());

    let report = session.cancel_preview(draft).unwrap().unwrap();
    assert_eq!(report.removed_walls, vec![draft]);
    assert!(session.get_node(draft).is_none());
    assert!(session.overlay().is_empty());

    let (kept, _) = session
        .begin_preview(wall((0.0, 0.0), (4.0, 0.0)), Some(level))
        .unwrap();
    session.commit_preview(kept).unwrap();
    assert!(session.cancel_preview(kept).unwrap().is_none());
    assert!(session.get_node(kept).is_some());
    assert_in_sync(&session);
}

#[test]
fn delete_range_tool_splits_on_commit() {
    let (mut session, level) = session_with_level();
    let (w, _) = session.add_node(wall((0.0, 0.0), (10.0, 0.0)), Some(level)).unwrap();

    assert!(session.commit_delete_range(w).unwrap().is_none());

    session
        .set_delete_range(w, Some(CellRange::new(7, 9).unwrap()))
        .unwrap();
    session
        .set_paint_range(w, Some(CellRange::new(0, 1).unwrap()))
        .unwrap();
    let (outcome, _) = session.commit_delete_range(w).unwrap().unwrap();
    assert_eq!(outcome, SplitOutcome::Trimmed(w));
    assert_eq!(session.overlay().get(w).delete_range, None);
    assert!(session.overlay().get(w).paint_range.is_some());

    let data = session.get_node(w).unwrap().as_wall().unwrap();
    assert_eq!(data.end, Point2D::new(7.0, 0.0));
    assert_in_sync(&session);
}

#[test]
fn deleting_a_node_prunes_its_overlay() {
    let (mut session, level) = session_with_level();
    let (w, _) = session.add_node(wall((0.0, 0.0), (3.0, 0.0)), Some(level)).unwrap();
    session.set_placement_valid(w, Some(false)).unwrap();
    assert_eq!(session.overlay().len(), 1);

    session.delete_node(level).unwrap();
    assert!(session.overlay().is_empty());
    assert!(session.index().node_count() == 0);
    assert!(session.junctions(level).is_none());
}

#[test]
fn json_round_trip_keeps_ids_and_geometry() {
    let (mut session, level) = session_with_level();
    let (a, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    session.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();
    session
        .add_node(Node::new(NodeData::window(1.0, 1.2)), Some(a))
        .unwrap();
    let (draft, _) = session
        .begin_preview(wall((9.0, 9.0), (9.0, 12.0)), Some(level))
        .unwrap();

    let json = session.to_json().unwrap();
    let loaded = EditorSession::from_json(&json, *session.config()).unwrap();

    assert_eq!(loaded.graph().len(), session.graph().len());
    assert_eq!(loaded.wall_geometry(a), session.wall_geometry(a));
    assert!(loaded.index() == session.index());
    // Overlay state is not persisted.
    assert!(loaded.get_node(draft).is_some());
    assert!(!loaded.overlay().is_preview(draft));
    assert_in_sync(&loaded);
}

#[test]
fn config_json_fills_in_defaults() {
    let config = EditorSession::config_from_json(r#"{"cell_size": 0.5}"#).unwrap();
    assert_eq!(config.cell_size, 0.5);
    assert_eq!(config.snap_tolerance, EditorConfig::default().snap_tolerance);

    let err = EditorSession::config_from_json("{").unwrap_err();
    assert!(matches!(err, floorplan_engine::Error::Json(_)));
}

#[test]
fn restore_rolls_back_every_derived_structure() {
    let (mut session, level) = session_with_level();
    let (a, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    let (b, _) = session.add_node(wall((5.0, 0.0), (5.0, 5.0)), Some(level)).unwrap();
    let snapshot = session.snapshot();
    let geometry = session.wall_geometry(a).cloned();

    session.delete_node(b).unwrap();
    assert!(!session.wall_geometry(a).unwrap().polygon.end_mitered);

    let report = session.restore(snapshot);
    assert_eq!(report.rebuilt_walls.len(), 2);
    assert!(report.removed_walls.is_empty());
    assert!(session.get_node(b).is_some());
    assert_eq!(session.wall_geometry(a).cloned(), geometry);
    assert_in_sync(&session);
}

#[test]
fn history_sink_sees_every_effective_mutation() {
    let (mut session, level) = session_with_level();
    let log: Rc<RefCell<Vec<(u64, usize)>>> = Rc::default();
    let sink = Rc::clone(&log);
    session.set_history(move |revision: u64, snapshot: floorplan_core::SceneGraph| {
        sink.borrow_mut().push((revision, snapshot.len()));
    });

    let (w, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    // Setting a value it already has records nothing.
    session
        .update_node(w, &NodePatch::new().end(Point2D::new(5.0, 0.0)))
        .unwrap();
    session.delete_node(w).unwrap();

    let log = log.borrow();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].1, 2);
    assert_eq!(log[1].1, 1);
    assert!(log[0].0 < log[1].0);
}

#[test]
fn missing_nodes_are_reported() {
    let (mut session, level) = session_with_level();
    let (w, _) = session.add_node(wall((0.0, 0.0), (5.0, 0.0)), Some(level)).unwrap();
    session.delete_node(w).unwrap();

    let err = session.delete_node(w).unwrap_err();
    assert!(matches!(
        err,
        floorplan_engine::Error::Core(floorplan_core::Error::NotFound(id)) if id == w
    ));
    assert!(session.split_wall(w, 0, 1).is_err());
    assert!(session.set_placement_valid(w, Some(true)).is_err());
}
