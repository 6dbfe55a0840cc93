// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall segment editing: removing a span of cells from a wall.
//!
//! Removing the inclusive cell range `[range_start, range_end]` leaves up to
//! two pieces. With `d` the unit direction from `start` to `end`:
//!
//! - the *before* piece exists iff `range_start > 0` and spans
//!   `[start, start + d * range_start]`;
//! - the *after* piece exists iff `range_end < length - 1` and spans
//!   `[start + d * (range_end + 1), end]`.
//!
//! Openings are partitioned by their position along the wall: those before
//! the range stay where they are, those after it move to the after piece with
//! their position shifted by `-(range_end + 1)`, and those inside it are
//! deleted.

use nalgebra::Vector2;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::SceneGraph;
use crate::keys::{NodeId, NodeType};
use crate::node::{Node, NodeData, OpeningData, WallData};
use crate::types::{CellRange, Point2D};

/// Slack for comparing a range end against a wall length that carries
/// rounding error (diagonal walls).
const LENGTH_EPSILON: f64 = 1e-9;

/// One remaining piece of a split wall.
#[derive(Debug, Clone, PartialEq)]
pub struct WallPiece {
    pub start: Point2D,
    pub end: Point2D,
    /// Openings carried by this piece with their new positions.
    pub openings: Vec<(NodeId, f64)>,
}

/// The edit [`SceneGraph::split_wall`] will perform, computed without
/// touching the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPlan {
    pub wall: NodeId,
    pub before: Option<WallPiece>,
    pub after: Option<WallPiece>,
    /// Openings inside the removed range, or without a piece to land on.
    pub dropped: Vec<NodeId>,
}

/// What happened to the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    /// Nothing remained; the wall and its children were deleted.
    Deleted,
    /// One piece remained and the original wall now holds it.
    Trimmed(NodeId),
    /// The original wall holds the before piece; `second` is a new sibling
    /// holding the after piece.
    Split { first: NodeId, second: NodeId },
}

/// Computes how removing `range` would split `wall`.
pub fn plan_split(graph: &SceneGraph, wall: NodeId, range: CellRange) -> Result<SplitPlan> {
    let node = graph.get_node(wall).ok_or(Error::NotFound(wall))?;
    let data = node.as_wall().ok_or(Error::WrongKind {
        node: wall,
        expected: NodeType::Wall,
    })?;

    let length = data.length();
    let d = data.direction().unwrap_or_else(Vector2::zeros);
    // A range starting past the end leaves the wall whole.
    let cut_start = (range.start as f64).min(length);
    let resume = range.end as f64 + 1.0;

    let mut before = (range.start > 0).then(|| WallPiece {
        start: data.start,
        end: data.start.offset(d * cut_start),
        openings: Vec::new(),
    });
    let mut after = (resume < length - LENGTH_EPSILON).then(|| WallPiece {
        start: data.start.offset(d * resume),
        end: data.end,
        openings: Vec::new(),
    });

    let mut dropped = Vec::new();
    for &child in node.children() {
        let Some(opening) = graph.get_node(child).and_then(Node::as_opening) else {
            continue;
        };
        let position = opening.position;
        let target = if position < cut_start {
            before.as_mut().map(|piece| (piece, position))
        } else if position > range.end as f64 {
            after.as_mut().map(|piece| (piece, position - resume))
        } else {
            None
        };
        match target {
            Some((piece, new_position)) => piece.openings.push((child, new_position)),
            None => dropped.push(child),
        }
    }

    Ok(SplitPlan {
        wall,
        before,
        after,
        dropped,
    })
}

impl SceneGraph {
    /// Removes the inclusive cell range `[range_start, range_end]` from a wall.
    ///
    /// Zero remaining pieces delete the wall with its children; one piece
    /// updates the wall in place; two pieces update the wall to the first and
    /// add a sibling wall, placed right after it, for the second.
    pub fn split_wall(
        &mut self,
        wall: NodeId,
        range_start: u32,
        range_end: u32,
    ) -> Result<SplitOutcome> {
        let range = CellRange::new(range_start, range_end)?;
        let plan = plan_split(self, wall, range)?;
        self.apply_split(plan)
    }

    /// Applies a plan produced by [`plan_split`] against this graph.
    pub fn apply_split(&mut self, plan: SplitPlan) -> Result<SplitOutcome> {
        let original = self.get_node(plan.wall).ok_or(Error::NotFound(plan.wall))?;
        let template = *original.as_wall().ok_or(Error::WrongKind {
            node: plan.wall,
            expected: NodeType::Wall,
        })?;
        let (visible, opacity) = (original.visible, original.opacity);

        for child in &plan.dropped {
            self.delete_node(*child)?;
        }

        let outcome = match (plan.before, plan.after) {
            (None, None) => {
                self.delete_node(plan.wall)?;
                SplitOutcome::Deleted
            }
            (Some(piece), None) | (None, Some(piece)) => {
                self.reshape(plan.wall, &template, &piece)?;
                SplitOutcome::Trimmed(plan.wall)
            }
            (Some(first), Some(second)) => {
                self.reshape(plan.wall, &template, &first)?;

                let parent = self.parent(plan.wall);
                let siblings = match parent {
                    Some(p) => self.children(p).unwrap_or_default(),
                    None => self.roots(),
                };
                let index = siblings
                    .iter()
                    .position(|s| *s == plan.wall)
                    .map_or(siblings.len(), |i| i + 1);

                let mut node = Node::new(WallData {
                    start: second.start,
                    end: second.end,
                    ..template
                });
                node.visible = visible;
                node.opacity = opacity;
                let new_wall = self.add_node_at(node, parent, index)?;

                for (opening, position) in &second.openings {
                    self.move_node(*opening, Some(new_wall))?;
                    self.set_opening_position(*opening, *position)?;
                }
                SplitOutcome::Split {
                    first: plan.wall,
                    second: new_wall,
                }
            }
        };

        debug!(wall = ?plan.wall, outcome = ?outcome, "split wall");
        Ok(outcome)
    }

    fn reshape(&mut self, wall: NodeId, template: &WallData, piece: &WallPiece) -> Result<()> {
        self.set_data(
            wall,
            NodeData::Wall(WallData {
                start: piece.start,
                end: piece.end,
                ..*template
            }),
        )?;
        for (opening, position) in &piece.openings {
            self.set_opening_position(*opening, *position)?;
        }
        Ok(())
    }

    fn set_opening_position(&mut self, opening: NodeId, position: f64) -> Result<()> {
        let node = self.get_node(opening).ok_or(Error::NotFound(opening))?;
        let data = match &node.data {
            NodeData::Door(o) => NodeData::Door(OpeningData { position, ..*o }),
            NodeData::Window(o) => NodeData::Window(OpeningData { position, ..*o }),
            _ => {
                return Err(Error::WrongKind {
                    node: opening,
                    expected: NodeType::Door,
                })
            }
        };
        self.set_data(opening, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn level_with_wall(x1: f64) -> (SceneGraph, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let level = graph.add_node(Node::new(NodeData::level(0, 0.0)), None).unwrap();
        let wall = graph
            .add_node(
                Node::new(WallData::new(
                    Point2D::new(0.0, 0.0),
                    Point2D::new(x1, 0.0),
                    0.2,
                    2.5,
                )),
                Some(level),
            )
            .unwrap();
        (graph, level, wall)
    }

    fn wall_of(graph: &SceneGraph, id: NodeId) -> WallData {
        *graph.get_node(id).unwrap().as_wall().unwrap()
    }

    fn position_of(graph: &SceneGraph, id: NodeId) -> f64 {
        graph.get_node(id).unwrap().as_opening().unwrap().position
    }

    #[test]
    fn middle_range_splits_in_two() {
        let (mut graph, level, wall) = level_with_wall(10.0);
        let door = graph
            .add_node(Node::new(NodeData::door(8.0, 0.9)), Some(wall))
            .unwrap();

        let outcome = graph.split_wall(wall, 3, 5).unwrap();
        let SplitOutcome::Split { first, second } = outcome else {
            panic!("expected two pieces, got {outcome:?}");
        };
        assert_eq!(first, wall);

        let a = wall_of(&graph, first);
        assert_eq!(a.start, Point2D::new(0.0, 0.0));
        assert_eq!(a.end, Point2D::new(3.0, 0.0));
        assert!(graph.children(first).unwrap().is_empty());

        let b = wall_of(&graph, second);
        assert_eq!(b.start, Point2D::new(6.0, 0.0));
        assert_eq!(b.end, Point2D::new(10.0, 0.0));
        assert_eq!(graph.children(second).unwrap(), &[door]);
        assert_relative_eq!(position_of(&graph, door), 2.0);

        assert_eq!(graph.children(level).unwrap(), &[first, second]);
        graph.validate().unwrap();
    }

    #[test]
    fn whole_range_deletes_wall_and_children() {
        let (mut graph, level, wall) = level_with_wall(10.0);
        let window = graph
            .add_node(Node::new(NodeData::window(4.0, 1.0)), Some(wall))
            .unwrap();

        assert_eq!(graph.split_wall(wall, 0, 9).unwrap(), SplitOutcome::Deleted);
        assert!(!graph.contains(wall));
        assert!(!graph.contains(window));
        assert!(graph.children(level).unwrap().is_empty());
    }

    #[test]
    fn leading_range_trims_start_and_shifts_openings() {
        let (mut graph, _, wall) = level_with_wall(10.0);
        let early = graph
            .add_node(Node::new(NodeData::door(1.0, 0.9)), Some(wall))
            .unwrap();
        let late = graph
            .add_node(Node::new(NodeData::door(7.0, 0.9)), Some(wall))
            .unwrap();

        assert_eq!(graph.split_wall(wall, 0, 2).unwrap(), SplitOutcome::Trimmed(wall));
        let w = wall_of(&graph, wall);
        assert_eq!(w.start, Point2D::new(3.0, 0.0));
        assert_eq!(w.end, Point2D::new(10.0, 0.0));
        assert!(!graph.contains(early));
        assert_relative_eq!(position_of(&graph, late), 4.0);
    }

    #[test]
    fn trailing_range_trims_end() {
        let (mut graph, _, wall) = level_with_wall(10.0);
        let door = graph
            .add_node(Node::new(NodeData::door(2.0, 0.9)), Some(wall))
            .unwrap();

        assert_eq!(graph.split_wall(wall, 6, 9).unwrap(), SplitOutcome::Trimmed(wall));
        let w = wall_of(&graph, wall);
        assert_eq!(w.end, Point2D::new(6.0, 0.0));
        assert_relative_eq!(position_of(&graph, door), 2.0);
    }

    #[test]
    fn split_keeps_rotation_consistent() {
        let mut graph = SceneGraph::new();
        let wall = graph
            .add_node(
                Node::new(WallData::new(
                    Point2D::new(0.0, 0.0),
                    Point2D::new(0.0, 8.0),
                    0.2,
                    2.5,
                )),
                None,
            )
            .unwrap();
        let SplitOutcome::Split { first, second } = graph.split_wall(wall, 2, 3).unwrap() else {
            panic!("expected two pieces");
        };
        for id in [first, second] {
            let w = wall_of(&graph, id);
            let expected = (-(w.end.y - w.start.y)).atan2(w.end.x - w.start.x);
            assert_relative_eq!(w.rotation(), expected);
        }
        assert_eq!(graph.roots(), &[first, second]);
    }

    #[test]
    fn rejects_reversed_range_and_non_walls() {
        let (mut graph, level, wall) = level_with_wall(10.0);
        assert!(matches!(
            graph.split_wall(wall, 5, 3),
            Err(Error::InvalidRange { .. })
        ));
        assert!(matches!(
            graph.split_wall(level, 0, 1),
            Err(Error::WrongKind { .. })
        ));
    }

    #[test]
    fn plan_is_pure() {
        let (graph, _, wall) = level_with_wall(10.0);
        let revision = graph.revision();
        let plan = plan_split(&graph, wall, CellRange::new(3, 5).unwrap()).unwrap();
        assert!(plan.before.is_some());
        assert!(plan.after.is_some());
        assert_eq!(graph.revision(), revision);
    }
}
