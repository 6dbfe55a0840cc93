// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall outline generation.
//!
//! Each wall becomes a closed polygon in its local frame:
//! `[start.right, end.right, (end.center), end.left, start.left, (start.center)]`.
//! Ends that take part in a junction use the resolved miter corners and add
//! the junction centre, so walls fanning out of one point close around a
//! shared apex. Open ends get a square cap at `x = 0` or `x = length`.

use floorplan_core::{NodeId, NodeType, SceneGraph};
use nalgebra::{Point2, Vector2};
use tracing::debug;

use crate::error::{Error, Result};
use crate::junction::{resolve_junctions, JunctionMap, Resolution};
use crate::segment::{collect_level_segments, WallEnd, WallSegment};
use crate::transform::LocalFrame;

/// Closed outline of one wall, ready for extrusion.
#[derive(Debug, Clone, PartialEq)]
pub struct WallPolygon {
    /// Counter-clockwise, in the wall's local frame.
    pub points: Vec<Point2<f64>>,
    pub start_mitered: bool,
    pub end_mitered: bool,
    pub length: f64,
    pub thickness: f64,
    /// World position of the local origin (the wall's `start`).
    pub origin: Point2<f64>,
    /// Unit world direction of local +X.
    pub direction: Vector2<f64>,
}

impl WallPolygon {
    pub fn frame(&self) -> LocalFrame {
        LocalFrame {
            origin: self.origin,
            x_axis: self.direction,
        }
    }

    /// Outline in world coordinates.
    pub fn to_world(&self) -> Vec<Point2<f64>> {
        let frame = self.frame();
        self.points.iter().map(|p| frame.to_world(p)).collect()
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }
}

/// A door or window to subtract from an extruded wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpeningCut {
    pub opening: NodeId,
    pub kind: NodeType,
    /// Local X of the opening's leading edge.
    pub position: f64,
    pub width: f64,
    pub height: f64,
    /// Bottom of the opening above the level.
    pub elevation: f64,
}

impl OpeningCut {
    /// Local X range covered by the opening.
    pub fn span(&self) -> (f64, f64) {
        (self.position, self.position + self.width)
    }
}

/// Everything a renderer needs to build one wall solid.
#[derive(Debug, Clone, PartialEq)]
pub struct WallGeometry {
    pub wall: NodeId,
    pub polygon: WallPolygon,
    pub height: f64,
    pub openings: Vec<OpeningCut>,
}

/// Resolved geometry of every wall on a level.
#[derive(Debug, Clone, Default)]
pub struct LevelGeometry {
    pub walls: Vec<WallGeometry>,
    pub junctions: JunctionMap,
    pub degenerate: Vec<NodeId>,
}

struct EndOutline {
    left: Point2<f64>,
    right: Point2<f64>,
    center: Option<Point2<f64>>,
}

fn end_outline(
    frame: &LocalFrame,
    junctions: &JunctionMap,
    wall: NodeId,
    end: WallEnd,
    x: f64,
    half: f64,
) -> EndOutline {
    match junctions.at_end(wall, end) {
        Some((junction, corner)) => EndOutline {
            left: frame.to_local(&corner.left),
            right: frame.to_local(&corner.right),
            center: Some(frame.to_local(&junction.center)),
        },
        None => EndOutline {
            left: Point2::new(x, half),
            right: Point2::new(x, -half),
            center: None,
        },
    }
}

/// Builds the outline of `segment` from the junctions of its level.
pub fn build_wall_polygon(
    segment: &WallSegment,
    junctions: &JunctionMap,
    tolerance: f64,
) -> Result<WallPolygon> {
    let length = segment.length();
    let degenerate = || Error::DegenerateGeometry {
        wall: segment.wall,
        length,
    };
    if length < tolerance {
        return Err(degenerate());
    }
    let frame = segment.frame().ok_or_else(degenerate)?;
    let half = segment.thickness / 2.0;

    let start = end_outline(&frame, junctions, segment.wall, WallEnd::Start, 0.0, half);
    let end = end_outline(&frame, junctions, segment.wall, WallEnd::End, length, half);

    let mut points = Vec::with_capacity(6);
    points.push(start.right);
    points.push(end.right);
    points.extend(end.center);
    points.push(end.left);
    points.push(start.left);
    points.extend(start.center);

    Ok(WallPolygon {
        points,
        start_mitered: start.center.is_some(),
        end_mitered: end.center.is_some(),
        length,
        thickness: segment.thickness,
        origin: frame.origin,
        direction: frame.x_axis,
    })
}

/// Builds the full geometry of wall `wall`, openings included.
pub fn build_wall_geometry(
    graph: &SceneGraph,
    wall: NodeId,
    junctions: &JunctionMap,
    tolerance: f64,
) -> Result<WallGeometry> {
    let node = graph
        .get_node(wall)
        .ok_or(floorplan_core::Error::NotFound(wall))?;
    let data = node.as_wall().ok_or(Error::NotAWall(wall))?;
    let polygon = build_wall_polygon(&WallSegment::new(wall, data), junctions, tolerance)?;

    let openings = node
        .children()
        .iter()
        .filter_map(|child| {
            let opening = graph.get_node(*child)?;
            let o = opening.as_opening()?;
            Some(OpeningCut {
                opening: *child,
                kind: opening.node_type(),
                position: o.position,
                width: o.width,
                height: o.height,
                elevation: o.elevation,
            })
        })
        .collect();

    Ok(WallGeometry {
        wall,
        polygon,
        height: data.height,
        openings,
    })
}

/// Resolves the junctions of `level`.
pub fn resolve_level(graph: &SceneGraph, level: NodeId, tolerance: f64) -> Resolution {
    resolve_junctions(&collect_level_segments(graph, level), tolerance)
}

/// Resolves junctions and builds every non-degenerate wall of `level`.
pub fn build_level_geometry(graph: &SceneGraph, level: NodeId, tolerance: f64) -> LevelGeometry {
    let Resolution {
        junctions,
        degenerate,
    } = resolve_level(graph, level, tolerance);

    let walls: Vec<WallGeometry> = graph
        .walls_on_level(level)
        .iter()
        .filter(|(id, _)| !degenerate.contains(id))
        .filter_map(|(id, _)| build_wall_geometry(graph, *id, &junctions, tolerance).ok())
        .collect();

    debug!(
        level = ?level,
        walls = walls.len(),
        junctions = junctions.len(),
        degenerate = degenerate.len(),
        "built level geometry"
    );
    LevelGeometry {
        walls,
        junctions,
        degenerate,
    }
}
