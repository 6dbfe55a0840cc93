// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Grid footprints: which spatial index cells a node occupies.

use nalgebra::{Rotation2, Vector2};

use crate::graph::SceneGraph;
use crate::keys::NodeId;
use crate::node::{ItemData, NodeData};
use crate::types::{GridCell, GridRect, Point2D};

/// Fraction of a cell used to keep segment endpoints that sit exactly on a
/// cell boundary out of the neighbouring cell.
const BOUNDARY_NUDGE: f64 = 1e-9;

/// Cells occupied by `id`, sorted and deduplicated. Empty for unknown ids and
/// for nodes without a footprint (containers, reference images).
pub fn footprint(graph: &SceneGraph, id: NodeId, cell_size: f64) -> Vec<GridCell> {
    let Some(node) = graph.get_node(id) else {
        return Vec::new();
    };
    let mut cells = match &node.data {
        NodeData::Wall(wall) => segment_cells(wall.start, wall.end, cell_size),
        NodeData::Door(opening) | NodeData::Window(opening) => {
            let host = node
                .parent()
                .and_then(|p| graph.get_node(p))
                .and_then(|p| p.as_wall());
            match host {
                Some(wall) => segment_cells(
                    wall.point_at(opening.position),
                    wall.point_at(opening.position + opening.width),
                    cell_size,
                ),
                None => Vec::new(),
            }
        }
        NodeData::Slab(surface) | NodeData::Ceiling(surface) | NodeData::Roof(surface) => {
            polygon_cells(&surface.polygon, cell_size)
        }
        NodeData::Zone(zone) => polygon_cells(&zone.polygon, cell_size),
        NodeData::Item(item) => item_cells(item, cell_size),
        NodeData::Site { .. }
        | NodeData::Building { .. }
        | NodeData::Level(_)
        | NodeData::Group { .. }
        | NodeData::Image(_)
        | NodeData::Scan(_) => Vec::new(),
    };
    cells.sort_unstable();
    cells.dedup();
    cells
}

/// Supercover traversal of the segment `a -> b`: every cell the segment
/// passes through, including both neighbours when it crosses a cell corner.
///
/// Endpoints lying exactly on a cell boundary do not claim the cell beyond
/// it, so a wall from `(0, 0)` to `(10, 0)` covers cells `0..=9`.
pub fn segment_cells(a: Point2D, b: Point2D, cell_size: f64) -> Vec<GridCell> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length <= f64::EPSILON {
        return vec![GridCell::containing(&a, cell_size)];
    }

    let nudge = Vector2::new(dx, dy) / length * (BOUNDARY_NUDGE * cell_size);
    let start = GridCell::containing(&a.offset(nudge), cell_size);
    let end = GridCell::containing(&b.offset(-nudge), cell_size);

    let step_x = dx.signum() as i32 * i32::from(dx != 0.0);
    let step_y = dy.signum() as i32 * i32::from(dy != 0.0);
    let t_delta_x = if dx != 0.0 { cell_size / dx.abs() } else { f64::INFINITY };
    let t_delta_y = if dy != 0.0 { cell_size / dy.abs() } else { f64::INFINITY };
    let mut t_max_x = boundary_distance(a.x, dx, start.x, cell_size);
    let mut t_max_y = boundary_distance(a.y, dy, start.y, cell_size);

    let mut cells = vec![start];
    let mut cell = start;
    let budget = (end.x - start.x).unsigned_abs() + (end.y - start.y).unsigned_abs();
    let mut steps = 0;
    while cell != end && steps < budget {
        if t_max_x < t_max_y {
            cell.x += step_x;
            t_max_x += t_delta_x;
            steps += 1;
        } else if t_max_y < t_max_x {
            cell.y += step_y;
            t_max_y += t_delta_y;
            steps += 1;
        } else {
            // Exactly through a corner: claim both side cells.
            cells.push(GridCell::new(cell.x + step_x, cell.y));
            cells.push(GridCell::new(cell.x, cell.y + step_y));
            cell.x += step_x;
            cell.y += step_y;
            t_max_x += t_delta_x;
            t_max_y += t_delta_y;
            steps += 2;
        }
        cells.push(cell);
    }
    cells
}

/// Parametric distance along the segment to the first boundary of `cell` in
/// the direction of travel.
fn boundary_distance(origin: f64, delta: f64, cell: i32, cell_size: f64) -> f64 {
    if delta > 0.0 {
        ((cell + 1) as f64 * cell_size - origin) / delta
    } else if delta < 0.0 {
        (cell as f64 * cell_size - origin) / delta
    } else {
        f64::INFINITY
    }
}

/// Boundary cells of a closed polygon plus every cell whose centre is inside.
pub fn polygon_cells(polygon: &[Point2D], cell_size: f64) -> Vec<GridCell> {
    let mut cells = Vec::new();
    if polygon.is_empty() {
        return cells;
    }
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        cells.extend(segment_cells(*a, b, cell_size));
    }
    if polygon.len() < 3 {
        return cells;
    }

    let (min, max) = bounds(polygon);
    let rect = GridRect::from_corners(
        GridCell::containing(&min, cell_size),
        GridCell::containing(&max, cell_size),
    );
    cells.extend(
        rect.cells()
            .filter(|cell| point_in_polygon(&cell.center(cell_size), polygon)),
    );
    cells
}

fn item_cells(item: &ItemData, cell_size: f64) -> Vec<GridCell> {
    let half = Vector2::new(item.size[0] / 2.0, item.size[1] / 2.0);
    let rotation = Rotation2::new(item.rotation);
    let corners: Vec<Point2D> = [
        Vector2::new(-half.x, -half.y),
        Vector2::new(half.x, -half.y),
        Vector2::new(half.x, half.y),
        Vector2::new(-half.x, half.y),
    ]
    .iter()
    .map(|v| item.position.offset(rotation * *v))
    .collect();

    let (min, max) = bounds(&corners);
    let inset = Vector2::new(BOUNDARY_NUDGE * cell_size, BOUNDARY_NUDGE * cell_size);
    GridRect::from_corners(
        GridCell::containing(&min, cell_size),
        GridCell::containing(&max.offset(-inset), cell_size),
    )
    .cells()
    .collect()
}

fn bounds(points: &[Point2D]) -> (Point2D, Point2D) {
    let mut min = Point2D::new(f64::MAX, f64::MAX);
    let mut max = Point2D::new(f64::MIN, f64::MIN);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Even-odd ray casting test.
pub fn point_in_polygon(p: &Point2D, polygon: &[Point2D]) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
