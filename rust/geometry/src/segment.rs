// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall segments: the part of a wall node the junction resolver needs.

use floorplan_core::{NodeId, SceneGraph, WallData};
use nalgebra::{Point2, Vector2};

use crate::error::{Error, Result};
use crate::transform::LocalFrame;

/// One of the two ends of a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WallEnd {
    Start,
    End,
}

impl WallEnd {
    pub fn opposite(self) -> Self {
        match self {
            WallEnd::Start => WallEnd::End,
            WallEnd::End => WallEnd::Start,
        }
    }
}

/// Centre line and thickness of one wall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSegment {
    pub wall: NodeId,
    pub start: Point2<f64>,
    pub end: Point2<f64>,
    pub thickness: f64,
}

impl WallSegment {
    pub fn new(wall: NodeId, data: &WallData) -> Self {
        Self {
            wall,
            start: data.start.to_nalgebra(),
            end: data.end.to_nalgebra(),
            thickness: data.thickness,
        }
    }

    /// Reads the segment of wall `id` from `graph`.
    pub fn from_graph(graph: &SceneGraph, id: NodeId) -> Result<Self> {
        let node = graph
            .get_node(id)
            .ok_or(floorplan_core::Error::NotFound(id))?;
        node.as_wall()
            .map(|data| Self::new(id, data))
            .ok_or(Error::NotAWall(id))
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Shorter than `tolerance`: such walls take no part in junctions and
    /// produce no polygon.
    #[inline]
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.length() < tolerance
    }

    #[inline]
    pub fn point(&self, end: WallEnd) -> Point2<f64> {
        match end {
            WallEnd::Start => self.start,
            WallEnd::End => self.end,
        }
    }

    /// Unit vector from `end` towards the opposite end.
    pub fn outgoing(&self, end: WallEnd) -> Option<Vector2<f64>> {
        let v = self.point(end.opposite()) - self.point(end);
        let norm = v.norm();
        (norm > f64::EPSILON).then(|| v / norm)
    }

    /// Local frame of the wall (origin at `start`, +X towards `end`).
    pub fn frame(&self) -> Option<LocalFrame> {
        LocalFrame::new(self.start, self.end - self.start)
    }
}

/// Segments of every wall directly on `level`.
pub fn collect_level_segments(graph: &SceneGraph, level: NodeId) -> Vec<WallSegment> {
    graph
        .walls_on_level(level)
        .iter()
        .map(|(id, data)| WallSegment::new(*id, data))
        .collect()
}
