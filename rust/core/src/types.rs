// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain geometric value types shared across the workspace.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 2D point in grid units (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: &Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(&self, v: Vector2<f64>) -> Point2D {
        Point2D::new(self.x + v.x, self.y + v.y)
    }
}

impl From<Point2<f64>> for Point2D {
    fn from(p: Point2<f64>) -> Self {
        Self::from_nalgebra(&p)
    }
}

impl From<Point2D> for Point2<f64> {
    fn from(p: Point2D) -> Self {
        p.to_nalgebra()
    }
}

/// A discrete spatial index cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell containing `p` for the given cell edge length.
    pub fn containing(p: &Point2D, cell_size: f64) -> Self {
        Self {
            x: (p.x / cell_size).floor() as i32,
            y: (p.y / cell_size).floor() as i32,
        }
    }

    /// Centre of the cell in grid units.
    pub fn center(&self, cell_size: f64) -> Point2D {
        Point2D::new(
            (self.x as f64 + 0.5) * cell_size,
            (self.y as f64 + 0.5) * cell_size,
        )
    }
}

/// An inclusive rectangle of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRect {
    pub min: GridCell,
    pub max: GridCell,
}

impl GridRect {
    /// Builds the rectangle spanned by two corner cells in any order.
    pub fn from_corners(a: GridCell, b: GridCell) -> Self {
        Self {
            min: GridCell::new(a.x.min(b.x), a.y.min(b.y)),
            max: GridCell::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn contains(&self, cell: &GridCell) -> bool {
        cell.x >= self.min.x && cell.x <= self.max.x && cell.y >= self.min.y && cell.y <= self.max.y
    }

    /// Number of cells covered.
    pub fn area(&self) -> u64 {
        let w = (self.max.x as i64 - self.min.x as i64 + 1).max(0) as u64;
        let h = (self.max.y as i64 - self.min.y as i64 + 1).max(0) as u64;
        w * h
    }

    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| GridCell::new(x, y)))
    }
}

/// Inclusive span of cells along a wall's local X axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: u32,
    pub end: u32,
}

impl CellRange {
    /// Creates a range, rejecting `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start as f64 && position <= self.end as f64
    }
}
