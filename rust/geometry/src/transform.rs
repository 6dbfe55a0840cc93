// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall-local coordinate frames.
//!
//! A wall's local frame has its origin at the wall's `start`, local +X along
//! the wall towards `end` and local +Y to the left of that direction. All
//! polygons handed to extrusion are expressed in this frame.

use nalgebra::{Point2, Vector2};

/// Rigid 2D frame: an origin and a unit X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    pub origin: Point2<f64>,
    /// Unit length
    pub x_axis: Vector2<f64>,
}

impl LocalFrame {
    /// Frame anchored at `origin` looking along `direction`.
    ///
    /// Returns `None` when `direction` has no usable length.
    pub fn new(origin: Point2<f64>, direction: Vector2<f64>) -> Option<Self> {
        let norm = direction.norm();
        if norm <= f64::EPSILON {
            return None;
        }
        Some(Self {
            origin,
            x_axis: direction / norm,
        })
    }

    /// Left normal of the X axis.
    #[inline]
    pub fn y_axis(&self) -> Vector2<f64> {
        left_normal(&self.x_axis)
    }

    /// World point expressed in this frame.
    #[inline]
    pub fn to_local(&self, p: &Point2<f64>) -> Point2<f64> {
        let v = p - self.origin;
        Point2::new(v.dot(&self.x_axis), v.dot(&self.y_axis()))
    }

    /// Local point expressed in world coordinates.
    #[inline]
    pub fn to_world(&self, p: &Point2<f64>) -> Point2<f64> {
        self.origin + self.x_axis * p.x + self.y_axis() * p.y
    }
}

/// `v` rotated a quarter turn counter-clockwise.
#[inline]
pub fn left_normal(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
