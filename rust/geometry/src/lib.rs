// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan-Lite Geometry
//!
//! Junction resolution and wall outline generation for floor plans, using
//! nalgebra for the 2D math. Walls meeting at a point are mitered against
//! each other; free ends get square caps. The resulting polygons live in each
//! wall's local frame and are handed to a renderer for extrusion.

pub mod error;
pub mod junction;
pub mod polygon;
pub mod segment;
pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use error::{Error, Result};
pub use junction::{
    resolve_junctions, Junction, JunctionEnd, JunctionKey, JunctionMap, MiterCorner, Resolution,
};
pub use polygon::{
    build_level_geometry, build_wall_geometry, build_wall_polygon, resolve_level, LevelGeometry,
    OpeningCut, WallGeometry, WallPolygon,
};
pub use segment::{collect_level_segments, WallEnd, WallSegment};
pub use transform::LocalFrame;
