// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use floorplan_core::NodeId;
use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    /// The wall is shorter than the snapping tolerance and has no shape.
    #[error("Degenerate wall {wall:?}: length {length} is below the snapping tolerance")]
    DegenerateGeometry { wall: NodeId, length: f64 },

    #[error("Node {0:?} is not a wall")]
    NotAWall(NodeId),

    #[error("Scene graph error: {0}")]
    Core(#[from] floorplan_core::Error),
}
