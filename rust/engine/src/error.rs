// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the editor session.

use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`EditorSession`](crate::EditorSession).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Scene graph error: {0}")]
    Core(#[from] floorplan_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] floorplan_geometry::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
