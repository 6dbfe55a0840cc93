// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Editor configuration, optionally loaded from environment variables.

use serde::{Deserialize, Serialize};

/// Default snapping tolerance in grid units.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 1e-3;

/// Tunables shared by the scene graph, spatial index and junction resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Distance below which two wall endpoints are the same junction point,
    /// and below which a wall is degenerate (grid units).
    pub snap_tolerance: f64,
    /// Edge length of one spatial index cell (grid units).
    pub cell_size: f64,
    /// Thickness given to walls created without an explicit one.
    pub default_wall_thickness: f64,
    /// Height given to walls created without an explicit one.
    pub default_wall_height: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            cell_size: 1.0,
            default_wall_thickness: 0.2,
            default_wall_height: 2.5,
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset, unparsable or non-positive values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            snap_tolerance: positive_env("FLOORPLAN_SNAP_TOLERANCE")
                .unwrap_or(defaults.snap_tolerance),
            cell_size: positive_env("FLOORPLAN_CELL_SIZE").unwrap_or(defaults.cell_size),
            default_wall_thickness: positive_env("FLOORPLAN_WALL_THICKNESS")
                .unwrap_or(defaults.default_wall_thickness),
            default_wall_height: positive_env("FLOORPLAN_WALL_HEIGHT")
                .unwrap_or(defaults.default_wall_height),
        }
    }
}

fn positive_env(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value > 0.0)
}
