// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seams towards the renderer and the undo history.

use floorplan_core::{NodeId, SceneGraph};
use floorplan_geometry::{OpeningCut, WallPolygon};
use tracing::trace;

use crate::session::EditorSession;

/// Turns wall outlines into renderer solids.
pub trait SolidBuilder {
    type Solid;

    /// Extrudes `polygon` (in the wall's local frame) up to `height`.
    fn extrude(&mut self, polygon: &WallPolygon, height: f64) -> Self::Solid;

    /// Cuts `opening` out of `solid`; `opening.position` is along local X.
    fn subtract_opening(&mut self, solid: Self::Solid, opening: &OpeningCut) -> Self::Solid;
}

/// Receives an immutable graph version after every effective mutation.
pub trait HistorySink {
    fn record(&mut self, revision: u64, snapshot: SceneGraph);
}

impl<F> HistorySink for F
where
    F: FnMut(u64, SceneGraph),
{
    fn record(&mut self, revision: u64, snapshot: SceneGraph) {
        self(revision, snapshot)
    }
}

/// Builds a solid for every cached wall of `level`, ordered by wall id.
pub fn render_level<B: SolidBuilder>(
    session: &EditorSession,
    level: NodeId,
    builder: &mut B,
) -> Vec<(NodeId, B::Solid)> {
    let Some(cache) = session.level_geometry(level) else {
        return Vec::new();
    };
    let mut walls: Vec<_> = cache.walls.values().collect();
    walls.sort_unstable_by_key(|g| g.wall);

    walls
        .into_iter()
        .map(|geometry| {
            let solid = builder.extrude(&geometry.polygon, geometry.height);
            let solid = geometry
                .openings
                .iter()
                .fold(solid, |solid, cut| builder.subtract_opening(solid, cut));
            trace!(wall = ?geometry.wall, openings = geometry.openings.len(), "rendered wall");
            (geometry.wall, solid)
        })
        .collect()
}
