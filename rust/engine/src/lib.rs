// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorplan-Lite Engine
//!
//! The editing session that ties the scene graph, the spatial index and the
//! junction resolver together. Each mutation returns a [`MutationReport`]
//! naming the junctions it invalidated and the walls a renderer has to
//! re-extrude.
//!
//! ## Quick Start
//!
//! ```rust
//! use floorplan_core::{Node, NodeData, Point2D, WallData};
//! use floorplan_engine::{EditorConfig, EditorSession};
//!
//! let mut session = EditorSession::new(EditorConfig::default());
//! let (level, _) = session.add_node(Node::new(NodeData::level(0, 0.0)), None)?;
//! let (a, _) = session.add_node(
//!     Node::new(WallData::new(Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0), 0.2, 2.5)),
//!     Some(level),
//! )?;
//! let (_, report) = session.add_node(
//!     Node::new(WallData::new(Point2D::new(5.0, 0.0), Point2D::new(5.0, 5.0), 0.2, 2.5)),
//!     Some(level),
//! )?;
//!
//! // The new wall mitres against `a`, so both polygons were rebuilt.
//! assert!(report.rebuilt_walls.contains(&a));
//! assert!(session.wall_geometry(a).unwrap().polygon.end_mitered);
//! # Ok::<(), floorplan_engine::Error>(())
//! ```

pub mod cache;
pub mod collaborators;
pub mod dirty;
pub mod error;
pub mod session;

pub use cache::{JunctionCache, LevelCache, Refresh, StaleEntry};
pub use collaborators::{render_level, HistorySink, SolidBuilder};
pub use dirty::{DirtySet, LevelJunctionKey};
pub use error::{Error, Result};
pub use session::{EditorSession, MutationReport};

pub use floorplan_core::EditorConfig;
