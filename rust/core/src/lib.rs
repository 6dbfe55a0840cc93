// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Floorplan-Lite Core
//!
//! The authoritative model of a floor plan: a hierarchical scene of building
//! elements, a per-level spatial index over it, and the structural edits the
//! editor performs on walls.
//!
//! ## Overview
//!
//! - **Scene Graph**: arena of nodes addressed by generational [`NodeId`]s,
//!   with copy-on-write nodes for cheap history snapshots
//! - **Spatial Index**: grid cell to node lookup, one grid per level
//! - **Wall Segment Editor**: removing a span of cells from a wall while
//!   redistributing its doors and windows
//! - **Editor Overlay**: transient per-node session flags, kept out of the
//!   persisted graph
//!
//! ## Quick Start
//!
//! ```rust
//! use floorplan_core::{Node, NodeData, Point2D, SceneGraph, SplitOutcome, WallData};
//!
//! let mut graph = SceneGraph::new();
//! let level = graph.add_node(Node::new(NodeData::level(0, 0.0)), None)?;
//! let wall = graph.add_node(
//!     Node::new(WallData::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0), 0.2, 2.5)),
//!     Some(level),
//! )?;
//!
//! let outcome = graph.split_wall(wall, 3, 5)?;
//! assert!(matches!(outcome, SplitOutcome::Split { .. }));
//! # Ok::<(), floorplan_core::Error>(())
//! ```
//!
//! Derived structures (the spatial index, junction caches) are kept in sync by
//! draining the graph's [`ChangeSet`] journal after each mutation; the
//! `floorplan-engine` crate does this for you.

pub mod change;
pub mod config;
pub mod edit;
pub mod error;
pub mod footprint;
pub mod graph;
pub mod keys;
pub mod node;
pub mod overlay;
pub mod patch;
pub mod serialization;
pub mod spatial;
pub mod types;

pub use change::{Change, ChangeSet};
pub use config::{EditorConfig, DEFAULT_SNAP_TOLERANCE};
pub use edit::{plan_split, SplitOutcome, SplitPlan, WallPiece};
pub use error::{Error, Result};
pub use footprint::footprint;
pub use graph::SceneGraph;
pub use keys::{NodeId, NodeType};
pub use node::{
    ItemData, LevelData, Node, NodeData, OpeningData, ReferenceData, SurfaceData, WallData,
    ZoneData,
};
pub use overlay::{EditorOverlay, OverlayState};
pub use patch::NodePatch;
pub use serialization::FORMAT_VERSION;
pub use spatial::SpatialIndex;
pub use types::{CellRange, GridCell, GridRect, Point2D};
