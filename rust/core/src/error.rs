// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scene graph operations.

use crate::keys::{NodeId, NodeType};

/// Result type alias for scene graph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing the scene graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced node was not found in the graph.
    #[error("node not found: {0:?}")]
    NotFound(NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("cannot move {node:?} under its own descendant {target:?}")]
    CyclicMove { node: NodeId, target: NodeId },

    /// The operation requires a node of a different type.
    #[error("node {node:?} is not a {expected}")]
    WrongKind { node: NodeId, expected: NodeType },

    /// A cell range whose start lies after its end.
    #[error("invalid cell range: {start}..={end}")]
    InvalidRange { start: u32, end: u32 },

    /// A patch field that does not exist on the node's type.
    #[error("field `{field}` cannot be set on node {node:?}")]
    InvalidPatch { node: NodeId, field: &'static str },

    /// The spatial index references a node the graph no longer has.
    #[error("spatial index references missing node {0:?}")]
    IndexDesync(NodeId),

    /// A new node carries an attribute outside its valid domain.
    #[error("invalid `{field}` for a new {kind} node")]
    InvalidAttribute { kind: NodeType, field: &'static str },

    /// A deserialized graph violates a structural invariant.
    #[error("corrupt scene graph: {0}")]
    Corrupt(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
