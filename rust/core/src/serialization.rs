// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON persistence for scene graphs.
//!
//! Node identifiers, type tags and geometric attributes round-trip losslessly:
//! the slot map is written with its generational keys, so ids handed out
//! before saving resolve to the same nodes after loading. The editor overlay
//! and the change journal are never written.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::SceneGraph;

/// Current document format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct DocumentRef<'a> {
    format: u32,
    scene: &'a SceneGraph,
}

#[derive(Deserialize)]
struct Document {
    format: u32,
    scene: SceneGraph,
}

impl SceneGraph {
    /// Serializes the graph to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let doc = DocumentRef {
            format: FORMAT_VERSION,
            scene: self,
        };
        Ok(serde_json::to_string(&doc)?)
    }

    /// Serializes the graph to an indented JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        let doc = DocumentRef {
            format: FORMAT_VERSION,
            scene: self,
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Loads a graph written by [`SceneGraph::to_json`], rejecting documents
    /// of an unknown format or with inconsistent topology.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Document = serde_json::from_str(json)?;
        if doc.format != FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported document format {}",
                doc.format
            )));
        }
        doc.scene.validate()?;
        debug!(nodes = doc.scene.len(), "loaded scene");
        Ok(doc.scene)
    }
}
