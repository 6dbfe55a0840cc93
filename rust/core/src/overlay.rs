// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transient editor state kept beside the graph, never persisted with it.

use rustc_hash::FxHashMap;

use crate::keys::NodeId;
use crate::types::CellRange;

/// Interactive-session flags for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    /// The node is an in-progress preview (e.g. a wall being drawn).
    pub preview: bool,
    /// Result of the last placement check, if one ran.
    pub placement_valid: Option<bool>,
    /// Cells of a wall currently marked for deletion.
    pub delete_range: Option<CellRange>,
    /// Cells of a wall currently highlighted by the paint tool.
    pub paint_range: Option<CellRange>,
}

impl OverlayState {
    fn is_empty(&self) -> bool {
        *self == OverlayState::default()
    }
}

/// Side table of [`OverlayState`] keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct EditorOverlay {
    states: FxHashMap<NodeId, OverlayState>,
}

impl EditorOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> OverlayState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    pub fn is_preview(&self, id: NodeId) -> bool {
        self.get(id).preview
    }

    pub fn set_preview(&mut self, id: NodeId, preview: bool) {
        self.edit(id, |s| s.preview = preview);
    }

    pub fn set_placement_valid(&mut self, id: NodeId, valid: Option<bool>) {
        self.edit(id, |s| s.placement_valid = valid);
    }

    pub fn set_delete_range(&mut self, id: NodeId, range: Option<CellRange>) {
        self.edit(id, |s| s.delete_range = range);
    }

    pub fn set_paint_range(&mut self, id: NodeId, range: Option<CellRange>) {
        self.edit(id, |s| s.paint_range = range);
    }

    /// Forgets everything about `id`.
    pub fn clear(&mut self, id: NodeId) {
        self.states.remove(&id);
    }

    /// Forgets every id in `ids`.
    pub fn prune(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            self.states.remove(&id);
        }
    }

    /// Nodes currently flagged as previews.
    pub fn previews(&self) -> Vec<NodeId> {
        self.states
            .iter()
            .filter(|(_, s)| s.preview)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Every node with a non-default state.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.states.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn edit(&mut self, id: NodeId, f: impl FnOnce(&mut OverlayState)) {
        let state = self.states.entry(id).or_default();
        f(state);
        if state.is_empty() {
            self.states.remove(&id);
        }
    }
}
