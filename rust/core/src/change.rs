// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Change journal produced by scene graph mutations.
//!
//! Derived structures (spatial index, junction cache) are kept consistent by
//! replaying the journal after every mutation. Entries that describe a prior
//! state carry the previous `Arc<Node>`, which is shared with any history
//! snapshot and costs no copy.

use std::sync::Arc;

use crate::keys::NodeId;
use crate::node::Node;

/// One structural or attribute change.
#[derive(Debug, Clone)]
pub enum Change {
    /// A node was created.
    Added { id: NodeId },
    /// A node's attributes were replaced; `before` is the previous version.
    Updated { id: NodeId, before: Arc<Node> },
    /// A node was reparented.
    Moved {
        id: NodeId,
        from: Option<NodeId>,
        before_level: Option<NodeId>,
    },
    /// A node was deleted; `level` is the level it belonged to.
    Removed {
        id: NodeId,
        node: Arc<Node>,
        level: Option<NodeId>,
    },
}

impl Change {
    pub fn id(&self) -> NodeId {
        match self {
            Change::Added { id }
            | Change::Updated { id, .. }
            | Change::Moved { id, .. }
            | Change::Removed { id, .. } => *id,
        }
    }
}

/// Ordered list of changes since the journal was last drained.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn extend(&mut self, other: ChangeSet) {
        self.changes.extend(other.changes);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Ids of nodes removed by this change set.
    pub fn removed(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.changes.iter().filter_map(|c| match c {
            Change::Removed { id, .. } => Some(*id),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}
