// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The scene graph: sole owner of node identity and topology.
//!
//! Nodes live in a slot map keyed by generational [`NodeId`]s. Parent/child
//! links are id pairs, so deleting a subtree can never leave a dangling
//! reference behind. Each node is held behind an `Arc` and rewritten with
//! copy-on-write: cloning the graph (see [`SceneGraph::snapshot`]) is a cheap
//! history snapshot that keeps sharing every node the live graph has not
//! touched since.
//!
//! Every successful mutation appends to an internal [`ChangeSet`] journal,
//! drained by the owner with [`SceneGraph::drain_changes`] to resync derived
//! structures. A failed mutation leaves both the graph and the journal as
//! they were.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::debug;

use crate::change::{Change, ChangeSet};
use crate::error::{Error, Result};
use crate::keys::{NodeId, NodeType};
use crate::node::{Node, NodeData, WallData};
use crate::patch::NodePatch;

/// Hierarchical scene of building elements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Arc<Node>>,
    roots: Vec<NodeId>,
    #[serde(default)]
    revision: u64,
    #[serde(skip)]
    journal: ChangeSet,
}

impl SceneGraph {
    /// Creates a new, empty scene graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Queries ---

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Monotonic counter bumped by every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the node for the given id, or `None` if not found.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).map(Arc::as_ref)
    }

    /// Returns the shared version of a node.
    pub fn get_shared(&self, id: NodeId) -> Option<Arc<Node>> {
        self.nodes.get(id).cloned()
    }

    /// `true` if both graphs hold the very same version of `id`.
    pub fn shares_version(&self, other: &SceneGraph, id: NodeId) -> bool {
        match (self.nodes.get(id), other.nodes.get(id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (id, node.as_ref()))
    }

    /// Nodes without a parent, in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ordered children of a node.
    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(id).map(|n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    /// Ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            out.push(p);
            cursor = self.parent(p);
        }
        out
    }

    /// Returns `true` if `ancestor` lies strictly above `id`.
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// All nodes below `id` in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.children(id) {
            Some(children) => children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(children) = self.children(next) {
                stack.extend(children.iter().rev().copied());
            }
        }
        out
    }

    /// The nearest level at or above `id`.
    pub fn level_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.node_type(*n) == Some(NodeType::Level))
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get_node(id).map(Node::node_type)
    }

    /// Walls whose nearest level is `level`, in tree order.
    pub fn walls_on_level(&self, level: NodeId) -> Vec<(NodeId, WallData)> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.children(level) {
            Some(children) => children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            let Some(node) = self.get_node(next) else {
                continue;
            };
            match &node.data {
                NodeData::Level(_) => continue,
                NodeData::Wall(wall) => out.push((next, *wall)),
                _ => {}
            }
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// All level nodes in the graph.
    pub fn levels(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.node_type() == NodeType::Level)
            .map(|(id, _)| id)
            .collect()
    }

    // --- Mutations ---

    /// Adds `node` as the last child of `parent` (or as a root).
    pub fn add_node(&mut self, node: Node, parent: Option<NodeId>) -> Result<NodeId> {
        let index = match parent {
            Some(p) => self.children(p).ok_or(Error::NotFound(p))?.len(),
            None => self.roots.len(),
        };
        self.add_node_at(node, parent, index)
    }

    /// Adds `node` at `index` among the children of `parent`.
    ///
    /// `index` is clamped to the current number of children.
    pub fn add_node_at(
        &mut self,
        mut node: Node,
        parent: Option<NodeId>,
        index: usize,
    ) -> Result<NodeId> {
        if let Some(p) = parent {
            if !self.nodes.contains_key(p) {
                return Err(Error::NotFound(p));
            }
        }
        let kind = node.node_type();
        if let Some(field) = node.data.invalid_attribute() {
            return Err(Error::InvalidAttribute { kind, field });
        }
        node.parent = parent;
        node.children.clear();

        let id = self.nodes.insert(Arc::new(node));
        self.link(id, parent, index);
        self.journal.push(Change::Added { id });
        self.revision += 1;

        debug!(node = ?id, parent = ?parent, kind = %kind, "added node");
        Ok(id)
    }

    /// Overwrites the attributes named by `patch`.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> Result<()> {
        let current = self.nodes.get(id).ok_or(Error::NotFound(id))?;
        let next = patch.apply(id, current)?;
        if next == **current {
            return Ok(());
        }
        self.replace(id, next);
        Ok(())
    }

    /// Replaces a node's payload with one of the same type.
    pub(crate) fn set_data(&mut self, id: NodeId, data: NodeData) -> Result<()> {
        let current = self.nodes.get(id).ok_or(Error::NotFound(id))?;
        let expected = current.node_type();
        if data.node_type() != expected {
            return Err(Error::WrongKind { node: id, expected });
        }
        if current.data == data {
            return Ok(());
        }
        let mut next = (**current).clone();
        next.data = data;
        self.replace(id, next);
        Ok(())
    }

    /// Deletes a node and its whole subtree.
    pub fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let parent = self.nodes.get(id).ok_or(Error::NotFound(id))?.parent;

        let mut subtree = vec![id];
        subtree.extend(self.descendants(id));
        let levels: Vec<Option<NodeId>> = subtree.iter().map(|n| self.level_of(*n)).collect();

        self.unlink(id, parent);
        let count = subtree.len();
        for (node_id, level) in subtree.into_iter().zip(levels) {
            if let Some(node) = self.nodes.remove(node_id) {
                self.journal.push(Change::Removed {
                    id: node_id,
                    node,
                    level,
                });
            }
        }
        self.revision += 1;

        debug!(node = ?id, removed = count, "deleted subtree");
        Ok(())
    }

    /// Reparents `id` as the last child of `new_parent` (or makes it a root).
    ///
    /// Moving a node under itself is a no-op; moving it under one of its own
    /// descendants fails with [`Error::CyclicMove`] and leaves it unchanged.
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<()> {
        let from = self.nodes.get(id).ok_or(Error::NotFound(id))?.parent;
        if let Some(target) = new_parent {
            if target == id {
                return Ok(());
            }
            if !self.contains(target) {
                return Err(Error::NotFound(target));
            }
            if self.is_descendant(target, id) {
                return Err(Error::CyclicMove { node: id, target });
            }
        }
        if from == new_parent {
            return Ok(());
        }

        let before_level = self.level_of(id);
        self.unlink(id, from);
        let index = match new_parent {
            Some(p) => self.nodes[p].children.len(),
            None => self.roots.len(),
        };
        self.link(id, new_parent, index);
        Arc::make_mut(&mut self.nodes[id]).parent = new_parent;

        self.journal.push(Change::Moved {
            id,
            from,
            before_level,
        });
        self.revision += 1;

        debug!(node = ?id, from = ?from, to = ?new_parent, "moved node");
        Ok(())
    }

    /// Takes every change recorded since the last call.
    pub fn drain_changes(&mut self) -> ChangeSet {
        std::mem::take(&mut self.journal)
    }

    /// A history snapshot: shares every node with `self`, carries no journal.
    pub fn snapshot(&self) -> SceneGraph {
        SceneGraph {
            nodes: self.nodes.clone(),
            roots: self.roots.clone(),
            revision: self.revision,
            journal: ChangeSet::new(),
        }
    }

    /// Checks referential symmetry, root bookkeeping and acyclicity.
    pub fn validate(&self) -> Result<()> {
        let mut seen_roots = FxHashSet::default();
        for &root in &self.roots {
            let node = self
                .nodes
                .get(root)
                .ok_or_else(|| Error::Corrupt(format!("root {root:?} does not exist")))?;
            if node.parent.is_some() {
                return Err(Error::Corrupt(format!("root {root:?} has a parent")));
            }
            if !seen_roots.insert(root) {
                return Err(Error::Corrupt(format!("root {root:?} listed twice")));
            }
        }

        for (id, node) in &self.nodes {
            if let Some(field) = node.data.invalid_attribute() {
                return Err(Error::Corrupt(format!("{id:?} has an invalid `{field}`")));
            }
            match node.parent {
                Some(p) => {
                    let parent = self.nodes.get(p).ok_or_else(|| {
                        Error::Corrupt(format!("{id:?} points to missing parent {p:?}"))
                    })?;
                    let listed = parent.children.iter().filter(|c| **c == id).count();
                    if listed != 1 {
                        return Err(Error::Corrupt(format!(
                            "{id:?} appears {listed} times among children of {p:?}"
                        )));
                    }
                }
                None if !seen_roots.contains(&id) => {
                    return Err(Error::Corrupt(format!("orphan {id:?} is not a root")));
                }
                None => {}
            }
            for &child in &node.children {
                let child_node = self.nodes.get(child).ok_or_else(|| {
                    Error::Corrupt(format!("{id:?} lists missing child {child:?}"))
                })?;
                if child_node.parent != Some(id) {
                    return Err(Error::Corrupt(format!(
                        "{child:?} is listed under {id:?} but points elsewhere"
                    )));
                }
            }
        }

        // Every node must reach a root within `len` steps.
        for id in self.nodes.keys() {
            let mut cursor = self.parent(id);
            let mut steps = 0;
            while let Some(p) = cursor {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(Error::Corrupt(format!("cycle through {id:?}")));
                }
                cursor = self.parent(p);
            }
        }
        Ok(())
    }

    // --- Internal helpers ---

    fn replace(&mut self, id: NodeId, next: Node) {
        let before = std::mem::replace(&mut self.nodes[id], Arc::new(next));
        self.journal.push(Change::Updated { id, before });
        self.revision += 1;
        debug!(node = ?id, "updated node");
    }

    fn link(&mut self, id: NodeId, parent: Option<NodeId>, index: usize) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(p) {
                Some(node) => &mut Arc::make_mut(node).children,
                None => return,
            },
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, id);
    }

    fn unlink(&mut self, id: NodeId, parent: Option<NodeId>) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(p) {
                Some(node) => &mut Arc::make_mut(node).children,
                None => return,
            },
            None => &mut self.roots,
        };
        siblings.retain(|c| *c != id);
    }
}
