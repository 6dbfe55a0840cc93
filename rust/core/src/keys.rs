// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node identifiers and type discriminants.
//!
//! Every node in the scene graph gets a type-safe key created by
//! `slotmap::SlotMap`. Keys are generational: once a node is deleted, its key
//! never resolves again, even if the slot is reused by a later node.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Opaque identifier of a scene node, immutable for the node's lifetime.
    pub struct NodeId;
}

/// Discriminant for scene node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Site,
    Building,
    Level,
    Wall,
    Slab,
    Ceiling,
    Roof,
    Door,
    Window,
    Item,
    Zone,
    Group,
    Image,
    Scan,
}

impl NodeType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Site => "site",
            NodeType::Building => "building",
            NodeType::Level => "level",
            NodeType::Wall => "wall",
            NodeType::Slab => "slab",
            NodeType::Ceiling => "ceiling",
            NodeType::Roof => "roof",
            NodeType::Door => "door",
            NodeType::Window => "window",
            NodeType::Item => "item",
            NodeType::Zone => "zone",
            NodeType::Group => "group",
            NodeType::Image => "image",
            NodeType::Scan => "scan",
        }
    }

    /// Doors and windows: children of a wall placed along its local X axis.
    pub fn is_opening(&self) -> bool {
        matches!(self, NodeType::Door | NodeType::Window)
    }

    /// Types that only group other nodes and occupy no grid cells themselves.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeType::Site | NodeType::Building | NodeType::Level | NodeType::Group
        )
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn node_type_names() {
        assert_eq!(NodeType::Wall.as_str(), "wall");
        assert_eq!(NodeType::Level.to_string(), "level");
        assert_eq!(NodeType::Scan.as_str(), "scan");
    }

    #[test]
    fn opening_and_container_classification() {
        assert!(NodeType::Door.is_opening());
        assert!(NodeType::Window.is_opening());
        assert!(!NodeType::Wall.is_opening());
        assert!(NodeType::Level.is_container());
        assert!(!NodeType::Slab.is_container());
    }

    #[test]
    fn deleted_keys_do_not_alias_new_nodes() {
        let mut map: SlotMap<NodeId, u32> = SlotMap::with_key();
        let a = map.insert(1);
        map.remove(a);
        let b = map.insert(2);
        assert_ne!(a, b);
        assert!(map.get(a).is_none());
    }
}
