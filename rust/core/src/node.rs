// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene node model.
//!
//! A [`Node`] carries the attributes common to every building element
//! (visibility, opacity, tree links) plus a tagged [`NodeData`] payload. Tree
//! links are owned by the [`SceneGraph`](crate::SceneGraph): they can be read
//! here but only the graph rewrites them.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::keys::{NodeId, NodeType};
use crate::types::Point2D;

/// A node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub visible: bool,
    pub opacity: f32,
    pub data: NodeData,
}

impl Node {
    /// A detached, visible, fully opaque node.
    pub fn new(data: impl Into<NodeData>) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            visible: true,
            opacity: 1.0,
            data: data.into(),
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn node_type(&self) -> NodeType {
        self.data.node_type()
    }

    pub fn as_wall(&self) -> Option<&WallData> {
        match &self.data {
            NodeData::Wall(wall) => Some(wall),
            _ => None,
        }
    }

    pub fn as_opening(&self) -> Option<&OpeningData> {
        match &self.data {
            NodeData::Door(opening) | NodeData::Window(opening) => Some(opening),
            _ => None,
        }
    }
}

/// Type-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeData {
    Site { name: String },
    Building { name: String },
    Level(LevelData),
    Wall(WallData),
    Slab(SurfaceData),
    Ceiling(SurfaceData),
    Roof(SurfaceData),
    Door(OpeningData),
    Window(OpeningData),
    Item(ItemData),
    Zone(ZoneData),
    Group { name: String },
    Image(ReferenceData),
    Scan(ReferenceData),
}

impl NodeData {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeData::Site { .. } => NodeType::Site,
            NodeData::Building { .. } => NodeType::Building,
            NodeData::Level(_) => NodeType::Level,
            NodeData::Wall(_) => NodeType::Wall,
            NodeData::Slab(_) => NodeType::Slab,
            NodeData::Ceiling(_) => NodeType::Ceiling,
            NodeData::Roof(_) => NodeType::Roof,
            NodeData::Door(_) => NodeType::Door,
            NodeData::Window(_) => NodeType::Window,
            NodeData::Item(_) => NodeType::Item,
            NodeData::Zone(_) => NodeType::Zone,
            NodeData::Group { .. } => NodeType::Group,
            NodeData::Image(_) => NodeType::Image,
            NodeData::Scan(_) => NodeType::Scan,
        }
    }

    /// First attribute outside its valid domain, if any.
    ///
    /// A wall needs a finite, positive thickness: a negative one would swap
    /// its left and right faces and flip the winding of its outline.
    pub fn invalid_attribute(&self) -> Option<&'static str> {
        match self {
            NodeData::Wall(wall) if !(wall.thickness.is_finite() && wall.thickness > 0.0) => {
                Some("thickness")
            }
            _ => None,
        }
    }

    pub fn site(name: impl Into<String>) -> Self {
        NodeData::Site { name: name.into() }
    }

    pub fn building(name: impl Into<String>) -> Self {
        NodeData::Building { name: name.into() }
    }

    pub fn level(index: i32, elevation: f64) -> Self {
        NodeData::Level(LevelData { index, elevation })
    }

    pub fn group(name: impl Into<String>) -> Self {
        NodeData::Group { name: name.into() }
    }

    pub fn door(position: f64, width: f64) -> Self {
        NodeData::Door(OpeningData::new(position, width, 2.1, 0.0))
    }

    pub fn window(position: f64, width: f64) -> Self {
        NodeData::Window(OpeningData::new(position, width, 1.2, 0.9))
    }
}

impl From<WallData> for NodeData {
    fn from(wall: WallData) -> Self {
        NodeData::Wall(wall)
    }
}

impl From<ItemData> for NodeData {
    fn from(item: ItemData) -> Self {
        NodeData::Item(item)
    }
}

impl From<ZoneData> for NodeData {
    fn from(zone: ZoneData) -> Self {
        NodeData::Zone(zone)
    }
}

/// A storey.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    /// Stacking order (0 = ground)
    pub index: i32,
    pub elevation: f64,
}

/// A straight wall between two grid points.
///
/// Rotation and length are derived from `start`/`end` on every read, so they
/// can never disagree with the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallData {
    pub start: Point2D,
    pub end: Point2D,
    pub thickness: f64,
    pub height: f64,
}

impl WallData {
    pub fn new(start: Point2D, end: Point2D, thickness: f64, height: f64) -> Self {
        Self {
            start,
            end,
            thickness,
            height,
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// `[length, thickness]`
    pub fn size(&self) -> [f64; 2] {
        [self.length(), self.thickness]
    }

    /// Rotation about the vertical axis: `atan2(-(end.y - start.y), end.x - start.x)`.
    pub fn rotation(&self) -> f64 {
        (-(self.end.y - self.start.y)).atan2(self.end.x - self.start.x)
    }

    /// Unit vector from `start` to `end`, or `None` for a zero-length wall.
    pub fn direction(&self) -> Option<Vector2<f64>> {
        let v = Vector2::new(self.end.x - self.start.x, self.end.y - self.start.y);
        let len = v.norm();
        if len <= f64::EPSILON {
            None
        } else {
            Some(v / len)
        }
    }

    /// World point at `local_x` along the wall's local X axis.
    pub fn point_at(&self, local_x: f64) -> Point2D {
        match self.direction() {
            Some(dir) => self.start.offset(dir * local_x),
            None => self.start,
        }
    }
}

/// A door or window hosted by a wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpeningData {
    /// Offset of the opening's leading edge along the host wall, from `start`.
    pub position: f64,
    pub width: f64,
    pub height: f64,
    /// Sill height above the level.
    pub elevation: f64,
}

impl OpeningData {
    pub fn new(position: f64, width: f64, height: f64, elevation: f64) -> Self {
        Self {
            position,
            width,
            height,
            elevation,
        }
    }
}

/// A horizontal surface outline (slab, ceiling or roof).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceData {
    pub polygon: Vec<Point2D>,
    pub elevation: f64,
}

/// A placed catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    /// Centre of the item
    pub position: Point2D,
    /// `[width, depth]`
    pub size: [f64; 2],
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
}

/// A named floor area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneData {
    pub name: String,
    pub polygon: Vec<Point2D>,
}

/// A reference image or scan underlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub url: String,
    pub position: Point2D,
    pub scale: f64,
    pub rotation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn wall_derived_attributes() {
        let wall = WallData::new(Point2D::new(0.0, 0.0), Point2D::new(0.0, 4.0), 0.2, 2.5);
        assert_relative_eq!(wall.length(), 4.0);
        assert_eq!(wall.size(), [4.0, 0.2]);
        // +Y in the plan maps to a negative rotation
        assert_relative_eq!(wall.rotation(), -FRAC_PI_2);
        let p = wall.point_at(1.5);
        assert_relative_eq!(p.y, 1.5);
    }

    #[test]
    fn zero_length_wall_has_no_direction() {
        let p = Point2D::new(2.0, 2.0);
        let wall = WallData::new(p, p, 0.2, 2.5);
        assert!(wall.direction().is_none());
        assert_eq!(wall.point_at(3.0), p);
    }

    #[test]
    fn node_data_is_tagged() {
        let json = serde_json::to_value(NodeData::door(1.0, 0.9)).unwrap();
        assert_eq!(json["type"], "door");
        assert_eq!(json["position"], 1.0);

        let back: NodeData = serde_json::from_value(json).unwrap();
        assert_eq!(back.node_type(), NodeType::Door);
    }

    #[test]
    fn opacity_is_clamped() {
        let node = Node::new(NodeData::group("g")).with_opacity(3.0);
        assert_eq!(node.opacity, 1.0);
    }
}
