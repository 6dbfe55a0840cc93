// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Partial attribute updates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keys::NodeId;
use crate::node::{Node, NodeData};
use crate::types::Point2D;

/// A set of attributes to overwrite on one node.
///
/// Fields left as `None` keep their current value. Setting a field the node's
/// type does not have is rejected as a whole: no field of the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePatch {
    pub visible: Option<bool>,
    pub opacity: Option<f32>,
    pub name: Option<String>,
    pub start: Option<Point2D>,
    pub end: Option<Point2D>,
    pub thickness: Option<f64>,
    pub height: Option<f64>,
    pub position: Option<f64>,
    pub width: Option<f64>,
    pub polygon: Option<Vec<Point2D>>,
    pub location: Option<Point2D>,
    pub size: Option<[f64; 2]>,
    pub rotation: Option<f64>,
    pub elevation: Option<f64>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn endpoints(mut self, start: Point2D, end: Point2D) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn start(mut self, start: Point2D) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: Point2D) -> Self {
        self.end = Some(end);
        self
    }

    pub fn thickness(mut self, thickness: f64) -> Self {
        self.thickness = Some(thickness);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn polygon(mut self, polygon: Vec<Point2D>) -> Self {
        self.polygon = Some(polygon);
        self
    }

    pub fn location(mut self, location: Point2D) -> Self {
        self.location = Some(location);
        self
    }

    pub fn rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Applies the patch to a copy of `node` and returns the result.
    pub(crate) fn apply(&self, id: NodeId, node: &Node) -> Result<Node> {
        let mut next = node.clone();
        if let Some(visible) = self.visible {
            next.visible = visible;
        }
        if let Some(opacity) = self.opacity {
            next.opacity = opacity.clamp(0.0, 1.0);
        }

        let reject = |field: &'static str| Error::InvalidPatch { node: id, field };

        match &mut next.data {
            NodeData::Site { name } | NodeData::Building { name } | NodeData::Group { name } => {
                self.only(id, &["name"])?;
                set(name, &self.name);
            }
            NodeData::Level(level) => {
                self.only(id, &["elevation"])?;
                set(&mut level.elevation, &self.elevation);
            }
            NodeData::Wall(wall) => {
                self.only(id, &["start", "end", "thickness", "height"])?;
                set(&mut wall.start, &self.start);
                set(&mut wall.end, &self.end);
                set(&mut wall.thickness, &self.thickness);
                set(&mut wall.height, &self.height);
            }
            NodeData::Slab(surface) | NodeData::Ceiling(surface) | NodeData::Roof(surface) => {
                self.only(id, &["polygon", "elevation"])?;
                set(&mut surface.polygon, &self.polygon);
                set(&mut surface.elevation, &self.elevation);
            }
            NodeData::Door(opening) | NodeData::Window(opening) => {
                self.only(id, &["position", "width", "height", "elevation"])?;
                set(&mut opening.position, &self.position);
                set(&mut opening.width, &self.width);
                set(&mut opening.height, &self.height);
                set(&mut opening.elevation, &self.elevation);
            }
            NodeData::Item(item) => {
                self.only(id, &["location", "size", "rotation"])?;
                set(&mut item.position, &self.location);
                set(&mut item.size, &self.size);
                set(&mut item.rotation, &self.rotation);
            }
            NodeData::Zone(zone) => {
                self.only(id, &["name", "polygon"])?;
                set(&mut zone.name, &self.name);
                set(&mut zone.polygon, &self.polygon);
            }
            NodeData::Image(reference) | NodeData::Scan(reference) => {
                self.only(id, &["location", "rotation"])?;
                set(&mut reference.position, &self.location);
                set(&mut reference.rotation, &self.rotation);
            }
        }

        if let Some(field) = next.data.invalid_attribute() {
            return Err(reject(field));
        }
        Ok(next)
    }

    /// Fails with the first populated type-specific field not in `allowed`.
    fn only(&self, id: NodeId, allowed: &[&'static str]) -> Result<()> {
        let populated: [(&'static str, bool); 12] = [
            ("name", self.name.is_some()),
            ("start", self.start.is_some()),
            ("end", self.end.is_some()),
            ("thickness", self.thickness.is_some()),
            ("height", self.height.is_some()),
            ("position", self.position.is_some()),
            ("width", self.width.is_some()),
            ("polygon", self.polygon.is_some()),
            ("location", self.location.is_some()),
            ("size", self.size.is_some()),
            ("rotation", self.rotation.is_some()),
            ("elevation", self.elevation.is_some()),
        ];
        match populated
            .iter()
            .find(|(field, is_set)| *is_set && !allowed.contains(field))
        {
            Some((field, _)) => Err(Error::InvalidPatch {
                node: id,
                field: *field,
            }),
            None => Ok(()),
        }
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}
