// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Junction detection and miter corners.
//!
//! A junction is a point where at least two wall ends meet, with "meet"
//! meaning their coordinates snap to the same [`JunctionKey`]. Around each
//! junction the walls are ordered counter-clockwise by the angle of their
//! outgoing direction (pointing away from the junction into the wall). For
//! every cyclically adjacent pair `(a, b)`, the left offset edge of `a` is
//! intersected with the right offset edge of `b`; the intersection closes the
//! gap between the two walls and becomes the left corner of `a` and the right
//! corner of `b` at this junction.
//!
//! Offset edges are parallel when the two walls continue each other in a
//! straight line. Each wall then keeps its own unmitered offset point.
//!
//! Exactly equal angles (overlapping walls) keep their input order.

use floorplan_core::NodeId;
use nalgebra::{Point2, Vector2};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::segment::{WallEnd, WallSegment};
use crate::transform::{cross, left_normal};

/// Determinant below which two edge lines are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Snapped junction position: coordinates divided by the snapping tolerance,
/// rounded to the nearest integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JunctionKey {
    pub x: i64,
    pub y: i64,
}

impl JunctionKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Key of the snapping cell `p` rounds to.
    pub fn snap(p: &Point2<f64>, tolerance: f64) -> Self {
        Self {
            x: (p.x / tolerance).round() as i64,
            y: (p.y / tolerance).round() as i64,
        }
    }
}

/// Boundary corners of one wall end, in world coordinates.
///
/// `left` lies on the wall's local +Y side (left of `start -> end`) and
/// `right` on its -Y side, regardless of which end of the wall is at the
/// junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiterCorner {
    pub left: Point2<f64>,
    pub right: Point2<f64>,
}

/// One wall end participating in a junction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JunctionEnd {
    pub wall: NodeId,
    pub end: WallEnd,
    pub corner: MiterCorner,
}

/// A resolved junction.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub key: JunctionKey,
    /// Mean of the participating endpoints; shared apex of every wall fan.
    pub center: Point2<f64>,
    /// Counter-clockwise by outgoing direction.
    pub ends: SmallVec<[JunctionEnd; 4]>,
}

impl Junction {
    /// Corners of `wall` at this junction (the first of its ends, should both
    /// ends of a very short wall snap here).
    pub fn corner(&self, wall: NodeId) -> Option<&MiterCorner> {
        self.ends.iter().find(|e| e.wall == wall).map(|e| &e.corner)
    }

    pub fn contains(&self, wall: NodeId) -> bool {
        self.ends.iter().any(|e| e.wall == wall)
    }

    pub fn walls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ends.iter().map(|e| e.wall)
    }
}

/// All junctions of one level, addressable by key and by wall end.
#[derive(Debug, Clone, Default)]
pub struct JunctionMap {
    junctions: FxHashMap<JunctionKey, Junction>,
    by_end: FxHashMap<(NodeId, WallEnd), JunctionKey>,
}

impl JunctionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, junction: Junction) {
        for end in &junction.ends {
            self.by_end.insert((end.wall, end.end), junction.key);
        }
        self.junctions.insert(junction.key, junction);
    }

    pub fn get(&self, key: &JunctionKey) -> Option<&Junction> {
        self.junctions.get(key)
    }

    /// The `(junctionKey, wallId) -> {left, right}` lookup.
    pub fn corner(&self, key: &JunctionKey, wall: NodeId) -> Option<&MiterCorner> {
        self.junctions.get(key).and_then(|j| j.corner(wall))
    }

    /// Junction and corners at one specific end of `wall`, if that end is
    /// part of a junction.
    pub fn at_end(&self, wall: NodeId, end: WallEnd) -> Option<(&Junction, &MiterCorner)> {
        let key = self.by_end.get(&(wall, end))?;
        let junction = self.junctions.get(key)?;
        let corner = junction
            .ends
            .iter()
            .find(|e| e.wall == wall && e.end == end)
            .map(|e| &e.corner)?;
        Some((junction, corner))
    }

    /// Keys of the junctions `wall` takes part in.
    pub fn keys_of(&self, wall: NodeId) -> SmallVec<[JunctionKey; 2]> {
        [WallEnd::Start, WallEnd::End]
            .iter()
            .filter_map(|end| self.by_end.get(&(wall, *end)).copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Junction> {
        self.junctions.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &JunctionKey> {
        self.junctions.keys()
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    /// Same junctions, same participating wall ends, and every corner and
    /// centre within `epsilon`.
    pub fn approx_eq(&self, other: &JunctionMap, epsilon: f64) -> bool {
        if self.len() != other.len() || self.by_end.len() != other.by_end.len() {
            return false;
        }
        let close = |a: &Point2<f64>, b: &Point2<f64>| (a - b).norm() <= epsilon;
        self.junctions.iter().all(|(key, mine)| {
            let Some(theirs) = other.junctions.get(key) else {
                return false;
            };
            close(&mine.center, &theirs.center)
                && mine.ends.len() == theirs.ends.len()
                && mine.ends.iter().all(|e| {
                    other.at_end(e.wall, e.end).is_some_and(|(_, c)| {
                        close(&e.corner.left, &c.left) && close(&e.corner.right, &c.right)
                    })
                })
        })
    }
}

/// Output of [`resolve_junctions`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub junctions: JunctionMap,
    /// Walls shorter than the tolerance, left out of every junction.
    pub degenerate: Vec<NodeId>,
}

/// One wall end as seen from a junction.
#[derive(Debug, Clone, Copy)]
struct Arm {
    wall: NodeId,
    end: WallEnd,
    point: Point2<f64>,
    outgoing: Vector2<f64>,
    half_thickness: f64,
    angle: f64,
}

impl Arm {
    fn left_anchor(&self) -> Point2<f64> {
        self.point + left_normal(&self.outgoing) * self.half_thickness
    }

    fn right_anchor(&self) -> Point2<f64> {
        self.point - left_normal(&self.outgoing) * self.half_thickness
    }
}

/// Resolves every junction among `segments` (normally all walls of a level).
pub fn resolve_junctions(segments: &[WallSegment], tolerance: f64) -> Resolution {
    let mut groups: FxHashMap<JunctionKey, SmallVec<[Arm; 4]>> = FxHashMap::default();
    let mut degenerate = Vec::new();

    for segment in segments {
        if segment.is_degenerate(tolerance) {
            debug!(wall = ?segment.wall, length = segment.length(), "excluding degenerate wall");
            degenerate.push(segment.wall);
            continue;
        }
        for end in [WallEnd::Start, WallEnd::End] {
            let Some(outgoing) = segment.outgoing(end) else {
                continue;
            };
            let point = segment.point(end);
            groups
                .entry(JunctionKey::snap(&point, tolerance))
                .or_default()
                .push(Arm {
                    wall: segment.wall,
                    end,
                    point,
                    outgoing,
                    half_thickness: segment.thickness / 2.0,
                    angle: outgoing.y.atan2(outgoing.x),
                });
        }
    }

    let mut junctions = JunctionMap::new();
    for (key, mut arms) in groups {
        if arms.len() < 2 {
            continue;
        }
        arms.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        junctions.insert(resolve_one(key, &arms));
    }

    Resolution {
        junctions,
        degenerate,
    }
}

/// Miters one junction. `arms` must be sorted by angle.
fn resolve_one(key: JunctionKey, arms: &[Arm]) -> Junction {
    let n = arms.len();
    let sum = arms
        .iter()
        .fold(Vector2::zeros(), |acc, arm| acc + arm.point.coords);
    let center = Point2::from(sum / n as f64);

    // Corners relative to each arm's outgoing direction.
    let mut left = vec![Point2::origin(); n];
    let mut right = vec![Point2::origin(); n];
    for i in 0..n {
        let j = (i + 1) % n;
        let (a_left, b_right) = miter(&arms[i], &arms[j]);
        left[i] = a_left;
        right[j] = b_right;
    }

    let ends = arms
        .iter()
        .enumerate()
        .map(|(i, arm)| {
            // Looking outward from the end of a wall reverses its left/right.
            let corner = match arm.end {
                WallEnd::Start => MiterCorner {
                    left: left[i],
                    right: right[i],
                },
                WallEnd::End => MiterCorner {
                    left: right[i],
                    right: left[i],
                },
            };
            JunctionEnd {
                wall: arm.wall,
                end: arm.end,
                corner,
            }
        })
        .collect();

    trace!(?key, arms = n, "resolved junction");
    Junction { key, center, ends }
}

/// Corner between `a` and the next arm counter-clockwise, `b`: returns
/// `(a's left corner, b's right corner)`.
fn miter(a: &Arm, b: &Arm) -> (Point2<f64>, Point2<f64>) {
    let pa = a.left_anchor();
    let pb = b.right_anchor();
    let det = cross(&a.outgoing, &b.outgoing);
    if det.abs() < PARALLEL_EPSILON {
        trace!(a = ?a.wall, b = ?b.wall, "parallel edges, keeping unmitered corners");
        return (pa, pb);
    }
    let s = cross(&(pb - pa), &b.outgoing) / det;
    let p = pa + a.outgoing * s;
    (p, p)
}
