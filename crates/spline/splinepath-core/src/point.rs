//! Graph vertices.

use crate::ids::{PointId, WayId};
use crate::math::Vec3;

/// A vertex of the track. `incident_ways` holds back references only; the
/// track owns every way and rebuilds this list in `validate_structure`.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub(crate) id: PointId,
    /// Optional label, empty when unnamed.
    pub name: String,
    /// Track-local position. Writers must recompute the lengths of every
    /// incident way afterwards (`Track::move_point` does both).
    pub position: Vec3,
    pub(crate) incident_ways: Vec<WayId>,
}

impl Point {
    pub(crate) fn new(id: PointId, position: Vec3) -> Self {
        Self {
            id,
            name: String::new(),
            position,
            incident_ways: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> PointId {
        self.id
    }

    /// Ways whose head or tail is this point, in registration order.
    /// A self-loop way is listed twice.
    #[inline]
    pub fn incident_ways(&self) -> &[WayId] {
        &self.incident_ways
    }

    #[inline]
    pub fn link_count(&self) -> usize {
        self.incident_ways.len()
    }

    /// True when nothing leads on from here after arriving over `previous_way`.
    pub fn is_end_point(&self, previous_way: Option<WayId>) -> bool {
        match self.incident_ways.as_slice() {
            [] => true,
            [only] => Some(*only) == previous_way,
            _ => false,
        }
    }

    /// Incident ways without the duplicate entry a self-loop produces.
    pub(crate) fn distinct_ways(&self) -> Vec<WayId> {
        let mut out: Vec<WayId> = Vec::with_capacity(self.incident_ways.len());
        for w in &self.incident_ways {
            if !out.contains(w) {
                out.push(*w);
            }
        }
        out
    }
}
