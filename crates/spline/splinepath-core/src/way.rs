//! Ways (cubic Bezier edges), their handles, and distance-based sampling.

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::geometry::CubicBezier;
use crate::ids::{PointId, WayId};
use crate::math::Vec3;
use crate::Result;

/// Control tangent at one end of a way.
///
/// `point` is the live reference used at runtime; `point_index` is the
/// persisted position of that point in the track's point list and is
/// re-resolved by `Track::validate_structure`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handle {
    pub(crate) point: PointId,
    pub(crate) point_index: usize,
    /// Offset of the Bezier control point from the endpoint, track-local.
    pub offset: Vec3,
}

impl Handle {
    pub(crate) fn new(point: PointId, point_index: usize) -> Self {
        Self {
            point,
            point_index,
            offset: Vec3::zeros(),
        }
    }

    #[inline]
    pub fn point(&self) -> PointId {
        self.point
    }

    #[inline]
    pub fn point_index(&self) -> usize {
        self.point_index
    }
}

/// An edge between two points. Owns both handles; never owns the points.
#[derive(Clone, Debug, PartialEq)]
pub struct Way {
    pub(crate) id: WayId,
    pub head: Handle,
    pub tail: Handle,
    pub(crate) length: f32,
}

impl Way {
    pub(crate) fn new(id: WayId, head: Handle, tail: Handle) -> Self {
        Self {
            id,
            head,
            tail,
            length: 0.0,
        }
    }

    #[inline]
    pub fn id(&self) -> WayId {
        self.id
    }

    #[inline]
    pub fn head_point(&self) -> PointId {
        self.head.point
    }

    #[inline]
    pub fn tail_point(&self) -> PointId {
        self.tail.point
    }

    /// Cached arc length, refreshed by `Track::recompute_length`.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn contains(&self, point: PointId) -> bool {
        self.head.point == point || self.tail.point == point
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.head.point == self.tail.point
    }

    /// Endpoint across the way from `point`, `None` if `point` is not an endpoint.
    pub fn other_point(&self, point: PointId) -> Option<PointId> {
        if point == self.head.point {
            Some(self.tail.point)
        } else if point == self.tail.point {
            Some(self.head.point)
        } else {
            None
        }
    }

    /// Handle at `point`. For a self-loop this is the head handle.
    pub fn handle(&self, point: PointId) -> Option<&Handle> {
        if point == self.head.point {
            Some(&self.head)
        } else if point == self.tail.point {
            Some(&self.tail)
        } else {
            None
        }
    }

    pub fn handle_mut(&mut self, point: PointId) -> Option<&mut Handle> {
        if point == self.head.point {
            Some(&mut self.head)
        } else if point == self.tail.point {
            Some(&mut self.tail)
        } else {
            None
        }
    }
}

/// Position and (unnormalized) travel direction at a distance along a way.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaySample {
    pub position: Vec3,
    pub direction: Vec3,
}

/// Read-only view of a way with its endpoint positions resolved.
#[derive(Clone, Copy, Debug)]
pub struct WayRef<'a> {
    way: &'a Way,
    curve: CubicBezier,
}

impl<'a> WayRef<'a> {
    pub(crate) fn new(way: &'a Way, head_position: Vec3, tail_position: Vec3) -> Self {
        let curve = CubicBezier::from_handles(
            head_position,
            way.head.offset,
            tail_position,
            way.tail.offset,
        );
        Self { way, curve }
    }

    #[inline]
    pub fn way(&self) -> &'a Way {
        self.way
    }

    #[inline]
    pub fn id(&self) -> WayId {
        self.way.id
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.way.length
    }

    #[inline]
    pub fn curve(&self) -> &CubicBezier {
        &self.curve
    }

    #[inline]
    pub fn position(&self, t: f32) -> Vec3 {
        self.curve.position(t)
    }

    #[inline]
    pub fn direction(&self, t: f32) -> Vec3 {
        self.curve.direction(t)
    }

    /// Samples the way `distance` units away from endpoint `from`.
    ///
    /// Distance maps linearly onto the curve parameter (`t = distance / length`),
    /// which is not a true arc-length parameterization: speed along sharply
    /// curved ways is slightly uneven. Starting from the tail flips both the
    /// parameter and the direction so the direction always points away from
    /// `from`. For a self-loop the head interpretation wins.
    pub fn sample_from(&self, from: PointId, distance: f32) -> Result<WaySample> {
        let from_tail = if from == self.way.head.point {
            false
        } else if from == self.way.tail.point {
            true
        } else {
            return Err(TrackError::NotAnEndpoint {
                way: self.way.id,
                point: from,
            });
        };

        let length = self.way.length;
        if !(0.0..=length).contains(&distance) {
            return Err(TrackError::DistanceOutOfRange { distance, length });
        }

        let along = if from_tail { length - distance } else { distance };
        let t = if length > 0.0 {
            (along / length).clamp(0.0, 1.0)
        } else if from_tail {
            1.0
        } else {
            0.0
        };

        let position = self.curve.position(t);
        let direction = self.curve.direction(t);
        Ok(WaySample {
            position,
            direction: if from_tail { -direction } else { direction },
        })
    }

    /// `sample_from` without the failure detail: `None` past the way's length.
    #[inline]
    pub fn length_between(&self, from: PointId, distance: f32) -> Option<WaySample> {
        self.sample_from(from, distance).ok()
    }
}
