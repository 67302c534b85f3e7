//! Editing operations used by interactive tools.
//!
//! These compose the structural primitives of [`Track`] the way an editor
//! does and keep cached lengths current, so callers only need to pick ids.

use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::ids::{PointId, WayId};
use crate::math::{Vec3, DIRECTION_EPSILON};
use crate::track::Track;
use crate::Result;

/// Fraction of the chord used for both handles of a freshly extended way.
const EXTEND_HANDLE_RATIO: f32 = 0.2;

/// How sibling handles follow the reference handle in [`Track::align_handles`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleAlign {
    /// Keep each handle's own length, only adopt the direction.
    #[default]
    KeepLength,
    /// Adopt both direction and length of the reference handle.
    MatchLength,
}

impl Track {
    /// Extends the track from `from` with a new point at `position`.
    /// Handles point along the chord at a fifth of its length, and the
    /// other handles at `from` are aligned to keep the joint smooth.
    pub fn add_point(&mut self, from: PointId, position: Vec3) -> Result<(PointId, WayId)> {
        let origin = self.point(from)?.position;
        let point = self.new_point(position);
        let way = self.new_way(from, point)?;

        let chord = position - origin;
        {
            let w = self.way_mut(way)?;
            w.head.offset = chord * EXTEND_HANDLE_RATIO;
            w.tail.offset = -chord * EXTEND_HANDLE_RATIO;
        }
        self.align_handles(from, way, HandleAlign::KeepLength)?;
        self.recompute_length(way)?;
        Ok((point, way))
    }

    /// Splits `way` with a new point at `position`. The outer handles are
    /// kept; the inner handles follow the unit `tangent` (falling back to the
    /// chord when the tangent is degenerate). The split way is deleted.
    pub fn insert_point(&mut self, way: WayId, position: Vec3, tangent: Vec3) -> Result<PointId> {
        let (head, tail, head_offset, tail_offset) = {
            let w = self.way(way)?;
            (w.head.point, w.tail.point, w.head.offset, w.tail.offset)
        };
        let chord = self.point(tail)?.position - self.point(head)?.position;
        let tangent = tangent
            .try_normalize(DIRECTION_EPSILON)
            .or_else(|| chord.try_normalize(DIRECTION_EPSILON))
            .unwrap_or_else(Vec3::x);

        let point = self.new_point(position);
        let first = self.new_way(head, point)?;
        {
            let w = self.way_mut(first)?;
            w.head.offset = head_offset;
            w.tail.offset = -tangent;
        }
        let second = self.new_way(point, tail)?;
        {
            let w = self.way_mut(second)?;
            w.head.offset = tangent;
            w.tail.offset = tail_offset;
        }
        self.delete_way(way)?;
        self.recompute_length(first)?;
        self.recompute_length(second)?;
        Ok(point)
    }

    /// Splits `way` at curve parameter `t`, using the curve tangent there.
    pub fn insert_point_at(&mut self, way: WayId, t: f32) -> Result<PointId> {
        let (position, tangent) = {
            let r = self.way_ref(way)?;
            let t = t.clamp(0.0, 1.0);
            (r.position(t), r.direction(t))
        };
        self.insert_point(way, position, tangent)
    }

    /// Deletes `point`. When it joins exactly two distinct ways, its two
    /// neighbours are first bridged by a new way that keeps their outer
    /// handles. Returns the bridging way, if one was made.
    pub fn dissolve_point(&mut self, point: PointId) -> Result<Option<WayId>> {
        if self.is_start(point) {
            return Err(TrackError::invariant("the start point cannot be deleted"));
        }
        let links = self.point(point)?.incident_ways.clone();

        let mut bridge = None;
        if let [head_way, tail_way] = *links.as_slice() {
            if head_way != tail_way {
                let head_point = self.other_point(head_way, point)?;
                let tail_point = self.other_point(tail_way, point)?;
                let head_offset = outer_offset(self, head_way, head_point)?;
                let tail_offset = outer_offset(self, tail_way, tail_point)?;

                let way = self.new_way(head_point, tail_point)?;
                let w = self.way_mut(way)?;
                w.head.offset = head_offset;
                w.tail.offset = tail_offset;
                bridge = Some(way);
            }
        }

        self.delete_point(point)?;
        if let Some(way) = bridge {
            self.recompute_length(way)?;
        }
        Ok(bridge)
    }

    /// Connects two existing points with a way whose handles are the unit
    /// chord. Refuses to link a pair that is already linked.
    pub fn link_points(&mut self, from: PointId, to: PointId) -> Result<WayId> {
        if self.way_between(from, to).is_some() {
            return Err(TrackError::invariant(format!(
                "{from:?} and {to:?} are already linked"
            )));
        }
        let way = self.new_way(from, to)?;
        self.make_linear(way)?;
        Ok(way)
    }

    /// Removes a way, leaving both endpoints in place.
    pub fn unlink_way(&mut self, way: WayId) -> Result<()> {
        self.delete_way(way)
    }

    /// Resets both handles to the unit chord, giving a straight way.
    pub fn make_linear(&mut self, way: WayId) -> Result<()> {
        let (head, tail) = {
            let w = self.way(way)?;
            (w.head.point, w.tail.point)
        };
        let chord = self.point(tail)?.position - self.point(head)?.position;
        let dir = chord.try_normalize(DIRECTION_EPSILON).unwrap_or_else(Vec3::zeros);
        {
            let w = self.way_mut(way)?;
            w.head.offset = dir;
            w.tail.offset = -dir;
        }
        self.recompute_length(way)?;
        Ok(())
    }

    /// Turns every other handle at `point` onto the line of the handle that
    /// `reference` has there, keeping each handle on its own side.
    pub fn align_handles(
        &mut self,
        point: PointId,
        reference: WayId,
        mode: HandleAlign,
    ) -> Result<()> {
        let reference_offset = self
            .way(reference)?
            .handle(point)
            .map(|h| h.offset)
            .ok_or(TrackError::NotAnEndpoint {
                way: reference,
                point,
            })?;
        let Some(axis) = reference_offset.try_normalize(DIRECTION_EPSILON) else {
            return Ok(());
        };

        let siblings = self.point(point)?.distinct_ways();
        for way in siblings {
            if way == reference {
                continue;
            }
            if let Some(handle) = self.way_mut(way)?.handle_mut(point) {
                let sign = if handle.offset.dot(&reference_offset) > 0.0 {
                    1.0
                } else {
                    -1.0
                };
                let length = match mode {
                    HandleAlign::KeepLength => handle.offset.norm(),
                    HandleAlign::MatchLength => reference_offset.norm(),
                };
                handle.offset = axis * (sign * length);
            }
        }
        self.recompute_lengths_at(point)
    }

    /// Moves several points by the same delta, then refreshes affected lengths.
    pub fn translate_points(&mut self, points: &[PointId], delta: Vec3) -> Result<()> {
        for id in points {
            self.point_mut(*id)?.position += delta;
        }
        for id in points {
            self.recompute_lengths_at(*id)?;
        }
        Ok(())
    }
}

fn outer_offset(track: &Track, way: WayId, point: PointId) -> Result<Vec3> {
    track
        .way(way)?
        .handle(point)
        .map(|h| h.offset)
        .ok_or(TrackError::NotAnEndpoint { way, point })
}
