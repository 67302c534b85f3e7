//! Track: owns every point and way and keeps their cross references consistent.
//!
//! Points and ways live in ordered arenas keyed by monotonic ids. Point index 0
//! is the start point; it exists from construction on and can never be deleted.
//! Back references (`Point::incident_ways`) and persisted handle indices are
//! rebuilt wholesale by `validate_structure`, never trusted blindly after
//! index-based edits.

use hashbrown::HashMap;
use log::debug;

use crate::config::Config;
use crate::error::TrackError;
use crate::ids::{IdAllocator, PointId, WayId};
use crate::math::{TrackTransform, Vec3};
use crate::point::Point;
use crate::way::{Handle, Way, WayRef};
use crate::Result;

#[derive(Clone, Debug)]
pub struct Track {
    pub name: String,
    /// Places track-local positions in the world.
    pub transform: TrackTransform,
    pub(crate) points: Vec<Point>,
    pub(crate) ways: Vec<Way>,
    pub(crate) point_slots: HashMap<PointId, usize>,
    pub(crate) way_slots: HashMap<WayId, usize>,
    pub(crate) ids: IdAllocator,
    pub(crate) length_samples: usize,
}

impl Default for Track {
    fn default() -> Self {
        Self::new()
    }
}

impl Track {
    /// A track holding only its start point, at the local origin.
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(cfg: &Config) -> Self {
        let mut track = Self::empty(cfg);
        track.new_point(Vec3::zeros());
        track
    }

    /// Arena without any point; callers must add the start point before
    /// handing the track out.
    pub(crate) fn empty(cfg: &Config) -> Self {
        Self {
            name: String::new(),
            transform: TrackTransform::identity(),
            points: Vec::new(),
            ways: Vec::new(),
            point_slots: HashMap::new(),
            way_slots: HashMap::new(),
            ids: IdAllocator::new(),
            length_samples: cfg.length_samples.max(1),
        }
    }

    #[inline]
    pub fn length_samples(&self) -> usize {
        self.length_samples
    }

    /// Changes the sampling density used by later length recomputations.
    pub fn set_length_samples(&mut self, samples: usize) {
        self.length_samples = samples.max(1);
    }

    // ----- lookup -----

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn way_count(&self) -> usize {
        self.ways.len()
    }

    /// Position of the point in the ordered point list.
    #[inline]
    pub fn point_index(&self, id: PointId) -> Option<usize> {
        self.point_slots.get(&id).copied()
    }

    #[inline]
    pub fn contains_point(&self, id: PointId) -> bool {
        self.point_slots.contains_key(&id)
    }

    #[inline]
    pub fn contains_way(&self, id: WayId) -> bool {
        self.way_slots.contains_key(&id)
    }

    pub(crate) fn point_slot(&self, id: PointId) -> Result<usize> {
        self.point_index(id).ok_or(TrackError::PointNotFound { id })
    }

    pub(crate) fn way_slot(&self, id: WayId) -> Result<usize> {
        self.way_slots
            .get(&id)
            .copied()
            .ok_or(TrackError::WayNotFound { id })
    }

    pub fn point(&self, id: PointId) -> Result<&Point> {
        let slot = self.point_slot(id)?;
        Ok(&self.points[slot])
    }

    /// Direct access to a point. Changing `position` obliges the caller to
    /// recompute the lengths of the incident ways.
    pub fn point_mut(&mut self, id: PointId) -> Result<&mut Point> {
        let slot = self.point_slot(id)?;
        Ok(&mut self.points[slot])
    }

    pub fn way(&self, id: WayId) -> Result<&Way> {
        let slot = self.way_slot(id)?;
        Ok(&self.ways[slot])
    }

    /// Direct access to a way. Changing a handle offset obliges the caller to
    /// recompute its length.
    pub fn way_mut(&mut self, id: WayId) -> Result<&mut Way> {
        let slot = self.way_slot(id)?;
        Ok(&mut self.ways[slot])
    }

    /// Element 0 of the point list.
    #[inline]
    pub fn start_point(&self) -> &Point {
        &self.points[0]
    }

    #[inline]
    pub fn start_point_id(&self) -> PointId {
        self.points[0].id
    }

    #[inline]
    pub fn is_start(&self, id: PointId) -> bool {
        self.points.first().map(|p| p.id) == Some(id)
    }

    /// First way registered on the start point.
    pub fn start_way(&self) -> Option<WayId> {
        self.start_point().incident_ways.first().copied()
    }

    /// First way joining `a` and `b` (in either orientation).
    pub fn way_between(&self, a: PointId, b: PointId) -> Option<WayId> {
        let point = self.point(a).ok()?;
        point.incident_ways.iter().copied().find(|w| {
            self.way(*w)
                .ok()
                .and_then(|way| way.other_point(a))
                .is_some_and(|other| other == b)
        })
    }

    /// Endpoint of `way` across from `point`.
    pub fn other_point(&self, way: WayId, point: PointId) -> Result<PointId> {
        self.way(way)?
            .other_point(point)
            .ok_or(TrackError::NotAnEndpoint { way, point })
    }

    /// True when a follower arriving at `point` over `previous_way` has
    /// nowhere left to go.
    pub fn is_end_point(&self, point: PointId, previous_way: Option<WayId>) -> Result<bool> {
        Ok(self.point(point)?.is_end_point(previous_way))
    }

    // ----- structural mutation -----

    /// Appends a point at a track-local position.
    pub fn new_point(&mut self, position: Vec3) -> PointId {
        let id = self.ids.alloc_point();
        self.point_slots.insert(id, self.points.len());
        self.points.push(Point::new(id, position));
        debug!("track '{}': new point {:?} at {:?}", self.name, id, position);
        id
    }

    pub fn new_named_point(&mut self, name: &str, position: Vec3) -> PointId {
        let id = self.new_point(position);
        if let Some(slot) = self.point_index(id) {
            self.points[slot].name = name.to_string();
        }
        id
    }

    /// Removes a point together with every way touching it. The neighbours
    /// are not reconnected. The start point is refused.
    pub fn delete_point(&mut self, id: PointId) -> Result<()> {
        let slot = self.point_slot(id)?;
        if slot == 0 {
            return Err(TrackError::invariant("the start point cannot be deleted"));
        }

        let doomed = self.points[slot].distinct_ways();
        for point in &mut self.points {
            point.incident_ways.retain(|w| !doomed.contains(w));
        }
        self.ways.retain(|w| !doomed.contains(&w.id));
        self.points.remove(slot);

        self.reindex();
        self.sync_point_indices();
        debug!(
            "track '{}': deleted point {:?} and {} way(s)",
            self.name,
            id,
            doomed.len()
        );
        Ok(())
    }

    /// Connects two points with a new way and registers it on both. Parallel
    /// and self-loop ways are accepted. The new way has zero handle offsets
    /// and a zero length until `recompute_length` runs.
    pub fn new_way(&mut self, head: PointId, tail: PointId) -> Result<WayId> {
        let head_slot = self.point_slot(head)?;
        let tail_slot = self.point_slot(tail)?;

        let id = self.ids.alloc_way();
        let way = Way::new(
            id,
            Handle::new(head, head_slot),
            Handle::new(tail, tail_slot),
        );
        self.points[head_slot].incident_ways.push(id);
        self.points[tail_slot].incident_ways.push(id);
        self.way_slots.insert(id, self.ways.len());
        self.ways.push(way);
        debug!(
            "track '{}': new way {:?} {:?} -> {:?}",
            self.name, id, head, tail
        );
        Ok(id)
    }

    /// Unregisters a way from its endpoints and drops it.
    pub fn delete_way(&mut self, id: WayId) -> Result<()> {
        let slot = self.way_slot(id)?;
        let way = self.ways.remove(slot);
        for endpoint in [way.head.point, way.tail.point] {
            if let Some(point_slot) = self.point_index(endpoint) {
                self.points[point_slot].incident_ways.retain(|w| *w != id);
            }
        }
        self.reindex();
        debug!("track '{}': deleted way {:?}", self.name, id);
        Ok(())
    }

    /// Restores every cross reference from the persisted handle indices:
    /// rebinds each handle to the point at its `point_index` and rebuilds
    /// each point's incident list from `ways`. Must run after deserialization
    /// or any index-based bulk edit. Idempotent. On an out-of-range index the
    /// track is left untouched.
    pub fn validate_structure(&mut self) -> Result<()> {
        self.reindex();

        let len = self.points.len();
        let resolve = |index: usize| -> Result<PointId> {
            self.points
                .get(index)
                .map(|p| p.id)
                .ok_or(TrackError::PointIndexOutOfRange { index, len })
        };
        let mut resolved = Vec::with_capacity(self.ways.len());
        for way in &self.ways {
            resolved.push((resolve(way.head.point_index)?, resolve(way.tail.point_index)?));
        }

        for point in &mut self.points {
            point.incident_ways.clear();
        }
        for (way, (head, tail)) in self.ways.iter_mut().zip(resolved) {
            way.head.point = head;
            way.tail.point = tail;
            self.points[way.head.point_index].incident_ways.push(way.id);
            self.points[way.tail.point_index].incident_ways.push(way.id);
        }
        Ok(())
    }

    /// Refreshes every handle's persisted `point_index` from its live point.
    /// Runs automatically after point deletion.
    pub fn sync_point_indices(&mut self) {
        for way in &mut self.ways {
            for handle in [&mut way.head, &mut way.tail] {
                if let Some(index) = self.point_slots.get(&handle.point) {
                    handle.point_index = *index;
                }
            }
        }
    }

    fn reindex(&mut self) {
        self.point_slots.clear();
        for (slot, p) in self.points.iter().enumerate() {
            self.point_slots.insert(p.id, slot);
        }
        self.way_slots.clear();
        for (slot, w) in self.ways.iter().enumerate() {
            self.way_slots.insert(w.id, slot);
        }
    }

    // ----- geometry -----

    /// A way with both endpoint positions resolved, ready for curve queries.
    pub fn way_ref(&self, id: WayId) -> Result<WayRef<'_>> {
        let way = self.way(id)?;
        let head = self.point(way.head.point)?.position;
        let tail = self.point(way.tail.point)?.position;
        Ok(WayRef::new(way, head, tail))
    }

    /// Re-approximates the arc length of one way and caches it.
    pub fn recompute_length(&mut self, id: WayId) -> Result<f32> {
        let length = self
            .way_ref(id)?
            .curve()
            .approximate_length(self.length_samples);
        let slot = self.way_slot(id)?;
        self.ways[slot].length = length;
        Ok(length)
    }

    /// Recomputes every way touching `point`.
    pub fn recompute_lengths_at(&mut self, point: PointId) -> Result<()> {
        let ways = self.point(point)?.distinct_ways();
        for way in ways {
            self.recompute_length(way)?;
        }
        Ok(())
    }

    pub fn recompute_all_lengths(&mut self) -> Result<()> {
        let ids: Vec<WayId> = self.ways.iter().map(|w| w.id).collect();
        for id in ids {
            self.recompute_length(id)?;
        }
        Ok(())
    }

    /// Moves a point and refreshes the lengths that depend on it.
    pub fn move_point(&mut self, id: PointId, position: Vec3) -> Result<()> {
        self.point_mut(id)?.position = position;
        self.recompute_lengths_at(id)
    }

    /// Sets the handle of `way` at `point` and refreshes the way's length.
    pub fn set_handle_offset(&mut self, way: WayId, point: PointId, offset: Vec3) -> Result<()> {
        let handle = self
            .way_mut(way)?
            .handle_mut(point)
            .ok_or(TrackError::NotAnEndpoint { way, point })?;
        handle.offset = offset;
        self.recompute_length(way)?;
        Ok(())
    }

    pub fn world_position(&self, id: PointId) -> Result<Vec3> {
        let local = self.point(id)?.position;
        Ok(self.transform.transform_point(&local))
    }

    pub fn set_world_position(&mut self, id: PointId, world: Vec3) -> Result<()> {
        let local = self.transform.inverse_transform_point(&world);
        self.move_point(id, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_track_has_a_start_point() {
        let t = Track::new();
        assert_eq!(t.point_count(), 1);
        assert!(t.is_start(t.start_point_id()));
        assert_eq!(t.start_way(), None);
    }

    #[test]
    fn slots_follow_removals() {
        let mut t = Track::new();
        let a = t.start_point_id();
        let b = t.new_point(Vec3::new(1.0, 0.0, 0.0));
        let c = t.new_point(Vec3::new(2.0, 0.0, 0.0));
        let bc = t.new_way(b, c).unwrap();
        t.delete_point(b).unwrap();
        assert_eq!(t.point_index(a), Some(0));
        assert_eq!(t.point_index(c), Some(1));
        assert!(!t.contains_way(bc));
        assert!(t.point(c).unwrap().incident_ways().is_empty());
    }

    #[test]
    fn way_between_finds_either_orientation() {
        let mut t = Track::new();
        let a = t.start_point_id();
        let b = t.new_point(Vec3::new(1.0, 0.0, 0.0));
        let w = t.new_way(a, b).unwrap();
        assert_eq!(t.way_between(a, b), Some(w));
        assert_eq!(t.way_between(b, a), Some(w));
        assert_eq!(t.way_between(a, a), None);
    }
}
