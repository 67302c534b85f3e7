//! Identifiers and simple allocators for track entities.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PointId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WayId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FollowerId(pub u32);

/// Monotonic allocator for point, way, track and follower ids.
/// Ids are never handed out twice by the same allocator, so a removed
/// entity's id stays stale instead of aliasing a newer one.
#[derive(Default, Debug, Clone)]
pub struct IdAllocator {
    next_point: u32,
    next_way: u32,
    next_track: u32,
    next_follower: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_point(&mut self) -> PointId {
        let id = PointId(self.next_point);
        self.next_point = self.next_point.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_way(&mut self) -> WayId {
        let id = WayId(self.next_way);
        self.next_way = self.next_way.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_track(&mut self) -> TrackId {
        let id = TrackId(self.next_track);
        self.next_track = self.next_track.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_follower(&mut self) -> FollowerId {
        let id = FollowerId(self.next_follower);
        self.next_follower = self.next_follower.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
