//! Output contracts from the engine.
//!
//! Outputs carry the poses that changed this tick and a separate list of
//! semantic events. Hosts apply poses to their scene objects.

use serde::{Deserialize, Serialize};

use crate::follower::{Pose, StopReason};
use crate::ids::{FollowerId, PointId, TrackId, WayId};

/// New world pose of one follower this tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoseChange {
    pub follower: FollowerId,
    pub pose: Pose,
}

/// Discrete signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    FollowerReady {
        follower: FollowerId,
        track: TrackId,
    },
    WayEntered {
        follower: FollowerId,
        way: WayId,
        from: PointId,
    },
    PointReached {
        follower: FollowerId,
        point: PointId,
        via: WayId,
    },
    FollowerStopped {
        follower: FollowerId,
        reason: StopReason,
    },
    Error {
        message: String,
    },
}

/// Outputs returned by Engine::update().
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub poses: Vec<PoseChange>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
    /// Events discarded this tick because of `Config::max_events_per_tick`.
    #[serde(default)]
    pub dropped_events: usize,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.poses.clear();
        self.events.clear();
        self.dropped_events = 0;
    }

    #[inline]
    pub fn push_pose(&mut self, change: PoseChange) {
        self.poses.push(change);
    }

    /// Appends an event unless the per-tick budget is spent.
    #[inline]
    pub fn push_event(&mut self, event: CoreEvent, cap: usize) {
        if self.events.len() < cap {
            self.events.push(event);
        } else {
            self.dropped_events += 1;
        }
    }

    pub fn pose_of(&self, follower: FollowerId) -> Option<&PoseChange> {
        self.poses.iter().find(|p| p.follower == follower)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty() && self.events.is_empty()
    }
}
