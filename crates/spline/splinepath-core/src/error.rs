//! Error types for track editing, geometry queries and the engine.

use crate::ids::{FollowerId, PointId, TrackId, WayId};

/// Every failure reported by this crate. All variants are local and
/// recoverable; nothing here is meant to abort the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TrackError {
    /// A point id that is stale or belongs to another track.
    #[error("Point not found: {id:?}")]
    PointNotFound { id: PointId },

    /// A way id that is stale or belongs to another track.
    #[error("Way not found: {id:?}")]
    WayNotFound { id: WayId },

    /// A persisted handle index that does not address a point.
    #[error("Point index {index} out of range (track has {len} points)")]
    PointIndexOutOfRange { index: usize, len: usize },

    /// The point is neither the head nor the tail of the way.
    #[error("Point {point:?} is not an endpoint of way {way:?}")]
    NotAnEndpoint { way: WayId, point: PointId },

    /// The operation would break a structural invariant and was not performed.
    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// A distance query past the cached length of a way.
    #[error("Distance {distance} is outside way length {length}")]
    DistanceOutOfRange { distance: f32, length: f32 },

    #[error("Track not found: {id:?}")]
    TrackNotFound { id: TrackId },

    #[error("Follower not found: {id:?}")]
    FollowerNotFound { id: FollowerId },

    /// Stored track JSON could not be read or written.
    #[error("Stored track error: {reason}")]
    Parse { reason: String },
}

impl TrackError {
    pub(crate) fn invariant(reason: impl Into<String>) -> Self {
        TrackError::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// True for the stale-identifier family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TrackError::PointNotFound { .. }
                | TrackError::WayNotFound { .. }
                | TrackError::PointIndexOutOfRange { .. }
                | TrackError::TrackNotFound { .. }
                | TrackError::FollowerNotFound { .. }
        )
    }
}
