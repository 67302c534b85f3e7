//! Splinepath Core (engine-agnostic)
//!
//! Path graphs made of cubic Bezier ways joined at points, plus followers that
//! walk them at constant speed. This crate defines the track arena and its
//! editing operations, distance-based sampling, the follower state machine,
//! stored track JSON, and an Engine that steps followers once per host frame.

pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod follower;
pub mod geometry;
pub mod ids;
pub mod inputs;
pub mod math;
pub mod outputs;
pub mod point;
pub mod stored_track;
pub mod track;
pub mod way;

// Re-exports for consumers (adapters)
pub use config::Config;
pub use edit::HandleAlign;
pub use engine::{Engine, FollowerSlot};
pub use error::TrackError;
pub use follower::{BranchResolver, Follower, FollowerEvent, FollowerState, Pose, StopReason};
pub use geometry::CubicBezier;
pub use ids::{FollowerId, IdAllocator, PointId, TrackId, WayId};
pub use inputs::{FollowerCommand, Inputs};
pub use math::{look_rotation, Quat, TrackTransform, Vec3};
pub use outputs::{CoreEvent, Outputs, PoseChange};
pub use point::Point;
pub use stored_track::{parse_stored_track_json, to_stored_track_json, TrackData};
pub use track::Track;
pub use way::{Handle, Way, WayRef, WaySample};

pub type Result<T> = core::result::Result<T, TrackError>;
