//! Input contracts for the engine.
//!
//! Hosts build these and pass them into `Engine::update()` each frame; they
//! are applied before any follower advances.

use serde::{Deserialize, Serialize};

use crate::ids::{FollowerId, TrackId};
use crate::math::Vec3;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    /// Follower-level commands applied before stepping, in order.
    #[serde(default)]
    pub follower_cmds: Vec<FollowerCommand>,
}

impl Inputs {
    pub fn with(cmds: impl IntoIterator<Item = FollowerCommand>) -> Self {
        Self {
            follower_cmds: cmds.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FollowerCommand {
    /// Bind to a track and rewind to its start point (see `Follower::ready`).
    Ready {
        follower: FollowerId,
        track: TrackId,
        speed: f32,
        #[serde(default = "zero_offset")]
        offset: Vec3,
    },
    Play {
        follower: FollowerId,
        speed: f32,
    },
    Stop {
        follower: FollowerId,
    },
    SetSpeed {
        follower: FollowerId,
        speed: f32,
    },
    Detach {
        follower: FollowerId,
    },
}

fn zero_offset() -> Vec3 {
    Vec3::zeros()
}
