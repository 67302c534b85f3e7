//! Core configuration for splinepath-core.

use serde::{Deserialize, Serialize};

/// Number of equal parameter steps used to approximate a way's arc length.
pub const DEFAULT_LENGTH_SAMPLES: usize = 100;

/// Configuration shared by tracks, followers and the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parameter steps used by `Track::recompute_length`.
    pub length_samples: usize,

    /// Upper bound on the number of ways a single follower may cross in one tick.
    /// Guards against cycles of zero-length ways.
    pub max_ways_per_tick: usize,

    /// Maximum events to retain per engine tick; further events are dropped.
    pub max_events_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            length_samples: DEFAULT_LENGTH_SAMPLES,
            max_ways_per_tick: 64,
            max_events_per_tick: 1024,
        }
    }
}
