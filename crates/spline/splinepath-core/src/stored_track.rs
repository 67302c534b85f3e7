//! Stored track JSON: the persisted shape of a track and its conversion to
//! and from the live arena.
//!
//! Notes:
//! - Handles reference points by `pointIndex` (position in `points`); runtime
//!   ids are not persisted and are freshly allocated on load.
//! - `length` is optional. Missing, negative or non-finite lengths are
//!   recomputed from the curve on load.
//! - The first entry of `points` becomes the start point, so it may not be empty.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::TrackError;
use crate::math::{TrackTransform, Vec3};
use crate::track::Track;
use crate::way::{Handle, Way};
use crate::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transform: TrackTransform,
    pub points: Vec<PointData>,
    #[serde(default)]
    pub ways: Vec<WayData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointData {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub position: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandleData {
    #[serde(rename = "pointIndex")]
    pub point_index: usize,
    #[serde(default = "Vec3::zeros")]
    pub offset: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WayData {
    pub head: HandleData,
    pub tail: HandleData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f32>,
}

impl Track {
    /// Snapshot of the track in its persisted shape.
    pub fn to_data(&self) -> TrackData {
        TrackData {
            name: self.name.clone(),
            transform: self.transform,
            points: self
                .points
                .iter()
                .map(|p| PointData {
                    name: p.name.clone(),
                    position: p.position,
                })
                .collect(),
            ways: self
                .ways
                .iter()
                .map(|w| WayData {
                    head: HandleData {
                        point_index: w.head.point_index,
                        offset: w.head.offset,
                    },
                    tail: HandleData {
                        point_index: w.tail.point_index,
                        offset: w.tail.offset,
                    },
                    length: Some(w.length),
                })
                .collect(),
        }
    }

    /// Rebuilds a live track: fresh ids, links restored by
    /// `validate_structure`, invalid lengths recomputed.
    pub fn from_data(data: &TrackData, cfg: &Config) -> Result<Track> {
        if data.points.is_empty() {
            return Err(TrackError::invariant("a stored track needs a start point"));
        }

        let mut track = Track::empty(cfg);
        track.name = data.name.clone();
        track.transform = data.transform;
        for p in &data.points {
            track.new_named_point(&p.name, p.position);
        }

        // Handles are bound to the start point until validation resolves
        // their indices.
        let placeholder = track.start_point_id();
        let mut stale = Vec::new();
        for wd in &data.ways {
            let id = track.ids.alloc_way();
            let mut way = Way::new(
                id,
                Handle::new(placeholder, wd.head.point_index),
                Handle::new(placeholder, wd.tail.point_index),
            );
            way.head.offset = wd.head.offset;
            way.tail.offset = wd.tail.offset;
            match wd.length {
                Some(length) if length.is_finite() && length >= 0.0 => way.length = length,
                _ => stale.push(id),
            }
            track.ways.push(way);
        }

        track.validate_structure()?;
        for id in stale {
            track.recompute_length(id)?;
        }
        Ok(track)
    }
}

/// Parses stored track JSON into a live track.
pub fn parse_stored_track_json(s: &str, cfg: &Config) -> Result<Track> {
    let data: TrackData = serde_json::from_str(s).map_err(|e| TrackError::Parse {
        reason: format!("parse error: {e}"),
    })?;
    Track::from_data(&data, cfg)
}

/// Serializes a track to pretty stored track JSON.
pub fn to_stored_track_json(track: &Track) -> Result<String> {
    serde_json::to_string_pretty(&track.to_data()).map_err(|e| TrackError::Parse {
        reason: format!("serialize error: {e}"),
    })
}
