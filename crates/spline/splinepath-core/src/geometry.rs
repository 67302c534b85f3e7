//! Cubic Bezier evaluation for ways:
//! - position (Bernstein weighted sum)
//! - direction (first derivative, not normalized)
//! - polyline arc-length approximation

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// The four control points of one way, in track-local space.
///
/// `p1` and `p2` are absolute here; ways store them as handle offsets
/// relative to `p0` and `p3`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub p0: Vec3,
    pub p1: Vec3,
    pub p2: Vec3,
    pub p3: Vec3,
}

impl CubicBezier {
    /// Builds the curve from endpoint positions and their handle offsets.
    #[inline]
    pub fn from_handles(head: Vec3, head_offset: Vec3, tail: Vec3, tail_offset: Vec3) -> Self {
        Self {
            p0: head,
            p1: head + head_offset,
            p2: tail + tail_offset,
            p3: tail,
        }
    }

    /// Point on the curve at parameter `t` in [0,1].
    #[inline]
    pub fn position(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    /// First derivative at `t`. Its length depends on the handle lengths,
    /// so callers normalize when they need a unit tangent.
    #[inline]
    pub fn direction(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Sums the chords between `samples + 1` equally spaced parameter values.
    /// Never overestimates the true arc length; refining a sample set
    /// (e.g. doubling the count) never decreases the result.
    pub fn approximate_length(&self, samples: usize) -> f32 {
        let samples = samples.max(1);
        let mut length = 0.0f32;
        let mut from = self.p0;
        for i in 1..=samples {
            let to = self.position(i as f32 / samples as f32);
            length += (to - from).norm();
            from = to;
        }
        length
    }

    /// Same curve traversed from `p3` to `p0`.
    pub fn reversed(&self) -> Self {
        Self {
            p0: self.p3,
            p1: self.p2,
            p2: self.p1,
            p3: self.p0,
        }
    }
}
