//! Follower: a constant-speed agent walking the ways of a track.
//!
//! The traversal is an explicit state machine. Everything needed to resume
//! (current point, chosen way, previous way, distance into the way) is kept on
//! the follower between ticks; the track is borrowed only for the duration of
//! a tick, so edits can never race a pose evaluation.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ids::{PointId, WayId};
use crate::math::{look_rotation, Quat, Vec3};
use crate::track::Track;

/// Picks the way to take when a follower stands on a point.
///
/// Called once per decision with the point and the way the follower arrived
/// by (`None` at the start point). Returning `None`, or a way that does not
/// touch the point, falls back to the first incident way other than the
/// previous one.
pub trait BranchResolver {
    fn resolve(
        &mut self,
        track: &Track,
        point: PointId,
        previous_way: Option<WayId>,
    ) -> Option<WayId>;
}

impl<F> BranchResolver for F
where
    F: FnMut(&Track, PointId, Option<WayId>) -> Option<WayId>,
{
    fn resolve(
        &mut self,
        track: &Track,
        point: PointId,
        previous_way: Option<WayId>,
    ) -> Option<WayId> {
        self(track, point, previous_way)
    }
}

/// Why a follower stopped traversing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No way leads on from the current point.
    DeadEnd,
    /// The bound track is gone.
    TrackMissing,
    /// The cursor references a point or way that no longer exists.
    StaleCursor,
}

/// Observable traversal state.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FollowerState {
    Detached,
    AtPoint { point: PointId },
    OnWay { point: PointId, way: WayId, distance: f32 },
    Stopped { point: Option<PointId>, reason: StopReason },
}

/// World-space placement of the follower.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
        }
    }
}

/// Things that happened during one `advance` call, in order.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FollowerEvent {
    WayEntered { way: WayId, from: PointId },
    PointReached { point: PointId, via: WayId },
    Stopped { reason: StopReason },
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Phase {
    Detached,
    Traversing,
    Stopped(StopReason),
}

pub struct Follower {
    phase: Phase,
    current_point: Option<PointId>,
    current_way: Option<WayId>,
    previous_way: Option<WayId>,
    distance_on_way: f32,
    speed: f32,
    lateral_offset: Vec3,
    playing: bool,
    pose: Pose,
    resolver: Option<Box<dyn BranchResolver>>,
    max_ways_per_tick: usize,
}

impl fmt::Debug for Follower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Follower")
            .field("phase", &self.phase)
            .field("current_point", &self.current_point)
            .field("current_way", &self.current_way)
            .field("previous_way", &self.previous_way)
            .field("distance_on_way", &self.distance_on_way)
            .field("speed", &self.speed)
            .field("lateral_offset", &self.lateral_offset)
            .field("playing", &self.playing)
            .field("has_resolver", &self.resolver.is_some())
            .finish()
    }
}

impl Default for Follower {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Follower {
    /// A detached follower; call [`Follower::ready`] to bind it to a track.
    pub fn new(cfg: &Config) -> Self {
        Self {
            phase: Phase::Detached,
            current_point: None,
            current_way: None,
            previous_way: None,
            distance_on_way: 0.0,
            speed: 0.0,
            lateral_offset: Vec3::zeros(),
            playing: false,
            pose: Pose::default(),
            resolver: None,
            max_ways_per_tick: cfg.max_ways_per_tick.max(1),
        }
    }

    /// Injects the branch decision strategy.
    pub fn with_resolver(mut self, resolver: impl BranchResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    pub fn set_resolver(&mut self, resolver: Option<Box<dyn BranchResolver>>) {
        self.resolver = resolver;
    }

    /// Binds to `track` and rewinds to its start point.
    ///
    /// `offset.x`/`offset.y` become the lateral offset applied in the
    /// follower's own frame; `offset.z` is the head start along the first way.
    /// The follower is left stopped: call [`Follower::play`] to move.
    pub fn ready(&mut self, track: &Track, speed: f32, offset: Vec3) {
        self.playing = false;
        self.phase = Phase::Traversing;
        self.current_point = Some(track.start_point_id());
        self.current_way = None;
        self.previous_way = None;
        self.distance_on_way = offset.z.max(0.0);
        self.speed = speed;
        self.lateral_offset = Vec3::new(offset.x, offset.y, 0.0);
        self.pose = Pose {
            position: track.transform.transform_point(&track.start_point().position),
            rotation: self.pose.rotation,
        };
    }

    /// Enables ticking at `speed`. Resumes exactly where `stop` left off.
    pub fn play(&mut self, speed: f32) {
        self.speed = speed;
        self.playing = true;
    }

    /// Disables ticking; the cursor and partial distance are kept.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Forgets the track binding and all cursor state.
    pub fn detach(&mut self) {
        self.playing = false;
        self.phase = Phase::Detached;
        self.current_point = None;
        self.current_way = None;
        self.previous_way = None;
        self.distance_on_way = 0.0;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.phase != Phase::Detached
    }

    #[inline]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[inline]
    pub fn distance_on_way(&self) -> f32 {
        self.distance_on_way
    }

    #[inline]
    pub fn lateral_offset(&self) -> Vec3 {
        self.lateral_offset
    }

    #[inline]
    pub fn current_point(&self) -> Option<PointId> {
        self.current_point
    }

    #[inline]
    pub fn current_way(&self) -> Option<WayId> {
        self.current_way
    }

    #[inline]
    pub fn previous_way(&self) -> Option<WayId> {
        self.previous_way
    }

    pub fn state(&self) -> FollowerState {
        match (self.phase, self.current_point, self.current_way) {
            (Phase::Detached, _, _) | (Phase::Traversing, None, _) => FollowerState::Detached,
            (Phase::Stopped(reason), point, _) => FollowerState::Stopped { point, reason },
            (Phase::Traversing, Some(point), Some(way)) => FollowerState::OnWay {
                point,
                way,
                distance: self.distance_on_way,
            },
            (Phase::Traversing, Some(point), None) => FollowerState::AtPoint { point },
        }
    }

    /// Ends the traversal from outside, e.g. when the host drops the track.
    pub fn halt(&mut self, reason: StopReason) {
        if self.phase == Phase::Traversing {
            self.phase = Phase::Stopped(reason);
            self.playing = false;
        }
    }

    /// Advances by one tick and returns the new pose, discarding events.
    pub fn tick(&mut self, track: &Track, dt: f32) -> Option<Pose> {
        let mut events = Vec::new();
        self.advance(track, dt, &mut events)
    }

    /// Advances by `speed * dt` along the track, possibly crossing several
    /// ways, and appends what happened to `events`. Returns the pose when it
    /// was updated this tick.
    pub fn advance(
        &mut self,
        track: &Track,
        dt: f32,
        events: &mut Vec<FollowerEvent>,
    ) -> Option<Pose> {
        if !self.playing || self.phase != Phase::Traversing {
            return None;
        }
        let mut point = self.current_point?;
        if !track.contains_point(point)
            || self.current_way.is_some_and(|w| !track.contains_way(w))
        {
            warn!("follower cursor at {point:?} is no longer part of the track");
            self.finish(StopReason::StaleCursor, events);
            return None;
        }

        if self.current_way.is_none() && !self.enter_next_way(track, point, events) {
            return None;
        }

        self.distance_on_way += self.speed * dt;

        let mut crossings = 0usize;
        loop {
            let Some(way_id) = self.current_way else {
                break;
            };
            let Ok(way) = track.way(way_id) else {
                self.finish(StopReason::StaleCursor, events);
                return None;
            };
            if self.distance_on_way < way.length() {
                break;
            }
            if crossings >= self.max_ways_per_tick {
                warn!(
                    "follower crossed {crossings} ways in one tick, carrying {} over",
                    self.distance_on_way
                );
                self.distance_on_way = way.length();
                break;
            }

            let Some(next) = way.other_point(point) else {
                self.finish(StopReason::StaleCursor, events);
                return None;
            };
            self.distance_on_way -= way.length();
            point = next;
            self.current_point = Some(next);
            self.previous_way = Some(way_id);
            self.current_way = None;
            crossings += 1;
            events.push(FollowerEvent::PointReached {
                point: next,
                via: way_id,
            });

            if !self.enter_next_way(track, point, events) {
                // Snap onto the final point so the pose ends on the track.
                let rotation = self.pose.rotation;
                self.pose = self.compose_pose(track, &track.point(point).ok()?.position, rotation);
                return Some(self.pose);
            }
        }

        self.update_pose(track)
    }

    /// Chooses the next way at `point`; stops at a dead end.
    fn enter_next_way(
        &mut self,
        track: &Track,
        point: PointId,
        events: &mut Vec<FollowerEvent>,
    ) -> bool {
        match self.choose_way(track, point) {
            Some(way) => {
                self.current_way = Some(way);
                events.push(FollowerEvent::WayEntered { way, from: point });
                true
            }
            None => {
                debug!("follower reached dead end at {point:?}");
                self.finish(StopReason::DeadEnd, events);
                false
            }
        }
    }

    fn choose_way(&mut self, track: &Track, point: PointId) -> Option<WayId> {
        let previous = self.previous_way;
        if let Some(resolver) = self.resolver.as_mut() {
            if let Some(way) = resolver.resolve(track, point, previous) {
                match track.way(way) {
                    Ok(w) if w.contains(point) => return Some(way),
                    _ => warn!("branch resolver chose {way:?}, which does not leave {point:?}"),
                }
            }
        }
        track
            .point(point)
            .ok()?
            .incident_ways()
            .iter()
            .copied()
            .find(|w| Some(*w) != previous)
    }

    fn finish(&mut self, reason: StopReason, events: &mut Vec<FollowerEvent>) {
        self.phase = Phase::Stopped(reason);
        self.playing = false;
        self.current_way = None;
        events.push(FollowerEvent::Stopped { reason });
    }

    fn update_pose(&mut self, track: &Track) -> Option<Pose> {
        if self.distance_on_way <= 0.0 {
            return None;
        }
        let point = self.current_point?;
        let way = self.current_way?;
        let sample = track
            .way_ref(way)
            .ok()?
            .length_between(point, self.distance_on_way)?;

        let world_dir = track.transform.transform_vector(&sample.direction);
        let rotation = look_rotation(&world_dir).unwrap_or(self.pose.rotation);
        self.pose = self.compose_pose(track, &sample.position, rotation);
        Some(self.pose)
    }

    fn compose_pose(&self, track: &Track, local: &Vec3, rotation: Quat) -> Pose {
        let position = track.transform.transform_point(local) + rotation * self.lateral_offset;
        Pose { position, rotation }
    }
}
