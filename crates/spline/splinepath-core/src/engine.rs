//! Engine: owns tracks and followers and steps them once per host frame.
//!
//! Methods:
//! - new, add_track / remove_track / track_mut, create_follower,
//!   set_branch_resolver, update (apply inputs → advance followers → outputs)
//!
//! The engine is the single writer of everything it owns. Hosts edit tracks
//! through `track_mut` between updates; followers only see shared borrows
//! while a tick runs.

use log::warn;

use crate::config::Config;
use crate::error::TrackError;
use crate::follower::{BranchResolver, Follower, FollowerEvent, FollowerState, StopReason};
use crate::ids::{FollowerId, IdAllocator, TrackId};
use crate::inputs::{FollowerCommand, Inputs};
use crate::outputs::{CoreEvent, Outputs, PoseChange};
use crate::track::Track;
use crate::Result;

/// A follower together with its engine-side binding.
#[derive(Debug)]
pub struct FollowerSlot {
    pub id: FollowerId,
    pub name: String,
    /// Track the follower was readied on, if any.
    pub track: Option<TrackId>,
    pub follower: Follower,
}

#[derive(Debug)]
pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    tracks: Vec<(TrackId, Track)>,
    followers: Vec<FollowerSlot>,

    // Per-tick buffers
    outputs: Outputs,
    events: Vec<FollowerEvent>,
}

fn find_track(tracks: &[(TrackId, Track)], id: TrackId) -> Option<&Track> {
    tracks
        .iter()
        .find_map(|(t, track)| if *t == id { Some(track) } else { None })
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            tracks: Vec::new(),
            followers: Vec::new(),
            outputs: Outputs::default(),
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// A new track with only its start point, sized by the engine config.
    pub fn create_track(&mut self, name: &str) -> TrackId {
        let mut track = Track::with_config(&self.cfg);
        track.name = name.to_string();
        self.add_track(track)
    }

    /// Takes ownership of an existing track.
    pub fn add_track(&mut self, track: Track) -> TrackId {
        let id = self.ids.alloc_track();
        self.tracks.push((id, track));
        id
    }

    /// Gives the track back to the caller. Followers bound to it stop with
    /// `StopReason::TrackMissing` on the next update.
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let slot = self
            .tracks
            .iter()
            .position(|(t, _)| *t == id)
            .ok_or(TrackError::TrackNotFound { id })?;
        Ok(self.tracks.remove(slot).1)
    }

    pub fn track(&self, id: TrackId) -> Result<&Track> {
        find_track(&self.tracks, id).ok_or(TrackError::TrackNotFound { id })
    }

    pub fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .iter_mut()
            .find_map(|(t, track)| if *t == id { Some(track) } else { None })
            .ok_or(TrackError::TrackNotFound { id })
    }

    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().map(|(id, _)| *id)
    }

    /// Creates a detached follower.
    pub fn create_follower(&mut self, name: &str) -> FollowerId {
        let id = self.ids.alloc_follower();
        self.followers.push(FollowerSlot {
            id,
            name: name.to_string(),
            track: None,
            follower: Follower::new(&self.cfg),
        });
        id
    }

    pub fn remove_follower(&mut self, id: FollowerId) -> Result<()> {
        let slot = self
            .followers
            .iter()
            .position(|f| f.id == id)
            .ok_or(TrackError::FollowerNotFound { id })?;
        self.followers.remove(slot);
        Ok(())
    }

    pub fn follower(&self, id: FollowerId) -> Result<&FollowerSlot> {
        self.followers
            .iter()
            .find(|f| f.id == id)
            .ok_or(TrackError::FollowerNotFound { id })
    }

    fn follower_slot_mut(&mut self, id: FollowerId) -> Result<&mut FollowerSlot> {
        self.followers
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or(TrackError::FollowerNotFound { id })
    }

    /// Installs (or clears) the branch decision strategy of a follower.
    pub fn set_branch_resolver(
        &mut self,
        id: FollowerId,
        resolver: Option<Box<dyn BranchResolver>>,
    ) -> Result<()> {
        self.follower_slot_mut(id)?.follower.set_resolver(resolver);
        Ok(())
    }

    /// Apply follower commands. Failures become `CoreEvent::Error` so one bad
    /// command does not block the rest of the frame.
    fn apply_inputs(&mut self, inputs: Inputs) {
        let cap = self.cfg.max_events_per_tick;
        for cmd in inputs.follower_cmds {
            if let Err(err) = self.apply_command(cmd) {
                warn!("follower command rejected: {err}");
                self.outputs.push_event(
                    CoreEvent::Error {
                        message: err.to_string(),
                    },
                    cap,
                );
            }
        }
    }

    fn apply_command(&mut self, cmd: FollowerCommand) -> Result<()> {
        match cmd {
            FollowerCommand::Ready {
                follower,
                track,
                speed,
                offset,
            } => {
                let slot = self
                    .followers
                    .iter_mut()
                    .find(|f| f.id == follower)
                    .ok_or(TrackError::FollowerNotFound { id: follower })?;
                let bound =
                    find_track(&self.tracks, track).ok_or(TrackError::TrackNotFound { id: track })?;
                slot.follower.ready(bound, speed, offset);
                slot.track = Some(track);
                self.outputs.push_event(
                    CoreEvent::FollowerReady { follower, track },
                    self.cfg.max_events_per_tick,
                );
            }
            FollowerCommand::Play { follower, speed } => {
                self.follower_slot_mut(follower)?.follower.play(speed);
            }
            FollowerCommand::Stop { follower } => {
                self.follower_slot_mut(follower)?.follower.stop();
            }
            FollowerCommand::SetSpeed { follower, speed } => {
                self.follower_slot_mut(follower)?.follower.set_speed(speed);
            }
            FollowerCommand::Detach { follower } => {
                let slot = self.follower_slot_mut(follower)?;
                slot.follower.detach();
                slot.track = None;
            }
        }
        Ok(())
    }

    /// Step every follower by `dt` after applying `inputs`.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        // 1) Apply follower commands
        self.apply_inputs(inputs);

        // 2) Advance followers against their tracks
        let cap = self.cfg.max_events_per_tick;
        for slot in &mut self.followers {
            let Some(track_id) = slot.track else {
                continue;
            };
            let Some(track) = find_track(&self.tracks, track_id) else {
                if matches!(
                    slot.follower.state(),
                    FollowerState::AtPoint { .. } | FollowerState::OnWay { .. }
                ) {
                    slot.follower.halt(StopReason::TrackMissing);
                    self.outputs.push_event(
                        CoreEvent::FollowerStopped {
                            follower: slot.id,
                            reason: StopReason::TrackMissing,
                        },
                        cap,
                    );
                }
                slot.track = None;
                continue;
            };

            self.events.clear();
            if let Some(pose) = slot.follower.advance(track, dt, &mut self.events) {
                self.outputs.push_pose(PoseChange {
                    follower: slot.id,
                    pose,
                });
            }

            // 3) Translate follower events
            for ev in self.events.drain(..) {
                let event = match ev {
                    FollowerEvent::WayEntered { way, from } => CoreEvent::WayEntered {
                        follower: slot.id,
                        way,
                        from,
                    },
                    FollowerEvent::PointReached { point, via } => CoreEvent::PointReached {
                        follower: slot.id,
                        point,
                        via,
                    },
                    FollowerEvent::Stopped { reason } => CoreEvent::FollowerStopped {
                        follower: slot.id,
                        reason,
                    },
                };
                self.outputs.push_event(event, cap);
            }
        }

        if self.outputs.dropped_events > 0 {
            warn!(
                "dropped {} event(s) over the per-tick budget of {cap}",
                self.outputs.dropped_events
            );
        }
        &self.outputs
    }
}
