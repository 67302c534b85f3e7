use splinepath_core::{
    parse_stored_track_json, BranchResolver, Config, CoreEvent, Engine, FollowerCommand,
    FollowerId, FollowerState, Inputs, PointId, StopReason, Track, TrackId, Vec3, WayId,
};

fn fixture(name: &str) -> Track {
    let json = splinepath_test_fixtures::tracks::json(name).expect("load track fixture");
    parse_stored_track_json(&json, &Config::default()).expect("parse track fixture")
}

fn ready_and_play(follower: FollowerId, track: TrackId, speed: f32) -> Inputs {
    Inputs::with([
        FollowerCommand::Ready {
            follower,
            track,
            speed,
            offset: Vec3::zeros(),
        },
        FollowerCommand::Play { follower, speed },
    ])
}

#[test]
fn ready_and_play_emit_events_and_a_pose() {
    let mut engine = Engine::new(Config::default());
    let track = engine.add_track(fixture("straight"));
    let cart = engine.create_follower("cart");
    let start = engine.track(track).unwrap().start_point_id();
    let first_way = engine.track(track).unwrap().ways()[0].id();

    let out = engine.update(0.5, ready_and_play(cart, track, 2.0)).clone();
    assert_eq!(
        out.events,
        vec![
            CoreEvent::FollowerReady {
                follower: cart,
                track
            },
            CoreEvent::WayEntered {
                follower: cart,
                way: first_way,
                from: start
            },
        ]
    );
    let pose = out.pose_of(cart).expect("pose for cart").pose;
    assert!(pose.position.x > 0.0 && pose.position.x < 10.0);
    assert_eq!(engine.follower(cart).unwrap().track, Some(track));

    // Outputs are plain data for hosts
    let json = serde_json::to_string(&out).expect("serialize outputs");
    assert!(json.contains("WayEntered"));
}

#[test]
fn stopped_followers_produce_no_poses() {
    let mut engine = Engine::default();
    let track = engine.add_track(fixture("straight"));
    let cart = engine.create_follower("cart");
    engine.update(0.5, ready_and_play(cart, track, 1.0));

    let out = engine.update(0.5, Inputs::with([FollowerCommand::Stop { follower: cart }]));
    assert!(out.is_empty());
    let slot = engine.follower(cart).unwrap();
    assert!((slot.follower.distance_on_way() - 0.5).abs() < 1e-6);
}

#[test]
fn bad_commands_become_error_events() {
    let mut engine = Engine::default();
    let cart = engine.create_follower("cart");
    let out = engine.update(
        0.1,
        Inputs::with([
            FollowerCommand::Play {
                follower: FollowerId(42),
                speed: 1.0,
            },
            FollowerCommand::Ready {
                follower: cart,
                track: TrackId(7),
                speed: 1.0,
                offset: Vec3::zeros(),
            },
        ]),
    );
    assert_eq!(out.events.len(), 2);
    assert!(out
        .events
        .iter()
        .all(|e| matches!(e, CoreEvent::Error { .. })));
    assert_eq!(engine.follower(cart).unwrap().track, None);
}

#[test]
fn removing_a_track_stops_its_followers_once() {
    let mut engine = Engine::default();
    let track = engine.add_track(fixture("loop"));
    let cart = engine.create_follower("cart");
    engine.update(0.1, ready_and_play(cart, track, 1.0));

    let removed = engine.remove_track(track).expect("track present");
    assert_eq!(removed.name, "loop");
    assert!(engine.track(track).is_err());

    let out = engine.update(0.1, Inputs::default()).clone();
    assert_eq!(
        out.events,
        vec![CoreEvent::FollowerStopped {
            follower: cart,
            reason: StopReason::TrackMissing
        }]
    );
    assert!(matches!(
        engine.follower(cart).unwrap().follower.state(),
        FollowerState::Stopped {
            reason: StopReason::TrackMissing,
            ..
        }
    ));
    assert!(engine.update(0.1, Inputs::default()).is_empty());
}

#[test]
fn events_past_the_budget_are_dropped() {
    let cfg = Config {
        max_events_per_tick: 1,
        ..Config::default()
    };
    let mut engine = Engine::new(cfg);
    let track = engine.add_track(fixture("straight"));
    let cart = engine.create_follower("cart");
    let out = engine.update(0.1, ready_and_play(cart, track, 1.0));
    assert_eq!(out.events.len(), 1);
    assert_eq!(out.dropped_events, 1);
}

struct AlwaysRight {
    fork: PointId,
    right: WayId,
}

impl BranchResolver for AlwaysRight {
    fn resolve(
        &mut self,
        _track: &Track,
        point: PointId,
        _previous: Option<WayId>,
    ) -> Option<WayId> {
        (point == self.fork).then_some(self.right)
    }
}

#[test]
fn engine_followers_use_their_resolver() {
    let mut engine = Engine::default();
    let track = engine.add_track(fixture("junction"));
    let (fork, right, right_way) = {
        let t = engine.track(track).unwrap();
        let id = |name: &str| t.points().iter().find(|p| p.name == name).unwrap().id();
        let (fork, right) = (id("fork"), id("right"));
        (fork, right, t.way_between(fork, right).unwrap())
    };
    let cart = engine.create_follower("cart");
    engine
        .set_branch_resolver(
            cart,
            Some(Box::new(AlwaysRight {
                fork,
                right: right_way,
            })),
        )
        .unwrap();
    assert!(engine.set_branch_resolver(FollowerId(9), None).is_err());

    engine.update(0.0, ready_and_play(cart, track, 1.0));
    let mut reached = Vec::new();
    for _ in 0..400 {
        let out = engine.update(0.05, Inputs::default());
        for e in &out.events {
            if let CoreEvent::PointReached { point, .. } = e {
                reached.push(*point);
            }
        }
    }
    assert_eq!(reached, vec![fork, right]);
}

#[test]
fn detach_forgets_the_track() {
    let mut engine = Engine::default();
    let track = engine.add_track(fixture("straight"));
    let cart = engine.create_follower("cart");
    engine.update(0.1, ready_and_play(cart, track, 1.0));
    engine.update(0.1, Inputs::with([FollowerCommand::Detach { follower: cart }]));

    let slot = engine.follower(cart).unwrap();
    assert_eq!(slot.track, None);
    assert_eq!(slot.follower.state(), FollowerState::Detached);
    assert!(engine.remove_follower(cart).is_ok());
    assert!(engine.follower(cart).is_err());
}

#[test]
fn tracks_can_be_edited_between_updates() {
    let mut engine = Engine::default();
    let track = engine.create_track("scratch");
    let start = engine.track(track).unwrap().start_point_id();
    engine
        .track_mut(track)
        .unwrap()
        .add_point(start, Vec3::new(0.0, 0.0, 3.0))
        .unwrap();
    let cart = engine.create_follower("cart");
    engine.update(0.0, ready_and_play(cart, track, 1.0));
    let out = engine.update(1.0, Inputs::default());
    assert!(out.pose_of(cart).is_some());
    assert_eq!(engine.track_ids().count(), 1);
}
