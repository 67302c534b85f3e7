use approx::assert_relative_eq;
use splinepath_core::{Track, TrackError, Vec3};

/// a(0) - b(5) - c(10) along +x
fn chain() -> (Track, [splinepath_core::PointId; 3], [splinepath_core::WayId; 2]) {
    let mut t = Track::new();
    let a = t.start_point_id();
    let (b, ab) = t.add_point(a, Vec3::new(5.0, 0.0, 0.0)).unwrap();
    let (c, bc) = t.add_point(b, Vec3::new(10.0, 0.0, 0.0)).unwrap();
    (t, [a, b, c], [ab, bc])
}

#[test]
fn start_point_cannot_be_deleted() {
    let (mut t, [a, ..], _) = chain();
    assert!(matches!(
        t.delete_point(a),
        Err(TrackError::InvariantViolation { .. })
    ));
    assert!(matches!(
        t.dissolve_point(a),
        Err(TrackError::InvariantViolation { .. })
    ));
    assert_eq!(t.point_count(), 3);
}

#[test]
fn deleted_ids_stay_stale() {
    let (mut t, [_, b, c], [ab, bc]) = chain();
    t.delete_point(b).unwrap();

    let err = t.point(b).unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(t.way(ab), Err(TrackError::WayNotFound { .. })));
    assert!(matches!(t.way(bc), Err(TrackError::WayNotFound { .. })));
    // a fresh point never reuses the deleted id
    let d = t.new_point(Vec3::zeros());
    assert_ne!(d, b);
    assert!(t.point(c).unwrap().incident_ways().is_empty());
}

#[test]
fn deleting_a_point_reindexes_handles() {
    let mut t = Track::new();
    let a = t.start_point_id();
    let b = t.new_point(Vec3::new(1.0, 0.0, 0.0));
    let c = t.new_point(Vec3::new(2.0, 0.0, 0.0));
    let d = t.new_point(Vec3::new(3.0, 0.0, 0.0));
    let cd = t.new_way(c, d).unwrap();
    t.new_way(a, b).unwrap();

    t.delete_point(b).unwrap();
    let way = t.way(cd).unwrap();
    assert_eq!(way.head.point_index(), 1);
    assert_eq!(way.tail.point_index(), 2);
    assert_eq!(t.points()[way.head.point_index()].id(), c);
}

#[test]
fn validate_is_idempotent() {
    let (mut t, [a, b, c], _) = chain();
    t.link_points(c, a).unwrap();
    let before = t.to_data();
    let links: Vec<Vec<_>> = t.points().iter().map(|p| p.incident_ways().to_vec()).collect();

    t.validate_structure().unwrap();
    t.validate_structure().unwrap();

    assert_eq!(t.to_data(), before);
    let after: Vec<Vec<_>> = t.points().iter().map(|p| p.incident_ways().to_vec()).collect();
    assert_eq!(after, links);
    assert_eq!(t.point(b).unwrap().link_count(), 2);
}

#[test]
fn self_loop_is_listed_twice() {
    let mut t = Track::new();
    let a = t.start_point_id();
    let b = t.new_point(Vec3::new(1.0, 0.0, 0.0));
    let lp = t.new_way(b, b).unwrap();

    assert!(t.way(lp).unwrap().is_self_loop());
    assert_eq!(t.point(b).unwrap().incident_ways(), &[lp, lp]);
    assert!(!t.is_end_point(b, None).unwrap());
    assert_eq!(t.other_point(lp, b).unwrap(), b);

    t.delete_way(lp).unwrap();
    assert!(t.point(b).unwrap().incident_ways().is_empty());
    assert!(matches!(
        t.other_point(lp, a),
        Err(TrackError::WayNotFound { .. })
    ));
}

#[test]
fn parallel_ways_coexist() {
    let mut t = Track::new();
    let a = t.start_point_id();
    let b = t.new_point(Vec3::new(4.0, 0.0, 0.0));
    let first = t.new_way(a, b).unwrap();
    let second = t.new_way(b, a).unwrap();

    assert_eq!(t.point(a).unwrap().incident_ways(), &[first, second]);
    assert_eq!(t.way_between(a, b), Some(first));
    t.unlink_way(first).unwrap();
    assert_eq!(t.way_between(a, b), Some(second));
}

#[test]
fn dissolving_a_joint_bridges_its_neighbours() {
    let (mut t, [a, b, c], [ab, bc]) = chain();
    let bridge = t.dissolve_point(b).unwrap().expect("two-way joint is bridged");

    assert_eq!(t.way_count(), 1);
    assert!(!t.contains_way(ab) && !t.contains_way(bc));
    let way = t.way(bridge).unwrap();
    assert_eq!((way.head_point(), way.tail_point()), (a, c));
    assert_relative_eq!(way.head.offset, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(way.tail.offset, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    assert_relative_eq!(way.length(), 10.0, epsilon = 1e-3);
    assert_eq!(t.point(a).unwrap().incident_ways(), &[bridge]);
}

#[test]
fn dissolving_a_branch_point_drops_all_links() {
    let (mut t, [_, b, _], _) = chain();
    t.add_point(b, Vec3::new(5.0, 5.0, 0.0)).unwrap();
    assert_eq!(t.dissolve_point(b).unwrap(), None);
    assert_eq!(t.way_count(), 0);
    assert_eq!(t.point_count(), 3);
}

#[test]
fn inserting_splits_a_way_in_place() {
    let mut t = Track::new();
    let a = t.start_point_id();
    let (b, w) = t.add_point(a, Vec3::new(10.0, 0.0, 0.0)).unwrap();
    let mid = t.insert_point_at(w, 0.5).unwrap();

    assert!(!t.contains_way(w));
    assert_relative_eq!(t.point(mid).unwrap().position, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
    let first = t.way_between(a, mid).unwrap();
    let second = t.way_between(mid, b).unwrap();
    let total = t.way(first).unwrap().length() + t.way(second).unwrap().length();
    assert_relative_eq!(total, 10.0, epsilon = 1e-3);
}

#[test]
fn make_linear_resets_handles_to_the_unit_chord() {
    let mut t = Track::new();
    let a = t.start_point_id();
    let (_, w) = t.add_point(a, Vec3::new(0.0, 3.0, 4.0)).unwrap();
    t.set_handle_offset(w, a, Vec3::new(9.0, 0.0, 0.0)).unwrap();
    t.make_linear(w).unwrap();

    let way = t.way(w).unwrap();
    assert_relative_eq!(way.head.offset, Vec3::new(0.0, 0.6, 0.8), epsilon = 1e-5);
    assert_relative_eq!(way.tail.offset, Vec3::new(0.0, -0.6, -0.8), epsilon = 1e-5);
    assert_relative_eq!(way.length(), 5.0, epsilon = 1e-3);
}

#[test]
fn moving_a_point_refreshes_lengths() {
    let (mut t, [_, _, c], [_, bc]) = chain();
    t.move_point(c, Vec3::new(15.0, 0.0, 0.0)).unwrap();
    assert!(t.way(bc).unwrap().length() > 9.0);
}

#[test]
fn world_positions_follow_the_track_transform() {
    let mut t = Track::new();
    t.transform = splinepath_core::TrackTransform::from_translation(Vec3::new(0.0, 2.0, 0.0));
    let a = t.start_point_id();
    let (b, _) = t.add_point(a, Vec3::new(3.0, 0.0, 0.0)).unwrap();
    assert_relative_eq!(t.world_position(b).unwrap(), Vec3::new(3.0, 2.0, 0.0));

    t.set_world_position(b, Vec3::new(3.0, 2.0, 4.0)).unwrap();
    assert_relative_eq!(t.point(b).unwrap().position, Vec3::new(3.0, 0.0, 4.0));
}
