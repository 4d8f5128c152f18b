use drive_playback_core::TendencySample;
use drive_playback_system_lanes::{
    marking_transform, ConstantMotion, FrameUpdate, LaneGeometry, LaneSide, MarkingPool,
    CURVE_AMPLITUDE, DEFAULT_MARKING_COUNT, LANE_HALF_WIDTH, MARKING_SPACING, OFFSET_BOUND,
};

fn geometry() -> LaneGeometry {
    LaneGeometry::new(MarkingPool::new(DEFAULT_MARKING_COUNT).expect("default pool"))
}

#[test]
fn offset_advances_one_unit_per_frame_and_wraps_after_the_bound() {
    let mut lanes = geometry();

    for frame in 1..=50 {
        assert_eq!(lanes.on_frame(0.1, &10.0_f32), FrameUpdate::Moved);
        assert!(
            (lanes.offset().get() - frame as f32).abs() < 1e-4,
            "frame {frame}: offset {}",
            lanes.offset().get()
        );
    }

    assert_eq!(lanes.on_frame(0.1, &10.0_f32), FrameUpdate::Moved);
    assert_eq!(lanes.offset().get(), -OFFSET_BOUND);

    for _ in 0..500 {
        let _ = lanes.on_frame(0.1, &10.0_f32);
        let offset = lanes.offset().get();
        assert!((-OFFSET_BOUND..=OFFSET_BOUND).contains(&offset));
    }
}

#[test]
fn reverse_travel_wraps_to_the_upper_bound() {
    let mut lanes = geometry();
    for _ in 0..=50 {
        let _ = lanes.on_frame(0.1, &-10.0_f32);
    }
    assert_eq!(lanes.offset().get(), OFFSET_BOUND);
}

#[test]
fn negligible_speed_leaves_offset_unchanged_for_any_delta() {
    let mut lanes = geometry();
    let _ = lanes.on_frame(0.5, &4.0_f32);
    let before = lanes.offset();

    assert_eq!(lanes.on_frame(1.0, &1e-4_f32), FrameUpdate::Stationary);
    assert_eq!(lanes.on_frame(1000.0, &-1e-4_f32), FrameUpdate::Stationary);
    assert_eq!(lanes.offset(), before);
}

#[test]
fn unusable_frames_are_skipped_without_side_effects() {
    let mut lanes = geometry();
    let _ = lanes.on_frame(0.25, &ConstantMotion {
        speed: 8.0,
        turn_rate: 0.5,
    });
    let snapshot = lanes.pool().clone();
    let offset = lanes.offset();

    assert_eq!(lanes.on_frame(f32::NAN, &8.0_f32), FrameUpdate::Skipped);
    assert_eq!(lanes.on_frame(f32::INFINITY, &8.0_f32), FrameUpdate::Skipped);
    assert_eq!(lanes.on_frame(-0.1, &8.0_f32), FrameUpdate::Skipped);
    assert_eq!(lanes.on_frame(0.1, &f32::NAN), FrameUpdate::Skipped);

    assert_eq!(lanes.offset(), offset);
    assert_eq!(lanes.pool(), &snapshot);
}

#[test]
fn markings_are_spaced_along_each_side() {
    let mut lanes = geometry();
    let _ = lanes.on_frame(0.0, &0.0_f32);

    let markings = lanes.pool().markings();
    let half = markings.len() / 2;
    for side in [&markings[..half], &markings[half..]] {
        for pair in side.windows(2) {
            let gap = pair[1].translation.z - pair[0].translation.z;
            assert!((gap - MARKING_SPACING).abs() < 1e-4);
        }
    }
    assert!(markings[..half]
        .iter()
        .all(|marking| marking.side == LaneSide::Left && marking.translation.x == -LANE_HALF_WIDTH));
    assert!(markings[half..]
        .iter()
        .all(|marking| marking.side == LaneSide::Right && marking.translation.x == LANE_HALF_WIDTH));
}

#[test]
fn turn_rate_bends_markings_without_moving_the_offset_model() {
    let mut straight = geometry();
    let mut curved = geometry();

    let _ = straight.on_frame(0.5, &ConstantMotion {
        speed: 6.0,
        turn_rate: 0.0,
    });
    let _ = curved.on_frame(0.5, &ConstantMotion {
        speed: 6.0,
        turn_rate: 0.8,
    });

    assert_eq!(straight.offset(), curved.offset());

    let bent = curved
        .pool()
        .markings()
        .iter()
        .zip(straight.pool().markings())
        .filter(|(curved, straight)| {
            (curved.translation.x - straight.translation.x).abs() > 1e-3
        })
        .count();
    assert!(bent > 0, "expected curvature to displace markings laterally");

    for (curved, straight) in curved.pool().markings().iter().zip(straight.pool().markings()) {
        assert_eq!(curved.translation.z, straight.translation.z);
        let displacement = (curved.translation.x - straight.translation.x).abs();
        assert!(displacement <= 0.8 * CURVE_AMPLITUDE + 1e-4);
        assert!(curved.heading.abs() < std::f32::consts::FRAC_PI_2);
    }
}

#[test]
fn heading_follows_the_curve_direction() {
    let left_turn = marking_transform(10, 40, 0.0, 1.0);
    let right_turn = marking_transform(10, 40, 0.0, -1.0);
    assert!((left_turn.heading + right_turn.heading).abs() < 1e-6);
    assert!(left_turn.heading != 0.0);
}

#[test]
fn positioning_is_deterministic() {
    let first: Vec<_> = (0..DEFAULT_MARKING_COUNT)
        .map(|index| marking_transform(index, DEFAULT_MARKING_COUNT, 17.25, -0.4))
        .collect();
    let second: Vec<_> = (0..DEFAULT_MARKING_COUNT)
        .map(|index| marking_transform(index, DEFAULT_MARKING_COUNT, 17.25, -0.4))
        .collect();
    assert_eq!(first, second);

    let mut lanes = geometry();
    let _ = lanes.on_frame(1.0, &17.25_f32);
    let _ = lanes.on_frame(0.0, &ConstantMotion {
        speed: 0.0,
        turn_rate: -0.4,
    });
    assert_eq!(lanes.pool().markings(), first.as_slice());
}

#[test]
fn tendency_samples_drive_the_lane() {
    let mut lanes = geometry();
    let sample = TendencySample::new(20.0, 0.25);

    assert_eq!(lanes.on_frame(0.5, &sample), FrameUpdate::Moved);
    assert!((lanes.offset().get() - 10.0).abs() < 1e-4);

    let missing: Option<&TendencySample> = None;
    assert_eq!(lanes.on_frame(0.5, &missing), FrameUpdate::Stationary);
    assert!((lanes.offset().get() - 10.0).abs() < 1e-4);
}

#[test]
fn pool_size_never_changes() {
    let mut lanes = geometry();
    for frame in 0..200 {
        let _ = lanes.on_frame(0.016, &ConstantMotion {
            speed: 30.0,
            turn_rate: (frame as f32 * 0.05).sin(),
        });
        assert_eq!(lanes.pool().len(), DEFAULT_MARKING_COUNT);
    }
}
