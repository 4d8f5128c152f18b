#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-driven lane geometry that scrolls and bends a fixed pool of markings.
//!
//! Every frame the updater folds the instantaneous speed into a scrolling
//! [`LaneOffset`] and repositions each [`Marking`] in the [`MarkingPool`].
//! Nothing here knows which renderer supplies frames; callers hand in the
//! elapsed seconds and a [`MotionReading`].

use drive_playback_core::TendencySample;
use glam::Vec3;
use thiserror::Error;

/// Bound of the scrolling offset band, in world units.
pub const OFFSET_BOUND: f32 = 50.0;
/// Speeds at or below this magnitude leave the offset untouched.
pub const SPEED_EPSILON: f32 = 1e-3;
/// Longitudinal spacing between consecutive markings on one side.
pub const MARKING_SPACING: f32 = 6.0;
/// Longitudinal position of the first marking on each side before scrolling.
pub const BAND_START: f32 = -60.0;
/// Angular frequency of the curvature sinusoid, in radians per world unit.
pub const CURVE_FREQUENCY: f32 = 0.02;
/// Lateral displacement applied per unit of turn-rate at the sinusoid's peak.
pub const CURVE_AMPLITUDE: f32 = 4.0;
/// Lateral distance of each marking line from the lane centre.
pub const LANE_HALF_WIDTH: f32 = 2.0;
/// Height of markings above the road surface.
pub const MARKING_ELEVATION: f32 = 0.01;
/// Pool size giving twenty markings per side, enough to span the band.
pub const DEFAULT_MARKING_COUNT: usize = 40;

/// Instantaneous motion consulted once per frame.
pub trait MotionReading {
    /// Forward speed in world units per second.
    fn speed(&self) -> f32;

    /// Signed turn-rate. Readers without steering information drive straight.
    fn turn_rate(&self) -> f32 {
        0.0
    }
}

impl MotionReading for f32 {
    fn speed(&self) -> f32 {
        *self
    }
}

impl MotionReading for TendencySample {
    fn speed(&self) -> f32 {
        self.speed
    }

    fn turn_rate(&self) -> f32 {
        self.turn_rate
    }
}

impl<M: MotionReading + ?Sized> MotionReading for &M {
    fn speed(&self) -> f32 {
        (**self).speed()
    }

    fn turn_rate(&self) -> f32 {
        (**self).turn_rate()
    }
}

/// Absent readings are treated as a stationary vehicle.
impl<M: MotionReading> MotionReading for Option<M> {
    fn speed(&self) -> f32 {
        self.as_ref().map_or(0.0, MotionReading::speed)
    }

    fn turn_rate(&self) -> f32 {
        self.as_ref().map_or(0.0, MotionReading::turn_rate)
    }
}

/// Fixed motion reading, useful when no live source is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantMotion {
    /// Forward speed in world units per second.
    pub speed: f32,
    /// Signed turn-rate.
    pub turn_rate: f32,
}

impl MotionReading for ConstantMotion {
    fn speed(&self) -> f32 {
        self.speed
    }

    fn turn_rate(&self) -> f32 {
        self.turn_rate
    }
}

/// Cumulative forward travel wrapped into `[-OFFSET_BOUND, OFFSET_BOUND]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LaneOffset(f32);

impl LaneOffset {
    /// Creates an offset, wrapping values outside the band.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(wrap(value))
    }

    /// Current offset in world units.
    #[must_use]
    pub const fn get(&self) -> f32 {
        self.0
    }

    /// Accumulates `speed * delta_seconds` unless the speed is negligible.
    ///
    /// Returns `true` when the offset moved.
    pub fn advance(&mut self, speed: f32, delta_seconds: f32) -> bool {
        if speed.abs() <= SPEED_EPSILON {
            return false;
        }

        self.0 = wrap(self.0 + speed * delta_seconds);
        true
    }
}

fn wrap(value: f32) -> f32 {
    if value > OFFSET_BOUND {
        -OFFSET_BOUND
    } else if value < -OFFSET_BOUND {
        OFFSET_BOUND
    } else {
        value
    }
}

/// Side of the lane a marking belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaneSide {
    /// Markings in the first half of the pool.
    Left,
    /// Markings in the second half of the pool.
    Right,
}

impl LaneSide {
    /// Lateral position of the side's marking line on a straight road.
    #[must_use]
    pub const fn base_x(self) -> f32 {
        match self {
            Self::Left => -LANE_HALF_WIDTH,
            Self::Right => LANE_HALF_WIDTH,
        }
    }
}

/// Transform of a single lane marking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marking {
    /// Side of the lane the marking belongs to.
    pub side: LaneSide,
    /// Position in world space; `z` runs along the direction of travel.
    pub translation: Vec3,
    /// Rotation about the vertical axis, in radians.
    pub heading: f32,
}

/// Computes the transform of the marking at `index` in a pool of `pool_len`.
///
/// The result depends only on its arguments, so recomputing the same pool
/// with the same offset and turn-rate yields identical coordinates.
#[must_use]
pub fn marking_transform(index: usize, pool_len: usize, offset: f32, turn_rate: f32) -> Marking {
    let half = pool_len / 2;
    let (side, index_in_side) = if index < half {
        (LaneSide::Left, index)
    } else {
        (LaneSide::Right, index - half)
    };

    let z = index_in_side as f32 * MARKING_SPACING + BAND_START + offset;
    let phase = z * CURVE_FREQUENCY;
    let lateral = turn_rate * CURVE_AMPLITUDE * phase.sin();
    let slope = turn_rate * CURVE_AMPLITUDE * CURVE_FREQUENCY * phase.cos();

    Marking {
        side,
        translation: Vec3::new(side.base_x() + lateral, MARKING_ELEVATION, z),
        heading: slope.atan(),
    }
}

/// Fixed-size collection of lane markings.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkingPool {
    markings: Vec<Marking>,
}

impl MarkingPool {
    /// Creates a pool of `count` markings laid out for a zero offset on a straight road.
    pub fn new(count: usize) -> Result<Self, LaneError> {
        if count == 0 {
            return Err(LaneError::EmptyPool);
        }

        let markings = (0..count)
            .map(|index| marking_transform(index, count, 0.0, 0.0))
            .collect();
        Ok(Self { markings })
    }

    /// Number of markings in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markings.len()
    }

    /// Reports whether the pool holds no markings. Never true for a constructed pool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markings.is_empty()
    }

    /// Markings in pool order: left side first, then right side.
    #[must_use]
    pub fn markings(&self) -> &[Marking] {
        &self.markings
    }

    fn reposition(&mut self, offset: f32, turn_rate: f32) {
        let len = self.markings.len();
        for (index, marking) in self.markings.iter_mut().enumerate() {
            *marking = marking_transform(index, len, offset, turn_rate);
        }
    }
}

/// Outcome of a single frame update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameUpdate {
    /// The offset advanced and markings were repositioned.
    Moved,
    /// The vehicle was stationary; markings were repositioned in place.
    Stationary,
    /// The frame carried unusable input and was ignored.
    Skipped,
}

/// Scrolling lane state updated once per rendered frame.
#[derive(Clone, Debug)]
pub struct LaneGeometry {
    offset: LaneOffset,
    pool: MarkingPool,
}

impl LaneGeometry {
    /// Creates lane geometry around an existing pool with a zero offset.
    #[must_use]
    pub fn new(pool: MarkingPool) -> Self {
        Self {
            offset: LaneOffset::default(),
            pool,
        }
    }

    /// Current scrolling offset.
    #[must_use]
    pub fn offset(&self) -> LaneOffset {
        self.offset
    }

    /// Marking pool with the transforms computed on the last frame.
    #[must_use]
    pub fn pool(&self) -> &MarkingPool {
        &self.pool
    }

    /// Advances the lane by one frame.
    ///
    /// Frames with a negative or non-finite delta, or a non-finite motion
    /// reading, are skipped without touching any state.
    pub fn on_frame<M>(&mut self, delta_seconds: f32, motion: &M) -> FrameUpdate
    where
        M: MotionReading + ?Sized,
    {
        let speed = motion.speed();
        let turn_rate = motion.turn_rate();
        if !delta_seconds.is_finite()
            || delta_seconds < 0.0
            || !speed.is_finite()
            || !turn_rate.is_finite()
        {
            return FrameUpdate::Skipped;
        }

        let moved = self.offset.advance(speed, delta_seconds);
        self.pool.reposition(self.offset.get(), turn_rate);

        if moved {
            FrameUpdate::Moved
        } else {
            FrameUpdate::Stationary
        }
    }
}

/// Errors raised while constructing lane geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LaneError {
    /// A marking pool needs at least one marking.
    #[error("marking pool must contain at least one marking")]
    EmptyPool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_wraps_to_opposite_bound() {
        let mut offset = LaneOffset::new(49.5);
        assert!(offset.advance(1.0, 1.0));
        assert_eq!(offset.get(), -OFFSET_BOUND);

        let mut offset = LaneOffset::new(-49.5);
        assert!(offset.advance(-1.0, 1.0));
        assert_eq!(offset.get(), OFFSET_BOUND);
    }

    #[test]
    fn offset_bound_itself_is_inside_the_band() {
        let mut offset = LaneOffset::new(49.0);
        assert!(offset.advance(1.0, 1.0));
        assert_eq!(offset.get(), OFFSET_BOUND);
    }

    #[test]
    fn negligible_speed_freezes_offset() {
        let mut offset = LaneOffset::new(12.0);
        assert!(!offset.advance(1e-4, 1.0));
        assert!(!offset.advance(-SPEED_EPSILON, 100.0));
        assert_eq!(offset.get(), 12.0);
    }

    #[test]
    fn pool_splits_into_left_then_right_halves() {
        let pool = MarkingPool::new(6).expect("non-empty pool");
        let sides: Vec<LaneSide> = pool.markings().iter().map(|marking| marking.side).collect();
        assert_eq!(
            sides,
            vec![
                LaneSide::Left,
                LaneSide::Left,
                LaneSide::Left,
                LaneSide::Right,
                LaneSide::Right,
                LaneSide::Right,
            ]
        );
    }

    #[test]
    fn odd_pool_places_extra_marking_on_the_right() {
        let pool = MarkingPool::new(5).expect("non-empty pool");
        let right = pool
            .markings()
            .iter()
            .filter(|marking| marking.side == LaneSide::Right)
            .count();
        assert_eq!(right, 3);
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_eq!(MarkingPool::new(0), Err(LaneError::EmptyPool));
    }

    #[test]
    fn straight_road_keeps_markings_on_their_lines() {
        let marking = marking_transform(3, 10, 7.0, 0.0);
        assert_eq!(marking.side, LaneSide::Left);
        assert_eq!(marking.translation.x, -LANE_HALF_WIDTH);
        assert_eq!(marking.translation.z, 3.0 * MARKING_SPACING + BAND_START + 7.0);
        assert_eq!(marking.heading, 0.0);
    }

    #[test]
    fn absent_reading_is_stationary() {
        let reading: Option<&TendencySample> = None;
        assert_eq!(reading.speed(), 0.0);
        assert_eq!(reading.turn_rate(), 0.0);
    }
}
