//! Climate models and rain-event planning.
//!
//! The core tracker stores one rain event at a time and interpolates over
//! it; this crate supplies the other half of the weather system: where
//! rain *means* anything (spatial rainfall classification) and when rain
//! events *happen* (deterministic segment-based planning).
//!
//! # Segment planning
//!
//! The timeline is cut into fixed-length segments and each segment gets
//! exactly one rain event of seeded-random length and offset. Every query
//! re-derives the event from `(seed, segment)` alone, so any two peers
//! with the same seed agree on the full rain schedule without exchanging
//! state.

use serde::{Deserialize, Serialize};

use stonefall_core::hooks::{ClimateModel, MAX_RAINFALL, MIN_RAINFALL};
use stonefall_core::pos::BlockPos;
use stonefall_core::rng::SimRng;

// ---------------------------------------------------------------------------
// BandedClimate
// ---------------------------------------------------------------------------

/// Rainfall as a linear band function of the z coordinate: fully arid at
/// `arid_z`, fully wet at `wet_z`, clamped outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandedClimate {
    pub arid_z: i32,
    pub wet_z: i32,
}

impl Default for BandedClimate {
    fn default() -> Self {
        Self {
            arid_z: -10_000,
            wet_z: 10_000,
        }
    }
}

impl ClimateModel for BandedClimate {
    fn rainfall(&self, pos: BlockPos) -> f32 {
        if self.arid_z == self.wet_z {
            return (MIN_RAINFALL + MAX_RAINFALL) * 0.5;
        }
        let t = f64::from(pos.z - self.arid_z) / f64::from(self.wet_z - self.arid_z);
        let t = t.clamp(0.0, 1.0) as f32;
        MIN_RAINFALL + t * (MAX_RAINFALL - MIN_RAINFALL)
    }
}

// ---------------------------------------------------------------------------
// RainPlanner
// ---------------------------------------------------------------------------

/// Length of one planning segment, in calendar ticks.
pub const SEGMENT_LENGTH: u64 = 66_000;

/// Shortest rain event the planner produces.
pub const MIN_EVENT_LENGTH: u64 = 12_000;

/// Longest rain event the planner produces.
pub const MAX_EVENT_LENGTH: u64 = 24_000;

const PLANNER_SALT: u64 = 0x8917_2345_9823_1321;

/// A planned rain event, ready for `WorldTracker::set_rain_event`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainEvent {
    pub start_tick: u64,
    pub end_tick: u64,
    pub intensity: f32,
}

/// Deterministic rain scheduler. One event per segment; stable under
/// repeated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainPlanner {
    seed: u64,
}

impl RainPlanner {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn segment_rng(&self, segment: u64) -> SimRng {
        // Decorrelate neighbouring segments before seeding.
        let mut mixer = SimRng::new(
            self.seed ^ PLANNER_SALT ^ segment.wrapping_mul(0x9E37_79B9_7F4A_7C15),
        );
        SimRng::new(mixer.next_u64())
    }

    /// The single rain event planned inside the given segment.
    pub fn event_for_segment(&self, segment: u64) -> RainEvent {
        let mut rng = self.segment_rng(segment);
        let length = MIN_EVENT_LENGTH
            + u64::from(rng.next_below((MAX_EVENT_LENGTH - MIN_EVENT_LENGTH + 1) as u32));
        let slack = SEGMENT_LENGTH - length;
        let offset = u64::from(rng.next_below(slack as u32));
        let start_tick = segment * SEGMENT_LENGTH + offset;
        RainEvent {
            start_tick,
            end_tick: start_tick + length,
            intensity: rng.next_f32(),
        }
    }

    /// The event containing `tick`, if any.
    pub fn event_covering(&self, tick: u64) -> Option<RainEvent> {
        let event = self.event_for_segment(tick / SEGMENT_LENGTH);
        (event.start_tick..=event.end_tick)
            .contains(&tick)
            .then_some(event)
    }

    /// The first planned event starting strictly after `tick`.
    pub fn next_event_after(&self, tick: u64) -> RainEvent {
        let segment = tick / SEGMENT_LENGTH;
        let event = self.event_for_segment(segment);
        if event.start_tick > tick {
            event
        } else {
            self.event_for_segment(segment + 1)
        }
    }
}
