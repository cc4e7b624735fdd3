//! Continuously-interpolated rain signal.
//!
//! Rain is stored as a single sparse event (start tick, end tick, nominal
//! intensity) and exposed as a continuous intensity function of time: a
//! triangular ramp that is low at both edges of the event and peaks at its
//! midpoint, riding on a bias of half the nominal intensity so that
//! intense events hold more rain overall. There is no per-tick work and no
//! caching; the signal is recomputed from the three stored scalars on
//! every query.

use serde::{Deserialize, Serialize};

/// One rain event and the interpolation over it.
///
/// Replaced wholesale when a new event begins or ends, never partially
/// mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSignal {
    rain_start_tick: u64,
    rain_end_tick: u64,
    rain_intensity: f32,
}

impl Default for WeatherSignal {
    fn default() -> Self {
        // A zero-length, zero-intensity event in the past: never active.
        Self {
            rain_start_tick: 0,
            rain_end_tick: 0,
            rain_intensity: 0.0,
        }
    }
}

impl WeatherSignal {
    /// Store a new rain event. `intensity` is clamped to `[0, 1]` at this
    /// boundary; the interpolation itself never clamps.
    pub fn new(rain_start_tick: u64, rain_end_tick: u64, intensity: f32) -> Self {
        Self {
            rain_start_tick,
            rain_end_tick,
            rain_intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Replace the stored event.
    pub fn set_event(&mut self, rain_start_tick: u64, rain_end_tick: u64, intensity: f32) {
        *self = Self::new(rain_start_tick, rain_end_tick, intensity);
    }

    pub fn rain_start_tick(&self) -> u64 {
        self.rain_start_tick
    }

    pub fn rain_end_tick(&self) -> u64 {
        self.rain_end_tick
    }

    pub fn rain_intensity(&self) -> f32 {
        self.rain_intensity
    }

    /// The interpolated intensity at `tick`.
    ///
    /// `progress` through the event is clamped to `[0, 1]`, folded into a
    /// triangle peaking at the midpoint, and offset by half the nominal
    /// intensity. The result stays within `[0, 1]` by construction (at
    /// most `intensity * 0.5 + 0.5`), so no output clamp is applied.
    pub fn intensity_at(&self, tick: u64) -> f32 {
        let progress = if self.rain_end_tick <= self.rain_start_tick {
            // Degenerate event: treat as already over.
            1.0
        } else {
            let span = (self.rain_end_tick - self.rain_start_tick) as f64;
            let elapsed = tick.saturating_sub(self.rain_start_tick) as f64;
            (elapsed / span).clamp(0.0, 1.0) as f32
        };
        let progress_factor = if progress > 0.5 {
            1.0 - progress
        } else {
            progress
        };
        self.rain_intensity * 0.5 + progress_factor
    }

    /// Whether rain is considered active at `tick` under the given climate
    /// threshold (arid climates supply higher thresholds).
    pub fn is_active_at(&self, tick: u64, threshold: f32) -> bool {
        self.intensity_at(tick) > threshold
    }
}
