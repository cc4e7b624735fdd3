//! External collaborator traits.
//!
//! The tracker is pure state-machine code; everything it needs to know
//! about the actual world arrives through these seams. The host supplies
//! implementations at world load and the tracker calls them synchronously
//! from the tick thread.

use crate::pos::BlockPos;

// ---------------------------------------------------------------------------
// World model
// ---------------------------------------------------------------------------

/// Structural queries and mutations on the block world.
///
/// Predicates are expected to be total: any position may be asked about,
/// unknown positions simply answer `false`.
pub trait WorldModel {
    /// Whether the block at `pos` participates in collapse cascades.
    fn is_unstable(&self, pos: BlockPos) -> bool;

    /// Whether the block at `pos` has room to fall downwards.
    fn can_fall(&self, pos: BlockPos) -> bool;

    /// Perform the collapse action at `pos`. Returns `true` if the block
    /// actually collapsed (the cascade then follows up above it).
    fn collapse_at(&mut self, pos: BlockPos) -> bool;

    /// Perform a landslide re-check at `pos`, sliding the block if it is
    /// still unsupported.
    fn landslide_at(&mut self, pos: BlockPos);

    /// Whether the block at `pos` is of a kind that breaks when isolated.
    fn breaks_when_isolated(&self, pos: BlockPos) -> bool;

    /// Whether all six neighbours of `pos` have empty collision, leaving
    /// the block unsupported on every side.
    fn is_isolated(&self, pos: BlockPos) -> bool;

    /// Destroy the isolated block at `pos`, dropping its contents.
    fn destroy_isolated(&mut self, pos: BlockPos);
}

// ---------------------------------------------------------------------------
// Time oracle
// ---------------------------------------------------------------------------

/// The host world's own day clock. The calendar reconciles against it and
/// forwards explicit time jumps to it.
pub trait TimeOracle {
    /// Current host time-of-day in ticks. May exceed a day; callers reduce
    /// modulo the day length.
    fn time_of_day(&self) -> u64;

    /// Set the host time-of-day in ticks.
    fn set_time_of_day(&mut self, time: u64);
}

// ---------------------------------------------------------------------------
// Player roster
// ---------------------------------------------------------------------------

/// Authoritative source for the number of connected players.
pub trait PlayerRoster {
    fn players_online(&self) -> u32;
}

// ---------------------------------------------------------------------------
// Climate model
// ---------------------------------------------------------------------------

/// Smallest rainfall classification, in mm/year.
pub const MIN_RAINFALL: f32 = 0.0;

/// Largest rainfall classification, in mm/year.
pub const MAX_RAINFALL: f32 = 500.0;

/// Local rainfall classification, used to decide how intense a rain event
/// must be before a position counts as "raining".
pub trait ClimateModel: std::fmt::Debug {
    /// Average rainfall at `pos`, in `[MIN_RAINFALL, MAX_RAINFALL]`.
    fn rainfall(&self, pos: BlockPos) -> f32;

    /// Intensity threshold above which rain is considered active at `pos`.
    ///
    /// Maps rainfall linearly so that the wettest climates activate at any
    /// positive intensity and the most arid climates require the full
    /// signal.
    fn rain_threshold(&self, pos: BlockPos) -> f32 {
        let rainfall = self.rainfall(pos).clamp(MIN_RAINFALL, MAX_RAINFALL);
        1.0 - (rainfall - MIN_RAINFALL) / (MAX_RAINFALL - MIN_RAINFALL)
    }
}

/// Fallback climate with the same rainfall everywhere. Used until the host
/// installs a real model.
#[derive(Debug, Clone, Copy)]
pub struct UniformClimate {
    pub rainfall: f32,
}

impl Default for UniformClimate {
    fn default() -> Self {
        // Mid-range: rain events at half intensity or more are active.
        Self { rainfall: 250.0 }
    }
}

impl ClimateModel for UniformClimate {
    fn rainfall(&self, _pos: BlockPos) -> f32 {
        self.rainfall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_high_in_arid_climates() {
        let arid = UniformClimate { rainfall: 0.0 };
        let wet = UniformClimate { rainfall: 500.0 };
        let pos = BlockPos::new(0, 0, 0);
        assert_eq!(arid.rain_threshold(pos), 1.0);
        assert_eq!(wet.rain_threshold(pos), 0.0);
    }

    #[test]
    fn threshold_clamps_out_of_range_rainfall() {
        let soaked = UniformClimate { rainfall: 9_000.0 };
        assert_eq!(soaked.rain_threshold(BlockPos::new(0, 0, 0)), 0.0);
    }

    #[test]
    fn default_climate_sits_mid_range() {
        let climate = UniformClimate::default();
        let threshold = climate.rain_threshold(BlockPos::new(0, 0, 0));
        assert!((threshold - 0.5).abs() < 1e-6);
    }
}
