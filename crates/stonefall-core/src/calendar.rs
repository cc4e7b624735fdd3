//! The dual-clock calendar.
//!
//! Two monotonic counters advance in lock-step with the host world:
//!
//! - **Player time** increments once per tick whenever at least one player
//!   is online. Used for timestamps that should freeze on an empty server.
//! - **Calendar time** additionally requires the daylight cycle to be
//!   enabled. It is the clock players see, and the one the host world's
//!   time-of-day is expected to mirror.
//!
//! Both clocks are expected to stay synchronized with the host by
//! construction; [`Calendar::reconcile`] is the self-healing path that
//! repairs any drift caused by a missed event. Drift is logged and
//! corrected, never fatal.

use serde::{Deserialize, Serialize};

use crate::hooks::TimeOracle;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Calendar ticks in one hour.
pub const TICKS_IN_HOUR: u64 = 1_000;

/// Hours in one day.
pub const HOURS_IN_DAY: u64 = 24;

/// Calendar ticks in one day.
pub const TICKS_IN_DAY: u64 = TICKS_IN_HOUR * HOURS_IN_DAY;

/// Months in one year.
pub const MONTHS_IN_YEAR: u64 = 12;

/// Ticks between periodic sync payloads.
pub const SYNC_INTERVAL: u32 = 10;

/// Maximum tolerated distance between calendar time-of-day and the host
/// oracle before [`Calendar::reconcile`] intervenes.
pub const DRIFT_THRESHOLD: i64 = 1;

/// Default number of days in a month for a freshly created world.
pub const DEFAULT_MONTH_LENGTH: u32 = 8;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected calendar configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("month length must be at least one day, got {0}")]
    InvalidMonthLength(u32),
}

// ---------------------------------------------------------------------------
// Drift correction
// ---------------------------------------------------------------------------

/// Outcome of a [`Calendar::reconcile`] call that found drift.
///
/// `delta` is oracle-minus-calendar in ticks: negative means the oracle
/// lagged and was advanced, positive means the calendar lagged and jumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftCorrection {
    pub delta: i64,
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// Dual monotonic clocks plus the gates that pause them.
///
/// Owned by the per-world tracker; everything else reads it or requests
/// mutations through the tracker's API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Ticks elapsed while at least one player was online.
    player_ticks: u64,
    /// Ticks elapsed while players were online and daylight cycled.
    calendar_ticks: u64,
    /// Configurable month length in days. Never zero.
    days_in_month: u32,
    /// Whether at least one player is currently online.
    players_online: bool,
    /// Whether the daylight cycle is currently enabled.
    daylight_cycle_enabled: bool,
    /// Counts up to [`SYNC_INTERVAL`]. Not persisted; a fresh counter
    /// merely changes the phase of the next periodic sync.
    #[serde(skip)]
    sync_counter: u32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            player_ticks: 0,
            calendar_ticks: 0,
            days_in_month: DEFAULT_MONTH_LENGTH,
            players_online: false,
            daylight_cycle_enabled: true,
            sync_counter: 0,
        }
    }
}

impl Calendar {
    /// Create a calendar with the given month length.
    pub fn new(days_in_month: u32) -> Result<Self, CalendarError> {
        if days_in_month == 0 {
            return Err(CalendarError::InvalidMonthLength(days_in_month));
        }
        Ok(Self {
            days_in_month,
            ..Self::default()
        })
    }

    // -- Reads --

    pub fn player_ticks(&self) -> u64 {
        self.player_ticks
    }

    pub fn calendar_ticks(&self) -> u64 {
        self.calendar_ticks
    }

    pub fn days_in_month(&self) -> u32 {
        self.days_in_month
    }

    pub fn players_online(&self) -> bool {
        self.players_online
    }

    pub fn daylight_cycle_enabled(&self) -> bool {
        self.daylight_cycle_enabled
    }

    /// Calendar ticks into the current day, in `[0, TICKS_IN_DAY)`.
    pub fn time_of_day(&self) -> u64 {
        self.calendar_ticks % TICKS_IN_DAY
    }

    /// Hour of the current day, in `[0, 24)`.
    pub fn hour_of_day(&self) -> u64 {
        (self.calendar_ticks / TICKS_IN_HOUR) % HOURS_IN_DAY
    }

    /// Day of the current month, 1-based.
    pub fn day_of_month(&self) -> u32 {
        1 + ((self.calendar_ticks / TICKS_IN_DAY) % u64::from(self.days_in_month)) as u32
    }

    /// Month of the current year, in `[0, 12)`.
    pub fn month_of_year(&self) -> u32 {
        ((self.calendar_ticks / self.ticks_in_month()) % MONTHS_IN_YEAR) as u32
    }

    /// Whole days elapsed since the calendar epoch.
    pub fn total_calendar_days(&self) -> u64 {
        self.calendar_ticks / TICKS_IN_DAY
    }

    /// Whole months elapsed since the calendar epoch.
    pub fn total_calendar_months(&self) -> u64 {
        self.calendar_ticks / self.ticks_in_month()
    }

    /// Whole years elapsed since the calendar epoch.
    pub fn total_calendar_years(&self) -> u64 {
        self.calendar_ticks / (MONTHS_IN_YEAR * self.ticks_in_month())
    }

    /// Progress through the current day in `[0, 1)`. 0 is midnight,
    /// 0.5 is noon.
    pub fn fraction_of_day(&self) -> f32 {
        (self.calendar_ticks % TICKS_IN_DAY) as f32 / TICKS_IN_DAY as f32
    }

    /// Progress through the current year in `[0, 1)`.
    pub fn fraction_of_year(&self) -> f32 {
        let ticks_in_year = MONTHS_IN_YEAR * self.ticks_in_month();
        (self.calendar_ticks % ticks_in_year) as f32 / ticks_in_year as f32
    }

    fn ticks_in_month(&self) -> u64 {
        u64::from(self.days_in_month) * TICKS_IN_DAY
    }

    // -- Per-tick advancement --

    /// Advance one world tick. Returns `true` when a periodic sync payload
    /// is due (every [`SYNC_INTERVAL`] ticks).
    pub fn tick(&mut self) -> bool {
        if self.players_online {
            self.player_ticks += 1;
            if self.daylight_cycle_enabled {
                self.calendar_ticks += 1;
            }
        }
        self.sync_counter += 1;
        if self.sync_counter >= SYNC_INTERVAL {
            self.sync_counter = 0;
            true
        } else {
            false
        }
    }

    /// Compare calendar time-of-day against the host oracle and repair any
    /// drift beyond [`DRIFT_THRESHOLD`]. The online flag is re-derived from
    /// the authoritative player count at the same time, since stale gating
    /// is the usual cause of drift.
    ///
    /// If the oracle lags, the oracle is advanced; if the oracle leads, the
    /// calendar jumps forward. Idempotent once the two agree within the
    /// threshold.
    pub fn reconcile(
        &mut self,
        oracle: &mut dyn TimeOracle,
        online_players: u32,
    ) -> Option<DriftCorrection> {
        let oracle_time = oracle.time_of_day() % TICKS_IN_DAY;
        let delta = oracle_time as i64 - self.time_of_day() as i64;
        if delta.abs() <= DRIFT_THRESHOLD {
            return None;
        }

        tracing::warn!(
            calendar_ticks = self.calendar_ticks,
            player_ticks = self.player_ticks,
            oracle_time,
            delta,
            "calendar and host time are out of sync, repairing"
        );

        let online_now = online_players > 0;
        if online_now != self.players_online {
            tracing::info!(online_now, "correcting stale players-online flag");
            self.players_online = online_now;
        }

        if delta < 0 {
            // Calendar is ahead: advance the oracle to catch up.
            oracle.set_time_of_day(oracle.time_of_day() + delta.unsigned_abs());
            tracing::info!(by = -delta, "advanced host time to match calendar");
        } else {
            // Oracle is ahead: jump the calendar forward.
            self.calendar_ticks += delta as u64;
            tracing::info!(by = delta, "advanced calendar to match host time");
        }
        Some(DriftCorrection { delta })
    }

    // -- Explicit time jumps --

    /// Jump both clocks so that calendar time equals `target`, and forward
    /// the same delta to the host oracle so it stays consistent. Returns
    /// the signed jump applied.
    pub fn set_time_from_calendar_time(
        &mut self,
        target: u64,
        oracle: &mut dyn TimeOracle,
    ) -> i64 {
        let jump = target as i64 - self.calendar_ticks as i64;
        self.calendar_ticks = target;
        self.player_ticks = self.player_ticks.wrapping_add_signed(jump);
        oracle.set_time_of_day(oracle.time_of_day().wrapping_add_signed(jump));
        jump
    }

    /// Jump both clocks forward so that calendar time-of-day equals the
    /// given oracle time-of-day (e.g. sleeping skips to morning). Always
    /// moves forward, wrapping across midnight. The oracle itself is
    /// assumed to already be at the target. Returns the ticks skipped.
    pub fn set_time_from_oracle_time(&mut self, oracle_time_of_day: u64) -> u64 {
        let target = oracle_time_of_day % TICKS_IN_DAY;
        let mut jump = target as i64 - self.time_of_day() as i64;
        if jump < 0 {
            jump += TICKS_IN_DAY as i64;
        }
        self.calendar_ticks += jump as u64;
        self.player_ticks += jump as u64;
        jump as u64
    }

    /// Change the month length, preserving elapsed months and time-of-day
    /// exactly. The day-within-month is rescaled to the same fractional
    /// position under the new length, rounding down.
    pub fn set_month_length(&mut self, new_days: u32) -> Result<(), CalendarError> {
        if new_days == 0 {
            return Err(CalendarError::InvalidMonthLength(new_days));
        }
        let base_months = self.total_calendar_months();
        let base_day_time = self.calendar_ticks - self.total_calendar_days() * TICKS_IN_DAY;
        let month_fraction =
            f64::from(self.day_of_month() - 1) / f64::from(self.days_in_month);
        let new_day_of_month = (month_fraction * f64::from(new_days)) as u64;

        self.days_in_month = new_days;
        self.calendar_ticks =
            (base_months * u64::from(new_days) + new_day_of_month) * TICKS_IN_DAY + base_day_time;
        Ok(())
    }

    // -- Gates --

    pub fn set_players_online(&mut self, online: bool) {
        self.players_online = online;
    }

    pub fn set_daylight_cycle_enabled(&mut self, enabled: bool) {
        self.daylight_cycle_enabled = enabled;
    }

    // -- Transactions --

    /// Open a scoped time shift. Offsets added through the returned guard
    /// are removed when the guard drops, even across a panic in between,
    /// so code can run "as if" at a different time without permanently
    /// mutating the clocks. Nested shifts stack additively.
    pub fn transaction(&mut self) -> TimeShift<'_> {
        TimeShift {
            calendar: self,
            player_delta: 0,
            calendar_delta: 0,
        }
    }

    /// Run `body` with both clocks shifted by the given offsets. The
    /// offsets are removed on the way out regardless of how `body` exits.
    pub fn with_time_shift<R>(
        &mut self,
        player_offset: i64,
        calendar_offset: i64,
        body: impl FnOnce(&mut Calendar) -> R,
    ) -> R {
        let mut shift = self.transaction();
        shift.add(player_offset, calendar_offset);
        body(shift.calendar())
    }
}

// ---------------------------------------------------------------------------
// TimeShift
// ---------------------------------------------------------------------------

/// A scoped, reversible shift of both clocks.
///
/// Accumulates the offsets applied through [`TimeShift::add`] and
/// subtracts the net shift in `Drop`. Because offsets commute, nested
/// shifts need no reentrancy bookkeeping beyond this.
#[derive(Debug)]
pub struct TimeShift<'a> {
    calendar: &'a mut Calendar,
    player_delta: i64,
    calendar_delta: i64,
}

impl TimeShift<'_> {
    /// Shift both clocks by the given signed offsets, on top of any shift
    /// already applied through this guard.
    pub fn add(&mut self, player_offset: i64, calendar_offset: i64) {
        self.calendar.player_ticks = self.calendar.player_ticks.wrapping_add_signed(player_offset);
        self.calendar.calendar_ticks =
            self.calendar.calendar_ticks.wrapping_add_signed(calendar_offset);
        self.player_delta += player_offset;
        self.calendar_delta += calendar_offset;
    }

    /// Access the shifted calendar, e.g. to read derived time values or to
    /// open a nested shift.
    pub fn calendar(&mut self) -> &mut Calendar {
        self.calendar
    }
}

impl Drop for TimeShift<'_> {
    fn drop(&mut self) {
        self.calendar.player_ticks = self.calendar.player_ticks.wrapping_add_signed(-self.player_delta);
        self.calendar.calendar_ticks =
            self.calendar.calendar_ticks.wrapping_add_signed(-self.calendar_delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FixedOracle;

    fn active_calendar() -> Calendar {
        let mut calendar = Calendar::default();
        calendar.set_players_online(true);
        calendar
    }

    #[test]
    fn tick_requires_players_online() {
        let mut calendar = Calendar::default();
        calendar.tick();
        assert_eq!(calendar.player_ticks(), 0);
        assert_eq!(calendar.calendar_ticks(), 0);

        calendar.set_players_online(true);
        calendar.tick();
        assert_eq!(calendar.player_ticks(), 1);
        assert_eq!(calendar.calendar_ticks(), 1);
    }

    #[test]
    fn calendar_ticks_pause_without_daylight_cycle() {
        let mut calendar = active_calendar();
        calendar.set_daylight_cycle_enabled(false);
        for _ in 0..5 {
            calendar.tick();
        }
        assert_eq!(calendar.player_ticks(), 5);
        assert_eq!(calendar.calendar_ticks(), 0);
    }

    #[test]
    fn sync_due_every_interval() {
        let mut calendar = active_calendar();
        let mut syncs = 0;
        for _ in 0..(SYNC_INTERVAL * 3) {
            if calendar.tick() {
                syncs += 1;
            }
        }
        assert_eq!(syncs, 3);
    }

    #[test]
    fn invalid_month_length_rejected() {
        assert_eq!(
            Calendar::new(0).unwrap_err(),
            CalendarError::InvalidMonthLength(0)
        );
        let mut calendar = Calendar::default();
        assert!(calendar.set_month_length(0).is_err());
        assert_eq!(calendar.days_in_month(), DEFAULT_MONTH_LENGTH);
    }

    #[test]
    fn month_rescale_preserves_fraction_and_hour() {
        let mut calendar = Calendar::new(30).unwrap();
        // Day 15 (1-based), hour 12.
        calendar.calendar_ticks = 14 * TICKS_IN_DAY + 12 * TICKS_IN_HOUR;
        assert_eq!(calendar.day_of_month(), 15);
        assert_eq!(calendar.hour_of_day(), 12);

        calendar.set_month_length(60).unwrap();

        // (15 - 1) / 30 of the way through the month, floored to a day.
        assert_eq!(calendar.day_of_month(), 29);
        assert_eq!(calendar.hour_of_day(), 12);
        let old_fraction = 14.0 / 30.0;
        let new_fraction = f64::from(calendar.day_of_month() - 1) / 60.0;
        assert!((old_fraction - new_fraction).abs() < 1.0 / 60.0 + 1e-9);
    }

    #[test]
    fn month_rescale_preserves_elapsed_months() {
        let mut calendar = Calendar::new(8).unwrap();
        calendar.calendar_ticks = 5 * 8 * TICKS_IN_DAY + 3 * TICKS_IN_DAY + 7 * TICKS_IN_HOUR;
        let months_before = calendar.total_calendar_months();

        calendar.set_month_length(20).unwrap();

        assert_eq!(calendar.total_calendar_months(), months_before);
        assert_eq!(calendar.hour_of_day(), 7);
    }

    #[test]
    fn calendar_time_jump_moves_both_clocks_and_oracle() {
        let mut calendar = active_calendar();
        for _ in 0..100 {
            calendar.tick();
        }
        let mut oracle = FixedOracle::new(100);

        let jump = calendar.set_time_from_calendar_time(2_500, &mut oracle);
        assert_eq!(jump, 2_400);
        assert_eq!(calendar.calendar_ticks(), 2_500);
        assert_eq!(calendar.player_ticks(), 2_500);
        assert_eq!(oracle.time_of_day(), 2_500);
    }

    #[test]
    fn oracle_time_jump_always_moves_forward() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 20_000;
        calendar.player_ticks = 20_000;

        // Target earlier in the day: wraps across midnight.
        let skipped = calendar.set_time_from_oracle_time(1_000);
        assert_eq!(skipped, TICKS_IN_DAY - 19_000);
        assert_eq!(calendar.time_of_day(), 1_000);
        assert_eq!(calendar.player_ticks(), 20_000 + skipped);
    }

    #[test]
    fn reconcile_advances_lagging_calendar() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 50;
        let mut oracle = FixedOracle::new(80);

        let correction = calendar.reconcile(&mut oracle, 1).unwrap();
        assert_eq!(correction.delta, 30);
        assert_eq!(calendar.time_of_day(), 80);
        assert_eq!(oracle.time_of_day(), 80);
    }

    #[test]
    fn reconcile_advances_lagging_oracle() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 80;
        let mut oracle = FixedOracle::new(50);

        let correction = calendar.reconcile(&mut oracle, 1).unwrap();
        assert_eq!(correction.delta, -30);
        assert_eq!(oracle.time_of_day(), 80);
        assert_eq!(calendar.calendar_ticks(), 80);
    }

    #[test]
    fn reconcile_is_idempotent_once_within_threshold() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 80;
        let mut oracle = FixedOracle::new(50);

        assert!(calendar.reconcile(&mut oracle, 1).is_some());
        assert!(calendar.reconcile(&mut oracle, 1).is_none());
        assert_eq!(oracle.time_of_day(), 80);
        assert_eq!(calendar.calendar_ticks(), 80);
    }

    #[test]
    fn reconcile_tolerates_single_tick_drift() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 50;
        let mut oracle = FixedOracle::new(51);
        assert!(calendar.reconcile(&mut oracle, 1).is_none());
    }

    #[test]
    fn reconcile_repairs_stale_online_flag() {
        let mut calendar = Calendar::default();
        calendar.calendar_ticks = 50;
        let mut oracle = FixedOracle::new(100);

        assert!(!calendar.players_online());
        calendar.reconcile(&mut oracle, 2);
        assert!(calendar.players_online());
    }

    #[test]
    fn time_shift_restores_on_drop() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 1_000;
        calendar.player_ticks = 2_000;

        {
            let mut shift = calendar.transaction();
            shift.add(500, -300);
            assert_eq!(shift.calendar().player_ticks(), 2_500);
            assert_eq!(shift.calendar().calendar_ticks(), 700);
        }
        assert_eq!(calendar.player_ticks(), 2_000);
        assert_eq!(calendar.calendar_ticks(), 1_000);
    }

    #[test]
    fn nested_time_shifts_stack_and_unwind() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 10_000;
        calendar.player_ticks = 10_000;

        calendar.with_time_shift(100, 200, |outer| {
            assert_eq!(outer.player_ticks(), 10_100);
            assert_eq!(outer.calendar_ticks(), 10_200);
            outer.with_time_shift(-50, 25, |inner| {
                assert_eq!(inner.player_ticks(), 10_050);
                assert_eq!(inner.calendar_ticks(), 10_225);
            });
            assert_eq!(outer.player_ticks(), 10_100);
            assert_eq!(outer.calendar_ticks(), 10_200);
        });
        assert_eq!(calendar.player_ticks(), 10_000);
        assert_eq!(calendar.calendar_ticks(), 10_000);
    }

    #[test]
    fn time_shift_unwinds_across_panic() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 7_777;
        calendar.player_ticks = 8_888;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            calendar.with_time_shift(1_000, 1_000, |shifted| {
                shifted.with_time_shift(5, 5, |_| panic!("boom"));
            });
        }));
        assert!(result.is_err());
        assert_eq!(calendar.player_ticks(), 8_888);
        assert_eq!(calendar.calendar_ticks(), 7_777);
    }

    #[test]
    fn shifted_reads_see_the_offset() {
        let mut calendar = active_calendar();
        calendar.calendar_ticks = 6 * TICKS_IN_HOUR;
        calendar.with_time_shift(0, 6 * TICKS_IN_HOUR as i64, |shifted| {
            assert_eq!(shifted.hour_of_day(), 12);
        });
        assert_eq!(calendar.hour_of_day(), 6);
    }
}
