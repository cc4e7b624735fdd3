//! The per-world tracker: owner of all tracker state and the tick driver.
//!
//! One `WorldTracker` exists per loaded world. It is constructed at world
//! load (fresh or from a snapshot), ticked once per world tick on the tick
//! thread, and saved back to a snapshot on unload. External callers only
//! read state or request mutations through its API; cross-thread callers
//! (e.g. network command handlers) must marshal onto the tick thread
//! rather than touch these structures directly.

use crate::calendar::{Calendar, CalendarError};
use crate::collapse::Collapse;
use crate::deferred::{DeferredQueue, TickEntry};
use crate::event::TrackerEvent;
use crate::hooks::{ClimateModel, PlayerRoster, TimeOracle, UniformClimate, WorldModel};
use crate::pos::BlockPos;
use crate::rng::SimRng;
use crate::serialize::{
    self, DeserializeError, SerializeError, SnapshotHeader, SyncPayload, TrackerSnapshot,
};
use crate::settings::{SettingsError, TrackerSettings};
use crate::weather::WeatherSignal;

// ---------------------------------------------------------------------------
// WorldTracker
// ---------------------------------------------------------------------------

/// Per-world event tracker and dual-clock scheduler.
#[derive(Debug)]
pub struct WorldTracker {
    calendar: Calendar,
    weather: WeatherSignal,

    /// Pending landslide re-checks, deferred across passes.
    landslide_ticks: DeferredQueue<TickEntry>,
    /// Pending isolation checks, deferred across passes.
    isolated_positions: DeferredQueue<BlockPos>,
    /// In-progress cascading collapses.
    collapses_in_progress: Vec<Collapse>,

    rng: SimRng,
    settings: TrackerSettings,

    /// Host-installed climate model; `default_climate` applies until then.
    climate: Option<Box<dyn ClimateModel>>,
    default_climate: UniformClimate,

    /// Events buffered during a tick, drained by the host afterwards.
    events: Vec<TrackerEvent>,
}

impl WorldTracker {
    /// Create a fresh tracker with default settings.
    pub fn new(seed: u64) -> Self {
        Self {
            calendar: Calendar::default(),
            weather: WeatherSignal::default(),
            landslide_ticks: DeferredQueue::new(),
            isolated_positions: DeferredQueue::new(),
            collapses_in_progress: Vec::new(),
            rng: SimRng::new(seed),
            settings: TrackerSettings::default(),
            climate: None,
            default_climate: UniformClimate::default(),
            events: Vec::new(),
        }
    }

    /// Create a fresh tracker with validated settings.
    pub fn with_settings(seed: u64, settings: TrackerSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let mut tracker = Self::new(seed);
        tracker.settings = settings;
        Ok(tracker)
    }

    // -- Reads --

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn weather(&self) -> &WeatherSignal {
        &self.weather
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn player_ticks(&self) -> u64 {
        self.calendar.player_ticks()
    }

    pub fn calendar_ticks(&self) -> u64 {
        self.calendar.calendar_ticks()
    }

    pub fn days_in_month(&self) -> u32 {
        self.calendar.days_in_month()
    }

    pub fn collapses_in_progress(&self) -> &[Collapse] {
        &self.collapses_in_progress
    }

    pub fn pending_landslide_checks(&self) -> usize {
        self.landslide_ticks.len()
    }

    pub fn pending_isolation_checks(&self) -> usize {
        self.isolated_positions.len()
    }

    /// The active climate model (host-installed, or the uniform fallback).
    pub fn climate(&self) -> &dyn ClimateModel {
        match &self.climate {
            Some(model) => model.as_ref(),
            None => &self.default_climate,
        }
    }

    // -- Weather --

    /// Replace the stored rain event. Emits a change event and an
    /// on-demand sync payload.
    pub fn set_rain_event(&mut self, start_tick: u64, end_tick: u64, intensity: f32) {
        self.weather.set_event(start_tick, end_tick, intensity);
        self.events.push(TrackerEvent::RainEventChanged {
            rain_start_tick: self.weather.rain_start_tick(),
            rain_end_tick: self.weather.rain_end_tick(),
            rain_intensity: self.weather.rain_intensity(),
        });
        self.push_sync();
    }

    /// Interpolated rain intensity at `tick`.
    pub fn intensity_at(&self, tick: u64) -> f32 {
        self.weather.intensity_at(tick)
    }

    /// Whether rain is active at `pos` and `tick` under the local climate's
    /// activation threshold.
    pub fn is_raining_at(&self, pos: BlockPos, tick: u64) -> bool {
        self.weather.is_active_at(tick, self.climate().rain_threshold(pos))
    }

    /// Install a climate model, replacing the uniform fallback.
    pub fn set_climate_model(&mut self, model: Box<dyn ClimateModel>) {
        self.climate = Some(model);
    }

    // -- Scheduling --

    /// Schedule a landslide re-check at `pos` after the configured delay.
    /// Safe to call from within a processing pass; the check joins the
    /// next pass.
    pub fn schedule_landslide_check(&mut self, pos: BlockPos) {
        self.landslide_ticks
            .add(TickEntry::new(pos, self.settings.landslide_delay_ticks));
    }

    /// Schedule an isolation check at `pos` for the next pass.
    pub fn schedule_isolation_check(&mut self, pos: BlockPos) {
        self.isolated_positions.add(pos);
    }

    /// Register an in-progress collapse.
    pub fn begin_collapse(&mut self, collapse: Collapse) {
        self.collapses_in_progress.push(collapse);
    }

    /// Start a collapse from a detected failure at `center` involving the
    /// given positions. The radius covers the farthest participant and
    /// each participant rolls the explosion seed chance to join the
    /// frontier.
    pub fn begin_collapse_around(&mut self, center: BlockPos, positions: &[BlockPos]) {
        let collapse = Collapse::around(
            center,
            positions,
            self.settings.explosion_propagate_chance,
            &mut self.rng,
        );
        self.begin_collapse(collapse);
    }

    // -- Calendar mutations (each mirrors a host-visible operation and
    //    emits an on-demand sync) --

    pub fn set_players_online(&mut self, online: bool) {
        self.calendar.set_players_online(online);
        self.push_sync();
    }

    pub fn set_daylight_cycle_enabled(&mut self, enabled: bool) {
        self.calendar.set_daylight_cycle_enabled(enabled);
        self.push_sync();
    }

    /// Jump both clocks to the given calendar time, forwarding the delta
    /// to the host oracle.
    pub fn set_time_from_calendar_time(&mut self, target: u64, oracle: &mut dyn TimeOracle) -> i64 {
        let jump = self.calendar.set_time_from_calendar_time(target, oracle);
        self.push_sync();
        jump
    }

    /// Jump both clocks forward to the given host time-of-day (sleeping).
    /// Returns the ticks skipped.
    pub fn set_time_from_oracle_time(&mut self, oracle_time_of_day: u64) -> u64 {
        let skipped = self.calendar.set_time_from_oracle_time(oracle_time_of_day);
        self.push_sync();
        skipped
    }

    /// Change the month length, preserving the fractional position within
    /// the current month.
    pub fn set_month_length(&mut self, new_days: u32) -> Result<(), CalendarError> {
        self.calendar.set_month_length(new_days)?;
        self.push_sync();
        Ok(())
    }

    /// Run `body` with the calendar shifted by the given offsets; the
    /// shift is removed on the way out regardless of how `body` exits.
    pub fn with_time_shift<R>(
        &mut self,
        player_offset: i64,
        calendar_offset: i64,
        body: impl FnOnce(&Calendar) -> R,
    ) -> R {
        self.calendar
            .with_time_shift(player_offset, calendar_offset, |shifted| body(shifted))
    }

    // -- Events --

    /// Take all events buffered since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<TrackerEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_sync(&mut self) {
        self.events
            .push(TrackerEvent::Sync(SyncPayload::capture(
                &self.calendar,
                &self.weather,
            )));
    }

    // -- Tick driver --

    /// Advance one world tick: clock, collapses, landslide queue,
    /// isolation queue. All work is synchronous and bounded; the weather
    /// signal needs no per-tick work.
    pub fn tick(
        &mut self,
        world: &mut dyn WorldModel,
        oracle: &mut dyn TimeOracle,
        roster: &dyn PlayerRoster,
    ) {
        // Phase 1: clock.
        if self.calendar.tick() {
            self.push_sync();
        }
        if let Some(correction) = self.calendar.reconcile(oracle, roster.players_online()) {
            self.events.push(TrackerEvent::DriftCorrected {
                delta: correction.delta,
            });
            self.push_sync();
        }

        // Phase 2: collapses, gated by a fixed-probability roll per tick.
        if !self.collapses_in_progress.is_empty()
            && self.rng.next_below(self.settings.collapse_trigger_denominator) == 0
        {
            tracing::debug!(
                collapses = self.collapses_in_progress.len(),
                "running collapse propagation pass"
            );
            for collapse in &mut self.collapses_in_progress {
                let collapsed =
                    collapse.propagate(world, &mut self.rng, self.settings.propagate_chance);
                if !collapsed.is_empty() {
                    self.events.push(TrackerEvent::CollapseAdvanced {
                        center: collapse.center(),
                        frontier_len: collapse.frontier().len(),
                        radius_squared: collapse.radius_squared(),
                        collapsed,
                    });
                }
            }
            let events = &mut self.events;
            self.collapses_in_progress.retain(|collapse| {
                if collapse.is_finished() {
                    events.push(TrackerEvent::CollapseFinished {
                        center: collapse.center(),
                    });
                    false
                } else {
                    true
                }
            });
        }

        // Phase 3: landslide re-checks. Unexpired entries re-schedule
        // themselves into the buffer and are seen again next pass.
        self.landslide_ticks.flush();
        let events = &mut self.events;
        self.landslide_ticks.process_and_drain(|mut entry, queue| {
            if entry.countdown() {
                world.landslide_at(entry.pos());
                events.push(TrackerEvent::LandslideTriggered { pos: entry.pos() });
            } else {
                queue.add(entry);
            }
        });

        // Phase 4: isolation checks. Single-shot.
        self.isolated_positions.flush();
        self.isolated_positions.process_and_drain(|pos, _| {
            if world.breaks_when_isolated(pos) && world.is_isolated(pos) {
                world.destroy_isolated(pos);
                events.push(TrackerEvent::IsolationBroken { pos });
            }
        });
    }

    // -- Persistence --

    /// Capture the full tracker state. Flushes both queues first so the
    /// snapshot is a single flat list per queue.
    pub fn to_snapshot(&mut self) -> TrackerSnapshot {
        self.landslide_ticks.flush();
        self.isolated_positions.flush();
        TrackerSnapshot {
            header: SnapshotHeader::new(self.calendar.player_ticks()),
            calendar: self.calendar.clone(),
            weather: self.weather,
            landslide_entries: self.landslide_ticks.iter().copied().collect(),
            isolated_positions: self.isolated_positions.iter().map(BlockPos::to_packed).collect(),
            collapses: self.collapses_in_progress.clone(),
            rng: self.rng.clone(),
            settings: self.settings,
        }
    }

    /// Restore a tracker from a snapshot. The climate model is not
    /// persisted; the host re-installs it after load.
    pub fn from_snapshot(snapshot: TrackerSnapshot) -> Self {
        let mut landslide_ticks = DeferredQueue::new();
        for entry in snapshot.landslide_entries {
            landslide_ticks.add(entry);
        }
        let mut isolated_positions = DeferredQueue::new();
        for packed in snapshot.isolated_positions {
            isolated_positions.add(BlockPos::from_packed(packed));
        }
        Self {
            calendar: snapshot.calendar,
            weather: snapshot.weather,
            landslide_ticks,
            isolated_positions,
            collapses_in_progress: snapshot.collapses,
            rng: snapshot.rng,
            settings: snapshot.settings,
            climate: None,
            default_climate: UniformClimate::default(),
            events: Vec::new(),
        }
    }

    /// Serialize to versioned snapshot bytes.
    pub fn save(&mut self) -> Result<Vec<u8>, SerializeError> {
        serialize::encode_snapshot(&self.to_snapshot())
    }

    /// Deserialize from versioned snapshot bytes.
    pub fn load(data: &[u8]) -> Result<Self, DeserializeError> {
        Ok(Self::from_snapshot(serialize::decode_snapshot(data)?))
    }
}
