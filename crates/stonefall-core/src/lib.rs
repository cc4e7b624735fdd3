//! Stonefall Core -- per-world event tracking and dual-clock scheduling.
//!
//! This crate provides the simulation backbone for a voxel survival world:
//! a calendar that keeps two independent monotonic clocks reconciled against
//! the host world's time-of-day, deferred spatial re-check queues, a bounded
//! cascading-collapse propagator, and a continuously-interpolated rain
//! signal derived from sparse weather events.
//!
//! # Four-Phase Tick Pipeline
//!
//! Each call to [`tracker::WorldTracker::tick`] advances one world tick
//! through the following phases:
//!
//! 1. **Clock** -- Advance player/calendar time, reconcile drift against the
//!    host time oracle, and emit periodic sync payloads.
//! 2. **Collapse** -- With fixed probability, run one propagation round for
//!    every in-progress collapse.
//! 3. **Landslide** -- Flush the deferred landslide queue and count down
//!    pending re-checks; expired entries trigger the world's landslide
//!    action.
//! 4. **Isolation** -- Flush the deferred isolation queue and break any
//!    position whose six neighbours no longer support it.
//!
//! The weather signal needs no per-tick work; it is a pure function of its
//! three stored scalars and the query tick.
//!
//! # Deferred Mutation Pattern
//!
//! Spatial re-checks frequently schedule further re-checks from within
//! their own processing pass (a landslide exposes a new unstable position).
//! [`deferred::DeferredQueue`] buffers insertions made during iteration and
//! only merges them on the next `flush`, giving deterministic
//! exactly-once-per-pass semantics.
//!
//! # Key Types
//!
//! - [`tracker::WorldTracker`] -- Per-world tick driver and sole owner of
//!   all tracker state.
//! - [`calendar::Calendar`] -- Dual monotonic clocks with drift repair and
//!   panic-safe time-shift transactions.
//! - [`deferred::DeferredQueue`] -- Append-buffered queue for re-entrant
//!   spatial scheduling.
//! - [`collapse::Collapse`] -- One in-progress cascading failure with a
//!   geometrically shrinking radius.
//! - [`weather::WeatherSignal`] -- Sparse rain events exposed as a
//!   continuous intensity function.
//! - [`serialize`] -- Versioned snapshot and sync-payload encoding via
//!   bitcode.

pub mod calendar;
pub mod collapse;
pub mod deferred;
pub mod event;
pub mod hooks;
pub mod pos;
pub mod rng;
pub mod serialize;
pub mod settings;
pub mod tracker;
pub mod weather;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
