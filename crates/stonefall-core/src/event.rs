//! Tracker events.
//!
//! Events are informational: they never feed back into the simulation.
//! The tracker buffers them during a tick and the host drains them
//! afterwards on the same thread, typically to play sounds, send packets,
//! or update displays. Delivery is fire-and-forget; a dropped sync payload
//! is repaired by the next periodic sync.

use crate::pos::BlockPos;
use crate::serialize::SyncPayload;

/// An event produced during a tracker tick, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// Periodic or on-demand state snapshot for network sync.
    Sync(SyncPayload),

    /// A collapse ran a propagation round. Carries the updated geometry.
    CollapseAdvanced {
        center: BlockPos,
        frontier_len: usize,
        radius_squared: f64,
        collapsed: Vec<BlockPos>,
    },

    /// A collapse's frontier emptied and it was retired.
    CollapseFinished { center: BlockPos },

    /// A deferred landslide re-check expired and ran.
    LandslideTriggered { pos: BlockPos },

    /// An isolated block was broken.
    IsolationBroken { pos: BlockPos },

    /// The stored rain event was replaced.
    RainEventChanged {
        rain_start_tick: u64,
        rain_end_tick: u64,
        rain_intensity: f32,
    },

    /// The calendar repaired drift against the host clock.
    DriftCorrected { delta: i64 },
}
