//! Sync payloads and persisted snapshots.
//!
//! Both use binary serialization via `bitcode`. Snapshots carry a
//! versioned header so a save from a different format version is detected
//! before any field is interpreted. Payload and snapshot layouts are flat
//! fixed-width records; compatibility beyond additive field appends is out
//! of scope.

use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::collapse::Collapse;
use crate::deferred::TickEntry;
use crate::rng::SimRng;
use crate::settings::TrackerSettings;
use crate::weather::WeatherSignal;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a tracker snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x570E_FA11;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Sync payload
// ---------------------------------------------------------------------------

/// The periodic network sync snapshot: every clock and weather field a
/// client needs to render time and rain locally. All fixed-width scalars,
/// order-stable; new fields append only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub days_in_month: u32,
    pub player_time: u64,
    pub calendar_time: u64,
    pub daylight_cycle_enabled: bool,
    pub players_online: bool,
    pub rain_start_tick: u64,
    pub rain_end_tick: u64,
    pub rain_intensity: f32,
}

impl SyncPayload {
    /// Snapshot the current calendar and weather state.
    pub fn capture(calendar: &Calendar, weather: &WeatherSignal) -> Self {
        Self {
            days_in_month: calendar.days_in_month(),
            player_time: calendar.player_ticks(),
            calendar_time: calendar.calendar_ticks(),
            daylight_cycle_enabled: calendar.daylight_cycle_enabled(),
            players_online: calendar.players_online(),
            rain_start_tick: weather.rain_start_tick(),
            rain_end_tick: weather.rain_end_tick(),
            rain_intensity: weather.rain_intensity(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    pub fn decode(data: &[u8]) -> Result<Self, DeserializeError> {
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every persisted snapshot. Enables format detection
/// and version checking before the payload is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Player tick at which the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tracker snapshot
// ---------------------------------------------------------------------------

/// The full persisted state of one world tracker: the sync payload fields
/// plus the pending re-check queues, in-progress collapses, RNG state, and
/// settings. Queues are flushed before capture so the snapshot is a single
/// flat list per queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub header: SnapshotHeader,
    pub calendar: Calendar,
    pub weather: WeatherSignal,
    /// Pending landslide re-checks (position + remaining ticks).
    pub landslide_entries: Vec<TickEntry>,
    /// Pending isolation checks, packed positions.
    pub isolated_positions: Vec<u64>,
    /// In-progress collapses (center, frontier, radius).
    pub collapses: Vec<Collapse>,
    pub rng: SimRng,
    pub settings: TrackerSettings,
}

/// Encode a snapshot to bytes.
pub fn encode_snapshot(snapshot: &TrackerSnapshot) -> Result<Vec<u8>, SerializeError> {
    bitcode::serialize(snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
}

/// Decode and header-validate a snapshot.
pub fn decode_snapshot(data: &[u8]) -> Result<TrackerSnapshot, DeserializeError> {
    let snapshot: TrackerSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_payload_round_trip() {
        let mut calendar = Calendar::default();
        calendar.set_players_online(true);
        for _ in 0..123 {
            calendar.tick();
        }
        let weather = WeatherSignal::new(100, 2_100, 0.7);

        let payload = SyncPayload::capture(&calendar, &weather);
        let decoded = SyncPayload::decode(&payload.encode().unwrap()).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded.player_time, 123);
        assert_eq!(decoded.rain_intensity, 0.7);
    }

    #[test]
    fn header_rejects_wrong_magic() {
        let header = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            version: FORMAT_VERSION,
            tick: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn header_rejects_future_version() {
        let header = SnapshotHeader {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION + 1,
            tick: 0,
        };
        assert!(matches!(
            header.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            decode_snapshot(&[0u8; 7]),
            Err(DeserializeError::Decode(_))
        ));
    }
}
