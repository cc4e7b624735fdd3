//! Shared test fixtures: a scripted block world, a controllable time
//! oracle, and a fixed player roster.
//!
//! Available to dependent crates via the `test-utils` feature.

use std::collections::BTreeMap;

use crate::calendar::Calendar;
use crate::hooks::{PlayerRoster, TimeOracle, WorldModel};
use crate::pos::{BlockPos, Face};

// ---------------------------------------------------------------------------
// GridWorld
// ---------------------------------------------------------------------------

/// One scripted block.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    pub unstable: bool,
    pub can_fall: bool,
    pub breaks_when_isolated: bool,
}

impl Cell {
    /// A block that participates fully in collapse cascades.
    pub fn loose() -> Self {
        Self {
            unstable: true,
            can_fall: true,
            breaks_when_isolated: false,
        }
    }
}

/// A scripted in-memory world. Records every mutation the tracker asks
/// for, so tests can assert on exact effect sequences.
#[derive(Debug, Clone, Default)]
pub struct GridWorld {
    cells: BTreeMap<BlockPos, Cell>,
    pub collapsed: Vec<BlockPos>,
    pub landslides: Vec<BlockPos>,
    pub destroyed: Vec<BlockPos>,
}

impl GridWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cell(&mut self, pos: BlockPos, cell: Cell) {
        self.cells.insert(pos, cell);
    }

    /// Fill a vertical column of loose blocks at the x/z of `pos`, from
    /// `y_min` to `y_max` inclusive.
    pub fn fill_column(&mut self, pos: BlockPos, y_min: i32, y_max: i32) {
        for y in y_min..=y_max {
            self.set_cell(BlockPos::new(pos.x, y, pos.z), Cell::loose());
        }
    }

    /// Fill a box of loose blocks, corners inclusive.
    pub fn fill_box(&mut self, min: BlockPos, max: BlockPos) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    self.set_cell(BlockPos::new(x, y, z), Cell::loose());
                }
            }
        }
    }

    /// Place a block that breaks when isolated (not collapse-eligible).
    pub fn set_breaks_when_isolated(&mut self, pos: BlockPos) {
        self.set_cell(
            pos,
            Cell {
                breaks_when_isolated: true,
                ..Default::default()
            },
        );
    }

    pub fn is_solid(&self, pos: BlockPos) -> bool {
        self.cells.contains_key(&pos)
    }
}

impl WorldModel for GridWorld {
    fn is_unstable(&self, pos: BlockPos) -> bool {
        self.cells.get(&pos).is_some_and(|c| c.unstable)
    }

    fn can_fall(&self, pos: BlockPos) -> bool {
        self.cells.get(&pos).is_some_and(|c| c.can_fall)
    }

    fn collapse_at(&mut self, pos: BlockPos) -> bool {
        if self.cells.remove(&pos).is_some() {
            self.collapsed.push(pos);
            true
        } else {
            false
        }
    }

    fn landslide_at(&mut self, pos: BlockPos) {
        self.cells.remove(&pos);
        self.landslides.push(pos);
    }

    fn breaks_when_isolated(&self, pos: BlockPos) -> bool {
        self.cells.get(&pos).is_some_and(|c| c.breaks_when_isolated)
    }

    fn is_isolated(&self, pos: BlockPos) -> bool {
        Face::ALL
            .iter()
            .all(|face| !self.is_solid(pos.relative(*face)))
    }

    fn destroy_isolated(&mut self, pos: BlockPos) {
        self.cells.remove(&pos);
        self.destroyed.push(pos);
    }
}

// ---------------------------------------------------------------------------
// FixedOracle
// ---------------------------------------------------------------------------

/// A time oracle backed by a plain counter.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle {
    time: u64,
}

impl FixedOracle {
    pub fn new(time: u64) -> Self {
        Self { time }
    }

    /// An oracle starting in agreement with the given calendar.
    pub fn tracking(calendar: &Calendar) -> Self {
        Self::new(calendar.time_of_day())
    }

    pub fn advance(&mut self, ticks: u64) {
        self.time += ticks;
    }
}

impl TimeOracle for FixedOracle {
    fn time_of_day(&self) -> u64 {
        self.time
    }

    fn set_time_of_day(&mut self, time: u64) {
        self.time = time;
    }
}

// ---------------------------------------------------------------------------
// CountRoster
// ---------------------------------------------------------------------------

/// A roster reporting a fixed player count.
#[derive(Debug, Clone, Copy)]
pub struct CountRoster(pub u32);

impl PlayerRoster for CountRoster {
    fn players_online(&self) -> u32 {
        self.0
    }
}
