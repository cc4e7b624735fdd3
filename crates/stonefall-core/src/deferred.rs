//! Deferred spatial queues.
//!
//! Spatial re-checks are frequently triggered *by the act of re-checking*:
//! a landslide exposes a new unstable position, which must be checked on
//! the next pass, not the current one. [`DeferredQueue`] therefore splits
//! storage into a live list and an append buffer. `add` always writes the
//! buffer; `flush` merges the buffer into the live list at the start of a
//! pass. Every live item is visited exactly once per pass and insertions
//! made during iteration are neither lost nor double-counted.

use serde::{Deserialize, Serialize};

use crate::pos::BlockPos;

// ---------------------------------------------------------------------------
// DeferredQueue
// ---------------------------------------------------------------------------

/// An append-buffered queue with exactly-once-per-pass iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredQueue<T> {
    /// Items visited by the current/next pass.
    live: Vec<T>,
    /// Items added since the last flush, including mid-pass additions.
    buffer: Vec<T>,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            buffer: Vec::new(),
        }
    }

    /// Append an item. Never lands in the live list directly, so adding
    /// during a pass is safe and takes effect on the *next* pass.
    pub fn add(&mut self, item: T) {
        self.buffer.push(item);
    }

    /// Merge buffered items into the live list. Call exactly once at the
    /// start of each processing pass, before iteration.
    pub fn flush(&mut self) {
        self.live.append(&mut self.buffer);
    }

    /// Visit and remove every live item. The queue itself is handed back
    /// to the action so it can re-schedule via [`DeferredQueue::add`];
    /// such re-additions land in the buffer and are picked up by the next
    /// flush. Do not call `flush` from within the action.
    pub fn process_and_drain(&mut self, mut action: impl FnMut(T, &mut DeferredQueue<T>)) {
        let live = std::mem::take(&mut self.live);
        for item in live {
            action(item, self);
        }
    }

    /// Iterate the live list without draining (used by persistence after
    /// a flush).
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.live.iter()
    }

    /// Total items held, live and buffered.
    pub fn len(&self) -> usize {
        self.live.len() + self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.live.clear();
        self.buffer.clear();
    }
}

// ---------------------------------------------------------------------------
// TickEntry
// ---------------------------------------------------------------------------

/// A pending positional re-check with a countdown.
///
/// Created when a structural change schedules a future re-check; expires
/// when the countdown reaches zero, which triggers the re-check action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEntry {
    pos: BlockPos,
    remaining: i32,
}

impl TickEntry {
    pub fn new(pos: BlockPos, delay: i32) -> Self {
        Self {
            pos,
            remaining: delay,
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Count down one pass. Returns `true` once expired.
    pub fn countdown(&mut self) -> bool {
        self.remaining -= 1;
        self.remaining <= 0
    }
}
