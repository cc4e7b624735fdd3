//! Block positions and axis directions.
//!
//! Positions are plain integer triples. A packed 64-bit encoding is
//! provided for the flat position lists in persisted snapshots: 26 bits
//! for `x`, 26 bits for `z`, 12 bits for `y`, all sign-extended on decode.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Packing layout
// ---------------------------------------------------------------------------

const PACKED_X_BITS: u64 = 26;
const PACKED_Z_BITS: u64 = 26;
const PACKED_Y_BITS: u64 = 12;

const PACKED_X_SHIFT: u64 = PACKED_Z_BITS + PACKED_Y_BITS;
const PACKED_Z_SHIFT: u64 = PACKED_Y_BITS;

const PACKED_X_MASK: u64 = (1 << PACKED_X_BITS) - 1;
const PACKED_Z_MASK: u64 = (1 << PACKED_Z_BITS) - 1;
const PACKED_Y_MASK: u64 = (1 << PACKED_Y_BITS) - 1;

fn sign_extend(value: u64, bits: u64) -> i32 {
    let shift = 64 - bits;
    (((value << shift) as i64) >> shift) as i32
}

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// A position in the block grid. Cheap to copy and compare.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The position directly above this one.
    pub const fn above(&self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    /// The position directly below this one.
    pub const fn below(&self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }

    /// The neighbouring position in the given direction.
    pub const fn relative(&self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Squared euclidean distance to another position.
    pub fn dist_sqr(&self, other: &BlockPos) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        let dz = f64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Pack into a single 64-bit word for flat persisted lists.
    pub fn to_packed(&self) -> u64 {
        ((self.x as u64 & PACKED_X_MASK) << PACKED_X_SHIFT)
            | ((self.z as u64 & PACKED_Z_MASK) << PACKED_Z_SHIFT)
            | (self.y as u64 & PACKED_Y_MASK)
    }

    /// Decode a position packed by [`BlockPos::to_packed`].
    pub fn from_packed(packed: u64) -> Self {
        Self::new(
            sign_extend(packed >> PACKED_X_SHIFT, PACKED_X_BITS),
            sign_extend(packed, PACKED_Y_BITS),
            sign_extend(packed >> PACKED_Z_SHIFT, PACKED_Z_BITS),
        )
    }
}

// ---------------------------------------------------------------------------
// Face
// ---------------------------------------------------------------------------

/// The six axis-aligned directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    /// All six faces, in a stable iteration order.
    pub const ALL: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];

    /// Unit offset for this face as `(dx, dy, dz)`.
    pub const fn offset(&self) -> (i32, i32, i32) {
        match self {
            Face::Down => (0, -1, 0),
            Face::Up => (0, 1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::East => (1, 0, 0),
        }
    }
}
