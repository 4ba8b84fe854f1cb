//! Partition-scoped entity handles with generational indices.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle to an entity inside one partition's entity table.
///
/// The generation counter changes every time a slot is freed or reused, so a
/// handle that outlives its entity is detectably stale instead of silently
/// aliasing whatever entity now occupies the slot.
///
/// A handle is only meaningful to the table that produced it. Two tables can
/// hand out equal handles for unrelated entities.
///
/// # Layout
/// - `index`: slot in the owning table
/// - `generation`: odd while the slot is alive, even while it is free
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityHandle {
    /// Slot index in the owning table.
    pub index: u64,
    /// Generation counter for stale handle detection.
    pub generation: u32,
}

impl EntityHandle {
    /// Creates a handle with the given index and generation.
    #[must_use]
    pub const fn new(index: u64, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns a sentinel value representing "no entity".
    ///
    /// Uses `u64::MAX` as the index, which is never allocated.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u64::MAX,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u64::MAX
    }

    /// Packs the handle into a single integer for log output.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        (self.index << 32) | self.generation as u64
    }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "EntityHandle(null)")
        } else {
            write!(f, "EntityHandle({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "entity(null)")
        } else {
            write!(f, "entity({}v{})", self.index, self.generation)
        }
    }
}
