//! Durable identifiers for characters and maps.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Durable character identifier, stable across logins and partitions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CharacterId(pub u32);

impl CharacterId {
    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CharacterId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Map identifier. Every map is owned by exactly one partition.
///
/// `MapId(0)` means "unset" and is normalized to a default map by callers
/// that resolve partitions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MapId(pub u32);

impl MapId {
    /// The "unset" map id.
    pub const UNSET: MapId = MapId(0);

    /// The map new characters start on unless configured otherwise.
    pub const DEFAULT: MapId = MapId(1);

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true for the "unset" id.
    #[must_use]
    pub const fn is_unset(self) -> bool {
        self.0 == 0
    }

    /// Replaces the "unset" id with `fallback`.
    #[must_use]
    pub const fn or(self, fallback: MapId) -> MapId {
        if self.is_unset() { fallback } else { self }
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for MapId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
