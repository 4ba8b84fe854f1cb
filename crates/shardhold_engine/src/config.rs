//! Tunables for the character cache and the partition registry.

use serde::{Deserialize, Serialize};
use shardhold_foundation::MapId;

/// What happens to dirty flags when a save fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Keep the flags so the next autosave retries.
    #[default]
    RetainDirtyFlag,
    /// Drop the flags; the failed changes are only saved again if marked anew.
    ClearDirtyFlag,
}

/// Character cache settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between autosaves of a connected character.
    pub save_interval_seconds: f32,
    /// Seconds a disconnected character stays cached.
    pub timeout_seconds: f32,
    /// Dirty flag handling on save failure.
    pub error_policy: ErrorPolicy,
    /// Map used when no other map is known. Map id 0 resolves here.
    pub default_map: MapId,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            save_interval_seconds: 30.0,
            timeout_seconds: 60.0,
            error_policy: ErrorPolicy::default(),
            default_map: MapId::DEFAULT,
        }
    }
}

impl CacheConfig {
    /// Short intervals for tests: 0.1s autosave, 0.2s timeout.
    #[must_use]
    pub fn testing() -> Self {
        Self {
            save_interval_seconds: 0.1,
            timeout_seconds: 0.2,
            ..Self::default()
        }
    }

    /// Sets the autosave interval.
    #[must_use]
    pub fn with_save_interval(mut self, seconds: f32) -> Self {
        self.save_interval_seconds = seconds;
        self
    }

    /// Sets the disconnect timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f32) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the save error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Sets the default map. An unset map id keeps [`MapId::DEFAULT`].
    #[must_use]
    pub fn with_default_map(mut self, map: MapId) -> Self {
        self.default_map = map.or(MapId::DEFAULT);
        self
    }
}

/// Partition registry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Entity capacity reserved for each new world.
    pub world_reserve: usize,
    /// Upper bound on live worlds. `None` means unbounded.
    pub max_worlds: Option<usize>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            world_reserve: 1000,
            max_worlds: None,
        }
    }
}

impl RegistryConfig {
    /// Sets the per-world reserve.
    #[must_use]
    pub fn with_world_reserve(mut self, reserve: usize) -> Self {
        self.world_reserve = reserve;
        self
    }

    /// Caps the number of worlds.
    #[must_use]
    pub fn with_max_worlds(mut self, max: usize) -> Self {
        self.max_worlds = Some(max);
        self
    }
}
