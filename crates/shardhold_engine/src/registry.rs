//! The per-server context: every partition plus the character cache.
//!
//! There is no global registry. A server builds one [`PartitionRegistry`]
//! and passes it where it is needed.

use shardhold_foundation::MapId;

use crate::codec::{CharacterCodec, StandardCodec};
use crate::config::{CacheConfig, RegistryConfig};
use crate::lifecycle::{CharacterCache, CharacterManager};
use crate::partition::Worlds;
use crate::world::World;

/// Owns one [`World`] per map and the [`CharacterCache`] spanning them.
#[derive(Debug, Default)]
pub struct PartitionRegistry {
    worlds: Worlds,
    characters: CharacterCache,
}

impl PartitionRegistry {
    /// Creates a registry with no worlds.
    #[must_use]
    pub fn new(
        config: RegistryConfig,
        cache: CacheConfig,
        codec: impl CharacterCodec + 'static,
    ) -> Self {
        Self {
            worlds: Worlds::new(config),
            characters: CharacterCache::new(cache, codec),
        }
    }

    /// Creates a registry with the standard codec.
    #[must_use]
    pub fn with_config(config: RegistryConfig, cache: CacheConfig) -> Self {
        Self::new(config, cache, StandardCodec)
    }

    /// World for `map`.
    #[must_use]
    pub fn world(&self, map: MapId) -> Option<&World> {
        self.worlds.get(map)
    }

    /// World for `map`, mutably.
    pub fn world_mut(&mut self, map: MapId) -> Option<&mut World> {
        self.worlds.get_mut(map)
    }

    /// Returns the world for `map`, creating it if needed. A `reserve` of 0
    /// uses the configured reserve. `None` once the world limit is reached.
    pub fn create_world(&mut self, map: MapId, reserve: usize) -> Option<&mut World> {
        self.worlds.get_or_create(map, reserve)
    }

    /// Ticks every world in ascending map order.
    pub fn update_all(&mut self, delta_time: f32) {
        for (_, world) in self.worlds.iter_mut() {
            world.update(delta_time);
        }
    }

    /// Visits every world in ascending map order.
    pub fn for_each_world(&self, mut visit: impl FnMut(MapId, &World)) {
        for (map, world) in self.worlds.iter() {
            visit(map, world);
        }
    }

    /// Visits every world mutably in ascending map order.
    pub fn for_each_world_mut(&mut self, mut visit: impl FnMut(MapId, &mut World)) {
        for (map, world) in self.worlds.iter_mut() {
            visit(map, world);
        }
    }

    /// Number of worlds.
    #[must_use]
    pub fn world_count(&self) -> usize {
        self.worlds.len()
    }

    /// The world set.
    #[must_use]
    pub fn worlds(&self) -> &Worlds {
        &self.worlds
    }

    /// Character operations over this registry's worlds.
    pub fn characters(&mut self) -> CharacterManager<'_, Worlds> {
        self.characters.attach(&mut self.worlds)
    }

    /// The character cache state.
    #[must_use]
    pub fn character_cache(&self) -> &CharacterCache {
        &self.characters
    }

    /// The character cache state, mutably. Use for settings changes.
    pub fn character_cache_mut(&mut self) -> &mut CharacterCache {
        &mut self.characters
    }
}
