//! Map id to entity table resolution.
//!
//! The character cache is written against [`Partitions`] so the same code
//! drives a single shared table (every map aliases it) and a full set of
//! per-map [`World`]s.

use std::collections::BTreeMap;

use shardhold_foundation::MapId;
use shardhold_storage::EntityTable;
use tracing::{info, warn};

use crate::config::RegistryConfig;
use crate::world::World;

/// Resolves map ids to entity tables.
pub trait Partitions {
    /// Table for `map`, if it exists.
    fn table(&self, map: MapId) -> Option<&EntityTable>;

    /// Table for `map`, mutably, if it exists.
    fn table_mut(&mut self, map: MapId) -> Option<&mut EntityTable>;

    /// Table for `map`, creating the partition if needed. `None` if it
    /// cannot be created.
    fn ensure_table(&mut self, map: MapId) -> Option<&mut EntityTable>;

    /// True if both maps resolve to the same table.
    fn shares_table(&self, a: MapId, b: MapId) -> bool;

    /// Every map with a table, ascending.
    fn map_ids(&self) -> Vec<MapId>;
}

/// A lone table stands in for every map.
impl Partitions for EntityTable {
    fn table(&self, _map: MapId) -> Option<&EntityTable> {
        Some(self)
    }

    fn table_mut(&mut self, _map: MapId) -> Option<&mut EntityTable> {
        Some(self)
    }

    fn ensure_table(&mut self, _map: MapId) -> Option<&mut EntityTable> {
        Some(self)
    }

    fn shares_table(&self, _a: MapId, _b: MapId) -> bool {
        true
    }

    fn map_ids(&self) -> Vec<MapId> {
        vec![MapId::DEFAULT]
    }
}

/// The set of live worlds, one per map, ordered by map id.
#[derive(Debug, Default)]
pub struct Worlds {
    worlds: BTreeMap<MapId, World>,
    config: RegistryConfig,
}

impl Worlds {
    /// Creates an empty set.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            worlds: BTreeMap::new(),
            config,
        }
    }

    /// Settings in effect.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// World for `map`.
    #[must_use]
    pub fn get(&self, map: MapId) -> Option<&World> {
        self.worlds.get(&map)
    }

    /// World for `map`, mutably.
    pub fn get_mut(&mut self, map: MapId) -> Option<&mut World> {
        self.worlds.get_mut(&map)
    }

    /// Returns the world for `map`, creating it with room for `reserve`
    /// entities (0 uses the configured reserve). `None` once the world limit
    /// is reached.
    pub fn get_or_create(&mut self, map: MapId, reserve: usize) -> Option<&mut World> {
        if !self.worlds.contains_key(&map) {
            if let Some(max) = self.config.max_worlds {
                if self.worlds.len() >= max {
                    warn!(map_id = map.get(), max_worlds = max, "world limit reached");
                    return None;
                }
            }
            let reserve = if reserve == 0 {
                self.config.world_reserve
            } else {
                reserve
            };
            info!(map_id = map.get(), reserve, "creating world");
            self.worlds.insert(map, World::with_capacity(reserve));
        }
        self.worlds.get_mut(&map)
    }

    /// Number of worlds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.worlds.len()
    }

    /// Returns true if no world exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Iterates worlds in ascending map order.
    pub fn iter(&self) -> impl Iterator<Item = (MapId, &World)> + '_ {
        self.worlds.iter().map(|(map, world)| (*map, world))
    }

    /// Iterates worlds mutably in ascending map order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MapId, &mut World)> + '_ {
        self.worlds.iter_mut().map(|(map, world)| (*map, world))
    }
}

impl Partitions for Worlds {
    fn table(&self, map: MapId) -> Option<&EntityTable> {
        self.get(map).map(World::table)
    }

    fn table_mut(&mut self, map: MapId) -> Option<&mut EntityTable> {
        self.get_mut(map).map(World::table_mut)
    }

    fn ensure_table(&mut self, map: MapId) -> Option<&mut EntityTable> {
        self.get_or_create(map, 0).map(World::table_mut)
    }

    fn shares_table(&self, a: MapId, b: MapId) -> bool {
        a == b
    }

    fn map_ids(&self) -> Vec<MapId> {
        self.worlds.keys().copied().collect()
    }
}
