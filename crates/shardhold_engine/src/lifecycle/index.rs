//! Character id to (map, entity) index.

use std::collections::HashMap;

use shardhold_foundation::{CharacterId, EntityHandle, MapId};

/// Which entity and which map currently hold each live character.
///
/// Both maps are written together; an entry in one without the other is
/// repaired on lookup.
#[derive(Debug, Default)]
pub(crate) struct CharacterIndex {
    entities: HashMap<CharacterId, EntityHandle>,
    maps: HashMap<CharacterId, MapId>,
}

impl CharacterIndex {
    pub(crate) fn entity(&self, id: CharacterId) -> Option<EntityHandle> {
        self.entities.get(&id).copied()
    }

    pub(crate) fn map(&self, id: CharacterId) -> Option<MapId> {
        self.maps.get(&id).copied()
    }

    pub(crate) fn insert(&mut self, id: CharacterId, map: MapId, entity: EntityHandle) {
        self.entities.insert(id, entity);
        self.maps.insert(id, map);
    }

    pub(crate) fn set_map(&mut self, id: CharacterId, map: MapId) {
        self.maps.insert(id, map);
    }

    pub(crate) fn remove(&mut self, id: CharacterId) {
        self.entities.remove(&id);
        self.maps.remove(&id);
    }

    pub(crate) fn len(&self) -> usize {
        self.entities.len()
    }

    /// Indexed ids, ascending.
    pub(crate) fn ids(&self) -> Vec<CharacterId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
