//! Operations of the lifecycle cache.
//!
//! Every lookup re-validates the index against the partition tables. Entries
//! pointing at dead entities, or at entities whose [`Identity`] names another
//! character, are purged and logged rather than trusted. When the index has
//! lost a character that is still alive in some table, a scan of the
//! `Identity` columns finds it again.

use std::collections::HashMap;

use shardhold_foundation::{
    CharacterCreateRequest, CharacterId, CharacterRecord, EntityHandle, Error, MapId, Position,
    Result,
};
use shardhold_storage::{DirtyFlags, EntityTable, Identity, PersistedState, dirty};
use tracing::{debug, error, warn};

use super::{CharacterCache, SaveResult, SessionState};
use crate::codec::{CharacterCodec, unix_seconds};
use crate::config::ErrorPolicy;
use crate::event::{LifecycleEvent, LifecycleSink};
use crate::partition::Partitions;

/// Flattens a dirty entity into the snapshot map, applying `policy` to the
/// flags if the codec fails.
fn persist(
    codec: &dyn CharacterCodec,
    stored: &mut HashMap<CharacterId, CharacterRecord>,
    policy: ErrorPolicy,
    table: &mut EntityTable,
    id: CharacterId,
    entity: EntityHandle,
) -> SaveResult {
    match codec.flatten(table, entity) {
        Ok(record) => {
            stored.insert(id, record);
            dirty::clear_dirty(table, entity);
            SaveResult::Success
        }
        Err(err) => {
            error!(character_id = id.get(), error = %err, "save failed");
            if policy == ErrorPolicy::ClearDirtyFlag {
                dirty::clear_dirty(table, entity);
            }
            SaveResult::SaveFailed
        }
    }
}

/// Writes map and position onto the entity's state, attaching one if needed.
fn place(table: &mut EntityTable, entity: EntityHandle, map: MapId, position: Option<Position>) {
    if let Some(state) = table.get_or_default::<PersistedState>(entity) {
        state.map_id = map;
        if let Some(position) = position {
            state.position = position;
        }
    }
}

/// The lifecycle cache bound to the partitions it manages.
///
/// Obtained from [`CharacterCache::attach`]. Holding it borrows both sides
/// mutably, so no other code can touch the tables mid-operation.
pub struct CharacterManager<'a, P: Partitions> {
    cache: &'a mut CharacterCache,
    partitions: &'a mut P,
}

impl<'a, P: Partitions> CharacterManager<'a, P> {
    pub(super) fn new(cache: &'a mut CharacterCache, partitions: &'a mut P) -> Self {
        Self { cache, partitions }
    }

    /// The cache state.
    #[must_use]
    pub fn cache(&self) -> &CharacterCache {
        self.cache
    }

    /// The managed partitions.
    #[must_use]
    pub fn partitions(&self) -> &P {
        self.partitions
    }

    fn normalize(&self, map: MapId) -> MapId {
        map.or(self.cache.config.default_map)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the live entity of `id` without creating anything.
    ///
    /// Validates the index entry on every call. Stale or mismatching entries
    /// are removed and `None` is returned.
    pub fn try_get(&mut self, id: CharacterId) -> Option<EntityHandle> {
        let entity = self.cache.index.entity(id)?;
        let Some(map) = self.cache.index.map(id) else {
            self.cache.index.remove(id);
            warn!(character_id = id.get(), "index entry without map removed");
            return None;
        };
        let Some(table) = self.partitions.table(map) else {
            warn!(character_id = id.get(), map_id = map.get(), "indexed map has no partition");
            return None;
        };
        if !table.contains(entity) {
            self.cache.index.remove(id);
            warn!(character_id = id.get(), entity = %entity, "stale index entry removed");
            return None;
        }
        match table.get::<Identity>(entity).map(Identity::id) {
            Some(found) if found == id => Some(entity),
            found => {
                self.cache.index.remove(id);
                error!(
                    character_id = id.get(),
                    entity = %entity,
                    found = ?found,
                    "index points at another character; entry removed"
                );
                None
            }
        }
    }

    /// Map the index places `id` on. Does not validate the entity.
    #[must_use]
    pub fn try_get_map_id(&self, id: CharacterId) -> Option<MapId> {
        self.cache.index.map(id)
    }

    /// Table of the partition holding `id`.
    #[must_use]
    pub fn table(&self, id: CharacterId) -> Option<&EntityTable> {
        let map = self.cache.index.map(id)?;
        self.partitions.table(map)
    }

    /// Table of the partition holding `id`, mutably.
    pub fn table_mut(&mut self, id: CharacterId) -> Option<&mut EntityTable> {
        let map = self.cache.index.map(id)?;
        self.partitions.table_mut(map)
    }

    /// Last stored snapshot of `id`.
    #[must_use]
    pub fn stored_data(&self, id: CharacterId) -> Option<&CharacterRecord> {
        self.cache.stored.get(&id)
    }

    /// Number of indexed characters.
    #[must_use]
    pub fn index_size(&self) -> usize {
        self.cache.index.len()
    }

    /// Session of `id`.
    #[must_use]
    pub fn session(&self, id: CharacterId) -> Option<SessionState> {
        self.cache.session(id)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Returns the entity of `id`, building it if needed.
    ///
    /// The map comes from the index, else the stored snapshot, else the
    /// default map.
    pub fn get_or_create(&mut self, id: CharacterId) -> Option<EntityHandle> {
        let map = self
            .cache
            .index
            .map(id)
            .or_else(|| self.cache.stored.get(&id).map(|record| record.map_id))
            .unwrap_or(self.cache.config.default_map);
        self.get_or_create_in(id, map)
    }

    /// Returns the entity of `id`, building it on `map` if needed.
    ///
    /// A live indexed entity is returned wherever it is. Otherwise the tables
    /// are scanned for an unindexed entity carrying this id; failing that the
    /// stored snapshot is hydrated onto `map`, or a placeholder character is
    /// created and saved right away.
    pub fn get_or_create_in(&mut self, id: CharacterId, map: MapId) -> Option<EntityHandle> {
        let map = self.normalize(map);

        if let Some(entity) = self.try_get(id) {
            self.touch(id);
            return Some(entity);
        }

        if let Some((found_map, entity)) = self.find_unindexed(id, map) {
            match self.index_character(id, found_map, entity) {
                Ok(()) => {
                    self.touch(id);
                    return Some(entity);
                }
                Err(err) => {
                    error!(
                        character_id = id.get(),
                        error = %err,
                        "could not index recovered entity"
                    );
                }
            }
        }

        let snapshot = self.cache.stored.get(&id).cloned();
        let fresh = snapshot.is_none();
        let Some(table) = self.partitions.ensure_table(map) else {
            error!(character_id = id.get(), map_id = map.get(), "partition unavailable");
            return None;
        };
        let built = match snapshot {
            Some(mut record) => {
                record.map_id = map;
                self.cache
                    .codec
                    .hydrate(table, &record)
                    .map(|entity| (entity, Some(record)))
            }
            None => self
                .cache
                .codec
                .create(table, id, &CharacterCreateRequest::placeholder(id))
                .map(|entity| {
                    place(table, entity, map, None);
                    (entity, None)
                }),
        };
        let (entity, record) = match built {
            Ok(built) => built,
            Err(err) => {
                error!(
                    character_id = id.get(),
                    map_id = map.get(),
                    error = %err,
                    "could not build character"
                );
                return None;
            }
        };

        if let Err(err) = self.index_character(id, map, entity) {
            error!(character_id = id.get(), error = %err, "could not index new entity");
            self.destroy_in(map, entity);
            return None;
        }
        if let Some(record) = record {
            self.cache.stored.insert(id, record);
        }
        self.cache.sessions.entry(id).or_default();
        self.touch(id);
        if fresh {
            self.save(id);
        }
        Some(entity)
    }

    /// Creates a character from an explicit request on the default map.
    ///
    /// Refuses (returns `None`) if `id` already has a live entity. On
    /// success the character is saved immediately and
    /// [`LifecycleEvent::CharacterCreated`] is published to `sink`.
    pub fn create_from_request(
        &mut self,
        id: CharacterId,
        request: &CharacterCreateRequest,
        sink: Option<&mut dyn LifecycleSink>,
    ) -> Option<EntityHandle> {
        let map = self.cache.config.default_map;

        if let Some(existing) = self.try_get(id) {
            warn!(
                character_id = id.get(),
                entity = %existing,
                "refusing to create over a live character"
            );
            return None;
        }
        if let Some((found_map, existing)) = self.find_unindexed(id, map) {
            if self.index_character(id, found_map, existing).is_ok() {
                warn!(
                    character_id = id.get(),
                    entity = %existing,
                    "refusing to create over a live character"
                );
                return None;
            }
        }

        let Some(table) = self.partitions.ensure_table(map) else {
            error!(character_id = id.get(), map_id = map.get(), "partition unavailable");
            return None;
        };
        let entity = match self.cache.codec.create(table, id, request) {
            Ok(entity) => entity,
            Err(err) => {
                error!(character_id = id.get(), error = %err, "could not create character");
                return None;
            }
        };
        place(table, entity, map, None);

        if let Err(err) = self.index_character(id, map, entity) {
            error!(character_id = id.get(), error = %err, "could not index new entity");
            self.destroy_in(map, entity);
            return None;
        }
        self.cache.sessions.entry(id).or_default();
        self.touch(id);
        self.save(id);

        if let Some(sink) = sink {
            sink.publish_lifecycle(LifecycleEvent::CharacterCreated {
                character: id,
                entity,
            });
        }
        Some(entity)
    }

    /// Seeds the snapshot of `record.id` and builds it on `record.map_id`,
    /// stamping login and activity times.
    pub fn preload(&mut self, record: CharacterRecord) -> Option<EntityHandle> {
        let id = record.id;
        let map = record.map_id;
        self.cache.stored.insert(id, record);

        let entity = self.get_or_create_in(id, map)?;
        let now = unix_seconds();
        if let Some(state) = self
            .table_mut(id)
            .and_then(|table| table.get_or_default::<PersistedState>(entity))
        {
            state.last_login = now;
            state.last_active = now;
        }
        Some(entity)
    }

    /// Preloads every record, returning how many became live.
    pub fn preload_all(&mut self, records: impl IntoIterator<Item = CharacterRecord>) -> usize {
        records
            .into_iter()
            .filter_map(|record| self.preload(record))
            .count()
    }

    // =========================================================================
    // Movement
    // =========================================================================

    /// Moves `id` to `(x, y)` on `map`, switching partitions if needed.
    pub fn set_position(&mut self, id: CharacterId, x: i32, y: i32, map: MapId) -> bool {
        let map = self.normalize(map);
        if self.cache.index.map(id).is_some_and(|current| current != map) {
            return self.move_to_map_at(id, map, x, y);
        }

        let Some(entity) = self.get_or_create_in(id, map) else {
            return false;
        };
        let Some(table) = self.table_mut(id) else {
            return false;
        };
        place(table, entity, map, Some(Position::new(x, y)));
        dirty::mark_state_dirty(table, entity);
        self.touch(id);
        true
    }

    /// Moves `id` to `map`, keeping its position.
    pub fn move_to_map(&mut self, id: CharacterId, map: MapId) -> bool {
        let Some(entity) = self.try_get(id) else {
            return false;
        };
        let position = self
            .table(id)
            .and_then(|table| table.get::<PersistedState>(entity))
            .map_or_else(Position::default, |state| state.position);
        self.move_to_map_at(id, map, position.x, position.y)
    }

    /// Moves `id` to `(x, y)` on `map`.
    ///
    /// Maps sharing a table update the entity in place. Otherwise the
    /// character is flattened (or taken from its snapshot), hydrated into the
    /// destination, and only then removed from the source, so a failed
    /// hydrate leaves it where it was.
    pub fn move_to_map_at(&mut self, id: CharacterId, map: MapId, x: i32, y: i32) -> bool {
        let map = self.normalize(map);
        let current = self.cache.index.map(id);
        if current == Some(map) {
            return self.set_position(id, x, y, map);
        }

        let mut source = self.try_get(id).zip(current).map(|(entity, from)| (from, entity));
        if source.is_none() {
            // Whatever the index still says about `id` is stale.
            self.cache.index.remove(id);
            if let Some((found_map, entity)) = self.find_unindexed(id, map) {
                if let Err(err) = self.index_character(id, found_map, entity) {
                    error!(
                        character_id = id.get(),
                        error = %err,
                        "could not index recovered entity"
                    );
                    return false;
                }
                if found_map == map {
                    return self.set_position(id, x, y, map);
                }
                source = Some((found_map, entity));
            }
        }
        if self.partitions.ensure_table(map).is_none() {
            error!(
                character_id = id.get(),
                map_id = map.get(),
                "destination partition unavailable"
            );
            return false;
        }

        if let Some((from, entity)) = source {
            if self.partitions.shares_table(from, map) {
                let Some(table) = self.partitions.table_mut(map) else {
                    return false;
                };
                place(table, entity, map, Some(Position::new(x, y)));
                dirty::mark_state_dirty(table, entity);
                self.cache.index.set_map(id, map);
                self.touch(id);
                return true;
            }
        }

        let record = match source {
            Some((from, entity)) => {
                let Some(table) = self.partitions.table(from) else {
                    return false;
                };
                match self.cache.codec.flatten(table, entity) {
                    Ok(record) => record,
                    Err(err) => {
                        error!(character_id = id.get(), error = %err, "could not flatten for move");
                        return false;
                    }
                }
            }
            None => match self.cache.stored.get(&id).cloned() {
                Some(record) => record,
                None => return self.spawn_at(id, map, x, y),
            },
        };
        self.relocate(id, source, record, map, Position::new(x, y))
    }

    /// Builds a never-stored character directly at its destination.
    fn spawn_at(&mut self, id: CharacterId, map: MapId, x: i32, y: i32) -> bool {
        let Some(entity) = self.get_or_create_in(id, map) else {
            return false;
        };
        let Some(table) = self.table_mut(id) else {
            return false;
        };
        place(table, entity, map, Some(Position::new(x, y)));
        dirty::mark_state_dirty(table, entity);
        self.touch(id);
        true
    }

    /// Cross-table half of a move.
    fn relocate(
        &mut self,
        id: CharacterId,
        source: Option<(MapId, EntityHandle)>,
        mut record: CharacterRecord,
        map: MapId,
        position: Position,
    ) -> bool {
        if record.id != id {
            error!(
                character_id = id.get(),
                record_id = record.id.get(),
                "snapshot belongs to another character"
            );
            return false;
        }
        record.map_id = map;
        record.position = position;

        let Some(destination) = self.partitions.ensure_table(map) else {
            return false;
        };
        let moved = match self.cache.codec.hydrate(destination, &record) {
            Ok(entity) => entity,
            Err(err) => {
                error!(
                    character_id = id.get(),
                    map_id = map.get(),
                    error = %err,
                    "could not hydrate at destination"
                );
                return false;
            }
        };

        // Snapshot first: past this point only the live entity can be lost.
        self.cache.stored.insert(id, record);
        if let Some((from, entity)) = source {
            self.destroy_in(from, entity);
        }
        self.cache.index.remove(id);
        if let Err(err) = self.index_character(id, map, moved) {
            error!(character_id = id.get(), error = %err, "could not index moved entity");
            self.destroy_in(map, moved);
            return false;
        }
        self.cache.sessions.entry(id).or_default();
        self.touch(id);
        debug!(character_id = id.get(), map_id = map.get(), entity = %moved, "character moved");
        true
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Marks `id` connected, building it if needed, and publishes
    /// [`LifecycleEvent::CharacterLogin`].
    pub fn on_login(
        &mut self,
        id: CharacterId,
        sink: Option<&mut dyn LifecycleSink>,
    ) -> Option<EntityHandle> {
        let entity = self.get_or_create(id)?;
        let now = unix_seconds();
        if let Some(state) = self
            .table_mut(id)
            .and_then(|table| table.get_or_default::<PersistedState>(entity))
        {
            state.last_login = now;
            state.last_active = now;
        }
        let session = self.cache.sessions.entry(id).or_default();
        session.connected = true;
        session.time_since_disconnect = 0.0;

        if let Some(sink) = sink {
            sink.publish_lifecycle(LifecycleEvent::CharacterLogin {
                character: id,
                entity,
            });
        }
        Some(entity)
    }

    /// Saves `id` if dirty and starts its eviction timer. Publishes
    /// [`LifecycleEvent::CharacterLogout`] if it was live.
    pub fn on_disconnect(&mut self, id: CharacterId, sink: Option<&mut dyn LifecycleSink>) {
        let entity = self.try_get(id);
        self.save_if_dirty(id);
        if let Some(session) = self.cache.sessions.get_mut(&id) {
            session.connected = false;
            session.time_since_disconnect = 0.0;
        }

        if let (Some(sink), Some(entity)) = (sink, entity) {
            sink.publish_lifecycle(LifecycleEvent::CharacterLogout {
                character: id,
                entity,
            });
        }
    }

    /// Advances every session by `delta_time` seconds.
    ///
    /// Connected characters autosave each interval. Disconnected ones are
    /// saved and evicted once the timeout passes; a failed save restarts the
    /// timeout instead. Sessions whose entity is already gone are dropped.
    pub fn update(&mut self, delta_time: f32) {
        let mut ids: Vec<CharacterId> = self.cache.sessions.keys().copied().collect();
        ids.sort_unstable();
        let mut expired = Vec::new();

        for id in ids {
            let Some(entity) = self.try_get(id) else {
                expired.push(id);
                continue;
            };
            let Some(session) = self.cache.sessions.get_mut(&id) else {
                continue;
            };

            if session.connected {
                session.time_since_last_save += delta_time;
                if session.time_since_last_save >= self.cache.config.save_interval_seconds {
                    session.time_since_last_save = 0.0;
                    self.save_if_dirty(id);
                }
                continue;
            }

            session.time_since_disconnect += delta_time;
            if session.time_since_disconnect < self.cache.config.timeout_seconds {
                continue;
            }
            if self.save_if_dirty(id) == SaveResult::SaveFailed {
                if let Some(session) = self.cache.sessions.get_mut(&id) {
                    session.time_since_disconnect = 0.0;
                }
                continue;
            }
            if let Some(map) = self.cache.index.map(id) {
                self.destroy_in(map, entity);
            }
            self.cache.index.remove(id);
            debug!(character_id = id.get(), "evicted");
            expired.push(id);
        }

        for id in expired {
            self.cache.sessions.remove(&id);
        }
    }

    // =========================================================================
    // Saving
    // =========================================================================

    /// Flattens and stores `id` regardless of dirty state.
    pub fn save(&mut self, id: CharacterId) -> Option<CharacterRecord> {
        let entity = self.try_get(id)?;
        let map = self.cache.index.map(id)?;
        let table = self.partitions.table(map)?;
        match self.cache.codec.flatten(table, entity) {
            Ok(record) => {
                self.cache.stored.insert(id, record.clone());
                Some(record)
            }
            Err(err) => {
                error!(character_id = id.get(), error = %err, "save failed");
                None
            }
        }
    }

    /// Saves `id` only if any dirty flag is set.
    pub fn save_if_dirty(&mut self, id: CharacterId) -> SaveResult {
        let Some(entity) = self.try_get(id) else {
            return SaveResult::EntityNotFound;
        };
        let Some(map) = self.cache.index.map(id) else {
            return SaveResult::EntityNotFound;
        };
        let Some(table) = self.partitions.table_mut(map) else {
            return SaveResult::EntityNotFound;
        };
        if !dirty::is_dirty(table, entity) {
            return SaveResult::NotDirty;
        }
        let cache = &mut *self.cache;
        persist(
            &*cache.codec,
            &mut cache.stored,
            cache.config.error_policy,
            table,
            id,
            entity,
        )
    }

    /// Saves every indexed character. Returns how many were stored.
    pub fn save_all(&mut self) -> usize {
        self.cache
            .index
            .ids()
            .into_iter()
            .filter(|id| self.save(*id).is_some())
            .count()
    }

    /// Saves every dirty character in every partition, whether or not the
    /// index knows it. Returns how many were stored.
    pub fn save_all_dirty(&mut self) -> usize {
        let mut saved = 0;
        let cache = &mut *self.cache;
        for map in self.partitions.map_ids() {
            let Some(table) = self.partitions.table_mut(map) else {
                continue;
            };
            for entity in table.entities_with::<DirtyFlags>() {
                let Some(id) = table.get::<Identity>(entity).map(Identity::id) else {
                    continue;
                };
                if !dirty::is_dirty(table, entity) {
                    continue;
                }
                let result = persist(
                    &*cache.codec,
                    &mut cache.stored,
                    cache.config.error_policy,
                    table,
                    id,
                    entity,
                );
                if result == SaveResult::Success {
                    saved += 1;
                }
            }
        }
        saved
    }

    // =========================================================================
    // Index maintenance
    // =========================================================================

    /// Refreshes activity time and keeps the session alive.
    fn touch(&mut self, id: CharacterId) {
        let Some(entity) = self.try_get(id) else {
            return;
        };
        if let Some(state) = self
            .table_mut(id)
            .and_then(|table| table.get_or_default::<PersistedState>(entity))
        {
            state.last_active = unix_seconds();
        }
        let session = self.cache.sessions.entry(id).or_default();
        session.connected = true;
        session.time_since_disconnect = 0.0;
    }

    /// Records `entity` on `map` as the one entity of `id`.
    fn index_character(&mut self, id: CharacterId, map: MapId, entity: EntityHandle) -> Result<()> {
        let table = self
            .partitions
            .table(map)
            .ok_or_else(|| Error::map_unavailable(map))?;
        table.entity_store().validate(entity)?;
        let found = table.get::<Identity>(entity).map(Identity::id);
        if found != Some(id) {
            return Err(Error::identity_mismatch(id, found));
        }
        if let Some(existing) = self.cache.index.entity(id) {
            let existing_map = self.cache.index.map(id);
            if existing != entity || existing_map != Some(map) {
                return Err(Error::duplicate_character(id, existing, entity));
            }
        }
        self.cache.index.insert(id, map, entity);
        Ok(())
    }

    fn destroy_in(&mut self, map: MapId, entity: EntityHandle) {
        if let Some(table) = self.partitions.table_mut(map) {
            if let Err(err) = table.destroy(entity) {
                warn!(map_id = map.get(), entity = %entity, error = %err, "destroy failed");
            }
        }
    }

    /// Looks for a live entity carrying `id` that the index does not know,
    /// first on `map`, then everywhere.
    fn find_unindexed(&self, id: CharacterId, map: MapId) -> Option<(MapId, EntityHandle)> {
        if let Some(entity) = self.scan(id, map) {
            return Some((map, entity));
        }

        let mut found: Option<(MapId, EntityHandle)> = None;
        for scanned in self.partitions.map_ids() {
            let Some(entity) = self.scan(id, scanned) else {
                continue;
            };
            match found {
                None => found = Some((self.resolve_map(scanned, entity), entity)),
                Some((first_map, first)) => error!(
                    character_id = id.get(),
                    first_map = first_map.get(),
                    first = %first,
                    duplicate_map = scanned.get(),
                    duplicate = %entity,
                    "character alive in more than one partition"
                ),
            }
        }
        found
    }

    /// Map to index a recovered entity under. Prefers the map recorded on the
    /// entity when that map resolves to the table it was found in.
    fn resolve_map(&self, scanned: MapId, entity: EntityHandle) -> MapId {
        let recorded = self
            .partitions
            .table(scanned)
            .and_then(|table| table.get::<PersistedState>(entity))
            .map(|state| self.normalize(state.map_id));
        match recorded {
            Some(recorded) if self.partitions.shares_table(scanned, recorded) => recorded,
            _ => scanned,
        }
    }

    fn scan(&self, id: CharacterId, map: MapId) -> Option<EntityHandle> {
        let table = self.partitions.table(map)?;
        let mut found = None;
        for (entity, identity) in table.view::<Identity>() {
            if identity.id() != id {
                continue;
            }
            match found {
                None => found = Some(entity),
                Some(first) => error!(
                    character_id = id.get(),
                    map_id = map.get(),
                    first = %first,
                    duplicate = %entity,
                    "duplicate character entities in one partition"
                ),
            }
        }
        if let Some(entity) = found {
            warn!(
                character_id = id.get(),
                map_id = map.get(),
                entity = %entity,
                "recovered unindexed character"
            );
        }
        found
    }
}
