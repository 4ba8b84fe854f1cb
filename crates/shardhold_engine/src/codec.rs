//! Conversion between character entities and flat records.
//!
//! The lifecycle cache never touches component layout directly; it goes
//! through a [`CharacterCodec`]. [`StandardCodec`] maps the components in
//! [`shardhold_storage::components`].

use std::time::{SystemTime, UNIX_EPOCH};

use shardhold_foundation::{
    CharacterCreateRequest, CharacterId, CharacterRecord, CharacterStats, EntityHandle, Error,
    ErrorContext, MapId, Position, Result,
};
use shardhold_storage::{Attributes, EntityTable, Identity, Inventory, PersistedState};

/// Current wall-clock time in unix seconds. Clamps to 0 before the epoch.
#[must_use]
pub fn unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

/// Builds and reads character entities.
///
/// Implementations must produce an entity whose [`Identity`] carries the
/// requested character id; the cache refuses to index anything else.
pub trait CharacterCodec: Send {
    /// Spawns an entity in `table` from a stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be represented.
    fn hydrate(&self, table: &mut EntityTable, record: &CharacterRecord) -> Result<EntityHandle>;

    /// Reads a live entity back into a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead or missing required components.
    fn flatten(&self, table: &EntityTable, entity: EntityHandle) -> Result<CharacterRecord>;

    /// Spawns a brand-new character.
    ///
    /// # Errors
    ///
    /// Returns an error if the character cannot be built.
    fn create(
        &self,
        table: &mut EntityTable,
        id: CharacterId,
        request: &CharacterCreateRequest,
    ) -> Result<EntityHandle>;
}

/// Codec over [`Identity`], [`Attributes`], [`PersistedState`] and
/// [`Inventory`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCodec;

impl StandardCodec {
    /// Creates the codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Spawns and fills an entity, destroying it again if any insert fails so a
/// failed build never leaves a half-made character behind.
fn spawn_with(
    table: &mut EntityTable,
    build: impl FnOnce(&mut EntityTable, EntityHandle) -> Result<()>,
) -> Result<EntityHandle> {
    let entity = table.spawn();
    if let Err(err) = build(table, entity) {
        let _ = table.destroy(entity);
        return Err(err);
    }
    Ok(entity)
}

impl CharacterCodec for StandardCodec {
    fn hydrate(&self, table: &mut EntityTable, record: &CharacterRecord) -> Result<EntityHandle> {
        spawn_with(table, |table, entity| {
            let mut identity = Identity::new(record.id).with_name(record.name.clone());
            identity.account_id.clone_from(&record.account_id);
            identity.class = record.class;
            identity.gender = record.gender;
            table.insert(entity, identity)?;
            table.insert(entity, Attributes(record.stats.clone()))?;
            table.insert(
                entity,
                PersistedState {
                    map_id: record.map_id,
                    position: record.position,
                    direction: record.direction,
                    created_at: record.created_at,
                    last_login: record.last_login,
                    last_active: record.last_login,
                },
            )?;
            table.insert(
                entity,
                Inventory {
                    items: record.items.clone(),
                    equipment: record.equipment.clone(),
                    skills: record.skills.clone(),
                },
            )?;
            Ok(())
        })
    }

    fn flatten(&self, table: &EntityTable, entity: EntityHandle) -> Result<CharacterRecord> {
        let identity = table.component::<Identity>(entity).map_err(|err| {
            Error::codec(format!("cannot flatten {entity}: {err}"))
                .with_context(ErrorContext::new().with_operation("flatten"))
        })?;

        let mut record = CharacterRecord::new(identity.id());
        record.account_id.clone_from(&identity.account_id);
        record.name.clone_from(&identity.name);
        record.class = identity.class;
        record.gender = identity.gender;

        if let Some(attributes) = table.get::<Attributes>(entity) {
            record.stats = attributes.0.clone();
        }
        if let Some(state) = table.get::<PersistedState>(entity) {
            record.map_id = state.map_id;
            record.position = state.position;
            record.direction = state.direction;
            record.created_at = state.created_at;
            record.last_login = state.last_login;
        }
        if let Some(inventory) = table.get::<Inventory>(entity) {
            record.items.clone_from(&inventory.items);
            record.equipment.clone_from(&inventory.equipment);
            record.skills.clone_from(&inventory.skills);
        }
        Ok(record)
    }

    fn create(
        &self,
        table: &mut EntityTable,
        id: CharacterId,
        request: &CharacterCreateRequest,
    ) -> Result<EntityHandle> {
        let now = unix_seconds();
        spawn_with(table, |table, entity| {
            let mut identity = Identity::new(id).with_name(request.name.clone());
            identity.account_id.clone_from(&request.account_id);
            identity.class = request.class;
            identity.gender = request.gender;
            table.insert(entity, identity)?;
            table.insert(entity, Attributes(CharacterStats::base_for(request.class)))?;
            table.insert(
                entity,
                PersistedState {
                    map_id: MapId::DEFAULT,
                    position: Position::SPAWN,
                    created_at: now,
                    last_login: now,
                    last_active: now,
                    ..PersistedState::default()
                },
            )?;
            table.insert(entity, Inventory::default())?;
            Ok(())
        })
    }
}
