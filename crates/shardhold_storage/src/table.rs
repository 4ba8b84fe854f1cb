//! Per-partition entity table.
//!
//! An [`EntityTable`] pairs an [`EntityStore`] with a [`ComponentStore`] and
//! refuses to touch components of dead or stale handles.

use std::cell::Cell;
use std::marker::PhantomData;

use shardhold_foundation::{EntityHandle, Error, Result};

use crate::component::{Column, ComponentStore};
use crate::entity::EntityStore;

/// Entities and components of one partition.
///
/// The table is `Send` but not `Sync`: one thread drives a partition at a
/// time, and moving it to another thread is an explicit hand-off.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: EntityStore,
    components: ComponentStore,
    _single_writer: PhantomData<Cell<()>>,
}

impl EntityTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: EntityStore::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Spawns an entity with no components.
    pub fn spawn(&mut self) -> EntityHandle {
        self.entities.spawn()
    }

    /// Destroys an entity and drops all of its components.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or unknown.
    pub fn destroy(&mut self, entity: EntityHandle) -> Result<()> {
        self.entities.validate(entity)?;
        self.components.remove_all(entity);
        self.entities.destroy(entity)
    }

    /// Returns true if `entity` is alive in this table.
    #[must_use]
    pub fn contains(&self, entity: EntityHandle) -> bool {
        self.entities.exists(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the table holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates every live entity.
    pub fn entities(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.iter()
    }

    /// The underlying entity store.
    #[must_use]
    pub fn entity_store(&self) -> &EntityStore {
        &self.entities
    }

    /// Attaches a component, returning the one it replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` is not alive.
    pub fn insert<T: Send + 'static>(
        &mut self,
        entity: EntityHandle,
        component: T,
    ) -> Result<Option<T>> {
        self.entities.validate(entity)?;
        Ok(self.components.insert(entity, component))
    }

    /// Gets a component of a live entity.
    #[must_use]
    pub fn get<T: 'static>(&self, entity: EntityHandle) -> Option<&T> {
        if !self.contains(entity) {
            return None;
        }
        self.components.get(entity)
    }

    /// Gets a component of a live entity mutably.
    pub fn get_mut<T: 'static>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        if !self.contains(entity) {
            return None;
        }
        self.components.get_mut(entity)
    }

    /// Gets a component, reporting which one was missing.
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` is not alive or lacks a `T`.
    pub fn component<T: 'static>(&self, entity: EntityHandle) -> Result<&T> {
        self.entities.validate(entity)?;
        self.components
            .get(entity)
            .ok_or_else(|| Error::component_not_found(entity, std::any::type_name::<T>()))
    }

    /// Gets a component, attaching `make()` first if missing.
    ///
    /// Returns `None` if `entity` is not alive.
    pub fn get_or_insert_with<T: Send + 'static>(
        &mut self,
        entity: EntityHandle,
        make: impl FnOnce() -> T,
    ) -> Option<&mut T> {
        if !self.contains(entity) {
            return None;
        }
        Some(self.components.get_or_insert_with(entity, make))
    }

    /// Gets a component, attaching `T::default()` first if missing.
    pub fn get_or_default<T: Default + Send + 'static>(
        &mut self,
        entity: EntityHandle,
    ) -> Option<&mut T> {
        self.get_or_insert_with(entity, T::default)
    }

    /// Checks if a live entity has a `T`.
    #[must_use]
    pub fn has<T: 'static>(&self, entity: EntityHandle) -> bool {
        self.contains(entity) && self.components.has::<T>(entity)
    }

    /// Detaches a component.
    pub fn remove<T: 'static>(&mut self, entity: EntityHandle) -> Option<T> {
        if !self.contains(entity) {
            return None;
        }
        self.components.remove(entity)
    }

    /// Iterates every `(entity, &T)` in column order.
    pub fn view<T: 'static>(&self) -> impl Iterator<Item = (EntityHandle, &T)> + '_ {
        self.components
            .column::<T>()
            .into_iter()
            .flat_map(|column| column.iter())
    }

    /// Iterates every `(entity, &mut T)` in column order.
    pub fn view_mut<T: 'static>(&mut self) -> impl Iterator<Item = (EntityHandle, &mut T)> + '_ {
        self.components
            .column_mut::<T>()
            .into_iter()
            .flat_map(|column| column.iter_mut())
    }

    /// Collects the entities holding a `T`.
    ///
    /// Useful when the caller needs to mutate the table while walking.
    #[must_use]
    pub fn entities_with<T: 'static>(&self) -> Vec<EntityHandle> {
        self.components
            .column::<T>()
            .map(|column| column.entities().to_vec())
            .unwrap_or_default()
    }

    /// Number of entities holding a `T`.
    #[must_use]
    pub fn count<T: 'static>(&self) -> usize {
        self.components.column::<T>().map_or(0, Column::len)
    }
}
