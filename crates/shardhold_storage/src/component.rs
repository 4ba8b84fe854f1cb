//! Typed component storage.
//!
//! Each component type lives in its own [`Column`], a sparse set keyed by
//! entity slot. Values are packed densely so a view over one component type
//! is a linear walk, while per-entity lookup stays O(1).

// Allow u64 to usize casts - we target 64-bit systems
#![allow(clippy::cast_possible_truncation)]

use std::any::{Any, TypeId};
use std::collections::HashMap;

use shardhold_foundation::EntityHandle;

/// Dense storage for one component type.
#[derive(Debug, Clone)]
pub struct Column<T> {
    /// Slot index -> position in `dense`.
    sparse: Vec<Option<usize>>,
    /// Owner of each dense value, same order as `dense`.
    owners: Vec<EntityHandle>,
    dense: Vec<T>,
}

impl<T> Default for Column<T> {
    fn default() -> Self {
        Self {
            sparse: Vec::new(),
            owners: Vec::new(),
            dense: Vec::new(),
        }
    }
}

impl<T> Column<T> {
    fn position(&self, entity: EntityHandle) -> Option<usize> {
        let pos = (*self.sparse.get(entity.index as usize)?)?;
        // A recycled slot may still point at the previous owner's value.
        (self.owners[pos] == entity).then_some(pos)
    }

    /// Inserts or replaces the value for `entity`, returning the old one.
    pub fn insert(&mut self, entity: EntityHandle, value: T) -> Option<T> {
        if let Some(pos) = self.position(entity) {
            return Some(std::mem::replace(&mut self.dense[pos], value));
        }
        // Drop any value left behind by an older generation of this slot.
        self.remove_slot(entity.index);

        let idx = entity.index as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        self.sparse[idx] = Some(self.dense.len());
        self.owners.push(entity);
        self.dense.push(value);
        None
    }

    /// Returns the value for `entity`.
    #[must_use]
    pub fn get(&self, entity: EntityHandle) -> Option<&T> {
        self.position(entity).map(|pos| &self.dense[pos])
    }

    /// Returns the value for `entity` mutably.
    pub fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut T> {
        self.position(entity).map(|pos| &mut self.dense[pos])
    }

    /// Returns true if `entity` has a value in this column.
    #[must_use]
    pub fn contains(&self, entity: EntityHandle) -> bool {
        self.position(entity).is_some()
    }

    /// Removes and returns the value for `entity`.
    pub fn remove(&mut self, entity: EntityHandle) -> Option<T> {
        let pos = self.position(entity)?;
        Some(self.swap_remove(pos))
    }

    fn remove_slot(&mut self, index: u64) -> Option<T> {
        let pos = (*self.sparse.get(index as usize)?)?;
        Some(self.swap_remove(pos))
    }

    fn swap_remove(&mut self, pos: usize) -> T {
        let removed_owner = self.owners.swap_remove(pos);
        let value = self.dense.swap_remove(pos);
        self.sparse[removed_owner.index as usize] = None;
        if let Some(moved) = self.owners.get(pos) {
            self.sparse[moved.index as usize] = Some(pos);
        }
        value
    }

    /// Number of entities holding this component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns true if no entity holds this component.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Owners in dense order.
    #[must_use]
    pub fn entities(&self) -> &[EntityHandle] {
        &self.owners
    }

    /// Iterates `(owner, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter())
    }

    /// Iterates `(owner, value)` pairs mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityHandle, &mut T)> + '_ {
        self.owners.iter().copied().zip(self.dense.iter_mut())
    }
}

/// Object-safe face of a [`Column`] so columns of different types can share
/// one map. Columns are `Send` so a whole table can move between threads.
trait ErasedColumn: Send {
    fn drop_entity(&mut self, entity: EntityHandle);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Send + 'static> ErasedColumn for Column<T> {
    fn drop_entity(&mut self, entity: EntityHandle) {
        self.remove(entity);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Stores every component column of one entity table.
///
/// The store does not check entity liveness; [`EntityTable`](crate::EntityTable)
/// does that before reaching in.
#[derive(Default)]
pub struct ComponentStore {
    columns: HashMap<TypeId, Box<dyn ErasedColumn>>,
}

impl std::fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentStore")
            .field("columns", &self.columns.len())
            .finish()
    }
}

impl ComponentStore {
    /// Creates a new empty component store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the column for `T`, if any entity ever held a `T`.
    #[must_use]
    pub fn column<T: 'static>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|column| column.as_any().downcast_ref())
    }

    /// Returns the column for `T` mutably.
    pub fn column_mut<T: 'static>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|column| column.as_any_mut().downcast_mut())
    }

    fn column_or_create<T: Send + 'static>(&mut self) -> &mut Column<T> {
        let column = self
            .columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::default()));
        match column.as_any_mut().downcast_mut() {
            Some(column) => column,
            // Keyed by TypeId::of::<T>(), so the downcast cannot fail.
            None => unreachable!("component column registered under the wrong type"),
        }
    }

    /// Attaches `value` to `entity`, returning the previous value.
    pub fn insert<T: Send + 'static>(&mut self, entity: EntityHandle, value: T) -> Option<T> {
        self.column_or_create::<T>().insert(entity, value)
    }

    /// Gets a component of `entity`.
    #[must_use]
    pub fn get<T: 'static>(&self, entity: EntityHandle) -> Option<&T> {
        self.column::<T>()?.get(entity)
    }

    /// Gets a component of `entity` mutably.
    pub fn get_mut<T: 'static>(&mut self, entity: EntityHandle) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(entity)
    }

    /// Gets a component of `entity`, attaching `make()` first if missing.
    pub fn get_or_insert_with<T: Send + 'static>(
        &mut self,
        entity: EntityHandle,
        make: impl FnOnce() -> T,
    ) -> &mut T {
        let column = self.column_or_create::<T>();
        if !column.contains(entity) {
            column.insert(entity, make());
        }
        match column.get_mut(entity) {
            Some(value) => value,
            None => unreachable!("component inserted above"),
        }
    }

    /// Checks if `entity` has a `T`.
    #[must_use]
    pub fn has<T: 'static>(&self, entity: EntityHandle) -> bool {
        self.column::<T>().is_some_and(|c| c.contains(entity))
    }

    /// Detaches and returns the `T` of `entity`.
    pub fn remove<T: 'static>(&mut self, entity: EntityHandle) -> Option<T> {
        self.column_mut::<T>()?.remove(entity)
    }

    /// Detaches every component of `entity`.
    pub fn remove_all(&mut self, entity: EntityHandle) {
        for column in self.columns.values_mut() {
            column.drop_entity(entity);
        }
    }
}
