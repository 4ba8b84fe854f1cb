//! Slot allocation for one partition's entities.
//!
//! Every slot carries a generation. Odd means the slot holds a live entity,
//! even means it is vacant. Freeing or reusing a slot advances the
//! generation, which is what turns an old [`EntityHandle`] stale.

// Slot indices are stored as u64 in handles but index a Vec.
#![allow(clippy::cast_possible_truncation)]

use shardhold_foundation::{EntityHandle, Error, Result};

const fn is_live(generation: u32) -> bool {
    generation % 2 == 1
}

/// Hands out entity handles and recycles freed slots.
///
/// Vacant slots are reused last-freed-first, so a table with heavy character
/// churn stays compact.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    slots: Vec<u32>,
    vacant: Vec<u64>,
    live: usize,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Allocates a live handle, reusing a vacant slot if there is one.
    pub fn spawn(&mut self) -> EntityHandle {
        let index = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                *slot = slot.wrapping_add(1);
                index
            }
            None => {
                self.slots.push(1);
                (self.slots.len() - 1) as u64
            }
        };
        self.live += 1;
        EntityHandle::new(index, self.slots[index as usize])
    }

    /// Frees the slot behind `entity`.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the handle is not live.
    pub fn destroy(&mut self, entity: EntityHandle) -> Result<()> {
        self.validate(entity)?;
        let slot = &mut self.slots[entity.index as usize];
        *slot = slot.wrapping_add(1);
        self.vacant.push(entity.index);
        self.live -= 1;
        Ok(())
    }

    /// True if `entity` is the current live occupant of its slot.
    #[must_use]
    pub fn exists(&self, entity: EntityHandle) -> bool {
        self.validate(entity).is_ok()
    }

    /// Checks that `entity` is live.
    ///
    /// # Errors
    ///
    /// `StaleEntity` if the slot has moved past the handle's generation,
    /// `EntityNotFound` if the slot was never allocated or is vacant.
    pub fn validate(&self, entity: EntityHandle) -> Result<()> {
        match self.generation(entity.index) {
            Some(current) if current != entity.generation => Err(Error::stale_entity(entity)),
            Some(current) if is_live(current) => Ok(()),
            _ => Err(Error::entity_not_found(entity)),
        }
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live handles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        (0u64..)
            .zip(&self.slots)
            .filter(|&(_, &generation)| is_live(generation))
            .map(|(index, &generation)| EntityHandle::new(index, generation))
    }

    /// Current generation of slot `index`, if allocated.
    #[must_use]
    pub fn generation(&self, index: u64) -> Option<u32> {
        self.slots.get(index as usize).copied()
    }
}
