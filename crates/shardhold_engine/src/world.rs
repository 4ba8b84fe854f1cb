//! One partition of the simulation.
//!
//! A [`World`] owns an [`EntityTable`], the systems that act on it, and an
//! [`EventBus`]. Each map runs in its own world.

use shardhold_storage::EntityTable;

use crate::event::EventBus;
use crate::system::{Slot, System, SystemId};

/// A partition: entity table, ordered systems, and event bus.
#[derive(Debug, Default)]
pub struct World {
    table: EntityTable,
    events: EventBus,
    systems: Vec<Slot>,
    next_system: u32,
    /// Set when the system set changed since the last sort.
    unsorted: bool,
    ticks: u64,
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world whose table has room for `reserve` entities.
    #[must_use]
    pub fn with_capacity(reserve: usize) -> Self {
        Self {
            table: EntityTable::with_capacity(reserve),
            ..Self::default()
        }
    }

    /// The entity table.
    #[must_use]
    pub fn table(&self) -> &EntityTable {
        &self.table
    }

    /// The entity table, mutably.
    pub fn table_mut(&mut self) -> &mut EntityTable {
        &mut self.table
    }

    /// The event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, mutably.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Takes ownership of a system. It runs from the next [`update`](Self::update).
    pub fn create_system<T: System>(&mut self, system: T) -> SystemId {
        let id = SystemId(self.next_system);
        self.next_system += 1;
        self.systems.push(Slot {
            id,
            system: Box::new(system),
        });
        self.unsorted = true;
        id
    }

    /// Removes a system by id. Returns false if no such system exists.
    pub fn remove_system(&mut self, id: SystemId) -> bool {
        let before = self.systems.len();
        self.systems.retain(|slot| slot.id != id);
        self.systems.len() != before
    }

    /// First system of type `T`, if any.
    #[must_use]
    pub fn system<T: System>(&self) -> Option<&T> {
        self.systems.iter().find_map(Slot::downcast_ref)
    }

    /// First system of type `T`, mutably.
    pub fn system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems.iter_mut().find_map(Slot::downcast_mut)
    }

    /// Removes every system.
    pub fn clear_systems(&mut self) {
        self.systems.clear();
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// System names in the order the next update will run them.
    pub fn execution_order(&mut self) -> Vec<&'static str> {
        self.sort_systems();
        self.systems.iter().map(|slot| slot.system.name()).collect()
    }

    /// Number of completed updates.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    fn sort_systems(&mut self) {
        if self.unsorted {
            // Stable: equal priorities keep insertion order.
            self.systems.sort_by_key(Slot::priority);
            self.unsorted = false;
        }
    }

    /// Runs every system once in priority order, then delivers the events
    /// they published.
    pub fn update(&mut self, delta_time: f32) {
        self.sort_systems();
        for slot in &mut self.systems {
            slot.system.update(&mut self.table, &mut self.events, delta_time);
        }
        self.events.flush();
        self.ticks += 1;
    }
}
