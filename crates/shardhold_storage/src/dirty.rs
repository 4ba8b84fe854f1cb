//! Dirty tracking for persisted character aspects.
//!
//! Marking lazily attaches a [`DirtyFlags`] component. Clearing removes it,
//! so "has no `DirtyFlags`" and "clean" mean the same thing and a view over
//! `DirtyFlags` is exactly the set of entities that may need saving.
//!
//! Marking a dead handle is a caller error: debug builds panic, release
//! builds ignore the mark. Queries and `clear_dirty` accept dead handles and
//! report clean.

use shardhold_foundation::EntityHandle;

use crate::components::DirtyFlags;
use crate::table::EntityTable;

fn flags(table: &mut EntityTable, entity: EntityHandle) -> Option<&mut DirtyFlags> {
    debug_assert!(
        table.contains(entity),
        "dirty mark on dead entity {entity:?}"
    );
    table.get_or_default::<DirtyFlags>(entity)
}

/// Marks identity data dirty.
pub fn mark_identity_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.identity = true;
    }
}

/// Marks attributes dirty.
pub fn mark_attributes_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.attributes = true;
    }
}

/// Marks position/map state dirty.
pub fn mark_state_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.state = true;
    }
}

/// Legacy inventory mark: sets the umbrella flag and items, equipment and
/// skills together.
pub fn mark_inventory_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.inventory = true;
        dirty.items = true;
        dirty.equipment = true;
        dirty.skills = true;
    }
}

/// Marks bag contents dirty. Also sets the legacy inventory flag.
pub fn mark_items_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.items = true;
        dirty.inventory = true;
    }
}

/// Marks equipment dirty. Also sets the legacy inventory flag.
pub fn mark_equipment_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.equipment = true;
        dirty.inventory = true;
    }
}

/// Marks skills dirty. Also sets the legacy inventory flag.
pub fn mark_skills_dirty(table: &mut EntityTable, entity: EntityHandle) {
    if let Some(dirty) = flags(table, entity) {
        dirty.skills = true;
        dirty.inventory = true;
    }
}

/// Returns true if any flag is set.
#[must_use]
pub fn is_dirty(table: &EntityTable, entity: EntityHandle) -> bool {
    table.get::<DirtyFlags>(entity).is_some_and(DirtyFlags::any)
}

/// Marks the entity clean by removing its flags.
pub fn clear_dirty(table: &mut EntityTable, entity: EntityHandle) {
    table.remove::<DirtyFlags>(entity);
}
