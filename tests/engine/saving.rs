//! Integration tests for dirty tracking, save policies and snapshots

use shardhold_engine::{ErrorPolicy, SaveResult};
use shardhold_foundation::{CharacterId, MapId};
use shardhold_storage::{Attributes, Identity, dirty};

use crate::support::{flaky_registry, is_dirty, registry, set_gold};

#[test]
fn save_if_dirty_reports_each_outcome() {
    let mut registry = registry();
    registry.characters().get_or_create(CharacterId(1)).unwrap();

    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::NotDirty);

    set_gold(&mut registry, CharacterId(1), 75);
    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::Success);
    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::NotDirty);
    assert_eq!(
        registry.characters().save_if_dirty(CharacterId(2)),
        SaveResult::EntityNotFound
    );

    let stored = registry.character_cache().stored_data(CharacterId(1)).unwrap();
    assert_eq!(stored.stats.gold, 75);
}

#[test]
fn unsaved_changes_stay_on_the_entity() {
    let mut registry = registry();
    registry.characters().get_or_create(CharacterId(1)).unwrap();

    set_gold(&mut registry, CharacterId(1), 500);

    let stored = registry.character_cache().stored_data(CharacterId(1)).unwrap();
    assert_eq!(stored.stats.gold, 0);
    assert!(is_dirty(&mut registry, CharacterId(1)));
}

#[test]
fn retain_policy_keeps_flags_for_retry() {
    let (mut registry, codec) = flaky_registry(ErrorPolicy::RetainDirtyFlag);
    registry.characters().get_or_create(CharacterId(1)).unwrap();
    set_gold(&mut registry, CharacterId(1), 10);
    codec.set_flatten_failing(true);

    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::SaveFailed);
    assert!(is_dirty(&mut registry, CharacterId(1)));

    codec.set_flatten_failing(false);
    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::Success);
    assert!(!is_dirty(&mut registry, CharacterId(1)));
    let stored = registry.character_cache().stored_data(CharacterId(1)).unwrap();
    assert_eq!(stored.stats.gold, 10);
}

#[test]
fn clear_policy_drops_flags_on_failure() {
    let (mut registry, codec) = flaky_registry(ErrorPolicy::ClearDirtyFlag);
    registry.characters().get_or_create(CharacterId(1)).unwrap();
    set_gold(&mut registry, CharacterId(1), 10);
    codec.set_flatten_failing(true);

    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::SaveFailed);
    assert!(!is_dirty(&mut registry, CharacterId(1)));

    codec.set_flatten_failing(false);
    assert_eq!(registry.characters().save_if_dirty(CharacterId(1)), SaveResult::NotDirty);
    let stored = registry.character_cache().stored_data(CharacterId(1)).unwrap();
    assert_eq!(stored.stats.gold, 0);
}

#[test]
fn failed_save_postpones_eviction() {
    let (mut registry, codec) = flaky_registry(ErrorPolicy::RetainDirtyFlag);
    let entity = registry.characters().on_login(CharacterId(3), None).unwrap();
    set_gold(&mut registry, CharacterId(3), 99);
    codec.set_flatten_failing(true);
    registry.characters().on_disconnect(CharacterId(3), None);

    registry.characters().update(0.25);

    assert_eq!(registry.characters().try_get(CharacterId(3)), Some(entity));
    let session = registry.character_cache().session(CharacterId(3)).unwrap();
    assert!(!session.connected);
    assert!(session.time_since_disconnect.abs() < f32::EPSILON);

    codec.set_flatten_failing(false);
    registry.characters().update(0.25);

    assert_eq!(registry.characters().try_get(CharacterId(3)), None);
    assert!(registry.character_cache().session(CharacterId(3)).is_none());
    let stored = registry.character_cache().stored_data(CharacterId(3)).unwrap();
    assert_eq!(stored.stats.gold, 99);
}

#[test]
fn clear_policy_failure_still_postpones_eviction_once() {
    let (mut registry, codec) = flaky_registry(ErrorPolicy::ClearDirtyFlag);
    let entity = registry.characters().on_login(CharacterId(4), None).unwrap();
    registry.characters().on_disconnect(CharacterId(4), None);
    set_gold(&mut registry, CharacterId(4), 120);
    codec.set_flatten_failing(true);

    registry.characters().update(0.25);

    assert_eq!(registry.characters().try_get(CharacterId(4)), Some(entity));
    assert!(!is_dirty(&mut registry, CharacterId(4)));
    let session = registry.character_cache().session(CharacterId(4)).unwrap();
    assert!(session.time_since_disconnect.abs() < f32::EPSILON);

    registry.characters().update(0.25);

    assert_eq!(registry.characters().try_get(CharacterId(4)), None);
    assert!(registry.character_cache().session(CharacterId(4)).is_none());
    let stored = registry.character_cache().stored_data(CharacterId(4)).unwrap();
    assert_eq!(stored.stats.gold, 0);
}

#[test]
fn save_all_dirty_finds_unindexed_entities() {
    let mut registry = registry();
    let world = registry.create_world(MapId(2), 0).unwrap();
    let table = world.table_mut();
    let entity = table.spawn();
    table.insert(entity, Identity::new(CharacterId(11))).unwrap();
    table.insert(entity, Attributes::default()).unwrap();
    dirty::mark_attributes_dirty(table, entity);

    assert_eq!(registry.characters().save_all_dirty(), 1);

    assert!(registry.character_cache().stored_data(CharacterId(11)).is_some());
    assert_eq!(registry.character_cache().index_size(), 0);
    let table = registry.world(MapId(2)).unwrap().table();
    assert!(!dirty::is_dirty(table, entity));
}

#[test]
fn save_all_dirty_skips_clean_characters() {
    let mut registry = registry();
    for id in 1..=3 {
        registry
            .characters()
            .get_or_create_in(CharacterId(id), MapId(id))
            .unwrap();
    }
    set_gold(&mut registry, CharacterId(2), 20);

    assert_eq!(registry.characters().save_all_dirty(), 1);
    assert_eq!(registry.characters().save_all_dirty(), 0);
}

#[test]
fn save_all_stores_every_indexed_character() {
    let mut registry = registry();
    for id in 1..=4 {
        registry
            .characters()
            .get_or_create_in(CharacterId(id), MapId(id % 2 + 1))
            .unwrap();
    }

    assert_eq!(registry.characters().save_all(), 4);
    assert_eq!(registry.character_cache().stored_count(), 4);
}

#[test]
fn save_ignores_dirty_state() {
    let mut registry = registry();
    registry.characters().get_or_create(CharacterId(8)).unwrap();
    set_gold(&mut registry, CharacterId(8), 31);

    let record = registry.characters().save(CharacterId(8)).unwrap();
    assert_eq!(record.stats.gold, 31);

    // A forced save leaves the flags for the next dirty pass.
    assert!(is_dirty(&mut registry, CharacterId(8)));
    assert!(registry.characters().save(CharacterId(9)).is_none());
}

#[test]
fn exported_snapshots_warm_start_a_new_registry() {
    let mut source = registry();
    for id in [4, 2, 9] {
        source
            .characters()
            .get_or_create_in(CharacterId(id), MapId(3))
            .unwrap();
        set_gold(&mut source, CharacterId(id), i32::try_from(id).unwrap() * 10);
    }
    source.characters().save_all_dirty();
    let archive = source.character_cache().export_snapshots().unwrap();

    let mut target = registry();
    assert_eq!(target.character_cache_mut().import_snapshots(&archive).unwrap(), 3);
    assert_eq!(target.world_count(), 0);

    let entity = target.characters().get_or_create(CharacterId(9)).unwrap();
    assert_eq!(target.character_cache().try_get_map_id(CharacterId(9)), Some(MapId(3)));
    let table = target.world(MapId(3)).unwrap().table();
    assert_eq!(table.get::<Attributes>(entity).unwrap().gold, 90);
    assert!(!dirty::is_dirty(table, entity));
}
