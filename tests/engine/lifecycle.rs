//! Integration tests for the character lifecycle cache
//!
//! Lookup idempotence, index invariants, sessions, eviction, and index repair.

use std::sync::{Arc, Mutex};

use shardhold_engine::{CacheConfig, EventBus, LifecycleEvent, PartitionRegistry, RegistryConfig};
use shardhold_foundation::{
    CharacterClass, CharacterCreateRequest, CharacterId, CharacterRecord, Gender, MapId,
};
use shardhold_storage::{Identity, PersistedState};

use crate::support::{registry, set_gold};

fn live_entities_with_id(registry: &PartitionRegistry, id: CharacterId) -> usize {
    let mut count = 0;
    registry.for_each_world(|_, world| {
        count += world
            .table()
            .view::<Identity>()
            .filter(|(_, identity)| identity.id() == id)
            .count();
    });
    count
}

// =============================================================================
// Lookup
// =============================================================================

#[test]
fn get_or_create_is_idempotent() {
    let mut registry = registry();
    let mut characters = registry.characters();

    let first = characters.get_or_create(CharacterId(1)).unwrap();
    let second = characters.get_or_create(CharacterId(1)).unwrap();

    assert_eq!(first, second);
    assert_eq!(characters.index_size(), 1);
}

#[test]
fn indexed_entities_carry_their_identity() {
    let mut registry = registry();
    let ids: Vec<_> = (1..=20).map(CharacterId).collect();
    {
        let mut characters = registry.characters();
        for (n, id) in ids.iter().enumerate() {
            let map = MapId(1 + u32::try_from(n % 3).unwrap());
            characters.get_or_create_in(*id, map).unwrap();
        }
    }

    for id in &ids {
        let mut characters = registry.characters();
        let entity = characters.try_get(*id).unwrap();
        let identity = characters.table(*id).unwrap().get::<Identity>(entity).unwrap();
        assert_eq!(identity.id(), *id);
    }
    for id in ids {
        assert_eq!(live_entities_with_id(&registry, id), 1);
    }
    assert_eq!(registry.world_count(), 3);
}

#[test]
fn new_character_is_saved_immediately() {
    let mut registry = registry();
    registry.characters().get_or_create(CharacterId(4)).unwrap();

    let stored = registry.character_cache().stored_data(CharacterId(4)).unwrap();
    assert_eq!(stored.name, "Player4");
    assert_eq!(stored.class, CharacterClass::Warrior);
    assert_eq!(stored.stats.hp, 150);
    assert_eq!(stored.map_id, MapId::DEFAULT);
}

#[test]
fn stored_snapshot_decides_the_map() {
    let mut source = registry();
    source
        .characters()
        .preload(CharacterRecord::new(CharacterId(6)).with_map(MapId(4)));
    let archive = source.character_cache().export_snapshots().unwrap();

    let mut registry = registry();
    registry.character_cache_mut().import_snapshots(&archive).unwrap();
    let entity = registry.characters().get_or_create(CharacterId(6)).unwrap();

    assert_eq!(registry.character_cache().try_get_map_id(CharacterId(6)), Some(MapId(4)));
    assert!(registry.world(MapId(4)).unwrap().table().contains(entity));
    assert!(registry.world(MapId(1)).is_none());
}

#[test]
fn preload_builds_on_record_map_and_stamps_login() {
    let mut registry = registry();
    let record = CharacterRecord::new(CharacterId(8))
        .with_name("Brann")
        .with_map(MapId(4))
        .with_position(7, 8);

    let entity = registry.characters().preload(record).unwrap();

    let world = registry.world(MapId(4)).unwrap();
    let state = world.table().get::<PersistedState>(entity).unwrap();
    assert_eq!(state.position.x, 7);
    assert!(state.last_login > 0);
    assert_eq!(world.table().get::<Identity>(entity).unwrap().name, "Brann");
}

#[test]
fn preload_all_counts_live_characters() {
    let mut registry = registry();
    let records =
        (1..=5).map(|id| CharacterRecord::new(CharacterId(id)).with_map(MapId(id % 2 + 1)));

    assert_eq!(registry.characters().preload_all(records), 5);
    assert_eq!(registry.world_count(), 2);
}

// =============================================================================
// Index repair
// =============================================================================

#[test]
fn unindexed_entity_is_found_and_indexed() {
    let mut registry = registry();
    let world = registry.create_world(MapId(1), 0).unwrap();
    let orphan = world.table_mut().spawn();
    world
        .table_mut()
        .insert(orphan, Identity::new(CharacterId(7)))
        .unwrap();

    let found = registry.characters().get_or_create(CharacterId(7));

    assert_eq!(found, Some(orphan));
    assert_eq!(registry.character_cache().index_size(), 1);
    assert_eq!(registry.world(MapId(1)).unwrap().table().len(), 1);
}

#[test]
fn orphan_on_another_map_is_indexed_where_it_lives() {
    let mut registry = registry();
    registry.create_world(MapId(1), 0);
    let world = registry.create_world(MapId(3), 0).unwrap();
    let orphan = world.table_mut().spawn();
    world
        .table_mut()
        .insert(orphan, Identity::new(CharacterId(7)))
        .unwrap();
    world
        .table_mut()
        .insert(
            orphan,
            PersistedState {
                map_id: MapId(3),
                ..PersistedState::default()
            },
        )
        .unwrap();

    let found = registry.characters().get_or_create_in(CharacterId(7), MapId(1));

    assert_eq!(found, Some(orphan));
    assert_eq!(registry.character_cache().try_get_map_id(CharacterId(7)), Some(MapId(3)));
    assert!(registry.world(MapId(1)).unwrap().table().is_empty());
}

#[test]
fn stale_entry_is_purged_on_lookup() {
    let mut registry = registry();
    let entity = registry.characters().get_or_create(CharacterId(2)).unwrap();
    registry
        .world_mut(MapId(1))
        .unwrap()
        .table_mut()
        .destroy(entity)
        .unwrap();

    assert_eq!(registry.characters().try_get(CharacterId(2)), None);
    assert_eq!(registry.character_cache().index_size(), 0);
}

#[test]
fn destroyed_character_is_rebuilt_from_snapshot() {
    let mut registry = registry();
    let entity = registry.characters().get_or_create(CharacterId(2)).unwrap();
    set_gold(&mut registry, CharacterId(2), 40);
    registry.characters().save_if_dirty(CharacterId(2));
    registry
        .world_mut(MapId(1))
        .unwrap()
        .table_mut()
        .destroy(entity)
        .unwrap();

    let rebuilt = registry.characters().get_or_create(CharacterId(2)).unwrap();

    assert_ne!(rebuilt, entity);
    let world = registry.world(MapId(1)).unwrap();
    let stats = world.table().get::<shardhold_storage::Attributes>(rebuilt).unwrap();
    assert_eq!(stats.gold, 40);
}

// =============================================================================
// Explicit creation
// =============================================================================

#[test]
fn create_from_request_refuses_duplicates() {
    let mut registry = registry();
    let request =
        CharacterCreateRequest::new("acct-9", "Ilse", CharacterClass::Mage, Gender::Female);
    let mut sink: Vec<LifecycleEvent> = Vec::new();

    let first = registry
        .characters()
        .create_from_request(CharacterId(9), &request, Some(&mut sink));
    let second = registry
        .characters()
        .create_from_request(CharacterId(9), &request, Some(&mut sink));

    let entity = first.unwrap();
    assert_eq!(second, None);
    assert_eq!(
        sink,
        vec![LifecycleEvent::CharacterCreated {
            character: CharacterId(9),
            entity,
        }]
    );
    let stored = registry.character_cache().stored_data(CharacterId(9)).unwrap();
    assert_eq!(stored.name, "Ilse");
    assert_eq!(stored.stats.mp, 100);
    assert_eq!(live_entities_with_id(&registry, CharacterId(9)), 1);
}

#[test]
fn create_from_request_uses_configured_default_map() {
    let mut registry = PartitionRegistry::with_config(
        RegistryConfig::default(),
        CacheConfig::testing().with_default_map(MapId(5)),
    );
    let request = CharacterCreateRequest::placeholder(CharacterId(1));

    registry
        .characters()
        .create_from_request(CharacterId(1), &request, None)
        .unwrap();

    assert_eq!(registry.character_cache().try_get_map_id(CharacterId(1)), Some(MapId(5)));
    assert_eq!(
        registry.character_cache().stored_data(CharacterId(1)).unwrap().map_id,
        MapId(5)
    );
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn login_and_logout_publish_events() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut bus = EventBus::new();
    let sink = Arc::clone(&seen);
    bus.subscribe(move |event: &LifecycleEvent| sink.lock().unwrap().push(*event));
    let mut registry = registry();

    let entity = registry
        .characters()
        .on_login(CharacterId(3), Some(&mut bus))
        .unwrap();
    registry.characters().on_disconnect(CharacterId(3), Some(&mut bus));
    bus.flush();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            LifecycleEvent::CharacterLogin {
                character: CharacterId(3),
                entity,
            },
            LifecycleEvent::CharacterLogout {
                character: CharacterId(3),
                entity,
            },
        ]
    );
    let session = registry.character_cache().session(CharacterId(3)).unwrap();
    assert!(!session.connected);
}

#[test]
fn disconnect_of_unknown_character_publishes_nothing() {
    let mut registry = registry();
    let mut sink: Vec<LifecycleEvent> = Vec::new();

    registry.characters().on_disconnect(CharacterId(44), Some(&mut sink));

    assert!(sink.is_empty());
}

#[test]
fn connected_character_autosaves_then_evicts_after_timeout() {
    let mut registry = registry();
    registry.characters().on_login(CharacterId(1), None).unwrap();
    set_gold(&mut registry, CharacterId(1), 75);

    registry.characters().update(0.11);
    assert_eq!(
        registry.character_cache().stored_data(CharacterId(1)).unwrap().stats.gold,
        75
    );

    registry.characters().on_disconnect(CharacterId(1), None);
    registry.characters().update(0.1);
    assert_eq!(registry.character_cache().index_size(), 1);

    registry.characters().update(0.21);
    assert_eq!(registry.character_cache().index_size(), 0);
    assert_eq!(registry.character_cache().session(CharacterId(1)), None);
    assert!(registry.world(MapId(1)).unwrap().table().is_empty());
    assert!(registry.character_cache().stored_data(CharacterId(1)).is_some());
}

#[test]
fn disconnect_saves_dirty_state() {
    let mut registry = registry();
    registry.characters().on_login(CharacterId(1), None).unwrap();
    set_gold(&mut registry, CharacterId(1), 12);

    registry.characters().on_disconnect(CharacterId(1), None);

    assert_eq!(
        registry.character_cache().stored_data(CharacterId(1)).unwrap().stats.gold,
        12
    );
}

#[test]
fn evicted_character_comes_back_from_snapshot() {
    let mut registry = registry();
    registry.characters().on_login(CharacterId(1), None).unwrap();
    set_gold(&mut registry, CharacterId(1), 33);
    registry.characters().on_disconnect(CharacterId(1), None);
    registry.characters().update(0.25);
    assert_eq!(registry.character_cache().index_size(), 0);

    let entity = registry.characters().on_login(CharacterId(1), None).unwrap();

    let world = registry.world(MapId(1)).unwrap();
    let stats = world.table().get::<shardhold_storage::Attributes>(entity).unwrap();
    assert_eq!(stats.gold, 33);
}

#[test]
fn session_of_destroyed_entity_is_dropped_without_save() {
    let mut registry = registry();
    let entity = registry.characters().on_login(CharacterId(5), None).unwrap();
    registry
        .world_mut(MapId(1))
        .unwrap()
        .table_mut()
        .destroy(entity)
        .unwrap();

    registry.characters().update(0.01);

    assert_eq!(registry.character_cache().session_count(), 0);
}
