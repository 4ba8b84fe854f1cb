//! Integration tests for character records and creation requests

use shardhold_foundation::{
    CharacterClass, CharacterCreateRequest, CharacterId, CharacterRecord, CharacterStats, Gender,
    MapId, Position,
};

#[test]
fn new_record_starts_at_spawn_on_default_map() {
    let record = CharacterRecord::new(CharacterId(1));

    assert_eq!(record.map_id, MapId::DEFAULT);
    assert_eq!(record.position, Position::SPAWN);
    assert_eq!(record.position, Position::new(100, 100));
    assert_eq!(record.items, "[]");
    assert_eq!(record.equipment, "{}");
}

#[test]
fn builders_set_fields() {
    let record = CharacterRecord::new(CharacterId(2))
        .with_map(MapId(4))
        .with_position(10, 20)
        .with_name("Rook");

    assert_eq!(record.map_id, MapId(4));
    assert_eq!(record.position, Position::new(10, 20));
    assert_eq!(record.name, "Rook");
}

#[test]
fn base_stats_differ_by_class() {
    let warrior = CharacterStats::base_for(CharacterClass::Warrior);
    let mage = CharacterStats::base_for(CharacterClass::Mage);
    let taoist = CharacterStats::base_for(CharacterClass::Taoist);

    assert_eq!((warrior.hp, warrior.mp), (150, 30));
    assert_eq!((mage.hp, mage.mp), (80, 100));
    assert_eq!((taoist.hp, taoist.mp), (100, 80));
    assert_eq!(warrior.max_hp, warrior.hp);
    assert_eq!(mage.level, 1);
}

#[test]
fn placeholder_request_names_player_by_id() {
    let request = CharacterCreateRequest::placeholder(CharacterId(77));

    assert_eq!(request.name, "Player77");
    assert_eq!(request.class, CharacterClass::Warrior);
    assert_eq!(request.gender, Gender::Male);
    assert!(request.account_id.is_empty());
}
