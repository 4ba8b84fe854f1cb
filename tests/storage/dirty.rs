//! Integration tests for dirty tracking

use shardhold_storage::dirty::{
    clear_dirty, is_dirty, mark_attributes_dirty, mark_equipment_dirty, mark_state_dirty,
};
use shardhold_storage::{DirtyFlags, EntityTable};

#[test]
fn dirty_set_is_exactly_the_flag_column() {
    let mut table = EntityTable::new();
    let a = table.spawn();
    let b = table.spawn();
    let c = table.spawn();

    mark_state_dirty(&mut table, a);
    mark_equipment_dirty(&mut table, c);

    assert_eq!(table.entities_with::<DirtyFlags>(), vec![a, c]);
    assert!(!is_dirty(&table, b));
}

#[test]
fn repeated_marks_accumulate() {
    let mut table = EntityTable::new();
    let e = table.spawn();

    mark_state_dirty(&mut table, e);
    mark_attributes_dirty(&mut table, e);

    let flags = table.get::<DirtyFlags>(e).unwrap();
    assert!(flags.state && flags.attributes);
    assert_eq!(table.count::<DirtyFlags>(), 1);
}

#[test]
fn clear_then_mark_again() {
    let mut table = EntityTable::new();
    let e = table.spawn();

    mark_state_dirty(&mut table, e);
    clear_dirty(&mut table, e);
    assert!(!is_dirty(&table, e));

    mark_attributes_dirty(&mut table, e);
    let flags = table.get::<DirtyFlags>(e).unwrap();
    assert!(flags.attributes);
    assert!(!flags.state);
}

#[test]
fn destroy_drops_dirty_flags() {
    let mut table = EntityTable::new();
    let e = table.spawn();
    mark_state_dirty(&mut table, e);

    table.destroy(e).unwrap();

    assert_eq!(table.count::<DirtyFlags>(), 0);
}
