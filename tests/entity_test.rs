use ecs_framework::engine::types::{EntityRepr, ID_MASK, VERSION_MASK};
use ecs_framework::Entity;

#[test]
fn combine_and_split_round_trip() {
    let id = 0x12345;
    let version = 0x678 & VERSION_MASK;

    let entity = Entity::new(id, version);

    assert_eq!(entity.id(), id);
    assert_eq!(entity.version(), version);
    assert_eq!(entity.split(), (id, version));
}

#[test]
fn raw_round_trip() {
    let entity = Entity::new(42, 7);
    assert_eq!(Entity::from_raw(entity.to_raw()), entity);
}

#[test]
fn null_is_all_ones() {
    let null = Entity::null();

    assert_eq!(null.id(), ID_MASK);
    assert_eq!(null.version(), VERSION_MASK);
    assert_eq!(null.to_raw(), EntityRepr::MAX);
    assert!(null.is_null());
}

#[test]
fn next_version_increments() {
    let entity = Entity::new(0x12345, 0x678 & VERSION_MASK);
    let bumped = entity.next_version();

    assert_eq!(bumped.id(), entity.id());
    assert_eq!(bumped.version(), entity.version() + 1);
}

#[test]
fn version_wraps_without_reissuing_null() {
    let entity = Entity::new(5, VERSION_MASK);
    let wrapped = entity.next_version();

    // The id survives the wrap and the handle never becomes the sentinel.
    assert_eq!(wrapped.id(), 5);
    assert!(!wrapped.is_null());
    assert_ne!(wrapped, Entity::null());
}

#[cfg(not(feature = "entity64"))]
#[test]
fn repeated_bumps_never_produce_null() {
    // Walk an id through a full version cycle and beyond.
    let mut entity = Entity::new(3, 0);
    for _ in 0..=(VERSION_MASK as u64 + 2) {
        entity = entity.next_version();
        assert_eq!(entity.id(), 3);
        assert!(!entity.is_null());
    }
}

#[test]
fn handles_with_different_versions_are_distinct() {
    let first = Entity::new(9, 0);
    let second = Entity::new(9, 1);

    assert_ne!(first, second);
    assert_eq!(first.id(), second.id());
}
