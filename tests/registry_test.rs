use ecs_framework::{component_id_of, Entity, ErrorKind, Registry};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent {
    value: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent2 {
    value: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent3 {
    value: u8,
}

#[test]
fn attach_and_read_back() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();

    registry.attach_component(entity, MyComponent { value: 32 });

    let storage = registry.storage::<MyComponent>().unwrap();
    assert_eq!(storage.component_of(entity.id()).value, 32);
    assert_eq!(storage.len(), 1);

    registry.attach_components(
        entity,
        (MyComponent { value: 32 }, MyComponent2 { value: 54 }),
    );

    let storage2 = registry.storage::<MyComponent2>().unwrap();
    assert_eq!(storage2.component_of(entity.id()).value, 54);
    assert_eq!(storage2.len(), 1);

    let entity2 = registry.create_entity();
    assert_ne!(entity, entity2);

    registry.attach_component(entity2, MyComponent { value: 64 });

    let storage = registry.storage::<MyComponent>().unwrap();
    assert_eq!(storage.component_of(entity2.id()).value, 64);
    assert_eq!(storage.component_of(entity.id()).value, 32);
    assert_eq!(storage.len(), 2);
}

#[test]
fn duplicate_runtime_type_ids_fail() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();

    let first = component_id_of::<MyComponent>();
    let second = component_id_of::<MyComponent2>();

    registry
        .detach_components_by_ids(entity, &[first, second])
        .unwrap();

    let error = registry
        .detach_components_by_ids(entity, &[first, first])
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn type_ids_are_deterministic_and_distinct() {
    assert_eq!(component_id_of::<MyComponent>(), component_id_of::<MyComponent>());
    assert_ne!(
        component_id_of::<MyComponent>(),
        component_id_of::<MyComponent2>()
    );
    assert_ne!(component_id_of::<u32>(), component_id_of::<u16>());
}

#[test]
fn destroy_recycles_id_with_bumped_version() {
    let mut registry = Registry::new();

    let first = registry.create_entity();
    registry.attach_component(first, MyComponent { value: 7 });
    registry.destroy_entity(first);

    assert!(!registry.contains_entity(first));
    assert!(!registry.contains_component::<MyComponent>(first));

    let second = registry.create_entity();
    assert_eq!(second.id(), first.id());
    assert_ne!(second.version(), first.version());
    assert!(registry.contains_entity(second));
}

#[test]
fn destroy_detaches_every_component() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.attach_components(
        entity,
        (MyComponent { value: 1 }, MyComponent2 { value: 2 }),
    );

    registry.destroy_entity(entity);

    assert_eq!(registry.storage::<MyComponent>().unwrap().len(), 0);
    assert_eq!(registry.storage::<MyComponent2>().unwrap().len(), 0);
    assert_eq!(registry.entity_count(), 0);
}

#[test]
fn destroying_a_stale_handle_is_a_no_op() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.destroy_entity(entity);

    // Second destroy with the now-stale handle changes nothing.
    registry.destroy_entity(entity);

    let fresh = registry.create_entity();
    assert_eq!(fresh.id(), entity.id());
    assert_eq!(registry.entity_count(), 1);
}

#[test]
fn contains_family() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.attach_components(
        entity,
        (MyComponent { value: 1 }, MyComponent2 { value: 2 }),
    );

    assert!(registry.contains_component::<MyComponent>(entity));
    assert!(!registry.contains_component::<MyComponent3>(entity));

    assert!(registry.contains_all::<(MyComponent, MyComponent2)>(entity));
    assert!(!registry.contains_all::<(MyComponent, MyComponent3)>(entity));

    assert!(registry.contains_any::<(MyComponent3, MyComponent)>(entity));
    assert!(!registry.contains_any::<(MyComponent3,)>(entity));
}

#[test]
fn null_entity_is_never_live() {
    let mut registry = Registry::new();
    registry.create_entity();

    assert!(!registry.contains_entity(Entity::null()));
}

#[test]
fn detach_typed_pack() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.attach_components(
        entity,
        (
            MyComponent { value: 1 },
            MyComponent2 { value: 2 },
            MyComponent3 { value: 3 },
        ),
    );

    registry.detach_components::<(MyComponent, MyComponent3)>(entity);

    assert!(!registry.contains_component::<MyComponent>(entity));
    assert!(registry.contains_component::<MyComponent2>(entity));
    assert!(!registry.contains_component::<MyComponent3>(entity));
}

#[test]
fn detach_without_storage_is_a_no_op() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();

    // No storage for MyComponent exists yet.
    registry.detach_component::<MyComponent>(entity);

    assert!(!registry.has_storage::<MyComponent>());
    assert!(registry.contains_entity(entity));
}

#[test]
fn storage_creation_is_lazy_and_monotonic() {
    let mut registry = Registry::new();
    assert_eq!(registry.storage_count(), 0);

    let entity = registry.create_entity();
    registry.attach_component(entity, MyComponent { value: 1 });
    assert_eq!(registry.storage_count(), 1);

    // Detach and destroy never drop a storage.
    registry.detach_component::<MyComponent>(entity);
    registry.destroy_entity(entity);
    assert_eq!(registry.storage_count(), 1);
}

#[test]
fn component_accessors() {
    let mut registry = Registry::new();
    let entity = registry.create_entity();
    registry.attach_component(entity, MyComponent { value: 5 });

    assert_eq!(registry.component::<MyComponent>(entity).unwrap().value, 5);
    assert_eq!(registry.component::<MyComponent2>(entity), None);

    registry.component_mut::<MyComponent>(entity).unwrap().value = 6;
    assert_eq!(registry.component::<MyComponent>(entity).unwrap().value, 6);
}
