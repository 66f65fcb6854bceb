use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ecs_framework::{CommandQueue, Commands, Entity, World};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent {
    value: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent2 {
    value: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct FrameBudget {
    milliseconds: u32,
}

#[test]
fn spawn_and_destroy_through_commands() {
    let mut world = World::new();
    let commands = Commands::new();

    commands
        .spawn((MyComponent { value: 32 },))
        .spawn((MyComponent2 { value: 64 },));
    commands.execute(&mut world);

    let registry = world.registry();
    assert_eq!(registry.storage::<MyComponent>().unwrap().len(), 1);
    assert_eq!(registry.storage::<MyComponent2>().unwrap().len(), 1);

    commands.destroy(Entity::new(0, 0));
    commands.execute(&mut world);

    assert_eq!(world.registry().storage::<MyComponent>().unwrap().len(), 0);
    assert_eq!(world.registry().storage::<MyComponent2>().unwrap().len(), 1);

    commands.destroy(Entity::new(1, 0));
    commands.execute(&mut world);

    assert_eq!(world.registry().storage::<MyComponent>().unwrap().len(), 0);
    assert_eq!(world.registry().storage::<MyComponent2>().unwrap().len(), 0);
}

#[test]
fn commands_apply_in_fifo_push_order() {
    let mut order: Vec<u32> = Vec::new();
    let queue: CommandQueue<Vec<u32>> = CommandQueue::new();

    queue.push(|order: &mut Vec<u32>| order.push(1));
    queue.push(|order: &mut Vec<u32>| order.push(2));
    queue.push(|order: &mut Vec<u32>| order.push(3));

    let applied = queue.execute(&mut order);

    assert_eq!(applied, 3);
    assert_eq!(order, vec![1, 2, 3]);
    assert!(queue.is_empty());
}

#[test]
fn try_pop_is_non_blocking() {
    let queue: CommandQueue<u32> = CommandQueue::new();
    assert!(queue.try_pop().is_none());

    queue.push(|value: &mut u32| *value += 1);

    let command = queue.try_pop().expect("one command was queued");
    let mut value = 0;
    command(&mut value);
    assert_eq!(value, 1);
    assert!(queue.try_pop().is_none());
}

#[test]
fn wait_and_pop_blocks_until_a_push_arrives() {
    let queue: Arc<CommandQueue<u32>> = Arc::new(CommandQueue::new());

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            queue.push(|value: &mut u32| *value = 7);
        })
    };

    let command = queue.wait_and_pop();
    let mut value = 0;
    command(&mut value);

    producer.join().unwrap();
    assert_eq!(value, 7);
}

#[test]
fn concurrent_producers_lose_nothing() {
    let queue: Arc<CommandQueue<AtomicUsize>> = Arc::new(CommandQueue::new());
    let producers = 8;
    let per_producer = 100;

    let handles: Vec<_> = (0..producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for _ in 0..per_producer {
                    queue.push(|counter: &mut AtomicUsize| {
                        counter.fetch_add(1, Ordering::Relaxed);
                    });
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let mut counter = AtomicUsize::new(0);
    let applied = queue.execute(&mut counter);

    assert_eq!(applied, producers * per_producer);
    assert_eq!(counter.load(Ordering::Relaxed), producers * per_producer);
}

#[test]
fn attach_and_detach_commands() {
    let mut world = World::new();
    let commands = Commands::new();

    let entity = world.registry_mut().create_entity();

    commands.attach(entity, (MyComponent { value: 1 }, MyComponent2 { value: 2 }));
    commands.execute(&mut world);

    assert!(world.registry().contains_all::<(MyComponent, MyComponent2)>(entity));

    commands.detach::<(MyComponent,)>(entity);
    commands.execute(&mut world);

    assert!(!world.registry().contains_component::<MyComponent>(entity));
    assert!(world.registry().contains_component::<MyComponent2>(entity));
}

#[test]
fn resource_commands() {
    let mut world = World::new();
    let commands = Commands::new();

    commands.add_resource(FrameBudget { milliseconds: 16 });
    commands.execute(&mut world);

    assert_eq!(world.resources().len(), 1);
    assert_eq!(
        world.resources().get::<FrameBudget>(),
        Some(&FrameBudget { milliseconds: 16 })
    );

    world
        .resources_mut()
        .get_mut::<FrameBudget>()
        .unwrap()
        .milliseconds = 33;
    assert_eq!(
        world.resources().get::<FrameBudget>(),
        Some(&FrameBudget { milliseconds: 33 })
    );

    commands.remove_resource::<FrameBudget>();
    commands.execute(&mut world);

    assert!(!world.resources().contains::<FrameBudget>());
    assert!(world.resources().is_empty());
}

#[test]
fn default_constructed_resources() {
    let mut world = World::new();
    let commands = Commands::new();

    commands.add_default_resource::<FrameBudget>();
    commands.execute(&mut world);

    assert_eq!(
        world.resources().get::<FrameBudget>(),
        Some(&FrameBudget::default())
    );
}

#[test]
fn clear_drops_without_applying() {
    let mut world = World::new();
    let commands = Commands::new();

    commands.spawn((MyComponent { value: 1 },));
    assert!(!commands.is_empty());

    commands.clear();
    assert!(commands.is_empty());

    assert_eq!(commands.execute(&mut world), 0);
    assert_eq!(world.registry().entity_count(), 0);
}
