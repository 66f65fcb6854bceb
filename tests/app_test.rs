use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use ecs_framework::{Application, Entity, ErrorKind, Pipeline};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent {
    value: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct MyComponent2 {
    value: u64,
}

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[test]
fn startup_commands_are_drained_before_update() {
    init_logging();

    let mut app = Application::with_threads(2);

    app.add_startup_system(|_viewer, commands| {
        commands
            .spawn((MyComponent { value: 32 },))
            .spawn((MyComponent2 { value: 64 },));
    })
    .unwrap();

    let observed = Arc::new(AtomicUsize::new(0));
    {
        let observed = Arc::clone(&observed);
        app.add_update_system(move |viewer, _commands| {
            // The spawn commands were applied before the first update.
            observed.store(
                viewer.view::<(MyComponent,)>().count()
                    + viewer.view::<(MyComponent2,)>().count(),
                Ordering::Relaxed,
            );
        })
        .unwrap();
    }

    let mut frames = 0;
    app.run(move || {
        frames += 1;
        frames > 1
    })
    .unwrap();

    assert_eq!(observed.load(Ordering::Relaxed), 2);

    let registry = app.world().registry();
    assert_eq!(registry.storage::<MyComponent>().unwrap().len(), 1);
    assert_eq!(registry.storage::<MyComponent2>().unwrap().len(), 1);
}

#[test]
fn destroy_command_removes_exactly_one_entity() {
    init_logging();

    let mut app = Application::with_threads(2);

    app.add_startup_system(|_viewer, commands| {
        commands
            .spawn((MyComponent { value: 32 },))
            .spawn((MyComponent2 { value: 64 },));
    })
    .unwrap();

    app.run(|| true).unwrap();

    app.commands().destroy(Entity::new(0, 0));
    app.apply_commands().unwrap();

    let registry = app.world().registry();
    assert_eq!(registry.storage::<MyComponent>().unwrap().len(), 0);
    assert_eq!(registry.storage::<MyComponent2>().unwrap().len(), 1);

    app.commands().destroy(Entity::new(1, 0));
    app.apply_commands().unwrap();

    let registry = app.world().registry();
    assert_eq!(registry.storage::<MyComponent>().unwrap().len(), 0);
    assert_eq!(registry.storage::<MyComponent2>().unwrap().len(), 0);
}

#[test]
fn lifecycle_order_is_startup_update_shutdown() {
    init_logging();

    let mut app = Application::with_threads(2);
    let phases = Arc::new(Mutex::new(Vec::new()));

    {
        let phases = Arc::clone(&phases);
        app.add_startup_system(move |_viewer, _commands| {
            phases.lock().unwrap().push("startup");
        })
        .unwrap();
    }
    {
        let phases = Arc::clone(&phases);
        app.add_update_system(move |_viewer, _commands| {
            phases.lock().unwrap().push("update");
        })
        .unwrap();
    }
    {
        let phases = Arc::clone(&phases);
        app.add_shutdown_system(move |_viewer, _commands| {
            phases.lock().unwrap().push("shutdown");
        })
        .unwrap();
    }

    let mut frames = 0;
    app.run(move || {
        frames += 1;
        frames > 3
    })
    .unwrap();

    assert_eq!(
        *phases.lock().unwrap(),
        vec!["startup", "update", "update", "update", "shutdown"]
    );
}

#[test]
fn update_constraints_order_systems() {
    init_logging();

    let mut app = Application::with_threads(4);
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let order = Arc::clone(&order);
        app.add_update_system(move |_viewer, _commands| {
            order.lock().unwrap().push(1);
        })
        .unwrap()
    };
    let second = {
        let order = Arc::clone(&order);
        app.add_update_system(move |_viewer, _commands| {
            order.lock().unwrap().push(2);
        })
        .unwrap()
    };

    app.add_update_constraint(first, second).unwrap();
    assert!(app.contains_update_constraint(first, second));
    assert!(!app.contains_update_constraint(second, first));

    let mut frames = 0;
    app.run(move || {
        frames += 1;
        frames > 1
    })
    .unwrap();

    assert_eq!(*order.lock().unwrap(), vec![1, 2]);

    app.remove_update_constraint(first, second).unwrap();
    assert!(!app.contains_update_constraint(first, second));
}

#[test]
fn systems_mutate_the_world_only_through_commands() {
    init_logging();

    let mut app = Application::with_threads(2);

    app.add_startup_system(|_viewer, commands| {
        commands.spawn((MyComponent { value: 0 },));
    })
    .unwrap();

    app.add_update_system(|viewer, commands| {
        for (entity, (component,), _) in viewer.view::<(MyComponent,)>() {
            commands.attach(
                entity,
                (MyComponent {
                    value: component.value + 1,
                },),
            );
        }
    })
    .unwrap();

    let mut frames = 0;
    app.run(move || {
        frames += 1;
        frames > 3
    })
    .unwrap();

    let registry = app.world().registry();
    let storage = registry.storage::<MyComponent>().unwrap();
    assert_eq!(storage.len(), 1);
    assert_eq!(storage.component_of(0).value, 3);
}

#[test]
fn pipeline_stages_execute_in_list_order() {
    init_logging();

    let mut pipeline: Pipeline<Arc<Mutex<Vec<u32>>>> = Pipeline::with_threads(2);

    let middle = pipeline.add_stage_to_back();
    let last = pipeline.add_stage_to_back();
    let first = pipeline.add_stage_to_front();
    let second = pipeline.add_stage_after(first).unwrap();
    let fourth = pipeline.add_stage_before(last).unwrap();

    assert_eq!(pipeline.stage_count(), 5);
    assert_eq!(
        pipeline.stage_ids().collect::<Vec<_>>(),
        vec![first, second, middle, fourth, last]
    );

    for (tag, stage) in [(0, first), (1, second), (2, middle), (3, fourth), (4, last)] {
        pipeline
            .add_system_to_stage(stage, move |order: &Arc<Mutex<Vec<u32>>>| {
                order.lock().unwrap().push(tag);
            })
            .unwrap();
    }

    let order = Arc::new(Mutex::new(Vec::new()));
    pipeline.execute(&order).unwrap();

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn cross_stage_constraints_are_rejected() {
    init_logging();

    let mut pipeline: Pipeline<()> = Pipeline::with_threads(1);
    let stage_a = pipeline.add_stage_to_back();
    let stage_b = pipeline.add_stage_to_back();

    let (_, system_a) = pipeline.add_system_to_stage(stage_a, |_: &()| {}).unwrap();
    let (_, system_b) = pipeline.add_system_to_stage(stage_b, |_: &()| {}).unwrap();

    let error = pipeline
        .add_constraint((stage_a, system_a), (stage_b, system_b))
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    assert!(!pipeline.contains_constraint((stage_a, system_a), (stage_b, system_b)));
}

#[test]
fn removed_pipeline_systems_do_not_run() {
    init_logging();

    let mut pipeline: Pipeline<Arc<AtomicUsize>> = Pipeline::with_threads(2);
    let stage = pipeline.add_stage_to_back();

    let kept = pipeline
        .add_system_to_stage(stage, |counter: &Arc<AtomicUsize>| {
            counter.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    let dropped = pipeline
        .add_system_to_stage(stage, |counter: &Arc<AtomicUsize>| {
            counter.fetch_add(100, Ordering::Relaxed);
        })
        .unwrap();

    pipeline.remove_system(dropped).unwrap();
    assert!(pipeline.contains_stage(kept.0));

    let counter = Arc::new(AtomicUsize::new(0));
    pipeline.execute(&counter).unwrap();

    assert_eq!(counter.load(Ordering::Relaxed), 1);
}

#[test]
fn extra_stages_observe_the_shared_context() {
    init_logging();

    let mut app = Application::with_threads(2);

    app.add_startup_system(|_viewer, commands| {
        commands.spawn((MyComponent { value: 9 },));
    })
    .unwrap();

    // A raw stage after the default update stage, using the context type
    // directly instead of the viewer/commands wrapper.
    let update_stage = app.update_stage();
    let late_stage = app
        .update_pipeline_mut()
        .add_stage_after(update_stage)
        .unwrap();

    let observed = Arc::new(AtomicUsize::new(0));
    {
        let observed = Arc::clone(&observed);
        app.update_pipeline()
            .add_system_to_stage(late_stage, move |context| {
                let live = context.world().registry().entity_count();
                observed.store(live, Ordering::Relaxed);
            })
            .unwrap();
    }

    let mut frames = 0;
    app.run(move || {
        frames += 1;
        frames > 1
    })
    .unwrap();

    assert_eq!(observed.load(Ordering::Relaxed), 1);
}

#[test]
fn unknown_stage_ids_are_rejected() {
    init_logging();

    let mut pipeline: Pipeline<()> = Pipeline::with_threads(1);
    let only = pipeline.add_stage_to_back();

    let error = pipeline.add_stage_before(only + 1).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);

    let error = pipeline
        .add_system_to_stage(only + 1, |_: &()| {})
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn resources_flow_through_the_app() {
    init_logging();

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct TickCount {
        value: u32,
    }

    let mut app = Application::with_threads(2);

    app.add_startup_system(|_viewer, commands| {
        commands.add_resource(TickCount { value: 7 });
    })
    .unwrap();

    app.run(|| true).unwrap();

    assert_eq!(
        app.world().resources().get::<TickCount>(),
        Some(&TickCount { value: 7 })
    );
}
