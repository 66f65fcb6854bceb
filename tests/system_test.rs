use ecs_framework::{ErrorKind, SystemGraph};

#[test]
fn constraints_are_directional() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    let first = graph.add_system(|_: &()| {});
    let second = graph.add_system(|_: &()| {});

    graph.add_constraint(first, second).unwrap();

    assert_eq!(graph.len(), 2);
    assert!(graph.contains_constraint(first, second));
    assert!(!graph.contains_constraint(second, first));

    assert_eq!(graph.find_system(first).unwrap().in_degree(), 0);
    assert_eq!(graph.find_system(second).unwrap().in_degree(), 1);
    assert_eq!(graph.find_system(first).unwrap().out_degree(), 1);
    assert_eq!(graph.find_system(second).unwrap().out_degree(), 0);

    assert!(graph.find_system(first).unwrap().outgoing().contains(&second));
    assert!(graph.find_system(second).unwrap().incoming().contains(&first));
}

#[test]
fn ring_is_a_cycle_until_an_edge_breaks() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    for _ in 0..5 {
        graph.add_system(|_: &()| {});
    }

    let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 0)];
    for (from, to) in edges {
        graph.add_constraint(from, to).unwrap();
    }

    assert_eq!(graph.len(), 5);
    for (from, to) in edges {
        assert!(graph.contains_constraint(from, to));
    }
    assert!(graph.check_cycle());

    graph.remove_constraint(4, 0).unwrap();

    assert!(!graph.contains_constraint(4, 0));
    assert!(!graph.check_cycle());
}

#[test]
fn self_loops_are_rejected() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    for _ in 0..8 {
        graph.add_system(|_: &()| {});
    }

    let error = graph.add_constraint(0, 0).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);

    let error = graph.add_constraint(1, 1).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn removed_ids_are_reused() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    let first = graph.add_system(|_: &()| {});
    let second = graph.add_system(|_: &()| {});

    graph.remove_system(first).unwrap();

    assert!(!graph.contains_system(first));
    assert!(graph.contains_system(second));
    assert_eq!(graph.len(), 1);

    let error = graph.find_system(first).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);

    let reused = graph.add_system(|_: &()| {});
    assert_eq!(reused, first);
    assert_eq!(graph.len(), 2);
}

#[test]
fn removing_a_system_clears_its_adjacency() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    let first = graph.add_system(|_: &()| {});
    let second = graph.add_system(|_: &()| {});
    let third = graph.add_system(|_: &()| {});

    graph.add_constraint(first, second).unwrap();
    graph.add_constraint(second, third).unwrap();

    graph.remove_system(second).unwrap();

    assert_eq!(graph.find_system(first).unwrap().out_degree(), 0);
    assert_eq!(graph.find_system(third).unwrap().in_degree(), 0);
    assert!(!graph.check_cycle());
}

#[test]
fn constraint_endpoints_must_exist() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    let only = graph.add_system(|_: &()| {});

    let error = graph.add_constraint(only, only + 1).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(graph.find_system(only).unwrap().out_degree(), 0);
}

#[test]
fn clear_empties_the_graph() {
    let mut graph: SystemGraph<()> = SystemGraph::new();
    graph.add_system(|_: &()| {});
    graph.add_system(|_: &()| {});
    assert!(!graph.is_empty());

    graph.clear();

    assert!(graph.is_empty());
    assert_eq!(graph.len(), 0);
}

#[test]
fn cloned_graphs_share_callables() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let counter = Arc::new(AtomicUsize::new(0));
    let mut graph: SystemGraph<()> = SystemGraph::new();

    let id = {
        let counter = Arc::clone(&counter);
        graph.add_system(move |_: &()| {
            counter.fetch_add(1, Ordering::Relaxed);
        })
    };

    let copy = graph.clone();
    copy.find_system(id).unwrap().run(&());
    graph.find_system(id).unwrap().run(&());

    assert_eq!(counter.load(Ordering::Relaxed), 2);
}
