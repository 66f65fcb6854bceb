//! # Stage Scheduler and Worker Pool
//!
//! This module is responsible for:
//! * executing one system graph per frame on a fixed worker pool,
//! * releasing successors as their predecessors complete,
//! * failing fast when the graph carries a dependency cycle.
//!
//! ## Execution protocol
//!
//! [`StageScheduler::execute`]:
//!
//! 1. Under the graph lock, detect cycles; a cycle fails the call and no
//!    system runs.
//! 2. Clone the graph (structural copy; callables are shared).
//! 3. Return early if the clone is empty.
//! 4. Restart the pool so workers are live.
//! 5. Enqueue every node with in-degree zero.
//! 6. Drain the completion channel: for each finished system, remove its
//!    outgoing edges from the clone and enqueue any successor whose
//!    in-degree drops to zero, then delete the node. Loop until the clone
//!    is empty.
//! 7. Stop the pool, joining the workers.
//!
//! Two systems may run concurrently iff neither is an ancestor of the
//! other; systems sharing an edge never overlap.
//!
//! ## Graph mutation during a frame
//!
//! The canonical graph sits behind a mutex and is cloned under lock at the
//! start of `execute`; mutating it mid-frame is permitted and only affects
//! subsequent executions.
//!
//! ## Panics
//!
//! A panicking system still reports completion through the channel before
//! the unwind resumes on its worker thread, so the frame finishes
//! scheduling. The pool is left degraded; callers should treat a panic as
//! fatal for the frame.

use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, trace};

use crate::engine::error::{CycleError, EcsResult, PoolStoppedError, WorkerLostError};
use crate::engine::system::{SystemFn, SystemGraph, SystemNode};
use crate::engine::types::SystemId;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads consuming tasks from an MPMC channel.
///
/// Stopping closes the channel; workers drain every task already enqueued
/// before exiting, and [`ThreadPool::stop`] joins them, so all accepted
/// work completes before `stop` returns.
pub struct ThreadPool {
    workers: Vec<JoinHandle<()>>,
    sender: Option<Sender<Task>>,
    threads: usize,
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadPool {
    /// Creates a running pool sized to the hardware concurrency.
    pub fn new() -> Self {
        let threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::with_threads(threads)
    }

    /// Creates a running pool with an explicit worker count (at least one).
    pub fn with_threads(threads: usize) -> Self {
        let mut pool = Self {
            workers: Vec::new(),
            sender: None,
            threads: threads.max(1),
        };
        pool.restart();
        pool
    }

    /// Number of worker threads the pool spawns.
    #[inline]
    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Returns `true` if the pool currently accepts no work.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.sender.is_none()
    }

    /// Enqueues a task for execution on some worker.
    ///
    /// Fails with a stopped-pool error if [`ThreadPool::stop`] ran, or if
    /// every worker died.
    pub fn enqueue(&self, task: impl FnOnce() + Send + 'static) -> EcsResult<()> {
        let sender = self.sender.as_ref().ok_or(PoolStoppedError)?;
        sender
            .send(Box::new(task))
            .map_err(|_| PoolStoppedError.into())
    }

    /// Stops the pool: closes the task channel, lets workers drain the
    /// remaining tasks, and joins them. Idempotent.
    pub fn stop(&mut self) {
        if self.sender.take().is_none() {
            return;
        }

        trace!("stopping worker pool ({} thread(s))", self.threads);
        for worker in self.workers.drain(..) {
            // A worker that panicked is already gone; the degraded state
            // surfaces on the next enqueue.
            let _ = worker.join();
        }
    }

    /// Returns the pool to an accepting state with a fresh worker set.
    ///
    /// Joins any existing workers first.
    pub fn restart(&mut self) {
        self.stop();

        let (sender, receiver) = crossbeam_channel::unbounded::<Task>();
        self.sender = Some(sender);
        self.workers = (0..self.threads)
            .map(|index| {
                let receiver: Receiver<Task> = receiver.clone();
                thread::Builder::new()
                    .name(format!("ecs-worker-{index}"))
                    .spawn(move || {
                        while let Ok(task) = receiver.recv() {
                            task();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One stage: a system graph executed in parallel on a worker pool.
///
/// All methods take `&self`; the graph and pool are independently locked,
/// so systems and constraints may be added while a frame is in flight
/// (affecting only subsequent frames).
pub struct StageScheduler<A> {
    graph: Mutex<SystemGraph<A>>,
    pool: Mutex<ThreadPool>,
}

impl<A> Default for StageScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> StageScheduler<A> {
    /// Creates a scheduler with a hardware-sized worker pool.
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(SystemGraph::new()),
            pool: Mutex::new(ThreadPool::new()),
        }
    }

    /// Creates a scheduler with an explicit worker count.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            graph: Mutex::new(SystemGraph::new()),
            pool: Mutex::new(ThreadPool::with_threads(threads)),
        }
    }

    /// Registers a system and returns its stable id.
    pub fn add_system(&self, system: impl Fn(&A) + Send + Sync + 'static) -> SystemId {
        self.graph.lock().unwrap().add_system(system)
    }

    /// Registers an already-shared system callable.
    pub fn add_shared(&self, system: SystemFn<A>) -> SystemId {
        self.graph.lock().unwrap().add_shared(system)
    }

    /// Removes a system from the graph.
    pub fn remove_system(&self, id: SystemId) -> EcsResult<()> {
        self.graph.lock().unwrap().remove_system(id)
    }

    /// Returns `true` if `id` refers to a live system.
    pub fn contains_system(&self, id: SystemId) -> bool {
        self.graph.lock().unwrap().contains_system(id)
    }

    /// Declares that `from` must finish before `to` starts.
    pub fn add_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.graph.lock().unwrap().add_constraint(from, to)
    }

    /// Removes the edge `from -> to`.
    pub fn remove_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.graph.lock().unwrap().remove_constraint(from, to)
    }

    /// Returns `true` if the edge `from -> to` exists.
    pub fn contains_constraint(&self, from: SystemId, to: SystemId) -> bool {
        self.graph.lock().unwrap().contains_constraint(from, to)
    }

    /// Returns `true` if the graph contains a dependency cycle.
    pub fn check_cycle(&self) -> bool {
        self.graph.lock().unwrap().check_cycle()
    }

    /// Number of live systems.
    pub fn len(&self) -> usize {
        self.graph.lock().unwrap().len()
    }

    /// Returns `true` if no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.graph.lock().unwrap().is_empty()
    }
}

impl<A: Clone + Send + Sync + 'static> StageScheduler<A> {
    /// Runs every system once, in topological order, in parallel.
    ///
    /// See the module docs for the full protocol. Fails with an invariant
    /// error if the graph carries a cycle; no system runs in that case.
    pub fn execute(&self, args: &A) -> EcsResult<()> {
        let mut graph_copy = {
            let graph = self.graph.lock().unwrap();
            if graph.check_cycle() {
                return Err(CycleError.into());
            }
            graph.clone()
        };

        if graph_copy.is_empty() {
            return Ok(());
        }

        let mut pool = self.pool.lock().unwrap();
        pool.restart();

        debug!("stage executing {} system(s)", graph_copy.len());
        let (done_tx, done_rx) = crossbeam_channel::unbounded::<SystemId>();

        for node in graph_copy.nodes() {
            if node.in_degree() == 0 {
                Self::enqueue_system(&pool, node, args, &done_tx)?;
            }
        }

        while !graph_copy.is_empty() {
            let id = done_rx.recv().map_err(|_| WorkerLostError {
                remaining: graph_copy.len(),
            })?;
            trace!("system {id} completed");

            let successors: Vec<SystemId> = graph_copy
                .find_system(id)?
                .outgoing()
                .iter()
                .copied()
                .collect();

            for to in successors {
                graph_copy.remove_constraint(id, to)?;
                let successor = graph_copy.find_system(to)?;
                if successor.in_degree() == 0 {
                    Self::enqueue_system(&pool, successor, args, &done_tx)?;
                }
            }

            graph_copy.remove_system(id)?;
        }

        pool.stop();
        Ok(())
    }

    fn enqueue_system(
        pool: &ThreadPool,
        node: &SystemNode<A>,
        args: &A,
        done: &Sender<SystemId>,
    ) -> EcsResult<()> {
        let system = node.share();
        let id = node.id();
        let args = args.clone();
        let done = done.clone();

        pool.enqueue(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| system(&args)));
            // Completion is reported even when the system panicked, so the
            // frame can finish scheduling; the panic then resumes on this
            // worker.
            let _ = done.send(id);
            if let Err(panic) = outcome {
                resume_unwind(panic);
            }
        })
    }
}
