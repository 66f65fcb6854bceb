//! # System Graph
//!
//! Systems are user-supplied callables arranged into a DAG whose edges
//! express "must finish before". The graph is the unit the stage scheduler
//! clones and topologically consumes each frame.
//!
//! ## Identity
//!
//! [`SystemGraph::add_system`] returns a stable [`SystemId`]. Removing a
//! system frees its id for O(1) reuse by a later registration; a freed id
//! stays invalid until then.
//!
//! ## Thread safety
//!
//! The graph itself is not synchronized; the stage scheduler guards it
//! with a mutex and clones it under lock at execute time. Cloning is
//! structural: adjacency is copied, callables are shared.

use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::error::{EcsResult, SelfLoopError, SystemNotFoundError};
use crate::engine::types::SystemId;

/// Shared system callable, invoked with the scheduler's argument value.
pub type SystemFn<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// One node of the dependency graph: a system plus its adjacency.
pub struct SystemNode<A> {
    id: SystemId,
    system: SystemFn<A>,
    outgoing: HashSet<SystemId>,
    incoming: HashSet<SystemId>,
}

impl<A> Clone for SystemNode<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            system: Arc::clone(&self.system),
            outgoing: self.outgoing.clone(),
            incoming: self.incoming.clone(),
        }
    }
}

impl<A> std::fmt::Debug for SystemNode<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemNode")
            .field("id", &self.id)
            .field("outgoing", &self.outgoing)
            .field("incoming", &self.incoming)
            .finish()
    }
}

impl<A> SystemNode<A> {
    /// The node's stable id.
    #[inline]
    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Number of predecessors that must finish before this system runs.
    #[inline]
    pub fn in_degree(&self) -> usize {
        self.incoming.len()
    }

    /// Number of successors waiting on this system.
    #[inline]
    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }

    /// Ids of the systems this node must precede.
    #[inline]
    pub fn outgoing(&self) -> &HashSet<SystemId> {
        &self.outgoing
    }

    /// Ids of the systems this node waits on.
    #[inline]
    pub fn incoming(&self) -> &HashSet<SystemId> {
        &self.incoming
    }

    /// A shared handle to the callable.
    #[inline]
    pub fn share(&self) -> SystemFn<A> {
        Arc::clone(&self.system)
    }

    /// Invokes the system.
    #[inline]
    pub fn run(&self, args: &A) {
        (self.system)(args)
    }
}

/// Dependency graph of systems with free-id reuse.
pub struct SystemGraph<A> {
    nodes: Vec<Option<SystemNode<A>>>,
    free_ids: Vec<SystemId>,
}

impl<A> Clone for SystemGraph<A> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            free_ids: self.free_ids.clone(),
        }
    }
}

impl<A> Default for SystemGraph<A> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free_ids: Vec::new(),
        }
    }
}

impl<A> SystemGraph<A> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system and returns its stable id.
    pub fn add_system(&mut self, system: impl Fn(&A) + Send + Sync + 'static) -> SystemId {
        self.add_shared(Arc::new(system))
    }

    /// Registers an already-shared system callable.
    ///
    /// Reuses a freed id if one exists, otherwise extends the dense node
    /// array.
    pub fn add_shared(&mut self, system: SystemFn<A>) -> SystemId {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => self.nodes.len() as SystemId,
        };

        let node = SystemNode {
            id,
            system,
            outgoing: HashSet::new(),
            incoming: HashSet::new(),
        };

        if (id as usize) == self.nodes.len() {
            self.nodes.push(Some(node));
        } else {
            self.nodes[id as usize] = Some(node);
        }

        id
    }

    /// Removes a system, clearing its adjacency and freeing its id.
    pub fn remove_system(&mut self, id: SystemId) -> EcsResult<()> {
        if !self.contains_system(id) {
            return Err(SystemNotFoundError { id }.into());
        }

        let node = self.nodes[id as usize]
            .take()
            .expect("contains_system verified the slot");

        for &to in &node.outgoing {
            if let Some(successor) = self.nodes[to as usize].as_mut() {
                successor.incoming.remove(&id);
            }
        }
        for &from in &node.incoming {
            if let Some(predecessor) = self.nodes[from as usize].as_mut() {
                predecessor.outgoing.remove(&id);
            }
        }

        self.free_ids.push(id);
        Ok(())
    }

    /// Returns `true` if `id` refers to a live system.
    #[inline]
    pub fn contains_system(&self, id: SystemId) -> bool {
        (id as usize) < self.nodes.len() && self.nodes[id as usize].is_some()
    }

    /// The node registered under `id`.
    pub fn find_system(&self, id: SystemId) -> EcsResult<&SystemNode<A>> {
        self.nodes
            .get(id as usize)
            .and_then(Option::as_ref)
            .ok_or_else(|| SystemNotFoundError { id }.into())
    }

    fn find_system_mut(&mut self, id: SystemId) -> EcsResult<&mut SystemNode<A>> {
        self.nodes
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or_else(|| SystemNotFoundError { id }.into())
    }

    /// Declares that `from` must finish before `to` starts.
    ///
    /// Self-loops fail with an invalid-argument error; unknown endpoints
    /// fail with not-found. State is unchanged on error.
    pub fn add_constraint(&mut self, from: SystemId, to: SystemId) -> EcsResult<()> {
        if from == to {
            return Err(SelfLoopError { id: from }.into());
        }
        if !self.contains_system(from) {
            return Err(SystemNotFoundError { id: from }.into());
        }
        if !self.contains_system(to) {
            return Err(SystemNotFoundError { id: to }.into());
        }

        self.find_system_mut(from)?.outgoing.insert(to);
        self.find_system_mut(to)?.incoming.insert(from);
        Ok(())
    }

    /// Removes the edge `from -> to`. Removing a self-loop is a no-op.
    pub fn remove_constraint(&mut self, from: SystemId, to: SystemId) -> EcsResult<()> {
        if from == to {
            return Ok(());
        }

        self.find_system_mut(from)?.outgoing.remove(&to);
        self.find_system_mut(to)?.incoming.remove(&from);
        Ok(())
    }

    /// Returns `true` if the edge `from -> to` exists.
    pub fn contains_constraint(&self, from: SystemId, to: SystemId) -> bool {
        if from == to {
            return false;
        }
        match self.find_system(from) {
            Ok(node) => node.outgoing.contains(&to),
            Err(_) => false,
        }
    }

    /// Returns `true` if the graph contains a dependency cycle.
    ///
    /// White/gray/black DFS: `visited` marks finished nodes, `stack` the
    /// active path.
    pub fn check_cycle(&self) -> bool {
        let mut visited: HashSet<SystemId> = HashSet::new();
        let mut stack: HashSet<SystemId> = HashSet::new();

        for node in self.nodes.iter().flatten() {
            if visited.contains(&node.id) {
                continue;
            }
            if self.cycle_dfs(node.id, &mut visited, &mut stack) {
                return true;
            }
        }

        false
    }

    fn cycle_dfs(
        &self,
        id: SystemId,
        visited: &mut HashSet<SystemId>,
        stack: &mut HashSet<SystemId>,
    ) -> bool {
        visited.insert(id);
        stack.insert(id);

        if let Ok(node) = self.find_system(id) {
            for &to in &node.outgoing {
                if stack.contains(&to) {
                    return true;
                }
                if !visited.contains(&to) && self.cycle_dfs(to, visited, stack) {
                    return true;
                }
            }
        }

        stack.remove(&id);
        false
    }

    /// Number of live systems.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_ids.len()
    }

    /// Returns `true` if no live systems remain.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &SystemNode<A>> {
        self.nodes.iter().flatten()
    }

    /// Removes every system and forgets the free-id list.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free_ids.clear();
    }
}
