//! # ECS Framework
//!
//! Data-oriented Entity-Component-System runtime for game- and
//! simulation-style workloads.
//!
//! ## Design Goals
//! - Sparse-set storage: O(1) insert/remove/lookup, dense iteration
//! - Generationally-versioned entity handles with stale detection
//! - Compile-time-typed views over required/optional/excluded components
//! - Dependency-graph scheduling on a worker-thread pool
//! - All world mutation deferred through a command queue, applied at
//!   stage boundaries
//!
//! ## Quick start
//!
//! ```no_run
//! use ecs_framework::prelude::*;
//!
//! #[derive(Clone, Copy, Default)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Clone, Copy, Default)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut app = Application::new();
//!
//! app.add_startup_system(|_viewer, commands| {
//!     commands.spawn((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.0 }));
//! }).unwrap();
//!
//! app.add_update_system(|viewer, commands| {
//!     for (entity, (position, velocity), _) in
//!         viewer.view::<(Position, Velocity)>()
//!     {
//!         commands.attach(entity, (Position {
//!             x: position.x + velocity.dx,
//!             y: position.y + velocity.dy,
//!         },));
//!     }
//! }).unwrap();
//!
//! let mut frames = 0;
//! app.run(move || { frames += 1; frames > 60 }).unwrap();
//! ```

#![feature(const_type_name)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::entity::Entity;

pub use engine::component::{
    component_id_of, Component, ComponentBundle, ComponentSet,
};

pub use engine::storage::{ErasedStorage, SparseSet};

pub use engine::registry::Registry;

pub use engine::world::{Resource, Resources, World};

pub use engine::commands::{CommandFn, CommandQueue, Commands};

pub use engine::viewer::{View, Viewer};

pub use engine::system::{SystemFn, SystemGraph, SystemNode};

pub use engine::scheduler::{StageScheduler, ThreadPool};

pub use engine::pipeline::Pipeline;

pub use engine::application::{AppContext, AppSystem, Application};

pub use engine::error::{EcsError, EcsResult, ErrorKind};

pub use engine::types::{
    ComponentTypeId, EntityRepr, IdType, StageId, SystemId, VersionType,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used types.
///
/// Import with:
/// ```rust
/// use ecs_framework::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        component_id_of, Application, Commands, EcsError, EcsResult, Entity, ErrorKind, Pipeline,
        Registry, SparseSet, StageScheduler, SystemGraph, ThreadPool, View, Viewer, World,
    };
}
