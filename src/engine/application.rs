//! # Application
//!
//! The outermost layer: three pipelined schedulers — **startup**,
//! **update**, **shutdown** — each seeded with one default stage, driving
//! a shared world and a deferred command buffer.
//!
//! ## Run protocol
//!
//! [`Application::run`]:
//!
//! 1. Execute the startup pipeline, then drain the command queue.
//! 2. Until `should_exit` returns true: execute the update pipeline, then
//!    drain the command queue.
//! 3. Execute the shutdown pipeline.
//!
//! Stage execution may run systems in parallel; the command drain is
//! single-threaded, serializing every world mutation to the boundary
//! between stages. `should_exit` is polled on the calling thread between
//! update passes.
//!
//! ## World access
//!
//! Systems receive the world only through a [`Viewer`] (reads) and
//! [`Commands`] (deferred writes). The drain point reacquires exclusive
//! ownership of the world; a system that retained a world handle past its
//! own return violates the embedder contract and surfaces as an invariant
//! error.

use std::sync::Arc;

use log::debug;

use crate::engine::commands::Commands;
use crate::engine::error::{EcsResult, WorldSharedError};
use crate::engine::pipeline::Pipeline;
use crate::engine::types::{StageId, SystemId};
use crate::engine::viewer::Viewer;
use crate::engine::world::World;

/// Shared per-frame context handed to application systems.
#[derive(Clone)]
pub struct AppContext {
    world: Arc<World>,
    commands: Arc<Commands>,
}

impl AppContext {
    /// The world, read-only.
    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The deferred command buffer.
    #[inline]
    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// A viewer over the world's registry.
    #[inline]
    pub fn viewer(&self) -> Viewer<'_> {
        self.world.viewer()
    }
}

/// System signature used by the application layer.
pub type AppSystem = dyn Fn(&Viewer<'_>, &Commands) + Send + Sync;

/// Lifecycle driver owning the world, the command buffer, and the three
/// pipelines.
pub struct Application {
    world: Arc<World>,
    commands: Arc<Commands>,

    startup: Pipeline<AppContext>,
    update: Pipeline<AppContext>,
    shutdown: Pipeline<AppContext>,

    startup_stage: StageId,
    update_stage: StageId,
    shutdown_stage: StageId,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application whose stages use hardware-sized pools.
    pub fn new() -> Self {
        Self::build(Pipeline::new(), Pipeline::new(), Pipeline::new())
    }

    /// Creates an application whose stages use `threads` workers each.
    pub fn with_threads(threads: usize) -> Self {
        Self::build(
            Pipeline::with_threads(threads),
            Pipeline::with_threads(threads),
            Pipeline::with_threads(threads),
        )
    }

    fn build(
        mut startup: Pipeline<AppContext>,
        mut update: Pipeline<AppContext>,
        mut shutdown: Pipeline<AppContext>,
    ) -> Self {
        let startup_stage = startup.add_stage_to_back();
        let update_stage = update.add_stage_to_back();
        let shutdown_stage = shutdown.add_stage_to_back();

        Self {
            world: Arc::new(World::new()),
            commands: Arc::new(Commands::new()),
            startup,
            update,
            shutdown,
            startup_stage,
            update_stage,
            shutdown_stage,
        }
    }

    /// The world, read-only.
    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Exclusive access to the world, available between frames.
    pub fn world_mut(&mut self) -> EcsResult<&mut World> {
        Arc::get_mut(&mut self.world).ok_or_else(|| WorldSharedError.into())
    }

    /// The deferred command buffer.
    #[inline]
    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// The startup pipeline.
    pub fn startup_pipeline(&self) -> &Pipeline<AppContext> {
        &self.startup
    }

    /// Mutable access to the startup pipeline, for stage management.
    pub fn startup_pipeline_mut(&mut self) -> &mut Pipeline<AppContext> {
        &mut self.startup
    }

    /// The update pipeline.
    pub fn update_pipeline(&self) -> &Pipeline<AppContext> {
        &self.update
    }

    /// Mutable access to the update pipeline, for stage management.
    pub fn update_pipeline_mut(&mut self) -> &mut Pipeline<AppContext> {
        &mut self.update
    }

    /// The shutdown pipeline.
    pub fn shutdown_pipeline(&self) -> &Pipeline<AppContext> {
        &self.shutdown
    }

    /// Mutable access to the shutdown pipeline, for stage management.
    pub fn shutdown_pipeline_mut(&mut self) -> &mut Pipeline<AppContext> {
        &mut self.shutdown
    }

    /// Default stage of the startup pipeline.
    #[inline]
    pub fn startup_stage(&self) -> StageId {
        self.startup_stage
    }

    /// Default stage of the update pipeline.
    #[inline]
    pub fn update_stage(&self) -> StageId {
        self.update_stage
    }

    /// Default stage of the shutdown pipeline.
    #[inline]
    pub fn shutdown_stage(&self) -> StageId {
        self.shutdown_stage
    }

    fn wrap(
        system: impl Fn(&Viewer<'_>, &Commands) + Send + Sync + 'static,
    ) -> impl Fn(&AppContext) + Send + Sync + 'static {
        move |context: &AppContext| {
            let viewer = context.viewer();
            system(&viewer, context.commands());
        }
    }

    /// Registers a system on the default startup stage.
    pub fn add_startup_system(
        &self,
        system: impl Fn(&Viewer<'_>, &Commands) + Send + Sync + 'static,
    ) -> EcsResult<SystemId> {
        self.startup
            .add_system_to_stage(self.startup_stage, Self::wrap(system))
            .map(|(_, id)| id)
    }

    /// Registers a system on the default update stage.
    pub fn add_update_system(
        &self,
        system: impl Fn(&Viewer<'_>, &Commands) + Send + Sync + 'static,
    ) -> EcsResult<SystemId> {
        self.update
            .add_system_to_stage(self.update_stage, Self::wrap(system))
            .map(|(_, id)| id)
    }

    /// Registers a system on the default shutdown stage.
    pub fn add_shutdown_system(
        &self,
        system: impl Fn(&Viewer<'_>, &Commands) + Send + Sync + 'static,
    ) -> EcsResult<SystemId> {
        self.shutdown
            .add_system_to_stage(self.shutdown_stage, Self::wrap(system))
            .map(|(_, id)| id)
    }

    /// Orders two systems of the default startup stage.
    pub fn add_startup_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.startup
            .add_constraint((self.startup_stage, from), (self.startup_stage, to))
    }

    /// Orders two systems of the default update stage.
    pub fn add_update_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.update
            .add_constraint((self.update_stage, from), (self.update_stage, to))
    }

    /// Orders two systems of the default shutdown stage.
    pub fn add_shutdown_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.shutdown
            .add_constraint((self.shutdown_stage, from), (self.shutdown_stage, to))
    }

    /// Removes an ordering constraint from the default startup stage.
    pub fn remove_startup_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.startup
            .remove_constraint((self.startup_stage, from), (self.startup_stage, to))
    }

    /// Removes an ordering constraint from the default update stage.
    pub fn remove_update_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.update
            .remove_constraint((self.update_stage, from), (self.update_stage, to))
    }

    /// Removes an ordering constraint from the default shutdown stage.
    pub fn remove_shutdown_constraint(&self, from: SystemId, to: SystemId) -> EcsResult<()> {
        self.shutdown
            .remove_constraint((self.shutdown_stage, from), (self.shutdown_stage, to))
    }

    /// Returns `true` if the default startup stage carries the edge.
    pub fn contains_startup_constraint(&self, from: SystemId, to: SystemId) -> bool {
        self.startup
            .contains_constraint((self.startup_stage, from), (self.startup_stage, to))
    }

    /// Returns `true` if the default update stage carries the edge.
    pub fn contains_update_constraint(&self, from: SystemId, to: SystemId) -> bool {
        self.update
            .contains_constraint((self.update_stage, from), (self.update_stage, to))
    }

    /// Returns `true` if the default shutdown stage carries the edge.
    pub fn contains_shutdown_constraint(&self, from: SystemId, to: SystemId) -> bool {
        self.shutdown
            .contains_constraint((self.shutdown_stage, from), (self.shutdown_stage, to))
    }

    fn context(&self) -> AppContext {
        AppContext {
            world: Arc::clone(&self.world),
            commands: Arc::clone(&self.commands),
        }
    }

    /// Applies every pending command to the world.
    ///
    /// Only valid between stage executions, when no system holds a world
    /// handle.
    pub fn apply_commands(&mut self) -> EcsResult<usize> {
        let commands = Arc::clone(&self.commands);
        let world = Arc::get_mut(&mut self.world).ok_or(WorldSharedError)?;
        Ok(commands.execute(world))
    }

    /// Drives the application lifecycle.
    ///
    /// Runs startup once, loops update until `should_exit` returns true,
    /// then runs shutdown. The command queue is drained after startup and
    /// after every update pass.
    pub fn run(&mut self, mut should_exit: impl FnMut() -> bool) -> EcsResult<()> {
        debug!("startup");
        self.startup.execute(&self.context())?;
        self.apply_commands()?;

        while !should_exit() {
            self.update.execute(&self.context())?;
            self.apply_commands()?;
        }

        debug!("shutdown");
        self.shutdown.execute(&self.context())?;
        Ok(())
    }
}
