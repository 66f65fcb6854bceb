//! # Pipelined Scheduler
//!
//! An ordered list of stage schedulers. Each stage is drained completely
//! before the next one starts, which is what makes the between-stage
//! command drain a true synchronization point.
//!
//! ## Stage identity
//!
//! Stages are addressed by an opaque [`StageId`] that stays stable across
//! later insertions; positions (`front`, `back`, `before`, `after`) only
//! matter at insertion time.
//!
//! ## Constraints
//!
//! Ordering constraints are **intra-stage only**: cross-stage ordering is
//! already implied by stage order, so a cross-stage constraint is rejected
//! as an invalid argument rather than silently accepted.

use log::trace;

use crate::engine::error::{CrossStageConstraintError, EcsResult, StageNotFoundError};
use crate::engine::scheduler::StageScheduler;
use crate::engine::system::SystemFn;
use crate::engine::types::{StageId, SystemId};

/// Ordered pipeline of stage schedulers sharing one argument type.
pub struct Pipeline<A> {
    stages: Vec<(StageId, StageScheduler<A>)>,
    next_stage_id: StageId,
    threads: Option<usize>,
}

impl<A> Default for Pipeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Pipeline<A> {
    /// Creates an empty pipeline whose stages use hardware-sized pools.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            next_stage_id: 0,
            threads: None,
        }
    }

    /// Creates an empty pipeline whose stages use `threads` workers each.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            stages: Vec::new(),
            next_stage_id: 0,
            threads: Some(threads),
        }
    }

    fn make_stage(&mut self) -> (StageId, StageScheduler<A>) {
        let id = self.next_stage_id;
        self.next_stage_id += 1;

        let scheduler = match self.threads {
            Some(threads) => StageScheduler::with_threads(threads),
            None => StageScheduler::new(),
        };
        (id, scheduler)
    }

    fn position(&self, stage_id: StageId) -> EcsResult<usize> {
        self.stages
            .iter()
            .position(|(id, _)| *id == stage_id)
            .ok_or_else(|| StageNotFoundError { id: stage_id }.into())
    }

    /// Appends a stage at the end of the pipeline.
    pub fn add_stage_to_back(&mut self) -> StageId {
        let stage = self.make_stage();
        let id = stage.0;
        self.stages.push(stage);
        id
    }

    /// Prepends a stage at the front of the pipeline.
    pub fn add_stage_to_front(&mut self) -> StageId {
        let stage = self.make_stage();
        let id = stage.0;
        self.stages.insert(0, stage);
        id
    }

    /// Inserts a stage immediately before `anchor`.
    pub fn add_stage_before(&mut self, anchor: StageId) -> EcsResult<StageId> {
        let position = self.position(anchor)?;
        let stage = self.make_stage();
        let id = stage.0;
        self.stages.insert(position, stage);
        Ok(id)
    }

    /// Inserts a stage immediately after `anchor`.
    pub fn add_stage_after(&mut self, anchor: StageId) -> EcsResult<StageId> {
        let position = self.position(anchor)?;
        let stage = self.make_stage();
        let id = stage.0;
        self.stages.insert(position + 1, stage);
        Ok(id)
    }

    /// Number of stages in the pipeline.
    #[inline]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if `stage_id` refers to a stage of this pipeline.
    pub fn contains_stage(&self, stage_id: StageId) -> bool {
        self.position(stage_id).is_ok()
    }

    /// Stage ids in execution order.
    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        self.stages.iter().map(|(id, _)| *id)
    }

    /// The scheduler of `stage_id`.
    pub fn stage(&self, stage_id: StageId) -> EcsResult<&StageScheduler<A>> {
        let position = self.position(stage_id)?;
        Ok(&self.stages[position].1)
    }

    /// Registers a system on `stage_id`, returning its full address.
    pub fn add_system_to_stage(
        &self,
        stage_id: StageId,
        system: impl Fn(&A) + Send + Sync + 'static,
    ) -> EcsResult<(StageId, SystemId)> {
        let system_id = self.stage(stage_id)?.add_system(system);
        Ok((stage_id, system_id))
    }

    /// Registers an already-shared system callable on `stage_id`.
    pub fn add_shared_to_stage(
        &self,
        stage_id: StageId,
        system: SystemFn<A>,
    ) -> EcsResult<(StageId, SystemId)> {
        let system_id = self.stage(stage_id)?.add_shared(system);
        Ok((stage_id, system_id))
    }

    /// Removes a system from its stage.
    pub fn remove_system(&self, address: (StageId, SystemId)) -> EcsResult<()> {
        self.stage(address.0)?.remove_system(address.1)
    }

    /// Declares that `from` must finish before `to` starts.
    ///
    /// Both addresses must name the same stage; cross-stage constraints
    /// are rejected.
    pub fn add_constraint(
        &self,
        from: (StageId, SystemId),
        to: (StageId, SystemId),
    ) -> EcsResult<()> {
        if from.0 != to.0 {
            return Err(CrossStageConstraintError {
                from_stage: from.0,
                to_stage: to.0,
            }
            .into());
        }
        self.stage(from.0)?.add_constraint(from.1, to.1)
    }

    /// Removes an intra-stage constraint.
    pub fn remove_constraint(
        &self,
        from: (StageId, SystemId),
        to: (StageId, SystemId),
    ) -> EcsResult<()> {
        if from.0 != to.0 {
            return Err(CrossStageConstraintError {
                from_stage: from.0,
                to_stage: to.0,
            }
            .into());
        }
        self.stage(from.0)?.remove_constraint(from.1, to.1)
    }

    /// Returns `true` if the intra-stage edge exists.
    pub fn contains_constraint(&self, from: (StageId, SystemId), to: (StageId, SystemId)) -> bool {
        if from.0 != to.0 {
            return false;
        }
        match self.stage(from.0) {
            Ok(stage) => stage.contains_constraint(from.1, to.1),
            Err(_) => false,
        }
    }
}

impl<A: Clone + Send + Sync + 'static> Pipeline<A> {
    /// Executes every stage in list order, fully draining one before
    /// starting the next.
    pub fn execute(&self, args: &A) -> EcsResult<()> {
        for (id, stage) in &self.stages {
            trace!("pipeline stage {id}");
            stage.execute(args)?;
        }
        Ok(())
    }
}
