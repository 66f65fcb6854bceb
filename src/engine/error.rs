//! Error types for the ECS runtime.
//!
//! This module declares focused, composable error types used across the
//! system graph, scheduler, pipeline, command, and registry layers. Each
//! error carries enough context to make failures actionable while remaining
//! small and cheap to pass around or convert into the aggregate
//! [`EcsError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g.
//!   self-loop constraints, freed system ids, stopped worker pools).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into [`EcsError`]
//!   so call sites can use `?`.
//! * **Classification:** [`EcsError::kind`] maps every failure onto one of
//!   four policy classes ([`ErrorKind`]), which callers can match on for
//!   control flow without inspecting individual variants.
//!
//! ## Typical flow
//! Low-level operations return the aggregate directly; callers either match
//! on the variant for precise handling or on `kind()` for policy decisions:
//!
//! ```ignore
//! match scheduler.execute(&args) {
//!     Ok(()) => {}
//!     Err(e) if e.kind() == ErrorKind::Invariant => panic!("bad graph: {e}"),
//!     Err(e) => log::warn!("frame skipped: {e}"),
//! }
//! ```
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

use crate::engine::types::{ComponentTypeId, StageId, SystemId};

/// Classification of ECS failures, matching the runtime's error policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed an argument the API rejects; state is unchanged.
    InvalidArgument,
    /// A structural invariant was violated; the operation did not run.
    Invariant,
    /// A referenced system or stage does not exist.
    NotFound,
    /// The target worker pool is stopped and accepts no work.
    Stopped,
}

/// Returned when a constraint would connect a system to itself.
///
/// Self-loops are rejected eagerly: a node that must finish before itself
/// can never be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfLoopError {
    /// The system id used as both endpoints.
    pub id: SystemId,
}

impl fmt::Display for SelfLoopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint from system {} to itself is not allowed", self.id)
    }
}

impl std::error::Error for SelfLoopError {}

/// Returned when a system id does not refer to a live graph node.
///
/// Ids are recycled after `remove_system`; a freed id stays invalid until
/// the graph reassigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemNotFoundError {
    /// The offending system id.
    pub id: SystemId,
}

impl fmt::Display for SystemNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system {} not found in graph", self.id)
    }
}

impl std::error::Error for SystemNotFoundError {}

/// Returned when a stage id does not refer to a stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageNotFoundError {
    /// The offending stage id.
    pub id: StageId,
}

impl fmt::Display for StageNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage {} not found in pipeline", self.id)
    }
}

impl std::error::Error for StageNotFoundError {}

/// Returned when a runtime list of component type ids contains duplicates.
///
/// The typed (tuple) overloads reject duplicates at compile time instead;
/// this error only arises on the id-slice paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateTypeIdsError {
    /// The type id that appeared more than once.
    pub type_id: ComponentTypeId,
}

impl fmt::Display for DuplicateTypeIdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "duplicate component type id {:#x}", self.type_id)
    }
}

impl std::error::Error for DuplicateTypeIdsError {}

/// Returned when a constraint connects systems of two different stages.
///
/// Ordering constraints are intra-stage only; cross-stage ordering is
/// already implied by stage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossStageConstraintError {
    /// Stage of the predecessor system.
    pub from_stage: StageId,
    /// Stage of the successor system.
    pub to_stage: StageId,
}

impl fmt::Display for CrossStageConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "constraint crosses stages {} -> {}; constraints are intra-stage only",
            self.from_stage, self.to_stage
        )
    }
}

impl std::error::Error for CrossStageConstraintError {}

/// Returned when the system graph contains a dependency cycle at execute
/// time. No system runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleError;

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dependency cycle detected in system graph")
    }
}

impl std::error::Error for CycleError {}

/// Returned when a task is enqueued on a stopped worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStoppedError;

impl fmt::Display for PoolStoppedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("task enqueued on a stopped worker pool")
    }
}

impl std::error::Error for PoolStoppedError {}

/// Returned when the world handle is still shared after a stage completed.
///
/// A system retained a clone of the world past its own return, which the
/// embedder contract forbids; the command drain cannot proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldSharedError;

impl fmt::Display for WorldSharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("world handle still shared after stage completion")
    }
}

impl std::error::Error for WorldSharedError {}

/// Returned when the scheduler's completion channel closed while systems
/// were still pending. This indicates worker threads died mid-frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerLostError {
    /// Number of systems that had not completed when the channel closed.
    pub remaining: usize,
}

impl fmt::Display for WorkerLostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker pool lost with {} system(s) still pending",
            self.remaining
        )
    }
}

impl std::error::Error for WorkerLostError {}

/// Aggregate error for all fallible ECS operations.
///
/// Preserves the underlying structured error so diagnostics stay
/// actionable; use [`EcsError::kind`] when only the policy class matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// A constraint would connect a system to itself.
    SelfLoop(SelfLoopError),
    /// A system id did not refer to a live node.
    SystemNotFound(SystemNotFoundError),
    /// A stage id did not refer to a pipeline stage.
    StageNotFound(StageNotFoundError),
    /// A runtime type-id list contained duplicates.
    DuplicateTypeIds(DuplicateTypeIdsError),
    /// A constraint crossed stage boundaries.
    CrossStageConstraint(CrossStageConstraintError),
    /// The graph contained a cycle at execute time.
    Cycle(CycleError),
    /// The worker pool was stopped.
    PoolStopped(PoolStoppedError),
    /// The world was still shared at a drain point.
    WorldShared(WorldSharedError),
    /// Workers died while systems were pending.
    WorkerLost(WorkerLostError),
}

impl EcsError {
    /// Maps this error onto its policy class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EcsError::SelfLoop(_)
            | EcsError::DuplicateTypeIds(_)
            | EcsError::CrossStageConstraint(_) => ErrorKind::InvalidArgument,
            EcsError::Cycle(_) | EcsError::WorldShared(_) | EcsError::WorkerLost(_) => {
                ErrorKind::Invariant
            }
            EcsError::SystemNotFound(_) | EcsError::StageNotFound(_) => ErrorKind::NotFound,
            EcsError::PoolStopped(_) => ErrorKind::Stopped,
        }
    }
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::SelfLoop(e) => write!(f, "{e}"),
            EcsError::SystemNotFound(e) => write!(f, "{e}"),
            EcsError::StageNotFound(e) => write!(f, "{e}"),
            EcsError::DuplicateTypeIds(e) => write!(f, "{e}"),
            EcsError::CrossStageConstraint(e) => write!(f, "{e}"),
            EcsError::Cycle(e) => write!(f, "{e}"),
            EcsError::PoolStopped(e) => write!(f, "{e}"),
            EcsError::WorldShared(e) => write!(f, "{e}"),
            EcsError::WorkerLost(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<SelfLoopError> for EcsError {
    fn from(e: SelfLoopError) -> Self {
        EcsError::SelfLoop(e)
    }
}
impl From<SystemNotFoundError> for EcsError {
    fn from(e: SystemNotFoundError) -> Self {
        EcsError::SystemNotFound(e)
    }
}
impl From<StageNotFoundError> for EcsError {
    fn from(e: StageNotFoundError) -> Self {
        EcsError::StageNotFound(e)
    }
}
impl From<DuplicateTypeIdsError> for EcsError {
    fn from(e: DuplicateTypeIdsError) -> Self {
        EcsError::DuplicateTypeIds(e)
    }
}
impl From<CrossStageConstraintError> for EcsError {
    fn from(e: CrossStageConstraintError) -> Self {
        EcsError::CrossStageConstraint(e)
    }
}
impl From<CycleError> for EcsError {
    fn from(e: CycleError) -> Self {
        EcsError::Cycle(e)
    }
}
impl From<PoolStoppedError> for EcsError {
    fn from(e: PoolStoppedError) -> Self {
        EcsError::PoolStopped(e)
    }
}
impl From<WorldSharedError> for EcsError {
    fn from(e: WorldSharedError) -> Self {
        EcsError::WorldShared(e)
    }
}
impl From<WorkerLostError> for EcsError {
    fn from(e: WorkerLostError) -> Self {
        EcsError::WorkerLost(e)
    }
}

/// Result alias used across the crate.
pub type EcsResult<T> = Result<T, EcsError>;
