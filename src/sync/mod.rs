//! Plan synchronization engine.
//!
//! This module computes the change-set between two snapshots and applies
//! it to the remote store as an ordered pipeline of stages, compensating
//! failed plan creations.

mod diff;
mod executor;
mod report;
mod rollback;
mod stage;

pub use diff::{AddedExercise, ChangeSet, DayField, DiffEngine, MatchedDay, NewDay, PlanField, RemovedDay};
pub use executor::SyncExecutor;
pub use report::{AppliedOperation, OperationKind, SyncPath, SyncReport};
pub use rollback::RollbackController;
pub use stage::{EntityRef, SyncStage};
