//! Outcome of a synchronization run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::{PlanId, PlanSnapshot};

use super::stage::{EntityRef, SyncStage};

/// Which execution path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPath {
    /// The plan had no identity and was created; failures are compensated.
    Create,
    /// The plan already existed; failures leave earlier steps applied.
    Edit,
}

/// Kind of remote call issued by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// create-plan
    CreatePlan,
    /// update-plan
    UpdatePlan,
    /// update-day
    UpdateDay,
    /// add-exercise
    AddExercise,
    /// remove-exercise
    RemoveExercise,
    /// create-day
    CreateDay,
    /// delete-day
    DeleteDay,
}

/// A remote call that completed successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedOperation {
    /// Stage that issued the call.
    pub stage: SyncStage,
    /// Call kind.
    pub kind: OperationKind,
    /// Entity after the call, with any identity it was assigned.
    pub entity: EntityRef,
}

/// Result of a successful synchronization run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Identity of the synced plan.
    pub plan_id: PlanId,
    /// Path taken.
    pub path: SyncPath,
    /// Applied calls in issue order.
    pub operations: Vec<AppliedOperation>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// The edited snapshot with every assigned identity filled in.
    pub synced: PlanSnapshot,
}

impl SyncReport {
    /// Number of remote calls applied.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Wall-clock duration of the run in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Edit => write!(f, "edit"),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreatePlan => "create-plan",
            Self::UpdatePlan => "update-plan",
            Self::UpdateDay => "update-day",
            Self::AddExercise => "add-exercise",
            Self::RemoveExercise => "remove-exercise",
            Self::CreateDay => "create-day",
            Self::DeleteDay => "delete-day",
        };
        write!(f, "{s}")
    }
}
