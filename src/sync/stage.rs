//! Pipeline stages and the entities they act on.

use serde::Serialize;
use std::fmt;

use crate::model::{DayId, ExerciseId, PlanExerciseId, PlanId};

/// Stage of a synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncStage {
    /// Create the plan, or update its fields.
    UpsertPlanMetadata,
    /// Update matched days and their exercise entries.
    ProcessMatchedDays,
    /// Create new days and attach their exercises.
    ProcessNewDays,
    /// Delete days that were removed.
    ProcessRemovedDays,
    /// Compensating delete after a failed creation.
    Rollback,
}

/// The entity a remote call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityRef {
    /// A plan; `None` while it is being created.
    Plan(Option<PlanId>),
    /// A day of a plan; `day` is `None` while it is being created.
    Day {
        /// Owning plan.
        plan: PlanId,
        /// Day identity, if assigned.
        day: Option<DayId>,
        /// Day number from the snapshot.
        day_number: i64,
    },
    /// An exercise entry of a day.
    Exercise {
        /// Owning plan.
        plan: PlanId,
        /// Owning day.
        day: DayId,
        /// Entry identity, if assigned.
        entry: Option<PlanExerciseId>,
        /// Catalog exercise, if known.
        exercise: Option<ExerciseId>,
    },
}

impl EntityRef {
    /// Plan the entity belongs to, once it has an identity.
    #[must_use]
    pub const fn plan_id(&self) -> Option<PlanId> {
        match *self {
            Self::Plan(plan) => plan,
            Self::Day { plan, .. } | Self::Exercise { plan, .. } => Some(plan),
        }
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpsertPlanMetadata => "upsert-plan-metadata",
            Self::ProcessMatchedDays => "process-matched-days",
            Self::ProcessNewDays => "process-new-days",
            Self::ProcessRemovedDays => "process-removed-days",
            Self::Rollback => "rollback",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan(Some(id)) => write!(f, "plan {id}"),
            Self::Plan(None) => write!(f, "new plan"),
            Self::Day {
                plan,
                day: Some(day),
                ..
            } => write!(f, "day {day} of plan {plan}"),
            Self::Day {
                plan,
                day: None,
                day_number,
            } => write!(f, "new day #{day_number} of plan {plan}"),
            Self::Exercise {
                day,
                entry: Some(entry),
                ..
            } => write!(f, "exercise entry {entry} of day {day}"),
            Self::Exercise {
                day,
                entry: None,
                exercise,
                ..
            } => match exercise {
                Some(exercise) => write!(f, "new entry for exercise {exercise} on day {day}"),
                None => write!(f, "new exercise entry on day {day}"),
            },
        }
    }
}
