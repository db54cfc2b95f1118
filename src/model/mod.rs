//! Plan data model.
//!
//! This module defines the snapshot structures exchanged with the sync engine
//! and the pre-flight validator that guards every synchronization.

mod types;
mod validator;

pub use types::{
    Day, DayId, ExerciseEntry, ExerciseId, Identity, PlanExerciseId, PlanId, PlanSnapshot,
};
pub use validator::{PlanValidator, ValidationReport};
