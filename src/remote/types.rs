//! Remote plan store request and response types.
//!
//! These map one-to-one to the JSON bodies exchanged with the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{
    Day, DayId, ExerciseEntry, ExerciseId, Identity, PlanExerciseId, PlanId, PlanSnapshot,
};

/// Bearer credential supplied by the caller for every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Body of create-plan and update-plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanPayload {
    /// Plan name.
    pub name: String,
    /// Plan description.
    pub description: Option<String>,
    /// Number of days in the plan.
    pub days_per_week: i64,
    /// Preferred training days.
    pub preferred_days: Option<String>,
}

/// Body of create-day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPayload {
    /// Day number.
    pub day_number: i64,
    /// Day note.
    pub description: Option<String>,
}

/// Body of update-day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayUpdate {
    /// New day number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_number: Option<i64>,
    /// New day note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of add-exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExercisePayload {
    /// Catalog exercise to attach.
    pub exercise_id: ExerciseId,
}

/// A plan as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemotePlan {
    /// Plan identity.
    pub plan_id: PlanId,
    /// Plan name.
    pub name: String,
    /// Plan description.
    #[serde(default)]
    pub description: Option<String>,
    /// Stored day count.
    #[serde(default)]
    pub days_per_week: i64,
    /// Preferred training days.
    #[serde(default)]
    pub preferred_days: Option<String>,
    /// Whether this is the user's active plan.
    #[serde(default)]
    pub is_active: bool,
}

/// A day as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteDay {
    /// Day identity.
    pub plan_day_id: DayId,
    /// Owning plan.
    pub plan_id: PlanId,
    /// Day number.
    pub day_number: i64,
    /// Day note.
    #[serde(default)]
    pub description: Option<String>,
}

/// An exercise entry as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteExercise {
    /// Entry identity.
    pub plan_exercise_id: PlanExerciseId,
    /// Owning day.
    pub plan_day_id: DayId,
    /// Catalog exercise.
    pub exercise_id: ExerciseId,
    /// Catalog display name.
    #[serde(default)]
    pub exercise_name: Option<String>,
    /// Catalog image.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl PlanPayload {
    /// Builds the full plan payload from a snapshot.
    #[must_use]
    pub fn from_snapshot(plan: &PlanSnapshot) -> Self {
        Self {
            name: plan.name.clone(),
            description: plan.description.clone(),
            days_per_week: plan.day_count(),
            preferred_days: plan.preferred_days.clone(),
        }
    }
}

impl DayPayload {
    /// Builds the create-day payload for a snapshot day.
    #[must_use]
    pub fn from_day(day: &Day) -> Self {
        Self {
            day_number: day.day_number,
            description: note_to_description(&day.note),
        }
    }
}

impl DayUpdate {
    /// Builds an update-day payload carrying both fields.
    ///
    /// An empty note is left out like on create-day; the store stores an
    /// absent description as none.
    #[must_use]
    pub fn full(day_number: i64, note: &str) -> Self {
        Self {
            day_number: Some(day_number),
            description: note_to_description(note),
        }
    }
}

impl From<RemoteDay> for Day {
    fn from(day: RemoteDay) -> Self {
        Self {
            identity: Identity::Persisted(day.plan_day_id),
            day_number: day.day_number,
            note: day.description.unwrap_or_default(),
            exercises: Vec::new(),
        }
    }
}

impl From<RemoteExercise> for ExerciseEntry {
    fn from(exercise: RemoteExercise) -> Self {
        Self {
            identity: Identity::Persisted(exercise.plan_exercise_id),
            exercise_id: exercise.exercise_id,
            name: exercise.exercise_name,
            image: exercise.image_url,
        }
    }
}

/// An empty note is stored as no description.
fn note_to_description(note: &str) -> Option<String> {
    (!note.is_empty()).then(|| note.to_string())
}
