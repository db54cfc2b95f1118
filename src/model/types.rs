//! Snapshot types for workout plans.
//!
//! A snapshot is a plan with its days and exercise entries captured at one
//! point in time: either the last-known remote state or the user's working
//! copy. Whether an entity has been persisted is carried by [`Identity`],
//! never by an ad hoc optional id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted identity of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub i64);

/// Persisted identity of a day within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayId(pub i64);

/// Persisted identity of an exercise entry within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanExerciseId(pub i64);

/// Reference into the exercise catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(pub i64);

/// Whether an entity exists remotely yet.
///
/// Serialized as an optional id: absent or `null` means [`Identity::New`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<T>", into = "Option<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de>"
))]
pub enum Identity<T> {
    /// Local-only: no create call has succeeded for it.
    New,
    /// Assigned by the remote store when the create call succeeded.
    Persisted(T),
}

impl<T> Default for Identity<T> {
    fn default() -> Self {
        Self::New
    }
}

impl<T> From<Option<T>> for Identity<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::New, Self::Persisted)
    }
}

impl<T> From<Identity<T>> for Option<T> {
    fn from(value: Identity<T>) -> Self {
        match value {
            Identity::New => None,
            Identity::Persisted(id) => Some(id),
        }
    }
}

impl<T: Copy> Identity<T> {
    /// Returns the persisted id, if any.
    #[must_use]
    pub const fn id(&self) -> Option<T> {
        match self {
            Self::New => None,
            Self::Persisted(id) => Some(*id),
        }
    }
}

impl<T> Identity<T> {
    /// Returns true if no create call has succeeded for this entity.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    /// Returns true if the entity has a remote identity.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

/// A workout plan snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    /// Remote identity of the plan.
    #[serde(rename = "id", default, skip_serializing_if = "Identity::is_new")]
    pub identity: Identity<PlanId>,
    /// Plan name; must be non-empty to sync.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Preferred training days (e.g. `"Mon,Wed,Fri"`).
    #[serde(default)]
    pub preferred_days: Option<String>,
    /// Days in display order.
    #[serde(default)]
    pub days: Vec<Day>,
}

/// One training day of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Remote identity of the day.
    #[serde(rename = "id", default, skip_serializing_if = "Identity::is_new")]
    pub identity: Identity<DayId>,
    /// Day number, a positive integer.
    pub day_number: i64,
    /// Note shown for the day; stored remotely as the day description.
    #[serde(default)]
    pub note: String,
    /// Exercise entries in display order.
    #[serde(default)]
    pub exercises: Vec<ExerciseEntry>,
}

/// An exercise placed on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    /// Remote identity of this entry (not of the catalog exercise).
    #[serde(rename = "id", default, skip_serializing_if = "Identity::is_new")]
    pub identity: Identity<PlanExerciseId>,
    /// Catalog exercise this entry refers to.
    pub exercise_id: ExerciseId,
    /// Display name, rendering only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display image, rendering only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl PlanSnapshot {
    /// Creates a new, local-only plan with no days.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            identity: Identity::New,
            name: name.into(),
            description: None,
            preferred_days: None,
            days: Vec::new(),
        }
    }

    /// Marks the plan as persisted under `id`.
    #[must_use]
    pub fn persisted(mut self, id: PlanId) -> Self {
        self.identity = Identity::Persisted(id);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a day.
    #[must_use]
    pub fn with_day(mut self, day: Day) -> Self {
        self.days.push(day);
        self
    }

    /// Number of days, sent to the store as `days_per_week`.
    #[must_use]
    pub fn day_count(&self) -> i64 {
        i64::try_from(self.days.len()).unwrap_or(i64::MAX)
    }

    /// Total number of exercise entries across all days.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.days.iter().map(|d| d.exercises.len()).sum()
    }
}

impl Day {
    /// Creates a new, local-only day.
    #[must_use]
    pub const fn new(day_number: i64) -> Self {
        Self {
            identity: Identity::New,
            day_number,
            note: String::new(),
            exercises: Vec::new(),
        }
    }

    /// Marks the day as persisted under `id`.
    #[must_use]
    pub fn persisted(mut self, id: DayId) -> Self {
        self.identity = Identity::Persisted(id);
        self
    }

    /// Sets the note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Appends an exercise entry.
    #[must_use]
    pub fn with_exercise(mut self, entry: ExerciseEntry) -> Self {
        self.exercises.push(entry);
        self
    }
}

impl ExerciseEntry {
    /// Creates a new, local-only entry for a catalog exercise.
    #[must_use]
    pub const fn new(exercise_id: ExerciseId) -> Self {
        Self {
            identity: Identity::New,
            exercise_id,
            name: None,
            image: None,
        }
    }

    /// Marks the entry as persisted under `id`.
    #[must_use]
    pub fn persisted(mut self, id: PlanExerciseId) -> Self {
        self.identity = Identity::Persisted(id);
        self
    }
}

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

impl_id_display!(PlanId, DayId, PlanExerciseId, ExerciseId);

impl<T: fmt::Display> fmt::Display for Identity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Persisted(id) => write!(f, "{id}"),
        }
    }
}
