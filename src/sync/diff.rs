//! Diff engine for comparing the original and edited plan snapshots.
//!
//! Days and exercise entries are matched by persisted identity only, never by
//! day number or list position.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::model::{Day, DayId, ExerciseId, Identity, PlanExerciseId, PlanSnapshot};

/// Engine for computing change-sets between snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffEngine;

/// Plan-level field that can differ between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanField {
    /// Plan name.
    Name,
    /// Plan description.
    Description,
    /// Preferred training days.
    PreferredDays,
    /// Number of days, derived from the day list.
    DayCount,
}

/// Day-level field that can differ between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayField {
    /// Day number.
    DayNumber,
    /// Day note.
    Note,
}

/// Changes for a day present in both snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedDay {
    /// Identity shared by both snapshots.
    pub day_id: DayId,
    /// Current day number.
    pub day_number: i64,
    /// Current day note.
    pub note: String,
    /// Fields that differ from the original.
    pub changed_fields: Vec<DayField>,
    /// Entries to attach to the day.
    pub added_exercises: Vec<AddedExercise>,
    /// Entry identities to detach from the day.
    pub removed_exercises: Vec<PlanExerciseId>,
}

/// An exercise entry to attach to a matched day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddedExercise {
    /// Index of the entry within the current day.
    pub slot: usize,
    /// Catalog exercise to attach.
    pub exercise_id: ExerciseId,
}

/// A day that must be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDay {
    /// Index of the day within the current snapshot.
    pub position: usize,
    /// The day as edited, with all its entries.
    pub day: Day,
}

/// A day that must be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemovedDay {
    /// Identity of the deleted day.
    pub day_id: DayId,
    /// Day number in the original snapshot.
    pub day_number: i64,
}

/// Everything that differs between the original and current snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Plan-level fields that differ; empty if none.
    pub plan_fields_changed: Vec<PlanField>,
    /// Days present in both snapshots, ordered by identity.
    pub matched_days: Vec<MatchedDay>,
    /// Days to create, in current snapshot order.
    pub new_days: Vec<NewDay>,
    /// Days to delete, in original snapshot order.
    pub removed_days: Vec<RemovedDay>,
}

impl DiffEngine {
    /// Creates a new diff engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the change-set turning `original` into `current`.
    ///
    /// With no original, every day of `current` is new and every plan field
    /// counts as changed.
    #[must_use]
    pub fn compute_changes(
        &self,
        original: Option<&PlanSnapshot>,
        current: &PlanSnapshot,
    ) -> ChangeSet {
        let Some(original) = original else {
            return ChangeSet {
                plan_fields_changed: vec![
                    PlanField::Name,
                    PlanField::Description,
                    PlanField::PreferredDays,
                    PlanField::DayCount,
                ],
                matched_days: vec![],
                new_days: current
                    .days
                    .iter()
                    .enumerate()
                    .map(|(position, day)| NewDay {
                        position,
                        day: day.clone(),
                    })
                    .collect(),
                removed_days: vec![],
            };
        };

        let original_days: HashMap<DayId, &Day> = original
            .days
            .iter()
            .filter_map(|d| d.identity.id().map(|id| (id, d)))
            .collect();

        let mut seen: HashSet<DayId> = HashSet::new();
        let mut matched_days = Vec::new();
        let mut new_days = Vec::new();

        for (position, day) in current.days.iter().enumerate() {
            let matched = match day.identity {
                Identity::New => None,
                Identity::Persisted(id) => {
                    let found = original_days.get(&id).copied();
                    if found.is_none() {
                        warn!("Day {id} is not part of the original plan, it will be re-created");
                    } else if !seen.insert(id) {
                        warn!("Day {id} appears more than once, extra copies will be created");
                        push_new_day(&mut new_days, position, day);
                        continue;
                    }
                    found.map(|orig| (id, orig))
                }
            };

            match matched {
                Some((day_id, orig)) => {
                    matched_days.push(Self::diff_day(day_id, orig, day));
                }
                None => push_new_day(&mut new_days, position, day),
            }
        }

        matched_days.sort_by_key(|m| m.day_id);
        matched_days.retain(MatchedDay::has_changes);

        let removed_days: Vec<RemovedDay> = original
            .days
            .iter()
            .filter_map(|d| match d.identity {
                Identity::Persisted(id) if !seen.contains(&id) => Some(RemovedDay {
                    day_id: id,
                    day_number: d.day_number,
                }),
                _ => None,
            })
            .collect();

        let changes = ChangeSet {
            plan_fields_changed: Self::diff_plan_fields(original, current),
            matched_days,
            new_days,
            removed_days,
        };

        debug!(
            "Change-set: {} plan fields, {} matched days changed, {} new days, {} removed days",
            changes.plan_fields_changed.len(),
            changes.matched_days.len(),
            changes.new_days.len(),
            changes.removed_days.len()
        );

        changes
    }

    fn diff_plan_fields(original: &PlanSnapshot, current: &PlanSnapshot) -> Vec<PlanField> {
        let mut fields = Vec::new();
        if original.name != current.name {
            fields.push(PlanField::Name);
        }
        if original.description != current.description {
            fields.push(PlanField::Description);
        }
        if original.preferred_days != current.preferred_days {
            fields.push(PlanField::PreferredDays);
        }
        if original.day_count() != current.day_count() {
            fields.push(PlanField::DayCount);
        }
        fields
    }

    fn diff_day(day_id: DayId, original: &Day, current: &Day) -> MatchedDay {
        let mut changed_fields = Vec::new();
        if original.day_number != current.day_number {
            changed_fields.push(DayField::DayNumber);
        }
        if original.note != current.note {
            changed_fields.push(DayField::Note);
        }

        let original_entries: HashSet<PlanExerciseId> = original
            .exercises
            .iter()
            .filter_map(|e| e.identity.id())
            .collect();
        let current_entries: HashSet<PlanExerciseId> = current
            .exercises
            .iter()
            .filter_map(|e| e.identity.id())
            .collect();

        let added_exercises = current
            .exercises
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.identity
                    .id()
                    .is_none_or(|id| !original_entries.contains(&id))
            })
            .map(|(slot, e)| AddedExercise {
                slot,
                exercise_id: e.exercise_id,
            })
            .collect();

        let removed_exercises = original
            .exercises
            .iter()
            .filter_map(|e| e.identity.id())
            .filter(|id| !current_entries.contains(id))
            .collect();

        MatchedDay {
            day_id,
            day_number: current.day_number,
            note: current.note.clone(),
            changed_fields,
            added_exercises,
            removed_exercises,
        }
    }
}

fn push_new_day(new_days: &mut Vec<NewDay>, position: usize, day: &Day) {
    new_days.push(NewDay {
        position,
        day: day.clone(),
    });
}

impl MatchedDay {
    /// Returns true if the day needs any remote call.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed_fields.is_empty()
            || !self.added_exercises.is_empty()
            || !self.removed_exercises.is_empty()
    }

    /// Returns true if update-day must be called.
    #[must_use]
    pub fn fields_changed(&self) -> bool {
        !self.changed_fields.is_empty()
    }
}

impl ChangeSet {
    /// Returns true if syncing would issue any remote call on an existing plan.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.plan_fields_changed.is_empty()
            || !self.matched_days.is_empty()
            || !self.new_days.is_empty()
            || !self.removed_days.is_empty()
    }

    /// Number of remote calls needed to apply this change-set.
    ///
    /// A change-set computed without an original lists every plan field, so
    /// create-plan is counted once through the plan term.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        let plan = usize::from(!self.plan_fields_changed.is_empty());
        let matched: usize = self
            .matched_days
            .iter()
            .map(|m| {
                usize::from(m.fields_changed())
                    + m.added_exercises.len()
                    + m.removed_exercises.len()
            })
            .sum();
        let created: usize = self.new_days.iter().map(|n| 1 + n.day.exercises.len()).sum();
        plan + matched + created + self.removed_days.len()
    }
}

impl fmt::Display for PlanField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::PreferredDays => "preferred_days",
            Self::DayCount => "day_count",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for DayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DayNumber => "day_number",
            Self::Note => "note",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return write!(f, "No changes");
        }

        if !self.plan_fields_changed.is_empty() {
            let fields: Vec<String> = self
                .plan_fields_changed
                .iter()
                .map(ToString::to_string)
                .collect();
            writeln!(f, "~ plan ({})", fields.join(", "))?;
        }
        for matched in &self.matched_days {
            writeln!(
                f,
                "~ day {} (+{} -{} exercises)",
                matched.day_id,
                matched.added_exercises.len(),
                matched.removed_exercises.len()
            )?;
        }
        for new_day in &self.new_days {
            writeln!(
                f,
                "+ day #{} ({} exercises)",
                new_day.day.day_number,
                new_day.day.exercises.len()
            )?;
        }
        for removed in &self.removed_days {
            writeln!(f, "- day {}", removed.day_id)?;
        }
        Ok(())
    }
}
