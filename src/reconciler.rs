//! Reconciler for pushing an edited plan to the remote store.
//!
//! This module runs the full pipeline: validate the edited snapshot,
//! compute the change-set against the original, then execute it. Each
//! stage returns its own result so the pipeline stops at the first failure.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::{PlanSnapshot, PlanValidator, ValidationReport};
use crate::remote::{BearerToken, RemotePlanStore};
use crate::sync::{ChangeSet, DiffEngine, SyncExecutor, SyncReport};

/// Reconciler for edited plans.
#[derive(Debug)]
pub struct PlanReconciler<'a, S: RemotePlanStore + ?Sized> {
    /// Remote plan store.
    store: &'a S,
    /// Pre-flight validator.
    validator: PlanValidator,
    /// Diff engine.
    diff_engine: DiffEngine,
}

/// What a sync would do, computed without any remote call.
#[derive(Debug, Clone, Serialize)]
pub struct SyncPreview {
    /// Validation outcome.
    pub validation: ValidationReport,
    /// Change-set that would be applied.
    pub changes: ChangeSet,
    /// Whether the plan would be created rather than edited.
    pub creates_plan: bool,
}

impl<'a, S: RemotePlanStore + ?Sized> PlanReconciler<'a, S> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            validator: PlanValidator::new(),
            diff_engine: DiffEngine::new(),
        }
    }

    /// Validates and diffs without touching the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn preview(
        &self,
        original: Option<&PlanSnapshot>,
        current: &PlanSnapshot,
    ) -> Result<SyncPreview> {
        let validation = self.validator.validate(original, current)?;
        let changes = self.compute_changes(original, current);

        Ok(SyncPreview {
            validation,
            changes,
            creates_plan: current.identity.is_new(),
        })
    }

    /// Validates, diffs and applies `current` over `original`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any remote call is issued, or the
    /// sync error of the failing stage.
    pub async fn reconcile(
        &self,
        token: &BearerToken,
        original: Option<&PlanSnapshot>,
        current: &PlanSnapshot,
    ) -> Result<SyncReport> {
        info!("Reconciling plan '{}'", current.name);

        let preview = self.preview(original, current)?;
        for warning in &preview.validation.warnings {
            warn!("{warning}");
        }

        if !preview.creates_plan && !preview.changes.has_changes() {
            info!("Plan '{}' is already in sync", current.name);
        }

        let report = SyncExecutor::new(self.store)
            .execute(token, current, &preview.changes)
            .await?;

        Ok(report)
    }

    /// A new plan is diffed against nothing, so every day is created.
    fn compute_changes(&self, original: Option<&PlanSnapshot>, current: &PlanSnapshot) -> ChangeSet {
        if current.identity.is_new() {
            if original.is_some() {
                warn!("Plan '{}' has no identity; ignoring the original snapshot", current.name);
            }
            return self.diff_engine.compute_changes(None, current);
        }
        self.diff_engine.compute_changes(original, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanSyncError;
    use crate::model::{Day, DayId, ExerciseEntry, ExerciseId, Identity, PlanExerciseId, PlanId};
    use crate::remote::{Call, RecordingStore};
    use crate::sync::SyncPath;

    fn original() -> PlanSnapshot {
        PlanSnapshot::new("Strength").persisted(PlanId(1)).with_day(
            Day::new(1)
                .persisted(DayId(10))
                .with_exercise(ExerciseEntry::new(ExerciseId(5)).persisted(PlanExerciseId(100))),
        )
    }

    #[tokio::test]
    async fn test_validation_failure_issues_no_calls() {
        let store = RecordingStore::new();
        let mut current = original();
        current.name = String::from("  ");

        let err = PlanReconciler::new(&store)
            .reconcile(&BearerToken::new("t"), Some(&original()), &current)
            .await
            .expect_err("must fail");

        match err {
            PlanSyncError::Validation(v) => assert_eq!(v.field, "plan.name"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_day_number_issues_no_calls() {
        let store = RecordingStore::new();
        let current = original().with_day(Day::new(0));

        let err = PlanReconciler::new(&store)
            .reconcile(&BearerToken::new("t"), Some(&original()), &current)
            .await
            .expect_err("must fail");

        assert!(matches!(err, PlanSyncError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_plan_issues_no_calls() {
        let store = RecordingStore::new();

        let report = PlanReconciler::new(&store)
            .reconcile(&BearerToken::new("t"), Some(&original()), &original())
            .await
            .expect("sync");

        assert_eq!(report.path, SyncPath::Edit);
        assert_eq!(report.operation_count(), 0);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_plan_ignores_original() {
        let store = RecordingStore::new();
        let current = PlanSnapshot::new("Copy of Strength")
            .with_day(Day::new(1).persisted(DayId(10)));

        let report = PlanReconciler::new(&store)
            .reconcile(&BearerToken::new("t"), Some(&original()), &current)
            .await
            .expect("sync");

        assert_eq!(report.path, SyncPath::Create);
        assert!(matches!(store.calls()[0], Call::CreatePlan(_)));
        assert!(matches!(store.calls()[1], Call::CreateDay(PlanId(500), _)));
        assert_eq!(report.synced.days[0].identity, Identity::Persisted(DayId(501)));
    }

    #[tokio::test]
    async fn test_create_preview_counts_every_call_once() {
        let store = RecordingStore::new();
        let current = PlanSnapshot::new("Upper/Lower")
            .with_day(Day::new(1).with_exercise(ExerciseEntry::new(ExerciseId(3))))
            .with_day(Day::new(2).with_exercise(ExerciseEntry::new(ExerciseId(4))));
        let reconciler = PlanReconciler::new(&store);

        let preview = reconciler.preview(None, &current).expect("preview");
        assert!(preview.creates_plan);
        assert_eq!(preview.changes.operation_count(), 5);

        let report = reconciler
            .reconcile(&BearerToken::new("t"), None, &current)
            .await
            .expect("sync");

        assert_eq!(store.calls().len(), preview.changes.operation_count());
        assert_eq!(report.operation_count(), preview.changes.operation_count());
    }

    #[test]
    fn test_preview_reports_warnings_and_changes() {
        let store = RecordingStore::new();
        let mut current = original().with_day(Day::new(1));
        current.description = Some(String::from("heavy"));

        let preview = PlanReconciler::new(&store)
            .preview(Some(&original()), &current)
            .expect("preview");

        assert!(!preview.creates_plan);
        assert_eq!(preview.validation.warnings.len(), 1);
        assert_eq!(preview.changes.new_days.len(), 1);
        assert!(store.calls().is_empty());
    }
}
