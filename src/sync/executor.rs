//! Sync executor for applying change-sets to the remote store.
//!
//! Stages run strictly one after another and every remote call is awaited
//! before the next is issued: exercises can only be attached to a day once
//! the day has an identity, and rollback needs to know exactly which call
//! failed.

use chrono::Utc;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::error::{RemoteError, SyncError};
use crate::model::{Day, DayId, ExerciseId, Identity, PlanExerciseId, PlanId, PlanSnapshot};
use crate::remote::{
    BearerToken, DayPayload, DayUpdate, ExercisePayload, PlanPayload, RemotePlanStore,
};

use super::diff::ChangeSet;
use super::report::{AppliedOperation, OperationKind, SyncPath, SyncReport};
use super::rollback::RollbackController;
use super::stage::{EntityRef, SyncStage};

/// Result of a single pipeline stage.
type StageResult<T = ()> = Result<T, SyncError>;

/// Executor for change-sets.
#[derive(Debug)]
pub struct SyncExecutor<'a, S: RemotePlanStore + ?Sized> {
    /// Remote plan store.
    store: &'a S,
}

/// State owned by one run.
struct Run {
    plan_id: PlanId,
    working: PlanSnapshot,
    operations: Vec<AppliedOperation>,
}

impl<'a, S: RemotePlanStore + ?Sized> SyncExecutor<'a, S> {
    /// Creates a new executor.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Applies `changes` so the remote plan matches `current`.
    ///
    /// A plan without identity takes the create path: any failure after the
    /// plan is created deletes it again before the error is returned. A
    /// persisted plan takes the edit path: failures return immediately and
    /// earlier calls stay applied.
    ///
    /// # Errors
    ///
    /// Returns the failing call wrapped with its stage and entity, or a
    /// [`SyncStage::Rollback`] error if the compensating delete also failed.
    /// Either carries the run id and the calls applied before the failure.
    pub async fn execute(
        &self,
        token: &BearerToken,
        current: &PlanSnapshot,
        changes: &ChangeSet,
    ) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync", %run_id, plan = %current.identity);
        self.execute_run(run_id, token, current, changes)
            .instrument(span)
            .await
    }

    async fn execute_run(
        &self,
        run_id: Uuid,
        token: &BearerToken,
        current: &PlanSnapshot,
        changes: &ChangeSet,
    ) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();

        let (run, path) = match current.identity {
            Identity::Persisted(plan_id) => {
                info!(
                    "Syncing plan {plan_id} ({} operations)",
                    changes.operation_count()
                );
                let mut run = Run::new(plan_id, current.clone());
                if let Err(cause) = self.edit_plan(&mut run, token, current, changes).await {
                    return Err(cause.within_run(run_id, run.operations));
                }
                (run, SyncPath::Edit)
            }
            Identity::New => {
                info!(
                    "Creating plan '{}' ({} operations)",
                    current.name,
                    changes.operation_count()
                );
                let mut run = self
                    .create_plan(token, current)
                    .await
                    .map_err(|cause| cause.within_run(run_id, Vec::new()))?;
                if let Err(cause) = self.process_days(&mut run, token, changes).await {
                    error!("Sync of new plan {} failed: {cause}", run.plan_id);
                    if let Err(rollback) = RollbackController::new(self.store)
                        .compensate(token, run.plan_id)
                        .await
                    {
                        error!("Rollback failed, superseding original failure: {cause}");
                        return Err(rollback.within_run(run_id, run.operations));
                    }
                    return Err(cause.within_run(run_id, run.operations));
                }
                (run, SyncPath::Create)
            }
        };

        info!(
            "Plan {} synced with {} operations",
            run.plan_id,
            run.operations.len()
        );

        Ok(SyncReport {
            run_id,
            plan_id: run.plan_id,
            path,
            operations: run.operations,
            started_at,
            finished_at: Utc::now(),
            synced: run.working,
        })
    }

    async fn create_plan(&self, token: &BearerToken, current: &PlanSnapshot) -> StageResult<Run> {
        let stage = SyncStage::UpsertPlanMetadata;
        let plan_id = self
            .store
            .create_plan(token, &PlanPayload::from_snapshot(current))
            .await
            .map_err(failed(stage, EntityRef::Plan(None)))?;

        let mut run = Run::new(plan_id, current.clone());
        run.working.identity = Identity::Persisted(plan_id);
        run.record(stage, OperationKind::CreatePlan, EntityRef::Plan(Some(plan_id)));
        Ok(run)
    }

    async fn update_plan_metadata(
        &self,
        run: &mut Run,
        token: &BearerToken,
        current: &PlanSnapshot,
        changes: &ChangeSet,
    ) -> StageResult {
        let stage = SyncStage::UpsertPlanMetadata;
        if changes.plan_fields_changed.is_empty() {
            debug!("Plan fields unchanged");
            return Ok(());
        }

        let entity = EntityRef::Plan(Some(run.plan_id));
        self.store
            .update_plan(token, run.plan_id, &PlanPayload::from_snapshot(current))
            .await
            .map_err(failed(stage, entity))?;
        run.record(stage, OperationKind::UpdatePlan, entity);
        Ok(())
    }

    async fn edit_plan(
        &self,
        run: &mut Run,
        token: &BearerToken,
        current: &PlanSnapshot,
        changes: &ChangeSet,
    ) -> StageResult {
        self.update_plan_metadata(run, token, current, changes).await?;
        self.process_days(run, token, changes).await
    }

    async fn process_days(
        &self,
        run: &mut Run,
        token: &BearerToken,
        changes: &ChangeSet,
    ) -> StageResult {
        self.process_matched_days(run, token, changes).await?;
        self.process_new_days(run, token, changes).await?;
        self.process_removed_days(run, token, changes).await
    }

    async fn process_matched_days(
        &self,
        run: &mut Run,
        token: &BearerToken,
        changes: &ChangeSet,
    ) -> StageResult {
        let stage = SyncStage::ProcessMatchedDays;

        for matched in &changes.matched_days {
            let entity = EntityRef::Day {
                plan: run.plan_id,
                day: Some(matched.day_id),
                day_number: matched.day_number,
            };

            if matched.fields_changed() {
                let update = DayUpdate::full(matched.day_number, &matched.note);
                self.store
                    .update_day(token, run.plan_id, matched.day_id, &update)
                    .await
                    .map_err(failed(stage, entity))?;
                run.record(stage, OperationKind::UpdateDay, entity);
            }

            for added in &matched.added_exercises {
                let entry_id = self
                    .add_exercise(run, token, stage, matched.day_id, added.exercise_id)
                    .await?;
                if let Some(entry) = run
                    .day_mut(matched.day_id)
                    .and_then(|day| day.exercises.get_mut(added.slot))
                {
                    entry.identity = Identity::Persisted(entry_id);
                }
            }

            for &entry_id in &matched.removed_exercises {
                let entity = EntityRef::Exercise {
                    plan: run.plan_id,
                    day: matched.day_id,
                    entry: Some(entry_id),
                    exercise: None,
                };
                self.store
                    .remove_exercise(token, run.plan_id, matched.day_id, entry_id)
                    .await
                    .map_err(failed(stage, entity))?;
                run.record(stage, OperationKind::RemoveExercise, entity);
            }
        }

        Ok(())
    }

    async fn process_new_days(
        &self,
        run: &mut Run,
        token: &BearerToken,
        changes: &ChangeSet,
    ) -> StageResult {
        let stage = SyncStage::ProcessNewDays;

        for new_day in &changes.new_days {
            let day_number = new_day.day.day_number;
            let day_id = self
                .store
                .create_day(token, run.plan_id, &DayPayload::from_day(&new_day.day))
                .await
                .map_err(failed(
                    stage,
                    EntityRef::Day {
                        plan: run.plan_id,
                        day: None,
                        day_number,
                    },
                ))?;
            run.record(
                stage,
                OperationKind::CreateDay,
                EntityRef::Day {
                    plan: run.plan_id,
                    day: Some(day_id),
                    day_number,
                },
            );
            if let Some(day) = run.working.days.get_mut(new_day.position) {
                day.identity = Identity::Persisted(day_id);
            }

            for (slot, entry) in new_day.day.exercises.iter().enumerate() {
                let entry_id = self
                    .add_exercise(run, token, stage, day_id, entry.exercise_id)
                    .await?;
                if let Some(entry) = run
                    .working
                    .days
                    .get_mut(new_day.position)
                    .and_then(|day| day.exercises.get_mut(slot))
                {
                    entry.identity = Identity::Persisted(entry_id);
                }
            }
        }

        Ok(())
    }

    async fn process_removed_days(
        &self,
        run: &mut Run,
        token: &BearerToken,
        changes: &ChangeSet,
    ) -> StageResult {
        let stage = SyncStage::ProcessRemovedDays;

        for removed in &changes.removed_days {
            let entity = EntityRef::Day {
                plan: run.plan_id,
                day: Some(removed.day_id),
                day_number: removed.day_number,
            };
            self.store
                .delete_day(token, run.plan_id, removed.day_id)
                .await
                .map_err(failed(stage, entity))?;
            run.record(stage, OperationKind::DeleteDay, entity);
        }

        Ok(())
    }

    async fn add_exercise(
        &self,
        run: &mut Run,
        token: &BearerToken,
        stage: SyncStage,
        day_id: DayId,
        exercise_id: ExerciseId,
    ) -> StageResult<PlanExerciseId> {
        let entity = EntityRef::Exercise {
            plan: run.plan_id,
            day: day_id,
            entry: None,
            exercise: Some(exercise_id),
        };
        let entry_id = self
            .store
            .add_exercise(token, run.plan_id, day_id, &ExercisePayload { exercise_id })
            .await
            .map_err(failed(stage, entity))?;
        run.record(
            stage,
            OperationKind::AddExercise,
            EntityRef::Exercise {
                plan: run.plan_id,
                day: day_id,
                entry: Some(entry_id),
                exercise: Some(exercise_id),
            },
        );
        Ok(entry_id)
    }
}

impl Run {
    const fn new(plan_id: PlanId, working: PlanSnapshot) -> Self {
        Self {
            plan_id,
            working,
            operations: Vec::new(),
        }
    }

    fn record(&mut self, stage: SyncStage, kind: OperationKind, entity: EntityRef) {
        debug!("{stage}: {kind} {entity}");
        self.operations.push(AppliedOperation {
            stage,
            kind,
            entity,
        });
    }

    fn day_mut(&mut self, day_id: DayId) -> Option<&mut Day> {
        self.working
            .days
            .iter_mut()
            .find(|day| day.identity == Identity::Persisted(day_id))
    }
}

/// Wraps a remote failure with the stage and entity it happened on.
fn failed(stage: SyncStage, entity: EntityRef) -> impl FnOnce(RemoteError) -> SyncError {
    move |cause| SyncError::new(stage, entity, cause)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExerciseEntry;
    use crate::remote::{Call, MockRemotePlanStore, RecordingStore};
    use crate::sync::DiffEngine;
    use mockall::predicate::{always, eq};

    fn token() -> BearerToken {
        BearerToken::new("test-token")
    }

    fn scenario_a_original() -> PlanSnapshot {
        PlanSnapshot::new("Full Body").persisted(PlanId(1)).with_day(
            Day::new(1).persisted(DayId(10)).with_exercise(
                ExerciseEntry::new(ExerciseId(5)).persisted(PlanExerciseId(100)),
            ),
        )
    }

    fn scenario_a_current() -> PlanSnapshot {
        let mut current = scenario_a_original();
        current.name = String::from("Full Body v2");
        current.days[0].note = String::from("x");
        current.days[0]
            .exercises
            .push(ExerciseEntry::new(ExerciseId(7)));
        current.with_day(Day::new(2))
    }

    fn scenario_b_current() -> PlanSnapshot {
        PlanSnapshot::new("Upper/Lower")
            .with_day(Day::new(1).with_exercise(ExerciseEntry::new(ExerciseId(3))))
            .with_day(Day::new(2).with_exercise(ExerciseEntry::new(ExerciseId(4))))
    }

    fn is_add_exercise(call: &Call) -> bool {
        matches!(call, Call::AddExercise(..))
    }

    #[tokio::test]
    async fn test_edit_path_issues_calls_in_stage_order() {
        let original = scenario_a_original();
        let current = scenario_a_current();
        let changes = DiffEngine::new().compute_changes(Some(&original), &current);
        let store = RecordingStore::new();

        let report = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect("sync");

        let calls = store.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(&calls[0], Call::UpdatePlan(PlanId(1), payload) if payload.name == "Full Body v2" && payload.days_per_week == 2));
        assert_eq!(
            calls[1],
            Call::UpdateDay(PlanId(1), DayId(10), DayUpdate::full(1, "x"))
        );
        assert_eq!(
            calls[2],
            Call::AddExercise(
                PlanId(1),
                DayId(10),
                ExercisePayload {
                    exercise_id: ExerciseId(7)
                }
            )
        );
        assert!(matches!(&calls[3], Call::CreateDay(PlanId(1), payload) if payload.day_number == 2));

        assert_eq!(report.path, SyncPath::Edit);
        assert_eq!(report.plan_id, PlanId(1));
        assert_eq!(report.operation_count(), 4);
    }

    #[tokio::test]
    async fn test_edit_path_fills_assigned_identities() {
        let original = scenario_a_original();
        let current = scenario_a_current();
        let changes = DiffEngine::new().compute_changes(Some(&original), &current);
        let store = RecordingStore::new();

        let report = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect("sync");

        let synced = &report.synced;
        assert_eq!(
            synced.days[0].exercises[1].identity,
            Identity::Persisted(PlanExerciseId(500))
        );
        assert_eq!(synced.days[1].identity, Identity::Persisted(DayId(501)));
        assert_eq!(
            synced.days[0].exercises[0].identity,
            Identity::Persisted(PlanExerciseId(100))
        );
    }

    #[tokio::test]
    async fn test_removed_days_are_deleted_last() {
        let original = scenario_a_original().with_day(Day::new(2).persisted(DayId(11)));
        let mut current = scenario_a_original();
        current.days[0].exercises.clear();
        current.days.push(Day::new(3));
        let changes = DiffEngine::new().compute_changes(Some(&original), &current);
        let store = RecordingStore::new();

        SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect("sync");

        let calls = store.calls();
        assert_eq!(
            calls[0],
            Call::RemoveExercise(PlanId(1), DayId(10), PlanExerciseId(100))
        );
        assert!(matches!(calls[1], Call::CreateDay(PlanId(1), _)));
        assert_eq!(calls.last(), Some(&Call::DeleteDay(PlanId(1), DayId(11))));
    }

    #[tokio::test]
    async fn test_edit_failure_keeps_earlier_calls_and_skips_rollback() {
        let original = scenario_a_original();
        let current = scenario_a_current();
        let changes = DiffEngine::new().compute_changes(Some(&original), &current);
        let store = RecordingStore::new().fail_nth(
            1,
            is_add_exercise,
            RemoteError::not_found("day 10"),
        );

        let err = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect_err("must fail");

        assert_eq!(err.stage, SyncStage::ProcessMatchedDays);
        assert_eq!(err.cause, RemoteError::not_found("day 10"));
        let calls = store.calls();
        assert_eq!(calls.len(), 3);
        assert!(!calls.iter().any(|c| matches!(c, Call::DeletePlan(_))));

        assert!(err.run_id.is_some());
        let applied: Vec<OperationKind> = err.applied.iter().map(|op| op.kind).collect();
        assert_eq!(applied, vec![OperationKind::UpdatePlan, OperationKind::UpdateDay]);
    }

    #[tokio::test]
    async fn test_create_path_rolls_back_once_and_surfaces_original_failure() {
        let current = scenario_b_current();
        let changes = DiffEngine::new().compute_changes(None, &current);
        let store = RecordingStore::new().fail_nth(
            2,
            is_add_exercise,
            RemoteError::network("connection reset"),
        );

        let err = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect_err("must fail");

        assert_eq!(err.stage, SyncStage::ProcessNewDays);
        assert_eq!(err.cause, RemoteError::network("connection reset"));
        assert!(!err.is_rollback_failure());

        let calls = store.calls();
        let deletes: Vec<&Call> = calls
            .iter()
            .filter(|c| matches!(c, Call::DeletePlan(_)))
            .collect();
        assert_eq!(deletes, vec![&Call::DeletePlan(PlanId(500))]);
        assert_eq!(calls.last(), Some(&Call::DeletePlan(PlanId(500))));
    }

    #[tokio::test]
    async fn test_failed_rollback_supersedes_original_failure() {
        let current = scenario_b_current();
        let changes = DiffEngine::new().compute_changes(None, &current);
        let store = RecordingStore::new()
            .fail_nth(1, is_add_exercise, RemoteError::network("timeout"))
            .fail_nth(
                1,
                |c| matches!(c, Call::DeletePlan(_)),
                RemoteError::network("connection refused"),
            );

        let err = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect_err("must fail");

        assert!(err.is_rollback_failure());
        assert_eq!(err.entity, EntityRef::Plan(Some(PlanId(500))));
        assert_eq!(err.cause, RemoteError::network("connection refused"));
    }

    #[tokio::test]
    async fn test_create_plan_failure_does_not_roll_back() {
        let current = scenario_b_current();
        let changes = DiffEngine::new().compute_changes(None, &current);
        let store = RecordingStore::new().fail_nth(
            1,
            |c| matches!(c, Call::CreatePlan(_)),
            RemoteError::Rejected {
                status: 422,
                message: String::from("days_per_week out of range"),
            },
        );

        let err = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect_err("must fail");

        assert_eq!(err.stage, SyncStage::UpsertPlanMetadata);
        assert_eq!(err.entity, EntityRef::Plan(None));
        assert_eq!(store.calls().len(), 1);
        assert!(err.applied.is_empty());
    }

    #[tokio::test]
    async fn test_create_path_assigns_every_identity() {
        let current = scenario_b_current();
        let changes = DiffEngine::new().compute_changes(None, &current);
        let store = RecordingStore::new();

        let report = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect("sync");

        assert_eq!(report.path, SyncPath::Create);
        assert_eq!(report.plan_id, PlanId(500));
        assert_eq!(report.synced.identity, Identity::Persisted(PlanId(500)));
        assert!(report.synced.days.iter().all(|d| d.identity.is_persisted()));
        assert!(
            report
                .synced
                .days
                .iter()
                .flat_map(|d| &d.exercises)
                .all(|e| e.identity.is_persisted())
        );
        assert_eq!(
            store.calls()[1],
            Call::CreateDay(
                PlanId(500),
                DayPayload {
                    day_number: 1,
                    description: None
                }
            )
        );
    }

    #[tokio::test]
    async fn test_create_path_compensates_exactly_once() {
        let current = scenario_b_current();
        let changes = DiffEngine::new().compute_changes(None, &current);

        let mut store = MockRemotePlanStore::new();
        store.expect_create_plan().times(1).returning(|_, _| Ok(PlanId(42)));
        let mut next_day = 0;
        store.expect_create_day().times(2).returning(move |_, _, _| {
            next_day += 1;
            Ok(DayId(next_day))
        });
        store
            .expect_add_exercise()
            .with(always(), eq(PlanId(42)), eq(DayId(1)), always())
            .times(1)
            .returning(|_, _, _, _| Ok(PlanExerciseId(7)));
        store
            .expect_add_exercise()
            .with(always(), eq(PlanId(42)), eq(DayId(2)), always())
            .times(1)
            .returning(|_, _, _, _| Err(RemoteError::network("timeout")));
        store
            .expect_delete_plan()
            .with(always(), eq(PlanId(42)))
            .times(1)
            .returning(|_, _| Ok(()));

        let err = SyncExecutor::new(&store)
            .execute(&token(), &current, &changes)
            .await
            .expect_err("must fail");

        assert_eq!(
            err.entity,
            EntityRef::Exercise {
                plan: PlanId(42),
                day: DayId(2),
                entry: None,
                exercise: Some(ExerciseId(4)),
            }
        );
    }
}
