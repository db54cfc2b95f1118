//! Assembles the last-known remote snapshot of a plan.

use tracing::{debug, info};

use crate::model::{Day, ExerciseEntry, Identity, PlanId, PlanSnapshot};

use super::store::{RemotePlanStore, RemoteResult};
use super::types::BearerToken;

/// Loads persisted plan snapshots from a remote store.
#[derive(Debug)]
pub struct SnapshotLoader<'a, S: RemotePlanStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemotePlanStore + ?Sized> SnapshotLoader<'a, S> {
    /// Creates a loader over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetches the plan, its days, then each day's exercises, one call at a time.
    ///
    /// # Errors
    ///
    /// Returns the first remote failure encountered.
    pub async fn load(&self, token: &BearerToken, plan_id: PlanId) -> RemoteResult<PlanSnapshot> {
        info!("Loading remote snapshot of plan {plan_id}");

        let plan = self.store.fetch_plan(token, plan_id).await?;
        let remote_days = self.store.fetch_days(token, plan_id).await?;

        let mut days = Vec::with_capacity(remote_days.len());
        for remote_day in remote_days {
            let day_id = remote_day.plan_day_id;
            let mut day = Day::from(remote_day);
            day.exercises = self
                .store
                .fetch_exercises(token, plan_id, day_id)
                .await?
                .into_iter()
                .map(ExerciseEntry::from)
                .collect();
            debug!("Day {day_id} has {} exercises", day.exercises.len());
            days.push(day);
        }

        Ok(PlanSnapshot {
            identity: Identity::Persisted(plan.plan_id),
            name: plan.name,
            description: plan.description,
            preferred_days: plan.preferred_days,
            days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DayId, ExerciseId, PlanExerciseId};
    use crate::remote::{MockRemotePlanStore, RemoteDay, RemoteExercise, RemotePlan};

    #[tokio::test]
    async fn test_load_assembles_days_and_exercises() {
        let mut store = MockRemotePlanStore::new();
        store.expect_fetch_plan().times(1).returning(|_, id| {
            Ok(RemotePlan {
                plan_id: id,
                name: String::from("Upper/Lower"),
                description: Some(String::from("4 day split")),
                days_per_week: 2,
                preferred_days: None,
                is_active: true,
            })
        });
        store.expect_fetch_days().times(1).returning(|_, plan_id| {
            Ok(vec![
                RemoteDay {
                    plan_day_id: DayId(10),
                    plan_id,
                    day_number: 1,
                    description: Some(String::from("upper")),
                },
                RemoteDay {
                    plan_day_id: DayId(11),
                    plan_id,
                    day_number: 2,
                    description: None,
                },
            ])
        });
        store
            .expect_fetch_exercises()
            .times(2)
            .returning(|_, _, day_id| {
                if day_id == DayId(10) {
                    Ok(vec![RemoteExercise {
                        plan_exercise_id: PlanExerciseId(100),
                        plan_day_id: day_id,
                        exercise_id: ExerciseId(5),
                        exercise_name: Some(String::from("Bench Press")),
                        image_url: None,
                    }])
                } else {
                    Ok(vec![])
                }
            });

        let token = BearerToken::new("t");
        let snapshot = SnapshotLoader::new(&store)
            .load(&token, PlanId(1))
            .await
            .expect("load");

        assert_eq!(snapshot.identity, Identity::Persisted(PlanId(1)));
        assert_eq!(snapshot.days.len(), 2);
        assert_eq!(snapshot.days[0].note, "upper");
        assert_eq!(snapshot.days[0].exercises.len(), 1);
        assert_eq!(
            snapshot.days[0].exercises[0].identity,
            Identity::Persisted(PlanExerciseId(100))
        );
        assert!(snapshot.days[1].exercises.is_empty());
    }
}
