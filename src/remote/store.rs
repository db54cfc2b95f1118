//! Remote plan store trait definition.
//!
//! The sync engine consumes the store as a set of atomic operations. Every
//! operation takes the caller's bearer credential explicitly.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::{DayId, PlanExerciseId, PlanId};

use super::types::{
    BearerToken, DayPayload, DayUpdate, ExercisePayload, PlanPayload, RemoteDay, RemoteExercise,
    RemotePlan,
};

/// Result of a remote store call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Operations offered by the remote plan store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemotePlanStore: Send + Sync {
    /// Creates a plan and returns its identity.
    async fn create_plan(&self, token: &BearerToken, plan: &PlanPayload) -> RemoteResult<PlanId>;

    /// Replaces a plan's fields.
    async fn update_plan(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        plan: &PlanPayload,
    ) -> RemoteResult<()>;

    /// Deletes a plan; the store removes its days and exercises with it.
    async fn delete_plan(&self, token: &BearerToken, plan_id: PlanId) -> RemoteResult<()>;

    /// Fetches a plan's fields.
    async fn fetch_plan(&self, token: &BearerToken, plan_id: PlanId) -> RemoteResult<RemotePlan>;

    /// Lists the days of a plan.
    async fn fetch_days(&self, token: &BearerToken, plan_id: PlanId)
    -> RemoteResult<Vec<RemoteDay>>;

    /// Creates a day and returns its identity.
    async fn create_day(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day: &DayPayload,
    ) -> RemoteResult<DayId>;

    /// Updates a day's fields.
    async fn update_day(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        day: &DayUpdate,
    ) -> RemoteResult<()>;

    /// Deletes a day and its exercises.
    async fn delete_day(&self, token: &BearerToken, plan_id: PlanId, day_id: DayId)
    -> RemoteResult<()>;

    /// Lists the exercise entries of a day.
    async fn fetch_exercises(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
    ) -> RemoteResult<Vec<RemoteExercise>>;

    /// Attaches a catalog exercise to a day and returns the entry identity.
    async fn add_exercise(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        exercise: &ExercisePayload,
    ) -> RemoteResult<PlanExerciseId>;

    /// Removes an exercise entry from a day.
    async fn remove_exercise(
        &self,
        token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        entry_id: PlanExerciseId,
    ) -> RemoteResult<()>;
}
