//! In-memory store that records every call, for ordered-call assertions.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::error::RemoteError;
use crate::model::{DayId, PlanExerciseId, PlanId};

use super::store::{RemotePlanStore, RemoteResult};
use super::types::{
    BearerToken, DayPayload, DayUpdate, ExercisePayload, PlanPayload, RemoteDay, RemoteExercise,
    RemotePlan,
};

/// A call received by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreatePlan(PlanPayload),
    UpdatePlan(PlanId, PlanPayload),
    DeletePlan(PlanId),
    FetchPlan(PlanId),
    FetchDays(PlanId),
    CreateDay(PlanId, DayPayload),
    UpdateDay(PlanId, DayId, DayUpdate),
    DeleteDay(PlanId, DayId),
    FetchExercises(PlanId, DayId),
    AddExercise(PlanId, DayId, ExercisePayload),
    RemoveExercise(PlanId, DayId, PlanExerciseId),
}

type FailureRule = Box<dyn FnMut(&Call) -> Option<RemoteError> + Send>;

struct State {
    calls: Vec<Call>,
    next_id: i64,
    rules: Vec<FailureRule>,
}

/// Records calls in order and hands out sequential ids starting at 500.
pub struct RecordingStore {
    state: Mutex<State>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                calls: Vec::new(),
                next_id: 500,
                rules: Vec::new(),
            }),
        }
    }

    /// Fails the `nth` (1-based) call matching `matches` with `error`.
    pub fn fail_nth(
        self,
        nth: usize,
        matches: impl Fn(&Call) -> bool + Send + 'static,
        error: RemoteError,
    ) -> Self {
        let mut seen = 0;
        self.lock().rules.push(Box::new(move |call| {
            if matches(call) {
                seen += 1;
                if seen == nth {
                    return Some(error.clone());
                }
            }
            None
        }));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store lock poisoned")
    }

    fn record(&self, call: Call) -> RemoteResult<()> {
        let mut state = self.lock();
        state.calls.push(call.clone());
        for rule in &mut state.rules {
            if let Some(error) = rule(&call) {
                return Err(error);
            }
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        id
    }
}

#[async_trait]
impl RemotePlanStore for RecordingStore {
    async fn create_plan(&self, _token: &BearerToken, plan: &PlanPayload) -> RemoteResult<PlanId> {
        self.record(Call::CreatePlan(plan.clone()))?;
        Ok(PlanId(self.next_id()))
    }

    async fn update_plan(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        plan: &PlanPayload,
    ) -> RemoteResult<()> {
        self.record(Call::UpdatePlan(plan_id, plan.clone()))
    }

    async fn delete_plan(&self, _token: &BearerToken, plan_id: PlanId) -> RemoteResult<()> {
        self.record(Call::DeletePlan(plan_id))
    }

    async fn fetch_plan(&self, _token: &BearerToken, plan_id: PlanId) -> RemoteResult<RemotePlan> {
        self.record(Call::FetchPlan(plan_id))?;
        Err(RemoteError::not_found(format!("plan {plan_id}")))
    }

    async fn fetch_days(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
    ) -> RemoteResult<Vec<RemoteDay>> {
        self.record(Call::FetchDays(plan_id))?;
        Ok(vec![])
    }

    async fn create_day(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day: &DayPayload,
    ) -> RemoteResult<DayId> {
        self.record(Call::CreateDay(plan_id, day.clone()))?;
        Ok(DayId(self.next_id()))
    }

    async fn update_day(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        day: &DayUpdate,
    ) -> RemoteResult<()> {
        self.record(Call::UpdateDay(plan_id, day_id, day.clone()))
    }

    async fn delete_day(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
    ) -> RemoteResult<()> {
        self.record(Call::DeleteDay(plan_id, day_id))
    }

    async fn fetch_exercises(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
    ) -> RemoteResult<Vec<RemoteExercise>> {
        self.record(Call::FetchExercises(plan_id, day_id))?;
        Ok(vec![])
    }

    async fn add_exercise(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        exercise: &ExercisePayload,
    ) -> RemoteResult<PlanExerciseId> {
        self.record(Call::AddExercise(plan_id, day_id, *exercise))?;
        Ok(PlanExerciseId(self.next_id()))
    }

    async fn remove_exercise(
        &self,
        _token: &BearerToken,
        plan_id: PlanId,
        day_id: DayId,
        entry_id: PlanExerciseId,
    ) -> RemoteResult<()> {
        self.record(Call::RemoveExercise(plan_id, day_id, entry_id))
    }
}
