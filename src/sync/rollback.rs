//! Compensating delete for a partially created plan.

use tracing::{info, warn};

use crate::error::SyncError;
use crate::model::PlanId;
use crate::remote::{BearerToken, RemotePlanStore};

use super::stage::{EntityRef, SyncStage};

/// Undoes a failed plan creation.
#[derive(Debug)]
pub struct RollbackController<'a, S: RemotePlanStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemotePlanStore + ?Sized> RollbackController<'a, S> {
    /// Creates a controller over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Deletes the plan; the store cascades to its days and exercises.
    ///
    /// # Errors
    ///
    /// Returns a [`SyncStage::Rollback`] error if the delete fails.
    pub async fn compensate(&self, token: &BearerToken, plan_id: PlanId) -> Result<(), SyncError> {
        warn!("Rolling back plan {plan_id}");

        self.store
            .delete_plan(token, plan_id)
            .await
            .map_err(|cause| SyncError::new(SyncStage::Rollback, EntityRef::Plan(Some(plan_id)), cause))?;

        info!("Plan {plan_id} rolled back");
        Ok(())
    }
}
