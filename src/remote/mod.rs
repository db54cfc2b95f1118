//! Remote plan store integration.
//!
//! This module defines the operations the sync engine consumes from the
//! remote store, the HTTP client implementing them, and the loader that
//! assembles a plan's last-known remote snapshot.

mod client;
#[cfg(test)]
mod fake;
mod loader;
mod store;
mod types;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpPlanStore};
#[cfg(test)]
pub(crate) use fake::{Call, RecordingStore};
pub use loader::SnapshotLoader;
#[cfg(test)]
pub use store::MockRemotePlanStore;
pub use store::{RemotePlanStore, RemoteResult};
pub use types::{
    BearerToken, DayPayload, DayUpdate, ExercisePayload, PlanPayload, RemoteDay, RemoteExercise,
    RemotePlan,
};
