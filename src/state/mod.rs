//! State management module for plansync.
//!
//! This module keeps the local journal of push runs, including failed and
//! rolled-back ones.

mod history;

pub use history::{HistoryEntry, MAX_HISTORY, SyncHistory, SyncOutcome};
