//! Local sync history journal.
//!
//! Every push is recorded in `.plansync/history.json` so failed and
//! rolled-back runs can be inspected afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PlanSyncError, Result, StateError};
use crate::model::{PlanId, PlanSnapshot};
use crate::sync::{SyncPath, SyncReport, SyncStage};

/// Default history directory name.
const HISTORY_DIR: &str = ".plansync";

/// History file name.
const HISTORY_FILE: &str = "history.json";

/// Number of entries kept in the journal.
pub const MAX_HISTORY: usize = 100;

/// How a push ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Every operation was applied.
    Succeeded,
    /// The run stopped; operations before the failure stay applied.
    Failed,
    /// The run failed on a new plan and the plan was deleted again.
    RolledBack,
}

/// One recorded push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Run id.
    pub run_id: Uuid,
    /// Plan name from the pushed document.
    pub plan_name: String,
    /// Plan identity, if one was known or assigned.
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    /// Path taken.
    pub path: SyncPath,
    /// When the push started.
    pub started_at: DateTime<Utc>,
    /// When the push ended.
    pub finished_at: DateTime<Utc>,
    /// Remote calls applied.
    pub operations: usize,
    /// How the push ended.
    pub outcome: SyncOutcome,
    /// Error text for failed pushes.
    #[serde(default)]
    pub error: Option<String>,
}

impl HistoryEntry {
    /// Records a successful run.
    #[must_use]
    pub fn succeeded(report: &SyncReport) -> Self {
        Self {
            run_id: report.run_id,
            plan_name: report.synced.name.clone(),
            plan_id: Some(report.plan_id),
            path: report.path,
            started_at: report.started_at,
            finished_at: report.finished_at,
            operations: report.operation_count(),
            outcome: SyncOutcome::Succeeded,
            error: None,
        }
    }

    /// Records a failed push of `current`.
    ///
    /// A sync failure keeps the executor's run id and counts the calls it
    /// applied before stopping; earlier failures applied nothing.
    #[must_use]
    pub fn failed(current: &PlanSnapshot, started_at: DateTime<Utc>, error: &PlanSyncError) -> Self {
        let path = if current.identity.is_new() {
            SyncPath::Create
        } else {
            SyncPath::Edit
        };

        let (run_id, operations, outcome) = match error {
            PlanSyncError::Sync(e) => {
                let rolled_back = path == SyncPath::Create
                    && e.stage != SyncStage::UpsertPlanMetadata
                    && !e.is_rollback_failure();
                let outcome = if rolled_back {
                    SyncOutcome::RolledBack
                } else {
                    SyncOutcome::Failed
                };
                (e.run_id.unwrap_or_else(Uuid::new_v4), e.applied.len(), outcome)
            }
            _ => (Uuid::new_v4(), 0, SyncOutcome::Failed),
        };

        let plan_id = match error {
            PlanSyncError::Sync(e) => current.identity.id().or_else(|| e.entity.plan_id()),
            _ => current.identity.id(),
        };

        Self {
            run_id,
            plan_name: current.name.clone(),
            plan_id,
            path,
            started_at,
            finished_at: Utc::now(),
            operations,
            outcome,
            error: Some(error.to_string()),
        }
    }
}

/// File-based sync history.
#[derive(Debug)]
pub struct SyncHistory {
    /// Path to the history file.
    path: PathBuf,
}

impl SyncHistory {
    /// Creates a history under `.plansync/` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined.
    pub fn new() -> Result<Self> {
        let base_dir = std::env::current_dir()
            .map_err(|e| PlanSyncError::internal(format!("Cannot determine current directory: {e}")))?
            .join(HISTORY_DIR);

        Ok(Self::with_path(base_dir.join(HISTORY_FILE)))
    }

    /// Creates a history stored at `path`.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all entries, oldest first; a missing file is an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            debug!("No history at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            PlanSyncError::State(StateError::Corrupted {
                message: format!("Failed to read history file: {e}"),
            })
        })?;

        serde_json::from_str(&content).map_err(|e| {
            PlanSyncError::State(StateError::Corrupted {
                message: format!("Failed to parse history file: {e}"),
            })
        })
    }

    /// Appends an entry, dropping the oldest beyond [`MAX_HISTORY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be loaded or written.
    pub async fn append(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.load().await?;
        entries.push(entry);
        if entries.len() > MAX_HISTORY {
            let excess = entries.len() - MAX_HISTORY;
            entries.drain(..excess);
        }

        self.write(&entries).await?;
        info!("History updated ({} entries)", entries.len());
        Ok(())
    }

    /// Returns up to `limit` entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be loaded.
    pub async fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let entries = self.load().await?;
        Ok(entries.into_iter().rev().take(limit).collect())
    }

    async fn write(&self, entries: &[HistoryEntry]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                debug!("Creating history directory: {}", dir.display());
                fs::create_dir_all(dir).await.map_err(write_failed)?;
            }
        }

        let content = serde_json::to_string_pretty(entries).map_err(|e| {
            PlanSyncError::State(StateError::WriteFailed {
                message: format!("Failed to serialize history: {e}"),
            })
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await.map_err(write_failed)?;
        fs::rename(&tmp_path, &self.path).await.map_err(write_failed)?;
        Ok(())
    }
}

fn write_failed(e: std::io::Error) -> PlanSyncError {
    PlanSyncError::State(StateError::WriteFailed {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RemoteError, SyncError};
    use crate::model::{Day, DayId};
    use crate::reconciler::PlanReconciler;
    use crate::remote::{BearerToken, Call, RecordingStore};
    use crate::sync::EntityRef;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn entry(name: &str) -> HistoryEntry {
        let now = Utc::now();
        HistoryEntry {
            run_id: Uuid::new_v4(),
            plan_name: name.to_string(),
            plan_id: Some(PlanId(1)),
            path: SyncPath::Edit,
            started_at: now,
            finished_at: now,
            operations: 2,
            outcome: SyncOutcome::Succeeded,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_missing_history_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let history = SyncHistory::with_path(temp_dir.path().join("history.json"));
        assert!(history.load().await.expect("load").is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_directory_and_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let history = SyncHistory::with_path(temp_dir.path().join(".plansync").join("history.json"));

        assert_ok!(history.append(entry("A")).await);
        assert_ok!(history.append(entry("B")).await);

        let recent = assert_ok!(history.recent(10).await);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].plan_name, "B");
        assert_eq!(recent[1].plan_name, "A");
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let history = SyncHistory::with_path(temp_dir.path().join("history.json"));

        for i in 0..(MAX_HISTORY + 5) {
            history.append(entry(&format!("plan-{i}"))).await.expect("append");
        }

        let entries = history.load().await.expect("load");
        assert_eq!(entries.len(), MAX_HISTORY);
        assert_eq!(entries[0].plan_name, "plan-5");
    }

    #[tokio::test]
    async fn test_corrupted_history_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "not json").expect("write");

        let err = assert_err!(SyncHistory::with_path(path).load().await);
        assert!(matches!(err, PlanSyncError::State(StateError::Corrupted { .. })));
    }

    #[test]
    fn test_failed_create_after_plan_exists_is_rolled_back() {
        let current = PlanSnapshot::new("New plan");
        let error = PlanSyncError::Sync(SyncError::new(
            SyncStage::ProcessNewDays,
            EntityRef::Plan(Some(PlanId(3))),
            RemoteError::network("timeout"),
        ));

        let entry = HistoryEntry::failed(&current, Utc::now(), &error);
        assert_eq!(entry.outcome, SyncOutcome::RolledBack);
        assert_eq!(entry.path, SyncPath::Create);
        assert!(entry.error.is_some());

        let error = PlanSyncError::Sync(SyncError::new(
            SyncStage::UpsertPlanMetadata,
            EntityRef::Plan(None),
            RemoteError::network("timeout"),
        ));
        let entry = HistoryEntry::failed(&current, Utc::now(), &error);
        assert_eq!(entry.outcome, SyncOutcome::Failed);
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_run_id_and_applied_calls() {
        let original = PlanSnapshot::new("Strength")
            .persisted(PlanId(1))
            .with_day(Day::new(1).persisted(DayId(10)));
        let mut current = original.clone().with_day(Day::new(2));
        current.name = String::from("Strength v2");

        let store = RecordingStore::new().fail_nth(
            1,
            |c| matches!(c, Call::CreateDay(..)),
            RemoteError::network("connection reset"),
        );
        let started_at = Utc::now();
        let error = PlanReconciler::new(&store)
            .reconcile(&BearerToken::new("t"), Some(&original), &current)
            .await
            .expect_err("must fail");

        let PlanSyncError::Sync(sync_error) = &error else {
            panic!("unexpected error: {error}");
        };
        let entry = HistoryEntry::failed(&current, started_at, &error);

        assert_eq!(entry.outcome, SyncOutcome::Failed);
        assert_eq!(entry.path, SyncPath::Edit);
        assert_eq!(entry.operations, 1);
        assert_eq!(Some(entry.run_id), sync_error.run_id);
        assert_eq!(entry.plan_id, Some(PlanId(1)));
    }
}
