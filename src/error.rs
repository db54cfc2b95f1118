//! Error types for the plan synchronization engine.
//!
//! The hierarchy mirrors the pipeline: pre-flight validation, remote store
//! failures, and synchronization failures that wrap a remote failure with the
//! stage and entity it happened on.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::sync::{AppliedOperation, EntityRef, SyncStage};

/// The main error type for plansync.
#[derive(Debug, Error)]
pub enum PlanSyncError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The edited plan failed pre-flight validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A remote store call failed outside a synchronization run.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// A synchronization run failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Local sync history errors.
    #[error("History error: {0}")]
    State(#[from] StateError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file was not found.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A file could not be parsed.
    #[error("Failed to parse {location}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Where the content came from.
        location: String,
    },

    /// Environment variable is missing.
    #[error("Missing environment variable: {name}")]
    MissingEnvVar {
        /// Name of the missing variable.
        name: String,
    },

    /// A setting holds an unusable value.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Setting name.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Local sync history errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// The history file could not be decoded.
    #[error("History file is corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },

    /// The history file could not be written.
    #[error("Failed to write history: {message}")]
    WriteFailed {
        /// Description of the write failure.
        message: String,
    },
}

/// Structural problem found in the edited plan before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Path of the offending field (e.g. `plan.days[1].day_number`).
    pub field: String,
    /// Why the value was rejected.
    pub reason: String,
}

/// Failures reported by the remote plan store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The target plan, day or exercise entry does not exist remotely.
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },

    /// Transport-level failure (connection, timeout).
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The bearer credential was rejected.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Message returned by the store.
        message: String,
    },

    /// The store rejected the request.
    #[error("Request rejected: {status} - {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The store answered with something we could not decode.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the decoding problem.
        message: String,
    },
}

/// A remote failure annotated with where in the pipeline it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed on {entity}: {cause}")]
pub struct SyncError {
    /// Pipeline stage that was running.
    pub stage: SyncStage,
    /// Entity the failing call targeted.
    pub entity: EntityRef,
    /// The underlying remote failure.
    #[source]
    pub cause: RemoteError,
    /// Run the failure happened in, once the executor has attached it.
    pub run_id: Option<Uuid>,
    /// Calls that completed before the failure, in issue order.
    pub applied: Vec<AppliedOperation>,
}

/// Result type alias for plansync operations.
pub type Result<T> = std::result::Result<T, PlanSyncError>;

impl PlanSyncError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl ValidationError {
    /// Creates a validation error for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl RemoteError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Returns true if this is a transport failure worth retrying on reads.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl SyncError {
    /// Wraps a remote failure with its stage and entity.
    #[must_use]
    pub const fn new(stage: SyncStage, entity: EntityRef, cause: RemoteError) -> Self {
        Self {
            stage,
            entity,
            cause,
            run_id: None,
            applied: Vec::new(),
        }
    }

    /// Attaches the run id and the calls applied before the failure.
    #[must_use]
    pub fn within_run(mut self, run_id: Uuid, applied: Vec<AppliedOperation>) -> Self {
        self.run_id = Some(run_id);
        self.applied = applied;
        self
    }

    /// Returns true if this error came out of the compensating delete.
    #[must_use]
    pub const fn is_rollback_failure(&self) -> bool {
        matches!(self.stage, SyncStage::Rollback)
    }
}
