// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(dead_code)]                   // Unused code is reported
#![warn(unused_imports)]              // Unused imports are reported
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # plansync
//!
//! Identity-based reconciliation of edited workout plans against a remote
//! plan store.
//!
//! ## Overview
//!
//! A user edits a plan locally (days, notes, exercise entries). plansync turns
//! the difference between the last-known remote snapshot and the edited one
//! into the minimal ordered sequence of remote create/update/delete calls:
//!
//! - Entities are matched by persisted identity only, never by position
//! - Calls run strictly in sequence, days before their exercises
//! - A failed plan creation is rolled back with a compensating delete
//!
//! ## Architecture
//!
//! A push is a pipeline of typed stages:
//!
//! 1. **Validate**: pre-flight checks, no network call
//! 2. **Diff**: classify plan fields, matched, new and removed days
//! 3. **Execute**: upsert plan, process matched, new, then removed days
//! 4. **Compensate**: delete a newly created plan if a later step fails
//!
//! ## Modules
//!
//! - [`model`]: Snapshot data model and validation
//! - [`sync`]: Diff engine, executor and rollback
//! - [`remote`]: Remote plan store trait, HTTP client and snapshot loader
//! - [`reconciler`]: Pipeline entry point
//! - [`config`]: Client settings and plan documents
//! - [`state`]: Local sync history
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! id: 1
//! name: Push Pull Legs
//! days:
//!   - id: 10
//!     day_number: 1
//!     note: Push
//!     exercises:
//!       - id: 100
//!         exercise_id: 5
//!       - exercise_id: 7   # new entry, attached on push
//!   - day_number: 2       # new day, created on push
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod remote;
pub mod state;
pub mod sync;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{PlanDocumentParser, Settings, SettingsLoader};
pub use error::{PlanSyncError, Result};
pub use model::{Day, ExerciseEntry, Identity, PlanSnapshot, PlanValidator};
pub use reconciler::{PlanReconciler, SyncPreview};
pub use remote::{BearerToken, HttpPlanStore, RemotePlanStore, SnapshotLoader};
pub use state::{HistoryEntry, SyncHistory};
pub use sync::{ChangeSet, DiffEngine, RollbackController, SyncExecutor, SyncReport};
