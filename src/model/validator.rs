//! Pre-flight validation of an edited plan.
//!
//! Validation runs before any remote call is issued and stops at the first
//! violation. Problems the remote store tolerates are reported as warnings.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::ValidationError;

use super::types::PlanSnapshot;

/// Range of `days_per_week` the remote store accepts.
const ACCEPTED_DAYS_PER_WEEK: std::ops::RangeInclusive<i64> = 1..=7;

/// Validator for edited plan snapshots.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlanValidator;

/// Outcome of a successful validation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Non-fatal issues worth showing to the user.
    pub warnings: Vec<String>,
}

impl PlanValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the current snapshot against the original it will be synced over.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: an empty plan name, a day whose
    /// `day_number` is not positive, a persisted plan without an original
    /// snapshot, or mismatched plan identities.
    pub fn validate(
        &self,
        original: Option<&PlanSnapshot>,
        current: &PlanSnapshot,
    ) -> Result<ValidationReport, ValidationError> {
        let report = self.validate_document(current)?;
        Self::validate_identities(original, current)?;
        Ok(report)
    }

    /// Validates the edited snapshot on its own.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty plan name or the first day whose
    /// `day_number` is not positive.
    pub fn validate_document(
        &self,
        current: &PlanSnapshot,
    ) -> Result<ValidationReport, ValidationError> {
        if current.name.trim().is_empty() {
            return Err(ValidationError::new("plan.name", "Plan name cannot be empty"));
        }

        for (index, day) in current.days.iter().enumerate() {
            if day.day_number < 1 {
                return Err(ValidationError::new(
                    format!("plan.days[{index}].day_number"),
                    format!("day_number must be a positive integer, got {}", day.day_number),
                ));
            }
        }

        let report = ValidationReport {
            warnings: Self::collect_warnings(current),
        };
        debug!(
            "Plan '{}' passed validation with {} warnings",
            current.name,
            report.warnings.len()
        );
        Ok(report)
    }

    /// Checks that the original snapshot is the one the current plan came from.
    fn validate_identities(
        original: Option<&PlanSnapshot>,
        current: &PlanSnapshot,
    ) -> Result<(), ValidationError> {
        let Some(current_id) = current.identity.id() else {
            return Ok(());
        };

        let Some(original) = original else {
            return Err(ValidationError::new(
                "original",
                format!("plan {current_id} is persisted but no original snapshot was supplied"),
            ));
        };

        match original.identity.id() {
            Some(original_id) if original_id == current_id => Ok(()),
            Some(original_id) => Err(ValidationError::new(
                "original.id",
                format!("original snapshot is plan {original_id}, edited plan is {current_id}"),
            )),
            None => Err(ValidationError::new(
                "original.id",
                "original snapshot has no persisted identity",
            )),
        }
    }

    fn collect_warnings(current: &PlanSnapshot) -> Vec<String> {
        let mut warnings = Vec::new();

        let day_count = current.day_count();
        if !ACCEPTED_DAYS_PER_WEEK.contains(&day_count) {
            warnings.push(format!(
                "Plan has {day_count} days; the store expects between {} and {} days per week",
                ACCEPTED_DAYS_PER_WEEK.start(),
                ACCEPTED_DAYS_PER_WEEK.end()
            ));
        }

        let mut seen = HashSet::new();
        for day in &current.days {
            if !seen.insert(day.day_number) {
                warnings.push(format!(
                    "day_number {} is used by more than one day",
                    day.day_number
                ));
            }
        }

        warnings
    }
}

impl ValidationReport {
    /// Returns true if validation produced no warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
