//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::model::{PlanSnapshot, ValidationReport};
use crate::reconciler::SyncPreview;
use crate::state::{HistoryEntry, SyncOutcome};
use crate::sync::{ChangeSet, OperationKind, SyncPath, SyncReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Details")]
    details: String,
}

/// Applied operation row for table display.
#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Entity")]
    entity: String,
}

/// History row for table display.
#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Plan")]
    plan: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Ops")]
    operations: usize,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Formats a successful validation.
    #[must_use]
    pub fn format_validation(&self, plan: &PlanSnapshot, report: &ValidationReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "valid": true,
                "plan": plan.name,
                "persisted": plan.identity.is_persisted(),
                "days": plan.days.len(),
                "exercises": plan.exercise_count(),
                "warnings": report.warnings,
            })),
            OutputFormat::Text => {
                let mut output = format!("{} Plan is valid\n\n", "✓".green());
                let _ = writeln!(output, "   Plan: {}", plan.name);
                let _ = writeln!(output, "   Identity: {}", plan.identity);
                let _ = writeln!(output, "   Days: {}", plan.days.len());
                let _ = writeln!(output, "   Exercises: {}", plan.exercise_count());
                output.push_str(&Self::format_warnings(&report.warnings));
                output
            }
        }
    }

    /// Formats what a push would do.
    #[must_use]
    pub fn format_preview(&self, preview: &SyncPreview) -> String {
        match self.format {
            OutputFormat::Json => to_json(preview),
            OutputFormat::Text => {
                let mut output = String::new();

                if preview.creates_plan {
                    let _ = writeln!(output, "\n{} New plan will be created", "+".green());
                } else if !preview.changes.has_changes() {
                    let _ = writeln!(
                        output,
                        "{} No changes required - plan is up to date.",
                        "✓".green()
                    );
                    output.push_str(&Self::format_warnings(&preview.validation.warnings));
                    return output;
                }

                output.push_str("\nChange-set\n\n");
                let rows = Self::change_rows(&preview.changes);
                if !rows.is_empty() {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                let operations = preview.changes.operation_count();
                let _ = write!(
                    output,
                    "\nPlan: {} days to create, {} to update, {} to delete ({operations} calls)\n",
                    preview.changes.new_days.len().to_string().green(),
                    preview.changes.matched_days.len().to_string().yellow(),
                    preview.changes.removed_days.len().to_string().red()
                );
                output.push_str(&Self::format_warnings(&preview.validation.warnings));
                output
            }
        }
    }

    /// Formats a completed sync.
    #[must_use]
    pub fn format_report(&self, report: &SyncReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                let verb = match report.path {
                    SyncPath::Create => "created",
                    SyncPath::Edit => "updated",
                };
                let mut output = format!(
                    "{} Plan {} {verb} in {} ms\n\n",
                    "✓".green(),
                    report.plan_id,
                    report.duration_ms()
                );

                if report.operations.is_empty() {
                    output.push_str("   No remote calls were needed.\n");
                    return output;
                }

                let rows: Vec<OperationRow> = report
                    .operations
                    .iter()
                    .enumerate()
                    .map(|(i, op)| OperationRow {
                        index: i + 1,
                        stage: op.stage.to_string(),
                        operation: Self::format_operation_kind(op.kind),
                        entity: op.entity.to_string(),
                    })
                    .collect();
                output.push_str(&Table::new(rows).to_string());
                output.push('\n');
                let _ = writeln!(output, "\n   Run: {}", report.run_id);
                output
            }
        }
    }

    /// Formats sync history entries, newest first.
    #[must_use]
    pub fn format_history(&self, entries: &[HistoryEntry]) -> String {
        match self.format {
            OutputFormat::Json => to_json(&entries),
            OutputFormat::Text => {
                if entries.is_empty() {
                    return String::from("No pushes recorded.\n");
                }

                let rows: Vec<HistoryRow> = entries
                    .iter()
                    .map(|e| HistoryRow {
                        when: e.started_at.format("%Y-%m-%d %H:%M").to_string(),
                        plan: Self::truncate(
                            &e.plan_id.map_or_else(
                                || e.plan_name.clone(),
                                |id| format!("{} ({id})", e.plan_name),
                            ),
                            32,
                        ),
                        path: e.path.to_string(),
                        operations: e.operations,
                        outcome: Self::format_outcome(e.outcome),
                    })
                    .collect();

                let mut output = Table::new(rows).to_string();
                output.push('\n');

                for entry in entries.iter().filter(|e| e.error.is_some()) {
                    if let Some(error) = &entry.error {
                        let _ = writeln!(output, "   {} {}: {error}", "✗".red(), entry.run_id);
                    }
                }
                output
            }
        }
    }

    /// Formats a success message.
    #[must_use]
    pub fn success(&self, message: &str) -> String {
        self.message("success", &"✓".green().to_string(), message)
    }

    /// Formats an error message.
    #[must_use]
    pub fn error(&self, message: &str) -> String {
        self.message("error", &"✗".red().to_string(), message)
    }

    /// Formats a warning message.
    #[must_use]
    pub fn warning(&self, message: &str) -> String {
        self.message("warning", &"⚠".yellow().to_string(), message)
    }

    fn message(&self, status: &str, symbol: &str, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({ "status": status, "message": message })),
            OutputFormat::Text => format!("{symbol} {message}"),
        }
    }

    fn change_rows(changes: &ChangeSet) -> Vec<ChangeRow> {
        let mut rows = Vec::new();

        if !changes.plan_fields_changed.is_empty() {
            let fields: Vec<String> = changes
                .plan_fields_changed
                .iter()
                .map(ToString::to_string)
                .collect();
            rows.push(ChangeRow {
                change: "~update".yellow().to_string(),
                target: String::from("plan"),
                details: fields.join(", "),
            });
        }

        for matched in &changes.matched_days {
            let mut details = Vec::new();
            if matched.fields_changed() {
                let fields: Vec<String> =
                    matched.changed_fields.iter().map(ToString::to_string).collect();
                details.push(fields.join(", "));
            }
            if !matched.added_exercises.is_empty() {
                details.push(format!("+{} exercises", matched.added_exercises.len()));
            }
            if !matched.removed_exercises.is_empty() {
                details.push(format!("-{} exercises", matched.removed_exercises.len()));
            }
            rows.push(ChangeRow {
                change: "~update".yellow().to_string(),
                target: format!("day {} (#{})", matched.day_id, matched.day_number),
                details: details.join("; "),
            });
        }

        for new_day in &changes.new_days {
            rows.push(ChangeRow {
                change: "+create".green().to_string(),
                target: format!("day #{}", new_day.day.day_number),
                details: format!(
                    "{} exercises{}",
                    new_day.day.exercises.len(),
                    if new_day.day.note.is_empty() {
                        String::new()
                    } else {
                        format!(", \"{}\"", Self::truncate(&new_day.day.note, 30))
                    }
                ),
            });
        }

        for removed in &changes.removed_days {
            rows.push(ChangeRow {
                change: "-delete".red().to_string(),
                target: format!("day {} (#{})", removed.day_id, removed.day_number),
                details: String::from("with its exercises"),
            });
        }

        rows
    }

    fn format_warnings(warnings: &[String]) -> String {
        let mut output = String::new();
        if !warnings.is_empty() {
            let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
            for warning in warnings {
                let _ = writeln!(output, "   - {warning}");
            }
        }
        output
    }

    /// Formats an operation kind with color.
    fn format_operation_kind(kind: OperationKind) -> String {
        let label = kind.to_string();
        match kind {
            OperationKind::CreatePlan | OperationKind::CreateDay | OperationKind::AddExercise => {
                label.green().to_string()
            }
            OperationKind::UpdatePlan | OperationKind::UpdateDay => label.yellow().to_string(),
            OperationKind::DeleteDay | OperationKind::RemoveExercise => label.red().to_string(),
        }
    }

    /// Formats a sync outcome with color.
    fn format_outcome(outcome: SyncOutcome) -> String {
        match outcome {
            SyncOutcome::Succeeded => "succeeded".green().to_string(),
            SyncOutcome::Failed => "failed".red().to_string(),
            SyncOutcome::RolledBack => "rolled back".yellow().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
