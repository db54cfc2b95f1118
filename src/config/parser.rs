//! Plan document parser for loading and saving edited snapshots.
//!
//! A plan document is a [`PlanSnapshot`] written as YAML or JSON. Entities
//! with an `id` are persisted; entities without one are created on push.

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, PlanSyncError, Result};
use crate::model::PlanSnapshot;

/// Serialization format of a plan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// YAML (`.yaml`, `.yml`, and anything unrecognized).
    Yaml,
    /// JSON (`.json`).
    Json,
}

impl DocumentFormat {
    /// Picks the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Parser for plan documents.
#[derive(Debug, Default)]
pub struct PlanDocumentParser;

impl PlanDocumentParser {
    /// Creates a new plan document parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads a plan document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<PlanSnapshot> {
        let path = path.as_ref();
        info!("Loading plan from: {}", path.display());

        if !path.exists() {
            return Err(PlanSyncError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PlanSyncError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: path.display().to_string(),
            })
        })?;

        self.parse(&content, DocumentFormat::from_path(path), &path.display().to_string())
    }

    /// Parses a plan document from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid plan document.
    pub fn parse(
        &self,
        content: &str,
        format: DocumentFormat,
        location: &str,
    ) -> Result<PlanSnapshot> {
        debug!("Parsing {format:?} plan document");

        let plan: PlanSnapshot = match format {
            DocumentFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| parse_error(format!("YAML parse error: {e}"), location))?,
            DocumentFormat::Json => serde_json::from_str(content)
                .map_err(|e| parse_error(format!("JSON parse error: {e}"), location))?,
        };

        debug!(
            "Parsed plan '{}' with {} days and {} exercises",
            plan.name,
            plan.days.len(),
            plan.exercise_count()
        );
        Ok(plan)
    }

    /// Serializes a plan document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(&self, plan: &PlanSnapshot, format: DocumentFormat) -> Result<String> {
        match format {
            DocumentFormat::Yaml => serde_yaml::to_string(plan)
                .map_err(|e| PlanSyncError::internal(format!("Failed to serialize plan: {e}"))),
            DocumentFormat::Json => serde_json::to_string_pretty(plan)
                .map_err(|e| PlanSyncError::internal(format!("Failed to serialize plan: {e}"))),
        }
    }

    /// Writes a plan document, picking the format from the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_file(&self, path: impl AsRef<Path>, plan: &PlanSnapshot) -> Result<()> {
        let path = path.as_ref();
        let content = self.render(plan, DocumentFormat::from_path(path))?;
        std::fs::write(path, content)?;
        info!("Plan written to: {}", path.display());
        Ok(())
    }
}

fn parse_error(message: String, location: &str) -> PlanSyncError {
    PlanSyncError::Config(ConfigError::ParseError {
        message,
        location: location.to_string(),
    })
}
