//! Configuration module for plansync.
//!
//! This module handles all configuration-related functionality:
//! - Loading client settings from `plansync.yaml`, `.env` and the environment
//! - Parsing and writing plan documents (YAML or JSON snapshots)

mod parser;
mod settings;

pub use parser::{DocumentFormat, PlanDocumentParser};
pub use settings::{
    DEFAULT_API_BASE_URL, DEFAULT_SETTINGS_FILES, ENV_API_BASE_URL, ENV_TIMEOUT_SECS, ENV_TOKEN,
    Settings, SettingsLoader, apply_env_overrides, find_settings_file, parse_settings,
    resolve_token, user_settings_file,
};
