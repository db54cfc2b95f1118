//! CLI module for the plansync tool.
//!
//! This module provides the command-line interface for validating, diffing
//! and pushing plan documents.

mod commands;
mod output;

pub use commands::{Cli, Commands, LogFormat, OutputFormat};
pub use output::OutputFormatter;
