//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// plansync - Push edited workout plans to the plan store.
#[derive(Parser, Debug)]
#[command(name = "plansync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "PLANSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bearer token for the plan store (defaults to `PLANSYNC_TOKEN`).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Log format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a plan document without contacting the store.
    Validate {
        /// Plan document (YAML or JSON).
        file: PathBuf,
    },

    /// Show what pushing a plan document would change.
    Diff {
        /// Plan document (YAML or JSON).
        file: PathBuf,
    },

    /// Push a plan document to the store.
    Push {
        /// Plan document (YAML or JSON).
        file: PathBuf,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Write the synced plan, with assigned ids, back to the document.
        #[arg(long)]
        write_back: bool,
    },

    /// Fetch a plan from the store as a plan document.
    Pull {
        /// Plan id.
        plan_id: i64,

        /// Output file (prints to stdout if omitted).
        #[arg(short = 'O', long)]
        out: Option<PathBuf>,
    },

    /// Show recent pushes.
    History {
        /// Number of entries to show.
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_push_with_global_flags() {
        let cli = Cli::try_parse_from([
            "plansync",
            "push",
            "plan.yaml",
            "--yes",
            "--write-back",
            "--token",
            "abc",
            "--output",
            "json",
        ])
        .expect("parse");

        assert_eq!(cli.token.as_deref(), Some("abc"));
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Push {
                file,
                yes,
                write_back,
            } => {
                assert_eq!(file, PathBuf::from("plan.yaml"));
                assert!(yes);
                assert!(write_back);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_pull_and_history() {
        let cli = Cli::try_parse_from(["plansync", "pull", "42", "--out", "plan.json"])
            .expect("parse");
        assert!(matches!(cli.command, Commands::Pull { plan_id: 42, out: Some(_) }));

        let cli = Cli::try_parse_from(["plansync", "--log-format", "json", "history"])
            .expect("parse");
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::History { limit: 10 }));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
