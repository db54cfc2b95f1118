//! plansync CLI entrypoint.
//!
//! This is the main entrypoint for the plansync command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use plansync::cli::{Cli, Commands, LogFormat, OutputFormat, OutputFormatter};
use plansync::config::{DocumentFormat, PlanDocumentParser, SettingsLoader, resolve_token};
use plansync::error::Result;
use plansync::model::{PlanId, PlanSnapshot, PlanValidator};
use plansync::reconciler::PlanReconciler;
use plansync::remote::{BearerToken, HttpPlanStore, SnapshotLoader};
use plansync::state::{HistoryEntry, SyncHistory};

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let formatter = OutputFormatter::new(cli.output);
    match runtime.block_on(run(cli, &formatter)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", formatter.error(&e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
///
/// `RUST_LOG` is honoured unless `--verbose` asks for debug output.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Connection to the plan store for one command.
struct Session {
    store: HttpPlanStore,
    token: BearerToken,
}

/// Main async entry point.
async fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let config = cli.config.as_deref();
    let token = cli.token;

    match cli.command {
        Commands::Validate { file } => cmd_validate(&file, formatter),
        Commands::Diff { file } => cmd_diff(config, token, &file, formatter).await,
        Commands::Push {
            file,
            yes,
            write_back,
        } => {
            let session = connect(config, token)?;
            cmd_push(&session, &file, yes, write_back, formatter).await
        }
        Commands::Pull { plan_id, out } => {
            let session = connect(config, token)?;
            cmd_pull(&session, PlanId(plan_id), out.as_deref(), formatter).await
        }
        Commands::History { limit } => cmd_history(limit, formatter).await,
    }
}

/// Validate a plan document offline.
fn cmd_validate(file: &Path, formatter: &OutputFormatter) -> Result<()> {
    info!("Validating plan document: {}", file.display());

    let plan = PlanDocumentParser::new().load_file(file)?;
    let report = PlanValidator::new().validate_document(&plan)?;

    emit(formatter, &formatter.format_validation(&plan, &report))
}

/// Show the change-set a push would apply.
///
/// A token is only needed to fetch the remote snapshot of a persisted plan.
async fn cmd_diff(
    config: Option<&Path>,
    token: Option<String>,
    file: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let current = PlanDocumentParser::new().load_file(file)?;
    let store = open_store(config)?;

    let original = match current.identity.id() {
        Some(plan_id) => {
            let token = resolve_token(token, |name| std::env::var(name).ok())?;
            Some(SnapshotLoader::new(&store).load(&token, plan_id).await?)
        }
        None => {
            debug!("Plan has no identity; every day will be created");
            None
        }
    };

    let preview = PlanReconciler::new(&store).preview(original.as_ref(), &current)?;
    emit(formatter, &formatter.format_preview(&preview))
}

/// Push a plan document to the store.
async fn cmd_push(
    session: &Session,
    file: &Path,
    yes: bool,
    write_back: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let parser = PlanDocumentParser::new();
    let current = parser.load_file(file)?;
    let original = load_original(session, &current).await?;

    let reconciler = PlanReconciler::new(&session.store);
    let preview = reconciler.preview(original.as_ref(), &current)?;

    if !preview.creates_plan && !preview.changes.has_changes() {
        eprintln!("{}", formatter.success("No changes to push."));
        return Ok(());
    }

    if formatter.format() == OutputFormat::Text {
        eprintln!("{}", formatter.format_preview(&preview));
    }

    if !yes && !confirm("Do you want to push these changes?")? {
        eprintln!("Push cancelled.");
        return Ok(());
    }

    let history = SyncHistory::new()?;
    let started_at = Utc::now();

    match reconciler
        .reconcile(&session.token, original.as_ref(), &current)
        .await
    {
        Ok(report) => {
            record(&history, HistoryEntry::succeeded(&report)).await;

            if write_back {
                parser.save_file(file, &report.synced)?;
                info!("Assigned ids written back to {}", file.display());
            }

            emit(formatter, &formatter.format_report(&report))
        }
        Err(e) => {
            record(&history, HistoryEntry::failed(&current, started_at, &e)).await;
            Err(e)
        }
    }
}

/// Fetch a plan from the store as a plan document.
async fn cmd_pull(
    session: &Session,
    plan_id: PlanId,
    out: Option<&Path>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let plan = SnapshotLoader::new(&session.store)
        .load(&session.token, plan_id)
        .await?;

    let parser = PlanDocumentParser::new();
    match out {
        Some(path) => {
            parser.save_file(path, &plan)?;
            eprintln!(
                "{}",
                formatter.success(&format!("Plan {plan_id} written to {}", path.display()))
            );
            Ok(())
        }
        None => {
            let format = match formatter.format() {
                OutputFormat::Json => DocumentFormat::Json,
                OutputFormat::Text => DocumentFormat::Yaml,
            };
            write_stdout(&parser.render(&plan, format)?)
        }
    }
}

/// Show recent pushes.
async fn cmd_history(limit: usize, formatter: &OutputFormatter) -> Result<()> {
    let entries = SyncHistory::new()?.recent(limit).await?;
    emit(formatter, &formatter.format_history(&entries))
}

/// Loads settings and the bearer token, and builds the store client.
fn connect(config: Option<&Path>, token: Option<String>) -> Result<Session> {
    let store = open_store(config)?;
    let token = resolve_token(token, |name| std::env::var(name).ok())?;
    Ok(Session { store, token })
}

/// Loads settings and builds the store client.
fn open_store(config: Option<&Path>) -> Result<HttpPlanStore> {
    let settings = SettingsLoader::new().load(config)?;
    let store = HttpPlanStore::with_timeout(&settings.api_base_url, settings.timeout_secs)?;

    debug!("Using plan store at {}", store.base_url());
    Ok(store)
}

/// Fetches the last-known remote snapshot of a persisted plan.
async fn load_original(session: &Session, current: &PlanSnapshot) -> Result<Option<PlanSnapshot>> {
    match current.identity.id() {
        Some(plan_id) => {
            let original = SnapshotLoader::new(&session.store)
                .load(&session.token, plan_id)
                .await?;
            Ok(Some(original))
        }
        None => Ok(None),
    }
}

/// Appends to the history; a history failure never fails the push.
async fn record(history: &SyncHistory, entry: HistoryEntry) {
    if let Err(e) = history.append(entry).await {
        warn!("Could not record push in {}: {e}", history.path().display());
    }
}

/// Asks for confirmation on stderr.
fn confirm(question: &str) -> Result<bool> {
    eprint!("\n{question} [y/N]: ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Text goes to stderr, JSON to stdout for scripting.
fn emit(formatter: &OutputFormatter, output: &str) -> Result<()> {
    match formatter.format() {
        OutputFormat::Json => write_stdout(output),
        OutputFormat::Text => {
            eprintln!("{output}");
            Ok(())
        }
    }
}

fn write_stdout(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
