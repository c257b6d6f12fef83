//! Directus Sweeper - Main entry point
//!
//! Finds orphaned Directus file records and, with `--execute`, deletes them.

use anyhow::Result;
use clap::Parser;
use directus_sweeper::{
    config::Config,
    confirm::ConfirmationWindow,
    directus::{DirectusClient, FileStore},
    reconcile::{BatchReconciler, ConsoleObserver},
    report::{self, RunReport},
    sweep::{RunMode, SweepOutcome, Sweeper, TargetSelection},
    utils,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Perform deletions; without it the run is a dry run
    #[arg(long)]
    execute: bool,

    /// Comma-separated file ids to delete, skipping existence checks
    #[arg(long, value_name = "LIST", conflicts_with = "filenames")]
    ids: Option<String>,

    /// Comma-separated storage file names to delete, skipping existence checks
    #[arg(long, value_name = "LIST")]
    filenames: Option<String>,

    /// Write a JSON report of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    // Usage errors come before any configuration or network activity
    let selection = TargetSelection::from_flags(args.ids.as_deref(), args.filenames.as_deref())?;
    let mode = RunMode::from_execute_flag(args.execute);

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.log.level);
    utils::logger::init(log_level)?;

    tracing::info!(
        "Starting directus-sweeper v{} against {} ({})",
        env!("CARGO_PKG_VERSION"),
        config.directus.url,
        match mode {
            RunMode::DryRun => "dry run",
            RunMode::Execute => "EXECUTE",
        }
    );

    let store: Arc<dyn FileStore> = Arc::new(DirectusClient::new(&config.directus)?);
    let observer = Arc::new(ConsoleObserver);
    let sweeper = Sweeper::new(
        store,
        BatchReconciler::new(config.reconcile.check_options())?.with_observer(observer.clone()),
        BatchReconciler::new(config.reconcile.delete_options())?.with_observer(observer),
        config.reconcile.on_check_error,
    );

    let targets = sweeper.collect_targets(&selection).await?;
    print!(
        "{}",
        report::render_targets(&targets, config.sweep.plan_listing_cap)
    );

    let gate = ConfirmationWindow::new(config.sweep.confirm_delay());
    let outcome = sweeper.apply(&targets, mode, &gate).await;

    match &outcome {
        SweepOutcome::NothingToDo => {}
        SweepOutcome::DryRun { planned } => {
            println!(
                "Dry run: {} record(s) would be deleted. Re-run with --execute to delete.",
                planned
            );
        }
        SweepOutcome::Aborted => println!("Aborted, nothing was deleted."),
        SweepOutcome::Deleted(summary) => {
            print!(
                "{}",
                report::render_summary(summary, config.sweep.failure_listing_cap)
            );
            if summary.failed > 0 {
                println!("Failed ids: {}", summary.failed_ids().join(","));
            }
        }
    }

    if let Some(path) = &args.report {
        RunReport::new(mode, &targets, &outcome).write_to(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}
