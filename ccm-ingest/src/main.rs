//! ccm-ingest - custom-content archive importer
//!
//! Scans a ZIP of creator/collection-organized `.package` files, reconciles
//! the discovered creators against a registry export, and prints JSON for
//! the review and persistence steps:
//! - `scan`: items + distinct creator names
//! - `propose`: items + creator match verdicts
//! - `plan`: rows to upsert after applying confirmed decisions

use anyhow::{Context, Result};
use ccm_common::events::{EventBus, IngestEvent};
use ccm_ingest::{
    build_proposal, ArchiveWalker, ConfirmedMapping, ImportPlan, IngestOverrides, IngestSettings,
    JsonRegistryFile, RegistrySource, StaticRegistry,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for ccm-ingest
#[derive(Parser, Debug)]
#[command(name = "ccm-ingest")]
#[command(about = "Scan custom-content archives and reconcile creators")]
#[command(version)]
struct Args {
    /// TOML config file (default: $CCM_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fuzzy match threshold (exclusive), overrides config
    #[arg(long, global = true)]
    threshold: Option<f64>,

    /// Decompress every content entry to detect corrupt payloads
    #[arg(long, global = true)]
    verify_payloads: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List content items found in an archive
    Scan {
        archive: PathBuf,
    },
    /// Scan and reconcile creators against a registry export
    Propose {
        archive: PathBuf,
        /// JSON array of {"id", "name"} known creators
        #[arg(long)]
        registry: PathBuf,
    },
    /// Build the import plan from confirmed decisions
    Plan {
        archive: PathBuf,
        #[arg(long)]
        registry: PathBuf,
        /// JSON object found_name -> decision (default: accept suggestions)
        #[arg(long)]
        decisions: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = ccm_common::config::resolve_config_path(args.config.as_deref());
    let loaded = ccm_common::config::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing (stderr; stdout carries JSON output)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| loaded.config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting ccm-ingest {}", env!("CARGO_PKG_VERSION"));
    loaded.log_origin();

    let overrides = IngestOverrides {
        fuzzy_threshold: args.threshold,
        verify_payloads: args.verify_payloads.then_some(true),
    };
    let settings = IngestSettings::resolve(&loaded.config.ingest, &overrides)
        .context("Invalid ingest settings")?;

    let event_bus = EventBus::new(100);
    let logger = tokio::spawn(log_events(event_bus.subscribe()));

    // `run` owns the last sender; the logger drains and exits once it is dropped
    let result = run(args.command, settings, event_bus).await;
    if let Err(e) = logger.await {
        debug!(error = %e, "Event logger stopped abnormally");
    }
    result
}

async fn run(command: Command, settings: IngestSettings, event_bus: EventBus) -> Result<()> {
    match command {
        Command::Scan { archive } => {
            let outcome = ArchiveWalker::with_settings(settings)
                .with_event_bus(event_bus)
                .scan(&archive)
                .await
                .with_context(|| format!("Failed to scan {}", archive.display()))?;

            if outcome.is_empty() {
                warn!("No content files found in {}", archive.display());
            }
            print_json(&outcome)
        }
        Command::Propose { archive, registry } => {
            let source = JsonRegistryFile::new(registry);
            let proposal = build_proposal(&archive, &source, &settings, Some(event_bus))
                .await
                .with_context(|| format!("Failed to build proposal for {}", archive.display()))?;

            if proposal.is_empty() {
                warn!("No content files found in {}", archive.display());
            }
            print_json(&proposal)
        }
        Command::Plan {
            archive,
            registry,
            decisions,
        } => {
            let snapshot = JsonRegistryFile::new(registry).load_snapshot().await?;
            let source = StaticRegistry::new(snapshot.clone());
            let proposal = build_proposal(&archive, &source, &settings, Some(event_bus))
                .await
                .with_context(|| format!("Failed to build proposal for {}", archive.display()))?;

            let mapping = match decisions {
                Some(path) => load_decisions(&path).await?,
                None => ConfirmedMapping::suggested(&proposal),
            };

            let plan = ImportPlan::build(&proposal, &mapping, &snapshot)
                .context("Decisions do not fit the archive")?;
            print_json(&plan)
        }
    }
}

async fn load_decisions(path: &Path) -> Result<ConfirmedMapping> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read decisions {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse decisions {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    std::io::Write::write_all(&mut out, b"\n")?;
    Ok(())
}

/// Mirror scan events into the log
async fn log_events(mut rx: tokio::sync::broadcast::Receiver<IngestEvent>) {
    loop {
        match rx.recv().await {
            Ok(IngestEvent::ScanProgress {
                entries_seen,
                items_found,
                ..
            }) => info!(entries_seen, items_found, "Scanning"),
            Ok(event) => debug!(?event, "Ingest event"),
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event log lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}
