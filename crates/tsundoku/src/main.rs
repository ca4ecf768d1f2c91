// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tsundoku - manage manga source hosts and search their sources.
//!
//! This is the binary entry point. Every command opens the registry from
//! configuration, runs once, and exits; `watch` runs until interrupted.

mod hosts;
mod search;
mod shutdown;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tsundoku_config::TsundokuConfig;
use tsundoku_core::{ErrorCategory, HostId, SourceId, TsundokuError};
use tsundoku_http::HttpTransport;
use tsundoku_registry::SourceRegistry;
use tsundoku_storage::Database;

/// Exit code for a command interrupted by SIGINT or SIGTERM.
const EXIT_CANCELLED: u8 = 130;

/// Tsundoku - manage manga source hosts and search their sources.
#[derive(Parser, Debug)]
#[command(name = "tsundoku", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Install a host from its manifest URL.
    Install {
        /// URL of the host manifest.
        url: String,
    },
    /// Remove an installed host together with its sources.
    Remove {
        host_id: i64,
    },
    /// List installed hosts and their sources.
    List {
        /// Print the host list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Pin a source so it sorts first within its host.
    Pin {
        source_id: i64,
        /// Unpin instead.
        #[arg(long)]
        off: bool,
    },
    /// Disable a source so searches against it are refused.
    Disable {
        source_id: i64,
        /// Re-enable instead.
        #[arg(long)]
        off: bool,
    },
    /// Show a source's search capabilities and presets.
    Show {
        source_id: i64,
    },
    /// Search a source.
    Search(search::SearchArgs),
    /// Run a stored search preset.
    Preset(search::PresetArgs),
    /// Print the host list now and after every change until interrupted.
    Watch,
    /// Finalize interrupted installs and sweep abandoned staging directories.
    Reconcile,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tsundoku_config::load_and_validate_path(path),
        None => tsundoku_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tsundoku_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log.level);

    let cancel = shutdown::install_signal_handler();
    let reconcile_on_startup =
        config.registry.reconcile_on_startup && !matches!(cli.command, Commands::Reconcile);

    let registry = match open_registry(&config, reconcile_on_startup).await {
        Ok(registry) => registry,
        Err(e) => return report(&e),
    };

    let result = run(cli.command, &registry, &cancel).await;

    if let Err(e) = registry.database().close().await {
        warn!(error = %e, "database did not close cleanly");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e),
    }
}

async fn run(
    command: Commands,
    registry: &SourceRegistry,
    cancel: &CancellationToken,
) -> Result<(), TsundokuError> {
    match command {
        Commands::Install { url } => hosts::install(registry, &url, cancel).await,
        Commands::Remove { host_id } => hosts::remove(registry, HostId(host_id)).await,
        Commands::List { json } => hosts::list(registry, json).await,
        Commands::Pin { source_id, off } => {
            hosts::set_pinned(registry, SourceId(source_id), !off).await
        }
        Commands::Disable { source_id, off } => {
            hosts::set_disabled(registry, SourceId(source_id), !off).await
        }
        Commands::Show { source_id } => search::show(registry, SourceId(source_id)).await,
        Commands::Search(args) => search::search(registry, args, cancel).await,
        Commands::Preset(args) => search::run_preset(registry, args, cancel).await,
        Commands::Watch => hosts::watch(registry, cancel).await,
        Commands::Reconcile => hosts::reconcile(registry).await,
    }
}

/// Open the database, build the HTTP transport, and assemble the registry.
async fn open_registry(
    config: &TsundokuConfig,
    reconcile_on_startup: bool,
) -> Result<SourceRegistry, TsundokuError> {
    let db = Database::open(&config.storage).await?;
    let transport = Arc::new(HttpTransport::from_config(&config.network)?);
    let registry = SourceRegistry::from_config(config, db, transport);

    if reconcile_on_startup {
        let report = registry.reconcile().await?;
        if !report.is_empty() {
            info!(
                finalized = report.finalized.len(),
                removed_staging = report.removed_staging.len(),
                "startup reconcile repaired assets"
            );
        }
    }
    Ok(registry)
}

/// Print an error for the user and pick the exit code.
fn report(e: &TsundokuError) -> ExitCode {
    if e.is_cancelled() {
        eprintln!("{}: {}", "cancelled".yellow(), e.user_message());
        return ExitCode::from(EXIT_CANCELLED);
    }
    if e.category() == ErrorCategory::System {
        error!(error = %e, category = "system", "command failed");
    }
    eprintln!("{}: {}", "error".red().bold(), e.user_message());
    ExitCode::FAILURE
}

/// Initialize tracing to stderr, honoring `RUST_LOG` over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tsundoku={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
