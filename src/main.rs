use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use version_ledger::catalog::Catalog;
use version_ledger::config::SyncConfig;
use version_ledger::logging::init_logging;
use version_ledger::sync::{Synchronizer, TracingLogger, run};
use version_ledger::version::registries::NpmRegistry;
use version_ledger::version::store::{LedgerStore, changed_packages};

#[derive(Parser)]
#[command(name = "version-ledger")]
#[command(version, about = "Keeps package versions in sync with the npm registry")]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare the catalog with the registry and write the new ledger and change list
    Sync {
        /// Catalog of active and retired packages
        #[arg(long)]
        catalog: PathBuf,

        /// Bump every active package regardless of its content hash
        #[arg(long)]
        force_update: bool,
    },

    /// List the packages named in the last change list
    Changed {
        /// Catalog used to resolve package names
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Print the ledger record of a package
    Show {
        /// Package name
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(&cli.log_level, cli.log_file.as_deref())
        .context("Failed to initialize logging")?;

    let config =
        SyncConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Sync {
            catalog,
            force_update,
        } => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(run_sync(&config, &catalog, force_update)),
        Command::Changed { catalog } => run_changed(&config, &catalog),
        Command::Show { name } => run_show(&config, &name),
    }
}

async fn run_sync(
    config: &SyncConfig,
    catalog_path: &Path,
    force_update: bool,
) -> anyhow::Result<()> {
    let catalog = Catalog::load(catalog_path).context("Failed to load catalog")?;
    let store = LedgerStore::from_config(config);

    let fetcher = NpmRegistry::from_config(config).context("Failed to create registry client")?;
    let synchronizer = Synchronizer::from_config(Arc::new(fetcher), config);

    let outcome = run(&store, &synchronizer, &catalog, &TracingLogger, force_update)
        .await
        .context("Synchronization aborted; ledger and change list left untouched")?;
    info!(
        "Wrote {} ledger records and {} changes",
        outcome.ledger.len(),
        outcome.changes.len()
    );

    Ok(())
}

fn run_changed(config: &SyncConfig, catalog_path: &Path) -> anyhow::Result<()> {
    let catalog = Catalog::load(catalog_path).context("Failed to load catalog")?;
    let store = LedgerStore::from_config(config);

    for entry in changed_packages(&store, &catalog)? {
        println!("{}", entry.name());
    }

    Ok(())
}

fn run_show(config: &SyncConfig, name: &str) -> anyhow::Result<()> {
    let ledger = LedgerStore::from_config(config)
        .load()
        .context("Failed to load ledger")?;
    let record = ledger.version_info(name)?;

    println!("{}", serde_json::to_string_pretty(record)?);

    Ok(())
}
