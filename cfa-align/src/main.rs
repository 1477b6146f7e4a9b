//! cfa-align - Structural Alignment Scheduler
//!
//! Resolves which clusters still need pairwise structural comparisons,
//! enqueues one task per cluster, and drives each task through the
//! align → merge → store pipeline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cfa_align::db::SqliteStore;
use cfa_align::enqueue::enqueue_pending;
use cfa_align::pending::pending_clusters;
use cfa_align::queue::{self, TaskConsumer};
use cfa_align::{AlignConfig, AlignerRegistry, AlignmentPipeline};

#[derive(Parser)]
#[command(name = "cfa-align", version, about = "Structural alignment scheduler")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "CFA_CONFIG")]
    config: Option<PathBuf>,

    /// Data folder holding the catalog database
    #[arg(long, env = "CFA_DATA_DIR")]
    data_dir: Option<String>,

    /// Database path override
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print clusters that still have pending pairwise work
    Pending,
    /// One full pass: resolve, enqueue, and process every pending cluster
    Run,
    /// Create the catalog tables and exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("Starting cfa-align (structural alignment scheduler)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_folder =
        cfa_common::config::resolve_data_folder(cli.data_dir.as_deref(), "CFA_DATA_DIR")?;
    cfa_common::config::ensure_data_folder(&data_folder)?;

    let config = AlignConfig::load(cli.config.as_deref())?;

    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.database_path(&data_folder));
    info!("Database: {}", db_path.display());

    let pool = cfa_align::db::init_database_pool(&db_path).await?;
    let store = SqliteStore::new(pool);

    match cli.command {
        Command::InitDb => {
            info!("Database initialized");
        }
        Command::Pending => {
            let cluster_ids = pending_clusters(&store).await?;
            if cluster_ids.is_empty() {
                info!("No clusters with pending alignments");
            } else {
                for cluster_id in cluster_ids {
                    println!("{}", cluster_id);
                }
            }
        }
        Command::Run => {
            run_once(&store, &config).await?;
        }
    }

    Ok(())
}

/// One full resolve → enqueue → process pass over the catalog
async fn run_once(store: &SqliteStore, config: &AlignConfig) -> Result<()> {
    let registry = AlignerRegistry::from_config(config)?;
    let pipeline = AlignmentPipeline::new(registry);

    let (publisher, mut consumer) = queue::channel();
    let enqueued = enqueue_pending(store, &publisher).await?;
    drop(publisher);

    let mut processed = 0usize;
    let mut failed = 0usize;
    let mut inserted = 0usize;

    while let Some(task) = consumer.next_task().await {
        match pipeline.run_task(store, &task).await {
            Ok(outcome) => {
                processed += 1;
                inserted += outcome.inserted;
            }
            Err(e) => {
                failed += 1;
                error!("Error processing cluster {}: {:?}", task.cluster_id, e);
            }
        }
    }

    info!(
        "Run complete: {} of {} clusters processed, {} failed, {} new results",
        processed, enqueued, failed, inserted
    );

    Ok(())
}
