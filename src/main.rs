use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use clustersnap_cache::{CacheStore, FileCache};
use clustersnap_k8s::KubeClientFactory;
use clustersnap_sync::{
    ClusterIdentity, ClusterSynchronizer, ControlPlane, SnapshotReader, SyncScheduler,
};

mod config;
mod control_plane;

use config::Config;
use control_plane::StaticControlPlane;

/// Clustersnap - cache snapshots of cluster nodes, namespaces and pods
#[derive(Parser, Debug)]
#[command(name = "clustersnap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(long, short, default_value = "clustersnap.toml")]
    config: PathBuf,

    /// Default log level (RUST_LOG directives still apply)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snapshot clusters into the cache
    Sync {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,

        /// Only sync this cluster (implies --once)
        #[arg(long, value_name = "CLUSTER")]
        cluster: Option<String>,
    },

    /// Print cached snapshots of every cluster that is not ready yet
    Pending,

    /// Print the cached snapshot of one cluster
    Show {
        #[arg(value_name = "CLUSTER")]
        cluster: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(args.log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    let cache_dir = match &config.cache.dir {
        Some(dir) => dir.clone(),
        None => FileCache::default_dir()
            .context("No cache.dir configured and no home directory to default to")?,
    };
    info!(dir = %cache_dir.display(), "using cache directory");
    let cache: Arc<dyn CacheStore> = Arc::new(FileCache::new(cache_dir));

    let control_plane: Arc<dyn ControlPlane> =
        Arc::new(StaticControlPlane::new(config.clusters.clone()));

    match args.command {
        Command::Sync { once, cluster } => {
            let factory = Arc::new(KubeClientFactory::new(config.client_options()));
            let synchronizer = Arc::new(ClusterSynchronizer::new(
                Arc::clone(&control_plane),
                factory,
                Arc::clone(&cache),
            ));
            let scheduler = SyncScheduler::new(
                synchronizer,
                Arc::clone(&control_plane),
                config.scheduler_options(),
            );

            if let Some(name) = cluster {
                let snapshot = scheduler
                    .sync_cluster(&ClusterIdentity::new(name.as_str()))
                    .await
                    .with_context(|| format!("Failed to sync cluster '{}'", name))?;
                println!("{}: {}", snapshot.cluster, snapshot.summary());
            } else if once {
                let report = scheduler.run_pass().await?;
                for cluster in &report.synced {
                    println!("{}: synced", cluster);
                }
                for (cluster, reason) in &report.failed {
                    println!("{}: failed: {}", cluster, reason);
                }
                if !report.is_clean() {
                    anyhow::bail!("{} cluster(s) failed to sync", report.failed.len());
                }
            } else {
                let cancel = CancellationToken::new();
                let shutdown = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        info!("shutdown requested");
                        shutdown.cancel();
                    }
                });
                scheduler.run(cancel).await;
            }
        }

        Command::Pending => {
            let reader = SnapshotReader::new(control_plane, cache);
            let snapshots = reader.list_pending_cluster_snapshots().await?;
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
        }

        Command::Show { cluster } => {
            let reader = SnapshotReader::new(control_plane, cache);
            let snapshot = reader
                .get(&ClusterIdentity::new(cluster.as_str()))
                .await?
                .with_context(|| format!("No snapshot cached for cluster '{}'", cluster))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
