//! Periodic sync passes over every cluster

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use clustersnap_types::{ClusterIdentity, Snapshot};

use crate::{ClusterSynchronizer, ControlPlane, StatusFilter, SyncError};

/// Scheduling knobs for [`SyncScheduler`]
#[derive(Clone, Debug)]
pub struct SchedulerOptions {
    /// Pause between passes
    pub interval: Duration,
    /// Watchdog for a single cluster's sync attempt
    pub attempt_timeout: Duration,
    /// Which clusters a pass covers
    pub filter: StatusFilter,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            attempt_timeout: Duration::from_secs(120),
            filter: StatusFilter::All,
        }
    }
}

/// Outcome of one pass
#[derive(Debug, Default)]
pub struct PassReport {
    pub started_at: Option<DateTime<Utc>>,
    pub synced: Vec<ClusterIdentity>,
    pub failed: Vec<(ClusterIdentity, String)>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs sync cycles for many clusters, one task per cluster
pub struct SyncScheduler {
    synchronizer: Arc<ClusterSynchronizer>,
    control_plane: Arc<dyn ControlPlane>,
    options: SchedulerOptions,
}

impl SyncScheduler {
    pub fn new(
        synchronizer: Arc<ClusterSynchronizer>,
        control_plane: Arc<dyn ControlPlane>,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            synchronizer,
            control_plane,
            options,
        }
    }

    /// Sync a single cluster under the attempt watchdog
    pub async fn sync_cluster(&self, cluster: &ClusterIdentity) -> Result<Snapshot, SyncError> {
        sync_with_timeout(&self.synchronizer, cluster, self.options.attempt_timeout).await
    }

    /// Sync every listed cluster concurrently
    ///
    /// Failures are collected per cluster and never abort the rest of the pass.
    pub async fn run_pass(&self) -> Result<PassReport, SyncError> {
        let clusters = self.control_plane.list_clusters(self.options.filter).await?;
        let mut report = PassReport {
            started_at: Some(Utc::now()),
            ..Default::default()
        };

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();
        for record in clusters {
            let synchronizer = Arc::clone(&self.synchronizer);
            let timeout = self.options.attempt_timeout;
            let cluster = record.identity.clone();
            let handle = tasks.spawn(async move {
                sync_with_timeout(&synchronizer, &cluster, timeout).await
            });
            pending.insert(handle.id(), record.identity);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, result)) => (id, result.map_err(|e| e.to_string())),
                Err(e) => (e.id(), Err(format!("sync task panicked: {}", e))),
            };
            let Some(cluster) = pending.remove(&id) else {
                error!(task = %id, "finished sync task has no cluster");
                continue;
            };
            match outcome {
                Ok(_) => report.synced.push(cluster),
                Err(reason) => {
                    warn!(cluster = %cluster, error = %reason, "cluster sync failed");
                    report.failed.push((cluster, reason));
                }
            }
        }

        report.synced.sort();
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));
        info!(
            synced = report.synced.len(),
            failed = report.failed.len(),
            "sync pass finished"
        );
        Ok(report)
    }

    /// Run passes every `interval` until cancelled
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if let Err(e) = self.run_pass().await {
                error!(error = %e, "sync pass failed");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.options.interval) => {}
            }
        }
        info!("sync scheduler stopped");
    }
}

async fn sync_with_timeout(
    synchronizer: &ClusterSynchronizer,
    cluster: &ClusterIdentity,
    timeout: Duration,
) -> Result<Snapshot, SyncError> {
    match tokio::time::timeout(timeout, synchronizer.sync(cluster)).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout {
            cluster: cluster.clone(),
            after: timeout,
        }),
    }
}
