use std::sync::Arc;

use tracing::{debug, warn};

use clustersnap_cache::{CacheStore, SnapshotStore};
use clustersnap_types::{ClusterIdentity, Snapshot};

use crate::{ControlPlane, StatusFilter, SyncError};

/// Read side of the snapshot cache
pub struct SnapshotReader {
    control_plane: Arc<dyn ControlPlane>,
    snapshots: SnapshotStore,
}

impl SnapshotReader {
    pub fn new(control_plane: Arc<dyn ControlPlane>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            control_plane,
            snapshots: SnapshotStore::new(cache),
        }
    }

    /// Cached snapshots of every cluster that is not ready yet
    ///
    /// Best effort: clusters without a snapshot, or whose entry cannot be
    /// read, are skipped.
    pub async fn list_pending_cluster_snapshots(&self) -> Result<Vec<Snapshot>, SyncError> {
        let clusters = self.control_plane.list_clusters(StatusFilter::NotReady).await?;

        let mut snapshots = Vec::with_capacity(clusters.len());
        for record in clusters.into_iter().filter(|c| !c.status.is_ready()) {
            match self.snapshots.get(&record.identity).await {
                Ok(Some(snapshot)) => snapshots.push(snapshot),
                Ok(None) => debug!(cluster = %record.identity, "no snapshot cached yet"),
                Err(e) => {
                    warn!(cluster = %record.identity, error = %e, "skipping unreadable snapshot")
                }
            }
        }
        Ok(snapshots)
    }

    /// Cached snapshot of a single cluster
    pub async fn get(&self, cluster: &ClusterIdentity) -> Result<Option<Snapshot>, SyncError> {
        self.snapshots
            .get(cluster)
            .await
            .map_err(|e| SyncError::cache(cluster, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeControlPlane;
    use clustersnap_cache::MemoryCache;
    use clustersnap_types::ClusterStatus;

    async fn cache_snapshot(cache: &Arc<MemoryCache>, cluster: &str) {
        let snapshot = Snapshot::new(
            ClusterIdentity::new(cluster),
            "tok".to_string(),
            vec![],
            vec![],
            vec![],
        );
        SnapshotStore::new(cache.clone()).put(&snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_excludes_ready_and_skips_missing() {
        let cp = Arc::new(
            FakeControlPlane::new(&[])
                .with_cluster("installing", ClusterStatus::Installing)
                .with_cluster("ready", ClusterStatus::Ready)
                .with_cluster("never-synced", ClusterStatus::Waiting),
        );
        let cache = Arc::new(MemoryCache::new());
        cache_snapshot(&cache, "installing").await;
        cache_snapshot(&cache, "ready").await;

        let reader = SnapshotReader::new(cp, cache);
        let pending = reader.list_pending_cluster_snapshots().await.unwrap();

        let names: Vec<&str> = pending.iter().map(|s| s.cluster.as_str()).collect();
        assert_eq!(names, vec!["installing"]);
    }

    #[tokio::test]
    async fn test_pending_skips_undecodable_entries() {
        let cp = Arc::new(
            FakeControlPlane::new(&[])
                .with_cluster("broken", ClusterStatus::Running)
                .with_cluster("ok", ClusterStatus::Running),
        );
        let cache = Arc::new(MemoryCache::new());
        cache.set("snapshot:broken", b"{oops".to_vec()).await.unwrap();
        cache_snapshot(&cache, "ok").await;

        let reader = SnapshotReader::new(cp, cache);
        let pending = reader.list_pending_cluster_snapshots().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].cluster.as_str(), "ok");

        let err = reader.get(&ClusterIdentity::new("broken")).await.unwrap_err();
        assert!(err.is_cache_decode());
    }
}
