use std::time::Duration;

use thiserror::Error;

use clustersnap_cache::CacheError;
use clustersnap_k8s::ClusterApiError;
use clustersnap_types::ClusterIdentity;

use crate::ControlPlaneError;

/// Reasons a cluster's sync cycle fails
///
/// Every variant is fatal for the current cycle of one cluster only.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Token invalid or rejected, or the credential record could not be probed
    #[error("authorization failed for cluster '{cluster}': {reason}")]
    Authorization {
        cluster: ClusterIdentity,
        reason: String,
    },

    /// Non-authentication failure from the cluster API
    #[error("cluster '{cluster}': {source}")]
    ClusterApi {
        cluster: ClusterIdentity,
        #[source]
        source: ClusterApiError,
    },

    #[error("init client failed for cluster '{cluster}', retry_count={retry_count}")]
    RetryBudgetExceeded {
        cluster: ClusterIdentity,
        retry_count: u32,
    },

    #[error("cache error for cluster '{cluster}': {source}")]
    Cache {
        cluster: ClusterIdentity,
        #[source]
        source: CacheError,
    },

    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),

    #[error("sync of cluster '{cluster}' timed out after {after:?}")]
    Timeout {
        cluster: ClusterIdentity,
        after: Duration,
    },
}

impl SyncError {
    pub(crate) fn cluster_api(cluster: &ClusterIdentity, source: ClusterApiError) -> Self {
        Self::ClusterApi {
            cluster: cluster.clone(),
            source,
        }
    }

    pub(crate) fn cache(cluster: &ClusterIdentity, source: CacheError) -> Self {
        Self::Cache {
            cluster: cluster.clone(),
            source,
        }
    }

    /// Whether a cached record failed to decode
    pub fn is_cache_decode(&self) -> bool {
        matches!(
            self,
            Self::Cache {
                source: CacheError::Decode { .. },
                ..
            }
        )
    }
}
