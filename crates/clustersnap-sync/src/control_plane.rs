use async_trait::async_trait;
use thiserror::Error;

use clustersnap_types::{ClusterIdentity, ClusterRecord, Credential};

/// Errors reported by the cluster-management control plane
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("cluster not found: {0}")]
    ClusterNotFound(ClusterIdentity),

    #[error("cluster '{0}' has no master host")]
    NoMasterHost(ClusterIdentity),

    #[error("failed to issue token for cluster '{cluster}': {reason}")]
    TokenIssue {
        cluster: ClusterIdentity,
        reason: String,
    },

    #[error("control plane unavailable: {0}")]
    Unavailable(String),
}

/// Which clusters `list_clusters` returns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    /// Every cluster whose status is not ready
    NotReady,
}

impl StatusFilter {
    pub fn matches(&self, record: &ClusterRecord) -> bool {
        match self {
            Self::All => true,
            Self::NotReady => !record.status.is_ready(),
        }
    }
}

/// The cluster-management control plane that owns cluster records
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Issue (or rotate) a bearer credential for a cluster
    async fn issue_token(
        &self,
        cluster: &ClusterIdentity,
    ) -> Result<Credential, ControlPlaneError>;

    /// Address of the first host in the cluster's master group
    async fn resolve_master_host(
        &self,
        cluster: &ClusterIdentity,
    ) -> Result<String, ControlPlaneError>;

    async fn list_clusters(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<ClusterRecord>, ControlPlaneError>;
}
