use async_trait::async_trait;

use clustersnap_types::{ClusterIdentity, NamespaceInfo, NodeInfo, PodInfo};

use crate::ClusterApiError;

/// Authenticated, read-only handle to one cluster's API
#[async_trait]
pub trait ClusterApi: Send + Sync {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, ClusterApiError>;

    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, ClusterApiError>;

    /// Pods across all namespaces
    async fn list_pods(&self) -> Result<Vec<PodInfo>, ClusterApiError>;

    /// Cheapest authenticated call available, used to validate a token
    async fn probe(&self) -> Result<(), ClusterApiError> {
        self.list_nodes().await.map(|_| ())
    }
}

/// Builds a [`ClusterApi`] for a cluster's master host and bearer token
pub trait ClientFactory: Send + Sync {
    fn build(
        &self,
        cluster: &ClusterIdentity,
        master_host: &str,
        token: &str,
    ) -> Result<Box<dyn ClusterApi>, ClusterApiError>;
}
