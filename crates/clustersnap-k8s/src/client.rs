//! kube-backed cluster client

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Node, Pod};
use kube::Api;
use kube::api::ListParams;
use kube::config::AuthInfo;
use tracing::{debug, warn};

use clustersnap_types::{ClusterIdentity, NamespaceInfo, NodeInfo, PodInfo};

use crate::mapping::{namespace_to_info, node_to_info, pod_to_info};
use crate::{ClientFactory, ClusterApi, ClusterApiError};

/// Port the cluster API listens on at the master host
pub const DEFAULT_API_PORT: u16 = 6443;

/// Connection options shared by every client a factory builds
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub api_port: u16,

    /// Skip TLS certificate verification. Off unless explicitly enabled.
    pub insecure_skip_tls_verify: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_port: DEFAULT_API_PORT,
            insecure_skip_tls_verify: false,
        }
    }
}

/// Builds [`KubeClusterClient`]s
#[derive(Clone, Debug, Default)]
pub struct KubeClientFactory {
    options: ClientOptions,
}

impl KubeClientFactory {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    /// Create a kube::Client for a master host authenticating with a bearer token
    pub fn kube_client(
        &self,
        master_host: &str,
        token: &str,
    ) -> Result<kube::Client, ClusterApiError> {
        let url = format!("https://{}:{}", master_host, self.options.api_port);
        let uri: http::Uri = url.parse().map_err(|e| {
            ClusterApiError::transport(format!("invalid cluster endpoint '{}': {}", url, e))
        })?;

        let mut config = kube::Config::new(uri);
        config.auth_info = AuthInfo {
            token: Some(token.to_string().into()),
            ..Default::default()
        };
        config.accept_invalid_certs = self.options.insecure_skip_tls_verify;

        kube::Client::try_from(config).map_err(|e| {
            ClusterApiError::transport(format!("failed to create client for {}: {}", url, e))
        })
    }
}

impl ClientFactory for KubeClientFactory {
    fn build(
        &self,
        cluster: &ClusterIdentity,
        master_host: &str,
        token: &str,
    ) -> Result<Box<dyn ClusterApi>, ClusterApiError> {
        if self.options.insecure_skip_tls_verify {
            warn!(cluster = %cluster, "TLS certificate verification is disabled");
        }
        debug!(cluster = %cluster, master = master_host, "building cluster client");

        let client = self.kube_client(master_host, token)?;
        Ok(Box::new(KubeClusterClient::new(cluster.clone(), client)))
    }
}

/// Authenticated handle to one cluster's core API
#[derive(Clone)]
pub struct KubeClusterClient {
    cluster: ClusterIdentity,
    client: kube::Client,
}

impl KubeClusterClient {
    pub fn new(cluster: ClusterIdentity, client: kube::Client) -> Self {
        Self { cluster, client }
    }
}

#[async_trait]
impl ClusterApi for KubeClusterClient {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, ClusterApiError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().map(node_to_info).collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, ClusterApiError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().map(namespace_to_info).collect())
    }

    async fn list_pods(&self) -> Result<Vec<PodInfo>, ClusterApiError> {
        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods.list(&ListParams::default()).await?;
        let cluster_name = self.cluster.as_str();
        Ok(list
            .items
            .into_iter()
            .map(|pod| pod_to_info(pod, cluster_name))
            .collect())
    }

    async fn probe(&self) -> Result<(), ClusterApiError> {
        // Just list with limit 1 to validate auth
        let nodes: Api<Node> = Api::all(self.client.clone());
        nodes.list(&ListParams::default().limit(1)).await?;
        Ok(())
    }
}
