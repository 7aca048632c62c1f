//! Kubernetes client for clustersnap
//!
//! This crate provides the read-only cluster API surface used by a sync cycle:
//! listing nodes, namespaces, and pods with a bearer token against a cluster's
//! master endpoint.

mod api;
mod client;
mod error;
mod mapping;

pub use api::{ClientFactory, ClusterApi};
pub use client::{ClientOptions, DEFAULT_API_PORT, KubeClientFactory, KubeClusterClient};
pub use error::ClusterApiError;
pub use mapping::{namespace_to_info, node_to_info, pod_to_info};

// Re-export types that are used in our public API
pub use clustersnap_types::{ClusterIdentity, NamespaceInfo, NodeInfo, PodInfo};
