//! Shared types for clustersnap
//!
//! This crate contains the data structures written to and read from the
//! snapshot cache, plus the cluster records handed out by the control plane.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Cluster Records
// ============================================================================

/// Unique name of a managed cluster, used as the cache key suffix
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterIdentity(String);

impl ClusterIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterIdentity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ClusterIdentity {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of a cluster as tracked by the control plane
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClusterStatus {
    Waiting,
    Installing,
    Running,
    Ready,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ClusterStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Installing => "Installing",
            Self::Running => "Running",
            Self::Ready => "Ready",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "waiting" => Self::Waiting,
            "installing" => Self::Installing,
            "running" => Self::Running,
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

/// A cluster as listed by the control plane
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterRecord {
    pub identity: ClusterIdentity,
    pub status: ClusterStatus,
}

impl ClusterRecord {
    pub fn new(identity: impl Into<ClusterIdentity>, status: ClusterStatus) -> Self {
        Self {
            identity: identity.into(),
            status,
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Bearer credential for one cluster's API
///
/// There is no expiry: a credential stays cached until the cluster rejects it
/// and a refresh overwrites it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,

    /// Opaque context attached by whoever issued the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_context: Option<serde_json::Value>,

    pub issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            issued_context: None,
            issued_at: Utc::now(),
        }
    }
}

// ============================================================================
// Cluster Resource Types
// ============================================================================

/// Node information
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub name: String,
    pub status: String,
}

impl NodeInfo {
    pub fn new(name: String, status: String) -> Self {
        Self { name, status }
    }
}

/// Namespace information
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub name: String,
    pub status: String,
}

impl NamespaceInfo {
    pub fn new(name: String, status: String) -> Self {
        Self { name, status }
    }
}

/// Pod information
///
/// `restart_count` and `host_name` are not populated from the cluster API and
/// always carry their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodInfo {
    pub name: String,
    pub cluster_name: String,
    pub restart_count: i32,
    pub status: Option<String>,
    pub namespace: Option<String>,
    pub host_ip: Option<String>,
    pub pod_ip: Option<String>,
    pub host_name: Option<String>,
}

impl PodInfo {
    pub fn new(name: String, cluster_name: String) -> Self {
        Self {
            name,
            cluster_name,
            restart_count: 0,
            status: None,
            namespace: None,
            host_ip: None,
            pod_ip: None,
            host_name: None,
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time view of one cluster, produced by a single sync cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cluster: ClusterIdentity,
    pub token: String,
    pub nodes: Vec<NodeInfo>,
    pub namespaces: Vec<NamespaceInfo>,
    pub pods: Vec<PodInfo>,
    pub synced_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        cluster: ClusterIdentity,
        token: String,
        nodes: Vec<NodeInfo>,
        namespaces: Vec<NamespaceInfo>,
        pods: Vec<PodInfo>,
    ) -> Self {
        Self {
            cluster,
            token,
            nodes,
            namespaces,
            pods,
            synced_at: Utc::now(),
        }
    }

    /// Short "nodes/namespaces/pods" summary for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} namespaces, {} pods",
            self.nodes.len(),
            self.namespaces.len(),
            self.pods.len()
        )
    }
}
