//! Conversions from cluster API resources into snapshot records

use k8s_openapi::api::core::v1::{Namespace, Node, Pod};

use clustersnap_types::{NamespaceInfo, NodeInfo, PodInfo};

const UNKNOWN: &str = "Unknown";

/// Convert a k8s Node to NodeInfo
///
/// Uses the node phase when the API reports one, otherwise derives
/// `Ready`/`NotReady` from the Ready condition.
pub fn node_to_info(node: Node) -> NodeInfo {
    let name = node.metadata.name.unwrap_or_default();
    let status = node
        .status
        .and_then(|s| {
            s.phase.or_else(|| {
                s.conditions?
                    .into_iter()
                    .find(|c| c.type_ == "Ready")
                    .map(|c| match c.status.as_str() {
                        "True" => "Ready".to_string(),
                        _ => "NotReady".to_string(),
                    })
            })
        })
        .unwrap_or_else(|| UNKNOWN.to_string());
    NodeInfo::new(name, status)
}

/// Convert a k8s Namespace to NamespaceInfo
pub fn namespace_to_info(ns: Namespace) -> NamespaceInfo {
    let name = ns.metadata.name.unwrap_or_default();
    let status = ns
        .status
        .and_then(|s| s.phase)
        .unwrap_or_else(|| UNKNOWN.to_string());
    NamespaceInfo::new(name, status)
}

/// Convert a k8s Pod to PodInfo
///
/// Restart count and host name are deliberately left at their defaults.
pub fn pod_to_info(pod: Pod, cluster_name: &str) -> PodInfo {
    let name = pod.metadata.name.unwrap_or_default();
    let mut info = PodInfo::new(name, cluster_name.to_string());
    info.namespace = pod.metadata.namespace;

    if let Some(status) = pod.status {
        info.status = status.phase;
        info.host_ip = status.host_ip;
        info.pod_ip = status.pod_ip;
    }

    info
}
