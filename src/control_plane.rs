//! Control plane backed by the config file
//!
//! Cluster records and master hosts come straight from the config. Tokens are
//! either static or produced by running a command, the same way kubeconfig
//! exec credentials work.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use clustersnap_sync::{
    ClusterIdentity, ClusterRecord, ControlPlane, ControlPlaneError, Credential, StatusFilter,
};

use crate::config::ClusterConfig;

pub struct StaticControlPlane {
    clusters: Vec<ClusterConfig>,
}

impl StaticControlPlane {
    pub fn new(clusters: Vec<ClusterConfig>) -> Self {
        Self { clusters }
    }

    fn find(&self, cluster: &ClusterIdentity) -> Result<&ClusterConfig, ControlPlaneError> {
        self.clusters
            .iter()
            .find(|c| c.name == cluster.as_str())
            .ok_or_else(|| ControlPlaneError::ClusterNotFound(cluster.clone()))
    }

    async fn run_token_command(
        cluster: &ClusterIdentity,
        command: &[String],
    ) -> Result<Credential, ControlPlaneError> {
        let issue_error = |reason: String| ControlPlaneError::TokenIssue {
            cluster: cluster.clone(),
            reason,
        };

        let (program, args) = command
            .split_first()
            .ok_or_else(|| issue_error("empty token command".to_string()))?;

        debug!(cluster = %cluster, command = %program, "running token command");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| issue_error(format!("failed to run '{}': {}", program, e)))?;

        if !output.status.success() {
            return Err(issue_error(format!(
                "'{}' exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = parse_token_output(&output.stdout)
            .ok_or_else(|| issue_error(format!("'{}' printed no token", program)))?;

        let mut credential = Credential::new(token);
        credential.issued_context = Some(serde_json::json!({ "source": program }));
        Ok(credential)
    }
}

/// Extract a token from command output
///
/// Accepts an ExecCredential-style JSON document (`status.token`) or a bare
/// token on stdout.
fn parse_token_output(stdout: &[u8]) -> Option<String> {
    if let Ok(response) = serde_json::from_slice::<serde_json::Value>(stdout) {
        if let Some(token) = response
            .get("status")
            .and_then(|s| s.get("token"))
            .and_then(|t| t.as_str())
        {
            return Some(token.to_string());
        }
    }

    let raw = String::from_utf8_lossy(stdout).trim().to_string();
    if raw.is_empty() || raw.starts_with('{') {
        None
    } else {
        Some(raw)
    }
}

#[async_trait]
impl ControlPlane for StaticControlPlane {
    async fn issue_token(
        &self,
        cluster: &ClusterIdentity,
    ) -> Result<Credential, ControlPlaneError> {
        let config = self.find(cluster)?;
        match (&config.token_command, &config.token) {
            (Some(command), _) => Self::run_token_command(cluster, command).await,
            (None, Some(token)) => Ok(Credential::new(token.clone())),
            (None, None) => Err(ControlPlaneError::TokenIssue {
                cluster: cluster.clone(),
                reason: "no token source configured".to_string(),
            }),
        }
    }

    async fn resolve_master_host(
        &self,
        cluster: &ClusterIdentity,
    ) -> Result<String, ControlPlaneError> {
        self.find(cluster)?
            .master_hosts
            .first()
            .cloned()
            .ok_or_else(|| ControlPlaneError::NoMasterHost(cluster.clone()))
    }

    async fn list_clusters(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<ClusterRecord>, ControlPlaneError> {
        Ok(self
            .clusters
            .iter()
            .map(|c| ClusterRecord::new(c.name.as_str(), c.status.clone()))
            .filter(|r| filter.matches(r))
            .collect())
    }
}
