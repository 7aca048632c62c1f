//! Token acquisition for one cluster

use std::sync::Arc;

use tracing::{debug, info};

use clustersnap_cache::{CacheError, CredentialStore};
use clustersnap_types::{ClusterIdentity, Credential};

use crate::{ControlPlane, SyncError};

/// Owns the credential used by one cluster's sync cycle
///
/// A session never writes to the cache. A freshly issued credential is only
/// persisted by the synchronizer after a complete snapshot has been written.
pub struct AuthSession {
    cluster: ClusterIdentity,
    credentials: CredentialStore,
    control_plane: Arc<dyn ControlPlane>,
    credential: Option<Credential>,
}

impl AuthSession {
    pub fn new(
        cluster: ClusterIdentity,
        credentials: CredentialStore,
        control_plane: Arc<dyn ControlPlane>,
    ) -> Self {
        Self {
            cluster,
            credentials,
            control_plane,
            credential: None,
        }
    }

    pub fn cluster(&self) -> &ClusterIdentity {
        &self.cluster
    }

    /// Token currently held by the session
    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Get a token, preferring the cached credential
    ///
    /// Falls back to the control plane when nothing is cached or the cache
    /// rejects our access. Any other cache failure is an authorization error.
    pub async fn acquire(&mut self) -> Result<String, SyncError> {
        match self.credentials.get(&self.cluster).await {
            Ok(Some(credential)) => {
                debug!(cluster = %self.cluster, "using cached credential");
                let token = credential.token.clone();
                self.credential = Some(credential);
                Ok(token)
            }
            Ok(None) => {
                debug!(cluster = %self.cluster, "no cached credential");
                self.issue().await
            }
            Err(CacheError::Unauthorized(reason)) => {
                debug!(cluster = %self.cluster, %reason, "credential cache rejected access");
                self.issue().await
            }
            Err(e) => Err(SyncError::Authorization {
                cluster: self.cluster.clone(),
                reason: format!("failed to read cached credential: {}", e),
            }),
        }
    }

    /// Drop the held token and request a fresh one, bypassing the cache
    pub async fn refresh(&mut self) -> Result<String, SyncError> {
        self.credential = None;
        self.issue().await
    }

    async fn issue(&mut self) -> Result<String, SyncError> {
        let credential = self.control_plane.issue_token(&self.cluster).await?;
        info!(cluster = %self.cluster, "issued fresh token");
        let token = credential.token.clone();
        self.credential = Some(credential);
        Ok(token)
    }
}
