//! Connect-validate-snapshot cycle for a single cluster

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use clustersnap_cache::{CacheStore, CredentialStore, SnapshotStore};
use clustersnap_k8s::{ClientFactory, ClusterApi};
use clustersnap_types::{ClusterIdentity, Credential, Snapshot};

use crate::{AuthSession, ControlPlane, SyncError};

/// Re-authentication gives up once the retry count exceeds this value
pub const MAX_RETRY_COUNT: u32 = 2;

/// States of the connect state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectState {
    Building,
    Validating,
    Ready,
    Failed,
}

impl fmt::Display for ConnectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "building",
            Self::Validating => "validating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A validated client together with the credential it authenticates with
pub struct Connection {
    pub client: Box<dyn ClusterApi>,
    pub credential: Credential,
    /// Number of re-authentications it took to get here
    pub retry_count: u32,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

/// Produces cluster snapshots and writes them to the cache
///
/// Holds no per-cluster state: every call builds its own [`AuthSession`], so
/// one synchronizer can serve concurrent syncs of different clusters.
pub struct ClusterSynchronizer {
    control_plane: Arc<dyn ControlPlane>,
    factory: Arc<dyn ClientFactory>,
    credentials: CredentialStore,
    snapshots: SnapshotStore,
}

impl ClusterSynchronizer {
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        factory: Arc<dyn ClientFactory>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            control_plane,
            factory,
            credentials: CredentialStore::new(cache.clone()),
            snapshots: SnapshotStore::new(cache),
        }
    }

    /// Start an auth session for a cluster
    pub fn session(&self, cluster: &ClusterIdentity) -> AuthSession {
        AuthSession::new(
            cluster.clone(),
            self.credentials.clone(),
            Arc::clone(&self.control_plane),
        )
    }

    /// Run the connect state machine until the client is validated or fails
    ///
    /// A 401 from the validation probe forces a fresh token from the control
    /// plane and starts over, until `retry_count` exceeds [`MAX_RETRY_COUNT`].
    /// Any other probe failure is fatal immediately.
    pub async fn connect(
        &self,
        session: &mut AuthSession,
        retry_count: u32,
    ) -> Result<Connection, SyncError> {
        let cluster = session.cluster().clone();
        let mut retry_count = retry_count;
        let mut force_refresh = false;

        loop {
            transition(&cluster, ConnectState::Building, retry_count);
            let token = if force_refresh {
                session.refresh().await?
            } else {
                session.acquire().await?
            };
            let master = self.control_plane.resolve_master_host(&cluster).await?;
            let client = self
                .factory
                .build(&cluster, &master, &token)
                .map_err(|e| SyncError::cluster_api(&cluster, e))?;

            transition(&cluster, ConnectState::Validating, retry_count);
            match client.probe().await {
                Ok(()) => {
                    transition(&cluster, ConnectState::Ready, retry_count);
                    let credential = session
                        .credential()
                        .cloned()
                        .unwrap_or_else(|| Credential::new(token));
                    return Ok(Connection {
                        client,
                        credential,
                        retry_count,
                    });
                }
                Err(e) if e.is_unauthorized() => {
                    if retry_count > MAX_RETRY_COUNT {
                        transition(&cluster, ConnectState::Failed, retry_count);
                        return Err(SyncError::RetryBudgetExceeded {
                            cluster,
                            retry_count,
                        });
                    }
                    warn!(cluster = %cluster, retry_count, "token rejected, re-authenticating");
                    retry_count += 1;
                    force_refresh = true;
                }
                Err(e) => {
                    transition(&cluster, ConnectState::Failed, retry_count);
                    return Err(SyncError::cluster_api(&cluster, e));
                }
            }
        }
    }

    /// Run one full sync cycle for a cluster
    ///
    /// Only the validation probe is retried. A 401 during the fetch itself
    /// aborts the cycle, leaving the previous snapshot in place.
    pub async fn sync(&self, cluster: &ClusterIdentity) -> Result<Snapshot, SyncError> {
        let mut session = self.session(cluster);
        let connection = self.connect(&mut session, 0).await?;
        let client = connection.client.as_ref();

        let fetch_error = |e: clustersnap_k8s::ClusterApiError| {
            if e.is_unauthorized() {
                SyncError::Authorization {
                    cluster: cluster.clone(),
                    reason: format!("token rejected during fetch: {}", e),
                }
            } else {
                SyncError::cluster_api(cluster, e)
            }
        };

        let nodes = client.list_nodes().await.map_err(fetch_error)?;
        let pods = client.list_pods().await.map_err(fetch_error)?;
        let namespaces = client.list_namespaces().await.map_err(fetch_error)?;

        let snapshot = Snapshot::new(
            cluster.clone(),
            connection.credential.token.clone(),
            nodes,
            namespaces,
            pods,
        );

        // The probe already accepted this credential, so it may be stored on
        // its own. The snapshot write commits the cycle.
        self.credentials
            .put(cluster, &connection.credential)
            .await
            .map_err(|e| SyncError::cache(cluster, e))?;
        self.snapshots
            .put(&snapshot)
            .await
            .map_err(|e| SyncError::cache(cluster, e))?;

        info!(
            cluster = %cluster,
            nodes = snapshot.nodes.len(),
            namespaces = snapshot.namespaces.len(),
            pods = snapshot.pods.len(),
            retry_count = connection.retry_count,
            "cluster snapshot cached"
        );
        Ok(snapshot)
    }
}

fn transition(cluster: &ClusterIdentity, state: ConnectState, retry_count: u32) {
    debug!(cluster = %cluster, %state, retry_count, "connect state");
}
