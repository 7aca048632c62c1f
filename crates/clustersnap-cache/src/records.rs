use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use clustersnap_types::{ClusterIdentity, Credential, Snapshot};

use crate::{CacheError, CacheStore};

const CREDENTIAL_PREFIX: &str = "credential:";
const SNAPSHOT_PREFIX: &str = "snapshot:";

/// Cache key holding a cluster's credential
pub fn credential_key(cluster: &ClusterIdentity) -> String {
    format!("{}{}", CREDENTIAL_PREFIX, cluster)
}

/// Cache key holding a cluster's snapshot
pub fn snapshot_key(cluster: &ClusterIdentity) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, cluster)
}

async fn read_record<T: DeserializeOwned>(
    cache: &dyn CacheStore,
    key: &str,
) -> Result<Option<T>, CacheError> {
    let Some(bytes) = cache.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| CacheError::Decode {
            key: key.to_string(),
            source,
        })
}

async fn write_record<T: Serialize>(
    cache: &dyn CacheStore,
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec(value).map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })?;
    cache.set(key, bytes).await
}

/// Per-cluster credential records
#[derive(Clone)]
pub struct CredentialStore {
    cache: Arc<dyn CacheStore>,
}

impl CredentialStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Read the cached credential for a cluster
    ///
    /// A malformed record is an error, not a miss.
    pub async fn get(&self, cluster: &ClusterIdentity) -> Result<Option<Credential>, CacheError> {
        read_record(self.cache.as_ref(), &credential_key(cluster)).await
    }

    /// Overwrite the cached credential for a cluster
    pub async fn put(
        &self,
        cluster: &ClusterIdentity,
        credential: &Credential,
    ) -> Result<(), CacheError> {
        debug!(cluster = %cluster, "caching credential");
        write_record(self.cache.as_ref(), &credential_key(cluster), credential).await
    }
}

/// Per-cluster snapshot records
#[derive(Clone)]
pub struct SnapshotStore {
    cache: Arc<dyn CacheStore>,
}

impl SnapshotStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Read the cached snapshot for a cluster
    pub async fn get(&self, cluster: &ClusterIdentity) -> Result<Option<Snapshot>, CacheError> {
        read_record(self.cache.as_ref(), &snapshot_key(cluster)).await
    }

    /// Replace the cached snapshot for a cluster with a single `set`
    pub async fn put(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
        write_record(self.cache.as_ref(), &snapshot_key(&snapshot.cluster), snapshot).await
    }
}
