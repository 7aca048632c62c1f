//! Cluster state synchronization for clustersnap
//!
//! Acquires a bearer token for a cluster (cache first, control plane second),
//! validates it against the live cluster with a bounded re-authentication
//! loop, then snapshots nodes, pods, and namespaces into the cache.

mod auth;
mod control_plane;
mod error;
mod reader;
mod scheduler;
mod synchronizer;

#[cfg(test)]
mod testing;

pub use auth::AuthSession;
pub use control_plane::{ControlPlane, ControlPlaneError, StatusFilter};
pub use error::SyncError;
pub use reader::SnapshotReader;
pub use scheduler::{PassReport, SchedulerOptions, SyncScheduler};
pub use synchronizer::{ClusterSynchronizer, ConnectState, Connection, MAX_RETRY_COUNT};

// Re-export types used in our public API
pub use clustersnap_types::{ClusterIdentity, ClusterRecord, ClusterStatus, Credential, Snapshot};
