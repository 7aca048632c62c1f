//! Cache storage for clustersnap
//!
//! A small key-value abstraction over the cache engine plus the two record
//! stores layered on it: per-cluster credentials and per-cluster snapshots.
//! Each record kind lives under its own key prefix so a cached snapshot never
//! answers the question "is there a credential for this cluster".

mod error;
mod file;
mod records;
mod store;

pub use error::CacheError;
pub use file::FileCache;
pub use records::{CredentialStore, SnapshotStore, credential_key, snapshot_key};
pub use store::{CacheStore, MemoryCache};
