//! In-memory fakes for the control plane, cluster API, and cache

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use clustersnap_cache::{CacheError, CacheStore, CredentialStore, MemoryCache};
use clustersnap_k8s::{ClientFactory, ClusterApi, ClusterApiError};
use clustersnap_types::{
    ClusterIdentity, ClusterRecord, ClusterStatus, Credential, NamespaceInfo, NodeInfo, PodInfo,
};

use crate::{ControlPlane, ControlPlaneError, StatusFilter};

pub const MASTER_HOST: &str = "10.0.0.1";

/// Control plane that hands out a scripted sequence of tokens
pub struct FakeControlPlane {
    tokens: Mutex<VecDeque<String>>,
    issue_calls: AtomicUsize,
    clusters: Vec<ClusterRecord>,
}

impl FakeControlPlane {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: Mutex::new(tokens.iter().map(|t| t.to_string()).collect()),
            issue_calls: AtomicUsize::new(0),
            clusters: Vec::new(),
        }
    }

    pub fn with_cluster(mut self, name: &str, status: ClusterStatus) -> Self {
        self.clusters.push(ClusterRecord::new(name, status));
        self
    }

    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn issue_token(
        &self,
        _cluster: &ClusterIdentity,
    ) -> Result<Credential, ControlPlaneError> {
        let n = self.issue_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self
            .tokens
            .lock()
            .pop_front()
            .unwrap_or_else(|| format!("tok-generated-{}", n));
        Ok(Credential::new(token))
    }

    async fn resolve_master_host(
        &self,
        _cluster: &ClusterIdentity,
    ) -> Result<String, ControlPlaneError> {
        Ok(MASTER_HOST.to_string())
    }

    async fn list_clusters(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<ClusterRecord>, ControlPlaneError> {
        Ok(self
            .clusters
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct FactoryState {
    probe_results: Mutex<VecDeque<Result<(), ClusterApiError>>>,
    probe_calls: AtomicUsize,
    built_tokens: Mutex<Vec<String>>,
    fetch_errors: Mutex<HashMap<&'static str, ClusterApiError>>,
    cluster_probe_errors: Mutex<HashMap<String, ClusterApiError>>,
    panicking_clusters: Mutex<HashSet<String>>,
    node_count: usize,
    namespace_count: usize,
    pod_count: usize,
    delay: Option<Duration>,
}

/// Client factory whose clients answer from a script
#[derive(Clone)]
pub struct FakeClientFactory {
    state: Arc<FactoryState>,
}

impl FakeClientFactory {
    /// Clients returning the given resource counts; probes succeed unless scripted
    pub fn new(nodes: usize, namespaces: usize, pods: usize) -> Self {
        Self {
            state: Arc::new(FactoryState {
                node_count: nodes,
                namespace_count: namespaces,
                pod_count: pods,
                ..Default::default()
            }),
        }
    }

    pub fn with_delay(nodes: usize, namespaces: usize, pods: usize, delay: Duration) -> Self {
        Self {
            state: Arc::new(FactoryState {
                node_count: nodes,
                namespace_count: namespaces,
                pod_count: pods,
                delay: Some(delay),
                ..Default::default()
            }),
        }
    }

    /// Queue the outcomes of the next probes, in order
    pub fn script_probes(&self, results: Vec<Result<(), ClusterApiError>>) {
        self.state.probe_results.lock().extend(results);
    }

    /// Make a list operation ("nodes", "namespaces", "pods") fail
    pub fn fail_fetch(&self, operation: &'static str, error: ClusterApiError) {
        self.state.fetch_errors.lock().insert(operation, error);
    }

    /// Make every probe against `cluster` fail
    pub fn fail_probes_for(&self, cluster: &str, error: ClusterApiError) {
        self.state
            .cluster_probe_errors
            .lock()
            .insert(cluster.to_string(), error);
    }

    /// Make every probe against `cluster` panic
    pub fn panic_probes_for(&self, cluster: &str) {
        self.state
            .panicking_clusters
            .lock()
            .insert(cluster.to_string());
    }

    pub fn probe_calls(&self) -> usize {
        self.state.probe_calls.load(Ordering::SeqCst)
    }

    pub fn built_tokens(&self) -> Vec<String> {
        self.state.built_tokens.lock().clone()
    }
}

impl ClientFactory for FakeClientFactory {
    fn build(
        &self,
        cluster: &ClusterIdentity,
        master_host: &str,
        token: &str,
    ) -> Result<Box<dyn ClusterApi>, ClusterApiError> {
        assert_eq!(master_host, MASTER_HOST);
        self.state.built_tokens.lock().push(token.to_string());
        Ok(Box::new(FakeClusterApi {
            cluster: cluster.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeClusterApi {
    cluster: ClusterIdentity,
    state: Arc<FactoryState>,
}

impl FakeClusterApi {
    fn check(&self, operation: &'static str) -> Result<(), ClusterApiError> {
        match self.state.fetch_errors.lock().get(operation) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterApi for FakeClusterApi {
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>, ClusterApiError> {
        self.check("nodes")?;
        Ok((0..self.state.node_count)
            .map(|i| NodeInfo::new(format!("node-{}", i), "Ready".to_string()))
            .collect())
    }

    async fn list_namespaces(&self) -> Result<Vec<NamespaceInfo>, ClusterApiError> {
        self.check("namespaces")?;
        Ok((0..self.state.namespace_count)
            .map(|i| NamespaceInfo::new(format!("ns-{}", i), "Active".to_string()))
            .collect())
    }

    async fn list_pods(&self) -> Result<Vec<PodInfo>, ClusterApiError> {
        self.check("pods")?;
        Ok((0..self.state.pod_count)
            .map(|i| PodInfo::new(format!("pod-{}", i), self.cluster.to_string()))
            .collect())
    }

    async fn probe(&self) -> Result<(), ClusterApiError> {
        self.state.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.state.delay {
            tokio::time::sleep(delay).await;
        }
        let panics = self
            .state
            .panicking_clusters
            .lock()
            .contains(self.cluster.as_str());
        if panics {
            panic!("probe of {} blew up", self.cluster);
        }
        if let Some(e) = self
            .state
            .cluster_probe_errors
            .lock()
            .get(self.cluster.as_str())
        {
            return Err(e.clone());
        }
        let next = self.state.probe_results.lock().pop_front();
        next.unwrap_or(Ok(()))
    }
}

/// Memory cache that counts writes per key
#[derive(Clone, Default)]
pub struct CountingCache {
    inner: MemoryCache,
    sets: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sets_for(&self, key: &str) -> usize {
        self.sets.lock().get(key).copied().unwrap_or(0)
    }

    pub fn total_sets(&self) -> usize {
        self.sets.lock().values().sum()
    }
}

#[async_trait]
impl CacheStore for CountingCache {
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        *self.sets.lock().entry(key.to_string()).or_insert(0) += 1;
        self.inner.set(key, value).await
    }
}

/// Memory cache whose writes fail for keys starting with `prefix`
#[derive(Clone)]
pub struct PrefixFailingCache {
    inner: MemoryCache,
    prefix: &'static str,
}

impl PrefixFailingCache {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            inner: MemoryCache::new(),
            prefix,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}

#[async_trait]
impl CacheStore for PrefixFailingCache {
    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        if key.starts_with(self.prefix) {
            return Err(CacheError::Backend(format!("write to '{}' refused", key)));
        }
        self.inner.set(key, value).await
    }
}

/// Cache whose reads always fail with the given error
struct FailingCache<F> {
    make_error: F,
}

#[async_trait]
impl<F> CacheStore for FailingCache<F>
where
    F: Fn() -> CacheError + Send + Sync,
{
    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err((self.make_error)())
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err((self.make_error)())
    }

    async fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
        Ok(())
    }
}

pub fn failing_cache<F>(make_error: F) -> Arc<dyn CacheStore>
where
    F: Fn() -> CacheError + Send + Sync + 'static,
{
    Arc::new(FailingCache { make_error })
}

/// Memory cache holding a credential for `cluster`
pub async fn seeded_cache(cluster: &str, token: &str) -> Arc<MemoryCache> {
    let cache = Arc::new(MemoryCache::new());
    CredentialStore::new(cache.clone())
        .put(&ClusterIdentity::new(cluster), &Credential::new(token))
        .await
        .unwrap();
    cache
}

pub fn unauthorized() -> Result<(), ClusterApiError> {
    Err(ClusterApiError::unauthorized("Unauthorized"))
}
