//! TOML configuration for clustersnap

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use clustersnap_k8s::{ClientOptions, DEFAULT_API_PORT};
use clustersnap_sync::{ClusterStatus, SchedulerOptions, StatusFilter};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub clusters: Vec<ClusterConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Seconds between passes in daemon mode
    pub interval_secs: u64,
    /// Watchdog for one cluster's sync attempt
    pub attempt_timeout_secs: u64,
    pub api_port: u16,
    pub insecure_skip_tls_verify: bool,
    /// Only sync clusters that are not ready yet
    pub pending_only: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            attempt_timeout_secs: 120,
            api_port: DEFAULT_API_PORT,
            insecure_skip_tls_verify: false,
            pending_only: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
}

/// A cluster known to the config-backed control plane
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterConfig {
    pub name: String,
    #[serde(default)]
    pub status: ClusterStatus,
    /// Hosts of the master group; the first one serves the API
    #[serde(default)]
    pub master_hosts: Vec<String>,
    /// Static bearer token
    #[serde(default)]
    pub token: Option<String>,
    /// Command printing a fresh token, run on every issue
    #[serde(default)]
    pub token_command: Option<Vec<String>>,
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for cluster in &self.clusters {
            if cluster.name.is_empty() {
                bail!("cluster name must not be empty");
            }
            if !seen.insert(cluster.name.as_str()) {
                bail!("duplicate cluster '{}'", cluster.name);
            }
            match (&cluster.token, &cluster.token_command) {
                (None, None) => bail!(
                    "cluster '{}' needs either `token` or `token_command`",
                    cluster.name
                ),
                (Some(_), Some(_)) => bail!(
                    "cluster '{}' sets both `token` and `token_command`",
                    cluster.name
                ),
                (None, Some(cmd)) if cmd.is_empty() => {
                    bail!("cluster '{}' has an empty `token_command`", cluster.name)
                }
                _ => {}
            }
        }
        if self.sync.attempt_timeout_secs == 0 {
            bail!("sync.attempt_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_port: self.sync.api_port,
            insecure_skip_tls_verify: self.sync.insecure_skip_tls_verify,
        }
    }

    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            interval: Duration::from_secs(self.sync.interval_secs),
            attempt_timeout: Duration::from_secs(self.sync.attempt_timeout_secs),
            filter: if self.sync.pending_only {
                StatusFilter::NotReady
            } else {
                StatusFilter::All
            },
        }
    }
}
