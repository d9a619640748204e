use anyhow::{Context, Result};
use cephkit::{Cluster, ContainerSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths;

// ============================================================================
// Config Schema
// ============================================================================

/// Contents of config.toml
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CephctlConfig {
    /// Target cluster and identity
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Container execution
    #[serde(default)]
    pub container: ContainerSettings,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster name (default: ceph)
    #[serde(default)]
    pub name: Option<String>,

    /// Entity for authenticated `ceph` calls, e.g. client.admin
    #[serde(default)]
    pub entity: Option<String>,

    /// Keyring for `entity`; supports ~ and $VARS
    #[serde(default)]
    pub keyring: Option<String>,
}

impl CephctlConfig {
    /// Load config from `path`, or the default location when `None`.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = paths::config_file()?;
                if !path.exists() {
                    log::debug!("No config file at {}", path.display());
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load config from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))
    }

    /// Where the config is read from.
    pub fn path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => paths::config_file(),
        }
    }
}

// ============================================================================
// Effective Settings
// ============================================================================

/// Values given on the command line (or through clap's env fallbacks).
#[derive(Debug, Default)]
pub struct Overrides {
    pub cluster: Option<String>,
    pub container_image: Option<String>,
    pub container_binary: Option<String>,
}

/// Configuration after applying CLI > file > default precedence.
#[derive(Debug, Serialize)]
pub struct Settings {
    pub cluster: Cluster,
    pub container: ContainerSettings,
}

impl Settings {
    pub fn resolve(file: CephctlConfig, overrides: Overrides) -> Self {
        let name = overrides
            .cluster
            .or(file.cluster.name)
            .unwrap_or_else(|| Cluster::default().name);

        let mut cluster = Cluster::named(&name);
        if let Some(entity) = file.cluster.entity.as_deref() {
            let keyring = file
                .cluster
                .keyring
                .as_deref()
                .map(|k| paths::expand(k).display().to_string());
            cluster = cluster.with_auth(entity, keyring.as_deref());
        }

        let container = ContainerSettings {
            image: overrides.container_image,
            binary: overrides.container_binary,
        }
        .or(file.container);

        Self { cluster, container }
    }
}
