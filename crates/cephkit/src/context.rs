//! Execution context resolution.
//!
//! Decides whether an admin tool runs directly on the host or inside a
//! container, and with which runtime and image. Environment input is read
//! once at the boundary ([`ContainerSettings::from_env`]) and then passed
//! around as a plain value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming the container image to run tools from
pub const ENV_CONTAINER_IMAGE: &str = "CEPH_CONTAINER_IMAGE";

/// Environment variable overriding the container runtime binary
pub const ENV_CONTAINER_BINARY: &str = "CEPH_CONTAINER_BINARY";

/// Runtime used when an image is configured but no binary is
pub const DEFAULT_CONTAINER_BINARY: &str = "podman";

/// Raw, unvalidated container configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSettings {
    /// Container image; `None` means run bare
    #[serde(default)]
    pub image: Option<String>,
    /// Container runtime binary; `None` means [`DEFAULT_CONTAINER_BINARY`]
    #[serde(default)]
    pub binary: Option<String>,
}

impl ContainerSettings {
    /// Read settings through a lookup function.
    ///
    /// Keeps the resolver testable without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            image: lookup(ENV_CONTAINER_IMAGE),
            binary: lookup(ENV_CONTAINER_BINARY),
        }
    }

    /// Read settings from `CEPH_CONTAINER_IMAGE` / `CEPH_CONTAINER_BINARY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from `other`.
    pub fn or(self, other: ContainerSettings) -> Self {
        Self {
            image: self.image.or(other.image),
            binary: self.binary.or(other.binary),
        }
    }
}

/// Container runtime and image a tool is wrapped in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    /// Runtime binary (e.g. "podman", "docker")
    pub runtime: String,
    /// Image reference
    pub image: String,
}

/// Where and how an admin tool binary is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    binary: String,
    container: Option<Container>,
}

impl ExecutionContext {
    /// Context that runs `binary` directly on the host.
    pub fn bare(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            container: None,
        }
    }

    /// Resolve a context for `binary`.
    ///
    /// No image means bare execution. With an image the runtime defaults to
    /// `podman`. Empty strings are rejected rather than treated as unset.
    pub fn resolve(
        binary: &str,
        image: Option<&str>,
        container_binary: Option<&str>,
    ) -> Result<Self> {
        let Some(image) = image else {
            return Ok(Self::bare(binary));
        };

        if image.trim().is_empty() {
            return Err(Error::ContextResolution(format!(
                "{ENV_CONTAINER_IMAGE} is set but empty"
            )));
        }

        let runtime = match container_binary {
            Some(b) if b.trim().is_empty() => {
                return Err(Error::ContextResolution(format!(
                    "{ENV_CONTAINER_BINARY} is set but empty"
                )));
            }
            Some(b) => b.trim(),
            None => DEFAULT_CONTAINER_BINARY,
        };

        Ok(Self {
            binary: binary.to_string(),
            container: Some(Container {
                runtime: runtime.to_string(),
                image: image.trim().to_string(),
            }),
        })
    }

    /// Resolve from a [`ContainerSettings`] value.
    pub fn from_settings(binary: &str, settings: &ContainerSettings) -> Result<Self> {
        Self::resolve(
            binary,
            settings.image.as_deref(),
            settings.binary.as_deref(),
        )
    }

    /// Same container settings, different tool entrypoint.
    pub fn for_binary(&self, binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            container: self.container.clone(),
        }
    }

    /// The tool binary (bare) or container entrypoint.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Whether invocations are wrapped in a container runtime.
    pub fn is_containerized(&self) -> bool {
        self.container.is_some()
    }

    /// The container, when containerized.
    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    /// Runtime binary, when containerized.
    pub fn container_binary(&self) -> Option<&str> {
        self.container.as_ref().map(|c| c.runtime.as_str())
    }

    /// Image reference, when containerized.
    pub fn container_image(&self) -> Option<&str> {
        self.container.as_ref().map(|c| c.image.as_str())
    }
}
