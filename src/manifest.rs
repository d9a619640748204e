//! Resource manifests for `cephctl apply` and `cephctl plan`
//!
//! A manifest is a TOML file with one `[[resources]]` table per resource,
//! each tagged by `kind`:
//!
//! ```toml
//! [[resources]]
//! kind = "realm"
//! name = "gold"
//! default = true
//! ```
//!
//! Resources are reconciled in file order.

use anyhow::{Context, Result};
use cephkit::DesiredState;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<DesiredState>,
}

impl Manifest {
    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read manifest: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    /// Parse manifest TOML
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resources that need confirmation before running for real
    pub fn destructive(&self) -> impl Iterator<Item = &DesiredState> {
        self.resources.iter().filter(|r| r.is_destructive())
    }
}
