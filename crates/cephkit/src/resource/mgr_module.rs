//! Manager modules.

use super::{Ensure, Observed, Probe, ProbeOutput, Resource, Step, step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired enablement of a manager module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MgrModule {
    /// Module name, e.g. `dashboard`
    pub name: String,
    /// `present` enables, `absent` disables
    #[serde(default)]
    pub state: Ensure,
}

/// Module status from `mgr module ls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleState {
    /// Enabled, either explicitly or because it is always on
    pub enabled: bool,
    /// Cannot be disabled
    pub always_on: bool,
}

/// Entries are bare names or objects with a `name` key depending on release.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModuleEntry {
    Name(String),
    Detail { name: String },
}

impl ModuleEntry {
    fn name(&self) -> &str {
        match self {
            ModuleEntry::Name(name) | ModuleEntry::Detail { name } => name,
        }
    }
}

/// Older releases key always-on modules by release name and list every
/// release they know about. Release names sort alphabetically by age, so only
/// the last key describes the running cluster.
#[derive(Deserialize)]
#[serde(untagged)]
enum AlwaysOn {
    List(Vec<ModuleEntry>),
    ByRelease(BTreeMap<String, Vec<ModuleEntry>>),
}

impl Default for AlwaysOn {
    fn default() -> Self {
        AlwaysOn::List(Vec::new())
    }
}

impl AlwaysOn {
    fn contains(&self, module: &str) -> bool {
        match self {
            AlwaysOn::List(entries) => entries.iter().any(|e| e.name() == module),
            AlwaysOn::ByRelease(releases) => releases
                .values()
                .next_back()
                .is_some_and(|entries| entries.iter().any(|e| e.name() == module)),
        }
    }
}

#[derive(Deserialize)]
struct ModuleList {
    #[serde(default)]
    always_on_modules: AlwaysOn,
    enabled_modules: Vec<ModuleEntry>,
    #[serde(default)]
    disabled_modules: Vec<ModuleEntry>,
}

impl MgrModule {
    /// Module that should be enabled.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Ensure::Present,
        }
    }

    /// Module that should be disabled.
    pub fn disabled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Ensure::Absent,
        }
    }

    /// `mgr module enable` or `mgr module disable`.
    pub fn toggle_step(&self, enable: bool) -> Step {
        step([
            "mgr",
            "module",
            if enable { "enable" } else { "disable" },
            self.name.as_str(),
        ])
    }
}

impl Resource for MgrModule {
    type State = ModuleState;

    fn id(&self) -> String {
        self.name.clone()
    }

    fn resource_type(&self) -> &'static str {
        "mgr_module"
    }

    fn tool(&self) -> Tool {
        Tool::Ceph
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("mgr_module", &self.name, "module name is empty"));
        }
        Ok(())
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(["mgr", "module", "ls", "--format=json"], &[])]
    }

    fn observe(&self, outputs: &[ProbeOutput]) -> Result<Observed<ModuleState>> {
        let list = match outputs.first() {
            Some(output) => output.parse::<ModuleList>("mgr module ls")?,
            None => return Err(Error::probe("mgr module ls produced no output")),
        };
        let Some(list) = list else {
            return Ok(Observed::NotFound);
        };

        let always_on = list.always_on_modules.contains(&self.name);
        let enabled = list.enabled_modules.iter().any(|e| e.name() == self.name);
        let disabled = list.disabled_modules.iter().any(|e| e.name() == self.name);

        if !(always_on || enabled || disabled) {
            return Ok(Observed::NotFound);
        }
        Ok(Observed::Present(ModuleState {
            enabled: enabled || always_on,
            always_on,
        }))
    }

    fn plan(&self, observed: &Observed<ModuleState>) -> Result<Vec<Step>> {
        Ok(match (self.state, observed) {
            (Ensure::Info, _) => Vec::new(),
            (Ensure::Present, Observed::Present(current)) if current.enabled => Vec::new(),
            (Ensure::Present, _) => vec![self.toggle_step(true)],
            (Ensure::Absent, Observed::Present(current)) if current.always_on => {
                return Err(Error::invalid(
                    "mgr_module",
                    &self.name,
                    "always-on modules cannot be disabled",
                ));
            }
            (Ensure::Absent, Observed::Present(current)) if current.enabled => {
                vec![self.toggle_step(false)]
            }
            (Ensure::Absent, _) => Vec::new(),
        })
    }
}
