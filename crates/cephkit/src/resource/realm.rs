//! RADOS gateway realms.

use super::{Ensure, Observed, Probe, ProbeOutput, Resource, Step, step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Exit codes `realm get` uses for an unknown realm.
const REALM_NOT_FOUND: &[i32] = &[2, 22];

/// Desired realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    /// Realm name
    pub name: String,
    /// Whether the realm should be the default one
    #[serde(default)]
    pub default: bool,
    /// Create, delete or just look
    #[serde(default)]
    pub state: Ensure,
}

/// What the cluster reports about a realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealmState {
    /// Realm id
    pub id: String,
    /// Whether it is the default realm
    pub is_default: bool,
}

#[derive(Deserialize)]
struct RealmGet {
    id: String,
}

#[derive(Deserialize)]
struct RealmList {
    #[serde(default)]
    default_info: Option<String>,
}

impl Realm {
    /// A realm that should exist.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: false,
            state: Ensure::Present,
        }
    }

    /// Also make it the default realm.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Set the desired state.
    pub fn with_state(mut self, state: Ensure) -> Self {
        self.state = state;
        self
    }

    fn realm_flag(&self) -> String {
        format!("--rgw-realm={}", self.name)
    }

    /// `realm create`, with `--default` when requested.
    pub fn create_step(&self) -> Step {
        let mut args = step(["realm".to_string(), "create".to_string(), self.realm_flag()]);
        if self.default {
            args.push("--default".to_string());
        }
        args
    }

    /// `realm get` as JSON.
    pub fn get_step(&self) -> Step {
        step([
            "realm".to_string(),
            "get".to_string(),
            self.realm_flag(),
            "--format=json".to_string(),
        ])
    }

    /// `realm delete`.
    pub fn delete_step(&self) -> Step {
        step(["realm".to_string(), "delete".to_string(), self.realm_flag()])
    }

    /// `realm default`, promoting an existing realm.
    pub fn default_step(&self) -> Step {
        step(["realm".to_string(), "default".to_string(), self.realm_flag()])
    }

    fn checks_default(&self) -> bool {
        self.state == Ensure::Present && self.default
    }
}

impl Resource for Realm {
    type State = RealmState;

    fn id(&self) -> String {
        self.name.clone()
    }

    fn resource_type(&self) -> &'static str {
        "realm"
    }

    fn tool(&self) -> Tool {
        Tool::RadosgwAdmin
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("realm", &self.name, "realm name is empty"));
        }
        Ok(())
    }

    fn probes(&self) -> Vec<Probe> {
        let mut probes = vec![Probe::new(self.get_step(), REALM_NOT_FOUND)];
        if self.checks_default() {
            probes.push(Probe::new(["realm", "list", "--format=json"], &[]));
        }
        probes
    }

    fn observe(&self, outputs: &[ProbeOutput]) -> Result<Observed<RealmState>> {
        let realm = match outputs.first() {
            Some(output) => output.parse::<RealmGet>("realm get")?,
            None => return Err(Error::probe("realm get produced no output")),
        };

        let Some(realm) = realm else {
            return Ok(Observed::NotFound);
        };

        let default_id = match outputs.get(1) {
            Some(output) => output
                .parse::<RealmList>("realm list")?
                .and_then(|list| list.default_info),
            None => None,
        };

        Ok(Observed::Present(RealmState {
            is_default: default_id.is_some_and(|id| !id.is_empty() && id == realm.id),
            id: realm.id,
        }))
    }

    fn plan(&self, observed: &Observed<RealmState>) -> Result<Vec<Step>> {
        Ok(match (self.state, observed) {
            (Ensure::Info, _) => Vec::new(),
            (Ensure::Present, Observed::Present(current)) => {
                if self.default && !current.is_default {
                    vec![self.default_step()]
                } else {
                    Vec::new()
                }
            }
            (Ensure::Present, _) => vec![self.create_step()],
            (Ensure::Absent, Observed::NotFound) => Vec::new(),
            (Ensure::Absent, _) => vec![self.delete_step()],
        })
    }
}
