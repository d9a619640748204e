//! RADOS gateway user capabilities.
//!
//! Capabilities are compared as an unordered set: each cap type maps to a
//! set of permissions, case-insensitive, with `*` meaning read and write.
//! A user converges to exactly the desired set. `caps add` merges
//! permissions, so differing types are removed before the desired ones
//! are added.

use super::{Ensure, Observed, Probe, ProbeOutput, Resource, Step, step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Exit codes `user info` uses for an unknown uid.
const USER_NOT_FOUND: &[i32] = &[22, 2];

/// Desired capabilities for a gateway user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityGrant {
    /// User id
    pub name: String,
    /// `type=perm` entries, in caller order
    pub caps: Vec<String>,
    /// Grant or revoke
    #[serde(default)]
    pub state: Ensure,
}

/// Normalized capability set: type → permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapSet(BTreeMap<String, BTreeSet<String>>);

impl CapSet {
    /// Parse `type=perm[,perm]` entries.
    pub fn parse<I, S>(entries: I) -> std::result::Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for entry in entries {
            let (kind, perms) = parse_cap(entry.as_ref())?;
            set.0.entry(kind).or_default().extend(perms);
        }
        Ok(set)
    }

    /// Permissions granted for `kind`.
    pub fn get(&self, kind: &str) -> Option<&BTreeSet<String>> {
        self.0.get(kind)
    }

    /// Cap types in the set.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn render(kind: &str, perms: &BTreeSet<String>) -> String {
        let perm = if perms.contains("read") && perms.contains("write") && perms.len() == 2 {
            "*".to_string()
        } else {
            perms.iter().cloned().collect::<Vec<_>>().join(",")
        };
        format!("{kind}={perm}")
    }
}

fn parse_cap(entry: &str) -> std::result::Result<(String, BTreeSet<String>), String> {
    let (kind, perms) = entry
        .split_once('=')
        .ok_or_else(|| format!("cap '{entry}' is not of the form type=perm"))?;

    let kind = kind.trim().to_lowercase();
    if kind.is_empty() {
        return Err(format!("cap '{entry}' has an empty type"));
    }

    let mut set = BTreeSet::new();
    for perm in perms.split(',').map(|p| p.trim().to_lowercase()) {
        match perm.as_str() {
            "" => {}
            "*" => {
                set.insert("read".to_string());
                set.insert("write".to_string());
            }
            _ => {
                set.insert(perm);
            }
        }
    }

    if set.is_empty() {
        return Err(format!("cap '{entry}' has no permissions"));
    }
    Ok((kind, set))
}

#[derive(Deserialize)]
struct UserInfo {
    caps: Vec<CapEntry>,
}

#[derive(Deserialize)]
struct CapEntry {
    #[serde(rename = "type")]
    kind: String,
    perm: String,
}

impl CapabilityGrant {
    /// Grant `caps` to `name`.
    pub fn new<I, S>(name: &str, caps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            caps: caps.into_iter().map(Into::into).collect(),
            state: Ensure::Present,
        }
    }

    /// Revoke instead of grant.
    pub fn absent(mut self) -> Self {
        self.state = Ensure::Absent;
        self
    }

    fn desired(&self) -> Result<CapSet> {
        CapSet::parse(&self.caps).map_err(|msg| Error::invalid("caps", &self.name, msg))
    }

    fn caps_step(&self, subcommand: &str, caps: &[String]) -> Step {
        step([
            "caps".to_string(),
            subcommand.to_string(),
            format!("--uid={}", self.name),
            format!("--caps={}", caps.join(";")),
        ])
    }

    /// `caps add` for this grant's caps, in caller order.
    pub fn add_step(&self) -> Step {
        self.caps_step("add", &self.caps)
    }

    /// `caps rm` for this grant's caps, in caller order.
    pub fn rm_step(&self) -> Step {
        self.caps_step("rm", &self.caps)
    }

    /// Caller entries whose type appears in `kinds`, in caller order.
    fn entries_for(&self, kinds: &BTreeSet<String>) -> Vec<String> {
        self.caps
            .iter()
            .filter(|entry| {
                parse_cap(entry)
                    .map(|(kind, _)| kinds.contains(&kind))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn converge(&self, desired: &CapSet, current: &CapSet) -> Vec<Step> {
        if desired == current {
            return Vec::new();
        }

        let stale: Vec<String> = current
            .0
            .iter()
            .filter(|(kind, perms)| desired.get(kind) != Some(*perms))
            .map(|(kind, perms)| CapSet::render(kind, perms))
            .collect();

        let missing: BTreeSet<String> = desired
            .0
            .iter()
            .filter(|(kind, perms)| current.get(kind) != Some(*perms))
            .map(|(kind, _)| kind.clone())
            .collect();

        let mut steps = Vec::with_capacity(2);
        if !stale.is_empty() {
            steps.push(self.caps_step("rm", &stale));
        }
        if !missing.is_empty() {
            steps.push(self.caps_step("add", &self.entries_for(&missing)));
        }
        steps
    }

    fn revoke(&self, desired: &CapSet, current: &CapSet) -> Vec<Step> {
        let granted: BTreeSet<String> = desired
            .0
            .iter()
            .filter(|(kind, perms)| {
                current
                    .get(kind)
                    .is_some_and(|have| !have.is_disjoint(perms))
            })
            .map(|(kind, _)| kind.clone())
            .collect();

        if granted.is_empty() {
            Vec::new()
        } else {
            vec![self.caps_step("rm", &self.entries_for(&granted))]
        }
    }
}

impl Resource for CapabilityGrant {
    type State = CapSet;

    fn id(&self) -> String {
        self.name.clone()
    }

    fn resource_type(&self) -> &'static str {
        "caps"
    }

    fn tool(&self) -> Tool {
        Tool::RadosgwAdmin
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("caps", &self.name, "user id is empty"));
        }
        if self.caps.is_empty() && self.state != Ensure::Info {
            return Err(Error::invalid("caps", &self.name, "no caps given"));
        }
        self.desired().map(|_| ())
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            [
                "user".to_string(),
                "info".to_string(),
                format!("--uid={}", self.name),
                "--format=json".to_string(),
            ],
            USER_NOT_FOUND,
        )]
    }

    fn observe(&self, outputs: &[ProbeOutput]) -> Result<Observed<CapSet>> {
        let info = match outputs.first() {
            Some(output) => output.parse::<UserInfo>("user info")?,
            None => return Err(Error::probe("user info produced no output")),
        };

        let Some(info) = info else {
            return Ok(Observed::NotFound);
        };

        let entries: Vec<String> = info
            .caps
            .iter()
            .map(|c| format!("{}={}", c.kind, c.perm))
            .collect();
        CapSet::parse(&entries)
            .map(Observed::Present)
            .map_err(|msg| Error::probe(format!("user info returned a bad cap: {msg}")))
    }

    fn plan(&self, observed: &Observed<CapSet>) -> Result<Vec<Step>> {
        let desired = self.desired()?;
        Ok(match (self.state, observed) {
            (Ensure::Info, _) => Vec::new(),
            (Ensure::Present, Observed::Present(current)) => self.converge(&desired, current),
            (Ensure::Present, _) => vec![self.add_step()],
            (Ensure::Absent, Observed::Present(current)) => self.revoke(&desired, current),
            (Ensure::Absent, Observed::NotFound) => Vec::new(),
            (Ensure::Absent, Observed::Unprobed) => vec![self.rm_step()],
        })
    }
}
