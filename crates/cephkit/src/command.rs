//! Command synthesis.
//!
//! Turns an [`ExecutionContext`], the tool's cluster flags and a sub-command
//! into the literal argument vector handed to the process boundary. Token
//! order is part of the contract: callers and tests compare whole vectors.

use crate::context::ExecutionContext;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bind mounts every containerized invocation gets.
pub const CONTAINER_MOUNTS: [&str; 3] = [
    "/etc/ceph:/etc/ceph:z",
    "/var/lib/ceph/:/var/lib/ceph/:z",
    "/var/log/ceph/:/var/log/ceph/:z",
];

/// Admin tools the synthesizer knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// The `ceph` monitor CLI
    #[default]
    Ceph,
    /// The RADOS gateway admin CLI
    RadosgwAdmin,
    /// The OSD volume tool
    CephVolume,
}

impl Tool {
    /// Executable name.
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Ceph => "ceph",
            Tool::RadosgwAdmin => "radosgw-admin",
            Tool::CephVolume => "ceph-volume",
        }
    }

    /// Flags identifying the cluster (and identity) a command targets.
    pub fn cluster_flags(&self, cluster: &Cluster) -> Vec<String> {
        match self {
            Tool::Ceph => {
                let mut flags = Vec::with_capacity(6);
                if let Some(auth) = &cluster.auth {
                    flags.extend([
                        "-n".to_string(),
                        auth.entity.clone(),
                        "-k".to_string(),
                        auth.keyring_path(&cluster.name),
                    ]);
                }
                flags.extend(["--cluster".to_string(), cluster.name.clone()]);
                flags
            }
            Tool::RadosgwAdmin => vec!["--cluster".to_string(), cluster.name.clone()],
            Tool::CephVolume => Vec::new(),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Identity used for authenticated `ceph` calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    /// Entity name, e.g. `client.admin`
    pub entity: String,
    /// Keyring path; defaults to `/etc/ceph/<cluster>.<entity>.keyring`
    #[serde(default)]
    pub keyring: Option<String>,
}

impl Auth {
    /// Keyring path for this entity in `cluster`.
    pub fn keyring_path(&self, cluster: &str) -> String {
        self.keyring
            .clone()
            .unwrap_or_else(|| format!("/etc/ceph/{}.{}.keyring", cluster, self.entity))
    }
}

/// Target cluster for every synthesized command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster name passed as `--cluster`
    #[serde(default = "default_cluster_name")]
    pub name: String,
    /// Optional identity for authenticated calls
    #[serde(default)]
    pub auth: Option<Auth>,
}

fn default_cluster_name() -> String {
    "ceph".to_string()
}

impl Default for Cluster {
    fn default() -> Self {
        Self {
            name: default_cluster_name(),
            auth: None,
        }
    }
}

impl Cluster {
    /// Cluster with the given name and no auth.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auth: None,
        }
    }

    /// Attach an authenticated identity.
    pub fn with_auth(mut self, entity: &str, keyring: Option<&str>) -> Self {
        self.auth = Some(Auth {
            entity: entity.to_string(),
            keyring: keyring.map(str::to_string),
        });
        self
    }
}

/// A fully resolved argument vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommandPlan(Vec<String>);

impl CommandPlan {
    /// All tokens, program first.
    pub fn argv(&self) -> &[String] {
        &self.0
    }

    /// The executable (first token).
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Everything after the program.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// Whether no command was planned.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for CommandPlan {
    fn from(argv: Vec<String>) -> Self {
        Self(argv)
    }
}

impl fmt::Display for CommandPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

/// Build the argument vector for `subcommand` under `ctx`.
///
/// `subcommand` is the sub-command path followed by its arguments; both are
/// appended verbatim after the cluster flags.
pub fn build<I, S>(ctx: &ExecutionContext, cluster_flags: &[String], subcommand: I) -> CommandPlan
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut argv = match ctx.container() {
        Some(container) => {
            let mut prefix = vec![
                container.runtime.clone(),
                "run".to_string(),
                "--rm".to_string(),
                "--net=host".to_string(),
            ];
            for mount in CONTAINER_MOUNTS {
                prefix.push("-v".to_string());
                prefix.push(mount.to_string());
            }
            prefix.push(format!("--entrypoint={}", ctx.binary()));
            prefix.push(container.image.clone());
            prefix
        }
        None => vec![ctx.binary().to_string()],
    };

    argv.extend_from_slice(cluster_flags);
    argv.extend(subcommand.into_iter().map(Into::into));
    CommandPlan(argv)
}

/// Build for `tool`, deriving the context entrypoint and cluster flags.
pub fn build_for_tool<I, S>(
    ctx: &ExecutionContext,
    cluster: &Cluster,
    tool: Tool,
    subcommand: I,
) -> CommandPlan
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    build(
        &ctx.for_binary(tool.binary()),
        &tool.cluster_flags(cluster),
        subcommand,
    )
}
