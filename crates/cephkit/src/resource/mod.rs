//! Resource kinds and the trait the reconciler drives them through.
//!
//! Every kind answers three questions:
//! - how to look at current state ([`Resource::probes`])
//! - what that state is ([`Resource::observe`])
//! - which mutating commands close the gap ([`Resource::plan`])
//!
//! [`DesiredState`] is the closed set of kinds callers can ask for.

use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod admin;
pub mod caps;
pub mod mgr_module;
pub mod quota;
pub mod realm;
pub mod zap;

pub use admin::AdminCommand;
pub use caps::{CapSet, CapabilityGrant};
pub use mgr_module::MgrModule;
pub use quota::{QuotaScope, UserQuota};
pub use realm::Realm;
pub use zap::ZapTarget;

/// Sub-command path plus arguments for one mutating step.
pub type Step = Vec<String>;

/// Whether a resource should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ensure {
    /// Create or converge
    #[default]
    Present,
    /// Remove
    Absent,
    /// Only report current state
    Info,
}

/// A read-only query and the exit codes that mean "does not exist".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Sub-command path plus arguments
    pub args: Step,
    /// Exit codes translated to [`ProbeOutput::NotFound`]
    pub not_found: &'static [i32],
}

impl Probe {
    /// Probe with the given args and not-found codes.
    pub fn new<I, S>(args: I, not_found: &'static [i32]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            not_found,
        }
    }
}

/// Parsed result of one probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutput {
    /// The probe reported the entity missing
    NotFound,
    /// The probe's JSON output
    Json(Value),
}

impl ProbeOutput {
    /// Deserialize into `T`, rejecting missing keys as a probe error.
    pub fn parse<T: serde::de::DeserializeOwned>(&self, what: &str) -> Result<Option<T>> {
        match self {
            ProbeOutput::NotFound => Ok(None),
            ProbeOutput::Json(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| Error::probe(format!("unexpected {what} output: {e}"))),
        }
    }
}

/// Observed state of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed<T> {
    /// The kind has no probe step
    Unprobed,
    /// The entity does not exist
    NotFound,
    /// The entity exists with this state
    Present(T),
}

/// A resource kind the reconciler can converge.
pub trait Resource {
    /// Comparable subset of probe output
    type State;

    /// Identity of the resource (user id, realm name, device path)
    fn id(&self) -> String;

    /// Short type name used in logs and errors
    fn resource_type(&self) -> &'static str;

    /// Tool every probe and step of this kind runs through
    fn tool(&self) -> Tool;

    /// Reject desired states that cannot be synthesized.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Read-only queries; empty means no probe step.
    ///
    /// The first probe is the primary one: its output is reported when the
    /// resource is already in the desired state.
    fn probes(&self) -> Vec<Probe> {
        Vec::new()
    }

    /// Interpret probe outputs, one per entry in [`Resource::probes`].
    fn observe(&self, _outputs: &[ProbeOutput]) -> Result<Observed<Self::State>> {
        Ok(Observed::Unprobed)
    }

    /// Mutating steps needed to reach desired state; empty when satisfied.
    fn plan(&self, observed: &Observed<Self::State>) -> Result<Vec<Step>>;
}

/// The closed set of resource kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DesiredState {
    /// RADOS gateway user capabilities
    Caps(CapabilityGrant),
    /// RADOS gateway realm
    Realm(Realm),
    /// RADOS gateway user or bucket quota
    Quota(UserQuota),
    /// Manager module enablement
    MgrModule(MgrModule),
    /// Device zap
    Zap(ZapTarget),
    /// Pass-through admin command
    Admin(AdminCommand),
}

impl DesiredState {
    /// Identity of the wrapped resource.
    pub fn id(&self) -> String {
        match self {
            DesiredState::Caps(r) => r.id(),
            DesiredState::Realm(r) => r.id(),
            DesiredState::Quota(r) => r.id(),
            DesiredState::MgrModule(r) => r.id(),
            DesiredState::Zap(r) => r.id(),
            DesiredState::Admin(r) => r.id(),
        }
    }

    /// Type name of the wrapped resource.
    pub fn resource_type(&self) -> &'static str {
        match self {
            DesiredState::Caps(r) => r.resource_type(),
            DesiredState::Realm(r) => r.resource_type(),
            DesiredState::Quota(r) => r.resource_type(),
            DesiredState::MgrModule(r) => r.resource_type(),
            DesiredState::Zap(r) => r.resource_type(),
            DesiredState::Admin(r) => r.resource_type(),
        }
    }

    /// Whether running this resource is destructive.
    pub fn is_destructive(&self) -> bool {
        match self {
            DesiredState::Zap(_) => true,
            DesiredState::Realm(r) => r.state == Ensure::Absent,
            _ => false,
        }
    }
}

/// Split `values` into owned strings.
pub(crate) fn step<I, S>(values: I) -> Step
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}
