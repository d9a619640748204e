//! RADOS gateway user and bucket quotas.
//!
//! Limits and the enabled flag are separate sub-commands, so a single
//! reconciliation may need `quota set` followed by `quota enable`.

use super::{Ensure, Observed, Probe, ProbeOutput, Resource, Step, step};
use crate::command::Tool;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Exit codes `user info` uses for an unknown uid.
const USER_NOT_FOUND: &[i32] = &[22, 2];

/// Which quota of a user to manage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaScope {
    /// Quota across all of a user's buckets
    #[default]
    User,
    /// Per-bucket quota applied to each of a user's buckets
    Bucket,
}

impl QuotaScope {
    fn as_str(self) -> &'static str {
        match self {
            QuotaScope::User => "user",
            QuotaScope::Bucket => "bucket",
        }
    }
}

fn default_true() -> bool {
    true
}

/// Desired quota for a gateway user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
    /// User id
    pub uid: String,
    /// User or bucket quota
    #[serde(default)]
    pub scope: QuotaScope,
    /// Whether the quota is enforced
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Object limit; `-1` for unlimited, `None` to leave untouched
    #[serde(default)]
    pub max_objects: Option<i64>,
    /// Size limit in bytes; `-1` for unlimited, `None` to leave untouched
    #[serde(default)]
    pub max_size: Option<i64>,
    /// `absent` disables the quota
    #[serde(default)]
    pub state: Ensure,
}

/// Quota as reported by `user info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuotaState {
    /// Whether the quota is enforced
    pub enabled: bool,
    /// Object limit
    pub max_objects: i64,
    /// Size limit in bytes
    pub max_size: i64,
}

#[derive(Deserialize)]
struct UserInfo {
    user_quota: QuotaState,
    bucket_quota: QuotaState,
}

impl UserQuota {
    /// Enabled quota for `uid` with no limits changed.
    pub fn new(uid: &str, scope: QuotaScope) -> Self {
        Self {
            uid: uid.to_string(),
            scope,
            enabled: true,
            max_objects: None,
            max_size: None,
            state: Ensure::Present,
        }
    }

    /// Set the object limit.
    pub fn max_objects(mut self, n: i64) -> Self {
        self.max_objects = Some(n);
        self
    }

    /// Set the size limit.
    pub fn max_size(mut self, bytes: i64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Keep the limits but leave enforcement off.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn scope_args(&self) -> [String; 2] {
        [
            format!("--quota-scope={}", self.scope.as_str()),
            format!("--uid={}", self.uid),
        ]
    }

    fn has_limits(&self) -> bool {
        self.max_objects.is_some() || self.max_size.is_some()
    }

    /// `quota set` with the requested limits.
    pub fn set_step(&self) -> Step {
        let mut args = step(["quota", "set"]);
        args.extend(self.scope_args());
        if let Some(n) = self.max_objects {
            args.push(format!("--max-objects={n}"));
        }
        if let Some(n) = self.max_size {
            args.push(format!("--max-size={n}"));
        }
        args
    }

    /// `quota enable` or `quota disable`.
    pub fn toggle_step(&self, enable: bool) -> Step {
        let mut args = step(["quota", if enable { "enable" } else { "disable" }]);
        args.extend(self.scope_args());
        args
    }

    fn limits_differ(&self, current: &QuotaState) -> bool {
        self.max_objects.is_some_and(|n| n != current.max_objects)
            || self.max_size.is_some_and(|n| n != current.max_size)
    }
}

impl Resource for UserQuota {
    type State = QuotaState;

    fn id(&self) -> String {
        format!("{}/{}", self.uid, self.scope.as_str())
    }

    fn resource_type(&self) -> &'static str {
        "quota"
    }

    fn tool(&self) -> Tool {
        Tool::RadosgwAdmin
    }

    fn validate(&self) -> Result<()> {
        if self.uid.trim().is_empty() {
            return Err(Error::invalid("quota", &self.uid, "user id is empty"));
        }
        for (name, value) in [("max_objects", self.max_objects), ("max_size", self.max_size)] {
            if value.is_some_and(|v| v < -1) {
                return Err(Error::invalid(
                    "quota",
                    &self.uid,
                    format!("{name} must be -1 or greater"),
                ));
            }
        }
        Ok(())
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            [
                "user".to_string(),
                "info".to_string(),
                format!("--uid={}", self.uid),
                "--format=json".to_string(),
            ],
            USER_NOT_FOUND,
        )]
    }

    fn observe(&self, outputs: &[ProbeOutput]) -> Result<Observed<QuotaState>> {
        let info = match outputs.first() {
            Some(output) => output.parse::<UserInfo>("user info")?,
            None => return Err(Error::probe("user info produced no output")),
        };

        Ok(match info {
            None => Observed::NotFound,
            Some(info) => Observed::Present(match self.scope {
                QuotaScope::User => info.user_quota,
                QuotaScope::Bucket => info.bucket_quota,
            }),
        })
    }

    fn plan(&self, observed: &Observed<QuotaState>) -> Result<Vec<Step>> {
        let mut steps = Vec::new();
        match (self.state, observed) {
            (Ensure::Info, _) => {}
            (Ensure::Absent, Observed::Present(current)) => {
                if current.enabled {
                    steps.push(self.toggle_step(false));
                }
            }
            (Ensure::Absent, _) => {}
            (Ensure::Present, Observed::Present(current)) => {
                if self.limits_differ(current) {
                    steps.push(self.set_step());
                }
                if self.enabled != current.enabled {
                    steps.push(self.toggle_step(self.enabled));
                }
            }
            (Ensure::Present, _) => {
                if self.has_limits() {
                    steps.push(self.set_step());
                }
                steps.push(self.toggle_step(self.enabled));
            }
        }
        Ok(steps)
    }
}
