//! In-memory stand-in for the admin tools.
//!
//! Understands the sub-commands the resource kinds emit, keeps state
//! between calls and records every argv it receives.

use crate::command::CommandPlan;
use crate::error::{Error, Result};
use crate::runner::{RawOutput, Runner};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

const TOOLS: [&str; 3] = ["ceph", "radosgw-admin", "ceph-volume"];

#[derive(Debug, Clone, Copy)]
struct Quota {
    enabled: bool,
    max_objects: i64,
    max_size: i64,
}

impl Default for Quota {
    fn default() -> Self {
        Self {
            enabled: false,
            max_objects: -1,
            max_size: -1,
        }
    }
}

impl Quota {
    fn to_json(self) -> Value {
        json!({
            "enabled": self.enabled,
            "check_on_raw": false,
            "max_size": self.max_size,
            "max_size_kb": 0,
            "max_objects": self.max_objects,
        })
    }
}

#[derive(Debug, Default)]
struct User {
    caps: BTreeMap<String, BTreeSet<String>>,
    user_quota: Quota,
    bucket_quota: Quota,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<String, User>,
    realms: BTreeMap<String, String>,
    default_realm: Option<String>,
    always_on: BTreeSet<String>,
    enabled: BTreeSet<String>,
    disabled: BTreeSet<String>,
}

/// Fake cluster answering through the [`Runner`] seam.
#[derive(Debug, Default)]
pub struct FakeCluster {
    state: Mutex<State>,
    calls: Mutex<Vec<Vec<String>>>,
    failures: Mutex<Vec<(Vec<String>, RawOutput)>>,
    unspawnable: Mutex<BTreeSet<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        let cluster = Self::default();
        {
            let mut state = cluster.state.lock().unwrap();
            state.always_on.extend(["balancer".into(), "crash".into()]);
            state.disabled.extend(["dashboard".into(), "alerts".into()]);
        }
        cluster
    }

    pub fn with_user(self, uid: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(uid.to_string(), User::default());
        self
    }

    pub fn with_realm(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .realms
            .insert(name.to_string(), format!("id-{name}"));
        self
    }

    /// Answer any sub-command starting with `prefix` with `output`.
    pub fn fail_on(self, prefix: &[&str], output: RawOutput) -> Self {
        self.failures
            .lock()
            .unwrap()
            .push((prefix.iter().map(|s| s.to_string()).collect(), output));
        self
    }

    /// Make `program` fail to start.
    pub fn unspawnable(self, program: &str) -> Self {
        self.unspawnable.lock().unwrap().insert(program.to_string());
        self
    }

    /// Every argv received so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Received argvs whose sub-command is not a read-only query.
    pub fn mutations(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|argv| {
                let (_, sub) = split(argv);
                !is_query(&sub)
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn caps_of(&self, uid: &str) -> BTreeMap<String, BTreeSet<String>> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(uid)
            .map(|u| u.caps.clone())
            .unwrap_or_default()
    }

    pub fn default_realm(&self) -> Option<String> {
        self.state.lock().unwrap().default_realm.clone()
    }

    pub fn has_realm(&self, name: &str) -> bool {
        self.state.lock().unwrap().realms.contains_key(name)
    }

    fn dispatch(&self, tool: &str, sub: &[&str]) -> RawOutput {
        let mut state = self.state.lock().unwrap();
        match (tool, sub) {
            ("radosgw-admin", ["user", "info", rest @ ..]) => {
                let uid = flag(rest, "--uid=");
                match state.users.get(uid) {
                    Some(user) => ok_json(&user_json(uid, user)),
                    None => not_found(22, "could not fetch user info: no user info saved"),
                }
            }
            ("radosgw-admin", ["caps", op @ ("add" | "rm"), rest @ ..]) => {
                let uid = flag(rest, "--uid=");
                let Some(user) = state.users.get_mut(uid) else {
                    return not_found(22, "could not modify user capabilities: no such user");
                };
                for entry in flag(rest, "--caps=").split(';') {
                    let Some((kind, perm)) = entry.split_once('=') else {
                        return RawOutput::new(22, "", "failed to parse caps");
                    };
                    let perms = expand(perm);
                    if *op == "add" {
                        user.caps.entry(kind.to_string()).or_default().extend(perms);
                    } else if let Some(have) = user.caps.get_mut(kind) {
                        have.retain(|p| !perms.contains(p));
                        if have.is_empty() {
                            user.caps.remove(kind);
                        }
                    }
                }
                ok_json(&user_json(uid, user))
            }
            ("radosgw-admin", ["realm", "get", rest @ ..]) => {
                let name = flag(rest, "--rgw-realm=");
                match state.realms.get(name) {
                    Some(id) => ok_json(&json!({"id": id, "name": name, "epoch": 1})),
                    None => not_found(2, "failed to init realm: (2) No such file or directory"),
                }
            }
            ("radosgw-admin", ["realm", "list", ..]) => ok_json(&json!({
                "default_info": state.default_realm.clone().unwrap_or_default(),
                "realms": state.realms.keys().collect::<Vec<_>>(),
            })),
            ("radosgw-admin", ["realm", "create", rest @ ..]) => {
                let name = flag(rest, "--rgw-realm=").to_string();
                if state.realms.contains_key(&name) {
                    return RawOutput::new(
                        17,
                        "",
                        &format!("ERROR: couldn't create realm {name}: (17) File exists\n"),
                    );
                }
                let id = format!("id-{name}");
                if rest.contains(&"--default") {
                    state.default_realm = Some(id.clone());
                }
                state.realms.insert(name.clone(), id.clone());
                ok_json(&json!({"id": id, "name": name}))
            }
            ("radosgw-admin", ["realm", "default", rest @ ..]) => {
                match state.realms.get(flag(rest, "--rgw-realm=")).cloned() {
                    Some(id) => {
                        state.default_realm = Some(id);
                        RawOutput::new(0, "", "")
                    }
                    None => not_found(2, "failed to init realm"),
                }
            }
            ("radosgw-admin", ["realm", "delete", rest @ ..]) => {
                match state.realms.remove(flag(rest, "--rgw-realm=")) {
                    Some(id) => {
                        if state.default_realm.as_ref() == Some(&id) {
                            state.default_realm = None;
                        }
                        RawOutput::new(0, "", "")
                    }
                    None => not_found(2, "failed to init realm"),
                }
            }
            ("radosgw-admin", ["quota", op @ ("set" | "enable" | "disable"), rest @ ..]) => {
                let Some(user) = state.users.get_mut(flag(rest, "--uid=")) else {
                    return not_found(22, "no such user");
                };
                let quota = if flag(rest, "--quota-scope=") == "bucket" {
                    &mut user.bucket_quota
                } else {
                    &mut user.user_quota
                };
                match *op {
                    "enable" => quota.enabled = true,
                    "disable" => quota.enabled = false,
                    _ => {
                        if let Ok(n) = flag(rest, "--max-objects=").parse() {
                            quota.max_objects = n;
                        }
                        if let Ok(n) = flag(rest, "--max-size=").parse() {
                            quota.max_size = n;
                        }
                    }
                }
                RawOutput::new(0, "", "")
            }
            ("ceph", ["mgr", "module", "ls", ..]) => ok_json(&json!({
                "always_on_modules": state.always_on,
                "enabled_modules": state.enabled,
                "disabled_modules": state
                    .disabled
                    .iter()
                    .map(|name| json!({"name": name, "can_run": true, "error_string": ""}))
                    .collect::<Vec<_>>(),
            })),
            ("ceph", ["mgr", "module", "enable", name]) => {
                let name = name.to_string();
                if !state.always_on.contains(&name) {
                    state.disabled.remove(&name);
                    state.enabled.insert(name);
                }
                RawOutput::new(0, "", "")
            }
            ("ceph", ["mgr", "module", "disable", name]) => {
                let name = name.to_string();
                if state.enabled.remove(&name) {
                    state.disabled.insert(name);
                }
                RawOutput::new(0, "", "")
            }
            ("ceph", ["health", ..]) => RawOutput::new(0, "HEALTH_OK\n", ""),
            ("ceph-volume", ["lvm", "zap", target, ..]) => RawOutput::new(
                0,
                &format!("--> Zapping successful for: {target}\n"),
                "",
            ),
            _ => RawOutput::new(1, "", &format!("unknown command: {}\n", sub.join(" "))),
        }
    }
}

impl Runner for FakeCluster {
    fn run(&self, plan: &CommandPlan) -> Result<RawOutput> {
        let argv = plan.argv().to_vec();
        self.calls.lock().unwrap().push(argv.clone());

        let (tool, sub) = split(&argv);
        if self.unspawnable.lock().unwrap().contains(tool) {
            return Err(Error::Spawn {
                program: tool.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let injected = self
            .failures
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| sub.len() >= prefix.len() && sub[..prefix.len()] == prefix[..])
            .map(|(_, output)| output.clone());
        if let Some(output) = injected {
            return Ok(output);
        }

        Ok(self.dispatch(tool, &sub))
    }
}

/// Split an argv into the tool name and the sub-command after cluster flags.
fn split(argv: &[String]) -> (&str, Vec<&str>) {
    let mut rest = argv.iter().map(String::as_str);
    let mut tool = rest.next().unwrap_or_default();

    if !TOOLS.contains(&tool) {
        // container runtime: skip to the entrypoint and the image after it
        for token in rest.by_ref() {
            if let Some(entrypoint) = token.strip_prefix("--entrypoint=") {
                tool = entrypoint;
                break;
            }
        }
        rest.next();
    }

    let mut sub: Vec<&str> = rest.collect();
    while matches!(sub.first(), Some(&("--cluster" | "-n" | "-k"))) {
        let n = sub.len().min(2);
        sub.drain(..n);
    }
    (tool, sub)
}

fn is_query(sub: &[&str]) -> bool {
    matches!(
        sub,
        ["user", "info", ..] | ["realm", "get" | "list", ..] | ["mgr", "module", "ls", ..]
    )
}

fn flag<'a>(args: &[&'a str], prefix: &str) -> &'a str {
    args.iter()
        .find_map(|a| a.strip_prefix(prefix))
        .unwrap_or_default()
}

fn expand(perm: &str) -> BTreeSet<String> {
    perm.split(',')
        .flat_map(|p| match p.trim() {
            "*" => vec!["read".to_string(), "write".to_string()],
            p => vec![p.to_string()],
        })
        .collect()
}

fn user_json(uid: &str, user: &User) -> Value {
    let caps: Vec<Value> = user
        .caps
        .iter()
        .map(|(kind, perms)| {
            let perm = if perms.len() == 2 && perms.contains("read") && perms.contains("write") {
                "*".to_string()
            } else {
                perms.iter().cloned().collect::<Vec<_>>().join(",")
            };
            json!({"type": kind, "perm": perm})
        })
        .collect();

    json!({
        "user_id": uid,
        "display_name": uid,
        "suspended": 0,
        "caps": caps,
        "user_quota": user.user_quota.to_json(),
        "bucket_quota": user.bucket_quota.to_json(),
    })
}

fn ok_json(value: &Value) -> RawOutput {
    RawOutput::new(0, &format!("{value:#}\n"), "")
}

fn not_found(rc: i32, stderr: &str) -> RawOutput {
    RawOutput::new(rc, "", &format!("{stderr}\n"))
}
