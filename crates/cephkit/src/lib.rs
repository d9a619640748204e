//! # cephkit
//!
//! Declarative reconciliation for Ceph admin tooling.
//!
//! This crate provides functionality for:
//! - Resolving whether `ceph`, `radosgw-admin` and `ceph-volume` run on the
//!   host or inside a container
//! - Building exact argument vectors for each resource kind
//! - Probing current state and skipping work that is already done
//! - Reporting every outcome in one structured shape
//!
//! ## Example
//!
//! ```no_run
//! use cephkit::{Client, Cluster, ContainerSettings, DesiredState, Realm};
//!
//! let client = Client::new(Cluster::default(), &ContainerSettings::from_env())
//!     .expect("invalid container settings");
//!
//! let realm = DesiredState::Realm(Realm::new("gold").as_default());
//! let result = client.reconcile(&realm, false);
//! println!("changed={} failed={}", result.changed, result.failed);
//! ```
//!
//! ## Check-mode
//!
//! Passing `check_mode = true` still runs read-only probes, so `changed`
//! predicts what a real run would do, but never runs a mutating command.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod context;
pub mod error;
pub mod reconcile;
pub mod report;
pub mod resource;
pub mod runner;

#[cfg(test)]
mod testing;

pub use command::{CommandPlan, Cluster, Tool};
pub use context::{ContainerSettings, ExecutionContext};
pub use error::{Error, Result};
pub use reconcile::Reconciler;
pub use report::InvocationResult;
pub use resource::{
    AdminCommand, CapabilityGrant, DesiredState, Ensure, MgrModule, QuotaScope, Realm,
    UserQuota, ZapTarget,
};
pub use runner::{RawOutput, Runner, SystemRunner};

use resource::Resource;

/// High-level client for reconciling resources against one cluster.
///
/// The client wraps a runner and provides one entry point,
/// [`Client::reconcile`], for every resource kind.
pub struct Client {
    cluster: Cluster,
    context: ExecutionContext,
    runner: Box<dyn Runner>,
}

impl Client {
    /// Create a client that spawns real processes.
    ///
    /// Returns an error if the container settings are malformed.
    pub fn new(cluster: Cluster, settings: &ContainerSettings) -> Result<Self> {
        let context = ExecutionContext::from_settings(Tool::Ceph.binary(), settings)?;
        Ok(Self {
            cluster,
            context,
            runner: Box::new(SystemRunner),
        })
    }

    /// Create a client with container settings read from the environment.
    pub fn from_env(cluster: Cluster) -> Result<Self> {
        Self::new(cluster, &ContainerSettings::from_env())
    }

    /// Replace the runner (useful for testing).
    pub fn with_runner(mut self, runner: Box<dyn Runner>) -> Self {
        self.runner = runner;
        self
    }

    /// Target cluster.
    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Resolved execution context.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Bring one resource to its desired state.
    ///
    /// Never returns an error: failures are reported through
    /// [`InvocationResult::failed`].
    pub fn reconcile(&self, desired: &DesiredState, check_mode: bool) -> InvocationResult {
        let reconciler = Reconciler::new(self.runner.as_ref(), &self.cluster, &self.context);
        match desired {
            DesiredState::Caps(r) => reconciler.reconcile(r, check_mode),
            DesiredState::Realm(r) => reconciler.reconcile(r, check_mode),
            DesiredState::Quota(r) => reconciler.reconcile(r, check_mode),
            DesiredState::MgrModule(r) => reconciler.reconcile(r, check_mode),
            DesiredState::Zap(r) => reconciler.reconcile(r, check_mode),
            DesiredState::Admin(r) => reconciler.reconcile(r, check_mode),
        }
    }

    /// Argument vectors of the mutating steps `desired` needs from a clean slate.
    ///
    /// Runs nothing. Useful to show what a resource translates to.
    pub fn commands_for(&self, desired: &DesiredState) -> Result<Vec<CommandPlan>> {
        let reconciler = Reconciler::new(self.runner.as_ref(), &self.cluster, &self.context);
        match desired {
            DesiredState::Caps(r) => commands(&reconciler, r),
            DesiredState::Realm(r) => commands(&reconciler, r),
            DesiredState::Quota(r) => commands(&reconciler, r),
            DesiredState::MgrModule(r) => commands(&reconciler, r),
            DesiredState::Zap(r) => commands(&reconciler, r),
            DesiredState::Admin(r) => commands(&reconciler, r),
        }
    }
}

fn commands<R: Resource>(reconciler: &Reconciler<'_>, resource: &R) -> Result<Vec<CommandPlan>> {
    resource.validate()?;
    let observed = if resource.probes().is_empty() {
        resource::Observed::Unprobed
    } else {
        resource::Observed::NotFound
    };
    Ok(resource
        .plan(&observed)?
        .iter()
        .map(|step| reconciler.command(resource, step))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCluster;
    use std::sync::Arc;

    /// Lets a test keep a handle on the fake after boxing it into a client.
    struct Shared(Arc<FakeCluster>);

    impl Runner for Shared {
        fn run(&self, plan: &CommandPlan) -> Result<RawOutput> {
            self.0.run(plan)
        }
    }

    fn client(fake: FakeCluster) -> (Client, Arc<FakeCluster>) {
        client_with(fake, &ContainerSettings::default())
    }

    fn client_with(fake: FakeCluster, settings: &ContainerSettings) -> (Client, Arc<FakeCluster>) {
        let fake = Arc::new(fake);
        let client = Client::new(Cluster::default(), settings)
            .unwrap()
            .with_runner(Box::new(Shared(Arc::clone(&fake))));
        (client, fake)
    }

    fn argv(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn image() -> ContainerSettings {
        ContainerSettings {
            image: Some("docker.io/ceph/daemon:latest".into()),
            binary: None,
        }
    }

    #[test]
    fn test_first_token_follows_containerization() {
        let zap = DesiredState::Zap(ZapTarget::device("/dev/sdb"));

        let (bare, _) = client(FakeCluster::new());
        assert!(!bare.context().is_containerized());
        assert_eq!(bare.commands_for(&zap).unwrap()[0].program(), Some("ceph-volume"));

        let (podman, _) = client_with(FakeCluster::new(), &image());
        assert!(podman.context().is_containerized());
        assert_eq!(podman.commands_for(&zap).unwrap()[0].program(), Some("podman"));

        let docker = ContainerSettings {
            binary: Some("docker".into()),
            ..image()
        };
        let (docker, _) = client_with(FakeCluster::new(), &docker);
        assert_eq!(docker.commands_for(&zap).unwrap()[0].program(), Some("docker"));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let settings = ContainerSettings {
            image: Some(String::new()),
            binary: None,
        };
        let err = Client::new(Cluster::default(), &settings).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_caps_add_vector() {
        let (client, fake) = client(FakeCluster::new().with_user("foo"));
        let grant = DesiredState::Caps(CapabilityGrant::new(
            "foo",
            ["users=write", "zone=*", "metadata=read,write"],
        ));

        let expected = argv(&[
            "radosgw-admin",
            "--cluster",
            "ceph",
            "caps",
            "add",
            "--uid=foo",
            "--caps=users=write;zone=*;metadata=read,write",
        ]);
        assert_eq!(client.commands_for(&grant).unwrap()[0].argv(), expected);

        let result = client.reconcile(&grant, false);
        assert!(result.changed);
        assert!(!result.failed);
        assert_eq!(result.cmd.argv(), expected);
        assert_eq!(fake.mutations(), vec![expected]);
    }

    #[test]
    fn test_zap_vector() {
        let (client, fake) = client(FakeCluster::new());
        let zap = DesiredState::Zap(ZapTarget::logical_volume("data-vg", "data-lv").destroying());

        let result = client.reconcile(&zap, false);
        assert!(result.changed);
        assert_eq!(result.rc, Some(0));
        assert_eq!(
            result.cmd.argv(),
            argv(&["ceph-volume", "lvm", "zap", "data-vg/data-lv", "--destroy"])
        );
        assert_eq!(result.stdout, "--> Zapping successful for: data-vg/data-lv");

        // zap never short-circuits
        let again = client.reconcile(&zap, false);
        assert!(again.changed);
        assert_eq!(fake.mutations().len(), 2);
    }

    #[test]
    fn test_containerized_realm_create_vector() {
        let (client, fake) = client_with(FakeCluster::new(), &image());
        let realm = DesiredState::Realm(Realm::new("foo").as_default());

        let result = client.reconcile(&realm, false);
        assert!(result.changed);
        assert!(!result.failed);
        assert_eq!(
            result.cmd.argv(),
            argv(&[
                "podman",
                "run",
                "--rm",
                "--net=host",
                "-v",
                "/etc/ceph:/etc/ceph:z",
                "-v",
                "/var/lib/ceph/:/var/lib/ceph/:z",
                "-v",
                "/var/log/ceph/:/var/log/ceph/:z",
                "--entrypoint=radosgw-admin",
                "docker.io/ceph/daemon:latest",
                "--cluster",
                "ceph",
                "realm",
                "create",
                "--rgw-realm=foo",
                "--default",
            ])
        );
        assert_eq!(fake.default_realm().as_deref(), Some("id-foo"));
    }

    #[test]
    fn test_second_run_is_unchanged() {
        let (client, fake) = client(FakeCluster::new().with_user("foo"));
        let resources = [
            DesiredState::Realm(Realm::new("gold").as_default()),
            DesiredState::Caps(CapabilityGrant::new("foo", ["users=read", "buckets=*"])),
            DesiredState::Quota(UserQuota::new("foo", QuotaScope::Bucket).max_objects(100)),
            DesiredState::MgrModule(MgrModule::new("dashboard")),
        ];

        for desired in &resources {
            let first = client.reconcile(desired, false);
            assert!(first.changed, "{} should change", desired.resource_type());
            assert!(!first.failed, "{}: {:?}", desired.resource_type(), first.msg);
        }
        let after_first = fake.mutations().len();

        for desired in &resources {
            let second = client.reconcile(desired, false);
            assert!(!second.changed, "{} changed twice", desired.resource_type());
            assert!(!second.failed);
            assert_eq!(second.rc, Some(0));
        }
        assert_eq!(fake.mutations().len(), after_first);
    }

    #[test]
    fn test_caps_converge_in_any_order() {
        let (client, fake) = client(FakeCluster::new().with_user("foo"));
        client.reconcile(
            &DesiredState::Caps(CapabilityGrant::new("foo", ["users=read", "zone=*"])),
            false,
        );

        let reordered = DesiredState::Caps(CapabilityGrant::new("foo", ["zone=read,write", "users=read"]));
        assert!(!client.reconcile(&reordered, false).changed);

        let narrowed = DesiredState::Caps(CapabilityGrant::new("foo", ["users=read"]));
        assert!(client.reconcile(&narrowed, false).changed);
        assert_eq!(fake.caps_of("foo").keys().collect::<Vec<_>>(), vec!["users"]);
        assert!(!client.reconcile(&narrowed, false).changed);
    }

    #[test]
    fn test_check_mode_matches_real_run() {
        let resources = [
            DesiredState::Realm(Realm::new("gold").as_default()),
            DesiredState::Realm(Realm::new("silver").with_state(Ensure::Absent)),
            DesiredState::Caps(CapabilityGrant::new("foo", ["users=read"])),
            DesiredState::MgrModule(MgrModule::new("crash")),
            DesiredState::Zap(ZapTarget::device("/dev/sdb")),
            DesiredState::Admin(AdminCommand::new(Tool::Ceph, ["health"])),
        ];

        let (checked, checked_fake) = client(FakeCluster::new().with_user("foo").with_realm("silver"));
        let (real, _) = client(FakeCluster::new().with_user("foo").with_realm("silver"));

        for desired in &resources {
            let predicted = checked.reconcile(desired, true);
            let actual = real.reconcile(desired, false);
            assert_eq!(
                predicted.changed,
                actual.changed,
                "{} '{}'",
                desired.resource_type(),
                desired.id()
            );
            if predicted.changed {
                assert_eq!(predicted.rc, None);
                assert!(predicted.stdout.is_empty());
                assert_eq!(predicted.cmd, actual.cmd);
            }
        }
        assert!(checked_fake.mutations().is_empty());
        assert!(checked_fake.has_realm("silver"));
    }

    #[test]
    fn test_failed_mutation_keeps_output() {
        let fake = FakeCluster::new().fail_on(
            &["realm", "create"],
            RawOutput::new(
                17,
                "partial output\r\n",
                "ERROR: couldn't create realm foo: (17) File exists\n",
            ),
        );
        let (client, _) = client(fake);

        let result = client.reconcile(&DesiredState::Realm(Realm::new("foo")), false);
        assert!(result.failed);
        assert!(result.changed);
        assert_eq!(result.rc, Some(17));
        assert_eq!(result.stdout, "partial output");
        assert_eq!(
            result.stderr,
            "ERROR: couldn't create realm foo: (17) File exists"
        );
        assert!(matches!(
            result.error(),
            Some(Error::ExecutionFailure { rc: 17, .. })
        ));
    }

    #[test]
    fn test_missing_user_fails_through_the_tool() {
        let (client, _) = client(FakeCluster::new());
        let result = client.reconcile(
            &DesiredState::Caps(CapabilityGrant::new("ghost", ["users=read"])),
            false,
        );
        assert!(result.failed);
        assert_eq!(result.rc, Some(22));
    }

    #[test]
    fn test_admin_passes_through() {
        let (client, fake) = client(FakeCluster::new().with_realm("gold"));
        let cmd = DesiredState::Admin(
            AdminCommand::new(Tool::RadosgwAdmin, ["realm", "get"]).with_args(["--rgw-realm=gold"]),
        );
        let result = client.reconcile(&cmd, false);
        assert!(result.changed);
        assert!(!result.failed);
        assert_eq!(
            fake.calls()[0],
            argv(&["radosgw-admin", "--cluster", "ceph", "realm", "get", "--rgw-realm=gold"])
        );
    }

    #[test]
    fn test_auth_flags_for_ceph_tool() {
        let fake = Arc::new(FakeCluster::new());
        let client = Client::new(
            Cluster::named("prod").with_auth("client.admin", None),
            &ContainerSettings::default(),
        )
        .unwrap()
        .with_runner(Box::new(Shared(Arc::clone(&fake))));

        client.reconcile(&DesiredState::MgrModule(MgrModule::new("dashboard")), false);
        assert_eq!(
            fake.calls()[0],
            argv(&[
                "ceph",
                "-n",
                "client.admin",
                "-k",
                "/etc/ceph/prod.client.admin.keyring",
                "--cluster",
                "prod",
                "mgr",
                "module",
                "ls",
                "--format=json"
            ])
        );
    }
}
