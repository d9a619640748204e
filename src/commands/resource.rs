//! One-shot reconciliation of a single resource from command-line flags

use anyhow::Result;
use cephkit::{
    AdminCommand, CapabilityGrant, DesiredState, Ensure, InvocationResult, MgrModule,
    QuotaScope, Realm, Tool, UserQuota, ZapTarget,
};

use crate::Context;
use crate::cli::{
    AdminArgs, CapsCommand, MgrModuleCommand, QuotaCommand, RealmCommand, ScopeArg, ToolArg,
    ZapArgs,
};
use crate::ui;

pub fn caps(ctx: &Context, cmd: CapsCommand) -> Result<bool> {
    let desired = match cmd {
        CapsCommand::Add(args) => CapabilityGrant::new(&args.uid, args.caps),
        CapsCommand::Rm(args) => CapabilityGrant::new(&args.uid, args.caps).absent(),
    };
    run(ctx, DesiredState::Caps(desired), false)
}

pub fn realm(ctx: &Context, cmd: RealmCommand) -> Result<bool> {
    match cmd {
        RealmCommand::Create { name, default } => {
            let mut realm = Realm::new(&name);
            realm.default = default;
            run(ctx, DesiredState::Realm(realm), false)
        }
        RealmCommand::Delete { name, yes } => run(
            ctx,
            DesiredState::Realm(Realm::new(&name).with_state(Ensure::Absent)),
            yes,
        ),
        RealmCommand::Get { name } => run(
            ctx,
            DesiredState::Realm(Realm::new(&name).with_state(Ensure::Info)),
            false,
        ),
    }
}

pub fn quota(ctx: &Context, cmd: QuotaCommand) -> Result<bool> {
    let QuotaCommand::Set(args) = cmd;
    let scope = match args.scope {
        ScopeArg::User => QuotaScope::User,
        ScopeArg::Bucket => QuotaScope::Bucket,
    };

    let mut quota = UserQuota::new(&args.uid, scope);
    quota.max_objects = args.max_objects;
    quota.max_size = args.max_size;
    if args.disable {
        quota = quota.disabled();
    }
    run(ctx, DesiredState::Quota(quota), false)
}

pub fn mgr_module(ctx: &Context, cmd: MgrModuleCommand) -> Result<bool> {
    let module = match cmd {
        MgrModuleCommand::Enable { name } => MgrModule::new(&name),
        MgrModuleCommand::Disable { name } => MgrModule::disabled(&name),
    };
    run(ctx, DesiredState::MgrModule(module), false)
}

pub fn zap(ctx: &Context, args: ZapArgs) -> Result<bool> {
    let mut target = match args.vg.as_deref() {
        Some(vg) => ZapTarget::logical_volume(vg, &args.device),
        None => ZapTarget::device(&args.device),
    };
    if args.destroy {
        target = target.destroying();
    }
    run(ctx, DesiredState::Zap(target), args.yes)
}

pub fn admin(ctx: &Context, args: AdminArgs) -> Result<bool> {
    let tool = match args.tool {
        ToolArg::Ceph => Tool::Ceph,
        ToolArg::RadosgwAdmin => Tool::RadosgwAdmin,
        ToolArg::CephVolume => Tool::CephVolume,
    };
    run(ctx, DesiredState::Admin(AdminCommand::new(tool, args.args)), false)
}

/// Reconcile one resource and print the result
fn run(ctx: &Context, desired: DesiredState, yes: bool) -> Result<bool> {
    let label = format!("{} '{}'", desired.resource_type(), desired.id());

    if desired.is_destructive()
        && !ctx.check
        && !yes
        && !super::confirm(&format!("{label} is destructive. Continue?"))?
    {
        ui::warn("Aborted");
        return Ok(true);
    }

    let client = ctx.client()?;
    let result = client.reconcile(&desired, ctx.check);
    report(ctx, &label, &result)?;
    Ok(result.is_success())
}

pub fn report(ctx: &Context, label: &str, result: &InvocationResult) -> Result<()> {
    if ctx.json {
        ui::print_json(result)
    } else {
        ui::print_result(label, result, ctx.check, ctx.quiet);
        Ok(())
    }
}
