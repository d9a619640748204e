use anyhow::Result;
use cephkit::{ContainerSettings, ExecutionContext, Tool};

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::{CephctlConfig, Settings};
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx),
        ConfigCommand::Path => path(ctx),
    }
}

fn show(ctx: &Context) -> Result<()> {
    let settings = ctx.settings()?;

    if ctx.json {
        return ui::print_json(&settings);
    }

    ui::header("Configuration");

    let file = CephctlConfig::path(ctx.config_path.as_deref())?;
    println!();
    let location = if file.exists() {
        file.display().to_string()
    } else {
        format!("{} (not found, using defaults)", file.display())
    };
    ui::kv("Config file", &location);

    ui::info("cluster");
    ui::kv("name", &settings.cluster.name);
    match &settings.cluster.auth {
        Some(auth) => {
            ui::kv("entity", &auth.entity);
            ui::kv("keyring", &auth.keyring_path(&settings.cluster.name));
        }
        None => ui::dim("no entity configured; ceph uses its own defaults"),
    }

    ui::info("execution");
    for line in describe_execution(&settings) {
        ui::dim(&line);
    }

    Ok(())
}

fn path(ctx: &Context) -> Result<()> {
    println!("{}", CephctlConfig::path(ctx.config_path.as_deref())?.display());
    Ok(())
}

/// How each tool would be invoked under `settings`
fn describe_execution(settings: &Settings) -> Vec<String> {
    let ContainerSettings { image, binary } = &settings.container;
    match ExecutionContext::resolve(Tool::Ceph.binary(), image.as_deref(), binary.as_deref()) {
        Ok(ctx) => match (ctx.container_binary(), ctx.container_image()) {
            (Some(runtime), Some(image)) => vec![
                format!("containerized via {runtime}"),
                format!("image {image}"),
            ],
            _ => vec!["bare: tools run directly on the host".to_string()],
        },
        Err(e) => vec![format!("invalid: {e}")],
    }
}
