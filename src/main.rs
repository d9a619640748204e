mod cli;
mod commands;
mod config;
mod manifest;
mod paths;
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::{CephctlConfig, Overrides, Settings};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub json: bool,
    pub check: bool,
    pub config_path: Option<PathBuf>,
    pub cluster: Option<String>,
    pub container_image: Option<String>,
    pub container_binary: Option<String>,
}

impl Context {
    /// Effective settings: CLI and env over config file over defaults
    pub fn settings(&self) -> Result<Settings> {
        let file = CephctlConfig::load(self.config_path.as_deref())?;
        Ok(Settings::resolve(
            file,
            Overrides {
                cluster: self.cluster.clone(),
                container_image: self.container_image.clone(),
                container_binary: self.container_binary.clone(),
            },
        ))
    }

    /// Client for the effective cluster and container settings
    pub fn client(&self) -> Result<cephkit::Client> {
        let settings = self.settings()?;
        cephkit::Client::new(settings.cluster, &settings.container)
            .context("Could not resolve execution context")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        json: cli.json,
        check: cli.check,
        config_path: cli.config,
        cluster: cli.cluster,
        container_image: cli.container_image,
        container_binary: cli.container_binary,
    };

    let ok = match cli.command {
        Command::Caps(cmd) => commands::resource::caps(&ctx, cmd),
        Command::Realm(cmd) => commands::resource::realm(&ctx, cmd),
        Command::Quota(cmd) => commands::resource::quota(&ctx, cmd),
        Command::MgrModule(cmd) => commands::resource::mgr_module(&ctx, cmd),
        Command::Zap(args) => commands::resource::zap(&ctx, args),
        Command::Admin(args) => commands::resource::admin(&ctx, args),
        Command::Apply(args) => commands::apply::apply(&ctx, &args.file, args.yes),
        Command::Plan(args) => commands::apply::plan(&ctx, &args.file),
        Command::Config(cmd) => commands::config::run(&ctx, cmd).map(|()| true),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cephctl", &mut io::stdout());
            Ok(true)
        }
    }?;

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
