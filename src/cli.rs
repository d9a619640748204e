use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cephctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative reconciliation for Ceph admin tooling", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Probe only: report what would change without changing it
    #[arg(long, global = true)]
    pub check: bool,

    /// Cluster name passed as --cluster
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Config file (default: config.toml in the config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run tools inside this container image
    #[arg(long, global = true, env = "CEPH_CONTAINER_IMAGE")]
    pub container_image: Option<String>,

    /// Container runtime binary (default: podman)
    #[arg(long, global = true, env = "CEPH_CONTAINER_BINARY")]
    pub container_binary: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage RADOS gateway user capabilities
    #[command(subcommand)]
    Caps(CapsCommand),

    /// Manage RADOS gateway realms
    #[command(subcommand)]
    Realm(RealmCommand),

    /// Manage RADOS gateway user and bucket quotas
    #[command(subcommand)]
    Quota(QuotaCommand),

    /// Enable or disable manager modules
    #[command(subcommand)]
    MgrModule(MgrModuleCommand),

    /// Zap a device or logical volume
    Zap(ZapArgs),

    /// Run an admin command as is
    Admin(AdminArgs),

    /// Reconcile every resource in a manifest
    Apply(ApplyArgs),

    /// Show what a manifest would change
    Plan(PlanArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Caps
// ============================================================================

#[derive(Subcommand)]
pub enum CapsCommand {
    /// Grant capabilities, converging to exactly this set
    Add(CapsArgs),
    /// Revoke capabilities
    Rm(CapsArgs),
}

#[derive(Parser)]
pub struct CapsArgs {
    /// User id
    #[arg(long)]
    pub uid: String,

    /// Capabilities as type=perm (e.g. users=read, zone=*)
    #[arg(long, required = true, num_args = 1..)]
    pub caps: Vec<String>,
}

// ============================================================================
// Realm
// ============================================================================

#[derive(Subcommand)]
pub enum RealmCommand {
    /// Create a realm if missing
    Create {
        /// Realm name
        name: String,

        /// Make it the default realm
        #[arg(long)]
        default: bool,
    },
    /// Delete a realm if present
    Delete {
        /// Realm name
        name: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show a realm
    Get {
        /// Realm name
        name: String,
    },
}

// ============================================================================
// Quota
// ============================================================================

#[derive(Subcommand)]
pub enum QuotaCommand {
    /// Set limits and enforcement for a user
    Set(QuotaArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    User,
    Bucket,
}

#[derive(Parser)]
pub struct QuotaArgs {
    /// User id
    #[arg(long)]
    pub uid: String,

    /// Quota scope
    #[arg(long, value_enum, default_value = "user")]
    pub scope: ScopeArg,

    /// Maximum number of objects (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true)]
    pub max_objects: Option<i64>,

    /// Maximum size, e.g. 10GB (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true, value_parser = crate::ui::parse_quota_size)]
    pub max_size: Option<i64>,

    /// Leave the quota disabled
    #[arg(long)]
    pub disable: bool,
}

// ============================================================================
// Mgr modules
// ============================================================================

#[derive(Subcommand)]
pub enum MgrModuleCommand {
    /// Enable a module
    Enable {
        /// Module name
        name: String,
    },
    /// Disable a module
    Disable {
        /// Module name
        name: String,
    },
}

// ============================================================================
// Zap / Admin
// ============================================================================

#[derive(Parser)]
pub struct ZapArgs {
    /// Device path, or logical volume name with --vg
    pub device: String,

    /// Volume group holding the logical volume
    #[arg(long)]
    pub vg: Option<String>,

    /// Also destroy partitions and volume groups
    #[arg(long)]
    pub destroy: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ToolArg {
    Ceph,
    RadosgwAdmin,
    CephVolume,
}

#[derive(Parser)]
pub struct AdminArgs {
    /// Tool to run
    #[arg(long, value_enum, default_value = "ceph")]
    pub tool: ToolArg,

    /// Sub-command and arguments, passed through verbatim
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

// ============================================================================
// Manifests
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Manifest file (TOML)
    pub file: PathBuf,

    /// Skip confirmation for destructive resources
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct PlanArgs {
    /// Manifest file (TOML)
    pub file: PathBuf,
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
}
