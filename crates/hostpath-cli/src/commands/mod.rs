//! CLI command definitions and dispatch.

pub mod capacity;
pub mod delete;
pub mod preflight;
pub mod provision;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use hostpath_common::config::{ClusterTarget, ProvisionerConfig};
use hostpath_common::constants::BIN_NAME;
use hostpath_common::error::{ErrorClass, ProvisionerError};
use hostpath_core::provisioner::hostpath::HostPathProvisioner;

/// Exit status for a permanent failure or fatal configuration error.
pub const EXIT_PERMANENT: u8 = 1;
/// Exit status when the volume belongs to another provisioner instance.
pub const EXIT_IGNORED: u8 = 3;
/// Exit status when the operation may be retried (`EX_TEMPFAIL`).
pub const EXIT_RETRYABLE: u8 = 75;

/// Hostpath provisioner for directory-backed dynamic volumes.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Master URL of the cluster API server.
    #[arg(long, global = true, env = "HOSTPATH_PROVISIONER_MASTER")]
    pub master: Option<String>,

    /// Absolute path to the kubeconfig.
    #[arg(long, global = true, env = "HOSTPATH_PROVISIONER_KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Provisioner name registered with the controller.
    #[arg(long, global = true, env = "HOSTPATH_PROVISIONER_NAME")]
    pub name: Option<String>,

    /// Unique provisioner identity to mark volumes with.
    #[arg(long, global = true, env = "HOSTPATH_PROVISIONER_ID")]
    pub id: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Provision a volume for a claim and print its manifest.
    Provision(provision::ProvisionArgs),
    /// Delete a volume this instance provisioned.
    Delete(delete::DeleteArgs),
    /// Report free space under a base directory.
    Capacity(capacity::CapacityArgs),
    /// Validate startup configuration and print the resolved registration.
    Preflight(preflight::PreflightArgs),
}

impl Cli {
    /// Resolves the provisioner configuration from the global flags.
    #[must_use]
    pub fn config(&self) -> ProvisionerConfig {
        if self.id.as_deref().is_some_and(|id| !id.is_empty()) {
            tracing::info!("setting custom id");
        }
        if self.name.as_deref().is_some_and(|name| !name.is_empty()) {
            tracing::info!("setting custom name");
        }
        ProvisionerConfig::new(
            self.name.clone(),
            self.id.clone(),
            ClusterTarget::from_flags(self.master.clone(), self.kubeconfig.clone()),
        )
    }
}

/// Dispatches the parsed CLI command to its handler and maps the outcome
/// to a process exit status.
pub fn execute(cli: Cli) -> ExitCode {
    let config = cli.config();
    let result = match cli.command {
        Command::Provision(args) => provision::execute(&config, args),
        Command::Delete(args) => delete::execute(&config, args),
        Command::Capacity(args) => capacity::execute(args),
        Command::Preflight(args) => preflight::execute(&config, args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitCode::from(report(&err)),
    }
}

/// Logs a failed command and returns its exit status.
fn report(err: &anyhow::Error) -> u8 {
    match exit_class(err) {
        Some(ErrorClass::Ignored) => {
            tracing::info!(reason = %err, "volume belongs to another provisioner instance");
            EXIT_IGNORED
        }
        Some(ErrorClass::Retryable) => {
            tracing::warn!(error = %format_args!("{err:#}"), "operation failed, may be retried");
            EXIT_RETRYABLE
        }
        Some(ErrorClass::Permanent) | None => {
            tracing::error!(error = %format_args!("{err:#}"), "operation failed");
            EXIT_PERMANENT
        }
    }
}

/// Builds the provisioner for one command, logging under a span that
/// carries the identity.
fn provisioner(config: &ProvisionerConfig) -> HostPathProvisioner {
    let span = tracing::info_span!("provisioner", id = %config.identity);
    HostPathProvisioner::new(config, span)
}

fn exit_class(err: &anyhow::Error) -> Option<ErrorClass> {
    err.downcast_ref::<ProvisionerError>()
        .map(ProvisionerError::class)
}
