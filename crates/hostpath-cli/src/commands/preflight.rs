//! `hostpath-provisioner preflight`: Validate startup configuration.
//!
//! Resolves the cluster target the same way a long-running deployment
//! would and fails fast when no client could be built from it. Meant for
//! init containers and startup probes.

use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hostpath_common::config::{ClusterTarget, ProvisionerConfig};
use hostpath_common::constants::{METRICS_PORT, PROVISIONER_ID_ANNOTATION};
use hostpath_core::filesystem::space::{SpaceProbe, StatvfsProbe};

use crate::output::format_bytes;

/// Arguments for the `preflight` command.
#[derive(Args, Debug)]
pub struct PreflightArgs {
    /// Base directories volumes will be rooted under; each must be
    /// reachable.
    #[arg(long = "pv-dir")]
    pub pv_dirs: Vec<PathBuf>,
}

/// Executes the `preflight` command.
///
/// # Errors
///
/// Returns an error if the cluster target is unusable or a base directory
/// cannot be queried.
pub fn execute(config: &ProvisionerConfig, args: PreflightArgs) -> anyhow::Result<()> {
    match &config.cluster {
        ClusterTarget::OutOfCluster { .. } => {
            tracing::info!("using out-of-cluster configuration");
        }
        ClusterTarget::InCluster => {
            tracing::info!("using in-cluster configuration; use --master or --kubeconfig to change");
        }
    }
    config
        .cluster
        .validate()
        .context("failed to create config")?;

    let mut report = summary(config);
    for dir in &args.pv_dirs {
        let free = StatvfsProbe
            .available_bytes(dir)
            .with_context(|| format!("base directory {} is not usable", dir.display()))?;
        let _ = writeln!(report, "pvDir:      {} ({} free)", dir.display(), format_bytes(free));
    }

    std::io::stdout()
        .lock()
        .write_all(report.as_bytes())
        .context("failed to write to stdout")
}

fn summary(config: &ProvisionerConfig) -> String {
    let cluster = match &config.cluster {
        ClusterTarget::InCluster => "in-cluster".to_owned(),
        ClusterTarget::OutOfCluster { master, kubeconfig } => format!(
            "out-of-cluster (master: {}, kubeconfig: {})",
            master.as_deref().unwrap_or("-"),
            kubeconfig
                .as_ref()
                .map_or_else(|| "-".to_owned(), |p| p.display().to_string()),
        ),
    };
    format!(
        "name:       {}\nidentity:   {}\nannotation: {PROVISIONER_ID_ANNOTATION}\ncluster:    {cluster}\nmetrics:    :{METRICS_PORT}\n",
        config.name, config.identity,
    )
}
