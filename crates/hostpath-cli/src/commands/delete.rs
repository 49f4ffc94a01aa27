//! `hostpath-provisioner delete`: Delete a volume this instance owns.

use std::path::PathBuf;

use clap::Args;
use hostpath_common::config::ProvisionerConfig;
use hostpath_common::types::PersistentVolume;
use hostpath_core::provisioner::Provisioner;

use crate::manifest;

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Volume manifest (YAML or JSON) as previously provisioned.
    #[arg(long)]
    pub volume: PathBuf,
}

/// Executes the `delete` command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or deletion fails,
/// including when the volume is owned by another instance.
pub fn execute(config: &ProvisionerConfig, args: DeleteArgs) -> anyhow::Result<()> {
    let volume: PersistentVolume = manifest::read_manifest(&args.volume)?;
    super::provisioner(config).delete(&volume)?;
    tracing::info!(volume = volume.name(), "volume deleted");
    Ok(())
}
