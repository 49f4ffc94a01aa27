//! `hostpath-provisioner provision`: Provision a volume for a claim.

use std::path::PathBuf;

use clap::Args;
use hostpath_common::config::ProvisionerConfig;
use hostpath_common::types::{ProvisionOptions, StorageClass, VolumeClaim};
use hostpath_core::provisioner::Provisioner;

use crate::manifest::{self, Format};

/// Arguments for the `provision` command.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Claim manifest (YAML or JSON).
    #[arg(long)]
    pub claim: PathBuf,

    /// Storage class manifest (YAML or JSON).
    #[arg(long)]
    pub storage_class: PathBuf,

    /// Unique name for the new volume.
    #[arg(long)]
    pub volume_name: String,

    /// Encoding of the volume manifest written to stdout.
    #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
    pub output: Format,
}

/// Executes the `provision` command.
///
/// # Errors
///
/// Returns an error if a manifest cannot be loaded or provisioning fails.
pub fn execute(config: &ProvisionerConfig, args: ProvisionArgs) -> anyhow::Result<()> {
    let options = ProvisionOptions {
        claim: manifest::read_manifest::<VolumeClaim>(&args.claim)?,
        storage_class: manifest::read_manifest::<StorageClass>(&args.storage_class)?,
        volume_name: args.volume_name,
    };

    let volume = super::provisioner(config).provision(&options)?;
    manifest::write_manifest(&volume, args.output)
}
