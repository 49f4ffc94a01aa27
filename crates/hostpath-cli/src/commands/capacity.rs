//! `hostpath-provisioner capacity`: Report free space under a base directory.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use hostpath_core::filesystem::space::{SpaceProbe, StatvfsProbe};

use crate::output::format_bytes;

/// Arguments for the `capacity` command.
#[derive(Args, Debug)]
pub struct CapacityArgs {
    /// Base directory, as given in a storage class's `pvDir`.
    pub dir: PathBuf,

    /// Print the raw byte count only.
    #[arg(long)]
    pub bytes: bool,
}

/// Executes the `capacity` command.
///
/// # Errors
///
/// Returns an error if the filesystem cannot be queried.
pub fn execute(args: CapacityArgs) -> anyhow::Result<()> {
    let free = StatvfsProbe
        .available_bytes(&args.dir)
        .with_context(|| format!("unable to get filesystem free space at {}", args.dir.display()))?;
    tracing::debug!(path = %args.dir.display(), space = free, "free space on disk");

    let line = if args.bytes {
        format!("{free}\n")
    } else {
        format!("{}\t{free}\t{}\n", args.dir.display(), format_bytes(free))
    };
    std::io::stdout()
        .lock()
        .write_all(line.as_bytes())
        .context("failed to write to stdout")
}
