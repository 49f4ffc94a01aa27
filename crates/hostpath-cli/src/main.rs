//! # hostpath-provisioner
//!
//! Dynamic hostpath volume provisioner.
//! Single binary an orchestration controller (or an operator) invokes to
//! provision and delete directory-backed volumes.

mod commands;
mod manifest;
mod output;

use std::process::ExitCode;

use clap::Parser;
use nix::sys::stat::{Mode, umask};

use crate::commands::{Cli, LogFormat};

fn main() -> ExitCode {
    // Volume directories must come out with exactly the requested mode.
    let _previous = umask(Mode::empty());

    let cli = Cli::parse();
    init_tracing(cli.log_format);
    commands::execute(cli)
}

/// Installs the global subscriber. Logs go to stderr; stdout carries
/// manifests.
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
