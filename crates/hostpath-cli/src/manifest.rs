//! Reading and writing Kubernetes-style manifests.
//!
//! Input files may be YAML or JSON; output is written to stdout in the
//! format the caller picks.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encoding for manifests written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// YAML document.
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

/// Parses a YAML or JSON manifest file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not describe a `T`.
pub fn read_manifest<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    parse_manifest(&content).with_context(|| format!("invalid manifest {}", path.display()))
}

/// Parses manifest text. JSON is accepted as a YAML document.
fn parse_manifest<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    Ok(serde_yaml::from_str(content)?)
}

/// Renders `value` in `format`, newline-terminated.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_manifest<T: Serialize>(value: &T, format: Format) -> anyhow::Result<String> {
    let mut rendered = match format {
        Format::Yaml => serde_yaml::to_string(value)?,
        Format::Json => serde_json::to_string_pretty(value)?,
    };
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
    Ok(rendered)
}

/// Writes `value` to stdout in `format`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_manifest<T: Serialize>(value: &T, format: Format) -> anyhow::Result<()> {
    let rendered = render_manifest(value, format)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
        .context("failed to write manifest to stdout")
}
