//! Volume directory lifecycle.

use std::fs::{DirBuilder, Permissions};
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;

use hostpath_common::error::{ProvisionerError, Result};

/// Creates `path` and any missing parents, then sets its mode to `mode`.
///
/// The explicit chmod after creation makes the final bits independent of
/// the process umask.
///
/// # Errors
///
/// Returns [`ProvisionerError::CreateDirectory`] if creation fails, or
/// [`ProvisionerError::SetPermissions`] if the chmod fails.
pub fn create_volume_dir(path: &Path, mode: u32) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(path)
        .map_err(|e| ProvisionerError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    std::fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|e| {
        ProvisionerError::SetPermissions {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    tracing::debug!(path = %path.display(), mode = format_args!("{mode:o}"), "volume directory created");
    Ok(())
}

/// Recursively removes `path` and everything beneath it.
///
/// Returns `false` when the path was already gone.
///
/// # Errors
///
/// Returns [`ProvisionerError::RemoveDirectory`] if removal fails for any
/// reason other than the path not existing.
pub fn remove_volume_dir(path: &Path) -> Result<bool> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "volume directory already absent");
            Ok(false)
        }
        Err(e) => Err(ProvisionerError::RemoveDirectory {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
