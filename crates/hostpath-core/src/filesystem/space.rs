//! Free-space probing for volume base directories.

use std::fmt;
use std::path::Path;

/// Reports how many bytes an unprivileged writer may still allocate on the
/// filesystem hosting a directory.
pub trait SpaceProbe: fmt::Debug + Send + Sync {
    /// Returns the free bytes available under `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or the filesystem
    /// cannot be queried.
    fn available_bytes(&self, path: &Path) -> std::io::Result<u64>;
}

/// Queries the host filesystem with `statvfs(2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatvfsProbe;

impl SpaceProbe for StatvfsProbe {
    #[allow(clippy::useless_conversion)]
    fn available_bytes(&self, path: &Path) -> std::io::Result<u64> {
        let stat = nix::sys::statvfs::statvfs(path)?;
        // Field widths differ between targets.
        let blocks = u64::from(stat.blocks_available());
        let block_size = u64::from(stat.fragment_size());
        Ok(blocks.saturating_mul(block_size))
    }
}

/// Reports a fixed amount of free space for any existing directory.
///
/// Useful for dry runs and for pinning capacity decisions in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSpace(pub u64);

impl SpaceProbe for FixedSpace {
    fn available_bytes(&self, path: &Path) -> std::io::Result<u64> {
        if path.is_dir() {
            Ok(self.0)
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", path.display()),
            ))
        }
    }
}
