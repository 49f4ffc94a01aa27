//! The provisioning contract an orchestration runtime calls into.

pub mod hostpath;

use hostpath_common::error::Result;
use hostpath_common::types::{PersistentVolume, ProvisionOptions};

/// Dynamic volume provisioner.
///
/// A controller invokes these hooks when a claim needs storage or a
/// released volume must be cleaned up. Calls for different volumes may run
/// concurrently; implementors keep no shared mutable state between calls.
pub trait Provisioner: Send + Sync {
    /// Materializes storage for a claim and returns the volume describing it.
    ///
    /// A successful call leaves nothing further to do. On failure,
    /// [`ProvisionerError::provisioning_state`](hostpath_common::error::ProvisionerError::provisioning_state)
    /// tells the caller whether the attempt is over or may be repeated.
    ///
    /// # Errors
    ///
    /// Returns a permanent error for invalid or unsatisfiable requests and
    /// for directory failures, and a retryable one when free space cannot
    /// be determined.
    fn provision(&self, options: &ProvisionOptions) -> Result<PersistentVolume>;

    /// Releases the storage behind a volume this provisioner created.
    ///
    /// # Errors
    ///
    /// Returns a permanent error when the volume carries no ownership
    /// marker, an ignored one when it belongs to another instance, and a
    /// retryable one when removal fails.
    fn delete(&self, volume: &PersistentVolume) -> Result<()>;
}
