//! Classified error type for provisioning and deletion.
//!
//! Every failure carries an [`ErrorClass`] so the caller driving the
//! provisioner can decide between giving up, retrying later, or treating
//! the volume as somebody else's business.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ProvisioningState;

/// How a caller should react to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The attempt is over and failed; retrying cannot help.
    Permanent,
    /// Nothing durable changed; the same call may be issued again later.
    Retryable,
    /// The volume belongs to a sibling provisioner instance; take no action.
    Ignored,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Retryable => write!(f, "retryable"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

/// Error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// A resource quantity string could not be parsed.
    #[error("invalid quantity {quantity:?}: {reason}")]
    InvalidQuantity {
        /// The quantity as written.
        quantity: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The claim asked for zero or negative storage.
    #[error("storage capacity must be > 0 (not {quantity})")]
    NonPositiveCapacity {
        /// The requested quantity as written.
        quantity: String,
    },

    /// The claim asked for more storage than the filesystem has free.
    #[error("storage capacity must be <= {available} (not {requested})")]
    InsufficientSpace {
        /// The requested quantity as written.
        requested: String,
        /// Free bytes reported for the base directory.
        available: u64,
    },

    /// Free space under the base directory could not be determined.
    #[error("unable to get filesystem free space at {path}: {source}")]
    FreeSpace {
        /// Base directory that was queried.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required storage class parameter is absent.
    #[error("storage class parameter {key:?} is required")]
    MissingParameter {
        /// Parameter key.
        key: &'static str,
    },

    /// The base directory is not an absolute path.
    #[error("storage class base directory must be absolute (not {path})")]
    RelativeBaseDir {
        /// Offending path.
        path: PathBuf,
    },

    /// The volume name would not map to a single directory under the base.
    #[error("invalid volume name {name:?}")]
    InvalidVolumeName {
        /// Offending name.
        name: String,
    },

    /// The volume directory could not be created.
    #[error("failed to create volume directory {path}: {source}")]
    CreateDirectory {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Permission bits could not be applied to the volume directory.
    #[error("failed to set permissions on {path}: {source}")]
    SetPermissions {
        /// Directory whose mode was being set.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The volume carries no ownership annotation at all.
    #[error("identity annotation not found on PV {volume}")]
    MissingIdentity {
        /// Volume name.
        volume: String,
    },

    /// The volume is owned by a different provisioner identity.
    #[error("identity annotation on PV {volume} does not match ours (owned by {owner:?})")]
    ForeignIdentity {
        /// Volume name.
        volume: String,
        /// Identity recorded on the volume.
        owner: String,
    },

    /// The volume descriptor records no host path to remove.
    #[error("PV {volume} has no host path source")]
    MissingHostPath {
        /// Volume name.
        volume: String,
    },

    /// The volume directory could not be removed.
    #[error("failed to remove volume directory {path}: {source}")]
    RemoveDirectory {
        /// Directory that was being removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },
}

impl ProvisionerError {
    /// Returns how the caller should treat this failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::FreeSpace { .. } | Self::RemoveDirectory { .. } => ErrorClass::Retryable,
            Self::ForeignIdentity { .. } => ErrorClass::Ignored,
            Self::InvalidQuantity { .. }
            | Self::NonPositiveCapacity { .. }
            | Self::InsufficientSpace { .. }
            | Self::MissingParameter { .. }
            | Self::RelativeBaseDir { .. }
            | Self::InvalidVolumeName { .. }
            | Self::CreateDirectory { .. }
            | Self::SetPermissions { .. }
            | Self::MissingIdentity { .. }
            | Self::MissingHostPath { .. }
            | Self::Config { .. } => ErrorClass::Permanent,
        }
    }

    /// Returns the provisioning state a failed `provision` call leaves behind.
    #[must_use]
    pub const fn provisioning_state(&self) -> ProvisioningState {
        match self.class() {
            ErrorClass::Retryable => ProvisioningState::NoChange,
            ErrorClass::Permanent | ErrorClass::Ignored => ProvisioningState::Finished,
        }
    }

    /// Returns `true` when the same call may succeed if issued again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ProvisionerError>;
