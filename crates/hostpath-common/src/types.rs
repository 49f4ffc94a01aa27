//! Volume data model shared across the workspace.
//!
//! The shapes mirror the Kubernetes manifests they are read from and
//! written to (camelCase keys, `metadata`/`spec` split), trimmed to the
//! fields the provisioner reads or produces.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{PV_DIR_PARAMETER, RESOURCE_STORAGE};
use crate::quantity::Quantity;

/// How a volume may be mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Read-write by a single node.
    ReadWriteOnce,
    /// Read-only by many nodes.
    ReadOnlyMany,
    /// Read-write by many nodes.
    ReadWriteMany,
    /// Read-write by a single pod.
    ReadWriteOncePod,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadWriteOnce => write!(f, "ReadWriteOnce"),
            Self::ReadOnlyMany => write!(f, "ReadOnlyMany"),
            Self::ReadWriteMany => write!(f, "ReadWriteMany"),
            Self::ReadWriteOncePod => write!(f, "ReadWriteOncePod"),
        }
    }
}

/// What happens to a volume once its claim is released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReclaimPolicy {
    /// The volume is handed back to the provisioner for deletion.
    #[default]
    Delete,
    /// The volume is kept for manual reclamation.
    Retain,
}

/// Object metadata common to claims, classes, and volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name.
    #[serde(default)]
    pub name: String,
    /// Namespace, for namespaced objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Free-form annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Compute resources requested by a claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    /// Requested amounts keyed by resource name.
    #[serde(default)]
    pub requests: BTreeMap<String, Quantity>,
}

/// Desired characteristics of a claimed volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSpec {
    /// Requested access modes.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Requested resources.
    #[serde(default)]
    pub resources: ResourceRequirements,
    /// Name of the storage class the claim asks for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

/// A request for storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeClaim {
    /// Claim metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Claim specification.
    #[serde(default)]
    pub spec: ClaimSpec,
}

impl VolumeClaim {
    /// Creates a claim requesting `storage` with the given access modes.
    #[must_use]
    pub fn new(name: impl Into<String>, storage: Quantity, access_modes: Vec<AccessMode>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            spec: ClaimSpec {
                access_modes,
                resources: ResourceRequirements {
                    requests: BTreeMap::from([(RESOURCE_STORAGE.to_owned(), storage)]),
                },
                storage_class_name: None,
            },
        }
    }

    /// Returns the requested storage quantity, if any.
    #[must_use]
    pub fn requested_storage(&self) -> Option<&Quantity> {
        self.spec.resources.requests.get(RESOURCE_STORAGE)
    }
}

/// An administrator-defined template for provisioning volumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageClass {
    /// Class metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Name of the provisioner the class is bound to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioner: Option<String>,
    /// Provisioner-specific parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Reclaim policy applied to volumes of this class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reclaim_policy: Option<ReclaimPolicy>,
}

impl StorageClass {
    /// Creates a class rooting volumes under `pv_dir`.
    #[must_use]
    pub fn with_pv_dir(name: impl Into<String>, pv_dir: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            provisioner: None,
            parameters: BTreeMap::from([(PV_DIR_PARAMETER.to_owned(), pv_dir.into())]),
            reclaim_policy: None,
        }
    }

    /// Returns the base directory parameter, if set.
    #[must_use]
    pub fn pv_dir(&self) -> Option<&Path> {
        self.parameters.get(PV_DIR_PARAMETER).map(Path::new)
    }
}

/// Host directory backing a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPathSource {
    /// Absolute path on the host.
    pub path: PathBuf,
}

/// Specification of a provisioned volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Provisioned capacity keyed by resource name.
    #[serde(default)]
    pub capacity: BTreeMap<String, Quantity>,
    /// Access modes copied from the claim.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Reclaim policy copied from the storage class.
    #[serde(default)]
    pub persistent_volume_reclaim_policy: ReclaimPolicy,
    /// Host directory backing the volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathSource>,
}

/// A provisioned volume descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolume {
    /// API version of the manifest.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Manifest kind.
    #[serde(default = "default_volume_kind")]
    pub kind: String,
    /// Volume metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,
    /// Volume specification.
    #[serde(default)]
    pub spec: VolumeSpec,
}

fn default_api_version() -> String {
    "v1".to_owned()
}

fn default_volume_kind() -> String {
    "PersistentVolume".to_owned()
}

impl Default for PersistentVolume {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_volume_kind(),
            metadata: ObjectMeta::default(),
            spec: VolumeSpec::default(),
        }
    }
}

impl PersistentVolume {
    /// Returns the volume name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Returns the value of an annotation, if present.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Returns the backing host path, if the volume has one.
    #[must_use]
    pub fn host_path(&self) -> Option<&Path> {
        self.spec.host_path.as_ref().map(|source| source.path.as_path())
    }

    /// Returns the provisioned storage capacity.
    #[must_use]
    pub fn storage_capacity(&self) -> Option<&Quantity> {
        self.spec.capacity.get(RESOURCE_STORAGE)
    }
}

/// Everything a single provisioning call needs.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// The claim being satisfied.
    pub claim: VolumeClaim,
    /// The class the claim selected.
    pub storage_class: StorageClass,
    /// Unique name for the new volume, chosen by the caller.
    pub volume_name: String,
}

/// Where a provisioning attempt stands after a call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisioningState {
    /// No further provisioning steps are required, whether the call
    /// succeeded or failed for good.
    Finished,
    /// Nothing changed; the caller may try again.
    NoChange,
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::NoChange => write!(f, "no-change"),
        }
    }
}
