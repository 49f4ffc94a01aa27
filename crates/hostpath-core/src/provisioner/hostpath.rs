//! Provisioner that maps volumes to directories under a host base path.
//!
//! # On-disk layout
//!
//! ```text
//! <pvDir>/
//!   <volume-name>/    # one directory per volume, mode 0777
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use hostpath_common::config::ProvisionerConfig;
use hostpath_common::constants::{
    PROVISIONER_ID_ANNOTATION, PV_DIR_PARAMETER, RESOURCE_STORAGE, VOLUME_DIR_MODE,
};
use hostpath_common::error::{ProvisionerError, Result};
use hostpath_common::quantity::Quantity;
use hostpath_common::types::{
    HostPathSource, ObjectMeta, PersistentVolume, ProvisionOptions, VolumeSpec,
};

use crate::filesystem::directory::{create_volume_dir, remove_volume_dir};
use crate::filesystem::space::{SpaceProbe, StatvfsProbe};
use crate::provisioner::Provisioner;

/// Hostpath provisioner bound to one identity.
///
/// Every volume it creates is annotated with its identity, and it only
/// deletes volumes carrying that same annotation.
#[derive(Debug)]
pub struct HostPathProvisioner {
    /// Name registered with the controller framework.
    name: String,
    /// Value written to and required on the ownership annotation.
    identity: String,
    /// Free-space source for capacity checks.
    probe: Box<dyn SpaceProbe>,
    /// Span all log events are recorded under.
    span: tracing::Span,
}

impl HostPathProvisioner {
    /// Creates a provisioner from startup configuration.
    ///
    /// Every log event of `provision` and `delete` is recorded under `span`.
    #[must_use]
    pub fn new(config: &ProvisionerConfig, span: tracing::Span) -> Self {
        Self {
            name: config.name.clone(),
            identity: config.identity.clone(),
            probe: Box::new(StatvfsProbe),
            span,
        }
    }

    /// Replaces the free-space source.
    #[must_use]
    pub fn with_space_probe(mut self, probe: impl SpaceProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Returns the registration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ownership identity.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Returns the span log events are recorded under.
    #[must_use]
    pub const fn span(&self) -> &tracing::Span {
        &self.span
    }

    fn available_bytes(&self, base: &Path) -> Result<u64> {
        self.probe.available_bytes(base).map_err(|e| {
            tracing::error!(path = %base.display(), error = %e, "unable to get filesystem free space");
            ProvisionerError::FreeSpace {
                path: base.to_path_buf(),
                source: e,
            }
        })
    }
}

/// Resolves and checks the storage class base directory.
fn base_dir(options: &ProvisionOptions) -> Result<&Path> {
    let base = options
        .storage_class
        .pv_dir()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(ProvisionerError::MissingParameter {
            key: PV_DIR_PARAMETER,
        })?;
    if !base.is_absolute() {
        return Err(ProvisionerError::RelativeBaseDir {
            path: base.to_path_buf(),
        });
    }
    Ok(base)
}

/// A volume name must be exactly one path segment so that every volume
/// lands directly under the base directory.
fn check_volume_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\0']);
    if valid {
        Ok(())
    } else {
        Err(ProvisionerError::InvalidVolumeName {
            name: name.to_owned(),
        })
    }
}

impl Provisioner for HostPathProvisioner {
    fn provision(&self, options: &ProvisionOptions) -> Result<PersistentVolume> {
        let _entered = self.span.enter();
        let volume = options.volume_name.as_str();
        tracing::info!(volume, "start provisioning new volume");

        let requested = options
            .claim
            .requested_storage()
            .cloned()
            .unwrap_or_else(|| Quantity::new("0"));
        let bytes = requested.value().inspect_err(|e| {
            tracing::error!(volume, error = %e, "invalid storage request");
        })?;
        if bytes <= 0 {
            tracing::error!(volume, capacity = %requested, "storage capacity must be positive");
            return Err(ProvisionerError::NonPositiveCapacity {
                quantity: requested.to_string(),
            });
        }

        let base = base_dir(options)
            .and_then(|base| check_volume_name(volume).map(|()| base))
            .inspect_err(|e| {
                tracing::error!(volume, error = %e, "invalid provisioning request");
            })?;

        let available = self.available_bytes(base)?;
        tracing::info!(volume, space = available, "free space on disk");
        if bytes.unsigned_abs() > available {
            tracing::error!(
                volume,
                capacity = %requested,
                space = available,
                "requested capacity is too large, not enough free space to provision"
            );
            return Err(ProvisionerError::InsufficientSpace {
                requested: requested.to_string(),
                available,
            });
        }

        let path = base.join(volume);
        create_volume_dir(&path, VOLUME_DIR_MODE).inspect_err(|e| {
            tracing::error!(volume, path = %path.display(), error = %e, "failed to prepare volume directory");
        })?;
        tracing::info!(volume, path = %path.display(), "successfully created hostpath volume");

        Ok(PersistentVolume {
            metadata: ObjectMeta {
                name: volume.to_owned(),
                namespace: None,
                annotations: BTreeMap::from([(
                    PROVISIONER_ID_ANNOTATION.to_owned(),
                    self.identity.clone(),
                )]),
            },
            spec: VolumeSpec {
                capacity: BTreeMap::from([(RESOURCE_STORAGE.to_owned(), requested)]),
                access_modes: options.claim.spec.access_modes.clone(),
                persistent_volume_reclaim_policy: options
                    .storage_class
                    .reclaim_policy
                    .unwrap_or_default(),
                host_path: Some(HostPathSource { path }),
            },
            ..PersistentVolume::default()
        })
    }

    fn delete(&self, volume: &PersistentVolume) -> Result<()> {
        let _entered = self.span.enter();
        let name = volume.name();

        let Some(owner) = volume.annotation(PROVISIONER_ID_ANNOTATION) else {
            tracing::info!(
                volume = name,
                annotation = PROVISIONER_ID_ANNOTATION,
                "not removing volume: identity annotation missing"
            );
            return Err(ProvisionerError::MissingIdentity {
                volume: name.to_owned(),
            });
        };

        if owner != self.identity {
            tracing::info!(
                volume = name,
                owner,
                annotation = PROVISIONER_ID_ANNOTATION,
                "not removing volume: identity annotation does not match ours"
            );
            return Err(ProvisionerError::ForeignIdentity {
                volume: name.to_owned(),
                owner: owner.to_owned(),
            });
        }

        let path = volume
            .host_path()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| ProvisionerError::MissingHostPath {
                volume: name.to_owned(),
            })?;

        tracing::info!(volume = name, path = %path.display(), "removing volume");
        let _existed = remove_volume_dir(path).inspect_err(|e| {
            tracing::error!(volume = name, path = %path.display(), error = %e, "failed to remove volume");
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use hostpath_common::config::ClusterTarget;
    use hostpath_common::error::ErrorClass;
    use hostpath_common::types::{AccessMode, ReclaimPolicy, StorageClass, VolumeClaim};

    use super::*;
    use crate::filesystem::space::FixedSpace;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn provisioner(identity: &str) -> HostPathProvisioner {
        let config = ProvisionerConfig::new(None, Some(identity.into()), ClusterTarget::InCluster);
        HostPathProvisioner::new(&config, tracing::Span::none())
            .with_space_probe(FixedSpace(10 * GIB))
    }

    fn options(base: &Path, storage: &str, name: &str) -> ProvisionOptions {
        ProvisionOptions {
            claim: VolumeClaim::new("claim", Quantity::new(storage), vec![AccessMode::ReadWriteOnce]),
            storage_class: StorageClass::with_pv_dir("hostpath", base.to_string_lossy()),
            volume_name: name.to_owned(),
        }
    }

    #[test]
    fn provision_creates_open_directory_and_annotates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("node-a");

        let pv = p.provision(&options(dir.path(), "1Gi", "pvc-123")).expect("provision");
        let path = dir.path().join("pvc-123");

        assert!(path.is_dir());
        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o777);
        assert_eq!(pv.name(), "pvc-123");
        assert_eq!(pv.annotation(PROVISIONER_ID_ANNOTATION), Some("node-a"));
        assert_eq!(pv.host_path(), Some(path.as_path()));
        assert_eq!(pv.storage_capacity().map(Quantity::as_str), Some("1Gi"));
        assert_eq!(pv.spec.access_modes, vec![AccessMode::ReadWriteOnce]);
        assert_eq!(pv.spec.persistent_volume_reclaim_policy, ReclaimPolicy::Delete);
    }

    #[test]
    fn provision_copies_reclaim_policy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = options(dir.path(), "1Mi", "pvc-r");
        opts.storage_class.reclaim_policy = Some(ReclaimPolicy::Retain);
        let pv = provisioner("a").provision(&opts).expect("provision");
        assert_eq!(pv.spec.persistent_volume_reclaim_policy, ReclaimPolicy::Retain);
    }

    #[test]
    fn zero_or_negative_capacity_is_permanent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("a");
        for storage in ["0", "-1Gi"] {
            let err = p
                .provision(&options(dir.path(), storage, "pvc-z"))
                .expect_err("must fail");
            assert!(matches!(err, ProvisionerError::NonPositiveCapacity { .. }));
            assert_eq!(err.class(), ErrorClass::Permanent);
        }
        assert!(!dir.path().join("pvc-z").exists());
    }

    #[test]
    fn missing_storage_request_counts_as_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut opts = options(dir.path(), "1Gi", "pvc-m");
        opts.claim.spec.resources.requests.clear();
        let err = provisioner("a").provision(&opts).expect_err("must fail");
        assert!(matches!(err, ProvisionerError::NonPositiveCapacity { .. }));
    }

    #[test]
    fn oversized_request_is_permanent_and_creates_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = provisioner("a")
            .provision(&options(dir.path(), "20Gi", "pvc-123"))
            .expect_err("must fail");
        assert!(matches!(
            err,
            ProvisionerError::InsufficientSpace { available, .. } if available == 10 * GIB
        ));
        assert_eq!(err.class(), ErrorClass::Permanent);
        assert!(!dir.path().join("pvc-123").exists());
    }

    #[test]
    fn request_equal_to_free_space_fits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pv = provisioner("a").provision(&options(dir.path(), "10Gi", "pvc-eq"));
        assert!(pv.is_ok());
    }

    #[test]
    fn unreadable_base_is_retryable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("not-there");
        let err = provisioner("a")
            .provision(&options(&base, "1Gi", "pvc-1"))
            .expect_err("must fail");
        assert!(matches!(err, ProvisionerError::FreeSpace { .. }));
        assert!(err.is_retryable());
        assert!(!base.exists());
    }

    #[test]
    fn base_dir_must_be_present_and_absolute() {
        let p = provisioner("a");
        let mut opts = options(Path::new("relative/dir"), "1Gi", "pvc-1");
        assert!(matches!(
            p.provision(&opts),
            Err(ProvisionerError::RelativeBaseDir { .. })
        ));
        opts.storage_class.parameters.clear();
        assert!(matches!(
            p.provision(&opts),
            Err(ProvisionerError::MissingParameter { key: PV_DIR_PARAMETER })
        ));
    }

    #[test]
    fn volume_name_must_be_single_segment() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("a");
        for name in ["", ".", "..", "../escape", "a/b"] {
            let err = p
                .provision(&options(dir.path(), "1Gi", name))
                .expect_err("must fail");
            assert!(matches!(err, ProvisionerError::InvalidVolumeName { .. }), "{name:?}");
        }
    }

    #[test]
    fn delete_removes_owned_volume() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("node-a");
        let pv = p.provision(&options(dir.path(), "1Gi", "pvc-d")).expect("provision");
        let path = dir.path().join("pvc-d");
        std::fs::write(path.join("data"), b"payload").expect("write");

        p.delete(&pv).expect("delete");
        assert!(!path.exists());
    }

    #[test]
    fn delete_without_annotation_leaves_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("node-a");
        let mut pv = p.provision(&options(dir.path(), "1Gi", "pvc-n")).expect("provision");
        pv.metadata.annotations.clear();

        let err = p.delete(&pv).expect_err("must fail");
        assert!(matches!(err, ProvisionerError::MissingIdentity { .. }));
        assert_eq!(err.class(), ErrorClass::Permanent);
        assert!(dir.path().join("pvc-n").is_dir());
    }

    #[test]
    fn delete_foreign_volume_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pv = provisioner("node-a")
            .provision(&options(dir.path(), "1Gi", "pvc-f"))
            .expect("provision");

        let err = provisioner("node-b").delete(&pv).expect_err("must fail");
        assert_eq!(err.class(), ErrorClass::Ignored);
        assert!(dir.path().join("pvc-f").is_dir());
    }

    #[test]
    fn delete_without_host_path_is_permanent() {
        let p = provisioner("node-a");
        let mut pv = PersistentVolume::default();
        pv.metadata.name = "pv-x".into();
        let _ = pv
            .metadata
            .annotations
            .insert(PROVISIONER_ID_ANNOTATION.into(), "node-a".into());
        assert!(matches!(
            p.delete(&pv),
            Err(ProvisionerError::MissingHostPath { .. })
        ));
    }

    #[test]
    fn repeated_delete_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("node-a");
        let pv = p.provision(&options(dir.path(), "1Gi", "pvc-twice")).expect("provision");
        p.delete(&pv).expect("first delete");
        p.delete(&pv).expect("second delete");
    }

    #[test]
    fn name_and_identity_are_independent() {
        let config = ProvisionerConfig::new(
            Some("example.com/hostpath".into()),
            Some("node-a".into()),
            ClusterTarget::InCluster,
        );
        let p = HostPathProvisioner::new(&config, tracing::Span::none());
        assert_eq!(p.name(), "example.com/hostpath");
        assert_eq!(p.identity(), "node-a");
    }

    #[test]
    fn keeps_the_span_it_was_given() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("node-a");
        assert!(p.span().is_none());
        assert!(p.provision(&options(dir.path(), "1Mi", "pvc-s")).is_ok());
    }

    #[test]
    fn rejected_requests_create_nothing_under_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = provisioner("a");
        let mut opts = options(dir.path(), "1Gi", "../escape");
        assert!(p.provision(&opts).is_err());
        opts.storage_class.parameters.clear();
        opts.volume_name = "pvc-ok".into();
        assert!(p.provision(&opts).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }
}
