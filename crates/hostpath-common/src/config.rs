//! Startup configuration for a provisioner instance.

use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_PROVISIONER_NAME, SERVICE_ACCOUNT_TOKEN, SERVICE_HOST_ENV, SERVICE_PORT_ENV,
};
use crate::error::{ProvisionerError, Result};

/// Where the cluster API is reached from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterTarget {
    /// Service discovery and credentials from the pod environment.
    InCluster,
    /// An explicit API server and/or kubeconfig file.
    OutOfCluster {
        /// API server URL overriding the kubeconfig's.
        master: Option<String>,
        /// Path to a kubeconfig file.
        kubeconfig: Option<PathBuf>,
    },
}

impl ClusterTarget {
    /// Picks the target from the connection flags.
    ///
    /// Either flag being set selects out-of-cluster configuration; empty
    /// values count as unset.
    #[must_use]
    pub fn from_flags(master: Option<String>, kubeconfig: Option<PathBuf>) -> Self {
        let master = master.filter(|m| !m.is_empty());
        let kubeconfig = kubeconfig.filter(|k| !k.as_os_str().is_empty());
        if master.is_none() && kubeconfig.is_none() {
            Self::InCluster
        } else {
            Self::OutOfCluster { master, kubeconfig }
        }
    }

    /// Checks that a client could be built for this target.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionerError::Config`] if the master URL is malformed,
    /// the kubeconfig is unreadable, or the in-cluster environment is
    /// incomplete.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(|key| std::env::var(key).ok(), Path::new(SERVICE_ACCOUNT_TOKEN))
    }

    fn validate_with(&self, env: impl Fn(&str) -> Option<String>, token: &Path) -> Result<()> {
        match self {
            Self::InCluster => {
                for key in [SERVICE_HOST_ENV, SERVICE_PORT_ENV] {
                    if env(key).is_none_or(|v| v.is_empty()) {
                        return Err(ProvisionerError::Config {
                            message: format!(
                                "unable to load in-cluster configuration, {key} must be defined"
                            ),
                        });
                    }
                }
                readable(token, "service account token")
            }
            Self::OutOfCluster { master, kubeconfig } => {
                if let Some(master) = master.as_deref().filter(|m| !is_http_url(m)) {
                    return Err(ProvisionerError::Config {
                        message: format!("master URL {master:?} must use http or https"),
                    });
                }
                kubeconfig
                    .as_deref()
                    .map_or(Ok(()), |path| readable(path, "kubeconfig"))
            }
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn readable(path: &Path, what: &str) -> Result<()> {
    std::fs::File::open(path)
        .map(drop)
        .map_err(|e| ProvisionerError::Config {
            message: format!("cannot read {what} {}: {e}", path.display()),
        })
}

/// Identity and connection settings for one provisioner instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Name the instance registers under with the controller framework.
    pub name: String,
    /// Identity written into, and required on, every volume's ownership
    /// annotation.
    pub identity: String,
    /// Cluster API target.
    pub cluster: ClusterTarget,
}

impl ProvisionerConfig {
    /// Builds a configuration, defaulting an unset or empty name or
    /// identity to [`DEFAULT_PROVISIONER_NAME`].
    #[must_use]
    pub fn new(name: Option<String>, identity: Option<String>, cluster: ClusterTarget) -> Self {
        let or_default = |value: Option<String>| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PROVISIONER_NAME.to_owned())
        };
        Self {
            name: or_default(name),
            identity: or_default(identity),
            cluster,
        }
    }
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self::new(None, None, ClusterTarget::InCluster)
    }
}
