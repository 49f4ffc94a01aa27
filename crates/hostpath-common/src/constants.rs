//! System-wide constants and well-known keys.

/// Default registration name and identity when none is configured.
pub const DEFAULT_PROVISIONER_NAME: &str = "roru/hostpath";

/// Annotation key recording which provisioner instance owns a volume.
pub const PROVISIONER_ID_ANNOTATION: &str = "pv.kubernetes.io/hostpath-provisioner-id";

/// Storage class parameter naming the base directory for volumes.
pub const PV_DIR_PARAMETER: &str = "pvDir";

/// Resource name under which a claim requests storage.
pub const RESOURCE_STORAGE: &str = "storage";

/// Port the surrounding controller framework serves metrics on.
pub const METRICS_PORT: u16 = 10254;

/// Permission bits applied to every volume directory.
pub const VOLUME_DIR_MODE: u32 = 0o777;

/// Environment variable announcing the in-cluster API service host.
pub const SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";

/// Environment variable announcing the in-cluster API service port.
pub const SERVICE_PORT_ENV: &str = "KUBERNETES_SERVICE_PORT";

/// Service-account token mounted into every in-cluster pod.
pub const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "hostpath-provisioner";
