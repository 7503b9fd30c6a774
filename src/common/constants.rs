use std::time::Duration;

/// This is the name of the helm binary expected in $PATH.
pub(crate) const HELM_COMMAND: &str = "helm";

/// This is the environment variable helm reads its release-tracking storage
/// driver from.
pub(crate) const HELM_DRIVER_ENV: &str = "HELM_DRIVER";

/// Releases are tracked in Kubernetes Secrets, for all namespaces.
pub(crate) const HELM_STORAGE_DRIVER: &str = "secret";

/// Ceiling on a single helm backend operation. Mutating commands hand this to
/// helm as `--timeout`, so that helm itself rolls back when it expires.
pub(crate) const HELM_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Scheme prefix which marks a chart source as an OCI registry reference.
pub(crate) const OCI_SCHEME_PREFIX: &str = "oci://";

/// Name of the chart metadata file inside an unpacked chart.
pub(crate) const CHART_METADATA_FILE: &str = "Chart.yaml";

/// Namespaces and release names must be RFC 1123 labels.
pub(crate) const RFC1123_LABEL_EXPR: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Helm refuses release names longer than this.
pub(crate) const RELEASE_NAME_MAX_LEN: usize = 53;

/// Kubernetes refuses namespace names longer than this.
pub(crate) const NAMESPACE_MAX_LEN: usize = 63;

/// Only helm v3 is supported.
pub(crate) const HELM_V3_EXPR: &str = r"^v3\.[0-9]+\.[0-9]+";
