use snafu::Snafu;
use std::{path::PathBuf, time::Duration};

/// For use with multiple fallible operations which may fail for different reasons, but are
/// defined withing the same scope and must return to the outer scope (calling scope) using
/// the try operator -- '?'.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[snafu(context(suffix(false)))]
pub enum Error {
    /// Error for when Kubernetes API client generation fails.
    #[snafu(display("Failed to generate kubernetes client: {}", source))]
    K8sClientGeneration { source: kube_client::Error },

    /// Error for when a Kubernetes API GET request for a namespace resource fails.
    #[snafu(display("Failed to GET Kubernetes namespace {}: {}", namespace, source))]
    GetNamespace {
        source: kube::Error,
        namespace: String,
    },

    /// Error for when the registry authenticator for a deployment could not be resolved.
    #[snafu(display(
        "Failed to resolve registry credentials for release {}: {}",
        release_name,
        reason
    ))]
    RegistryAuthentication {
        release_name: String,
        reason: String,
    },

    /// Error for when the registry config for an authenticator could not be serialized.
    #[snafu(display(
        "Failed to serialize registry config for registry {}: {}",
        registry,
        source
    ))]
    SerializeRegistryConfig {
        source: serde_json::Error,
        registry: String,
    },

    /// Error for when the registry config file could not be written.
    #[snafu(display("Failed to write registry config {}: {}", path.display(), source))]
    WriteRegistryConfig {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Error for when a work directory could not be prepared.
    #[snafu(display("Failed to set up work directory {}: {}", path.display(), source))]
    WorkdirSetup {
        source: std::io::Error,
        path: PathBuf,
    },

    /// Error for when a chart repository URL is not a valid URL.
    #[snafu(display("Failed to parse chart repository URL {}: {}", chart_url, source))]
    InvalidChartRepoUrl {
        source: url::ParseError,
        chart_url: String,
    },

    /// Error for when a chart artifact could not be found or fetched from its
    /// declared source. Distinct from ChartLoad.
    #[snafu(display(
        "Could not locate chart {} version {}: {}",
        chart_ref,
        chart_version,
        detail
    ))]
    ChartNotLocatable {
        chart_ref: String,
        chart_version: String,
        detail: String,
    },

    /// Error for when a located chart's metadata file could not be opened.
    #[snafu(display("Chart loading failed, cannot open {}: {}", filepath.display(), source))]
    OpeningChartFile {
        source: std::io::Error,
        filepath: PathBuf,
    },

    /// Error for when a located chart artifact failed to parse.
    #[snafu(display("Chart loading failed for {}: {}", filepath.display(), source))]
    ChartLoad {
        source: serde_yaml::Error,
        filepath: PathBuf,
    },

    /// Error for when a helm command could not be spawned or awaited.
    #[snafu(display(
        "Failed to run helm command,\ncommand: {},\nargs: {:?},\ncommand_error: {}",
        command,
        args,
        source
    ))]
    HelmCommand {
        source: std::io::Error,
        command: String,
        args: Vec<String>,
    },

    /// Error for when a helm install command execution succeeds, but with an error.
    #[snafu(display(
        "helm install failed for release {} in namespace {},\nargs: {:?},\nstd_err: {}",
        release_name,
        namespace,
        args,
        std_err
    ))]
    HelmInstallCommand {
        release_name: String,
        namespace: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when a helm upgrade command execution succeeds, but with an error.
    #[snafu(display(
        "helm upgrade failed for release {} in namespace {},\nargs: {:?},\nstd_err: {}",
        release_name,
        namespace,
        args,
        std_err
    ))]
    HelmUpgradeCommand {
        release_name: String,
        namespace: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when a helm uninstall command execution succeeds, but with an error.
    #[snafu(display(
        "helm uninstall failed for release {} in namespace {},\nargs: {:?},\nstd_err: {}",
        release_name,
        namespace,
        args,
        std_err
    ))]
    HelmUninstallCommand {
        release_name: String,
        namespace: String,
        args: Vec<String>,
        std_err: String,
    },

    /// Error for when a helm history command execution succeeds, but with an error.
    #[snafu(display(
        "helm history failed for release {} in namespace {}: {}",
        release_name,
        namespace,
        std_err
    ))]
    HelmHistoryCommand {
        release_name: String,
        namespace: String,
        std_err: String,
    },

    /// Error for when a helm get manifest command execution succeeds, but with an error.
    #[snafu(display(
        "helm get manifest failed for release {} in namespace {}: {}",
        release_name,
        namespace,
        std_err
    ))]
    HelmGetManifestCommand {
        release_name: String,
        namespace: String,
        std_err: String,
    },

    /// Error for when a helm command did not complete within the operation ceiling.
    #[snafu(display(
        "helm command timed out after {:?},\ncommand: {},\nargs: {:?}",
        duration,
        command,
        args
    ))]
    HelmCommandTimeout {
        command: String,
        args: Vec<String>,
        duration: Duration,
    },

    /// Error for when a helm version command execution succeeds, but with an error.
    #[snafu(display("`helm version` command returned an error: {}", std_err))]
    HelmVersionCommand { std_err: String },

    /// Error for when helm v3.x.y is not present in $PATH.
    #[snafu(display("Helm version {} does not start with 'v3.x.y'", version))]
    HelmVersion { version: String },

    /// Error for when the output of a helm command could not be parsed as JSON.
    #[snafu(display("Failed to parse output of `{}` as JSON: {}", command, source))]
    JsonParseOutput {
        source: serde_json::Error,
        command: String,
    },

    /// Error for use when converting Vec<> to String.
    #[snafu(display("Failed to convert Vec<u8> to UTF-8 formatted String: {}", source))]
    U8VectorToString { source: std::str::Utf8Error },

    /// Error for when the values tree of a deployment could not be serialized to YAML.
    #[snafu(display(
        "Failed to serialize values for release {}: {}",
        release_name,
        source
    ))]
    SerializeValues {
        source: serde_yaml::Error,
        release_name: String,
    },

    /// Error for when a document of a rendered manifest could not be decoded.
    #[snafu(display(
        "Failed to decode manifest document at index {}: {}",
        document_index,
        source
    ))]
    ManifestDecode {
        source: serde_yaml::Error,
        document_index: usize,
    },

    /// Error for when a release has no revision history, i.e. was never installed.
    #[snafu(display(
        "Release {} in namespace {} has no history",
        release_name,
        namespace
    ))]
    NoReleaseHistory {
        release_name: String,
        namespace: String,
    },

    /// Error for when a release name is not a valid helm release name.
    #[snafu(display("{} is not a valid helm release name", release_name))]
    InvalidReleaseName { release_name: String },

    /// Error for when a namespace is not a valid Kubernetes namespace name.
    #[snafu(display("{} is not a valid Kubernetes namespace", namespace))]
    InvalidNamespace { namespace: String },

    /// Error for when regular expression parsing or compilation fails.
    #[snafu(display("Failed to compile regex {}: {}", expression, source))]
    RegexCompile {
        source: regex::Error,
        expression: String,
    },

    /// Error for when namespace option is not set when building KubeClientSet.
    #[snafu(display("Mandatory KubeClientSetBuilder option 'namespace' not set"))]
    KubeClientSetBuilderNs,

    /// Error for when mandatory options for a ReleaseLifecycle are missing when building.
    #[snafu(display("Mandatory ReleaseLifecycleBuilder option 'auth_resolver' not set"))]
    LifecycleOptionsAbsent,
}

/// A wrapper type to remove repeated Result<T, Error> returns.
pub type Result<T, E = Error> = std::result::Result<T, E>;
