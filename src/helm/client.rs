use crate::{
    common::{
        constants::{HELM_COMMAND, HELM_DRIVER_ENV, HELM_TIMEOUT, HELM_V3_EXPR},
        error::{
            HelmCommand, HelmCommandTimeout, HelmGetManifestCommand, HelmHistoryCommand,
            HelmInstallCommand, HelmUninstallCommand, HelmUpgradeCommand, HelmVersion,
            HelmVersionCommand, JsonParseOutput, RegexCompile, Result, U8VectorToString,
        },
    },
    helm::connection::ConnectionHandle,
    vec_to_strings,
};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use snafu::{ensure, ResultExt};
use std::{path::PathBuf, process::Stdio, str, time::Duration};
use tokio::{io::AsyncWriteExt, process::Command};

/// Parameters for one install or upgrade of a release. The flags mirror what
/// the release operations always request: wait-for-ready, a fixed timeout and
/// rollback-on-failure.
#[derive(Clone, Debug)]
pub struct LifecycleRequest {
    pub release_name: String,
    pub chart_dir: PathBuf,
    /// Rendered values tree, fed to helm on stdin. None when the deployment
    /// carries no values.
    pub values_yaml: Option<String>,
    pub timeout: Duration,
    pub wait: bool,
    pub atomic: bool,
    /// Upgrade only: remove resources created by a failed upgrade attempt.
    pub cleanup_on_fail: bool,
}

/// Parameters for one uninstall of a release.
#[derive(Clone, Debug)]
pub struct UninstallRequest {
    pub release_name: String,
    pub timeout: Duration,
    pub wait: bool,
    /// Treat removing an already-absent release as success.
    pub ignore_not_found: bool,
}

/// This struct is used to deserialize the output of `helm install|upgrade -o json`.
#[derive(Clone, Debug, Deserialize)]
pub struct InstalledRelease {
    name: String,
    version: i64,
    #[serde(default)]
    namespace: Option<String>,
}

impl InstalledRelease {
    pub fn new<T>(name: T, version: i64) -> Self
    where
        T: ToString,
    {
        InstalledRelease {
            name: name.to_string(),
            version,
            namespace: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The backend-assigned revision of the release after the operation.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// This struct is used to deserialize one entry of the output of
/// `helm history -o json`, ordered by ascending revision.
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEntry {
    revision: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    chart: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl HistoryEntry {
    pub fn new(revision: i64) -> Self {
        HistoryEntry {
            revision,
            status: None,
            chart: None,
            description: None,
        }
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn chart(&self) -> Option<&str> {
        self.chart.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Capability interface over the release-tracking backend. The release
/// operations are written against this, so they can run against fakes.
#[async_trait]
pub trait ReleaseBackend: Send + Sync {
    async fn install(
        &self,
        handle: &ConnectionHandle,
        request: &LifecycleRequest,
    ) -> Result<InstalledRelease>;

    async fn upgrade(
        &self,
        handle: &ConnectionHandle,
        request: &LifecycleRequest,
    ) -> Result<InstalledRelease>;

    async fn uninstall(&self, handle: &ConnectionHandle, request: &UninstallRequest)
        -> Result<()>;

    async fn history(
        &self,
        handle: &ConnectionHandle,
        release_name: &str,
    ) -> Result<Vec<HistoryEntry>>;

    async fn get_manifest(
        &self,
        handle: &ConnectionHandle,
        release_name: &str,
    ) -> Result<Vec<u8>>;
}

fn format_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs())
}

fn install_args(request: &LifecycleRequest) -> Vec<String> {
    let mut args = vec_to_strings![
        "install",
        request.release_name,
        request.chart_dir.display(),
        "--timeout",
        format_timeout(request.timeout),
        "--output",
        "json"
    ];
    if request.wait {
        args.push("--wait".to_string());
    }
    if request.atomic {
        args.push("--atomic".to_string());
    }
    if request.values_yaml.is_some() {
        args.push("--values".to_string());
        args.push("-".to_string());
    }
    args
}

fn upgrade_args(request: &LifecycleRequest) -> Vec<String> {
    let mut args = vec_to_strings![
        "upgrade",
        request.release_name,
        request.chart_dir.display(),
        "--timeout",
        format_timeout(request.timeout),
        "--output",
        "json"
    ];
    if request.wait {
        args.push("--wait".to_string());
    }
    if request.atomic {
        args.push("--atomic".to_string());
    }
    if request.cleanup_on_fail {
        args.push("--cleanup-on-fail".to_string());
    }
    if request.values_yaml.is_some() {
        args.push("--values".to_string());
        args.push("-".to_string());
    }
    args
}

fn uninstall_args(request: &UninstallRequest) -> Vec<String> {
    let mut args = vec_to_strings![
        "uninstall",
        request.release_name,
        "--timeout",
        format_timeout(request.timeout)
    ];
    if request.wait {
        args.push("--wait".to_string());
    }
    if request.ignore_not_found {
        args.push("--ignore-not-found".to_string());
    }
    args
}

fn history_args(release_name: &str) -> Vec<String> {
    vec_to_strings!["history", release_name, "--output", "json"]
}

fn get_manifest_args(release_name: &str) -> Vec<String> {
    vec_to_strings!["get", "manifest", release_name]
}

/// This type executes helm commands against the cluster scoped by a
/// ConnectionHandle. It is the production ReleaseBackend.
#[derive(Clone, Default)]
pub struct HelmClient;

impl HelmClient {
    /// Arguments which scope a command to the handle's namespace, kubeconfig
    /// and registry credentials.
    fn scope_args(handle: &ConnectionHandle) -> Vec<String> {
        let mut args = vec_to_strings!["--namespace", handle.namespace()];
        if let Some(kubeconfig) = handle.settings().kubeconfig() {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.display().to_string());
        }
        if let Some(kube_context) = handle.settings().kube_context() {
            args.push("--kube-context".to_string());
            args.push(kube_context.to_string());
        }
        if let Some(registry_config) = handle.registry_config() {
            args.push("--registry-config".to_string());
            args.push(registry_config.display().to_string());
        }
        args
    }

    /// Runs one helm command to completion. The child process is killed if
    /// the caller's future is dropped, so that helm's own locking and atomic
    /// rollback decide the release's state, not a half-driven command.
    async fn run(
        &self,
        handle: &ConnectionHandle,
        args: Vec<String>,
        stdin: Option<&str>,
    ) -> Result<std::process::Output> {
        tracing::debug!(command = HELM_COMMAND, ?args, "Running helm command");

        let mut command = Command::new(HELM_COMMAND);
        command
            .args(args.iter())
            .env(HELM_DRIVER_ENV, handle.storage_driver())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().context(HelmCommand {
            command: HELM_COMMAND.to_string(),
            args: args.clone(),
        })?;
        if let Some(values) = stdin {
            if let Some(mut child_stdin) = child.stdin.take() {
                child_stdin
                    .write_all(values.as_bytes())
                    .await
                    .context(HelmCommand {
                        command: HELM_COMMAND.to_string(),
                        args: args.clone(),
                    })?;
            }
        }
        child.wait_with_output().await.context(HelmCommand {
            command: HELM_COMMAND.to_string(),
            args,
        })
    }

    /// Like run, with a ceiling for commands helm has no --timeout flag for.
    async fn run_with_ceiling(
        &self,
        handle: &ConnectionHandle,
        args: Vec<String>,
    ) -> Result<std::process::Output> {
        tokio::time::timeout(HELM_TIMEOUT, self.run(handle, args.clone(), None))
            .await
            .map_err(|_| {
                HelmCommandTimeout {
                    command: HELM_COMMAND.to_string(),
                    args,
                    duration: HELM_TIMEOUT,
                }
                .build()
            })?
    }
}

#[async_trait]
impl ReleaseBackend for HelmClient {
    async fn install(
        &self,
        handle: &ConnectionHandle,
        request: &LifecycleRequest,
    ) -> Result<InstalledRelease> {
        let mut args = install_args(request);
        args.extend(Self::scope_args(handle));

        let output = self
            .run(handle, args.clone(), request.values_yaml.as_deref())
            .await?;
        ensure!(
            output.status.success(),
            HelmInstallCommand {
                release_name: request.release_name.clone(),
                namespace: handle.namespace().to_string(),
                args,
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );

        serde_json::from_slice(&output.stdout).context(JsonParseOutput {
            command: "helm install".to_string(),
        })
    }

    async fn upgrade(
        &self,
        handle: &ConnectionHandle,
        request: &LifecycleRequest,
    ) -> Result<InstalledRelease> {
        let mut args = upgrade_args(request);
        args.extend(Self::scope_args(handle));

        let output = self
            .run(handle, args.clone(), request.values_yaml.as_deref())
            .await?;
        ensure!(
            output.status.success(),
            HelmUpgradeCommand {
                release_name: request.release_name.clone(),
                namespace: handle.namespace().to_string(),
                args,
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );

        serde_json::from_slice(&output.stdout).context(JsonParseOutput {
            command: "helm upgrade".to_string(),
        })
    }

    async fn uninstall(
        &self,
        handle: &ConnectionHandle,
        request: &UninstallRequest,
    ) -> Result<()> {
        let mut args = uninstall_args(request);
        args.extend(Self::scope_args(handle));

        let output = self.run(handle, args.clone(), None).await?;
        ensure!(
            output.status.success(),
            HelmUninstallCommand {
                release_name: request.release_name.clone(),
                namespace: handle.namespace().to_string(),
                args,
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );
        Ok(())
    }

    async fn history(
        &self,
        handle: &ConnectionHandle,
        release_name: &str,
    ) -> Result<Vec<HistoryEntry>> {
        let mut args = history_args(release_name);
        args.extend(Self::scope_args(handle));

        let output = self.run_with_ceiling(handle, args).await?;
        ensure!(
            output.status.success(),
            HelmHistoryCommand {
                release_name: release_name.to_string(),
                namespace: handle.namespace().to_string(),
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );

        serde_json::from_slice(&output.stdout).context(JsonParseOutput {
            command: "helm history".to_string(),
        })
    }

    async fn get_manifest(
        &self,
        handle: &ConnectionHandle,
        release_name: &str,
    ) -> Result<Vec<u8>> {
        let mut args = get_manifest_args(release_name);
        args.extend(Self::scope_args(handle));

        let output = self.run_with_ceiling(handle, args).await?;
        ensure!(
            output.status.success(),
            HelmGetManifestCommand {
                release_name: release_name.to_string(),
                namespace: handle.namespace().to_string(),
                std_err: String::from_utf8_lossy(&output.stderr).to_string(),
            }
        );
        Ok(output.stdout)
    }
}

/// Checks that a helm v3 binary is reachable in $PATH. Intended for use as an
/// environment preflight when the agent process starts.
pub async fn verify_helm_in_path() -> Result<()> {
    let args = vec_to_strings!["version", "--template", "{{ .Version }}"];
    let output = Command::new(HELM_COMMAND)
        .args(args.iter())
        .kill_on_drop(true)
        .output()
        .await
        .context(HelmCommand {
            command: HELM_COMMAND.to_string(),
            args,
        })?;
    ensure!(
        output.status.success(),
        HelmVersionCommand {
            std_err: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    );

    let version = str::from_utf8(&output.stdout)
        .context(U8VectorToString)?
        .trim()
        .to_string();
    let regex = Regex::new(HELM_V3_EXPR).context(RegexCompile {
        expression: HELM_V3_EXPR.to_string(),
    })?;
    ensure!(regex.is_match(version.as_str()), HelmVersion { version });
    Ok(())
}
