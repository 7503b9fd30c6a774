use crate::{
    auth::AuthResolver,
    common::{
        constants::HELM_TIMEOUT,
        error::{LifecycleOptionsAbsent, NoReleaseHistory, Result, SerializeValues},
        validators::validate_release_name,
    },
    helm::{
        chart::{resolve_chart, ChartBundle, ChartLocator, ChartPathOptions, HelmChartLocator},
        client::{HelmClient, LifecycleRequest, ReleaseBackend, UninstallRequest},
        connection::{ConnectionCache, ConnectionHandle, HelmSettings, KubeClusterInit},
    },
    manifest::decode_resource_yaml,
};
use kube::core::DynamicObject;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::sync::Arc;
use tracing::{info, Instrument};

/// One release to manage, as instructed by the fleet-management backend.
/// The chart URL together with the chart name determines the source kind: an
/// `oci://` URL is itself the fully-qualified chart reference, anything else
/// is a chart repository the chart name is looked up in.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmDeployment {
    release_name: String,
    chart_name: String,
    chart_version: String,
    chart_url: String,
    #[serde(default)]
    values: serde_json::Map<String, serde_json::Value>,
    revision_id: String,
}

impl HelmDeployment {
    pub fn new<R, C, V, U, I>(
        release_name: R,
        chart_name: C,
        chart_version: V,
        chart_url: U,
        values: serde_json::Map<String, serde_json::Value>,
        revision_id: I,
    ) -> Self
    where
        R: ToString,
        C: ToString,
        V: ToString,
        U: ToString,
        I: ToString,
    {
        HelmDeployment {
            release_name: release_name.to_string(),
            chart_name: chart_name.to_string(),
            chart_version: chart_version.to_string(),
            chart_url: chart_url.to_string(),
            values,
            revision_id: revision_id.to_string(),
        }
    }

    pub fn release_name(&self) -> &str {
        self.release_name.as_str()
    }

    pub fn chart_name(&self) -> &str {
        self.chart_name.as_str()
    }

    pub fn chart_version(&self) -> &str {
        self.chart_version.as_str()
    }

    pub fn chart_url(&self) -> &str {
        self.chart_url.as_str()
    }

    pub fn values(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.values
    }

    pub fn revision_id(&self) -> &str {
        self.revision_id.as_str()
    }

    /// The values tree as YAML for helm's stdin, None when there are no values.
    fn render_values(&self) -> Result<Option<String>> {
        if self.values.is_empty() {
            return Ok(None);
        }
        serde_yaml::to_string(&self.values)
            .map(Some)
            .context(SerializeValues {
                release_name: self.release_name.clone(),
            })
    }
}

/// The result of a successful install or upgrade, reported back to the
/// fleet-management backend.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    release_name: String,
    revision: i64,
    revision_id: String,
}

impl ReleaseRecord {
    pub fn new<R, I>(release_name: R, revision: i64, revision_id: I) -> Self
    where
        R: ToString,
        I: ToString,
    {
        ReleaseRecord {
            release_name: release_name.to_string(),
            revision,
            revision_id: revision_id.to_string(),
        }
    }

    pub fn release_name(&self) -> &str {
        self.release_name.as_str()
    }

    /// Backend-assigned revision, increasing by one with every install or
    /// upgrade of the release.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Identifier correlating this deployment to its central record. Carried
    /// through from the deployment, never generated here.
    pub fn revision_id(&self) -> &str {
        self.revision_id.as_str()
    }
}

/// This is a builder for the production ReleaseLifecycle.
#[derive(Default)]
pub struct ReleaseLifecycleBuilder {
    settings: Option<HelmSettings>,
    auth_resolver: Option<Arc<dyn AuthResolver>>,
}

impl ReleaseLifecycleBuilder {
    /// This is a builder option to set the process-wide helm settings.
    #[must_use]
    pub fn with_settings(mut self, settings: HelmSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// This is a builder option to set the registry authenticator resolver.
    #[must_use]
    pub fn with_auth_resolver(mut self, auth_resolver: Arc<dyn AuthResolver>) -> Self {
        self.auth_resolver = Some(auth_resolver);
        self
    }

    /// This builds the ReleaseLifecycle.
    pub fn build(self) -> Result<ReleaseLifecycle> {
        let auth_resolver = self.auth_resolver.ok_or(LifecycleOptionsAbsent.build())?;
        let cache = ConnectionCache::new(
            self.settings.unwrap_or_default(),
            auth_resolver,
            Arc::new(KubeClusterInit),
        );
        Ok(ReleaseLifecycle::new(cache, HelmClient, HelmChartLocator))
    }
}

/// Manages the lifecycle of helm releases: install, upgrade, uninstall and
/// inspection. Each operation borrows a cached namespace connection for the
/// duration of the call, resolves the deployment's chart where one is needed,
/// and runs the backend action with wait-for-ready semantics, a fixed timeout
/// and rollback-on-failure.
pub struct ReleaseLifecycle<B = HelmClient, L = HelmChartLocator> {
    cache: ConnectionCache,
    backend: B,
    locator: L,
}

impl ReleaseLifecycle {
    /// This creates a default instance of the ReleaseLifecycleBuilder.
    pub fn builder() -> ReleaseLifecycleBuilder {
        ReleaseLifecycleBuilder::default()
    }
}

impl<B, L> ReleaseLifecycle<B, L>
where
    B: ReleaseBackend,
    L: ChartLocator,
{
    pub fn new(cache: ConnectionCache, backend: B, locator: L) -> Self {
        ReleaseLifecycle {
            cache,
            backend,
            locator,
        }
    }

    pub fn connections(&self) -> &ConnectionCache {
        &self.cache
    }

    /// Installs a new release for the deployment. The release must not exist
    /// yet; the backend rejects a name that is still in use. A failed install
    /// leaves no partial release state behind.
    pub async fn install(
        &self,
        namespace: &str,
        deployment: &HelmDeployment,
    ) -> Result<ReleaseRecord> {
        validate_release_name(deployment.release_name())?;
        let handle = self.cache.get_or_init(namespace, Some(deployment)).await?;
        let span = handle.span().clone();

        async {
            let chart = self.preflight(&handle, deployment).await?;
            let request = LifecycleRequest {
                release_name: deployment.release_name().to_string(),
                chart_dir: chart.dir().to_path_buf(),
                values_yaml: deployment.render_values()?,
                timeout: HELM_TIMEOUT,
                wait: true,
                atomic: true,
                cleanup_on_fail: false,
            };
            let release = self.backend.install(&handle, &request).await?;
            info!(
                release.name = release.name(),
                release.revision = release.version(),
                chart.name = chart.metadata().name(),
                "Installed helm release"
            );
            Ok(ReleaseRecord::new(
                release.name(),
                release.version(),
                deployment.revision_id(),
            ))
        }
        .instrument(span)
        .await
    }

    /// Upgrades an existing release to the deployment's chart and values. The
    /// backend rolls back to the previous revision on failure and removes
    /// resources a failed upgrade created.
    pub async fn upgrade(
        &self,
        namespace: &str,
        deployment: &HelmDeployment,
    ) -> Result<ReleaseRecord> {
        validate_release_name(deployment.release_name())?;
        let handle = self.cache.get_or_init(namespace, Some(deployment)).await?;
        let span = handle.span().clone();

        async {
            let chart = self.preflight(&handle, deployment).await?;
            let request = LifecycleRequest {
                release_name: deployment.release_name().to_string(),
                chart_dir: chart.dir().to_path_buf(),
                values_yaml: deployment.render_values()?,
                timeout: HELM_TIMEOUT,
                wait: true,
                atomic: true,
                cleanup_on_fail: true,
            };
            let release = self.backend.upgrade(&handle, &request).await?;
            info!(
                release.name = release.name(),
                release.revision = release.version(),
                chart.name = chart.metadata().name(),
                "Upgraded helm release"
            );
            Ok(ReleaseRecord::new(
                release.name(),
                release.version(),
                deployment.revision_id(),
            ))
        }
        .instrument(span)
        .await
    }

    /// Uninstalls a release by name. No registry access is needed to remove a
    /// release, so no deployment is consulted. Removing an already-absent
    /// release is not an error, which keeps retried uninstall commands safe.
    pub async fn uninstall(&self, namespace: &str, release_name: &str) -> Result<()> {
        validate_release_name(release_name)?;
        let handle = self.cache.get_or_init(namespace, None).await?;
        let span = handle.span().clone();

        async {
            let request = UninstallRequest {
                release_name: release_name.to_string(),
                timeout: HELM_TIMEOUT,
                wait: true,
                ignore_not_found: true,
            };
            self.backend.uninstall(&handle, &request).await?;
            info!(release.name = release_name, "Uninstalled helm release");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Returns the record of the deployment's most recent revision. Fails
    /// with a no-history error if the release was never installed.
    pub async fn get_latest_release(
        &self,
        namespace: &str,
        deployment: &HelmDeployment,
    ) -> Result<ReleaseRecord> {
        validate_release_name(deployment.release_name())?;
        let handle = self.cache.get_or_init(namespace, Some(deployment)).await?;
        let span = handle.span().clone();

        async {
            let history = self
                .backend
                .history(&handle, deployment.release_name())
                .await?;
            // History is ordered by ascending revision; the latest is last.
            let latest = history.last().ok_or(
                NoReleaseHistory {
                    release_name: deployment.release_name().to_string(),
                    namespace: handle.namespace().to_string(),
                }
                .build(),
            )?;
            Ok(ReleaseRecord::new(
                deployment.release_name(),
                latest.revision(),
                deployment.revision_id(),
            ))
        }
        .instrument(span)
        .await
    }

    /// Fetches the rendered manifest of the release's current revision and
    /// decodes it into individual resource objects. A chart which rendered no
    /// resources produces an empty list.
    pub async fn get_manifest(
        &self,
        namespace: &str,
        deployment: &HelmDeployment,
    ) -> Result<Vec<DynamicObject>> {
        validate_release_name(deployment.release_name())?;
        let handle = self.cache.get_or_init(namespace, Some(deployment)).await?;
        let span = handle.span().clone();

        async {
            let manifest = self
                .backend
                .get_manifest(&handle, deployment.release_name())
                .await?;
            decode_resource_yaml(manifest.as_slice())
        }
        .instrument(span)
        .await
    }

    /// Resolves the deployment's chart into a loadable bundle. Chart content
    /// may change between calls even for the same release name, so this runs
    /// for every install and upgrade.
    async fn preflight(
        &self,
        handle: &ConnectionHandle,
        deployment: &HelmDeployment,
    ) -> Result<ChartBundle> {
        let mut options = ChartPathOptions {
            registry_config: handle.registry_config().map(|path| path.to_path_buf()),
            ..Default::default()
        };
        let scratch = handle
            .settings()
            .work_dir()
            .join("charts")
            .join(handle.namespace())
            .join(deployment.release_name());
        resolve_chart(&self.locator, &mut options, deployment, scratch.as_path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::{HelmDeployment, ReleaseLifecycle};
    use crate::{
        auth::{AuthResolver, RegistryCredentials},
        common::error::{
            Error, HelmInstallCommand, HelmUpgradeCommand, Result,
        },
        helm::{
            chart::{ChartLocator, ChartPathOptions},
            client::{
                HistoryEntry, InstalledRelease, LifecycleRequest, ReleaseBackend,
                UninstallRequest,
            },
            connection::{ClusterInit, ConnectionCache, ConnectionHandle, HelmSettings},
        },
    };
    use async_trait::async_trait;
    use std::{
        collections::HashMap,
        fs,
        path::{Path, PathBuf},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    static TEST_DIR_ID: AtomicUsize = AtomicUsize::new(0);

    fn test_settings() -> HelmSettings {
        let dir = std::env::temp_dir().join(format!(
            "release-agent-release-test-{}-{}",
            std::process::id(),
            TEST_DIR_ID.fetch_add(1, Ordering::Relaxed)
        ));
        HelmSettings::builder().with_work_dir(dir).build()
    }

    fn oci_deployment(release_name: &str) -> HelmDeployment {
        HelmDeployment::new(
            release_name,
            "oci://registry.example.com/charts/app",
            "1.0.0",
            "oci://registry.example.com/charts/app",
            serde_json::Map::new(),
            "rev-1",
        )
    }

    #[derive(Default)]
    struct CountingAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthResolver for CountingAuth {
        async fn ensure_auth(
            &self,
            _deployment: &HelmDeployment,
        ) -> Result<Option<RegistryCredentials>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(RegistryCredentials::new(
                "registry.example.com",
                "robot",
                "s3cret",
            )))
        }
    }

    #[derive(Default)]
    struct NoopInit;

    #[async_trait]
    impl ClusterInit for NoopInit {
        async fn init(&self, _namespace: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Unpacks a canned chart instead of fetching one.
    #[derive(Default)]
    struct FakeLocator;

    #[async_trait]
    impl ChartLocator for FakeLocator {
        async fn locate(
            &self,
            chart_ref: &str,
            options: &ChartPathOptions,
            dest: &Path,
        ) -> Result<PathBuf> {
            let name = chart_ref
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(chart_ref);
            let dir = dest.join(name);
            fs::create_dir_all(dir.as_path()).unwrap();
            fs::write(
                dir.join("Chart.yaml"),
                format!("apiVersion: v2\nname: {name}\nversion: {}\n", options.version()),
            )
            .unwrap();
            Ok(dir)
        }
    }

    #[derive(Default)]
    struct FakeState {
        releases: HashMap<String, Vec<HistoryEntry>>,
        manifests: HashMap<String, Vec<u8>>,
        mutations: usize,
        last_lifecycle_request: Option<LifecycleRequest>,
        last_uninstall_request: Option<UninstallRequest>,
    }

    /// In-memory stand-in for the helm backend, honoring its contract:
    /// install rejects existing names, upgrade rejects absent ones, revisions
    /// increase by one, uninstall honors ignore-not-found.
    #[derive(Clone, Default)]
    struct FakeBackend {
        state: Arc<Mutex<FakeState>>,
        install_delay: Option<Duration>,
    }

    #[async_trait]
    impl ReleaseBackend for FakeBackend {
        async fn install(
            &self,
            handle: &ConnectionHandle,
            request: &LifecycleRequest,
        ) -> Result<InstalledRelease> {
            if let Some(delay) = self.install_delay {
                tokio::time::sleep(delay).await;
            }
            let mut state = self.state.lock().unwrap();
            state.last_lifecycle_request = Some(request.clone());
            if state.releases.contains_key(request.release_name.as_str()) {
                return Err(HelmInstallCommand {
                    release_name: request.release_name.clone(),
                    namespace: handle.namespace().to_string(),
                    args: vec![],
                    std_err: "cannot re-use a name that is still in use".to_string(),
                }
                .build());
            }
            state
                .releases
                .insert(request.release_name.clone(), vec![HistoryEntry::new(1)]);
            state.mutations += 1;
            Ok(InstalledRelease::new(request.release_name.as_str(), 1))
        }

        async fn upgrade(
            &self,
            handle: &ConnectionHandle,
            request: &LifecycleRequest,
        ) -> Result<InstalledRelease> {
            let mut state = self.state.lock().unwrap();
            state.last_lifecycle_request = Some(request.clone());
            let history = state
                .releases
                .get_mut(request.release_name.as_str())
                .ok_or(
                    HelmUpgradeCommand {
                        release_name: request.release_name.clone(),
                        namespace: handle.namespace().to_string(),
                        args: vec![],
                        std_err: "has no deployed releases".to_string(),
                    }
                    .build(),
                )?;
            let revision = history.last().map(HistoryEntry::revision).unwrap_or(0) + 1;
            history.push(HistoryEntry::new(revision));
            state.mutations += 1;
            Ok(InstalledRelease::new(request.release_name.as_str(), revision))
        }

        async fn uninstall(
            &self,
            _handle: &ConnectionHandle,
            request: &UninstallRequest,
        ) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            state.last_uninstall_request = Some(request.clone());
            if state.releases.remove(request.release_name.as_str()).is_some() {
                state.mutations += 1;
            }
            // With ignore_not_found requested, an absent release is success.
            Ok(())
        }

        async fn history(
            &self,
            _handle: &ConnectionHandle,
            release_name: &str,
        ) -> Result<Vec<HistoryEntry>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .releases
                .get(release_name)
                .cloned()
                .unwrap_or_default())
        }

        async fn get_manifest(
            &self,
            _handle: &ConnectionHandle,
            release_name: &str,
        ) -> Result<Vec<u8>> {
            let state = self.state.lock().unwrap();
            Ok(state
                .manifests
                .get(release_name)
                .cloned()
                .unwrap_or_default())
        }
    }

    fn lifecycle(backend: FakeBackend) -> ReleaseLifecycle<FakeBackend, FakeLocator> {
        let cache = ConnectionCache::new(
            test_settings(),
            Arc::new(CountingAuth::default()),
            Arc::new(NoopInit),
        );
        ReleaseLifecycle::new(cache, backend, FakeLocator)
    }

    #[tokio::test]
    async fn test_install_returns_first_revision_record() {
        let lifecycle = lifecycle(FakeBackend::default());

        let record = lifecycle
            .install("ns1", &oci_deployment("app"))
            .await
            .unwrap();

        assert_eq!(record.release_name(), "app");
        assert_eq!(record.revision(), 1);
        assert_eq!(record.revision_id(), "rev-1");
    }

    #[tokio::test]
    async fn test_install_requests_wait_atomic_and_timeout() {
        let backend = FakeBackend::default();
        let lifecycle = lifecycle(backend.clone());

        lifecycle
            .install("ns1", &oci_deployment("app"))
            .await
            .unwrap();

        let state = backend.state.lock().unwrap();
        let request = state.last_lifecycle_request.as_ref().unwrap();
        assert!(request.wait);
        assert!(request.atomic);
        assert!(!request.cleanup_on_fail);
        assert_eq!(request.timeout, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_install_of_existing_release_is_rejected() {
        let lifecycle = lifecycle(FakeBackend::default());
        let deployment = oci_deployment("app");

        lifecycle.install("ns1", &deployment).await.unwrap();
        let error = lifecycle.install("ns1", &deployment).await.unwrap_err();

        assert!(matches!(error, Error::HelmInstallCommand { .. }));
    }

    #[tokio::test]
    async fn test_upgrade_increments_revision() {
        let lifecycle = lifecycle(FakeBackend::default());
        let deployment = oci_deployment("app");

        let installed = lifecycle.install("ns1", &deployment).await.unwrap();
        let upgraded = lifecycle.upgrade("ns1", &deployment).await.unwrap();

        assert!(upgraded.revision() > installed.revision());
        assert_eq!(upgraded.revision(), 2);
    }

    #[tokio::test]
    async fn test_upgrade_requests_cleanup_on_fail() {
        let backend = FakeBackend::default();
        let lifecycle = lifecycle(backend.clone());
        let deployment = oci_deployment("app");

        lifecycle.install("ns1", &deployment).await.unwrap();
        lifecycle.upgrade("ns1", &deployment).await.unwrap();

        let state = backend.state.lock().unwrap();
        let request = state.last_lifecycle_request.as_ref().unwrap();
        assert!(request.cleanup_on_fail);
        assert!(request.atomic);
    }

    #[tokio::test]
    async fn test_upgrade_of_absent_release_is_rejected() {
        let lifecycle = lifecycle(FakeBackend::default());

        let error = lifecycle
            .upgrade("ns1", &oci_deployment("app"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::HelmUpgradeCommand { .. }));
    }

    #[tokio::test]
    async fn test_uninstall_is_idempotent() {
        let backend = FakeBackend::default();
        let lifecycle = lifecycle(backend.clone());

        lifecycle
            .install("ns1", &oci_deployment("app"))
            .await
            .unwrap();

        lifecycle.uninstall("ns1", "app").await.unwrap();
        let mutations = backend.state.lock().unwrap().mutations;

        // The second uninstall succeeds without mutating anything.
        lifecycle.uninstall("ns1", "app").await.unwrap();
        let state = backend.state.lock().unwrap();
        assert_eq!(state.mutations, mutations);
        assert!(state.last_uninstall_request.as_ref().unwrap().ignore_not_found);
    }

    #[tokio::test]
    async fn test_uninstall_of_unknown_release_succeeds() {
        let lifecycle = lifecycle(FakeBackend::default());
        assert!(lifecycle.uninstall("ns1", "does-not-exist").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_latest_release_returns_highest_revision() {
        let lifecycle = lifecycle(FakeBackend::default());
        let deployment = oci_deployment("app");

        lifecycle.install("ns1", &deployment).await.unwrap();
        for _ in 0..3 {
            lifecycle.upgrade("ns1", &deployment).await.unwrap();
        }

        let latest = lifecycle
            .get_latest_release("ns1", &deployment)
            .await
            .unwrap();
        assert_eq!(latest.revision(), 4);
    }

    #[tokio::test]
    async fn test_get_latest_release_fails_without_history() {
        let lifecycle = lifecycle(FakeBackend::default());

        let error = lifecycle
            .get_latest_release("ns1", &oci_deployment("app"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::NoReleaseHistory { .. }));
    }

    #[tokio::test]
    async fn test_canceled_install_leaves_no_history() {
        let backend = FakeBackend {
            install_delay: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        let lifecycle = lifecycle(backend.clone());
        let deployment = oci_deployment("app");

        let canceled =
            tokio::time::timeout(Duration::from_millis(50), lifecycle.install("ns1", &deployment))
                .await;
        assert!(canceled.is_err());

        let error = lifecycle
            .get_latest_release("ns1", &deployment)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::NoReleaseHistory { .. }));
    }

    #[tokio::test]
    async fn test_get_manifest_decodes_resources() {
        let backend = FakeBackend::default();
        backend.state.lock().unwrap().manifests.insert(
            "app".to_string(),
            b"---\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app\n".to_vec(),
        );
        let lifecycle = lifecycle(backend);

        let resources = lifecycle
            .get_manifest("ns1", &oci_deployment("app"))
            .await
            .unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].types.as_ref().unwrap().kind.as_str(), "ConfigMap");
    }

    #[tokio::test]
    async fn test_get_manifest_of_empty_release_is_empty() {
        let lifecycle = lifecycle(FakeBackend::default());

        let resources = lifecycle
            .get_manifest("ns1", &oci_deployment("app"))
            .await
            .unwrap();
        assert!(resources.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_release_name_is_rejected_before_any_backend_call() {
        let backend = FakeBackend::default();
        let lifecycle = lifecycle(backend.clone());
        let deployment = HelmDeployment::new(
            "Not-A-Release",
            "oci://registry.example.com/charts/app",
            "1.0.0",
            "oci://registry.example.com/charts/app",
            serde_json::Map::new(),
            "rev-1",
        );

        let error = lifecycle.install("ns1", &deployment).await.unwrap_err();

        assert!(matches!(error, Error::InvalidReleaseName { .. }));
        assert!(backend.state.lock().unwrap().last_lifecycle_request.is_none());
    }

    #[test]
    fn test_render_values() {
        let mut values = serde_json::Map::new();
        values.insert("replicas".to_string(), serde_json::Value::from(2));
        let deployment = HelmDeployment::new(
            "app",
            "app",
            "1.0.0",
            "https://charts.example.com",
            values,
            "rev-1",
        );

        let rendered = deployment.render_values().unwrap().unwrap();
        assert!(rendered.contains("replicas: 2"));

        assert!(oci_deployment("app").render_values().unwrap().is_none());
    }

    #[test]
    fn test_deployment_deserializes_from_camel_case() {
        let raw = r#"{
            "releaseName": "app",
            "chartName": "app",
            "chartVersion": "1.0.0",
            "chartUrl": "https://charts.example.com",
            "values": {"replicas": 2},
            "revisionId": "rev-7"
        }"#;
        let deployment: HelmDeployment = serde_json::from_str(raw).unwrap();
        assert_eq!(deployment.release_name(), "app");
        assert_eq!(deployment.revision_id(), "rev-7");
        assert_eq!(deployment.values()["replicas"], 2);
    }
}
