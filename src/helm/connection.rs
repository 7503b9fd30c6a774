use crate::{
    auth::{AuthResolver, RegistryCredentials},
    common::{
        constants::HELM_STORAGE_DRIVER,
        error::{GetNamespace, Result, WorkdirSetup, WriteRegistryConfig},
        kube_client::KubeClientSet,
        validators::validate_namespace,
    },
    release::HelmDeployment,
};
use async_trait::async_trait;
use snafu::ResultExt;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio::sync::OnceCell;

/// Process-wide helm environment configuration. Read-only once built; shared
/// by every connection handle.
#[derive(Clone, Debug)]
pub struct HelmSettings {
    kubeconfig: Option<PathBuf>,
    kube_context: Option<String>,
    work_dir: PathBuf,
}

impl Default for HelmSettings {
    fn default() -> Self {
        HelmSettings {
            kubeconfig: None,
            kube_context: None,
            work_dir: std::env::temp_dir().join("release-agent"),
        }
    }
}

/// This is a builder for HelmSettings.
#[derive(Default)]
pub struct HelmSettingsBuilder {
    kubeconfig: Option<PathBuf>,
    kube_context: Option<String>,
    work_dir: Option<PathBuf>,
}

impl HelmSettingsBuilder {
    /// This is a builder option to set the kubeconfig file helm commands run with.
    #[must_use]
    pub fn with_kubeconfig(mut self, kubeconfig: PathBuf) -> Self {
        self.kubeconfig = Some(kubeconfig);
        self
    }

    /// This is a builder option to set the kubeconfig context helm commands run with.
    #[must_use]
    pub fn with_kube_context<T>(mut self, kube_context: T) -> Self
    where
        T: ToString,
    {
        self.kube_context = Some(kube_context.to_string());
        self
    }

    /// This is a builder option to set the directory for chart downloads and
    /// registry config files.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    /// This builds the HelmSettings.
    pub fn build(self) -> HelmSettings {
        let defaults = HelmSettings::default();
        HelmSettings {
            kubeconfig: self.kubeconfig,
            kube_context: self.kube_context,
            work_dir: self.work_dir.unwrap_or(defaults.work_dir),
        }
    }
}

impl HelmSettings {
    pub fn builder() -> HelmSettingsBuilder {
        HelmSettingsBuilder::default()
    }

    pub fn kubeconfig(&self) -> Option<&Path> {
        self.kubeconfig.as_deref()
    }

    pub fn kube_context(&self) -> Option<&str> {
        self.kube_context.as_deref()
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.as_path()
    }
}

/// Initializes cluster access for a namespace before its connection handle is
/// cached. Failure means nothing is cached for the namespace.
#[async_trait]
pub trait ClusterInit: Send + Sync {
    async fn init(&self, namespace: &str) -> Result<()>;
}

/// Production initializer. Generates Kubernetes API clients and verifies that
/// the target namespace exists.
#[derive(Default)]
pub struct KubeClusterInit;

#[async_trait]
impl ClusterInit for KubeClusterInit {
    async fn init(&self, namespace: &str) -> Result<()> {
        let clients = KubeClientSet::builder()
            .with_namespace(namespace)
            .build()
            .await?;
        clients
            .namespaces_api()
            .get(namespace)
            .await
            .context(GetNamespace { namespace })?;
        Ok(())
    }
}

/// A namespace-scoped helm connection. Built once per namespace, then reused
/// unchanged for every operation against that namespace.
#[derive(Debug)]
pub struct ConnectionHandle {
    namespace: String,
    settings: Arc<HelmSettings>,
    registry_config: Option<PathBuf>,
    span: tracing::Span,
}

impl ConnectionHandle {
    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }

    pub(crate) fn settings(&self) -> &HelmSettings {
        &self.settings
    }

    /// The storage driver release state is tracked in. Fixed for every handle.
    pub fn storage_driver(&self) -> &'static str {
        HELM_STORAGE_DRIVER
    }

    /// Path of the registry config file helm authenticates OCI pulls with.
    /// None when the handle was created for an operation without registry
    /// access, or when the deployment's source needs no authentication.
    pub(crate) fn registry_config(&self) -> Option<&Path> {
        self.registry_config.as_deref()
    }

    pub(crate) fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// Caches one ConnectionHandle per namespace for the lifetime of the process.
/// Authentication and cluster initialization run at most once per namespace;
/// concurrent first-time callers for the same namespace share a single
/// initialization attempt.
pub struct ConnectionCache {
    settings: Arc<HelmSettings>,
    auth: Arc<dyn AuthResolver>,
    cluster_init: Arc<dyn ClusterInit>,
    handles: Mutex<HashMap<String, Arc<OnceCell<Arc<ConnectionHandle>>>>>,
}

impl ConnectionCache {
    pub fn new(
        settings: HelmSettings,
        auth: Arc<dyn AuthResolver>,
        cluster_init: Arc<dyn ClusterInit>,
    ) -> Self {
        ConnectionCache {
            settings: Arc::new(settings),
            auth,
            cluster_init,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached handle for the namespace, creating it on first use.
    /// An existing handle is returned unchanged, with no re-authentication,
    /// regardless of the deployment passed this time. A deployment is only
    /// consulted, for registry authentication, when a handle is first created;
    /// operations without registry access pass None.
    pub async fn get_or_init(
        &self,
        namespace: &str,
        deployment: Option<&HelmDeployment>,
    ) -> Result<Arc<ConnectionHandle>> {
        validate_namespace(namespace)?;

        let cell = {
            let mut handles = self.handles.lock().expect("connection cache lock poisoned");
            handles
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let handle = cell
            .get_or_try_init(|| self.init_handle(namespace, deployment))
            .await?;
        Ok(handle.clone())
    }

    /// Drops the cached handle for a namespace. The next operation against the
    /// namespace re-authenticates and re-initializes, picking up rotated
    /// registry credentials.
    pub fn invalidate(&self, namespace: &str) {
        self.handles
            .lock()
            .expect("connection cache lock poisoned")
            .remove(namespace);
    }

    /// Drops all cached handles.
    pub fn reset(&self) {
        self.handles
            .lock()
            .expect("connection cache lock poisoned")
            .clear();
    }

    async fn init_handle(
        &self,
        namespace: &str,
        deployment: Option<&HelmDeployment>,
    ) -> Result<Arc<ConnectionHandle>> {
        let registry_config = match deployment {
            Some(deployment) => match self.auth.ensure_auth(deployment).await? {
                Some(credentials) => Some(self.write_registry_config(namespace, &credentials)?),
                None => None,
            },
            None => None,
        };

        self.cluster_init.init(namespace).await?;

        tracing::debug!(
            namespace,
            authenticated = registry_config.is_some(),
            "Initialized helm connection"
        );

        Ok(Arc::new(ConnectionHandle {
            namespace: namespace.to_string(),
            settings: self.settings.clone(),
            registry_config,
            span: tracing::info_span!("helm", namespace = %namespace),
        }))
    }

    fn write_registry_config(
        &self,
        namespace: &str,
        credentials: &RegistryCredentials,
    ) -> Result<PathBuf> {
        let dir = self.settings.work_dir().join("registry");
        fs::create_dir_all(dir.as_path()).context(WorkdirSetup { path: dir.clone() })?;

        let path = dir.join(format!("{namespace}.json"));
        fs::write(path.as_path(), credentials.to_docker_config()?)
            .context(WriteRegistryConfig { path: path.clone() })?;
        Ok(path)
    }
}
