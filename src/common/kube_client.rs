use crate::common::error::{K8sClientGeneration, KubeClientSetBuilderNs, Result};
use k8s_openapi::api::core::v1::Namespace;
use kube::{api::Api, Client};
use snafu::ResultExt;

/// Builder for Kubernetes clients.
#[derive(Default)]
pub struct KubeClientSetBuilder {
    namespace: Option<String>,
}

impl KubeClientSetBuilder {
    /// Build Kubernetes API clients scoped to a specific namespace.
    #[must_use]
    pub fn with_namespace<T>(mut self, namespace: T) -> Self
    where
        T: ToString,
    {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Build the KubeClientSet.
    pub async fn build(self) -> Result<KubeClientSet> {
        // Namespace must be used.
        let namespace = self.namespace.ok_or(KubeClientSetBuilderNs.build())?;

        let client = Client::try_default().await.context(K8sClientGeneration)?;
        Ok(KubeClientSet {
            client: client.clone(),
            namespaces_api: Api::all(client),
            namespace,
        })
    }
}

/// This is a wrapper around kube::Client with helper methods to generate Api<?> clients.
pub struct KubeClientSet {
    client: Client,
    namespaces_api: Api<Namespace>,
    namespace: String,
}

impl KubeClientSet {
    pub fn builder() -> KubeClientSetBuilder {
        KubeClientSetBuilder::default()
    }

    /// Generate the Namespace api client.
    pub fn namespaces_api(&self) -> &Api<Namespace> {
        &self.namespaces_api
    }

    /// Get a clone of the kube::Client.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// The namespace this client set is scoped to.
    pub fn namespace(&self) -> &str {
        self.namespace.as_str()
    }
}
