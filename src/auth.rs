use crate::{
    common::error::{Result, SerializeRegistryConfig},
    release::HelmDeployment,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use snafu::ResultExt;
use std::collections::BTreeMap;

/// Resolves registry credentials for a deployment's chart source. Consulted at
/// most once per namespace, when the connection for that namespace is first
/// created.
#[async_trait]
pub trait AuthResolver: Send + Sync {
    /// Produce credentials scoped to the deployment's chart source registry.
    /// Returns None when the source requires no authentication.
    async fn ensure_auth(&self, deployment: &HelmDeployment)
        -> Result<Option<RegistryCredentials>>;
}

/// Credentials for one OCI registry host.
#[derive(Clone, Debug)]
pub struct RegistryCredentials {
    registry: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct DockerConfig<'a> {
    auths: BTreeMap<&'a str, DockerAuth<'a>>,
}

#[derive(Serialize)]
struct DockerAuth<'a> {
    username: &'a str,
    password: &'a str,
    auth: String,
}

impl RegistryCredentials {
    pub fn new<R, U, P>(registry: R, username: U, password: P) -> Self
    where
        R: ToString,
        U: ToString,
        P: ToString,
    {
        RegistryCredentials {
            registry: registry.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn registry(&self) -> &str {
        self.registry.as_str()
    }

    /// Render the docker-config JSON which helm reads through its
    /// `--registry-config` option.
    pub(crate) fn to_docker_config(&self) -> Result<Vec<u8>> {
        let auth = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut auths = BTreeMap::new();
        auths.insert(
            self.registry.as_str(),
            DockerAuth {
                username: self.username.as_str(),
                password: self.password.as_str(),
                auth,
            },
        );
        serde_json::to_vec(&DockerConfig { auths }).context(SerializeRegistryConfig {
            registry: self.registry.clone(),
        })
    }
}

/// An AuthResolver which hands out the same credentials for every deployment.
/// Useful when the agent is configured with a single registry account.
pub struct StaticAuthResolver {
    credentials: Option<RegistryCredentials>,
}

impl StaticAuthResolver {
    pub fn new(credentials: Option<RegistryCredentials>) -> Self {
        StaticAuthResolver { credentials }
    }
}

#[async_trait]
impl AuthResolver for StaticAuthResolver {
    async fn ensure_auth(
        &self,
        _deployment: &HelmDeployment,
    ) -> Result<Option<RegistryCredentials>> {
        Ok(self.credentials.clone())
    }
}
