// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to managed Secrets and SopsSecret status

use crate::error::{Error, Result};
use crate::types::SopsSecret;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{Patch, PatchParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Object store operations the reconciler depends on
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a Secret, `None` when it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret>;

    /// Replace a Secret. The resourceVersion carried by `secret` guards the write.
    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<Secret>;

    /// Persist `source.status` wholesale
    async fn update_status(&self, source: &SopsSecret) -> Result<()>;
}

/// SecretStore backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self.secrets(namespace).get_opt(name).await?)
    }

    #[instrument(skip(self, secret), fields(secret = %secret.name_any()))]
    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let name = secret.name_any();
        self.secrets(namespace)
            .create(&PostParams::default(), secret)
            .await
            .map_err(|e| map_conflict(e, namespace, &name))
    }

    #[instrument(skip(self, secret))]
    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<Secret> {
        self.secrets(namespace)
            .replace(name, &PostParams::default(), secret)
            .await
            .map_err(|e| map_conflict(e, namespace, name))
    }

    #[instrument(skip(self, source), fields(sopssecret = %source.name_any()))]
    async fn update_status(&self, source: &SopsSecret) -> Result<()> {
        let namespace = source
            .namespace()
            .ok_or(Error::MissingObjectKey("metadata.namespace"))?;
        let api: Api<SopsSecret> = Api::namespaced(self.client.clone(), &namespace);

        let patch = serde_json::json!({
            "status": source.status.clone().unwrap_or_default(),
        });
        api.patch_status(&source.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!("Updated status of SopsSecret {}/{}", namespace, source.name_any());
        Ok(())
    }
}

/// 409 covers both AlreadyExists on create and a stale resourceVersion on replace
fn map_conflict(err: kube::Error, namespace: &str, name: &str) -> Error {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => Error::Conflict(format!(
            "secret {}/{}: {}",
            namespace, name, resp.message
        )),
        other => Error::Kube(other),
    }
}
