// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! SopsSecret reconciler - decrypts SopsSecrets into Secrets and records the outcome.

use crate::config::Config;
use crate::constants::events::{
    ACTION_RECONCILE, ACTION_UPDATE_STATUS, MSG_STATUS_UPDATE_FAILED, REASON_PROCESSING_ERROR,
};
use crate::decrypt::{Decryptor, SopsDecryptor};
use crate::error::{Error, Result};
use crate::kubernetes::{
    capitalize_first, EventPublisher, KubeEventPublisher, KubeStore, SecretStore, Severity,
};
use crate::reconcilers::backoff::{next_retry_delay, BASE_RETRY};
use crate::reconcilers::status::record_status;
use crate::secrets::{apply_secret, OperationResult};
use crate::types::{SopsSecret, SopsSecretStatus};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Collaborators handed to every reconcile invocation
pub struct Context {
    pub store: Arc<dyn SecretStore>,
    pub decryptor: Arc<dyn Decryptor>,
    pub events: Arc<dyn EventPublisher>,
}

impl Context {
    pub fn new(
        store: Arc<dyn SecretStore>,
        decryptor: Arc<dyn Decryptor>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            decryptor,
            events,
        }
    }

    pub fn from_client(client: Client, config: &Config) -> Self {
        Self {
            store: Arc::new(KubeStore::new(client.clone())),
            decryptor: Arc::new(SopsDecryptor::new(config.sops_binary.clone())),
            events: Arc::new(KubeEventPublisher::new(client)),
        }
    }
}

pub struct SopsSecretReconciler {
    client: Client,
    config: Config,
}

impl SopsSecretReconciler {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Run the controller until a shutdown signal arrives.
    ///
    /// Owned Secrets are watched in the same scope as SopsSecrets. Without
    /// `WATCH_NAMESPACE` that means cluster-wide list/watch RBAC on Secrets, and
    /// every Secret in the cluster is held in the watch cache.
    pub async fn run(self) -> anyhow::Result<()> {
        let (sops_secrets, secrets): (Api<SopsSecret>, Api<Secret>) =
            match self.config.watch_namespace.as_deref() {
                Some(ns) => (
                    Api::namespaced(self.client.clone(), ns),
                    Api::namespaced(self.client.clone(), ns),
                ),
                None => (Api::all(self.client.clone()), Api::all(self.client.clone())),
            };
        let context = Arc::new(Context::from_client(self.client.clone(), &self.config));

        // Owned Secrets are watched too, so manual edits and deletions are reverted
        Controller::new(sops_secrets, WatcherConfig::default())
            .owns(secrets, WatcherConfig::default())
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled sopssecret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(sops_secret: Arc<SopsSecret>, ctx: Arc<Context>) -> Result<Action> {
    reconcile_at(&sops_secret, &ctx, Utc::now()).await
}

/// One reconcile of `source` as observed at `now`.
///
/// Every apply or status failure is turned into a requeue. An `Err` is only
/// returned for objects that cannot be addressed at all.
#[instrument(
    skip(source, ctx, now),
    fields(sopssecret = %format!("{}/{}", source.namespace().unwrap_or_default(), source.name_any()))
)]
pub async fn reconcile_at(source: &SopsSecret, ctx: &Context, now: DateTime<Utc>) -> Result<Action> {
    if source.namespace().is_none() {
        return Err(Error::MissingObjectKey("metadata.namespace"));
    }
    info!("Reconciling SopsSecret");

    let action = match apply_secret(ctx.store.as_ref(), ctx.decryptor.as_ref(), source).await {
        Ok(result) => manage_success(source, ctx, result, now).await,
        Err(e) => manage_error(source, ctx, &e, now).await,
    };
    Ok(action)
}

async fn manage_success(
    source: &SopsSecret,
    ctx: &Context,
    result: OperationResult,
    now: DateTime<Utc>,
) -> Action {
    if let Err(e) = record_status(ctx.store.as_ref(), source, SopsSecretStatus::success(now)).await {
        error!("Unable to update status: {}", e);
        ctx.events
            .publish(
                source,
                Severity::Warning,
                REASON_PROCESSING_ERROR,
                ACTION_UPDATE_STATUS,
                MSG_STATUS_UPDATE_FAILED,
            )
            .await;
        return Action::requeue(BASE_RETRY);
    }

    let reason = result.capitalized();
    ctx.events
        .publish(
            source,
            Severity::Normal,
            reason,
            ACTION_RECONCILE,
            &format!("{} secret: {}", reason, source.name_any()),
        )
        .await;

    Action::await_change()
}

async fn manage_error(source: &SopsSecret, ctx: &Context, issue: &Error, now: DateTime<Utc>) -> Action {
    let message = issue.to_string();
    warn!(kind = ?issue.kind(), "Reconcile failed: {}", message);

    ctx.events
        .publish(
            source,
            Severity::Warning,
            REASON_PROCESSING_ERROR,
            ACTION_RECONCILE,
            &capitalize_first(&message),
        )
        .await;

    let status = SopsSecretStatus::failure(now, message);
    if let Err(e) = record_status(ctx.store.as_ref(), source, status).await {
        error!("Unable to update status: {}", e);
        ctx.events
            .publish(
                source,
                Severity::Warning,
                REASON_PROCESSING_ERROR,
                ACTION_UPDATE_STATUS,
                MSG_STATUS_UPDATE_FAILED,
            )
            .await;
        return Action::requeue(BASE_RETRY);
    }

    let delay = next_retry_delay(source.status.as_ref(), now);
    debug!("Retrying in {:?}", delay);
    Action::requeue(delay)
}

fn error_policy(_sops_secret: Arc<SopsSecret>, error: &Error, _ctx: Arc<Context>) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(BASE_RETRY)
}
