// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sops_operator::config::Config;
use sops_operator::kubernetes::wait_for_sopssecret_crd;
use sops_operator::reconcilers::SopsSecretReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting SOPS operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, sops_binary={}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.sops_binary
    );

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    if config.wait_for_crd {
        info!("Waiting for SopsSecret CRD to become available...");
        wait_for_sopssecret_crd(&client).await?;
    }

    SopsSecretReconciler::new(client, config).run().await?;

    warn!("SopsSecret reconciler stopped");
    Ok(())
}
