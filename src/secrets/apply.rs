// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of the Secret generated for a SopsSecret

use crate::decrypt::Decryptor;
use crate::error::{Error, Result};
use crate::kubernetes::SecretStore;
use crate::secrets::desired::build_secret;
use crate::secrets::ownership::ensure_controlled_by;
use crate::types::SopsSecret;
use k8s_openapi::api::core::v1::Secret;
use kube::{api::ObjectMeta, ResourceExt};
use std::fmt;
use tracing::{debug, info, instrument};

/// What the apply did to the Secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

impl OperationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationResult::Created => "created",
            OperationResult::Updated => "updated",
            OperationResult::Unchanged => "unchanged",
        }
    }

    /// Form used as event reason
    pub fn capitalized(&self) -> &'static str {
        match self {
            OperationResult::Created => "Created",
            OperationResult::Updated => "Updated",
            OperationResult::Unchanged => "Unchanged",
        }
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bring the Secret named after `source` in line with it, committing at most once
#[instrument(
    skip(store, decryptor, source),
    fields(sopssecret = %format!("{}/{}", source.namespace().unwrap_or_default(), source.name_any()))
)]
pub async fn apply_secret(
    store: &dyn SecretStore,
    decryptor: &dyn Decryptor,
    source: &SopsSecret,
) -> Result<OperationResult> {
    let name = source.name_any();
    let namespace = source
        .namespace()
        .ok_or(Error::MissingObjectKey("metadata.namespace"))?;

    let existing = store.get_secret(&namespace, &name).await?;

    let mut secret = match &existing {
        Some(current) => {
            ensure_controlled_by(current, source)?;
            current.clone()
        }
        None => Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(namespace.clone()),
                ..Default::default()
            },
            ..Default::default()
        },
    };

    build_secret(&mut secret, source, decryptor).await?;

    match existing {
        Some(current) if current == secret => {
            debug!("Secret {}/{} already up to date", namespace, name);
            Ok(OperationResult::Unchanged)
        }
        Some(_) => {
            store.replace_secret(&namespace, &name, &secret).await?;
            info!("Updated secret {}/{}", namespace, name);
            Ok(OperationResult::Updated)
        }
        None => {
            store.create_secret(&namespace, &secret).await?;
            info!("Created secret {}/{}", namespace, name);
            Ok(OperationResult::Created)
        }
    }
}
