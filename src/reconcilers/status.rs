// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Writes the outcome of a reconcile back onto the SopsSecret

use crate::error::Result;
use crate::kubernetes::SecretStore;
use crate::types::{SopsSecret, SopsSecretStatus};
use kube::ResourceExt;
use tracing::{debug, instrument};

/// Replace the status of `source` with `status` and persist it.
///
/// Returns the updated object so callers can keep working with what was written.
#[instrument(skip(store, source, status), fields(sopssecret = %source.name_any(), status = %status.status))]
pub async fn record_status(
    store: &dyn SecretStore,
    source: &SopsSecret,
    status: SopsSecretStatus,
) -> Result<SopsSecret> {
    let mut updated = source.clone();
    updated.status = Some(status);
    store.update_status(&updated).await?;
    debug!("Recorded status");
    Ok(updated)
}
