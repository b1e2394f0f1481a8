// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Desired body of the Secret generated from a SopsSecret

use crate::decrypt::Decryptor;
use crate::error::Result;
use crate::secrets::ownership::set_controller_reference;
use crate::types::SopsSecret;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Decrypt every `stringData` entry of `source`.
///
/// Each value is stored as the base64 text of its plaintext. The API server
/// encodes `data` once more on the wire, so readers see it encoded twice.
/// Existing consumers depend on that layout.
#[instrument(skip(source, decryptor), fields(entries = source.spec.string_data.len()))]
pub async fn decrypt_data(
    source: &SopsSecret,
    decryptor: &dyn Decryptor,
) -> Result<BTreeMap<String, ByteString>> {
    let mut data = BTreeMap::new();
    for (name, ciphertext) in &source.spec.string_data {
        let plaintext = decryptor.decrypt(name, ciphertext).await?;
        data.insert(name.clone(), ByteString(STANDARD.encode(plaintext).into_bytes()));
    }
    debug!("Decrypted {} entries", data.len());
    Ok(data)
}

/// Labels or annotations for the Secret: the SopsSecret's own, overlaid with the
/// ones declared under `spec.metadata`
fn merged(
    own: Option<&BTreeMap<String, String>>,
    declared: &BTreeMap<String, String>,
) -> Option<BTreeMap<String, String>> {
    let mut out = own.cloned().unwrap_or_default();
    out.extend(declared.iter().map(|(k, v)| (k.clone(), v.clone())));
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Mutate `secret` into the body `source` asks for.
///
/// Nothing is written to `secret` unless every entry decrypts.
pub async fn build_secret(
    secret: &mut Secret,
    source: &SopsSecret,
    decryptor: &dyn Decryptor,
) -> Result<()> {
    let data = decrypt_data(source, decryptor).await?;

    let mut desired = secret.clone();
    desired.metadata.labels = merged(source.metadata.labels.as_ref(), &source.spec.metadata.labels);
    desired.metadata.annotations = merged(
        source.metadata.annotations.as_ref(),
        &source.spec.metadata.annotations,
    );
    // The API server drops an empty map, so None keeps repeat applies equal
    desired.data = if data.is_empty() { None } else { Some(data) };
    if let Some(type_) = source.spec.type_.as_ref().filter(|t| !t.is_empty()) {
        desired.type_ = Some(type_.clone());
    }
    set_controller_reference(&mut desired, source)?;

    *secret = desired;
    Ok(())
}
