// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller owner references between a SopsSecret and its Secret.
//!
//! The link is a value (apiVersion, kind, name, uid) stored on the Secret and
//! compared by value. It is never followed.

use crate::error::{Error, Result};
use crate::types::SopsSecret;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

/// True when `secret` names `source` as its controlling owner
pub fn is_controlled_by(secret: &Secret, source: &SopsSecret) -> bool {
    let Some(uid) = source.meta().uid.as_deref() else {
        return false;
    };
    secret
        .owner_references()
        .iter()
        .any(|r| r.controller == Some(true) && r.uid == uid)
}

/// Refuse to touch a Secret this operator did not create for `source`
pub fn ensure_controlled_by(secret: &Secret, source: &SopsSecret) -> Result<()> {
    if is_controlled_by(secret, source) {
        Ok(())
    } else {
        Err(not_owned(secret, source))
    }
}

/// Make `source` the controlling owner of `secret`.
///
/// An existing reference to the same owner (group, kind, name) is replaced in
/// place. Another controller reference is an error.
pub fn set_controller_reference(secret: &mut Secret, source: &SopsSecret) -> Result<()> {
    let owner = OwnerReference {
        block_owner_deletion: Some(true),
        ..source
            .controller_owner_ref(&())
            .ok_or(Error::MissingObjectKey("metadata.uid"))?
    };

    let foreign_controller = secret
        .owner_references()
        .iter()
        .any(|r| r.controller == Some(true) && r.uid != owner.uid);
    if foreign_controller {
        return Err(not_owned(secret, source));
    }

    let refs = secret.owner_references_mut();
    match refs.iter_mut().find(|r| same_owner(r, &owner)) {
        Some(existing) => *existing = owner,
        None => refs.push(owner),
    }
    Ok(())
}

fn same_owner(a: &OwnerReference, b: &OwnerReference) -> bool {
    api_group(&a.api_version) == api_group(&b.api_version) && a.kind == b.kind && a.name == b.name
}

fn api_group(api_version: &str) -> &str {
    api_version
        .rsplit_once('/')
        .map(|(group, _)| group)
        .unwrap_or("")
}

fn not_owned(secret: &Secret, source: &SopsSecret) -> Error {
    Error::NotOwned {
        namespace: secret
            .namespace()
            .or_else(|| source.namespace())
            .unwrap_or_default(),
        name: secret.name_any(),
    }
}
