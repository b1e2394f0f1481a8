// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// SopsSecret declares a Secret whose values are stored SOPS-encrypted.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[kube(group = "craftypath.github.io", version = "v1alpha1", kind = "SopsSecret")]
#[kube(namespaced)]
#[kube(status = "SopsSecretStatus")]
#[kube(shortname = "sops", plural = "sopssecrets")]
#[serde(rename_all = "camelCase")]
pub struct SopsSecretSpec {
    /// Labels and annotations added to the generated Secret
    #[serde(default, skip_serializing_if = "SecretTemplateMeta::is_empty")]
    pub metadata: SecretTemplateMeta,
    /// Logical name to SOPS-encrypted content
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub string_data: BTreeMap<String, String>,
    /// Type of the generated Secret; left untouched when empty
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplateMeta {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl SecretTemplateMeta {
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.labels.is_empty()
    }
}

/// Outcome of the most recent reconcile.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, schemars::JsonSchema)]
pub enum SyncStatus {
    #[default]
    #[serde(rename = "")]
    Unknown,
    Success,
    Failure,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Unknown => write!(f, ""),
            SyncStatus::Success => write!(f, "Success"),
            SyncStatus::Failure => write!(f, "Failure"),
        }
    }
}

/// Fallback reason so a Failure never carries an empty reason
const UNKNOWN_FAILURE_REASON: &str = "unknown error";

/// Written wholesale on every reconcile. All fields are always serialized so a
/// merge patch replaces stale values.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SopsSecretStatus {
    #[serde(default)]
    pub last_update: Option<Time>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: SyncStatus,
}

impl SopsSecretStatus {
    pub fn success(now: DateTime<Utc>) -> Self {
        Self {
            last_update: Some(Time(now)),
            reason: String::new(),
            status: SyncStatus::Success,
        }
    }

    pub fn failure(now: DateTime<Utc>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let reason = if reason.is_empty() {
            UNKNOWN_FAILURE_REASON.to_string()
        } else {
            reason
        };
        Self {
            last_update: Some(Time(now)),
            reason,
            status: SyncStatus::Failure,
        }
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update.as_ref().map(|t| t.0)
    }
}
