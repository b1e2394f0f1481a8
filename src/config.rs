// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace to watch; `None` watches the whole cluster
    pub watch_namespace: Option<String>,
    /// Path or name of the sops executable
    pub sops_binary: String,
    /// Block startup until the SopsSecret CRD is served
    pub wait_for_crd: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());
        let sops_binary = lookup("SOPS_BINARY")
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| "sops".to_string());
        let wait_for_crd = match lookup("CRD_WAIT") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("CRD_WAIT must be true or false, got {:?}", v))?,
            None => true,
        };

        Ok(Config {
            watch_namespace,
            sops_binary,
            wait_for_crd,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            sops_binary: "sops".to_string(),
            wait_for_crd: true,
        }
    }
}
