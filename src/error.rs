// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to decrypt {name}: {message}")]
    Decryption { name: String, message: String },

    #[error("secret {namespace}/{name} already exists and not owned by sops-operator")]
    NotOwned { namespace: String, name: String },

    #[error("conflict writing {0}")]
    Conflict(String),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("object is missing {0}")]
    MissingObjectKey(&'static str),
}

/// Coarse failure class, used for log fields only. Every kind is retried the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decryption,
    Conflict,
    Store,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Decryption { .. } => ErrorKind::Decryption,
            Error::NotOwned { .. } | Error::Conflict(_) => ErrorKind::Conflict,
            Error::Kube(_) | Error::Serialization(_) | Error::MissingObjectKey(_) => {
                ErrorKind::Store
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
