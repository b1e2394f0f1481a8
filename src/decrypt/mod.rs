// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decryption of SopsSecret values.

pub mod sops;

pub use sops::SopsDecryptor;

use crate::error::Result;
use async_trait::async_trait;

/// Turns one encrypted `stringData` entry into plaintext bytes.
///
/// `name` is the logical key of the entry. Implementations may use it to pick
/// the ciphertext format.
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(&self, name: &str, ciphertext: &str) -> Result<Vec<u8>>;
}
