// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Decryption through the `sops` executable, fed over stdin.

use crate::decrypt::Decryptor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

const MAX_STDERR_LEN: usize = 500;

/// Shells out to sops. Ciphertext and plaintext never touch the disk.
#[derive(Debug, Clone)]
pub struct SopsDecryptor {
    binary: String,
}

impl SopsDecryptor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SopsDecryptor {
    fn default() -> Self {
        Self::new("sops")
    }
}

#[async_trait]
impl Decryptor for SopsDecryptor {
    #[instrument(skip(self, ciphertext))]
    async fn decrypt(&self, name: &str, ciphertext: &str) -> Result<Vec<u8>> {
        let format = format_for_name(name);
        debug!("Decrypting {} as {}", name, format);

        let mut child = Command::new(&self.binary)
            .arg("--decrypt")
            .arg("--input-type")
            .arg(format)
            .arg("--output-type")
            .arg(format)
            .arg("/dev/stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| decryption_error(name, format!("failed to run {}: {}", self.binary, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(ciphertext.as_bytes())
                .await
                .map_err(|e| decryption_error(name, format!("failed to write to sops: {}", e)))?;
            stdin
                .shutdown()
                .await
                .map_err(|e| decryption_error(name, format!("failed to close sops stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| decryption_error(name, format!("failed to wait for sops: {}", e)))?;

        if output.status.success() {
            return Ok(output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!("sops exited with {:?} for {}", output.status.code(), name);
        Err(decryption_error(
            name,
            format!(
                "sops exited with {:?}: {}",
                output.status.code(),
                truncate(stderr.trim(), MAX_STDERR_LEN)
            ),
        ))
    }
}

/// Pick the sops store format from the logical name's extension
pub fn format_for_name(name: &str) -> &'static str {
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => "yaml",
        Some("json") => "json",
        Some("env") => "dotenv",
        Some("ini") => "ini",
        _ => "binary",
    }
}

fn decryption_error(name: &str, message: String) -> Error {
    Error::Decryption {
        name: name.to_string(),
        message,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &s[..end])
}
