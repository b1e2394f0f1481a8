// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Building, guarding, and applying the Secrets generated from SopsSecrets.

pub mod apply;
pub mod desired;
pub mod ownership;

pub use apply::{apply_secret, OperationResult};
pub use desired::build_secret;
pub use ownership::{ensure_controlled_by, is_controlled_by, set_controller_reference};
