// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery, object storage, and events.

pub mod crd;
pub mod events;
pub mod store;

pub use crd::wait_for_sopssecret_crd;
pub use events::{capitalize_first, EventPublisher, KubeEventPublisher, NoopEventPublisher, Severity};
pub use store::{KubeStore, SecretStore};
