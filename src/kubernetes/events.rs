// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes Events raised against SopsSecrets

use crate::constants::OPERATOR_NAME;
use crate::types::SopsSecret;
use async_trait::async_trait;
use kube::{
    runtime::events::{Event, EventType, Recorder, Reporter},
    Client, Resource, ResourceExt,
};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

impl From<Severity> for EventType {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Normal => EventType::Normal,
            Severity::Warning => EventType::Warning,
        }
    }
}

/// Fire-and-forget sink for user-visible events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        source: &SopsSecret,
        severity: Severity,
        reason: &str,
        action: &str,
        message: &str,
    );
}

/// Publishes through the events.k8s.io API
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: OPERATOR_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        source: &SopsSecret,
        severity: Severity,
        reason: &str,
        action: &str,
        message: &str,
    ) {
        let event = Event {
            type_: severity.into(),
            reason: reason.to_string(),
            note: Some(message.to_string()),
            action: action.to_string(),
            secondary: None,
        };

        if let Err(e) = self.recorder.publish(&event, &source.object_ref(&())).await {
            warn!(
                "Failed to publish {} event for SopsSecret {}/{}: {}",
                reason,
                source.namespace().unwrap_or_default(),
                source.name_any(),
                e
            );
        }
    }
}

/// Drops every event
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, _: &SopsSecret, _: Severity, _: &str, _: &str, _: &str) {}
}

/// Uppercase the first character, leaving the rest untouched
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
