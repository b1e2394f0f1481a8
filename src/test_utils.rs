// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API server and in-memory collaborators.

use crate::decrypt::Decryptor;
use crate::error::{Error, Result};
use crate::kubernetes::{EventPublisher, SecretStore, Severity};
use crate::types::{SopsSecret, SopsSecretSpec, SopsSecretStatus};
use async_trait::async_trait;
use http::{Request, Response};
use http_body_util::BodyExt;
use k8s_openapi::api::core::v1::Secret;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

pub const SOURCE_UID: &str = "0b9c6a52-5d1e-4a8f-9d0f-3c1a2b4e5f60";

/// A request seen by [`MockService`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: serde_json::Value,
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PUT requests matching the path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let response = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let bytes = req
                .into_body()
                .collect()
                .await
                .map(|c| c.to_bytes())
                .unwrap_or_default();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            requests.lock().unwrap().push(RecordedRequest { method, path, body });

            let (status, body) = response.unwrap_or_else(|| {
                (
                    404,
                    r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                        .to_string(),
                )
            });
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock Secret JSON response
pub fn secret_json(name: &str, namespace: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": "secret-uid",
            "resourceVersion": "1"
        }
    })
    .to_string()
}

/// Create a 409 conflict response
pub fn conflict_json(name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("Operation cannot be fulfilled on secrets \"{}\": the object has been modified", name),
        "reason": "Conflict",
        "code": 409
    })
    .to_string()
}

/// A SopsSecret in namespace `default` with a fixed uid
pub fn make_sops_secret(name: &str, string_data: &[(&str, &str)]) -> SopsSecret {
    let mut sops = SopsSecret::new(
        name,
        SopsSecretSpec {
            string_data: string_data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        },
    );
    sops.metadata.namespace = Some("default".to_string());
    sops.metadata.uid = Some(SOURCE_UID.to_string());
    sops
}

/// Decrypts a fixed set of ciphertexts and fails on anything else
#[derive(Default)]
pub struct FakeDecryptor {
    plaintexts: BTreeMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ciphertext: &str, plaintext: &str) -> Self {
        self.plaintexts
            .insert(ciphertext.to_string(), plaintext.as_bytes().to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decryptor for FakeDecryptor {
    async fn decrypt(&self, name: &str, ciphertext: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.plaintexts
            .get(ciphertext)
            .cloned()
            .ok_or_else(|| Error::Decryption {
                name: name.to_string(),
                message: "no matching key".to_string(),
            })
    }
}

/// In-memory SecretStore with resourceVersion bumps and injectable failures
#[derive(Default)]
pub struct FakeStore {
    secrets: Mutex<BTreeMap<(String, String), Secret>>,
    statuses: Mutex<Vec<SopsSecretStatus>>,
    writes: AtomicUsize,
    next_write_error: Mutex<Option<Error>>,
    next_status_error: Mutex<Option<Error>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a Secret in place without counting it as a write
    pub fn insert(&self, secret: Secret) {
        let key = (secret.namespace().unwrap_or_default(), secret.name_any());
        self.secrets.lock().unwrap().insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of Secret creates and replaces
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn status_updates(&self) -> Vec<SopsSecretStatus> {
        self.statuses.lock().unwrap().clone()
    }

    pub fn fail_next_write(&self, error: Error) {
        *self.next_write_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_status_update(&self, error: Error) {
        *self.next_status_error.lock().unwrap() = Some(error);
    }

    fn commit(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        if let Some(err) = self.next_write_error.lock().unwrap().take() {
            return Err(err);
        }
        let mut stored = secret.clone();
        // Mirror what the API server returns
        if stored.data.as_ref().is_some_and(|d| d.is_empty()) {
            stored.data = None;
        }
        if stored.type_.is_none() {
            stored.type_ = Some("Opaque".to_string());
        }
        let version = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        stored.metadata.namespace = Some(namespace.to_string());
        stored.metadata.resource_version = Some(version.to_string());
        self.insert(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl SecretStore for FakeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        if self.secret(namespace, &secret.name_any()).is_some() {
            return Err(Error::Conflict(format!("secret {}/{}", namespace, secret.name_any())));
        }
        self.commit(namespace, secret)
    }

    async fn replace_secret(&self, namespace: &str, name: &str, secret: &Secret) -> Result<Secret> {
        let current = self.secret(namespace, name);
        if current.map(|c| c.metadata.resource_version) != Some(secret.metadata.resource_version.clone()) {
            return Err(Error::Conflict(format!("secret {}/{}", namespace, name)));
        }
        self.commit(namespace, secret)
    }

    async fn update_status(&self, source: &SopsSecret) -> Result<()> {
        if let Some(err) = self.next_status_error.lock().unwrap().take() {
            return Err(err);
        }
        self.statuses
            .lock()
            .unwrap()
            .push(source.status.clone().unwrap_or_default());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub severity: Severity,
    pub reason: String,
    pub action: String,
    pub message: String,
}

/// EventPublisher that keeps every event
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        _source: &SopsSecret,
        severity: Severity,
        reason: &str,
        action: &str,
        message: &str,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            severity,
            reason: reason.to_string(),
            action: action.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::api::ObjectMeta;

    #[tokio::test]
    async fn test_fake_store_rejects_stale_replace() {
        let store = FakeStore::new();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let created = store.create_secret("default", &secret).await.unwrap();
        store.replace_secret("default", "creds", &created).await.unwrap();

        let err = store
            .replace_secret("default", "creds", &created)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_fake_store_normalizes_like_api_server() {
        let store = FakeStore::new();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("creds".to_string()),
                ..Default::default()
            },
            data: Some(BTreeMap::new()),
            ..Default::default()
        };

        let created = store.create_secret("default", &secret).await.unwrap();

        assert_eq!(created.data, None);
        assert_eq!(created.type_.as_deref(), Some("Opaque"));
    }
}
