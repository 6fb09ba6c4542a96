// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory object store, fixtures, and a mock Kubernetes API.

use crate::constants::annotations;
use crate::error::{ReflectorError, Result};
use crate::reflect::kind::Reflectable;
use crate::store::{matches_selector, ObjectStore};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// Store operations, recorded in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Get,
    List,
    Create,
    Update,
    Delete,
}

type Key = (String, String);

/// An [`ObjectStore`] backed by a map, with API-server-like semantics:
/// uids and resourceVersions are assigned on write, updates carrying a stale
/// resourceVersion conflict, and missing objects yield `NotFound`.
pub struct InMemoryStore<K> {
    objects: Mutex<BTreeMap<Key, K>>,
    ops: Mutex<Vec<(OpKind, String)>>,
    writes: Mutex<Vec<K>>,
    failures: Mutex<Vec<(OpKind, String, ReflectorError)>>,
    preempted: Mutex<HashMap<String, K>>,
    version: AtomicU64,
}

impl<K: Reflectable> InMemoryStore<K> {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            ops: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            preempted: Mutex::new(HashMap::new()),
            version: AtomicU64::new(1),
        }
    }

    /// Put an object in place directly, bypassing recording and conflict checks
    pub fn insert(&self, mut obj: K) {
        self.stamp(&mut obj);
        let key = key_of(&obj);
        self.objects.lock().unwrap().insert(key, obj);
    }

    pub fn object(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// All stored objects ordered by namespace and name
    pub fn all(&self) -> Vec<K> {
        self.objects.lock().unwrap().values().cloned().collect()
    }

    pub fn ops(&self) -> Vec<(OpKind, String)> {
        self.ops.lock().unwrap().clone()
    }

    /// Operations that addressed `namespace`, in order
    pub fn ops_in(&self, namespace: &str) -> Vec<OpKind> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, ns)| ns == namespace)
            .map(|(op, _)| *op)
            .collect()
    }

    /// Bodies of successful creates and updates in `namespace`, in order
    pub fn writes_to(&self, namespace: &str) -> Vec<K> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|obj| obj.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect()
    }

    pub fn clear_ops(&self) {
        self.ops.lock().unwrap().clear();
        self.writes.lock().unwrap().clear();
    }

    /// Make the next `op` addressing `namespace` fail with `err`
    pub fn fail_on(&self, op: OpKind, namespace: &str, err: ReflectorError) {
        self.failures
            .lock()
            .unwrap()
            .push((op, namespace.to_string(), err));
    }

    /// Simulate another pass winning a create race: the next create in
    /// `namespace` stores `winner` and reports `AlreadyExists`
    pub fn preempt_create(&self, namespace: &str, winner: K) {
        self.preempted
            .lock()
            .unwrap()
            .insert(namespace.to_string(), winner);
    }

    fn record(&self, op: OpKind, namespace: &str) -> Result<()> {
        self.ops.lock().unwrap().push((op, namespace.to_string()));

        let mut failures = self.failures.lock().unwrap();
        let injected = failures
            .iter()
            .position(|(o, ns, _)| *o == op && ns == namespace);
        match injected {
            Some(idx) => Err(failures.remove(idx).2),
            None => Ok(()),
        }
    }

    fn stamp(&self, obj: &mut K) {
        let version = self.version.fetch_add(1, Ordering::SeqCst);
        let meta = obj.meta_mut();
        if meta.uid.is_none() {
            meta.uid = Some(format!("uid-{}", version));
        }
        meta.resource_version = Some(version.to_string());
    }
}

impl<K: Reflectable> Default for InMemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

fn key_of<K: Reflectable>(obj: &K) -> Key {
    (obj.namespace().unwrap_or_default(), obj.name_any())
}

fn describe(key: &Key) -> String {
    format!("{}/{}", key.0, key.1)
}

#[async_trait]
impl<K: Reflectable> ObjectStore<K> for InMemoryStore<K> {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        self.record(OpKind::Get, namespace)?;
        Ok(self.object(namespace, name))
    }

    async fn list(&self, selector: &BTreeMap<String, String>) -> Result<Vec<K>> {
        self.record(OpKind::List, "")?;
        Ok(self
            .all()
            .into_iter()
            .filter(|obj| matches_selector(obj.labels(), selector))
            .collect())
    }

    async fn create(&self, obj: &K) -> Result<K> {
        let key = key_of(obj);
        self.record(OpKind::Create, &key.0)?;

        if let Some(winner) = self.preempted.lock().unwrap().remove(&key.0) {
            self.insert(winner);
            return Err(ReflectorError::AlreadyExists(describe(&key)));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(ReflectorError::AlreadyExists(describe(&key)));
        }

        let mut created = obj.clone();
        created.meta_mut().uid = None;
        self.stamp(&mut created);
        objects.insert(key, created.clone());
        self.writes.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update(&self, obj: &K) -> Result<K> {
        let key = key_of(obj);
        self.record(OpKind::Update, &key.0)?;

        let mut objects = self.objects.lock().unwrap();
        let Some(current) = objects.get(&key) else {
            return Err(ReflectorError::NotFound(describe(&key)));
        };

        if let Some(expected) = obj.resource_version() {
            if current.resource_version() != Some(expected) {
                return Err(ReflectorError::Conflict(describe(&key)));
            }
        }

        let mut updated = obj.clone();
        updated.meta_mut().uid = current.uid();
        self.stamp(&mut updated);
        objects.insert(key, updated.clone());
        self.writes.lock().unwrap().push(updated.clone());
        Ok(updated)
    }

    async fn delete(&self, obj: &K) -> Result<()> {
        let key = key_of(obj);
        self.record(OpKind::Delete, &key.0)?;

        match self.objects.lock().unwrap().remove(&key) {
            Some(_) => Ok(()),
            None => Err(ReflectorError::NotFound(describe(&key))),
        }
    }
}

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

pub fn configmap(name: &str, namespace: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: meta(name, namespace),
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

pub fn secret(name: &str, namespace: &str, data: &[(&str, &str)]) -> Secret {
    Secret {
        metadata: meta(name, namespace),
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        type_: Some("Opaque".to_string()),
        ..Default::default()
    }
}

/// Put `obj` under reflection control with the given `reflect-namespaces` value
pub fn controlled<K: Reflectable>(mut obj: K, namespaces: &str) -> K {
    obj.annotations_mut().insert(
        annotations::REFLECT_NAMESPACES.to_string(),
        namespaces.to_string(),
    );
    obj
}

/// A mock HTTP service that returns predefined responses based on method and path.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for requests with `method` matching the exact path
    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Method and path-and-query of every request received so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
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
        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| path.clone());
        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path_and_query));

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, status_json(404, "NotFound", "not found")));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A `Status` response body as returned by the API server on failure
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Serialize a typed object as an API server response body
pub fn object_json<K: Reflectable>(obj: &K) -> String {
    let mut value = serde_json::to_value(obj).unwrap();
    value["apiVersion"] = K::api_version(&()).into_owned().into();
    value["kind"] = K::kind(&()).into_owned().into();
    value.to_string()
}

/// Serialize objects as a `<Kind>List` response body
pub fn list_json<K: Reflectable>(items: &[K]) -> String {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|obj| serde_json::from_str(&object_json(obj)).unwrap())
        .collect();
    serde_json::json!({
        "apiVersion": K::api_version(&()).into_owned(),
        "kind": format!("{}List", K::kind(&())),
        "metadata": { "resourceVersion": "1" },
        "items": items
    })
    .to_string()
}
