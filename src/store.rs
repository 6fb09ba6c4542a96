// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The object store the reconciler reads from and writes to.

use crate::error::{ReflectorError, Result};
use crate::reflect::kind::Reflectable;
use async_trait::async_trait;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Namespaced object storage for a single kind.
///
/// Errors follow the [`ReflectorError`] taxonomy: `NotFound`, `AlreadyExists`,
/// `Conflict` (stale resourceVersion on update), `Transient` and `Fatal`.
#[async_trait]
pub trait ObjectStore<K: Reflectable>: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// List objects in all namespaces whose labels contain every pair in `selector`
    async fn list(&self, selector: &BTreeMap<String, String>) -> Result<Vec<K>>;

    async fn create(&self, obj: &K) -> Result<K>;

    /// Replace an object. Unconditional unless `obj` carries a resourceVersion.
    async fn update(&self, obj: &K) -> Result<K>;

    async fn delete(&self, obj: &K) -> Result<()>;

    /// Make `owner` the controlling owner of `child` so that deleting the owner
    /// garbage-collects the child.
    fn set_owner(&self, child: &mut K, owner: &K) -> Result<()> {
        let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
            ReflectorError::Fatal(format!(
                "{} {} has no uid and cannot own other objects",
                K::object_kind(),
                owner.name_any()
            ))
        })?;

        let refs = child.owner_references_mut();
        refs.retain(|r| r.uid != owner_ref.uid);
        refs.push(owner_ref);
        Ok(())
    }
}

/// Render a label map as a Kubernetes equality selector, e.g. `a=1,b=2`
pub fn label_selector(selector: &BTreeMap<String, String>) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Check if `labels` satisfies an equality selector
pub fn matches_selector(
    labels: &BTreeMap<String, String>,
    selector: &BTreeMap<String, String>,
) -> bool {
    selector.iter().all(|(k, v)| labels.get(k) == Some(v))
}
