// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconciliation of one source object against its reflections.
//!
//! A pass is stateless: the desired namespaces are read from the source every
//! time and every write is idempotent, so an aborted pass can simply be run again.

use crate::constants::annotations;
use crate::error::Result;
use crate::reflect::annotations::{
    parse_desired_namespaces, provenance_labels, strip_provenance_labels,
};
use crate::reflect::kind::Reflectable;
use crate::reflect::projection::{build_projection, for_namespace};
use crate::reflect::SourceKey;
use crate::store::ObjectStore;
use kube::ResourceExt;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};

/// Result of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The source no longer exists; owner references take care of its reflections
    SourceMissing,
    /// The source has no `reflect-namespaces` annotation
    NotControlled,
    Converged(PassSummary),
}

/// Namespaces touched by a pass, in the order they were handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// Entries that were dropped from the desired set, with the reason
    pub skipped: Vec<String>,
}

pub struct Reconciler<K, S> {
    store: S,
    kind: PhantomData<fn() -> K>,
}

impl<K, S> Reconciler<K, S>
where
    K: Reflectable,
    S: ObjectStore<K>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            kind: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one reconciliation pass for the source identified by `key`.
    ///
    /// Any store error other than the tolerated races aborts the pass and is
    /// returned; whether to retry is up to the caller.
    #[instrument(skip(self), fields(kind = %K::object_kind(), source = %key))]
    pub async fn reconcile(&self, key: &SourceKey) -> Result<Outcome> {
        let Some(source) = self.store.get(&key.namespace, &key.name).await? else {
            debug!("Source {} not found, nothing to do", key);
            return Ok(Outcome::SourceMissing);
        };

        let raw = source
            .annotations()
            .get(annotations::REFLECT_NAMESPACES)
            .map(String::as_str)
            .unwrap_or_default();
        let Some(requested) = parse_desired_namespaces(raw) else {
            debug!("Source {} is not under reflection control, skipping", key);
            return Ok(Outcome::NotControlled);
        };

        let mut summary = PassSummary::default();
        let desired = desired_namespaces(key, requested, &mut summary);

        let mut template = build_projection(&source);
        self.store.set_owner(&mut template, &source)?;

        for namespace in &desired {
            self.converge(&template, namespace, &mut summary).await?;
        }

        self.remove_dangling(key, &desired, &mut summary).await?;

        info!(
            "Reconciled {} {}: {} created, {} updated, {} deleted",
            K::object_kind(),
            key,
            summary.created.len(),
            summary.updated.len(),
            summary.deleted.len()
        );

        Ok(Outcome::Converged(summary))
    }

    /// Create or overwrite the reflection in `namespace`
    async fn converge(
        &self,
        template: &K,
        namespace: &str,
        summary: &mut PassSummary,
    ) -> Result<()> {
        let reflection = for_namespace(template, namespace);
        let name = reflection.name_any();

        if self.store.get(namespace, &name).await?.is_none() {
            info!("Creating reflection {}/{}", namespace, name);
            match self.store.create(&reflection).await {
                Ok(_) => {
                    summary.created.push(namespace.to_string());
                    return Ok(());
                }
                Err(e) if e.is_benign_create_race() => {
                    debug!(
                        "Reflection {}/{} was created concurrently ({}), updating instead",
                        namespace, name, e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        info!("Updating reflection {}/{}", namespace, name);
        self.store.update(&reflection).await?;
        summary.updated.push(namespace.to_string());
        Ok(())
    }

    /// Delete reflections of `key` living outside the desired namespaces.
    ///
    /// Provenance labels are stripped first so the deletion is not routed back
    /// to the source as a deleted reflection.
    async fn remove_dangling(
        &self,
        key: &SourceKey,
        desired: &[String],
        summary: &mut PassSummary,
    ) -> Result<()> {
        let selector = provenance_labels(&key.name, &key.namespace);

        for mut reflection in self.store.list(&selector).await? {
            let namespace = reflection.namespace().unwrap_or_default();
            if namespace == key.namespace || desired.contains(&namespace) {
                continue;
            }

            let name = reflection.name_any();
            info!("Deleting dangling reflection {}/{}", namespace, name);

            strip_provenance_labels(reflection.labels_mut());
            let unlinked = match self.store.update(&reflection).await {
                Ok(unlinked) => unlinked,
                Err(e) if e.is_not_found() => {
                    debug!("Dangling reflection {}/{} already gone", namespace, name);
                    summary.deleted.push(namespace);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.store.delete(&unlinked).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    debug!("Dangling reflection {}/{} already gone", namespace, name);
                }
                Err(e) => return Err(e),
            }
            summary.deleted.push(namespace);
        }

        Ok(())
    }
}

/// Drop empty entries and the source's own namespace from the requested list.
/// Order and duplicates are preserved.
fn desired_namespaces(
    key: &SourceKey,
    requested: Vec<String>,
    summary: &mut PassSummary,
) -> Vec<String> {
    requested
        .into_iter()
        .filter(|namespace| {
            if namespace.is_empty() {
                return false;
            }
            if *namespace == key.namespace {
                warn!(
                    "Source {} lists its own namespace as a reflection target, skipping",
                    key
                );
                summary
                    .skipped
                    .push(format!("{}: source namespace", namespace));
                return false;
            }
            true
        })
        .collect()
}
