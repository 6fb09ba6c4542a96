// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reflector controller - watches sources and their reflections and runs a
//! reconciliation pass per source.

use crate::config::Config;
use crate::constants::{dispatch::MAX_REQUEUE_SECS, labels};
use crate::error::{ReflectorError, Result};
use crate::kubernetes::KubeStore;
use crate::reflect::annotations::{is_under_control, source_key};
use crate::reflect::{Outcome, Reconciler, Reflectable, SourceKey};
use crate::store::ObjectStore;
use futures::StreamExt;
use kube::{
    runtime::{
        controller::{self, Action},
        reflector::ObjectRef,
        Controller,
    },
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Shared state handed to every reconciliation of one kind
pub struct ReflectorContext<K, S> {
    reconciler: Reconciler<K, S>,
    config: Config,
    /// Consecutive failed passes per source, for the retry backoff
    failures: Mutex<HashMap<SourceKey, u32>>,
}

impl<K, S> ReflectorContext<K, S>
where
    K: Reflectable,
    S: ObjectStore<K>,
{
    pub fn new(reconciler: Reconciler<K, S>, config: Config) -> Self {
        Self {
            reconciler,
            config,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn reconciler(&self) -> &Reconciler<K, S> {
        &self.reconciler
    }

    /// Number of passes for `key` that failed in a row
    pub fn failures(&self, key: &SourceKey) -> u32 {
        self.failures
            .lock()
            .map(|f| f.get(key).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Record a failed pass and return how many failed before it
    fn record_failure(&self, key: &SourceKey) -> u32 {
        let Ok(mut failures) = self.failures.lock() else {
            return 0;
        };
        let count = failures.entry(key.clone()).or_default();
        let previous = *count;
        *count = count.saturating_add(1);
        previous
    }

    fn forget(&self, key: &SourceKey) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(key);
        }
    }
}

pub struct ReflectorController<K> {
    client: Client,
    config: Config,
    kind: PhantomData<fn() -> K>,
}

impl<K: Reflectable> ReflectorController<K> {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            kind: PhantomData,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let sources: Api<K> = Api::all(self.client.clone());
        let reflections: Api<K> = Api::all(self.client.clone());
        let reconciler = Reconciler::new(KubeStore::<K>::new(self.client.clone()));
        let context = Arc::new(ReflectorContext::new(reconciler, self.config.clone()));

        info!("Watching {} sources and reflections", K::object_kind());

        Controller::new(sources, WatcherConfig::default())
            .watches(
                reflections,
                WatcherConfig::default().labels(&reflection_selector()),
                reflection_source::<K>,
            )
            .with_config(
                controller::Config::default().concurrency(self.config.max_concurrent_reconciles),
            )
            .shutdown_on_signal()
            .run(
                reconcile::<K, KubeStore<K>>,
                error_policy::<K, KubeStore<K>>,
                context,
            )
            .for_each(|res| async move {
                match res {
                    Ok((obj, action)) => debug!("Reconciled {}: {:?}", obj, action),
                    Err(e) => warn!("Reconciliation error: {}", e),
                }
            })
            .await;

        info!("{} controller stopped", K::object_kind());
        Ok(())
    }
}

/// Selector matching every object that carries both provenance labels
pub fn reflection_selector() -> String {
    format!("{},{}", labels::SOURCE_NAME, labels::SOURCE_NAMESPACE)
}

/// Map a changed or deleted reflection to the source named by its provenance
/// labels. Objects that are themselves under control are sources, not reflections.
pub fn reflection_source<K: Reflectable>(obj: K) -> Option<ObjectRef<K>> {
    if is_under_control(obj.annotations()) {
        return None;
    }

    let (namespace, name) = source_key(obj.labels())?;
    Some(ObjectRef::new(&name).within(&namespace))
}

fn key_of<K: Reflectable>(obj: &K) -> SourceKey {
    SourceKey::new(obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Run one pass for the source `obj`.
///
/// Sources without the control annotation are skipped without touching the
/// store, since a pass would find nothing to do.
pub async fn reconcile<K, S>(obj: Arc<K>, ctx: Arc<ReflectorContext<K, S>>) -> Result<Action>
where
    K: Reflectable,
    S: ObjectStore<K> + 'static,
{
    let key = key_of(obj.as_ref());

    if !is_under_control(obj.annotations()) {
        ctx.forget(&key);
        return Ok(Action::await_change());
    }

    match ctx.reconciler.reconcile(&key).await? {
        Outcome::Converged(summary) => debug!("Pass for {} converged: {:?}", key, summary),
        outcome => debug!("Pass for {} finished: {:?}", key, outcome),
    }

    ctx.forget(&key);
    Ok(Action::await_change())
}

/// Decide when a failed pass runs again. Fatal errors are not retried.
pub fn error_policy<K, S>(
    obj: Arc<K>,
    error: &ReflectorError,
    ctx: Arc<ReflectorContext<K, S>>,
) -> Action
where
    K: Reflectable,
    S: ObjectStore<K> + 'static,
{
    let key = key_of(obj.as_ref());

    if !error.is_retryable() {
        error!("Pass for {} failed permanently: {}", key, error);
        ctx.forget(&key);
        return Action::await_change();
    }

    let attempt = ctx.record_failure(&key);
    let delay = retry_delay(&ctx.config, error, attempt);
    if error.is_conflict() {
        debug!("Pass for {} hit a conflict, retrying in {:?}", key, delay);
    } else {
        warn!("Pass for {} failed: {}, retrying in {:?}", key, error, delay);
    }

    Action::requeue(delay)
}

/// Delay before retrying a failed pass.
///
/// Conflicts are retried after the fixed conflict delay. Other errors back off
/// exponentially from the error delay, capped at `MAX_REQUEUE_SECS`.
pub fn retry_delay(config: &Config, err: &ReflectorError, attempt: u32) -> Duration {
    if err.is_conflict() {
        return config.conflict_requeue;
    }

    let cap = Duration::from_secs(MAX_REQUEUE_SECS).max(config.error_requeue);
    config
        .error_requeue
        .checked_mul(2u32.saturating_pow(attempt.min(16)))
        .map_or(cap, |delay| delay.min(cap))
}
