// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object store backed by the Kubernetes API

use crate::constants::OPERATOR_NAME;
use crate::error::Result;
use crate::reflect::kind::Reflectable;
use crate::store::{label_selector, ObjectStore};
use async_trait::async_trait;
use kube::{
    api::{DeleteParams, ListParams, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use tracing::{debug, instrument};

/// [`ObjectStore`] implementation talking to the API server through `kube::Api`
pub struct KubeStore<K> {
    client: Client,
    kind: PhantomData<fn() -> K>,
}

impl<K: Reflectable> KubeStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            kind: PhantomData,
        }
    }

    fn namespaced(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(OPERATOR_NAME.to_string()),
            ..Default::default()
        }
    }
}

impl<K> Clone for KubeStore<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K: Reflectable> ObjectStore<K> for KubeStore<K> {
    #[instrument(skip(self), fields(kind = %K::object_kind()))]
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.namespaced(namespace).get_opt(name).await?)
    }

    #[instrument(skip(self), fields(kind = %K::object_kind()))]
    async fn list(&self, selector: &BTreeMap<String, String>) -> Result<Vec<K>> {
        let api: Api<K> = Api::all(self.client.clone());
        let lp = ListParams::default().labels(&label_selector(selector));
        let list = api.list(&lp).await?;
        debug!("Listed {} objects", list.items.len());
        Ok(list.items)
    }

    async fn create(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        Ok(self
            .namespaced(&namespace)
            .create(&Self::post_params(), obj)
            .await?)
    }

    async fn update(&self, obj: &K) -> Result<K> {
        let namespace = obj.namespace().unwrap_or_default();
        Ok(self
            .namespaced(&namespace)
            .replace(&obj.name_any(), &Self::post_params(), obj)
            .await?)
    }

    async fn delete(&self, obj: &K) -> Result<()> {
        let namespace = obj.namespace().unwrap_or_default();
        self.namespaced(&namespace)
            .delete(&obj.name_any(), &DeleteParams::default())
            .await?;
        Ok(())
    }
}
