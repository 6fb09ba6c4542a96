// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource kinds that can be reflected between namespaces.

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::{ByteString, NamespaceResourceScope};
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// A namespaced kind whose payload can be copied verbatim into another object of the same kind.
pub trait Reflectable:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Default
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    type Payload: Clone + Debug + PartialEq + Send + Sync;

    fn extract_payload(&self) -> Self::Payload;

    fn apply_payload(&mut self, payload: Self::Payload);

    /// Kind name used in log output, e.g. `ConfigMap`
    fn object_kind() -> String {
        Self::kind(&()).into_owned()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigMapPayload {
    pub data: Option<BTreeMap<String, String>>,
    pub binary_data: Option<BTreeMap<String, ByteString>>,
}

impl Reflectable for ConfigMap {
    type Payload = ConfigMapPayload;

    fn extract_payload(&self) -> ConfigMapPayload {
        ConfigMapPayload {
            data: self.data.clone(),
            binary_data: self.binary_data.clone(),
        }
    }

    fn apply_payload(&mut self, payload: ConfigMapPayload) {
        self.data = payload.data;
        self.binary_data = payload.binary_data;
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecretPayload {
    pub type_: Option<String>,
    pub string_data: Option<BTreeMap<String, String>>,
    pub data: Option<BTreeMap<String, ByteString>>,
}

impl Reflectable for Secret {
    type Payload = SecretPayload;

    fn extract_payload(&self) -> SecretPayload {
        SecretPayload {
            type_: self.type_.clone(),
            string_data: self.string_data.clone(),
            data: self.data.clone(),
        }
    }

    fn apply_payload(&mut self, payload: SecretPayload) {
        self.type_ = payload.type_;
        self.string_data = payload.string_data;
        self.data = payload.data;
    }
}
