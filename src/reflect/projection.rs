// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Building the body of a reflection from its source

use crate::constants::PREFIX;
use crate::reflect::annotations::{
    provenance_labels, reflect_annotations_enabled, reflect_labels_enabled,
};
use crate::reflect::kind::Reflectable;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// Build the reflection template for `source`.
///
/// The template has no namespace; use [`for_namespace`] to place a copy of it.
/// Provenance labels are applied after any inherited labels so a source label
/// with the same key never overrides them.
pub fn build_projection<K: Reflectable>(source: &K) -> K {
    let source_annotations = source.annotations();

    let mut labels = if reflect_labels_enabled(source_annotations) {
        source.labels().clone()
    } else {
        BTreeMap::new()
    };
    labels.extend(provenance_labels(
        &source.name_any(),
        &source.namespace().unwrap_or_default(),
    ));

    let annotations: BTreeMap<String, String> = if reflect_annotations_enabled(source_annotations)
    {
        source_annotations
            .iter()
            .filter(|(k, _)| !k.starts_with(PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    } else {
        BTreeMap::new()
    };

    let mut projection = K::default();
    let meta = projection.meta_mut();
    meta.name = source.meta().name.clone();
    meta.labels = Some(labels);
    meta.annotations = Some(annotations);
    projection.apply_payload(source.extract_payload());
    projection
}

/// An independent copy of `template` placed in `namespace`
pub fn for_namespace<K: Reflectable>(template: &K, namespace: &str) -> K {
    let mut copy = template.clone();
    copy.meta_mut().namespace = Some(namespace.to_string());
    copy
}
