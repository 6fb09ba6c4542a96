// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Control annotation and provenance label handling

use crate::constants::{annotations as keys, labels as label_keys};
use std::collections::BTreeMap;

/// Split a `reflect-namespaces` value into its trimmed entries.
///
/// Returns `None` for an empty value. Empty entries (e.g. from `"a,,b"`) are kept
/// in place; callers decide what to do with them.
pub fn parse_desired_namespaces(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }

    Some(raw.split(',').map(|ns| ns.trim().to_string()).collect())
}

fn non_empty(map: &BTreeMap<String, String>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_empty())
}

/// Check if an object carries a non-empty `reflect-namespaces` annotation
pub fn is_under_control(annotations: &BTreeMap<String, String>) -> bool {
    non_empty(annotations, keys::REFLECT_NAMESPACES)
}

/// Check if an object carries both provenance labels, i.e. it is a reflection
pub fn has_provenance_labels(labels: &BTreeMap<String, String>) -> bool {
    non_empty(labels, label_keys::SOURCE_NAME)
        && non_empty(labels, label_keys::SOURCE_NAMESPACE)
}

pub fn reflect_labels_enabled(annotations: &BTreeMap<String, String>) -> bool {
    non_empty(annotations, keys::REFLECT_LABELS)
}

pub fn reflect_annotations_enabled(annotations: &BTreeMap<String, String>) -> bool {
    non_empty(annotations, keys::REFLECT_ANNOTATIONS)
}

/// Provenance labels identifying the source `namespace/name`.
/// Doubles as the label selector for finding its reflections.
pub fn provenance_labels(name: &str, namespace: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (label_keys::SOURCE_NAME.to_string(), name.to_string()),
        (label_keys::SOURCE_NAMESPACE.to_string(), namespace.to_string()),
    ])
}

/// Remove the provenance labels, unlinking a reflection from its source
pub fn strip_provenance_labels(labels: &mut BTreeMap<String, String>) {
    labels.remove(label_keys::SOURCE_NAME);
    labels.remove(label_keys::SOURCE_NAMESPACE);
}

/// The `(namespace, name)` of the source a reflection was copied from
pub fn source_key(labels: &BTreeMap<String, String>) -> Option<(String, String)> {
    if !has_provenance_labels(labels) {
        return None;
    }

    Some((
        labels[label_keys::SOURCE_NAMESPACE].clone(),
        labels[label_keys::SOURCE_NAME].clone(),
    ))
}
