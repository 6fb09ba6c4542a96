// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reflection of ConfigMaps and Secrets into the namespaces their annotations name.

pub mod annotations;
pub mod kind;
pub mod projection;
pub mod reconciler;

pub use kind::Reflectable;
pub use reconciler::{Outcome, PassSummary, Reconciler};

use std::fmt;

/// Identifies the source object a reconciliation pass works on
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey {
    pub namespace: String,
    pub name: String,
}

impl SourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
