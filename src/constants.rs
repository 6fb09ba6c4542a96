// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Prefix shared by every control annotation and provenance label
pub const PREFIX: &str = "configreflector.github.io/";

/// Annotation keys read from source objects
pub mod annotations {
    /// Comma-separated list of namespaces to reflect the object into
    pub const REFLECT_NAMESPACES: &str = "configreflector.github.io/reflect-namespaces";
    /// When non-empty, source labels are copied to reflections
    pub const REFLECT_LABELS: &str = "configreflector.github.io/reflect-labels";
    /// When non-empty, non-control source annotations are copied to reflections
    pub const REFLECT_ANNOTATIONS: &str = "configreflector.github.io/reflect-annotations";
}

/// Label keys stamped on every reflection
pub mod labels {
    /// Name of the source object
    pub const SOURCE_NAME: &str = "configreflector.github.io/source-name";
    /// Namespace of the source object
    pub const SOURCE_NAMESPACE: &str = "configreflector.github.io/source-namespace";
}

/// The operator name used in log output and watcher identification
pub const OPERATOR_NAME: &str = "config-reflector";

/// Dispatch defaults
pub mod dispatch {
    /// Seconds to wait before retrying a pass that failed
    pub const ERROR_REQUEUE_SECS: u64 = 30;
    /// Seconds to wait before retrying a pass that lost an optimistic-concurrency race
    pub const CONFLICT_REQUEUE_SECS: u64 = 1;
    /// Upper bound for the exponential backoff of failed passes
    pub const MAX_REQUEUE_SECS: u64 = 300;
    /// Sources reconciled in parallel per kind, 0 for no limit
    pub const MAX_CONCURRENT_RECONCILES: u16 = 8;
}
