// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes-backed implementations of the reflector's collaborators.

pub mod store;

pub use store::KubeStore;
