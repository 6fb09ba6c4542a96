// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::dispatch;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Run the ConfigMap reflector
    pub reflect_configmaps: bool,
    /// Run the Secret reflector
    pub reflect_secrets: bool,
    /// Delay before a failed pass is dispatched again
    pub error_requeue: Duration,
    /// Delay before a pass that hit a conflict is dispatched again
    pub conflict_requeue: Duration,
    /// Sources reconciled in parallel per kind, 0 for no limit
    pub max_concurrent_reconciles: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reflect_configmaps: true,
            reflect_secrets: true,
            error_requeue: Duration::from_secs(dispatch::ERROR_REQUEUE_SECS),
            conflict_requeue: Duration::from_secs(dispatch::CONFLICT_REQUEUE_SECS),
            max_concurrent_reconciles: dispatch::MAX_CONCURRENT_RECONCILES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let reflect_configmaps =
            parse_or(&lookup, "REFLECT_CONFIGMAPS", defaults.reflect_configmaps)?;
        let reflect_secrets = parse_or(&lookup, "REFLECT_SECRETS", defaults.reflect_secrets)?;
        let error_requeue = parse_or(
            &lookup,
            "ERROR_REQUEUE_SECS",
            defaults.error_requeue.as_secs(),
        )?;
        let conflict_requeue = parse_or(
            &lookup,
            "CONFLICT_REQUEUE_SECS",
            defaults.conflict_requeue.as_secs(),
        )?;
        let max_concurrent_reconciles = parse_or(
            &lookup,
            "MAX_CONCURRENT_RECONCILES",
            defaults.max_concurrent_reconciles,
        )?;

        Ok(Config {
            reflect_configmaps,
            reflect_secrets,
            error_requeue: Duration::from_secs(error_requeue),
            conflict_requeue: Duration::from_secs(conflict_requeue),
            max_concurrent_reconciles,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}
