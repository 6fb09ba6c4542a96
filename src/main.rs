// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::Client;
use tracing::info;

use config_reflector::config::Config;
use config_reflector::controller::ReflectorController;
use config_reflector::reflect::Reflectable;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting config-reflector");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: configmaps={}, secrets={}, error_requeue={:?}",
        config.reflect_configmaps, config.reflect_secrets, config.error_requeue
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let configmaps = run_if::<ConfigMap>(config.reflect_configmaps, client.clone(), &config);
    let secrets = run_if::<Secret>(config.reflect_secrets, client, &config);

    tokio::try_join!(configmaps, secrets)?;

    info!("All reflectors stopped, shutting down");
    Ok(())
}

/// Run the controller for one kind, if enabled
async fn run_if<K: Reflectable>(enabled: bool, client: Client, config: &Config) -> Result<()> {
    if !enabled {
        info!("{} reflection disabled", K::object_kind());
        return Ok(());
    }

    info!("Starting {} reflector...", K::object_kind());
    ReflectorController::<K>::new(client, config.clone()).run().await
}
