// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use tracing::{info, warn};

use stevedore::config::Config;
use stevedore::kubernetes::ResourceManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting stevedore connectivity check");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: run_mode={:?}", config.run_mode);

    // Bootstrap credentials and the resource clients; failures are recorded
    // and surface through the probe below
    let resources = ResourceManager::bootstrap(&config).await;

    if resources.is_connected().await {
        info!("Connected to Kubernetes cluster");
        Ok(())
    } else {
        warn!("Kubernetes cluster is not reachable");
        anyhow::bail!("cluster connectivity check failed")
    }
}
