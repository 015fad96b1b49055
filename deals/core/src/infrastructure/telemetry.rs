// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Process-wide logging and metrics setup.
//!
//! Called once by the embedding binary at startup, before serving.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use crate::domain::service_config::{LoggingConfig, ServiceConfigManifest};

/// Initialize tracing subscriber for logging
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.compact().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))
}

/// Install the Prometheus exporter on the configured bind address when
/// enabled. Returns whether it was installed.
pub fn install_metrics_exporter(config: &ServiceConfigManifest) -> Result<bool> {
    if !config.spec.observability.metrics.enabled {
        return Ok(false);
    }

    let addr = config.metrics_addr()?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    tracing::info!("Prometheus metrics exposed on {}", addr);
    Ok(true)
}
