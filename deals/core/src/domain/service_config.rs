// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a dealbridge gRPC node:
// - Kubernetes-style manifest format (apiVersion/kind/spec)
// - Network settings for the gRPC listener
// - Ingest pipe sizing for streamed Store uploads
// - Observability settings (logging, Prometheus metrics)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "dealbridge/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "dealbridge/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    #[serde(default)]
    pub spec: ServiceConfigSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address the gRPC listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_grpc_port")]
    pub grpc_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Chunks a Store upload may run ahead of the store call's reader
    #[serde(default = "default_pipe_capacity")]
    pub pipe_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter
    #[serde(default)]
    pub enabled: bool,

    /// Metrics endpoint port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_grpc_port() -> u16 {
    5002
}

fn default_pipe_capacity() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            grpc_port: default_grpc_port(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pipe_capacity: default_pipe_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. DEALBRIDGE_CONFIG_PATH environment variable
    /// 2. ./dealbridge-config.yaml (working directory)
    /// 3. ~/.dealbridge/config.yaml (user home)
    /// 4. /etc/dealbridge/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("DEALBRIDGE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./dealbridge-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".dealbridge").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/dealbridge/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DEALBRIDGE_GRPC_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: DEALBRIDGE_GRPC_PORT={}", port);
                    self.spec.network.grpc_port = port;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for DEALBRIDGE_GRPC_PORT: '{}'. Expected a port number. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("DEALBRIDGE_LOG_LEVEL") {
            tracing::info!("Environment override: DEALBRIDGE_LOG_LEVEL={}", val);
            self.spec.observability.logging.level = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.spec.network.grpc_port == 0 {
            anyhow::bail!("spec.network.grpc_port cannot be 0");
        }

        // Fails on a malformed bind address
        self.grpc_addr()?;

        let metrics = &self.spec.observability.metrics;
        if metrics.enabled && metrics.port == 0 {
            anyhow::bail!("spec.observability.metrics.port cannot be 0 when metrics are enabled");
        }

        if self.spec.ingest.pipe_capacity == 0 {
            anyhow::bail!("spec.ingest.pipe_capacity must be at least 1");
        }

        match self.spec.observability.logging.format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!(
                "Invalid logging format: '{}'. Expected 'text' or 'json'",
                other
            ),
        }

        Ok(())
    }

    /// Socket address of the gRPC listener
    pub fn grpc_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr(self.spec.network.grpc_port)
    }

    /// Socket address of the Prometheus listener, on the same bind address
    pub fn metrics_addr(&self) -> anyhow::Result<SocketAddr> {
        self.listen_addr(self.spec.observability.metrics.port)
    }

    fn listen_addr(&self, port: u16) -> anyhow::Result<SocketAddr> {
        let bind_address = &self.spec.network.bind_address;
        format!("{}:{}", bind_address, port).parse().map_err(|e| {
            anyhow::anyhow!("Invalid bind address '{}:{}': {}", bind_address, port, e)
        })
    }
}
