//! Configuration handling for the dispatch service.
//!
//! This module reads the shared services config file and environment
//! variables, producing a single [`DispatchConfig`].

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Dispatch service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Interface the HTTP API binds to
    pub bind_host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Lower bound of the delay between messages
    pub min_delay: Duration,
    /// Upper bound of the delay between messages
    pub max_delay: Duration,
    /// Suffix appended to bare phone numbers
    pub chat_suffix: String,
    /// Whether the session must be authorized by scanning a handshake code
    pub require_scan: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            http_port: 3000,
            min_delay: Duration::from_millis(5_000),
            max_delay: Duration::from_millis(12_000),
            chat_suffix: "@c.us".to_string(),
            require_scan: false,
        }
    }
}

/// Root configuration structure (matches the YAML structure)
#[derive(Debug, Deserialize)]
struct RootConfig {
    services: Option<ServicesConfig>,
}

#[derive(Debug, Deserialize)]
struct ServicesConfig {
    dispatch: Option<ServiceConfig>,
}

#[derive(Debug, Deserialize)]
struct ServiceConfig {
    args: Option<Vec<String>>,
    config: Option<HashMap<String, String>>,
}

impl DispatchConfig {
    /// Load configuration from file and environment variables
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config = Self::default();

        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(root_config) = serde_yaml::from_str::<RootConfig>(&content) {
                config.apply_root_config(root_config);
                info!("Loaded configuration from {:?}", config_path.as_ref());
            } else {
                warn!("Failed to parse config file {:?}, using defaults", config_path.as_ref());
            }
        } else {
            warn!("Config file {:?} not found, using defaults", config_path.as_ref());
        }

        // Validated by the caller once CLI overrides are merged
        config.apply_environment_overrides();

        info!(
            "Final dispatch configuration: bind={}:{}, delay={:?}-{:?}, chat_suffix={}, require_scan={}",
            config.bind_host,
            config.http_port,
            config.min_delay,
            config.max_delay,
            config.chat_suffix,
            config.require_scan
        );

        Ok(config)
    }

    /// Reject settings the dispatcher cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.min_delay > self.max_delay {
            bail!(
                "min delay ({:?}) must not exceed max delay ({:?})",
                self.min_delay,
                self.max_delay
            );
        }
        if self.chat_suffix.is_empty() {
            bail!("chat_suffix must not be empty");
        }
        Ok(())
    }

    fn apply_root_config(&mut self, root_config: RootConfig) {
        if let Some(service) = root_config.services.and_then(|s| s.dispatch) {
            self.apply_service_config(service);
        }
    }

    /// Apply dispatch service specific configuration
    fn apply_service_config(&mut self, service_config: ServiceConfig) {
        if let Some(args) = service_config.args {
            for arg in args {
                if let Some(port) = arg.strip_prefix("--port=") {
                    if let Ok(port) = port.parse::<u16>() {
                        self.http_port = port;
                    }
                } else if let Some(host) = arg.strip_prefix("--bind-host=") {
                    self.bind_host = host.to_string();
                }
            }
        }

        if let Some(config_map) = service_config.config {
            for (key, value) in config_map {
                match key.as_str() {
                    "services.dispatch.bind_host" => {
                        self.bind_host = value;
                    }
                    "services.dispatch.http_port" => {
                        if let Ok(port) = value.parse::<u16>() {
                            self.http_port = port;
                        }
                    }
                    "services.dispatch.min_delay_ms" => {
                        if let Ok(ms) = value.parse::<u64>() {
                            self.min_delay = Duration::from_millis(ms);
                        }
                    }
                    "services.dispatch.max_delay_ms" => {
                        if let Ok(ms) = value.parse::<u64>() {
                            self.max_delay = Duration::from_millis(ms);
                        }
                    }
                    "services.dispatch.chat_suffix" => {
                        self.chat_suffix = value;
                    }
                    "services.dispatch.require_scan" => {
                        self.require_scan = value.to_lowercase() == "true";
                    }
                    _ => {
                        // Ignore unknown configuration keys
                    }
                }
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_environment_overrides(&mut self) {
        if let Ok(host) = std::env::var("DISPATCH_BIND_HOST") {
            self.bind_host = host;
            info!("Bind host overridden by environment: {}", self.bind_host);
        }

        if let Ok(port) = std::env::var("DISPATCH_HTTP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.http_port = port;
                info!("HTTP port overridden by environment: {}", port);
            }
        }

        if let Ok(ms) = std::env::var("DISPATCH_MIN_DELAY_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                self.min_delay = Duration::from_millis(ms);
                info!("Minimum delay overridden by environment: {}ms", ms);
            }
        }

        if let Ok(ms) = std::env::var("DISPATCH_MAX_DELAY_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                self.max_delay = Duration::from_millis(ms);
                info!("Maximum delay overridden by environment: {}ms", ms);
            }
        }

        if let Ok(suffix) = std::env::var("DISPATCH_CHAT_SUFFIX") {
            self.chat_suffix = suffix;
            info!("Chat suffix overridden by environment: {}", self.chat_suffix);
        }

        if let Ok(require_scan) = std::env::var("DISPATCH_REQUIRE_SCAN") {
            self.require_scan = require_scan.to_lowercase() == "true";
            info!("Handshake scan requirement overridden by environment: {}", self.require_scan);
        }
    }
}
