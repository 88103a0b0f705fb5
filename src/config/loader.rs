// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ConfigError;
use crate::registry::RegistryOptions;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Server configuration for the module registry and bootstrap sequencer.
///
/// This struct describes one application run: which modules must come up
/// strictly sequentially before the rest of the system can be discovered,
/// which consumer namespaces to bring up once all services are ready, and
/// the registry's scheduling knobs. It is typically loaded from a YAML
/// configuration file.
///
/// # Fields
/// * `bootstrap` - module ids initialized first, in the given order, one
///   per group (e.g. `["config", "logger"]`)
/// * `consumer_namespaces` - consumer namespaces initialized after services,
///   in the given order (e.g. `["middleware", "handlers"]`)
/// * `fail_on_collision` - treat duplicate service ids as a hard error
///   instead of first-writer-wins
/// * `max_concurrency` - maximum concurrent initializations within a group
///   (optional, defaults to the core count)
/// * `init_timeout_seconds` - per-module async initialization timeout
///   (optional; absent means a hung init hangs startup, matching the
///   historical behavior)
///
/// # Example
/// ```yaml
/// bootstrap: [config, logger]
/// consumer_namespaces: [middleware, handlers, auth]
/// fail_on_collision: true
/// max_concurrency: 4
/// init_timeout_seconds: 30
/// ```
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub bootstrap: Vec<String>,
    #[serde(default)]
    pub consumer_namespaces: Vec<String>,
    #[serde(default)]
    pub fail_on_collision: bool,
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    #[serde(default)]
    pub init_timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bootstrap: Vec::new(),
            consumer_namespaces: Vec::new(),
            fail_on_collision: false,
            max_concurrency: None,
            init_timeout_seconds: None,
        }
    }
}

impl ServerConfig {
    /// Derive registry scheduling options from this configuration
    pub fn registry_options(&self) -> RegistryOptions {
        let mut options = RegistryOptions::default();
        options.fail_on_collision = self.fail_on_collision;
        if let Some(limit) = self.max_concurrency {
            options.max_concurrency = limit.max(1);
        }
        options.init_timeout = self.init_timeout_seconds.map(Duration::from_secs);
        options
    }
}

/// Load a server config from a YAML file
pub fn load_server_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: ServerConfig = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load and validate a server config from a YAML file
///
/// This function loads the configuration and validates the bootstrap order
/// and consumer namespaces so obviously broken sequencing fails before any
/// module is touched.
pub fn load_and_validate_server_config<P: AsRef<Path>>(
    path: P,
) -> Result<ServerConfig, ConfigError> {
    let cfg = load_server_config(path)?;
    validate_server_config(&cfg)?;
    Ok(cfg)
}

/// Validate a server config's sequencing fields.
///
/// Checks, accumulating every problem found:
/// * bootstrap module ids are non-empty and unique
/// * consumer namespaces are non-empty, unique, and contain no `.`
///   (the namespace separator)
/// * `max_concurrency`, when present, is at least 1
pub fn validate_server_config(cfg: &ServerConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    let mut seen = std::collections::HashSet::new();
    for id in &cfg.bootstrap {
        if id.is_empty() {
            problems.push("bootstrap contains an empty module id".to_string());
        } else if !seen.insert(id) {
            problems.push(format!("bootstrap lists module '{}' more than once", id));
        }
    }

    let mut seen_ns = std::collections::HashSet::new();
    for namespace in &cfg.consumer_namespaces {
        if namespace.is_empty() {
            problems.push("consumer_namespaces contains an empty namespace".to_string());
        } else if namespace.contains('.') {
            problems.push(format!(
                "consumer namespace '{}' may not contain '.'",
                namespace
            ));
        } else if !seen_ns.insert(namespace) {
            problems.push(format!(
                "consumer_namespaces lists '{}' more than once",
                namespace
            ));
        }
    }

    if cfg.max_concurrency == Some(0) {
        problems.push("max_concurrency must be at least 1".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation { problems })
    }
}
