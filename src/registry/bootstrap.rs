// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ServerConfig;
use crate::errors::RegistryError;
use crate::registry::Registry;

/// Drives the layered two-phase startup sequence over a registry.
///
/// Some modules (configuration, logging) must exist before the rest of the
/// module tree can even be discovered, so startup happens in phases:
///
/// 1. the bootstrap modules from [`ServerConfig::bootstrap`], strictly
///    sequentially, one group each;
/// 2. an application-supplied discovery step that may load further modules
///    using the now-ready bootstrap instances;
/// 3. a full `init` with a computed dependency order for everything else;
/// 4. one `init_consumers` pass per configured consumer namespace, in order.
pub struct Bootstrap {
    config: ServerConfig,
}

impl Bootstrap {
    /// Create a sequencer for the given server configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the full sequence with no discovery step between phases
    pub async fn run(&self, registry: &mut Registry) -> Result<(), RegistryError> {
        self.run_with(registry, |_| Ok(())).await
    }

    /// Run the full sequence, calling `discover` after the bootstrap
    /// modules are ready and before the remaining modules are initialized
    pub async fn run_with<F>(
        &self,
        registry: &mut Registry,
        discover: F,
    ) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Registry) -> Result<(), RegistryError>,
    {
        if !self.config.bootstrap.is_empty() {
            let order: Vec<&str> = self.config.bootstrap.iter().map(String::as_str).collect();
            registry.init(Some(&order)).await?;
        }

        discover(registry)?;

        registry.init(None).await?;

        for namespace in &self.config.consumer_namespaces {
            registry.init_consumers(namespace, None).await?;
        }

        Ok(())
    }
}
