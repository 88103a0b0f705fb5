// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use async_trait::async_trait;

use crate::module::ModuleDef;

/// Fallback resolution for dependency ids that no loaded module satisfies.
///
/// This is the seam for the "ambient module-resolution" path: during
/// fixed-point resolution the registry asks the resolver for every unmet
/// dependency id, and a returned definition is recorded as a new service
/// node (whose own dependencies join the scan). Returning `None` makes the
/// unmet id a fatal resolution error naming the requesting module.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Resolve a dependency id to a loadable module definition, or `None`
    /// if this resolver cannot provide it.
    async fn resolve(&self, id: &str) -> Option<ModuleDef>;
}

/// Factory producing a fresh definition per resolution
pub type ModuleFactory = Box<dyn Fn() -> ModuleDef + Send + Sync>;

/// A resolver backed by a fixed table of module factories.
///
/// Stands in for a global package lookup in embedded and test setups:
/// register the externally-resolvable module ids up front and the registry
/// will pull them in on demand.
#[derive(Default)]
pub struct StaticResolver {
    factories: HashMap<String, ModuleFactory>,
}

impl StaticResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for an externally-resolvable module id
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> ModuleDef + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
    }
}

#[async_trait]
impl ModuleResolver for StaticResolver {
    async fn resolve(&self, id: &str) -> Option<ModuleDef> {
        self.factories.get(id).map(|factory| factory())
    }
}
