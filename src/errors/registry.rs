// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for module loading, resolution, and grouped initialization.

use crate::errors::GraphError;
use thiserror::Error;

/// Error type produced by a module's initialization routine.
pub type ModuleError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during registry loading and initialization
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A declared dependency could not be resolved to any known module or
    /// through the external resolver
    #[error("module '{module_id}' depends on '{missing_dependency}' which could not be resolved")]
    UnresolvedDependency {
        /// The module that declared the dependency
        module_id: String,
        /// The dependency id that could not be resolved
        missing_dependency: String,
    },

    /// Group computation failed (cycle or unmet dependency in the graph)
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A module's initialization routine failed, either by returning an
    /// error (sync protocol) or by resolving its future to one (async
    /// protocol)
    #[error("initialization of module '{module_id}' failed: {source}")]
    InitFailed {
        /// The module whose initialization failed
        module_id: String,
        /// The underlying error
        #[source]
        source: ModuleError,
    },

    /// A module id collided with an already-registered module while the
    /// registry was configured to treat collisions as fatal
    #[error("duplicate module id '{module_id}'")]
    DuplicateModule {
        /// The colliding module id
        module_id: String,
    },

    /// A module declaration used the reserved completion parameter name as
    /// a dependency id
    #[error("module '{module_id}' declares reserved dependency name '{name}'")]
    ReservedDependencyName {
        /// The module with the invalid declaration
        module_id: String,
        /// The reserved name
        name: String,
    },

    /// An explicit initialization order named a module that was never
    /// loaded or injected
    #[error("explicit init order names unknown module '{module_id}'")]
    UnknownModuleInOrder {
        /// The unknown module id
        module_id: String,
    },
}
