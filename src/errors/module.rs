// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors in a module's dependency declaration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeclarationError {
    /// The reserved completion-signal name was used as a dependency id.
    /// It is only meaningful as the trailing entry of a declaration.
    #[error("reserved completion parameter name '{name}' may not be used as a dependency id")]
    ReservedDependencyName {
        /// The offending name
        name: String,
    },
}
