// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod graph;
mod module;
mod registry;

pub use config::ConfigError;
pub use graph::GraphError;
pub use module::DeclarationError;
pub use registry::{ModuleError, RegistryError};
