// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod bootstrap;
mod loader;

#[cfg(test)]
mod integration_tests;

pub use bootstrap::Bootstrap;
pub use loader::{Registry, RegistryOptions, Role};
