// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // server config loading + validation
pub mod errors;        // error handling
pub mod graph;         // dependency graph builder
pub mod module;        // module definitions + dependency introspection
pub mod observability;
pub mod registry;      // module registry + bootstrap sequencing
