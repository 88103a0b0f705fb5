// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Constants for registry and scheduler configuration.

/// Concurrency fallback when `std::thread::available_parallelism` cannot
/// determine the core count.
pub const DEFAULT_CONCURRENCY_FALLBACK: usize = 4;
