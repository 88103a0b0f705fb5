// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements the `Display` trait for consistent,
//! human-readable output, and [`StructuredLog`] to emit the message with
//! its fields attached as structured tracing attributes.
//!
//! # Usage Pattern
//!
//! ```rust
//! use modloom::observability::messages::registry::GroupStarted;
//! use modloom::observability::messages::StructuredLog;
//!
//! let msg = GroupStarted { index: 0, size: 3 };
//! msg.log();
//! ```

use tracing::Span;

pub mod registry;

/// Emit a message through tracing with structured fields.
pub trait StructuredLog {
    /// Log the message at its subsystem-appropriate level
    fn log(&self);

    /// Create a tracing span carrying the message's fields
    fn span(&self, name: &str) -> Span;
}
