// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for registry lifecycle and initialization events.
//!
//! This module contains message types for logging events related to:
//! * Module loading and duplicate-id handling
//! * Fixed-point external dependency resolution
//! * Grouped initialization lifecycle (start, group, member, completion)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Initialization run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use modloom::observability::messages::registry::InitStarted;
///
/// let msg = InitStarted {
///     scope: "services",
///     module_count: 12,
///     group_count: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct InitStarted<'a> {
    pub scope: &'a str,
    pub module_count: usize,
    pub group_count: usize,
}

impl Display for InitStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} initialization: {} modules in {} groups",
            self.scope, self.module_count, self.group_count
        )
    }
}

impl StructuredLog for InitStarted<'_> {
    fn log(&self) {
        tracing::info!(
            scope = self.scope,
            module_count = self.module_count,
            group_count = self.group_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "init",
            span_name = name,
            scope = self.scope,
            module_count = self.module_count,
            group_count = self.group_count,
        )
    }
}

/// Initialization run completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InitCompleted<'a> {
    pub scope: &'a str,
    pub module_count: usize,
    pub duration: std::time::Duration,
}

impl Display for InitCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Completed {} initialization: {} modules in {:?}",
            self.scope, self.module_count, self.duration
        )
    }
}

impl StructuredLog for InitCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            scope = self.scope,
            module_count = self.module_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "init_completed",
            span_name = name,
            scope = self.scope,
            module_count = self.module_count,
            duration = ?self.duration,
        )
    }
}

/// An initialization group started.
///
/// # Log Level
/// `debug!` - Detailed scheduling event
pub struct GroupStarted {
    pub index: usize,
    pub size: usize,
}

impl Display for GroupStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting initialization group {}: {} members",
            self.index, self.size
        )
    }
}

impl StructuredLog for GroupStarted {
    fn log(&self) {
        tracing::debug!(group_index = self.index, group_size = self.size, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "group",
            span_name = name,
            group_index = self.index,
            group_size = self.size,
        )
    }
}

/// A module finished initializing and is ready as a dependency value.
///
/// # Log Level
/// `debug!` - Detailed scheduling event
pub struct ModuleReady<'a> {
    pub module_id: &'a str,
    pub duration: std::time::Duration,
}

impl Display for ModuleReady<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module '{}' ready in {:?}",
            self.module_id, self.duration
        )
    }
}

impl StructuredLog for ModuleReady<'_> {
    fn log(&self) {
        tracing::debug!(
            module_id = self.module_id,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "module_ready",
            span_name = name,
            module_id = self.module_id,
            duration = ?self.duration,
        )
    }
}

/// A module's initialization routine failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ModuleInitFailed<'a> {
    pub module_id: &'a str,
    pub reason: &'a str,
}

impl Display for ModuleInitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Initialization of module '{}' failed: {}",
            self.module_id, self.reason
        )
    }
}

impl StructuredLog for ModuleInitFailed<'_> {
    fn log(&self) {
        tracing::error!(module_id = self.module_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "module_init_failed",
            span_name = name,
            module_id = self.module_id,
        )
    }
}

/// A previously-unmet dependency id was resolved through the external
/// resolver and recorded as a new service.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExternalModuleResolved<'a> {
    pub module_id: &'a str,
    pub requested_by: &'a str,
}

impl Display for ExternalModuleResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Resolved external module '{}' requested by '{}'",
            self.module_id, self.requested_by
        )
    }
}

impl StructuredLog for ExternalModuleResolved<'_> {
    fn log(&self) {
        tracing::info!(
            module_id = self.module_id,
            requested_by = self.requested_by,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "external_resolved",
            span_name = name,
            module_id = self.module_id,
            requested_by = self.requested_by,
        )
    }
}

/// A module id collided with an already-registered module and the later
/// definition was dropped (first-writer-wins policy).
///
/// # Log Level
/// `warn!` - Possibly unintended configuration
pub struct DuplicateModuleSkipped<'a> {
    pub module_id: &'a str,
}

impl Display for DuplicateModuleSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module id '{}' already registered; keeping the first definition",
            self.module_id
        )
    }
}

impl StructuredLog for DuplicateModuleSkipped<'_> {
    fn log(&self) {
        tracing::warn!(module_id = self.module_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "duplicate_module",
            span_name = name,
            module_id = self.module_id,
        )
    }
}
