// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module definitions: the loadable unit the registry schedules.
//!
//! A module declares an ordered dependency id list and one of two
//! initialization protocols, selected explicitly by the [`InitRoutine`]
//! variant rather than inferred from a reserved parameter name:
//!
//! * [`InitRoutine::Sync`] runs to completion and signals failure by
//!   returning an error;
//! * [`InitRoutine::Async`] returns a future and signals failure by
//!   resolving it to an error, possibly much later.
//!
//! Dependency values are injected positionally in declaration order. The
//! initialized instance is an opaque [`Instance`] the registry hands to
//! later groups and to `get` callers.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::ModuleError;
use crate::registry::Registry;

/// A live, initialized module instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Result of an initialization routine
pub type InitResult = Result<Instance, ModuleError>;

/// Synchronous initialization: dependency values in, instance or error out
pub type SyncInitFn = Box<dyn Fn(&[Instance]) -> InitResult + Send + Sync>;

/// Asynchronous initialization: completion is signaled through the future
pub type AsyncInitFn =
    Box<dyn Fn(Vec<Instance>) -> Pin<Box<dyn Future<Output = InitResult> + Send>> + Send + Sync>;

/// Call-time dependency computation, invoked once with the registry before
/// graph construction
pub type DynamicDependenciesFn = Box<dyn Fn(&Registry) -> Vec<String> + Send + Sync>;

/// The two initialization protocols a module can use
pub enum InitRoutine {
    /// Call once; an `Err` return is the failure signal
    Sync(SyncInitFn),
    /// Call once; an `Err` resolution of the future is the failure signal
    Async(AsyncInitFn),
}

impl InitRoutine {
    /// True for the async protocol
    pub fn is_async(&self) -> bool {
        matches!(self, InitRoutine::Async(_))
    }
}

impl fmt::Debug for InitRoutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitRoutine::Sync(_) => f.write_str("InitRoutine::Sync"),
            InitRoutine::Async(_) => f.write_str("InitRoutine::Async"),
        }
    }
}

/// A loadable module definition: id, declared dependencies, init routine,
/// and an optional call-time dependency override.
pub struct ModuleDef {
    /// Unique module id
    pub id: String,
    /// Ordered dependency ids; values are injected in this order
    pub dependencies: Vec<String>,
    /// The initialization routine
    pub init: InitRoutine,
    /// Optional capability to compute additional dependencies at graph-build
    /// time, given the registry (e.g. "depend on whatever cache backend the
    /// config module selected"). Unioned with the declared list.
    pub dynamic_dependencies: Option<DynamicDependenciesFn>,
}

impl ModuleDef {
    /// Define a module with a synchronous initialization routine
    pub fn new_sync<F>(id: impl Into<String>, dependencies: &[&str], init: F) -> Self
    where
        F: Fn(&[Instance]) -> InitResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
            init: InitRoutine::Sync(Box::new(init)),
            dynamic_dependencies: None,
        }
    }

    /// Define a module with an asynchronous initialization routine
    pub fn new_async<F, Fut>(id: impl Into<String>, dependencies: &[&str], init: F) -> Self
    where
        F: Fn(Vec<Instance>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InitResult> + Send + 'static,
    {
        Self {
            id: id.into(),
            dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
            init: InitRoutine::Async(Box::new(move |deps| Box::pin(init(deps)))),
            dynamic_dependencies: None,
        }
    }

    /// Attach a call-time dependency computation to this definition
    pub fn with_dynamic_dependencies<F>(mut self, f: F) -> Self
    where
        F: Fn(&Registry) -> Vec<String> + Send + Sync + 'static,
    {
        self.dynamic_dependencies = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ModuleDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDef")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field("init", &self.init)
            .field("dynamic", &self.dynamic_dependencies.is_some())
            .finish()
    }
}
