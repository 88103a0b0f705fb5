// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod def;
pub mod introspect;
mod resolver;

pub use def::{
    AsyncInitFn, DynamicDependenciesFn, InitResult, InitRoutine, Instance, ModuleDef, SyncInitFn,
};
pub use resolver::{ModuleResolver, StaticResolver};
