// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;

use crate::config::consts::DEFAULT_CONCURRENCY_FALLBACK;
use crate::errors::{DeclarationError, ModuleError, RegistryError};
use crate::graph::DependencyGraphBuilder;
use crate::module::{introspect, InitRoutine, Instance, ModuleDef, ModuleResolver};
use crate::observability::messages::registry::{
    DuplicateModuleSkipped, ExternalModuleResolved, GroupStarted, InitCompleted, InitStarted,
    ModuleInitFailed, ModuleReady,
};
use crate::observability::messages::StructuredLog;

/// How a registered node participates in dependency resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Loadable, dependable-upon, initialized in dependency order
    Service,
    /// Loadable and initialized, but never a valid dependency target
    Consumer,
    /// A pre-built value requiring no initialization call
    Injected,
}

/// Scheduling options for one registry instance
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Treat duplicate module ids as a hard error instead of
    /// first-writer-wins
    pub fail_on_collision: bool,
    /// Maximum concurrent initializations within one group
    pub max_concurrency: usize,
    /// Per-module async initialization timeout. `None` preserves the
    /// historical behavior: a hung init hangs the whole startup sequence.
    pub init_timeout: Option<Duration>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            fail_on_collision: false,
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(DEFAULT_CONCURRENCY_FALLBACK),
            init_timeout: None,
        }
    }
}

struct ModuleEntry {
    role: Role,
    dependencies: Vec<String>,
    init: Option<Arc<InitRoutine>>,
    dynamic_dependencies: Option<crate::module::DynamicDependenciesFn>,
}

/// Which subset of nodes one initialization run drives
#[derive(Clone, Copy)]
enum Scope<'a> {
    Services,
    Consumers(&'a str),
}

impl Scope<'_> {
    fn label(&self) -> String {
        match self {
            Scope::Services => "services".to_string(),
            Scope::Consumers(namespace) => format!("consumers:{}", namespace),
        }
    }
}

/// The module registry: discovers modules, resolves their dependency graph,
/// and drives grouped concurrent initialization.
///
/// Each registry instance exclusively owns its node tables (module entries,
/// declared dependency lists, ready instances); construct one per
/// application run or per test. The registry distinguishes three roles:
/// services (dependable, initialized in dependency order), consumers
/// (initialized but never a dependency target, stored under
/// `"<namespace>.<name>"` ids), and injected values (pre-built, immediately
/// ready).
///
/// ## Initialization model
///
/// [`init`](Self::init) and [`init_consumers`](Self::init_consumers) run
/// the same four phases:
///
/// 1. **Fixed-point external resolution**: every declared dependency id
///    that no loaded service or injected value satisfies is offered to the
///    configured [`ModuleResolver`]; resolved definitions become new
///    service nodes whose own dependencies join the scan. A miss is fatal
///    and names the requesting module.
/// 2. **Group computation**: an explicit order turns each named id into its
///    own singleton group (bootstrap support); otherwise every in-scope
///    node's effective dependency list (declared ∪ dynamic, deduplicated)
///    feeds a [`DependencyGraphBuilder`]. Cycles and unmet ids abort here,
///    before any node is touched.
/// 3. **Grouped concurrent initialization**: groups run strictly in
///    sequence; within a group every not-yet-ready, in-scope member is
///    started on its own tokio task, bounded by a semaphore. Dependency
///    values are injected positionally in declared order and are always
///    fully-initialized instances. The whole group is awaited even after a
///    member fails; then no further group starts and the first recorded
///    error is returned.
/// 4. On success every in-scope node is ready and visible through
///    [`get`](Self::get).
///
/// Failure is fail-fast and final: nothing is retried, and a failed run
/// leaves some nodes ready and others not. Callers are expected to treat
/// any error as fatal to startup.
///
/// Initialization is exactly-once per node per registry: already-ready
/// members of a group are skipped, so the bootstrap phase
/// (`init(Some(&["config", "logger"]))`) composes with the later full
/// `init(None)` pass.
pub struct Registry {
    modules: HashMap<String, ModuleEntry>,
    instances: HashMap<String, Instance>,
    resolver: Option<Arc<dyn ModuleResolver>>,
    options: RegistryOptions,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with default options
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create a registry with explicit scheduling options
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            modules: HashMap::new(),
            instances: HashMap::new(),
            resolver: None,
            options,
        }
    }

    /// Attach a fallback resolver for dependency ids no loaded module
    /// satisfies
    pub fn with_resolver(mut self, resolver: Arc<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Register a pre-built value under `id`. It requires no initialization
    /// call and is immediately available for lookup and as a dependency
    /// value. Dependencies are usually empty; a non-empty list only orders
    /// the node in the graph.
    pub fn inject(
        &mut self,
        id: impl Into<String>,
        value: Instance,
        dependencies: Vec<String>,
    ) -> Result<(), RegistryError> {
        let id = id.into();
        if self.modules.contains_key(&id) {
            if self.options.fail_on_collision {
                return Err(RegistryError::DuplicateModule { module_id: id });
            }
            DuplicateModuleSkipped { module_id: &id }.log();
            return Ok(());
        }
        self.modules.insert(
            id.clone(),
            ModuleEntry {
                role: Role::Injected,
                dependencies,
                init: None,
                dynamic_dependencies: None,
            },
        );
        self.instances.insert(id, value);
        Ok(())
    }

    /// Record module definitions as services. Duplicate ids follow the
    /// collision policy: first-writer-wins, or a hard error when
    /// `fail_on_collision` is set.
    pub fn load_services(
        &mut self,
        defs: impl IntoIterator<Item = ModuleDef>,
    ) -> Result<(), RegistryError> {
        for def in defs {
            let id = def.id.clone();
            self.record(id, def, Role::Service)?;
        }
        Ok(())
    }

    /// Record module definitions as consumers under a namespace. The
    /// stored id is `"<namespace>.<name>"`, so consumer ids can never
    /// satisfy a service's dependency.
    pub fn load_consumers(
        &mut self,
        namespace: &str,
        defs: impl IntoIterator<Item = ModuleDef>,
    ) -> Result<(), RegistryError> {
        for def in defs {
            let id = format!("{}.{}", namespace, def.id);
            self.record(id, def, Role::Consumer)?;
        }
        Ok(())
    }

    fn record(&mut self, id: String, def: ModuleDef, role: Role) -> Result<(), RegistryError> {
        if self.modules.contains_key(&id) {
            if self.options.fail_on_collision {
                return Err(RegistryError::DuplicateModule { module_id: id });
            }
            DuplicateModuleSkipped { module_id: &id }.log();
            return Ok(());
        }

        let dependencies = introspect::declared_dependencies(&def.dependencies).map_err(
            |DeclarationError::ReservedDependencyName { name }| {
                RegistryError::ReservedDependencyName {
                    module_id: id.clone(),
                    name,
                }
            },
        )?;

        self.modules.insert(
            id,
            ModuleEntry {
                role,
                dependencies,
                init: Some(Arc::new(def.init)),
                dynamic_dependencies: def.dynamic_dependencies,
            },
        );
        Ok(())
    }

    /// Initialize all loaded services in dependency order, or—when an
    /// explicit order is given—exactly the named modules, strictly
    /// sequentially, one group each.
    pub async fn init(&mut self, explicit_order: Option<&[&str]>) -> Result<(), RegistryError> {
        self.run_init(Scope::Services, explicit_order).await
    }

    /// Initialize all consumers under one namespace, same algorithm as
    /// [`init`](Self::init). Services and injected values participate in
    /// the graph only as already-satisfied dependency targets.
    pub async fn init_consumers(
        &mut self,
        namespace: &str,
        explicit_order: Option<&[&str]>,
    ) -> Result<(), RegistryError> {
        self.run_init(Scope::Consumers(namespace), explicit_order)
            .await
    }

    /// Look up a ready instance. A missing or not-yet-ready id is a soft
    /// `None`, never an error, to support optional dependency lookups.
    pub fn get(&self, id: &str) -> Option<Instance> {
        self.instances.get(id).cloned()
    }

    /// Typed lookup: [`get`](Self::get) plus a downcast to the concrete
    /// instance type
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Option<Arc<T>> {
        self.get(id).and_then(|value| value.downcast::<T>().ok())
    }

    /// True once `id` has a ready instance
    pub fn is_ready(&self, id: &str) -> bool {
        self.instances.contains_key(id)
    }

    /// Every ready consumer instance under a namespace, in no defined order
    pub fn get_consumers(&self, namespace: &str) -> Vec<Instance> {
        let prefix = format!("{}.", namespace);
        self.modules
            .iter()
            .filter(|(id, entry)| entry.role == Role::Consumer && id.starts_with(&prefix))
            .filter_map(|(id, _)| self.instances.get(id).cloned())
            .collect()
    }

    /// Evict a module's definition and instance so a fresh load
    /// re-instantiates it. Returns whether anything was evicted. This
    /// supports test isolation, not hot reload.
    pub fn unload(&mut self, id: &str) -> bool {
        let had_module = self.modules.remove(id).is_some();
        let had_instance = self.instances.remove(id).is_some();
        had_module || had_instance
    }

    async fn run_init(
        &mut self,
        scope: Scope<'_>,
        explicit_order: Option<&[&str]>,
    ) -> Result<(), RegistryError> {
        let started = Instant::now();

        self.resolve_external().await?;

        let groups = match explicit_order {
            Some(order) => {
                for id in order {
                    if !self.modules.contains_key(*id) {
                        return Err(RegistryError::UnknownModuleInOrder {
                            module_id: id.to_string(),
                        });
                    }
                }
                order.iter().map(|id| vec![id.to_string()]).collect()
            }
            None => self.compute_groups(scope)?,
        };

        let label = scope.label();
        let module_count: usize = groups.iter().map(Vec::len).sum();
        InitStarted {
            scope: &label,
            module_count,
            group_count: groups.len(),
        }
        .log();

        for (index, group) in groups.iter().enumerate() {
            self.run_group(index, group, scope).await?;
        }

        InitCompleted {
            scope: &label,
            module_count,
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    /// Fixed-point external-dependency resolution: repeatedly offer every
    /// unsatisfied declared dependency id to the resolver until none
    /// remain or one cannot be provided. Scans ids in sorted order so the
    /// reported requester is deterministic.
    async fn resolve_external(&mut self) -> Result<(), RegistryError> {
        loop {
            let mut unmet: Option<(String, String)> = None;
            let mut ids: Vec<&String> = self.modules.keys().collect();
            ids.sort();
            'scan: for id in ids {
                for dependency in &self.modules[id].dependencies {
                    if !self.satisfies_dependency(dependency) {
                        unmet = Some((id.clone(), dependency.clone()));
                        break 'scan;
                    }
                }
            }

            let Some((requester, missing)) = unmet else {
                return Ok(());
            };

            // A known id with a non-dependable role (consumer) can never be
            // resolved, externally or otherwise.
            if self.modules.contains_key(&missing) {
                return Err(RegistryError::UnresolvedDependency {
                    module_id: requester,
                    missing_dependency: missing,
                });
            }

            let resolved = match &self.resolver {
                Some(resolver) => resolver.resolve(&missing).await,
                None => None,
            };

            match resolved {
                Some(def) => {
                    ExternalModuleResolved {
                        module_id: &missing,
                        requested_by: &requester,
                    }
                    .log();
                    self.record(missing, def, Role::Service)?;
                }
                None => {
                    return Err(RegistryError::UnresolvedDependency {
                        module_id: requester,
                        missing_dependency: missing,
                    });
                }
            }
        }
    }

    fn satisfies_dependency(&self, id: &str) -> bool {
        self.modules
            .get(id)
            .map(|entry| entry.role != Role::Consumer)
            .unwrap_or(false)
    }

    fn compute_groups(&self, scope: Scope<'_>) -> Result<Vec<Vec<String>>, RegistryError> {
        let mut builder = DependencyGraphBuilder::new();
        match scope {
            Scope::Services => {
                for (id, entry) in &self.modules {
                    match entry.role {
                        Role::Service => {
                            builder.add_node(id.clone(), self.effective_dependencies(entry));
                        }
                        Role::Injected => builder.add_node(id.clone(), entry.dependencies.clone()),
                        Role::Consumer => {}
                    }
                }
            }
            Scope::Consumers(namespace) => {
                let prefix = format!("{}.", namespace);
                for (id, entry) in &self.modules {
                    match entry.role {
                        Role::Consumer if id.starts_with(&prefix) => {
                            builder.add_node(id.clone(), self.effective_dependencies(entry));
                        }
                        // Already-satisfied dependency targets for the
                        // consumers being initialized.
                        Role::Service | Role::Injected => builder.add_node(id.clone(), Vec::new()),
                        Role::Consumer => {}
                    }
                }
            }
        }
        Ok(builder.calc_groups()?)
    }

    /// Declared ∪ dynamic dependencies, duplicates removed, declared order
    /// preserved. The dynamic capability is invoked here, once per run,
    /// with the registry itself.
    fn effective_dependencies(&self, entry: &ModuleEntry) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut dependencies: Vec<String> = entry
            .dependencies
            .iter()
            .filter(|dependency| seen.insert((*dependency).clone()))
            .cloned()
            .collect();
        if let Some(dynamic) = &entry.dynamic_dependencies {
            for dependency in dynamic(self) {
                if seen.insert(dependency.clone()) {
                    dependencies.push(dependency);
                }
            }
        }
        dependencies
    }

    async fn run_group(
        &mut self,
        index: usize,
        group: &[String],
        scope: Scope<'_>,
    ) -> Result<(), RegistryError> {
        let mut pending: Vec<(String, Arc<InitRoutine>, Vec<Instance>)> = Vec::new();
        for id in group {
            let Some(entry) = self.modules.get(id) else {
                continue;
            };
            // Exactly-once: already-ready members (injected values, prior
            // init passes) are skipped.
            if self.instances.contains_key(id) {
                continue;
            }
            let in_scope = match (entry.role, scope) {
                (Role::Service, Scope::Services) => true,
                (Role::Consumer, Scope::Consumers(namespace)) => {
                    id.starts_with(&format!("{}.", namespace))
                }
                _ => false,
            };
            if !in_scope {
                continue;
            }
            let Some(init) = entry.init.clone() else {
                continue;
            };
            let values = self.dependency_values(id, &entry.dependencies)?;
            pending.push((id.clone(), init, values));
        }

        if pending.is_empty() {
            return Ok(());
        }

        GroupStarted {
            index,
            size: pending.len(),
        }
        .log();

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
        let timeout = self.options.init_timeout;

        let mut ids = Vec::with_capacity(pending.len());
        let mut tasks = Vec::with_capacity(pending.len());
        for (id, init, values) in pending {
            ids.push(id);
            let semaphore = semaphore.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(closed) => return Err(Box::new(closed) as ModuleError),
                };
                let started = Instant::now();
                let result = match &*init {
                    InitRoutine::Sync(init) => init(&values),
                    InitRoutine::Async(init) => {
                        let future = init(values);
                        match timeout {
                            Some(limit) => match tokio::time::timeout(limit, future).await {
                                Ok(result) => result,
                                Err(_) => Err(format!(
                                    "initialization did not complete within {:?}",
                                    limit
                                )
                                .into()),
                            },
                            None => future.await,
                        }
                    }
                };
                result.map(|instance| (instance, started.elapsed()))
            }));
        }

        // Await the whole group even after a failure: in-flight members are
        // not aborted, but no further group starts.
        let mut first_error: Option<RegistryError> = None;
        for (id, task) in ids.into_iter().zip(tasks) {
            let outcome = match task.await {
                Ok(result) => result,
                Err(join_error) => Err(Box::new(join_error) as ModuleError),
            };
            match outcome {
                Ok((instance, elapsed)) => {
                    ModuleReady {
                        module_id: &id,
                        duration: elapsed,
                    }
                    .log();
                    self.instances.insert(id, instance);
                }
                Err(error) => {
                    let reason = error.to_string();
                    ModuleInitFailed {
                        module_id: &id,
                        reason: &reason,
                    }
                    .log();
                    if first_error.is_none() {
                        first_error = Some(RegistryError::InitFailed {
                            module_id: id,
                            source: error,
                        });
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Ordered dependency values for a module: one ready instance per
    /// declared dependency id, in declaration order.
    fn dependency_values(
        &self,
        module_id: &str,
        dependencies: &[String],
    ) -> Result<Vec<Instance>, RegistryError> {
        dependencies
            .iter()
            .map(|dependency| {
                self.instances.get(dependency).cloned().ok_or_else(|| {
                    RegistryError::UnresolvedDependency {
                        module_id: module_id.to_string(),
                        missing_dependency: dependency.clone(),
                    }
                })
            })
            .collect()
    }
}
