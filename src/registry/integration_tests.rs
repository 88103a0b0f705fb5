// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end registry scenarios: mixed sync/async graphs, failure
//! propagation, consumer namespaces, external resolution, and the
//! bootstrap sequencer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::ServerConfig;
use crate::errors::{GraphError, RegistryError};
use crate::module::{Instance, ModuleDef, StaticResolver};
use crate::registry::{Bootstrap, Registry, RegistryOptions};

type OrderLog = Arc<Mutex<Vec<String>>>;

fn new_log() -> OrderLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn recorded(log: &OrderLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn position(log: &[String], id: &str) -> usize {
    log.iter()
        .position(|entry| entry == id)
        .unwrap_or_else(|| panic!("'{}' missing from init order {:?}", id, log))
}

/// Sync module that records its id and yields its id as a String instance
fn tracked_sync(id: &'static str, dependencies: &[&str], log: &OrderLog) -> ModuleDef {
    let log = log.clone();
    ModuleDef::new_sync(id, dependencies, move |_deps| {
        log.lock().unwrap().push(id.to_string());
        Ok(Arc::new(id.to_string()) as Instance)
    })
}

/// Async module that records its id and yields its id as a String instance
fn tracked_async(id: &'static str, dependencies: &[&str], log: &OrderLog) -> ModuleDef {
    let log = log.clone();
    ModuleDef::new_async(id, dependencies, move |_deps| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(id.to_string());
            Ok(Arc::new(id.to_string()) as Instance)
        }
    })
}

#[tokio::test]
async fn mixed_sync_async_graph_initializes_in_dependency_order() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_services(vec![
            tracked_sync("config", &[], &log),
            tracked_async("db", &["config"], &log),
            tracked_sync("cache", &["config"], &log),
            tracked_async("web", &["db", "cache"], &log),
        ])
        .unwrap();

    registry.init(None).await.unwrap();

    let order = recorded(&log);
    assert_eq!(order.len(), 4);
    assert!(position(&order, "config") < position(&order, "db"));
    assert!(position(&order, "config") < position(&order, "cache"));
    assert!(position(&order, "db") < position(&order, "web"));
    assert!(position(&order, "cache") < position(&order, "web"));

    for id in ["config", "db", "cache", "web"] {
        assert!(registry.is_ready(id), "'{}' should be ready", id);
    }
}

#[tokio::test]
async fn dependency_values_arrive_positionally_and_fully_initialized() {
    let mut registry = Registry::new();
    registry
        .load_services(vec![
            ModuleDef::new_sync("config", &[], |_| {
                Ok(Arc::new("cfg".to_string()) as Instance)
            }),
            ModuleDef::new_sync("logger", &[], |_| {
                Ok(Arc::new("log".to_string()) as Instance)
            }),
            ModuleDef::new_async("db", &["config", "logger"], |deps| async move {
                let config = deps[0]
                    .clone()
                    .downcast::<String>()
                    .map_err(|_| "config instance has the wrong type")?;
                let logger = deps[1]
                    .clone()
                    .downcast::<String>()
                    .map_err(|_| "logger instance has the wrong type")?;
                Ok(Arc::new(format!("db({}+{})", config, logger)) as Instance)
            }),
        ])
        .unwrap();

    registry.init(None).await.unwrap();

    let db = registry.get_as::<String>("db").unwrap();
    assert_eq!(*db, "db(cfg+log)");
}

#[tokio::test]
async fn failed_module_suppresses_later_groups() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_services(vec![
            ModuleDef::new_sync("config", &[], |_| Err("bad config file".into())),
            tracked_sync("db", &["config"], &log),
        ])
        .unwrap();

    let result = registry.init(None).await;

    match result {
        Err(RegistryError::InitFailed { module_id, source }) => {
            assert_eq!(module_id, "config");
            assert!(source.to_string().contains("bad config file"));
        }
        other => panic!("expected InitFailed, got {:?}", other.err()),
    }
    assert!(!registry.is_ready("config"));
    assert!(!registry.is_ready("db"));
    assert!(recorded(&log).is_empty());
}

#[tokio::test]
async fn failing_group_still_registers_its_successes() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_services(vec![
            tracked_sync("cache", &[], &log),
            ModuleDef::new_sync("broken", &[], |_| Err("boom".into())),
        ])
        .unwrap();

    let result = registry.init(None).await;

    assert!(matches!(
        result,
        Err(RegistryError::InitFailed { module_id, .. }) if module_id == "broken"
    ));
    assert!(registry.is_ready("cache"));
}

#[tokio::test]
async fn injected_value_flows_through_unchanged() {
    let mut registry = Registry::new();
    let events: Instance = Arc::new("event-bus".to_string());
    registry.inject("events", events.clone(), vec![]).unwrap();
    registry
        .load_services(vec![ModuleDef::new_sync("web", &["events"], |deps| {
            Ok(deps[0].clone())
        })])
        .unwrap();

    registry.init(None).await.unwrap();

    let fetched = registry.get("events").unwrap();
    assert!(Arc::ptr_eq(&fetched, &events));
    // The dependent received the very same Arc
    let via_web = registry.get("web").unwrap();
    assert!(Arc::ptr_eq(&via_web, &events));
}

#[tokio::test]
async fn consumer_ids_never_satisfy_service_dependencies() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_consumers("handlers", vec![tracked_sync("health", &[], &log)])
        .unwrap();
    registry
        .load_services(vec![tracked_sync("web", &["handlers.health"], &log)])
        .unwrap();

    let result = registry.init(None).await;

    assert!(matches!(
        result,
        Err(RegistryError::UnresolvedDependency { module_id, missing_dependency })
            if module_id == "web" && missing_dependency == "handlers.health"
    ));
}

#[tokio::test]
async fn init_consumers_is_scoped_to_one_namespace() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_services(vec![tracked_sync("db", &[], &log)])
        .unwrap();
    registry
        .load_consumers("middleware", vec![tracked_sync("audit", &["db"], &log)])
        .unwrap();
    registry
        .load_consumers("handlers", vec![tracked_sync("health", &["db"], &log)])
        .unwrap();

    registry.init(None).await.unwrap();
    registry.init_consumers("middleware", None).await.unwrap();

    assert!(registry.is_ready("middleware.audit"));
    assert!(!registry.is_ready("handlers.health"));

    registry.init_consumers("handlers", None).await.unwrap();
    assert!(registry.is_ready("handlers.health"));

    assert_eq!(registry.get_consumers("middleware").len(), 1);
    assert_eq!(registry.get_consumers("handlers").len(), 1);
    assert!(registry.get_consumers("auth").is_empty());
}

#[tokio::test]
async fn dynamic_dependencies_order_after_the_selected_backend() {
    let log = new_log();
    let mut registry = Registry::new();
    let selection: Instance = Arc::new("backend_a".to_string());
    registry.inject("config", selection, vec![]).unwrap();
    registry
        .load_services(vec![
            tracked_sync("backend_a", &[], &log),
            tracked_sync("backend_b", &[], &log),
            tracked_sync("router", &["config"], &log).with_dynamic_dependencies(|registry| {
                match registry.get_as::<String>("config") {
                    Some(choice) => vec![choice.as_str().to_string()],
                    None => Vec::new(),
                }
            }),
        ])
        .unwrap();

    registry.init(None).await.unwrap();

    let order = recorded(&log);
    assert!(position(&order, "backend_a") < position(&order, "router"));
}

#[tokio::test]
async fn unloaded_module_is_reinstantiated_on_reload() {
    let counter = Arc::new(AtomicUsize::new(0));
    let make_def = |counter: Arc<AtomicUsize>| {
        ModuleDef::new_sync("db", &[], move |_| {
            let run = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Arc::new(run) as Instance)
        })
    };

    let mut registry = Registry::new();
    registry
        .load_services(vec![make_def(counter.clone())])
        .unwrap();
    registry.init(None).await.unwrap();
    assert_eq!(*registry.get_as::<usize>("db").unwrap(), 1);

    // Loading again without unloading is a no-op under first-writer-wins
    registry
        .load_services(vec![make_def(counter.clone())])
        .unwrap();
    registry.init(None).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    assert!(registry.unload("db"));
    registry.load_services(vec![make_def(counter)]).unwrap();
    registry.init(None).await.unwrap();
    assert_eq!(*registry.get_as::<usize>("db").unwrap(), 2);
}

#[tokio::test]
async fn resolver_pulls_in_external_chains() {
    let log = new_log();
    let mut resolver = StaticResolver::new();
    {
        let log = log.clone();
        resolver.register("metrics", move || {
            tracked_sync("metrics", &["exporter"], &log)
        });
    }
    {
        let log = log.clone();
        resolver.register("exporter", move || tracked_sync("exporter", &[], &log));
    }

    let mut registry = Registry::new().with_resolver(Arc::new(resolver));
    registry
        .load_services(vec![tracked_sync("web", &["metrics"], &log)])
        .unwrap();

    registry.init(None).await.unwrap();

    let order = recorded(&log);
    assert!(position(&order, "exporter") < position(&order, "metrics"));
    assert!(position(&order, "metrics") < position(&order, "web"));
}

#[tokio::test]
async fn unresolvable_dependency_names_the_requester() {
    let mut registry = Registry::new().with_resolver(Arc::new(StaticResolver::new()));
    registry
        .load_services(vec![ModuleDef::new_sync("web", &["ghost"], |_| {
            Ok(Arc::new(()) as Instance)
        })])
        .unwrap();

    let result = registry.init(None).await;

    assert!(matches!(
        result,
        Err(RegistryError::UnresolvedDependency { module_id, missing_dependency })
            if module_id == "web" && missing_dependency == "ghost"
    ));
}

#[tokio::test]
async fn cyclic_graph_fails_before_any_init_runs() {
    let log = new_log();
    let mut registry = Registry::new();
    registry
        .load_services(vec![
            tracked_sync("a", &["b"], &log),
            tracked_sync("b", &["a"], &log),
        ])
        .unwrap();

    let result = registry.init(None).await;

    match result {
        Err(RegistryError::Graph(GraphError::Cycle { remaining })) => {
            assert_eq!(remaining.len(), 2);
        }
        other => panic!("expected a cycle error, got {:?}", other.err()),
    }
    assert!(recorded(&log).is_empty());
}

#[tokio::test]
async fn hung_async_init_trips_the_configured_timeout() {
    let mut registry = Registry::with_options(RegistryOptions {
        init_timeout: Some(Duration::from_millis(50)),
        ..RegistryOptions::default()
    });
    registry
        .load_services(vec![ModuleDef::new_async("stuck", &[], |_| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Arc::new(()) as Instance)
        })])
        .unwrap();

    let result = registry.init(None).await;

    match result {
        Err(RegistryError::InitFailed { module_id, source }) => {
            assert_eq!(module_id, "stuck");
            assert!(source.to_string().contains("did not complete"));
        }
        other => panic!("expected a timeout failure, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn bootstrap_sequences_phases_and_namespaces() {
    let log = new_log();
    let config = ServerConfig {
        bootstrap: vec!["config".to_string(), "logger".to_string()],
        consumer_namespaces: vec!["middleware".to_string(), "handlers".to_string()],
        ..ServerConfig::default()
    };

    let mut registry = Registry::with_options(config.registry_options());
    registry
        .load_services(vec![
            tracked_sync("config", &[], &log),
            tracked_sync("logger", &["config"], &log),
        ])
        .unwrap();

    let sequencer = Bootstrap::new(config);
    {
        let log = log.clone();
        sequencer
            .run_with(&mut registry, move |registry| {
                // Discovery runs with the bootstrap modules already ready
                assert!(registry.is_ready("config"));
                assert!(registry.is_ready("logger"));
                registry.load_services(vec![tracked_sync("db", &["config", "logger"], &log)])?;
                registry
                    .load_consumers("middleware", vec![tracked_sync("audit", &["db"], &log)])?;
                registry
                    .load_consumers("handlers", vec![tracked_sync("health", &["db"], &log)])?;
                Ok(())
            })
            .await
            .unwrap();
    }

    let order = recorded(&log);
    assert_eq!(
        order,
        vec!["config", "logger", "db", "audit", "health"],
        "bootstrap, services, then namespaces in configured order"
    );
    assert!(registry.is_ready("middleware.audit"));
    assert!(registry.is_ready("handlers.health"));
}
