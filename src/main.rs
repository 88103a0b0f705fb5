// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use modloom::config::{load_and_validate_server_config, ServerConfig};
use modloom::module::{Instance, ModuleDef, StaticResolver};
use modloom::registry::{Bootstrap, Registry};

/// Demo: bring up a small application server module tree.
///
/// Pass a YAML config path as the first argument, or run bare to use a
/// built-in configuration with a `config` → `logger` bootstrap phase.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let server_config = match std::env::args().nth(1) {
        Some(path) => load_and_validate_server_config(&path)?,
        None => ServerConfig {
            bootstrap: vec!["config".to_string(), "logger".to_string()],
            consumer_namespaces: vec!["middleware".to_string(), "handlers".to_string()],
            init_timeout_seconds: Some(30),
            ..ServerConfig::default()
        },
    };

    let mut resolver = StaticResolver::new();
    resolver.register("metrics", || {
        ModuleDef::new_sync("metrics", &["logger"], |_deps| {
            Ok(Arc::new("metrics sink".to_string()) as Instance)
        })
    });

    let mut registry =
        Registry::with_options(server_config.registry_options()).with_resolver(Arc::new(resolver));

    registry.inject("events", Arc::new("event bus".to_string()), vec![])?;

    registry.load_services(vec![
        ModuleDef::new_sync("config", &[], |_deps| {
            Ok(Arc::new("selected backend: backend_a".to_string()) as Instance)
        }),
        ModuleDef::new_sync("logger", &["config"], |_deps| {
            Ok(Arc::new("logger".to_string()) as Instance)
        }),
    ])?;

    let sequencer = Bootstrap::new(server_config);
    sequencer
        .run_with(&mut registry, |registry| {
            registry.load_services(vec![
                ModuleDef::new_async("db", &["config", "logger"], |_deps| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(Arc::new("db pool".to_string()) as Instance)
                }),
                ModuleDef::new_sync("backend_a", &["config"], |_deps| {
                    Ok(Arc::new("backend a".to_string()) as Instance)
                }),
                ModuleDef::new_sync("router", &["config", "metrics"], |_deps| {
                    Ok(Arc::new("router".to_string()) as Instance)
                })
                .with_dynamic_dependencies(|registry| {
                    match registry.get_as::<String>("config") {
                        Some(choice) if choice.contains("backend_a") => {
                            vec!["backend_a".to_string()]
                        }
                        _ => Vec::new(),
                    }
                }),
            ])?;
            registry.load_consumers(
                "middleware",
                vec![ModuleDef::new_sync("audit", &["logger"], |_deps| {
                    Ok(Arc::new("audit middleware".to_string()) as Instance)
                })],
            )?;
            registry.load_consumers(
                "handlers",
                vec![ModuleDef::new_async("health", &["db"], |_deps| async {
                    Ok(Arc::new("health handler".to_string()) as Instance)
                })],
            )?;
            Ok(())
        })
        .await?;

    println!("🚀 modloom demo server is up");
    for id in ["config", "logger", "db", "router", "metrics", "events"] {
        if let Some(value) = registry.get_as::<String>(id) {
            println!("   {:<10} {}", id, value);
        }
    }
    println!(
        "   middleware consumers ready: {}",
        registry.get_consumers("middleware").len()
    );
    println!(
        "   handler consumers ready:    {}",
        registry.get_consumers("handlers").len()
    );

    Ok(())
}
