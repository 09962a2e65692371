//! Funnel dispatcher service.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                  FUNNEL DISPATCHER                    │
//!                 │                                                      │
//!   caller ──────▶│  Dispatcher ──▶ LoadBalance ──▶ healthy snapshot      │
//!                 │      │            (OAuth / ZF pools + breakers)      │
//!                 │      ▼                  ▲                             │
//!                 │  hedge race ────────────┘ success / fail feedback     │──▶ funnel nodes
//!                 │                                                      │
//!                 │  config watcher ──▶ pool rebalance                   │
//!                 │  admin API ──▶ add / remove / inspect nodes          │
//!                 │  metrics endpoint                                    │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use funnel_dispatch::admin::{serve_admin, AdminState};
use funnel_dispatch::config::{load_config, watcher, FunnelConfig};
use funnel_dispatch::observability::{logging, metrics};
use funnel_dispatch::{Dispatcher, LoginType, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = PathBuf::from(
        std::env::var("FUNNEL_CONFIG").unwrap_or_else(|_| "funnel.toml".to_string()),
    );
    let config_exists = config_path.exists();
    let config = if config_exists {
        load_config(&config_path)?
    } else {
        FunnelConfig::default()
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("funnel-dispatch v{} starting", env!("CARGO_PKG_VERSION"));
    if !config_exists {
        tracing::warn!(path = ?config_path, "Config file not found, using defaults");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = Dispatcher::from_config(&config)?;
    let balance = dispatcher.balance().clone();
    tracing::info!(
        oauth_nodes = balance.list(LoginType::OAuth).len(),
        zf_nodes = balance.list(LoginType::Zf).len(),
        failure_threshold = config.breaker.failure_threshold,
        cooldown_secs = config.breaker.cooldown_secs,
        "Dispatcher ready"
    );

    let shutdown = Shutdown::new();

    // Keep the watcher alive for the lifetime of the process.
    let _watcher = if config_exists {
        let (config_watcher, updates) = watcher::ConfigWatcher::new(&config_path);
        let handle = config_watcher.run()?;
        tokio::spawn(watcher::apply_pool_updates(
            balance.clone(),
            updates,
            shutdown.subscribe(),
        ));
        Some(handle)
    } else {
        None
    };

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState {
            balance: balance.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
        };
        Some(tokio::spawn(serve_admin(listener, state, shutdown.subscribe())))
    } else {
        None
    };

    shutdown.trigger_on_ctrl_c().await?;

    if let Some(task) = admin_task {
        if let Err(e) = task.await? {
            tracing::error!(error = %e, "Admin API exited with error");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
