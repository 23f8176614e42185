//! imgtier - an adaptive image delivery proxy.
//!
//! This binary starts the HTTP edge and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imgtier::{
    cache::{spawn_sweeper, MemoryCacheStore, TierCaches},
    config::Config,
    fetch::HttpFetcher,
    mediator::Mediator,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let profiles = match config.profile_table() {
        Ok(table) => table,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let filter = match config.filter_config() {
        Ok(filter) => filter,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  Mediated origins: {}", config.allowed_origins.join(", "));
    info!(
        "  Allowed contexts: {}",
        config.allowed_contexts.join(", ")
    );
    info!("  Default tier: {}", config.default_tier);
    info!(
        "  Sweep interval: {}s, fetch timeout: {}s",
        config.sweep_interval_secs, config.fetch_timeout_secs
    );

    // Build the upstream HTTP client
    let client = match reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build the upstream HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = Arc::new(HttpFetcher::from_client(client));

    // Build the per-tier cache context and the mediator
    let store = Arc::new(MemoryCacheStore::new());
    let caches = Arc::new(TierCaches::new(store, &profiles));
    let mediator = Arc::new(Mediator::new(profiles, filter, Arc::clone(&caches), fetcher));

    // Start the periodic eviction sweep
    let sweeper = spawn_sweeper(caches, config.sweep_interval());

    // Build router
    let router_config = build_router_config(&config);
    let router = create_router(mediator, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  imgtier v{}", env!("CARGO_PKG_VERSION"));
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!(
        "    curl 'http://{}/img?url=https%3A%2F%2F{}%2Fdemo%2Fdefault-image.jpg' -H 'ECT: 2g'",
        addr,
        config
            .allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or("ik.imagekit.io")
    );
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.abort();

    if let Err(e) = served {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Resolve when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    } else {
        info!("Shutdown signal received");
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "imgtier=debug,tower_http=debug"
    } else {
        "imgtier=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}
