//! Dex Cache - A read-through caching proxy for a paginated species catalog
//!
//! Binary entry point: loads configuration, picks a store backend and serves
//! the HTTP API until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dex_cache::{
    create_router, spawn_cleanup_task, AppState, Config, HttpSpeciesApi, KeyValueStore,
    MemoryStore, RedisStore, StoreBackend,
};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Load `.env` and initialize tracing
/// 2. Load and validate configuration from environment variables
/// 3. Create the store backend (Redis, or in-memory with a cleanup task)
/// 4. Create the upstream client and router
/// 5. Serve until SIGINT/SIGTERM, then shut down gracefully
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dex_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dex Cache proxy");

    let config = Config::from_env();
    config.validate().context("Invalid configuration")?;
    info!(
        "Configuration loaded: port={}, store={:?}, upstream={}, rate_limit={}/{}s, encoding={}",
        config.server_port,
        config.store_backend,
        config.upstream_base_url,
        config.rate_limit_max,
        config.rate_limit_window_secs,
        config.cache_encoding
    );

    let (store, cleanup_handle): (Arc<dyn KeyValueStore>, Option<JoinHandle<()>>) =
        match config.store_backend {
            StoreBackend::Redis => {
                let store = RedisStore::new(&config.redis_url)
                    .context("Failed to create Redis client")?;
                if let Err(e) = store.ping().await {
                    // Requests still work without a cache; connection is retried lazily
                    warn!("Redis not reachable at startup: {}", e);
                }
                info!("Using Redis store at {}", config.redis_url);
                let store: Arc<dyn KeyValueStore> = Arc::new(store);
                (store, None)
            }
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new(config.memory_max_entries));
                let handle = spawn_cleanup_task(store.clone(), config.cleanup_interval);
                info!(
                    "Using in-memory store with capacity {}",
                    config.memory_max_entries
                );
                (store as Arc<dyn KeyValueStore>, Some(handle))
            }
        };

    let upstream = HttpSpeciesApi::new(&config.upstream_base_url, config.upstream_timeout())
        .context("Failed to create upstream client")?;

    let state = AppState::new(store, Arc::new(upstream), &config);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Peer addresses identify clients for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(cleanup_handle))
    .await
    .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
