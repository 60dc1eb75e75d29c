//! MotorID API Server Entry Point
//!
//! Bootstraps configuration, wires the worker to the command channel,
//! primes the cache with a full resync, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing_subscriber::EnvFilter;

use motorid_api::{create_api_router, ApiConfig, ApiError, ApiResult, AppState, SharedCache};
use motorid_channel::{command_channel, Command};
use motorid_storage::{InMemorySnapshotCache, LmdbSnapshotCache};
use motorid_worker::{DbConfig, PgPersonStore, Worker};

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_config = DbConfig::from_env();
    let store = PgPersonStore::from_config(&db_config)
        .map_err(|e| ApiError::internal_error(format!("Failed to set up database: {e}")))?;

    let cache = build_cache()?;

    let api_config = ApiConfig::from_env();
    let (bus, mailbox) = command_channel(api_config.channel_capacity, api_config.dispatch_timeout);

    let worker = Worker::new(Arc::new(store), Arc::clone(&cache), mailbox);
    tokio::spawn(worker.run());

    // Cold start: prime the cache from the store before taking traffic.
    if let Err(e) = bus.dispatch(Command::Refresh { id: None }).await {
        tracing::warn!(error = %e, "initial cache resync failed");
    }

    let state = AppState::new(cache, bus);
    let app: Router = create_api_router(state, &api_config);

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting MotorID API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn build_cache() -> ApiResult<SharedCache> {
    match std::env::var("MOTORID_CACHE_PATH") {
        Ok(path) => {
            let size_mb = std::env::var("MOTORID_CACHE_SIZE_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256);
            let cache = LmdbSnapshotCache::new(&path, size_mb)
                .map_err(|e| ApiError::internal_error(format!("Failed to open cache: {e}")))?;
            tracing::info!(%path, size_mb, "using LMDB snapshot cache");
            Ok(Arc::new(cache))
        }
        Err(_) => {
            tracing::info!("using in-memory snapshot cache");
            Ok(Arc::new(InMemorySnapshotCache::new()))
        }
    }
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("MOTORID_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("MOTORID_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
