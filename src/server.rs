//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, and Axum server lifecycle.

use crate::config::{CacheConfig, Config, DatabaseConfig};
use crate::domain::random::SecureRandom;
use crate::domain::repositories::CardCatalog;
use crate::infrastructure::cache::{CacheService, CachedCardCatalog, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgCardCatalog, PgUserLedger};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool (with startup retries)
/// - Apply migrations
/// - Redis cache (or NullCache fallback)
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection fails after all retries
/// - Migrations fail
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config.database).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = connect_cache(&config.cache).await;

    let pool = Arc::new(pool);
    let catalog: Arc<dyn CardCatalog> = Arc::new(CachedCardCatalog::new(
        Arc::new(PgCardCatalog::new(pool.clone())),
        cache.clone(),
        config.cache.pool_ttl_seconds,
    ));
    let ledger = Arc::new(PgUserLedger::new(pool.clone()));

    let state =
        AppState::new(catalog, ledger, Arc::new(SecureRandom), cache).with_db(pool.clone());

    match state.card_service.check_provisioning().await {
        Ok(report) if report.is_ready() => {}
        Ok(report) => tracing::warn!(
            active_common = report.active_common,
            active_rare = report.active_rare,
            "Catalog fallback pools are incomplete; draws may fail"
        ),
        Err(e) => tracing::warn!(error = %e, "Catalog provisioning check failed"),
    }

    let app = app_router(state, config.behind_proxy);

    let addr = config.listen_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Builds the pool, retrying the first connection with jittered backoff.
pub async fn connect_database(config: &DatabaseConfig) -> Result<PgPool> {
    let strategy = ExponentialBackoff::from_millis(200)
        .max_delay(Duration::from_secs(5))
        .map(jitter)
        .take(config.connect_retries);

    let mut attempt = 0u32;
    Retry::spawn(strategy, || {
        attempt += 1;
        let options = config.pool_options();
        let url = config.url.clone();
        let current = attempt;
        async move {
            options.connect(&url).await.inspect_err(|e| {
                tracing::warn!(attempt = current, error = %e, "Database connection failed");
            })
        }
    })
    .await
    .context("Failed to connect to database")
}

/// Connects to Redis when configured, otherwise (or on failure) returns a no-op cache.
pub async fn connect_cache(config: &CacheConfig) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.pool_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
