//! HTTP server initialization and runtime setup.
//!
//! Handles store and cache setup, the click pipeline, and the Axum server
//! lifecycle including graceful shutdown.

use crate::config::{CacheBackend, ClickSinkKind, Config, StoreBackend};
use crate::domain::click_pipeline::ClickPipeline;
use crate::domain::click_sink::ClickSink;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::{CacheService, MemoryCache, NullCache, RedisCache};
use crate::infrastructure::persistence::{InMemoryLinkRepository, PgLinkRepository};
use crate::infrastructure::sinks::{LogClickSink, PgClickSink};
use crate::routes::app_router;
use crate::state::{AppState, ServiceSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Connects the PostgreSQL pool and applies embedded migrations.
pub async fn connect_database(config: &Config, database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied");

    Ok(pool)
}

/// Builds the configured cache. A Redis connection failure at startup falls
/// back to the in-process cache rather than aborting.
async fn build_cache(config: &Config) -> Arc<dyn CacheService> {
    match (config.cache_backend, &config.redis_url) {
        (CacheBackend::Redis, Some(redis_url)) => {
            match RedisCache::connect(redis_url, config.cache_ttl(), config.cache_timeout()).await
            {
                Ok(redis) => {
                    info!("Cache enabled (Redis)");
                    Arc::new(redis)
                }
                Err(e) => {
                    warn!("Failed to connect to Redis: {}. Using in-process cache.", e);
                    Arc::new(MemoryCache::new(config.cache_max_entries, config.cache_ttl()))
                }
            }
        }
        (CacheBackend::None, _) => {
            info!("Cache disabled (NullCache)");
            Arc::new(NullCache::new())
        }
        _ => {
            info!("Cache enabled (in-process)");
            Arc::new(MemoryCache::new(config.cache_max_entries, config.cache_ttl()))
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Durable store (PostgreSQL pool + migrations, or in-memory)
/// - Cache (Redis, in-process, or none)
/// - Click pipeline with its sink
/// - Axum HTTP server
///
/// On SIGINT/SIGTERM the server stops accepting connections, finishes
/// in-flight requests, then waits up to `SHUTDOWN_FLUSH_TIMEOUT_SECONDS` for
/// queued click events.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = match (config.store_backend, &config.database_url) {
        (StoreBackend::Postgres, Some(url)) => Some(Arc::new(connect_database(&config, url).await?)),
        (StoreBackend::Postgres, None) => anyhow::bail!("DATABASE_URL is not configured"),
        (StoreBackend::Memory, _) => None,
    };

    let repository: Arc<dyn LinkRepository> = match &pool {
        Some(pool) => Arc::new(PgLinkRepository::new(pool.clone())),
        None => {
            warn!("Using in-memory store; links are lost on restart");
            Arc::new(InMemoryLinkRepository::new())
        }
    };

    let cache = build_cache(&config).await;

    let sink: Arc<dyn ClickSink> = match (config.click_sink, &pool) {
        (ClickSinkKind::Postgres, Some(pool)) => Arc::new(PgClickSink::new(pool.clone())),
        (ClickSinkKind::Postgres, None) => {
            anyhow::bail!("CLICK_SINK=postgres requires the postgres store")
        }
        (ClickSinkKind::Log, _) => Arc::new(LogClickSink),
    };
    let click_pipeline = ClickPipeline::new(sink, config.click_queue_capacity);
    info!(
        capacity = config.click_queue_capacity,
        sink = ?config.click_sink,
        "Click pipeline ready"
    );

    let state = AppState::new(
        repository,
        cache,
        click_pipeline.clone(),
        ServiceSettings::from_config(&config),
    );

    let app = app_router(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    flush_clicks(&click_pipeline, config.shutdown_flush_timeout()).await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    info!("Server stopped");

    Ok(())
}

/// Waits for queued click events, logging how many were abandoned.
async fn flush_clicks(pipeline: &ClickPipeline, timeout: Duration) {
    let pending = pipeline.queued();
    if pending > 0 {
        info!(pending, "Flushing click events");
    }

    if pipeline.flush(timeout).await {
        let stats = pipeline.stats();
        info!(
            processed = stats.processed,
            failed = stats.failed,
            dropped = stats.dropped,
            "Click pipeline drained"
        );
    } else {
        warn!(
            abandoned = pipeline.queued(),
            timeout_secs = timeout.as_secs(),
            "Click pipeline flush timed out; abandoning queued events"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
